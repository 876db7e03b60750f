//! DataFusion session settings used by file sources and views.

use datafusion::execution::context::{SessionConfig, SessionContext};
use tracing::instrument;

/// Configuration for the DataFusion sessions created by this crate.
#[derive(Debug, Clone)]
pub struct ProfilerContextConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Target number of partitions for parallel execution
    pub target_partitions: usize,
}

impl Default for ProfilerContextConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4),
        }
    }
}

impl ProfilerContextConfig {
    /// Sets the execution batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the number of target partitions.
    pub fn with_target_partitions(mut self, target_partitions: usize) -> Self {
        self.target_partitions = target_partitions;
        self
    }

    /// Creates a session context. The information schema is always enabled
    /// because column profiling over views reads `information_schema.columns`.
    #[instrument(skip(self))]
    pub fn build_session(&self) -> SessionContext {
        let config = SessionConfig::new()
            .with_batch_size(self.batch_size)
            .with_target_partitions(self.target_partitions)
            .with_information_schema(true);
        SessionContext::new_with_config(config)
    }
}
