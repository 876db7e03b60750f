//! Named metric options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProfilerError, Result};

/// Options passed to a metric kind, e.g. `id_col`, `group_key` or `conf`.
///
/// Values are JSON so one map can carry strings, numbers, flags and column
/// lists. The typed getters fall back to a default when the key is absent and
/// fail with a configuration error when the value has the wrong type.
///
/// ```rust
/// use term_profiler::metric::MetricParams;
///
/// let params = MetricParams::new().with("dp", 3).with("pc", false);
/// assert_eq!(params.u64_or("dp", 2).unwrap(), 3);
/// assert!(!params.bool_or("pc", true).unwrap());
/// assert_eq!(params.str_or("id_col", "id").unwrap(), "id");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricParams {
    values: BTreeMap<String, Value>,
}

impl MetricParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns a copy of `self` with every entry of `overrides` applied on top.
    pub fn merged_with(&self, overrides: &MetricParams) -> MetricParams {
        let mut merged = self.clone();
        for (key, value) in &overrides.values {
            merged.values.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Fails when any key is not in `recognized`.
    pub fn ensure_recognized(&self, metric: &str, recognized: &[&str]) -> Result<()> {
        match self.keys().find(|key| !recognized.contains(key)) {
            Some(unknown) => Err(ProfilerError::configuration(format!(
                "unknown parameter '{unknown}' for metric '{metric}' (expected one of: {})",
                recognized.join(", ")
            ))),
            None => Ok(()),
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> Result<String> {
        match self.values.get(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| type_error(key, "a non-negative integer", value)),
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| type_error(key, "a number", value)),
        }
    }

    /// Reads a list of strings. A single string is accepted as a one-element list.
    pub fn str_list_or(&self, key: &str, default: &[&str]) -> Result<Vec<String>> {
        match self.values.get(key) {
            None => Ok(default.iter().map(|s| s.to_string()).collect()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(type_error(key, "a list of strings", other)),
                })
                .collect(),
            Some(other) => Err(type_error(key, "a list of strings", other)),
        }
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> ProfilerError {
    ProfilerError::configuration(format!(
        "parameter '{key}' must be {expected}, got {found}"
    ))
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MetricParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_does_not_mutate_stored_params() {
        let stored = MetricParams::new().with("conf", 0.99).with("group_key", "card_type");
        let overrides = MetricParams::new().with("conf", 0.95);
        let merged = stored.merged_with(&overrides);

        assert_eq!(merged.f64_or("conf", 0.0).unwrap(), 0.95);
        assert_eq!(merged.str_or("group_key", "").unwrap(), "card_type");
        assert_eq!(stored.f64_or("conf", 0.0).unwrap(), 0.99);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let params = MetricParams::new().with("pc", true).with("percent", true);
        let err = params
            .ensure_recognized("total_blank_cells", &["pc", "dp"])
            .unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'percent'"));
        assert!(params.ensure_recognized("x", &["pc", "percent"]).is_ok());
    }

    #[test]
    fn test_typed_getters() {
        let params: MetricParams = [
            ("address_col", json!(["addr", "town"])),
            ("x_cols", json!("input")),
            ("dp", json!(-1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            params.str_list_or("address_col", &["addr", "city"]).unwrap(),
            vec!["addr", "town"]
        );
        assert_eq!(params.str_list_or("x_cols", &[]).unwrap(), vec!["input"]);
        assert_eq!(
            params.str_list_or("missing", &["a"]).unwrap(),
            vec!["a".to_string()]
        );
        assert!(matches!(
            params.u64_or("dp", 2),
            Err(ProfilerError::Configuration(_))
        ));
        assert!(params.str_or("dp", "").is_err());
    }
}
