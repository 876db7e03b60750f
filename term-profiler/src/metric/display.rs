//! Display metadata attached to metrics.

use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, Result};

/// One `(label, icon, colour)` entry shown on a dashboard card.
///
/// Icons are Font Awesome class names (`fa-table`), colours are bootstrap
/// text classes (`text-success`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub label: String,
    pub icon: Option<String>,
    pub colour: Option<String>,
}

impl DisplayEntry {
    /// An entry with only a label.
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            colour: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }

    /// Zips parallel lists into entries. The lists must have equal length.
    pub fn zip_lists(labels: Vec<String>, icons: Vec<String>, colours: Vec<String>) -> Result<Vec<Self>> {
        if labels.len() != icons.len() || labels.len() != colours.len() {
            return Err(ProfilerError::configuration(format!(
                "display metadata lists differ in length: {} labels, {} icons, {} colours",
                labels.len(),
                icons.len(),
                colours.len()
            )));
        }
        Ok(labels
            .into_iter()
            .zip(icons)
            .zip(colours)
            .map(|((label, icon), colour)| Self {
                label,
                icon: Some(icon),
                colour: Some(colour),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_lists() {
        let entries = DisplayEntry::zip_lists(
            vec!["Total Rows".into(), "Total Columns".into()],
            vec!["fa-table".into(), "fa-columns".into()],
            vec!["text-success".into(), "text-info".into()],
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].icon.as_deref(), Some("fa-columns"));
    }

    #[test]
    fn test_zip_lists_length_mismatch() {
        let result = DisplayEntry::zip_lists(
            vec!["a".into(), "b".into()],
            vec!["fa-a".into()],
            vec!["text-info".into(), "text-info".into()],
        );
        assert!(matches!(result, Err(ProfilerError::Configuration(_))));
    }
}
