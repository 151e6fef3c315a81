use serde::Serialize;
use thiserror::Error;

/// A single broken rule on a single record (or on the batch as a whole).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Position of the offending record in the submitted batch; `None` for batch-wide rules.
    pub index: Option<usize>,
    pub title: String,
    pub message: String,
}

impl Violation {
    pub fn record(index: usize, title: &str, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn batch(message: impl Into<String>) -> Self {
        Self {
            index: None,
            title: String::new(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) if self.title.is_empty() => {
                write!(f, "Entry {index}: {}", self.message)
            }
            Some(index) => write!(f, "Entry {index} ({}): {}", self.title, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A batch of topic records broke one or more invariants.
///
/// Always carries every violation found, never just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("topic map validation failed with {} violation(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Indexes of records named by at least one violation, ascending and de-duplicated.
    pub fn record_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self.violations.iter().filter_map(|v| v.index).collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes
    }
}

fn summarize(violations: &[Violation]) -> String {
    const SHOWN: usize = 10;
    let mut parts: Vec<String> = violations.iter().take(SHOWN).map(|v| v.to_string()).collect();
    if violations.len() > SHOWN {
        parts.push(format!("... and {} more", violations.len() - SHOWN));
    }
    parts.join("; ")
}

/// Structured text could not be decomposed into topic records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("row {row}, column '{column}': {message}")]
    Cell {
        row: usize,
        column: &'static str,
        message: String,
    },

    #[error("row {row}: {message}")]
    Row { row: usize, message: String },

    #[error("malformed model response: {0}")]
    Response(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message_lists_violations() {
        let err = ValidationError::new(vec![
            Violation::record(0, "A", "priority_score 6 is outside 1-5"),
            Violation::batch("expected exactly 1 Pillar, found 0"),
        ]);
        let message = err.to_string();
        assert!(message.contains("2 violation(s)"));
        assert!(message.contains("Entry 0 (A): priority_score 6"));
        assert!(message.contains("expected exactly 1 Pillar"));
    }

    #[test]
    fn test_record_indexes_are_deduplicated() {
        let err = ValidationError::new(vec![
            Violation::record(2, "B", "x"),
            Violation::record(0, "A", "y"),
            Violation::record(2, "B", "z"),
            Violation::batch("w"),
        ]);
        assert_eq!(err.record_indexes(), vec![0, 2]);
    }

    #[test]
    fn test_parse_error_names_row_and_column() {
        let err = ParseError::Cell {
            row: 3,
            column: "User Intent",
            message: "unknown user_intent 'Curious'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "row 3, column 'User Intent': unknown user_intent 'Curious'"
        );
    }
}
