//! Generator output as a tagged result.
//!
//! The generator either produces candidate SQL or a structured signal that
//! the question needs columns absent from the schema. The signal is a
//! first-class variant handled explicitly by the validation step, never a
//! stringified error smuggled through the SQL field.

use serde::{Deserialize, Serialize};

/// What one generation attempt produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// A candidate SQL query, not yet validated.
    Sql(String),
    /// The question cannot be answered: these columns are absent from the
    /// schema. The generator must emit this rather than invent identifiers.
    MissingColumns(Vec<String>),
}

impl GenerationOutcome {
    /// Render the outcome for the state's `sql` field, so callers always
    /// see what the generator produced even on the signal path.
    pub fn as_sql_field(&self) -> String {
        match self {
            Self::Sql(sql) => sql.clone(),
            Self::MissingColumns(cols) => {
                format!("-- cannot answer: missing columns {}", cols.join(", "))
            }
        }
    }

    /// The candidate SQL, if this outcome is one.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Sql(sql) => Some(sql),
            Self::MissingColumns(_) => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_outcome_accessors() {
        let outcome = GenerationOutcome::Sql("SELECT 1".to_string());
        assert_eq!(outcome.sql(), Some("SELECT 1"));
        assert_eq!(outcome.as_sql_field(), "SELECT 1");
    }

    #[test]
    fn test_missing_columns_renders_signal() {
        let outcome =
            GenerationOutcome::MissingColumns(vec!["profit".to_string(), "tax".to_string()]);
        assert_eq!(outcome.sql(), None);
        let rendered = outcome.as_sql_field();
        assert!(rendered.contains("profit"));
        assert!(rendered.contains("tax"));
        assert!(rendered.starts_with("--"));
    }

    #[test]
    fn test_outcome_serde_tagging() {
        let outcome = GenerationOutcome::MissingColumns(vec!["a".to_string()]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "missing_columns");
        let back: GenerationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(outcome, back);
    }
}
