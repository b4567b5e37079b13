// File: src/error.rs
use crate::core::types::Field;
use std::fmt;
use thiserror::Error;

/// Failures of the encode-predict-decode pipeline and of row lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Unknown {field} value '{value}': not present in the trained vocabulary")]
    UnknownCategory { field: Field, value: String },

    #[error("Unknown label code {code}: outside the target vocabulary")]
    UnknownLabel { code: usize },

    #[error("No reference row for restaurant '{restaurant_id}', category '{category}', item '{item}'")]
    LookupNotFound {
        restaurant_id: String,
        category: String,
        item: String,
    },
}

/// Raised by the caller-side gate when a prediction is requested before
/// every field has been chosen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Please complete all selections before predicting (missing: {})", MissingList(.missing))]
pub struct SelectionIncomplete {
    pub missing: Vec<Field>,
}

struct MissingList<'a>(&'a [Field]);

impl fmt::Display for MissingList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

struct AtLine<'a>(&'a Option<u64>);

impl fmt::Display for AtLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(line) => write!(f, " on line {line}"),
            None => Ok(()),
        }
    }
}

/// Why an item could not be selected: an earlier field is unset, or the
/// triple has no reference row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectItemError {
    #[error(transparent)]
    Incomplete(#[from] SelectionIncomplete),

    #[error(transparent)]
    Lookup(#[from] PredictError),
}

/// Startup failures while reading the reference table or model artifacts.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse reference table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid price '{value}'{}", AtLine(.line))]
    InvalidPrice { line: Option<u64>, value: String },

    #[error("Failed to parse JSON artifacts: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode binary artifacts: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
