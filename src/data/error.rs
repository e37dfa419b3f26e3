//! Error types for dataset loading and inbound record parsing.

/// Errors raised while reading or validating training data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A required column is absent from the header.
    #[error("required column `{column}` is missing")]
    MissingColumn { column: &'static str },

    /// A categorical cell holds a label outside the field's label set.
    #[error("line {line}: `{value}` is not a valid {field}")]
    UnknownCategory {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// A numeric cell could not be parsed.
    #[error("line {line}: `{value}` in column {column} is not a number")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// Not enough complete rows to split and fit.
    #[error("need at least {required} complete rows, found {found}")]
    InsufficientRows { found: usize, required: usize },

    /// Malformed CSV.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing an inbound record from the form layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// A required key is absent.
    #[error("field `{field}` is missing")]
    MissingField { field: &'static str },

    /// A numeric value could not be parsed.
    #[error("field `{field}`: `{value}` is not a number")]
    InvalidNumber { field: &'static str, value: String },

    /// A numeric value parsed to NaN or infinity.
    #[error("field `{field}`: {value} is not finite")]
    NonFinite { field: &'static str, value: f64 },

    /// An already-encoded vector carries a non-finite value.
    #[error("encoded column {position} holds non-finite value {value}")]
    NonFiniteFeature { position: usize, value: f64 },
}
