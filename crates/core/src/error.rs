use std::num::ParseIntError;

/// Result alias that carries the custom [`ReplayError`] type.
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Common error type for the core crate.
///
/// Replay itself never surfaces these to the caller as a failed operation.
/// They are reported through [`crate::ReplayReport`] and the log instead.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The timestamp column of a data row could not be parsed.
    #[error("line {line}: invalid timestamp `{value}`: {source}")]
    Timestamp {
        line: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// An X or Y column held something other than a base-10 integer.
    #[error("line {line}: invalid coordinate `{value}`: {source}")]
    Coordinate {
        line: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },
    /// Configuration could not be read or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReplayError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Source line the error refers to, when it came from a log row.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Timestamp { line, .. } | Self::Coordinate { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<&str> for ReplayError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ReplayError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<toml::de::Error> for ReplayError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}
