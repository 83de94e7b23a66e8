use crate::types::DataType;

/// Errors that may arise when resolving or evaluating a function
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The function was called with an unsupported number of arguments
    #[error("{function} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Name of the function
        function: &'static str,
        /// Human readable description of the accepted arity
        expected: &'static str,
        /// Number of arguments passed
        actual: usize,
    },

    /// An argument has a type the function does not accept
    #[error("{function} does not accept {actual} at argument {position}: {message}")]
    ArgumentType {
        /// Name of the function
        function: &'static str,
        /// Zero-based argument position
        position: usize,
        /// The rejected type
        actual: DataType,
        /// Which types are accepted
        message: &'static str,
    },

    /// No function is registered under the given name
    #[error("unknown {kind} function '{name}'")]
    UnknownFunction {
        /// Scalar, aggregate or table
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// A value could not be converted into the requested type
    #[error("cannot convert {value} to {target}")]
    Coercion {
        /// Rendering of the value
        value: String,
        /// Name of the target type
        target: &'static str,
    },

    /// A partial snapshot did not have the expected shape
    #[error("unexpected partial aggregate: expected {expected}, got {actual}")]
    UnexpectedPartial {
        /// Expected partial type
        expected: DataType,
        /// Rendering of what was received
        actual: String,
    },

    /// A split delimiter is not a valid regular expression
    #[error("invalid delimiter pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The delimiter
        pattern: String,
        /// Underlying regex error
        source: regex::Error,
    },

    /// A pipeline configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConf(&'static str),

    /// Encoding or decoding a partial snapshot failed
    #[cfg(feature = "serde")]
    #[error("wire error: {0}")]
    Wire(#[from] postcard::Error),
}

impl Error {
    /// Returns `true` if the error was raised while validating arguments
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Error::ArgumentCount { .. } | Error::ArgumentType { .. }
        )
    }

    pub(crate) fn coercion(value: &crate::types::Value, target: &'static str) -> Self {
        Error::Coercion {
            value: value.to_string(),
            target,
        }
    }
}

/// Result type used throughout foldkit
pub type Result<T> = core::result::Result<T, Error>;
