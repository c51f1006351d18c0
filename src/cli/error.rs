//! CLI error types and conversions

use crate::community::CommunityError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Malformed community name
    #[error("invalid community '{input}': {source}")]
    InvalidCommunity {
        /// Argument as given
        input: String,
        /// Validation failure
        #[source]
        source: CommunityError,
    },

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
