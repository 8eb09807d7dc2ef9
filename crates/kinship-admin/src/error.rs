//! Error types for the admin binary.
//!
//! [`AdminError`] wraps every failure mode so `main` and the command
//! handlers can propagate with `?`.

/// Top-level error for the admin binary.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: kinship_core::ConfigError,
    },

    /// The event log could not be opened or written.
    #[error("event log error: {source}")]
    Log {
        /// The underlying log error.
        #[from]
        source: kinship_log::LogError,
    },

    /// A projection or clone resolution failed.
    #[error("resolve error: {source}")]
    Resolve {
        /// The underlying resolve error.
        #[from]
        source: kinship_core::ResolveError,
    },

    /// A command-line argument was not usable.
    #[error("invalid input: {message}")]
    Input {
        /// What was wrong with the input.
        message: String,
    },

    /// The result could not be rendered as JSON.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
