//! Error types for the FlexGrid engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during startup and the run loop.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: flexgrid_core::ConfigError,
    },

    /// The game engine could not be built or stepped.
    #[error("engine error: {source}")]
    Core {
        /// The underlying engine error.
        #[from]
        source: flexgrid_core::EngineError,
    },

    /// An environment variable held an unusable value.
    #[error("invalid environment: {message}")]
    Env {
        /// Which variable was wrong and why.
        message: String,
    },

    /// The final snapshot could not be serialized.
    #[error("snapshot serialization failed: {source}")]
    Snapshot {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
