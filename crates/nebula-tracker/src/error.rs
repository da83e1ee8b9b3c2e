//! Error types for the tracker binary.
//!
//! [`TrackerError`] wraps every failure mode of start-up and the render
//! loop so `main` can propagate with `?`.

/// Top-level error for the tracker binary.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nebula_core::config::ConfigError,
    },

    /// The predictor rejected its calibration data.
    #[error("predictor error: {source}")]
    Predictor {
        /// The underlying predictor error.
        #[from]
        source: nebula_core::predictor::PredictorError,
    },

    /// No async runtime to schedule the driver on.
    #[error("schedule error: {source}")]
    Schedule {
        /// The underlying scheduling error.
        #[from]
        source: nebula_core::schedule::ScheduleError,
    },

    /// A frame could not be encoded as JSON.
    #[error("render error: {source}")]
    Render {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// Writing a frame to stdout failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
