use thiserror::Error;

/// Failures at the edges of the engine. The scope tree itself never fails.
#[derive(Debug, Error)]
pub enum RumError {
    #[error("session sample rate must be within 0..=100, got {0}")]
    InvalidSampleRate(f32),

    #[error("application id must not be empty")]
    MissingApplicationId,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("command channel closed")]
    ChannelClosed,

    #[error("store failure: {0}")]
    Store(String),
}
