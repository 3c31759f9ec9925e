use thiserror::Error;

pub type VocoderResult<T> = Result<T, VocoderError>;

#[derive(Debug, Error)]
pub enum VocoderError {
    #[error("mel bin count mismatch: config expects {expected}, frames carry {found}")]
    MelMismatch { expected: usize, found: usize },

    #[error("frame {index} has {found} bins, expected {expected}")]
    RaggedFrames {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid config '{name}': {message}")]
    InvalidConfig { name: String, message: String },

    #[error("no measured phoneme profiles loaded")]
    MissingMeasurements,

    #[error("strategy failed: {0}")]
    Strategy(String),

    #[error("strategy produced unusable output: {0}")]
    InvalidOutput(String),
}

impl VocoderError {
    pub fn invalid_config(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn strategy(message: impl Into<String>) -> Self {
        Self::Strategy(message.into())
    }

    /// Caller contract violations surface to the caller; everything else is
    /// absorbed by the fallback chain.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MelMismatch { .. } | Self::RaggedFrames { .. } | Self::InvalidConfig { .. }
        )
    }
}
