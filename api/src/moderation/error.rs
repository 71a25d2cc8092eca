use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the moderation engine.
///
/// `InvalidImage` is a caller problem (bad pixels) and is never retried.
/// `Analysis` is an internal failure and carries the lower-level cause when
/// there is one.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("analysis failed: {message}")]
    Analysis {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl ModerationError {
    pub fn invalid_image(message: impl Into<String>) -> Self {
        ModerationError::InvalidImage(message.into())
    }

    /// Analysis failure without an underlying cause
    pub fn analysis(message: impl Into<String>) -> Self {
        ModerationError::Analysis {
            message: message.into(),
            source: None,
        }
    }

    /// Analysis failure wrapping the error that caused it
    pub fn analysis_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ModerationError::Analysis {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[cfg(test)]
    pub fn is_invalid_image(&self) -> bool {
        matches!(self, ModerationError::InvalidImage(_))
    }
}
