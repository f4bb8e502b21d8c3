use thiserror::Error;

/// Failure reported by a platform adapter.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform rejected or could not serve the request.
    #[error("platform unavailable: {message}")]
    Unavailable { message: String },
}

impl Error {
    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
