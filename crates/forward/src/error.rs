use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Address string is not `platform:channel_id`.
    #[error("invalid address: {address}")]
    InvalidAddress { address: String },

    /// No connected bot serves the address's platform.
    #[error("no matching bot for {address}")]
    NoMatchingBot { address: String },

    /// The bot responsible for a destination is not connected.
    #[error("no connected bot {self_id} on {platform}")]
    BotUnavailable { platform: String, self_id: String },

    /// Target lists come from the static rule table and cannot be edited.
    #[error("forward targets are read-only in config mode")]
    ReadOnlyTargets,

    #[error("database mode requires a forward store")]
    StoreRequired,

    #[error(transparent)]
    Channel(#[from] crosslink_channels::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    #[must_use]
    pub fn no_matching_bot(address: impl Into<String>) -> Self {
        Self::NoMatchingBot {
            address: address.into(),
        }
    }

    #[must_use]
    pub fn bot_unavailable(platform: impl Into<String>, self_id: impl Into<String>) -> Self {
        Self::BotUnavailable {
            platform: platform.into(),
            self_id: self_id.into(),
        }
    }

    /// Failure of the persistent store rather than of the request.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Json(_) | Self::Sqlx(_) | Self::Migrate(_) | Self::Message { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
