//! Inbound message model and channel identity normalization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel identity as delivered by a platform adapter.
///
/// Most platforms use a plain string or integer. Some wrap the identifier in a
/// structured object carrying a synthetic `id`, possibly nested. Always call
/// [`RawChannelId::normalize`] before using an identity as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChannelId {
    Text(String),
    Number(i64),
    Nested { id: Box<RawChannelId> },
}

impl RawChannelId {
    /// Canonical scalar form of this identity.
    pub fn normalize(&self) -> String {
        match self {
            Self::Text(id) => id.clone(),
            Self::Number(id) => id.to_string(),
            Self::Nested { id } => id.normalize(),
        }
    }
}

impl From<&str> for RawChannelId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for RawChannelId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<i64> for RawChannelId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

/// Normalized `(platform, channel_id)` pair identifying one channel.
///
/// Displays in address form, `platform:channel_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelRef {
    pub platform: String,
    pub channel_id: String,
}

impl ChannelRef {
    pub fn new(platform: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.channel_id)
    }
}

/// Author of an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    /// Account name on the platform.
    #[serde(default)]
    pub name: Option<String>,
    /// Group-specific nickname, preferred over `name` when present.
    #[serde(default)]
    pub nick: Option<String>,
}

impl Author {
    /// Name used when prefixing relayed content: nick, then name, then id.
    pub fn display_name(&self) -> &str {
        [self.nick.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// The message an inbound message replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub id: String,
}

/// A message received by one of the connected bots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub platform: String,
    /// Identity of the bot that received the message.
    pub self_id: String,
    pub channel: RawChannelId,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub message_id: String,
    pub author: Author,
    /// Message content, with mention markup as `<at id="..."/>` elements.
    pub content: String,
    #[serde(default)]
    pub quote: Option<QuotedMessage>,
    /// One-to-one conversation rather than a group channel.
    #[serde(default)]
    pub direct: bool,
}

impl InboundMessage {
    /// Normalized identity of the channel this message was posted in.
    pub fn source(&self) -> ChannelRef {
        ChannelRef::new(&self.platform, self.channel.normalize())
    }

    /// Group/guild id when the message was posted in a group context.
    pub fn group_guild(&self) -> Option<&str> {
        if self.direct {
            return None;
        }
        self.guild_id.as_deref().filter(|g| !g.is_empty())
    }
}
