//! Platform-facing abstractions for crosslink.
//!
//! Each chat platform adapter (OneBot, Discord, Telegram, ...) exposes its
//! connected bot identities through the [`RelayBot`] trait and registers them
//! in a [`BotRegistry`]. Inbound events are translated into [`InboundMessage`]
//! before they reach the forwarding core.

pub mod error;
pub mod message;
pub mod plugin;
pub mod registry;

pub use {
    error::{Error, Result},
    message::{Author, ChannelRef, InboundMessage, QuotedMessage, RawChannelId},
    plugin::{MemberDirectory, RelayBot},
    registry::{BotIdentity, BotRegistry},
};
