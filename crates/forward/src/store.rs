//! Persistence trait for per-channel forwarding targets.

use {async_trait::async_trait, crosslink_channels::ChannelRef};

use crate::{Result, types::ForwardTarget};

/// Backing store for database-mode target lists, keyed by source channel.
#[async_trait]
pub trait ForwardStore: Send + Sync {
    /// Stored targets for a channel; `None` if the channel has no record.
    async fn get_targets(&self, channel: &ChannelRef) -> Result<Option<Vec<ForwardTarget>>>;

    /// Insert or replace the channel's target list.
    async fn upsert_targets(&self, channel: &ChannelRef, targets: &[ForwardTarget]) -> Result<()>;

    /// Channels with at least one stored target.
    async fn list_channels(&self) -> Result<Vec<ChannelRef>>;
}
