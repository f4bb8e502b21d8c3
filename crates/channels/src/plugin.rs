use std::collections::HashMap;

use async_trait::async_trait;

use crate::Result;

/// Member id to display name, for one guild.
pub type MemberDirectory = HashMap<String, String>;

/// A connected bot identity on one platform.
///
/// Adapters implement this once per platform; the wire protocol behind
/// `send_message` is entirely theirs.
#[async_trait]
pub trait RelayBot: Send + Sync {
    /// Platform name (e.g. "onebot", "discord").
    fn platform(&self) -> &str;

    /// This bot's own user id on the platform.
    fn self_id(&self) -> &str;

    /// Post `content` to a channel.
    ///
    /// Returns the ids of every message the platform created. Long content
    /// may be split into several physical messages.
    async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
        guild_id: Option<&str>,
    ) -> Result<Vec<String>>;

    /// Display names of the members of a guild.
    async fn members_of(&self, guild_id: &str) -> Result<MemberDirectory>;

    /// Guild that owns a channel, for platforms whose send API needs one.
    async fn channel_guild(&self, _channel_id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
