use {
    crosslink_channels::{ChannelRef, InboundMessage},
    serde::{Deserialize, Serialize},
};

/// A configured forwarding destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardTarget {
    pub platform: String,
    pub channel_id: String,
    /// Bot that posts into the destination.
    pub self_id: String,
    /// Group context some platforms need to send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

impl ForwardTarget {
    pub fn channel(&self) -> ChannelRef {
        ChannelRef::new(&self.platform, &self.channel_id)
    }

    /// Same destination channel, regardless of bot or guild.
    pub fn same_channel(&self, channel: &ChannelRef) -> bool {
        self.platform == channel.platform && self.channel_id == channel.channel_id
    }
}

/// Where a reply to one of our relayed messages should be sent back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEntry {
    pub platform: String,
    pub channel_id: String,
    /// Bot that received the original message.
    pub self_id: String,
    pub guild_id: Option<String>,
}

impl RelayEntry {
    /// Origin record for a message about to be relayed.
    pub fn origin_of(message: &InboundMessage) -> Self {
        let source = message.source();
        Self {
            platform: source.platform,
            channel_id: source.channel_id,
            self_id: message.self_id.clone(),
            guild_id: message.guild_id.clone(),
        }
    }

    pub fn into_target(self) -> ForwardTarget {
        ForwardTarget {
            platform: self.platform,
            channel_id: self.channel_id,
            self_id: self.self_id,
            guild_id: self.guild_id,
        }
    }
}
