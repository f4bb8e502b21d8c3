//! Forwarding destination resolution.
//!
//! Destinations come either from an immutable rule table (config mode) or
//! from per-channel lists in a [`ForwardStore`] (database mode).

use std::sync::Arc;

use {
    crosslink_channels::{BotRegistry, ChannelRef, RelayBot},
    crosslink_config::ForwardRule,
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    address::parse_address,
    store::ForwardStore,
    types::ForwardTarget,
};

/// Where destinations are read from.
pub enum TargetSource {
    Static(Vec<ForwardRule>),
    Persistent(Arc<dyn ForwardStore>),
}

/// Outcome of a target-list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetUpdate {
    Updated,
    Unchanged,
}

pub struct TargetResolver {
    source: TargetSource,
    bots: Arc<BotRegistry>,
    /// Platform names recognised even without a connected bot.
    declared: Vec<String>,
}

impl TargetResolver {
    pub fn new(source: TargetSource, bots: Arc<BotRegistry>) -> Self {
        Self {
            source,
            bots,
            declared: Vec::new(),
        }
    }

    /// Also split addresses on `platforms`, e.g. `qq:guild` when no such bot is online.
    #[must_use]
    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared.extend(platforms.into_iter().map(Into::into));
        self
    }

    fn platforms(&self) -> Vec<String> {
        let mut platforms = self.bots.platforms();
        platforms.extend(self.declared.iter().cloned());
        platforms.sort();
        platforms.dedup();
        platforms
    }

    /// Parse an address using the connected and declared platform names.
    pub fn parse_address(&self, address: &str) -> Option<ChannelRef> {
        parse_address(address, &self.platforms())
    }

    /// First connected bot serving `platform`.
    pub fn find_bot(&self, platform: &str) -> Option<Arc<dyn RelayBot>> {
        self.bots.find_by_platform(platform)
    }

    /// Destinations for messages posted in `channel`.
    ///
    /// Store failures degrade to an empty list.
    pub async fn resolve(&self, channel: &ChannelRef) -> Vec<ForwardTarget> {
        match &self.source {
            TargetSource::Static(rules) => self.resolve_rules(rules, channel),
            TargetSource::Persistent(store) => match store.get_targets(channel).await {
                Ok(targets) => targets.unwrap_or_default(),
                Err(e) => {
                    warn!(channel = %channel, error = %e, "failed to read forward targets");
                    Vec::new()
                },
            },
        }
    }

    fn resolve_rules(&self, rules: &[ForwardRule], channel: &ChannelRef) -> Vec<ForwardTarget> {
        let source = channel.to_string();
        let platforms = self.platforms();
        rules
            .iter()
            .filter(|rule| rule.source == source)
            .filter_map(|rule| match parse_address(&rule.target, &platforms) {
                Some(target) => Some(ForwardTarget {
                    platform: target.platform,
                    channel_id: target.channel_id,
                    self_id: rule.self_id.clone(),
                    guild_id: rule.guild_id.clone(),
                }),
                None => {
                    debug!(target = %rule.target, "skipping rule with malformed target");
                    None
                },
            })
            .collect()
    }

    /// Add a destination by address, picking the first connected bot for its platform.
    ///
    /// The destination's guild is looked up once here and stored.
    pub async fn add_target(&self, channel: &ChannelRef, address: &str) -> Result<TargetUpdate> {
        let parsed = self
            .parse_address(address)
            .ok_or_else(|| Error::no_matching_bot(address))?;
        let bot = self
            .find_bot(&parsed.platform)
            .ok_or_else(|| Error::no_matching_bot(address))?;
        let guild_id = match bot.channel_guild(&parsed.channel_id).await {
            Ok(guild_id) => guild_id,
            Err(e) => {
                warn!(address, error = %e, "could not resolve guild for target");
                None
            },
        };

        self.insert_target(channel, ForwardTarget {
            platform: parsed.platform,
            channel_id: parsed.channel_id,
            self_id: bot.self_id().to_string(),
            guild_id,
        })
        .await
    }

    /// Append a fully specified destination unless the channel is already a target.
    pub async fn insert_target(
        &self,
        channel: &ChannelRef,
        target: ForwardTarget,
    ) -> Result<TargetUpdate> {
        let store = self.store()?;
        let mut targets = store.get_targets(channel).await?.unwrap_or_default();
        if targets.iter().any(|t| t.same_channel(&target.channel())) {
            return Ok(TargetUpdate::Unchanged);
        }
        info!(channel = %channel, target = %target.channel(), self_id = %target.self_id, "adding forward target");
        targets.push(target);
        store.upsert_targets(channel, &targets).await?;
        Ok(TargetUpdate::Updated)
    }

    pub async fn remove_target(&self, channel: &ChannelRef, address: &str) -> Result<TargetUpdate> {
        let removed = self
            .parse_address(address)
            .ok_or_else(|| Error::invalid_address(address))?;
        self.remove_channel(channel, &removed).await
    }

    /// Drop every target pointing at `removed`.
    pub async fn remove_channel(
        &self,
        channel: &ChannelRef,
        removed: &ChannelRef,
    ) -> Result<TargetUpdate> {
        let store = self.store()?;
        let mut targets = store.get_targets(channel).await?.unwrap_or_default();
        let before = targets.len();
        targets.retain(|t| !t.same_channel(removed));
        if targets.len() == before {
            return Ok(TargetUpdate::Unchanged);
        }
        info!(channel = %channel, target = %removed, "removing forward target");
        store.upsert_targets(channel, &targets).await?;
        Ok(TargetUpdate::Updated)
    }

    pub async fn clear_targets(&self, channel: &ChannelRef) -> Result<TargetUpdate> {
        let store = self.store()?;
        let targets = store.get_targets(channel).await?.unwrap_or_default();
        if targets.is_empty() {
            return Ok(TargetUpdate::Unchanged);
        }
        info!(channel = %channel, count = targets.len(), "clearing forward targets");
        store.upsert_targets(channel, &[]).await?;
        Ok(TargetUpdate::Updated)
    }

    fn store(&self) -> Result<&Arc<dyn ForwardStore>> {
        match &self.source {
            TargetSource::Persistent(store) => Ok(store),
            TargetSource::Static(_) => Err(Error::ReadOnlyTargets),
        }
    }
}
