use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::plugin::RelayBot;

/// `(platform, self_id)` of a connected bot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BotIdentity {
    pub platform: String,
    pub self_id: String,
}

/// Registry of currently connected bots, in connection order.
pub struct BotRegistry {
    bots: RwLock<Vec<Arc<dyn RelayBot>>>,
}

impl Default for BotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BotRegistry {
    pub fn new() -> Self {
        Self {
            bots: RwLock::new(Vec::new()),
        }
    }

    /// Register a connected bot, replacing any previous bot with the same identity.
    pub fn register(&self, bot: Arc<dyn RelayBot>) {
        let mut bots = self.bots.write().unwrap_or_else(|e| e.into_inner());
        bots.retain(|b| !(b.platform() == bot.platform() && b.self_id() == bot.self_id()));
        info!(platform = bot.platform(), self_id = bot.self_id(), "bot connected");
        bots.push(bot);
    }

    /// Remove a disconnected bot. Returns whether it was registered.
    pub fn unregister(&self, platform: &str, self_id: &str) -> bool {
        let mut bots = self.bots.write().unwrap_or_else(|e| e.into_inner());
        let before = bots.len();
        bots.retain(|b| !(b.platform() == platform && b.self_id() == self_id));
        let removed = bots.len() != before;
        if removed {
            info!(platform, self_id, "bot disconnected");
        }
        removed
    }

    /// The connected bot with this exact identity.
    pub fn bot_for(&self, platform: &str, self_id: &str) -> Option<Arc<dyn RelayBot>> {
        let bots = self.bots.read().unwrap_or_else(|e| e.into_inner());
        bots.iter()
            .find(|b| b.platform() == platform && b.self_id() == self_id)
            .map(Arc::clone)
    }

    /// The first connected bot serving `platform`.
    pub fn find_by_platform(&self, platform: &str) -> Option<Arc<dyn RelayBot>> {
        let bots = self.bots.read().unwrap_or_else(|e| e.into_inner());
        let found = bots.iter().find(|b| b.platform() == platform).map(Arc::clone);
        if found.is_none() {
            debug!(platform, "no connected bot for platform");
        }
        found
    }

    /// Whether `user_id` is one of the connected bots on `platform`.
    pub fn is_self(&self, platform: &str, user_id: &str) -> bool {
        let bots = self.bots.read().unwrap_or_else(|e| e.into_inner());
        bots.iter()
            .any(|b| b.platform() == platform && b.self_id() == user_id)
    }

    /// Identities of all connected bots.
    pub fn connected(&self) -> Vec<BotIdentity> {
        let bots = self.bots.read().unwrap_or_else(|e| e.into_inner());
        bots.iter()
            .map(|b| BotIdentity {
                platform: b.platform().to_string(),
                self_id: b.self_id().to_string(),
            })
            .collect()
    }

    /// Distinct names of platforms with at least one connected bot.
    pub fn platforms(&self) -> Vec<String> {
        let bots = self.bots.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = bots.iter().map(|b| b.platform().to_string()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.bots.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::plugin::MemberDirectory, async_trait::async_trait};

    struct StubBot {
        platform: &'static str,
        self_id: &'static str,
    }

    #[async_trait]
    impl RelayBot for StubBot {
        fn platform(&self) -> &str {
            self.platform
        }

        fn self_id(&self) -> &str {
            self.self_id
        }

        async fn send_message(
            &self,
            _channel_id: &str,
            _content: &str,
            _guild_id: Option<&str>,
        ) -> crate::Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn members_of(&self, _guild_id: &str) -> crate::Result<MemberDirectory> {
            Ok(MemberDirectory::new())
        }
    }

    fn stub(platform: &'static str, self_id: &'static str) -> Arc<dyn RelayBot> {
        Arc::new(StubBot { platform, self_id })
    }

    #[test]
    fn lookup_by_identity_and_platform() {
        let registry = BotRegistry::new();
        registry.register(stub("onebot", "A1"));
        registry.register(stub("discord", "B1"));
        registry.register(stub("discord", "B2"));

        assert!(registry.bot_for("discord", "B2").is_some());
        assert!(registry.bot_for("discord", "A1").is_none());
        assert_eq!(
            registry.find_by_platform("discord").unwrap().self_id(),
            "B1"
        );
        assert!(registry.find_by_platform("telegram").is_none());
        assert_eq!(registry.platforms(), vec!["discord", "onebot"]);
        assert!(registry.is_self("onebot", "A1"));
        assert!(!registry.is_self("discord", "A1"));
    }

    #[test]
    fn reregistering_replaces_identity() {
        let registry = BotRegistry::new();
        registry.register(stub("onebot", "A1"));
        registry.register(stub("onebot", "A1"));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister("onebot", "A1"));
        assert!(!registry.unregister("onebot", "A1"));
        assert!(registry.is_empty());
        assert!(registry.connected().is_empty());
    }
}
