/// Config schema types (forwarding rules, relay timing, storage).
use serde::{Deserialize, Serialize};

/// Default reply window: one hour.
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosslinkConfig {
    pub forward: ForwardConfig,
    pub database: DatabaseConfig,
}

/// Where forwarding destinations come from. Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Per-channel target lists in the database, edited with `forward` commands.
    #[default]
    Database,
    /// Immutable rule table from this file.
    Config,
}

/// How messages in one-to-one conversations are treated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DirectMessageMode {
    /// Same as group messages: replies are routed back, everything else forwarded.
    #[default]
    Relay,
    /// Forwarded to configured targets, never routed back as a reply.
    ForwardOnly,
    /// Not relayed at all.
    Ignore,
}

/// Forwarding behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    pub mode: ForwardMode,

    /// Static rules; only consulted in `config` mode.
    pub rules: Vec<ForwardRule>,

    /// How long (ms) a relayed message accepts replies that are routed back.
    #[serde(alias = "replyTimeout")]
    pub reply_timeout: u64,

    #[serde(alias = "directMessages")]
    pub direct_messages: DirectMessageMode,

    /// Drop messages authored by one of the connected bots.
    #[serde(alias = "ignoreSelf")]
    pub ignore_self: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            mode: ForwardMode::default(),
            rules: Vec::new(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT_MS,
            direct_messages: DirectMessageMode::default(),
            ignore_self: true,
        }
    }
}

/// One static forwarding rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRule {
    /// Source channel address, `platform:channel_id`.
    pub source: String,
    /// Destination channel address, `platform:channel_id`.
    pub target: String,
    /// Bot that posts into the destination.
    #[serde(alias = "selfId")]
    pub self_id: String,
    #[serde(default, alias = "guildId", skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. Empty means `<data_dir>/crosslink.db`.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CrosslinkConfig::default();
        assert_eq!(cfg.forward.mode, ForwardMode::Database);
        assert_eq!(cfg.forward.reply_timeout, 3_600_000);
        assert_eq!(cfg.forward.direct_messages, DirectMessageMode::Relay);
        assert!(cfg.forward.ignore_self);
        assert!(cfg.forward.rules.is_empty());
        assert_eq!(cfg.database.max_connections, 5);
    }

    #[test]
    fn deserialize_config_mode_from_toml() {
        let toml_str = r#"
            [forward]
            mode = "config"
            reply_timeout = 1000
            direct_messages = "forward_only"

            [[forward.rules]]
            source = "onebot:100"
            target = "discord:200"
            self_id = "B1"
        "#;
        let cfg: CrosslinkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.forward.mode, ForwardMode::Config);
        assert_eq!(cfg.forward.reply_timeout, 1000);
        assert_eq!(cfg.forward.direct_messages, DirectMessageMode::ForwardOnly);
        assert_eq!(cfg.forward.rules, vec![ForwardRule {
            source: "onebot:100".into(),
            target: "discord:200".into(),
            self_id: "B1".into(),
            guild_id: None,
        }]);
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let json = r#"{
            "forward": {
                "replyTimeout": 5000,
                "rules": [{"source": "a:1", "target": "b:2", "selfId": "x", "guildId": "g"}]
            }
        }"#;
        let cfg: CrosslinkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.forward.reply_timeout, 5000);
        assert_eq!(cfg.forward.rules[0].self_id, "x");
        assert_eq!(cfg.forward.rules[0].guild_id.as_deref(), Some("g"));
    }
}
