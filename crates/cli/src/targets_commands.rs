//! Offline management of stored forward targets.
//!
//! No bots are connected here, so addresses are split with the platform names
//! given via `--platform` (for names containing `:`), else at the first `:`.

use std::sync::Arc;

use {
    anyhow::{Context, Result, bail},
    clap::{Args, Subcommand},
    crosslink_channels::{BotRegistry, ChannelRef},
    crosslink_config::{CrosslinkConfig, ForwardMode},
    crosslink_forward::{
        ForwardStore, ForwardTarget, SqliteForwardStore, TargetResolver, TargetSource,
        TargetUpdate, parse_address,
    },
};

#[derive(Args)]
pub struct ChannelArgs {
    /// Source channel, `platform:channel_id`.
    #[arg(long)]
    channel: String,
    /// Platform name containing `:` (repeatable), e.g. `qq:guild`.
    #[arg(long = "platform")]
    platforms: Vec<String>,
}

#[derive(Subcommand)]
pub enum TargetsAction {
    /// Show the targets stored for a channel.
    List {
        #[command(flatten)]
        channel: ChannelArgs,
    },
    /// Add a target. The sending bot must be named since no bots are online.
    Add {
        #[command(flatten)]
        channel: ChannelArgs,
        /// Destination address, `platform:channel_id`.
        address: String,
        /// Bot that posts into the destination.
        #[arg(long)]
        self_id: String,
        /// Group context required by some destination platforms.
        #[arg(long)]
        guild_id: Option<String>,
    },
    /// Remove a target.
    Remove {
        #[command(flatten)]
        channel: ChannelArgs,
        /// Destination address, `platform:channel_id`.
        address: String,
    },
    /// Remove every target of a channel.
    Clear {
        #[command(flatten)]
        channel: ChannelArgs,
    },
    /// List every channel that has stored targets.
    Channels,
}

pub async fn handle_targets(action: TargetsAction) -> Result<()> {
    let config = crosslink_config::discover_and_load();
    if config.forward.mode == ForwardMode::Config {
        eprintln!("note: forward.mode is \"config\"; stored targets are not used");
    }
    let store = open_store(&config).await?;

    if let TargetsAction::Channels = action {
        for channel in store.list_channels().await? {
            println!("{channel}");
        }
        return Ok(());
    }

    let resolver = TargetResolver::new(
        TargetSource::Persistent(Arc::clone(&store)),
        Arc::new(BotRegistry::new()),
    );

    let update = match action {
        TargetsAction::List { channel } => {
            let source = channel.source()?;
            print_targets(&resolver.resolve(&source).await);
            return Ok(());
        },
        TargetsAction::Add {
            channel,
            address,
            self_id,
            guild_id,
        } => {
            let destination = channel.parse(&address)?;
            resolver
                .insert_target(&channel.source()?, ForwardTarget {
                    platform: destination.platform,
                    channel_id: destination.channel_id,
                    self_id,
                    guild_id,
                })
                .await?
        },
        TargetsAction::Remove { channel, address } => {
            let destination = channel.parse(&address)?;
            resolver
                .remove_channel(&channel.source()?, &destination)
                .await?
        },
        TargetsAction::Clear { channel } => resolver.clear_targets(&channel.source()?).await?,
        TargetsAction::Channels => return Ok(()),
    };

    match update {
        TargetUpdate::Updated => println!("updated"),
        TargetUpdate::Unchanged => println!("unchanged"),
    }
    Ok(())
}

/// Print the destinations `address` resolves to under the current config.
pub async fn resolve(address: &str, platforms: Vec<String>) -> Result<()> {
    let config = crosslink_config::discover_and_load();
    print_targets(&resolve_targets(&config, address, platforms).await?);
    Ok(())
}

async fn resolve_targets(
    config: &CrosslinkConfig,
    address: &str,
    platforms: Vec<String>,
) -> Result<Vec<ForwardTarget>> {
    let source = match config.forward.mode {
        ForwardMode::Config => TargetSource::Static(config.forward.rules.clone()),
        ForwardMode::Database => TargetSource::Persistent(open_store(config).await?),
    };
    let resolver =
        TargetResolver::new(source, Arc::new(BotRegistry::new())).with_platforms(platforms);

    let channel = resolver
        .parse_address(address)
        .with_context(|| format!("invalid address {address}, expected platform:channel_id"))?;
    Ok(resolver.resolve(&channel).await)
}

impl ChannelArgs {
    fn parse(&self, address: &str) -> Result<ChannelRef> {
        match parse_address(address, &self.platforms) {
            Some(channel) => Ok(channel),
            None => bail!("invalid address {address}, expected platform:channel_id"),
        }
    }

    fn source(&self) -> Result<ChannelRef> {
        self.parse(&self.channel)
    }
}

async fn open_store(config: &CrosslinkConfig) -> Result<Arc<dyn ForwardStore>> {
    let url = crosslink_config::database_url(config);
    if config.database.url.trim().is_empty() {
        let dir = crosslink_config::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
    }
    let store = SqliteForwardStore::new(&url, config.database.max_connections)
        .await
        .with_context(|| format!("failed to open forward store at {url}"))?;
    Ok(Arc::new(store))
}

fn print_targets(targets: &[ForwardTarget]) {
    if targets.is_empty() {
        eprintln!("no targets");
        return;
    }
    for target in targets {
        match &target.guild_id {
            Some(guild_id) => println!(
                "{}\tbot={}\tguild={guild_id}",
                target.channel(),
                target.self_id
            ),
            None => println!("{}\tbot={}", target.channel(), target.self_id),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn args(channel: &str, platforms: &[&str]) -> ChannelArgs {
        ChannelArgs {
            channel: channel.into(),
            platforms: platforms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn declared_platforms_win_over_first_colon() {
        let args = args("qq:guild:5", &["qq:guild"]);
        assert_eq!(args.source().unwrap(), ChannelRef::new("qq:guild", "5"));
    }

    #[test]
    fn undeclared_platform_splits_at_first_colon() {
        let args = args("qq:guild:5", &[]);
        assert_eq!(args.source().unwrap(), ChannelRef::new("qq", "guild:5"));
        assert!(args.parse("no-colon").is_err());
    }

    #[tokio::test]
    async fn resolve_honours_declared_platforms() {
        let config = CrosslinkConfig {
            forward: crosslink_config::ForwardConfig {
                mode: ForwardMode::Config,
                rules: vec![crosslink_config::ForwardRule {
                    source: "qq:guild:1".into(),
                    target: "qq:guild:2".into(),
                    self_id: "Q1".into(),
                    guild_id: None,
                }],
                ..Default::default()
            },
            ..Default::default()
        };

        let targets = resolve_targets(&config, "qq:guild:1", vec!["qq:guild".into()])
            .await
            .unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].channel(), ChannelRef::new("qq:guild", "2"));

        let undeclared = resolve_targets(&config, "qq:guild:1", Vec::new()).await.unwrap();
        assert_eq!(undeclared[0].channel(), ChannelRef::new("qq", "guild:2"));
    }

    #[tokio::test]
    async fn store_is_created_in_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = CrosslinkConfig {
            database: crosslink_config::DatabaseConfig {
                url: format!(
                    "sqlite://{}?mode=rwc",
                    tmp.path().join("targets.db").display()
                ),
                max_connections: 1,
            },
            ..Default::default()
        };
        let store = open_store(&config).await.unwrap();
        let channel = ChannelRef::new("onebot", "100");
        store
            .upsert_targets(&channel, &[ForwardTarget {
                platform: "discord".into(),
                channel_id: "200".into(),
                self_id: "B1".into(),
                guild_id: None,
            }])
            .await
            .unwrap();
        assert_eq!(store.list_channels().await.unwrap(), vec![channel]);
    }
}
