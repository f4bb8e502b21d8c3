//! Entry point wiring the resolver, dispatcher and reply interceptor together.

use std::{future::Future, sync::Arc, time::Duration};

use {
    crosslink_channels::{BotRegistry, ChannelRef, InboundMessage},
    crosslink_config::{DEFAULT_REPLY_TIMEOUT_MS, ForwardConfig, ForwardMode},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    commands::{CommandReply, ForwardCommand},
    dispatch::Dispatcher,
    interceptor::{Disposition, ReplyInterceptor},
    store::ForwardStore,
    targets::{TargetResolver, TargetSource, TargetUpdate},
};

/// Relays inbound messages between bridged channels.
pub struct Forwarder {
    bots: Arc<BotRegistry>,
    resolver: TargetResolver,
    dispatcher: Dispatcher,
    interceptor: ReplyInterceptor,
}

impl Forwarder {
    /// Build from config. Database mode needs a `store`; config mode ignores it.
    pub fn new(
        config: &ForwardConfig,
        bots: Arc<BotRegistry>,
        store: Option<Arc<dyn ForwardStore>>,
    ) -> Result<Self> {
        let source = match config.mode {
            ForwardMode::Config => TargetSource::Static(config.rules.clone()),
            ForwardMode::Database => TargetSource::Persistent(store.ok_or(Error::StoreRequired)?),
        };

        let reply_timeout = if config.reply_timeout == 0 {
            warn!("reply_timeout must be positive, using the default");
            DEFAULT_REPLY_TIMEOUT_MS
        } else {
            config.reply_timeout
        };

        Ok(Self {
            resolver: TargetResolver::new(source, Arc::clone(&bots)),
            dispatcher: Dispatcher::new(Arc::clone(&bots), Duration::from_millis(reply_timeout)),
            interceptor: ReplyInterceptor::from_config(config),
            bots,
        })
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the host's own handling (`next`) alongside relaying `message`.
    ///
    /// Both run concurrently and both are awaited. Relay failures are logged
    /// and never reach the caller; only `next`'s output is returned.
    pub async fn handle<F, T>(&self, message: &InboundMessage, next: F) -> T
    where
        F: Future<Output = T>,
    {
        let (output, _) = tokio::join!(next, self.relay(message));
        output
    }

    /// Relay `message` according to its disposition. Returns how many
    /// destinations received it.
    pub async fn relay(&self, message: &InboundMessage) -> usize {
        match self
            .interceptor
            .classify(message, &self.dispatcher, &self.bots)
        {
            Disposition::Ignore => 0,
            Disposition::Reply(origin) => {
                let origin = origin.into_target();
                match self.dispatcher.relay(message, &origin).await {
                    Ok(sent) => usize::from(sent > 0),
                    Err(e) => {
                        warn!(
                            message_id = %message.message_id,
                            origin = %origin.channel(),
                            error = %e,
                            "reply relay failed"
                        );
                        0
                    },
                }
            },
            Disposition::Forward => {
                let source = message.source();
                let targets = self.resolver.resolve(&source).await;
                if targets.is_empty() {
                    debug!(channel = %source, "no forward targets");
                    return 0;
                }
                self.dispatcher.fan_out(message, &targets).await
            },
        }
    }

    /// Run a `forward` command issued in `channel`.
    pub async fn execute(&self, channel: &ChannelRef, command: ForwardCommand) -> CommandReply {
        let outcome = match &command {
            ForwardCommand::List => return self.list(channel).await,
            ForwardCommand::Add { address } => self.resolver.add_target(channel, address).await,
            ForwardCommand::Remove { address } => {
                self.resolver.remove_target(channel, address).await
            },
            ForwardCommand::Clear => self.resolver.clear_targets(channel).await,
        };

        match outcome {
            Ok(TargetUpdate::Updated) => CommandReply::Updated,
            Ok(TargetUpdate::Unchanged) => CommandReply::Unchanged,
            Err(Error::ReadOnlyTargets) => CommandReply::ReadOnly,
            Err(Error::NoMatchingBot { address }) => CommandReply::NoMatchingBot { address },
            Err(Error::InvalidAddress { address }) => CommandReply::InvalidAddress { address },
            Err(e) => {
                warn!(channel = %channel, command = ?command, error = %e, "forward command failed");
                CommandReply::UpdateFailed
            },
        }
    }

    /// Run command text such as `add discord:200`; unparsable text yields usage help.
    pub async fn execute_text(&self, channel: &ChannelRef, text: &str) -> CommandReply {
        match ForwardCommand::parse(text) {
            Some(command) => self.execute(channel, command).await,
            None => CommandReply::Usage,
        }
    }

    async fn list(&self, channel: &ChannelRef) -> CommandReply {
        let targets = self.resolver.resolve(channel).await;
        if targets.is_empty() {
            return CommandReply::NoTargets;
        }
        CommandReply::Targets(targets.iter().map(|t| t.channel().to_string()).collect())
    }
}
