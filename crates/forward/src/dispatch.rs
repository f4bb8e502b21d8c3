//! Fan-out of one inbound message to its destinations.
//!
//! Each destination is delivered independently: a missing bot or a failed
//! send is logged and never affects the other destinations.

use std::{sync::Arc, time::Duration};

use {
    crosslink_channels::{BotRegistry, InboundMessage},
    futures::future::join_all,
    tracing::{debug, warn},
};

use crate::{
    Error, Result, mention,
    relay_table::RelayTable,
    types::{ForwardTarget, RelayEntry},
};

/// Sends relayed content and records where replies should go.
///
/// Sole owner of the relay table.
pub struct Dispatcher {
    bots: Arc<BotRegistry>,
    relays: RelayTable,
}

impl Dispatcher {
    pub fn new(bots: Arc<BotRegistry>, reply_timeout: Duration) -> Self {
        Self {
            bots,
            relays: RelayTable::new(reply_timeout),
        }
    }

    /// Origin recorded for one of our relayed messages, if replies are still accepted.
    pub fn reply_origin(&self, message_id: &str) -> Option<RelayEntry> {
        self.relays.get(message_id)
    }

    /// Relayed messages still accepting replies.
    pub fn pending_replies(&self) -> usize {
        self.relays.len()
    }

    /// Relay `message` to a single destination. Returns the number of messages sent.
    pub async fn relay(&self, message: &InboundMessage, destination: &ForwardTarget) -> Result<usize> {
        match self.prepare(message).await {
            Some(text) => self.deliver(message, &text, destination).await,
            None => Ok(0),
        }
    }

    /// Relay `message` to every destination concurrently.
    ///
    /// Returns how many destinations received it.
    pub async fn fan_out(&self, message: &InboundMessage, destinations: &[ForwardTarget]) -> usize {
        if destinations.is_empty() {
            return 0;
        }
        let Some(text) = self.prepare(message).await else {
            return 0;
        };

        let deliveries = destinations.iter().map(|destination| {
            let text = text.as_str();
            async move {
                match self.deliver(message, text, destination).await {
                    Ok(_) => true,
                    Err(e) => {
                        log_failure(message, destination, &e);
                        false
                    },
                }
            }
        });
        join_all(deliveries).await.into_iter().filter(|ok| *ok).count()
    }

    /// Content as it will appear in destinations, or `None` if there is nothing to relay.
    async fn prepare(&self, message: &InboundMessage) -> Option<String> {
        let content = message.content.trim();
        if content.is_empty() {
            debug!(message_id = %message.message_id, "empty content, nothing to relay");
            return None;
        }

        let body = match message.group_guild() {
            Some(guild_id) if mention::has_mentions(content) => {
                self.rewrite_mentions(message, guild_id, content).await
            },
            _ => content.to_string(),
        };
        Some(format!("{}: {body}", message.author.display_name()))
    }

    async fn rewrite_mentions(&self, message: &InboundMessage, guild_id: &str, content: &str) -> String {
        let Some(bot) = self.bots.bot_for(&message.platform, &message.self_id) else {
            debug!(platform = %message.platform, self_id = %message.self_id, "source bot gone, mentions left as-is");
            return content.to_string();
        };
        match bot.members_of(guild_id).await {
            Ok(directory) => mention::rewrite_mentions(content, &directory),
            Err(e) => {
                warn!(platform = %message.platform, guild_id, error = %e, "member lookup failed, mentions left as-is");
                content.to_string()
            },
        }
    }

    async fn deliver(
        &self,
        message: &InboundMessage,
        text: &str,
        destination: &ForwardTarget,
    ) -> Result<usize> {
        let bot = self
            .bots
            .bot_for(&destination.platform, &destination.self_id)
            .ok_or_else(|| Error::bot_unavailable(&destination.platform, &destination.self_id))?;

        let sent = bot
            .send_message(&destination.channel_id, text, destination.guild_id.as_deref())
            .await?;

        let origin = RelayEntry::origin_of(message);
        for id in &sent {
            self.relays.put(id.clone(), origin.clone());
        }
        debug!(
            message_id = %message.message_id,
            target = %destination.channel(),
            sent = sent.len(),
            "relayed message"
        );
        Ok(sent.len())
    }
}

fn log_failure(message: &InboundMessage, destination: &ForwardTarget, error: &Error) {
    match error {
        Error::BotUnavailable { .. } => warn!(
            message_id = %message.message_id,
            target = %destination.channel(),
            self_id = %destination.self_id,
            "skipping destination: bot not connected"
        ),
        _ => warn!(
            message_id = %message.message_id,
            target = %destination.channel(),
            error = %error,
            "relay failed"
        ),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use {
        super::*,
        async_trait::async_trait,
        crosslink_channels::{Author, MemberDirectory, RelayBot},
    };

    #[derive(Default)]
    struct Recorder {
        platform: &'static str,
        self_id: &'static str,
        fail: bool,
        parts: usize,
        sent: Mutex<Vec<(String, String, Option<String>)>>,
    }

    impl Recorder {
        fn new(platform: &'static str, self_id: &'static str) -> Self {
            Self {
                platform,
                self_id,
                parts: 1,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(String, String, Option<String>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelayBot for Recorder {
        fn platform(&self) -> &str {
            self.platform
        }

        fn self_id(&self) -> &str {
            self.self_id
        }

        async fn send_message(
            &self,
            channel_id: &str,
            content: &str,
            guild_id: Option<&str>,
        ) -> crosslink_channels::Result<Vec<String>> {
            if self.fail {
                return Err(crosslink_channels::Error::unavailable("rate limited"));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((
                channel_id.to_string(),
                content.to_string(),
                guild_id.map(str::to_string),
            ));
            let base = sent.len();
            Ok((0..self.parts)
                .map(|i| format!("{}-{channel_id}-{base}-{i}", self.self_id))
                .collect())
        }

        async fn members_of(&self, guild_id: &str) -> crosslink_channels::Result<MemberDirectory> {
            if guild_id == "G1" {
                Ok(MemberDirectory::from([("10".to_string(), "alice".to_string())]))
            } else {
                Err(crosslink_channels::Error::unavailable("unknown guild"))
            }
        }
    }

    fn message(content: &str) -> InboundMessage {
        InboundMessage {
            platform: "onebot".into(),
            self_id: "A1".into(),
            channel: "100".into(),
            guild_id: Some("G1".into()),
            message_id: "in-1".into(),
            author: Author {
                id: "u1".into(),
                name: Some("carol".into()),
                nick: None,
            },
            content: content.into(),
            quote: None,
            direct: false,
        }
    }

    fn target(platform: &str, channel_id: &str, self_id: &str) -> ForwardTarget {
        ForwardTarget {
            platform: platform.into(),
            channel_id: channel_id.into(),
            self_id: self_id.into(),
            guild_id: None,
        }
    }

    fn setup(bots: Vec<Arc<Recorder>>) -> Dispatcher {
        let registry = Arc::new(BotRegistry::new());
        for bot in bots {
            registry.register(bot);
        }
        Dispatcher::new(registry, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn prefixes_author_and_registers_every_part() {
        let source = Arc::new(Recorder::new("onebot", "A1"));
        let mut split = Recorder::new("discord", "B1");
        split.parts = 2;
        let dest = Arc::new(split);
        let dispatcher = setup(vec![source, Arc::clone(&dest)]);

        let mut dst = target("discord", "200", "B1");
        dst.guild_id = Some("DG".into());
        let sent = dispatcher.relay(&message("  hi  "), &dst).await.unwrap();

        assert_eq!(sent, 2);
        assert_eq!(dest.sent(), vec![(
            "200".to_string(),
            "carol: hi".to_string(),
            Some("DG".to_string())
        )]);
        let origin = dispatcher.reply_origin("B1-200-1-1").unwrap();
        assert_eq!(origin.platform, "onebot");
        assert_eq!(origin.channel_id, "100");
        assert_eq!(origin.self_id, "A1");
        assert_eq!(dispatcher.pending_replies(), 2);
    }

    #[tokio::test]
    async fn empty_content_is_a_no_op() {
        let dest = Arc::new(Recorder::new("discord", "B1"));
        let dispatcher = setup(vec![Arc::clone(&dest)]);
        let sent = dispatcher
            .relay(&message("   "), &target("discord", "200", "B1"))
            .await
            .unwrap();
        assert_eq!(sent, 0);
        assert!(dest.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_bot_is_reported() {
        let dispatcher = setup(Vec::new());
        let err = dispatcher
            .relay(&message("hi"), &target("discord", "200", "B1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BotUnavailable { .. }));
    }

    #[tokio::test]
    async fn rewrites_mentions_from_source_guild() {
        let source = Arc::new(Recorder::new("onebot", "A1"));
        let dest = Arc::new(Recorder::new("discord", "B1"));
        let dispatcher = setup(vec![source, Arc::clone(&dest)]);

        dispatcher
            .relay(
                &message(r#"<at id="10"/> look, <at id="77"/>"#),
                &target("discord", "200", "B1"),
            )
            .await
            .unwrap();
        assert_eq!(dest.sent()[0].1, r#"carol: @alice look, <at id="77"/>"#);
    }

    #[tokio::test]
    async fn direct_messages_keep_mention_markup() {
        let source = Arc::new(Recorder::new("onebot", "A1"));
        let dest = Arc::new(Recorder::new("discord", "B1"));
        let dispatcher = setup(vec![source, Arc::clone(&dest)]);

        let mut msg = message(r#"<at id="10"/>"#);
        msg.direct = true;
        dispatcher
            .relay(&msg, &target("discord", "200", "B1"))
            .await
            .unwrap();
        assert_eq!(dest.sent()[0].1, r#"carol: <at id="10"/>"#);
    }

    #[tokio::test]
    async fn failed_member_lookup_keeps_markup() {
        let source = Arc::new(Recorder::new("onebot", "A1"));
        let dest = Arc::new(Recorder::new("discord", "B1"));
        let dispatcher = setup(vec![source, Arc::clone(&dest)]);

        let mut msg = message(r#"<at id="10"/>"#);
        msg.guild_id = Some("G-unknown".into());
        dispatcher
            .relay(&msg, &target("discord", "200", "B1"))
            .await
            .unwrap();
        assert_eq!(dest.sent()[0].1, r#"carol: <at id="10"/>"#);
    }

    #[tokio::test]
    async fn fan_out_isolates_failures() {
        let ok_a = Arc::new(Recorder::new("discord", "B1"));
        let broken = Arc::new(Recorder {
            fail: true,
            ..Recorder::new("qq", "Q1")
        });
        let ok_b = Arc::new(Recorder::new("telegram", "T1"));
        let dispatcher = setup(vec![Arc::clone(&ok_a), broken, Arc::clone(&ok_b)]);

        let delivered = dispatcher
            .fan_out(&message("hello"), &[
                target("discord", "200", "B1"),
                target("qq", "300", "Q1"),
                target("matrix", "400", "M1"),
                target("telegram", "500", "T1"),
            ])
            .await;

        assert_eq!(delivered, 2);
        assert_eq!(ok_a.sent().len(), 1);
        assert_eq!(ok_b.sent().len(), 1);
        assert_eq!(dispatcher.pending_replies(), 2);
    }
}
