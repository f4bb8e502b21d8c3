//! Decides whether an inbound message is a reply to route back or a message
//! to forward.

use {
    crosslink_channels::{BotRegistry, InboundMessage},
    crosslink_config::{DirectMessageMode, ForwardConfig},
    tracing::debug,
};

use crate::{dispatch::Dispatcher, types::RelayEntry};

/// What the forwarder does with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not relayed anywhere.
    Ignore,
    /// Quotes one of our relayed messages: send only to its origin.
    Reply(RelayEntry),
    /// Fan out to the channel's resolved targets.
    Forward,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplyInterceptor {
    direct_messages: DirectMessageMode,
    ignore_self: bool,
}

impl ReplyInterceptor {
    pub fn new(direct_messages: DirectMessageMode, ignore_self: bool) -> Self {
        Self {
            direct_messages,
            ignore_self,
        }
    }

    pub fn from_config(config: &ForwardConfig) -> Self {
        Self::new(config.direct_messages, config.ignore_self)
    }

    pub fn classify(
        &self,
        message: &InboundMessage,
        dispatcher: &Dispatcher,
        bots: &BotRegistry,
    ) -> Disposition {
        if self.ignore_self && bots.is_self(&message.platform, &message.author.id) {
            debug!(message_id = %message.message_id, author = %message.author.id, "ignoring message from a connected bot");
            return Disposition::Ignore;
        }

        if message.direct {
            match self.direct_messages {
                DirectMessageMode::Ignore => return Disposition::Ignore,
                DirectMessageMode::ForwardOnly => return Disposition::Forward,
                DirectMessageMode::Relay => {},
            }
        }

        let Some(quote) = &message.quote else {
            return Disposition::Forward;
        };
        match dispatcher.reply_origin(&quote.id) {
            Some(origin) => {
                debug!(message_id = %message.message_id, quoted = %quote.id, "reply to relayed message");
                Disposition::Reply(origin)
            },
            None => Disposition::Forward,
        }
    }
}

impl Default for ReplyInterceptor {
    fn default() -> Self {
        Self::new(DirectMessageMode::default(), true)
    }
}
