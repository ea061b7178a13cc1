//! Outbound reply boundary between handlers and Telegram
//!
//! Handlers never call the Bot API directly; they emit `ReplyRequest`s
//! through the `Outbound` trait. Production wires in `BotOutbound`, tests
//! substitute a recording double.

use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyParameters};

/// One outbound reply: target chat, text body, optional reply-to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub chat_id: ChatId,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

impl ReplyRequest {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
        }
    }

    pub fn in_reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Sink for outbound replies.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_reply(&self, reply: ReplyRequest) -> Result<(), teloxide::RequestError>;
}

/// Production implementation over the Telegram Bot API.
pub struct BotOutbound {
    bot: Bot,
}

impl BotOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbound for BotOutbound {
    async fn send_reply(&self, reply: ReplyRequest) -> Result<(), teloxide::RequestError> {
        let mut request = self.bot.send_message(reply.chat_id, reply.text);
        if let Some(message_id) = reply.reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        request.await?;
        Ok(())
    }
}
