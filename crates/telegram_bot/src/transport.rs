//! Outbound chat operations.
//!
//! The conversation only needs four calls from the chat platform; they are
//! behind [`ChatOutput`] so the flow can run against Telegram or a recorder.

use std::future::Future;

use teloxide::{
    RequestError,
    prelude::*,
    types::{CallbackQueryId, ChatId, InlineKeyboardMarkup, MessageId, ParseMode},
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Texts are HTML formatted.
pub trait ChatOutput: Send + Sync {
    fn send_text(
        &self,
        chat_id: ChatId,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<MessageId, TransportError>> + Send;

    fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[derive(Clone, Debug)]
pub struct TelegramOutput {
    bot: Bot,
}

impl TelegramOutput {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

impl ChatOutput for TelegramOutput {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TransportError> {
        let mut req = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = markup {
            req = req.reply_markup(kb);
        }
        Ok(req.await?.id)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let mut req = self
            .bot
            .edit_message_text(chat_id, message_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = markup {
            req = req.reply_markup(kb);
        }
        req.await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut req = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(notice) = notice {
            req = req.text(notice);
        }
        req.await?;
        Ok(())
    }
}
