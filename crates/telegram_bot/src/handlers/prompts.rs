//! Message bookkeeping: which bot prompts are on screen and how they are
//! replaced.
//!
//! Chat calls here are best effort. A failure is logged and the conversation
//! moves on; the captured data never depends on a message being gone.

use teloxide::types::{InlineKeyboardMarkup, MessageId};

use super::Conversation;
use crate::{
    sink::Sink,
    state::{ChatKey, PromptSlot},
    transport::{ChatOutput, TransportError},
};

/// Keeps the success value, logs the failure.
pub(super) fn logged<T>(result: Result<T, TransportError>, key: ChatKey, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(chat_id = key.chat_id, "{what} failed: {err}");
            None
        }
    }
}

impl<O: ChatOutput, S: Sink> Conversation<O, S> {
    pub(super) async fn delete(&self, key: ChatKey, message_id: MessageId) {
        let result = self.output.delete_message(key.chat(), message_id).await;
        logged(result, key, "delete message");
    }

    pub(super) async fn take_slot(&self, key: ChatKey, slot: PromptSlot) -> Option<MessageId> {
        match self.sessions.pop_prompt(key, slot).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(chat_id = key.chat_id, slot = slot.name(), "slot not cleared: {err}");
                None
            }
        }
    }

    /// Empties `slot` and deletes the message it pointed to.
    pub(super) async fn retract(&self, key: ChatKey, slot: PromptSlot) {
        if let Some(id) = self.take_slot(key, slot).await {
            tracing::debug!(chat_id = key.chat_id, slot = slot.name(), message_id = id.0, "retracting prompt");
            self.delete(key, id).await;
        }
    }

    pub(super) async fn retract_all(&self, key: ChatKey) {
        for slot in PromptSlot::ALL {
            self.retract(key, slot).await;
        }
    }

    /// Replaces whatever `slot` shows with a new message. `None` when the
    /// new message could not be sent.
    pub(super) async fn present(
        &self,
        key: ChatKey,
        slot: PromptSlot,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Option<MessageId> {
        self.retract(key, slot).await;
        let sent = self.output.send_text(key.chat(), text, markup).await;
        let id = logged(sent, key, "send prompt")?;
        self.track(key, slot, id).await;
        Some(id)
    }

    /// Edits the menu in place when there is one, otherwise sends a new menu.
    pub(super) async fn show_menu(&self, key: ChatKey, text: String, markup: InlineKeyboardMarkup) {
        let menu = self.sessions.get(key).await.prompts.get(PromptSlot::Menu);
        if let Some(id) = menu
            && self
                .output
                .edit_text(key.chat(), id, text.clone(), Some(markup.clone()))
                .await
                .is_ok()
        {
            return;
        }

        self.present(key, PromptSlot::Menu, text, Some(markup)).await;
    }

    async fn track(&self, key: ChatKey, slot: PromptSlot, id: MessageId) {
        match self.sessions.set_prompt(key, slot, id).await {
            Ok(Some(previous)) if previous != id => {
                // Slot was refilled after the retract; drop the older message.
                self.delete(key, previous).await;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(chat_id = key.chat_id, slot = slot.name(), "prompt not tracked: {err}");
            }
        }
    }

    /// Untracked message: acknowledgements and notices.
    pub(super) async fn notify(&self, key: ChatKey, text: &str) {
        let sent = self.output.send_text(key.chat(), text.to_string(), None).await;
        logged(sent, key, "send notice");
    }

    pub(super) async fn answer(&self, callback_id: &str, notice: Option<&str>) {
        if let Err(err) = self.output.answer_callback(callback_id, notice).await {
            tracing::warn!(callback_id, "answer callback failed: {err}");
        }
    }
}
