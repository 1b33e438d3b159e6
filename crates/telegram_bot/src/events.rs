//! Inbound events, decoded from Telegram updates.

use teloxide::{
    types::{CallbackQuery, Message, MessageId, Update, UpdateKind, User},
    utils::command::BotCommands,
};

use crate::state::{ChatKey, Identity};

/// Slash commands understood in any state.
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "Bot ini mencatat transaksi ke buku kas."
)]
pub enum Command {
    #[command(description = "mulai pencatatan baru")]
    Start,
    #[command(description = "batalkan pencatatan")]
    Cancel,
    #[command(description = "tampilkan pesan ini")]
    Help,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    Text {
        message_id: MessageId,
        text: String,
    },
    Callback {
        id: String,
        message_id: Option<MessageId>,
        data: String,
    },
}

/// One event together with the chat and user it is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incoming {
    pub key: ChatKey,
    pub identity: Identity,
    pub event: Event,
}

impl Incoming {
    pub fn command(key: ChatKey, identity: Identity, command: Command) -> Self {
        Self {
            key,
            identity,
            event: Event::Command(command),
        }
    }

    pub fn text(
        key: ChatKey,
        identity: Identity,
        message_id: MessageId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            key,
            identity,
            event: Event::Text {
                message_id,
                text: text.into(),
            },
        }
    }

    pub fn callback(
        key: ChatKey,
        identity: Identity,
        id: impl Into<String>,
        message_id: Option<MessageId>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            key,
            identity,
            event: Event::Callback {
                id: id.into(),
                message_id,
                data: data.into(),
            },
        }
    }

    /// `None` for updates the conversation has nothing to do with
    /// (edited messages, media without text, callbacks without data, ...).
    ///
    /// `bot_username` is matched against commands addressed as
    /// `/start@name`; a command for another bot is plain text.
    pub fn from_update(update: &Update, bot_username: &str) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(msg) => Self::from_message(msg, bot_username),
            UpdateKind::CallbackQuery(q) => Self::from_callback(q),
            _ => None,
        }
    }

    fn from_message(msg: &Message, bot_username: &str) -> Option<Self> {
        let from = msg.from.as_ref()?;
        let text = msg.text()?;
        let key = ChatKey::new(msg.chat.id, from.id.0);
        let identity = identity_of(from);

        Some(match Command::parse(text.trim(), bot_username) {
            Ok(command) => Self::command(key, identity, command),
            Err(_) => Self::text(key, identity, msg.id, text),
        })
    }

    fn from_callback(q: &CallbackQuery) -> Option<Self> {
        let message = q.message.as_ref()?;
        let data = q.data.clone()?;
        let key = ChatKey::new(message.chat().id, q.from.id.0);
        Some(Self::callback(
            key,
            identity_of(&q.from),
            q.id.0.clone(),
            Some(message.id()),
            data,
        ))
    }
}

fn identity_of(user: &User) -> Identity {
    Identity::new(user.id.0, user.first_name.clone(), user.username.clone())
}
