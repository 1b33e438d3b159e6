//! The entry conversation.
//!
//! Every event is handled to completion by [`Conversation::handle`]. Nothing
//! survives between two events except what is written to the
//! [`SessionStore`], so a fresh process can pick up any conversation.

use ledger::{Direction, parse_amount};
use teloxide::{
    types::{MessageId, Update},
    utils::command::BotCommands,
};

use crate::{
    events::{Command, Event, Incoming},
    sink::Sink,
    state::{ChatKey, Identity, PromptSlot, Session, SessionStore, Step},
    transport::ChatOutput,
    ui::{self, Action},
};

mod prompts;

/// Placeholder note stored when the user sends only whitespace.
pub const NO_NOTE: &str = "N/A";

/// What a button press does, given the step the conversation is in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Route(Direction),
    UnknownRoute,
    Restart,
    PickCategory(String),
    ShowCategories,
    AskAmount,
    AskNote,
    Submit,
}

/// Transition table for button presses. `None` marks a button that does not
/// belong to the current step.
pub(crate) fn plan(step: Step, action: Action) -> Option<Transition> {
    match (step, action) {
        (Step::ChooseDirection, Action::Direction(direction)) => Some(Transition::Route(direction)),
        (Step::ChooseDirection, Action::Unknown(_)) => Some(Transition::UnknownRoute),
        (Step::ChooseCategory, Action::BackToDirection) => Some(Transition::Restart),
        // Tokens outside the catalog resolve to the "not found" label.
        (Step::ChooseCategory, Action::Category(token) | Action::Unknown(token)) => {
            Some(Transition::PickCategory(token))
        }
        (Step::EnterAmount, Action::BackToCategory) => Some(Transition::ShowCategories),
        (Step::EnterNote | Step::Review, Action::BackToAmount) => Some(Transition::AskAmount),
        (Step::Review, Action::Submit) => Some(Transition::Submit),
        (Step::Review, Action::EditDirection) => Some(Transition::Restart),
        (Step::Review, Action::EditCategory) => Some(Transition::ShowCategories),
        (Step::Review, Action::EditAmount) => Some(Transition::AskAmount),
        (Step::Review, Action::EditNote) => Some(Transition::AskNote),
        _ => None,
    }
}

pub struct Conversation<O, S> {
    output: O,
    sink: S,
    sessions: SessionStore,
    allowed_users: Option<Vec<u64>>,
    bot_username: String,
}

impl<O: ChatOutput, S: Sink> Conversation<O, S> {
    pub fn new(output: O, sink: S, sessions: SessionStore) -> Self {
        Self {
            output,
            sink,
            sessions,
            allowed_users: None,
            bot_username: String::new(),
        }
    }

    /// Restricts the bot to the given user ids. An empty list means everyone.
    pub fn with_allowed_users(mut self, allowed_users: Vec<u64>) -> Self {
        self.allowed_users = (!allowed_users.is_empty()).then_some(allowed_users);
        self
    }

    /// Name matched against `/command@name` addressing.
    pub fn with_bot_username(mut self, bot_username: impl Into<String>) -> Self {
        self.bot_username = bot_username.into();
        self
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Decodes `update` and handles it. Updates that carry no message text
    /// or callback are ignored.
    pub async fn handle_update(&self, update: &Update) {
        match Incoming::from_update(update, &self.bot_username) {
            Some(incoming) => self.handle(incoming).await,
            None => tracing::debug!(update_id = update.id.0, "ignoring unhandled update"),
        }
    }

    pub async fn handle(&self, incoming: Incoming) {
        let Incoming {
            key,
            identity,
            event,
        } = incoming;

        if let Some(allowed) = &self.allowed_users
            && !allowed.contains(&key.user_id)
        {
            tracing::debug!(user_id = key.user_id, "ignoring user outside the allow list");
            if let Event::Callback { id, .. } = &event {
                self.answer(id, None).await;
            }
            return;
        }

        match event {
            Event::Command(Command::Start) => self.begin(key, identity).await,
            Event::Command(Command::Cancel) => self.cancel(key).await,
            Event::Command(Command::Help) => {
                self.notify(key, &Command::descriptions().to_string()).await
            }
            Event::Text { message_id, text } => self.on_text(key, message_id, &text).await,
            Event::Callback {
                id,
                message_id,
                data,
            } => {
                self.on_callback(key, identity, &id, message_id, &data)
                    .await
            }
        }
    }

    async fn on_text(&self, key: ChatKey, message_id: MessageId, text: &str) {
        let session = self.sessions.get(key).await;
        match session.step {
            None => {
                tracing::info!(chat_id = key.chat_id, "text without an active session");
                self.notify(key, ui::SESSION_EXPIRED).await;
            }
            Some(Step::EnterAmount) => self.capture_amount(key, message_id, text).await,
            Some(Step::EnterNote | Step::Review) => self.capture_note(key, message_id, text).await,
            Some(step) => {
                tracing::debug!(chat_id = key.chat_id, ?step, "ignoring text, a button is expected");
            }
        }
    }

    async fn on_callback(
        &self,
        key: ChatKey,
        identity: Identity,
        callback_id: &str,
        message_id: Option<MessageId>,
        data: &str,
    ) {
        let session = self.sessions.get(key).await;
        let Some(step) = session.step else {
            self.answer(callback_id, None).await;
            self.notify(key, ui::SESSION_EXPIRED).await;
            return;
        };

        // Buttons only count on messages this session still has on screen.
        let on_screen = message_id.is_none_or(|id| session.prompts.tracks(id));
        let transition = if on_screen {
            plan(step, Action::parse(data))
        } else {
            None
        };

        let Some(transition) = transition else {
            tracing::debug!(chat_id = key.chat_id, ?step, data, "stale button");
            self.answer(callback_id, Some(ui::STALE_BUTTON)).await;
            return;
        };
        self.answer(callback_id, None).await;

        tracing::debug!(chat_id = key.chat_id, ?step, ?transition, "button pressed");
        match transition {
            Transition::Route(direction) => self.choose_direction(key, identity, direction).await,
            Transition::UnknownRoute => self.abort(key, ui::UNKNOWN_CHOICE).await,
            Transition::Restart => self.restart(key, identity).await,
            Transition::PickCategory(token) => self.choose_category(key, session, &token).await,
            Transition::ShowCategories => self.show_categories(key).await,
            Transition::AskAmount => self.ask_amount(key).await,
            Transition::AskNote => self.ask_note(key).await,
            Transition::Submit => self.submit(key).await,
        }
    }

    /// `/start`: wipes whatever was there and shows the direction menu.
    async fn begin(&self, key: ChatKey, identity: Identity) {
        self.retract_all(key).await;
        self.fresh_session(key, identity, None).await;
        let session = self.sessions.get(key).await;
        self.show_directions(key, &session).await;
    }

    /// Same as `/start`, but reuses the menu already on screen.
    async fn restart(&self, key: ChatKey, identity: Identity) {
        let menu = self.take_slot(key, PromptSlot::Menu).await;
        self.retract_all(key).await;
        self.fresh_session(key, identity, menu).await;
        let session = self.sessions.get(key).await;
        self.show_directions(key, &session).await;
    }

    async fn fresh_session(&self, key: ChatKey, identity: Identity, menu: Option<MessageId>) {
        let mut session = Session {
            step: Some(Step::ChooseDirection),
            identity: Some(identity),
            ..Session::default()
        };
        if let Some(menu) = menu {
            session.prompts.set(PromptSlot::Menu, menu);
        }
        self.wipe(key).await;
        self.save(key, |s| *s = session).await;
    }

    async fn show_directions(&self, key: ChatKey, session: &Session) {
        let first_name = session
            .identity
            .as_ref()
            .map_or("", |i| i.first_name.as_str());
        let (text, kb) = ui::render_directions(first_name);
        self.show_menu(key, text, kb).await;
    }

    async fn cancel(&self, key: ChatKey) {
        self.retract_all(key).await;
        self.notify(key, ui::CANCELLED).await;
        self.wipe(key).await;
        tracing::info!(chat_id = key.chat_id, "entry cancelled");
    }

    /// Ends the conversation, turning the menu (if any) into `text`.
    async fn abort(&self, key: ChatKey, text: &str) {
        let menu = self.take_slot(key, PromptSlot::Menu).await;
        let replaced = match menu {
            Some(id) => prompts::logged(
                self.output
                    .edit_text(key.chat(), id, text.to_string(), None)
                    .await,
                key,
                "edit menu",
            )
            .is_some(),
            None => false,
        };
        if !replaced {
            self.notify(key, text).await;
        }
        self.retract_all(key).await;
        self.wipe(key).await;
    }

    async fn choose_direction(&self, key: ChatKey, identity: Identity, direction: Direction) {
        self.save(key, |s| {
            if s.identity.is_none() {
                s.identity = Some(identity);
            }
            s.choose_direction(direction);
            s.step = Some(Step::ChooseCategory);
        })
        .await;
        let (text, kb) = ui::render_categories(direction);
        self.show_menu(key, text, kb).await;
    }

    async fn choose_category(&self, key: ChatKey, session: Session, token: &str) {
        let (Some(direction), Some(catalog)) = (session.direction, session.category_set()) else {
            tracing::warn!(chat_id = key.chat_id, "category picked without a direction");
            self.abort(key, ui::UNKNOWN_CHOICE).await;
            return;
        };
        let label = catalog.resolve(token);
        if label == ledger::NOT_FOUND {
            tracing::warn!(chat_id = key.chat_id, token, "category token not in catalog");
        }

        self.save(key, |s| {
            s.choose_category(label);
            s.step = Some(Step::EnterAmount);
        })
        .await;
        self.retract(key, PromptSlot::Menu).await;
        let (text, kb) = ui::render_amount_prompt(direction, label);
        self.present(key, PromptSlot::Amount, text, Some(kb)).await;
    }

    async fn show_categories(&self, key: ChatKey) {
        let session = self
            .save(key, |s| {
                s.forget_category();
                s.step = Some(Step::ChooseCategory);
            })
            .await;
        let Some(direction) = session.direction else {
            self.abort(key, ui::UNKNOWN_CHOICE).await;
            return;
        };

        self.retract(key, PromptSlot::Amount).await;
        self.retract(key, PromptSlot::Error).await;
        self.retract(key, PromptSlot::Note).await;
        let (text, kb) = ui::render_categories(direction);
        self.show_menu(key, text, kb).await;
    }

    async fn ask_amount(&self, key: ChatKey) {
        let session = self
            .save(key, |s| {
                s.forget_amount();
                s.step = Some(Step::EnterAmount);
            })
            .await;
        let (Some(direction), Some(category)) = (session.direction, session.category.as_deref())
        else {
            self.abort(key, ui::UNKNOWN_CHOICE).await;
            return;
        };

        self.retract(key, PromptSlot::Note).await;
        self.retract(key, PromptSlot::Menu).await;
        let (text, kb) = ui::render_amount_prompt(direction, category);
        self.present(key, PromptSlot::Amount, text, Some(kb)).await;
    }

    /// Drops the note and asks for a new one; the answer brings back the review.
    async fn ask_note(&self, key: ChatKey) {
        let session = self
            .save(key, |s| {
                s.forget_note();
                s.step = Some(Step::Review);
            })
            .await;
        let Some(amount) = session.amount else {
            self.abort(key, ui::UNKNOWN_CHOICE).await;
            return;
        };

        self.retract(key, PromptSlot::Menu).await;
        let (text, kb) = ui::render_note_prompt(amount);
        self.present(key, PromptSlot::Note, text, Some(kb)).await;
    }

    async fn capture_amount(&self, key: ChatKey, message_id: MessageId, text: &str) {
        self.delete(key, message_id).await;

        let amount = match parse_amount(text) {
            Ok(amount) => amount,
            Err(err) => {
                tracing::debug!(chat_id = key.chat_id, "rejected amount: {err}");
                self.present(key, PromptSlot::Error, ui::AMOUNT_INVALID.to_string(), None)
                    .await;
                return;
            }
        };

        self.save(key, |s| {
            s.capture_amount(amount);
            s.step = Some(Step::EnterNote);
        })
        .await;
        self.retract(key, PromptSlot::Error).await;
        self.retract(key, PromptSlot::Amount).await;
        let (text, kb) = ui::render_note_prompt(amount);
        self.present(key, PromptSlot::Note, text, Some(kb)).await;
    }

    async fn capture_note(&self, key: ChatKey, message_id: MessageId, text: &str) {
        self.delete(key, message_id).await;

        let note = text.trim();
        let note = if note.is_empty() { NO_NOTE } else { note };
        let session = self
            .save(key, |s| {
                s.capture_note(note);
                s.step = Some(Step::Review);
            })
            .await;

        self.retract(key, PromptSlot::Note).await;
        self.retract(key, PromptSlot::Menu).await;
        let Some(record) = session.record() else {
            tracing::warn!(chat_id = key.chat_id, "note received for an incomplete record");
            self.abort(key, ui::UNKNOWN_CHOICE).await;
            return;
        };
        let (text, kb) = ui::render_review(&record);
        if self
            .present(key, PromptSlot::Menu, text, Some(kb))
            .await
            .is_none()
        {
            self.notify(key, ui::REVIEW_UNAVAILABLE).await;
        }
    }

    /// Sends the record to the sink. The session is cleared whatever the
    /// outcome, so a failed submission never leaves the user stuck.
    async fn submit(&self, key: ChatKey) {
        let session = self.sessions.get(key).await;
        self.retract_all(key).await;

        let delivered = match session.payload() {
            Some(payload) => self.sink.submit(&payload).await,
            None => {
                tracing::warn!(chat_id = key.chat_id, "submit with an incomplete record");
                false
            }
        };

        let text = if delivered {
            ui::SUBMITTED
        } else {
            ui::SUBMIT_FAILED
        };
        self.notify(key, text).await;
        self.wipe(key).await;
        tracing::info!(chat_id = key.chat_id, delivered, "entry finished");
    }

    async fn save<F>(&self, key: ChatKey, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.sessions.get(key).await;
        f(&mut session);
        if let Err(err) = self.sessions.put(key, session.clone()).await {
            tracing::error!(chat_id = key.chat_id, "session not saved: {err}");
        }
        session
    }

    async fn wipe(&self, key: ChatKey) {
        if let Err(err) = self.sessions.clear(key).await {
            tracing::error!(chat_id = key.chat_id, "session not cleared: {err}");
        }
    }
}
