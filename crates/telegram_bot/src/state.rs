use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use api_types::sink::SinkPayload;
use ledger::{Amount, Catalog, Direction, Record};
use serde::{Deserialize, Serialize};
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;

/// Handle stored when the user has no public username.
pub const NO_USERNAME: &str = "NoUsername";

/// Sessions are scoped to one user inside one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatKey {
    pub chat_id: i64,
    pub user_id: u64,
}

impl ChatKey {
    pub fn new(chat_id: ChatId, user_id: u64) -> Self {
        Self {
            chat_id: chat_id.0,
            user_id,
        }
    }

    pub fn chat(&self) -> ChatId {
        ChatId(self.chat_id)
    }

    fn file_name(&self) -> String {
        format!("{}_{}.json", self.chat_id, self.user_id)
    }
}

/// Who is talking, captured once when the session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: u64,
    pub first_name: String,
    pub username: String,
}

impl Identity {
    pub fn new(user_id: u64, first_name: impl Into<String>, username: Option<String>) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            username: username.unwrap_or_else(|| NO_USERNAME.to_string()),
        }
    }
}

/// Position in the entry conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    ChooseDirection,
    ChooseCategory,
    EnterAmount,
    EnterNote,
    Review,
}

/// Named holder for the bot message currently awaiting a given reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptSlot {
    /// Direction menu, category menu or review card.
    Menu,
    Amount,
    Note,
    Error,
}

impl PromptSlot {
    pub const ALL: [PromptSlot; 4] = [
        PromptSlot::Menu,
        PromptSlot::Amount,
        PromptSlot::Note,
        PromptSlot::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PromptSlot::Menu => "menu-prompt",
            PromptSlot::Amount => "amount-prompt",
            PromptSlot::Note => "note-prompt",
            PromptSlot::Error => "error-prompt",
        }
    }
}

/// One optional message id per [`PromptSlot`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSlots {
    menu: Option<MessageId>,
    amount: Option<MessageId>,
    note: Option<MessageId>,
    error: Option<MessageId>,
}

impl PromptSlots {
    fn slot_mut(&mut self, slot: PromptSlot) -> &mut Option<MessageId> {
        match slot {
            PromptSlot::Menu => &mut self.menu,
            PromptSlot::Amount => &mut self.amount,
            PromptSlot::Note => &mut self.note,
            PromptSlot::Error => &mut self.error,
        }
    }

    pub fn get(&self, slot: PromptSlot) -> Option<MessageId> {
        match slot {
            PromptSlot::Menu => self.menu,
            PromptSlot::Amount => self.amount,
            PromptSlot::Note => self.note,
            PromptSlot::Error => self.error,
        }
    }

    /// Stores `id` in `slot`, returning the previous occupant.
    pub fn set(&mut self, slot: PromptSlot, id: MessageId) -> Option<MessageId> {
        self.slot_mut(slot).replace(id)
    }

    pub fn take(&mut self, slot: PromptSlot) -> Option<MessageId> {
        self.slot_mut(slot).take()
    }

    /// Occupied slots, in [`PromptSlot::ALL`] order.
    pub fn occupied(&self) -> Vec<(PromptSlot, MessageId)> {
        PromptSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|id| (slot, id)))
            .collect()
    }

    pub fn tracks(&self, id: MessageId) -> bool {
        PromptSlot::ALL.into_iter().any(|slot| self.get(slot) == Some(id))
    }
}

/// Record-in-progress plus the bookkeeping of what is on screen.
///
/// The fields follow the order in which they are captured; each one is only
/// set once the previous one is. `step == None` means no conversation is
/// active.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub step: Option<Step>,
    pub identity: Option<Identity>,
    pub direction: Option<Direction>,
    pub category: Option<String>,
    pub amount: Option<Amount>,
    pub note: Option<String>,
    pub prompts: PromptSlots,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.step.is_some()
    }

    /// Catalog of the chosen direction; present iff a direction is.
    pub fn category_set(&self) -> Option<&'static Catalog> {
        self.direction.map(Direction::catalog)
    }

    pub fn choose_direction(&mut self, direction: Direction) {
        self.forget_category();
        self.direction = Some(direction);
    }

    pub fn choose_category(&mut self, label: impl Into<String>) {
        self.forget_amount();
        if self.direction.is_some() {
            self.category = Some(label.into());
        }
    }

    pub fn capture_amount(&mut self, amount: Amount) {
        self.forget_note();
        if self.category.is_some() {
            self.amount = Some(amount);
        }
    }

    pub fn capture_note(&mut self, note: impl Into<String>) {
        if self.amount.is_some() {
            self.note = Some(note.into());
        }
    }

    pub fn forget_direction(&mut self) {
        self.forget_category();
        self.direction = None;
    }

    pub fn forget_category(&mut self) {
        self.forget_amount();
        self.category = None;
    }

    pub fn forget_amount(&mut self) {
        self.forget_note();
        self.amount = None;
    }

    pub fn forget_note(&mut self) {
        self.note = None;
    }

    /// The captured record, once every field is present.
    pub fn record(&self) -> Option<Record> {
        Some(Record {
            direction: self.direction?,
            category: self.category.clone()?,
            amount: self.amount?,
            note: self.note.clone()?,
        })
    }

    pub fn payload(&self) -> Option<SinkPayload> {
        let identity = self.identity.as_ref()?;
        let record = self.record()?;
        Some(SinkPayload {
            user_id: identity.user_id,
            first_name: identity.first_name.clone(),
            username: identity.username.clone(),
            transaksi: record.direction.label().to_string(),
            kategori_nama: record.category,
            nominal: record.amount.units(),
            keterangan: record.note,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("session encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

enum Backend {
    Memory(HashMap<ChatKey, Session>),
    Directory(PathBuf),
}

impl Backend {
    fn load(&self, key: ChatKey) -> Session {
        match self {
            Backend::Memory(map) => map.get(&key).cloned().unwrap_or_default(),
            Backend::Directory(dir) => {
                let path = dir.join(key.file_name());
                match read_json_file(&path) {
                    Ok(Some(session)) => session,
                    Ok(None) => Session::default(),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), "unreadable session, starting empty: {err}");
                        Session::default()
                    }
                }
            }
        }
    }

    fn store(&mut self, key: ChatKey, session: Session) -> Result<(), StoreError> {
        match self {
            Backend::Memory(map) => {
                map.insert(key, session);
                Ok(())
            }
            Backend::Directory(dir) => write_json_file(&dir.join(key.file_name()), &session),
        }
    }

    fn remove(&mut self, key: ChatKey) -> Result<(), StoreError> {
        match self {
            Backend::Memory(map) => {
                map.remove(&key);
                Ok(())
            }
            Backend::Directory(dir) => match fs::remove_file(dir.join(key.file_name())) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }
}

/// Per-chat session bags.
///
/// Either kept in process memory or persisted as one JSON file per
/// [`ChatKey`] under a directory, so that a recycled process picks up where
/// the previous one stopped. Every call re-reads the backend: nothing is
/// cached between events.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Backend>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Backend::Memory(HashMap::new()))),
        }
    }

    pub fn in_directory(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Backend::Directory(path.into()))),
        }
    }

    /// Current bag for `key`, empty if none exists.
    pub async fn get(&self, key: ChatKey) -> Session {
        let guard = self.inner.lock().await;
        guard.load(key)
    }

    pub async fn put(&self, key: ChatKey, session: Session) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        guard.store(key, session)
    }

    pub async fn update<F>(&self, key: ChatKey, f: F) -> Result<Session, StoreError>
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.inner.lock().await;
        let mut session = guard.load(key);
        f(&mut session);
        guard.store(key, session.clone())?;
        Ok(session)
    }

    /// Drops every field for `key`.
    pub async fn clear(&self, key: ChatKey) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        guard.remove(key)
    }

    /// Records `id` in `slot`, returning the id it replaced.
    pub async fn set_prompt(
        &self,
        key: ChatKey,
        slot: PromptSlot,
        id: MessageId,
    ) -> Result<Option<MessageId>, StoreError> {
        let mut guard = self.inner.lock().await;
        let mut session = guard.load(key);
        let previous = session.prompts.set(slot, id);
        guard.store(key, session)?;
        Ok(previous)
    }

    /// Reads and empties `slot`.
    pub async fn pop_prompt(
        &self,
        key: ChatKey,
        slot: PromptSlot,
    ) -> Result<Option<MessageId>, StoreError> {
        let mut guard = self.inner.lock().await;
        let mut session = guard.load(key);
        let Some(id) = session.prompts.take(slot) else {
            return Ok(None);
        };
        guard.store(key, session)?;
        Ok(Some(id))
    }
}

fn read_json_file(path: &Path) -> Result<Option<Session>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

fn write_json_file(path: &Path, session: &Session) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent)?;

    let json = serde_json::to_string_pretty(session)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ChatKey {
        ChatKey::new(ChatId(42), 7)
    }

    fn complete() -> Session {
        let mut session = Session {
            step: Some(Step::Review),
            identity: Some(Identity::new(7, "Ana", None)),
            ..Session::default()
        };
        session.choose_direction(Direction::Outflow);
        session.choose_category("Makan");
        session.capture_amount(Amount::new(15_000));
        session.capture_note("Lunch");
        session
    }

    fn scratch_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/test_sessions")
            .join(uuid::Uuid::new_v4().to_string())
    }

    #[test]
    fn identity_defaults_missing_username() {
        let identity = Identity::new(1, "Ana", None);
        assert_eq!(identity.username, NO_USERNAME);
        let identity = Identity::new(1, "Ana", Some("ana".to_string()));
        assert_eq!(identity.username, "ana");
    }

    #[test]
    fn category_set_follows_direction() {
        let mut session = Session::default();
        assert!(session.category_set().is_none());
        session.choose_direction(Direction::SavingsOutflow);
        assert_eq!(session.category_set(), Some(&ledger::OUTFLOW));
        session.forget_direction();
        assert!(session.category_set().is_none());
    }

    #[test]
    fn fields_cannot_skip_ahead() {
        let mut session = Session::default();
        session.choose_category("Makan");
        assert!(session.category.is_none());
        session.capture_amount(Amount::new(1));
        assert!(session.amount.is_none());
        session.capture_note("x");
        assert!(session.note.is_none());
    }

    #[test]
    fn forgetting_a_field_drops_everything_after_it() {
        let mut session = complete();
        session.forget_amount();
        assert_eq!(session.category.as_deref(), Some("Makan"));
        assert!(session.amount.is_none());
        assert!(session.note.is_none());

        let mut session = complete();
        session.forget_category();
        assert!(session.direction.is_some());
        assert!(session.category.is_none());
        assert!(session.amount.is_none());
    }

    #[test]
    fn payload_needs_every_field() {
        let session = complete();
        let payload = session.payload().unwrap();
        assert_eq!(payload.transaksi, "Keluar");
        assert_eq!(payload.kategori_nama, "Makan");
        assert_eq!(payload.nominal, 15_000);
        assert_eq!(payload.keterangan, "Lunch");
        assert_eq!(payload.username, NO_USERNAME);

        let mut partial = complete();
        partial.forget_note();
        assert!(partial.payload().is_none());
    }

    #[test]
    fn prompt_slots_hold_one_id_each() {
        let mut slots = PromptSlots::default();
        assert_eq!(slots.set(PromptSlot::Amount, MessageId(1)), None);
        assert_eq!(slots.set(PromptSlot::Amount, MessageId(2)), Some(MessageId(1)));
        assert_eq!(slots.occupied(), vec![(PromptSlot::Amount, MessageId(2))]);
        assert!(slots.tracks(MessageId(2)));
        assert!(!slots.tracks(MessageId(1)));
        assert_eq!(slots.take(PromptSlot::Amount), Some(MessageId(2)));
        assert!(slots.occupied().is_empty());
    }

    #[tokio::test]
    async fn memory_store_pop_is_one_shot() {
        let store = SessionStore::in_memory();
        store
            .set_prompt(key(), PromptSlot::Error, MessageId(9))
            .await
            .unwrap();
        assert_eq!(
            store.pop_prompt(key(), PromptSlot::Error).await.unwrap(),
            Some(MessageId(9))
        );
        assert_eq!(store.pop_prompt(key(), PromptSlot::Error).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_returns_the_stored_session() {
        let store = SessionStore::in_memory();
        let updated = store
            .update(key(), |s| {
                s.step = Some(Step::ChooseCategory);
                s.choose_direction(Direction::Inflow);
            })
            .await
            .unwrap();

        assert_eq!(updated.direction, Some(Direction::Inflow));
        assert_eq!(store.get(key()).await, updated);
    }

    #[tokio::test]
    async fn clear_wipes_every_field() {
        let store = SessionStore::in_memory();
        store.put(key(), complete()).await.unwrap();
        store.clear(key()).await.unwrap();
        assert_eq!(store.get(key()).await, Session::default());
    }

    #[tokio::test]
    async fn sessions_are_scoped_per_user_and_chat() {
        let store = SessionStore::in_memory();
        store.put(key(), complete()).await.unwrap();
        let other_user = ChatKey::new(ChatId(42), 8);
        let other_chat = ChatKey::new(ChatId(43), 7);
        assert!(!store.get(other_user).await.is_active());
        assert!(!store.get(other_chat).await.is_active());
    }

    #[tokio::test]
    async fn directory_store_survives_a_new_instance() {
        let dir = scratch_dir();
        let store = SessionStore::in_directory(&dir);
        store.put(key(), complete()).await.unwrap();
        store
            .set_prompt(key(), PromptSlot::Menu, MessageId(3))
            .await
            .unwrap();

        let reopened = SessionStore::in_directory(&dir);
        let session = reopened.get(key()).await;
        assert_eq!(session.note.as_deref(), Some("Lunch"));
        assert_eq!(session.prompts.get(PromptSlot::Menu), Some(MessageId(3)));

        reopened.clear(key()).await.unwrap();
        assert_eq!(store.get(key()).await, Session::default());
        reopened.clear(key()).await.unwrap();

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_session_file_reads_as_empty() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(key().file_name()), "{not json").unwrap();

        let store = SessionStore::in_directory(&dir);
        assert_eq!(store.get(key()).await, Session::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
