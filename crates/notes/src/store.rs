use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::note::{Note, NoteId, NotePatch, UNTITLED};
use crate::session::SessionError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("note {0} not found")]
    NotFound(NoteId),
    #[error("no user is signed in")]
    SignedOut,
}

impl From<SessionError> for StoreError {
    fn from(_: SessionError) -> Self {
        StoreError::SignedOut
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receives the owner's notes, most recently updated first.
pub type NotesListener = Box<dyn FnMut(&[Note])>;

/// Persistence seam for notes.
pub trait ContentStore {
    fn create(&mut self, owner: &str, title: &str, content: &str) -> Result<Note, StoreError>;
    fn get(&self, id: NoteId) -> Result<Note, StoreError>;
    /// Notes of `owner`, most recently updated first.
    fn list(&self, owner: &str) -> Vec<Note>;
    fn update(&mut self, id: NoteId, patch: NotePatch) -> Result<Note, StoreError>;
    fn delete(&mut self, id: NoteId) -> Result<(), StoreError>;
    /// Calls `listener` now and after every change to `owner`'s notes.
    fn subscribe(&mut self, owner: &str, listener: NotesListener) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

struct Entry {
    note: Note,
    /// Write order, used when two updates share a timestamp.
    seq: u64,
}

struct Subscriber {
    id: SubscriptionId,
    owner: String,
    listener: NotesListener,
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// In-memory store that notifies subscribers synchronously.
pub struct MemoryStore {
    notes: HashMap<NoteId, Entry>,
    subscribers: Vec<Subscriber>,
    next_seq: u64,
    next_subscription: u64,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        Self {
            notes: HashMap::new(),
            subscribers: Vec::new(),
            next_seq: 0,
            next_subscription: 0,
            clock: Box::new(clock),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn notify(&mut self, owner: &str) {
        let notes = self.list(owner);
        for subscriber in self.subscribers.iter_mut().filter(|s| s.owner == owner) {
            (subscriber.listener)(&notes);
        }
    }
}

impl ContentStore for MemoryStore {
    fn create(&mut self, owner: &str, title: &str, content: &str) -> Result<Note, StoreError> {
        let now = (self.clock)();
        let title = if title.trim().is_empty() { UNTITLED } else { title };
        let note = Note {
            id: NoteId::new(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            owner_id: owner.to_string(),
        };
        let seq = self.bump_seq();
        self.notes.insert(note.id, Entry { note: note.clone(), seq });
        tracing::debug!(id = %note.id, owner, "note created");
        self.notify(owner);
        Ok(note)
    }

    fn get(&self, id: NoteId) -> Result<Note, StoreError> {
        self.notes
            .get(&id)
            .map(|entry| entry.note.clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self, owner: &str) -> Vec<Note> {
        let mut entries: Vec<&Entry> = self
            .notes
            .values()
            .filter(|entry| entry.note.owner_id == owner)
            .collect();
        entries.sort_by(|a, b| {
            b.note
                .updated_at
                .cmp(&a.note.updated_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|entry| entry.note.clone()).collect()
    }

    fn update(&mut self, id: NoteId, patch: NotePatch) -> Result<Note, StoreError> {
        let now = (self.clock)();
        let seq = self.bump_seq();
        let entry = self.notes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = patch.title {
            entry.note.title = if title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                title
            };
        }
        if let Some(content) = patch.content {
            entry.note.content = content;
        }
        entry.note.updated_at = now;
        entry.seq = seq;

        let note = entry.note.clone();
        tracing::debug!(id = %id, "note updated");
        self.notify(&note.owner_id);
        Ok(note)
    }

    fn delete(&mut self, id: NoteId) -> Result<(), StoreError> {
        let entry = self.notes.remove(&id).ok_or(StoreError::NotFound(id))?;
        tracing::debug!(id = %id, "note deleted");
        self.notify(&entry.note.owner_id);
        Ok(())
    }

    fn subscribe(&mut self, owner: &str, mut listener: NotesListener) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        listener(&self.list(owner));
        self.subscribers.push(Subscriber {
            id,
            owner: owner.to_string(),
            listener,
        });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }
}
