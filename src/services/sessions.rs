use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::inventory::{PersistenceFailure, SaveOutcome, SeatInventoryModel, SeatUsageStore};

/// An owner's seat-management session is scoped to one venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub account_id: i64,
    pub venue_id: i64,
}

struct Session {
    generation: u64,
    model: SeatInventoryModel,
}

/// Open seat sessions, one [`SeatInventoryModel`] per owner and venue.
///
/// The lock is held only for synchronous model calls. A save snapshots under
/// the lock, awaits the store without it and re-locks to finish, so other
/// actions on the same session go through while the store call is pending.
#[derive(Default)]
pub struct SeatSessions {
    sessions: Mutex<HashMap<SessionKey, Session>>,
    next_generation: AtomicU64,
}

impl SeatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a freshly loaded model, replacing any previous session.
    pub fn open(&self, key: SessionKey, model: SeatInventoryModel) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let replaced = self.lock().insert(key, Session { generation, model }).is_some();
        info!(
            account_id = key.account_id,
            venue_id = key.venue_id,
            replaced,
            "seat session opened"
        );
    }

    pub fn close(&self, key: SessionKey) -> bool {
        self.lock().remove(&key).is_some()
    }

    pub fn view<R>(&self, key: SessionKey, f: impl FnOnce(&SeatInventoryModel) -> R) -> Option<R> {
        self.lock().get(&key).map(|session| f(&session.model))
    }

    pub fn update<R>(&self, key: SessionKey, f: impl FnOnce(&mut SeatInventoryModel) -> R) -> Option<R> {
        self.lock().get_mut(&key).map(|session| f(&mut session.model))
    }

    /// Saves the session's table groups through `store`.
    ///
    /// `None` when no session is open. If the session is closed or reopened
    /// while the store call is pending, the result is still returned but no
    /// model is touched. When the returned future is dropped before the store
    /// answers, the session goes back to idle.
    pub async fn save<S>(&self, key: SessionKey, store: &S) -> Option<Result<SaveOutcome, PersistenceFailure>>
    where
        S: SeatUsageStore,
    {
        let (generation, ticket) = {
            let mut sessions = self.lock();
            let session = sessions.get_mut(&key)?;
            match session.model.begin_save() {
                Some(ticket) => (session.generation, ticket),
                None => return Some(Ok(SaveOutcome::AlreadySaving)),
            }
        };

        let mut pending = PendingSave {
            sessions: self,
            key,
            generation,
            armed: true,
        };
        let result = ticket.submit(store).await;
        pending.armed = false;

        let mut sessions = self.lock();
        match sessions.get_mut(&key) {
            Some(session) if session.generation == generation => Some(session.model.finish_save(result)),
            _ => {
                debug!(
                    account_id = key.account_id,
                    venue_id = key.venue_id,
                    "seat session replaced during save"
                );
                Some(result.map(|()| SaveOutcome::Saved))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionKey, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the saving flag of a session whose save future was dropped
/// while the store call was pending.
struct PendingSave<'a> {
    sessions: &'a SeatSessions,
    key: SessionKey,
    generation: u64,
    armed: bool,
}

impl Drop for PendingSave<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(session) = self.sessions.lock().get_mut(&self.key) {
            if session.generation == self.generation {
                session.model.cancel_save();
            }
        }
    }
}
