//! The session store: identity, history, expiry, and concurrency-safe
//! mutation.
//!
//! # Locking discipline
//!
//! - The outer `RwLock<HashMap<..>>` serializes membership changes
//!   (insert, delete, sweep) against each other. Readers only pin the map
//!   long enough to clone the per-session `Arc`.
//! - Each session sits behind its own `Mutex`, so mutation on one session
//!   never blocks another.
//! - A `removed` flag inside the slot closes the race between cloning a
//!   session handle and a concurrent sweep/delete: mutators re-check the
//!   flag under the slot lock and report `NotFound` if eviction won.
//! - No lock is ever held across an await point; callers make the
//!   upstream completion call with the session fully unlocked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::{Role, Session, Turn};

/// `stats()` lists at most this many sessions.
const STATS_SAMPLE: usize = 10;
/// Session ids in stats output are clipped to this many characters.
const STATS_ID_CHARS: usize = 20;

/// Point-in-time view of one session, for diagnostics.
#[derive(Clone, Debug, Serialize)]
pub struct SessionStats {
    /// Session id, clipped for log-safe display.
    pub id: String,
    /// Number of recorded turns.
    pub turns: usize,
    /// Seconds since the session was created.
    pub age_seconds: i64,
}

/// Point-in-time view of the whole store.
#[derive(Clone, Debug, Serialize)]
pub struct StoreStats {
    pub total_sessions: usize,
    /// A capped sample of sessions, not the full inventory.
    pub sessions: Vec<SessionStats>,
}

/// A session plus its eviction marker, guarded by one mutex.
struct SessionSlot {
    session: Session,
    /// Set under the slot lock by delete/sweep before the map entry goes.
    removed: bool,
}

/// Concurrency-safe mapping from session id to conversation state.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionSlot>>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// Create a store with the given idle timeout.
    pub fn new(idle_timeout: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Mint a fresh session identifier.
    ///
    /// Random and collision-resistant; the leading timestamp is a sorting
    /// hint only, never an authority — uniqueness comes from the UUID.
    pub fn mint_id() -> String {
        format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), Uuid::new_v4())
    }

    /// Get an existing session or create one.
    ///
    /// - `None`/empty id: mint a new identifier and create a session.
    /// - Known, still-active id: return a snapshot of the existing session.
    /// - Unknown id: adopt it — the identifier is caller-supplied and a
    ///   new session is created under it, not rejected.
    /// - Known but expired (not yet swept): replaced by a fresh session
    ///   under the same id, so a stale id never resurrects history.
    pub fn get_or_create(&self, session_id: Option<&str>) -> Result<Session, ChatError> {
        let id = match session_id {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                let id = Self::mint_id();
                debug!(session_id = %id, "minted new session id");
                id
            }
        };

        // Fast path: existing live session under a read lock.
        {
            let map = self.sessions.read().unwrap();
            if let Some(slot) = map.get(&id) {
                let guard = slot.lock().unwrap();
                if !guard.removed && !guard.session.is_expired(Utc::now(), self.idle_timeout) {
                    return Ok(guard.session.clone());
                }
            }
        }

        // Slow path: insert (or replace an expired entry) under the write
        // lock. Re-check after acquiring it — another caller may have won.
        let mut map = self.sessions.write().unwrap();
        if let Some(slot) = map.get(&id) {
            let mut guard = slot.lock().unwrap();
            if !guard.removed && !guard.session.is_expired(Utc::now(), self.idle_timeout) {
                return Ok(guard.session.clone());
            }
            // Expired entry about to be replaced — mark it so any handle
            // cloned before this point reports NotFound instead of
            // mutating a detached session.
            guard.removed = true;
        }

        let session = Session::new(&id);
        map.insert(
            id.clone(),
            Arc::new(Mutex::new(SessionSlot {
                session: session.clone(),
                removed: false,
            })),
        );
        debug!(session_id = %id, "created session");
        Ok(session)
    }

    /// Append a turn to a session.
    ///
    /// Atomic with respect to other appends on the same session; fails
    /// with `NotFound` if the session does not exist (or lost a race with
    /// eviction). Bumps `last_active_at`, never backwards.
    pub fn append(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Turn, ChatError> {
        let slot = self.handle(session_id)?;
        let mut guard = slot.lock().unwrap();
        if guard.removed {
            return Err(ChatError::not_found(session_id));
        }

        let turn = Turn::new(role, content);
        guard.session.turns.push(turn.clone());
        guard.session.last_active_at = guard.session.last_active_at.max(turn.timestamp);
        Ok(turn)
    }

    /// Ordered turn history for a session; `NotFound` if absent.
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        let slot = self.handle(session_id)?;
        let guard = slot.lock().unwrap();
        if guard.removed {
            return Err(ChatError::not_found(session_id));
        }
        Ok(guard.session.turns.clone())
    }

    /// Remove a session. Returns whether it existed.
    pub fn delete(&self, session_id: &str) -> bool {
        let mut map = self.sessions.write().unwrap();
        match map.remove(session_id) {
            Some(slot) => {
                slot.lock().unwrap().removed = true;
                info!(session_id = %session_id, "session deleted");
                true
            }
            None => false,
        }
    }

    /// Remove all sessions idle longer than the configured timeout.
    ///
    /// Safe to run concurrently with appends: the membership write lock
    /// keeps the map consistent, and taking each slot's lock before
    /// deciding means an in-flight append finishes first (and its
    /// freshened `last_active_at` keeps the session alive).
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.sessions.write().unwrap();
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, slot)| {
                let guard = slot.lock().unwrap();
                guard.session.is_expired(now, self.idle_timeout)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(slot) = map.remove(id) {
                slot.lock().unwrap().removed = true;
                debug!(session_id = %id, "swept expired session");
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "session sweep removed expired sessions");
        }
        expired.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostics snapshot: total session count plus a capped per-session
    /// sample (clipped id, turn count, age in seconds).
    pub fn stats(&self) -> StoreStats {
        let now = Utc::now();
        let map = self.sessions.read().unwrap();
        let sessions = map
            .values()
            .take(STATS_SAMPLE)
            .map(|slot| {
                let guard = slot.lock().unwrap();
                SessionStats {
                    id: clip_id(&guard.session.id),
                    turns: guard.session.turns.len(),
                    age_seconds: (now - guard.session.created_at).num_seconds(),
                }
            })
            .collect();

        StoreStats {
            total_sessions: map.len(),
            sessions,
        }
    }

    /// Clone the slot handle for a session, releasing the map lock before
    /// the caller locks the slot.
    fn handle(&self, session_id: &str) -> Result<Arc<Mutex<SessionSlot>>, ChatError> {
        let map = self.sessions.read().unwrap();
        map.get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::not_found(session_id))
    }
}

/// Clip an id for display, marking the cut.
fn clip_id(id: &str) -> String {
    if id.chars().count() <= STATS_ID_CHARS {
        return id.to_string();
    }
    let clipped: String = id.chars().take(STATS_ID_CHARS).collect();
    format!("{clipped}...")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
