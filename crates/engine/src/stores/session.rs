//! Open editor sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use trionforge_domain::SessionId;

use crate::infrastructure::ports::ClockPort;
use crate::use_cases::editor::EditorSession;

pub type SharedSession = Arc<Mutex<EditorSession>>;

struct SessionEntry {
    session: SharedSession,
    last_seen: DateTime<Utc>,
}

/// Editor sessions keyed by the id handed to the client.
///
/// Each session is owned by one client; the mutex only serialises that
/// client's own overlapping requests. Sessions untouched for longer than
/// the idle timeout are evicted, and the store never holds more than
/// `max_sessions` entries.
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionEntry>,
    clock: Arc<dyn ClockPort>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn ClockPort>, idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn insert(&self, session: EditorSession) -> SessionId {
        self.evict_idle();
        while self.sessions.len() >= self.max_sessions {
            if !self.evict_least_recent() {
                break;
            }
        }

        let id = SessionId::new();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(session)),
            last_seen: self.clock.now(),
        };
        self.sessions.insert(id, entry);
        tracing::debug!(session_id = %id, "Opened editor session");
        id
    }

    /// Look up a session and mark it as active.
    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        let now = self.clock.now();
        self.sessions.get_mut(&id).map(|mut entry| {
            entry.last_seen = now;
            entry.session.clone()
        })
    }

    pub fn remove(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions.remove(&id).map(|(_, entry)| entry.session)
    }

    /// Drop every session idle for longer than the timeout. Returns how many
    /// were evicted.
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| self.is_idle(entry.value(), now))
            .map(|entry| *entry.key())
            .collect();

        let evicted = expired
            .into_iter()
            .filter_map(|id| self.sessions.remove_if(&id, |_, entry| self.is_idle(entry, now)))
            .map(|(_, entry)| close(entry))
            .count();

        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = self.sessions.len(),
                "Evicted idle editor sessions"
            );
        }
        evicted
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_seen)
            .map(|entry| *entry.key());

        match oldest.and_then(|id| self.sessions.remove(&id)) {
            Some((id, entry)) => {
                tracing::warn!(
                    session_id = %id,
                    max_sessions = self.max_sessions,
                    "Session limit reached, evicted least recently used session"
                );
                close(entry);
                true
            }
            None => false,
        }
    }

    fn is_idle(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        (now - entry.last_seen)
            .to_std()
            .is_ok_and(|idle| idle > self.idle_timeout)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Sign out an evicted session so any session-only limits are released.
/// A session still locked by an in-flight request is left to drop with it.
fn close(entry: SessionEntry) {
    if let Ok(mut session) = entry.session.try_lock() {
        session.sign_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::memory::{InMemoryCharacterRepo, InMemoryProfileRepo};
    use crate::infrastructure::ports::MockClockPort;
    use crate::use_cases::editor::EditorContext;
    use crate::use_cases::limits::LimitProvider;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};
    use trionforge_domain::{FieldUpdate, LimitPolicy, StatRules, TriggerCatalog, VipAllowList};

    fn session() -> EditorSession {
        let limits = LimitProvider::new(
            Arc::new(InMemoryProfileRepo::new()),
            Arc::new(FixedRandom(5)),
            LimitPolicy::default(),
            Duration::from_secs(1),
        );
        EditorSession::new(EditorContext {
            catalog: Arc::new(TriggerCatalog::builtin()),
            rules: Arc::new(StatRules::default()),
            vip: Arc::new(VipAllowList::default()),
            limits: Arc::new(limits),
            characters: Arc::new(InMemoryCharacterRepo::new()),
            clock: Arc::new(FixedClock(Utc::now())),
        })
    }

    /// A mock clock whose reading (in seconds) the test moves forward.
    fn manual_clock() -> (Arc<AtomicI64>, Arc<dyn ClockPort>) {
        let seconds = Arc::new(AtomicI64::new(1_700_000_000));
        let reading = seconds.clone();
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || {
            Utc.timestamp_opt(reading.load(Ordering::SeqCst), 0)
                .unwrap()
        });
        (seconds, Arc::new(clock))
    }

    #[tokio::test]
    async fn when_sessions_opened_then_isolated_and_removable() {
        let store = SessionStore::new(
            Arc::new(FixedClock(Utc::now())),
            Duration::from_secs(60),
            10,
        );
        let a = store.insert(session());
        let b = store.insert(session());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);

        let first = store.get(a).unwrap();
        first
            .lock()
            .await
            .update(FieldUpdate::Name("a".into()))
            .unwrap();
        let second = store.get(b).unwrap();
        assert_eq!(second.lock().await.draft().name, "");

        assert!(store.remove(a).is_some());
        assert!(store.get(a).is_none());
        assert!(store.remove(a).is_none());
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn when_idle_past_timeout_then_session_evicted() {
        let (seconds, clock) = manual_clock();
        let store = SessionStore::new(clock, Duration::from_secs(60), 10);
        let idle = store.insert(session());
        let active = store.insert(session());

        seconds.fetch_add(45, Ordering::SeqCst);
        assert!(store.get(active).is_some());
        assert_eq!(store.evict_idle(), 0);

        seconds.fetch_add(30, Ordering::SeqCst);
        assert_eq!(store.evict_idle(), 1);
        assert!(store.get(idle).is_none());
        assert!(store.get(active).is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn when_inserting_then_idle_sessions_are_swept_first() {
        let (seconds, clock) = manual_clock();
        let store = SessionStore::new(clock, Duration::from_secs(60), 10);
        for _ in 0..5 {
            store.insert(session());
        }

        seconds.fetch_add(120, Ordering::SeqCst);
        let fresh = store.insert(session());
        assert_eq!(store.len(), 1);
        assert!(store.get(fresh).is_some());
    }

    #[tokio::test]
    async fn when_at_capacity_then_least_recent_session_evicted() {
        let (seconds, clock) = manual_clock();
        let store = SessionStore::new(clock, Duration::from_secs(3600), 2);
        let oldest = store.insert(session());
        seconds.fetch_add(1, Ordering::SeqCst);
        let newer = store.insert(session());
        seconds.fetch_add(1, Ordering::SeqCst);

        let third = store.insert(session());
        assert_eq!(store.len(), 2);
        assert!(store.get(oldest).is_none());
        assert!(store.get(newer).is_some());
        assert!(store.get(third).is_some());
    }
}
