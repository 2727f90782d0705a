//! In-memory conversation sessions with TTL expiry and an LRU-style cap.
//!
//! Sessions are keyed by a v4 uuid handed back to the caller. Lookups lazily
//! expire stale sessions; insertions evict the oldest-accessed session once
//! the cap is reached. No background sweep runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use git_block_engine::BlockRef;
use llm_gateway::ChatRole;
use tracing::debug;
use uuid::Uuid;

/// One remembered exchange entry.
#[derive(Debug, Clone)]
pub struct SessionTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug)]
struct Session {
    created: Instant,
    last_access: Instant,
    turns: Vec<SessionTurn>,
    last_block: Option<BlockRef>,
}

/// Counters exposed for diagnostics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub active: usize,
    pub capacity: usize,
}

/// TTL-bounded, capacity-bounded store of conversation history.
#[derive(Debug)]
pub struct ConversationMemory {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
}

impl ConversationMemory {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Returns the given session id if it is still live, otherwise creates a
    /// fresh session and returns its id.
    pub fn get_or_create(&self, session_id: Option<&str>) -> String {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let now = Instant::now();

        if let Some(id) = session_id {
            if let Some(session) = sessions.get_mut(id) {
                if now.duration_since(session.last_access) <= self.ttl {
                    session.last_access = now;
                    return id.to_string();
                }
                sessions.remove(id);
            }
        }

        let id = Uuid::new_v4().to_string();
        if sessions.len() >= self.max_sessions {
            evict_oldest(&mut sessions);
        }
        debug!(session = %id, "created conversation session");
        sessions.insert(
            id.clone(),
            Session {
                created: now,
                last_access: now,
                turns: Vec::new(),
                last_block: None,
            },
        );
        id
    }

    /// Appends one turn to a session, refreshing its access time.
    pub fn record(&self, session_id: &str, role: ChatRole, content: &str, block: Option<&BlockRef>) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_access = Instant::now();
            session.turns.push(SessionTurn {
                role,
                content: content.to_string(),
            });
            if let Some(block) = block {
                session.last_block = Some(block.clone());
            }
        }
    }

    /// The last `n` turns of a live session, oldest first. Expired or unknown
    /// sessions yield an empty list.
    pub fn recent_turns(&self, session_id: &str, n: usize) -> Vec<SessionTurn> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        match sessions.get_mut(session_id) {
            Some(session) if session.last_access.elapsed() <= self.ttl => {
                session.last_access = Instant::now();
                let skip = session.turns.len().saturating_sub(n);
                session.turns[skip..].to_vec()
            }
            Some(_) => {
                sessions.remove(session_id);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// The block most recently discussed in a live session.
    pub fn last_block(&self, session_id: &str) -> Option<BlockRef> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get(session_id)
            .filter(|s| s.last_access.elapsed() <= self.ttl)
            .and_then(|s| s.last_block.clone())
    }

    pub fn stats(&self) -> SessionStats {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        SessionStats {
            active: sessions
                .values()
                .filter(|s| s.last_access.elapsed() <= self.ttl)
                .count(),
            capacity: self.max_sessions,
        }
    }
}

fn evict_oldest(sessions: &mut HashMap<String, Session>) {
    if let Some(oldest) = sessions
        .iter()
        .min_by_key(|(_, s)| s.last_access)
        .map(|(id, _)| id.clone())
    {
        debug!(session = %oldest, "evicting oldest session at capacity");
        sessions.remove(&oldest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_round_trip_in_order() {
        let memory = ConversationMemory::new(Duration::from_secs(60), 10);
        let id = memory.get_or_create(None);

        memory.record(&id, ChatRole::User, "why was this changed?", None);
        memory.record(&id, ChatRole::Assistant, "refactor in abc123", None);

        let turns = memory.recent_turns(&id, 10);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "why was this changed?");
        assert_eq!(turns[1].role, ChatRole::Assistant);
    }

    #[test]
    fn recent_turns_is_bounded_to_last_n() {
        let memory = ConversationMemory::new(Duration::from_secs(60), 10);
        let id = memory.get_or_create(None);
        for i in 0..5 {
            memory.record(&id, ChatRole::User, &format!("q{i}"), None);
        }
        let turns = memory.recent_turns(&id, 2);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "q3");
        assert_eq!(turns[1].content, "q4");
    }

    #[test]
    fn expired_sessions_are_recreated() {
        let memory = ConversationMemory::new(Duration::ZERO, 10);
        let id = memory.get_or_create(None);
        std::thread::sleep(Duration::from_millis(5));

        let next = memory.get_or_create(Some(&id));
        assert_ne!(next, id);
        assert!(memory.recent_turns(&id, 10).is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_session() {
        let memory = ConversationMemory::new(Duration::from_secs(60), 2);
        let a = memory.get_or_create(None);
        std::thread::sleep(Duration::from_millis(2));
        let b = memory.get_or_create(None);
        std::thread::sleep(Duration::from_millis(2));
        let c = memory.get_or_create(None);

        memory.record(&a, ChatRole::User, "gone", None);
        memory.record(&b, ChatRole::User, "kept", None);
        memory.record(&c, ChatRole::User, "kept", None);

        assert!(memory.recent_turns(&a, 10).is_empty());
        assert_eq!(memory.recent_turns(&b, 10).len(), 1);
        assert_eq!(memory.recent_turns(&c, 10).len(), 1);
    }

    #[test]
    fn last_block_tracks_the_most_recent_recorded_block() {
        let memory = ConversationMemory::new(Duration::from_secs(60), 10);
        let id = memory.get_or_create(None);
        assert!(memory.last_block(&id).is_none());

        let block = BlockRef {
            repo_owner: "acme".into(),
            repo_name: "widgets".into(),
            git_ref: "main".into(),
            path: "a.py".into(),
            start_line: 10,
            end_line: 12,
        };
        memory.record(&id, ChatRole::User, "who wrote this?", Some(&block));
        memory.record(&id, ChatRole::Assistant, "alice did", None);
        assert_eq!(memory.last_block(&id), Some(block));
    }

    #[test]
    fn known_session_id_is_reused() {
        let memory = ConversationMemory::new(Duration::from_secs(60), 10);
        let id = memory.get_or_create(None);
        assert_eq!(memory.get_or_create(Some(&id)), id);
        assert_eq!(memory.stats().active, 1);
    }
}
