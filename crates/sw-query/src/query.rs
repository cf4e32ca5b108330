//! `Query` and `QueryManager` (spec §4.8).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::error::QueryError;
use crate::state::QueryState;

/// Whether a query stays active for more than one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Completes after one `REPLIED` or `END`.
    Closed,
    /// Stays active until expiry, may collect multiple replies.
    Open,
}

/// One outstanding query, inbound or outbound.
pub struct Query {
    pub id: u16,
    pub kind: QueryKind,
    pub expires: Duration,
    pub destinations: Vec<String>,
    state: Mutex<QueryState>,
    notify: Notify,
    reply_since_last_wait: AtomicBool,
    expired: AtomicBool,
    activated_at: Mutex<Instant>,
    generation: AtomicU64,
    /// Streaming moderation state for `reply_next` (spec §4.8 "Streaming
    /// moderation"): throttled relative to the first `replyNext` call.
    stream_start: Mutex<Option<Instant>>,
    items_emitted: AtomicU64,
    reply_rate_per_sec: f64,
}

impl Query {
    fn new(id: u16, kind: QueryKind, expires: Duration, destinations: Vec<String>, reply_rate_per_sec: f64) -> Self {
        Query {
            id,
            kind,
            expires,
            destinations,
            state: Mutex::new(QueryState::Query),
            notify: Notify::new(),
            reply_since_last_wait: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            activated_at: Mutex::new(Instant::now()),
            generation: AtomicU64::new(0),
            stream_start: Mutex::new(None),
            items_emitted: AtomicU64::new(0),
            reply_rate_per_sec,
        }
    }

    pub fn state(&self) -> QueryState {
        *self.state.lock().unwrap()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Record activation now; callers that advance the state call this to
    /// restart the expiry timer (spec §4.8 "Expiry").
    fn mark_activated(&self) -> u64 {
        *self.activated_at.lock().unwrap() = Instant::now();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn mark_reply(&self) {
        self.reply_since_last_wait.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// `QUERY -> REPLIED`: the single reply of a closed query.
    pub fn on_inquire(&self) -> Result<(), QueryError> {
        let mut state = self.state.lock().unwrap();
        if *state != QueryState::Query {
            return Err(QueryError::InvalidTransition { from: *state, action: "on_inquire" });
        }
        *state = QueryState::Replied;
        drop(state);
        self.mark_activated();
        self.mark_reply();
        Ok(())
    }

    /// `QUERY|NEXT -> NEXT`, rate-moderated relative to the first call in
    /// this stream.
    pub async fn reply_next(&self) -> Result<(), QueryError> {
        {
            let state = self.state.lock().unwrap();
            if !matches!(*state, QueryState::Query | QueryState::Next) {
                return Err(QueryError::InvalidTransition { from: *state, action: "reply_next" });
            }
        }

        let start = {
            let mut s = self.stream_start.lock().unwrap();
            *s.get_or_insert_with(Instant::now)
        };
        let n = self.items_emitted.fetch_add(1, Ordering::SeqCst) + 1;
        let due = start + Duration::from_secs_f64(n as f64 / self.reply_rate_per_sec);
        let now = Instant::now();
        if due > now {
            tokio::time::sleep(due - now).await;
        }

        *self.state.lock().unwrap() = QueryState::Next;
        self.mark_activated();
        self.mark_reply();
        Ok(())
    }

    /// `QUERY|NEXT -> END`: terminal.
    pub fn reply_end(&self) -> Result<(), QueryError> {
        let mut state = self.state.lock().unwrap();
        if !matches!(*state, QueryState::Query | QueryState::Next) {
            return Err(QueryError::InvalidTransition { from: *state, action: "reply_end" });
        }
        *state = QueryState::End;
        drop(state);
        self.mark_reply();
        Ok(())
    }

    /// Any state -> `ABORTED`: terminal, unconditional.
    pub fn abort(&self) {
        *self.state.lock().unwrap() = QueryState::Aborted;
        self.notify.notify_waiters();
    }

    /// Block until a reply has arrived since the previous call, or until
    /// expiry/abort. Returns `true` for a reply, `false` on expiry.
    pub async fn wait_for_reply(&self) -> bool {
        loop {
            if self.reply_since_last_wait.swap(false, Ordering::SeqCst) {
                return true;
            }
            if self.expired.load(Ordering::SeqCst) {
                return false;
            }
            if self.state() == QueryState::Aborted {
                return false;
            }
            let notified = self.notify.notified();
            // Re-check after registering interest to avoid a missed wakeup
            // between the checks above and this await.
            if self.reply_since_last_wait.load(Ordering::SeqCst)
                || self.expired.load(Ordering::SeqCst)
                || self.state() == QueryState::Aborted
            {
                continue;
            }
            notified.await;
        }
    }
}

/// Hook fired exactly once when a query's expiry timer elapses (spec §4.8).
pub trait ExpiryHook: Send + Sync {
    fn on_expire(&self, query_id: u16);
}

/// Owns every pending query and issues modulo-2^16 query ids.
pub struct QueryManager {
    pending: Mutex<HashMap<u16, Arc<Query>>>,
    next_id: AtomicU16,
    hook: Arc<dyn ExpiryHook>,
}

impl QueryManager {
    pub fn new(hook: Arc<dyn ExpiryHook>) -> Arc<Self> {
        Arc::new(QueryManager {
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU16::new(0),
            hook,
        })
    }

    fn alloc_id(&self) -> u16 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Create a new query, activate its expiry timer, and register it.
    pub fn create(self: &Arc<Self>, kind: QueryKind, expires: Duration, destinations: Vec<String>, reply_rate_per_sec: f64) -> Arc<Query> {
        let id = self.alloc_id();
        let query = Arc::new(Query::new(id, kind, expires, destinations, reply_rate_per_sec));
        self.pending.lock().unwrap().insert(id, query.clone());
        self.activate(&query);
        query
    }

    pub fn get(&self, id: u16) -> Option<Arc<Query>> {
        self.pending.lock().unwrap().get(&id).cloned()
    }

    pub fn remove(&self, id: u16) -> Option<Arc<Query>> {
        self.pending.lock().unwrap().remove(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// (Re)start the expiry timer: spec §4.8 "any reply that advances the
    /// state calls `activate()` again to restart the timer."
    pub fn activate(self: &Arc<Self>, query: &Arc<Query>) {
        let generation = query.mark_activated();
        let expires = query.expires;
        let query_weak = Arc::downgrade(query);
        let manager_weak: Weak<QueryManager> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(expires).await;
            let Some(query) = query_weak.upgrade() else { return };
            let Some(manager) = manager_weak.upgrade() else { return };
            if query.generation.load(Ordering::SeqCst) != generation {
                return; // a later activate() superseded this timer
            }
            if query.is_terminal() {
                return;
            }
            query.expired.store(true, Ordering::SeqCst);
            query.notify.notify_waiters();
            manager.remove(query.id);
            manager.hook.on_expire(query.id);
        });
    }

    /// Abort every pending query, e.g. on shutdown or peer disconnect.
    pub fn abort_all(&self) {
        let mut pending = self.pending.lock().unwrap();
        for query in pending.values() {
            query.abort();
        }
        pending.clear();
    }
}
