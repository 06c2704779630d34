//! Bounded session history.
//!
//! Sessions are kept in creation order; inserting beyond the capacity evicts
//! the oldest. Each record carries the run-time handles the toolkit needs
//! while the session executes.
//!
//! A session that has been handed to a run is *in flight* until the run
//! calls [`SessionRegistry::finish`]. Eviction and [`SessionRegistry::clear`]
//! drop it from the history but keep its record, so the run can still be
//! cancelled, keeps recording output, and finalizes a real snapshot.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use ffkit_core::{Session, SessionId};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// A session plus its run-time handles.
#[derive(Debug)]
struct Record {
    session: Session,
    cancel: Option<CancellationToken>,
    transmit: Arc<watch::Sender<usize>>,
}

impl Record {
    fn in_flight(&self) -> bool {
        self.cancel.is_some()
    }
}

#[derive(Debug)]
struct Inner {
    order: VecDeque<SessionId>,
    records: HashMap<SessionId, Record>,
    /// In-flight sessions no longer visible in the history.
    detached: HashMap<SessionId, Record>,
    capacity: usize,
}

impl Inner {
    fn forget(&mut self, id: SessionId) {
        if let Some(record) = self.records.remove(&id) {
            if record.in_flight() {
                let _ = self.detached.insert(id, record);
            }
        }
    }

    fn evict_overflow(&mut self) {
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.forget(oldest);
            }
        }
    }

    fn record(&self, id: SessionId) -> Option<&Record> {
        self.records.get(&id).or_else(|| self.detached.get(&id))
    }

    fn record_mut(&mut self, id: SessionId) -> Option<&mut Record> {
        match self.records.get_mut(&id) {
            Some(record) => Some(record),
            None => self.detached.get_mut(&id),
        }
    }
}

/// Creation-ordered, bounded session store.
#[derive(Debug)]
pub struct SessionRegistry {
    inner: Mutex<Inner>,
}

impl SessionRegistry {
    /// Empty registry holding at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                order: VecDeque::new(),
                records: HashMap::new(),
                detached: HashMap::new(),
                capacity,
            }),
        }
    }

    /// Add a session, evicting the oldest if the history is full.
    pub fn insert(&self, session: Session) {
        let (transmit, _) = watch::channel(0);
        let mut inner = self.inner.lock();
        inner.order.push_back(session.id);
        let _ = inner.records.insert(
            session.id,
            Record {
                session,
                cancel: None,
                transmit: Arc::new(transmit),
            },
        );
        inner.evict_overflow();
    }

    /// Snapshot of one session in the history.
    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.inner.lock().records.get(&id).map(|r| r.session.clone())
    }

    /// Mutate a session in place, in the history or in flight. Returns
    /// `None` if it is held by neither.
    pub fn update<T>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        self.inner.lock().record_mut(id).map(|r| f(&mut r.session))
    }

    /// Hand a history session to a run.
    ///
    /// `f` sees the session and whether it is already in flight; on `Ok`
    /// the session becomes in flight under `cancel`. Returns `None` if the
    /// session is not in the history.
    pub fn begin<T, E>(
        &self,
        id: SessionId,
        cancel: CancellationToken,
        f: impl FnOnce(&mut Session, bool) -> Result<T, E>,
    ) -> Option<Result<(T, Arc<watch::Sender<usize>>), E>> {
        let mut inner = self.inner.lock();
        let record = inner.records.get_mut(&id)?;
        let in_flight = record.in_flight();
        Some(f(&mut record.session, in_flight).map(|value| {
            record.cancel = Some(cancel);
            (value, Arc::clone(&record.transmit))
        }))
    }

    /// End a run: the session is no longer in flight. Returns its final
    /// snapshot, whether or not it is still in the history.
    pub fn finish(&self, id: SessionId) -> Option<Session> {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.detached.remove(&id) {
            return Some(record.session);
        }
        inner.records.get_mut(&id).map(|record| {
            record.cancel = None;
            record.session.clone()
        })
    }

    /// Snapshots in creation order.
    pub fn snapshot(&self) -> Vec<Session> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .map(|r| r.session.clone())
            .collect()
    }

    /// Latest session matching `pred`.
    pub fn last_matching(&self, pred: impl Fn(&Session) -> bool) -> Option<Session> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.records.get(id))
            .find(|r| pred(&r.session))
            .map(|r| r.session.clone())
    }

    /// Current capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Change the capacity, evicting the oldest sessions beyond it.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.inner.lock();
        inner.capacity = capacity;
        inner.evict_overflow();
    }

    /// Forget every session in the history.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let ids: Vec<SessionId> = inner.order.drain(..).collect();
        for id in ids {
            inner.forget(id);
        }
    }

    /// Cancellation token of an in-flight session.
    pub fn cancel_token(&self, id: SessionId) -> Option<CancellationToken> {
        self.inner.lock().record(id).and_then(|r| r.cancel.clone())
    }

    /// Tokens of every in-flight session, including detached ones.
    pub fn cancel_tokens(&self) -> Vec<CancellationToken> {
        let inner = self.inner.lock();
        inner
            .records
            .values()
            .chain(inner.detached.values())
            .filter_map(|r| r.cancel.clone())
            .collect()
    }

    /// Counter of output streams still in transmit.
    pub fn transmit(&self, id: SessionId) -> Option<Arc<watch::Sender<usize>>> {
        self.inner.lock().record(id).map(|r| Arc::clone(&r.transmit))
    }

    /// Number of in-flight sessions no longer in the history.
    pub fn detached_len(&self) -> usize {
        self.inner.lock().detached.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ffkit_core::{LogRedirectionStrategy, SessionKind, SessionState};

    fn session(id: i64) -> Session {
        Session::new(
            SessionId::new(id),
            SessionKind::FFmpeg,
            vec![],
            LogRedirectionStrategy::NeverPrintLogs,
        )
    }

    fn ids(registry: &SessionRegistry) -> Vec<i64> {
        registry.snapshot().iter().map(|s| s.id.get()).collect()
    }

    #[test]
    fn keeps_creation_order() {
        let registry = SessionRegistry::new(10);
        for id in 1..=3 {
            registry.insert(session(id));
        }
        assert_eq!(ids(&registry), vec![1, 2, 3]);
    }

    #[test]
    fn history_bound_evicts_oldest() {
        let registry = SessionRegistry::new(2);
        for id in 1..=3 {
            registry.insert(session(id));
        }
        assert_eq!(ids(&registry), vec![2, 3]);
        assert!(registry.get(SessionId::new(1)).is_none());
    }

    #[test]
    fn shrinking_capacity_evicts() {
        let registry = SessionRegistry::new(5);
        for id in 1..=5 {
            registry.insert(session(id));
        }
        registry.set_capacity(2);
        assert_eq!(ids(&registry), vec![4, 5]);
        assert_eq!(registry.capacity(), 2);
    }

    #[test]
    fn update_and_last_matching() {
        let registry = SessionRegistry::new(5);
        for id in 1..=3 {
            registry.insert(session(id));
        }
        let _ = registry.update(SessionId::new(2), |s| s.state = SessionState::Completed);

        let last_completed = registry.last_matching(|s| s.state == SessionState::Completed);
        assert_eq!(last_completed.unwrap().id, SessionId::new(2));
        assert_eq!(registry.last_matching(|_| true).unwrap().id, SessionId::new(3));
        assert!(registry.update(SessionId::new(9), |_| ()).is_none());
    }

    fn begin(registry: &SessionRegistry, id: i64) -> CancellationToken {
        let token = CancellationToken::new();
        let started = registry.begin(SessionId::new(id), token.clone(), |s, in_flight| {
            assert!(!in_flight);
            s.state = SessionState::Running;
            Ok::<_, ()>(())
        });
        assert!(matches!(started, Some(Ok(_))));
        token
    }

    #[test]
    fn cancel_tokens_only_for_in_flight() {
        let registry = SessionRegistry::new(5);
        registry.insert(session(1));
        registry.insert(session(2));
        let _ = begin(&registry, 2);

        assert!(registry.cancel_token(SessionId::new(1)).is_none());
        assert!(registry.cancel_token(SessionId::new(2)).is_some());
        assert_eq!(registry.cancel_tokens().len(), 1);
    }

    #[test]
    fn begin_reports_in_flight_and_missing() {
        let registry = SessionRegistry::new(5);
        registry.insert(session(1));
        let _ = begin(&registry, 1);

        let again = registry.begin(SessionId::new(1), CancellationToken::new(), |_, in_flight| {
            if in_flight { Err("busy") } else { Ok(()) }
        });
        assert!(matches!(again, Some(Err("busy"))));
        let missing = registry.begin(SessionId::new(9), CancellationToken::new(), |_, _| Ok::<_, ()>(()));
        assert!(missing.is_none());
    }

    #[test]
    fn evicted_in_flight_session_stays_reachable() {
        let registry = SessionRegistry::new(1);
        registry.insert(session(1));
        let token = begin(&registry, 1);
        registry.insert(session(2));

        assert_eq!(ids(&registry), vec![2]);
        assert!(registry.get(SessionId::new(1)).is_none());
        assert_eq!(registry.detached_len(), 1);
        assert_eq!(registry.cancel_tokens().len(), 1);
        assert!(registry.transmit(SessionId::new(1)).is_some());

        registry.cancel_tokens()[0].cancel();
        assert!(token.is_cancelled());

        let updated = registry.update(SessionId::new(1), |s| s.state = SessionState::Completed);
        assert!(updated.is_some());
        let done = registry.finish(SessionId::new(1)).unwrap();
        assert_eq!(done.state, SessionState::Completed);
        assert_eq!(registry.detached_len(), 0);
        assert!(registry.cancel_tokens().is_empty());
    }

    #[test]
    fn clear_keeps_in_flight_runs() {
        let registry = SessionRegistry::new(5);
        registry.insert(session(1));
        registry.insert(session(2));
        let _ = begin(&registry, 2);
        registry.clear();

        assert!(registry.snapshot().is_empty());
        assert_eq!(registry.detached_len(), 1);
        assert!(registry.cancel_token(SessionId::new(2)).is_some());
        assert!(registry.transmit(SessionId::new(1)).is_none());
    }

    #[test]
    fn finish_in_history_clears_token() {
        let registry = SessionRegistry::new(5);
        registry.insert(session(1));
        let _ = begin(&registry, 1);
        let done = registry.finish(SessionId::new(1)).unwrap();
        assert_eq!(done.id, SessionId::new(1));
        assert!(registry.cancel_token(SessionId::new(1)).is_none());
        assert_eq!(ids(&registry), vec![1]);
    }

    #[test]
    fn clear_empties_history() {
        let registry = SessionRegistry::new(5);
        registry.insert(session(1));
        registry.clear();
        assert!(registry.snapshot().is_empty());
        assert!(registry.transmit(SessionId::new(1)).is_none());
    }
}
