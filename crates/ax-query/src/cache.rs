//! Time-bounded cache of element attribute snapshots.
//!
//! Entries are keyed by [`ElementId`] and expire after a fixed TTL. Native
//! identities can be reused once an element is released, so every entry also
//! records the activation epoch it was written in; [`InfoCache::advance_epoch`]
//! is called at the start of each mode activation and invalidates everything
//! written before it.

use std::{
    collections::HashMap,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{self as chan, Sender, select};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::{ElementId, ElementInfo, Result};

/// Default lifetime of a cached snapshot.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Entry {
    info: ElementInfo,
    expires_at: Instant,
    epoch: u64,
}

struct Inner {
    entries: RwLock<HashMap<ElementId, Entry>>,
    ttl: Duration,
    epoch: AtomicU64,
}

/// Shared, thread-safe attribute cache.
///
/// Cloning yields another handle to the same storage.
#[derive(Clone)]
pub struct InfoCache {
    inner: Arc<Inner>,
}

impl Default for InfoCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl InfoCache {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                ttl,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Current activation epoch.
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Return the snapshot for `id` if present, unexpired and from the current epoch.
    pub fn get(&self, id: ElementId) -> Option<ElementInfo> {
        let now = Instant::now();
        let epoch = self.epoch();
        let entries = self.inner.entries.read();
        let entry = entries.get(&id)?;
        if entry.epoch != epoch || now >= entry.expires_at {
            return None;
        }
        Some(entry.info.clone())
    }

    /// Store a snapshot for `id`, replacing any previous entry.
    pub fn set(&self, id: ElementId, info: ElementInfo) {
        let entry = Entry {
            info,
            expires_at: Instant::now() + self.inner.ttl,
            epoch: self.epoch(),
        };
        self.inner.entries.write().insert(id, entry);
    }

    /// Start a new epoch. Entries written earlier are no longer returned.
    pub fn advance_epoch(&self) -> u64 {
        let next = self.inner.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(epoch = next, "attribute cache epoch advanced");
        next
    }

    /// Remove expired and stale-epoch entries, returning how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let epoch = self.epoch();
        let mut entries = self.inner.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.epoch == epoch && now < e.expires_at);
        before - entries.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.entries.write().clear();
    }

    /// Number of stored entries, including ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a background thread that calls [`cleanup`](Self::cleanup) every
    /// half TTL. The thread exits when the returned [`Sweeper`] is dropped or
    /// when every cache handle is gone.
    pub fn spawn_sweeper(&self) -> Result<Sweeper> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = (self.inner.ttl / 2).max(Duration::from_millis(10));
        let (stop_tx, stop_rx) = chan::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("ax-cache-sweep".into())
            .spawn(move || {
                let ticker = chan::tick(period);
                loop {
                    let tick = select! {
                        recv(stop_rx) -> _ => false,
                        recv(ticker) -> _ => true,
                    };
                    if !tick {
                        break;
                    }
                    let Some(inner) = weak.upgrade() else { break };
                    let dropped = InfoCache { inner }.cleanup();
                    if dropped > 0 {
                        trace!(dropped, "attribute cache swept");
                    }
                }
                debug!("attribute cache sweeper stopped");
            })?;
        Ok(Sweeper {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

/// Handle to the background cleanup thread; dropping it stops the thread.
pub struct Sweeper {
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(title: &str) -> ElementInfo {
        ElementInfo {
            title: title.into(),
            role: "AXButton".into(),
            enabled: true,
            ..ElementInfo::default()
        }
    }

    #[test]
    fn hit_then_expire() {
        let cache = InfoCache::new(Duration::from_millis(30));
        cache.set(ElementId(1), info("a"));
        assert_eq!(cache.get(ElementId(1)).map(|i| i.title), Some("a".into()));
        thread::sleep(Duration::from_millis(50));
        assert!(cache.get(ElementId(1)).is_none());
        assert_eq!(cache.cleanup(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn epoch_hides_previous_entries() {
        let cache = InfoCache::default();
        cache.set(ElementId(7), info("old"));
        cache.advance_epoch();
        assert!(cache.get(ElementId(7)).is_none());
        cache.set(ElementId(7), info("new"));
        assert_eq!(cache.get(ElementId(7)).map(|i| i.title), Some("new".into()));
    }

    #[test]
    fn cleanup_keeps_live_entries() {
        let cache = InfoCache::default();
        cache.set(ElementId(1), info("a"));
        cache.set(ElementId(2), info("b"));
        assert_eq!(cache.cleanup(), 0);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn sweeper_removes_expired_entries() {
        let cache = InfoCache::new(Duration::from_millis(20));
        let _sweeper = cache.spawn_sweeper().unwrap();
        cache.set(ElementId(3), info("c"));
        let deadline = Instant::now() + Duration::from_secs(2);
        while !cache.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn sweeper_stops_on_drop() {
        let cache = InfoCache::new(Duration::from_millis(20));
        let sweeper = cache.spawn_sweeper().unwrap();
        drop(sweeper);
        cache.set(ElementId(4), info("d"));
        assert_eq!(cache.len(), 1);
    }
}
