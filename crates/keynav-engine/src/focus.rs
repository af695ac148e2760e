use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

/// The frontmost application changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusEvent {
    /// Bundle identifier of the newly focused application.
    pub bundle_id: Option<String>,
    /// Its process id.
    pub pid: Option<i32>,
}

type Callback = Box<dyn Fn(&FocusEvent) + Send + Sync>;

/// Subscribers to application focus changes.
///
/// The list is append-only. The platform watcher calls [`notify`](Self::notify)
/// from its own thread; callbacks run under the read lock, so they must not
/// subscribe.
#[derive(Clone, Default)]
pub struct FocusWatchers {
    subs: Arc<RwLock<Vec<Callback>>>,
}

impl FocusWatchers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback.
    pub fn subscribe(&self, f: impl Fn(&FocusEvent) + Send + Sync + 'static) {
        self.subs.write().push(Box::new(f));
    }

    /// Deliver `event` to every subscriber in subscription order.
    pub fn notify(&self, event: &FocusEvent) {
        let subs = self.subs.read();
        trace!("focus change {:?} -> {} watchers", event.bundle_id, subs.len());
        for f in subs.iter() {
            f(event);
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subs.read().len()
    }

    /// True when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn callbacks_run_in_order() {
        let w = FocusWatchers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let seen = seen.clone();
            w.subscribe(move |e| seen.lock().unwrap().push((n, e.pid)));
        }
        w.clone().notify(&FocusEvent {
            bundle_id: Some("com.apple.Safari".into()),
            pid: Some(7),
        });
        assert_eq!(*seen.lock().unwrap(), vec![(0, Some(7)), (1, Some(7)), (2, Some(7))]);
        assert_eq!(w.len(), 3);
    }
}
