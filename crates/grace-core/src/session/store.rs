//! Observable single-value store for the session.
//!
//! One writer replaces the whole value; any number of readers observe it
//! either through callbacks ([`SessionStore::subscribe`]) or a
//! `tokio::sync::watch` receiver ([`SessionStore::watch`]).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;

use super::state::SessionState;
use crate::user::User;

type Callback = Box<dyn Fn(Option<&User>) + Send + Sync>;

struct Entry {
    callback: Callback,
    /// Highest state version handed to `callback`.
    delivered: AtomicU64,
}

impl Entry {
    /// Runs the callback unless it already saw `version` or a later one.
    fn deliver(&self, version: u64, user: Option<&User>) {
        if self.delivered.fetch_max(version, Ordering::AcqRel) < version {
            (self.callback)(user);
        }
    }
}

/// Registry guarded together with the state version, so a subscriber is
/// either part of a replacement's fan-out or sees its result on
/// registration, never both.
#[derive(Default)]
struct Subscribers {
    next_id: u64,
    /// Bumped on every effective replacement; the initial `Loading` is 0.
    version: u64,
    callbacks: BTreeMap<u64, Arc<Entry>>,
}

/// Process-wide session holder.
///
/// Writes are whole-value replacements. Replacing with an equal value is a
/// no-op and notifies nobody. Callbacks are never invoked while `Loading`.
pub struct SessionStore {
    sender: watch::Sender<SessionState>,
    subscribers: Mutex<Subscribers>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        let (sender, _) = watch::channel(SessionState::Loading);
        Arc::new(Self {
            sender,
            subscribers: Mutex::new(Subscribers::default()),
        })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.sender.borrow().user().cloned()
    }

    /// Receiver starting at the current state.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    /// Replaces the state and notifies subscribers if it changed.
    ///
    /// Returns whether a change happened.
    pub fn replace(&self, next: SessionState) -> bool {
        let (version, targets) = {
            let mut subscribers = self.lock_subscribers();
            let changed = self.sender.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next.clone();
                    true
                }
            });
            if !changed {
                return false;
            }
            subscribers.version += 1;
            if next.is_loading() {
                return true;
            }
            let targets: Vec<Arc<Entry>> = subscribers.callbacks.values().cloned().collect();
            (subscribers.version, targets)
        };

        // Callbacks run without the lock held.
        for entry in targets {
            entry.deliver(version, next.user());
        }
        true
    }

    /// Registers `callback`.
    ///
    /// If the state is already resolved the callback runs once immediately
    /// with it; afterwards it runs on every change. Dropping the returned
    /// [`Subscription`] deregisters it.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        let entry = Arc::new(Entry {
            callback: Box::new(callback),
            delivered: AtomicU64::new(0),
        });
        let (id, version, current) = {
            let mut subscribers = self.lock_subscribers();
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.callbacks.insert(id, Arc::clone(&entry));
            (id, subscribers.version, self.state())
        };

        if !current.is_loading() {
            entry.deliver(version, current.user());
        }

        Subscription {
            store: Arc::downgrade(self),
            id: Some(id),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().callbacks.len()
    }

    fn remove(&self, id: u64) {
        self.lock_subscribers().callbacks.remove(&id);
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Subscribers> {
        // A panicking callback never runs under this lock, so poisoning
        // leaves the map consistent.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Disposer returned by [`SessionStore::subscribe`].
///
/// Disposing after the store has been torn down is a no-op.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<SessionStore>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.store.strong_count() > 0
    }

    fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(store) = self.store.upgrade() {
                store.remove(id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
