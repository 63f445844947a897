//! Shared key-value notification store.
//!
//! # Responsibilities
//! - Hold application-wide values shared between independent instances
//! - Notify every current subscriber with the full map after each write
//!
//! # Design Decisions
//! - Cloning a `Store` yields another handle to the same data
//! - Subscribers run synchronously, in subscription order; a failing
//!   subscriber is logged and the remaining ones still run
//! - The subscriber list is snapshotted before notifying, so a subscriber
//!   may unsubscribe (itself or others) without re-entrancy issues

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

type Subscriber = Rc<dyn Fn(&Map<String, Value>) -> anyhow::Result<()>>;

#[derive(Default)]
struct Inner {
    data: Map<String, Value>,
    subscribers: Vec<(u64, Subscriber)>,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<Inner>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().data.get(key).cloned()
    }

    /// The whole map.
    pub fn data(&self) -> Map<String, Value> {
        self.inner.borrow().data.clone()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.borrow_mut().data.insert(key.into(), value);
        self.notify();
    }

    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        {
            let mut inner = self.inner.borrow_mut();
            let value = f(inner.data.get(key));
            inner.data.insert(key.to_string(), value);
        }
        self.notify();
    }

    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Map<String, Value>) -> anyhow::Result<()> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push((id, Rc::new(f)));
        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        let (data, subscribers) = {
            let inner = self.inner.borrow();
            let subscribers: Vec<Subscriber> =
                inner.subscribers.iter().map(|(_, s)| Rc::clone(s)).collect();
            (inner.data.clone(), subscribers)
        };
        for subscriber in subscribers {
            if let Err(e) = subscriber(&data) {
                tracing::warn!(error = %e, "Store subscriber failed");
            }
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("data", &inner.data)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug)]
#[must_use = "dropping a Subscription keeps the subscriber registered"]
pub struct Subscription {
    id: u64,
    store: Weak<RefCell<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            inner.borrow_mut().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner").field("data", &self.data).finish()
    }
}
