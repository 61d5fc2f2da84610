#![forbid(unsafe_code)]

//! Observable values with explicit change notification.
//!
//! An [`Observable`] is a shared, versioned cell. Writers go through
//! [`set`](Observable::set) or [`update`](Observable::update); readers either
//! poll [`get`](Observable::get) / [`version`](Observable::version) or
//! register a callback with [`subscribe`](Observable::subscribe).
//!
//! # Invariants
//!
//! 1. Subscribers run only when the value actually changes (`!=`).
//! 2. The version advances exactly once per observed change.
//! 3. No internal borrow is held while subscribers run, so a subscriber may
//!    read or write the same observable.
//! 4. A subscriber added during notification is not called for that change;
//!    one removed during notification is not called after its removal.
//! 5. Dropping the [`Subscription`] guard unregisters the callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: T,
    version: u64,
    next_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
}

impl<T> Inner<T> {
    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers.iter().any(|(sid, _)| *sid == id)
    }
}

/// Shared observable value. Clones share the same cell.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Returns `true` (and notifies) if it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version = inner.version.wrapping_add(1);
        }
        self.notify();
        true
    }

    /// Mutate the value in place. Returns `true` (and notifies) if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            let before = inner.value.clone();
            f(&mut inner.value);
            if inner.value == before {
                return false;
            }
            inner.version = inner.version.wrapping_add(1);
        }
        self.notify();
        true
    }

    /// Monotonic change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Register `callback` for future changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Rc::new(callback)));
            id
        };
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().subscribers.retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    fn notify(&self) {
        let (value, snapshot) = {
            let inner = self.inner.borrow();
            let snapshot: Vec<(u64, Callback<T>)> = inner
                .subscribers
                .iter()
                .map(|(id, cb)| (*id, Rc::clone(cb)))
                .collect();
            (inner.value.clone(), snapshot)
        };
        for (id, callback) in snapshot {
            if self.inner.borrow().is_subscribed(id) {
                callback(&value);
            }
        }
    }
}

/// Guard returned by [`Observable::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribe now. Equivalent to dropping the guard.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
