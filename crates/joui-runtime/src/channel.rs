#![forbid(unsafe_code)]

//! Synchronous publish/subscribe channels.
//!
//! A [`Channel<T>`] keeps an ordered list of subscribers and invokes each of
//! them, in registration order, every time a payload is fired. It is the
//! only notification primitive in joui: control changes, selections and
//! stack navigation all travel through channels.
//!
//! # Usage
//!
//! ```
//! use joui_runtime::Channel;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let changed = Channel::new("editor.change");
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let s = Rc::clone(&seen);
//! let sub = changed.subscribe(move |v: &i32| s.borrow_mut().push(*v));
//!
//! changed.fire(&1);
//! drop(sub);
//! changed.fire(&2);
//! assert_eq!(*seen.borrow(), vec![1]);
//! ```
//!
//! # Invariants
//!
//! 1. Subscribers run in registration order.
//! 2. No de-duplication: subscribing the same callback twice runs it twice.
//! 3. Dropping (or [releasing](Subscription::release)) a [`Subscription`]
//!    removes the subscriber before it could be called again, including
//!    later in a fire that is already in progress.
//! 4. Subscribers added during a fire are first called by the next fire.
//! 5. No internal borrow is held while a subscriber runs, so subscribers may
//!    subscribe, release or fire re-entrantly.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Subscriber panic | Bug in a callback | Propagates to the caller of `fire`; later subscribers are skipped |
//! | Channel dropped | Owner went away | Outstanding subscriptions become inert |

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ChannelInner<T> {
    owner: String,
    subscribers: Vec<Weak<Callback<T>>>,
    /// Callbacks kept alive by [`Subscription::forget`].
    pinned: Vec<Box<dyn Any>>,
}

/// An ordered fan-out of `&T` payloads.
///
/// Cloning shares the same subscriber list.
pub struct Channel<T> {
    inner: Rc<RefCell<ChannelInner<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Channel")
            .field("owner", &inner.owner)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: 'static> Channel<T> {
    /// Create a channel. `owner` only labels tracing output.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChannelInner {
                owner: owner.into(),
                subscribers: Vec::new(),
                pinned: Vec::new(),
            })),
        }
    }

    /// Label given at construction.
    #[must_use]
    pub fn owner(&self) -> String {
        self.inner.borrow().owner.clone()
    }

    /// Append a subscriber.
    ///
    /// The callback stays registered while the returned [`Subscription`] is
    /// alive.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));

        let channel = Rc::downgrade(&self.inner);
        Subscription {
            guard: Some(Box::new(strong)),
            pin: Some(Box::new(move |guard| {
                if let Some(inner) = channel.upgrade() {
                    inner.borrow_mut().pinned.push(guard);
                }
            })),
        }
    }

    /// Invoke every live subscriber with `payload`, in registration order.
    pub fn fire(&self, payload: &T) {
        let snapshot: Vec<Weak<Callback<T>>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            tracing::trace!(
                owner = %inner.owner,
                subscribers = inner.subscribers.len(),
                "channel fire"
            );
            inner.subscribers.clone()
        };
        for weak in &snapshot {
            if let Some(callback) = weak.upgrade() {
                callback(payload);
            }
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// RAII handle for a channel subscriber.
///
/// Dropping the handle unsubscribes. Use [`forget`](Self::forget) to keep
/// the subscriber for the rest of the channel's life instead.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    guard: Option<Box<dyn Any>>,
    pin: Option<Box<dyn FnOnce(Box<dyn Any>)>>,
}

impl Subscription {
    /// Unsubscribe now.
    pub fn release(self) {
        drop(self);
    }

    /// Hand the subscriber over to its channel so it lives as long as the
    /// channel does.
    pub fn forget(mut self) {
        if let (Some(guard), Some(pin)) = (self.guard.take(), self.pin.take()) {
            pin(guard);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.guard.is_some())
            .finish()
    }
}
