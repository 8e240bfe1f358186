#![forbid(unsafe_code)]

//! Lifetime grouping for subscriptions.
//!
//! A [`BindingScope`] owns a set of [`Subscription`]s that belong together,
//! typically everything a screen wires up when it is shown. Dropping or
//! clearing the scope disconnects all of them at once.
//!
//! # Invariants
//!
//! 1. After `clear()` or drop, no callback registered through the scope runs.
//! 2. `binding_count()` equals the number of held subscriptions.
//! 3. A cleared scope is reusable.

use crate::channel::{Channel, Subscription};
use crate::source::DataSource;
use serde_json::Value;
use std::rc::Rc;

/// Collects subscriptions for a logical scope.
#[derive(Default)]
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to `channel` within this scope.
    pub fn subscribe<T: 'static>(
        &mut self,
        channel: &Channel<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(channel.subscribe(callback));
        self
    }

    /// Mirror `from` into `to` for as long as the scope lives.
    ///
    /// `to` immediately takes the current value of `from`.
    pub fn link(&mut self, from: &Rc<dyn DataSource>, to: &Rc<dyn DataSource>) -> &mut Self {
        to.set_data(from.get_data());
        let target = Rc::clone(to);
        self.subscribe(from.change_event(), move |v: &Value| {
            target.set_data(v.clone());
        })
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every subscription now.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}
