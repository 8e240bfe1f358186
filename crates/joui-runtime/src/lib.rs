#![forbid(unsafe_code)]

//! Notification and binding primitives for joui.
//!
//! - [`Channel`]: ordered, synchronous publish/subscribe.
//! - [`Subscription`]: RAII handle that unsubscribes on drop.
//! - [`DataSource`]: the bindable-value protocol, with [`Property`],
//!   [`Record`] and [`RecordProperty`] implementations.
//! - [`BindingScope`]: groups subscriptions by lifetime.
//!
//! # Architecture
//!
//! Everything is single-threaded. Channels share their subscriber list
//! through `Rc<RefCell<..>>` and hold subscribers as `Weak` callbacks; the
//! matching strong reference lives in the [`Subscription`]. Dead entries are
//! pruned lazily when the channel fires.

pub mod channel;
pub mod scope;
pub mod source;

pub use channel::{Channel, Subscription};
pub use scope::BindingScope;
pub use source::{DataSource, Property, Record, RecordProperty, or_null};
