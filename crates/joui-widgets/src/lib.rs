#![forbid(unsafe_code)]

//! Widgets: bindable controls and navigation stacks.
//!
//! - [`View`] / [`ViewBase`]: anything with a surface node.
//! - [`Control`]: a view bound to data sources, reacting to clicks and
//!   focus changes.
//! - [`Stack`]: a navigation history with animated swaps, configured by
//!   [`StackConfig`].

pub mod config;
pub mod control;
pub mod stack;
pub mod view;

pub use config::{StackConfig, TransitionClasses};
pub use control::{CONTROL_TAG, Control, Seed};
pub use stack::{STACK_TAG, Stack, StyleContainerFn};
pub use view::{View, ViewBase, display_text, same_view};
