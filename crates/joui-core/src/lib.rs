#![forbid(unsafe_code)]

//! Core: the platform view surface and its supporting types.
//!
//! # Role in joui
//! `joui-core` is the boundary between widgets and whatever renders them.
//! It defines the [`Surface`] trait, node/listener/task handles, style
//! specifications, and the [`DeferredQueue`] that drives delayed callbacks.
//!
//! # Primary responsibilities
//! - **Surface**: element creation, class-list edits, tree mutation,
//!   listener registration, deferred callbacks.
//! - **HeadlessSurface**: an in-memory surface with a virtual clock for
//!   deterministic tests.
//! - **FocusCoordinator**: the single current focus holder.
//!
//! # How it fits in the system
//! `joui-runtime` (channels and data sources) does not depend on this crate.
//! `joui-widgets` joins the two: `Control` and `Stack` drive a [`Surface`]
//! and publish through runtime channels.

pub mod deferred;
pub mod error;
pub mod focus;
pub mod headless;
pub mod style;
pub mod surface;

pub use deferred::DeferredQueue;
pub use error::SurfaceError;
pub use focus::{FocusCoordinator, FocusTarget};
pub use headless::{DispatchOutcome, HeadlessSurface};
pub use style::{StyleProperty, StyleSpec};
pub use surface::{
    Capabilities, DeferredFn, EventKind, ListenerFn, ListenerToken, NodeId, Surface,
    SurfaceEvent, SurfaceHandle, TaskId, create_styled,
};
