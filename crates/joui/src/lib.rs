#![forbid(unsafe_code)]

//! joui: bindable controls and navigation stacks over a pluggable view
//! surface.
//!
//! This crate re-exports the workspace crates and offers a [`prelude`] for
//! application code.
//!
//! # Example
//!
//! ```
//! use joui::prelude::*;
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let surface = Rc::new(HeadlessSurface::new());
//! let focus = FocusCoordinator::new();
//!
//! let name = Property::shared("Ada");
//! let field = Control::with_tag(surface.clone(), focus, "input");
//! field.set_data_source(name.clone());
//!
//! let mut stack = Stack::new(surface.clone());
//! stack.push(field.clone());
//! stack.show();
//! surface.run_until_idle();
//!
//! assert_eq!(field.data(), json!("Ada"));
//! assert!(stack.is_visible());
//! ```

pub use joui_core as core;
pub use joui_runtime as runtime;
pub use joui_widgets as widgets;

pub use joui_core::{
    Capabilities, EventKind, FocusCoordinator, HeadlessSurface, NodeId, StyleSpec, Surface,
    SurfaceError, SurfaceHandle,
};
pub use joui_runtime::{BindingScope, Channel, DataSource, Property, Record, Subscription};
pub use joui_widgets::{Control, Seed, Stack, StackConfig, TransitionClasses, View, ViewBase};

/// Commonly used types.
pub mod prelude {
    pub use joui_core::{
        Capabilities, EventKind, FocusCoordinator, HeadlessSurface, NodeId, Surface,
        SurfaceHandle,
    };
    pub use joui_runtime::{BindingScope, Channel, DataSource, Property, Record, Subscription};
    pub use joui_widgets::{Control, Seed, Stack, StackConfig, View, ViewBase};
}
