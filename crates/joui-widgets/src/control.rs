#![forbid(unsafe_code)]

//! Interactive, data-driven controls.
//!
//! A [`Control`] is a [`ViewBase`] that reacts to clicks and focus changes
//! and can be bound to up to two [`DataSource`]s:
//!
//! - the **display source** (`set_data_source`) mirrors the control's data;
//! - the **value source** (`set_value_source`) feeds the control's value and
//!   receives the control's data whenever it is selected.
//!
//! # Binding protocol
//!
//! | Direction | Display source | Value source |
//! |-----------|----------------|--------------|
//! | source → control | `change_event` → `set_data` | `change_event` → `set_value` |
//! | control → source | `change_event` → `source.set_data` | `select_event` → `source.set_data` |
//!
//! On bind the control pulls the source's current value (falsy collapses to
//! null) before subscribing outward, so binding never writes back into the
//! source.
//!
//! # Invariants
//!
//! 1. At most one display binding and one value binding are live. Rebinding
//!    releases both directions of the previous binding first.
//! 2. `set_data` and `set_value` only fire when the stored value changes.
//!    Together with the same guard in the provided sources this stops echo
//!    loops.
//! 3. Platform listeners hold the control weakly and are detached on drop.
//!
//! # Example
//!
//! ```
//! use joui_core::{FocusCoordinator, HeadlessSurface, SurfaceHandle};
//! use joui_runtime::{DataSource, Property};
//! use joui_widgets::Control;
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let surface: SurfaceHandle = Rc::new(HeadlessSurface::new());
//! let name = Property::shared("hello");
//! let control = Control::new(surface, FocusCoordinator::new());
//! control.set_data_source(name.clone());
//! assert_eq!(control.data(), json!("hello"));
//!
//! name.set_data(json!("x"));
//! assert_eq!(control.data(), json!("x"));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use joui_core::{
    EventKind, FocusCoordinator, FocusTarget, ListenerToken, NodeId, SurfaceError, SurfaceEvent,
    SurfaceHandle,
};
use joui_runtime::{Channel, DataSource, Subscription, or_null};
use serde_json::Value;

use crate::view::{View, ViewBase};

/// Default element tag.
pub const CONTROL_TAG: &str = "jocontrol";

const DISABLED_CLASS: &str = "disabled";
const FOCUS_CLASS: &str = "focus";
const READONLY_ATTR: &str = "readonly";

/// Initial data or value for [`Control::seeded`]: nothing, a plain value to
/// store, or a source to bind.
#[derive(Clone, Default)]
pub enum Seed {
    #[default]
    Empty,
    Value(Value),
    Source(Rc<dyn DataSource>),
}

impl From<Value> for Seed {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Rc<dyn DataSource>> for Seed {
    fn from(source: Rc<dyn DataSource>) -> Self {
        Self::Source(source)
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Source(_) => f.write_str("Source(..)"),
        }
    }
}

/// A live connection to a data source.
struct SourceBinding {
    source: Rc<dyn DataSource>,
    _inbound: Subscription,
    _outbound: Subscription,
}

/// A bindable, focusable, selectable view.
pub struct Control {
    me: Weak<Control>,
    base: ViewBase,
    focus: FocusCoordinator,
    enabled: Cell<bool>,
    value: RefCell<Value>,
    change_event: Channel<Value>,
    select_event: Channel<Value>,
    display_source: RefCell<Option<SourceBinding>>,
    value_source: RefCell<Option<SourceBinding>>,
    listeners: RefCell<Vec<(EventKind, ListenerToken)>>,
}

impl Control {
    /// Create a control with the default tag.
    pub fn new(surface: SurfaceHandle, focus: FocusCoordinator) -> Rc<Self> {
        Self::from_base(ViewBase::new(surface, CONTROL_TAG), focus)
    }

    /// Create a control whose node uses `tag` (e.g. `"input"`).
    pub fn with_tag(surface: SurfaceHandle, focus: FocusCoordinator, tag: &str) -> Rc<Self> {
        Self::from_base(ViewBase::new(surface, tag), focus)
    }

    /// Create a control with a styled node.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] for an unrecognized style shape.
    pub fn styled(
        surface: SurfaceHandle,
        focus: FocusCoordinator,
        tag: &str,
        style: Option<&Value>,
    ) -> Result<Rc<Self>, SurfaceError> {
        Ok(Self::from_base(ViewBase::styled(surface, tag, style)?, focus))
    }

    /// Create a control with initial data and value.
    ///
    /// A [`Seed::Source`] is bound right away, so the control starts out
    /// holding the source's current value. A [`Seed::Value`] is stored
    /// without firing `change_event`.
    pub fn seeded(
        surface: SurfaceHandle,
        focus: FocusCoordinator,
        tag: &str,
        data: Seed,
        value: Seed,
    ) -> Rc<Self> {
        let control = Self::from_base(ViewBase::new(surface, tag), focus);
        match value {
            Seed::Empty => {}
            Seed::Value(v) => *control.value.borrow_mut() = v,
            Seed::Source(source) => {
                control.set_value_source(source);
            }
        }
        match data {
            Seed::Empty => {}
            Seed::Value(d) => {
                control.base.set_data(d);
            }
            Seed::Source(source) => {
                control.set_data_source(source);
            }
        }
        control
    }

    fn from_base(base: ViewBase, focus: FocusCoordinator) -> Rc<Self> {
        let control = Rc::new_cyclic(|me| Self {
            me: Weak::clone(me),
            base,
            focus,
            enabled: Cell::new(true),
            value: RefCell::new(Value::Null),
            change_event: Channel::new("control.change"),
            select_event: Channel::new("control.select"),
            display_source: RefCell::new(None),
            value_source: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        control.set_events();
        control
    }

    fn set_events(&self) {
        let node = self.base.container();
        let surface = self.base.surface();
        let mut listeners = self.listeners.borrow_mut();

        let me = Weak::clone(&self.me);
        let token = surface.attach_listener(
            node,
            EventKind::Click,
            Rc::new(move |ev: &SurfaceEvent| {
                if let Some(c) = me.upgrade() {
                    c.select(Some(ev));
                }
            }),
        );
        listeners.push((EventKind::Click, token));

        let me = Weak::clone(&self.me);
        let token = surface.attach_listener(
            node,
            EventKind::FocusOut,
            Rc::new(move |ev: &SurfaceEvent| {
                if let Some(c) = me.upgrade() {
                    c.on_blur(ev);
                }
            }),
        );
        listeners.push((EventKind::FocusOut, token));

        let me = Weak::clone(&self.me);
        let token = surface.attach_listener(
            node,
            EventKind::FocusIn,
            Rc::new(move |ev: &SurfaceEvent| {
                if let Some(c) = me.upgrade() {
                    c.on_focus(ev);
                }
            }),
        );
        listeners.push((EventKind::FocusIn, token));
    }

    // --- Events ---

    /// Fired with the new data or value after a change.
    pub fn change_event(&self) -> &Channel<Value> {
        &self.change_event
    }

    /// Fired with the control's data when it is selected.
    pub fn select_event(&self) -> &Channel<Value> {
        &self.select_event
    }

    // --- Data and value ---

    /// Current data.
    pub fn data(&self) -> Value {
        self.base.data()
    }

    /// Store `data`, redraw, and fire `change_event` when it changed.
    pub fn set_data(&self, data: Value) -> &Self {
        if self.base.set_data(data.clone()) {
            self.change_event.fire(&data);
        }
        self
    }

    /// Current value.
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Store `value` and fire `change_event` when it changed.
    pub fn set_value(&self, value: Value) -> &Self {
        if *self.value.borrow() == value {
            return self;
        }
        *self.value.borrow_mut() = value.clone();
        self.change_event.fire(&value);
        self
    }

    // --- Bindings ---

    /// Bind the control's data to `source` in both directions.
    pub fn set_data_source(&self, source: Rc<dyn DataSource>) -> &Self {
        drop(self.display_source.borrow_mut().take());

        let me = Weak::clone(&self.me);
        let inbound = source.change_event().subscribe(move |v: &Value| {
            if let Some(c) = me.upgrade() {
                c.set_data(v.clone());
            }
        });
        self.set_data(or_null(source.get_data()));

        let target = Rc::clone(&source);
        let outbound = self
            .change_event
            .subscribe(move |v: &Value| target.set_data(v.clone()));

        *self.display_source.borrow_mut() = Some(SourceBinding {
            source,
            _inbound: inbound,
            _outbound: outbound,
        });
        self
    }

    /// Bind the control's value to `source`; selecting the control writes
    /// its data back into `source`.
    pub fn set_value_source(&self, source: Rc<dyn DataSource>) -> &Self {
        drop(self.value_source.borrow_mut().take());

        let me = Weak::clone(&self.me);
        let inbound = source.change_event().subscribe(move |v: &Value| {
            if let Some(c) = me.upgrade() {
                c.set_value(v.clone());
            }
        });
        self.set_value(or_null(source.get_data()));

        let target = Rc::clone(&source);
        let outbound = self
            .select_event
            .subscribe(move |v: &Value| target.set_data(v.clone()));

        *self.value_source.borrow_mut() = Some(SourceBinding {
            source,
            _inbound: inbound,
            _outbound: outbound,
        });
        self
    }

    /// The bound display source.
    pub fn data_source(&self) -> Option<Rc<dyn DataSource>> {
        self.display_source
            .borrow()
            .as_ref()
            .map(|b| Rc::clone(&b.source))
    }

    /// The bound value source.
    pub fn value_source(&self) -> Option<Rc<dyn DataSource>> {
        self.value_source
            .borrow()
            .as_ref()
            .map(|b| Rc::clone(&b.source))
    }

    /// Drop both bindings.
    pub fn unbind(&self) -> &Self {
        drop(self.display_source.borrow_mut().take());
        drop(self.value_source.borrow_mut().take());
        self
    }

    // --- State ---

    pub fn enable(&self) -> &Self {
        let node = self.container();
        self.base.surface().remove_class(node, DISABLED_CLASS, false);
        self.base.surface().set_editable(node, true);
        self.enabled.set(true);
        self
    }

    pub fn disable(&self) -> &Self {
        let node = self.container();
        self.base.surface().add_class(node, DISABLED_CLASS);
        self.base.surface().set_editable(node, false);
        self.enabled.set(false);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Set or clear the node's `readonly` attribute.
    pub fn set_read_only(&self, read_only: bool) -> &Self {
        let value = read_only.then_some("1");
        self.base
            .surface()
            .set_attribute(self.container(), READONLY_ATTR, value);
        self
    }

    /// Enter the focused state. Platform focus is requested unless the call
    /// is itself a reaction to a platform focus event.
    pub fn focus(&self, from_event: bool) -> &Self {
        let node = self.container();
        self.base.surface().add_class(node, FOCUS_CLASS);
        if !from_event {
            self.base.surface().request_focus(node);
        }
        self
    }

    /// Leave the focused state.
    pub fn blur(&self) -> &Self {
        self.base
            .surface()
            .remove_class(self.container(), FOCUS_CLASS, false);
        self
    }

    /// Fire `select_event` with the current data.
    pub fn select(&self, event: Option<&SurfaceEvent>) -> &Self {
        if let Some(ev) = event {
            ev.prevent_default();
        }
        self.select_event.fire(&self.data());
        self
    }

    /// The control's node.
    pub fn container(&self) -> NodeId {
        self.base.container()
    }

    /// Underlying view state.
    pub fn base(&self) -> &ViewBase {
        &self.base
    }

    // --- Platform reactions ---

    fn on_blur(&self, ev: &SurfaceEvent) {
        let node = self.container();
        let surface = self.base.surface();
        let text = surface
            .input_value(node)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| surface.content(node));
        let data = Value::String(text);
        self.base.store_data(data.clone());
        ev.prevent_default();
        self.blur();
        self.change_event.fire(&data);
    }

    fn on_focus(&self, ev: &SurfaceEvent) {
        ev.prevent_default();
        if let Some(me) = self.me.upgrade() {
            let target: Rc<dyn FocusTarget> = me;
            self.focus.set(&target);
        }
    }
}

impl Drop for Control {
    fn drop(&mut self) {
        let node = self.base.container();
        for (kind, token) in self.listeners.get_mut().drain(..) {
            self.base.surface().detach_listener(node, kind, token);
        }
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("base", &self.base)
            .field("enabled", &self.enabled.get())
            .field("value", &self.value.borrow())
            .field("data_source", &self.display_source.borrow().is_some())
            .field("value_source", &self.value_source.borrow().is_some())
            .finish()
    }
}

impl FocusTarget for Control {
    fn focus_node(&self) -> NodeId {
        self.container()
    }

    fn focus_from_event(&self) {
        Control::focus(self, true);
    }

    fn blur(&self) {
        Control::blur(self);
    }
}

impl View for Control {
    fn as_surface_node(&self) -> Option<NodeId> {
        Some(self.container())
    }

    fn title(&self) -> Option<String> {
        self.base.title()
    }
}
