#![forbid(unsafe_code)]

//! The platform view surface.
//!
//! Widgets never touch a rendering backend directly. Everything they need
//! (element creation, class-list edits, tree mutation, listeners, deferred
//! callbacks) goes through the [`Surface`] trait, which a backend implements
//! once. [`HeadlessSurface`](crate::HeadlessSurface) is the in-memory
//! implementation used by tests.
//!
//! # Invariants
//!
//! 1. All methods take `&self`; implementations use interior mutability and
//!    must not hold an internal borrow while invoking a listener or a
//!    deferred task, so callbacks may call back into the surface.
//! 2. `remove_child` only detaches `child` when it is currently a child of
//!    `parent`; otherwise it returns `false` and changes nothing.
//! 3. A [`ListenerToken`] detaches at most once; detaching an unknown token
//!    is a no-op.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown node | Node id never created | Mutations ignored, queries return defaults |
//! | Stale token | Listener already detached | `detach_listener` returns `false` |
//! | Stale task | Task already ran or was cancelled | `cancel_deferred` returns `false` |

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use bitflags::bitflags;

use crate::error::SurfaceError;
use crate::style::StyleSpec;

/// Opaque handle to a renderable platform element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a backend-assigned raw id.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Handle returned by [`Surface::attach_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

impl ListenerToken {
    /// Wrap a backend-assigned raw token.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw token value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Handle returned by [`Surface::schedule_deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Wrap a backend-assigned raw task id.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw task id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Platform input and animation events a widget can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer click or tap.
    Click,
    /// The node gained input focus.
    FocusIn,
    /// The node lost input focus.
    FocusOut,
    /// A CSS-style transition on the node finished.
    TransitionEnd,
}

impl EventKind {
    /// Platform event name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::FocusIn => "focus",
            Self::FocusOut => "blur",
            Self::TransitionEnd => "transitionend",
        }
    }
}

/// An event delivered to listeners.
///
/// Listeners may suppress the platform's default reaction with
/// [`prevent_default`](Self::prevent_default).
#[derive(Debug)]
pub struct SurfaceEvent {
    kind: EventKind,
    target: NodeId,
    default_prevented: Cell<bool>,
}

impl SurfaceEvent {
    /// Create an event targeting `target`.
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            default_prevented: Cell::new(false),
        }
    }

    /// Event kind.
    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Node the event was dispatched to.
    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Suppress the platform's default behavior for this event.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether a listener suppressed the default behavior.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Listener callback stored by the surface.
pub type ListenerFn = Rc<dyn Fn(&SurfaceEvent)>;

/// One-shot callback run by the deferred queue.
pub type DeferredFn = Box<dyn FnOnce()>;

/// Shared handle to a surface.
pub type SurfaceHandle = Rc<dyn Surface>;

bitflags! {
    /// Optional platform features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Capabilities: u8 {
        /// The platform fires [`EventKind::TransitionEnd`].
        const TRANSITION_EVENTS = 1 << 0;
        /// `request_focus` moves platform input focus.
        const INPUT_FOCUS = 1 << 1;
    }
}

/// A platform element tree plus a deferred-callback loop.
pub trait Surface {
    /// Create a detached element with the given tag.
    fn create_element(&self, tag: &str) -> NodeId;

    /// Apply a style specification.
    fn set_style(&self, node: NodeId, style: &StyleSpec);

    /// Add a class unless already present.
    fn add_class(&self, node: NodeId, name: &str);

    /// Remove a class. When absent and `toggle_if_absent` is set, add it.
    fn remove_class(&self, node: NodeId, name: &str, toggle_if_absent: bool);

    /// Add the class when absent, remove it when present.
    fn toggle_class(&self, node: NodeId, name: &str) {
        self.remove_class(node, name, true);
    }

    /// Whether the node currently carries the class.
    fn has_class(&self, node: NodeId, name: &str) -> bool;

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Detach `child` from `parent`. Returns `false` (and does nothing) when
    /// `child` is not currently a child of `parent`.
    fn remove_child(&self, parent: NodeId, child: NodeId) -> bool;

    /// Current parent of `node`.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is currently a direct child of `parent`.
    fn is_child_of(&self, node: NodeId, parent: NodeId) -> bool {
        self.parent_of(node) == Some(parent)
    }

    /// Register a listener.
    fn attach_listener(&self, node: NodeId, kind: EventKind, handler: ListenerFn)
    -> ListenerToken;

    /// Remove a listener. Returns `false` if the token was not attached.
    fn detach_listener(&self, node: NodeId, kind: EventKind, token: ListenerToken) -> bool;

    /// Run `task` on the event loop after `delay`.
    fn schedule_deferred(&self, delay: Duration, task: DeferredFn) -> TaskId;

    /// Cancel a pending task. Returns `false` if it already ran or was
    /// cancelled.
    fn cancel_deferred(&self, task: TaskId) -> bool;

    /// Set whether the node's content is user-editable.
    fn set_editable(&self, node: NodeId, editable: bool);

    /// Set (`Some`) or remove (`None`) a node attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: Option<&str>);

    /// Move platform input focus to the node.
    fn request_focus(&self, node: NodeId);

    /// Value of the node's input-value property, for form elements.
    fn input_value(&self, node: NodeId) -> Option<String>;

    /// Rendered text content.
    fn content(&self, node: NodeId) -> String;

    /// Replace the rendered text content.
    fn set_content(&self, node: NodeId, content: &str);

    /// Optional features this platform supports.
    fn capabilities(&self) -> Capabilities;
}

/// Create an element and apply a loosely-typed style to it.
///
/// # Errors
///
/// Propagates [`StyleSpec::from_json`] errors; no element is created in that
/// case.
pub fn create_styled(
    surface: &dyn Surface,
    tag: &str,
    style: Option<&serde_json::Value>,
) -> Result<NodeId, SurfaceError> {
    let spec = style.map(StyleSpec::from_json).transpose()?;
    let node = surface.create_element(tag);
    if let Some(spec) = spec {
        surface.set_style(node, &spec);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_prevent_default() {
        let ev = SurfaceEvent::new(EventKind::Click, NodeId::from_raw(7));
        assert!(!ev.is_default_prevented());
        ev.prevent_default();
        assert!(ev.is_default_prevented());
        assert_eq!(ev.target().id(), 7);
    }

    #[test]
    fn event_names() {
        assert_eq!(EventKind::FocusOut.name(), "blur");
        assert_eq!(EventKind::TransitionEnd.name(), "transitionend");
    }

    #[test]
    fn capabilities_combine() {
        let caps = Capabilities::TRANSITION_EVENTS | Capabilities::INPUT_FOCUS;
        assert!(caps.contains(Capabilities::TRANSITION_EVENTS));
        assert!(!Capabilities::empty().contains(Capabilities::INPUT_FOCUS));
    }
}
