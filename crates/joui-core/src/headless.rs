#![forbid(unsafe_code)]

//! In-memory surface for tests and CI.
//!
//! `HeadlessSurface` implements [`Surface`] over a plain node table and a
//! [`DeferredQueue`]. It needs no platform, renders nothing, and exposes
//! inspection helpers so widget behavior can be asserted directly.
//!
//! # Example
//!
//! ```
//! use joui_core::{HeadlessSurface, Surface};
//! use std::time::Duration;
//!
//! let surface = HeadlessSurface::new();
//! let root = surface.create_element("jostack");
//! let card = surface.create_element("jocard");
//! surface.append_child(root, card);
//! surface.add_class(card, "next");
//!
//! assert_eq!(surface.children(root), vec![card]);
//! assert!(surface.has_class(card, "next"));
//!
//! surface.schedule_deferred(Duration::from_millis(5), Box::new(|| {}));
//! assert_eq!(surface.advance(Duration::from_millis(5)), 1);
//! ```
//!
//! # Deviations from a real platform
//!
//! - `request_focus` records the focused node but does not dispatch
//!   [`EventKind::FocusIn`]; tests dispatch focus events explicitly.
//! - Operations on unknown node ids are ignored.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use ahash::AHashMap;

use crate::deferred::DeferredQueue;
use crate::style::{CLASS_NAME_KEY, ID_KEY, StyleSpec};
use crate::surface::{
    Capabilities, DeferredFn, EventKind, ListenerFn, ListenerToken, NodeId, Surface, SurfaceEvent,
    TaskId,
};

struct Listener {
    kind: EventKind,
    token: ListenerToken,
    handler: ListenerFn,
}

#[derive(Default)]
struct NodeData {
    tag: String,
    element_id: Option<String>,
    classes: Vec<String>,
    styles: Vec<(String, String)>,
    attributes: AHashMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    content: String,
    input_value: Option<String>,
    editable: bool,
    listeners: Vec<Listener>,
}

/// Result of [`HeadlessSurface::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of listeners invoked.
    pub handled: usize,
    /// Whether any listener suppressed the default behavior.
    pub default_prevented: bool,
}

/// An in-memory [`Surface`] with a virtual clock.
pub struct HeadlessSurface {
    nodes: RefCell<AHashMap<NodeId, NodeData>>,
    next_node: Cell<u64>,
    next_token: Cell<u64>,
    focused: Cell<Option<NodeId>>,
    capabilities: Cell<Capabilities>,
    queue: DeferredQueue,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("nodes", &self.nodes.borrow().len())
            .field("focused", &self.focused.get())
            .field("capabilities", &self.capabilities.get())
            .field("queue", &self.queue)
            .finish()
    }
}

impl HeadlessSurface {
    /// Create a surface without transition events (timer fallback only).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::INPUT_FOCUS)
    }

    /// Create a surface advertising the given capabilities.
    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            nodes: RefCell::new(AHashMap::new()),
            next_node: Cell::new(1),
            next_token: Cell::new(1),
            focused: Cell::new(None),
            capabilities: Cell::new(capabilities),
            queue: DeferredQueue::new(),
        }
    }

    /// Replace the advertised capabilities.
    pub fn set_capabilities(&self, capabilities: Capabilities) {
        self.capabilities.set(capabilities);
    }

    // --- Clock ---

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.queue.now()
    }

    /// Advance the clock, running due tasks. Returns the number run.
    pub fn advance(&self, by: Duration) -> usize {
        self.queue.advance(by)
    }

    /// Run all pending tasks. Returns the number run.
    pub fn run_until_idle(&self) -> usize {
        self.queue.run_until_idle()
    }

    /// Number of pending deferred tasks.
    pub fn pending_tasks(&self) -> usize {
        self.queue.pending()
    }

    // --- Events ---

    /// Deliver an event to every listener of `kind` on `node`, in attach
    /// order.
    pub fn dispatch(&self, node: NodeId, kind: EventKind) -> DispatchOutcome {
        let handlers: Vec<ListenerFn> = self.with_node(node, Vec::new(), |n| {
            n.listeners
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| ListenerFn::clone(&l.handler))
                .collect()
        });
        let event = SurfaceEvent::new(kind, node);
        for handler in &handlers {
            handler(&event);
        }
        DispatchOutcome {
            handled: handlers.len(),
            default_prevented: event.is_default_prevented(),
        }
    }

    /// Number of listeners of `kind` attached to `node`.
    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.with_node(node, 0, |n| {
            n.listeners.iter().filter(|l| l.kind == kind).count()
        })
    }

    // --- Inspection ---

    /// Number of nodes ever created.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Tag the node was created with.
    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.with_node(node, None, |n| Some(n.tag.clone()))
    }

    /// Children of `node`, in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.with_node(node, Vec::new(), |n| n.children.clone())
    }

    /// Classes of `node`, in insertion order.
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.with_node(node, Vec::new(), |n| n.classes.clone())
    }

    /// Element id set through a style property map.
    pub fn element_id(&self, node: NodeId) -> Option<String> {
        self.with_node(node, None, |n| n.element_id.clone())
    }

    /// Inline style property value.
    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, None, |n| {
            n.styles
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Attribute value.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, None, |n| n.attributes.get(name).cloned())
    }

    /// Whether the node is editable.
    pub fn is_editable(&self, node: NodeId) -> bool {
        self.with_node(node, false, |n| n.editable)
    }

    /// Node that last received `request_focus`.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    /// Simulate user input on a form element.
    pub fn set_input_value(&self, node: NodeId, value: Option<&str>) {
        self.with_node_mut(node, |n| n.input_value = value.map(str::to_owned));
    }

    fn with_node<R>(&self, node: NodeId, default: R, f: impl FnOnce(&NodeData) -> R) -> R {
        match self.nodes.borrow().get(&node) {
            Some(n) => f(n),
            None => default,
        }
    }

    fn with_node_mut(&self, node: NodeId, f: impl FnOnce(&mut NodeData)) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            f(n);
        }
    }

    fn next_token(&self) -> ListenerToken {
        let raw = self.next_token.get();
        self.next_token.set(raw + 1);
        ListenerToken::from_raw(raw)
    }
}

impl Surface for HeadlessSurface {
    fn create_element(&self, tag: &str) -> NodeId {
        let raw = self.next_node.get();
        self.next_node.set(raw + 1);
        let id = NodeId::from_raw(raw);
        self.nodes.borrow_mut().insert(
            id,
            NodeData {
                tag: tag.to_owned(),
                ..NodeData::default()
            },
        );
        id
    }

    fn set_style(&self, node: NodeId, style: &StyleSpec) {
        self.with_node_mut(node, |n| match style {
            StyleSpec::ClassName(class) => {
                n.classes = class.split_whitespace().map(str::to_owned).collect();
            }
            StyleSpec::Properties(props) => {
                for prop in props {
                    match prop.name.as_str() {
                        ID_KEY => n.element_id = Some(prop.value.clone()),
                        CLASS_NAME_KEY => {
                            n.classes = prop.value.split_whitespace().map(str::to_owned).collect();
                        }
                        name => match n.styles.iter_mut().find(|(k, _)| k == name) {
                            Some(entry) => entry.1 = prop.value.clone(),
                            None => n.styles.push((name.to_owned(), prop.value.clone())),
                        },
                    }
                }
            }
        });
    }

    fn add_class(&self, node: NodeId, name: &str) {
        self.with_node_mut(node, |n| {
            if !n.classes.iter().any(|c| c == name) {
                n.classes.push(name.to_owned());
            }
        });
    }

    fn remove_class(&self, node: NodeId, name: &str, toggle_if_absent: bool) {
        self.with_node_mut(node, |n| {
            if let Some(pos) = n.classes.iter().position(|c| c == name) {
                n.classes.remove(pos);
            } else if toggle_if_absent {
                n.classes.push(name.to_owned());
            }
        });
    }

    fn has_class(&self, node: NodeId, name: &str) -> bool {
        self.with_node(node, false, |n| n.classes.iter().any(|c| c == name))
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(&parent) {
            return;
        }
        let old_parent = match nodes.get_mut(&child) {
            Some(c) => c.parent.replace(parent),
            None => return,
        };
        if let Some(p) = old_parent.and_then(|old| nodes.get_mut(&old)) {
            p.children.retain(|c| *c != child);
        }
        if let Some(p) = nodes.get_mut(&parent) {
            p.children.push(child);
        }
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(&child) {
            Some(c) if c.parent == Some(parent) => c.parent = None,
            _ => return false,
        }
        if let Some(p) = nodes.get_mut(&parent) {
            p.children.retain(|c| *c != child);
        }
        true
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.with_node(node, None, |n| n.parent)
    }

    fn attach_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        handler: ListenerFn,
    ) -> ListenerToken {
        let token = self.next_token();
        self.with_node_mut(node, |n| {
            n.listeners.push(Listener {
                kind,
                token,
                handler,
            });
        });
        token
    }

    fn detach_listener(&self, node: NodeId, kind: EventKind, token: ListenerToken) -> bool {
        let mut removed = false;
        self.with_node_mut(node, |n| {
            let before = n.listeners.len();
            n.listeners
                .retain(|l| !(l.kind == kind && l.token == token));
            removed = n.listeners.len() != before;
        });
        removed
    }

    fn schedule_deferred(&self, delay: Duration, task: DeferredFn) -> TaskId {
        self.queue.schedule(delay, task)
    }

    fn cancel_deferred(&self, task: TaskId) -> bool {
        self.queue.cancel(task)
    }

    fn set_editable(&self, node: NodeId, editable: bool) {
        self.with_node_mut(node, |n| n.editable = editable);
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: Option<&str>) {
        self.with_node_mut(node, |n| match value {
            Some(v) => {
                n.attributes.insert(name.to_owned(), v.to_owned());
            }
            None => {
                n.attributes.remove(name);
            }
        });
    }

    fn request_focus(&self, node: NodeId) {
        if self.capabilities.get().contains(Capabilities::INPUT_FOCUS) {
            self.focused.set(Some(node));
        }
    }

    fn input_value(&self, node: NodeId) -> Option<String> {
        self.with_node(node, None, |n| n.input_value.clone())
    }

    fn content(&self, node: NodeId) -> String {
        self.with_node(node, String::new(), |n| n.content.clone())
    }

    fn set_content(&self, node: NodeId, content: &str) {
        self.with_node_mut(node, |n| content.clone_into(&mut n.content));
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.get()
    }
}
