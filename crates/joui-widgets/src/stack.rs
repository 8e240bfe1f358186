#![forbid(unsafe_code)]

//! Navigation stack with animated swaps.
//!
//! A [`Stack`] keeps an ordered history of [`View`]s and shows exactly one of
//! them, the entry at `index`. Navigation (`push`, `pop`, `home`, `forward`,
//! `back`) changes `index` and redraws; redrawing attaches the new view's
//! node to the stack container and runs a two-phase transition that later
//! detaches the previous node.
//!
//! # Invariants
//!
//! - `index < len()` whenever the stack is non-empty.
//! - After `push` or `pop`, `index == len() - 1`.
//! - While locked, `pop()` never removes the last remaining view.
//! - Pushing the view already on top is a no-op.
//! - Once every pending transition has resolved, the container holds exactly
//!   the current view's node.
//!
//! # Transition protocol
//!
//! | Step | When | Effect |
//! |------|------|--------|
//! | attach | `draw()` | entry class on new node, node appended to container |
//! | animate | `animate_delay` later | listen for transition end (if supported), arm fallback timer, strip entry class, add exit class to old node |
//! | cleanup | first of transition end / fallback | detach old node if still a child and not current again, strip classes, detach listener, cancel timer |
//!
//! Cleanup runs at most once per transition. A newer `draw()` does not cancel
//! older transitions; their cleanups are guarded and idempotent.
//!
//! # Failure Modes
//!
//! - `pop()` on an empty or locked stack returns `None` and fires nothing.
//! - A view without a surface node aborts `draw()` and leaves the previous
//!   node in place.
//! - Popping the last view of an unlocked stack draws nothing, so the
//!   popped view's node stays mounted until the next push replaces it.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use joui_core::{
    Capabilities, EventKind, ListenerToken, NodeId, Surface, SurfaceError, SurfaceEvent,
    SurfaceHandle, TaskId, create_styled,
};
use joui_runtime::Channel;
use serde_json::Value;

use crate::config::StackConfig;
use crate::view::{View, same_view};

/// Default element tag for the stack container.
pub const STACK_TAG: &str = "jostack";

/// Maps a view's node to the node that receives transition classes.
pub type StyleContainerFn = Box<dyn Fn(&dyn Surface, NodeId) -> Option<NodeId>>;

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

struct Transition {
    surface: Weak<dyn Surface>,
    container: NodeId,
    /// Node to detach, `None` when the swap re-shows the same node.
    old_node: Option<NodeId>,
    old_styled: Option<NodeId>,
    new_styled: NodeId,
    old_class: Option<String>,
    new_class: Option<String>,
    strip: [String; 2],
    /// Node currently shown by the owning stack.
    live: Rc<Cell<Option<NodeId>>>,
    fallback_delay: std::time::Duration,
    resolved: Cell<bool>,
    listener: Cell<Option<ListenerToken>>,
    fallback: Cell<Option<TaskId>>,
}

impl Transition {
    fn old_is_live(&self) -> bool {
        self.old_node.is_some() && self.old_node == self.live.get()
    }

    fn animate(this: &Rc<Self>) {
        let Some(surface) = this.surface.upgrade() else {
            return;
        };
        if this.resolved.get() {
            return;
        }

        if surface
            .capabilities()
            .contains(Capabilities::TRANSITION_EVENTS)
        {
            let t = Rc::clone(this);
            let token = surface.attach_listener(
                this.new_styled,
                EventKind::TransitionEnd,
                Rc::new(move |_: &SurfaceEvent| Transition::resolve(&t, "transition-end")),
            );
            this.listener.set(Some(token));
        }
        let t = Rc::clone(this);
        let task = surface.schedule_deferred(
            this.fallback_delay,
            Box::new(move || Transition::resolve(&t, "fallback")),
        );
        this.fallback.set(Some(task));

        if let Some(class) = &this.new_class {
            surface.remove_class(this.new_styled, class, false);
        }
        if let (Some(class), Some(old)) = (&this.old_class, this.old_styled) {
            if !this.old_is_live() {
                surface.add_class(old, class);
            }
        }
    }

    fn resolve(this: &Rc<Self>, trigger: &'static str) {
        if this.resolved.replace(true) {
            return;
        }
        let Some(surface) = this.surface.upgrade() else {
            return;
        };

        if !this.old_is_live() {
            if let Some(old) = this.old_node {
                surface.remove_child(this.container, old);
            }
            if let Some(old) = this.old_styled {
                for class in &this.strip {
                    surface.remove_class(old, class, false);
                }
            }
        }
        for class in &this.strip {
            surface.remove_class(this.new_styled, class, false);
        }
        if let Some(token) = this.listener.take() {
            surface.detach_listener(this.new_styled, EventKind::TransitionEnd, token);
        }
        if let Some(task) = this.fallback.take() {
            surface.cancel_deferred(task);
        }
        tracing::trace!(
            trigger,
            new = this.new_styled.id(),
            old = this.old_node.map(NodeId::id),
            "stack transition resolved"
        );
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// An ordered navigation history of views.
pub struct Stack {
    surface: SurfaceHandle,
    config: StackConfig,
    tag: String,
    container: Cell<Option<NodeId>>,
    data: Vec<Rc<dyn View>>,
    index: usize,
    last_index: usize,
    last_node: Option<NodeId>,
    last_styled: Option<NodeId>,
    live: Rc<Cell<Option<NodeId>>>,
    locked: usize,
    visible: bool,
    style_container: Option<StyleContainerFn>,
    transition: Option<Rc<Transition>>,
    push_event: Channel<Rc<dyn View>>,
    pop_event: Channel<()>,
    home_event: Channel<()>,
    show_event: Channel<()>,
    hide_event: Channel<()>,
}

impl Stack {
    /// Empty stack with the default configuration.
    pub fn new(surface: SurfaceHandle) -> Self {
        Self::with_config(surface, StackConfig::default())
    }

    /// Empty stack.
    pub fn with_config(surface: SurfaceHandle, config: StackConfig) -> Self {
        let locked = usize::from(config.locked);
        Self {
            surface,
            config,
            tag: STACK_TAG.to_owned(),
            container: Cell::new(None),
            data: Vec::new(),
            index: 0,
            last_index: 0,
            last_node: None,
            last_styled: None,
            live: Rc::new(Cell::new(None)),
            locked,
            visible: false,
            style_container: None,
            transition: None,
            push_event: Channel::new("stack.push"),
            pop_event: Channel::new("stack.pop"),
            home_event: Channel::new("stack.home"),
            show_event: Channel::new("stack.show"),
            hide_event: Channel::new("stack.hide"),
        }
    }

    /// Stack seeded with a root view. Only the first of `views` is kept.
    pub fn with_views(
        surface: SurfaceHandle,
        config: StackConfig,
        views: impl IntoIterator<Item = Rc<dyn View>>,
    ) -> Self {
        let mut stack = Self::with_config(surface, config);
        stack.data.extend(views.into_iter().take(1));
        stack
    }

    /// Stack whose container is created now and styled.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] for an unrecognized style shape.
    pub fn styled(
        surface: SurfaceHandle,
        config: StackConfig,
        style: Option<&Value>,
    ) -> Result<Self, SurfaceError> {
        let mut stack = Self::with_config(surface, config);
        let node = create_styled(stack.surface.as_ref(), &stack.tag, style)?;
        stack.container.set(Some(node));
        Ok(stack)
    }

    /// Replace the style-container resolver. The default styles the view's
    /// node itself; returning `None` aborts the draw.
    pub fn set_style_container(
        &mut self,
        resolver: impl Fn(&dyn Surface, NodeId) -> Option<NodeId> + 'static,
    ) {
        self.style_container = Some(Box::new(resolver));
    }

    // --- Events ---

    /// Fired with the pushed view.
    pub fn push_event(&self) -> &Channel<Rc<dyn View>> {
        &self.push_event
    }

    pub fn pop_event(&self) -> &Channel<()> {
        &self.pop_event
    }

    pub fn home_event(&self) -> &Channel<()> {
        &self.home_event
    }

    pub fn show_event(&self) -> &Channel<()> {
        &self.show_event
    }

    pub fn hide_event(&self) -> &Channel<()> {
        &self.hide_event
    }

    // --- Accessors ---

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of the active view.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Most recently pushed view.
    pub fn top(&self) -> Option<Rc<dyn View>> {
        self.data.last().cloned()
    }

    /// Active view.
    pub fn current(&self) -> Option<Rc<dyn View>> {
        self.data.get(self.index).cloned()
    }

    /// All views, bottom first.
    pub fn views(&self) -> &[Rc<dyn View>] {
        &self.data
    }

    /// Title of the active view.
    pub fn title(&self) -> Option<String> {
        self.data.get(self.index).and_then(|v| v.title())
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked == 1
    }

    /// Keep (or stop keeping) the bottom view on `pop()`.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = usize::from(locked);
    }

    /// The container node, if created yet.
    pub fn container(&self) -> Option<NodeId> {
        self.container.get()
    }

    /// Whether the most recent transition has not cleaned up yet.
    pub fn transition_pending(&self) -> bool {
        self.transition
            .as_ref()
            .is_some_and(|t| !t.resolved.get())
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    // --- Navigation ---

    /// Push `view` and show it. Pushing the current top again does nothing.
    pub fn push(&mut self, view: Rc<dyn View>) {
        if let Some(top) = self.data.last() {
            if same_view(top, &view) {
                tracing::trace!(len = self.data.len(), "stack push ignored: already on top");
                return;
            }
        }
        self.data.push(Rc::clone(&view));
        self.index = self.data.len() - 1;
        tracing::debug!(index = self.index, len = self.data.len(), "stack push");
        self.draw();
        self.push_event.fire(&view);
    }

    /// Remove the top view and show the one below it.
    ///
    /// Returns the removed view, or `None` when the stack is empty or only
    /// the locked bottom view remains.
    pub fn pop(&mut self) -> Option<Rc<dyn View>> {
        if self.data.len() <= self.locked {
            tracing::trace!(len = self.data.len(), locked = self.locked, "stack pop refused");
            return None;
        }
        let popped = self.data.pop()?;
        self.index = self.data.len().saturating_sub(1);
        tracing::debug!(index = self.index, len = self.data.len(), "stack pop");

        self.draw();
        popped.deactivate();

        if self.data.is_empty() {
            self.hide();
        }
        if !self.data.is_empty() || self.config.pop_event_on_empty {
            self.pop_event.fire(&());
        }
        Some(popped)
    }

    /// Collapse to the bottom view.
    pub fn home(&mut self) {
        if self.data.len() <= 1 {
            return;
        }
        if same_view(&self.data[0], &self.data[self.index]) {
            return;
        }
        self.data.truncate(1);
        self.last_index = 1;
        self.index = 0;
        tracing::debug!("stack home");
        self.draw();

        self.pop_event.fire(&());
        self.home_event.fire(&());
    }

    /// Move toward the top without removing anything. Returns whether the
    /// index moved.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.data.len() {
            return false;
        }
        self.index += 1;
        self.draw();
        true
    }

    /// Move toward the bottom without removing anything. Returns whether the
    /// index moved.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.draw();
        true
    }

    // --- Visibility ---

    /// Make the stack visible; `show_event` fires after the show delay.
    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        let container = self.ensure_container();
        self.surface.add_class(container, &self.config.classes.show);

        let event = self.show_event.clone();
        self.surface.schedule_deferred(
            self.config.show_delay_duration(),
            Box::new(move || event.fire(&())),
        );
    }

    /// Hide the stack; `hide_event` fires after the show delay.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        let container = self.ensure_container();
        self.surface
            .remove_class(container, &self.config.classes.show, false);

        let event = self.hide_event.clone();
        self.surface.schedule_deferred(
            self.config.show_delay_duration(),
            Box::new(move || event.fire(&())),
        );
    }

    /// `home()`, then become visible with `show_event` fired immediately.
    pub fn show_home(&mut self) {
        self.home();
        if !self.visible {
            self.visible = true;
            let container = self.ensure_container();
            self.surface.add_class(container, &self.config.classes.show);
            self.show_event.fire(&());
        }
    }

    // --- Drawing ---

    fn ensure_container(&self) -> NodeId {
        match self.container.get() {
            Some(node) => node,
            None => {
                let node = self.surface.create_element(&self.tag);
                self.container.set(Some(node));
                node
            }
        }
    }

    fn resolve_style_container(&self, node: NodeId) -> Option<NodeId> {
        match &self.style_container {
            Some(resolver) => resolver(self.surface.as_ref(), node),
            None => Some(node),
        }
    }

    /// Show the view at `index`.
    pub fn draw(&mut self) {
        let container = self.ensure_container();
        let Some(view) = self.data.get(self.index).cloned() else {
            return;
        };
        let Some(new_node) = view.as_surface_node() else {
            tracing::trace!(index = self.index, "stack draw skipped: view has no node");
            return;
        };
        let Some(new_styled) = self.resolve_style_container(new_node) else {
            tracing::trace!(index = self.index, "stack draw skipped: no style container");
            return;
        };

        let classes = &self.config.classes;
        let (old_class, new_class) = match self.index.cmp(&self.last_index) {
            Ordering::Greater => (Some(classes.prev.clone()), Some(classes.next.clone())),
            Ordering::Less => (Some(classes.next.clone()), Some(classes.prev.clone())),
            Ordering::Equal => (None, None),
        };

        if let Some(class) = &new_class {
            self.surface.add_class(new_styled, class);
        }
        self.surface.append_child(container, new_node);

        let same_node = self.last_node == Some(new_node);
        let transition = Rc::new(Transition {
            surface: Rc::downgrade(&self.surface),
            container,
            old_node: if same_node { None } else { self.last_node },
            old_styled: if same_node { None } else { self.last_styled },
            new_styled,
            old_class,
            new_class,
            strip: [classes.next.clone(), classes.prev.clone()],
            live: Rc::clone(&self.live),
            fallback_delay: self.config.transition_fallback_duration(),
            resolved: Cell::new(false),
            listener: Cell::new(None),
            fallback: Cell::new(None),
        });
        let t = Rc::clone(&transition);
        self.surface.schedule_deferred(
            self.config.animate_delay_duration(),
            Box::new(move || Transition::animate(&t)),
        );
        self.transition = Some(transition);

        view.activate();

        self.last_index = self.index;
        self.last_node = Some(new_node);
        self.last_styled = Some(new_styled);
        self.live.set(Some(new_node));
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("len", &self.data.len())
            .field("index", &self.index)
            .field("last_index", &self.last_index)
            .field("last_node", &self.last_node)
            .field("locked", &self.locked)
            .field("visible", &self.visible)
            .field("container", &self.container.get())
            .finish()
    }
}

/// A stack is itself a view: its container is the node, and its title is
/// the active view's title. Nesting lets one stack navigate another.
impl View for Stack {
    fn as_surface_node(&self) -> Option<NodeId> {
        Some(self.ensure_container())
    }

    fn title(&self) -> Option<String> {
        Stack::title(self)
    }
}

/// Shared, still navigable form of a nested stack.
impl View for RefCell<Stack> {
    fn as_surface_node(&self) -> Option<NodeId> {
        self.try_borrow().ok().and_then(|stack| stack.as_surface_node())
    }

    fn title(&self) -> Option<String> {
        self.try_borrow().ok().and_then(|stack| stack.title())
    }
}
