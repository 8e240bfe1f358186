#![forbid(unsafe_code)]

//! Test harness for joui widgets.
//!
//! Provides a [`Fixture`] bundling a [`HeadlessSurface`] with a
//! [`FocusCoordinator`], a [`TrackedView`] that counts lifecycle hooks, and
//! an [`EventLog`] that records channel traffic by label.
//!
//! # Example
//!
//! ```
//! use joui_harness::{EventLog, Fixture};
//!
//! let fx = Fixture::new();
//! let mut stack = fx.stack();
//! let log = EventLog::for_stack(&stack);
//!
//! stack.push(fx.card("inbox"));
//! fx.settle();
//! assert_eq!(log.entries(), vec!["push"]);
//! assert_eq!(fx.mounted(&stack).len(), 1);
//! ```
//!
//! Set `JOUI_LOG=trace` and call [`init_tracing`] to see navigation and
//! transition events while a test runs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use joui_core::{Capabilities, FocusCoordinator, HeadlessSurface, NodeId, SurfaceHandle};
use joui_runtime::{Channel, Subscription};
use joui_widgets::{Control, Stack, StackConfig, View, ViewBase};
use tracing_subscriber::EnvFilter;

/// Environment variable read by [`init_tracing`].
pub const LOG_ENV: &str = "JOUI_LOG";

/// Install a test-friendly fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A headless surface plus a focus group.
pub struct Fixture {
    pub surface: Rc<HeadlessSurface>,
    pub focus: FocusCoordinator,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Surface without transition-end events.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::INPUT_FOCUS)
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            surface: Rc::new(HeadlessSurface::with_capabilities(capabilities)),
            focus: FocusCoordinator::new(),
        }
    }

    /// Surface handle for widget constructors.
    pub fn handle(&self) -> SurfaceHandle {
        self.surface.clone()
    }

    pub fn stack(&self) -> Stack {
        Stack::new(self.handle())
    }

    pub fn stack_with(&self, config: StackConfig) -> Stack {
        Stack::with_config(self.handle(), config)
    }

    pub fn control(&self) -> Rc<Control> {
        Control::new(self.handle(), self.focus.clone())
    }

    /// A control backed by an `input` element.
    pub fn input(&self) -> Rc<Control> {
        Control::with_tag(self.handle(), self.focus.clone(), "input")
    }

    /// A titled card view.
    pub fn card(&self, title: &str) -> Rc<dyn View> {
        self.tracked(title)
    }

    /// A titled view that counts its lifecycle hooks.
    pub fn tracked(&self, title: &str) -> Rc<TrackedView> {
        Rc::new(TrackedView::new(self.handle(), title))
    }

    /// Run every pending deferred task.
    pub fn settle(&self) -> usize {
        let ran = self.surface.run_until_idle();
        tracing::debug!(ran, nodes = self.surface.node_count(), "fixture settled");
        ran
    }

    pub fn advance_ms(&self, ms: u64) -> usize {
        let ran = self.surface.advance(Duration::from_millis(ms));
        tracing::debug!(ms, ran, pending = self.surface.pending_tasks(), "fixture advanced");
        ran
    }

    /// Nodes currently attached to the stack's container.
    pub fn mounted(&self, stack: &Stack) -> Vec<NodeId> {
        stack
            .container()
            .map(|c| self.surface.children(c))
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// TrackedView
// ---------------------------------------------------------------------------

/// A card view that counts `activate`/`deactivate` calls.
pub struct TrackedView {
    base: ViewBase,
    activations: Cell<u32>,
    deactivations: Cell<u32>,
}

impl TrackedView {
    pub fn new(surface: SurfaceHandle, title: &str) -> Self {
        let base = ViewBase::new(surface, "jocard");
        base.set_title(Some(title.to_owned()));
        Self {
            base,
            activations: Cell::new(0),
            deactivations: Cell::new(0),
        }
    }

    pub fn node(&self) -> NodeId {
        self.base.container()
    }

    pub fn activations(&self) -> u32 {
        self.activations.get()
    }

    pub fn deactivations(&self) -> u32 {
        self.deactivations.get()
    }
}

impl View for TrackedView {
    fn as_surface_node(&self) -> Option<NodeId> {
        Some(self.base.container())
    }

    fn activate(&self) {
        self.activations.set(self.activations.get() + 1);
    }

    fn deactivate(&self) {
        self.deactivations.set(self.deactivations.get() + 1);
    }

    fn title(&self) -> Option<String> {
        self.base.title()
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Records labelled channel notifications in arrival order.
#[derive(Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<String>>>,
    subscriptions: Vec<Subscription>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every stack event as `push`, `pop`, `home`, `show` or `hide`.
    pub fn for_stack(stack: &Stack) -> Self {
        let mut log = Self::new();
        log.record(stack.push_event(), "push");
        log.record(stack.pop_event(), "pop");
        log.record(stack.home_event(), "home");
        log.record(stack.show_event(), "show");
        log.record(stack.hide_event(), "hide");
        log
    }

    /// Append `label` each time `channel` fires.
    pub fn record<T: 'static>(&mut self, channel: &Channel<T>, label: &str) -> &mut Self {
        let entries = Rc::clone(&self.entries);
        let label = label.to_owned();
        self.subscriptions
            .push(channel.subscribe(move |_| entries.borrow_mut().push(label.clone())));
        self
    }

    /// Append `label: <payload>` each time `channel` fires.
    pub fn record_values(
        &mut self,
        channel: &Channel<serde_json::Value>,
        label: &str,
    ) -> &mut Self {
        let entries = Rc::clone(&self.entries);
        let label = label.to_owned();
        self.subscriptions.push(channel.subscribe(move |v| {
            entries.borrow_mut().push(format!("{label}: {v}"));
        }));
        self
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Drain the recorded entries.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}
