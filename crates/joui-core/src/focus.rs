#![forbid(unsafe_code)]

//! Single-holder focus tracking.
//!
//! A [`FocusCoordinator`] remembers which [`FocusTarget`] currently holds
//! input focus. Handing focus to a new target blurs the previous one first.
//! The coordinator is an explicit collaborator: clone it into every control
//! that should participate in the same focus group.
//!
//! The coordinator holds targets weakly, so a dropped control never keeps
//! itself alive through focus bookkeeping.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::surface::NodeId;

/// Something that can receive and lose focus.
pub trait FocusTarget {
    /// Node that represents the target on the surface.
    fn focus_node(&self) -> NodeId;

    /// Enter the focused state in response to a platform focus event.
    fn focus_from_event(&self);

    /// Leave the focused state.
    fn blur(&self);
}

#[derive(Default)]
struct FocusState {
    holder: Option<Weak<dyn FocusTarget>>,
    node: Option<NodeId>,
}

/// Shared record of the current focus holder.
///
/// Cloning yields a handle to the same focus group.
#[derive(Clone, Default)]
pub struct FocusCoordinator {
    state: Rc<RefCell<FocusState>>,
}

impl std::fmt::Debug for FocusCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusCoordinator")
            .field("node", &self.state.borrow().node)
            .finish()
    }
}

impl FocusCoordinator {
    /// Create an empty focus group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `target` the focus holder.
    ///
    /// A previous holder on a different node is blurred first. Re-focusing
    /// the current holder only re-enters its focused state.
    pub fn set(&self, target: &Rc<dyn FocusTarget>) {
        let node = target.focus_node();
        let previous = {
            let mut state = self.state.borrow_mut();
            let prev = match state.node {
                Some(prev_node) if prev_node != node => {
                    state.holder.take().and_then(|w| w.upgrade())
                }
                _ => None,
            };
            state.holder = Some(Rc::downgrade(target));
            state.node = Some(node);
            prev
        };
        if let Some(prev) = previous {
            tracing::trace!(from = prev.focus_node().id(), to = node.id(), "focus moved");
            prev.blur();
        }
        target.focus_from_event();
    }

    /// Node of the current focus holder.
    #[must_use]
    pub fn current_node(&self) -> Option<NodeId> {
        let state = self.state.borrow();
        let alive = state
            .holder
            .as_ref()
            .is_some_and(|w| w.strong_count() > 0);
        if alive { state.node } else { None }
    }

    /// Whether `node` currently holds focus.
    #[must_use]
    pub fn is_focused(&self, node: NodeId) -> bool {
        self.current_node() == Some(node)
    }

    /// Blur and forget the current holder.
    pub fn clear(&self) {
        let previous = {
            let mut state = self.state.borrow_mut();
            state.node = None;
            state.holder.take().and_then(|w| w.upgrade())
        };
        if let Some(prev) = previous {
            prev.blur();
        }
    }
}
