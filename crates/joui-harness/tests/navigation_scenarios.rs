#![forbid(unsafe_code)]

//! Integration tests: stack navigation, visibility and transitions driven
//! through the headless surface.

use std::cell::RefCell;
use std::rc::Rc;

use joui_core::{Capabilities, EventKind, Surface};
use joui_harness::{EventLog, Fixture, init_tracing};
use joui_widgets::{StackConfig, TransitionClasses, View, same_view};
use proptest::prelude::*;

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn push_push_pop_from_empty() {
    init_tracing();
    init_tracing();
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let log = EventLog::for_stack(&stack);
    let a = fx.tracked("A");
    let b = fx.tracked("B");

    stack.push(a.clone());
    assert_eq!((stack.len(), stack.index()), (1, 0));
    stack.push(b.clone());
    assert_eq!((stack.len(), stack.index()), (2, 1));

    stack.pop();
    assert_eq!((stack.len(), stack.index()), (1, 0));
    assert_eq!(b.deactivations(), 1);
    assert_eq!(a.deactivations(), 0);
    assert_eq!(log.entries(), vec!["push", "push", "pop"]);

    fx.settle();
    assert_eq!(fx.mounted(&stack), vec![a.node()]);
}

#[test]
fn locked_root_survives_pop() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    assert!(stack.is_locked(), "stacks keep their root by default");
    stack.push(fx.card("A"));
    let log = EventLog::for_stack(&stack);

    assert!(stack.pop().is_none());
    assert_eq!(stack.len(), 1);
    assert!(log.entries().is_empty());
}

#[test]
fn home_from_deep_history() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let root = fx.tracked("root");
    stack.push(root.clone());
    for name in ["one", "two", "three"] {
        stack.push(fx.card(name));
    }
    fx.settle();
    let log = EventLog::for_stack(&stack);

    stack.home();
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.title().as_deref(), Some("root"));
    assert_eq!(log.entries(), vec!["pop", "home"]);

    fx.settle();
    assert_eq!(fx.mounted(&stack), vec![root.node()]);
}

#[test]
fn back_and_forward_walk_history_without_events() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    stack.push(fx.card("A"));
    stack.push(fx.card("B"));
    stack.push(fx.card("C"));
    let log = EventLog::for_stack(&stack);

    assert!(stack.back());
    assert!(stack.back());
    assert!(!stack.back());
    assert_eq!(stack.title().as_deref(), Some("A"));
    assert!(stack.forward());
    assert_eq!(stack.title().as_deref(), Some("B"));
    assert_eq!(stack.len(), 3);
    assert!(log.entries().is_empty());

    fx.settle();
    let current = stack.current().unwrap().as_surface_node().unwrap();
    assert_eq!(fx.mounted(&stack), vec![current]);
}

#[test]
fn duplicate_push_is_ignored() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let a = fx.card("A");
    stack.push(Rc::clone(&a));
    let log = EventLog::for_stack(&stack);
    stack.push(Rc::clone(&a));
    assert_eq!(stack.len(), 1);
    assert!(log.entries().is_empty());
    assert!(same_view(&stack.top().unwrap(), &a));
}

#[test]
fn emptying_pop_event_follows_config() {
    for (fire_on_empty, expected) in [(false, vec!["hide"]), (true, vec!["pop", "hide"])] {
        let fx = Fixture::new();
        let mut stack = fx.stack_with(
            StackConfig::default()
                .locked(false)
                .pop_event_on_empty(fire_on_empty),
        );
        stack.push(fx.card("only"));
        stack.show();
        fx.settle();
        let log = EventLog::for_stack(&stack);

        stack.pop();
        fx.settle();
        assert!(stack.is_empty());
        assert_eq!(log.entries(), expected);
    }
}

#[test]
fn nested_stack_navigates_inside_outer() {
    let fx = Fixture::new();
    let mut outer = fx.stack();
    let inbox = fx.tracked("Inbox");
    outer.push(inbox.clone());

    let settings = Rc::new(RefCell::new(fx.stack()));
    let general = fx.tracked("General");
    let privacy = fx.tracked("Privacy");
    settings.borrow_mut().push(general.clone());
    outer.push(settings.clone());
    fx.settle();

    let inner_node = settings.borrow().container().unwrap();
    assert_eq!(fx.mounted(&outer), vec![inner_node]);
    assert_eq!(outer.title().as_deref(), Some("General"));

    settings.borrow_mut().push(privacy.clone());
    fx.settle();
    assert_eq!(fx.mounted(&settings.borrow()), vec![privacy.node()]);
    assert_eq!(outer.title().as_deref(), Some("Privacy"));

    outer.pop();
    fx.settle();
    assert_eq!(fx.mounted(&outer), vec![inbox.node()]);
    assert_eq!(fx.surface.parent_of(inner_node), None);
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn show_hide_events_are_deferred_and_ordered() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let log = EventLog::for_stack(&stack);

    stack.show();
    stack.hide();
    fx.advance_ms(250);
    assert!(log.entries().is_empty());
    fx.advance_ms(250);
    assert_eq!(log.entries(), vec!["show", "hide"]);
}

#[test]
fn show_home_is_immediate() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let log = EventLog::for_stack(&stack);
    stack.show_home();
    assert!(stack.is_visible());
    assert_eq!(log.entries(), vec!["show"]);
    let container = stack.container().unwrap();
    assert!(fx.surface.has_class(container, "show"));
}

#[test]
fn custom_show_class_and_delay() {
    let fx = Fixture::new();
    let mut stack = fx.stack_with(
        StackConfig::default()
            .show_delay(std::time::Duration::from_millis(20))
            .classes(TransitionClasses::default().show("open")),
    );
    let log = EventLog::for_stack(&stack);
    stack.show();
    assert!(fx.surface.has_class(stack.container().unwrap(), "open"));
    fx.advance_ms(20);
    assert_eq!(log.entries(), vec!["show"]);
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn transition_end_event_cleans_up_early() {
    let fx = Fixture::with_capabilities(Capabilities::TRANSITION_EVENTS);
    let mut stack = fx.stack();
    let a = fx.tracked("A");
    let b = fx.tracked("B");
    stack.push(a.clone());
    fx.settle();

    stack.push(b.clone());
    fx.advance_ms(1);
    assert_eq!(fx.mounted(&stack), vec![a.node(), b.node()]);
    assert!(fx.surface.has_class(a.node(), "prev"));

    fx.surface.dispatch(b.node(), EventKind::TransitionEnd);
    assert_eq!(fx.mounted(&stack), vec![b.node()]);
    assert!(fx.surface.classes(a.node()).is_empty());
    assert!(!stack.transition_pending());
    assert_eq!(fx.surface.pending_tasks(), 0);
}

#[test]
fn superseded_transitions_leave_one_node() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let views: Vec<_> = ["A", "B", "C", "D"].iter().map(|n| fx.tracked(n)).collect();
    for v in &views {
        stack.push(v.clone());
    }
    stack.pop();
    stack.pop();
    fx.settle();
    assert_eq!(fx.mounted(&stack), vec![views[1].node()]);
    assert!(fx.surface.classes(views[1].node()).is_empty());
}

#[test]
fn activate_fires_for_every_draw() {
    let fx = Fixture::new();
    let mut stack = fx.stack();
    let a = fx.tracked("A");
    let b = fx.tracked("B");
    stack.push(a.clone());
    stack.push(b.clone());
    stack.back();
    stack.forward();
    assert_eq!(a.activations(), 2);
    assert_eq!(b.activations(), 2);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn index_tracks_top_after_push_and_pop(ops in proptest::collection::vec(any::<bool>(), 1..60)) {
        let fx = Fixture::new();
        let mut stack = fx.stack();
        for push in ops {
            if push {
                stack.push(fx.card("v"));
            } else {
                stack.pop();
            }
            prop_assert!(!stack.is_empty() || stack.index() == 0);
            if !stack.is_empty() {
                prop_assert_eq!(stack.index(), stack.len() - 1);
            }
        }
    }

    #[test]
    fn locked_stack_never_drops_root(pops in 1usize..10) {
        let fx = Fixture::new();
        let mut stack = fx.stack();
        stack.push(fx.card("root"));
        stack.push(fx.card("child"));
        for _ in 0..pops {
            stack.pop();
        }
        prop_assert_eq!(stack.len(), 1);
    }
}
