#![forbid(unsafe_code)]

//! Stack configuration.

use std::time::Duration;

/// Class names used while swapping a stack's active node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransitionClasses {
    /// Applied to the node on the higher-index side of a swap.
    pub next: String,
    /// Applied to the node on the lower-index side of a swap.
    pub prev: String,
    /// Applied to the stack container while it is visible.
    pub show: String,
}

impl Default for TransitionClasses {
    fn default() -> Self {
        Self {
            next: "next".into(),
            prev: "prev".into(),
            show: "show".into(),
        }
    }
}

impl TransitionClasses {
    /// Set the forward-side class.
    #[must_use]
    pub fn next(mut self, class: impl Into<String>) -> Self {
        self.next = class.into();
        self
    }

    /// Set the backward-side class.
    #[must_use]
    pub fn prev(mut self, class: impl Into<String>) -> Self {
        self.prev = class.into();
        self
    }

    /// Set the visible-container class.
    #[must_use]
    pub fn show(mut self, class: impl Into<String>) -> Self {
        self.show = class.into();
        self
    }
}

/// Stack timings and behavior switches. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackConfig {
    /// Delay between `show()`/`hide()` and the matching event.
    pub show_delay_ms: u64,
    /// Delay between attaching a node and starting its transition.
    pub animate_delay_ms: u64,
    /// Cleanup deadline when no transition-end event arrives.
    pub transition_fallback_ms: u64,
    /// Whether a new stack keeps its first view on `pop()`.
    pub locked: bool,
    /// Fire `pop_event` on the pop that empties the stack.
    pub pop_event_on_empty: bool,
    /// Transition class names.
    pub classes: TransitionClasses,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            show_delay_ms: 500,
            animate_delay_ms: 1,
            transition_fallback_ms: 200,
            locked: true,
            pop_event_on_empty: false,
            classes: TransitionClasses::default(),
        }
    }
}

impl StackConfig {
    #[must_use]
    pub fn show_delay(mut self, delay: Duration) -> Self {
        self.show_delay_ms = duration_ms(delay);
        self
    }

    #[must_use]
    pub fn animate_delay(mut self, delay: Duration) -> Self {
        self.animate_delay_ms = duration_ms(delay);
        self
    }

    #[must_use]
    pub fn transition_fallback(mut self, delay: Duration) -> Self {
        self.transition_fallback_ms = duration_ms(delay);
        self
    }

    #[must_use]
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    #[must_use]
    pub fn pop_event_on_empty(mut self, fire: bool) -> Self {
        self.pop_event_on_empty = fire;
        self
    }

    #[must_use]
    pub fn classes(mut self, classes: TransitionClasses) -> Self {
        self.classes = classes;
        self
    }

    /// `show_delay_ms` as a duration.
    pub fn show_delay_duration(&self) -> Duration {
        Duration::from_millis(self.show_delay_ms)
    }

    /// `animate_delay_ms` as a duration.
    pub fn animate_delay_duration(&self) -> Duration {
        Duration::from_millis(self.animate_delay_ms)
    }

    /// `transition_fallback_ms` as a duration.
    pub fn transition_fallback_duration(&self) -> Duration {
        Duration::from_millis(self.transition_fallback_ms)
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
