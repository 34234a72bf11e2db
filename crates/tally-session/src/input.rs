//! # Input Method Tracking
//!
//! Remembers whether the operator last used the keyboard or a pointer, so
//! the frontend can show focus rings only for keyboard navigation.
//!
//! Independent of the ledger and of focus routing: it only watches raw
//! key-down and pointer-down events.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use ts_rs::TS;

/// The most recent kind of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum InputMethod {
    #[default]
    Keyboard,
    Pointer,
}

/// Publishes the last input method to any number of subscribers.
#[derive(Debug)]
pub struct InputMethodTracker {
    tx: watch::Sender<InputMethod>,
}

impl InputMethodTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(InputMethod::default());
        InputMethodTracker { tx }
    }

    /// Key-down hook.
    pub fn on_key_down(&self) {
        self.set(InputMethod::Keyboard);
    }

    /// Pointer-down hook.
    pub fn on_pointer_down(&self) {
        self.set(InputMethod::Pointer);
    }

    /// The current input method.
    pub fn current(&self) -> InputMethod {
        *self.tx.borrow()
    }

    /// Subscribes to changes.
    pub fn subscribe(&self) -> watch::Receiver<InputMethod> {
        self.tx.subscribe()
    }

    fn set(&self, method: InputMethod) {
        // Repeated events of the same kind do not wake subscribers.
        self.tx.send_if_modified(|current| {
            if *current == method {
                false
            } else {
                *current = method;
                true
            }
        });
    }
}

impl Default for InputMethodTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hooks_update_current() {
        let tracker = InputMethodTracker::new();
        assert_eq!(tracker.current(), InputMethod::Keyboard);

        tracker.on_pointer_down();
        assert_eq!(tracker.current(), InputMethod::Pointer);

        tracker.on_key_down();
        assert_eq!(tracker.current(), InputMethod::Keyboard);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let tracker = InputMethodTracker::new();
        let mut rx = tracker.subscribe();

        tracker.on_pointer_down();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), InputMethod::Pointer);

        // Same kind again: no change notification.
        tracker.on_pointer_down();
        assert!(!rx.has_changed().unwrap());

        tracker.on_key_down();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), InputMethod::Keyboard);
    }
}
