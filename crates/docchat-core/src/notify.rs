//! Toast notifications.
//!
//! Each toast waits a moment before it shows, stays for a fixed duration,
//! fades, and is then pruned. Toasts are independent: no deduplication and
//! no cap on how many stack up. Time is passed in so the lifecycle can be
//! driven by the UI tick (and by tests).

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Pending,
    Visible,
    Fading,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTiming {
    pub show_delay: Duration,
    pub duration: Duration,
    pub fade: Duration,
}

impl Default for ToastTiming {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(100),
            duration: Duration::from_millis(3000),
            fade: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub created: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
    timing: ToastTiming,
    next_id: u64,
}

impl Toasts {
    pub fn new(timing: ToastTiming) -> Self {
        Self { items: Vec::new(), timing, next_id: 0 }
    }

    pub fn notify(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.notify_at(message, kind, Instant::now())
    }

    pub fn notify_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Toast {
            id,
            message: crate::text::sanitize(&message.into()),
            kind,
            created: now,
        });
        id
    }

    pub fn phase(&self, toast: &Toast, now: Instant) -> ToastPhase {
        let age = now.saturating_duration_since(toast.created);
        let t = &self.timing;
        if age < t.show_delay {
            ToastPhase::Pending
        } else if age < t.show_delay + t.duration {
            ToastPhase::Visible
        } else if age < t.show_delay + t.duration + t.fade {
            ToastPhase::Fading
        } else {
            ToastPhase::Expired
        }
    }

    /// Toasts that should be drawn right now, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<(&Toast, ToastPhase)> {
        self.items
            .iter()
            .map(|toast| (toast, self.phase(toast, now)))
            .filter(|(_, phase)| matches!(phase, ToastPhase::Visible | ToastPhase::Fading))
            .collect()
    }

    /// Drop expired toasts. Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        let timing = self.timing;
        self.items.retain(|toast| {
            now.saturating_duration_since(toast.created) < timing.show_delay + timing.duration + timing.fade
        });
        before - self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }
}
