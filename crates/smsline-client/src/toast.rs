//! Timed notifications for incoming messages.
//!
//! The tray is a pure state machine driven by [`ToastTray::tick`] so the
//! caller decides how time passes (real clock in the binary, fixed instants
//! in tests).

use std::time::{Duration, Instant};

use smsline_core::{config::ClientConfig, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    /// Fading out; removed once `remove_at` passes.
    Hiding,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: Message,
    pub phase: ToastPhase,
    hide_at: Instant,
    remove_at: Option<Instant>,
}

/// Transition reported by [`ToastTray::tick`] or [`ToastTray::dismiss`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastChange {
    Hidden(String),
    Removed(String),
}

#[derive(Debug)]
pub struct ToastTray {
    visible_for: Duration,
    fade: Duration,
    toasts: Vec<Toast>,
}

impl ToastTray {
    pub fn new(visible_for: Duration, fade: Duration) -> Self {
        Self {
            visible_for,
            fade,
            toasts: Vec::new(),
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.toast_visible_ms),
            Duration::from_millis(cfg.toast_fade_ms),
        )
    }

    pub fn push(&mut self, message: Message, now: Instant) {
        self.toasts.push(Toast {
            message,
            phase: ToastPhase::Visible,
            hide_at: now + self.visible_for,
            remove_at: None,
        });
    }

    /// Start hiding every visible toast with this message id.
    pub fn dismiss(&mut self, id: &str, now: Instant) -> bool {
        let mut hit = false;
        for toast in self.toasts.iter_mut().filter(|t| t.message.id == id) {
            if toast.phase == ToastPhase::Visible {
                toast.phase = ToastPhase::Hiding;
                toast.remove_at = Some(now + self.fade);
                hit = true;
            }
        }
        hit
    }

    /// Advance to `now`, returning the transitions that happened.
    pub fn tick(&mut self, now: Instant) -> Vec<ToastChange> {
        let mut changes = Vec::new();
        for toast in &mut self.toasts {
            if toast.phase == ToastPhase::Visible && toast.hide_at <= now {
                toast.phase = ToastPhase::Hiding;
                toast.remove_at = Some(toast.hide_at + self.fade);
                changes.push(ToastChange::Hidden(toast.message.id.clone()));
            }
        }
        self.toasts.retain(|toast| match toast.remove_at {
            Some(at) if at <= now => {
                changes.push(ToastChange::Removed(toast.message.id.clone()));
                false
            }
            _ => true,
        });
        changes
    }

    /// Earliest instant at which `tick` will have something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.toasts
            .iter()
            .map(|t| match t.phase {
                ToastPhase::Visible => t.hide_at,
                ToastPhase::Hiding => t.remove_at.unwrap_or(t.hide_at),
            })
            .min()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
