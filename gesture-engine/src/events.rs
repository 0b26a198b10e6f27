//! Outbound events and the sinks that receive them.
//!
//! Sinks are fire-and-forget: a full or disconnected channel drops the
//! event with a warning and never blocks frame processing.

use crossbeam_channel::{Sender, TrySendError};
use serde::Serialize;
use tracing::warn;

use crate::recognition::landmarks::{Hand, LandmarkFrame};
use crate::recognition::recorder::RecordingEvent;

/// Which hand(s) produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HandScope {
    Left,
    Right,
    /// Two-hand combo.
    Both,
}

impl HandScope {
    /// Debounce slot: one per hand plus one shared combo slot.
    pub fn slot(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Both => 2,
        }
    }
}

impl From<Hand> for HandScope {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::Left => Self::Left,
            Hand::Right => Self::Right,
        }
    }
}

/// Extra data for pointer-style commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerMeta {
    pub pinch_distance: f32,
    pub landmarks: LandmarkFrame,
}

/// One command emitted by the router.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEvent {
    pub command_id: String,
    pub gesture_id: String,
    pub hand: HandScope,
    /// Always at least 1.
    pub magnitude: u32,
    pub repeatable: bool,
    pub timestamp_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PointerMeta>,
}

// ── Sinks ──────────────────────────────────────────────────

/// Receives command events in emission order.
pub trait CommandSink {
    fn send_command(&mut self, event: CommandEvent);
}

/// Receives recording progress events in emission order.
pub trait NotificationSink {
    fn notify(&mut self, event: RecordingEvent);
}

impl CommandSink for Vec<CommandEvent> {
    fn send_command(&mut self, event: CommandEvent) {
        self.push(event);
    }
}

impl NotificationSink for Vec<RecordingEvent> {
    fn notify(&mut self, event: RecordingEvent) {
        self.push(event);
    }
}

impl CommandSink for Sender<CommandEvent> {
    fn send_command(&mut self, event: CommandEvent) {
        if let Err(e) = self.try_send(event) {
            log_dropped("command", &e);
        }
    }
}

impl NotificationSink for Sender<RecordingEvent> {
    fn notify(&mut self, event: RecordingEvent) {
        if let Err(e) = self.try_send(event) {
            log_dropped("recording", &e);
        }
    }
}

fn log_dropped<T>(kind: &str, err: &TrySendError<T>) {
    match err {
        TrySendError::Full(_) => warn!("Dropping {} event: channel full", kind),
        TrySendError::Disconnected(_) => warn!("Dropping {} event: receiver gone", kind),
    }
}

// ── Tests ──────────────────────────────────────────────────
