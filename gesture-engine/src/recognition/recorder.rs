//! Guided recording of custom gestures.
//!
//! A session walks the user through several repetitions of a new gesture:
//! a countdown, a capture window, a short rest, and again, until enough
//! samples are collected. The finished template goes to the template
//! store. All timing is measured from frame timestamps, so a stalled
//! camera stretches a phase instead of failing it.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::landmarks::{Hand, LandmarkFrame, Point3, TrackingFrame, LANDMARK_COUNT};
use crate::store::{GestureTemplate, TemplateKind, TemplateSample, TemplateStore, TEMPLATE_SCHEMA};

// ── Types ──────────────────────────────────────────────────

/// Recording phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordingState {
    Idle,
    Countdown,
    Capturing,
    Between,
    Complete,
}

impl RecordingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Countdown => "COUNTDOWN",
            Self::Capturing => "CAPTURING",
            Self::Between => "BETWEEN",
            Self::Complete => "COMPLETE",
        }
    }
}

/// What a progress notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingEventKind {
    /// Entered a new phase, or the countdown ticked.
    StateChange,
    SampleSaved,
    /// The template was persisted.
    Complete,
    Cancelled,
    /// The template could not be persisted.
    Failed,
}

/// Progress notification relayed to the user interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingEvent {
    #[serde(rename = "event")]
    pub kind: RecordingEventKind,
    pub state: RecordingState,
    pub gesture_id: String,
    pub samples_done: usize,
    pub samples_total: usize,
    /// Remaining whole seconds, only while counting down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u32>,
    pub message: String,
    pub timestamp_s: f64,
}

/// Phase durations and template defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Whole seconds of countdown before each capture.
    pub countdown_s: u32,
    pub static_capture_s: f64,
    pub dynamic_capture_s: f64,
    /// Rest between captures.
    pub rest_s: f64,
    pub target_samples: usize,
    /// Threshold given to new templates.
    pub match_threshold: f32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            countdown_s: 3,
            static_capture_s: 2.0,
            dynamic_capture_s: 1.0,
            rest_s: 2.0,
            target_samples: 6,
            match_threshold: 0.15,
        }
    }
}

/// What to record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRequest {
    pub gesture_id: String,
    /// Display name, defaults to the id.
    pub label: String,
    pub kind: TemplateKind,
    /// Hand to capture; any visible hand is used when it is absent.
    pub hand: Hand,
}

impl RecordingRequest {
    pub fn new(gesture_id: &str, kind: TemplateKind) -> Self {
        Self {
            gesture_id: gesture_id.to_string(),
            label: gesture_id.to_string(),
            kind,
            hand: Hand::Right,
        }
    }
}

// ── Session ────────────────────────────────────────────────

/// The recording state machine. At most one session is active at a time.
pub struct RecordingSession {
    pub config: RecorderConfig,
    store: Arc<dyn TemplateStore>,
    state: RecordingState,
    request: Option<RecordingRequest>,
    samples: Vec<TemplateSample>,
    /// Frames of the capture in progress.
    buffer: Vec<LandmarkFrame>,
    /// When the current phase began (seconds).
    phase_start_s: f64,
    /// Countdown value last announced.
    countdown_shown: u32,
}

impl RecordingSession {
    pub fn new(config: RecorderConfig, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            config,
            store,
            state: RecordingState::Idle,
            request: None,
            samples: Vec::new(),
            buffer: Vec::new(),
            phase_start_s: 0.0,
            countdown_shown: 0,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != RecordingState::Idle
    }

    /// Samples stored so far in the running session.
    pub fn samples_done(&self) -> usize {
        self.samples.len()
    }

    /// Begin a new session. A running session is cancelled first.
    pub fn start(&mut self, request: RecordingRequest, now_s: f64) -> Vec<RecordingEvent> {
        let mut events = Vec::new();
        if self.is_active() {
            warn!(
                "Recording of {} still active, cancelling it",
                self.gesture_id()
            );
            events.extend(self.cancel(now_s));
        }

        if request.kind == TemplateKind::Combo {
            warn!("Refusing to record combo template {}", request.gesture_id);
            events.push(RecordingEvent {
                kind: RecordingEventKind::Failed,
                state: RecordingState::Idle,
                gesture_id: request.gesture_id,
                samples_done: 0,
                samples_total: self.config.target_samples,
                countdown: None,
                message: "Combo gestures cannot be recorded.".to_string(),
                timestamp_s: now_s,
            });
            return events;
        }

        info!(
            "Recording started: {} ({}, {} hand)",
            request.gesture_id,
            request.kind.as_str(),
            request.hand.as_str()
        );
        self.request = Some(request);
        self.samples.clear();
        self.buffer.clear();
        self.countdown_shown = self.config.countdown_s;
        self.enter(RecordingState::Countdown, now_s);

        let message = format!("Get ready... {}", self.countdown_shown);
        let countdown = Some(self.countdown_shown);
        events.push(self.event(RecordingEventKind::StateChange, countdown, message, now_s));
        events
    }

    /// Abort the running session and drop every sample it collected.
    /// `None` when nothing was running.
    pub fn cancel(&mut self, now_s: f64) -> Option<RecordingEvent> {
        if !self.is_active() {
            return None;
        }
        info!(
            "Recording of {} cancelled after {} samples",
            self.gesture_id(),
            self.samples.len()
        );
        let mut event = self.event(
            RecordingEventKind::Cancelled,
            None,
            "Recording cancelled.".to_string(),
            now_s,
        );
        event.state = RecordingState::Idle;
        self.reset();
        Some(event)
    }

    /// Advance the state machine with one camera frame.
    pub fn update(&mut self, frame: &TrackingFrame) -> Vec<RecordingEvent> {
        let now = frame.timestamp_s;
        let elapsed = now - self.phase_start_s;

        match self.state {
            RecordingState::Idle | RecordingState::Complete => Vec::new(),
            RecordingState::Countdown => {
                let remaining = self.config.countdown_s as i64 - elapsed.floor() as i64;
                if remaining <= 0 {
                    self.buffer.clear();
                    self.enter(RecordingState::Capturing, now);
                    let message = "Go! Perform the gesture now.".to_string();
                    vec![self.event(RecordingEventKind::StateChange, None, message, now)]
                } else if remaining as u32 != self.countdown_shown {
                    self.countdown_shown = remaining as u32;
                    debug!("Recording countdown: {}", remaining);
                    let message = format!("Get ready... {}", remaining);
                    let countdown = Some(self.countdown_shown);
                    vec![self.event(RecordingEventKind::StateChange, countdown, message, now)]
                } else {
                    Vec::new()
                }
            }
            RecordingState::Capturing => {
                let Some(request) = self.request.as_ref() else {
                    return Vec::new();
                };
                let Some(obs) = frame.preferred_or_any(request.hand) else {
                    return Vec::new();
                };
                let window = self.capture_window_s(request.kind);
                self.buffer.push(obs.landmarks);
                if elapsed >= window {
                    self.finish_sample(now)
                } else {
                    Vec::new()
                }
            }
            RecordingState::Between => {
                if elapsed < self.config.rest_s {
                    return Vec::new();
                }
                self.countdown_shown = self.config.countdown_s;
                self.enter(RecordingState::Countdown, now);
                let message = format!(
                    "Sample {}/{} saved. Get ready again...",
                    self.samples.len(),
                    self.config.target_samples
                );
                let countdown = Some(self.countdown_shown);
                vec![self.event(RecordingEventKind::StateChange, countdown, message, now)]
            }
        }
    }

    fn finish_sample(&mut self, now: f64) -> Vec<RecordingEvent> {
        let kind = self
            .request
            .as_ref()
            .map(|r| r.kind)
            .unwrap_or(TemplateKind::Static);
        let frames = std::mem::take(&mut self.buffer);
        let frames = match kind {
            TemplateKind::Dynamic => frames,
            _ => median_frame(&frames).into_iter().collect(),
        };
        if frames.is_empty() {
            return Vec::new();
        }
        self.samples
            .push(TemplateSample::new(frames, Some(Utc::now())));

        let done = self.samples.len();
        let total = self.config.target_samples;
        info!("Recording {}: sample {}/{} saved", self.gesture_id(), done, total);

        let mut events = Vec::new();
        if done >= total {
            self.enter(RecordingState::Complete, now);
            let message = format!("Sample {}/{} saved.", done, total);
            events.push(self.event(RecordingEventKind::SampleSaved, None, message, now));
            events.push(self.persist(now));
            self.reset();
        } else {
            self.enter(RecordingState::Between, now);
            let message = format!("Sample {}/{} saved. Rest briefly...", done, total);
            events.push(self.event(RecordingEventKind::SampleSaved, None, message, now));
        }
        events
    }

    /// Hand the finished template to the store.
    fn persist(&mut self, now: f64) -> RecordingEvent {
        let Some(request) = self.request.clone() else {
            return self.event(
                RecordingEventKind::Failed,
                None,
                "No recording in progress.".to_string(),
                now,
            );
        };

        let mut template = GestureTemplate::new(
            &request.gesture_id,
            request.kind,
            std::mem::take(&mut self.samples),
        );
        let sample_count = template.samples.len();
        template.label = request.label.clone();
        template.hand = Some(request.hand);
        template.match_threshold = self.config.match_threshold;
        template.enabled = true;
        template.created_at = Some(Utc::now());
        template.capture_window_s = Some(self.capture_window_s(request.kind));
        template.schema = TEMPLATE_SCHEMA;

        let (kind, message) = match self.store.save_template(template) {
            Ok(()) => {
                info!("Recording of {} complete", request.gesture_id);
                (
                    RecordingEventKind::Complete,
                    format!("Gesture '{}' saved successfully!", request.label),
                )
            }
            Err(e) => {
                error!("Failed to save template {}: {}", request.gesture_id, e);
                (
                    RecordingEventKind::Failed,
                    format!("Failed to save gesture '{}': {}", request.label, e),
                )
            }
        };
        let mut event = self.event(kind, None, message, now);
        event.samples_done = sample_count;
        event
    }

    fn capture_window_s(&self, kind: TemplateKind) -> f64 {
        match kind {
            TemplateKind::Dynamic => self.config.dynamic_capture_s,
            _ => self.config.static_capture_s,
        }
    }

    fn enter(&mut self, state: RecordingState, now: f64) {
        debug!(
            "Recording state: {} -> {} at t={:.3}s",
            self.state.as_str(),
            state.as_str(),
            now
        );
        self.state = state;
        self.phase_start_s = now;
    }

    fn reset(&mut self) {
        self.state = RecordingState::Idle;
        self.request = None;
        self.samples.clear();
        self.buffer.clear();
        self.phase_start_s = 0.0;
        self.countdown_shown = 0;
    }

    fn gesture_id(&self) -> &str {
        self.request
            .as_ref()
            .map(|r| r.gesture_id.as_str())
            .unwrap_or("")
    }

    fn event(
        &self,
        kind: RecordingEventKind,
        countdown: Option<u32>,
        message: String,
        now: f64,
    ) -> RecordingEvent {
        RecordingEvent {
            kind,
            state: self.state,
            gesture_id: self.gesture_id().to_string(),
            samples_done: self.samples.len(),
            samples_total: self.config.target_samples,
            countdown,
            message,
            timestamp_s: now,
        }
    }
}

/// Element-wise median of a set of frames. Even counts average the two
/// middle values. `None` for an empty set.
pub fn median_frame(frames: &[LandmarkFrame]) -> Option<LandmarkFrame> {
    if frames.is_empty() {
        return None;
    }
    let mut points: [Point3; LANDMARK_COUNT] = [[0.0; 3]; LANDMARK_COUNT];
    let mut column = Vec::with_capacity(frames.len());
    for (i, point) in points.iter_mut().enumerate() {
        for (axis, value) in point.iter_mut().enumerate() {
            column.clear();
            column.extend(frames.iter().map(|f| f.points()[i][axis]));
            column.sort_by(|a, b| a.total_cmp(b));
            let mid = column.len() / 2;
            *value = if column.len() % 2 == 0 {
                (column[mid - 1] + column[mid]) / 2.0
            } else {
                column[mid]
            };
        }
    }
    Some(LandmarkFrame::new(points))
}

// ── Tests ──────────────────────────────────────────────────
