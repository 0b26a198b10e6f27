//! Per-frame orchestration.
//!
//! Each frame runs the classifier, then exactly one consumer: the
//! recording session while it is active, otherwise the router.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::events::{CommandSink, NotificationSink};
use crate::recognition::classifier::{FrameClassification, GestureClassifier};
use crate::recognition::landmarks::TrackingFrame;
use crate::recognition::recorder::{RecordingRequest, RecordingSession};
use crate::recognition::router::Router;
use crate::store::TemplateStore;

pub struct Engine {
    classifier: GestureClassifier,
    router: Router,
    recorder: RecordingSession,
}

impl Engine {
    pub fn new(config: EngineConfig, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            classifier: GestureClassifier::new(config.classifier),
            router: Router::new(config.router, store.clone()),
            recorder: RecordingSession::new(config.recorder, store),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn recorder(&self) -> &RecordingSession {
        &self.recorder
    }

    /// Process one frame and deliver whatever it produced.
    pub fn process_frame(
        &mut self,
        frame: &TrackingFrame,
        commands: &mut impl CommandSink,
        notifications: &mut impl NotificationSink,
    ) -> FrameClassification {
        let classification = self.classifier.classify(frame);

        if self.recorder.is_active() {
            for event in self.recorder.update(frame) {
                notifications.notify(event);
            }
            if !self.recorder.is_active() {
                debug!("Recording finished, resuming command routing");
            }
            return classification;
        }

        for event in self.router.route(&classification) {
            commands.send_command(event);
        }
        classification
    }

    /// Start a recording session. Routing pauses until it ends, and its
    /// debounce state is dropped so a held gesture does not fire on resume.
    pub fn start_recording(
        &mut self,
        request: RecordingRequest,
        now_s: f64,
        notifications: &mut impl NotificationSink,
    ) {
        info!("Pausing command routing for recording");
        self.router.reset();
        for event in self.recorder.start(request, now_s) {
            notifications.notify(event);
        }
    }

    pub fn cancel_recording(&mut self, now_s: f64, notifications: &mut impl NotificationSink) {
        if let Some(event) = self.recorder.cancel(now_s) {
            notifications.notify(event);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
