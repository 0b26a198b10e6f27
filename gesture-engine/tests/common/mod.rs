//! Frame helpers for the integration tests. Hand geometry comes from
//! `recognition::test_support`.

#![allow(dead_code)]

use gesture_engine::recognition::landmarks::{Hand, HandObservation, LandmarkFrame, TrackingFrame};
use gesture_engine::recognition::pose::Finger;
use gesture_engine::recognition::test_support::{hand_frame, FingerSet};

/// Frame interval at 20 fps.
pub const DT: f64 = 0.05;

/// Upright hand with `extended` fingers straight and the rest curled,
/// translated by (dx, dy).
pub fn hand(extended: &[Finger], dx: f32, dy: f32) -> LandmarkFrame {
    hand_frame(FingerSet::of(extended), dx, dy)
}

pub fn fist(dx: f32) -> LandmarkFrame {
    hand_frame(FingerSet::NONE, dx, 0.0)
}

pub fn observe(which: Hand, landmarks: LandmarkFrame) -> HandObservation {
    HandObservation {
        hand: which,
        landmarks,
        confidence: 0.95,
    }
}

pub fn frame(i: usize, hands: Vec<HandObservation>) -> TrackingFrame {
    TrackingFrame::new(i as f64 * DT, hands)
}
