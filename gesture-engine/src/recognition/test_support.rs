//! Synthetic hand fixtures shared by the unit and integration tests.
//! Not part of the supported API.
//!
//! The hand stands upright: wrist near the bottom of the image, fingers
//! pointing up (decreasing y). Extended fingers are straight vertical
//! chains, curled fingers fold back toward the palm.

use super::landmarks::{Landmark, LandmarkFrame, Point3, LANDMARK_COUNT};
use super::pose::Finger;

/// Which fingers the fixture should extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerSet {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerSet {
    pub const NONE: FingerSet = FingerSet {
        thumb: false,
        index: false,
        middle: false,
        ring: false,
        pinky: false,
    };

    pub const ALL: FingerSet = FingerSet {
        thumb: true,
        index: true,
        middle: true,
        ring: true,
        pinky: true,
    };

    pub fn of(fingers: &[Finger]) -> Self {
        Self {
            thumb: fingers.contains(&Finger::Thumb),
            index: fingers.contains(&Finger::Index),
            middle: fingers.contains(&Finger::Middle),
            ring: fingers.contains(&Finger::Ring),
            pinky: fingers.contains(&Finger::Pinky),
        }
    }

    fn get(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }
}

/// Build an upright hand with the given fingers extended, translated by
/// (dx, dy).
pub fn hand_frame(set: FingerSet, dx: f32, dy: f32) -> LandmarkFrame {
    let mut points: [Point3; LANDMARK_COUNT] = [[0.0; 3]; LANDMARK_COUNT];
    let mut put = |lm: Landmark, x: f32, y: f32| {
        points[lm.index()] = [x + dx, y + dy, 0.0];
    };

    put(Landmark::Wrist, 0.5, 0.8);

    put(Landmark::ThumbCmc, 0.44, 0.76);
    put(Landmark::ThumbMcp, 0.40, 0.72);
    if set.thumb {
        put(Landmark::ThumbIp, 0.36, 0.68);
        put(Landmark::ThumbTip, 0.32, 0.64);
    } else {
        put(Landmark::ThumbIp, 0.38, 0.66);
        put(Landmark::ThumbTip, 0.42, 0.68);
    }

    for (finger, x) in [
        (Finger::Index, 0.44),
        (Finger::Middle, 0.50),
        (Finger::Ring, 0.56),
        (Finger::Pinky, 0.62),
    ] {
        let [mcp, pip, dip, tip] = finger.chain();
        put(mcp, x, 0.60);
        if set.get(finger) {
            put(pip, x, 0.54);
            put(dip, x, 0.49);
            put(tip, x, 0.44);
        } else {
            put(pip, x, 0.55);
            put(dip, x + 0.02, 0.58);
            put(tip, x + 0.01, 0.61);
        }
    }

    LandmarkFrame::new(points)
}

/// Copy of `frame` with one landmark replaced.
pub fn with_point(frame: &LandmarkFrame, landmark: Landmark, point: Point3) -> LandmarkFrame {
    let mut points = *frame.points();
    points[landmark.index()] = point;
    LandmarkFrame::new(points)
}
