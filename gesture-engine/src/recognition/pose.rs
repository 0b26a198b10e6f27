//! Static hand pose resolution.
//!
//! Decides which fingers are extended from three-point joint angles, then
//! walks an ordered decision list (fist, thumbs up, index only, peace, OK,
//! palm, pointing direction) to produce a single pose label per frame.

use serde::{Deserialize, Serialize};

use super::landmarks::{distance, joint_angle_deg, Landmark, LandmarkFrame};

// ── Fingers ────────────────────────────────────────────────

/// The five fingers, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// (mcp, pip, dip, tip) chain for a non-thumb finger; the thumb returns
    /// (cmc, mcp, ip, tip).
    pub fn chain(&self) -> [Landmark; 4] {
        match self {
            Self::Thumb => [
                Landmark::ThumbCmc,
                Landmark::ThumbMcp,
                Landmark::ThumbIp,
                Landmark::ThumbTip,
            ],
            Self::Index => [
                Landmark::IndexMcp,
                Landmark::IndexPip,
                Landmark::IndexDip,
                Landmark::IndexTip,
            ],
            Self::Middle => [
                Landmark::MiddleMcp,
                Landmark::MiddlePip,
                Landmark::MiddleDip,
                Landmark::MiddleTip,
            ],
            Self::Ring => [
                Landmark::RingMcp,
                Landmark::RingPip,
                Landmark::RingDip,
                Landmark::RingTip,
            ],
            Self::Pinky => [
                Landmark::PinkyMcp,
                Landmark::PinkyPip,
                Landmark::PinkyDip,
                Landmark::PinkyTip,
            ],
        }
    }
}

/// Extended/curled flag per finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerState {
    extended: [bool; 5],
}

impl FingerState {
    pub fn new(extended: [bool; 5]) -> Self {
        Self { extended }
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.extended[finger.index()]
    }

    /// Number of extended fingers (0-5), thumb included.
    pub fn count(&self) -> u8 {
        self.extended.iter().filter(|e| **e).count() as u8
    }

    /// True when exactly `fingers` are extended and nothing else.
    pub fn only(&self, fingers: &[Finger]) -> bool {
        Finger::ALL
            .iter()
            .all(|f| self.is_extended(*f) == fingers.contains(f))
    }
}

// ── Pose labels ────────────────────────────────────────────

/// Built-in static pose labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaticPose {
    /// No fingers extended.
    Fist,
    /// Only the thumb extended.
    ThumbsUp,
    /// Only the index finger extended.
    IndexOnly,
    /// Index and middle extended and spread.
    Peace,
    /// Thumb touching index tip, other three extended.
    Ok,
    /// All five extended.
    Palm,
    PointingRight,
    PointingUp,
    PointingLeft,
    PointingDown,
}

impl StaticPose {
    pub const ALL: [StaticPose; 10] = [
        Self::Fist,
        Self::ThumbsUp,
        Self::IndexOnly,
        Self::Peace,
        Self::Ok,
        Self::Palm,
        Self::PointingRight,
        Self::PointingUp,
        Self::PointingLeft,
        Self::PointingDown,
    ];

    /// Gesture identifier used in bindings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fist => "FIST",
            Self::ThumbsUp => "THUMBS_UP",
            Self::IndexOnly => "INDEX_ONLY",
            Self::Peace => "PEACE",
            Self::Ok => "OK",
            Self::Palm => "PALM",
            Self::PointingRight => "POINTING_RIGHT",
            Self::PointingUp => "POINTING_UP",
            Self::PointingLeft => "POINTING_LEFT",
            Self::PointingDown => "POINTING_DOWN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s)
    }
}

// ── Config ─────────────────────────────────────────────────

/// Geometric thresholds for pose resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Minimum thumb MCP-IP-TIP angle (degrees) to count as extended.
    pub thumb_extended_deg: f32,
    /// Minimum MCP-PIP-DIP and PIP-DIP-TIP angles (degrees) for the other fingers.
    pub finger_extended_deg: f32,
    /// Lower bound (exclusive) of index/middle tip separation for peace.
    pub peace_min_separation: f32,
    /// Upper bound (exclusive) of index/middle tip separation for peace.
    pub peace_max_separation: f32,
    /// Thumb/index tip distance below which the OK ring is closed.
    pub ok_pinch_threshold: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            thumb_extended_deg: 160.0,
            finger_extended_deg: 140.0,
            peace_min_separation: 0.05,
            peace_max_separation: 0.15,
            ok_pinch_threshold: 0.04,
        }
    }
}

// ── Predicates ─────────────────────────────────────────────

/// Whether a single finger is extended.
pub fn is_finger_extended(frame: &LandmarkFrame, finger: Finger, config: &PoseConfig) -> bool {
    let [base, a, b, tip] = finger.chain();
    match finger {
        Finger::Thumb => {
            // Only the distal joint is reliable for the thumb.
            joint_angle_deg(frame.point(a), frame.point(b), frame.point(tip))
                > config.thumb_extended_deg
        }
        _ => {
            joint_angle_deg(frame.point(base), frame.point(a), frame.point(b))
                > config.finger_extended_deg
                && joint_angle_deg(frame.point(a), frame.point(b), frame.point(tip))
                    > config.finger_extended_deg
        }
    }
}

/// Extension state of all five fingers.
pub fn finger_state(frame: &LandmarkFrame, config: &PoseConfig) -> FingerState {
    let mut extended = [false; 5];
    for finger in Finger::ALL {
        extended[finger.index()] = is_finger_extended(frame, finger, config);
    }
    FingerState::new(extended)
}

/// Thumb tip to index tip distance.
pub fn pinch_distance(frame: &LandmarkFrame) -> f32 {
    distance(
        frame.point(Landmark::ThumbTip),
        frame.point(Landmark::IndexTip),
    )
}

/// Bucket the wrist-to-index-tip direction into one of four 90° sectors.
///
/// Image y grows downward, so it is negated before taking the angle. When
/// the back of the hand faces the camera the direction is flipped 180°.
pub fn pointing_direction(frame: &LandmarkFrame, palm_facing: bool) -> StaticPose {
    let wrist = frame.point(Landmark::Wrist);
    let tip = frame.point(Landmark::IndexTip);
    let dx = tip[0] - wrist[0];
    let dy = tip[1] - wrist[1];
    let mut angle = (-dy).atan2(dx).to_degrees().rem_euclid(360.0);
    if !palm_facing {
        angle = (angle + 180.0).rem_euclid(360.0);
    }
    if !(45.0..315.0).contains(&angle) {
        StaticPose::PointingRight
    } else if angle < 135.0 {
        StaticPose::PointingUp
    } else if angle < 225.0 {
        StaticPose::PointingLeft
    } else {
        StaticPose::PointingDown
    }
}

/// Resolve the raw (unsmoothed) pose for one frame. `None` means the
/// finger configuration matches no known pose.
pub fn classify_pose(
    frame: &LandmarkFrame,
    fingers: &FingerState,
    palm_facing: bool,
    config: &PoseConfig,
) -> Option<StaticPose> {
    let n = fingers.count();

    if n == 0 {
        return Some(StaticPose::Fist);
    }

    if fingers.only(&[Finger::Thumb]) {
        return Some(StaticPose::ThumbsUp);
    }

    if fingers.only(&[Finger::Index]) {
        return Some(StaticPose::IndexOnly);
    }

    let index = fingers.is_extended(Finger::Index);
    let middle = fingers.is_extended(Finger::Middle);
    let ring = fingers.is_extended(Finger::Ring);
    let pinky = fingers.is_extended(Finger::Pinky);

    if index && middle && !ring && !pinky {
        let sep = distance(
            frame.point(Landmark::IndexTip),
            frame.point(Landmark::MiddleTip),
        );
        if sep > config.peace_min_separation && sep < config.peace_max_separation {
            return Some(StaticPose::Peace);
        }
    }

    if pinch_distance(frame) < config.ok_pinch_threshold && middle && ring && pinky {
        return Some(StaticPose::Ok);
    }

    if n == 5 {
        return Some(StaticPose::Palm);
    }

    if index {
        return Some(pointing_direction(frame, palm_facing));
    }

    None
}

// ── Tests ──────────────────────────────────────────────────
