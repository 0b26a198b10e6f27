//! Hand landmark data structures and geometry.
//!
//! Models the 21 points per hand produced by the external hand tracker,
//! normalized to the 0-1 image range with relative depth in `z`.
//! Provides frame validation, per-frame observations, and the
//! distance / joint-angle / palm-normal helpers the classifier uses.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in tracker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Length of a flattened landmark frame (21 points x 3 coordinates).
pub const FLAT_LEN: usize = LANDMARK_COUNT * 3;

impl Landmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Hand enum ──────────────────────────────────────────────

/// Which hand, as labelled by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    #[serde(alias = "left")]
    Left,
    #[serde(alias = "right")]
    Right,
}

impl Hand {
    /// Both hands, in slot order.
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a hand name ("left"/"Left", "right"/"Right").
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "left" | "Left" => Some(Self::Left),
            "right" | "Right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Slot index for two-slot per-hand arrays.
    pub fn slot(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// The opposite hand.
    pub fn other(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

// ── Errors ─────────────────────────────────────────────────

/// Reasons a raw landmark array cannot become a `LandmarkFrame`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("expected 21 landmarks, got {0}")]
    WrongCount(usize),
    #[error("expected 63 flat values, got {0}")]
    WrongLength(usize),
    #[error("landmark {0} has non-finite coordinates")]
    NonFinite(usize),
}

// ── Landmark frame ─────────────────────────────────────────

/// One (x, y, z) point.
pub type Point3 = [f32; 3];

/// The 21 landmarks of one hand in one camera frame.
///
/// The fixed-size array guarantees the shape; construction from untrusted
/// data goes through `TryFrom<Vec<Point3>>` or `from_flat`, which also
/// reject non-finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3>", into = "Vec<Point3>")]
pub struct LandmarkFrame {
    points: [Point3; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Wrap an already-shaped point array.
    pub fn new(points: [Point3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a flat `[x0, y0, z0, x1, ...]` slice of 63 values.
    pub fn from_flat(values: &[f32]) -> Result<Self, LandmarkError> {
        if values.len() != FLAT_LEN {
            return Err(LandmarkError::WrongLength(values.len()));
        }
        let mut points = [[0.0; 3]; LANDMARK_COUNT];
        for (i, chunk) in values.chunks_exact(3).enumerate() {
            points[i] = [chunk[0], chunk[1], chunk[2]];
        }
        Self::checked(points)
    }

    fn checked(points: [Point3; LANDMARK_COUNT]) -> Result<Self, LandmarkError> {
        if let Some(i) = points
            .iter()
            .position(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(LandmarkError::NonFinite(i));
        }
        Ok(Self { points })
    }

    /// Position of a single landmark.
    pub fn point(&self, landmark: Landmark) -> Point3 {
        self.points[landmark.index()]
    }

    /// All 21 points in tracker order.
    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] {
        &self.points
    }

    /// Flatten to 63 values in tracker order.
    pub fn flatten(&self) -> [f32; FLAT_LEN] {
        let mut out = [0.0; FLAT_LEN];
        for (i, p) in self.points.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(p);
        }
        out
    }

    /// (x, y) of a landmark, dropping depth.
    pub fn xy(&self, landmark: Landmark) -> [f32; 2] {
        let p = self.point(landmark);
        [p[0], p[1]]
    }
}

impl TryFrom<Vec<Point3>> for LandmarkFrame {
    type Error = LandmarkError;

    fn try_from(points: Vec<Point3>) -> Result<Self, Self::Error> {
        let len = points.len();
        let points: [Point3; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(len))?;
        Self::checked(points)
    }
}

impl From<LandmarkFrame> for Vec<Point3> {
    fn from(frame: LandmarkFrame) -> Self {
        frame.points.to_vec()
    }
}

// ── Observations ───────────────────────────────────────────

/// One hand as reported by the tracker for one camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    /// Handedness label.
    pub hand: Hand,
    /// The 21 landmarks.
    pub landmarks: LandmarkFrame,
    /// Tracker handedness confidence (0.0-1.0).
    pub confidence: f32,
}

/// All hands seen in one camera frame. A hand that was not detected is
/// simply not present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingFrame {
    /// Capture time in seconds.
    pub timestamp_s: f64,
    /// Zero, one or two observations.
    pub hands: Vec<HandObservation>,
}

impl TrackingFrame {
    pub fn new(timestamp_s: f64, hands: Vec<HandObservation>) -> Self {
        Self { timestamp_s, hands }
    }

    /// Observation for a specific hand, if it was seen.
    pub fn hand(&self, hand: Hand) -> Option<&HandObservation> {
        self.hands.iter().find(|h| h.hand == hand)
    }

    /// Observation for `preferred`, falling back to any visible hand.
    pub fn preferred_or_any(&self, preferred: Hand) -> Option<&HandObservation> {
        self.hand(preferred).or_else(|| self.hands.first())
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    /// Build a frame from untrusted wire data. Hands whose landmark array
    /// has the wrong shape are dropped with a warning; the rest survive.
    pub fn from_raw(raw: RawTrackingFrame) -> Self {
        let mut hands = Vec::with_capacity(raw.hands.len());
        for obs in raw.hands {
            match LandmarkFrame::try_from(obs.landmarks) {
                Ok(landmarks) => hands.push(HandObservation {
                    hand: obs.hand,
                    landmarks,
                    confidence: obs.confidence,
                }),
                Err(e) => warn!(
                    "Dropping {} hand at t={:.3}s: {}",
                    obs.hand.as_str(),
                    raw.timestamp_s,
                    e
                ),
            }
        }
        Self {
            timestamp_s: raw.timestamp_s,
            hands,
        }
    }
}

// ── Wire adapter types ─────────────────────────────────────

/// Unvalidated hand observation as it arrives from the tracker bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    pub hand: Hand,
    pub landmarks: Vec<Point3>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

/// Unvalidated frame as it arrives from the tracker bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrackingFrame {
    pub timestamp_s: f64,
    #[serde(default)]
    pub hands: Vec<RawObservation>,
}

fn default_confidence() -> f32 {
    1.0
}

// ── Geometry ───────────────────────────────────────────────

/// Euclidean distance between two 3D points.
pub fn distance(a: Point3, b: Point3) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Euclidean distance between two 2D points.
pub fn distance_2d(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Angle at `joint` (degrees, 0-180) formed by `a - joint` and `b - joint`.
/// A straight chain gives 180.
pub fn joint_angle_deg(a: Point3, joint: Point3, b: Point3) -> f32 {
    let v1 = [a[0] - joint[0], a[1] - joint[1], a[2] - joint[2]];
    let v2 = [b[0] - joint[0], b[1] - joint[1], b[2] - joint[2]];
    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
    let n1 = (v1[0] * v1[0] + v1[1] * v1[1] + v1[2] * v1[2]).sqrt();
    let n2 = (v2[0] * v2[0] + v2[1] * v2[1] + v2[2] * v2[2]).sqrt();
    let cos = (dot / (n1 * n2 + 1e-6)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Whether the palm faces the camera.
///
/// Sign of the z component of (index MCP - wrist) x (pinky MCP - wrist),
/// mirrored for the left hand.
pub fn palm_facing(frame: &LandmarkFrame, hand: Hand) -> bool {
    let wrist = frame.point(Landmark::Wrist);
    let index = frame.point(Landmark::IndexMcp);
    let pinky = frame.point(Landmark::PinkyMcp);
    let a = [index[0] - wrist[0], index[1] - wrist[1]];
    let b = [pinky[0] - wrist[0], pinky[1] - wrist[1]];
    let normal_z = a[0] * b[1] - a[1] * b[0];
    let facing = normal_z > 0.0;
    match hand {
        Hand::Left => !facing,
        Hand::Right => facing,
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::test_support::{hand_frame, FingerSet};

    #[test]
    fn test_landmark_indices() {
        assert_eq!(Landmark::Wrist.index(), 0);
        assert_eq!(Landmark::ThumbTip.index(), 4);
        assert_eq!(Landmark::IndexTip.index(), 8);
        assert_eq!(Landmark::MiddleTip.index(), 12);
        assert_eq!(Landmark::PinkyTip.index(), 20);
        assert_eq!(Landmark::PinkyTip.as_str(), "pinky-tip");
    }

    #[test]
    fn test_hand_slots_and_other() {
        assert_eq!(Hand::Left.slot(), 0);
        assert_eq!(Hand::Right.slot(), 1);
        assert_eq!(Hand::Left.other(), Hand::Right);
        assert_eq!(Hand::from_str("Right"), Some(Hand::Right));
        assert_eq!(Hand::from_str("both"), None);
    }

    #[test]
    fn test_frame_rejects_wrong_count() {
        let err = LandmarkFrame::try_from(vec![[0.0, 0.0, 0.0]; 20]).unwrap_err();
        assert_eq!(err, LandmarkError::WrongCount(20));
    }

    #[test]
    fn test_frame_rejects_non_finite() {
        let mut points = vec![[0.5, 0.5, 0.0]; LANDMARK_COUNT];
        points[7] = [f32::NAN, 0.5, 0.0];
        let err = LandmarkFrame::try_from(points).unwrap_err();
        assert_eq!(err, LandmarkError::NonFinite(7));
    }

    #[test]
    fn test_from_flat_roundtrip_order() {
        let values: Vec<f32> = (0..FLAT_LEN).map(|v| v as f32).collect();
        let frame = LandmarkFrame::from_flat(&values).unwrap();
        assert_eq!(frame.point(Landmark::ThumbCmc), [3.0, 4.0, 5.0]);
        assert_eq!(frame.flatten().to_vec(), values);
        assert_eq!(
            LandmarkFrame::from_flat(&values[..60]).unwrap_err(),
            LandmarkError::WrongLength(60)
        );
    }

    #[test]
    fn test_joint_angle_straight_and_right() {
        let straight = joint_angle_deg([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 2.0, 0.0]);
        assert!((straight - 180.0).abs() < 0.1);
        let right = joint_angle_deg([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((right - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_joint_angle_degenerate_is_finite() {
        let p = [0.3, 0.3, 0.0];
        assert!(joint_angle_deg(p, p, p).is_finite());
    }

    #[test]
    fn test_palm_facing_mirrors_for_left() {
        let frame = hand_frame(FingerSet::ALL, 0.0, 0.0);
        assert!(palm_facing(&frame, Hand::Right));
        assert!(!palm_facing(&frame, Hand::Left));
    }

    #[test]
    fn test_from_raw_drops_malformed_hand() {
        let good = hand_frame(FingerSet::NONE, 0.0, 0.0);
        let raw = RawTrackingFrame {
            timestamp_s: 1.0,
            hands: vec![
                RawObservation {
                    hand: Hand::Left,
                    landmarks: vec![[0.1, 0.1, 0.0]; 5],
                    confidence: 0.9,
                },
                RawObservation {
                    hand: Hand::Right,
                    landmarks: good.points().to_vec(),
                    confidence: 0.8,
                },
            ],
        };
        let frame = TrackingFrame::from_raw(raw);
        assert_eq!(frame.hands.len(), 1);
        assert!(frame.hand(Hand::Left).is_none());
        assert_eq!(frame.hand(Hand::Right).map(|h| h.confidence), Some(0.8));
    }

    #[test]
    fn test_preferred_or_any_falls_back() {
        let obs = HandObservation {
            hand: Hand::Left,
            landmarks: hand_frame(FingerSet::NONE, 0.0, 0.0),
            confidence: 1.0,
        };
        let frame = TrackingFrame::new(0.0, vec![obs]);
        assert_eq!(
            frame.preferred_or_any(Hand::Right).map(|h| h.hand),
            Some(Hand::Left)
        );
        assert!(TrackingFrame::default().preferred_or_any(Hand::Right).is_none());
    }

    #[test]
    fn test_raw_frame_deserializes_from_json() {
        let points: Vec<String> = (0..LANDMARK_COUNT).map(|_| "[0.5,0.5,0.0]".to_string()).collect();
        let json = format!(
            r#"{{"timestamp_s": 2.5, "hands": [{{"hand": "Right", "landmarks": [{}]}}]}}"#,
            points.join(",")
        );
        let raw: RawTrackingFrame = serde_json::from_str(&json).unwrap();
        let frame = TrackingFrame::from_raw(raw);
        assert_eq!(frame.timestamp_s, 2.5);
        assert_eq!(frame.hands[0].confidence, 1.0);
    }
}
