//! Per-frame gesture classification with temporal smoothing.
//!
//! Runs the pose decision list and motion detector on each visible hand,
//! smooths both through short majority-vote windows, tracks wrist velocity
//! for stationarity, and resolves two-hand combos.  Each hand owns its own
//! rolling buffers; a hand that is absent from a frame has them cleared.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::landmarks::{distance_2d, palm_facing, Hand, Landmark, LandmarkFrame, TrackingFrame};
use super::motion::{detect_motion, MotionConfig, MotionGesture};
use super::pose::{classify_pose, finger_state, pinch_distance, PoseConfig, StaticPose};

// ── Config ─────────────────────────────────────────────────

/// A two-hand combo: fires when the left and right hands hold these poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboRule {
    pub id: String,
    pub left: StaticPose,
    pub right: StaticPose,
}

impl ComboRule {
    pub fn new(id: &str, left: StaticPose, right: StaticPose) -> Self {
        Self {
            id: id.to_string(),
            left,
            right,
        }
    }
}

/// Classifier thresholds and window sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub pose: PoseConfig,
    pub motion: MotionConfig,
    /// Rolling window of raw static poses.
    pub static_window: usize,
    /// Entries needed before the window's majority replaces the raw pose.
    pub static_min_votes: usize,
    /// Rolling window of raw motion labels.
    pub motion_window: usize,
    /// Entries needed before a motion label becomes visible.
    pub motion_min_votes: usize,
    /// Fingertip path length (frames) fed to motion detection.
    pub position_history: usize,
    /// Path length at which an empty detection clears the motion window.
    pub motion_clear_after: usize,
    /// Wrist positions kept for velocity.
    pub velocity_window: usize,
    /// Wrist displacement per frame below which a hand is stationary.
    pub stationary_threshold: f32,
    /// Two-hand combo table, checked in order.
    pub combos: Vec<ComboRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pose: PoseConfig::default(),
            motion: MotionConfig::default(),
            static_window: 5,
            static_min_votes: 3,
            motion_window: 5,
            motion_min_votes: 2,
            position_history: 25,
            motion_clear_after: 20,
            velocity_window: 6,
            stationary_threshold: 0.008,
            combos: vec![
                ComboRule::new("TWO_FISTS", StaticPose::Fist, StaticPose::Fist),
                ComboRule::new("HIGH_FIVE", StaticPose::Palm, StaticPose::Palm),
                ComboRule::new(
                    "DOUBLE_THUMBS_UP",
                    StaticPose::ThumbsUp,
                    StaticPose::ThumbsUp,
                ),
            ],
        }
    }
}

// ── Results ────────────────────────────────────────────────

/// Classification of one hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandClassification {
    pub hand: Hand,
    pub landmarks: LandmarkFrame,
    /// Smoothed static pose.
    pub static_pose: Option<StaticPose>,
    /// Smoothed motion gesture.
    pub motion: Option<MotionGesture>,
    /// Extended fingers, thumb included (0-5).
    pub extended_fingers: u8,
    pub pinch_distance: f32,
    /// Wrist displacement since the previous frame.
    pub velocity: f32,
    pub is_stationary: bool,
    pub palm_facing: bool,
    /// Tracker handedness confidence.
    pub confidence: f32,
}

impl HandClassification {
    /// Resolved gesture identifier: motion wins over pose.
    pub fn gesture_id(&self) -> Option<&'static str> {
        self.motion
            .map(|m| m.as_str())
            .or_else(|| self.static_pose.map(|p| p.as_str()))
    }
}

/// Classification of every visible hand in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameClassification {
    pub timestamp_s: f64,
    /// Indexed by `Hand::slot()`.
    pub hands: [Option<HandClassification>; 2],
    /// Two-hand combo identifier, when both hands match a rule.
    pub combo: Option<String>,
}

impl FrameClassification {
    pub fn hand(&self, hand: Hand) -> Option<&HandClassification> {
        self.hands[hand.slot()].as_ref()
    }

    /// Visible hands, left first.
    pub fn visible(&self) -> impl Iterator<Item = &HandClassification> {
        self.hands.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.iter().all(Option::is_none)
    }
}

// ── Per-hand history ───────────────────────────────────────

/// Rolling buffers for a single hand.
#[derive(Debug, Clone, Default)]
struct HandHistory {
    poses: VecDeque<StaticPose>,
    motions: VecDeque<MotionGesture>,
    path: VecDeque<[f32; 2]>,
    wrist: VecDeque<[f32; 2]>,
}

impl HandHistory {
    fn reset(&mut self) {
        self.poses.clear();
        self.motions.clear();
        self.path.clear();
        self.wrist.clear();
    }

    fn is_empty(&self) -> bool {
        self.poses.is_empty()
            && self.motions.is_empty()
            && self.path.is_empty()
            && self.wrist.is_empty()
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, cap: usize) {
    buf.push_back(value);
    while buf.len() > cap.max(1) {
        buf.pop_front();
    }
}

/// Most frequent entry; ties go to the label seen first.
fn majority<T: Copy + PartialEq>(buf: &VecDeque<T>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (i, candidate) in buf.iter().enumerate() {
        if buf.iter().take(i).any(|seen| seen == candidate) {
            continue;
        }
        let count = buf.iter().filter(|v| *v == candidate).count();
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((*candidate, count));
        }
    }
    best.map(|(v, _)| v)
}

// ── Classifier ─────────────────────────────────────────────

/// Stateful per-frame classifier for both hands.
pub struct GestureClassifier {
    pub config: ClassifierConfig,
    left: HandHistory,
    right: HandHistory,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            left: HandHistory::default(),
            right: HandHistory::default(),
        }
    }

    fn history_mut(&mut self, hand: Hand) -> &mut HandHistory {
        match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        }
    }

    /// Classify every hand in `frame`. Absent hands have their history
    /// cleared.
    pub fn classify(&mut self, frame: &TrackingFrame) -> FrameClassification {
        let mut result = FrameClassification {
            timestamp_s: frame.timestamp_s,
            ..Default::default()
        };

        for obs in &frame.hands {
            if result.hands[obs.hand.slot()].is_some() {
                warn!(
                    "Duplicate {} hand at t={:.3}s, keeping the first",
                    obs.hand.as_str(),
                    frame.timestamp_s
                );
                continue;
            }
            let classified = self.classify_hand(obs.hand, &obs.landmarks, obs.confidence);
            result.hands[obs.hand.slot()] = Some(classified);
        }

        for hand in Hand::ALL {
            if result.hands[hand.slot()].is_none() {
                let history = self.history_mut(hand);
                if !history.is_empty() {
                    debug!("{} hand lost, clearing history", hand.as_str());
                    history.reset();
                }
            }
        }

        result.combo = self.detect_combo(&result);
        result
    }

    /// Clear every buffer for both hands.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    fn classify_hand(
        &mut self,
        hand: Hand,
        landmarks: &LandmarkFrame,
        confidence: f32,
    ) -> HandClassification {
        let config = &self.config;
        let history = match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        };
        let fingers = finger_state(landmarks, &config.pose);
        let facing = palm_facing(landmarks, hand);
        let raw_pose = classify_pose(landmarks, &fingers, facing, &config.pose);

        // Static smoothing. An unresolved pose is not recorded.
        let static_pose = raw_pose.map(|pose| {
            push_bounded(&mut history.poses, pose, config.static_window);
            if history.poses.len() >= config.static_min_votes {
                majority(&history.poses).unwrap_or(pose)
            } else {
                pose
            }
        });

        // Motion runs regardless of the pose.
        push_bounded(
            &mut history.path,
            landmarks.xy(Landmark::MiddleTip),
            config.position_history,
        );
        let raw_motion = detect_motion(history.path.make_contiguous(), &config.motion);
        let mut motion = None;
        match raw_motion {
            Some(m) => {
                push_bounded(&mut history.motions, m, config.motion_window);
                if history.motions.len() >= config.motion_min_votes {
                    motion = majority(&history.motions);
                }
            }
            None if history.path.len() >= config.motion_clear_after => {
                history.motions.clear();
            }
            None => {}
        }

        // Velocity from the last two wrist positions.
        push_bounded(
            &mut history.wrist,
            landmarks.xy(Landmark::Wrist),
            config.velocity_window,
        );
        let n = history.wrist.len();
        let velocity = if n < 2 {
            0.0
        } else {
            distance_2d(history.wrist[n - 2], history.wrist[n - 1])
        };
        let is_stationary = velocity < config.stationary_threshold;

        HandClassification {
            hand,
            landmarks: *landmarks,
            static_pose,
            motion,
            extended_fingers: fingers.count(),
            pinch_distance: pinch_distance(landmarks),
            velocity,
            is_stationary,
            palm_facing: facing,
            confidence,
        }
    }

    fn detect_combo(&self, result: &FrameClassification) -> Option<String> {
        let left = result.hand(Hand::Left)?.static_pose?;
        let right = result.hand(Hand::Right)?.static_pose?;
        self.config
            .combos
            .iter()
            .find(|rule| rule.left == left && rule.right == right)
            .map(|rule| rule.id.clone())
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

// ── Tests ──────────────────────────────────────────────────
