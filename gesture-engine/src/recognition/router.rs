//! Gesture-to-command routing.
//!
//! Turns one frame's classification into command events: looks up
//! bindings, lets bound custom templates override built-in labels,
//! suppresses repeats of one-shot commands, scales tab-switch magnitude
//! by the other hand's held finger count, and streams companion commands.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::classifier::{FrameClassification, HandClassification};
use super::landmarks::{Hand, LandmarkFrame};
use super::template::TemplateMatcher;
use crate::events::{CommandEvent, HandScope, PointerMeta};
use crate::store::{Binding, GestureCatalog, Modifier, TemplateStore};

// ── Config ─────────────────────────────────────────────────

/// Two-hand multiplier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierConfig {
    pub enabled: bool,
    /// Continuous stationary time before the finger count locks.
    pub hold_duration_s: f64,
    /// Cap on the locked finger count.
    pub max_fingers: u8,
    /// Cap on the final magnitude.
    pub max_product: u32,
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hold_duration_s: 0.5,
            max_fingers: 5,
            max_product: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub multiplier: MultiplierConfig,
    /// Gestures whose magnitude follows the finger-count modifier.
    pub tab_switch_gestures: Vec<String>,
    /// Gesture -> command streamed every frame the gesture is active.
    pub companions: BTreeMap<String, String>,
    /// Landmark frames kept per hand for dynamic template matching.
    pub landmark_history: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            multiplier: MultiplierConfig::default(),
            tab_switch_gestures: vec!["SWIPE_LEFT".to_string(), "SWIPE_RIGHT".to_string()],
            companions: BTreeMap::from([("PEACE".to_string(), "cursor_move".to_string())]),
            landmark_history: 30,
        }
    }
}

// ── Multiplier ─────────────────────────────────────────────

/// Per-hand hold timer and locked finger count.
#[derive(Debug, Clone)]
pub struct MultiplierTracker {
    config: MultiplierConfig,
    hold_start: [Option<f64>; 2],
    locked: [Option<u8>; 2],
}

impl MultiplierTracker {
    pub fn new(config: MultiplierConfig) -> Self {
        Self {
            config,
            hold_start: [None; 2],
            locked: [None; 2],
        }
    }

    /// Feed one frame for a visible hand. Returns the locked value, if any.
    pub fn update(&mut self, hand: Hand, is_stationary: bool, fingers: u8, now_s: f64) -> Option<u8> {
        let slot = hand.slot();
        if !is_stationary {
            if self.locked[slot].is_some() {
                info!("Multiplier released: {} hand", hand.as_str());
            }
            self.hold_start[slot] = None;
            self.locked[slot] = None;
            return None;
        }

        let start = *self.hold_start[slot].get_or_insert(now_s);
        if self.locked[slot].is_none() && now_s - start >= self.config.hold_duration_s {
            let value = fingers.min(self.config.max_fingers);
            self.locked[slot] = Some(value);
            info!("Multiplier locked: {} hand -> {} fingers", hand.as_str(), value);
        }
        self.locked[slot]
    }

    pub fn locked(&self, hand: Hand) -> Option<u8> {
        self.locked[hand.slot()]
    }

    /// The other hand's locked value, 1 when none.
    pub fn for_other_hand(&self, hand: Hand) -> u32 {
        self.locked(hand.other()).map_or(1, u32::from)
    }

    pub fn clear_hand(&mut self, hand: Hand) {
        let slot = hand.slot();
        if self.locked[slot].take().is_some() {
            info!("Multiplier released: {} hand gone", hand.as_str());
        }
        self.hold_start[slot] = None;
    }

    pub fn clear(&mut self) {
        for hand in Hand::ALL {
            self.clear_hand(hand);
        }
    }
}

// ── Router ─────────────────────────────────────────────────

pub struct Router {
    pub config: RouterConfig,
    matcher: TemplateMatcher,
    multiplier: MultiplierTracker,
    /// Last resolved gesture per debounce slot (left, right, both).
    last_gesture: [Option<String>; 3],
    landmarks: [VecDeque<LandmarkFrame>; 2],
}

impl Router {
    pub fn new(config: RouterConfig, store: Arc<dyn TemplateStore>) -> Self {
        let multiplier = MultiplierTracker::new(config.multiplier.clone());
        Self {
            config,
            matcher: TemplateMatcher::new(store),
            multiplier,
            last_gesture: Default::default(),
            landmarks: Default::default(),
        }
    }

    pub fn multiplier(&self) -> &MultiplierTracker {
        &self.multiplier
    }

    /// Forget all debounce, multiplier and landmark state.
    pub fn reset(&mut self) {
        self.multiplier.clear();
        self.last_gesture = Default::default();
        for buf in &mut self.landmarks {
            buf.clear();
        }
    }

    /// Route one frame.
    pub fn route(&mut self, frame: &FrameClassification) -> Vec<CommandEvent> {
        let mut events = Vec::new();

        if frame.is_empty() {
            if self.last_gesture.iter().any(Option::is_some) {
                debug!("No hands, clearing router state");
            }
            self.reset();
            return events;
        }

        for hand in Hand::ALL {
            match frame.hand(hand) {
                Some(h) => {
                    let buf = &mut self.landmarks[hand.slot()];
                    buf.push_back(h.landmarks);
                    while buf.len() > self.config.landmark_history.max(1) {
                        buf.pop_front();
                    }
                    if self.config.multiplier.enabled {
                        self.multiplier.update(
                            hand,
                            h.is_stationary,
                            h.extended_fingers,
                            frame.timestamp_s,
                        );
                    }
                }
                None => {
                    self.multiplier.clear_hand(hand);
                    self.last_gesture[hand.slot()] = None;
                    self.landmarks[hand.slot()].clear();
                }
            }
        }

        let catalog = self.matcher.store().snapshot();

        if let Some(combo) = &frame.combo {
            if let Some(event) = self.resolve_combo(combo, &catalog, frame.timestamp_s) {
                events.push(event);
            }
            return events;
        }
        self.last_gesture[HandScope::Both.slot()] = None;

        for h in frame.visible() {
            self.resolve_hand(h, &catalog, frame.timestamp_s, &mut events);
        }
        events
    }

    fn resolve_combo(
        &mut self,
        combo: &str,
        catalog: &GestureCatalog,
        timestamp_s: f64,
    ) -> Option<CommandEvent> {
        let slot = HandScope::Both.slot();
        let previous = self.last_gesture[slot].replace(combo.to_string());
        let binding = catalog.binding(combo)?;
        if previous.as_deref() == Some(combo) && !binding.repeatable {
            return None;
        }
        debug!("Combo {} -> {}", combo, binding.command_id);
        Some(CommandEvent {
            command_id: binding.command_id,
            gesture_id: combo.to_string(),
            hand: HandScope::Both,
            magnitude: 1,
            repeatable: binding.repeatable,
            timestamp_s,
            meta: None,
        })
    }

    fn resolve_hand(
        &mut self,
        h: &HandClassification,
        catalog: &GestureCatalog,
        timestamp_s: f64,
        events: &mut Vec<CommandEvent>,
    ) {
        let slot = h.hand.slot();

        let mut resolved: Option<(String, Option<Binding>)> = h
            .gesture_id()
            .map(|g| (g.to_string(), catalog.binding(g)));

        // Templates are checked every frame, and win when they carry their
        // own binding.
        let template = if h.motion.is_some() {
            let seq: Vec<LandmarkFrame> = self.landmarks[slot].iter().copied().collect();
            self.matcher.match_dynamic(&seq)
        } else {
            self.matcher.match_static(&h.landmarks)
        };
        if let Some(m) = template {
            if let Some(binding) = catalog.binding(&m.template_id) {
                debug!(
                    "Template {} (score {:.4}) overrides {:?}",
                    m.template_id,
                    m.score,
                    h.gesture_id()
                );
                resolved = Some((m.template_id, Some(binding)));
            }
        }

        let Some((gesture_id, binding)) = resolved else {
            self.last_gesture[slot] = None;
            return;
        };
        let previous = self.last_gesture[slot].replace(gesture_id.clone());
        let Some(binding) = binding else {
            return;
        };

        let companion = self
            .config
            .companions
            .get(&gesture_id)
            .filter(|c| **c != binding.command_id)
            .cloned();
        let wants_meta = binding.command_id.starts_with("cursor")
            || self.config.companions.contains_key(&gesture_id);
        let meta = || PointerMeta {
            pinch_distance: h.pinch_distance,
            landmarks: h.landmarks,
        };

        let unchanged = previous.as_deref() == Some(gesture_id.as_str());
        if !unchanged || binding.repeatable {
            let magnitude = self.magnitude(h, &gesture_id, &binding);
            debug!(
                "{} hand: {} -> {} x{}",
                h.hand.as_str(),
                gesture_id,
                binding.command_id,
                magnitude
            );
            events.push(CommandEvent {
                command_id: binding.command_id.clone(),
                gesture_id: gesture_id.clone(),
                hand: h.hand.into(),
                magnitude,
                repeatable: binding.repeatable,
                timestamp_s,
                meta: wants_meta.then(meta),
            });
        }

        if let Some(command_id) = companion {
            events.push(CommandEvent {
                command_id,
                gesture_id,
                hand: h.hand.into(),
                magnitude: 1,
                repeatable: true,
                timestamp_s,
                meta: Some(meta()),
            });
        }
    }

    fn magnitude(&self, h: &HandClassification, gesture_id: &str, binding: &Binding) -> u32 {
        let is_tab_switch = self
            .config
            .tab_switch_gestures
            .iter()
            .any(|g| g == gesture_id);
        if !is_tab_switch || binding.modifier != Some(Modifier::FingerCount) {
            return 1;
        }
        let fingers = u32::from(h.extended_fingers.max(1));
        let other = self.multiplier.for_other_hand(h.hand);
        let magnitude = (fingers * other).min(self.config.multiplier.max_product).max(1);
        info!(
            "Tab swipe: {} hand, {} fingers x {} = {}",
            h.hand.as_str(),
            fingers,
            other,
            magnitude
        );
        magnitude
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::motion::MotionGesture;
    use crate::recognition::pose::{Finger, StaticPose};
    use crate::recognition::test_support::{hand_frame, FingerSet};
    use crate::store::{GestureTemplate, MemoryStore, TemplateKind, TemplateSample};

    fn make_hand(
        hand: Hand,
        pose: Option<StaticPose>,
        motion: Option<MotionGesture>,
        fingers: u8,
        stationary: bool,
    ) -> HandClassification {
        HandClassification {
            hand,
            landmarks: hand_frame(FingerSet::NONE, 0.0, 0.0),
            static_pose: pose,
            motion,
            extended_fingers: fingers,
            pinch_distance: 0.1,
            velocity: if stationary { 0.0 } else { 0.02 },
            is_stationary: stationary,
            palm_facing: true,
            confidence: 0.9,
        }
    }

    fn make_frame(t: f64, hands: Vec<HandClassification>) -> FrameClassification {
        let mut frame = FrameClassification {
            timestamp_s: t,
            ..Default::default()
        };
        for h in hands {
            let slot = h.hand.slot();
            frame.hands[slot] = Some(h);
        }
        frame
    }

    fn make_router() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(GestureCatalog::default()));
        (Router::new(RouterConfig::default(), store.clone()), store)
    }

    fn fist(hand: Hand) -> HandClassification {
        make_hand(hand, Some(StaticPose::Fist), None, 0, true)
    }

    #[test]
    fn test_one_shot_fires_once() {
        let (mut router, _) = make_router();
        let mut events = Vec::new();
        for i in 0..5 {
            events.extend(router.route(&make_frame(i as f64 * 0.05, vec![fist(Hand::Right)])));
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].command_id, "tab_close");
        assert_eq!(events[0].hand, HandScope::Right);
        assert_eq!(events[0].magnitude, 1);
    }

    #[test]
    fn test_repeatable_fires_every_frame() {
        let (mut router, store) = make_router();
        store.set_binding("FIST", "scroll_down").unwrap();
        let mut events = Vec::new();
        for i in 0..5 {
            events.extend(router.route(&make_frame(i as f64 * 0.05, vec![fist(Hand::Left)])));
        }
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| e.repeatable && e.command_id == "scroll_down"));
    }

    #[test]
    fn test_unbound_gesture_is_dropped() {
        let (mut router, _) = make_router();
        let palm = make_hand(Hand::Right, Some(StaticPose::Palm), None, 5, true);
        assert!(router.route(&make_frame(0.0, vec![palm])).is_empty());
    }

    #[test]
    fn test_multiplier_locks_at_hold_duration() {
        let mut tracker = MultiplierTracker::new(MultiplierConfig::default());
        assert_eq!(tracker.update(Hand::Left, true, 4, 0.0), None);
        assert_eq!(tracker.update(Hand::Left, true, 4, 0.25), None);
        assert_eq!(tracker.update(Hand::Left, true, 4, 0.5), Some(4));
        assert_eq!(tracker.for_other_hand(Hand::Right), 4);
        // Finger count changes after lock do not change the value.
        assert_eq!(tracker.update(Hand::Left, true, 2, 0.6), Some(4));
    }

    #[test]
    fn test_multiplier_movement_prevents_lock() {
        let mut tracker = MultiplierTracker::new(MultiplierConfig::default());
        tracker.update(Hand::Left, true, 3, 0.0);
        tracker.update(Hand::Left, false, 3, 0.3);
        assert_eq!(tracker.update(Hand::Left, true, 3, 0.5), None);
        assert_eq!(tracker.for_other_hand(Hand::Right), 1);
        assert_eq!(tracker.update(Hand::Left, true, 3, 1.0), Some(3));
    }

    #[test]
    fn test_multiplier_caps_fingers() {
        let config = MultiplierConfig {
            max_fingers: 3,
            ..Default::default()
        };
        let mut tracker = MultiplierTracker::new(config);
        tracker.update(Hand::Right, true, 5, 0.0);
        assert_eq!(tracker.update(Hand::Right, true, 5, 0.5), Some(3));
    }

    #[test]
    fn test_tab_switch_magnitude() {
        let (mut router, _) = make_router();
        let holder = || make_hand(Hand::Left, None, None, 4, true);
        router.route(&make_frame(0.0, vec![holder()]));
        router.route(&make_frame(0.5, vec![holder()]));
        assert_eq!(router.multiplier().locked(Hand::Left), Some(4));

        let swiper = make_hand(Hand::Right, None, Some(MotionGesture::SwipeRight), 3, false);
        let events = router.route(&make_frame(0.55, vec![holder(), swiper]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].command_id, "tab_switch_right");
        assert_eq!(events[0].magnitude, 12);
    }

    #[test]
    fn test_magnitude_caps_at_max_product() {
        let (mut router, _) = make_router();
        router.config.multiplier.max_product = 10;
        router.multiplier = MultiplierTracker::new(router.config.multiplier.clone());
        let holder = || make_hand(Hand::Right, None, None, 5, true);
        router.route(&make_frame(0.0, vec![holder()]));
        router.route(&make_frame(1.0, vec![holder()]));
        let swiper = make_hand(Hand::Left, None, Some(MotionGesture::SwipeLeft), 5, false);
        let events = router.route(&make_frame(1.05, vec![swiper, holder()]));
        assert_eq!(events[0].magnitude, 10);
    }

    #[test]
    fn test_swipe_without_multiplier_uses_finger_count() {
        let (mut router, _) = make_router();
        let swiper = make_hand(Hand::Right, None, Some(MotionGesture::SwipeLeft), 0, false);
        let events = router.route(&make_frame(0.0, vec![swiper]));
        assert_eq!(events[0].command_id, "tab_switch_left");
        assert_eq!(events[0].magnitude, 1);
    }

    #[test]
    fn test_no_hands_resets_state() {
        let (mut router, _) = make_router();
        let thumbs = || make_hand(Hand::Left, Some(StaticPose::ThumbsUp), None, 1, true);
        let both = |t| make_frame(t, vec![thumbs(), fist(Hand::Right)]);

        assert_eq!(router.route(&both(0.0)).len(), 2);
        assert_eq!(router.route(&both(0.6)).len(), 0);
        assert_eq!(router.multiplier().locked(Hand::Left), Some(1));

        assert!(router.route(&make_frame(0.65, vec![])).is_empty());
        assert_eq!(router.multiplier().locked(Hand::Left), None);
        assert_eq!(router.route(&both(0.7)).len(), 2);
    }

    #[test]
    fn test_absent_hand_resets_its_debounce() {
        let (mut router, _) = make_router();
        let palm = || make_hand(Hand::Left, Some(StaticPose::Palm), None, 5, true);
        assert_eq!(router.route(&make_frame(0.0, vec![fist(Hand::Right)])).len(), 1);
        assert!(router.route(&make_frame(0.05, vec![palm()])).is_empty());
        assert_eq!(router.route(&make_frame(0.1, vec![fist(Hand::Right)])).len(), 1);
    }

    #[test]
    fn test_static_to_dynamic_transition() {
        let (mut router, _) = make_router();
        let swipe = || make_hand(Hand::Right, Some(StaticPose::Fist), Some(MotionGesture::SwipeRight), 0, false);
        let frames = vec![
            make_frame(0.0, vec![fist(Hand::Right)]),
            make_frame(0.05, vec![fist(Hand::Right)]),
            make_frame(0.10, vec![swipe()]),
            make_frame(0.15, vec![swipe()]),
            make_frame(0.20, vec![fist(Hand::Right)]),
        ];
        let commands: Vec<String> = frames
            .iter()
            .flat_map(|f| router.route(f))
            .map(|e| e.command_id)
            .collect();
        assert_eq!(commands, vec!["tab_close", "tab_switch_right", "tab_close"]);
    }

    #[test]
    fn test_combo_is_exclusive_and_debounced() {
        let (mut router, store) = make_router();
        store.set_binding("TWO_FISTS", "window_minimize").unwrap();
        let combo = |t| {
            let mut f = make_frame(t, vec![fist(Hand::Left), fist(Hand::Right)]);
            f.combo = Some("TWO_FISTS".to_string());
            f
        };
        let events = router.route(&combo(0.0));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].hand, HandScope::Both);
        assert_eq!(events[0].command_id, "window_minimize");
        assert!(router.route(&combo(0.05)).is_empty());

        // Combo released: per-hand gestures resume, and the combo fires again later.
        let events = router.route(&make_frame(0.1, vec![fist(Hand::Left)]));
        assert_eq!(events.len(), 1);
        assert_eq!(router.route(&combo(0.15)).len(), 1);
    }

    #[test]
    fn test_companion_streams_every_frame() {
        let (mut router, _) = make_router();
        let peace = || make_hand(Hand::Right, Some(StaticPose::Peace), None, 2, true);
        let first = router.route(&make_frame(0.0, vec![peace()]));
        let ids: Vec<&str> = first.iter().map(|e| e.command_id.as_str()).collect();
        assert_eq!(ids, vec!["cursor_activate", "cursor_move"]);
        assert!(first.iter().all(|e| e.meta.is_some()));

        for i in 1..4 {
            let events = router.route(&make_frame(i as f64 * 0.05, vec![peace()]));
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].command_id, "cursor_move");
            assert!(events[0].repeatable);
            assert_eq!(events[0].gesture_id, "PEACE");
        }
    }

    #[test]
    fn test_bound_template_overrides_builtin() {
        let (mut router, store) = make_router();
        let shape = hand_frame(FingerSet::of(&[Finger::Middle, Finger::Ring]), 0.0, 0.0);
        let template = GestureTemplate::new(
            "rock",
            TemplateKind::Static,
            vec![TemplateSample::new(vec![shape], None)],
        );
        store.save_template(template).unwrap();

        let mut hand = fist(Hand::Right);
        hand.landmarks = shape;

        // Unbound template: built-in binding stands.
        let events = router.route(&make_frame(0.0, vec![hand.clone()]));
        assert_eq!(events[0].gesture_id, "FIST");

        store.set_binding("rock", "scroll_up").unwrap();
        let events = router.route(&make_frame(0.05, vec![hand.clone()]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].gesture_id, "rock");
        assert_eq!(events[0].command_id, "scroll_up");

        // Matched even when no built-in label resolved.
        hand.static_pose = None;
        let events = router.route(&make_frame(0.1, vec![hand]));
        assert_eq!(events[0].gesture_id, "rock");
    }

    #[test]
    fn test_bound_dynamic_template_overrides_swipe() {
        let (_, store) = make_router();
        let slide: Vec<LandmarkFrame> = (0..20)
            .map(|i| hand_frame(FingerSet::NONE, 0.01 * i as f32, 0.0))
            .collect();
        let template = GestureTemplate::new(
            "my_slide",
            TemplateKind::Dynamic,
            vec![TemplateSample::new(slide.clone(), None)],
        );
        store.save_template(template).unwrap();

        let run = |router: &mut Router| -> Vec<(String, String)> {
            let mut out = Vec::new();
            for (i, landmarks) in slide.iter().enumerate() {
                let motion = (i >= 15).then_some(MotionGesture::SwipeRight);
                let mut hand = make_hand(Hand::Right, Some(StaticPose::Fist), motion, 0, false);
                hand.landmarks = *landmarks;
                for e in router.route(&make_frame(i as f64 * 0.05, vec![hand])) {
                    out.push((e.gesture_id, e.command_id));
                }
            }
            out
        };
        let pair = |g: &str, c: &str| (g.to_string(), c.to_string());

        // Unbound: the built-in swipe stands.
        let mut router = Router::new(RouterConfig::default(), store.clone());
        assert_eq!(
            run(&mut router),
            vec![pair("FIST", "tab_close"), pair("SWIPE_RIGHT", "tab_switch_right")]
        );

        store.set_binding("my_slide", "window_maximize").unwrap();
        let mut router = Router::new(RouterConfig::default(), store.clone());
        assert_eq!(
            run(&mut router),
            vec![pair("FIST", "tab_close"), pair("my_slide", "window_maximize")]
        );
    }

    #[test]
    fn test_router_config_json() {
        let config: RouterConfig =
            serde_json::from_str(r#"{"multiplier": {"hold_duration_s": 1.0}}"#).unwrap();
        assert_eq!(config.multiplier.hold_duration_s, 1.0);
        assert_eq!(config.multiplier.max_product, 25);
        assert_eq!(config.companions.get("PEACE").map(String::as_str), Some("cursor_move"));
    }
}
