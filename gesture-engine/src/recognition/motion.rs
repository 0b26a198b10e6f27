//! Motion gestures from a fingertip path.
//!
//! A swipe is a long, mostly straight path; a wave is a horizontal
//! oscillation. Both are evaluated on the raw (x, y) history of one
//! landmark, oldest point first.

use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Gesture labels ─────────────────────────────────────────

/// Built-in motion labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionGesture {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    Wave,
}

impl MotionGesture {
    pub const ALL: [MotionGesture; 5] = [
        Self::SwipeLeft,
        Self::SwipeRight,
        Self::SwipeUp,
        Self::SwipeDown,
        Self::Wave,
    ];

    /// Gesture identifier used in bindings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwipeLeft => "SWIPE_LEFT",
            Self::SwipeRight => "SWIPE_RIGHT",
            Self::SwipeUp => "SWIPE_UP",
            Self::SwipeDown => "SWIPE_DOWN",
            Self::Wave => "WAVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == s)
    }
}

// ── Config ─────────────────────────────────────────────────

/// Thresholds for swipe and wave detection, in normalized image units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Minimum path length (points) before a swipe is considered.
    pub swipe_min_points: usize,
    /// Minimum first-to-last displacement.
    pub swipe_min_displacement: f32,
    /// Minimum displacement / path-length ratio.
    pub swipe_min_straightness: f32,
    /// Minimum path length (points) before a wave is considered.
    pub wave_min_points: usize,
    /// Minimum number of local x extrema.
    pub wave_min_extrema: usize,
    /// Minimum population variance of x.
    pub wave_min_variance: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            swipe_min_points: 15,
            swipe_min_displacement: 0.12,
            swipe_min_straightness: 0.65,
            wave_min_points: 18,
            wave_min_extrema: 4,
            wave_min_variance: 0.004,
        }
    }
}

// ── Detection ──────────────────────────────────────────────

/// Classify a path. Swipes are checked before waves.
pub fn detect_motion(path: &[[f32; 2]], config: &MotionConfig) -> Option<MotionGesture> {
    if path.len() < config.swipe_min_points {
        return None;
    }

    if let Some(swipe) = detect_swipe(path, config) {
        return Some(swipe);
    }

    if path.len() >= config.wave_min_points && is_wave(path, config) {
        debug!("Wave detected over {} points", path.len());
        return Some(MotionGesture::Wave);
    }

    None
}

fn detect_swipe(path: &[[f32; 2]], config: &MotionConfig) -> Option<MotionGesture> {
    let (first, last) = (path.first()?, path.last()?);
    let dx = last[0] - first[0];
    let dy = last[1] - first[1];
    let net = (dx * dx + dy * dy).sqrt();
    let length: f32 = path
        .windows(2)
        .map(|w| ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt())
        .sum();
    let straightness = net / (length + 1e-6);

    if net <= config.swipe_min_displacement || straightness <= config.swipe_min_straightness {
        return None;
    }

    // Image coordinates: positive y points down.
    let angle = dy.atan2(dx).to_degrees();
    let direction = if (-45.0..45.0).contains(&angle) {
        MotionGesture::SwipeRight
    } else if (45.0..135.0).contains(&angle) {
        MotionGesture::SwipeDown
    } else if angle.abs() >= 135.0 {
        MotionGesture::SwipeLeft
    } else {
        MotionGesture::SwipeUp
    };
    debug!(
        "Swipe detected: {} (net={:.3}, straightness={:.2})",
        direction.as_str(),
        net,
        straightness
    );
    Some(direction)
}

fn is_wave(path: &[[f32; 2]], config: &MotionConfig) -> bool {
    let xs: Vec<f32> = path.iter().map(|p| p[0]).collect();
    let extrema = xs
        .windows(3)
        .filter(|w| (w[1] > w[0] && w[1] > w[2]) || (w[1] < w[0] && w[1] < w[2]))
        .count();
    if extrema < config.wave_min_extrema {
        return false;
    }
    let n = xs.len() as f32;
    let mean = xs.iter().sum::<f32>() / n;
    let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
    variance > config.wave_min_variance
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, step: [f32; 2]) -> Vec<[f32; 2]> {
        (0..n)
            .map(|i| [0.5 + step[0] * i as f32, 0.5 + step[1] * i as f32])
            .collect()
    }

    fn wave(n: usize) -> Vec<[f32; 2]> {
        const OFFSETS: [f32; 4] = [0.0, 0.1, 0.0, -0.1];
        (0..n).map(|i| [0.5 + OFFSETS[i % 4], 0.5]).collect()
    }

    #[test]
    fn test_too_short_path_is_ignored() {
        let config = MotionConfig::default();
        assert_eq!(detect_motion(&line(14, [0.02, 0.0]), &config), None);
    }

    #[test]
    fn test_swipe_directions() {
        let config = MotionConfig::default();
        assert_eq!(
            detect_motion(&line(15, [0.01, 0.0]), &config),
            Some(MotionGesture::SwipeRight)
        );
        assert_eq!(
            detect_motion(&line(15, [-0.01, 0.0]), &config),
            Some(MotionGesture::SwipeLeft)
        );
        assert_eq!(
            detect_motion(&line(15, [0.0, 0.01]), &config),
            Some(MotionGesture::SwipeDown)
        );
        assert_eq!(
            detect_motion(&line(15, [0.0, -0.01]), &config),
            Some(MotionGesture::SwipeUp)
        );
    }

    #[test]
    fn test_short_displacement_is_not_a_swipe() {
        let config = MotionConfig::default();
        // 14 steps of 0.008 = 0.112 < 0.12
        assert_eq!(detect_motion(&line(15, [0.008, 0.0]), &config), None);
    }

    #[test]
    fn test_crooked_path_is_not_a_swipe() {
        let config = MotionConfig::default();
        let mut path = line(15, [0.01, 0.0]);
        // Zig-zag in y triples the path length.
        for (i, p) in path.iter_mut().enumerate() {
            if i % 2 == 1 {
                p[1] += 0.03;
            }
        }
        assert_eq!(detect_motion(&path, &config), None);
    }

    #[test]
    fn test_wave_detection() {
        let config = MotionConfig::default();
        assert_eq!(detect_motion(&wave(17), &config), None);
        assert_eq!(detect_motion(&wave(18), &config), Some(MotionGesture::Wave));
        assert_eq!(detect_motion(&wave(25), &config), Some(MotionGesture::Wave));
    }

    #[test]
    fn test_small_oscillation_is_not_a_wave() {
        let config = MotionConfig::default();
        let path: Vec<[f32; 2]> = wave(25)
            .into_iter()
            .map(|p| [0.5 + (p[0] - 0.5) * 0.2, p[1]])
            .collect();
        assert_eq!(detect_motion(&path, &config), None);
    }

    #[test]
    fn test_motion_string_roundtrip() {
        for m in MotionGesture::ALL {
            assert_eq!(MotionGesture::from_str(m.as_str()), Some(m));
        }
        assert_eq!(
            serde_json::to_string(&MotionGesture::SwipeLeft).unwrap(),
            "\"SWIPE_LEFT\""
        );
    }
}
