//! Similarity matching against user-recorded templates.
//!
//! Live and stored frames are flattened to 63 values and scaled to unit
//! length, so matching ignores hand size and distance from the camera.
//! Static templates compare one frame by Euclidean distance; dynamic
//! templates align frame sequences with dynamic time warping.

use std::sync::Arc;

use tracing::debug;

use super::landmarks::{LandmarkFrame, FLAT_LEN};
use crate::store::{GestureTemplate, TemplateKind, TemplateStore};

/// A flattened, unit-length landmark frame.
pub type FeatureVec = [f32; FLAT_LEN];

/// Flatten and divide by the L2 norm (plus a small epsilon).
pub fn normalize(frame: &LandmarkFrame) -> FeatureVec {
    let mut v = frame.flatten();
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let scale = 1.0 / (norm + 1e-6);
    for x in v.iter_mut() {
        *x *= scale;
    }
    v
}

pub fn euclidean(a: &FeatureVec, b: &FeatureVec) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Dynamic time warping distance divided by `n + m`. `None` when either
/// sequence is empty.
pub fn dtw_distance(a: &[FeatureVec], b: &[FeatureVec]) -> Option<f32> {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return None;
    }

    // Row-major n x m cumulative cost.
    let mut cost = vec![0.0f32; n * m];
    let at = |i: usize, j: usize| i * m + j;

    cost[0] = euclidean(&a[0], &b[0]);
    for i in 1..n {
        cost[at(i, 0)] = cost[at(i - 1, 0)] + euclidean(&a[i], &b[0]);
    }
    for j in 1..m {
        cost[at(0, j)] = cost[at(0, j - 1)] + euclidean(&a[0], &b[j]);
    }
    for i in 1..n {
        for j in 1..m {
            let best = cost[at(i - 1, j)]
                .min(cost[at(i, j - 1)])
                .min(cost[at(i - 1, j - 1)]);
            cost[at(i, j)] = euclidean(&a[i], &b[j]) + best;
        }
    }

    Some(cost[at(n - 1, m - 1)] / (n + m) as f32)
}

/// The winning template and its mean sample distance.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    pub template_id: String,
    pub score: f32,
}

/// Matches live input against the enabled templates of a store.
///
/// Every call reads a fresh snapshot, so the store may be replaced
/// between (or during) calls.
pub struct TemplateMatcher {
    store: Arc<dyn TemplateStore>,
    /// Live sequences shorter than this are never matched.
    pub min_dynamic_frames: usize,
}

impl TemplateMatcher {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self {
            store,
            min_dynamic_frames: 3,
        }
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// Best static template for a single live frame.
    pub fn match_static(&self, live: &LandmarkFrame) -> Option<TemplateMatch> {
        let live = normalize(live);
        self.best_match(TemplateKind::Static, |template| {
            mean(template.samples.iter().filter_map(|s| {
                s.frames.first().map(|f| euclidean(&live, &normalize(f)))
            }))
        })
    }

    /// Best dynamic template for a live frame sequence, oldest first.
    pub fn match_dynamic(&self, live: &[LandmarkFrame]) -> Option<TemplateMatch> {
        if live.len() < self.min_dynamic_frames {
            return None;
        }
        let live: Vec<FeatureVec> = live.iter().map(normalize).collect();
        self.best_match(TemplateKind::Dynamic, |template| {
            mean(template.samples.iter().filter_map(|s| {
                let stored: Vec<FeatureVec> = s.frames.iter().map(normalize).collect();
                dtw_distance(&live, &stored)
            }))
        })
    }

    fn best_match(
        &self,
        kind: TemplateKind,
        score: impl Fn(&GestureTemplate) -> Option<f32>,
    ) -> Option<TemplateMatch> {
        let catalog = self.store.snapshot();
        let mut best: Option<TemplateMatch> = None;
        for template in catalog.templates() {
            if !template.enabled || template.kind != kind {
                continue;
            }
            let Some(mean_score) = score(template) else {
                continue;
            };
            debug!(
                "Template {}: mean={:.4} threshold={}",
                template.id, mean_score, template.match_threshold
            );
            if mean_score < template.match_threshold
                && best.as_ref().map_or(true, |b| mean_score < b.score)
            {
                best = Some(TemplateMatch {
                    template_id: template.id.clone(),
                    score: mean_score,
                });
            }
        }
        best
    }
}

fn mean(scores: impl Iterator<Item = f32>) -> Option<f32> {
    let (sum, count) = scores.fold((0.0f32, 0usize), |(s, c), x| (s + x, c + 1));
    (count > 0).then(|| sum / count as f32)
}

// ── Tests ──────────────────────────────────────────────────
