//! Recognition pipeline: landmarks in, gestures and recordings out.
//!
//! - `classifier`: per-hand pose and motion labels with smoothing
//! - `template`: matching against user-recorded templates
//! - `router`: gesture-to-command decisions
//! - `recorder`: guided capture of new templates

pub mod landmarks;
pub mod pose;
pub mod motion;
pub mod classifier;
pub mod template;
pub mod router;
pub mod recorder;

#[doc(hidden)]
pub mod test_support;
