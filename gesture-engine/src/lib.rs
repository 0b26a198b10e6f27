//! Hand-gesture recognition engine.
//!
//! Turns a stream of 21-point hand landmark frames into debounced
//! application commands, and lets users record their own gestures.

pub mod config;
pub mod dispatch;
pub mod events;
pub mod recognition;
pub mod store;

pub use config::EngineConfig;
pub use dispatch::Engine;
