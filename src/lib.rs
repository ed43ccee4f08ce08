//! MeloMood core: mood-to-playlist orchestration.
//!
//! The crate detects a user's emotional state from a camera frame, free
//! text or a voice description, assembles a recommendation context
//! (platform, weather, time of day, feedback history) and asks an
//! inference provider for a matching playlist. Like/dislike feedback is
//! kept in a durable store and biases future recommendations.

pub mod classifier;
pub mod config;
pub mod context;
pub mod feedback;
pub mod inference;
pub mod model;
pub mod recommend;
pub mod session;
pub mod weather;
