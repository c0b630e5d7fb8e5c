//! Duel Server - authoritative two-player fighting game server
//!
//! The session task owns both fighters and runs the fixed-rate tick:
//! - input normalization and gesture (dash/backflip) detection on arrival
//! - physics integration and hit resolution every tick
//! - state snapshots broadcast to every connected client
//!
//! Connections reach it over WebSocket at `/ws`.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;

pub use app::AppState;
pub use config::Config;
pub use http::build_router;
