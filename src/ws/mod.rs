//! WebSocket gateway: wire types and the per-connection handler

pub mod handler;
pub mod protocol;
