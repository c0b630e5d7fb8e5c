//! HTTP surface: health, websocket upgrade and optional static files

pub mod routes;

pub use routes::build_router;
