//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::SessionHandle;
use crate::game::SessionRunner;
use crate::util::time::MonotonicClock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionHandle,
}

impl AppState {
    /// Build the state plus the session task the caller must spawn
    pub fn new(config: Config) -> (Self, SessionRunner) {
        let config = Arc::new(config);

        let (runner, session) =
            SessionRunner::new(Arc::new(MonotonicClock::new()), config.tick_interval);

        (Self { config, session }, runner)
    }
}
