//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the storage seams as trait objects (the event log sits behind the
//! sequencer), and the live session registry. Cloning is cheap; every field
//! is shared.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::services::sequencer::Sequencer;
use crate::services::session::SessionRegistry;
use crate::services::session_rows::SessionRows;
use crate::services::store::{BoardDirectory, EventStore, SessionLog};

#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<dyn BoardDirectory>,
    pub session_rows: SessionRows,
    pub sequencer: Sequencer,
    pub sessions: SessionRegistry,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        boards: Arc<dyn BoardDirectory>,
        session_log: Arc<dyn SessionLog>,
        config: ServerConfig,
    ) -> Self {
        Self {
            sequencer: Sequencer::new(store),
            sessions: SessionRegistry::new(config.session_idle),
            boards,
            session_rows: SessionRows::new(session_log),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Build state from one backend that implements every storage seam.
    #[must_use]
    pub fn with_backend<B>(backend: Arc<B>, config: ServerConfig) -> Self
    where
        B: EventStore + BoardDirectory + SessionLog + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend, config)
    }
}
