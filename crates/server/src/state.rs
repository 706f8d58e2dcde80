//! Application State
//!
//! Shared state across all handlers. Grounded on the teacher's `AppState`
//! (`server/src/state.rs`): a small `Clone` struct of `Arc`s handed to every
//! axum handler via `State<AppState>`, with the hot-reloadable `Settings`
//! behind a `parking_lot::RwLock` the same way.

use std::sync::Arc;

use debate_config::{load_settings, Settings};
use debate_registry::Registry;
use parking_lot::RwLock;

#[derive(Clone)]
pub struct AppState {
    /// Hot-reloadable settings (spec.md §6.6 config-reload semantics).
    pub config: Arc<RwLock<Settings>>,
    pub registry: Arc<Registry>,
    env: Option<String>,
}

impl AppState {
    pub fn new(config: Settings, registry: Arc<Registry>, env: Option<String>) -> Self {
        Self { config: Arc::new(RwLock::new(config)), registry, env }
    }

    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }

    /// Reloads configuration from disk, the way the teacher's
    /// `AppState::reload_config` does. Caps/timeouts already baked into a
    /// running `Registry` are not retroactively changed — a reload only
    /// takes effect on process restart, same limitation as the teacher's.
    pub fn reload_config(&self) -> Result<(), String> {
        let new_config = load_settings(self.env.as_deref()).map_err(|e| format!("failed to reload config: {e}"))?;
        *self.config.write() = new_config;
        tracing::info!("configuration reloaded successfully");
        Ok(())
    }
}
