//! Configuration for the Debate Orchestrator (spec.md §6.6).
//!
//! Two concerns live here, mirroring the teacher's split between
//! `settings.rs` (runtime caps/timeouts, layered via the `config` crate) and
//! `domain/personas.rs` (YAML-loaded domain data):
//!
//! - [`Settings`]: resource caps, timeouts, catalogue file paths, server and
//!   observability config, loaded layered (defaults -> env file -> env vars).
//! - [`PhilosopherCatalogue`] / [`StrategyConfig`]: the philosopher profiles
//!   and strategy catalogues read at startup (spec.md §3).

pub mod catalogue;
pub mod error;
pub mod settings;

pub use catalogue::{PhilosopherCatalogue, StrategyConfig};
pub use error::ConfigError;
pub use settings::{
    CapsConfig, CataloguePaths, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
    TimeoutsConfig, load_settings,
};
