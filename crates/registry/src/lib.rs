//! Room Registry, Event Bus, and the per-room orchestration task (spec.md
//! §4.6-§4.8): the layer that ties the Scheduler, Strategy Selector,
//! Argument Analyzer, RAG Gateway, and Argument Builder together behind one
//! room-control API, and the only layer above `debate-core` that actually
//! spawns tasks.

pub mod actor;
pub mod api;
pub mod deps;
pub mod events;
pub mod registry;
pub mod turn_runner;

pub use actor::{RoomHandle, RoomTimeouts};
pub use deps::{Deps, ModelPlan};
pub use events::{RoomEvent, RoomEventBus, RoomEventReceiver};
pub use registry::Registry;
