//! Turn Scheduler & State Machine (spec.md §4.6): holds per-room debate
//! state (stage, speaking history, turn cursor) and decides the next
//! speaker plus the turn kind.
//!
//! Grounded on the teacher's `ConversationFSM` trait shape
//! (`core/src/traits/fsm.rs`: state/transition/checkpoint) for the overall
//! state-machine discipline, and `StageManager` (`agent/src/stage.rs`:
//! `valid_transitions`, cursor-based turn counting) for the concrete
//! transition-table style. Unlike the teacher's event-driven FSM, turns here
//! are driven purely by "an utterance was appended" — there is no
//! `ConversationEvent` catalogue to re-derive, only append + advance.
//!
//! This crate performs no I/O: it mutates `DebateRoom` fields in memory and
//! returns plain data. The room task that actually calls the LLM/RAG
//! gateways and the Event Bus lives in `debate-registry`, which is the
//! layer that owns the lock around each room (spec.md §3: "all mutation of
//! room fields happens through the Scheduler under the room's lock").

pub mod append;
pub mod kind;
pub mod rotation;
pub mod target;
pub mod transitions;
pub mod turn;
pub mod user_turn;

pub use append::append_utterance;
pub use kind::determine_interactive_kind;
pub use rotation::{build_interactive_rotation, eligible_for_stage};
pub use target::select_target_argument;
pub use transitions::{is_forward_transition, next_stage_after};
pub use turn::next_turn;
pub use user_turn::{begin_awaiting_user, expire_user_turn, submit_user_message};
