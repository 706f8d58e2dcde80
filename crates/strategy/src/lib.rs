//! Strategy Selector (spec.md §4.1): picks exactly one strategy per turn
//! and decides whether retrieval is worth its cost.

pub mod blocklist;
pub mod selector;

pub use blocklist::{record_attack, recent_against};
pub use selector::{
    decide_rag_use, lookup_attack, lookup_defense, lookup_followup, select_attack_strategy,
    select_defense_strategy, select_followup_strategy, OpponentMoveInfo, RagDecision,
    BLOCKLIST_WINDOW, RAG_USE_THRESHOLD,
};
