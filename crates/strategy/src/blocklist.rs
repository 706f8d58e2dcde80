//! Helpers for `RoomState::recent_strategies_against`, scoped per
//! (attacker, target-argument) pair per spec.md §9 Open Question 2.

use std::collections::VecDeque;

use debate_core::{RoomState, StrategyId};

use crate::selector::BLOCKLIST_WINDOW;

/// Strategies used by `attacker` against `target` within the last
/// [`BLOCKLIST_WINDOW`] attacks, oldest-first.
pub fn recent_against(state: &RoomState, attacker: &str, target: &str) -> Vec<StrategyId> {
    state
        .recent_strategies_against
        .get(&(attacker.to_string(), target.to_string()))
        .map(|deque| deque.iter().cloned().collect())
        .unwrap_or_default()
}

/// Records that `attacker` just used `strategy_id` against `target`,
/// trimming the window to [`BLOCKLIST_WINDOW`] entries.
pub fn record_attack(state: &mut RoomState, attacker: &str, target: &str, strategy_id: StrategyId) {
    let entry = state
        .recent_strategies_against
        .entry((attacker.to_string(), target.to_string()))
        .or_insert_with(VecDeque::new);
    entry.push_back(strategy_id);
    while entry.len() > BLOCKLIST_WINDOW {
        entry.pop_front();
    }
}
