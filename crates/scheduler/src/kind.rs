//! `kind_hint` derivation for `InteractiveArgument` turns (spec.md §4.6):
//! "first interactive turn for a speaker = attack; a speaker responding to
//! a just-previous opponent utterance = defense; a speaker immediately
//! following their own prior turn and the opponent's reply = followup."
//!
//! The three clauses read as ambiguous in isolation (both defense and
//! followup describe "responding to the just-previous opponent
//! utterance"); the distinguishing signal is what kind that opponent
//! utterance itself was. Resolved here as: no prior interactive utterance
//! at all -> attack; immediately-preceding opponent utterance was a
//! defense -> followup (pressing an advantage after they replied); anything
//! else (attack or followup) -> defense (responding to their attack/push).

use debate_core::{DebateRoom, Side, UtteranceKind};

/// Determines the kind for the next interactive-phase utterance by the
/// given side, based on the most recent attack/defense/followup utterance
/// in the room's history (moderator summaries are skipped).
pub fn determine_interactive_kind(room: &DebateRoom, speaker_side: Side) -> UtteranceKind {
    let last_interactive = room.speaking_history.iter().rev().find(|u| {
        matches!(u.kind, UtteranceKind::Attack | UtteranceKind::Defense | UtteranceKind::Followup)
    });

    let Some(last) = last_interactive else {
        return UtteranceKind::Attack;
    };

    if last.role.side() == speaker_side {
        // Opponent hasn't replied yet to our own immediately-preceding
        // turn; this should not arise under a strict alternating rotation,
        // but fall back to attack rather than panic.
        return UtteranceKind::Attack;
    }

    match last.kind {
        UtteranceKind::Defense => UtteranceKind::Followup,
        _ => UtteranceKind::Defense,
    }
}
