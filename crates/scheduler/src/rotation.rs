//! Speaker ordering for each stage (spec.md §4.6).

use debate_core::{DebateRoom, Side, Stage};

/// The fixed `[pro1, con1, pro2, con2, ...]` rotation used throughout
/// `InteractiveArgument`, built once at room creation. With a single
/// participant per side this degenerates to plain alternation (spec.md §8
/// boundary behavior), since `pro1`/`con1` simply repeat every other slot.
pub fn build_interactive_rotation(room: &DebateRoom) -> Vec<String> {
    let pro: Vec<&str> = room.pro_participants().into_iter().map(|p| p.id.as_str()).collect();
    let con: Vec<&str> = room.con_participants().into_iter().map(|p| p.id.as_str()).collect();
    let mut rotation = Vec::with_capacity(pro.len() + con.len());
    let longest = pro.len().max(con.len());
    for i in 0..longest {
        if let Some(id) = pro.get(i) {
            rotation.push((*id).to_string());
        }
        if let Some(id) = con.get(i) {
            rotation.push((*id).to_string());
        }
    }
    rotation
}

/// Eligible speaker order for an opening/conclusion stage, in configured
/// (participant-list) order.
pub fn eligible_for_stage(room: &DebateRoom, stage: Stage) -> Vec<String> {
    let side = match stage {
        Stage::ProOpening | Stage::ProConclusion => Some(Side::Pro),
        Stage::ConOpening | Stage::ConConclusion => Some(Side::Con),
        _ => None,
    };
    match side {
        Some(Side::Pro) => room.pro_participants().into_iter().map(|p| p.id.clone()).collect(),
        Some(Side::Con) => room.con_participants().into_iter().map(|p| p.id.clone()).collect(),
        None => vec![],
    }
}
