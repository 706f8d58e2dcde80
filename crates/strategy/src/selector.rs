//! Attack/defense/followup strategy selection and the RAG-use decision
//! (spec.md §4.1). Grounded on the teacher's `RagTimingStrategy::should_prefetch`
//! (`agent/src/stage.rs`) for the threshold-decision shape, and
//! `rag/src/retriever.rs`'s weighted score combination for the
//! fit/score arithmetic.

use std::collections::HashMap;

use debate_core::{
    AttackDefenseMap, AxisVector, DefenseFollowupMap, Error, PhilosopherProfile, RagAxis, Result,
    StrategyCatalogue, StrategyEntry, StrategyId,
};

/// Information extracted from the opponent's immediately preceding
/// utterance, used to pick a defense or followup strategy (spec.md §4.1).
#[derive(Debug, Clone, Default)]
pub struct OpponentMoveInfo {
    pub inferred_strategy_id: Option<StrategyId>,
    pub rag_used_by_opponent: bool,
    pub opponent_text: String,
}

/// Explainable result of the RAG-use decision (spec.md §4.1: "the function
/// returns {use_rag, score, threshold, per-axis contributions} so the
/// decision is explainable and testable").
#[derive(Debug, Clone)]
pub struct RagDecision {
    pub use_rag: bool,
    pub score: f64,
    pub threshold: f64,
    pub contributions: HashMap<RagAxis, f64>,
}

pub const RAG_USE_THRESHOLD: f64 = 0.5;

/// Default blocklist window: a strategy already used against the same
/// target within the last N=2 attacks is blocked (spec.md §4.1).
pub const BLOCKLIST_WINDOW: usize = 2;

fn tie_break_pick<'a>(
    candidates: impl Iterator<Item = (&'a StrategyEntry, f64, f64)>,
) -> Option<&'a StrategyEntry> {
    // (entry, score, philosopher_weight); pick max score, ties broken by
    // lower strategy-id lexicographically, then by philosopher-weight
    // descending (spec.md §4.1 step 3).
    candidates
        .max_by(|(a_entry, a_score, a_weight), (b_entry, b_score, b_weight)| {
            a_score
                .partial_cmp(b_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b_entry.id.cmp(&a_entry.id))
                .then_with(|| a_weight.partial_cmp(b_weight).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(entry, _, _)| entry)
}

/// Attack-strategy selection (spec.md §4.1 steps 1-4).
pub fn select_attack_strategy(
    catalogue: &StrategyCatalogue,
    profile: &PhilosopherProfile,
    vulnerability: &AxisVector,
    blocked: &[StrategyId],
) -> Result<StrategyId> {
    if catalogue.attack.is_empty() {
        return Err(Error::StrategyEmpty("attack".to_string()));
    }

    let scored = |entry: &StrategyEntry| -> (f64, f64) {
        let fit = entry
            .rag_weights
            .as_ref()
            .map(|weights| {
                RagAxis::ALL.iter().map(|axis| weights.get(*axis) * vulnerability.get(*axis)).sum()
            })
            .unwrap_or(0.0);
        let weight = profile.attack_weights.get(&entry.id).copied().unwrap_or(0.0);
        (weight * (1.0 + fit), weight)
    };

    let unblocked: Vec<&StrategyEntry> =
        catalogue.attack.iter().filter(|e| !blocked.contains(&e.id)).collect();

    let pool: Vec<&StrategyEntry> = if unblocked.is_empty() {
        // All candidates blocked: relax the blocklist once (step 4).
        catalogue.attack.iter().collect()
    } else {
        unblocked
    };

    let picked = tie_break_pick(pool.iter().map(|e| {
        let (score, weight) = scored(e);
        (*e, score, weight)
    }));

    picked.map(|e| e.id.clone()).ok_or_else(|| Error::StrategyEmpty("attack".to_string()))
}

/// Defense-strategy selection (spec.md §4.1): candidate set restricted by
/// `attack_to_defense` when the attack strategy is known, else the full
/// defense catalogue.
pub fn select_defense_strategy(
    catalogue: &StrategyCatalogue,
    profile: &PhilosopherProfile,
    attack_to_defense: &AttackDefenseMap,
    attack_info: &OpponentMoveInfo,
) -> Result<StrategyId> {
    if catalogue.defense.is_empty() {
        return Err(Error::StrategyEmpty("defense".to_string()));
    }

    let candidate_ids: Option<&Vec<StrategyId>> = attack_info
        .inferred_strategy_id
        .as_ref()
        .and_then(|id| attack_to_defense.0.get(id));

    let pool: Vec<&StrategyEntry> = match candidate_ids {
        Some(ids) if !ids.is_empty() => {
            catalogue.defense.iter().filter(|e| ids.contains(&e.id)).collect()
        }
        _ => catalogue.defense.iter().collect(),
    };

    let picked = tie_break_pick(pool.iter().map(|e| {
        let weight = profile.defense_weights.get(&e.id).copied().unwrap_or(0.0);
        (*e, weight, weight)
    }));

    picked.map(|e| e.id.clone()).ok_or_else(|| Error::StrategyEmpty("defense".to_string()))
}

/// Followup-strategy selection, keyed off the defense-info of the
/// immediately preceding opposing utterance (spec.md §4.1, analogous to
/// defense selection).
pub fn select_followup_strategy(
    catalogue: &StrategyCatalogue,
    profile: &PhilosopherProfile,
    defense_to_followup: &DefenseFollowupMap,
    defense_info: &OpponentMoveInfo,
) -> Result<StrategyId> {
    if catalogue.followup.is_empty() {
        return Err(Error::StrategyEmpty("followup".to_string()));
    }

    let candidate_ids: Option<&Vec<StrategyId>> = defense_info
        .inferred_strategy_id
        .as_ref()
        .and_then(|id| defense_to_followup.0.get(id));

    let pool: Vec<&StrategyEntry> = match candidate_ids {
        Some(ids) if !ids.is_empty() => {
            catalogue.followup.iter().filter(|e| ids.contains(&e.id)).collect()
        }
        _ => catalogue.followup.iter().collect(),
    };

    let picked = tie_break_pick(pool.iter().map(|e| {
        let weight = profile.followup_weights.get(&e.id).copied().unwrap_or(0.0);
        (*e, weight, weight)
    }));

    picked.map(|e| e.id.clone()).ok_or_else(|| Error::StrategyEmpty("followup".to_string()))
}

/// Post-selection RAG-use decision (spec.md §4.1 / Scenario E4):
/// `rag_score = Σ_axis rag_catalogue[strategy][axis] × philosopher_rag_stat[axis]`,
/// `use_rag = rag_score >= threshold`.
pub fn decide_rag_use(strategy_weights: Option<&AxisVector>, philosopher_rag_stat: &AxisVector) -> RagDecision {
    let weights = strategy_weights.copied().unwrap_or(AxisVector::ZERO);
    let contributions = weights.contributions(philosopher_rag_stat);
    let score: f64 = contributions.values().sum();
    RagDecision { use_rag: score >= RAG_USE_THRESHOLD, score, threshold: RAG_USE_THRESHOLD, contributions }
}

/// Resolves a strategy id to its [`StrategyEntry`] in the catalogue,
/// returning `STRATEGY_UNKNOWN` when absent (spec.md §4.1 failure case).
pub fn lookup_attack<'a>(catalogue: &'a StrategyCatalogue, id: &str) -> Result<&'a StrategyEntry> {
    catalogue.find_attack(id).ok_or_else(|| Error::StrategyUnknown(id.to_string()))
}

pub fn lookup_defense<'a>(catalogue: &'a StrategyCatalogue, id: &str) -> Result<&'a StrategyEntry> {
    catalogue.find_defense(id).ok_or_else(|| Error::StrategyUnknown(id.to_string()))
}

pub fn lookup_followup<'a>(catalogue: &'a StrategyCatalogue, id: &str) -> Result<&'a StrategyEntry> {
    catalogue.find_followup(id).ok_or_else(|| Error::StrategyUnknown(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(data: f64, concept: f64, logic: f64, pragmatic: f64, rhetorical: f64) -> AxisVector {
        AxisVector {
            data_respect: data,
            conceptual_precision: concept,
            systematic_logic: logic,
            pragmatic_orientation: pragmatic,
            rhetorical_independence: rhetorical,
        }
    }

    fn profile_with_weights(
        attack: &[(&str, f64)],
        defense: &[(&str, f64)],
        followup: &[(&str, f64)],
    ) -> PhilosopherProfile {
        PhilosopherProfile {
            key: "kant".into(),
            display_name: "Immanuel Kant".into(),
            essence: "duty".into(),
            debate_style: "rigorous".into(),
            personality: "stern".into(),
            key_traits: vec![],
            representative_quote: "q".into(),
            attack_weights: attack.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            defense_weights: defense.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            followup_weights: followup.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            rag_affinity: 0.5,
            vulnerability_sensitivity: AxisVector::ZERO,
            rag_stat: axis(0.7, 0.9, 0.9, 0.3, 0.2),
        }
    }

    fn entry(id: &str, rag_weights: Option<AxisVector>) -> StrategyEntry {
        StrategyEntry { id: id.into(), description: "d".into(), stylistic_cue: "c".into(), rag_weights }
    }

    fn catalogue_with_attacks(entries: Vec<StrategyEntry>) -> StrategyCatalogue {
        StrategyCatalogue {
            attack: entries,
            defense: vec![entry("d1", None)],
            followup: vec![entry("f1", None)],
            default_attack_id: "fallback".into(),
            default_defense_id: "d1".into(),
            default_followup_id: "f1".into(),
        }
    }

    #[test]
    fn attack_selection_picks_highest_score() {
        let catalogue = catalogue_with_attacks(vec![
            entry("Framing_Shift", Some(axis(0.0, 0.1, 0.1, 0.0, 0.0))),
            entry("Conceptual_Undermining", Some(axis(0.1, 0.6, 0.3, 0.05, -0.2))),
        ]);
        let profile = profile_with_weights(
            &[("Framing_Shift", 0.3), ("Conceptual_Undermining", 0.7)],
            &[],
            &[],
        );
        let vulnerability = axis(0.2, 0.9, 0.5, 0.1, 0.1);
        let picked = select_attack_strategy(&catalogue, &profile, &vulnerability, &[]).unwrap();
        assert_eq!(picked, "Conceptual_Undermining");
    }

    #[test]
    fn blocked_strategy_is_excluded_unless_all_blocked() {
        let catalogue = catalogue_with_attacks(vec![
            entry("Framing_Shift", Some(axis(1.0, 0.0, 0.0, 0.0, 0.0))),
            entry("Conceptual_Undermining", Some(axis(0.0, 0.0, 0.0, 0.0, 0.0))),
        ]);
        let profile =
            profile_with_weights(&[("Framing_Shift", 0.9), ("Conceptual_Undermining", 0.1)], &[], &[]);
        let vulnerability = axis(1.0, 0.0, 0.0, 0.0, 0.0);

        // Framing_Shift would normally win; blocklist forces the other pick.
        let picked =
            select_attack_strategy(&catalogue, &profile, &vulnerability, &["Framing_Shift".to_string()])
                .unwrap();
        assert_eq!(picked, "Conceptual_Undermining");

        // Everything blocked -> blocklist relaxed, Framing_Shift wins again.
        let picked = select_attack_strategy(
            &catalogue,
            &profile,
            &vulnerability,
            &["Framing_Shift".to_string(), "Conceptual_Undermining".to_string()],
        )
        .unwrap();
        assert_eq!(picked, "Framing_Shift");
    }

    #[test]
    fn ties_break_by_lower_id_then_weight_descending() {
        let catalogue = catalogue_with_attacks(vec![
            entry("Zebra_Strategy", Some(axis(0.0, 0.0, 0.0, 0.0, 0.0))),
            entry("Alpha_Strategy", Some(axis(0.0, 0.0, 0.0, 0.0, 0.0))),
        ]);
        let profile = profile_with_weights(&[("Zebra_Strategy", 0.5), ("Alpha_Strategy", 0.5)], &[], &[]);
        let picked = select_attack_strategy(&catalogue, &profile, &AxisVector::ZERO, &[]).unwrap();
        assert_eq!(picked, "Alpha_Strategy");
    }

    #[test]
    fn rag_use_decision_matches_scenario_e4() {
        let weights = axis(0.1, 0.6, 0.3, 0.05, -0.2);
        let stat = axis(0.7, 0.9, 0.9, 0.3, 0.2);
        let decision = decide_rag_use(Some(&weights), &stat);
        assert!((decision.score - 0.855).abs() < 1e-9);
        assert!(decision.use_rag);
    }

    #[test]
    fn defense_selection_falls_back_to_full_catalogue_when_attack_unknown() {
        let catalogue = StrategyCatalogue {
            attack: vec![],
            defense: vec![entry("Rebut_Logic", None), entry("Reframe_Premise", None)],
            followup: vec![],
            default_attack_id: "a".into(),
            default_defense_id: "Rebut_Logic".into(),
            default_followup_id: "f".into(),
        };
        let profile =
            profile_with_weights(&[], &[("Rebut_Logic", 0.2), ("Reframe_Premise", 0.8)], &[]);
        let info = OpponentMoveInfo::default();
        let map = AttackDefenseMap::default();
        let picked = select_defense_strategy(&catalogue, &profile, &map, &info).unwrap();
        assert_eq!(picked, "Reframe_Premise");
    }

    #[test]
    fn empty_attack_catalogue_yields_strategy_empty() {
        let catalogue = catalogue_with_attacks(vec![]);
        let profile = profile_with_weights(&[], &[], &[]);
        let err = select_attack_strategy(&catalogue, &profile, &AxisVector::ZERO, &[]).unwrap_err();
        assert_eq!(err.kind(), "STRATEGY_EMPTY");
    }
}
