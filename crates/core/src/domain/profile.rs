use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type StrategyId = String;
pub type ParticipantId = String;

/// The five named axes a philosopher's retrieval-affinity and a strategy's
/// retrieval weight are both expressed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagAxis {
    DataRespect,
    ConceptualPrecision,
    SystematicLogic,
    PragmaticOrientation,
    RhetoricalIndependence,
}

impl RagAxis {
    pub const ALL: [RagAxis; 5] = [
        RagAxis::DataRespect,
        RagAxis::ConceptualPrecision,
        RagAxis::SystematicLogic,
        RagAxis::PragmaticOrientation,
        RagAxis::RhetoricalIndependence,
    ];
}

/// A value over all five [`RagAxis`] variants, stored densely for cheap
/// dot-products in the strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisVector {
    pub data_respect: f64,
    pub conceptual_precision: f64,
    pub systematic_logic: f64,
    pub pragmatic_orientation: f64,
    pub rhetorical_independence: f64,
}

impl AxisVector {
    pub const ZERO: AxisVector = AxisVector {
        data_respect: 0.0,
        conceptual_precision: 0.0,
        systematic_logic: 0.0,
        pragmatic_orientation: 0.0,
        rhetorical_independence: 0.0,
    };

    pub fn get(&self, axis: RagAxis) -> f64 {
        match axis {
            RagAxis::DataRespect => self.data_respect,
            RagAxis::ConceptualPrecision => self.conceptual_precision,
            RagAxis::SystematicLogic => self.systematic_logic,
            RagAxis::PragmaticOrientation => self.pragmatic_orientation,
            RagAxis::RhetoricalIndependence => self.rhetorical_independence,
        }
    }

    pub fn dot(&self, other: &AxisVector) -> f64 {
        RagAxis::ALL.iter().map(|a| self.get(*a) * other.get(*a)).sum()
    }

    /// Per-axis products, useful for the explainable-contributions output the
    /// RAG-use decision must return.
    pub fn contributions(&self, other: &AxisVector) -> HashMap<RagAxis, f64> {
        RagAxis::ALL
            .iter()
            .map(|a| (*a, self.get(*a) * other.get(*a)))
            .collect()
    }
}

/// Immutable philosopher persona data, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhilosopherProfile {
    pub key: String,
    pub display_name: String,
    pub essence: String,
    pub debate_style: String,
    pub personality: String,
    pub key_traits: Vec<String>,
    pub representative_quote: String,

    /// Strategy id -> non-negative weight. Each of the three maps should sum
    /// to (approximately) 1; loaders do not enforce this, callers may warn.
    pub attack_weights: HashMap<StrategyId, f64>,
    pub defense_weights: HashMap<StrategyId, f64>,
    pub followup_weights: HashMap<StrategyId, f64>,

    /// Overall inclination to prefer retrieval-backed responses, in [0,1].
    /// Carried for completeness; the per-turn decision uses `rag_stat`.
    pub rag_affinity: f64,

    /// Per-axis sensitivity used when weighting vulnerability scores; not
    /// used by the RAG-use decision itself.
    pub vulnerability_sensitivity: AxisVector,

    /// The philosopher's stat vector against the five RAG axes, each in
    /// [0,1]. Dotted with a strategy's weight vector to produce `rag_score`.
    pub rag_stat: AxisVector,
}

/// One entry in an attack/defense/followup catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyEntry {
    pub id: StrategyId,
    pub description: String,
    pub stylistic_cue: String,
    /// Only attack strategies carry a RAG-axis weight vector (values in
    /// [-1,1]); defense/followup entries leave this `None`.
    #[serde(default)]
    pub rag_weights: Option<AxisVector>,
}

/// The three disjoint strategy sets plus the default fallback ids used when
/// a candidate set degenerates to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCatalogue {
    pub attack: Vec<StrategyEntry>,
    pub defense: Vec<StrategyEntry>,
    pub followup: Vec<StrategyEntry>,
    pub default_attack_id: StrategyId,
    pub default_defense_id: StrategyId,
    pub default_followup_id: StrategyId,
}

impl StrategyCatalogue {
    pub fn find_attack(&self, id: &str) -> Option<&StrategyEntry> {
        self.attack.iter().find(|s| s.id == id)
    }

    pub fn find_defense(&self, id: &str) -> Option<&StrategyEntry> {
        self.defense.iter().find(|s| s.id == id)
    }

    pub fn find_followup(&self, id: &str) -> Option<&StrategyEntry> {
        self.followup.iter().find(|s| s.id == id)
    }
}

/// Maps an inferred attack-strategy id to the defense strategies eligible in
/// response to it. Strategies not present as a key admit the full defense
/// catalogue (spec.md §4.1: "if attack strategy is unknown, candidate set is
/// the full defense catalogue").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttackDefenseMap(pub HashMap<StrategyId, Vec<StrategyId>>);

/// Maps a defense-strategy id to eligible followup strategies, same shape as
/// [`AttackDefenseMap`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefenseFollowupMap(pub HashMap<StrategyId, Vec<StrategyId>>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_score_matches_scenario_e4() {
        // spec.md Scenario E4: kant's stat vector dotted with
        // Conceptual_Undermining's catalogue weights.
        let stat = AxisVector {
            data_respect: 0.7,
            conceptual_precision: 0.9,
            systematic_logic: 0.9,
            pragmatic_orientation: 0.3,
            rhetorical_independence: 0.2,
        };
        let weights = AxisVector {
            data_respect: 0.1,
            conceptual_precision: 0.6,
            systematic_logic: 0.3,
            pragmatic_orientation: 0.05,
            rhetorical_independence: -0.2,
        };
        let score = stat.dot(&weights);
        assert!((score - 0.855).abs() < 1e-9, "expected 0.855, got {score}");
    }

    #[test]
    fn contributions_sum_to_dot_product() {
        let a = AxisVector { data_respect: 0.5, conceptual_precision: 0.2, systematic_logic: 0.1, pragmatic_orientation: 0.9, rhetorical_independence: 0.3 };
        let b = AxisVector { data_respect: 0.4, conceptual_precision: 0.6, systematic_logic: 0.2, pragmatic_orientation: 0.1, rhetorical_independence: 0.8 };
        let contributions: f64 = a.contributions(&b).values().sum();
        assert!((contributions - a.dot(&b)).abs() < 1e-12);
    }
}
