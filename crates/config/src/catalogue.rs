//! Philosopher-profile and strategy-catalogue loaders.
//!
//! Modeled directly on the teacher's `PersonasConfig::load` pattern
//! (`config/src/domain/personas.rs`): read the file, parse with
//! `serde_yaml`, wrap parse/IO failures in [`ConfigError`].

use std::collections::HashMap;
use std::path::Path;

use debate_core::{AttackDefenseMap, DefenseFollowupMap, PhilosopherProfile, StrategyCatalogue};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// `philosophers.yaml`: key -> [`PhilosopherProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhilosopherCatalogue {
    pub philosophers: HashMap<String, PhilosopherProfile>,
}

impl PhilosopherCatalogue {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&PhilosopherProfile> {
        self.philosophers.get(key)
    }
}

/// Wraps [`StrategyCatalogue`] plus the attack->defense and defense->followup
/// restriction maps, loaded as one `strategies.yaml` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(flatten)]
    pub catalogue: StrategyCatalogue,
    #[serde(default)]
    pub attack_to_defense: AttackDefenseMap,
    #[serde(default)]
    pub defense_to_followup: DefenseFollowupMap,
}

impl StrategyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHILOSOPHERS_YAML: &str = r#"
philosophers:
  kant:
    key: kant
    display_name: Immanuel Kant
    essence: Duty and the categorical imperative
    debate_style: Systematic and rigorous
    personality: Stern, precise
    key_traits: [rigorous, dutiful]
    representative_quote: "Act only according to that maxim..."
    attack_weights: { conceptual_undermining: 0.6, framing_shift: 0.4 }
    defense_weights: { conceptual_undermining: 1.0 }
    followup_weights: { conceptual_undermining: 1.0 }
    rag_affinity: 0.8
    vulnerability_sensitivity: { data_respect: 0.5, conceptual_precision: 0.9, systematic_logic: 0.9, pragmatic_orientation: 0.3, rhetorical_independence: 0.2 }
    rag_stat: { data_respect: 0.7, conceptual_precision: 0.9, systematic_logic: 0.9, pragmatic_orientation: 0.3, rhetorical_independence: 0.2 }
"#;

    #[test]
    fn parses_philosopher_catalogue() {
        let catalogue: PhilosopherCatalogue = serde_yaml::from_str(PHILOSOPHERS_YAML).unwrap();
        let kant = catalogue.get("kant").expect("kant present");
        assert_eq!(kant.display_name, "Immanuel Kant");
        assert!((kant.rag_stat.conceptual_precision - 0.9).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = PhilosopherCatalogue::load("/nonexistent/path/philosophers.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
