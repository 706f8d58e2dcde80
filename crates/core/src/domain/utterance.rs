use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::UtteranceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub source_name: String,
    pub snippet: String,
    #[serde(default)]
    pub relevance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: u32,
    pub source: String,
    pub snippet: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Metadata carried alongside an utterance's text. Every field beyond
/// `rag_used`/`rag_source_count` is optional because most kinds never
/// populate them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtteranceMetadata {
    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default)]
    pub target_argument_id: Option<String>,
    #[serde(default)]
    pub rag_used: bool,
    #[serde(default)]
    pub rag_source_count: u32,
    #[serde(default)]
    pub rag_sources: Vec<RagSource>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    /// Set when the Builder had to emit the deterministic fallback utterance
    /// after two consecutive LLM timeouts (spec.md §4.4/§7).
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub id: String,
    pub room_id: String,
    pub speaker_id: String,
    pub role: super::stage::Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub kind: UtteranceKind,
    pub metadata: UtteranceMetadata,
}

/// Status of an extracted [`Argument`] as it moves through analysis and
/// subsequent attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentStatus {
    PendingAnalysis,
    Scored,
    Attacked,
}

/// A claim extracted from an opponent's utterance, with per-axis
/// vulnerability scores used to drive attack-strategy selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    pub id: String,
    pub speaker_id: String,
    pub source_utterance_id: String,
    pub claim: String,
    pub premises: Vec<String>,
    pub evidence: Vec<String>,
    pub vulnerability_score: f64,
    pub per_axis_vulnerability: super::profile::AxisVector,
    pub status: ArgumentStatus,
}
