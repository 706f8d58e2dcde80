//! Argument Analyzer (spec.md §4.2): extracts claims from an opponent's
//! utterance, scores their vulnerability along the five rhetorical axes,
//! and persists the result idempotently per source utterance.

pub mod analysis;
pub mod extraction;
pub mod scoring;

pub use analysis::{already_analyzed, analyze_utterance};
pub use extraction::{extract_claims, truncate_at_sentence_boundary, ExtractedClaim, MAX_ARGUMENTS, TRUNCATE_CHARS};
pub use scoring::{score_argument, score_batch};
