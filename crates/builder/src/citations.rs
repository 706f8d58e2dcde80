//! Citation marker bookkeeping (spec.md §4.4): the LLM is asked to insert
//! `[n]` markers referencing the evidence list; this module derives the
//! `Citation` metadata array from what the model actually emitted, dropping
//! any entry whose marker never appears in the text.

use std::collections::HashSet;

use debate_core::{Citation, RagHit};
use regex::Regex;

fn marker_regex() -> Regex {
    Regex::new(r"\[(\d+)\]").expect("static citation marker regex")
}

/// Scans `text` for `[n]` markers and returns one [`Citation`] per distinct
/// marker that has a matching entry in `bundle` (1-indexed). Markers with no
/// corresponding evidence entry, or duplicated entries, are ignored.
pub fn derive_citations(text: &str, bundle: &[RagHit]) -> Vec<Citation> {
    if bundle.is_empty() {
        return Vec::new();
    }
    let re = marker_regex();
    let mut seen = HashSet::new();
    let mut citations = Vec::new();

    for cap in re.captures_iter(text) {
        let n: usize = match cap[1].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if n == 0 || n > bundle.len() || !seen.insert(n) {
            continue;
        }
        let hit = &bundle[n - 1];
        citations.push(Citation {
            id: n as u32,
            source: hit.title.clone(),
            snippet: hit.snippet.clone(),
            location: Some(hit.source_id.clone()),
        });
    }

    citations.sort_by_key(|c| c.id);
    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::RagSourceKind;

    fn hit(title: &str) -> RagHit {
        RagHit {
            source_kind: RagSourceKind::Web,
            source_id: format!("id-{title}"),
            title: title.to_string(),
            snippet: "snip".into(),
            score: 1.0,
        }
    }

    #[test]
    fn extracts_markers_present_in_text() {
        let bundle = vec![hit("A"), hit("B")];
        let citations = derive_citations("Some claim [1] and another [2].", &bundle);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source, "A");
        assert_eq!(citations[1].source, "B");
    }

    #[test]
    fn drops_markers_with_no_evidence_entry() {
        let bundle = vec![hit("A")];
        let citations = derive_citations("Claim [1] then [5] out of range.", &bundle);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].id, 1);
    }

    #[test]
    fn empty_bundle_yields_no_citations_even_with_markers() {
        let citations = derive_citations("Claim [1].", &[]);
        assert!(citations.is_empty());
    }

    #[test]
    fn duplicate_markers_collapse_to_one_citation() {
        let bundle = vec![hit("A")];
        let citations = derive_citations("[1] restated again as [1].", &bundle);
        assert_eq!(citations.len(), 1);
    }
}
