//! Candidate deduplication across query variants.

use std::collections::HashSet;

use ragdb_core::types::Candidate;

/// Merge per-variant candidate lists into one, keyed by chunk id. The
/// first occurrence in variant order wins; later duplicates are dropped
/// without score reconciliation, so a later variant's higher similarity
/// for an already-seen chunk is discarded.
pub fn merge_candidates(batches: Vec<Vec<Candidate>>) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();
    for batch in batches {
        for candidate in batch {
            if seen.insert(candidate.chunk.id.clone()) {
                merged.push(candidate);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_core::types::Chunk;

    fn candidate(id: &str, similarity: f32) -> Candidate {
        Candidate {
            chunk: Chunk {
                id: id.to_string(),
                text: String::new(),
                source_document: "doc".to_string(),
                chapter_title: None,
                section_title: None,
                subsection_title: None,
                summary: None,
                token_count: None,
            },
            similarity_score: similarity,
        }
    }

    #[test]
    fn first_occurrence_wins_across_batches() {
        let merged = merge_candidates(vec![
            vec![candidate("a", 0.5), candidate("b", 0.4)],
            vec![candidate("b", 0.9), candidate("c", 0.3)],
        ]);
        let ids: Vec<&str> = merged.iter().map(|c| c.chunk.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        // The later, higher score for "b" is discarded.
        assert!((merged[1].similarity_score - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn identical_batches_collapse_to_one() {
        let batch = vec![candidate("a", 0.5), candidate("b", 0.4)];
        let merged = merge_candidates(vec![batch.clone(), batch.clone(), batch.clone(), batch]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_input_merges_to_empty() {
        assert!(merge_candidates(vec![]).is_empty());
        assert!(merge_candidates(vec![vec![], vec![]]).is_empty());
    }
}
