//! JSON rows describing how each selected candidate was scored.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::classify::StudyType;
use crate::scorer::ScoreBreakdown;
use crate::select::ScoredCandidate;
use digest_common::Candidate;

#[derive(Serialize)]
struct RankingRow<'a> {
    #[serde(flatten)]
    candidate: &'a Candidate,
    study_type: StudyType,
    topic_tags: &'a [String],
    score: f64,
    score_breakdown: ScoreBreakdown,
}

/// One object per candidate: the candidate's own fields plus study type,
/// topic tags, score and per-component breakdown.
pub fn debug_rankings(selected: &[ScoredCandidate]) -> Vec<Value> {
    selected
        .iter()
        .filter_map(|s| {
            let row = RankingRow {
                candidate:       &s.candidate,
                study_type:      s.study_type,
                topic_tags:      &s.topic_tags,
                score:           round2(s.score),
                score_breakdown: s.breakdown,
            };
            match serde_json::to_value(&row) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(title = %s.candidate.title, error = %e, "Dropping unserializable ranking row");
                    None
                }
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::select;
    use crate::testing::{config, paper, today};
    use digest_common::SeenHistory;

    #[test]
    fn test_rows_carry_candidate_and_breakdown() {
        let cfg = config(&[("sleep", &["sleep"])]);
        let c = paper("Sleep and shift work", "sleep duration", "BMJ", 0).with_doi("10.5/abc");
        let selected = select(&[c], &cfg, &SeenHistory::new(), today());
        let rows = debug_rankings(&selected);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["title"], "Sleep and shift work");
        assert_eq!(row["doi"], "10.5/abc");
        assert_eq!(row["study_type"], "unknown");
        assert_eq!(row["topic_tags"][0], "sleep");
        assert_eq!(row["score_breakdown"]["journal"], 40.0);
        assert!(row["score"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_one_row_per_selected_candidate() {
        let cfg = config(&[("sleep", &["sleep"]), ("memory", &["memory"])]);
        let papers = vec![
            paper("Sleep and shift work", "sleep duration", "BMJ", 0).with_doi("10.5/a"),
            paper("Memory in adolescence", "working memory", "Appetite", 3).with_doi("10.5/b"),
        ];
        let selected = select(&papers, &cfg, &SeenHistory::new(), today());
        let rows = debug_rankings(&selected);

        assert_eq!(rows.len(), selected.len());
        for (row, s) in rows.iter().zip(&selected) {
            assert_eq!(row["title"], s.candidate.title.as_str());
            assert_eq!(row["score"].as_f64(), Some(round2(s.score)));
        }
    }

    #[test]
    fn test_empty_selection() {
        assert!(debug_rankings(&[]).is_empty());
    }
}
