//! digest-writer — Turns a selected paper into a readable digest post.
//!
//! Everything is assembled from the paper's own metadata and abstract
//! sentences; nothing is invented and nothing here touches the network.

pub mod sentences;
pub mod sections;
pub mod tags;
pub mod end_matter;

#[cfg(test)]
pub(crate) mod testing;

pub use end_matter::build_end_matter;

use digest_common::{DigestConfig, DigestPost, StrictTopicGroup};
use digest_ranker::ScoredCandidate;
use tracing::debug;

use crate::sentences::PickedSentences;

/// Renders posts for one configuration; the strict topic groups decide the
/// group tags and which caveats apply.
#[derive(Debug, Clone, Default)]
pub struct PostRenderer {
    strict_groups: Vec<StrictTopicGroup>,
}

impl PostRenderer {
    pub fn new(config: &DigestConfig) -> Self {
        Self { strict_groups: config.strict_groups.clone() }
    }

    pub fn render(&self, scored: &ScoredCandidate) -> DigestPost {
        let paper = &scored.candidate;
        let picked = PickedSentences::from_abstract(&paper.abstract_text);
        let in_strict_group = !tags::strict_groups_for(&self.strict_groups, &scored.topic_tags).is_empty();

        let authors = if paper.authors.trim().is_empty() || paper.authors.trim().eq_ignore_ascii_case("unknown") {
            "Unknown".to_string()
        } else {
            paper.authors.clone()
        };
        let best_link = sections::best_link(paper);

        debug!(title = %paper.title, sentences = picked.all.len(), "Rendering post");

        DigestPost {
            slug:               None,
            headline:           sections::headline(paper, &picked),
            deck:               sections::deck(&scored.topic_tags, &picked),
            study_at_a_glance:  sections::study_at_a_glance(scored, &picked),
            what_they_did:      sections::what_they_did(&picked),
            what_they_found:    sections::what_they_found(&picked),
            interpretation:     sections::interpretation(scored.study_type),
            why_it_matters:     sections::why_it_matters(scored),
            caveats:            sections::caveats(scored, in_strict_group),
            read_the_paper:     sections::read_the_paper(paper.doi.as_deref(), &best_link),
            tags:               tags::tags_for(&scored.topic_tags, scored.study_type, &self.strict_groups),
            paper_title:        paper.title.clone(),
            authors,
            journal:            paper.journal.clone(),
            publication_date:   paper.publication_date,
            study_type:         scored.study_type.as_str().to_string(),
            open_access_status: paper.open_access_status,
            doi:                paper.doi.clone(),
            topic_tags:         scored.topic_tags.clone(),
            best_link,
            extra_links:        paper.extra_links.clone(),
            score:              scored.score,
        }
    }

    pub fn render_all(&self, selected: &[ScoredCandidate]) -> Vec<DigestPost> {
        selected.iter().map(|s| self.render(s)).collect()
    }
}

/// One-off rendering with the default strict groups.
pub fn render_post(scored: &ScoredCandidate) -> DigestPost {
    PostRenderer::new(&DigestConfig::default()).render(scored)
}
