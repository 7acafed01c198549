//! Dedupe keys of every paper selected in an earlier issue.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::text::{normalize_doi, normalize_title};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenHistory {
    pub dois: HashSet<String>,
    /// Only consulted for candidates without a DOI.
    pub titles: HashSet<String>,
}

impl SeenHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, candidate: &Candidate) -> bool {
        match candidate.doi.as_deref().and_then(normalize_doi) {
            Some(doi) => self.dois.contains(&doi),
            None      => self.titles.contains(&normalize_title(&candidate.title)),
        }
    }

    pub fn record(&mut self, candidate: &Candidate) {
        if let Some(doi) = candidate.doi.as_deref().and_then(normalize_doi) {
            self.dois.insert(doi);
        }
        let title = normalize_title(&candidate.title);
        if !title.is_empty() {
            self.titles.insert(title);
        }
    }

    pub fn len(&self) -> usize {
        self.dois.len() + self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dois.is_empty() && self.titles.is_empty()
    }
}
