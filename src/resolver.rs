// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Category resolution: free-text classifier labels to waste categories
//!
//! Matching is lower-cased substring containment against the table's
//! keywords. Categories are tried in declaration order and the first one
//! with any matching keyword wins; there is no scoring. Labels that match
//! nothing resolve to the table's fallback category, which is a normal
//! outcome rather than an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::taxonomy::CategoryTable;
use crate::vision::LabelScore;

/// Resolve a single label to a category name
///
/// Labels are lower-cased with Unicode rules before matching, so case
/// never matters for ASCII labels. Outside ASCII the folding is not
/// symmetric: `"glaß"` stays `others` while `"GLASS"` resolves to `glass`.
pub fn resolve<'t>(label: &str, table: &'t CategoryTable) -> &'t str {
    match find_match(label, table) {
        Some((category, _)) => category,
        None => table.fallback(),
    }
}

/// Resolve a ranked list of labels (best candidate first)
///
/// Returns the category of the first candidate that resolves to something
/// other than the fallback, or the fallback when none does.
pub fn resolve_ranked<'t, S: AsRef<str>>(labels: &[S], table: &'t CategoryTable) -> &'t str {
    labels
        .iter()
        .map(|label| resolve(label.as_ref(), table))
        .find(|category| *category != table.fallback())
        .unwrap_or_else(|| table.fallback())
}

/// First (category, keyword) pair whose keyword occurs in the label
fn find_match<'t>(label: &str, table: &'t CategoryTable) -> Option<(&'t str, &'t str)> {
    let normalized = label.to_lowercase();

    table.entries().iter().find_map(|entry| {
        entry
            .keywords
            .iter()
            .find(|keyword| normalized.contains(keyword.as_str()))
            .map(|keyword| (entry.name.as_str(), keyword.as_str()))
    })
}

/// A single label to classify, with the upstream confidence if known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationQuery {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ClassificationQuery {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), score: None }
    }

    /// Attach a confidence score, clamped to [0, 1]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(clamp_score(score));
        self
    }
}

/// Outcome of resolving a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    category: String,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    fallback: bool,
}

impl ClassificationResult {
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The label that decided the category
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// True when the deciding label matched no keyword at all
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// Which keyword decided a label's category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub category: String,
    pub keyword: Option<String>,
}

/// Resolver bound to one category table
///
/// Cheap to clone and safe to share between threads; the table is never
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<CategoryTable>,
}

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify() {
        assert_send_sync::<Resolver>();
    }
};

impl Resolver {
    pub fn new(table: CategoryTable) -> Self {
        Self { table: Arc::new(table) }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Category name for a bare label
    pub fn category_of(&self, label: &str) -> &str {
        resolve(label, &self.table)
    }

    /// Resolve one query into a result
    pub fn classify(&self, query: &ClassificationQuery) -> ClassificationResult {
        let matched = find_match(&query.label, &self.table);
        debug!(label = %query.label, category = ?matched.map(|m| m.0), "resolved label");

        self.result_for(query.label.clone(), query.score, matched.map(|(category, _)| category))
    }

    /// Resolve ranked classifier output into a result
    ///
    /// The result carries the label and score of the first candidate whose
    /// category is not the fallback, or of the top-ranked candidate when
    /// every candidate resolved to the fallback.
    pub fn classify_ranked(&self, candidates: &[LabelScore]) -> ClassificationResult {
        let fallback = self.table.fallback();
        let decided = candidates.iter().find_map(|candidate| {
            match find_match(&candidate.label, &self.table) {
                Some((category, _)) if category != fallback => Some((candidate, category)),
                _ => None,
            }
        });

        match decided {
            Some((candidate, category)) => {
                debug!(label = %candidate.label, category, "resolved ranked candidates");
                self.result_for(candidate.label.clone(), Some(candidate.score), Some(category))
            }
            None => {
                let top = candidates.first();
                let matched = top
                    .and_then(|c| find_match(&c.label, &self.table))
                    .map(|(category, _)| category);
                debug!(candidates = candidates.len(), "no candidate left the fallback category");
                self.result_for(
                    top.map(|c| c.label.clone()).unwrap_or_default(),
                    top.map(|c| c.score),
                    matched,
                )
            }
        }
    }

    /// Resolve ranked bare labels that carry no score
    ///
    /// Same choice as [`resolve_ranked`]; the result has no score.
    pub fn classify_labels<S: AsRef<str>>(&self, labels: &[S]) -> ClassificationResult {
        let fallback = self.table.fallback();
        let labels: Vec<&str> = labels.iter().map(|label| label.as_ref()).collect();
        let deciding = labels
            .iter()
            .find(|label| resolve(label, &self.table) != fallback)
            .or_else(|| labels.first())
            .copied()
            .unwrap_or_default();

        self.classify(&ClassificationQuery::new(deciding))
    }

    /// Category plus the keyword that selected it
    pub fn explain(&self, label: &str) -> Explanation {
        match find_match(label, &self.table) {
            Some((category, keyword)) => Explanation {
                category: category.to_string(),
                keyword: Some(keyword.to_string()),
            },
            None => Explanation {
                category: self.table.fallback().to_string(),
                keyword: None,
            },
        }
    }

    fn result_for(&self, label: String, score: Option<f64>, category: Option<&str>) -> ClassificationResult {
        ClassificationResult {
            category: category.unwrap_or_else(|| self.table.fallback()).to_string(),
            label,
            score: score.map(clamp_score),
            fallback: category.is_none(),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(CategoryTable::default())
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
