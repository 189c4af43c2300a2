// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Category tables: the keyword taxonomy the resolver matches against
//!
//! A table is an ordered list of categories, each with an ordered keyword
//! list, plus the name of the fallback category. Declaration order is the
//! tie-break when keywords overlap, so tables keep it exactly as given.

pub mod presets;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{Result, WastewiseError};

pub use presets::Preset;

/// One category and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryEntry {
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validated, immutable category table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct CategoryTable {
    categories: Vec<CategoryEntry>,
    fallback: String,
}

/// Unvalidated wire form of a table
#[derive(Deserialize)]
struct RawTable {
    categories: Vec<CategoryEntry>,
    fallback: String,
}

impl TryFrom<RawTable> for CategoryTable {
    type Error = WastewiseError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Self::new(raw.categories, raw.fallback)
    }
}

impl CategoryTable {
    /// Build a table, lower-casing keywords and checking that names are
    /// unique, no keyword is empty and the fallback is a declared category.
    pub fn new(categories: Vec<CategoryEntry>, fallback: impl Into<String>) -> Result<Self> {
        let fallback = fallback.into();
        let mut seen = HashSet::new();

        let categories = categories
            .into_iter()
            .map(|entry| {
                if entry.name.trim().is_empty() {
                    return Err(WastewiseError::Taxonomy("category name is empty".to_string()));
                }
                if !seen.insert(entry.name.clone()) {
                    return Err(WastewiseError::Taxonomy(format!(
                        "duplicate category '{}'",
                        entry.name
                    )));
                }
                if entry.keywords.iter().any(|k| k.is_empty()) {
                    return Err(WastewiseError::Taxonomy(format!(
                        "category '{}' has an empty keyword",
                        entry.name
                    )));
                }
                Ok(CategoryEntry {
                    keywords: entry.keywords.iter().map(|k| k.to_lowercase()).collect(),
                    name: entry.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if !seen.contains(&fallback) {
            return Err(WastewiseError::Taxonomy(format!(
                "fallback '{}' is not a declared category",
                fallback
            )));
        }

        Ok(Self { categories, fallback })
    }

    /// Built-in table for a preset
    pub fn from_preset(preset: Preset) -> Self {
        preset.table()
    }

    /// Same categories with a different fallback
    pub fn with_fallback(self, fallback: impl Into<String>) -> Result<Self> {
        Self::new(self.categories, fallback)
    }

    /// Categories in declaration order
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Keywords of a category, if declared
    pub fn keywords(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.keywords.as_slice())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.name == category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Preset::default().table()
    }
}
