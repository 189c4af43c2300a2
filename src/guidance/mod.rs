// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Disposal guidance keyed by category name

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::taxonomy::Preset;

/// What to do with an item of a category, and how to show it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub guideline: String,
    /// CSS color used for the category swatch
    pub color: String,
}

impl Guidance {
    pub fn new(guideline: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            guideline: guideline.into(),
            color: color.into(),
        }
    }

    /// Advice for categories with no entry of their own
    pub fn general() -> Self {
        Self::new("If not recyclable, dispose in the general waste bin.", "#9ca3af")
    }
}

/// Guidance entries for a taxonomy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidanceBook {
    entries: HashMap<String, Guidance>,
}

impl GuidanceBook {
    pub fn for_preset(preset: Preset) -> Self {
        let rows: &[(&str, &str, &str)] = match preset {
            Preset::Materials => &[
                ("plastic", "Clean and recycle in the blue bin. Remove caps and labels if possible.", "#3b82f6"),
                ("paper", "Recycle in the blue bin. Keep it clean and dry.", "#d6b88a"),
                ("glass", "Clean and recycle in designated glass containers. Remove caps and lids.", "#5eead4"),
                ("metal", "Rinse and recycle in the blue bin. Larger metal items should go to a recycling center.", "#94a3b8"),
                ("organic", "Compost in the green bin. Keep free from plastics and other non-organic materials.", "#4ade80"),
                ("electronic", "Take to an e-waste collection center. Do not dispose in regular trash.", "#60a5fa"),
            ],
            Preset::Disposal => &[
                ("biodegradable", "Compost in the green bin. Keep free from plastics and other non-organic materials.", "#4ade80"),
                ("recyclable", "Clean, dry and place in the blue recycling bin.", "#3b82f6"),
                ("hazardous", "Take to a hazardous waste drop-off point. Never put it in household bins.", "#ef4444"),
                ("nonbiodegradable", "Dispose in the general waste bin. Avoid burning or dumping.", "#9ca3af"),
            ],
        };

        Self {
            entries: rows
                .iter()
                .map(|(name, guideline, color)| (name.to_string(), Guidance::new(*guideline, *color)))
                .collect(),
        }
    }

    /// Guidance for a category, or general advice when none is recorded
    pub fn get(&self, category: &str) -> Guidance {
        self.entries.get(category).cloned().unwrap_or_else(Guidance::general)
    }

    /// Whether the category has its own entry
    pub fn has(&self, category: &str) -> bool {
        self.entries.contains_key(category)
    }

    pub fn insert(&mut self, category: impl Into<String>, guidance: Guidance) {
        self.entries.insert(category.into(), guidance);
    }

    /// Apply overrides on top of this book
    pub fn merged(mut self, overrides: &HashMap<String, Guidance>) -> Self {
        for (category, guidance) in overrides {
            self.insert(category.clone(), guidance.clone());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_guidance() {
        let book = GuidanceBook::for_preset(Preset::Materials);
        assert_eq!(
            book.get("electronic").guideline,
            "Take to an e-waste collection center. Do not dispose in regular trash."
        );
        assert_eq!(book.len(), 6);
    }

    #[test]
    fn test_fallback_category_gets_general_advice() {
        let book = GuidanceBook::for_preset(Preset::Materials);
        assert!(!book.has("others"));
        assert_eq!(book.get("others"), Guidance::general());
        assert_eq!(book.get("spaceship"), Guidance::general());
    }

    #[test]
    fn test_every_disposal_category_has_guidance() {
        let book = GuidanceBook::for_preset(Preset::Disposal);
        for name in Preset::Disposal.table().category_names() {
            assert!(book.has(name), "missing guidance for {}", name);
        }
    }

    #[test]
    fn test_overrides_replace_entries() {
        let mut overrides = HashMap::new();
        overrides.insert("paper".to_string(), Guidance::new("Shred first.", "#ffffff"));
        overrides.insert("textile".to_string(), Guidance::new("Donate if wearable.", "#a855f7"));

        let book = GuidanceBook::for_preset(Preset::Materials).merged(&overrides);
        assert_eq!(book.get("paper").guideline, "Shred first.");
        assert_eq!(book.get("textile").color, "#a855f7");
        assert_eq!(book.get("glass").color, "#5eead4");
    }
}
