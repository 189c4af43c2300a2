// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Built-in category tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{CategoryEntry, CategoryTable};
use crate::WastewiseError;

/// Material taxonomy used by the photo classifier
const MATERIALS: &[(&str, &[&str])] = &[
    ("plastic", &["bottle", "plastic", "container", "cup", "box"]),
    ("paper", &["paper", "newspaper", "book", "cardboard", "carton", "envelope"]),
    ("glass", &["glass", "bottle", "jar", "wine glass", "beer glass"]),
    ("metal", &["can", "aluminum", "tin", "metal", "knife", "fork", "spoon"]),
    ("organic", &["fruit", "vegetable", "food", "plant", "leaf", "coffee", "tea"]),
    ("electronic", &["computer", "phone", "laptop", "electronic", "battery", "calculator"]),
    ("others", &[]),
];
const MATERIALS_FALLBACK: &str = "others";

/// Disposal-stream taxonomy; unmatched items are treated as non-biodegradable
const DISPOSAL: &[(&str, &[&str])] = &[
    (
        "biodegradable",
        &[
            "food", "fruit", "vegetable", "banana", "apple", "peel", "leaf", "plant",
            "flower", "wood", "paper towel", "coffee", "tea", "egg", "bread",
        ],
    ),
    (
        "recyclable",
        &[
            "bottle", "can", "paper", "cardboard", "carton", "newspaper", "magazine",
            "envelope", "glass", "jar", "aluminum", "tin", "box", "container",
        ],
    ),
    (
        "hazardous",
        &[
            "battery", "paint", "chemical", "pesticide", "syringe", "needle", "medicine",
            "thermometer", "bulb", "aerosol", "motor oil", "lighter",
        ],
    ),
    (
        "nonbiodegradable",
        &["plastic bag", "styrofoam", "polystyrene", "wrapper", "diaper", "rubber", "ceramic"],
    ),
];
const DISPOSAL_FALLBACK: &str = "nonbiodegradable";

/// Versioned built-in tables, selectable by name from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// plastic / paper / glass / metal / organic / electronic / others
    #[default]
    Materials,
    /// biodegradable / recyclable / hazardous / nonbiodegradable
    Disposal,
}

impl Preset {
    pub fn all() -> &'static [Preset] {
        &[Preset::Materials, Preset::Disposal]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Materials => "materials",
            Preset::Disposal => "disposal",
        }
    }

    pub fn table(&self) -> CategoryTable {
        let (rows, fallback) = match self {
            Preset::Materials => (MATERIALS, MATERIALS_FALLBACK),
            Preset::Disposal => (DISPOSAL, DISPOSAL_FALLBACK),
        };
        // Built-in rows are lowercase, unique and declare their fallback.
        CategoryTable {
            categories: rows
                .iter()
                .map(|(name, keywords)| CategoryEntry::new(*name, keywords.iter().copied()))
                .collect(),
            fallback: fallback.to_string(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = WastewiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WastewiseError::Config(format!("unknown taxonomy preset '{}'", s)))
    }
}
