// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Wastewise: Waste Category Resolver
//!
//! Maps the free-text labels of an image classifier onto a fixed waste
//! taxonomy and attaches disposal guidance. The resolver is pure and
//! synchronous; the vision model, CLI and web service are built around it.

pub mod config;
pub mod error;
pub mod guidance;
pub mod ollama;
pub mod resolver;
pub mod taxonomy;
pub mod vision;
pub mod web;

pub use config::AppConfig;
pub use error::{Result, WastewiseError};
pub use resolver::{resolve, resolve_ranked, ClassificationQuery, ClassificationResult, Resolver};
pub use taxonomy::{CategoryEntry, CategoryTable, Preset};
pub use vision::{ImageClassifier, LabelScore};
