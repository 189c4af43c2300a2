// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Wastewise

use thiserror::Error;

/// Result type alias for Wastewise operations
pub type Result<T> = std::result::Result<T, WastewiseError>;

/// Wastewise error types
///
/// Resolving a label never fails; these cover configuration, the category
/// table, and the collaborators around the resolver.
#[derive(Error, Debug)]
pub enum WastewiseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid category table: {0}")]
    Taxonomy(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Ollama not available: {0}")]
    OllamaUnavailable(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
