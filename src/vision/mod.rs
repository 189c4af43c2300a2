// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image classifier seam
//!
//! The recognition model is an external collaborator: image bytes in, ranked
//! labels out. Callers receive an [`ImageClassifier`] explicitly and feed its
//! output through the [`Resolver`].

mod labels;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, warn};

use crate::resolver::{ClassificationResult, Resolver};
use crate::Result;

pub use labels::parse_labels;

/// Longest side, in pixels, of images sent to a vision model
pub const MAX_IMAGE_SIDE: u32 = 1024;

/// One candidate label reported by an image classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    /// Confidence (0.0 - 1.0)
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self { label: label.into(), score }
    }
}

/// Anything that turns an image into ranked labels
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Name of this classifier (for logs and status output)
    fn name(&self) -> &str;

    /// Ranked candidates, best first
    async fn classify(&self, image: &[u8]) -> Result<Vec<LabelScore>>;
}

/// Resolved category plus the raw candidates it was chosen from
#[derive(Debug, Clone, Serialize)]
pub struct ImageClassification {
    pub result: ClassificationResult,
    pub candidates: Vec<LabelScore>,
}

/// Run an image through a classifier and resolve its labels
pub async fn classify_image(
    classifier: &dyn ImageClassifier,
    resolver: &Resolver,
    image: &[u8],
) -> Result<ImageClassification> {
    let candidates = classifier.classify(image).await?;
    debug!("{} returned {} candidates", classifier.name(), candidates.len());

    if candidates.is_empty() {
        warn!("{} returned no labels, using fallback category", classifier.name());
    }

    let result = resolver.classify_ranked(&candidates);
    Ok(ImageClassification { result, candidates })
}

/// Downscale large images and re-encode as JPEG
pub fn prepare_image(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)?;
    let (width, height) = img.dimensions();

    let img = if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        img.resize(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)?;
    Ok(buffer)
}

/// Base64 payload for a vision request, prepared when the bytes decode
pub fn encode_image(data: &[u8]) -> String {
    match prepare_image(data) {
        Ok(prepared) => general_purpose::STANDARD.encode(prepared),
        Err(e) => {
            debug!("Sending image unmodified: {}", e);
            general_purpose::STANDARD.encode(data)
        }
    }
}
