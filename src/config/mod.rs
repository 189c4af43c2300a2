// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Wastewise

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::guidance::{Guidance, GuidanceBook};
use crate::resolver::Resolver;
use crate::taxonomy::{CategoryTable, Preset};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Category table selection
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Vision model configuration
    #[serde(default)]
    pub ai_engine: EngineConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Disposal guidance overrides
    #[serde(default)]
    pub guidance: GuidanceConfig,

    /// Web server settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TaxonomyConfig {
    /// Built-in table to use when no custom table is given
    #[serde(default)]
    pub preset: Preset,
    /// Custom table, replaces the preset
    ///
    /// Guidance still comes from `preset`; categories it does not cover get
    /// the general advice unless `guidance.overrides` names them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<CategoryTable>,
    /// Overrides the fallback category of the table in effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Number of candidate labels to request from the model
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_labels_prompt")]
    pub labels: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GuidanceConfig {
    #[serde(default)]
    pub overrides: HashMap<String, Guidance>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Largest accepted image upload
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

// Default value functions
fn default_engine_url() -> String { "http://localhost:11434".to_string() }
fn default_vision_model() -> String { "moondream".to_string() }
fn default_timeout() -> u64 { 120 }
fn default_retries() -> u32 { 2 }
fn default_top_k() -> usize { 5 }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }
fn default_max_upload_mb() -> usize { 10 }

fn default_labels_prompt() -> String {
    "List the main objects visible in this photo of a waste item, most likely first. \
     Write one short object name per line followed by a confidence between 0 and 1, \
     for example: plastic bottle: 0.8. Return ONLY the list.".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            vision_model: default_vision_model(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
            top_k: default_top_k(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            labels: default_labels_prompt(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::WastewiseError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The category table in effect: custom table or preset, with the
    /// fallback override applied
    pub fn category_table(&self) -> crate::Result<CategoryTable> {
        let table = match &self.taxonomy.table {
            Some(table) => table.clone(),
            None => self.taxonomy.preset.table(),
        };

        match &self.taxonomy.fallback {
            Some(fallback) => table.with_fallback(fallback.as_str()),
            None => Ok(table),
        }
    }

    pub fn resolver(&self) -> crate::Result<Resolver> {
        Ok(Resolver::new(self.category_table()?))
    }

    /// Preset guidance with configured overrides on top
    pub fn guidance_book(&self) -> GuidanceBook {
        GuidanceBook::for_preset(self.taxonomy.preset).merged(&self.guidance.overrides)
    }

    /// Non-fallback categories with no guidance of their own
    pub fn categories_without_guidance(&self) -> crate::Result<Vec<String>> {
        let table = self.category_table()?;
        let book = self.guidance_book();

        Ok(table
            .category_names()
            .into_iter()
            .filter(|name| *name != table.fallback() && !book.has(name))
            .map(str::to_string)
            .collect())
    }

    /// Check everything that can be checked without the network
    pub fn validate(&self) -> crate::Result<()> {
        let table = self.category_table()?;

        if self.ai_engine.url.trim().is_empty() {
            return Err(crate::WastewiseError::Config("ai_engine.url is empty".to_string()));
        }
        if self.ai_engine.vision_model.trim().is_empty() {
            return Err(crate::WastewiseError::Config("ai_engine.vision_model is empty".to_string()));
        }

        for category in self.guidance.overrides.keys() {
            if !table.contains(category) {
                tracing::warn!("Guidance override for undeclared category '{}'", category);
            }
        }

        for category in self.categories_without_guidance()? {
            tracing::warn!("Category '{}' has no guidance; the general advice is shown", category);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WastewiseError;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.taxonomy.preset, Preset::Materials);
        assert_eq!(config.ai_engine.top_k, 5);
        assert_eq!(config.category_table().unwrap().fallback(), "others");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.taxonomy.preset = Preset::Disposal;
        config.web.port = 9090;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.taxonomy.preset, Preset::Disposal);
        assert_eq!(loaded.web.port, 9090);
        assert_eq!(loaded.category_table().unwrap(), Preset::Disposal.table());
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig =
            serde_json::from_str(r#"{"taxonomy":{"preset":"disposal"},"ai_engine":{"vision_model":"llava"}}"#).unwrap();
        assert_eq!(config.ai_engine.vision_model, "llava");
        assert_eq!(config.ai_engine.url, "http://localhost:11434");
        assert_eq!(config.category_table().unwrap().fallback(), "nonbiodegradable");
    }

    #[test]
    fn test_custom_table_and_fallback_override() {
        let json = r#"{
            "taxonomy": {
                "table": {
                    "categories": [
                        {"name": "recyclable", "keywords": ["bottle", "can"]},
                        {"name": "unknown", "keywords": []}
                    ],
                    "fallback": "unknown"
                },
                "fallback": "recyclable"
            }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let table = config.category_table().unwrap();
        assert_eq!(table.category_names(), vec!["recyclable", "unknown"]);
        assert_eq!(table.fallback(), "recyclable");
    }

    #[test]
    fn test_invalid_custom_table_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"taxonomy":{"table":{"categories":[{"name":"a","keywords":["x"]}],"fallback":"b"}}}"#,
        )
        .unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, WastewiseError::Config(_)));
    }

    #[test]
    fn test_unknown_fallback_override_is_rejected() {
        let mut config = AppConfig::default();
        config.taxonomy.fallback = Some("landfill".to_string());
        assert!(config.category_table().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_table_categories_without_guidance() {
        let json = r##"{
            "taxonomy": {
                "table": {
                    "categories": [
                        {"name": "glass", "keywords": ["jar"]},
                        {"name": "textile", "keywords": ["shirt"]},
                        {"name": "bulky", "keywords": ["sofa"]},
                        {"name": "rest", "keywords": []}
                    ],
                    "fallback": "rest"
                }
            },
            "guidance": {
                "overrides": {"bulky": {"guideline": "Book a pickup.", "color": "#123456"}}
            }
        }"##;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.categories_without_guidance().unwrap(), vec!["textile"]);
        assert!(config.validate().is_ok());

        assert!(AppConfig::default().categories_without_guidance().unwrap().is_empty());
    }

    #[test]
    fn test_guidance_overrides() {
        let mut config = AppConfig::default();
        config
            .guidance
            .overrides
            .insert("others".to_string(), Guidance::new("Ask your municipality.", "#000000"));
        assert_eq!(config.guidance_book().get("others").guideline, "Ask your municipality.");
        assert!(config.validate().is_ok());
    }
}
