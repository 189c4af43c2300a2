// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Wastewise Web Service
//!
//! Standalone server for the JSON API and the category overview page.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use wastewise::config::AppConfig;
use wastewise::ollama::OllamaClassifier;
use wastewise::Result;

#[derive(Parser, Debug)]
#[command(name = "wastewise-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Wastewise Web Service")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Wastewise Web Service v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let mut config = AppConfig::load(&args.config)?;
    config.validate()?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }

    let classifier = OllamaClassifier::from_config(&config)?;
    if let Err(e) = classifier.client().health_check().await {
        warn!("{}; /api/classify will fail until Ollama is reachable", e);
    }
    info!("Vision model: {}", classifier.model());

    wastewise::web::start_server(config, Arc::new(classifier)).await
}
