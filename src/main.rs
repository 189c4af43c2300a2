// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Wastewise CLI
//!
//! Resolves classifier labels to waste categories, classifies photos with a
//! local vision model and shows disposal guidance.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use wastewise::config::AppConfig;
use wastewise::guidance::GuidanceBook;
use wastewise::ollama::OllamaClassifier;
use wastewise::resolver::ClassificationResult;
use wastewise::vision::{classify_image, LabelScore};
use wastewise::{Result, WastewiseError};

/// Wastewise CLI - Waste Category Resolver
#[derive(Parser, Debug)]
#[command(name = "wastewise")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Resolve waste item labels and photos to disposal categories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve labels to a category (labels are ranked, best first)
    Resolve {
        /// One or more labels
        #[arg(required = true)]
        labels: Vec<String>,

        /// Show which keyword matched
        #[arg(long)]
        explain: bool,
    },

    /// Classify a photo with the vision model
    Classify {
        /// Image file
        image: PathBuf,

        /// Skip Ollama health check
        #[arg(long)]
        skip_health_check: bool,
    },

    /// List the categories and keywords in effect
    Categories,

    /// Show disposal guidance for a category
    Guide {
        /// Category name
        category: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show vision engine status
    Status,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Resolve { labels, explain } => run_resolve(&config, labels, explain, json),
        Commands::Classify { image, skip_health_check } => {
            run_classify(&config, &image, skip_health_check, json).await
        }
        Commands::Categories => run_categories(&config, json),
        Commands::Guide { category } => run_guide(&config, &category, json),
        Commands::Config { action } => run_config_command(&config, action, &cli.config),
        Commands::Status => run_status(&config).await,
    }
}

/// Resolve labels given on the command line
fn run_resolve(config: &AppConfig, labels: Vec<String>, explain: bool, json: bool) -> Result<()> {
    let resolver = config.resolver()?;
    let book = config.guidance_book();

    // Command-line labels carry no score
    let result = resolver.classify_labels(&labels);

    if explain && !json {
        for label in &labels {
            let explanation = resolver.explain(label);
            println!(
                "  {:<30} -> {} ({})",
                label,
                explanation.category,
                explanation.keyword.as_deref().unwrap_or("no keyword")
            );
        }
    }

    print_result(&result, &book, &[], json)
}

/// Classify an image through the configured vision model
async fn run_classify(config: &AppConfig, image: &Path, skip_health_check: bool, json: bool) -> Result<()> {
    let resolver = config.resolver()?;
    let classifier = OllamaClassifier::from_config(config)?;

    if !skip_health_check {
        classifier.client().health_check().await?;
        if !classifier.client().model_available(classifier.model()).await? {
            warn!("Vision model '{}' not found in Ollama", classifier.model());
        }
    }

    let data = std::fs::read(image)?;
    info!("Classifying {:?} with {}", image, classifier.model());

    let outcome = classify_image(&classifier, &resolver, &data).await?;
    print_result(&outcome.result, &config.guidance_book(), &outcome.candidates, json)
}

fn print_result(
    result: &ClassificationResult,
    book: &GuidanceBook,
    candidates: &[LabelScore],
    json: bool,
) -> Result<()> {
    let guidance = book.get(result.category());

    if json {
        let output = serde_json::json!({
            "category": result.category(),
            "label": result.label(),
            "score": result.score(),
            "fallback": result.is_fallback(),
            "guidance": guidance,
            "candidates": candidates,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Category: {}", result.category());
    if result.is_fallback() {
        println!("  (no keyword matched)");
    }
    if !result.label().is_empty() {
        println!("Label: {}", result.label());
    }
    if let Some(score) = result.score() {
        println!("Confidence: {:.2}%", score * 100.0);
    }
    println!("Disposal: {}", guidance.guideline);

    if !candidates.is_empty() {
        println!("\nCandidates:");
        for candidate in candidates {
            println!("  {} ({:.0}%)", candidate.label, candidate.score * 100.0);
        }
    }

    Ok(())
}

fn run_categories(config: &AppConfig, json: bool) -> Result<()> {
    let table = config.category_table()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    let source = if config.taxonomy.table.is_some() {
        "custom".to_string()
    } else {
        config.taxonomy.preset.to_string()
    };
    println!("Categories ({}):", source);
    for entry in table.entries() {
        let marker = if entry.name == table.fallback() { " [fallback]" } else { "" };
        println!("  {}{}: {}", entry.name, marker, entry.keywords.join(", "));
    }

    Ok(())
}

fn run_guide(config: &AppConfig, category: &str, json: bool) -> Result<()> {
    let table = config.category_table()?;
    if !table.contains(category) {
        warn!("'{}' is not a category of the current table", category);
    }

    let guidance = config.guidance_book().get(category);
    if json {
        println!("{}", serde_json::to_string_pretty(&guidance)?);
    } else {
        println!("{}: {}", category, guidance.guideline);
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: &AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output, force } => {
            if output.exists() && !force {
                return Err(WastewiseError::Config(format!(
                    "{:?} already exists. Use --force to overwrite",
                    output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            let table = config.category_table()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Categories: {}", table.category_names().join(", "));
            println!("  Fallback: {}", table.fallback());
            println!("  Vision model: {}", config.ai_engine.vision_model);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: &AppConfig) -> Result<()> {
    let classifier = OllamaClassifier::from_config(config)?;
    let client = classifier.client();

    println!("Wastewise v{} Status", env!("CARGO_PKG_VERSION"));
    println!("======================");

    match client.health_check().await {
        Ok(()) => println!("Ollama: Running ({})", client.base_url()),
        Err(e) => println!("Ollama: Error - {}", e),
    }

    match client.list_models().await {
        Ok(models) => {
            println!("\nAvailable models:");
            for m in &models {
                let marker = if m.starts_with(classifier.model()) { "→" } else { " " };
                println!("  {} {}", marker, m);
            }
        }
        Err(e) => println!("  Error listing models: {}", e),
    }

    println!("\nConfiguration:");
    println!("  Vision model: {}", classifier.model());
    println!("  Taxonomy: {}", config.taxonomy.preset);

    Ok(())
}
