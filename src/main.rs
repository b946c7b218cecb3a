//! kiln CLI: hardware feedback knowledge graph.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;

use kiln::engine::{Engine, EngineConfig};
use kiln::entity::{Component, Insight, NodeId, Product, Source};
use kiln::linker::{Embedder, HashEmbedder, HttpEmbedder};

#[derive(Parser)]
#[command(name = "kiln", version, about = "Hardware feedback knowledge graph")]
struct Cli {
    /// Data directory for the graph snapshot.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new kiln data directory.
    Init,

    /// Ingest entities from a JSON seed file.
    Ingest {
        /// Path to a JSON file with products, components, sources, insights.
        #[arg(long)]
        file: PathBuf,
    },

    /// Embed unembedded insights and run the semantic linking pass.
    Link {
        /// Override the configured similarity threshold.
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Show graph statistics.
    Info,

    /// Dump the full graph as a node-link JSON document.
    Export,

    /// List the components of a product.
    Hierarchy {
        /// Product node id.
        product_id: String,
    },

    /// Recent insights resolved to subject name and source url.
    Report {
        /// Look-back window in days.
        #[arg(long, default_value = "7")]
        days_back: u64,
    },
}

/// JSON seed file accepted by `kiln ingest`.
#[derive(Deserialize)]
struct SeedDocument {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    components: Vec<ComponentSeed>,
    #[serde(default)]
    sources: Vec<Source>,
    #[serde(default)]
    insights: Vec<InsightSeed>,
}

#[derive(Deserialize)]
struct ComponentSeed {
    product_id: NodeId,
    #[serde(flatten)]
    component: Component,
}

#[derive(Deserialize)]
struct InsightSeed {
    source_id: NodeId,
    target_id: NodeId,
    #[serde(flatten)]
    insight: Insight,
}

fn build_embedder(config: &EngineConfig) -> Box<dyn Embedder> {
    match &config.embedding_endpoint {
        Some(endpoint) => Box::new(HttpEmbedder::new(endpoint, config.embedding_dimension)),
        None => Box::new(HashEmbedder::new(config.embedding_dimension)),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }

    match cli.command {
        Commands::Init => {
            let data_dir = config
                .data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".kiln"));
            config.data_dir = Some(data_dir.clone());
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;
            engine.checkpoint().into_diagnostic()?;
            println!("Initialized kiln at {}", data_dir.display());
            println!("{}", engine.info());
        }

        Commands::Ingest { file } => {
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;

            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            let seed: SeedDocument = serde_json::from_str(&content).into_diagnostic()?;

            for product in seed.products {
                engine.add_product(product).into_diagnostic()?;
            }
            for entry in seed.components {
                engine
                    .add_component(entry.component, entry.product_id)
                    .into_diagnostic()?;
            }
            for source in seed.sources {
                engine.add_source(source).into_diagnostic()?;
            }
            let mut insight_count = 0;
            for entry in seed.insights {
                entry.insight.validate().into_diagnostic()?;
                engine
                    .add_insight(entry.insight, entry.source_id, entry.target_id)
                    .into_diagnostic()?;
                insight_count += 1;
            }

            engine.checkpoint().into_diagnostic()?;
            println!(
                "Ingested {insight_count} insights from {}",
                file.display()
            );
            println!("{}", engine.info());
        }

        Commands::Link { threshold } => {
            if let Some(threshold) = threshold {
                config.similarity_threshold = threshold;
            }
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;

            let added = engine.run_linking().into_diagnostic()?;
            engine.checkpoint().into_diagnostic()?;
            println!("Semantic linking complete: {added} match(es) written.");
            println!("{}", engine.info());
        }

        Commands::Info => {
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;
            println!("{}", engine.info());
        }

        Commands::Export => {
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;
            let document = engine.export_document();
            let json = serde_json::to_string_pretty(&document).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Hierarchy { product_id } => {
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;

            let components = engine.hierarchy(product_id.as_str());
            if components.is_empty() {
                println!("No components found for product \"{product_id}\".");
            } else {
                println!("Components of \"{product_id}\" ({}):", components.len());
                for component in &components {
                    println!("  {} / {} [{}]", component.name, component.id, component.category);
                }
            }
        }

        Commands::Report { days_back } => {
            let embedder = build_embedder(&config);
            let engine = Engine::new(config, embedder).into_diagnostic()?;

            let digests = engine.report(days_back);
            if digests.is_empty() {
                println!("No insights in the last {days_back} day(s).");
            } else {
                let json = serde_json::to_string_pretty(&digests).into_diagnostic()?;
                println!("{json}");
            }
        }
    }

    Ok(())
}
