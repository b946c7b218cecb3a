//! # kiln
//!
//! A typed knowledge graph for hardware product feedback: products, their
//! physical components, feedback sources, and the insights extracted from
//! them — plus a semantic linker that discovers latent relationships between
//! insights via embedding similarity.
//!
//! ## Architecture
//!
//! - **Entity model** (`entity`): closed set of node variants and the fixed
//!   edge-relation vocabulary
//! - **Graph store** (`graph`): petgraph-backed directed labeled graph with
//!   upsert semantics and checked edge endpoints
//! - **Snapshot codec** (`snapshot`): node-link JSON persistence with
//!   load-or-empty startup semantics
//! - **Semantic linker** (`linker`): pairwise cosine similarity over embedded
//!   insights, materialized as `SEMANTIC_MATCH` edges
//! - **Engine** (`engine`): facade owning the store behind the single-writer
//!   boundary
//!
//! ## Library usage
//!
//! ```no_run
//! use kiln::engine::{Engine, EngineConfig};
//! use kiln::entity::{Component, ComponentCategory, Product};
//! use kiln::linker::HashEmbedder;
//!
//! let engine = Engine::new(EngineConfig::default(), Box::new(HashEmbedder::new(384))).unwrap();
//! engine.add_product(Product::new("prod-1", "Drone X")).unwrap();
//! engine
//!     .add_component(
//!         Component::new("comp-1", "Battery", ComponentCategory::Electrical),
//!         "prod-1",
//!     )
//!     .unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod graph;
pub mod linker;
pub mod snapshot;
