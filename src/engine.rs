//! Engine facade: top-level API for the kiln graph core.
//!
//! The `Engine` owns the graph store, the embedding provider, and the
//! semantic linker, and provides the public interface external producers
//! (harvesters, extractors, interview surfaces) and consumers (reporting)
//! call into.
//!
//! ## Writer exclusion
//!
//! The store sits behind an `RwLock`; every mutating method takes the write
//! lock for the whole mutation batch, so one logical writer runs at a time.
//! That lock is the store's documented mutual-exclusion boundary — there is
//! no finer-grained transaction protocol, and a process crash between a
//! mutation and the next [`Engine::checkpoint`] loses that mutation.

use std::sync::RwLock;

pub use crate::config::EngineConfig;

use crate::entity::{Component, Insight, NodeId, Product, Relation, Source};
use crate::error::{EngineError, KilnResult};
use crate::graph::store::{GraphStore, InsightDigest};
use crate::linker::{Embedder, SemanticLinker};
use crate::snapshot::{self, GraphDocument};

const SECONDS_PER_DAY: u64 = 86_400;

/// The kiln feedback-graph engine.
pub struct Engine {
    config: EngineConfig,
    store: RwLock<GraphStore>,
    embedder: Box<dyn Embedder>,
    linker: SemanticLinker,
}

impl Engine {
    /// Create a new engine with the given configuration and embedding
    /// provider.
    ///
    /// If a data directory is configured, it is created and the snapshot is
    /// loaded from it (missing or corrupt snapshots degrade to an empty
    /// store, never an error).
    pub fn new(config: EngineConfig, embedder: Box<dyn Embedder>) -> KilnResult<Self> {
        if !(-1.0..=1.0).contains(&config.similarity_threshold) {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "similarity_threshold {} outside [-1.0, 1.0]",
                    config.similarity_threshold
                ),
            }
            .into());
        }
        if config.embedding_dimension == 0 {
            return Err(EngineError::InvalidConfig {
                message: "embedding_dimension must be > 0".into(),
            }
            .into());
        }

        let store = if let Some(ref dir) = config.data_dir {
            std::fs::create_dir_all(dir).map_err(|_| EngineError::DataDir {
                path: dir.display().to_string(),
            })?;
            snapshot::load(&config.snapshot_path().expect("data_dir is set"))
        } else {
            GraphStore::new()
        };

        tracing::info!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            threshold = config.similarity_threshold,
            persistent = config.data_dir.is_some(),
            "initializing kiln engine"
        );

        let linker = SemanticLinker::new(config.similarity_threshold);
        Ok(Self {
            config,
            store: RwLock::new(store),
            embedder,
            linker,
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, GraphStore> {
        self.store.write().expect("store lock poisoned")
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, GraphStore> {
        self.store.read().expect("store lock poisoned")
    }

    /// Insert or overwrite a Product node.
    pub fn add_product(&self, product: Product) -> KilnResult<()> {
        self.write().add_product(product);
        Ok(())
    }

    /// Insert or overwrite a Component node under its parent Product.
    pub fn add_component(
        &self,
        component: Component,
        product_id: impl Into<NodeId>,
    ) -> KilnResult<()> {
        self.write().add_component(component, &product_id.into())?;
        Ok(())
    }

    /// Insert or overwrite a Source node.
    pub fn add_source(&self, source: Source) -> KilnResult<()> {
        self.write().add_source(source);
        Ok(())
    }

    /// Insert an Insight without embedding it. The bulk pipeline uses this,
    /// deferring embedding and linking to [`Self::run_linking`].
    pub fn add_insight(
        &self,
        insight: Insight,
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
    ) -> KilnResult<()> {
        self.write()
            .add_insight(insight, &source_id.into(), &target_id.into())?;
        Ok(())
    }

    /// Insert an Insight, embed it immediately, and incrementally link it
    /// against the embedded population (the interview-completion path).
    ///
    /// Returns the number of SEMANTIC_MATCH edges written. The whole batch
    /// runs under one write guard.
    pub fn ingest_insight(
        &self,
        insight: Insight,
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
    ) -> KilnResult<usize> {
        let id = insight.id.clone();
        let vector = self.embedder.embed(&insight.summary)?;

        let mut store = self.write();
        store.add_insight(insight, &source_id.into(), &target_id.into())?;
        store.attach_embedding(&id, vector)?;
        let added = self.linker.link_new(&mut store, &[id])?;
        Ok(added)
    }

    /// Bulk path: embed every insight still missing a vector, then link.
    ///
    /// Newly embedded insights are linked incrementally (O(new × total));
    /// when nothing is newly embedded the full O(n²) population rescan runs
    /// instead, refreshing every stored weight.
    pub fn run_linking(&self) -> KilnResult<usize> {
        let mut store = self.write();
        let newly = self.linker.embed_missing(&mut store, self.embedder.as_ref())?;
        if newly.is_empty() {
            self.linker.link_all(&mut store)
        } else {
            self.linker.link_new(&mut store, &newly)
        }
    }

    /// Attribute snapshot of a Product's direct Components.
    pub fn hierarchy(&self, product_id: impl Into<NodeId>) -> Vec<Component> {
        self.read().product_hierarchy(&product_id.into())
    }

    /// Insights from the last `days_back` days, resolved to subject name
    /// and source url for briefing consumers.
    pub fn report(&self, days_back: u64) -> Vec<InsightDigest> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let cutoff = now.saturating_sub(days_back.saturating_mul(SECONDS_PER_DAY));
        self.read().insight_digests(cutoff)
    }

    /// Full node-link dump of the graph, independent of the persistence
    /// checkpoint cycle.
    pub fn export_document(&self) -> GraphDocument {
        snapshot::export(&self.read())
    }

    /// Persist the current graph to the configured snapshot path.
    /// A no-op in memory-only mode. Call after confirmed mutation batches
    /// and at clean shutdown.
    pub fn checkpoint(&self) -> KilnResult<()> {
        if let Some(path) = self.config.snapshot_path() {
            snapshot::save(&self.read(), &path)?;
        }
        Ok(())
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary counters for observability.
    pub fn info(&self) -> EngineInfo {
        let store = self.read();
        let mut insights = 0;
        let mut embedded = 0;
        for node in store.nodes() {
            if let crate::entity::Node::Insight(insight) = node {
                insights += 1;
                if insight.has_embedding() {
                    embedded += 1;
                }
            }
        }
        EngineInfo {
            node_count: store.node_count(),
            edge_count: store.edge_count(),
            insight_count: insights,
            embedded_count: embedded,
            semantic_matches: store.edges_with_relation(Relation::SemanticMatch).len(),
            similarity_threshold: self.config.similarity_threshold,
            persistent: self.config.data_dir.is_some(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("store", &*self.read())
            .finish()
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub node_count: usize,
    pub edge_count: usize,
    pub insight_count: usize,
    pub embedded_count: usize,
    pub semantic_matches: usize,
    pub similarity_threshold: f32,
    pub persistent: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "kiln engine info")?;
        writeln!(f, "  nodes:            {}", self.node_count)?;
        writeln!(f, "  edges:            {}", self.edge_count)?;
        writeln!(f, "  insights:         {}", self.insight_count)?;
        writeln!(f, "  embedded:         {}", self.embedded_count)?;
        writeln!(f, "  semantic matches: {}", self.semantic_matches)?;
        writeln!(f, "  threshold:        {}", self.similarity_threshold)?;
        writeln!(f, "  persistent:       {}", self.persistent)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ComponentCategory, SourceType};
    use crate::linker::HashEmbedder;

    fn memory_engine() -> Engine {
        Engine::new(EngineConfig::default(), Box::new(HashEmbedder::new(16))).unwrap()
    }

    #[test]
    fn create_memory_only_engine() {
        let engine = memory_engine();
        let info = engine.info();
        assert_eq!(info.node_count, 0);
        assert!(!info.persistent);
    }

    #[test]
    fn invalid_threshold_rejected() {
        let config = EngineConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(Engine::new(config, Box::new(HashEmbedder::new(16))).is_err());
    }

    #[test]
    fn zero_dimension_rejected() {
        let config = EngineConfig {
            embedding_dimension: 0,
            ..Default::default()
        };
        assert!(Engine::new(config, Box::new(HashEmbedder::new(16))).is_err());
    }

    #[test]
    fn ingest_insight_embeds_immediately() {
        let engine = memory_engine();
        engine.add_product(Product::new("prod-1", "Drone X")).unwrap();
        engine
            .add_source(Source::new("src-1", SourceType::Reddit, "thread"))
            .unwrap();
        engine
            .ingest_insight(
                Insight::new("ins-1", "Device overheats", -0.8).unwrap(),
                "src-1",
                "prod-1",
            )
            .unwrap();

        let info = engine.info();
        assert_eq!(info.insight_count, 1);
        assert_eq!(info.embedded_count, 1);
    }

    #[test]
    fn duplicate_insights_link_semantically() {
        let engine = memory_engine();
        engine.add_product(Product::new("prod-1", "Drone X")).unwrap();
        engine
            .add_source(Source::new("src-1", SourceType::Reddit, "thread"))
            .unwrap();

        // Identical summaries embed identically with the hash embedder.
        engine
            .ingest_insight(
                Insight::new("ins-1", "Device overheats", -0.8).unwrap(),
                "src-1",
                "prod-1",
            )
            .unwrap();
        let added = engine
            .ingest_insight(
                Insight::new("ins-2", "Device overheats", -0.7).unwrap(),
                "src-1",
                "prod-1",
            )
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(engine.info().semantic_matches, 1);
    }

    #[test]
    fn hierarchy_and_info() {
        let engine = memory_engine();
        engine.add_product(Product::new("prod-1", "Drone X")).unwrap();
        engine
            .add_component(
                Component::new("comp-1", "Battery", ComponentCategory::Electrical),
                "prod-1",
            )
            .unwrap();

        let hierarchy = engine.hierarchy("prod-1");
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy[0].name, "Battery");

        let info = engine.info();
        assert_eq!(info.node_count, 2);
        assert_eq!(info.edge_count, 1);
    }

    #[test]
    fn checkpoint_is_noop_without_data_dir() {
        let engine = memory_engine();
        engine.checkpoint().unwrap();
    }
}
