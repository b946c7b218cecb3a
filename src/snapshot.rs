//! Snapshot codec: node-link JSON persistence for the graph.
//!
//! The on-disk shape is a single document with top-level `nodes` (each node
//! with its attributes and a `node_type` discriminator) and `edges` (each
//! with `source`, `target`, `relation`, and an optional `weight`). `links`
//! is accepted as an alias for `edges` on read.
//!
//! Startup is availability-over-consistency: a missing file yields an empty
//! store (expected on first run), and a corrupt file is logged and degraded
//! to an empty store rather than blocking the process. Saves overwrite the
//! file wholesale and are not transactional; callers checkpoint after
//! confirmed mutation batches and at clean shutdown.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{Node, NodeId, Relation};
use crate::error::PersistError;
use crate::graph::store::GraphStore;

/// Result type for persistence operations.
pub type PersistResult<T> = std::result::Result<T, PersistError>;

/// A single edge row in the node-link document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

/// The full node-link document. Round-trips the store losslessly:
/// node and relation discriminators keep their wire spellings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    #[serde(alias = "links")]
    pub edges: Vec<EdgeRecord>,
}

/// Export the store as a node-link document, independent of the persistence
/// checkpoint cycle (full-dump contract).
pub fn export(store: &GraphStore) -> GraphDocument {
    GraphDocument {
        nodes: store.nodes().cloned().collect(),
        edges: store
            .all_edges()
            .into_iter()
            .map(|(source, target, relation, weight)| EdgeRecord {
                source,
                target,
                relation,
                weight,
            })
            .collect(),
    }
}

/// Rebuild a store from a document.
///
/// Nodes are inserted first (in document order, preserving the pair
/// orientation the linker relies on), then edges. Edges referencing unknown
/// ids fail the whole decode.
fn restore(document: GraphDocument) -> Result<GraphStore, crate::error::GraphError> {
    let mut store = GraphStore::new();
    for node in document.nodes {
        store.insert_raw(node);
    }
    for edge in document.edges {
        store.upsert_edge(&edge.source, &edge.target, edge.relation, edge.weight)?;
    }
    Ok(store)
}

/// Load a store from `path`.
///
/// Missing file → empty store. Unreadable or unparseable file → warn and
/// empty store; a corrupt snapshot never blocks startup, but its data is
/// lost at the next save.
pub fn load(path: &Path) -> GraphStore {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no snapshot found, starting empty");
        return GraphStore::new();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to read snapshot, starting empty");
            return GraphStore::new();
        }
    };

    let document: GraphDocument = match serde_json::from_str(&content) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to parse snapshot, starting empty");
            return GraphStore::new();
        }
    };

    match restore(document) {
        Ok(store) => {
            tracing::info!(
                path = %path.display(),
                nodes = store.node_count(),
                edges = store.edge_count(),
                "loaded graph snapshot"
            );
            store
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "snapshot references unknown nodes, starting empty");
            GraphStore::new()
        }
    }
}

/// Persist the store to `path`, overwriting any previous snapshot.
/// Parent directories are created as needed.
pub fn save(store: &GraphStore, path: &Path) -> PersistResult<()> {
    let document = export(store);
    let json =
        serde_json::to_string_pretty(&document).map_err(|e| PersistError::Serialize {
            message: e.to_string(),
        })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        nodes = store.node_count(),
        edges = store.edge_count(),
        "graph snapshot saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Component, ComponentCategory, Insight, Product, Source, SourceType};

    fn sample_store() -> GraphStore {
        let mut store = GraphStore::new();
        store.add_product(Product::new("prod-1", "Drone X").with_url("https://dji.example"));
        store
            .add_component(
                Component::new("comp-1", "Battery", ComponentCategory::Electrical),
                &"prod-1".into(),
            )
            .unwrap();
        store.add_source(
            Source::new("src-1", SourceType::Reddit, "overheats after 10 min")
                .with_url("https://reddit.com/r/drones/1"),
        );
        store
            .add_insight(
                Insight::new("ins-1", "Device overheats during extended use", -0.8).unwrap(),
                &"src-1".into(),
                &"comp-1".into(),
            )
            .unwrap();
        store
    }

    #[test]
    fn export_shape() {
        let store = sample_store();
        let document = export(&store);
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(json["edges"].as_array().unwrap().len(), 3);

        let relations: Vec<&str> = json["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["relation"].as_str().unwrap())
            .collect();
        assert!(relations.contains(&"HAS_COMPONENT"));
        assert!(relations.contains(&"YIELDS"));
        assert!(relations.contains(&"ABOUT"));
    }

    #[test]
    fn round_trip_preserves_counts_and_relations() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.json");

        let store = sample_store();
        save(&store, &path).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded.node_count(), store.node_count());
        assert_eq!(loaded.edge_count(), store.edge_count());

        let labeled = |s: &GraphStore| {
            let mut edges: Vec<(NodeId, NodeId, String)> = s
                .all_edges()
                .into_iter()
                .map(|(source, target, relation, _)| (source, target, relation.to_string()))
                .collect();
            edges.sort();
            edges
        };
        assert_eq!(labeled(&store), labeled(&loaded));
    }

    #[test]
    fn round_trip_preserves_embeddings_and_weights() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.json");

        let mut store = sample_store();
        store
            .add_insight(
                Insight::new("ins-2", "Battery drains fast", -0.6).unwrap(),
                &"src-1".into(),
                &"comp-1".into(),
            )
            .unwrap();
        store
            .attach_embedding(&"ins-1".into(), vec![1.0, 0.0])
            .unwrap();
        store
            .attach_embedding(&"ins-2".into(), vec![1.0, 0.0])
            .unwrap();
        store
            .upsert_edge(
                &"ins-1".into(),
                &"ins-2".into(),
                crate::entity::Relation::SemanticMatch,
                Some(0.92),
            )
            .unwrap();

        save(&store, &path).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded.embedded_insights().len(), 2);
        let matches = loaded.edges_with_relation(crate::entity::Relation::SemanticMatch);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].2, Some(0.92));
    }

    #[test]
    fn missing_file_yields_empty_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = load(&dir.path().join("does-not-exist.json"));
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn corrupt_file_yields_empty_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = load(&path);
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn links_alias_accepted() {
        let json = r#"{
            "nodes": [
                {"node_type": "Product", "id": "prod-1", "name": "Drone X"}
            ],
            "links": []
        }"#;
        let document: GraphDocument = serde_json::from_str(json).unwrap();
        assert!(document.edges.is_empty());
        assert_eq!(document.nodes.len(), 1);
    }

    #[test]
    fn dangling_edge_degrades_to_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"{
                "nodes": [{"node_type": "Product", "id": "prod-1", "name": "Drone X"}],
                "edges": [{"source": "prod-1", "target": "ghost", "relation": "HAS_COMPONENT"}]
            }"#,
        )
        .unwrap();

        let store = load(&path);
        assert_eq!(store.node_count(), 0);
    }
}
