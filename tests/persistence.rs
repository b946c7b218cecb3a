//! Persistence and recovery tests: snapshot round-trips, restart cycles,
//! and the load-or-empty degradation on missing or corrupt files.

use kiln::engine::{Engine, EngineConfig};
use kiln::entity::{
    Component, ComponentCategory, Insight, Product, Relation, Source, SourceType,
};
use kiln::linker::HashEmbedder;

fn persistent_engine(dir: &std::path::Path) -> Engine {
    Engine::new(
        EngineConfig {
            data_dir: Some(dir.to_path_buf()),
            ..Default::default()
        },
        Box::new(HashEmbedder::new(32)),
    )
    .unwrap()
}

#[test]
fn graph_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    // First session: build the graph and checkpoint.
    {
        let engine = persistent_engine(dir.path());
        engine
            .add_product(Product::new("drone-x", "Drone X"))
            .unwrap();
        engine
            .add_component(
                Component::new("battery", "Battery", ComponentCategory::Electrical),
                "drone-x",
            )
            .unwrap();
        engine
            .add_source(
                Source::new("reddit-1", SourceType::Reddit, "overheats")
                    .with_url("https://reddit.com/r/drones/1"),
            )
            .unwrap();
        engine
            .ingest_insight(
                Insight::new("ins-1", "Device overheats during extended use", -0.8).unwrap(),
                "reddit-1",
                "battery",
            )
            .unwrap();
        engine.checkpoint().unwrap();
    }

    // Second session: reopen and verify counts, labels, and resolution.
    {
        let engine = persistent_engine(dir.path());
        let info = engine.info();
        assert_eq!(info.node_count, 4);
        assert_eq!(info.edge_count, 3);
        assert_eq!(info.embedded_count, 1);

        let hierarchy = engine.hierarchy("drone-x");
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy[0].name, "Battery");

        let digests = engine.report(7);
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].subject_name, "Battery");
        assert_eq!(digests[0].source_url, "https://reddit.com/r/drones/1");
    }
}

#[test]
fn semantic_matches_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    {
        let engine = persistent_engine(dir.path());
        engine
            .add_product(Product::new("drone-x", "Drone X"))
            .unwrap();
        engine
            .add_source(Source::new("src-1", SourceType::Review, "text"))
            .unwrap();
        for id in ["ins-1", "ins-2"] {
            engine
                .ingest_insight(
                    Insight::new(id, "Battery drains too fast", -0.7).unwrap(),
                    "src-1",
                    "drone-x",
                )
                .unwrap();
        }
        assert_eq!(engine.info().semantic_matches, 1);
        engine.checkpoint().unwrap();
    }

    {
        let engine = persistent_engine(dir.path());
        let document = engine.export_document();
        let matched: Vec<_> = document
            .edges
            .iter()
            .filter(|e| e.relation == Relation::SemanticMatch)
            .collect();
        assert_eq!(matched.len(), 1);
        // Identical summaries score 1.0 with the deterministic embedder.
        assert_eq!(matched[0].weight, Some(1.0));

        // Relinking over the already-linked pair refreshes rather than
        // duplicating.
        assert_eq!(engine.run_linking().unwrap(), 1);
        assert_eq!(engine.info().semantic_matches, 1);
    }
}

#[test]
fn first_run_starts_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = persistent_engine(dir.path());
    let info = engine.info();
    assert_eq!(info.node_count, 0);
    assert_eq!(info.edge_count, 0);
}

#[test]
fn corrupt_snapshot_degrades_to_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("export.json"), "not json at all").unwrap();

    let engine = persistent_engine(dir.path());
    assert_eq!(engine.info().node_count, 0);

    // The next checkpoint overwrites the corrupt file with a valid snapshot.
    let engine2 = {
        engine
            .add_product(Product::new("drone-x", "Drone X"))
            .unwrap();
        engine.checkpoint().unwrap();
        persistent_engine(dir.path())
    };
    assert_eq!(engine2.info().node_count, 1);
}

#[test]
fn checkpoint_overwrites_wholesale() {
    let dir = tempfile::TempDir::new().unwrap();

    {
        let engine = persistent_engine(dir.path());
        engine
            .add_product(Product::new("drone-x", "Drone X"))
            .unwrap();
        engine
            .add_product(Product::new("drone-y", "Drone Y"))
            .unwrap();
        engine.checkpoint().unwrap();
    }

    // A second session that only ever saw one product persists only that
    // state: the save is a wholesale overwrite, not a merge.
    {
        let engine = Engine::new(
            EngineConfig {
                data_dir: Some(dir.path().to_path_buf()),
                snapshot_file: "other.json".into(),
                ..Default::default()
            },
            Box::new(HashEmbedder::new(32)),
        )
        .unwrap();
        engine
            .add_product(Product::new("drone-z", "Drone Z"))
            .unwrap();
        engine.checkpoint().unwrap();
    }

    let other = std::fs::read_to_string(dir.path().join("other.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&other).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 1);

    // The original snapshot is untouched.
    let original = std::fs::read_to_string(dir.path().join("export.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&original).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
}
