//! Engine configuration, persisted as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Configuration for the kiln engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Snapshot file name inside the data directory.
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    /// Minimum cosine similarity for a SEMANTIC_MATCH edge (inclusive).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Fixed embedding vector length.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    /// HTTP embedding provider endpoint. `None` uses the deterministic
    /// offline embedder.
    #[serde(default)]
    pub embedding_endpoint: Option<String>,
}

fn default_snapshot_file() -> String {
    "export.json".into()
}
fn default_similarity_threshold() -> f32 {
    0.75
}
fn default_embedding_dimension() -> usize {
    384
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: default_snapshot_file(),
            similarity_threshold: default_similarity_threshold(),
            embedding_dimension: default_embedding_dimension(),
            embedding_endpoint: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| EngineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// The snapshot path, if persistence is configured.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(&self.snapshot_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.similarity_threshold, 0.75);
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.snapshot_file, "export.json");
        assert!(config.snapshot_path().is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            similarity_threshold = 0.8
            data_dir = "/tmp/kiln"
            "#,
        )
        .unwrap();
        assert_eq!(config.similarity_threshold, 0.8);
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(
            config.snapshot_path().unwrap(),
            PathBuf::from("/tmp/kiln/export.json")
        );
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kiln.toml");
        let config = EngineConfig {
            similarity_threshold: 0.9,
            ..Default::default()
        };
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.similarity_threshold, 0.9);
    }

    #[test]
    fn missing_config_file_errors() {
        let err = EngineConfig::from_file(Path::new("/does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, EngineError::ConfigRead { .. }));
    }
}
