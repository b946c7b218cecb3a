//! Semantic linker: embeddings and cosine-similarity edges over insights.
//!
//! Embedding generation is a pluggable capability behind the [`Embedder`]
//! trait (text in, fixed-length vector out). The [`SemanticLinker`] compares
//! embedded insights pairwise and materializes `SEMANTIC_MATCH` edges for
//! scores at or above the configured threshold, weight rounded to four
//! decimal places.
//!
//! Two passes exist: [`SemanticLinker::link_all`] scans the full embedded
//! population (O(n²), the weekly bulk path), and
//! [`SemanticLinker::link_new`] compares only newly embedded insights
//! against the rest (O(new × total), the per-batch incremental path). Both
//! orient each unordered pair by node-insertion order, so re-running either
//! pass refreshes the same directed edge with the latest score instead of
//! stacking a mirror edge.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::entity::{NodeId, Relation};
use crate::error::{KilnResult, LinkerError};
use crate::graph::store::GraphStore;

/// Result type for linker operations.
pub type LinkerResult<T> = std::result::Result<T, LinkerError>;

/// An embedding provider: text in, fixed-length vector out.
///
/// Providers are assumed deterministic (identical text yields vectors equal
/// for similarity purposes); the linker does not enforce this.
pub trait Embedder: Send + Sync {
    /// The fixed vector length this provider produces.
    fn dimension(&self) -> usize;

    /// Encode a single string into a dense vector of `dimension()` floats.
    fn embed(&self, text: &str) -> LinkerResult<Vec<f32>>;
}

/// Embedding provider backed by a sync HTTP endpoint.
///
/// POSTs `{"text": …}` and expects `{"embedding": [ … ]}` with exactly the
/// configured dimension.
pub struct HttpEmbedder {
    endpoint: String,
    dimension: usize,
    agent: ureq::Agent,
}

#[derive(serde::Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, dimension: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            dimension,
            agent: ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(30))
                .build(),
        }
    }
}

impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> LinkerResult<Vec<f32>> {
        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(ureq::json!({ "text": text }))
            .map_err(|e| LinkerError::Provider {
                message: e.to_string(),
            })?;
        let body: EmbeddingResponse =
            response.into_json().map_err(|e| LinkerError::Provider {
                message: format!("malformed embedding response: {e}"),
            })?;
        if body.embedding.len() != self.dimension {
            return Err(LinkerError::DimensionMismatch {
                expected: self.dimension,
                actual: body.embedding.len(),
            });
        }
        Ok(body.embedding)
    }
}

/// Deterministic offline embedder: a unit vector seeded from the text hash.
///
/// Identical text always yields the identical vector, which is all the
/// similarity contract requires. Useful for tests and offline runs; real
/// deployments configure an [`HttpEmbedder`].
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> LinkerResult<Vec<f32>> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let mut vector: Vec<f32> = (0..self.dimension)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// Cosine similarity between two vectors, in [-1.0, 1.0].
///
/// Fails loudly on a length mismatch rather than producing a meaningless
/// score. A zero-norm vector scores 0.0 against everything.
pub fn cosine(a: &[f32], b: &[f32]) -> LinkerResult<f32> {
    if a.len() != b.len() {
        return Err(LinkerError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Round a similarity score to the fixed 4-decimal edge-weight precision.
fn round4(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}

/// Pairwise similarity linker over embedded insights.
#[derive(Debug, Clone, Copy)]
pub struct SemanticLinker {
    threshold: f32,
}

impl SemanticLinker {
    /// Create a linker with the given minimum cosine score (inclusive).
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Embed every insight that does not yet carry a vector, using the
    /// insight summary as the text. Returns the ids newly embedded.
    pub fn embed_missing(
        &self,
        store: &mut GraphStore,
        embedder: &dyn Embedder,
    ) -> KilnResult<Vec<NodeId>> {
        let pending = store.unembedded_insights();
        let mut embedded = Vec::with_capacity(pending.len());
        for (id, summary) in pending {
            let vector = embedder.embed(&summary)?;
            store.attach_embedding(&id, vector)?;
            embedded.push(id);
        }
        if !embedded.is_empty() {
            tracing::info!(count = embedded.len(), "embedded insights");
        }
        Ok(embedded)
    }

    /// Full pairwise pass over every embedded insight.
    ///
    /// Fewer than two embedded insights yields 0 with no graph mutation.
    /// A dimension error aborts the pass; edges already written in the pass
    /// stay in place. Returns the number of edges written (including weight
    /// refreshes of already-linked pairs).
    pub fn link_all(&self, store: &mut GraphStore) -> KilnResult<usize> {
        let embedded = store.embedded_insights();
        if embedded.len() < 2 {
            tracing::info!("fewer than 2 embedded insights, nothing to link");
            return Ok(0);
        }
        self.link_pairs(store, &embedded, None)
    }

    /// Incremental pass: compare only the given newly embedded insights
    /// against the full embedded population (and against each other).
    ///
    /// Pair orientation is node-insertion order, exactly as in
    /// [`Self::link_all`], so this can only refresh edges the full pass
    /// would write.
    pub fn link_new(&self, store: &mut GraphStore, new_ids: &[NodeId]) -> KilnResult<usize> {
        if new_ids.is_empty() {
            return Ok(0);
        }
        let embedded = store.embedded_insights();
        if embedded.len() < 2 {
            tracing::info!("fewer than 2 embedded insights, nothing to link");
            return Ok(0);
        }
        let new: HashSet<&NodeId> = new_ids.iter().collect();
        self.link_pairs(store, &embedded, Some(&new))
    }

    fn link_pairs(
        &self,
        store: &mut GraphStore,
        embedded: &[(NodeId, Vec<f32>)],
        only_touching: Option<&HashSet<&NodeId>>,
    ) -> KilnResult<usize> {
        let mut added = 0;
        for i in 0..embedded.len() {
            for j in (i + 1)..embedded.len() {
                if let Some(new) = only_touching {
                    if !new.contains(&embedded[i].0) && !new.contains(&embedded[j].0) {
                        continue;
                    }
                }
                let score = cosine(&embedded[i].1, &embedded[j].1)?;
                if score >= self.threshold {
                    let weight = round4(score);
                    store.upsert_edge(
                        &embedded[i].0,
                        &embedded[j].0,
                        Relation::SemanticMatch,
                        Some(weight),
                    )?;
                    tracing::info!(
                        a = %embedded[i].0,
                        b = %embedded[j].0,
                        weight,
                        "SEMANTIC_MATCH"
                    );
                    added += 1;
                }
            }
        }
        tracing::info!(
            added,
            insights = embedded.len(),
            threshold = self.threshold,
            "semantic linking pass complete"
        );
        Ok(added)
    }
}
