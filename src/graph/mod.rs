//! Typed feedback graph: products, components, sources, and insights.
//!
//! The graph stores [`Node`](crate::entity::Node) variants connected by
//! directed edges labeled with a [`Relation`](crate::entity::Relation):
//!
//! ```text
//! Product ──HAS_COMPONENT──▶ Component
//! Source  ──YIELDS────────▶ Insight ──ABOUT──▶ Product | Component
//! Insight ──SEMANTIC_MATCH─▶ Insight   (weight = rounded cosine score)
//! ```
//!
//! [`store::GraphStore`] is the in-memory layer; the snapshot codec in
//! [`crate::snapshot`] round-trips it through a node-link JSON document.

pub mod store;

use serde::{Deserialize, Serialize};

use crate::entity::Relation;

/// Edge payload stored on petgraph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Which edge kind connects the two nodes.
    pub relation: Relation,
    /// Similarity score for SEMANTIC_MATCH edges; absent elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

impl EdgeData {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }
}
