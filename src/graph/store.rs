//! In-memory feedback graph with an id side index.
//!
//! Uses `petgraph` for the graph structure and a `HashMap` for O(1) node
//! lookups by [`NodeId`]. Mutation takes `&mut self`: the store has no
//! interior locking, and callers provide the single-writer boundary (the
//! [`Engine`](crate::engine::Engine) wraps a store in an `RwLock`).

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::entity::{Component, Insight, Node, NodeId, Product, Relation, Source};
use crate::error::GraphError;

use super::EdgeData;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// An insight row resolved for reporting: the subject of the feedback via
/// the outgoing ABOUT edge and the origin url via the incoming YIELDS edge.
#[derive(Debug, Clone, Serialize)]
pub struct InsightDigest {
    pub id: NodeId,
    pub summary: String,
    pub sentiment: f32,
    pub tags: Vec<String>,
    pub subject_name: String,
    pub source_url: String,
}

/// Directed labeled graph over the four entity variants.
///
/// Node ids are globally unique: inserting with an existing id overwrites
/// the node's attributes in place (upsert) without touching edge topology.
/// Edge endpoints are checked before insertion; there is at most one edge
/// per ordered (source, target) pair, and a second write overwrites it.
/// Nodes are never deleted.
pub struct GraphStore {
    graph: DiGraph<Node, EdgeData>,
    index: HashMap<NodeId, NodeIndex>,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or overwrite a node. Existing nodes keep their NodeIndex and
    /// incident edges; only the attributes are replaced.
    fn upsert_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.index.get(node.id()) {
            self.graph[idx] = node;
            return idx;
        }
        let id = node.id().clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Raw node insertion for the snapshot codec: no edge wiring.
    pub(crate) fn insert_raw(&mut self, node: Node) {
        self.upsert_node(node);
    }

    fn resolve(&self, id: &NodeId) -> GraphResult<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound {
                id: id.to_string(),
            })
    }

    /// Insert or overwrite a Product node.
    pub fn add_product(&mut self, product: Product) {
        let id = product.id.clone();
        self.upsert_node(Node::Product(product));
        tracing::info!(%id, "added Product node");
    }

    /// Insert or overwrite a Component node and wire it to its parent:
    /// Product —HAS_COMPONENT→ Component.
    ///
    /// Fails with [`GraphError::NodeNotFound`] if the parent id is absent,
    /// or [`GraphError::KindMismatch`] if it is not a Product.
    pub fn add_component(&mut self, component: Component, product_id: &NodeId) -> GraphResult<()> {
        let parent_idx = self.resolve(product_id)?;
        match &self.graph[parent_idx] {
            Node::Product(_) => {}
            other => {
                return Err(GraphError::KindMismatch {
                    id: product_id.to_string(),
                    expected: "Product",
                    found: other.kind(),
                })
            }
        }

        let id = component.id.clone();
        let comp_idx = self.upsert_node(Node::Component(component));
        self.graph
            .update_edge(parent_idx, comp_idx, EdgeData::new(Relation::HasComponent));
        tracing::info!(%id, product = %product_id, "added Component node");
        Ok(())
    }

    /// Insert or overwrite a Source node.
    pub fn add_source(&mut self, source: Source) {
        let id = source.id.clone();
        let kind = source.kind;
        self.upsert_node(Node::Source(source));
        tracing::info!(%id, %kind, "added Source node");
    }

    /// Insert or overwrite an Insight node and wire it between its origin
    /// and its subject: Source —YIELDS→ Insight —ABOUT→ Product|Component.
    ///
    /// Both endpoints are checked: `source_id` must name a Source, and
    /// `target_id` a Product or Component.
    pub fn add_insight(
        &mut self,
        insight: Insight,
        source_id: &NodeId,
        target_id: &NodeId,
    ) -> GraphResult<()> {
        let source_idx = self.resolve(source_id)?;
        match &self.graph[source_idx] {
            Node::Source(_) => {}
            other => {
                return Err(GraphError::KindMismatch {
                    id: source_id.to_string(),
                    expected: "Source",
                    found: other.kind(),
                })
            }
        }

        let target_idx = self.resolve(target_id)?;
        match &self.graph[target_idx] {
            Node::Product(_) | Node::Component(_) => {}
            other => {
                return Err(GraphError::KindMismatch {
                    id: target_id.to_string(),
                    expected: "Product or Component",
                    found: other.kind(),
                })
            }
        }

        let id = insight.id.clone();
        let insight_idx = self.upsert_node(Node::Insight(insight));
        self.graph
            .update_edge(source_idx, insight_idx, EdgeData::new(Relation::Yields));
        self.graph
            .update_edge(insight_idx, target_idx, EdgeData::new(Relation::About));
        tracing::info!(%id, source = %source_id, target = %target_id, "added Insight node");
        Ok(())
    }

    /// Attach a computed embedding to an Insight.
    ///
    /// The absent→present transition happens once per insight in normal
    /// operation; a re-attach overwrites with the latest vector and never
    /// reverts to absent.
    pub fn attach_embedding(&mut self, id: &NodeId, embedding: Vec<f32>) -> GraphResult<()> {
        let idx = self.resolve(id)?;
        match &mut self.graph[idx] {
            Node::Insight(insight) => {
                insight.embedding = Some(embedding);
                Ok(())
            }
            other => Err(GraphError::KindMismatch {
                id: id.to_string(),
                expected: "Insight",
                found: other.kind(),
            }),
        }
    }

    /// Insert or overwrite a directed edge between two existing nodes.
    ///
    /// SEMANTIC_MATCH edges additionally require both endpoints to be
    /// Insights carrying embeddings. Used by the linker and the snapshot
    /// codec; one edge per ordered pair, second write overwrites.
    pub fn upsert_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relation: Relation,
        weight: Option<f32>,
    ) -> GraphResult<()> {
        let source_idx = self.resolve(source)?;
        let target_idx = self.resolve(target)?;

        if relation == Relation::SemanticMatch {
            for (id, idx) in [(source, source_idx), (target, target_idx)] {
                match &self.graph[idx] {
                    Node::Insight(insight) => {
                        if !insight.has_embedding() {
                            return Err(GraphError::NotEmbedded { id: id.to_string() });
                        }
                    }
                    other => {
                        return Err(GraphError::KindMismatch {
                            id: id.to_string(),
                            expected: "Insight",
                            found: other.kind(),
                        })
                    }
                }
            }
        }

        let mut data = EdgeData::new(relation);
        data.weight = weight;
        self.graph.update_edge(source_idx, target_idx, data);
        Ok(())
    }

    /// Attribute snapshot of every Component one HAS_COMPONENT hop from the
    /// given Product. No transitive traversal.
    pub fn product_hierarchy(&self, product_id: &NodeId) -> Vec<Component> {
        let Some(&idx) = self.index.get(product_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| e.weight().relation == Relation::HasComponent)
            .filter_map(|e| match &self.graph[e.target()] {
                Node::Component(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Check if a node exists.
    pub fn has_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of nodes. O(1).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges. O(1).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// All edges carrying the given relation, as (source, target, weight).
    pub fn edges_with_relation(&self, relation: Relation) -> Vec<(NodeId, NodeId, Option<f32>)> {
        self.graph
            .edge_references()
            .filter(|e| e.weight().relation == relation)
            .map(|e| {
                (
                    self.graph[e.source()].id().clone(),
                    self.graph[e.target()].id().clone(),
                    e.weight().weight,
                )
            })
            .collect()
    }

    /// All edges in the graph, as (source, target, relation, weight).
    pub fn all_edges(&self) -> Vec<(NodeId, NodeId, Relation, Option<f32>)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id().clone(),
                    self.graph[e.target()].id().clone(),
                    e.weight().relation,
                    e.weight().weight,
                )
            })
            .collect()
    }

    /// Insights carrying an embedding, in node-insertion order.
    ///
    /// Insertion order defines the pair orientation for SEMANTIC_MATCH edges
    /// (earlier-inserted → later-inserted).
    pub fn embedded_insights(&self) -> Vec<(NodeId, Vec<f32>)> {
        self.graph
            .node_indices()
            .filter_map(|idx| match &self.graph[idx] {
                Node::Insight(insight) => insight
                    .embedding
                    .as_ref()
                    .map(|emb| (insight.id.clone(), emb.clone())),
                _ => None,
            })
            .collect()
    }

    /// Insights without an embedding, as (id, summary) pairs for the
    /// embedding pass.
    pub fn unembedded_insights(&self) -> Vec<(NodeId, String)> {
        self.graph
            .node_indices()
            .filter_map(|idx| match &self.graph[idx] {
                Node::Insight(insight) if !insight.has_embedding() => {
                    Some((insight.id.clone(), insight.summary.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Insights created at or after `since` (seconds since UNIX epoch),
    /// resolved for reporting: subject name via the outgoing ABOUT edge and
    /// source url via the incoming YIELDS edge.
    pub fn insight_digests(&self, since: u64) -> Vec<InsightDigest> {
        self.graph
            .node_indices()
            .filter_map(|idx| {
                let Node::Insight(insight) = &self.graph[idx] else {
                    return None;
                };
                if insight.created_at < since {
                    return None;
                }

                let subject_name = self
                    .graph
                    .edges_directed(idx, Direction::Outgoing)
                    .find(|e| e.weight().relation == Relation::About)
                    .map(|e| self.graph[e.target()].display_name().to_owned())
                    .unwrap_or_else(|| "General".to_owned());

                let source_url = self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .find(|e| e.weight().relation == Relation::Yields)
                    .and_then(|e| match &self.graph[e.source()] {
                        Node::Source(s) => s.url.clone(),
                        _ => None,
                    })
                    .unwrap_or_default();

                Some(InsightDigest {
                    id: insight.id.clone(),
                    summary: insight.summary.clone(),
                    sentiment: insight.sentiment,
                    tags: insight.tags.clone(),
                    subject_name,
                    source_url,
                })
            })
            .collect()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
