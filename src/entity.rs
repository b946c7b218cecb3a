//! Core entity types for the kiln graph.
//!
//! Nodes form a closed set of four variants — [`Product`], [`Component`],
//! [`Source`], [`Insight`] — sharing a single [`NodeId`] namespace. Edges
//! carry one of the fixed [`Relation`] labels. Both discriminators have
//! stable wire spellings (`node_type` / `relation`) used by the snapshot
//! codec.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Unique node identifier, shared across all node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        NodeId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        NodeId(raw.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        NodeId(raw)
    }
}

/// Physical sub-system classification for a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentCategory {
    Mechanical,
    Electrical,
    Firmware,
    Packaging,
    Unknown,
}

impl std::fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentCategory::Mechanical => "Mechanical",
            ComponentCategory::Electrical => "Electrical",
            ComponentCategory::Firmware => "Firmware",
            ComponentCategory::Packaging => "Packaging",
            ComponentCategory::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

/// Origin channel for ingested feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Website,
    Reddit,
    Review,
    #[serde(rename = "Employee_Interview")]
    EmployeeInterview,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceType::Website => "Website",
            SourceType::Reddit => "Reddit",
            SourceType::Review => "Review",
            SourceType::EmployeeInterview => "Employee_Interview",
        };
        write!(f, "{name}")
    }
}

/// The top-level device being analysed; root of a feedback hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: NodeId,
    /// Human-readable product name.
    pub name: String,
    /// Brief product description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL the product data was gathered from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A physical sub-system of a [`Product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: NodeId,
    /// Component name (e.g. "Battery Module").
    pub name: String,
    /// Sub-system classification.
    pub category: ComponentCategory,
}

impl Component {
    pub fn new(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        category: ComponentCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
        }
    }
}

/// Origin record for a piece of ingested feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: NodeId,
    /// Channel the feedback came from.
    #[serde(rename = "type")]
    pub kind: SourceType,
    /// Original, unprocessed feedback text.
    pub raw_text: String,
    /// Permalink to the source material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Source {
    pub fn new(id: impl Into<NodeId>, kind: SourceType, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            raw_text: raw_text.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A single actionable insight extracted from a [`Source`].
///
/// Sentiment is range-checked at construction; the embedding starts absent
/// and transitions once to present when computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: NodeId,
    /// Concise description of the feedback.
    pub summary: String,
    /// Sentiment score from -1.0 (negative) to 1.0 (positive).
    pub sentiment: f32,
    /// Free-form topic tags, in extraction order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Vector embedding for semantic similarity, absent until computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Creation timestamp (seconds since UNIX epoch); drives recency queries.
    #[serde(default)]
    pub created_at: u64,
}

impl Insight {
    /// Create a new insight, rejecting sentiment outside [-1.0, 1.0].
    pub fn new(
        id: impl Into<NodeId>,
        summary: impl Into<String>,
        sentiment: f32,
    ) -> Result<Self, ValidationError> {
        let insight = Self {
            id: id.into(),
            summary: summary.into(),
            sentiment,
            tags: Vec::new(),
            embedding: None,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };
        insight.validate()?;
        Ok(insight)
    }

    /// Re-check construction invariants. Useful after deserializing an
    /// insight from an external document, which bypasses [`Insight::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-1.0..=1.0).contains(&self.sentiment) {
            return Err(ValidationError::SentimentOutOfRange {
                value: self.sentiment,
            });
        }
        Ok(())
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// A node in the graph: the closed set of entity variants.
///
/// Serializes with a `node_type` discriminator and the variant's fields
/// inlined, matching the node-link snapshot shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type")]
pub enum Node {
    Product(Product),
    Component(Component),
    Source(Source),
    Insight(Insight),
}

impl Node {
    /// The node's id, regardless of variant.
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Product(p) => &p.id,
            Node::Component(c) => &c.id,
            Node::Source(s) => &s.id,
            Node::Insight(i) => &i.id,
        }
    }

    /// Variant name, as spelled in the `node_type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Product(_) => "Product",
            Node::Component(_) => "Component",
            Node::Source(_) => "Source",
            Node::Insight(_) => "Insight",
        }
    }

    /// Display name used when resolving an ABOUT edge to a subject.
    pub fn display_name(&self) -> &str {
        match self {
            Node::Product(p) => &p.name,
            Node::Component(c) => &c.name,
            Node::Source(s) => s.id.as_str(),
            Node::Insight(i) => i.id.as_str(),
        }
    }
}

/// The fixed edge-relation vocabulary. All edges are directed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Product → Component: structural membership.
    #[serde(rename = "HAS_COMPONENT")]
    HasComponent,
    /// Source → Insight: provenance.
    #[serde(rename = "YIELDS")]
    Yields,
    /// Insight → Product|Component: subject of feedback.
    #[serde(rename = "ABOUT")]
    About,
    /// Insight → Insight: similarity link carrying a rounded cosine weight.
    #[serde(rename = "SEMANTIC_MATCH")]
    SemanticMatch,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Relation::HasComponent => "HAS_COMPONENT",
            Relation::Yields => "YIELDS",
            Relation::About => "ABOUT",
            Relation::SemanticMatch => "SEMANTIC_MATCH",
        };
        write!(f, "{name}")
    }
}
