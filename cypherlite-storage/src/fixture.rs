//! JSON graph fixtures.
//!
//! A fixture seeds a [`MemGraph`] at start-up:
//!
//! ```json
//! {
//!   "nodes": [{"id": "a", "class": "Person", "properties": {"name": "Ann"}}],
//!   "edges": [{"source": "a", "target": "b", "label": "KNOWS"}]
//! }
//! ```

use crate::error::Result;
use crate::memgraph::{MemGraph, generate_id};
use cypherlite_api::{EdgeId, NodeId, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFixture {
    #[serde(default)]
    pub nodes: Vec<NodeFixture>,
    #[serde(default)]
    pub edges: Vec<EdgeFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFixture {
    pub id: NodeId,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFixture {
    #[serde(default)]
    pub id: Option<EdgeId>,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub label: Option<String>,
}

impl MemGraph {
    pub fn from_fixture(fixture: GraphFixture) -> Result<Self> {
        let mut graph = MemGraph::new();
        for node in fixture.nodes {
            graph.add_node(node.id, node.class.as_deref(), node.properties)?;
        }
        for edge in fixture.edges {
            let id = edge.id.unwrap_or_else(generate_id);
            graph.add_edge_with_id(id, &edge.source, &edge.target, edge.label.as_deref())?;
        }
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded graph fixture"
        );
        Ok(graph)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_fixture(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
