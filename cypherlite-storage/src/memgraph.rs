use crate::error::{Error, Result};
use cypherlite_api::{
    BackendError, EdgeId, GraphBackend, NodeId, PropertyValue, lookup_keypath,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

/// Fresh identifier for a node or edge: `_id_` plus a v4 UUID in simple form.
///
/// Random rather than counter-based so that ids generated by independent
/// graphs or processes do not collide.
pub fn generate_id() -> String {
    format!("_id_{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    pub class: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub src: NodeId,
    pub dst: NodeId,
    pub label: Option<String>,
}

/// An in-memory directed multigraph.
///
/// Nodes enumerate in insertion order. Parallel edges between the same pair
/// of nodes are kept in creation order.
#[derive(Debug, Clone, Default)]
pub struct MemGraph {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, NodeRecord>,
    // src -> dst -> parallel edges
    out: HashMap<NodeId, BTreeMap<NodeId, Vec<EdgeRecord>>>,
    edge_count: usize,
}

impl MemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node under a caller-chosen id.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        class: Option<&str>,
        properties: BTreeMap<String, PropertyValue>,
    ) -> Result<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        self.nodes.insert(
            id.clone(),
            NodeRecord {
                class: class.map(str::to_string),
                properties,
            },
        );
        self.order.push(id);
        Ok(())
    }

    /// Inserts an edge with a generated id. Both endpoints must already exist.
    pub fn add_edge(&mut self, src: &str, dst: &str, label: Option<&str>) -> Result<EdgeId> {
        self.add_edge_with_id(generate_id(), src, dst, label)
    }

    pub(crate) fn add_edge_with_id(
        &mut self,
        id: EdgeId,
        src: &str,
        dst: &str,
        label: Option<&str>,
    ) -> Result<EdgeId> {
        for endpoint in [src, dst] {
            if !self.nodes.contains_key(endpoint) {
                return Err(Error::UnknownEndpoint(endpoint.to_string()));
            }
        }
        self.out
            .entry(src.to_string())
            .or_default()
            .entry(dst.to_string())
            .or_default()
            .push(EdgeRecord {
                id: id.clone(),
                src: src.to_string(),
                dst: dst.to_string(),
                label: label.map(str::to_string),
            });
        self.edge_count += 1;
        Ok(id)
    }

    pub fn set_node_property(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: PropertyValue,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::UnknownEndpoint(id.to_string()))?;
        node.properties.insert(key.into(), value);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.order.iter()
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All edges, grouped by source in node insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeRecord> + '_ {
        self.order
            .iter()
            .filter_map(|src| self.out.get(src))
            .flat_map(|targets| targets.values())
            .flatten()
    }
}

impl GraphBackend for MemGraph {
    type Node<'a> = &'a NodeRecord;
    type Edge<'a> = &'a EdgeRecord;

    fn domain(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    fn get_node(&self, id: &str) -> cypherlite_api::Result<&NodeRecord> {
        self.nodes
            .get(id)
            .ok_or_else(|| BackendError::NodeNotFound(id.to_string()))
    }

    fn node_class<'a>(&'a self, node: &'a NodeRecord) -> Option<&'a str> {
        node.class.as_deref()
    }

    fn edge_class<'a>(&'a self, edge: &'a EdgeRecord) -> Option<&'a str> {
        edge.label.as_deref()
    }

    fn edges_between(
        &self,
        src: &str,
        dst: &str,
    ) -> cypherlite_api::Result<Vec<(EdgeId, &EdgeRecord)>> {
        Ok(self
            .out
            .get(src)
            .and_then(|targets| targets.get(dst))
            .map(|edges| edges.iter().map(|e| (e.id.clone(), e)).collect())
            .unwrap_or_default())
    }

    fn node_attributes<'a>(&'a self, node: &'a NodeRecord) -> BTreeMap<String, PropertyValue> {
        node.properties.clone()
    }

    fn attribute_value<'a>(&'a self, node: &'a NodeRecord, keypath: &[String]) -> Option<PropertyValue> {
        if keypath.is_empty() {
            return Some(PropertyValue::Map(node.properties.clone()));
        }
        lookup_keypath(&node.properties, keypath).cloned()
    }

    fn create_node(
        &mut self,
        class: Option<&str>,
        attributes: BTreeMap<String, PropertyValue>,
    ) -> cypherlite_api::Result<NodeId> {
        let id = generate_id();
        self.add_node(id.clone(), class, attributes)?;
        debug!(node = %id, class = ?class, "created node");
        Ok(id)
    }

    fn create_edge(
        &mut self,
        src: &str,
        dst: &str,
        label: Option<&str>,
    ) -> cypherlite_api::Result<EdgeId> {
        let id = self.add_edge(src, dst, label)?;
        debug!(edge = %id, src, dst, label = ?label, "created edge");
        Ok(id)
    }
}
