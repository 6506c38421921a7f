use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a node in a backend.
///
/// Backend-generated identifiers are `_id_` followed by 32 hex digits; fixtures
/// and tests may use any string as long as it is unique within the graph.
pub type NodeId = String;

/// Identifier of an edge in a backend.
pub type EdgeId = String;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Failures raised by a backend capability.
///
/// The query engine never swallows these; they surface to the caller unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("backend does not implement {0}")]
    Unimplemented(&'static str),

    #[error("{0}")]
    Other(String),
}

/// Property value types for node attributes and query literals.
///
/// - Null: explicit null (distinct from a missing attribute)
/// - Bool: true/false
/// - Int: 64-bit signed integers
/// - Float: 64-bit floating point
/// - String: UTF-8 strings
/// - List: Ordered list of PropertyValues
/// - Map: String-keyed map of PropertyValues (nested documents)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Query equality: numbers compare by value across `Int`/`Float`,
    /// containers compare element-wise with the same rule.
    pub fn loose_eq(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Int(l), PropertyValue::Float(r))
            | (PropertyValue::Float(r), PropertyValue::Int(l)) => float_equals_int(*r, *l),
            (PropertyValue::Float(l), PropertyValue::Float(r)) => {
                !l.is_nan() && !r.is_nan() && l == r
            }
            (PropertyValue::List(l), PropertyValue::List(r)) => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| a.loose_eq(b))
            }
            (PropertyValue::Map(l), PropertyValue::Map(r)) => {
                l.len() == r.len()
                    && l.iter()
                        .all(|(key, value)| r.get(key).is_some_and(|other| value.loose_eq(other)))
            }
            _ => self == other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

fn float_equals_int(float_value: f64, int_value: i64) -> bool {
    if !float_value.is_finite() {
        return false;
    }
    float_value == int_value as f64
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(value: BTreeMap<String, PropertyValue>) -> Self {
        PropertyValue::Map(value)
    }
}

/// Walks `keypath` through nested maps starting at `attributes`.
///
/// Returns `None` as soon as a key is missing or a non-map value would have to
/// be indexed. An empty key-path yields `None`; callers that want the whole
/// attribute map handle that case themselves.
pub fn lookup_keypath<'a>(
    attributes: &'a BTreeMap<String, PropertyValue>,
    keypath: &[String],
) -> Option<&'a PropertyValue> {
    let (first, rest) = keypath.split_first()?;
    let mut value = attributes.get(first)?;
    for key in rest {
        value = value.as_map()?.get(key)?;
    }
    Some(value)
}

/// The capability set a property graph must provide to be queried.
///
/// Node and edge handles are borrowed views into the backend; they are only
/// valid while the backend is not mutated. Query execution takes `&self` for
/// matching and `&mut self` for creation, so the borrow checker rules out
/// concurrent mutation during an in-flight match.
pub trait GraphBackend {
    /// Borrowed handle to a node's stored record.
    type Node<'a>: Copy
    where
        Self: 'a;

    /// Borrowed handle to an edge's stored record.
    type Edge<'a>: Copy
    where
        Self: 'a;

    /// All node identifiers currently in the graph, in the backend's
    /// enumeration order.
    fn domain(&self) -> Vec<NodeId>;

    /// Fetch a node handle.
    ///
    /// Fails with [`BackendError::NodeNotFound`] if the id is absent.
    fn get_node(&self, id: &str) -> Result<Self::Node<'_>>;

    /// The node's class label, if it has one.
    fn node_class<'a>(&'a self, node: Self::Node<'a>) -> Option<&'a str>;

    /// The edge's class label, if it has one.
    fn edge_class<'a>(&'a self, edge: Self::Edge<'a>) -> Option<&'a str>;

    /// Every edge from `src` to `dst`. Finite, possibly empty.
    fn edges_between(&self, src: &str, dst: &str) -> Result<Vec<(EdgeId, Self::Edge<'_>)>>;

    /// An owned deep copy of the node's attributes.
    ///
    /// Later mutation of the graph must not change a snapshot already handed out.
    fn node_attributes<'a>(&'a self, node: Self::Node<'a>) -> BTreeMap<String, PropertyValue>;

    /// Null-safe attribute lookup.
    ///
    /// A missing key or an attempt to index into a non-map yields `None`; this
    /// never fails. An empty key-path returns the whole attribute map.
    fn attribute_value<'a>(&'a self, node: Self::Node<'a>, keypath: &[String]) -> Option<PropertyValue> {
        let attributes = self.node_attributes(node);
        if keypath.is_empty() {
            return Some(PropertyValue::Map(attributes));
        }
        lookup_keypath(&attributes, keypath).cloned()
    }

    /// Create a node and return its fresh, globally unique identifier.
    fn create_node(
        &mut self,
        _class: Option<&str>,
        _attributes: BTreeMap<String, PropertyValue>,
    ) -> Result<NodeId> {
        Err(BackendError::Unimplemented("create_node"))
    }

    /// Create an edge from `src` to `dst` and return its fresh identifier.
    fn create_edge(&mut self, _src: &str, _dst: &str, _label: Option<&str>) -> Result<EdgeId> {
        Err(BackendError::Unimplemented("create_edge"))
    }
}
