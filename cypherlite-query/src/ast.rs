use cypherlite_api::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inline attribute conditions, e.g. `{name: "Ann", bar: {qux: 1}}`.
pub type Document = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Query {
    Match(MatchQuery),
    Create(CreateQuery),
}

/// `MATCH <patterns> [WHERE <condition>] RETURN <items>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchQuery {
    pub patterns: Vec<NodePattern>,
    pub where_clause: Option<WhereClause>,
    pub return_clause: ReturnClause,
}

/// `CREATE <patterns> [RETURN <items>]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateQuery {
    pub patterns: Vec<NodePattern>,
    pub return_clause: Option<ReturnClause>,
}

/// `(designation:Class {k: v})` with the pattern edges leaving it.
///
/// A chain such as `(a)-[:R]->(b)<-[:S]-(c)` is a tree: `a` owns an edge
/// whose target is `b`, and `b` owns an incoming edge whose target is `c`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodePattern {
    pub designation: Option<String>,
    pub class: Option<String>,
    pub document: Option<Document>,
    pub edges: Vec<EdgePattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgePattern {
    /// Parsed for completeness; edges are never bound to variables.
    pub designation: Option<String>,
    pub label: Option<String>,
    pub direction: EdgeDirection,
    pub target: Box<NodePattern>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeDirection {
    /// `(owner)-[]->(target)`
    Outgoing,
    /// `(owner)<-[]-(target)`
    Incoming,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhereClause {
    pub condition: Condition,
}

/// Boolean filter expression. There is deliberately no conjunction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Condition {
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Equals(Constraint),
}

/// `x.a.b = <literal>`; `keypath[0]` is the designation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constraint {
    pub keypath: Vec<String>,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnClause {
    pub items: Vec<ReturnItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReturnItem {
    /// `RETURN n`: the bound node id.
    Designation(String),
    /// `RETURN n.a.b`: an attribute of the bound node.
    Path {
        designation: String,
        keypath: Vec<String>,
    },
}

impl ReturnItem {
    pub fn designation(&self) -> &str {
        match self {
            ReturnItem::Designation(name) => name,
            ReturnItem::Path { designation, .. } => designation,
        }
    }

    /// Column name as written in the query: `n` or `n.a.b`.
    pub fn column_name(&self) -> String {
        match self {
            ReturnItem::Designation(name) => name.clone(),
            ReturnItem::Path {
                designation,
                keypath,
            } => {
                let mut name = designation.clone();
                for key in keypath {
                    name.push('.');
                    name.push_str(key);
                }
                name
            }
        }
    }
}

impl Condition {
    /// Calls `f` on every equality constraint, left to right.
    pub fn for_each_constraint<'a>(&'a self, f: &mut impl FnMut(&'a Constraint)) {
        match self {
            Condition::Or(left, right) => {
                left.for_each_constraint(f);
                right.for_each_constraint(f);
            }
            Condition::Not(inner) => inner.for_each_constraint(f),
            Condition::Equals(constraint) => f(constraint),
        }
    }
}
