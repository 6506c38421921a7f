//! Flattening of query patterns into atomic facts.
//!
//! Every pattern node becomes a `ClassIs` fact (plus a `NodeHasDocument` fact
//! when it declares inline conditions), every pattern edge becomes an
//! `EdgeExists` fact, and the WHERE clause is carried through unchanged.
//!
//! Unnamed nodes get `_v0`, `_v1`, ... in depth-first discovery order. The
//! names live in the returned [`Extraction`]; the AST itself is never touched,
//! so extracting the same query twice, or two parses of the same text, yields
//! the same names.

use crate::ast::{
    Condition, CreateQuery, Document, EdgeDirection, MatchQuery, NodePattern, Query,
};
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum AtomicFact {
    /// The node bound to `designation` must carry `class`; `None` means any class.
    ClassIs {
        designation: String,
        class: Option<String>,
    },
    /// Some edge runs from `node_1` to `node_2` with `label`; `None` means any label.
    EdgeExists {
        node_1: String,
        node_2: String,
        label: Option<String>,
    },
    /// Inline attribute conditions from the pattern. An empty map is `None`.
    NodeHasDocument {
        designation: String,
        document: Option<Document>,
    },
    FilterClause(Condition),
}

impl AtomicFact {
    /// Designations this fact constrains. Filter clauses contribute none.
    pub fn designations(&self) -> Vec<&str> {
        match self {
            AtomicFact::ClassIs { designation, .. }
            | AtomicFact::NodeHasDocument { designation, .. } => vec![designation.as_str()],
            AtomicFact::EdgeExists { node_1, node_2, .. } => {
                vec![node_1.as_str(), node_2.as_str()]
            }
            AtomicFact::FilterClause(_) => Vec::new(),
        }
    }
}

/// A pattern node with its designation resolved; first declaration wins.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLiteral {
    pub designation: String,
    pub class: Option<String>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub facts: Vec<AtomicFact>,
    /// Each distinct designation once, in declaration order.
    pub nodes: Vec<NodeLiteral>,
}

impl Extraction {
    /// Sorted distinct designations across all facts: the variable domain.
    pub fn designations(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .facts
            .iter()
            .flat_map(AtomicFact::designations)
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn edge_facts(&self) -> impl Iterator<Item = &AtomicFact> + '_ {
        self.facts
            .iter()
            .filter(|fact| matches!(fact, AtomicFact::EdgeExists { .. }))
    }
}

pub fn extract(query: &Query) -> Result<Extraction> {
    match query {
        Query::Match(query) => extract_match(query),
        Query::Create(query) => extract_create(query),
    }
}

pub fn extract_match(query: &MatchQuery) -> Result<Extraction> {
    let mut extractor = Extractor::new(&query.patterns)?;
    for pattern in &query.patterns {
        extractor.visit(pattern)?;
    }
    if let Some(where_clause) = &query.where_clause {
        check_condition(&where_clause.condition)?;
        extractor
            .facts
            .push(AtomicFact::FilterClause(where_clause.condition.clone()));
    }
    Ok(extractor.finish())
}

pub fn extract_create(query: &CreateQuery) -> Result<Extraction> {
    let mut extractor = Extractor::new(&query.patterns)?;
    for pattern in &query.patterns {
        extractor.visit(pattern)?;
    }
    Ok(extractor.finish())
}

struct Extractor {
    facts: Vec<AtomicFact>,
    nodes: Vec<NodeLiteral>,
    declared: BTreeSet<String>,
    // Explicit names in the query; generated names skip these.
    reserved: BTreeSet<String>,
    next_anonymous: usize,
}

impl Extractor {
    fn new(patterns: &[NodePattern]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::GrammarContract("query has no patterns".into()));
        }
        let mut reserved = BTreeSet::new();
        for pattern in patterns {
            collect_designations(pattern, &mut reserved);
        }
        Ok(Self {
            facts: Vec::new(),
            nodes: Vec::new(),
            declared: BTreeSet::new(),
            reserved,
            next_anonymous: 0,
        })
    }

    fn anonymous_name(&mut self) -> String {
        loop {
            let name = format!("_v{}", self.next_anonymous);
            self.next_anonymous += 1;
            if !self.reserved.contains(&name) {
                return name;
            }
        }
    }

    /// Emits the node's own facts, then each edge's target and the edge fact.
    /// Returns the node's designation.
    fn visit(&mut self, node: &NodePattern) -> Result<String> {
        let designation = match &node.designation {
            Some(name) if name.is_empty() => {
                return Err(Error::GrammarContract("empty node designation".into()));
            }
            Some(name) => name.clone(),
            None => self.anonymous_name(),
        };

        let class_fact = AtomicFact::ClassIs {
            designation: designation.clone(),
            class: node.class.clone(),
        };
        if !self.facts.contains(&class_fact) {
            self.facts.push(class_fact);
        }

        let document = node.document.clone().filter(|doc| !doc.is_empty());
        if node.document.is_some() {
            self.facts.push(AtomicFact::NodeHasDocument {
                designation: designation.clone(),
                document: document.clone(),
            });
        }

        if self.declared.insert(designation.clone()) {
            self.nodes.push(NodeLiteral {
                designation: designation.clone(),
                class: node.class.clone(),
                document,
            });
        }

        for edge in &node.edges {
            if edge.label.as_deref() == Some("") {
                return Err(Error::GrammarContract("empty edge label".into()));
            }
            let target = self.visit(&edge.target)?;
            let (node_1, node_2) = match edge.direction {
                EdgeDirection::Outgoing => (designation.clone(), target),
                EdgeDirection::Incoming => (target, designation.clone()),
            };
            self.facts.push(AtomicFact::EdgeExists {
                node_1,
                node_2,
                label: edge.label.clone(),
            });
        }

        Ok(designation)
    }

    fn finish(self) -> Extraction {
        for fact in &self.facts {
            trace!(?fact, "extracted atomic fact");
        }
        Extraction {
            facts: self.facts,
            nodes: self.nodes,
        }
    }
}

fn collect_designations(node: &NodePattern, out: &mut BTreeSet<String>) {
    if let Some(name) = &node.designation {
        out.insert(name.clone());
    }
    for edge in &node.edges {
        collect_designations(&edge.target, out);
    }
}

fn check_condition(condition: &Condition) -> Result<()> {
    let mut empty = false;
    condition.for_each_constraint(&mut |constraint| {
        empty |= constraint.keypath.is_empty();
    });
    if empty {
        return Err(Error::GrammarContract(
            "equality constraint with an empty key-path".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn match_facts(text: &str) -> Extraction {
        extract(&parse(text).unwrap()).unwrap()
    }

    #[test]
    fn anonymous_nodes_are_named_in_discovery_order() {
        let extraction = match_facts("MATCH (:A)-->(:B), (:C) RETURN _v0");
        let names: Vec<_> = extraction
            .nodes
            .iter()
            .map(|n| n.designation.as_str())
            .collect();
        assert_eq!(names, vec!["_v0", "_v1", "_v2"]);
        assert_eq!(
            extraction.nodes[2].class.as_deref(),
            Some("C"),
            "third discovered node is the second pattern"
        );
    }

    #[test]
    fn generated_names_skip_explicit_ones() {
        let extraction = match_facts("MATCH (_v0)-->() RETURN _v0");
        assert_eq!(extraction.designations(), vec!["_v0", "_v1"]);
    }

    #[test]
    fn incoming_edges_are_oriented_by_direction() {
        let extraction = match_facts("MATCH (a)<-[:R]-(b) RETURN a");
        let edge = extraction.edge_facts().next().unwrap();
        assert_eq!(
            edge,
            &AtomicFact::EdgeExists {
                node_1: "b".into(),
                node_2: "a".into(),
                label: Some("R".into()),
            }
        );
    }

    #[test]
    fn empty_document_normalizes_to_none() {
        let extraction = match_facts("MATCH (a {}) RETURN a");
        assert!(extraction.facts.contains(&AtomicFact::NodeHasDocument {
            designation: "a".into(),
            document: None,
        }));
    }

    #[test]
    fn repeated_designation_yields_one_class_fact_and_one_literal() {
        let extraction = match_facts("MATCH (a)-->(b), (b)-->(c) RETURN a");
        let class_facts = extraction
            .facts
            .iter()
            .filter(|f| matches!(f, AtomicFact::ClassIs { designation, .. } if designation == "b"))
            .count();
        assert_eq!(class_facts, 1);
        assert_eq!(extraction.nodes.len(), 3);
    }

    #[test]
    fn where_clause_is_appended_last() {
        let extraction = match_facts("MATCH (a) WHERE a.x = 1 RETURN a");
        assert!(matches!(
            extraction.facts.last(),
            Some(AtomicFact::FilterClause(_))
        ));
    }

    #[test]
    fn empty_pattern_list_is_a_contract_violation() {
        let query = CreateQuery {
            patterns: Vec::new(),
            return_clause: None,
        };
        assert!(matches!(
            extract_create(&query),
            Err(Error::GrammarContract(_))
        ));
    }

    #[test]
    fn empty_edge_label_is_a_contract_violation() {
        let query = CreateQuery {
            patterns: vec![NodePattern {
                designation: Some("a".into()),
                edges: vec![crate::ast::EdgePattern {
                    designation: None,
                    label: Some(String::new()),
                    direction: EdgeDirection::Outgoing,
                    target: Box::new(NodePattern::default()),
                }],
                ..NodePattern::default()
            }],
            return_clause: None,
        };
        assert!(matches!(
            extract_create(&query),
            Err(Error::GrammarContract(_))
        ));
    }

    #[test]
    fn empty_keypath_is_a_contract_violation() {
        let query = MatchQuery {
            patterns: vec![NodePattern {
                designation: Some("a".into()),
                ..NodePattern::default()
            }],
            where_clause: Some(crate::ast::WhereClause {
                condition: Condition::Not(Box::new(Condition::Equals(
                    crate::ast::Constraint {
                        keypath: Vec::new(),
                        value: 1i64.into(),
                    },
                ))),
            }),
            return_clause: crate::ast::ReturnClause { items: Vec::new() },
        };
        assert!(matches!(
            extract_match(&query),
            Err(Error::GrammarContract(_))
        ));
    }
}
