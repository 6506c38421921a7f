//! Exhaustive constraint-satisfaction search.
//!
//! Candidates are the Cartesian product of the backend domain, one factor per
//! designation, with designations sorted by name and the first varying
//! slowest. Each candidate is checked against every fact; survivors are
//! projected and yielded in enumeration order. Nothing is computed ahead of
//! the consumer, so `take(n)` stops the search early.

use crate::ast::ReturnItem;
use crate::error::{Error, Result};
use crate::evaluator::{document_matches, evaluate};
use crate::facts::{AtomicFact, Extraction};
use crate::options::ExecutionOptions;
use crate::projector::project;
use crate::value::Row;
use cypherlite_api::{GraphBackend, NodeId};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Designation -> node id for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    // Sorted by designation.
    bindings: Vec<(String, NodeId)>,
}

impl Assignment {
    pub fn from_pairs(mut pairs: Vec<(String, NodeId)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Self { bindings: pairs }
    }

    /// The node bound to `designation`.
    pub fn get(&self, designation: &str) -> Result<&str> {
        self.bindings
            .binary_search_by(|(name, _)| name.as_str().cmp(designation))
            .map(|index| self.bindings[index].1.as_str())
            .map_err(|_| Error::UnresolvedDesignation(designation.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.bindings
            .iter()
            .map(|(name, id)| (name.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl From<BTreeMap<String, NodeId>> for Assignment {
    fn from(map: BTreeMap<String, NodeId>) -> Self {
        Self {
            bindings: map.into_iter().collect(),
        }
    }
}

pub struct MatchIter<'a, B: GraphBackend> {
    backend: &'a B,
    facts: Vec<AtomicFact>,
    return_items: &'a [ReturnItem],
    designations: Vec<String>,
    domain: Vec<NodeId>,
    // Odometer over `domain`, one digit per designation. `None` once exhausted.
    cursor: Option<Vec<usize>>,
    examined: u64,
}

impl<'a, B: GraphBackend> MatchIter<'a, B> {
    /// Prepares the search. Every designation referenced by RETURN or WHERE
    /// must be bound by a pattern; this is checked before any candidate is
    /// examined.
    pub fn new(
        backend: &'a B,
        extraction: Extraction,
        return_items: &'a [ReturnItem],
        options: &ExecutionOptions,
    ) -> Result<Self> {
        let designations = extraction.designations();
        check_bound(&extraction.facts, return_items, &designations)?;

        let domain = backend.domain();
        options.check(designations.len(), domain.len())?;

        let cursor = if domain.is_empty() && !designations.is_empty() {
            None
        } else {
            Some(vec![0; designations.len()])
        };
        debug!(
            variables = designations.len(),
            domain = domain.len(),
            facts = extraction.facts.len(),
            "starting match enumeration"
        );

        Ok(Self {
            backend,
            facts: extraction.facts,
            return_items,
            designations,
            domain,
            cursor,
            examined: 0,
        })
    }

    /// Sorted designations, i.e. the order in which candidates are nested.
    pub fn designations(&self) -> &[String] {
        &self.designations
    }

    /// Number of candidate assignments checked so far.
    pub fn candidates_examined(&self) -> u64 {
        self.examined
    }

    fn satisfies(&self, assignment: &Assignment) -> Result<bool> {
        for fact in &self.facts {
            if !fact_holds(fact, assignment, self.backend)? {
                trace!(?fact, ?assignment, "candidate rejected");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<'a, B: GraphBackend> Iterator for MatchIter<'a, B> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let indices = self.cursor.as_mut()?;
            let assignment = Assignment {
                bindings: self
                    .designations
                    .iter()
                    .zip(indices.iter())
                    .map(|(name, &i)| (name.clone(), self.domain[i].clone()))
                    .collect(),
            };
            if !advance(indices, self.domain.len()) {
                self.cursor = None;
            }
            self.examined += 1;

            match self.satisfies(&assignment) {
                Ok(true) => {
                    debug!(?assignment, "assignment satisfies all facts");
                    return Some(project(&assignment, self.return_items, self.backend));
                }
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Steps the odometer; the last digit varies fastest. Returns `false` after
/// the final candidate.
fn advance(indices: &mut [usize], radix: usize) -> bool {
    for index in indices.iter_mut().rev() {
        *index += 1;
        if *index < radix {
            return true;
        }
        *index = 0;
    }
    false
}

fn check_bound(
    facts: &[AtomicFact],
    return_items: &[ReturnItem],
    designations: &[String],
) -> Result<()> {
    let is_bound = |name: &str| designations.binary_search_by(|d| d.as_str().cmp(name)).is_ok();

    for item in return_items {
        if matches!(item, ReturnItem::Path { keypath, .. } if keypath.is_empty()) {
            return Err(Error::GrammarContract(
                "return item with an empty key-path".into(),
            ));
        }
        if !is_bound(item.designation()) {
            return Err(Error::UnresolvedDesignation(item.designation().to_string()));
        }
    }

    let mut unbound = None;
    for fact in facts {
        if let AtomicFact::FilterClause(condition) = fact {
            condition.for_each_constraint(&mut |constraint| {
                if unbound.is_none() {
                    if let Some(head) = constraint.keypath.first() {
                        if !is_bound(head) {
                            unbound = Some(head.clone());
                        }
                    }
                }
            });
        }
    }
    match unbound {
        Some(name) => Err(Error::UnresolvedDesignation(name)),
        None => Ok(()),
    }
}

pub(crate) fn fact_holds<B: GraphBackend>(
    fact: &AtomicFact,
    assignment: &Assignment,
    backend: &B,
) -> Result<bool> {
    match fact {
        AtomicFact::ClassIs { designation, class } => {
            let Some(class) = class else {
                return Ok(true);
            };
            let node = backend.get_node(assignment.get(designation)?)?;
            Ok(backend.node_class(node) == Some(class.as_str()))
        }
        AtomicFact::EdgeExists {
            node_1,
            node_2,
            label,
        } => {
            let edges = backend.edges_between(assignment.get(node_1)?, assignment.get(node_2)?)?;
            Ok(edges.into_iter().any(|(_, edge)| match label {
                None => true,
                Some(label) => backend.edge_class(edge) == Some(label.as_str()),
            }))
        }
        AtomicFact::NodeHasDocument {
            designation,
            document,
        } => match document {
            None => Ok(true),
            Some(document) => document_matches(designation, document, assignment, backend),
        },
        AtomicFact::FilterClause(condition) => evaluate(condition, assignment, backend),
    }
}
