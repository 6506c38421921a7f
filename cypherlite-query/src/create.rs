use crate::error::{Error, Result};
use crate::facts::{AtomicFact, NodeLiteral};
use cypherlite_api::{GraphBackend, NodeId};
use std::collections::BTreeMap;
use tracing::debug;

/// Materialize CREATE patterns.
///
/// Every distinct designation becomes one new node (class and inline
/// document as its attributes), then every `EdgeExists` fact becomes one new
/// edge. Returns the designation -> fresh id mapping. A backend failure stops
/// the run; whatever was already created stays.
pub fn create<B: GraphBackend>(
    backend: &mut B,
    nodes: &[NodeLiteral],
    facts: &[AtomicFact],
) -> Result<BTreeMap<String, NodeId>> {
    let mut created = BTreeMap::new();
    for node in nodes {
        let attributes = node.document.clone().unwrap_or_default();
        let id = backend.create_node(node.class.as_deref(), attributes)?;
        created.insert(node.designation.clone(), id);
    }

    let mut edges = 0usize;
    for fact in facts {
        if let AtomicFact::EdgeExists {
            node_1,
            node_2,
            label,
        } = fact
        {
            let src = resolve(&created, node_1)?;
            let dst = resolve(&created, node_2)?;
            backend.create_edge(src, dst, label.as_deref())?;
            edges += 1;
        }
    }

    debug!(nodes = created.len(), edges, "create finished");
    Ok(created)
}

fn resolve<'m>(created: &'m BTreeMap<String, NodeId>, designation: &str) -> Result<&'m str> {
    created
        .get(designation)
        .map(String::as_str)
        .ok_or_else(|| Error::UnresolvedDesignation(designation.to_string()))
}
