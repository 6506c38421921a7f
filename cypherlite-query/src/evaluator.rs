use crate::ast::{Condition, Constraint, Document};
use crate::error::{Error, Result};
use crate::matcher::Assignment;
use cypherlite_api::GraphBackend;

/// Evaluate a WHERE condition against one candidate assignment.
///
/// Attribute resolution is null-safe: a missing key anywhere along the path
/// makes the constraint false. Only an unbound designation or a backend
/// failure is an error.
pub fn evaluate<B: GraphBackend>(
    condition: &Condition,
    assignment: &Assignment,
    backend: &B,
) -> Result<bool> {
    match condition {
        Condition::Or(left, right) => {
            Ok(evaluate(left, assignment, backend)? || evaluate(right, assignment, backend)?)
        }
        Condition::Not(inner) => Ok(!evaluate(inner, assignment, backend)?),
        Condition::Equals(constraint) => constraint_holds(constraint, assignment, backend),
    }
}

fn constraint_holds<B: GraphBackend>(
    constraint: &Constraint,
    assignment: &Assignment,
    backend: &B,
) -> Result<bool> {
    let Some((designation, attribute_path)) = constraint.keypath.split_first() else {
        return Err(Error::GrammarContract(
            "equality constraint with an empty key-path".into(),
        ));
    };
    let node = backend.get_node(assignment.get(designation)?)?;
    Ok(backend
        .attribute_value(node, attribute_path)
        .is_some_and(|value| value.loose_eq(&constraint.value)))
}

/// Check inline pattern conditions: every `key: value` must equal the node's
/// attribute `key`, compared exactly as a WHERE equality would.
pub fn document_matches<B: GraphBackend>(
    designation: &str,
    document: &Document,
    assignment: &Assignment,
    backend: &B,
) -> Result<bool> {
    let node = backend.get_node(assignment.get(designation)?)?;
    for (key, expected) in document {
        let matches = backend
            .attribute_value(node, std::slice::from_ref(key))
            .is_some_and(|value| value.loose_eq(expected));
        if !matches {
            return Ok(false);
        }
    }
    Ok(true)
}
