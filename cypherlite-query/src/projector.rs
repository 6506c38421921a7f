use crate::ast::ReturnItem;
use crate::error::{Error, Result};
use crate::matcher::Assignment;
use crate::value::{Row, Value};
use cypherlite_api::{GraphBackend, PropertyValue};
use std::collections::BTreeMap;

/// Build the result row for a satisfying assignment.
///
/// A bare designation projects the bound node id. A key-path projects the
/// attribute value, and unlike WHERE it is strict: a missing key, or a
/// non-map value where the path continues, is `MissingAttribute`.
pub fn project<B: GraphBackend>(
    assignment: &Assignment,
    return_items: &[ReturnItem],
    backend: &B,
) -> Result<Row> {
    let mut row = Row::new(Vec::with_capacity(return_items.len()));
    for item in return_items {
        let node_id = assignment.get(item.designation())?;
        let value = match item {
            ReturnItem::Designation(_) => Value::NodeId(node_id.to_string()),
            ReturnItem::Path { keypath, .. } => {
                let node = backend.get_node(node_id)?;
                let attributes = backend.node_attributes(node);
                Value::from(walk(attributes, keypath, node_id)?)
            }
        };
        row.push(item.column_name(), value);
    }
    Ok(row)
}

fn walk(
    attributes: BTreeMap<String, PropertyValue>,
    keypath: &[String],
    node_id: &str,
) -> Result<PropertyValue> {
    let Some((first, rest)) = keypath.split_first() else {
        return Err(Error::GrammarContract(
            "return item with an empty key-path".into(),
        ));
    };
    let missing = |attribute: &str| Error::MissingAttribute {
        attribute: attribute.to_string(),
        node: node_id.to_string(),
    };

    let mut current = attributes;
    let mut key = first;
    let mut remaining = rest;
    loop {
        let value = current.remove(key).ok_or_else(|| missing(key))?;
        let Some((next, tail)) = remaining.split_first() else {
            return Ok(value);
        };
        match value {
            PropertyValue::Map(map) => current = map,
            _ => return Err(missing(next)),
        }
        key = next;
        remaining = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cypherlite_storage::MemGraph;

    fn graph() -> MemGraph {
        let mut inner = BTreeMap::new();
        inner.insert("qux".to_string(), PropertyValue::from("baz"));
        let mut props = BTreeMap::new();
        props.insert("bar".to_string(), PropertyValue::Map(inner));
        props.insert("name".to_string(), PropertyValue::from("Ann"));
        let mut g = MemGraph::new();
        g.add_node("a", None, props).unwrap();
        g
    }

    fn path(designation: &str, keys: &[&str]) -> ReturnItem {
        ReturnItem::Path {
            designation: designation.to_string(),
            keypath: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn projects_ids_and_nested_attributes_in_order() {
        let g = graph();
        let assignment = Assignment::from_pairs(vec![("n".into(), "a".into())]);
        let items = vec![
            path("n", &["bar", "qux"]),
            ReturnItem::Designation("n".into()),
            path("n", &["name"]),
        ];
        let row = project(&assignment, &items, &g).unwrap();
        let names: Vec<_> = row.columns().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["n.bar.qux", "n", "n.name"]);
        assert_eq!(row.get("n.bar.qux"), Some(&Value::String("baz".into())));
        assert_eq!(row.get("n"), Some(&Value::NodeId("a".into())));
    }

    #[test]
    fn missing_attribute_names_the_key_and_node() {
        let g = graph();
        let assignment = Assignment::from_pairs(vec![("n".into(), "a".into())]);
        let err = project(&assignment, &[path("n", &["bar", "nope"])], &g).unwrap_err();
        match err {
            Error::MissingAttribute { attribute, node } => {
                assert_eq!(attribute, "nope");
                assert_eq!(node, "a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn descending_through_a_scalar_is_missing() {
        let g = graph();
        let assignment = Assignment::from_pairs(vec![("n".into(), "a".into())]);
        let err = project(&assignment, &[path("n", &["name", "first"])], &g).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { attribute, .. } if attribute == "first"));
    }
}
