use cypherlite_api::{NodeId, PropertyValue};
use serde::ser::{SerializeMap, SerializeSeq};
use std::collections::BTreeMap;

/// A value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A bare designation in RETURN yields the bound node's id.
    NodeId(NodeId),
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node_id(&self) -> Option<&str> {
        match self {
            Value::NodeId(id) => Some(id),
            _ => None,
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(b),
            PropertyValue::Int(i) => Value::Int(i),
            PropertyValue::Float(f) => Value::Float(f),
            PropertyValue::String(s) => Value::String(s),
            PropertyValue::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            PropertyValue::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::NodeId(id) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "node_id")?;
                map.serialize_entry("id", id)?;
                map.end()
            }
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut ser = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    ser.serialize_entry(k, v)?;
                }
                ser.end()
            }
        }
    }
}

/// One result row: return-item column names with their values, in RETURN order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    // Small row: linear search is fine.
    cols: Vec<(String, Value)>,
}

impl Row {
    pub fn new(cols: Vec<(String, Value)>) -> Self {
        Self { cols }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cols.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.cols.push((name.into(), value));
    }

    pub fn columns(&self) -> &[(String, Value)] {
        &self.cols
    }

    pub fn values(&self) -> Vec<&Value> {
        self.cols.iter().map(|(_, v)| v).collect()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.cols.into_iter().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// JSON object keyed by column name, in column order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.cols.len());
        for (k, v) in &self.cols {
            map.insert(
                k.clone(),
                serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
            );
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_serialize_tagged() {
        let row = Row::new(vec![
            ("n".to_string(), Value::NodeId("_id_abc".to_string())),
            ("n.name".to_string(), Value::String("Ann".to_string())),
            ("n.gone".to_string(), Value::Null),
        ]);
        assert_eq!(
            row.to_json(),
            serde_json::json!({
                "n": {"type": "node_id", "id": "_id_abc"},
                "n.name": "Ann",
                "n.gone": null,
            })
        );
    }

    #[test]
    fn json_text_keeps_column_order() {
        let row = Row::new(vec![
            ("y.name".to_string(), Value::String("Bo".to_string())),
            ("x".to_string(), Value::NodeId("a".to_string())),
        ]);
        assert_eq!(
            serde_json::to_string(&row.to_json()).unwrap(),
            r#"{"y.name":"Bo","x":{"type":"node_id","id":"a"}}"#
        );
    }

    #[test]
    fn property_maps_convert_recursively() {
        let mut inner = BTreeMap::new();
        inner.insert("qux".to_string(), PropertyValue::Int(1));
        let value = Value::from(PropertyValue::List(vec![PropertyValue::Map(inner)]));

        let mut expected = BTreeMap::new();
        expected.insert("qux".to_string(), Value::Int(1));
        assert_eq!(value, Value::List(vec![Value::Map(expected)]));
    }
}
