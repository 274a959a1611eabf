//! The package value tree (§3): a small sum type produced by the text
//! grammar (component E) and consumed by the inheritance resolver
//! (component F) and the `.json` CLI output.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// An insertion-ordered string-keyed map. Dict keys in this format must
/// stay in first-insertion order for lossless round-tripping, but callers
/// only ever look things up by key — a `Vec<(String, Value)>` backed by an
/// index would be overkill for the sizes involved here, so this keeps a
/// parallel `Vec<String>` for order alongside a `HashMap` for lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedDict {
    order: Vec<String>,
    entries: HashMap<String, Value>,
}

impl OrderedDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a key. Overwriting an existing key keeps its
    /// original position (later keys overwrite earlier ones in place, per
    /// §3's dict invariant).
    pub fn insert(&mut self, key: String, value: Value) {
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order.iter().map(move |k| (k.as_str(), &self.entries[k]))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Overlays `other` on top of `self`: every key in `other` replaces
    /// the corresponding key in `self` wholesale (nested dicts are not
    /// merged), new keys from `other` are appended. This is the shallow
    /// key-by-key override behavior required by §4.6.
    pub fn overlay(&mut self, other: &OrderedDict) {
        for (key, value) in other.iter() {
            self.insert(key.to_string(), value.clone());
        }
    }
}

impl FromIterator<(String, Value)> for OrderedDict {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut dict = OrderedDict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl Serialize for OrderedDict {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The generic value tree produced by [`crate::grammar::loads`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Dict(OrderedDict),
}

impl Value {
    pub fn as_dict(&self) -> Option<&OrderedDict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(dict) => dict.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_dict_preserves_insertion_order() {
        let mut dict = OrderedDict::new();
        dict.insert("B".into(), Value::Int(2));
        dict.insert("A".into(), Value::Int(1));
        let keys: Vec<&str> = dict.keys().collect();
        assert_eq!(keys, vec!["B", "A"]);
    }

    #[test]
    fn overwriting_a_key_keeps_its_position() {
        let mut dict = OrderedDict::new();
        dict.insert("A".into(), Value::Int(1));
        dict.insert("B".into(), Value::Int(2));
        dict.insert("A".into(), Value::Int(99));
        let keys: Vec<&str> = dict.keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(dict.get("A"), Some(&Value::Int(99)));
    }

    #[test]
    fn overlay_replaces_nested_dicts_wholesale() {
        let mut parent = OrderedDict::new();
        let mut nested = OrderedDict::new();
        nested.insert("X".into(), Value::Int(1));
        nested.insert("Y".into(), Value::Int(2));
        parent.insert("Nested".into(), Value::Dict(nested));
        parent.insert("Keep".into(), Value::Int(5));

        let mut child = OrderedDict::new();
        let mut replacement = OrderedDict::new();
        replacement.insert("X".into(), Value::Int(100));
        child.insert("Nested".into(), Value::Dict(replacement.clone()));

        parent.overlay(&child);
        assert_eq!(parent.get("Nested"), Some(&Value::Dict(replacement)));
        assert_eq!(parent.get("Keep"), Some(&Value::Int(5)));
    }

    #[test]
    fn serializes_to_expected_json_shapes() {
        let mut dict = OrderedDict::new();
        dict.insert("A".into(), Value::String("B".into()));
        let json = serde_json::to_string(&Value::Dict(dict)).unwrap();
        assert_eq!(json, r#"{"A":"B"}"#);

        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(serde_json::to_string(&list).unwrap(), "[1,2,3]");
    }
}
