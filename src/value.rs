// 🧱 Value Model - Parsed addon data
// Algebraic representation of the table serialization format:
// nil, booleans, numbers, strings and ordered keyed tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// KEYS
// ============================================================================

/// Table key - either a sequential/explicit integer or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            Key::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// NUMBERS
// ============================================================================

/// Numeric literal - integer unless the source had `.` or an exponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Integer view; floats truncate toward zero like the addon's own casts
    pub fn as_i64(&self) -> i64 {
        match self {
            Number::Int(i) => *i,
            Number::Float(f) => *f as i64,
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Ordered key → value collection
///
/// Insertion order is preserved. Re-inserting an existing key replaces the
/// value in place (last write wins, first position kept).
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<(Key, Value)>,
    index: HashMap<Key, usize>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Insert or overwrite; returns the previous value for the key
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Lookup by string key (the common case for addon fields)
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.get(&Key::Str(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// True when keys are exactly 1..N in insertion order
    ///
    /// Advisory only: used to shape serializer and JSON output.
    pub fn is_array(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Int(i as i64 + 1))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<(Key, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut table = Table::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

// ============================================================================
// VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(Number),
    Str(String),
    Table(Table),
}

impl Value {
    pub fn empty_table() -> Self {
        Value::Table(Table::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(n.as_i64()),
            _ => None,
        }
    }

    /// Nested lookup through string keys: `value.path(&["vault_delves", "count"])`
    pub fn path(&self, keys: &[&str]) -> Option<&Value> {
        let mut current = self;
        for key in keys {
            current = current.as_table()?.field(key)?;
        }
        Some(current)
    }

    /// JSON shaping: array tables become JSON arrays, everything else objects
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(Number::Int(i)) => serde_json::json!(i),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Table(t) if t.is_array() && !t.is_empty() => {
                serde_json::Value::Array(t.values().map(Value::to_json).collect())
            }
            Value::Table(t) => serde_json::Value::Object(
                t.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(Number::Int(i64::from(i)))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

// ============================================================================
// SERIALIZER
// ============================================================================
// Writes the same grammar the parser reads, so parse(v.to_string()) == v
// for every tree without non-finite floats.

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !matches!(s, "true" | "false" | "nil")
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            // {:?} keeps a `.` or exponent so the value re-reads as a float
            Number::Float(x) if x.is_finite() => write!(f, "{:?}", x),
            Number::Float(_) => f.write_str("nil"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write_quoted(f, s),
            Value::Table(t) => {
                f.write_str("{")?;
                let array = t.is_array();
                for (i, (key, value)) in t.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if !array {
                        match key {
                            Key::Str(s) if is_identifier(s) => write!(f, "{} = ", s)?,
                            Key::Str(s) => {
                                f.write_str("[")?;
                                write_quoted(f, s)?;
                                f.write_str("] = ")?;
                            }
                            Key::Int(n) => write!(f, "[{}] = ", n)?,
                        }
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut t = Table::new();
        t.insert(Key::Int(1), Value::from("a"));
        t.insert(Key::Str("x".into()), Value::from(2));
        let prev = t.insert(Key::Int(1), Value::from("b"));

        assert_eq!(prev, Some(Value::from("a")));
        assert_eq!(t.len(), 2);
        let keys: Vec<&Key> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&Key::Int(1), &Key::Str("x".into())]);
        assert_eq!(t.get(&Key::Int(1)), Some(&Value::from("b")));
    }

    #[test]
    fn test_array_classification() {
        let array: Table = vec![(Key::Int(1), Value::from(1)), (Key::Int(2), Value::from(2))]
            .into_iter()
            .collect();
        assert!(array.is_array());

        let gap: Table = vec![(Key::Int(1), Value::from(1)), (Key::Int(3), Value::from(2))]
            .into_iter()
            .collect();
        assert!(!gap.is_array());

        let out_of_order: Table = vec![(Key::Int(2), Value::from(1)), (Key::Int(1), Value::from(2))]
            .into_iter()
            .collect();
        assert!(!out_of_order.is_array());
    }

    #[test]
    fn test_path_lookup() {
        let inner: Table = vec![(Key::from("count"), Value::from(4))].into_iter().collect();
        let outer: Table = vec![(Key::from("vault_delves"), Value::Table(inner))]
            .into_iter()
            .collect();
        let v = Value::Table(outer);

        assert_eq!(v.path(&["vault_delves", "count"]).and_then(Value::as_i64), Some(4));
        assert!(v.path(&["vault_delves", "tiers"]).is_none());
        assert!(v.path(&["vault_delves", "count", "deeper"]).is_none());
    }

    #[test]
    fn test_serializer_output() {
        let inner: Table = vec![(Key::Int(1), Value::from(1)), (Key::Int(2), Value::from(2.5))]
            .into_iter()
            .collect();
        let t: Table = vec![
            (Key::from("name"), Value::from("a\"b")),
            (Key::from("two words"), Value::Bool(true)),
            (Key::Int(7), Value::Nil),
            (Key::from("list"), Value::Table(inner)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            Value::Table(t).to_string(),
            r#"{name = "a\"b", ["two words"] = true, [7] = nil, list = {1, 2.5}}"#
        );
    }

    #[test]
    fn test_to_json_shapes_arrays_and_maps() {
        let list: Table = vec![(Key::Int(1), Value::from("x")), (Key::Int(2), Value::from("y"))]
            .into_iter()
            .collect();
        let map: Table = vec![(Key::Int(2), Value::from(8)), (Key::Int(4), Value::from(11))]
            .into_iter()
            .collect();

        assert_eq!(Value::Table(list).to_json(), serde_json::json!(["x", "y"]));
        assert_eq!(Value::Table(map).to_json(), serde_json::json!({"2": 8, "4": 11}));
        assert_eq!(Value::empty_table().to_json(), serde_json::json!({}));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("item_level"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("nil"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
