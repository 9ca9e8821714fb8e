//! Cell values and records as they travel from an uploaded sheet into the catalog.
//!
//! A [`Record`] keeps its columns in insertion order so that previews and the
//! stored catalog render with the same column order the sheet had. It
//! serializes as a plain JSON object.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One opaque scalar from a sheet. Stored as the matching JSON scalar, `Empty` as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    #[default]
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{i}"),
            // whole floats print without a fraction, the way spreadsheets show them
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

/// The unique-key value of a record (its product name).
///
/// Equality is value equality: numbers compare numerically regardless of
/// integer/float representation, text compares exactly, a number never equals
/// text, and all absent keys are equal to each other.
#[derive(Debug, Clone)]
pub struct Key(Cell);

#[derive(PartialEq, Eq, Hash)]
enum KeyRepr<'a> {
    Integer(i64),
    Number(u64),
    Bool(bool),
    Text(&'a str),
    Missing,
}

/// 2^63; whole floats in `[-2^63, 2^63)` convert to `i64` without loss.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Key {
    pub fn of(cell: Option<&Cell>) -> Self {
        Key(cell.cloned().unwrap_or_default())
    }

    pub fn cell(&self) -> &Cell {
        &self.0
    }

    // integers compare exactly; a whole float meets them as the same integer
    fn repr(&self) -> KeyRepr<'_> {
        match &self.0 {
            Cell::Int(i) => KeyRepr::Integer(*i),
            Cell::Float(f) if f.fract() == 0.0 && *f >= -I64_BOUND && *f < I64_BOUND => {
                KeyRepr::Integer(*f as i64)
            }
            Cell::Float(f) if f.is_nan() => KeyRepr::Number(f64::NAN.to_bits()),
            Cell::Float(f) => KeyRepr::Number(f.to_bits()),
            Cell::Bool(b) => KeyRepr::Bool(*b),
            Cell::Text(s) => KeyRepr::Text(s),
            Cell::Empty => KeyRepr::Missing,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.repr() == other.repr()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr().hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Cell::Empty => f.write_str("(missing)"),
            cell => write!(f, "{cell}"),
        }
    }
}

/// A mapping from column name to cell, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to `value`, keeping the column's position if it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Cell>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Key value of `column`; absent and empty cells yield the missing key.
    pub fn key(&self, column: &str) -> Key {
        Key::of(self.get(column))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.fields.iter().map(|(_, cell)| cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Cell>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// Display columns for a table of records: the keys of the first record.
pub fn columns(records: &[Record]) -> Vec<&str> {
    records
        .first()
        .map(|r| r.columns().collect())
        .unwrap_or_default()
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, cell) in &self.fields {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of column names to scalar cells")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((column, cell)) = access.next_entry::<String, Cell>()? {
                    record.insert(column, cell);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_column_order_through_json() {
        let record: Record = [
            ("Product Name", Cell::text("Widget")),
            ("Price", Cell::Float(9.5)),
            ("Quantity", Cell::Int(2)),
            ("Stock", Cell::Empty),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Product Name":"Widget","Price":9.5,"Quantity":2,"Stock":null}"#
        );

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(
            back.columns().collect::<Vec<_>>(),
            ["Product Name", "Price", "Quantity", "Stock"]
        );
    }

    #[test]
    fn numeric_keys_compare_by_value() {
        assert_eq!(Key::of(Some(&Cell::Int(1))), Key::of(Some(&Cell::Float(1.0))));
        assert_ne!(Key::of(Some(&Cell::Int(1))), Key::of(Some(&Cell::text("1"))));
        assert_eq!(Key::of(None), Key::of(Some(&Cell::Empty)));
        assert_ne!(Key::of(None), Key::of(Some(&Cell::text(""))));
        assert_eq!(Key::of(Some(&Cell::Float(-0.0))), Key::of(Some(&Cell::Int(0))));
    }

    #[test]
    fn large_integer_keys_stay_distinct() {
        let a = 9_007_199_254_740_993i64; // 2^53 + 1
        let b = 9_007_199_254_740_992i64; // 2^53
        assert_ne!(Key::of(Some(&Cell::Int(a))), Key::of(Some(&Cell::Int(b))));
        assert_ne!(Key::of(Some(&Cell::Int(a))), Key::of(Some(&Cell::Float(b as f64))));
        assert_eq!(Key::of(Some(&Cell::Int(b))), Key::of(Some(&Cell::Float(b as f64))));

        let keys: std::collections::HashSet<Key> =
            [Cell::Int(a), Cell::Int(b), Cell::Float(b as f64)]
                .iter()
                .map(|c| Key::of(Some(c)))
                .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn whole_floats_display_without_fraction() {
        assert_eq!(Cell::Float(20.0).to_string(), "20");
        assert_eq!(Cell::Float(2.25).to_string(), "2.25");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut record = Record::new();
        record.insert("a", 1i64);
        record.insert("b", 2i64);
        record.insert("a", 3i64);
        assert_eq!(record.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(record.get("a"), Some(&Cell::Int(3)));
    }
}
