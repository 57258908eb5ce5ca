//! Ordered field-labeled records, the unit of data flowing through the
//! pipeline. Field labels are source-defined rather than a fixed schema, so a
//! record is an ordered label -> value mapping; column order is preserved all
//! the way to CSV output.

use std::fmt;

/// A single field value. Extraction produces `Text`; the cleaner coerces
/// declared columns into `Num`/`Int`, with `Missing` for unparseable or
/// absent values (distinct from zero).
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Num(f64),
    Int(i64),
    Missing,
}

impl Field {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Field::Missing => true,
            Field::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(s) => write!(f, "{}", s),
            Field::Num(n) => write!(f, "{}", n),
            Field::Int(n) => write!(f, "{}", n),
            Field::Missing => Ok(()),
        }
    }
}

/// One record: insertion-ordered (label, value) pairs plus lookup by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Field)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn get(&self, label: &str) -> Option<&Field> {
        self.fields.iter().find(|(l, _)| l == label).map(|(_, v)| v)
    }

    pub fn text(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(|f| f.as_text())
    }

    /// Sets a field, replacing in place if the label already exists
    /// (preserving its position), appending otherwise.
    pub fn set(&mut self, label: impl Into<String>, value: Field) {
        let label = label.into();
        if let Some(slot) = self.fields.iter_mut().find(|(l, _)| *l == label) {
            slot.1 = value;
        } else {
            self.fields.push((label, value));
        }
    }

    /// Inserts a new field right after `anchor`, or appends when the anchor
    /// is absent. Used to slot enrichment columns next to the identity column.
    pub fn insert_after(&mut self, anchor: &str, label: impl Into<String>, value: Field) {
        let label = label.into();
        if self.get(&label).is_some() {
            self.set(label, value);
            return;
        }
        match self.fields.iter().position(|(l, _)| l == anchor) {
            Some(idx) => self.fields.insert(idx + 1, (label, value)),
            None => self.fields.push((label, value)),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// A record with no populated field carries no information and is dropped
    /// by extraction and cleaning.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_missing())
    }
}

/// A sequence of records sharing one provenance: one source, one category,
/// one run. Created by a single extraction, consumed once by the merge stage.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub source: &'static str,
    pub category: String,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(source: &'static str, category: impl Into<String>) -> Self {
        Self {
            source,
            category: category.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of all labels in first-seen order; this is the CSV header.
    pub fn column_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for record in &self.records {
            for label in record.labels() {
                if !order.iter().any(|l| l == label) {
                    order.push(label.to_string());
                }
            }
        }
        order
    }

    /// Appends a constant-valued column to every record (e.g. the season tag).
    pub fn add_column(&mut self, label: &str, value: &str) {
        for record in &mut self.records {
            record.set(label, Field::Text(value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut r = Record::new();
        r.set("a", Field::Text("1".into()));
        r.set("b", Field::Text("2".into()));
        r.set("a", Field::Text("3".into()));
        let labels: Vec<&str> = r.labels().collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(r.text("a"), Some("3"));
    }

    #[test]
    fn insert_after_places_column_next_to_anchor() {
        let mut r = Record::new();
        r.set("name", Field::Text("x".into()));
        r.set("team", Field::Text("y".into()));
        r.insert_after("name", "localized", Field::Text("z".into()));
        let labels: Vec<&str> = r.labels().collect();
        assert_eq!(labels, vec!["name", "localized", "team"]);
    }

    #[test]
    fn empty_record_detection() {
        let mut r = Record::new();
        r.set("a", Field::Missing);
        r.set("b", Field::Text(String::new()));
        assert!(r.is_empty());
        r.set("b", Field::Text("v".into()));
        assert!(!r.is_empty());
    }

    #[test]
    fn column_order_is_first_seen_union() {
        let mut set = RecordSet::new("test", "t");
        let mut a = Record::new();
        a.set("one", Field::Text("1".into()));
        let mut b = Record::new();
        b.set("one", Field::Text("1".into()));
        b.set("two", Field::Text("2".into()));
        set.push(a);
        set.push(b);
        assert_eq!(set.column_order(), vec!["one".to_string(), "two".to_string()]);
    }
}
