//! Cross-source matching and merging. Sources never share a key, so records
//! are joined on normalized name identity: an exact key lookup first, then a
//! deliberately loose surname + first-initial fallback. The fallback accepts
//! the first satisfying candidate in insertion order; same-surname players
//! sharing a first initial are a known false-positive source and are left
//! that way on purpose.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::normalize::{normalize_name, normalize_name_no_digits, spaceless};
use crate::record::{Field, RecordSet};

/// Total vs. matched counts for one merge operation. Reported to the operator
/// after every merge; never used for control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchStats {
    pub total: usize,
    pub matched: usize,
}

impl MatchStats {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

impl fmt::Display for MatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.1}%)",
            self.matched,
            self.total,
            self.ratio() * 100.0
        )
    }
}

/// Normalized key -> value map that remembers insertion order, so the
/// fallback scan is deterministic across runs.
#[derive(Debug, Default)]
pub struct Lookup {
    keys: Vec<String>,
    map: HashMap<String, String>,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        if key.is_empty() || value.is_empty() {
            return;
        }
        if !self.map.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.map.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(move |k| (k.as_str(), self.map[k].as_str()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Builds the secondary-side lookup from an identity column and a value
/// column. Keys go through the digit-stripping normalizer since roster
/// identity cells may carry jersey numbers.
pub fn build_lookup(set: &RecordSet, identity_label: &str, value_label: &str) -> Lookup {
    let mut lookup = Lookup::new();
    for record in &set.records {
        let key = record
            .text(identity_label)
            .map(normalize_name_no_digits)
            .unwrap_or_default();
        let value = record
            .get(value_label)
            .filter(|f| !f.is_missing())
            .map(|f| f.to_string())
            .unwrap_or_default();
        lookup.insert(key, value);
    }
    lookup
}

/// Exact stage: verbatim key hit.
/// Fallback stage (only on exact miss): see [`fallback_match`].
pub fn match_value<'a>(raw_name: &str, lookup: &'a Lookup) -> Option<&'a str> {
    let key = normalize_name_no_digits(raw_name);
    if key.is_empty() {
        return None;
    }
    if let Some(value) = lookup.get(&key) {
        return Some(value);
    }
    fallback_match(&key, lookup)
}

/// Loose secondary matching strategy: accepts the first candidate (insertion
/// order) whose surname (last space-delimited token) equals the primary's,
/// and whose first token starts with the same character. No scoring or
/// disambiguation among multiple candidates; kept isolated here so a stricter
/// matcher can replace it without touching the exact path.
pub fn fallback_match<'a>(key: &str, lookup: &'a Lookup) -> Option<&'a str> {
    let primary_last = key.rsplit(' ').next()?;
    let primary_initial = key.chars().next()?;
    for (candidate, value) in lookup.iter() {
        let candidate_last = match candidate.rsplit(' ').next() {
            Some(t) => t,
            None => continue,
        };
        let candidate_initial = match candidate.chars().next() {
            Some(c) => c,
            None => continue,
        };
        if candidate_last == primary_last && candidate_initial == primary_initial {
            return Some(value);
        }
    }
    None
}

/// Enriches every primary-side record with one field resolved from the
/// secondary side. An unmatched record gets `Missing`, not an error.
pub fn merge_field(
    primary: &mut RecordSet,
    lookup: &Lookup,
    identity_label: &str,
    new_label: &str,
) -> MatchStats {
    let mut stats = MatchStats::default();
    for record in &mut primary.records {
        stats.total += 1;
        let matched = record
            .text(identity_label)
            .and_then(|name| match_value(name, lookup))
            .map(str::to_string);
        match matched {
            Some(value) => {
                stats.matched += 1;
                record.set(new_label, Field::Text(value));
            }
            None => record.set(new_label, Field::Missing),
        }
    }
    info!(
        category = %primary.category,
        field = new_label,
        "merge matched {}",
        stats
    );
    stats
}

/// One resolved entry in the name map: the localized display value and the
/// original source spelling it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NameEntry {
    pub display: String,
    pub latin: String,
}

/// Read-only lookup from normalized Latin name to localized display name,
/// built once per run from the enrichment sources. Insertion is explicitly
/// first-writer-wins: later sources contribute only keys absent so far.
/// Slug-derived keys carry no spaces, so a secondary spaceless index backs
/// the exact stage.
#[derive(Debug, Default)]
pub struct NameMap {
    entries: HashMap<String, NameEntry>,
    by_spaceless: HashMap<String, String>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts if neither the normalized key nor its spaceless form is taken;
    /// returns whether the entry was added. Existing entries are never
    /// overwritten, so alternate spellings of a known player are no-ops.
    pub fn add(&mut self, latin: &str, display: &str) -> bool {
        let key = normalize_name(latin);
        if key.is_empty() || display.is_empty() {
            return false;
        }
        let slug = spaceless(&key);
        if self.entries.contains_key(&key) || self.by_spaceless.contains_key(&slug) {
            return false;
        }
        self.by_spaceless.insert(slug, key.clone());
        self.entries.insert(
            key,
            NameEntry {
                display: display.to_string(),
                latin: latin.to_string(),
            },
        );
        true
    }

    pub fn get(&self, raw_name: &str) -> Option<&NameEntry> {
        let key = normalize_name(raw_name);
        if key.is_empty() {
            return None;
        }
        if let Some(entry) = self.entries.get(&key) {
            return Some(entry);
        }
        // Spaceless comparison: "LeBron James" must hit a slug-derived
        // "lebronjames" entry, and vice versa.
        self.by_spaceless
            .get(&spaceless(&key))
            .and_then(|primary| self.entries.get(primary))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inserts the localized display name next to the identity column for every
/// record resolvable through the name map.
pub fn attach_display_names(
    set: &mut RecordSet,
    identity_label: &str,
    names: &NameMap,
    new_label: &str,
) -> MatchStats {
    let mut stats = MatchStats::default();
    for record in &mut set.records {
        stats.total += 1;
        let display = record
            .text(identity_label)
            .and_then(|name| names.get(name))
            .map(|entry| entry.display.clone());
        match display {
            Some(display) => {
                stats.matched += 1;
                record.insert_after(identity_label, new_label, Field::Text(display));
            }
            None => record.insert_after(identity_label, new_label, Field::Missing),
        }
    }
    if stats.matched < stats.total {
        warn!(
            category = %set.category,
            "{} records left without a localized name",
            stats.total - stats.matched
        );
    }
    info!(category = %set.category, "localized names matched {}", stats);
    stats
}
