//! Post-extraction cleanup: type coercion for declared columns and
//! de-duplication. Coercion failures become typed `Missing` values, never
//! hard errors; a malformed cell must not sink the batch.

use std::collections::HashSet;

use tracing::debug;

use crate::record::{Field, RecordSet};

/// Per-category cleaning rules. The source configurations declare which
/// labels are numeric, percentage, or rank columns for each table shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanRules {
    pub numeric: &'static [&'static str],
    pub percent: &'static [&'static str],
    pub rank: &'static [&'static str],
    /// Text columns stripped of surrounding whitespace.
    pub trim: &'static [&'static str],
    /// When set, records are additionally collapsed by this identity field
    /// (first occurrence wins): one entity appears once per name list.
    pub dedup_key: Option<&'static str>,
}

/// Cleans a record set in place. Empty input is a valid no-op.
pub fn clean(set: &mut RecordSet, rules: &CleanRules) {
    if set.is_empty() {
        return;
    }

    let before = set.len();
    set.records.retain(|r| !r.is_empty());

    for record in &mut set.records {
        for &label in rules.trim {
            if let Some(text) = record.text(label) {
                let trimmed = text.trim();
                if trimmed.len() != text.len() {
                    record.set(label, Field::Text(trimmed.to_string()));
                }
            }
        }
        for &label in rules.numeric {
            if let Some(field) = record.get(label) {
                record.set(label, coerce_numeric(field));
            }
        }
        for &label in rules.percent {
            if let Some(field) = record.get(label) {
                record.set(label, coerce_percent(field));
            }
        }
        for &label in rules.rank {
            if let Some(field) = record.get(label) {
                record.set(label, coerce_rank(field));
            }
        }
    }

    dedup_exact(set);
    if let Some(key) = rules.dedup_key {
        dedup_by_identity(set, key);
    }

    if set.len() != before {
        debug!(
            category = %set.category,
            dropped = before - set.len(),
            "cleaning dropped rows"
        );
    }
}

fn coerce_numeric(field: &Field) -> Field {
    match field {
        Field::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) => Field::Num(n),
            Err(_) => Field::Missing,
        },
        other => other.clone(),
    }
}

fn coerce_rank(field: &Field) -> Field {
    match field {
        Field::Text(s) => match s.trim().parse::<i64>() {
            Ok(n) => Field::Int(n),
            Err(_) => Field::Missing,
        },
        other => other.clone(),
    }
}

fn coerce_percent(field: &Field) -> Field {
    match field {
        Field::Text(s) => match parse_percentage(s) {
            Some(n) => Field::Num(n),
            None => Field::Missing,
        },
        other => other.clone(),
    }
}

/// Parses a shooting/winning percentage. A trailing `%` is stripped and the
/// remainder taken as-is; a bare decimal is rescaled x100 only when its
/// magnitude is <= 1 (distinguishes "0.456" from an already-scaled "45.6").
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(stripped) = value.strip_suffix('%') {
        return stripped.trim().parse::<f64>().ok();
    }
    let num = value.parse::<f64>().ok()?;
    if num <= 1.0 {
        Some(num * 100.0)
    } else {
        Some(num)
    }
}

/// Removes byte-identical rows unconditionally.
fn dedup_exact(set: &mut RecordSet) {
    let mut seen: HashSet<String> = HashSet::new();
    set.records.retain(|record| {
        let mut key = String::new();
        for (label, value) in record.iter() {
            key.push_str(label);
            key.push('\u{1f}');
            key.push_str(&value.to_string());
            key.push('\u{1e}');
        }
        seen.insert(key)
    });
}

/// Collapses records sharing an identity value; the first occurrence wins.
fn dedup_by_identity(set: &mut RecordSet, identity_label: &'static str) {
    let mut seen: HashSet<String> = HashSet::new();
    set.records.retain(|record| match record.text(identity_label) {
        Some(name) if !name.is_empty() => seen.insert(name.to_string()),
        _ => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn text_record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (label, value) in pairs {
            r.set(*label, Field::Text((*value).to_string()));
        }
        r
    }

    #[test]
    fn empty_set_cleans_to_empty() {
        let mut set = RecordSet::new("test", "pts");
        clean(&mut set, &CleanRules::default());
        assert!(set.is_empty());
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|v| (v - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn percentage_parsing_table() {
        assert!(close(parse_percentage("45.6%"), 45.6));
        assert!(close(parse_percentage("0.456"), 45.6));
        assert!(close(parse_percentage("1.5"), 1.5));
        assert!(close(parse_percentage("1"), 100.0));
        assert_eq!(parse_percentage(""), None);
        assert_eq!(parse_percentage("abc"), None);
        assert!(close(parse_percentage(" 50% "), 50.0));
    }

    #[test]
    fn numeric_coercion_failure_becomes_missing() {
        let mut set = RecordSet::new("test", "pts");
        set.push(text_record(&[("得分", "31.2"), ("场次", "—")]));
        let rules = CleanRules {
            numeric: &["得分", "场次"],
            ..Default::default()
        };
        clean(&mut set, &rules);
        assert_eq!(set.records[0].get("得分"), Some(&Field::Num(31.2)));
        assert_eq!(set.records[0].get("场次"), Some(&Field::Missing));
    }

    #[test]
    fn rank_stays_integer_with_distinct_missing() {
        let mut set = RecordSet::new("test", "standings");
        set.push(text_record(&[("排名", "3")]));
        set.push(text_record(&[("排名", "-")]));
        let rules = CleanRules {
            rank: &["排名"],
            ..Default::default()
        };
        clean(&mut set, &rules);
        assert_eq!(set.records[0].get("排名"), Some(&Field::Int(3)));
        assert_eq!(set.records[1].get("排名"), Some(&Field::Missing));
        assert_ne!(set.records[1].get("排名"), Some(&Field::Int(0)));
    }

    #[test]
    fn byte_identical_rows_collapse() {
        let mut set = RecordSet::new("test", "pts");
        set.push(text_record(&[("球员", "LeBron James"), ("得分", "25.7")]));
        set.push(text_record(&[("球员", "LeBron James"), ("得分", "25.7")]));
        set.push(text_record(&[("球员", "LeBron James"), ("得分", "26.0")]));
        clean(&mut set, &CleanRules::default());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn identity_dedup_keeps_first_occurrence() {
        let mut set = RecordSet::new("test", "roster");
        set.push(text_record(&[("球员", "勒布朗-詹姆斯"), ("号码", "23")]));
        set.push(text_record(&[("球员", "勒布朗-詹姆斯"), ("号码", "6")]));
        let rules = CleanRules {
            dedup_key: Some("球员"),
            ..Default::default()
        };
        clean(&mut set, &rules);
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].text("号码"), Some("23"));
    }

    #[test]
    fn fully_empty_rows_are_dropped() {
        let mut set = RecordSet::new("test", "pts");
        set.push(text_record(&[("球员", "")]));
        set.push(text_record(&[("球员", "Kevin Durant")]));
        clean(&mut set, &CleanRules::default());
        assert_eq!(set.len(), 1);
    }
}
