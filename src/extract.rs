//! Generic HTML-table extraction. Each source is a configuration
//! ([`TableSpec`]) over one shared routine: locate the table (class hint with
//! a first-table fallback), derive headers (thead with a positional default
//! fallback), then zip trimmed cell text against labels. Extraction never
//! fails on malformed markup; it degrades to an empty or partial record set
//! plus a warning.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::record::{Field, Record, RecordSet};

// Hupu uses full-width parentheses, other sources ASCII ones.
static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[（(]([^）)]+)[）)]").unwrap());

/// Stateful section tracking for multi-section tables (e.g. two conference
/// standings sharing one table). A row matching a marker switches the tag
/// applied to subsequent rows; membership lookup sets are the fallback when
/// markers are inconsistent.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    /// Label of the derived section column.
    pub label: &'static str,
    pub default_tag: &'static str,
    /// Marker text fragment -> section tag. Marker rows are consumed.
    pub markers: &'static [(&'static str, &'static str)],
    /// Section tag -> entity-name fragments that imply it.
    pub membership: &'static [(&'static str, &'static [&'static str])],
}

/// Source-specific configuration over the shared extraction routine.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableSpec {
    pub source: &'static str,
    /// CSS class hint for the primary data table; fallback is the first
    /// table element in the document.
    pub table_class: Option<&'static str>,
    /// Positional labels used when the header section is absent or empty.
    pub default_headers: &'static [&'static str],
    /// Entity columns whose first hyperlink target is captured under a
    /// link-specific label (secondary identity signal for slug matching).
    pub link_columns: &'static [(&'static str, &'static str)],
    /// Header labels renamed before zipping.
    pub rename: &'static [(&'static str, &'static str)],
    /// Columns whose cell text carries a parenthesized Latin name; it is
    /// extracted into its own field and the display part keeps the column.
    pub paren_columns: &'static [(&'static str, &'static str)],
    /// When non-empty, every table whose headers contain one of these labels
    /// contributes rows (sources that split one list over several tables).
    pub header_probe: &'static [&'static str],
    /// Skip blank separator cells before the positional zip.
    pub skip_empty_cells: bool,
    /// Rows missing any of these fields are dropped.
    pub require: &'static [&'static str],
    /// Rows containing any of these fragments are repeated in-body header
    /// rows and are dropped.
    pub skip_row_words: &'static [&'static str],
    pub section: Option<SectionSpec>,
}

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static THEAD_TH_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("thead th").unwrap());
static TR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());
static A_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Extracts an ordered record set from an HTML document according to `spec`.
pub fn extract(html: &str, spec: &TableSpec, category: &str) -> RecordSet {
    let mut set = RecordSet::new(spec.source, category);
    let document = Html::parse_document(html);

    let tables = locate_tables(&document, spec);
    if tables.is_empty() {
        warn!(source = spec.source, category, "no data table found");
        return set;
    }

    for table in tables {
        extract_table(table, spec, &mut set);
    }

    if set.is_empty() {
        warn!(source = spec.source, category, "no data rows extracted");
    } else {
        debug!(source = spec.source, category, rows = set.len(), "extracted table");
    }
    set
}

fn locate_tables<'a>(document: &'a Html, spec: &TableSpec) -> Vec<ElementRef<'a>> {
    if !spec.header_probe.is_empty() {
        // Probe every table; one logical list may be split across several.
        let matching: Vec<ElementRef<'a>> = document
            .select(&TABLE_SEL)
            .filter(|table| {
                let headers = thead_labels(*table);
                headers
                    .iter()
                    .any(|h| spec.header_probe.contains(&h.as_str()))
            })
            .collect();
        return matching;
    }

    if let Some(class) = spec.table_class {
        let hinted = Selector::parse(&format!("table.{}", class)).ok();
        if let Some(sel) = hinted {
            if let Some(table) = document.select(&sel).next() {
                return vec![table];
            }
        }
    }
    document.select(&TABLE_SEL).next().into_iter().collect()
}

fn thead_labels(table: ElementRef) -> Vec<String> {
    table
        .select(&THEAD_TH_SEL)
        .map(|th| cell_text(th))
        .collect()
}

fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn row_in_thead(row: ElementRef) -> bool {
    row.parent()
        .and_then(|p| p.value().as_element().map(|e| e.name() == "thead"))
        .unwrap_or(false)
}

fn apply_rename(label: &str, spec: &TableSpec) -> String {
    for (from, to) in spec.rename {
        if label == *from {
            return (*to).to_string();
        }
    }
    label.to_string()
}

fn extract_table(table: ElementRef, spec: &TableSpec, set: &mut RecordSet) {
    let mut headers: Vec<String> = thead_labels(table)
        .into_iter()
        .map(|h| apply_rename(&h, spec))
        .collect();
    let had_thead = !headers.is_empty();

    let mut rows: Vec<ElementRef> = table
        .select(&TR_SEL)
        .filter(|r| !row_in_thead(*r))
        .collect();

    if !had_thead && !rows.is_empty() {
        // No header section: the first row may still be an in-body header.
        // Use it when it names known columns, otherwise fall back to the
        // source-supplied positional labels; either way it is not data.
        let candidate: Vec<String> = rows[0]
            .select(&CELL_SEL)
            .map(|c| apply_rename(&cell_text(c), spec))
            .collect();
        let known = candidate.iter().any(|h| {
            spec.default_headers.iter().any(|d| *d == h.as_str())
                || spec.rename.iter().any(|(_, to)| *to == h.as_str())
        });
        headers = if known {
            candidate
        } else {
            spec.default_headers.iter().map(|s| s.to_string()).collect()
        };
        rows.remove(0);
    } else if headers.is_empty() {
        headers = spec.default_headers.iter().map(|s| s.to_string()).collect();
    }

    let mut section_tag = spec.section.map(|s| s.default_tag);

    'rows: for row in rows {
        let row_text = cell_text(row);

        if let (Some(section), Some(tag)) = (spec.section.as_ref(), section_tag.as_mut()) {
            for &(marker, marked_tag) in section.markers {
                if row_text.contains(marker) {
                    *tag = marked_tag;
                    continue 'rows; // marker rows carry no data
                }
            }
        }

        if spec
            .skip_row_words
            .iter()
            .any(|word| row_text.contains(*word))
        {
            continue;
        }

        let cells: Vec<ElementRef> = row
            .select(&CELL_SEL)
            .filter(|c| !spec.skip_empty_cells || !cell_text(*c).is_empty() || has_link(*c))
            .collect();
        if cells.is_empty() {
            continue;
        }

        if let (Some(section), Some(tag)) = (spec.section.as_ref(), section_tag.as_mut()) {
            if let Some(entity) = entity_name(&cells) {
                for &(member_tag, fragments) in section.membership {
                    if fragments.iter().any(|f| entity.contains(*f)) {
                        *tag = member_tag;
                        break;
                    }
                }
            }
        }

        let mut record = Record::new();
        if let (Some(section), Some(tag)) = (spec.section.as_ref(), section_tag) {
            record.set(section.label, Field::Text(tag.to_string()));
        }

        // Positional zip: extra cells are dropped, labels beyond the cell
        // count stay absent.
        for (label, cell) in headers.iter().zip(cells.iter()) {
            if label.is_empty() {
                continue;
            }
            let mut text = cell_text(*cell);

            // Entity text lands first so derived columns follow it in the
            // artifact header.
            let mut latin: Option<String> = None;
            if spec.paren_columns.iter().any(|(l, _)| *l == label.as_str()) {
                if let Some(caps) = PAREN_RE.captures(&text) {
                    latin = Some(caps[1].trim().to_string());
                    // Display part: link text if present, else text up to
                    // the parenthesis.
                    text = link_text(*cell).unwrap_or_else(|| {
                        text.split(['（', '(']).next().unwrap_or("").trim().to_string()
                    });
                }
            }
            record.set(label.as_str(), Field::Text(text));

            if let Some((_, link_label)) = spec.link_columns.iter().find(|(l, _)| *l == label.as_str()) {
                if let Some(href) = first_link(*cell) {
                    record.set(*link_label, Field::Text(href));
                }
            }

            if let Some(latin) = latin {
                if let Some((_, latin_label)) = spec.paren_columns.iter().find(|(l, _)| *l == label.as_str()) {
                    record.set(*latin_label, Field::Text(latin));
                }
            }
        }

        if record.is_empty() {
            continue;
        }
        if spec
            .require
            .iter()
            .any(|&label| record.get(label).map(Field::is_missing).unwrap_or(true))
        {
            continue;
        }
        set.push(record);
    }
}

fn has_link(cell: ElementRef) -> bool {
    cell.select(&A_SEL).next().is_some()
}

fn first_link(cell: ElementRef) -> Option<String> {
    cell.select(&A_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

fn link_text(cell: ElementRef) -> Option<String> {
    cell.select(&A_SEL).next().map(cell_text)
}

fn entity_name(cells: &[ElementRef]) -> Option<String> {
    for cell in cells {
        if let Some(text) = link_text(*cell) {
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    cells.get(1).map(|c| cell_text(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_spec() -> TableSpec {
        TableSpec {
            source: "hupu",
            table_class: Some("players_table"),
            default_headers: &["排名", "球员", "球队", "得分"],
            link_columns: &[("球员", "球员链接"), ("球队", "球队链接")],
            ..Default::default()
        }
    }

    #[test]
    fn extracts_rows_with_links() {
        let html = r#"
            <table class="players_table">
              <thead><tr><th>排名</th><th>球员</th><th>球队</th><th>得分</th></tr></thead>
              <tbody>
                <tr><td>1</td><td><a href="/players/lebronjames-65.html">勒布朗-詹姆斯</a></td><td>湖人</td><td>25.7</td></tr>
              </tbody>
            </table>"#;
        let set = extract(html, &stats_spec(), "pts");
        assert_eq!(set.len(), 1);
        let r = &set.records[0];
        assert_eq!(r.text("球员"), Some("勒布朗-詹姆斯"));
        assert_eq!(r.text("球员链接"), Some("/players/lebronjames-65.html"));
        assert_eq!(r.text("得分"), Some("25.7"));
    }

    #[test]
    fn class_hint_miss_falls_back_to_first_table() {
        let html = r#"
            <table><thead><tr><th>排名</th><th>球员</th></tr></thead>
            <tbody><tr><td>1</td><td>库里</td></tr></tbody></table>"#;
        let set = extract(html, &stats_spec(), "pts");
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].text("球员"), Some("库里"));
    }

    #[test]
    fn missing_header_uses_default_labels() {
        let html = r#"
            <table class="players_table">
              <tr><td>x</td><td>y</td><td>z</td><td>w</td></tr>
              <tr><td>1</td><td>约基奇</td><td>掘金</td><td>29.6</td></tr>
            </table>"#;
        let set = extract(html, &stats_spec(), "pts");
        // first row is consumed as the (unknown) header row
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].text("球员"), Some("约基奇"));
        assert_eq!(set.records[0].text("得分"), Some("29.6"));
    }

    #[test]
    fn extra_cells_dropped_short_rows_leave_fields_absent() {
        let html = r#"
            <table class="players_table">
              <thead><tr><th>排名</th><th>球员</th><th>球队</th><th>得分</th></tr></thead>
              <tbody>
                <tr><td>1</td><td>东契奇</td><td>独行侠</td><td>33.9</td><td>extra</td></tr>
                <tr><td>2</td><td>亚历山大</td></tr>
              </tbody>
            </table>"#;
        let set = extract(html, &stats_spec(), "pts");
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].len(), 4);
        assert_eq!(set.records[1].text("球员"), Some("亚历山大"));
        assert!(set.records[1].get("得分").is_none());
    }

    #[test]
    fn empty_document_yields_empty_set_not_error() {
        let set = extract("<html><body>nothing here</body></html>", &stats_spec(), "pts");
        assert!(set.is_empty());
        let set = extract("", &stats_spec(), "pts");
        assert!(set.is_empty());
    }

    #[test]
    fn section_marker_switches_tag() {
        let spec = TableSpec {
            source: "hupu",
            default_headers: &["排名", "球队", "胜", "负"],
            require: &["球队", "胜"],
            skip_row_words: &["队名"],
            section: Some(SectionSpec {
                label: "联盟",
                default_tag: "东部",
                markers: &[("东部", "东部"), ("西部", "西部")],
                membership: &[("西部", &["雷霆", "湖人"]), ("东部", &["凯尔特人"])],
            }),
            ..Default::default()
        };
        let html = r#"
            <table>
              <thead><tr><th>排名</th><th>球队</th><th>胜</th><th>负</th></tr></thead>
              <tbody>
                <tr><td colspan="4">东部联盟</td></tr>
                <tr><td>1</td><td>凯尔特人</td><td>61</td><td>21</td></tr>
                <tr><td colspan="4">西部联盟</td></tr>
                <tr><td>1</td><td>雷霆</td><td>68</td><td>14</td></tr>
              </tbody>
            </table>"#;
        let set = extract(html, &spec, "standings");
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].text("联盟"), Some("东部"));
        assert_eq!(set.records[1].text("联盟"), Some("西部"));
    }

    #[test]
    fn membership_lookup_switches_tag_without_marker() {
        let spec = TableSpec {
            source: "hupu",
            default_headers: &["排名", "球队", "胜", "负"],
            require: &["球队"],
            section: Some(SectionSpec {
                label: "联盟",
                default_tag: "东部",
                markers: &[],
                membership: &[("西部", &["湖人"])],
            }),
            ..Default::default()
        };
        let html = r#"
            <table>
              <thead><tr><th>排名</th><th>球队</th><th>胜</th><th>负</th></tr></thead>
              <tbody>
                <tr><td>1</td><td>凯尔特人</td><td>61</td><td>21</td></tr>
                <tr><td>2</td><td><a href="/teams/lakers">湖人</a></td><td>50</td><td>32</td></tr>
              </tbody>
            </table>"#;
        let set = extract(html, &spec, "standings");
        assert_eq!(set.records[0].text("联盟"), Some("东部"));
        assert_eq!(set.records[1].text("联盟"), Some("西部"));
    }

    #[test]
    fn paren_column_splits_display_and_latin_name() {
        let spec = TableSpec {
            source: "hupu",
            default_headers: &["", "姓名", "号码", "位置"],
            rename: &[("姓名", "球员")],
            link_columns: &[("球员", "球员链接")],
            paren_columns: &[("球员", "英文名")],
            require: &["球员"],
            ..Default::default()
        };
        let html = r#"
            <table class="players_table">
              <tr><th></th><th>姓名</th><th>号码</th><th>位置</th></tr>
              <tr><td>1</td><td><a href="/players/lebronjames-65.html">勒布朗-詹姆斯</a>(LeBron James)</td><td>23</td><td>SF</td></tr>
            </table>"#;
        let set = extract(html, &spec, "roster");
        assert_eq!(set.len(), 1);
        let r = &set.records[0];
        assert_eq!(r.text("球员"), Some("勒布朗-詹姆斯"));
        assert_eq!(r.text("英文名"), Some("LeBron James"));
        assert_eq!(r.text("球员链接"), Some("/players/lebronjames-65.html"));
        assert_eq!(r.text("号码"), Some("23"));
    }

    #[test]
    fn derived_columns_follow_the_entity_column() {
        let spec = TableSpec {
            source: "hupu",
            default_headers: &["排名", "姓名", "号码"],
            rename: &[("姓名", "球员")],
            link_columns: &[("球员", "球员链接")],
            paren_columns: &[("球员", "英文名")],
            ..Default::default()
        };
        let html = r#"
            <table>
              <thead><tr><th>排名</th><th>姓名</th><th>号码</th></tr></thead>
              <tbody>
                <tr><td>1</td><td><a href="/players/lebronjames-65.html">勒布朗-詹姆斯</a>（LeBron James）</td><td>23</td></tr>
              </tbody>
            </table>"#;
        let set = extract(html, &spec, "roster");
        let labels: Vec<&str> = set.records[0].labels().collect();
        assert_eq!(labels, vec!["排名", "球员", "球员链接", "英文名", "号码"]);
    }

    #[test]
    fn header_probe_collects_from_all_matching_tables() {
        let spec = TableSpec {
            source: "espn",
            default_headers: &[],
            header_probe: &["Name", "POS", "Salary"],
            link_columns: &[("Name", "PlayerLink")],
            require: &["Name"],
            ..Default::default()
        };
        let html = r#"
            <table><thead><tr><th>Irrelevant</th></tr></thead>
              <tbody><tr><td>junk</td></tr></tbody></table>
            <table><thead><tr><th>Name</th><th>POS</th><th>Salary</th></tr></thead>
              <tbody><tr><td><a href="/nba/player/_/id/1966/lebron-james">LeBron James</a></td><td>SF</td><td>$48,728,845</td></tr></tbody></table>
            <table><thead><tr><th>Name</th><th>POS</th><th>Salary</th></tr></thead>
              <tbody><tr><td>Austin Reaves</td><td>SG</td><td>$12,976,362</td></tr></tbody></table>"#;
        let set = extract(html, &spec, "roster");
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].text("PlayerLink"), Some("/nba/player/_/id/1966/lebron-james"));
        assert_eq!(set.records[1].text("Name"), Some("Austin Reaves"));
    }
}
