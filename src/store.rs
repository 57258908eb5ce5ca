//! Idempotent CSV persistence. Artifacts are UTF-8 with a byte-order marker
//! so spreadsheet tools open the localized headers correctly. Persistence
//! failures are reported and contained; a multi-entity batch run continues
//! with the next unit of work.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::record::RecordSet;

/// UTF-8 byte-order marker, written at the start of every new artifact.
const BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteMode {
    /// Rewrite the artifact including the header line.
    Overwrite,
    /// Append rows without a header, preserving the first write's column
    /// order. Appending to a missing file degrades to a first write.
    Append,
}

/// Output subdirectories, one per data category.
pub const ROSTERS_DIR: &str = "rosters";
pub const PLAYER_STATS_DIR: &str = "player_stats";
pub const TEAM_STATS_DIR: &str = "team_stats";
pub const STANDINGS_DIR: &str = "standings";
pub const MERGED_DIR: &str = "merged";

pub struct CsvStore {
    output_dir: PathBuf,
}

impl CsvStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persists a record set under the output root. An empty set is skipped
    /// (warning, no artifact, disk untouched); an I/O failure is logged and
    /// reported as `None` so the batch can continue.
    pub fn save(&self, set: &RecordSet, file_name: &str, mode: WriteMode) -> Option<PathBuf> {
        self.save_in("", set, file_name, mode)
    }

    /// Persists into a category subdirectory.
    pub fn save_in(
        &self,
        subdir: &str,
        set: &RecordSet,
        file_name: &str,
        mode: WriteMode,
    ) -> Option<PathBuf> {
        if set.is_empty() {
            warn!(file_name, "record set is empty, skipping save");
            return None;
        }

        let dir = if subdir.is_empty() {
            self.output_dir.clone()
        } else {
            self.output_dir.join(subdir)
        };
        let path = dir.join(file_name);

        match self.write(set, &path, mode) {
            Ok(()) => {
                info!(path = %path.display(), rows = set.len(), "saved");
                Some(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to save");
                None
            }
        }
    }

    fn write(&self, set: &RecordSet, path: &Path, mode: WriteMode) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let columns = set.column_order();
        let appending = mode == WriteMode::Append && path.exists();

        let mut file = if appending {
            OpenOptions::new().append(true).open(path)?
        } else {
            File::create(path)?
        };

        let mut out = String::new();
        if !appending {
            out.push_str(BOM);
            out.push_str(&encode_row(columns.iter().map(String::as_str)));
            out.push_str("\r\n");
        }
        for record in &set.records {
            let cells: Vec<String> = columns
                .iter()
                .map(|label| {
                    record
                        .get(label)
                        .map(|f| f.to_string())
                        .unwrap_or_default()
                })
                .collect();
            out.push_str(&encode_row(cells.iter().map(String::as_str)));
            out.push_str("\r\n");
        }
        file.write_all(out.as_bytes())
    }
}

fn encode_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    cells.map(escape_cell).collect::<Vec<_>>().join(",")
}

fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
