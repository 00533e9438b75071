//! CSV ingestion for migration-tool exports.
//!
//! Columns are mapped by header label, so column order in the export does not
//! matter. Individual cells never fail a load: numbers that cannot be read
//! become zero and missing text becomes empty. Only a source with no header,
//! or without the recipe-name column for its kind, is rejected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::records::{FileChangeRecord, RecipeRunRecord, RecordKind};

pub const RECIPE: &str = "The recipe";
pub const SOURCE_FILE_COUNT: &str = "Source file count";
pub const SOURCE_FILE_CHANGED_COUNT: &str = "Source file changed count";
pub const CUMULATIVE_SCANNING_TIME: &str = "Cumulative scanning time (ns)";
pub const P99_SCANNING_TIME: &str = "99th percentile scanning time (ns)";
pub const MAX_SCANNING_TIME: &str = "Max scanning time (ns)";
pub const CUMULATIVE_EDIT_TIME: &str = "Cumulative edit time (ns)";
pub const P99_EDIT_TIME: &str = "99th percentile edit time (ns)";
pub const MAX_EDIT_TIME: &str = "Max edit time (ns)";

pub const SOURCE_PATH_BEFORE: &str = "Source path before the run";
pub const SOURCE_PATH_AFTER: &str = "Source path after the run";
pub const PARENT_RECIPE: &str = "Parent of the recipe that made changes";
pub const RECIPE_CHANGES: &str = "Recipe that made changes";
pub const ESTIMATED_TIME_SAVING: &str = "Estimated time saving";
pub const CYCLE: &str = "Cycle";

pub const RECIPE_RUN_COLUMNS: [&str; 9] = [
    RECIPE,
    SOURCE_FILE_COUNT,
    SOURCE_FILE_CHANGED_COUNT,
    CUMULATIVE_SCANNING_TIME,
    P99_SCANNING_TIME,
    MAX_SCANNING_TIME,
    CUMULATIVE_EDIT_TIME,
    P99_EDIT_TIME,
    MAX_EDIT_TIME,
];

pub const FILE_CHANGE_COLUMNS: [&str; 6] = [
    SOURCE_PATH_BEFORE,
    SOURCE_PATH_AFTER,
    PARENT_RECIPE,
    RECIPE_CHANGES,
    ESTIMATED_TIME_SAVING,
    CYCLE,
];

/// Fragments of the column-description text some exports place in the first
/// data row.
const DESCRIPTION_PHRASES: &[&str] = &[
    "whose stats are being measured",
    "The number of source files",
    "The total time spent",
    "out of 100",
    "The max time",
    "The source path of the file",
    "A recipe may modify the source path",
    "In a hierarchical recipe",
    "The specific recipe that made a change",
    "The estimated time saving",
    "The recipe cycle in which",
];

pub fn expected_columns(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::RecipeRun => &RECIPE_RUN_COLUMNS,
        RecordKind::FileChange => &FILE_CHANGE_COLUMNS,
    }
}

fn required_column(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::RecipeRun => RECIPE,
        RecordKind::FileChange => RECIPE_CHANGES,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadManifest {
    pub source_id: String,
    pub kind: RecordKind,
    pub hash_sha256: String,
    pub row_count: u64,
    pub dropped_rows: u64,
    pub description_row_skipped: bool,
    pub columns: Vec<String>,
    pub missing_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub expected: Vec<String>,
    pub missing: Vec<String>,
    pub ok: bool,
    pub message: String,
}

/// Records parsed from one source, with the manifest describing the parse.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub manifest: LoadManifest,
}

struct ColumnMap {
    index: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(header: &[String]) -> Self {
        let mut index = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { index }
    }

    fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    fn get<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        self.index
            .get(column)
            .and_then(|&i| row.get(i))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// Split CSV text into rows of unquoted, trimmed cells.
///
/// Double-quoted cells may contain commas, newlines and `""` escapes. Blank
/// lines are ignored.
pub fn split_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, cell: &mut String) {
        row.push(cell.trim().to_string());
        cell.clear();
        let line = std::mem::take(row);
        let blank = line.iter().all(|c| c.is_empty());
        if !blank {
            rows.push(line);
        }
    }

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => {
                row.push(cell.trim().to_string());
                cell.clear();
            }
            '\r' => {}
            '\n' => finish_row(&mut rows, &mut row, &mut cell),
            _ => cell.push(c),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        finish_row(&mut rows, &mut row, &mut cell);
    }
    rows
}

/// Read a float cell. Empty, unparsable, non-finite and negative values become 0.
pub fn coerce_f64(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Read a count cell. Float text is truncated; anything unreadable becomes 0.
pub fn coerce_count(cell: &str) -> u64 {
    let cell = cell.trim();
    cell.parse::<u64>()
        .ok()
        .unwrap_or_else(|| coerce_f64(cell).trunc() as u64)
}

fn nullable_path(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "null" {
        None
    } else {
        Some(cell.to_string())
    }
}

pub fn is_description_row(row: &[String]) -> bool {
    row.iter()
        .any(|cell| DESCRIPTION_PHRASES.iter().any(|p| cell.contains(p)))
}

pub fn content_sha256(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

struct Table {
    header: Vec<String>,
    columns: ColumnMap,
    body: Vec<Vec<String>>,
    description_row_skipped: bool,
    missing_columns: Vec<String>,
}

fn read_table(id: &str, text: &str, kind: RecordKind) -> Result<Table, LoadError> {
    let mut rows = split_rows(text).into_iter();
    let header = rows.next().ok_or_else(|| LoadError::MissingHeader { id: id.to_string() })?;
    let columns = ColumnMap::new(&header);
    let required = required_column(kind);
    if !columns.contains(required) {
        return Err(LoadError::MissingColumn {
            id: id.to_string(),
            kind,
            column: required,
        });
    }
    let missing_columns = expected_columns(kind)
        .iter()
        .filter(|c| !columns.contains(c))
        .map(|c| c.to_string())
        .collect();

    let mut body: Vec<Vec<String>> = rows.collect();
    let description_row_skipped = body.first().map(|r| is_description_row(r)).unwrap_or(false);
    if description_row_skipped {
        body.remove(0);
    }
    Ok(Table {
        header,
        columns,
        body,
        description_row_skipped,
        missing_columns,
    })
}

fn manifest_for(id: &str, text: &str, kind: RecordKind, table: &Table, rows: u64, dropped: u64) -> LoadManifest {
    LoadManifest {
        source_id: id.to_string(),
        kind,
        hash_sha256: content_sha256(text),
        row_count: rows,
        dropped_rows: dropped,
        description_row_skipped: table.description_row_skipped,
        columns: table.header.clone(),
        missing_columns: table.missing_columns.clone(),
    }
}

pub fn parse_recipe_runs(id: &str, text: &str) -> Result<Parsed<RecipeRunRecord>, LoadError> {
    let kind = RecordKind::RecipeRun;
    let table = read_table(id, text, kind)?;
    let cols = &table.columns;
    let records: Vec<RecipeRunRecord> = table
        .body
        .iter()
        .map(|row| RecipeRunRecord {
            recipe: cols.get(row, RECIPE).to_string(),
            source_file_count: coerce_count(cols.get(row, SOURCE_FILE_COUNT)),
            source_file_changed_count: coerce_count(cols.get(row, SOURCE_FILE_CHANGED_COUNT)),
            cumulative_scanning_time_ns: coerce_f64(cols.get(row, CUMULATIVE_SCANNING_TIME)),
            p99_scanning_time_ns: coerce_f64(cols.get(row, P99_SCANNING_TIME)),
            max_scanning_time_ns: coerce_f64(cols.get(row, MAX_SCANNING_TIME)),
            cumulative_edit_time_ns: coerce_f64(cols.get(row, CUMULATIVE_EDIT_TIME)),
            p99_edit_time_ns: coerce_f64(cols.get(row, P99_EDIT_TIME)),
            max_edit_time_ns: coerce_f64(cols.get(row, MAX_EDIT_TIME)),
        })
        .collect();
    let manifest = manifest_for(id, text, kind, &table, records.len() as u64, 0);
    Ok(Parsed { records, manifest })
}

/// Rows without a responsible recipe are dropped and counted in the manifest.
pub fn parse_file_changes(id: &str, text: &str) -> Result<Parsed<FileChangeRecord>, LoadError> {
    let kind = RecordKind::FileChange;
    let table = read_table(id, text, kind)?;
    let cols = &table.columns;
    let mut records = Vec::with_capacity(table.body.len());
    let mut dropped = 0u64;
    for row in &table.body {
        let recipe = cols.get(row, RECIPE_CHANGES);
        if recipe.is_empty() {
            dropped += 1;
            continue;
        }
        records.push(FileChangeRecord {
            source_path_before: nullable_path(cols.get(row, SOURCE_PATH_BEFORE)),
            source_path_after: nullable_path(cols.get(row, SOURCE_PATH_AFTER)),
            parent_recipe: nullable_path(cols.get(row, PARENT_RECIPE)),
            recipe_changes: recipe.to_string(),
            estimated_time_saving: coerce_f64(cols.get(row, ESTIMATED_TIME_SAVING)),
            cycle: coerce_count(cols.get(row, CYCLE)),
        });
    }
    let manifest = manifest_for(id, text, kind, &table, records.len() as u64, dropped);
    Ok(Parsed { records, manifest })
}

pub fn validate_schema(text: &str, kind: RecordKind) -> SchemaReport {
    let columns = split_rows(text).into_iter().next().unwrap_or_default();
    let expected: Vec<String> = expected_columns(kind).iter().map(|s| s.to_string()).collect();
    let missing: Vec<String> = expected
        .iter()
        .filter(|c| !columns.contains(c))
        .cloned()
        .collect();
    let ok = missing.is_empty();
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("schema mismatch: missing {:?}", missing)
    };
    SchemaReport {
        columns,
        expected,
        missing,
        ok,
        message,
    }
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("records.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}
