//! Typed rows produced by the record loader.
//!
//! Both record kinds are immutable once parsed. They are joined transiently by
//! recipe name: `FileChangeRecord::recipe_changes` refers to
//! `RecipeRunRecord::recipe` by exact string match.

use serde::{Deserialize, Serialize};

/// Which CSV export a source holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    RecipeRun,
    FileChange,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::RecipeRun => "recipe_run",
            RecordKind::FileChange => "file_change",
        }
    }
}

/// Timing and volume for one recipe. All times are nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRunRecord {
    pub recipe: String,
    pub source_file_count: u64,
    pub source_file_changed_count: u64,
    pub cumulative_scanning_time_ns: f64,
    pub p99_scanning_time_ns: f64,
    pub max_scanning_time_ns: f64,
    pub cumulative_edit_time_ns: f64,
    pub p99_edit_time_ns: f64,
    pub max_edit_time_ns: f64,
}

impl RecipeRunRecord {
    /// Scan plus edit time, still in nanoseconds.
    pub fn cumulative_time_ns(&self) -> f64 {
        self.cumulative_scanning_time_ns + self.cumulative_edit_time_ns
    }
}

/// One file touched by one recipe in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileChangeRecord {
    /// `None` when the file was created by the run.
    pub source_path_before: Option<String>,
    /// `None` when the file was deleted by the run.
    pub source_path_after: Option<String>,
    pub parent_recipe: Option<String>,
    pub recipe_changes: String,
    /// Seconds.
    pub estimated_time_saving: f64,
    pub cycle: u64,
}

impl FileChangeRecord {
    /// Identity of the changed file: the path after the run, falling back to
    /// the path before it for deletions.
    pub fn path_key(&self) -> Option<&str> {
        self.source_path_after
            .as_deref()
            .or(self.source_path_before.as_deref())
    }
}
