use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::records::{FileChangeRecord, RecipeRunRecord};
use crate::units::ns_to_ms;

/// A recipe run enriched with derived timing and savings figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipePerformanceMetrics {
    #[serde(flatten)]
    pub run: RecipeRunRecord,
    pub total_execution_time_ms: f64,
    /// Scan time over edit time; `+inf` when only scanning took time.
    pub scan_edit_ratio: f64,
    pub change_efficiency: f64,
    /// Seconds saved by changes attributed to this recipe.
    pub total_time_saved: f64,
    pub recipe_roi: f64,
}

impl RecipePerformanceMetrics {
    pub fn recipe(&self) -> &str {
        &self.run.recipe
    }
}

/// Seconds saved per recipe name, summed over all change records.
pub fn time_saved_by_recipe(changes: &[FileChangeRecord]) -> HashMap<&str, f64> {
    let mut saved: HashMap<&str, f64> = HashMap::new();
    for c in changes {
        *saved.entry(c.recipe_changes.as_str()).or_insert(0.0) += c.estimated_time_saving;
    }
    saved
}

pub fn scan_edit_ratio(scan_ns: f64, edit_ns: f64) -> f64 {
    if edit_ns > 0.0 {
        scan_ns / edit_ns
    } else if scan_ns > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

pub fn enrich_run(run: &RecipeRunRecord, time_saved: f64) -> RecipePerformanceMetrics {
    let total_execution_time_ms = ns_to_ms(run.cumulative_time_ns());
    let change_efficiency = if run.source_file_count > 0 {
        (run.source_file_changed_count as f64 / run.source_file_count as f64) * 100.0
    } else {
        0.0
    };
    let recipe_roi = if total_execution_time_ms > 0.0 {
        (time_saved / (total_execution_time_ms / 1000.0)) * 100.0
    } else {
        0.0
    };
    RecipePerformanceMetrics {
        run: run.clone(),
        total_execution_time_ms,
        scan_edit_ratio: scan_edit_ratio(run.cumulative_scanning_time_ns, run.cumulative_edit_time_ns),
        change_efficiency,
        total_time_saved: time_saved,
        recipe_roi,
    }
}

/// One entry per run record, in input order.
pub fn enrich_recipes(runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> Vec<RecipePerformanceMetrics> {
    let saved = time_saved_by_recipe(changes);
    runs.iter()
        .map(|r| enrich_run(r, saved.get(r.recipe.as_str()).copied().unwrap_or(0.0)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSortKey {
    Recipe,
    ExecutionTime,
    TimeSaved,
    Roi,
    ChangeEfficiency,
    FilesChanged,
    ScanEditRatio,
}

impl RecipeSortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recipe" | "name" => Some(RecipeSortKey::Recipe),
            "execution_time" | "time" => Some(RecipeSortKey::ExecutionTime),
            "time_saved" | "saved" => Some(RecipeSortKey::TimeSaved),
            "roi" => Some(RecipeSortKey::Roi),
            "change_efficiency" | "efficiency" => Some(RecipeSortKey::ChangeEfficiency),
            "files_changed" => Some(RecipeSortKey::FilesChanged),
            "scan_edit_ratio" | "ratio" => Some(RecipeSortKey::ScanEditRatio),
            _ => None,
        }
    }

    fn compare(&self, a: &RecipePerformanceMetrics, b: &RecipePerformanceMetrics) -> Ordering {
        match self {
            RecipeSortKey::Recipe => a.run.recipe.cmp(&b.run.recipe),
            RecipeSortKey::ExecutionTime => a.total_execution_time_ms.total_cmp(&b.total_execution_time_ms),
            RecipeSortKey::TimeSaved => a.total_time_saved.total_cmp(&b.total_time_saved),
            RecipeSortKey::Roi => a.recipe_roi.total_cmp(&b.recipe_roi),
            RecipeSortKey::ChangeEfficiency => a.change_efficiency.total_cmp(&b.change_efficiency),
            RecipeSortKey::FilesChanged => a.run.source_file_changed_count.cmp(&b.run.source_file_changed_count),
            RecipeSortKey::ScanEditRatio => a.scan_edit_ratio.total_cmp(&b.scan_edit_ratio),
        }
    }
}

/// Stable sort, so equal keys keep their input order.
pub fn sort_recipes(metrics: &mut [RecipePerformanceMetrics], key: RecipeSortKey, descending: bool) {
    metrics.sort_by(|a, b| {
        let ord = key.compare(a, b);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Case-insensitive substring match on the recipe name. An empty query keeps everything.
pub fn filter_recipes<'a>(metrics: &'a [RecipePerformanceMetrics], query: &str) -> Vec<&'a RecipePerformanceMetrics> {
    let needle = query.trim().to_lowercase();
    metrics
        .iter()
        .filter(|m| needle.is_empty() || m.run.recipe.to_lowercase().contains(&needle))
        .collect()
}

pub fn top_recipes_by_time_saved(metrics: &[RecipePerformanceMetrics], n: usize) -> Vec<RecipePerformanceMetrics> {
    let mut sorted = metrics.to_vec();
    sort_recipes(&mut sorted, RecipeSortKey::TimeSaved, true);
    sorted.truncate(n);
    sorted
}
