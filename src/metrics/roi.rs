use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::records::{FileChangeRecord, RecipeRunRecord};
use crate::units::ns_to_secs;

/// Run-wide return on investment. Times are seconds; ratios are percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiMetrics {
    pub total_time_saved: f64,
    pub total_execution_time: f64,
    /// Time saved over execution time. Above 100 is normal.
    pub roi: f64,
    /// Unique changed files over total files processed.
    pub efficiency: f64,
    pub impact_per_file: f64,
    /// Sum over recipes, so a file scanned by several recipes counts each time.
    pub total_files_processed: u64,
    pub total_files_changed: u64,
}

pub fn compute_roi(runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> RoiMetrics {
    let total_time_saved: f64 = changes.iter().map(|c| c.estimated_time_saving).sum();
    let total_execution_time: f64 = runs.iter().map(|r| ns_to_secs(r.cumulative_time_ns())).sum();
    let roi = if total_execution_time > 0.0 {
        (total_time_saved / total_execution_time) * 100.0
    } else {
        0.0
    };

    let total_files_processed: u64 = runs.iter().map(|r| r.source_file_count).sum();
    let total_files_changed = changes
        .iter()
        .filter_map(|c| c.path_key())
        .collect::<HashSet<_>>()
        .len() as u64;

    let efficiency = if total_files_processed > 0 {
        (total_files_changed as f64 / total_files_processed as f64) * 100.0
    } else {
        0.0
    };
    let impact_per_file = if total_files_changed > 0 {
        total_time_saved / total_files_changed as f64
    } else {
        0.0
    };

    RoiMetrics {
        total_time_saved,
        total_execution_time,
        roi,
        efficiency,
        impact_per_file,
        total_files_processed,
        total_files_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(recipe: &str, files: u64, scan_ns: f64, edit_ns: f64) -> RecipeRunRecord {
        RecipeRunRecord {
            recipe: recipe.to_string(),
            source_file_count: files,
            cumulative_scanning_time_ns: scan_ns,
            cumulative_edit_time_ns: edit_ns,
            ..Default::default()
        }
    }

    fn change(before: Option<&str>, after: Option<&str>, saved: f64) -> FileChangeRecord {
        FileChangeRecord {
            source_path_before: before.map(String::from),
            source_path_after: after.map(String::from),
            recipe_changes: "a.B".to_string(),
            estimated_time_saving: saved,
            ..Default::default()
        }
    }

    #[test]
    fn computes_all_ratios() {
        let runs = vec![run("a.B", 10, 1.5e9, 0.5e9), run("c.D", 30, 1e9, 1e9)];
        let changes = vec![
            change(Some("x"), Some("x"), 60.0),
            change(Some("x"), Some("x"), 20.0),
            change(None, Some("y"), 40.0),
            change(Some("z"), None, 0.0),
        ];
        let m = compute_roi(&runs, &changes);
        assert_eq!(m.total_time_saved, 120.0);
        assert_eq!(m.total_execution_time, 4.0);
        assert_eq!(m.roi, 3000.0);
        assert_eq!(m.total_files_processed, 40);
        assert_eq!(m.total_files_changed, 3);
        assert!((m.efficiency - 7.5).abs() < 1e-9);
        assert_eq!(m.impact_per_file, 40.0);
    }

    #[test]
    fn zero_execution_time_means_zero_roi() {
        let runs = vec![run("a.B", 0, 0.0, 0.0)];
        let changes = vec![change(None, Some("x"), 500.0)];
        let m = compute_roi(&runs, &changes);
        assert_eq!(m.roi, 0.0);
        assert_eq!(m.efficiency, 0.0);
        assert_eq!(m.impact_per_file, 500.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(compute_roi(&[], &[]), RoiMetrics::default());
    }

    #[test]
    fn files_changed_ignores_records_without_paths() {
        let changes = vec![change(None, None, 1.0), change(None, None, 1.0)];
        assert_eq!(compute_roi(&[], &changes).total_files_changed, 0);
    }
}
