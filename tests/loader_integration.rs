//! End-to-end: CSV exports on disk -> loader -> engine -> report.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use migration_roi::data::{RECIPE_RUN_COLUMNS, FILE_CHANGE_COLUMNS};
use migration_roi::error::LoadError;
use migration_roi::loader::RecordLoader;
use migration_roi::metrics::{ChangeParentResolver, MetricsEngine};
use migration_roi::report::DashboardReport;
use migration_roi::source::FsSource;
use tempfile::TempDir;

fn write_csv(path: &Path, header: &[&str], rows: &[&str]) {
    let mut out = String::new();
    let quoted: Vec<String> = header.iter().map(|h| format!("\"{}\"", h)).collect();
    out.push_str(&quoted.join(","));
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

fn fixture(dir: &Path) {
    write_csv(
        &dir.join("runs.csv"),
        &RECIPE_RUN_COLUMNS,
        &[
            "\"The recipe whose stats are being measured both holistically and individually.\",\"The number of source files the recipe ran over.\",,,,,,,",
            "org.openrewrite.java.migrate.UpgradeToJava17,100,10,3000000000,1,1,1000000000,1,1",
            "org.openrewrite.java.OrderImports,100,5,1000000000,1,1,0,0,0",
            "com.acme.tools.Cleanup,0,0,,garbage,,,,",
        ],
    );
    write_csv(
        &dir.join("changes.csv"),
        &FILE_CHANGE_COLUMNS,
        &[
            "\"The source path of the file before the run. `null` when a source file was created during the run.\",,,,,",
            "src/A.java,src/A.java,org.openrewrite.java.migrate.UpgradeToJava17,org.openrewrite.java.migrate.UpgradeToJava17,120,1",
            "src/B.java,src/B.java,org.openrewrite.java.migrate.UpgradeToJava17,org.openrewrite.java.OrderImports,30,1",
            ",src/New.java,,org.openrewrite.java.migrate.UpgradeToJava17,60,2",
            "src/A.java,src/A.java,,org.openrewrite.java.OrderImports,\"10\",2",
            "src/C.java,src/C.java,,,99,1",
        ],
    );
}

#[tokio::test]
async fn loads_derives_and_reports() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path());
    let loader = RecordLoader::new(Box::new(FsSource::new(dir.path())));

    let runs = loader.load_recipe_run_records("runs.csv").await.unwrap();
    let changes = loader.load_file_change_records("changes.csv").await.unwrap();
    assert_eq!(runs.len(), 3);
    assert_eq!(changes.len(), 4);
    assert_eq!(runs[2].cumulative_scanning_time_ns, 0.0);
    assert_eq!(runs[2].p99_scanning_time_ns, 0.0);

    let manifest = loader.manifest("changes.csv").unwrap();
    assert!(manifest.description_row_skipped);
    assert_eq!(manifest.dropped_rows, 1);
    assert_eq!(manifest.hash_sha256.len(), 64);

    let report = DashboardReport::build(&MetricsEngine::new(), &runs, &changes);
    assert_eq!(report.roi.total_time_saved, 220.0);
    assert_eq!(report.roi.total_execution_time, 5.0);
    assert_eq!(report.roi.roi, 4400.0);
    assert_eq!(report.roi.total_files_processed, 200);
    assert_eq!(report.roi.total_files_changed, 3);

    let migrate = &report.recipes[0];
    assert_eq!(migrate.total_time_saved, 180.0);
    assert_eq!(migrate.scan_edit_ratio, 3.0);
    assert_eq!(report.recipes[1].scan_edit_ratio, f64::INFINITY);
    assert_eq!(report.recipes[2].scan_edit_ratio, 0.0);

    let labels: Vec<&str> = report.change_types.iter().map(|c| c.change_type.as_str()).collect();
    assert_eq!(labels, vec!["Migration", "Import Organization"]);
    assert_eq!(report.change_types[0].execution_time_ms, 4000.0);

    assert_eq!(report.timeline.len(), 2);
    assert_eq!(report.timeline[1].cumulative_time_saved, 220.0);
}

#[tokio::test]
async fn parent_column_feeds_hierarchy() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path());
    let loader = RecordLoader::new(Box::new(FsSource::new(dir.path())));
    let runs = loader.load_recipe_run_records("runs.csv").await.unwrap();
    let changes = loader.load_file_change_records("changes.csv").await.unwrap();

    let engine = MetricsEngine::with_resolver(Box::new(ChangeParentResolver::from_changes(&changes)));
    let nodes = engine.hierarchy(&runs, &changes);
    assert_eq!(nodes[0].children, vec!["org.openrewrite.java.OrderImports"]);
    assert_eq!(nodes[1].depth, 1);
    assert_eq!(nodes[2].depth, 0);
}

#[tokio::test]
async fn cache_survives_file_changes_until_cleared() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path());
    let loader = RecordLoader::new(Box::new(FsSource::new(dir.path())));
    let first = loader.load_recipe_run_records("runs.csv").await.unwrap();

    write_csv(&dir.path().join("runs.csv"), &RECIPE_RUN_COLUMNS, &["x.y.Z,1,1,1,1,1,1,1,1"]);
    let cached = loader.load_recipe_run_records("runs.csv").await.unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    loader.clear_cache();
    let fresh = loader.load_recipe_run_records("runs.csv").await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].recipe, "x.y.Z");
}

#[tokio::test]
async fn missing_source_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let loader = RecordLoader::new(Box::new(FsSource::new(dir.path())));
    let err = loader.load_file_change_records("nope.csv").await.unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert_eq!(loader.cache_stats().entries, 0);
}
