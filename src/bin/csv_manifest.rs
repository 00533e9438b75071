//! Check one export against its expected columns and write a manifest next to it.
//!
//! Usage:
//!   csv_manifest <file.csv> [recipe_run|file_change]

use migration_roi::data::{
    default_manifest_path, expected_columns, parse_file_changes, parse_recipe_runs, validate_schema,
};
use migration_roi::records::RecordKind;
use serde_json::json;
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let path = PathBuf::from(
        env::args()
            .nth(1)
            .unwrap_or_else(|| "data/org.openrewrite.table.RecipeRunStats.csv".to_string()),
    );
    let kind = match env::args().nth(2).as_deref() {
        Some("file_change") => RecordKind::FileChange,
        Some("recipe_run") | None => RecordKind::RecipeRun,
        Some(other) => {
            eprintln!("unknown record kind: {}", other);
            std::process::exit(1);
        }
    };

    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("failed to read {}: {}", path.display(), err);
            std::process::exit(1);
        }
    };

    let schema = validate_schema(&text, kind);
    if !schema.ok {
        eprintln!("{}", schema.message);
        eprintln!("expected columns: {:?}", expected_columns(kind));
    }

    let id = path.display().to_string();
    let manifest = match kind {
        RecordKind::RecipeRun => parse_recipe_runs(&id, &text).map(|p| p.manifest),
        RecordKind::FileChange => parse_file_changes(&id, &text).map(|p| p.manifest),
    };
    let manifest = match manifest {
        Ok(m) => m,
        Err(err) => {
            eprintln!("parse failed: {}", err);
            std::process::exit(2);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = json!({
        "manifest": manifest,
        "schema": schema,
    });
    let body = match serde_json::to_string_pretty(&payload) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("failed to encode manifest: {}", err);
            std::process::exit(3);
        }
    };
    if let Err(err) = fs::write(&out_path, body) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}
