use anyhow::{Context, Result};
use serde_json::json;

use migration_roi::config::{Config, ReportFormat};
use migration_roi::loader::RecordLoader;
use migration_roi::logging::{log, obj, v_str, Domain, Level};
use migration_roi::metrics::{ChangeParentResolver, MetricsEngine};
use migration_roi::report::DashboardReport;
use migration_roi::source::SourceKind;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let source = SourceKind::from_config(&cfg).build(&cfg)?;
    let loader = RecordLoader::new(source);

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("source", v_str(&loader.source_description())),
            ("recipe_stats_id", v_str(&cfg.recipe_stats_id)),
            ("file_changes_id", v_str(&cfg.file_changes_id)),
        ]),
    );

    let runs = loader
        .load_recipe_run_records(&cfg.recipe_stats_id)
        .await
        .with_context(|| format!("loading recipe stats from {}", loader.source_description()))?;
    let changes = loader
        .load_file_change_records(&cfg.file_changes_id)
        .await
        .with_context(|| format!("loading file changes from {}", loader.source_description()))?;

    let engine = if cfg.use_parent_hierarchy {
        MetricsEngine::with_resolver(Box::new(ChangeParentResolver::from_changes(&changes)))
    } else {
        MetricsEngine::new()
    };
    let report = DashboardReport::build(&engine, &runs, &changes);

    match cfg.report_format {
        ReportFormat::Json => println!("{}", report.to_json()?),
        ReportFormat::Text => print!("{}", report.render_text(cfg.top_n)),
    }

    log(
        Level::Info,
        Domain::Report,
        "written",
        obj(&[
            ("format", v_str(match cfg.report_format {
                ReportFormat::Json => "json",
                ReportFormat::Text => "text",
            })),
            ("recipes", json!(report.recipes.len())),
            ("cache", json!(loader.cache_stats())),
        ]),
    );
    Ok(())
}
