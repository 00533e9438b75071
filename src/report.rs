//! Everything a dashboard needs from one pair of record sets, in one value.

use serde::Serialize;
use std::fmt::Write;

use crate::logging::{log_metrics_summary, ProfileScope};
use crate::metrics::recipe::top_recipes_by_time_saved;
use crate::metrics::{
    ChangeTypeAggregation, CyclePoint, DistributionStats, MetricsEngine, RecipeHierarchyNode,
    RecipePerformanceMetrics, RoiMetrics,
};
use crate::records::{FileChangeRecord, RecipeRunRecord};
use crate::units::{format_count, format_duration, format_percent};

#[derive(Debug, Clone, Serialize)]
pub struct Distributions {
    /// Recipe execution time, milliseconds.
    pub execution_time_ms: DistributionStats,
    /// Estimated saving per change record, seconds.
    pub time_saved_per_change: DistributionStats,
    pub change_efficiency: DistributionStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: String,
    pub roi: RoiMetrics,
    pub recipes: Vec<RecipePerformanceMetrics>,
    pub change_types: Vec<ChangeTypeAggregation>,
    pub hierarchy: Vec<RecipeHierarchyNode>,
    pub timeline: Vec<CyclePoint>,
    pub distributions: Distributions,
}

impl DashboardReport {
    pub fn build(engine: &MetricsEngine, runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> Self {
        let _scope = ProfileScope::new("report.build");
        let roi = engine.roi(runs, changes);
        let recipes = engine.recipes(runs, changes);
        let change_types = engine.change_types(runs, changes);

        let exec: Vec<f64> = recipes.iter().map(|r| r.total_execution_time_ms).collect();
        let saved: Vec<f64> = changes.iter().map(|c| c.estimated_time_saving).collect();
        let efficiency: Vec<f64> = recipes.iter().map(|r| r.change_efficiency).collect();
        let distributions = Distributions {
            execution_time_ms: engine.distribution(&exec),
            time_saved_per_change: engine.distribution(&saved),
            change_efficiency: engine.distribution(&efficiency),
        };

        log_metrics_summary(
            roi.total_time_saved,
            roi.total_execution_time,
            roi.roi,
            roi.efficiency,
            recipes.len(),
            change_types.len(),
        );

        Self {
            generated_at: crate::logging::ts_now(),
            hierarchy: engine.hierarchy(runs, changes),
            timeline: engine.timeline(changes),
            roi,
            recipes,
            change_types,
            distributions,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self, top_n: usize) -> String {
        let mut out = String::new();
        let r = &self.roi;
        let _ = writeln!(out, "Migration ROI ({})", self.generated_at);
        let _ = writeln!(out, "  time saved       {}", format_duration(r.total_time_saved));
        let _ = writeln!(out, "  execution time   {}", format_duration(r.total_execution_time));
        let _ = writeln!(out, "  ROI              {}", format_percent(r.roi));
        let _ = writeln!(
            out,
            "  files changed    {} of {} processed ({})",
            format_count(r.total_files_changed),
            format_count(r.total_files_processed),
            format_percent(r.efficiency)
        );
        let _ = writeln!(out, "  impact per file  {}", format_duration(r.impact_per_file));

        let _ = writeln!(out, "\nTop recipes by time saved");
        for m in top_recipes_by_time_saved(&self.recipes, top_n) {
            let _ = writeln!(
                out,
                "  {:<60} {:>12} {:>10}",
                m.recipe(),
                format_duration(m.total_time_saved),
                format_percent(m.recipe_roi)
            );
        }

        let _ = writeln!(out, "\nChange types");
        for ct in &self.change_types {
            let _ = writeln!(
                out,
                "  {:<24} {:>6} files {:>12} saved",
                ct.change_type,
                ct.files_affected,
                format_duration(ct.time_saved)
            );
        }

        if !self.timeline.is_empty() {
            let _ = writeln!(out, "\nCycles");
            for p in &self.timeline {
                let _ = writeln!(
                    out,
                    "  cycle {:<4} {:>12} saved, {:>12} cumulative",
                    p.cycle,
                    format_duration(p.time_saved),
                    format_duration(p.cumulative_time_saved)
                );
            }
        }
        out
    }
}
