//! Metrics derivation over loaded run and change records.
//!
//! Every function here is pure: inputs are borrowed, never mutated, and
//! identical inputs give identical outputs. Numeric edge cases resolve to
//! defined fallbacks instead of errors.

pub mod change_type;
pub mod hierarchy;
pub mod recipe;
pub mod roi;
pub mod stats;
pub mod timeline;

pub use change_type::{aggregate_change_types, classify, ChangeType, ChangeTypeAggregation};
pub use hierarchy::{build_hierarchy, ChangeParentResolver, FlatHierarchy, ParentResolver, RecipeHierarchyNode};
pub use recipe::{enrich_recipes, filter_recipes, sort_recipes, RecipePerformanceMetrics, RecipeSortKey};
pub use roi::{compute_roi, RoiMetrics};
pub use stats::{distribution, DistributionStats};
pub use timeline::{cycle_timeline, CyclePoint};

use crate::records::{FileChangeRecord, RecipeRunRecord};

/// Holds only the hierarchy strategy; build once and pass by reference.
pub struct MetricsEngine {
    resolver: Box<dyn ParentResolver + Send + Sync>,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::with_resolver(Box::new(FlatHierarchy))
    }

    pub fn with_resolver(resolver: Box<dyn ParentResolver + Send + Sync>) -> Self {
        Self { resolver }
    }

    pub fn roi(&self, runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> RoiMetrics {
        compute_roi(runs, changes)
    }

    pub fn recipes(&self, runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> Vec<RecipePerformanceMetrics> {
        enrich_recipes(runs, changes)
    }

    pub fn change_types(&self, runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> Vec<ChangeTypeAggregation> {
        aggregate_change_types(runs, changes)
    }

    pub fn hierarchy(&self, runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> Vec<RecipeHierarchyNode> {
        build_hierarchy(runs, changes, self.resolver.as_ref())
    }

    pub fn timeline(&self, changes: &[FileChangeRecord]) -> Vec<CyclePoint> {
        cycle_timeline(changes)
    }

    pub fn distribution(&self, values: &[f64]) -> DistributionStats {
        distribution(values)
    }
}
