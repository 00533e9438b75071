//! Coarse change categories inferred from recipe names.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::records::{FileChangeRecord, RecipeRunRecord};
use crate::units::ns_to_ms;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Migration,
    ImportOrganization,
    StringFormatting,
    Composite,
    Security,
    Testing,
    Logging,
    /// Second-to-last segment of a dotted recipe name.
    Package(String),
    Other,
    Unknown,
}

/// Checked top to bottom; the first substring found wins.
const NAME_RULES: &[(&str, ChangeType)] = &[
    ("migrate", ChangeType::Migration),
    ("OrderImports", ChangeType::ImportOrganization),
    ("StringFormatted", ChangeType::StringFormatting),
    ("CompositeRecipe", ChangeType::Composite),
    ("security", ChangeType::Security),
    ("junit", ChangeType::Testing),
    ("logging", ChangeType::Logging),
];

impl ChangeType {
    pub fn label(&self) -> &str {
        match self {
            ChangeType::Migration => "Migration",
            ChangeType::ImportOrganization => "Import Organization",
            ChangeType::StringFormatting => "String Formatting",
            ChangeType::Composite => "Composite",
            ChangeType::Security => "Security",
            ChangeType::Testing => "Testing",
            ChangeType::Logging => "Logging",
            ChangeType::Package(segment) => segment,
            ChangeType::Other => "Other",
            ChangeType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify(recipe: &str) -> ChangeType {
    if recipe.is_empty() {
        return ChangeType::Unknown;
    }
    if let Some((_, ty)) = NAME_RULES.iter().find(|(needle, _)| recipe.contains(needle)) {
        return ty.clone();
    }
    let segments: Vec<&str> = recipe.split('.').collect();
    if segments.len() > 2 {
        ChangeType::Package(segments[segments.len() - 2].to_string())
    } else {
        ChangeType::Other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeTypeAggregation {
    pub change_type: String,
    /// Distinct paths after the run; deleted files are not counted.
    pub files: BTreeSet<String>,
    pub files_affected: usize,
    /// Seconds.
    pub time_saved: f64,
    pub execution_time_ms: f64,
    /// Distinct contributing recipes in first-seen order.
    pub recipes: Vec<String>,
}

impl ChangeTypeAggregation {
    fn new(change_type: String) -> Self {
        Self {
            change_type,
            files: BTreeSet::new(),
            files_affected: 0,
            time_saved: 0.0,
            execution_time_ms: 0.0,
            recipes: Vec::new(),
        }
    }
}

/// Buckets are created only by change records, in first-seen order. Run
/// records add execution time to a bucket that already exists and are
/// otherwise ignored, so a category whose recipes changed nothing never
/// shows up.
pub fn aggregate_change_types(runs: &[RecipeRunRecord], changes: &[FileChangeRecord]) -> Vec<ChangeTypeAggregation> {
    let mut buckets: Vec<ChangeTypeAggregation> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for c in changes {
        let label = classify(&c.recipe_changes).label().to_string();
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            buckets.push(ChangeTypeAggregation::new(label));
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot];
        if let Some(path) = &c.source_path_after {
            bucket.files.insert(path.clone());
        }
        bucket.time_saved += c.estimated_time_saving;
        if !bucket.recipes.iter().any(|r| r == &c.recipe_changes) {
            bucket.recipes.push(c.recipe_changes.clone());
        }
    }

    for r in runs {
        let label = classify(&r.recipe);
        if let Some(&slot) = index.get(label.label()) {
            buckets[slot].execution_time_ms += ns_to_ms(r.cumulative_time_ns());
        }
    }

    for bucket in &mut buckets {
        bucket.files_affected = bucket.files.len();
    }
    buckets
}
