use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::records::FileChangeRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclePoint {
    pub cycle: u64,
    /// Seconds saved by changes made in this cycle.
    pub time_saved: f64,
    /// Distinct files changed in this cycle.
    pub files_changed: usize,
    pub recipes: BTreeSet<String>,
    /// Running total over this and all earlier cycles.
    pub cumulative_time_saved: f64,
}

#[derive(Default)]
struct CycleAcc<'a> {
    time_saved: f64,
    files: BTreeSet<&'a str>,
    recipes: BTreeSet<&'a str>,
}

/// Per-cycle totals in ascending cycle order.
pub fn cycle_timeline(changes: &[FileChangeRecord]) -> Vec<CyclePoint> {
    let mut by_cycle: BTreeMap<u64, CycleAcc<'_>> = BTreeMap::new();
    for c in changes {
        let acc = by_cycle.entry(c.cycle).or_default();
        acc.time_saved += c.estimated_time_saving;
        if let Some(path) = c.path_key() {
            acc.files.insert(path);
        }
        acc.recipes.insert(c.recipe_changes.as_str());
    }

    let mut cumulative = 0.0;
    by_cycle
        .into_iter()
        .map(|(cycle, acc)| {
            cumulative += acc.time_saved;
            CyclePoint {
                cycle,
                time_saved: acc.time_saved,
                files_changed: acc.files.len(),
                recipes: acc.recipes.into_iter().map(String::from).collect(),
                cumulative_time_saved: cumulative,
            }
        })
        .collect()
}
