//! Recipe hierarchy views.
//!
//! Parent discovery is delegated to a `ParentResolver`. The run-stats export
//! carries no parent column, so `FlatHierarchy` makes every recipe a root.
//! `ChangeParentResolver` reads the parent column of the change export when
//! one is present.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::recipe::{enrich_recipes, RecipePerformanceMetrics};
use crate::records::{FileChangeRecord, RecipeRunRecord};

pub trait ParentResolver {
    /// Parent recipe name for `recipe`, if it has one.
    fn parent_of(&self, recipe: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatHierarchy;

impl ParentResolver for FlatHierarchy {
    fn parent_of(&self, _recipe: &str) -> Option<String> {
        None
    }
}

/// Parent links taken from change records. The first non-empty parent seen
/// for a recipe wins; a recipe listed as its own parent is a root.
#[derive(Debug, Clone, Default)]
pub struct ChangeParentResolver {
    parents: HashMap<String, String>,
}

impl ChangeParentResolver {
    pub fn from_changes(changes: &[FileChangeRecord]) -> Self {
        let mut parents = HashMap::new();
        for c in changes {
            if let Some(parent) = &c.parent_recipe {
                if parent != &c.recipe_changes {
                    parents
                        .entry(c.recipe_changes.clone())
                        .or_insert_with(|| parent.clone());
                }
            }
        }
        Self { parents }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl ParentResolver for ChangeParentResolver {
    fn parent_of(&self, recipe: &str) -> Option<String> {
        self.parents.get(recipe).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeHierarchyNode {
    pub metrics: RecipePerformanceMetrics,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub depth: usize,
}

/// Number of ancestors of `recipe`. A parent cycle stops the walk.
fn depth_of(recipe: &str, resolver: &dyn ParentResolver) -> usize {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(recipe.to_string());
    let mut depth = 0;
    let mut current = recipe.to_string();
    while let Some(parent) = resolver.parent_of(&current) {
        if !seen.insert(parent.clone()) {
            break;
        }
        depth += 1;
        current = parent;
    }
    depth
}

/// One node per distinct recipe name, in first-seen order.
pub fn build_hierarchy(
    runs: &[RecipeRunRecord],
    changes: &[FileChangeRecord],
    resolver: &dyn ParentResolver,
) -> Vec<RecipeHierarchyNode> {
    let mut seen = HashSet::new();
    let mut nodes: Vec<RecipeHierarchyNode> = enrich_recipes(runs, changes)
        .into_iter()
        .filter(|m| seen.insert(m.run.recipe.clone()))
        .map(|metrics| {
            let parent = resolver.parent_of(&metrics.run.recipe);
            let depth = depth_of(&metrics.run.recipe, resolver);
            RecipeHierarchyNode {
                metrics,
                parent,
                children: Vec::new(),
                depth,
            }
        })
        .collect();

    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    for node in &nodes {
        if let Some(parent) = &node.parent {
            children
                .entry(parent.clone())
                .or_default()
                .push(node.metrics.run.recipe.clone());
        }
    }
    for node in &mut nodes {
        if let Some(kids) = children.remove(&node.metrics.run.recipe) {
            node.children = kids;
        }
    }
    nodes
}

pub fn roots(nodes: &[RecipeHierarchyNode]) -> impl Iterator<Item = &RecipeHierarchyNode> {
    nodes.iter().filter(|n| n.parent.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(recipe: &str) -> RecipeRunRecord {
        RecipeRunRecord {
            recipe: recipe.to_string(),
            ..Default::default()
        }
    }

    fn change(recipe: &str, parent: Option<&str>) -> FileChangeRecord {
        FileChangeRecord {
            recipe_changes: recipe.to_string(),
            parent_recipe: parent.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn flat_hierarchy_makes_every_recipe_a_root() {
        let runs = vec![run("a"), run("b"), run("a")];
        let nodes = build_hierarchy(&runs, &[], &FlatHierarchy);
        assert_eq!(nodes.len(), 2);
        for n in &nodes {
            assert_eq!(n.parent, None);
            assert!(n.children.is_empty());
            assert_eq!(n.depth, 0);
        }
        assert_eq!(roots(&nodes).count(), 2);
    }

    #[test]
    fn change_parents_link_nodes() {
        let runs = vec![run("root"), run("mid"), run("leaf")];
        let changes = vec![
            change("mid", Some("root")),
            change("leaf", Some("mid")),
            change("root", Some("root")),
        ];
        let resolver = ChangeParentResolver::from_changes(&changes);
        assert_eq!(resolver.len(), 2);
        let nodes = build_hierarchy(&runs, &changes, &resolver);
        assert_eq!(nodes[0].depth, 0);
        assert_eq!(nodes[0].children, vec!["mid"]);
        assert_eq!(nodes[1].parent.as_deref(), Some("root"));
        assert_eq!(nodes[2].depth, 2);
        assert!(nodes[2].children.is_empty());
    }

    #[test]
    fn parent_cycles_terminate() {
        let changes = vec![change("a", Some("b")), change("b", Some("a"))];
        let resolver = ChangeParentResolver::from_changes(&changes);
        let nodes = build_hierarchy(&[run("a"), run("b")], &changes, &resolver);
        assert_eq!(nodes[0].depth, 1);
        assert_eq!(nodes[1].depth, 1);
    }
}
