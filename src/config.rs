#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" | "txt" => ReportFormat::Text,
            _ => ReportFormat::Json,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Directory that file identifiers resolve against.
    pub data_dir: String,
    /// When set, identifiers resolve against this URL instead of `data_dir`.
    pub data_base_url: Option<String>,
    pub recipe_stats_id: String,
    pub file_changes_id: String,
    pub report_format: ReportFormat,
    /// Rows shown in the text report's top-recipe table.
    pub top_n: usize,
    /// Use parent-recipe links from the change export to build the hierarchy.
    pub use_parent_hierarchy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            data_base_url: None,
            recipe_stats_id: "org.openrewrite.table.RecipeRunStats.csv".to_string(),
            file_changes_id: "org.openrewrite.table.SourcesFileResults.csv".to_string(),
            report_format: ReportFormat::Json,
            top_n: 10,
            use_parent_hierarchy: false,
        }
    }
}

/// `1`, `true` or `yes` (any case) is on; any other value is off; unset is `None`.
fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| parse_flag(&v))
}

fn parse_flag(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(d.data_dir),
            data_base_url: std::env::var("DATA_BASE_URL").ok().filter(|v| !v.is_empty()),
            recipe_stats_id: std::env::var("RECIPE_STATS_ID").unwrap_or(d.recipe_stats_id),
            file_changes_id: std::env::var("FILE_CHANGES_ID").unwrap_or(d.file_changes_id),
            report_format: std::env::var("REPORT_FORMAT").map(|v| ReportFormat::parse(&v)).unwrap_or(d.report_format),
            top_n: std::env::var("TOP_N").ok().and_then(|v| v.parse().ok()).unwrap_or(d.top_n),
            use_parent_hierarchy: env_flag("PARENT_HIERARCHY").unwrap_or(d.use_parent_hierarchy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_format_parse() {
        assert_eq!(ReportFormat::parse("TEXT"), ReportFormat::Text);
        assert_eq!(ReportFormat::parse("json"), ReportFormat::Json);
        assert_eq!(ReportFormat::parse("yaml"), ReportFormat::Json);
    }

    #[test]
    fn flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
        assert_eq!(env_flag("MIGRATION_ROI_TEST_UNSET_FLAG"), None);
    }

    #[test]
    fn defaults_point_at_standard_exports() {
        let cfg = Config::default();
        assert!(cfg.recipe_stats_id.contains("RecipeRunStats"));
        assert!(cfg.file_changes_id.contains("SourcesFileResults"));
        assert_eq!(cfg.top_n, 10);
    }
}
