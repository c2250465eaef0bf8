use super::lenient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static dashboard content curated by hand in `dashboard.json`.
///
/// Entries are decoded one at a time; a malformed project, research item,
/// link or detail section is dropped without losing the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(default, deserialize_with = "lenient::vec")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub research: Vec<ResearchItem>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub quick_links: Vec<QuickLink>,
    /// Per-project drill-down keyed by project id.
    #[serde(default, deserialize_with = "lenient::map")]
    pub project_details: BTreeMap<String, ProjectDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Completion percentage, 0 to 100.
    #[serde(default, deserialize_with = "lenient::percent")]
    pub progress: u8,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProjectLink>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    #[default]
    Planning,
    Paused,
    Completed,
    /// Any other label, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub validation: String,
    #[serde(default)]
    pub market_size: String,
    #[serde(default)]
    pub time_to_revenue: String,
    #[serde(default)]
    pub status: ResearchStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    Recommended,
    #[default]
    Consider,
    Parked,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickLink {
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
}

/// Launch checklist for one project: what blocks it, what shipped, and the
/// market around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(default, deserialize_with = "lenient::vec")]
    pub blockers: Vec<Blocker>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub free_tools: Vec<FreeTool>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub seo_articles: Vec<String>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub landing_page_features: Vec<String>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub competitors: Vec<Competitor>,
    #[serde(default, alias = "frenchCommunities", deserialize_with = "lenient::vec")]
    pub communities: Vec<Community>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub issue: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTool {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub weakness: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub members: String,
}
