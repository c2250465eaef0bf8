use crate::model::{Activity, Dashboard, ProjectStatus};
use crate::storage::json_store;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub active_projects: usize,
    pub total_research_ideas: usize,
    pub top_research_score: Option<f64>,
    pub activities_completed: usize,
    pub activities_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub summary: DashboardSummary,
}

/// Loads `dashboard.json`, ranks research by score and attaches summary
/// counters derived from the activity log.
pub fn load_dashboard(dashboard_path: &Path, activities_path: &Path) -> DashboardView {
    let mut dashboard: Dashboard = json_store::load_document(dashboard_path);
    dashboard
        .research
        .sort_by(|a, b| b.score.total_cmp(&a.score));
    let activities: Vec<Activity> = json_store::load_records(activities_path);
    let summary = summarize(&dashboard, &activities);

    DashboardView { dashboard, summary }
}

pub fn summarize(dashboard: &Dashboard, activities: &[Activity]) -> DashboardSummary {
    DashboardSummary {
        total_projects: dashboard.projects.len(),
        active_projects: dashboard
            .projects
            .iter()
            .filter(|project| project.status == ProjectStatus::Active)
            .count(),
        total_research_ideas: dashboard.research.len(),
        top_research_score: dashboard
            .research
            .iter()
            .map(|item| item.score)
            .max_by(f64::total_cmp),
        activities_completed: count_status(activities, "completed"),
        activities_failed: count_status(activities, "failed"),
    }
}

fn count_status(activities: &[Activity], status: &str) -> usize {
    activities
        .iter()
        .filter(|activity| activity.status.eq_ignore_ascii_case(status))
        .count()
}
