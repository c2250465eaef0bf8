mod documents;

pub use documents::search_documents;

use crate::error::AppError;
use crate::model::{Activity, ScheduledTask};
use crate::storage::json_store;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Document,
    Memory,
    Activity,
    Task,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Memory => "memory",
            Self::Activity => "activity",
            Self::Task => "task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Result buckets kept separate; callers decide how to merge them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub documents: Vec<SearchResult>,
    pub memories: Vec<SearchResult>,
    pub activities: Vec<SearchResult>,
    pub tasks: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSources {
    pub workspace_dir: PathBuf,
    pub activities_path: PathBuf,
    pub tasks_path: PathBuf,
}

/// Checks the query length ignoring surrounding whitespace, then hands back
/// the query untouched so leading or trailing spaces still take part in the
/// match.
pub fn validate_query(query: Option<&str>) -> Result<String, AppError> {
    let query = query.unwrap_or_default();
    if query.trim().chars().count() < MIN_QUERY_CHARS {
        return Err(AppError::invalid_input(format!(
            "Query must be at least {MIN_QUERY_CHARS} characters"
        )));
    }
    Ok(query.to_string())
}

/// Runs the workspace walk and both record scans concurrently on the
/// blocking pool and waits for all three.
pub async fn search_all(
    sources: &SearchSources,
    query: &str,
    limit: usize,
) -> Result<SearchResults, AppError> {
    let query = validate_query(Some(query))?;

    let documents = {
        let (root, query) = (sources.workspace_dir.clone(), query.clone());
        tokio::task::spawn_blocking(move || search_documents(&root, &query, limit))
    };
    let activities = {
        let (path, query) = (sources.activities_path.clone(), query.clone());
        tokio::task::spawn_blocking(move || search_activities(&path, &query, limit))
    };
    let tasks = {
        let (path, query) = (sources.tasks_path.clone(), query.clone());
        tokio::task::spawn_blocking(move || search_tasks(&path, &query, limit))
    };

    let (documents, activities, tasks) = tokio::join!(documents, activities, tasks);
    let documents = documents.map_err(|err| AppError::io(format!("document search failed: {err}")))?;
    let activities =
        activities.map_err(|err| AppError::io(format!("activity search failed: {err}")))?;
    let tasks = tasks.map_err(|err| AppError::io(format!("task search failed: {err}")))?;

    let (memories, documents): (Vec<_>, Vec<_>) = documents
        .into_iter()
        .partition(|result| result.kind == SearchKind::Memory);

    tracing::debug!(
        query = %query,
        documents = documents.len(),
        memories = memories.len(),
        activities = activities.len(),
        tasks = tasks.len(),
        "search finished"
    );

    Ok(SearchResults {
        documents,
        memories,
        activities,
        tasks,
    })
}

pub fn search_activities(path: &Path, query: &str, limit: usize) -> Vec<SearchResult> {
    let activities: Vec<Activity> = json_store::load_records(path);
    let needle = query.to_lowercase();

    activities
        .into_iter()
        .filter(|activity| {
            contains_ignore_case(&activity.title, &needle)
                || activity
                    .description
                    .as_deref()
                    .is_some_and(|description| contains_ignore_case(description, &needle))
        })
        .take(limit)
        .map(|activity| SearchResult {
            kind: SearchKind::Activity,
            title: activity.title,
            content: activity.description.unwrap_or_default(),
            path: None,
            timestamp: Some(activity.timestamp),
            project: activity.project,
        })
        .collect()
}

pub fn search_tasks(path: &Path, query: &str, limit: usize) -> Vec<SearchResult> {
    let tasks: Vec<ScheduledTask> = json_store::load_records(path);
    let needle = query.to_lowercase();

    tasks
        .into_iter()
        .filter(|task| {
            contains_ignore_case(&task.name, &needle)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|description| contains_ignore_case(description, &needle))
        })
        .take(limit)
        .map(|task| SearchResult {
            kind: SearchKind::Task,
            title: task.name,
            content: task.description.unwrap_or_default(),
            path: None,
            timestamp: None,
            project: task.project,
        })
        .collect()
}

fn contains_ignore_case(haystack: &str, lower_needle: &str) -> bool {
    haystack.to_lowercase().contains(lower_needle)
}

#[cfg(test)]
mod tests {
    use super::{
        SearchKind, SearchSources, search_activities, search_all, search_tasks, validate_query,
    };
    use crate::model::{Activity, Schedule, ScheduledTask};
    use crate::storage::json_store;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mission-{nanos}-{name}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn activity(title: &str, description: Option<&str>) -> Activity {
        Activity {
            id: format!("act_{title}"),
            timestamp: 1_770_000_000_000,
            kind: "note".to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            category: "system".to_string(),
            project: Some("factursimple".to_string()),
            metadata: None,
            status: "completed".to_string(),
        }
    }

    fn task(name: &str, description: Option<&str>) -> ScheduledTask {
        ScheduledTask {
            cron_id: format!("cron-{name}"),
            name: name.to_string(),
            description: description.map(str::to_string),
            schedule: Schedule::Expr {
                expr: Some("0 9 * * 1".to_string()),
                tz: None,
            },
            enabled: true,
            last_run: None,
            next_run: None,
            project: None,
        }
    }

    #[test]
    fn validate_query_requires_two_characters() {
        assert_eq!(validate_query(None).unwrap_err().code(), "invalid_input");
        assert_eq!(validate_query(Some("a")).unwrap_err().code(), "invalid_input");
        assert_eq!(validate_query(Some("  a  ")).unwrap_err().code(), "invalid_input");
        assert_eq!(validate_query(Some("ab")).unwrap(), "ab");
        assert_eq!(validate_query(Some(" ab")).unwrap(), " ab");
    }

    #[test]
    fn padded_query_keeps_its_spaces_when_matching() {
        let dir = temp_dir("search-padded");
        let path = dir.join("activities.json");
        json_store::save_records(
            &path,
            &[activity("SEO audit", None), activity("Weekly seo sync", None)],
        )
        .unwrap();

        let query = validate_query(Some(" seo")).unwrap();
        let results = search_activities(&path, &query, 10);
        fs::remove_dir_all(&dir).ok();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Weekly seo sync"]);
    }

    #[test]
    fn kind_labels_match_serialized_names() {
        for kind in [
            SearchKind::Document,
            SearchKind::Memory,
            SearchKind::Activity,
            SearchKind::Task,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn activity_search_matches_title_or_description() {
        let dir = temp_dir("search-activities");
        let path = dir.join("activities.json");
        json_store::save_records(
            &path,
            &[
                activity("Deploy v2", None),
                activity("Weekly review", Some("deploy postponed")),
                activity("Reddit warmup", None),
            ],
        )
        .unwrap();

        let results = search_activities(&path, "DEPLOY", 10);
        let limited = search_activities(&path, "deploy", 1);
        fs::remove_dir_all(&dir).ok();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].kind, SearchKind::Activity);
        assert_eq!(results[0].content, "");
        assert_eq!(results[0].timestamp, Some(1_770_000_000_000));
        assert_eq!(results[1].content, "deploy postponed");
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn task_search_matches_name_or_description() {
        let dir = temp_dir("search-tasks");
        let path = dir.join("tasks.json");
        json_store::save_records(
            &path,
            &[
                task("SEO digest", None),
                task("Backup", Some("nightly seo export")),
                task("Cleanup", None),
            ],
        )
        .unwrap();

        let results = search_tasks(&path, "seo", 10);
        fs::remove_dir_all(&dir).ok();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["SEO digest", "Backup"]);
        assert!(results.iter().all(|r| r.kind == SearchKind::Task));
    }

    #[tokio::test]
    async fn search_all_partitions_buckets() {
        let dir = temp_dir("search-all");
        let workspace = dir.join("workspace");
        fs::create_dir_all(workspace.join("memory")).unwrap();
        fs::create_dir_all(workspace.join("factursimple")).unwrap();
        fs::write(workspace.join("memory/today.md"), "invoice generator shipped").unwrap();
        fs::write(workspace.join("factursimple/plan.md"), "build the invoice generator").unwrap();
        let sources = SearchSources {
            workspace_dir: workspace,
            activities_path: dir.join("activities.json"),
            tasks_path: dir.join("tasks.json"),
        };
        json_store::save_records(&sources.activities_path, &[activity("Invoice tool", None)])
            .unwrap();

        let results = search_all(&sources, "invoice", 20).await.unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.documents[0].project.as_deref(), Some("factursimple"));
        assert_eq!(results.memories.len(), 1);
        assert_eq!(results.activities.len(), 1);
        assert!(results.tasks.is_empty());
    }

    #[tokio::test]
    async fn search_all_rejects_short_query() {
        let dir = temp_dir("search-short");
        let sources = SearchSources {
            workspace_dir: dir.clone(),
            activities_path: dir.join("activities.json"),
            tasks_path: dir.join("tasks.json"),
        };

        let err = search_all(&sources, "x", 20).await.unwrap_err();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "invalid_input");
    }
}
