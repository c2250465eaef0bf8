use crate::clock::{self, DAY_MS};
use crate::error::AppError;
use crate::model::{
    Activity, DEFAULT_CATEGORY, DEFAULT_STATUS, DEFAULT_TITLE, DEFAULT_TYPE, NewActivity,
};
use crate::storage::json_store;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use time::OffsetDateTime;

/// Most recent entries kept in the log; older ones are dropped on write.
pub const MAX_ACTIVITIES: usize = 10_000;
pub const DEFAULT_LIST_LIMIT: usize = 50;

const ID_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub category: Option<String>,
    pub project: Option<String>,
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_project: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityPage {
    pub activities: Vec<Activity>,
    pub stats: ActivityStats,
}

pub fn list_activities(path: &Path, filter: &ActivityFilter) -> ActivityPage {
    list_activities_at(path, filter, clock::now_local())
}

fn list_activities_at(path: &Path, filter: &ActivityFilter, now: OffsetDateTime) -> ActivityPage {
    let all: Vec<Activity> = json_store::load_records(path);
    let stats = compute_stats(&all, now);

    let mut activities: Vec<Activity> = all
        .into_iter()
        .filter(|activity| matches_filter(activity, filter))
        .collect();
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));

    ActivityPage { activities, stats }
}

fn matches_filter(activity: &Activity, filter: &ActivityFilter) -> bool {
    if let Some(category) = filter.category.as_deref()
        && activity.category != category
    {
        return false;
    }
    if let Some(project) = filter.project.as_deref()
        && activity.project.as_deref() != Some(project)
    {
        return false;
    }
    if let Some(kind) = filter.kind.as_deref()
        && activity.kind != kind
    {
        return false;
    }
    true
}

/// Rollups over the whole log. `today` starts at local midnight of `now`;
/// `this_week` reaches back seven days from that midnight, and the category
/// and project breakdowns only count entries inside that window.
pub fn compute_stats(activities: &[Activity], now: OffsetDateTime) -> ActivityStats {
    let today_start = clock::to_millis(clock::start_of_day(now));
    let week_start = today_start - 7 * DAY_MS;

    let mut stats = ActivityStats {
        total: activities.len(),
        ..ActivityStats::default()
    };

    for activity in activities {
        if activity.timestamp >= today_start {
            stats.today += 1;
        }
        if activity.timestamp < week_start {
            continue;
        }

        stats.this_week += 1;
        *stats
            .by_category
            .entry(activity.category.clone())
            .or_insert(0) += 1;
        if let Some(project) = activity.project.as_ref() {
            *stats.by_project.entry(project.clone()).or_insert(0) += 1;
        }
    }

    stats
}

pub fn record_activity(path: &Path, input: NewActivity) -> Result<Activity, AppError> {
    record_activity_at(path, input, clock::now_millis())
}

fn record_activity_at(path: &Path, input: NewActivity, now_ms: i64) -> Result<Activity, AppError> {
    let activity = Activity {
        id: generate_id(now_ms),
        timestamp: now_ms,
        kind: non_blank(input.kind).unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        title: non_blank(input.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: input.description,
        category: non_blank(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        project: non_blank(input.project),
        metadata: input.metadata,
        status: non_blank(input.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
    };

    let mut records = json_store::load_raw_records(path);
    records.insert(0, serde_json::to_value(&activity)?);
    if records.len() > MAX_ACTIVITIES {
        let dropped = records.len() - MAX_ACTIVITIES;
        records.truncate(MAX_ACTIVITIES);
        tracing::debug!(dropped, "pruned oldest activities");
    }
    json_store::save_records(path, &records)?;

    tracing::info!(id = %activity.id, kind = %activity.kind, category = %activity.category, "activity recorded");
    Ok(activity)
}

fn generate_id(now_ms: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("act_{now_ms}_{suffix}")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
