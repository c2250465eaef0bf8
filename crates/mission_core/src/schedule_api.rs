use crate::clock::{self, WEEK_MS};
use crate::error::AppError;
use crate::model::{Schedule, ScheduledTask};
use crate::storage::json_store;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use time::{Duration, OffsetDateTime};

/// Upper bound on occurrences generated for a single task in one week.
pub const MAX_OCCURRENCES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekTask {
    pub task: ScheduledTask,
    pub occurrences: Vec<i64>,
}

pub fn list_tasks(path: &Path, enabled_only: bool) -> Vec<ScheduledTask> {
    let tasks: Vec<ScheduledTask> = json_store::load_records(path);
    if enabled_only {
        tasks.into_iter().filter(|task| task.enabled).collect()
    } else {
        tasks
    }
}

pub fn occurrences_for_week(path: &Path, week_start_ms: i64) -> Vec<WeekTask> {
    let tasks: Vec<ScheduledTask> = json_store::load_records(path);
    expand_week(tasks, week_start_ms)
}

/// Pairs every enabled task with its fire times inside
/// `[week_start_ms, week_start_ms + 7d)`, dropping tasks that never fire.
pub fn expand_week(tasks: Vec<ScheduledTask>, week_start_ms: i64) -> Vec<WeekTask> {
    tasks
        .into_iter()
        .filter(|task| task.enabled)
        .filter_map(|task| {
            let occurrences = task_occurrences(&task, week_start_ms);
            if occurrences.is_empty() {
                None
            } else {
                Some(WeekTask { task, occurrences })
            }
        })
        .collect()
}

/// Fire times of one task inside the week window.
///
/// `every` schedules step from `next_run` (or the window start when unset)
/// by the interval. The anchor is trusted as-is: a stale or unaligned
/// `next_run` yields occurrences that are out of phase with the real job.
/// `expr` schedules are never evaluated and produce nothing.
pub fn task_occurrences(task: &ScheduledTask, week_start_ms: i64) -> Vec<i64> {
    let week_end_ms = week_start_ms.saturating_add(WEEK_MS);
    let in_window = |at: i64| at >= week_start_ms && at < week_end_ms;

    match &task.schedule {
        Schedule::At { at_ms: Some(at_ms) } if in_window(*at_ms) => vec![*at_ms],
        Schedule::At { .. } => Vec::new(),
        Schedule::Every {
            every_ms: Some(every_ms),
        } if *every_ms > 0 => {
            let anchor = task.next_run.unwrap_or(week_start_ms);
            interval_occurrences(anchor, *every_ms, week_start_ms, week_end_ms)
        }
        Schedule::Every { .. } => Vec::new(),
        Schedule::Expr { .. } => Vec::new(),
    }
}

fn interval_occurrences(anchor: i64, every_ms: i64, start: i64, end: i64) -> Vec<i64> {
    let mut cursor = anchor;
    if cursor < start {
        // First step at or after the window start, in i128 so huge gaps or
        // intervals cannot overflow.
        let gap = i128::from(start) - i128::from(cursor);
        let every = i128::from(every_ms);
        let steps = (gap + every - 1) / every;
        match i64::try_from(i128::from(cursor) + steps * every) {
            Ok(first) => cursor = first,
            Err(_) => return Vec::new(),
        }
    }

    let mut occurrences = Vec::new();
    while cursor < end && occurrences.len() < MAX_OCCURRENCES {
        occurrences.push(cursor);
        cursor = match cursor.checked_add(every_ms) {
            Some(next) => next,
            None => break,
        };
    }
    occurrences
}

pub fn upsert_task(path: &Path, task: ScheduledTask) -> Result<ScheduledTask, AppError> {
    let cron_id = task.cron_id.trim();
    if cron_id.is_empty() {
        return Err(AppError::invalid_input("cronId required"));
    }
    let task = ScheduledTask {
        cron_id: cron_id.to_string(),
        ..task
    };

    let value = serde_json::to_value(&task)?;
    let mut records = json_store::load_raw_records(path);
    match records
        .iter()
        .position(|existing| record_cron_id(existing) == Some(task.cron_id.as_str()))
    {
        Some(index) => records[index] = value,
        None => records.push(value),
    }
    json_store::save_records(path, &records)?;

    tracing::info!(cron_id = %task.cron_id, kind = task.schedule.kind(), "task synced");
    Ok(task)
}

/// Removes the task with `cron_id`. An unknown id is not an error.
pub fn remove_task(path: &Path, cron_id: &str) -> Result<(), AppError> {
    let cron_id = cron_id.trim();
    if cron_id.is_empty() {
        return Err(AppError::invalid_input("cronId required"));
    }

    let mut records = json_store::load_raw_records(path);
    let before = records.len();
    records.retain(|record| record_cron_id(record) != Some(cron_id));
    json_store::save_records(path, &records)?;

    tracing::info!(cron_id, removed = before - records.len(), "task removed");
    Ok(())
}

/// Matches stored entries by id even when the rest of the entry is not a
/// valid task.
fn record_cron_id(record: &Value) -> Option<&str> {
    record.get("cronId").and_then(Value::as_str)
}

/// Start (ms) of the local week containing `now`, shifted by `week_offset`
/// whole weeks.
pub fn week_start(now: OffsetDateTime, week_offset: i64) -> i64 {
    let monday = clock::start_of_week(now) + Duration::weeks(week_offset);
    clock::to_millis(monday)
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_OCCURRENCES, WeekTask, expand_week, list_tasks, occurrences_for_week, remove_task,
        task_occurrences, upsert_task, week_start,
    };
    use crate::clock::{DAY_MS, WEEK_MS};
    use crate::model::{Schedule, ScheduledTask};
    use crate::storage::json_store;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    const HOUR_MS: i64 = 60 * 60 * 1000;
    const WEEK_START: i64 = 1_770_000_000_000;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("mission-{nanos}-{file_name}"))
    }

    fn task(cron_id: &str, schedule: Schedule) -> ScheduledTask {
        ScheduledTask {
            cron_id: cron_id.to_string(),
            name: format!("job {cron_id}"),
            description: None,
            schedule,
            enabled: true,
            last_run: None,
            next_run: None,
            project: None,
        }
    }

    fn every(cron_id: &str, every_ms: i64, next_run: Option<i64>) -> ScheduledTask {
        ScheduledTask {
            next_run,
            ..task(
                cron_id,
                Schedule::Every {
                    every_ms: Some(every_ms),
                },
            )
        }
    }

    fn at(cron_id: &str, at_ms: i64) -> ScheduledTask {
        task(cron_id, Schedule::At { at_ms: Some(at_ms) })
    }

    #[test]
    fn at_schedule_included_only_inside_window() {
        assert_eq!(task_occurrences(&at("a", WEEK_START), WEEK_START), vec![WEEK_START]);
        assert_eq!(
            task_occurrences(&at("a", WEEK_START + WEEK_MS - 1), WEEK_START),
            vec![WEEK_START + WEEK_MS - 1]
        );
        assert!(task_occurrences(&at("a", WEEK_START + WEEK_MS), WEEK_START).is_empty());
        assert!(task_occurrences(&at("a", WEEK_START - 1), WEEK_START).is_empty());
    }

    #[test]
    fn at_schedule_without_time_never_fires() {
        let pending = task("a", Schedule::At { at_ms: None });
        assert!(task_occurrences(&pending, WEEK_START).is_empty());
    }

    #[test]
    fn every_schedule_steps_from_next_run() {
        let next_run = WEEK_START + 3 * HOUR_MS;
        let daily = every("daily", DAY_MS, Some(next_run));

        let occurrences = task_occurrences(&daily, WEEK_START);

        let expected: Vec<i64> = (0..7).map(|day| next_run + day * DAY_MS).collect();
        assert_eq!(occurrences, expected);
    }

    #[test]
    fn every_schedule_defaults_to_window_start() {
        let twice_daily = every("half", 12 * HOUR_MS, None);

        let occurrences = task_occurrences(&twice_daily, WEEK_START);

        assert_eq!(occurrences.len(), 14);
        assert_eq!(occurrences[0], WEEK_START);
        assert_eq!(occurrences[13], WEEK_START + 13 * 12 * HOUR_MS);
    }

    #[test]
    fn every_schedule_with_anchor_before_window_matches_stepping() {
        let anchor = WEEK_START - 5 * DAY_MS - 7 * HOUR_MS;
        let job = every("early", DAY_MS, Some(anchor));

        let occurrences = task_occurrences(&job, WEEK_START);

        let stepped: Vec<i64> = (0..)
            .map(|n| anchor + n * DAY_MS)
            .skip_while(|at| *at < WEEK_START)
            .take_while(|at| *at < WEEK_START + WEEK_MS)
            .collect();
        assert_eq!(occurrences, stepped);
        assert_eq!(occurrences.len(), 7);
    }

    #[test]
    fn every_schedule_is_capped() {
        let job = every("minutely", 60 * 1000, None);

        let occurrences = task_occurrences(&job, WEEK_START);

        assert_eq!(occurrences.len(), MAX_OCCURRENCES);
        assert_eq!(occurrences[49], WEEK_START + 49 * 60 * 1000);
    }

    #[test]
    fn every_schedule_after_window_is_empty() {
        let job = every("later", HOUR_MS, Some(WEEK_START + WEEK_MS));
        assert!(task_occurrences(&job, WEEK_START).is_empty());
    }

    #[test]
    fn non_positive_interval_never_fires() {
        assert!(task_occurrences(&every("zero", 0, None), WEEK_START).is_empty());
        assert!(task_occurrences(&every("negative", -HOUR_MS, None), WEEK_START).is_empty());
        let missing = task("missing", Schedule::Every { every_ms: None });
        assert!(task_occurrences(&missing, WEEK_START).is_empty());
    }

    #[test]
    fn expr_schedule_is_not_evaluated() {
        let cron = task(
            "cron",
            Schedule::Expr {
                expr: Some("0 9 * * *".to_string()),
                tz: None,
            },
        );
        assert!(task_occurrences(&cron, WEEK_START).is_empty());
    }

    #[test]
    fn expand_week_skips_disabled_and_silent_tasks() {
        let mut disabled = at("disabled", WEEK_START + HOUR_MS);
        disabled.enabled = false;
        let tasks = vec![
            at("inside", WEEK_START + HOUR_MS),
            at("outside", WEEK_START - HOUR_MS),
            disabled,
        ];

        let week = expand_week(tasks, WEEK_START);

        assert_eq!(
            week,
            vec![WeekTask {
                task: at("inside", WEEK_START + HOUR_MS),
                occurrences: vec![WEEK_START + HOUR_MS],
            }]
        );
    }

    #[test]
    fn upsert_replaces_by_cron_id() {
        let path = temp_path("upsert.json");
        upsert_task(&path, at("job-1", WEEK_START)).unwrap();
        upsert_task(&path, at("job-2", WEEK_START)).unwrap();
        let mut renamed = at("job-1", WEEK_START + HOUR_MS);
        renamed.name = "renamed".to_string();
        upsert_task(&path, renamed.clone()).unwrap();
        upsert_task(&path, renamed.clone()).unwrap();

        let tasks = list_tasks(&path, false);
        std::fs::remove_file(&path).ok();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], renamed);
        assert_eq!(tasks[1].cron_id, "job-2");
    }

    #[test]
    fn upsert_rejects_blank_cron_id() {
        let path = temp_path("upsert-blank.json");
        let err = upsert_task(&path, at("  ", WEEK_START)).unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(!path.exists());
    }

    #[test]
    fn remove_deletes_matching_task_only() {
        let path = temp_path("remove.json");
        json_store::save_records(&path, &[at("a", WEEK_START), at("b", WEEK_START)]).unwrap();

        remove_task(&path, "a").unwrap();
        let after_remove = list_tasks(&path, false);
        remove_task(&path, "missing").unwrap();
        let after_missing = list_tasks(&path, false);
        std::fs::remove_file(&path).ok();

        assert_eq!(after_remove, vec![at("b", WEEK_START)]);
        assert_eq!(after_missing, after_remove);
    }

    #[test]
    fn list_can_filter_enabled() {
        let path = temp_path("enabled.json");
        let mut paused = at("paused", WEEK_START);
        paused.enabled = false;
        json_store::save_records(&path, &[at("live", WEEK_START), paused]).unwrap();

        let all = list_tasks(&path, false);
        let enabled = list_tasks(&path, true);
        std::fs::remove_file(&path).ok();

        assert_eq!(all.len(), 2);
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].cron_id, "live");
    }

    #[test]
    fn occurrences_for_week_reads_store() {
        let path = temp_path("week.json");
        json_store::save_records(&path, &[every("hourly", 6 * HOUR_MS, None)]).unwrap();

        let week = occurrences_for_week(&path, WEEK_START);
        std::fs::remove_file(&path).ok();

        assert_eq!(week.len(), 1);
        assert_eq!(week[0].occurrences.len(), 28);
    }

    #[test]
    fn week_start_applies_offset() {
        let now = datetime!(2026-02-04 09:30 UTC);
        let current = week_start(now, 0);
        let next = week_start(now, 1);
        let previous = week_start(now, -1);

        assert_eq!(current, crate::clock::to_millis(datetime!(2026-02-02 00:00 UTC)));
        assert_eq!(next - current, WEEK_MS);
        assert_eq!(current - previous, WEEK_MS);
    }

    #[test]
    fn every_schedule_with_extreme_values_does_not_overflow() {
        let huge_interval = every("huge", i64::MAX, Some(WEEK_START - 10));
        assert!(task_occurrences(&huge_interval, WEEK_START).is_empty());

        let ancient_anchor = every("ancient", DAY_MS, Some(i64::MIN));
        let occurrences = task_occurrences(&ancient_anchor, WEEK_START);
        assert_eq!(occurrences.len(), 7);
        assert!(occurrences[0] >= WEEK_START && occurrences[0] < WEEK_START + DAY_MS);

        let late_window = every("late", HOUR_MS, None);
        let occurrences = task_occurrences(&late_window, i64::MAX - HOUR_MS);
        assert_eq!(occurrences, vec![i64::MAX - HOUR_MS]);
    }

    #[test]
    fn upsert_and_remove_keep_entries_they_cannot_decode() {
        let path = temp_path("malformed-tasks.json");
        let content = serde_json::json!([
            { "cronId": "good", "name": "digest", "schedule": { "kind": "at", "atMs": WEEK_START } },
            { "cronId": "odd", "name": "sync", "schedule": { "kind": "every", "everyMs": "hourly" } },
            { "cronId": "doomed", "name": 7, "schedule": { "kind": "at" } }
        ]);
        std::fs::write(&path, content.to_string()).unwrap();

        upsert_task(&path, at("new", WEEK_START + HOUR_MS)).unwrap();
        remove_task(&path, "doomed").unwrap();
        let raw = json_store::load_raw_records(&path);
        let decoded = list_tasks(&path, false);
        std::fs::remove_file(&path).ok();

        let raw_ids: Vec<&str> = raw.iter().filter_map(|r| r["cronId"].as_str()).collect();
        assert_eq!(raw_ids, vec!["good", "odd", "new"]);
        assert_eq!(raw[1]["schedule"]["everyMs"], "hourly");
        let decoded_ids: Vec<&str> = decoded.iter().map(|t| t.cron_id.as_str()).collect();
        assert_eq!(decoded_ids, vec!["good", "new"]);
    }
}
