use clap::Parser;
use clap::error::ErrorKind;
use mission_core::activity_api::{self, ActivityFilter, ActivityPage};
use mission_core::clock;
use mission_core::config::{self, Settings};
use mission_core::error::AppError;
use mission_core::model::{Activity, NewActivity, ScheduledTask};
use mission_core::schedule_api::{self, WeekTask};
use mission_core::search::{self, DEFAULT_SEARCH_LIMIT, SearchResult, SearchResults};
use mission_server::cli::{self, Cli, Command, TasksCommand};
use mission_server::logging;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::macros::format_description;

fn format_millis(ms: i64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    clock::from_millis(ms)
        .ok()
        .and_then(|at| at.format(&format).ok())
        .unwrap_or_else(|| ms.to_string())
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table<R: Tabled>(rows: Vec<R>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Activity> for ActivityRow {
    fn from(activity: &Activity) -> Self {
        Self {
            when: format_millis(activity.timestamp),
            kind: activity.kind.clone(),
            title: activity.title.clone(),
            category: activity.category.clone(),
            project: or_dash(activity.project.as_deref()),
            status: activity.status.clone(),
        }
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Cron ID")]
    cron_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
    #[tabled(rename = "Enabled")]
    enabled: bool,
    #[tabled(rename = "Next run")]
    next_run: String,
}

impl From<&ScheduledTask> for TaskRow {
    fn from(task: &ScheduledTask) -> Self {
        Self {
            cron_id: task.cron_id.clone(),
            name: task.name.clone(),
            schedule: task.schedule.kind().to_string(),
            enabled: task.enabled,
            next_run: task
                .next_run
                .map(format_millis)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct OccurrenceRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Cron ID")]
    cron_id: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct SearchRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Snippet")]
    snippet: String,
}

impl From<&SearchResult> for SearchRow {
    fn from(result: &SearchResult) -> Self {
        Self {
            kind: result.kind.as_str().to_string(),
            title: result.title.clone(),
            snippet: result.content.chars().take(80).collect(),
        }
    }
}

fn print_activity_page(page: &ActivityPage) {
    if page.activities.is_empty() {
        println!("No activities.");
    } else {
        print_table(page.activities.iter().map(ActivityRow::from).collect());
    }
    println!(
        "Total: {} | Today: {} | This week: {}",
        page.stats.total, page.stats.today, page.stats.this_week
    );
}

fn print_week(week_start_ms: i64, week: &[WeekTask]) {
    println!("Week of {}", format_millis(week_start_ms));
    let mut rows: Vec<(i64, OccurrenceRow)> = week
        .iter()
        .flat_map(|entry| {
            entry.occurrences.iter().map(move |at| {
                (
                    *at,
                    OccurrenceRow {
                        when: format_millis(*at),
                        cron_id: entry.task.cron_id.clone(),
                        name: entry.task.name.clone(),
                    },
                )
            })
        })
        .collect();
    if rows.is_empty() {
        println!("No occurrences.");
        return;
    }
    rows.sort_by_key(|(at, _)| *at);
    print_table(rows.into_iter().map(|(_, row)| row).collect());
}

fn print_search_results(results: &SearchResults) {
    let rows: Vec<SearchRow> = results
        .documents
        .iter()
        .chain(&results.memories)
        .chain(&results.activities)
        .chain(&results.tasks)
        .map(SearchRow::from)
        .collect();
    if rows.is_empty() {
        println!("No matches.");
    } else {
        print_table(rows);
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

/// Defaults, then the config file, then environment, then command-line flags.
fn resolve_settings(cli: &Cli) -> Result<(Settings, Option<AppError>), AppError> {
    let loaded = config::load_config_with_fallback();
    let mut layered = config::merge_overrides(&loaded.config, &config::env_overrides()?);
    layered = config::merge_overrides(&layered, &cli::overrides_to_config(&cli.config_override)?);
    if let Some(Command::Serve { host, port }) = cli.command.as_ref() {
        if let Some(host) = host {
            layered.host = Some(host.clone());
        }
        if let Some(port) = port {
            layered.port = Some(*port);
        }
    }
    Ok((config::resolve(&layered)?, loaded.error))
}

fn serve(settings: Settings) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let handle = mission_server::start(settings).await?;
        println!("Mission Control listening on http://{}", handle.addr);
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        Ok(())
    })
}

fn run_command(cli: Cli, settings: Settings) -> Result<(), AppError> {
    match cli.command {
        None | Some(Command::Serve { .. }) => serve(settings)?,
        Some(Command::Log {
            title,
            kind,
            category,
            project,
            description,
            status,
        }) => {
            let input = NewActivity {
                kind,
                title: Some(title),
                description,
                category,
                project,
                metadata: None,
                status,
            };
            let activity = activity_api::record_activity(&settings.activities_path(), input)?;
            if cli.json {
                print_json(&activity)?;
            } else {
                println!("Recorded activity: {} ({})", activity.title, activity.id);
            }
        }
        Some(Command::Activities {
            limit,
            category,
            project,
            kind,
        }) => {
            let filter = ActivityFilter {
                category,
                project,
                kind,
                limit,
            };
            let page = activity_api::list_activities(&settings.activities_path(), &filter);
            if cli.json {
                print_json(&page)?;
            } else {
                print_activity_page(&page);
            }
        }
        Some(Command::Tasks { tasks }) => match tasks {
            TasksCommand::List { enabled_only } => {
                let tasks = schedule_api::list_tasks(&settings.tasks_path(), enabled_only);
                if cli.json {
                    print_json(&tasks)?;
                } else if tasks.is_empty() {
                    println!("No tasks.");
                } else {
                    print_table(tasks.iter().map(TaskRow::from).collect());
                }
            }
            TasksCommand::Week {
                week_start_ms,
                offset,
            } => {
                let week_start_ms = week_start_ms.unwrap_or_else(|| {
                    schedule_api::week_start(clock::now_local(), offset.unwrap_or(0))
                });
                let week = schedule_api::occurrences_for_week(&settings.tasks_path(), week_start_ms);
                if cli.json {
                    print_json(&week)?;
                } else {
                    print_week(week_start_ms, &week);
                }
            }
            TasksCommand::Remove { cron_id } => {
                schedule_api::remove_task(&settings.tasks_path(), &cron_id)?;
                if cli.json {
                    print_json(&serde_json::json!({ "success": true, "cronId": cron_id }))?;
                } else {
                    println!("Removed task: {cron_id}");
                }
            }
        },
        Some(Command::Search { query, limit }) => {
            let query = search::validate_query(Some(&query))?;
            let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
            let sources = settings.search_sources();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let results = runtime.block_on(search::search_all(&sources, &query, limit))?;
            if cli.json {
                print_json(&results)?;
            } else {
                print_search_results(&results);
            }
        }
    }

    Ok(())
}

fn main() {
    // Must run before any other thread exists.
    clock::local_offset();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let (settings, config_error) = match resolve_settings(&cli) {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    let serving = matches!(cli.command, None | Some(Command::Serve { .. }));
    logging::init(settings.log_format, if serving { "info" } else { "warn" });
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "config file ignored, using defaults");
    }

    if let Err(err) = run_command(cli, settings) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
