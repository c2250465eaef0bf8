use crate::error::AppError;
use std::sync::OnceLock;
use time::{Duration, OffsetDateTime, Time, UtcOffset};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const WEEK_MS: i64 = 7 * DAY_MS;

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// The machine's UTC offset, resolved on first use and cached.
///
/// `time` refuses to read the local offset once other threads exist, so the
/// binary calls this before starting the async runtime.
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

pub fn to_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_millis(ms: i64) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map(|at| at.to_offset(local_offset()))
        .map_err(|err| AppError::invalid_input(format!("timestamp out of range: {err}")))
}

pub fn now_millis() -> i64 {
    to_millis(OffsetDateTime::now_utc())
}

pub fn start_of_day(at: OffsetDateTime) -> OffsetDateTime {
    at.replace_time(Time::MIDNIGHT)
}

/// Monday 00:00 of the week containing `at`, in `at`'s offset.
pub fn start_of_week(at: OffsetDateTime) -> OffsetDateTime {
    let days_since_monday = i64::from(at.weekday().number_days_from_monday());
    start_of_day(at) - Duration::days(days_since_monday)
}
