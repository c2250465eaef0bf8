pub mod activity_api;
pub mod clock;
pub mod config;
pub mod dashboard_api;
pub mod error;
pub mod model;
pub mod schedule_api;
pub mod search;
pub mod storage;
