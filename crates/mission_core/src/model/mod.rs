mod activity;
mod dashboard;
mod lenient;
mod task;

pub use activity::{
    Activity, DEFAULT_CATEGORY, DEFAULT_STATUS, DEFAULT_TITLE, DEFAULT_TYPE, NewActivity,
};
pub use dashboard::{
    Blocker, Community, Competitor, Dashboard, FreeTool, Metric, Project, ProjectDetail,
    ProjectLink, ProjectStatus, QuickLink, ResearchItem, ResearchStatus,
};
pub use task::{Schedule, ScheduledTask};
