use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TYPE: &str = "unknown";
pub const DEFAULT_TITLE: &str = "Untitled Activity";
pub const DEFAULT_CATEGORY: &str = "system";
pub const DEFAULT_STATUS: &str = "completed";

/// One entry of the agent activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    /// Milliseconds since the Unix epoch, assigned when the entry is recorded.
    pub timestamp: i64,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default = "default_status")]
    pub status: String,
}

/// Caller-supplied fields for a new activity. Anything else in the payload,
/// including a client timestamp, is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}
