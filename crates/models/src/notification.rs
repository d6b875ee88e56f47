use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamped::Timestamped;

/// Notification preferences; keyed by application name or the global key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    /// Per-channel settings (`email`, `slack`, ...).
    #[serde(flatten)]
    pub channels: Map<String, Value>,
}

impl Timestamped for Notification {
    fn id(&self) -> Option<&str> { self.application.as_deref() }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}
