use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamped::Timestamped;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub releases: Vec<PluginRelease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRelease {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512sum: Option<String>,
    #[serde(default)]
    pub preferred: bool,
}

impl PluginInfo {
    /// The release flagged as preferred, if any.
    pub fn preferred_release(&self) -> Option<&PluginRelease> {
        self.releases.iter().find(|r| r.preferred)
    }
}

impl Timestamped for PluginInfo {
    fn id(&self) -> Option<&str> { Some(&self.id) }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}
