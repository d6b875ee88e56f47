use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamped::Timestamped;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_providers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    /// Attributes this crate does not model, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Application {
    fn id(&self) -> Option<&str> { Some(&self.name) }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}

/// Access grants of an application, stored separately from the application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPermission {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for ApplicationPermission {
    fn id(&self) -> Option<&str> { Some(&self.name) }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}
