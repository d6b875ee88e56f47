use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamped::Timestamped;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Project {
    fn id(&self) -> Option<&str> { self.id.as_deref() }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}
