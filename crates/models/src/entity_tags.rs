use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamped::Timestamped;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTags {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_ref: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for EntityTags {
    fn id(&self) -> Option<&str> { Some(&self.id) }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}
