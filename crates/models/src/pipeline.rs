use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamped::Timestamped;

/// Pipeline or strategy definition.
///
/// Unlike the other documents the modification time travels as the string
/// field `updateTs`; it is parsed on read and rendered on write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Pipeline {
    fn id(&self) -> Option<&str> { self.id.as_deref() }

    fn last_modified(&self) -> Option<i64> {
        self.update_ts.as_deref().and_then(|ts| ts.parse().ok())
    }

    fn set_last_modified(&mut self, millis: i64) {
        self.update_ts = Some(millis.to_string());
    }

    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for PipelineTemplate {
    fn id(&self) -> Option<&str> { self.id.as_deref() }
    fn last_modified(&self) -> Option<i64> { self.last_modified }
    fn set_last_modified(&mut self, millis: i64) { self.last_modified = Some(millis); }
    fn last_modified_by(&self) -> Option<&str> { self.last_modified_by.as_deref() }
}
