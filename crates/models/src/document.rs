use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::application::{Application, ApplicationPermission};
use crate::entity_tags::EntityTags;
use crate::errors::ModelError;
use crate::notification::Notification;
use crate::object_type::ObjectType;
use crate::pipeline::{Pipeline, PipelineTemplate};
use crate::plugin_info::PluginInfo;
use crate::project::Project;
use crate::service_account::ServiceAccount;
use crate::snapshot::Snapshot;
use crate::timestamped::Timestamped;

/// A stored document, one variant per [`ObjectType`].
///
/// Serializes as the bare inner document; decoding needs the object type to
/// pick the variant, see [`Document::from_slice`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Project(Project),
    Pipeline(Pipeline),
    Strategy(Pipeline),
    PipelineTemplate(PipelineTemplate),
    Notification(Notification),
    ServiceAccount(ServiceAccount),
    Application(Application),
    ApplicationPermission(ApplicationPermission),
    Snapshot(Snapshot),
    EntityTags(EntityTags),
    PluginInfo(PluginInfo),
}

fn decode<T: DeserializeOwned>(object_type: ObjectType, bytes: &[u8]) -> Result<T, ModelError> {
    serde_json::from_slice(bytes).map_err(|source| ModelError::Serialization { object_type, source })
}

impl Document {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Document::Project(_) => ObjectType::Project,
            Document::Pipeline(_) => ObjectType::Pipeline,
            Document::Strategy(_) => ObjectType::Strategy,
            Document::PipelineTemplate(_) => ObjectType::PipelineTemplate,
            Document::Notification(_) => ObjectType::Notification,
            Document::ServiceAccount(_) => ObjectType::ServiceAccount,
            Document::Application(_) => ObjectType::Application,
            Document::ApplicationPermission(_) => ObjectType::ApplicationPermission,
            Document::Snapshot(_) => ObjectType::Snapshot,
            Document::EntityTags(_) => ObjectType::EntityTags,
            Document::PluginInfo(_) => ObjectType::PluginInfo,
        }
    }

    /// Decode a JSON payload into the document shape of `object_type`.
    pub fn from_slice(object_type: ObjectType, bytes: &[u8]) -> Result<Self, ModelError> {
        Ok(match object_type {
            ObjectType::Project => Document::Project(decode(object_type, bytes)?),
            ObjectType::Pipeline => Document::Pipeline(decode(object_type, bytes)?),
            ObjectType::Strategy => Document::Strategy(decode(object_type, bytes)?),
            ObjectType::PipelineTemplate => Document::PipelineTemplate(decode(object_type, bytes)?),
            ObjectType::Notification => Document::Notification(decode(object_type, bytes)?),
            ObjectType::ServiceAccount => Document::ServiceAccount(decode(object_type, bytes)?),
            ObjectType::Application => Document::Application(decode(object_type, bytes)?),
            ObjectType::ApplicationPermission => {
                Document::ApplicationPermission(decode(object_type, bytes)?)
            }
            ObjectType::Snapshot => Document::Snapshot(decode(object_type, bytes)?),
            ObjectType::EntityTags => Document::EntityTags(decode(object_type, bytes)?),
            ObjectType::PluginInfo => Document::PluginInfo(decode(object_type, bytes)?),
        })
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(self).map_err(|source| ModelError::Serialization {
            object_type: self.object_type(),
            source,
        })
    }

    fn as_timestamped(&self) -> &dyn Timestamped {
        match self {
            Document::Project(d) => d,
            Document::Pipeline(d) | Document::Strategy(d) => d,
            Document::PipelineTemplate(d) => d,
            Document::Notification(d) => d,
            Document::ServiceAccount(d) => d,
            Document::Application(d) => d,
            Document::ApplicationPermission(d) => d,
            Document::Snapshot(d) => d,
            Document::EntityTags(d) => d,
            Document::PluginInfo(d) => d,
        }
    }

    fn as_timestamped_mut(&mut self) -> &mut dyn Timestamped {
        match self {
            Document::Project(d) => d,
            Document::Pipeline(d) | Document::Strategy(d) => d,
            Document::PipelineTemplate(d) => d,
            Document::Notification(d) => d,
            Document::ServiceAccount(d) => d,
            Document::Application(d) => d,
            Document::ApplicationPermission(d) => d,
            Document::Snapshot(d) => d,
            Document::EntityTags(d) => d,
            Document::PluginInfo(d) => d,
        }
    }
}

impl Timestamped for Document {
    fn id(&self) -> Option<&str> {
        self.as_timestamped().id()
    }

    fn last_modified(&self) -> Option<i64> {
        self.as_timestamped().last_modified()
    }

    fn set_last_modified(&mut self, millis: i64) {
        self.as_timestamped_mut().set_last_modified(millis)
    }

    fn last_modified_by(&self) -> Option<&str> {
        self.as_timestamped().last_modified_by()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_by_object_type_and_keeps_unknown_fields() -> anyhow::Result<()> {
        let bytes = serde_json::to_vec(&json!({
            "name": "billing",
            "email": "team@example.com",
            "instancePort": 7001
        }))?;

        let doc = Document::from_slice(ObjectType::Application, &bytes)?;
        let Document::Application(app) = &doc else {
            panic!("expected application, got {doc:?}");
        };
        assert_eq!(app.name, "billing");
        assert_eq!(app.extra.get("instancePort"), Some(&json!(7001)));

        let reencoded: serde_json::Value = serde_json::from_slice(&doc.to_vec()?)?;
        assert_eq!(reencoded, serde_json::from_slice::<serde_json::Value>(&bytes)?);
        Ok(())
    }

    #[test]
    fn strategy_shares_the_pipeline_shape() -> anyhow::Result<()> {
        let bytes = br#"{"id":"s1","name":"deploy","updateTs":"42"}"#;
        let doc = Document::from_slice(ObjectType::Strategy, bytes)?;
        assert_eq!(doc.object_type(), ObjectType::Strategy);
        assert_eq!(doc.id(), Some("s1"));
        assert_eq!(doc.last_modified(), Some(42));
        Ok(())
    }

    #[test]
    fn set_last_modified_reaches_the_inner_document() {
        let mut doc = Document::ServiceAccount(ServiceAccount { name: "robot".into(), ..Default::default() });
        assert_eq!(doc.last_modified(), None);
        doc.set_last_modified(7);
        assert_eq!(doc.last_modified(), Some(7));
    }

    #[test]
    fn wrong_shape_is_a_serialization_error() {
        let err = Document::from_slice(ObjectType::EntityTags, br#"{"tags": []}"#).unwrap_err();
        assert!(matches!(err, ModelError::Serialization { object_type: ObjectType::EntityTags, .. }));
    }
}
