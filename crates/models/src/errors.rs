use thiserror::Error;

use crate::object_type::ObjectType;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot (de)serialize {object_type} document: {source}")]
    Serialization {
        object_type: ObjectType,
        #[source]
        source: serde_json::Error,
    },
}
