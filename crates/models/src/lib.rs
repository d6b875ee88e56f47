//! Document model for the configuration store.
//! - `ObjectType` enumerates the document categories and their storage groups.
//! - `Document` is the closed union of document shapes, decoded by type.

pub mod application;
pub mod document;
pub mod entity_tags;
pub mod errors;
pub mod notification;
pub mod object_type;
pub mod pipeline;
pub mod plugin_info;
pub mod project;
pub mod service_account;
pub mod snapshot;
pub mod timestamped;

pub use document::Document;
pub use errors::ModelError;
pub use object_type::ObjectType;
pub use timestamped::Timestamped;
