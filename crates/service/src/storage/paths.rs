use configs::MARKER_FILENAME;
use models::ObjectType;

use crate::errors::StorageError;

/// Maps (type, key) pairs onto backend object names.
///
/// Documents live at `{base}/{group}/{key}/{data_filename}` and the freshness
/// marker of a type at `{base}/{group}/last-modified`.
#[derive(Debug, Clone)]
pub struct ObjectPaths {
    base_path: String,
    data_filename: String,
}

impl ObjectPaths {
    pub fn new(base_path: &str, data_filename: &str) -> Result<Self, StorageError> {
        let base_path = base_path.trim_matches('/');
        if base_path.is_empty() {
            return Err(StorageError::Validation("base path must not be empty".into()));
        }
        if data_filename.is_empty() || data_filename.contains('/') {
            return Err(StorageError::Validation(format!("invalid data file name `{data_filename}`")));
        }
        if data_filename == MARKER_FILENAME {
            return Err(StorageError::Validation(format!(
                "data file name must differ from the marker file name `{MARKER_FILENAME}`"
            )));
        }
        Ok(Self { base_path: base_path.to_string(), data_filename: data_filename.to_string() })
    }

    /// Directory holding every object of `object_type`, without trailing slash.
    pub fn root(&self, object_type: ObjectType) -> String {
        format!("{}/{}", self.base_path, object_type.group())
    }

    /// Listing prefix for `object_type`.
    pub fn prefix(&self, object_type: ObjectType) -> String {
        format!("{}/", self.root(object_type))
    }

    pub fn data_path(&self, object_type: ObjectType, key: &str) -> String {
        format!("{}/{}/{}", self.root(object_type), key, self.data_filename)
    }

    pub fn marker_path(&self, object_type: ObjectType) -> String {
        format!("{}/{}", self.root(object_type), MARKER_FILENAME)
    }

    /// Recover the key from an object name under `object_type`'s root.
    /// Names that are not data files of that type yield `None`.
    pub fn key_from_name<'a>(&self, object_type: ObjectType, name: &'a str) -> Option<&'a str> {
        let prefix = self.prefix(object_type);
        let rest = name.strip_prefix(prefix.as_str())?;
        let key = rest.strip_suffix(self.data_filename.as_str())?.strip_suffix('/')?;
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> ObjectPaths {
        ObjectPaths::new("store", "specification.json").expect("valid paths")
    }

    #[test]
    fn data_and_marker_paths() {
        let p = paths();
        assert_eq!(p.data_path(ObjectType::Pipeline, "abc"), "store/pipelines/abc/specification.json");
        assert_eq!(p.marker_path(ObjectType::Pipeline), "store/pipelines/last-modified");
        assert_eq!(p.prefix(ObjectType::EntityTags), "store/tags/");
    }

    #[test]
    fn key_inverts_data_path() {
        let p = paths();
        for key in ["a", "with.dots", "nested/key"] {
            let name = p.data_path(ObjectType::Application, key);
            assert_eq!(p.key_from_name(ObjectType::Application, &name), Some(key));
        }
    }

    #[test]
    fn non_data_names_are_excluded() {
        let p = paths();
        let t = ObjectType::Application;
        assert_eq!(p.key_from_name(t, &p.marker_path(t)), None);
        assert_eq!(p.key_from_name(t, "store/applications/a/other.json"), None);
        assert_eq!(p.key_from_name(t, "store/applications/a/xspecification.json"), None);
        assert_eq!(p.key_from_name(t, "store/applications/specification.json"), None);
        assert_eq!(p.key_from_name(t, "store/pipelines/a/specification.json"), None);
    }

    #[test]
    fn rejects_colliding_configuration() {
        assert!(ObjectPaths::new("store", "last-modified").is_err());
        assert!(ObjectPaths::new("", "specification.json").is_err());
        assert!(ObjectPaths::new("store", "a/b").is_err());
    }

    #[test]
    fn trims_slashes_from_base() {
        let p = ObjectPaths::new("/store/", "d.json").expect("valid paths");
        assert_eq!(p.root(ObjectType::Project), "store/projects");
    }
}
