use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of configuration document. Each type owns one storage group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    Project,
    Pipeline,
    Strategy,
    PipelineTemplate,
    Notification,
    ServiceAccount,
    Application,
    ApplicationPermission,
    Snapshot,
    EntityTags,
    PluginInfo,
}

impl ObjectType {
    /// Every type, ordered by [`ObjectType::index`].
    pub const ALL: [ObjectType; 11] = [
        ObjectType::Project,
        ObjectType::Pipeline,
        ObjectType::Strategy,
        ObjectType::PipelineTemplate,
        ObjectType::Notification,
        ObjectType::ServiceAccount,
        ObjectType::Application,
        ObjectType::ApplicationPermission,
        ObjectType::Snapshot,
        ObjectType::EntityTags,
        ObjectType::PluginInfo,
    ];

    /// Storage group name; the directory under the base path holding this type.
    pub fn group(self) -> &'static str {
        match self {
            ObjectType::Project => "projects",
            ObjectType::Pipeline => "pipelines",
            ObjectType::Strategy => "pipeline-strategies",
            ObjectType::PipelineTemplate => "pipeline-templates",
            ObjectType::Notification => "notifications",
            ObjectType::ServiceAccount => "serviceAccounts",
            ObjectType::Application => "applications",
            ObjectType::ApplicationPermission => "permissions",
            ObjectType::Snapshot => "snapshots",
            ObjectType::EntityTags => "tags",
            ObjectType::PluginInfo => "pluginInfo",
        }
    }

    /// Dense index into tables sized `ObjectType::ALL.len()`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Project => "project",
            ObjectType::Pipeline => "pipeline",
            ObjectType::Strategy => "strategy",
            ObjectType::PipelineTemplate => "pipeline-template",
            ObjectType::Notification => "notification",
            ObjectType::ServiceAccount => "service-account",
            ObjectType::Application => "application",
            ObjectType::ApplicationPermission => "application-permission",
            ObjectType::Snapshot => "snapshot",
            ObjectType::EntityTags => "entity-tags",
            ObjectType::PluginInfo => "plugin-info",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn index_matches_position_in_all() {
        for (position, ty) in ObjectType::ALL.iter().enumerate() {
            assert_eq!(ty.index(), position);
        }
    }

    #[test]
    fn groups_are_distinct() {
        let groups: HashSet<_> = ObjectType::ALL.iter().map(|t| t.group()).collect();
        assert_eq!(groups.len(), ObjectType::ALL.len());
    }
}
