pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{LatestVersions, VersionEntry, VersionManifest, VersionSelector};
pub use rules::{rules_allow, OsRule, Rule, RuleAction, RuleTarget};
pub use version_file::{
    resolve_arguments, ArgValues, ArgumentValue, Arguments, AssetIndexInfo, DownloadArtifact,
    LibraryArtifact, LibraryDownloads, LibraryEntry, VersionDownloads, VersionJson,
    DEFAULT_RUNTIME_COMPONENT,
};
