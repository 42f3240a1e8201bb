use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// Represents a fully parsed Maven coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version:classifier@packaging`
///   `groupId:artifactId:version@packaging`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension / packaging type. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    /// Parse a Maven coordinate string. Surrounding `[` `]` (as used by
    /// install-profile references) are accepted and stripped.
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let trimmed = coord.trim();
        let trimmed = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed);

        // Split off @packaging first
        let (coord_part, packaging_override) = match trimmed.rfind('@') {
            Some(idx) => (&trimmed[..idx], Some(&trimmed[idx + 1..])),
            None => (trimmed, None),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        match parts.len() {
            3 | 4 => Ok(Self {
                group_id: parts[0].to_string(),
                artifact_id: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: parts.get(3).map(|c| c.to_string()),
                packaging: packaging_override.unwrap_or("jar").to_string(),
            }),
            _ => Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        }
    }

    /// Construct the group path portion (`net/sf/jopt-simple`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `group:artifact`, the part of the coordinate that names the dependency
    /// regardless of version.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Build the artifact filename.
    ///
    /// `artifactId-version[-classifier].packaging`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    /// Directory of the artifact in repository layout, with `/` separators
    /// and no trailing slash: `<group_path>/<artifact_id>/<version>`.
    pub fn layout_dir(&self) -> String {
        format!("{}/{}/{}", self.group_path(), self.artifact_id, self.version)
    }

    /// Construct the full URL for this artifact under the given repository base.
    ///
    /// Template:
    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!("{}/{}/{}", base, self.layout_dir(), self.filename())
    }

    /// Local path relative to the libraries directory.
    ///
    /// Mirrors Maven's local repo layout:
    /// `<group_path>/<artifact_id>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(c) => write!(
                f,
                "{}:{}:{}:{}@{}",
                self.group_id, self.artifact_id, self.version, c, self.packaging
            ),
            None => write!(
                f,
                "{}:{}:{}@{}",
                self.group_id, self.artifact_id, self.version, self.packaging
            ),
        }
    }
}
