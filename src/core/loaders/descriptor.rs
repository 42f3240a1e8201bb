use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::files::FileRecord;

pub const VANILLA: &str = "vanilla";

/// How a loader package is applied to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    /// Ships an install profile that is resolved and patched.
    Installer,
    /// Merged straight into the client archive.
    #[serde(other)]
    Overlay,
}

/// What the remote loader endpoint says should run on top of the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderDescriptor {
    pub loader: String,
    #[serde(default)]
    pub minecraft_version: Option<String>,
    #[serde(default)]
    pub loader_version: String,
    #[serde(default = "default_package_type")]
    pub loader_type: PackageType,
    #[serde(default)]
    pub file: Option<FileRecord>,
}

fn default_package_type() -> PackageType {
    PackageType::Overlay
}

impl LoaderDescriptor {
    pub fn vanilla() -> Self {
        Self {
            loader: VANILLA.into(),
            minecraft_version: None,
            loader_version: String::new(),
            loader_type: PackageType::Overlay,
            file: None,
        }
    }

    pub fn is_vanilla(&self) -> bool {
        self.loader.eq_ignore_ascii_case(VANILLA)
    }

    /// The loader package record. Only vanilla may go without one.
    pub fn package(&self) -> LauncherResult<&FileRecord> {
        self.file
            .as_ref()
            .ok_or_else(|| LauncherError::MissingLoaderFile(self.label()))
    }

    pub fn validate(&self) -> LauncherResult<()> {
        if !self.is_vanilla() {
            self.package()?;
        }
        Ok(())
    }

    /// Id of the version this loader installs as: `<loader>-<loader_version>`.
    pub fn version_id(&self) -> String {
        if self.loader_version.is_empty() {
            self.loader.clone()
        } else {
            format!("{}-{}", self.loader, self.loader_version)
        }
    }

    pub fn label(&self) -> String {
        if self.loader_version.is_empty() {
            self.loader.clone()
        } else {
            format!("{} {}", self.loader, self.loader_version)
        }
    }
}
