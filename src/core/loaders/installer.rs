use async_trait::async_trait;

use crate::core::error::LauncherResult;
use crate::core::files::{ExtraFileRecord, FileRecord};
use crate::core::version::VersionJson;

use super::context::InstallContext;
use super::descriptor::{LoaderDescriptor, PackageType};
use super::overlay::OverlayInstaller;
use super::profile::{InstallProfile, ProfileInstaller};

/// What installing a loader produced.
#[derive(Debug, Clone, Default)]
pub struct LoaderSetup {
    /// Manifest layered over the base one at launch.
    pub manifest: Option<VersionJson>,
    /// Libraries to sync, in classpath order. Locally extracted ones have no URL.
    pub libraries: Vec<ExtraFileRecord>,
    /// Other files the installer wrote.
    pub files: Vec<FileRecord>,
    /// Client archive to launch instead of the vanilla one.
    pub client_jar: Option<FileRecord>,
    /// Present when the profile declares processors.
    pub profile: Option<InstallProfile>,
}

#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderSetup>;
}

/// Picks the installer for a package type without boxing.
pub enum Installer {
    Overlay(OverlayInstaller),
    Profile(ProfileInstaller),
}

impl Installer {
    pub fn new(descriptor: &LoaderDescriptor) -> Self {
        match descriptor.loader_type {
            PackageType::Installer => Self::Profile(ProfileInstaller),
            PackageType::Overlay => Self::Overlay(OverlayInstaller),
        }
    }

    pub async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderSetup> {
        match self {
            Installer::Overlay(i) => i.install(ctx).await,
            Installer::Profile(i) => i.install(ctx).await,
        }
    }
}
