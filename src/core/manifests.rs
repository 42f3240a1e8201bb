// ─── Manifest Resolver ───
// Resolves, in order, the loader descriptor, the game version manifest and
// the runtime manifest for one launch attempt. Nothing here is cached: every
// launch starts from the remote documents.

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::core::config::{Endpoints, JavaInstall};
use crate::core::error::LauncherResult;
use crate::core::http::{fetch_data, fetch_json};
use crate::core::java::RuntimeManifest;
use crate::core::loaders::LoaderDescriptor;
use crate::core::platform::Platform;
use crate::core::version::{VersionJson, VersionManifest, VersionSelector};

/// Runtime manifest for the component the version asks for.
#[derive(Debug, Clone)]
pub struct ResolvedRuntime {
    pub component: String,
    pub manifest: RuntimeManifest,
    /// Runtime index as served, persisted next to the runtime.
    pub raw_index: String,
}

/// Version manifest together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    pub manifest: VersionJson,
    pub raw: String,
}

pub struct ManifestResolver {
    client: Client,
    endpoints: Endpoints,
}

impl ManifestResolver {
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// The loader the server asks for. Without a server this is vanilla.
    #[instrument(skip(self))]
    pub async fn loader(&self, loader_url: Option<&str>) -> LauncherResult<LoaderDescriptor> {
        let Some(url) = loader_url else {
            debug!("No server configured, using vanilla");
            return Ok(LoaderDescriptor::vanilla());
        };

        let descriptor: LoaderDescriptor = fetch_data(&self.client, url, "loader").await?;
        descriptor.validate()?;
        info!("Server loader: {}", descriptor.label());
        Ok(descriptor)
    }

    /// Version to install: the explicit request, else the one the loader
    /// targets, else the latest release.
    pub fn selector(requested: Option<&str>, loader: &LoaderDescriptor) -> VersionSelector {
        fn given(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        given(requested)
            .or_else(|| given(loader.minecraft_version.as_deref()))
            .map(VersionSelector::parse)
            .unwrap_or(VersionSelector::LatestRelease)
    }

    #[instrument(skip(self, loader), fields(loader = %loader.label()))]
    pub async fn version(
        &self,
        requested: Option<&str>,
        loader: &LoaderDescriptor,
    ) -> LauncherResult<ResolvedVersion> {
        let selector = Self::selector(requested, loader);
        let index = VersionManifest::fetch(&self.client, &self.endpoints.version_manifest).await?;
        let entry = index.select(&selector)?;

        let (manifest, raw): (VersionJson, String) =
            fetch_json(&self.client, &entry.url, "version manifest").await?;
        info!("Resolved Minecraft {} ({})", manifest.id, manifest.version_type);
        Ok(ResolvedVersion { manifest, raw })
    }

    /// Runtime for `version` on `platform`. A manual install resolves nothing.
    #[instrument(skip(self, version), fields(version = %version.id))]
    pub async fn runtime(
        &self,
        install: JavaInstall,
        platform: &Platform,
        version: &VersionJson,
    ) -> LauncherResult<Option<ResolvedRuntime>> {
        if install == JavaInstall::Manual {
            debug!("Java is managed by the user");
            return Ok(None);
        }

        let component = version.runtime_component().to_string();
        let (manifest, raw_index) = RuntimeManifest::fetch(
            &self.client,
            &self.endpoints.java_runtime_index,
            platform,
            &component,
        )
        .await?;
        Ok(Some(ResolvedRuntime {
            component,
            manifest,
            raw_index,
        }))
    }
}
