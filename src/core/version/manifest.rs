// ─── Version Manifest ───
// The upstream version index (`version_manifest_v2.json`) and id selection.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::fetch_json;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// Which version the caller wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    LatestRelease,
    LatestSnapshot,
    Exact(String),
}

impl VersionSelector {
    /// `latest_release` / `latest_snapshot` are keywords, anything else is an id.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "latest_release" | "latest-release" | "release" => VersionSelector::LatestRelease,
            "latest_snapshot" | "latest-snapshot" | "snapshot" => VersionSelector::LatestSnapshot,
            other => VersionSelector::Exact(other.to_string()),
        }
    }
}

impl VersionManifest {
    /// Fetch the version index from `url`.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");
        let (manifest, _raw): (VersionManifest, String) =
            fetch_json(client, url, "version index").await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Resolve a selector to an entry of this index.
    pub fn select(&self, selector: &VersionSelector) -> LauncherResult<&VersionEntry> {
        let id = match selector {
            VersionSelector::LatestRelease => self.latest.release.as_str(),
            VersionSelector::LatestSnapshot => self.latest.snapshot.as_str(),
            VersionSelector::Exact(id) => id.as_str(),
        };
        self.find_version(id)
            .ok_or_else(|| LauncherError::MinecraftVersionNotFound(id.to_string()))
    }
}
