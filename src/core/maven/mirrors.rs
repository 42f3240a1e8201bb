// ─── Mirror Resolver ───
// Finds a repository that actually serves an artifact when the manifest only
// gives a coordinate.

use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use tracing::{debug, warn};

use super::artifact::MavenArtifact;
use crate::core::error::{LauncherError, LauncherResult};

/// An artifact located on a mirror, with the size and checksum it advertised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    pub size: u64,
    pub sha1: String,
}

/// Probes an ordered list of repository bases for an artifact.
#[derive(Debug, Clone)]
pub struct MirrorResolver {
    client: Client,
    mirrors: Vec<String>,
}

impl MirrorResolver {
    pub fn new(client: Client, mirrors: Vec<String>) -> Self {
        Self { client, mirrors }
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    /// Resolve `artifact` against `explicit_base` if the library names one,
    /// otherwise against the configured mirrors, first match wins.
    ///
    /// A mirror is accepted only if it reports a content length for the
    /// artifact and serves a `.sha1` file next to it.
    pub async fn resolve(
        &self,
        artifact: &MavenArtifact,
        explicit_base: Option<&str>,
    ) -> LauncherResult<ResolvedArtifact> {
        let candidates: Vec<&str> = match explicit_base.map(str::trim).filter(|b| !b.is_empty()) {
            Some(base) => vec![base],
            None => self.mirrors.iter().map(String::as_str).collect(),
        };

        for base in candidates {
            let url = artifact.url(base);

            let Some(size) = self.probe_size(&url).await else {
                debug!("Mirror {} has no size for {}", base, artifact);
                continue;
            };

            let Some(sha1) = self.probe_sha1(&url).await else {
                debug!("Mirror {} has no checksum for {}", base, artifact);
                continue;
            };

            debug!("Resolved {} on {}", artifact, base);
            return Ok(ResolvedArtifact { url, size, sha1 });
        }

        warn!("No mirror serves {}", artifact);
        Err(LauncherError::fetch(
            format!("library {}", artifact),
            "no mirror serves this artifact",
        ))
    }

    async fn probe_size(&self, url: &str) -> Option<u64> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|size| *size > 0)
    }

    async fn probe_sha1(&self, url: &str) -> Option<String> {
        let response = self.client.get(format!("{}.sha1", url)).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;
        body.split_whitespace()
            .next()
            .filter(|s| s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit()))
            .map(str::to_ascii_lowercase)
    }
}
