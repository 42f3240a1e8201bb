use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::files::{FileKind, FileRecord};
use crate::core::http::fetch_json;
use crate::core::platform::Platform;

pub const JAVA_RUNTIME_INDEX_URL: &str = "https://launchermeta.mojang.com/v1/products/java-runtime/2ec0cc96c44e5a76b9c8b7c39df7210883d12871/all.json";

/// Root-relative directory the managed runtime is installed into.
pub const RUNTIME_DIR: &str = "runtime/jre";

// ─── Runtime index ───

/// `platform -> component -> [entry]`.
pub type RuntimeIndex = HashMap<String, HashMap<String, Vec<RuntimeIndexEntry>>>;

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeIndexEntry {
    pub manifest: RuntimeManifestRef,
    #[serde(default)]
    pub version: Option<RuntimeVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeManifestRef {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeVersion {
    pub name: String,
}

/// Pick the manifest reference for `component` on `platform`.
pub fn select_runtime<'a>(
    index: &'a RuntimeIndex,
    platform: &Platform,
    component: &str,
) -> LauncherResult<&'a RuntimeIndexEntry> {
    let key = platform.runtime_key()?;
    index
        .get(key)
        .and_then(|components| components.get(component))
        .and_then(|entries| entries.first())
        .ok_or_else(|| {
            LauncherError::UnsupportedPlatform(format!(
                "no {} runtime published for {}",
                component, key
            ))
        })
}

// ─── Runtime manifest ───

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeManifest {
    pub files: BTreeMap<String, RuntimeFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuntimeFile {
    Directory,
    File {
        downloads: RuntimeDownloads,
        #[serde(default)]
        executable: bool,
    },
    Link {
        target: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeDownloads {
    pub raw: RuntimeDownload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeDownload {
    pub url: String,
    pub sha1: String,
    pub size: u64,
}

impl RuntimeManifest {
    /// Resolve and fetch the runtime manifest for `component` on `platform`.
    /// Returns the manifest together with the raw index text.
    #[instrument(skip(client))]
    pub async fn fetch(
        client: &Client,
        index_url: &str,
        platform: &Platform,
        component: &str,
    ) -> LauncherResult<(RuntimeManifest, String)> {
        let (index, raw_index): (RuntimeIndex, String) =
            fetch_json(client, index_url, "java runtime index").await?;
        let entry = select_runtime(&index, platform, component)?;

        info!(
            "Using runtime {} ({})",
            component,
            entry
                .version
                .as_ref()
                .map(|v| v.name.as_str())
                .unwrap_or("unknown version")
        );

        let (manifest, _): (RuntimeManifest, String) =
            fetch_json(client, &entry.manifest.url, "java runtime manifest").await?;
        Ok((manifest, raw_index))
    }

    /// Flatten into records under `runtime/jre/`. Links are left to the
    /// archive they point into.
    pub fn records(&self) -> Vec<FileRecord> {
        let mut out = Vec::with_capacity(self.files.len());
        for (path, file) in &self.files {
            let relative = format!("{}/{}", RUNTIME_DIR, path.trim_matches('/'));
            match file {
                RuntimeFile::Directory => {
                    out.push(FileRecord::new("", &relative, FileKind::Folder));
                }
                RuntimeFile::File {
                    downloads,
                    executable,
                } => {
                    let mut record = FileRecord::from_relative(&relative, FileKind::Java)
                        .with_url(downloads.raw.url.clone())
                        .with_sha1(Some(downloads.raw.sha1.clone()))
                        .with_size(Some(downloads.raw.size));
                    record.executable = *executable;
                    out.push(record);
                }
                RuntimeFile::Link { target } => {
                    debug!("Skipping runtime link {} -> {}", path, target);
                }
            }
        }
        out
    }
}

// ─── Java check ───

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JavaInfo {
    pub version: String,
    pub major: u32,
    /// `64-bit` or `32-bit`.
    pub arch: String,
}

/// Run `<java> -version` and parse what it reports.
#[instrument]
pub async fn check_java(path: &Path) -> LauncherResult<JavaInfo> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .await
        .map_err(|e| LauncherError::JavaCheck {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    debug!("{:?} -version: {}", path, text.lines().next().unwrap_or(""));

    parse_java_output(&text).ok_or_else(|| LauncherError::JavaCheck {
        path: PathBuf::from(path),
        reason: "no version string in `java -version` output".into(),
    })
}

pub fn parse_java_output(output: &str) -> Option<JavaInfo> {
    let version = parse_version_string(output)?;
    let arch = if output.contains("64-Bit") {
        "64-bit"
    } else {
        "32-bit"
    };
    Some(JavaInfo {
        major: parse_major_version(&version),
        version,
        arch: arch.into(),
    })
}

fn parse_version_string(output: &str) -> Option<String> {
    for line in output.lines() {
        if let Some(start) = line.find('"') {
            if let Some(end) = line[start + 1..].find('"') {
                return Some(line[start + 1..start + 1 + end].to_string());
            }
        }
    }
    None
}

fn parse_major_version(version: &str) -> u32 {
    let first_part = version.split('.').next().unwrap_or("0");
    let major: u32 = first_part.parse().unwrap_or(0);

    if major == 1 {
        version
            .split('.')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(major)
    } else {
        major
    }
}
