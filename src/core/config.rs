// ─── Launcher Config ───
// Everything the pipeline needs to know about one server install. Every
// field has a default so a config file only has to name `server_id`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::runtime::JAVA_RUNTIME_INDEX_URL;
use crate::core::maven::default_mirrors;
use crate::core::version::manifest::VERSION_MANIFEST_URL;

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Base URL of the modpack/loader server. `None` means vanilla, no modpack.
    pub url: Option<String>,
    pub server_id: String,
    /// Install root override. Defaults to the per-server folder.
    pub root: Option<PathBuf>,
    /// Root-relative prefixes the pruner never touches.
    pub ignored: Vec<String>,
    pub minecraft: MinecraftConfig,
    pub java: JavaConfig,
    pub window: WindowConfig,
    pub memory: MemoryConfig,
    pub cleaning: CleaningConfig,
    pub patcher: PatcherConfig,
    pub download: DownloadConfig,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MinecraftConfig {
    /// Explicit id, `latest_release` or `latest_snapshot`.
    pub version: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JavaInstall {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaConfig {
    pub install: JavaInstall,
    pub absolute_path: Option<PathBuf>,
    /// Relative to the install root.
    pub relative_path: Option<PathBuf>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 854,
            height: 480,
            fullscreen: false,
        }
    }
}

/// Heap bounds in MiB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub min: u32,
    pub max: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min: 1024,
            max: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub clean: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self { clean: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Fail the launch on the first processor failure instead of logging it.
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub concurrency: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub speed_window_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_attempts: 5,
            retry_delay_ms: 1000,
            speed_window_ms: 6000,
        }
    }
}

impl DownloadConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn speed_window(&self) -> Duration {
        Duration::from_millis(self.speed_window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest: String,
    pub java_runtime_index: String,
    pub resources: String,
    pub mirrors: Vec<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: VERSION_MANIFEST_URL.to_string(),
            java_runtime_index: JAVA_RUNTIME_INDEX_URL.to_string(),
            resources: RESOURCES_URL.to_string(),
            mirrors: default_mirrors(),
        }
    }
}

pub fn default_ignored() -> Vec<String> {
    [
        "runtime/",
        "crash-reports/",
        "logs/",
        "resourcepacks/",
        "resources/",
        "saves/",
        "shaderpacks/",
        "options.txt",
        "optionsof.txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            url: None,
            server_id: String::new(),
            root: None,
            ignored: default_ignored(),
            minecraft: MinecraftConfig::default(),
            java: JavaConfig::default(),
            window: WindowConfig::default(),
            memory: MemoryConfig::default(),
            cleaning: CleaningConfig::default(),
            patcher: PatcherConfig::default(),
            download: DownloadConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl LauncherConfig {
    pub fn new(server_id: &str) -> Self {
        Self {
            server_id: server_id.to_string(),
            ..Self::default()
        }
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: &Path) -> LauncherResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LauncherError::io(path, e))?;
        let config: LauncherConfig =
            serde_json::from_str(&raw).map_err(|e| LauncherError::invalid("launcher config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LauncherResult<()> {
        if self.server_id.trim().is_empty() {
            return Err(LauncherError::invalid("launcher config", "server_id is empty"));
        }
        if self.memory.min > self.memory.max {
            return Err(LauncherError::invalid(
                "launcher config",
                format!(
                    "memory.min ({}) is above memory.max ({})",
                    self.memory.min, self.memory.max
                ),
            ));
        }
        if self.download.concurrency == 0 || self.download.max_attempts == 0 {
            return Err(LauncherError::invalid(
                "launcher config",
                "download concurrency and attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Install root: the explicit override, or the per-server folder.
    pub fn root_dir(&self) -> LauncherResult<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        server_folder(&self.server_id)
    }

    /// Java executable used for the check, the patcher and the game.
    pub fn java_executable(&self, root: &Path, exe_name: &str) -> PathBuf {
        if let Some(path) = &self.java.absolute_path {
            return path.clone();
        }
        if let Some(relative) = &self.java.relative_path {
            return root.join(relative);
        }
        root.join("runtime").join("jre").join("bin").join(exe_name)
    }

    pub fn launcher_name(&self) -> String {
        format!("{}-launcher", sanitize_server_id(&self.server_id))
    }

    /// Modpack endpoint, when a server URL is configured.
    pub fn modpack_url(&self) -> Option<String> {
        self.base_url().map(|base| format!("{}/api/files-updater", base))
    }

    /// Loader descriptor endpoint, when a server URL is configured.
    pub fn loader_url(&self) -> Option<String> {
        self.base_url().map(|base| format!("{}/api/loader", base))
    }

    fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

pub fn sanitize_server_id(server_id: &str) -> String {
    server_id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `.<id>` under the platform's data dir (home on Linux); macOS drops the dot.
pub fn server_folder(server_id: &str) -> LauncherResult<PathBuf> {
    let id = sanitize_server_id(server_id);
    let base = if cfg!(target_os = "linux") {
        dirs::home_dir()
    } else {
        dirs::data_dir()
    };
    let base = base.ok_or_else(|| {
        LauncherError::Other("Cannot determine the user data directory".into())
    })?;

    let folder = if cfg!(target_os = "macos") {
        id
    } else {
        format!(".{}", id)
    };
    Ok(base.join(folder))
}
