use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the whole install/launch pipeline.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch {what}: {reason}")]
    Fetch { what: String, reason: String },

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download of {file} failed after {attempts} attempts: {reason}")]
    Download {
        file: String,
        attempts: u32,
        reason: String,
    },

    #[error("Download batch cancelled: {0}")]
    Cancelled(String),

    // ── Integrity ───────────────────────────────────────
    #[error("Cannot hash {path:?}: {source}")]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Platform ────────────────────────────────────────
    #[error("Unknown operating system: {0}")]
    UnknownOs(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    // ── Manifests ───────────────────────────────────────
    #[error("Minecraft version {0} not found in version index")]
    MinecraftVersionNotFound(String),

    #[error("Invalid {what}: {reason}")]
    InvalidManifest { what: String, reason: String },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader {0} has no file for this platform")]
    MissingLoaderFile(String),

    #[error("Loader error: {0}")]
    Loader(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Java / processes ────────────────────────────────
    #[error("Java check failed for {path:?}: {reason}")]
    JavaCheck { path: PathBuf, reason: String },

    #[error("Failed to run {program}: {reason}")]
    Exec { program: String, reason: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Stable machine-readable code for callers that branch on failures.
    pub fn code(&self) -> &'static str {
        match self {
            LauncherError::Io { .. } => "IO_ERROR",
            LauncherError::Http(_) | LauncherError::Fetch { .. } => "FETCH_ERROR",
            LauncherError::DownloadFailed { .. } | LauncherError::Download { .. } => {
                "DOWNLOAD_ERROR"
            }
            LauncherError::Cancelled(_) => "CANCELLED",
            LauncherError::Hash { .. } | LauncherError::Sha1Mismatch { .. } => "HASH_ERROR",
            LauncherError::UnknownOs(_) => "UNKNOWN_OS",
            LauncherError::UnsupportedPlatform(_) => "UNSUPPORTED_PLATFORM",
            LauncherError::MinecraftVersionNotFound(_) => "MINECRAFT_VERSION_NOT_FOUND",
            LauncherError::InvalidManifest { .. }
            | LauncherError::InvalidMavenCoordinate(_)
            | LauncherError::Json(_) => "INVALID_MANIFEST",
            LauncherError::MissingLoaderFile(_) => "MISSING_LOADER_FILE",
            LauncherError::Loader(_) | LauncherError::Zip(_) => "LOADER_ERROR",
            LauncherError::JavaCheck { .. } => "JAVA_CHECK_ERROR",
            LauncherError::Exec { .. } => "EXEC_ERROR",
            LauncherError::Other(_) => "UNKNOWN_ERROR",
        }
    }

    pub(crate) fn fetch(what: impl Into<String>, reason: impl ToString) -> Self {
        LauncherError::Fetch {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(what: impl Into<String>, reason: impl ToString) -> Self {
        LauncherError::InvalidManifest {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for event consumers ───────────────────
// Errors cross the event boundary as `{code, message}`.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("LauncherError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
