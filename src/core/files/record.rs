use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Asset,
    Library,
    Native,
    Folder,
    Config,
    Java,
    #[serde(other)]
    Other,
}

/// One file the install directory must contain.
///
/// `path` is the directory relative to the install root, `/`-separated,
/// with a trailing slash (or empty for the root itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub executable: bool,
}

fn default_kind() -> FileKind {
    FileKind::Other
}

impl FileRecord {
    pub fn new(name: impl Into<String>, path: impl AsRef<str>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            path: normalize_dir(path.as_ref()),
            url: String::new(),
            size: None,
            sha1: None,
            kind,
            executable: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.sha1 = sha1.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    /// Build a record from a root-relative file path such as
    /// `libraries/org/ow2/asm/asm/9.3/asm-9.3.jar`.
    pub fn from_relative(relative: &str, kind: FileKind) -> Self {
        let relative = relative.replace('\\', "/");
        let (dir, name) = match relative.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", relative.as_str()),
        };
        Self::new(name, dir, kind)
    }

    /// `(path, name)` identity used for dedup and pruning.
    pub fn identity(&self) -> String {
        format!("{}{}", normalize_dir(&self.path), self.name)
    }

    pub fn relative_path(&self) -> PathBuf {
        let mut out = PathBuf::new();
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            out.push(segment);
        }
        if !self.name.is_empty() {
            out.push(&self.name);
        }
        out
    }

    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }

    /// Whether the record can be fetched at all. Records without a URL are
    /// produced locally (extraction, processors, loader overlays).
    pub fn is_downloadable(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Normalize a relative directory to `a/b/` form.
pub fn normalize_dir(raw: &str) -> String {
    let joined = raw
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        joined
    } else {
        format!("{}/", joined)
    }
}

/// Where an installation record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileOrigin {
    GameDefault,
    Loader,
    /// Needed to install the loader but never put on the runtime classpath.
    InstallerOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFileRecord {
    #[serde(flatten)]
    pub file: FileRecord,
    pub origin: FileOrigin,
}

impl ExtraFileRecord {
    pub fn new(file: FileRecord, origin: FileOrigin) -> Self {
        Self { file, origin }
    }
}

/// A produced file list split into what exists after the step (`files`,
/// used for pruning) and what must be fetched (`payload`).
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    pub files: Vec<FileRecord>,
    pub payload: Vec<FileRecord>,
}

impl FileSet {
    /// Every record is both kept and downloaded.
    pub fn from_payload(payload: Vec<FileRecord>) -> Self {
        Self {
            files: payload.clone(),
            payload,
        }
    }

    /// Record a file that is produced locally and only needs to be kept.
    pub fn keep(&mut self, record: FileRecord) {
        self.files.push(record);
    }

    pub fn extend(&mut self, other: FileSet) {
        self.files.extend(other.files);
        self.payload.extend(other.payload);
    }
}

/// Collapse records sharing an identity. Duplicates with the same hash are
/// one file; duplicates that disagree on the hash make the batch invalid.
pub fn dedup_records(records: Vec<FileRecord>) -> LauncherResult<Vec<FileRecord>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<FileRecord> = Vec::with_capacity(records.len());

    for record in records {
        let identity = record.identity();
        match seen.get(&identity) {
            None => {
                seen.insert(identity, out.len());
                out.push(record);
            }
            Some(&idx) => {
                let existing = &out[idx];
                let same = match (&existing.sha1, &record.sha1) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    _ => existing.url == record.url,
                };
                if !same {
                    return Err(LauncherError::invalid(
                        "file list",
                        format!("conflicting entries for {}", identity),
                    ));
                }
            }
        }
    }

    Ok(out)
}
