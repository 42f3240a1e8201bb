use std::path::{Path, PathBuf};

/// Directory layout of one install root.
#[derive(Debug, Clone)]
pub struct GamePaths {
    root: PathBuf,
}

impl GamePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn libraries(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.root.join("versions").join(id)
    }

    pub fn version_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.jar", id))
    }

    pub fn version_json(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.json", id))
    }

    pub fn assets(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index(&self, id: &str) -> PathBuf {
        self.assets().join("indexes").join(format!("{}.json", id))
    }

    /// Legacy asset mirror used by pre-1.6 versions.
    pub fn resources(&self) -> PathBuf {
        self.root.join("resources")
    }

    pub fn natives(&self) -> PathBuf {
        self.root.join("bin").join("natives")
    }

    pub fn runtime(&self) -> PathBuf {
        self.root.join("runtime").join("jre")
    }
}

/// Path as a launch-argument string, always with `/` separators.
pub fn arg_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Root-relative form of a version file, as the pruner compares it.
pub fn version_json_relative(id: &str) -> String {
    format!("versions/{}/{}.json", id, id)
}

pub fn asset_index_relative(id: &str) -> String {
    format!("assets/indexes/{}.json", id)
}
