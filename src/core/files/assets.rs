use std::collections::BTreeMap;

use serde::Deserialize;

use super::record::{FileKind, FileRecord};

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    pub fn prefix(&self) -> &str {
        self.hash.get(..2).unwrap_or(&self.hash)
    }

    /// Root-relative directory of the stored object.
    pub fn object_dir(&self) -> String {
        format!("assets/objects/{}", self.prefix())
    }

    pub fn record(&self, resources_url: &str) -> FileRecord {
        FileRecord::new(self.hash.clone(), self.object_dir(), FileKind::Asset)
            .with_url(format!(
                "{}/{}/{}",
                resources_url.trim_end_matches('/'),
                self.prefix(),
                self.hash
            ))
            .with_sha1(Some(self.hash.clone()))
            .with_size(Some(self.size))
    }
}

impl AssetIndex {
    pub fn records(&self, resources_url: &str) -> Vec<FileRecord> {
        self.objects
            .values()
            .map(|object| object.record(resources_url))
            .collect()
    }
}
