use std::path::Path;

use sha1::{Digest, Sha1};

use crate::core::error::{LauncherError, LauncherResult};

/// SHA-1 of a file on disk, streamed so large archives are not buffered.
pub fn sha1_file(path: &Path) -> LauncherResult<String> {
    let mut file = std::fs::File::open(path).map_err(|source| LauncherError::Hash {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha1::new();
    std::io::copy(&mut file, &mut hasher).map_err(|source| LauncherError::Hash {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(hex::encode(hasher.finalize()))
}

/// [`sha1_file`] on the blocking pool.
pub async fn sha1_file_async(path: &Path) -> LauncherResult<String> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || sha1_file(&owned))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
}

pub fn sha1_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compare a computed hash against an expected one, ignoring case.
pub fn hash_matches(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_known_content() {
        assert_eq!(
            sha1_bytes(b"hello"),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
    }

    #[test]
    fn file_hash_matches_bytes_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"hello").unwrap();

        let actual = sha1_file(&path).unwrap();
        assert!(hash_matches(&actual, "AAF4C61DDCC5E8A2DABEDE0F3B482CD9AEA9434D"));
    }

    #[test]
    fn missing_file_is_hash_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha1_file(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.code(), "HASH_ERROR");
    }
}
