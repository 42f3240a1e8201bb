// ─── Pruner ───
// Deletes files under the install root that the current file set does not
// name. Identity is path+name only; content is the sync engine's concern.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::files::FileRecord;

pub struct Cleaner {
    root: PathBuf,
    events: EventSender,
}

impl Cleaner {
    pub fn new(root: impl Into<PathBuf>, events: EventSender) -> Self {
        Self {
            root: root.into(),
            events,
        }
    }

    /// Remove every leaf file that is neither kept nor under an ignored
    /// prefix. Returns how many files were deleted.
    pub async fn clean(
        &self,
        keep: &[FileRecord],
        ignored: &[String],
        skip: bool,
    ) -> LauncherResult<usize> {
        if skip {
            debug!("Cleaning disabled");
            return Ok(0);
        }

        let keep: HashSet<String> = keep.iter().map(FileRecord::identity).collect();
        let ignored: Vec<String> = ignored.iter().map(|p| p.replace('\\', "/")).collect();
        let root = self.root.clone();
        let events = self.events.clone();

        let deleted = tokio::task::spawn_blocking(move || prune(&root, &keep, &ignored, &events))
            .await
            .map_err(|e| LauncherError::Other(format!("clean task failed: {}", e)))??;

        info!("Cleaned {} files", deleted);
        self.events.emit(LaunchEvent::CleanEnd { amount: deleted });
        Ok(deleted)
    }
}

fn prune(
    root: &Path,
    keep: &HashSet<String>,
    ignored: &[String],
    events: &EventSender,
) -> LauncherResult<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut deleted = 0;
    let mut walker = WalkDir::new(root).follow_links(false).into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read entry while cleaning: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let mut relative = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            relative.push('/');
            if is_ignored(&relative, ignored) {
                walker.skip_current_dir();
            }
            continue;
        }

        if is_ignored(&relative, ignored) || keep.contains(&relative) {
            continue;
        }

        std::fs::remove_file(entry.path()).map_err(|e| LauncherError::io(entry.path(), e))?;
        debug!("Removed {}", relative);
        events.emit(LaunchEvent::CleanProgress { filename: relative });
        deleted += 1;
    }

    Ok(deleted)
}

fn is_ignored(relative: &str, ignored: &[String]) -> bool {
    ignored
        .iter()
        .any(|prefix| !prefix.is_empty() && relative.starts_with(prefix.as_str()))
}
