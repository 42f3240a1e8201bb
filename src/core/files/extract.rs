use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::assets::AssetIndex;
use super::record::{FileKind, FileRecord};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::paths::GamePaths;

/// Unpack every native archive into `bin/natives`. Returns the produced
/// files as URL-less records so the pruner keeps them.
pub async fn extract_natives(
    paths: &GamePaths,
    natives: Vec<FileRecord>,
    events: EventSender,
) -> LauncherResult<Vec<FileRecord>> {
    let root = paths.root().to_path_buf();
    let target = paths.natives();

    let produced = tokio::task::spawn_blocking(move || {
        extract_natives_blocking(&root, &target, &natives, &events)
    })
    .await
    .map_err(|e| LauncherError::Other(format!("native extraction task failed: {}", e)))??;

    Ok(produced)
}

fn extract_natives_blocking(
    root: &Path,
    target: &Path,
    natives: &[FileRecord],
    events: &EventSender,
) -> LauncherResult<Vec<FileRecord>> {
    fs::create_dir_all(target).map_err(|e| LauncherError::io(target, e))?;
    let target_relative = relative_dir(root, target);

    let mut produced = Vec::new();
    for native in natives.iter().filter(|r| r.kind == FileKind::Native) {
        let archive_path = native.destination(root);
        let file = fs::File::open(&archive_path).map_err(|e| LauncherError::io(&archive_path, e))?;
        let mut archive = zip::ZipArchive::new(file)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() || entry.name().starts_with("META-INF") {
                continue;
            }
            // Reject entries that would escape the natives directory.
            let Some(inner) = entry.enclosed_name() else {
                continue;
            };

            let dest = target.join(&inner);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
            }
            let mut out = fs::File::create(&dest).map_err(|e| LauncherError::io(&dest, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&dest, e))?;

            let inner = inner.to_string_lossy().replace('\\', "/");
            events.emit(LaunchEvent::ExtractProgress {
                filename: inner.clone(),
            });
            produced.push(FileRecord::from_relative(
                &format!("{}{}", target_relative, inner),
                FileKind::Native,
            ));
        }
        debug!("Extracted natives from {}", native.name);
    }

    info!("Extracted {} native files", produced.len());
    events.emit(LaunchEvent::ExtractEnd {
        amount: produced.len(),
    });
    Ok(produced)
}

/// Mirror indexed assets into `resources/<logical path>` for versions that
/// still read them from there. Existing files are left alone.
pub async fn copy_legacy_assets(
    paths: &GamePaths,
    index: &AssetIndex,
    events: EventSender,
) -> LauncherResult<Vec<FileRecord>> {
    let mut produced = Vec::new();
    let resources = paths.resources();
    let objects = paths.assets().join("objects");

    for (logical, object) in &index.objects {
        let source = objects.join(object.prefix()).join(&object.hash);
        let dest = resources.join(logical);

        if !dest.exists() {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| LauncherError::io(parent, e))?;
            }
            tokio::fs::copy(&source, &dest)
                .await
                .map_err(|e| LauncherError::io(&source, e))?;
            events.emit(LaunchEvent::CopyProgress {
                filename: logical.clone(),
                dest: dest.to_string_lossy().to_string(),
            });
        }

        produced.push(FileRecord::from_relative(
            &format!("resources/{}", logical),
            FileKind::Asset,
        ));
    }

    info!("Legacy assets ready: {}", produced.len());
    events.emit(LaunchEvent::CopyEnd {
        amount: produced.len(),
    });
    Ok(produced)
}

fn relative_dir(root: &Path, dir: &Path) -> String {
    let rel: PathBuf = dir.strip_prefix(root).unwrap_or(dir).to_path_buf();
    super::record::normalize_dir(&rel.to_string_lossy())
}
