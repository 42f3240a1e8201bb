use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;
use zip::{ZipArchive, ZipWriter};

use super::context::InstallContext;
use super::installer::{LoaderInstaller, LoaderSetup};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::files::{FileKind, FileRecord};
use crate::core::paths::version_json_relative;

/// Merges the loader package into a copy of the client archive and runs the
/// game from that copy under a derived version id.
pub struct OverlayInstaller;

#[async_trait]
impl LoaderInstaller for OverlayInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderSetup> {
        let package = ctx.descriptor.package()?;
        let root = ctx.paths.root();
        let derived_id = ctx.descriptor.version_id();
        info!("Merging {} into {}", package.name, derived_id);

        let client_jar = ctx.paths.version_jar(&ctx.version.id);
        let overlay = package.destination(root);
        let output = ctx.paths.version_jar(&derived_id);
        let events = ctx.events.clone();

        let merged = {
            let output = output.clone();
            tokio::task::spawn_blocking(move || merge_overlay(&client_jar, &overlay, &output, &events))
                .await
                .map_err(|e| LauncherError::Other(format!("overlay merge task failed: {}", e)))??
        };
        ctx.events.emit(LaunchEvent::ExtractEnd { amount: merged });

        let derived = ctx.version.derive_overlay(&derived_id);
        let json = serde_json::to_string_pretty(&derived)?;
        let json_path = ctx.paths.version_json(&derived_id);
        tokio::fs::write(&json_path, json)
            .await
            .map_err(|e| LauncherError::io(&json_path, e))?;

        let jar_record = FileRecord::new(
            format!("{}.jar", derived_id),
            format!("versions/{}", derived_id),
            FileKind::Library,
        );

        Ok(LoaderSetup {
            manifest: Some(derived),
            libraries: Vec::new(),
            files: vec![
                jar_record.clone(),
                FileRecord::from_relative(&version_json_relative(&derived_id), FileKind::Config),
            ],
            client_jar: Some(jar_record),
            profile: None,
        })
    }
}

/// Write `output` as the overlay's files plus every client entry the overlay
/// does not replace, minus the client's `META-INF/`. Returns the entry count.
pub fn merge_overlay(
    client_jar: &Path,
    overlay: &Path,
    output: &Path,
    events: &EventSender,
) -> LauncherResult<usize> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
    }
    let part = output.with_extension(format!("{}.part", Uuid::new_v4()));

    let result = write_merged(client_jar, overlay, &part, events);
    match result {
        Ok(count) => {
            std::fs::rename(&part, output).map_err(|e| LauncherError::io(output, e))?;
            Ok(count)
        }
        Err(err) => {
            let _ = std::fs::remove_file(&part);
            Err(err)
        }
    }
}

fn write_merged(
    client_jar: &Path,
    overlay: &Path,
    part: &Path,
    events: &EventSender,
) -> LauncherResult<usize> {
    let out = File::create(part).map_err(|e| LauncherError::io(part, e))?;
    let mut writer = ZipWriter::new(out);
    let mut written: HashSet<String> = HashSet::new();

    let mut overlay_zip = open_zip(overlay)?;
    for i in 0..overlay_zip.len() {
        let entry = overlay_zip.by_index_raw(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if !written.insert(name.clone()) {
            continue;
        }
        writer.raw_copy_file(entry)?;
        events.emit(LaunchEvent::ExtractProgress { filename: name });
    }

    let mut client_zip = open_zip(client_jar)?;
    for i in 0..client_zip.len() {
        let entry = client_zip.by_index_raw(i)?;
        let name = entry.name().to_string();
        if name.starts_with("META-INF/") || written.contains(&name) {
            continue;
        }
        writer.raw_copy_file(entry)?;
        written.insert(name);
    }

    writer.finish()?;
    Ok(written.len())
}

fn open_zip(path: &Path) -> LauncherResult<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| LauncherError::io(path, e))?;
    Ok(ZipArchive::new(file)?)
}
