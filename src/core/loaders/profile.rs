// ─── Installer Packages ───
// Reads the install profile embedded in an installer package, extracts the
// universal artifact (and the client patch data when processors exist) and
// resolves the loader's libraries.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use super::context::InstallContext;
use super::installer::{LoaderInstaller, LoaderSetup};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::files::{artifact_record, ExtraFileRecord, FileKind, FileOrigin, FileRecord};
use crate::core::maven::MavenArtifact;
use crate::core::version::{LibraryEntry, VersionJson};

const PROFILE_ENTRY: &str = "install_profile.json";
const CLIENT_DATA_ENTRY: &str = "data/client.lzma";
const DEFAULT_LOADER_KEY: &str = "net.minecraftforge:forge";
pub const BINPATCH: &str = "BINPATCH";

/// Subset of an `install_profile.json`. Legacy profiles keep these fields in
/// their `install` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallProfile {
    /// Coordinate of the loader's universal artifact.
    #[serde(default)]
    pub path: Option<String>,
    /// Exact in-archive path of the universal artifact (legacy).
    #[serde(default)]
    pub file_path: Option<String>,
    /// In-archive name of the loader's version descriptor (modern).
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, DataEntry>,
    #[serde(default)]
    pub processors: Vec<ProcessorSpec>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataEntry {
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorSpec {
    pub jar: String,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub sides: Option<Vec<String>>,
}

impl ProcessorSpec {
    pub fn runs_on_client(&self) -> bool {
        match &self.sides {
            Some(sides) => sides.iter().any(|s| s == "client"),
            None => true,
        }
    }
}

/// Where the loader's own version descriptor lives.
#[derive(Debug, Clone)]
pub enum ProfileShape {
    /// Nested in the profile as `versionInfo`.
    Legacy { version_info: Box<VersionJson> },
    /// A sibling entry of the archive.
    Modern { version_entry: String },
}

impl InstallProfile {
    /// Parse a profile and decide its shape: an `install` block means the
    /// legacy layout, anything else must name its version entry.
    pub fn parse(raw: &str) -> LauncherResult<(InstallProfile, ProfileShape)> {
        let mut value: Value =
            serde_json::from_str(raw).map_err(|e| LauncherError::invalid("install profile", e))?;

        if let Some(install) = value.get_mut("install").map(Value::take) {
            let version_info = value
                .get_mut("versionInfo")
                .map(Value::take)
                .ok_or_else(|| {
                    LauncherError::invalid("install profile", "legacy profile has no versionInfo")
                })?;
            let profile: InstallProfile = serde_json::from_value(install)
                .map_err(|e| LauncherError::invalid("install profile", e))?;
            let version_info: VersionJson = serde_json::from_value(version_info)
                .map_err(|e| LauncherError::invalid("loader version manifest", e))?;
            return Ok((
                profile,
                ProfileShape::Legacy {
                    version_info: Box::new(version_info),
                },
            ));
        }

        let profile: InstallProfile = serde_json::from_value(value)
            .map_err(|e| LauncherError::invalid("install profile", e))?;
        let version_entry = profile
            .json
            .as_deref()
            .map(|entry| entry.trim_start_matches('/').to_string())
            .filter(|entry| !entry.is_empty())
            .ok_or_else(|| {
                LauncherError::invalid("install profile", "profile names no version descriptor")
            })?;
        Ok((profile, ProfileShape::Modern { version_entry }))
    }

    pub fn client_processors(&self) -> impl Iterator<Item = &ProcessorSpec> {
        self.processors.iter().filter(|p| p.runs_on_client())
    }

    /// `group:artifact` of the loader itself.
    pub fn loader_key(&self) -> String {
        self.path
            .as_deref()
            .and_then(|p| MavenArtifact::parse(p).ok())
            .map(|a| a.key())
            .unwrap_or_else(|| DEFAULT_LOADER_KEY.to_string())
    }

    /// Root-relative path the client patch data is extracted to, next to
    /// the loader artifact.
    pub fn client_data_relative(&self) -> Option<String> {
        let prefix = format!("{}:", DEFAULT_LOADER_KEY);
        let coordinate = self.path.clone().or_else(|| {
            self.libraries
                .iter()
                .find(|l| l.name.starts_with(&prefix))
                .map(|l| l.name.clone())
        })?;
        let artifact = MavenArtifact::parse(&coordinate).ok()?;
        let name = artifact.filename().replace(".jar", "-clientdata.lzma");
        Some(format!("libraries/{}/{}", artifact.layout_dir(), name))
    }
}

/// Installs loaders shipped as an installer package with an install profile.
pub struct ProfileInstaller;

struct PackageContents {
    profile: InstallProfile,
    manifest: VersionJson,
    extracted: Vec<FileRecord>,
    client_data: Option<FileRecord>,
}

#[async_trait]
impl LoaderInstaller for ProfileInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderSetup> {
        let package = ctx.descriptor.package()?.clone();
        let archive = package.destination(ctx.paths.root());
        info!("Reading install profile from {}", package.name);

        let contents = {
            let root = ctx.paths.root().to_path_buf();
            let events = ctx.events.clone();
            tokio::task::spawn_blocking(move || read_package(&archive, &root, &events))
                .await
                .map_err(|e| LauncherError::Other(format!("package read task failed: {}", e)))??
        };
        let extracted_count =
            contents.extracted.len() + usize::from(contents.client_data.is_some());
        ctx.events.emit(LaunchEvent::ExtractEnd {
            amount: extracted_count,
        });

        let manifest_record = FileRecord::new(
            format!("{}.json", ctx.descriptor.version_id()),
            &package.path,
            FileKind::Config,
        );
        let manifest_json = serde_json::to_string_pretty(&contents.manifest)?;
        let manifest_path = manifest_record.destination(ctx.paths.root());
        tokio::fs::write(&manifest_path, manifest_json)
            .await
            .map_err(|e| LauncherError::io(&manifest_path, e))?;

        let mut libraries: Vec<ExtraFileRecord> = contents
            .extracted
            .into_iter()
            .map(|r| ExtraFileRecord::new(r, FileOrigin::InstallerOnly))
            .collect();

        let loader_key = contents.profile.loader_key();
        let mut seen: HashSet<String> = HashSet::new();
        let sources = [
            (&contents.manifest.libraries, FileOrigin::Loader),
            (&contents.profile.libraries, FileOrigin::InstallerOnly),
        ];
        for (entries, origin) in sources {
            for library in entries.iter() {
                if !seen.insert(library.name.clone()) {
                    continue;
                }
                if let Some(record) = library_record(&ctx, library, &loader_key).await? {
                    libraries.push(ExtraFileRecord::new(record, origin));
                }
            }
        }

        let mut files = vec![manifest_record];
        files.extend(contents.client_data);

        info!(
            "Loader {} resolved {} libraries",
            ctx.descriptor.label(),
            libraries.len()
        );

        let profile = if contents.profile.processors.is_empty() {
            None
        } else {
            Some(contents.profile)
        };

        Ok(LoaderSetup {
            manifest: Some(contents.manifest),
            libraries,
            files,
            client_jar: None,
            profile,
        })
    }
}

/// Record for one loader library, or `None` when it does not apply here.
async fn library_record(
    ctx: &InstallContext<'_>,
    library: &LibraryEntry,
    loader_key: &str,
) -> LauncherResult<Option<FileRecord>> {
    if !library.is_allowed(ctx.platform) {
        debug!("Skipping {} (rules)", library.name);
        return Ok(None);
    }

    let mut coordinate = library.coordinate()?;
    let (artifact, kind) = match library.native_classifier(ctx.platform) {
        Some(classifier) => {
            let artifact = library.classifier(&classifier);
            coordinate.classifier = Some(classifier);
            (artifact, FileKind::Native)
        }
        None if library.is_native() => return Ok(None),
        None if !library.is_required() => {
            debug!("Skipping {} (bundled)", library.name);
            return Ok(None);
        }
        None => (library.artifact(), FileKind::Library),
    };

    // The loader's own artifacts come out of the package or the processors.
    if coordinate.key() == loader_key && !library.has_direct_url() {
        let record = match artifact {
            Some(artifact) => artifact_record(&coordinate, artifact, kind),
            None => local_record(&coordinate, kind),
        };
        return Ok(Some(record.with_url(String::new()).with_sha1(None)));
    }

    if let Some(artifact) = artifact {
        return Ok(Some(artifact_record(&coordinate, artifact, kind)));
    }

    let resolved = ctx
        .mirrors
        .resolve(&coordinate, library.url.as_deref())
        .await?;
    Ok(Some(
        local_record(&coordinate, kind)
            .with_url(resolved.url)
            .with_sha1(Some(resolved.sha1))
            .with_size(Some(resolved.size)),
    ))
}

fn local_record(coordinate: &MavenArtifact, kind: FileKind) -> FileRecord {
    FileRecord::new(
        coordinate.filename(),
        format!("libraries/{}", coordinate.layout_dir()),
        kind,
    )
}

fn read_package(archive: &Path, root: &Path, events: &EventSender) -> LauncherResult<PackageContents> {
    let file = File::open(archive).map_err(|e| LauncherError::io(archive, e))?;
    let mut zip = ZipArchive::new(file)?;

    let raw_profile = read_entry(&mut zip, PROFILE_ENTRY)?;
    let (profile, shape) = InstallProfile::parse(&raw_profile)?;

    let manifest = match shape {
        ProfileShape::Legacy { version_info } => *version_info,
        ProfileShape::Modern { version_entry } => {
            VersionJson::parse(&read_entry(&mut zip, &version_entry)?)?
        }
    };

    let extracted = extract_universal(&mut zip, &profile, root, events)?;

    let client_data = if profile.processors.is_empty() {
        None
    } else {
        let relative = profile.client_data_relative().ok_or_else(|| {
            LauncherError::invalid("install profile", "cannot place client patch data")
        })?;
        let record = FileRecord::from_relative(&relative, FileKind::Library);
        extract_entry(&mut zip, CLIENT_DATA_ENTRY, &record.destination(root))?;
        events.emit(LaunchEvent::ExtractProgress {
            filename: record.name.clone(),
        });
        Some(record)
    };

    Ok(PackageContents {
        profile,
        manifest,
        extracted,
        client_data,
    })
}

/// Pull the universal artifact out of the package: from its exact entry when
/// the profile names one, otherwise every jar under its coordinate's layout.
fn extract_universal(
    zip: &mut ZipArchive<File>,
    profile: &InstallProfile,
    root: &Path,
    events: &EventSender,
) -> LauncherResult<Vec<FileRecord>> {
    let Some(path) = profile.path.as_deref() else {
        warn!("Install profile names no universal artifact");
        return Ok(Vec::new());
    };
    let coordinate = MavenArtifact::parse(path)?;
    let mut records = Vec::new();

    if let Some(entry) = profile.file_path.as_deref() {
        let record = local_record(&coordinate, FileKind::Library);
        extract_entry(zip, entry.trim_start_matches('/'), &record.destination(root))?;
        events.emit(LaunchEvent::ExtractProgress {
            filename: record.name.clone(),
        });
        records.push(record);
        return Ok(records);
    }

    let prefix = format!("maven/{}/", coordinate.layout_dir());
    let entries: Vec<String> = zip
        .file_names()
        .filter(|name| name.starts_with(&prefix) && name.ends_with(".jar"))
        .map(str::to_string)
        .collect();

    for entry in entries {
        let Some(name) = entry.rsplit('/').next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let record = FileRecord::new(
            name,
            format!("libraries/{}", coordinate.layout_dir()),
            FileKind::Library,
        );
        extract_entry(zip, &entry, &record.destination(root))?;
        events.emit(LaunchEvent::ExtractProgress {
            filename: record.name.clone(),
        });
        records.push(record);
    }

    if records.is_empty() {
        warn!("No universal artifact found under {}", prefix);
    }
    Ok(records)
}

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> LauncherResult<String> {
    let mut entry = zip
        .by_name(name)
        .map_err(|e| LauncherError::Loader(format!("Missing {} in package: {}", name, e)))?;
    let mut out = String::new();
    entry
        .read_to_string(&mut out)
        .map_err(|e| LauncherError::Loader(format!("Unreadable {} in package: {}", name, e)))?;
    Ok(out)
}

fn extract_entry(zip: &mut ZipArchive<File>, name: &str, dest: &Path) -> LauncherResult<()> {
    let mut entry = zip
        .by_name(name)
        .map_err(|e| LauncherError::Loader(format!("Missing {} in package: {}", name, e)))?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
    }
    let mut out = File::create(dest).map_err(|e| LauncherError::io(dest, e))?;
    std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::core::hash::sha1_bytes;
    use crate::core::http::build_http_client;
    use crate::core::loaders::{LoaderDescriptor, PackageType};
    use crate::core::maven::MirrorResolver;
    use crate::core::paths::GamePaths;
    use crate::core::platform::{ArchKind, HostEnvironment, OsKind, StaticHost};
    use crate::core::test_support::{Route, TestServer};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const FORGE: &str = "net.minecraftforge:forge:1.20.1-47.2.0";
    const FORGE_DIR: &str = "libraries/net/minecraftforge/forge/1.20.1-47.2.0";

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn shape_is_decided_by_install_block() {
        let legacy = serde_json::json!({
            "install": {"path": "net.minecraftforge:forge:1.7.10-10.13.4.1614-1.7.10", "filePath": "forge-universal.jar"},
            "versionInfo": {"id": "1.7.10-Forge", "mainClass": "net.minecraft.launchwrapper.Launch"}
        });
        let (profile, shape) = InstallProfile::parse(&legacy.to_string()).unwrap();
        assert_eq!(profile.file_path.as_deref(), Some("forge-universal.jar"));
        assert!(matches!(shape, ProfileShape::Legacy { version_info } if version_info.id == "1.7.10-Forge"));

        let modern = serde_json::json!({"path": FORGE, "json": "/version.json"});
        let (_, shape) = InstallProfile::parse(&modern.to_string()).unwrap();
        assert!(matches!(shape, ProfileShape::Modern { version_entry } if version_entry == "version.json"));
    }

    #[test]
    fn incomplete_profiles_are_rejected() {
        let no_info = serde_json::json!({"install": {"path": FORGE}});
        let err = InstallProfile::parse(&no_info.to_string()).unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");

        let no_entry = serde_json::json!({"path": FORGE});
        let err = InstallProfile::parse(&no_entry.to_string()).unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }

    #[test]
    fn loader_key_and_client_data_location() {
        let profile = InstallProfile {
            path: Some(FORGE.into()),
            ..Default::default()
        };
        assert_eq!(profile.loader_key(), "net.minecraftforge:forge");
        assert_eq!(
            profile.client_data_relative().unwrap(),
            format!("{}/forge-1.20.1-47.2.0-clientdata.lzma", FORGE_DIR)
        );

        assert_eq!(InstallProfile::default().loader_key(), DEFAULT_LOADER_KEY);
        assert!(InstallProfile::default().client_data_relative().is_none());
    }

    #[test]
    fn processor_sides() {
        let spec = |sides: Option<Vec<&str>>| ProcessorSpec {
            jar: "a:b:1".into(),
            classpath: vec![],
            args: vec![],
            sides: sides.map(|s| s.into_iter().map(String::from).collect()),
        };
        assert!(spec(None).runs_on_client());
        assert!(spec(Some(vec!["client", "server"])).runs_on_client());
        assert!(!spec(Some(vec!["server"])).runs_on_client());
    }

    #[tokio::test]
    async fn installs_modern_package() {
        let jar = b"mirrored jar".to_vec();
        let server = TestServer::start(vec![
            Route::ok("/maven/org/example/mirrored/1.0/mirrored-1.0.jar", jar.clone()),
            Route::ok(
                "/maven/org/example/mirrored/1.0/mirrored-1.0.jar.sha1",
                sha1_bytes(&jar).into_bytes(),
            ),
        ])
        .await;

        let dir = tempfile::tempdir().unwrap();
        let paths = GamePaths::new(dir.path());
        let platform = StaticHost::new(OsKind::Linux, ArchKind::X64)
            .platform()
            .unwrap();

        let profile = serde_json::json!({
            "path": FORGE,
            "json": "/version.json",
            "data": {"BINPATCH": {"client": "/data/client.lzma", "server": "/data/server.lzma"}},
            "processors": [{"jar": "net.minecraftforge:binarypatcher:1.1.1", "args": ["--patch", "{BINPATCH}"]}],
            "libraries": [
                {"name": "net.minecraftforge:binarypatcher:1.1.1", "downloads": {"artifact": {
                    "path": "net/minecraftforge/binarypatcher/1.1.1/binarypatcher-1.1.1.jar",
                    "url": "https://maven.minecraftforge.net/net/minecraftforge/binarypatcher/1.1.1/binarypatcher-1.1.1.jar",
                    "sha1": "b1", "size": 1
                }}},
                {"name": "org.example:mirrored:1.0", "clientreq": true}
            ]
        });
        let version = serde_json::json!({
            "id": "1.20.1-forge-47.2.0",
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
            "libraries": [
                {"name": "net.minecraftforge:forge:1.20.1-47.2.0:universal", "downloads": {"artifact": {
                    "path": "net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-universal.jar",
                    "url": "", "sha1": "u1", "size": 1
                }}},
                {"name": "org.example:mirrored:1.0", "clientreq": true}
            ]
        });
        let package_dir = "libraries/net/minecraftforge/forge/1.20.1-47.2.0-installer";
        write_zip(
            &dir.path().join(package_dir).join("forge-installer.jar"),
            &[
                ("install_profile.json", profile.to_string().as_bytes()),
                ("version.json", version.to_string().as_bytes()),
                (
                    "maven/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-universal.jar",
                    b"universal",
                ),
                ("data/client.lzma", b"patches"),
            ],
        );

        let descriptor: LoaderDescriptor = serde_json::from_value(serde_json::json!({
            "loader": "forge",
            "loader_version": "47.2.0",
            "loader_type": "installer",
            "file": {"name": "forge-installer.jar", "path": package_dir, "url": "https://example.com/i.jar", "type": "LIBRARY"}
        }))
        .unwrap();
        assert_eq!(descriptor.loader_type, PackageType::Installer);
        let base = VersionJson::parse(
            r#"{"id": "1.20.1", "mainClass": "net.minecraft.client.main.Main"}"#,
        )
        .unwrap();
        let mirrors = MirrorResolver::new(build_http_client().unwrap(), vec![server.url("/maven/")]);
        let (events, mut rx) = EventSender::channel();

        let setup = ProfileInstaller
            .install(InstallContext {
                paths: &paths,
                platform: &platform,
                version: &base,
                descriptor: &descriptor,
                mirrors: &mirrors,
                events: &events,
            })
            .await
            .unwrap();

        assert_eq!(setup.manifest.as_ref().unwrap().id, "1.20.1-forge-47.2.0");
        assert!(setup.profile.is_some());
        assert!(setup.client_jar.is_none());

        let universal = format!("{}/forge-1.20.1-47.2.0-universal.jar", FORGE_DIR);
        let summary: Vec<(String, FileOrigin, String)> = setup
            .libraries
            .iter()
            .map(|r| (r.file.identity(), r.origin, r.file.url.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (universal.clone(), FileOrigin::InstallerOnly, String::new()),
                (universal.clone(), FileOrigin::Loader, String::new()),
                (
                    "libraries/org/example/mirrored/1.0/mirrored-1.0.jar".to_string(),
                    FileOrigin::Loader,
                    server.url("/maven/org/example/mirrored/1.0/mirrored-1.0.jar"),
                ),
                (
                    "libraries/net/minecraftforge/binarypatcher/1.1.1/binarypatcher-1.1.1.jar"
                        .to_string(),
                    FileOrigin::InstallerOnly,
                    "https://maven.minecraftforge.net/net/minecraftforge/binarypatcher/1.1.1/binarypatcher-1.1.1.jar".to_string(),
                ),
            ]
        );
        assert_eq!(setup.libraries[2].file.sha1.as_deref(), Some(sha1_bytes(&jar).as_str()));
        assert_eq!(setup.libraries[2].file.size, Some(jar.len() as u64));

        assert_eq!(
            std::fs::read(dir.path().join(&universal)).unwrap(),
            b"universal"
        );
        let client_data = dir
            .path()
            .join(FORGE_DIR)
            .join("forge-1.20.1-47.2.0-clientdata.lzma");
        assert_eq!(std::fs::read(client_data).unwrap(), b"patches");
        assert!(dir
            .path()
            .join(package_dir)
            .join("forge-47.2.0.json")
            .exists());
        assert_eq!(setup.files.len(), 2);

        let mut end = None;
        while let Ok(event) = rx.try_recv() {
            if let LaunchEvent::ExtractEnd { amount } = event {
                end = Some(amount);
            }
        }
        assert_eq!(end, Some(2));
    }

    #[tokio::test]
    async fn unresolvable_library_is_fatal() {
        let server = TestServer::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let paths = GamePaths::new(dir.path());
        let platform = StaticHost::new(OsKind::Linux, ArchKind::X64)
            .platform()
            .unwrap();

        let legacy = serde_json::json!({
            "install": {"path": "net.minecraftforge:forge:1.7.10-10.13.4.1614-1.7.10", "filePath": "forge-universal.jar"},
            "versionInfo": {
                "id": "1.7.10-Forge10.13.4.1614-1.7.10",
                "mainClass": "net.minecraft.launchwrapper.Launch",
                "libraries": [
                    {"name": "net.minecraftforge:forge:1.7.10-10.13.4.1614-1.7.10", "url": "http://files.minecraftforge.net/maven/"},
                    {"name": "org.example:gone:1.0", "clientreq": true}
                ]
            }
        });
        write_zip(
            &dir.path().join("libraries/forge/forge-installer.jar"),
            &[
                ("install_profile.json", legacy.to_string().as_bytes()),
                ("forge-universal.jar", b"universal"),
            ],
        );

        let descriptor: LoaderDescriptor = serde_json::from_value(serde_json::json!({
            "loader": "forge",
            "loader_version": "10.13.4.1614",
            "loader_type": "installer",
            "file": {"name": "forge-installer.jar", "path": "libraries/forge", "url": "https://example.com/i.jar", "type": "LIBRARY"}
        }))
        .unwrap();
        let base = VersionJson::parse(
            r#"{"id": "1.7.10", "mainClass": "net.minecraft.client.main.Main"}"#,
        )
        .unwrap();
        let mirrors = MirrorResolver::new(build_http_client().unwrap(), vec![server.url("/maven/")]);

        let err = ProfileInstaller
            .install(InstallContext {
                paths: &paths,
                platform: &platform,
                version: &base,
                descriptor: &descriptor,
                mirrors: &mirrors,
                events: &EventSender::disabled(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "FETCH_ERROR");
        assert!(err.to_string().contains("org.example:gone:1.0"));
        // the loader's own entry was not probed
        assert_eq!(server.total_hits(), 1);
        assert!(dir
            .path()
            .join("libraries/net/minecraftforge/forge/1.7.10-10.13.4.1614-1.7.10/forge-1.7.10-10.13.4.1614-1.7.10.jar")
            .exists());
    }
}
