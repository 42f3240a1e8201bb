// ─── File-Set Builder ───
// Turns resolved manifests into flat record lists. Each list is independent:
// runtime, modpack extras, libraries (+ natives, client jar, loader package,
// log4j configs) and assets. Version and index JSON are written to disk here
// so the next run has a local copy.

use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use super::assets::AssetIndex;
use super::record::{ExtraFileRecord, FileKind, FileOrigin, FileRecord, FileSet};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{fetch_data, fetch_json};
use crate::core::loaders::LoaderDescriptor;
use crate::core::manifests::ResolvedRuntime;
use crate::core::maven::{MavenArtifact, MOJANG_LIBRARIES};
use crate::core::paths::{asset_index_relative, version_json_relative, GamePaths};
use crate::core::platform::Platform;
use crate::core::version::{LibraryArtifact, LibraryEntry, VersionJson};

const LOG4J_BASE_URL: &str = "https://launcher.mojang.com/v1/objects";

/// Pinned log4j configuration files, keyed by the `1.x` minor band they fix.
const LOG4J_CONFIGS: &[(u32, u32, &str, &str)] = &[
    (
        7,
        11,
        "log4j2_17-111.xml",
        "4bb89a97a66f350bc9f73b3ca8509632682aea2e",
    ),
    (
        12,
        16,
        "log4j2_112-116.xml",
        "02937d122c86ce73319ef9975b58896fc1b491d1",
    ),
];

/// Libraries of the base version plus everything that rides along with
/// them, in classpath order.
#[derive(Debug, Clone, Default)]
pub struct LibraryFiles {
    pub records: Vec<ExtraFileRecord>,
    /// Written locally, kept by the pruner but never downloaded.
    pub local: Vec<FileRecord>,
}

impl LibraryFiles {
    pub fn file_set(&self) -> FileSet {
        let mut set =
            FileSet::from_payload(self.records.iter().map(|r| r.file.clone()).collect());
        for record in &self.local {
            set.keep(record.clone());
        }
        set
    }
}

#[derive(Debug, Clone)]
pub struct AssetFiles {
    pub index: AssetIndex,
    pub set: FileSet,
}

pub struct FilesManager {
    client: Client,
    paths: GamePaths,
    platform: Platform,
    resources_url: String,
}

impl FilesManager {
    pub fn new(client: Client, paths: GamePaths, platform: Platform, resources_url: &str) -> Self {
        Self {
            client,
            paths,
            platform,
            resources_url: resources_url.trim_end_matches('/').to_string(),
        }
    }

    /// Runtime files. `None` means the runtime is managed by the user.
    pub async fn java_files(&self, runtime: Option<&ResolvedRuntime>) -> LauncherResult<FileSet> {
        let Some(runtime) = runtime else {
            debug!("Manual java install, no runtime files");
            return Ok(FileSet::default());
        };

        let mut set = FileSet::from_payload(runtime.manifest.records());

        let index_name = format!("{}.json", runtime.component);
        let index_path = self.paths.root().join("runtime").join(&index_name);
        write_text(&index_path, &runtime.raw_index).await?;
        set.keep(FileRecord::new(index_name, "runtime", FileKind::Config));

        info!("Runtime {}: {} files", runtime.component, set.payload.len());
        Ok(set)
    }

    /// Extra files the modpack server declares. Empty without a server.
    #[instrument(skip(self))]
    pub async fn modpack_files(&self, modpack_url: Option<&str>) -> LauncherResult<FileSet> {
        let Some(url) = modpack_url else {
            return Ok(FileSet::default());
        };
        let records: Vec<FileRecord> = fetch_data(&self.client, url, "modpack files").await?;
        info!("Modpack declares {} files", records.len());
        Ok(FileSet::from_payload(records))
    }

    /// Libraries and natives allowed on this platform, the client archive,
    /// the loader package and the log4j configuration for this version.
    /// Also writes `versions/<id>/<id>.json`.
    pub async fn library_files(
        &self,
        version: &VersionJson,
        raw_version: &str,
        loader: &LoaderDescriptor,
    ) -> LauncherResult<LibraryFiles> {
        let mut out = LibraryFiles::default();

        for library in &version.libraries {
            if !library.is_allowed(&self.platform) {
                debug!("Skipping {} (rules)", library.name);
                continue;
            }
            for record in self.library_records(library)? {
                out.records
                    .push(ExtraFileRecord::new(record, FileOrigin::GameDefault));
            }
        }

        if let Some(client) = version.client_download() {
            let record = FileRecord::new(
                format!("{}.jar", version.id),
                format!("versions/{}", version.id),
                FileKind::Library,
            )
            .with_url(client.url.clone())
            .with_sha1(Some(client.sha1.clone()))
            .with_size(Some(client.size));
            out.records
                .push(ExtraFileRecord::new(record, FileOrigin::GameDefault));
        } else {
            warn!("Version {} declares no client download", version.id);
        }

        if !loader.is_vanilla() {
            let package = loader.package()?.clone();
            out.records
                .push(ExtraFileRecord::new(package, FileOrigin::InstallerOnly));
        }

        for record in self.log4j_files(version) {
            out.records
                .push(ExtraFileRecord::new(record, FileOrigin::GameDefault));
        }

        VersionJson::save_to(raw_version, &self.paths.version_dir(&version.id), &version.id)
            .await?;
        out.local.push(FileRecord::from_relative(
            &version_json_relative(&version.id),
            FileKind::Config,
        ));

        info!(
            "Version {}: {} library records",
            version.id,
            out.records.len()
        );
        Ok(out)
    }

    /// Log4j configuration override for the vulnerable `1.7`..`1.16` range.
    pub fn log4j_files(&self, version: &VersionJson) -> Vec<FileRecord> {
        let Some(minor) = version.minor_version() else {
            return Vec::new();
        };
        LOG4J_CONFIGS
            .iter()
            .filter(|(from, to, _, _)| (*from..=*to).contains(&minor))
            .map(|(_, _, name, sha1)| {
                FileRecord::new(*name, "", FileKind::Config)
                    .with_url(format!("{}/{}/{}", LOG4J_BASE_URL, sha1, name))
                    .with_sha1(Some(sha1.to_string()))
            })
            .collect()
    }

    /// Fetch the asset index, persist it and list every object.
    #[instrument(skip(self, version), fields(version = %version.id))]
    pub async fn asset_files(&self, version: &VersionJson) -> LauncherResult<AssetFiles> {
        let Some(info) = version.asset_index.as_ref() else {
            warn!("Version {} has no asset index", version.id);
            return Ok(AssetFiles {
                index: AssetIndex {
                    objects: Default::default(),
                },
                set: FileSet::default(),
            });
        };

        let (index, raw): (AssetIndex, String) =
            fetch_json(&self.client, &info.url, "asset index").await?;
        write_text(&self.paths.asset_index(&info.id), &raw).await?;

        let mut set = FileSet::from_payload(index.records(&self.resources_url));
        set.keep(FileRecord::from_relative(
            &asset_index_relative(&info.id),
            FileKind::Config,
        ));

        info!("Asset index {}: {} objects", info.id, index.objects.len());
        Ok(AssetFiles { index, set })
    }

    fn library_records(&self, library: &LibraryEntry) -> LauncherResult<Vec<FileRecord>> {
        let mut records = Vec::new();
        let coordinate = library.coordinate()?;

        if let Some(artifact) = library.artifact() {
            records.push(artifact_record(&coordinate, artifact, FileKind::Library));
        } else if !library.is_native() {
            let base = library.url.as_deref().unwrap_or(MOJANG_LIBRARIES);
            records.push(coordinate_record(&coordinate, base, FileKind::Library));
        }

        if let Some(classifier) = library.native_classifier(&self.platform) {
            match library.classifier(&classifier) {
                Some(artifact) => {
                    let mut native = coordinate.clone();
                    native.classifier = Some(classifier);
                    records.push(artifact_record(&native, artifact, FileKind::Native));
                }
                None => warn!("{} has no {} natives", library.name, classifier),
            }
        }

        Ok(records)
    }
}

/// Record for a manifest artifact. The explicit `path` wins over the
/// coordinate layout.
pub fn artifact_record(
    coordinate: &MavenArtifact,
    artifact: &LibraryArtifact,
    kind: FileKind,
) -> FileRecord {
    let relative = match artifact.path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => format!("libraries/{}", path),
        None => format!("libraries/{}/{}", coordinate.layout_dir(), coordinate.filename()),
    };
    FileRecord::from_relative(&relative, kind)
        .with_url(artifact.url.clone())
        .with_sha1(artifact.sha1.clone())
        .with_size(artifact.size)
}

/// Record for a bare coordinate served from `base`.
pub fn coordinate_record(coordinate: &MavenArtifact, base: &str, kind: FileKind) -> FileRecord {
    FileRecord::new(
        coordinate.filename(),
        format!("libraries/{}", coordinate.layout_dir()),
        kind,
    )
    .with_url(coordinate.url(base))
}

async fn write_text(path: &std::path::Path, text: &str) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|e| LauncherError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;
    use crate::core::platform::{ArchKind, HostEnvironment, OsKind, StaticHost};
    use crate::core::test_support::{Route, TestServer};

    fn manager(root: &std::path::Path, resources: &str) -> FilesManager {
        let platform = StaticHost::new(OsKind::Linux, ArchKind::X64)
            .platform()
            .unwrap();
        FilesManager::new(
            build_http_client().unwrap(),
            GamePaths::new(root),
            platform,
            resources,
        )
    }

    fn version(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "1.12",
            "downloads": {"client": {"sha1": "c1", "size": 10, "url": "https://example.com/client.jar"}},
            "libraries": [
                {
                    "name": "com.mojang:patchy:1.1",
                    "downloads": {"artifact": {
                        "path": "com/mojang/patchy/1.1/patchy-1.1.jar",
                        "sha1": "p1", "size": 1, "url": "https://libraries.minecraft.net/com/mojang/patchy/1.1/patchy-1.1.jar"
                    }}
                },
                {
                    "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
                    "natives": {"linux": "natives-linux", "windows": "natives-windows-${arch}"},
                    "downloads": {"classifiers": {
                        "natives-linux": {"path": "org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar", "sha1": "n1", "size": 2, "url": "https://example.com/n.jar"}
                    }}
                },
                {
                    "name": "ca.weblite:java-objc-bridge:1.0.0",
                    "rules": [{"action": "allow", "os": {"name": "osx"}}],
                    "downloads": {"artifact": {"path": "ca/weblite/java-objc-bridge/1.0.0/java-objc-bridge-1.0.0.jar", "sha1": "o1", "size": 3, "url": "https://example.com/o.jar"}}
                }
            ]
        })
    }

    #[tokio::test]
    async fn library_files_filter_rules_and_add_natives() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), "https://resources.download.minecraft.net");
        let raw = version("1.12.2").to_string();
        let parsed = VersionJson::parse(&raw).unwrap();

        let libraries = manager
            .library_files(&parsed, &raw, &LoaderDescriptor::vanilla())
            .await
            .unwrap();

        let identities: Vec<String> = libraries
            .records
            .iter()
            .map(|r| r.file.identity())
            .collect();
        assert_eq!(
            identities,
            vec![
                "libraries/com/mojang/patchy/1.1/patchy-1.1.jar",
                "libraries/org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar",
                "versions/1.12.2/1.12.2.jar",
                "log4j2_112-116.xml",
            ]
        );
        assert_eq!(libraries.records[1].file.kind, FileKind::Native);
        assert_eq!(libraries.records[3].file.kind, FileKind::Config);
        assert!(dir.path().join("versions/1.12.2/1.12.2.json").exists());

        let set = libraries.file_set();
        assert_eq!(set.payload.len(), 4);
        assert_eq!(set.files.len(), 5);
    }

    #[test]
    fn log4j_bands() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), "https://r");
        let pick = |id: &str| -> Vec<String> {
            let parsed = VersionJson::parse(&version(id).to_string()).unwrap();
            manager
                .log4j_files(&parsed)
                .into_iter()
                .map(|r| r.name)
                .collect()
        };

        assert_eq!(pick("1.7.10"), vec!["log4j2_17-111.xml"]);
        assert_eq!(pick("1.11.2"), vec!["log4j2_17-111.xml"]);
        assert_eq!(pick("1.16.5"), vec!["log4j2_112-116.xml"]);
        assert!(pick("1.17.1").is_empty());
        assert!(pick("1.6.4").is_empty());
        assert!(pick("24w03a").is_empty());
    }

    #[tokio::test]
    async fn asset_files_persist_index() {
        let server = TestServer::start(vec![Route::json(
            "/indexes/1.12.json",
            serde_json::json!({"objects": {
                "a.ogg": {"hash": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", "size": 5}
            }}),
        )])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), &server.url("/res"));

        let mut value = version("1.12.2");
        value["assetIndex"] = serde_json::json!({
            "id": "1.12", "url": server.url("/indexes/1.12.json"), "sha1": "x", "size": 1, "totalSize": 5
        });
        let parsed = VersionJson::parse(&value.to_string()).unwrap();

        let assets = manager.asset_files(&parsed).await.unwrap();
        assert_eq!(assets.set.payload.len(), 1);
        assert_eq!(
            assets.set.payload[0].url,
            server.url("/res/aa/aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")
        );
        assert!(assets
            .set
            .files
            .iter()
            .any(|r| r.identity() == "assets/indexes/1.12.json"));
        assert!(dir.path().join("assets/indexes/1.12.json").exists());
    }

    #[tokio::test]
    async fn modpack_files_are_skipped_without_server() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), "https://r");
        let set = manager.modpack_files(None).await.unwrap();
        assert!(set.files.is_empty());

        let server = TestServer::start(vec![Route::json(
            "/api/files-updater",
            serde_json::json!({"data": [
                {"name": "mod.jar", "path": "mods", "url": "https://example.com/mod.jar", "sha1": "m1", "size": 9, "type": "MOD"}
            ]}),
        )])
        .await;
        let set = manager
            .modpack_files(Some(&server.url("/api/files-updater")))
            .await
            .unwrap();
        assert_eq!(set.payload.len(), 1);
        assert_eq!(set.payload[0].identity(), "mods/mod.jar");
        assert_eq!(set.payload[0].kind, FileKind::Other);
    }
}
