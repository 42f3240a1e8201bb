// ─── Launcher ───
// Drives one launch attempt end to end: resolve manifests, sync files,
// install and patch the loader, prune, assemble the command line and run the
// game. Stages run one after another; only downloads run concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::core::account::Account;
use crate::core::cleaner::Cleaner;
use crate::core::config::LauncherConfig;
use crate::core::downloader::{Downloader, SyncOptions};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::files::{
    copy_legacy_assets, extract_natives, ExtraFileRecord, FileKind, FileRecord, FilesManager,
};
use crate::core::http::build_http_client;
use crate::core::java::check_java;
use crate::core::launch::{build_arguments, build_classpath, run_game, LaunchArguments, LaunchContext};
use crate::core::loaders::{
    InstallContext, Installer, LoaderDescriptor, LoaderSetup, PatchMode, Patcher,
};
use crate::core::manifests::ManifestResolver;
use crate::core::maven::MirrorResolver;
use crate::core::paths::GamePaths;
use crate::core::platform::{HostEnvironment, SystemHost};

/// A fully installed game, ready to spawn.
#[derive(Debug, Clone)]
pub struct PreparedLaunch {
    pub root: PathBuf,
    pub java: PathBuf,
    pub version: String,
    pub loader: LoaderDescriptor,
    pub arguments: LaunchArguments,
}

pub struct Launcher {
    config: LauncherConfig,
    account: Account,
    host: Arc<dyn HostEnvironment>,
    events: EventSender,
    cancel: CancellationToken,
}

impl Launcher {
    /// Build a launcher and the receiving end of its event stream.
    pub fn new(config: LauncherConfig, account: Account) -> (Self, UnboundedReceiver<LaunchEvent>) {
        let (events, rx) = EventSender::channel();
        let launcher = Self {
            config,
            account,
            host: Arc::new(SystemHost),
            events,
            cancel: CancellationToken::new(),
        };
        (launcher, rx)
    }

    pub fn with_host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = host;
        self
    }

    /// Cancelling this token stops any download batch in flight.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Install everything and run the game. Returns its exit code.
    #[instrument(skip(self), fields(server = %self.config.server_id))]
    pub async fn launch(&self) -> LauncherResult<i32> {
        let prepared = self.prepare().await?;

        self.events.emit(LaunchEvent::Launch {
            version: prepared.version.clone(),
            loader: prepared.loader.loader.clone(),
            loader_version: prepared.loader.loader_version.clone(),
        });
        let args = prepared.arguments.into_command_line();
        run_game(&prepared.java, &args, &prepared.root, &self.events).await
    }

    /// Every stage up to the spawn.
    pub async fn prepare(&self) -> LauncherResult<PreparedLaunch> {
        self.config.validate()?;
        let root = self.config.root_dir()?;
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| LauncherError::io(&root, e))?;
        let paths = GamePaths::new(&root);
        let platform = self.host.platform()?;
        let client = build_http_client()?;
        info!("Preparing {} in {:?} ({})", self.config.server_id, root, platform);

        // ── Manifests ───────────────────────────────────
        self.events.emit(LaunchEvent::ComputeDownload);
        let resolver = ManifestResolver::new(client.clone(), self.config.endpoints.clone());
        let loader_url = self.config.loader_url();
        let descriptor = resolver.loader(loader_url.as_deref()).await?;
        let resolved = resolver
            .version(self.config.minecraft.version.as_deref(), &descriptor)
            .await?;
        let version = &resolved.manifest;
        let runtime = resolver
            .runtime(self.config.java.install, &platform, version)
            .await?;

        // ── File sets ───────────────────────────────────
        let files = FilesManager::new(
            client.clone(),
            paths.clone(),
            platform.clone(),
            &self.config.endpoints.resources,
        );
        let java_set = files.java_files(runtime.as_ref()).await?;
        let modpack_url = self.config.modpack_url();
        let modpack_set = files.modpack_files(modpack_url.as_deref()).await?;
        let libraries = files
            .library_files(version, &resolved.raw, &descriptor)
            .await?;
        let library_set = libraries.file_set();
        let assets = files.asset_files(version).await?;

        // ── Sync ────────────────────────────────────────
        let downloader = Downloader::new(client.clone(), &root, self.events.clone())
            .with_options(SyncOptions::from(&self.config.download))
            .with_cancellation(self.cancel.clone());

        let mut batches = Vec::new();
        for set in [&java_set, &modpack_set, &library_set, &assets.set] {
            batches.push(downloader.get_pending(&set.payload).await?);
        }
        let total = batches.iter().map(Vec::len).sum();
        info!("{} files to download", total);
        self.events.emit(LaunchEvent::LaunchDownload { total });
        for batch in batches {
            downloader.download(batch).await?;
        }

        // ── Loader ──────────────────────────────────────
        let setup = if descriptor.is_vanilla() {
            LoaderSetup::default()
        } else {
            self.events.emit(LaunchEvent::InstallLoader {
                loader: descriptor.loader.clone(),
                loader_version: descriptor.loader_version.clone(),
            });
            let mirrors = MirrorResolver::new(client.clone(), self.config.endpoints.mirrors.clone());
            let ctx = InstallContext {
                paths: &paths,
                platform: &platform,
                version,
                descriptor: &descriptor,
                mirrors: &mirrors,
                events: &self.events,
            };
            let setup = Installer::new(&descriptor).install(ctx).await?;
            let loader_records: Vec<FileRecord> =
                setup.libraries.iter().map(|r| r.file.clone()).collect();
            downloader.sync(&loader_records).await?;
            setup
        };

        // ── Natives and legacy assets ───────────────────
        self.events.emit(LaunchEvent::ExtractNatives);
        let natives: Vec<FileRecord> = libraries
            .records
            .iter()
            .filter(|r| r.file.kind == FileKind::Native)
            .map(|r| r.file.clone())
            .collect();
        let extracted = extract_natives(&paths, natives, self.events.clone()).await?;

        let copied = if version.uses_legacy_assets() {
            self.events.emit(LaunchEvent::CopyAssets);
            copy_legacy_assets(&paths, &assets.index, self.events.clone()).await?
        } else {
            Vec::new()
        };

        // ── Java ────────────────────────────────────────
        let java = self
            .config
            .java_executable(&root, platform.os.java_executable());
        self.events.emit(LaunchEvent::CheckJava);
        let java_info = check_java(&java).await?;
        info!("Java {} ({})", java_info.version, java_info.arch);
        self.events.emit(LaunchEvent::JavaInfo {
            version: java_info.version,
            arch: java_info.arch,
        });

        // ── Patch ───────────────────────────────────────
        let mut patched = Vec::new();
        if let Some(profile) = &setup.profile {
            self.events.emit(LaunchEvent::PatchLoader);
            let installer = descriptor.package()?.destination(&root);
            let patcher = Patcher {
                paths: &paths,
                platform: &platform,
                profile,
                version_id: &version.id,
                installer: &installer,
                java: &java,
                mode: self.patch_mode(),
                events: &self.events,
            };
            patched = patcher.patch().await?.outputs;
        }

        // ── Prune ───────────────────────────────────────
        if self.config.cleaning.clean {
            self.events.emit(LaunchEvent::Clean);
            let mut keep: Vec<FileRecord> = Vec::new();
            for set in [&java_set, &modpack_set, &library_set, &assets.set] {
                keep.extend(set.files.iter().cloned());
            }
            keep.extend(setup.libraries.iter().map(|r| r.file.clone()));
            keep.extend(setup.files.iter().cloned());
            keep.extend(extracted);
            keep.extend(copied);
            keep.extend(patched);
            Cleaner::new(&root, self.events.clone())
                .clean(&keep, &self.config.ignored, false)
                .await?;
        }

        // ── Arguments ───────────────────────────────────
        let (classpath_libraries, client_jar) =
            launch_libraries(&root, &paths, &version.id, &libraries.records, &setup);
        let classpath = build_classpath(
            &root,
            &classpath_libraries,
            platform.os.classpath_separator(),
        );
        let ctx = LaunchContext {
            config: &self.config,
            account: &self.account,
            paths: &paths,
            platform: &platform,
            version,
            loader: setup.manifest.as_ref(),
            classpath,
            client_jar,
        };
        let arguments = build_arguments(&ctx);

        Ok(PreparedLaunch {
            root,
            java,
            version: version.id.clone(),
            loader: descriptor,
            arguments,
        })
    }

    fn patch_mode(&self) -> PatchMode {
        if self.config.patcher.strict {
            PatchMode::Strict
        } else {
            PatchMode::Lenient
        }
    }
}

/// Game libraries followed by the loader's, with the vanilla client archive
/// swapped for the loader's when it ships one. Also returns the archive the
/// game runs from.
fn launch_libraries(
    root: &Path,
    paths: &GamePaths,
    version_id: &str,
    game: &[ExtraFileRecord],
    setup: &LoaderSetup,
) -> (Vec<ExtraFileRecord>, PathBuf) {
    let vanilla_dir = format!("versions/{}/", version_id);
    let mut libraries: Vec<ExtraFileRecord> = game.to_vec();

    let client_jar = match &setup.client_jar {
        Some(jar) => {
            for library in libraries.iter_mut() {
                if library.file.path == vanilla_dir && library.file.kind == FileKind::Library {
                    library.file = jar.clone();
                }
            }
            jar.destination(root)
        }
        None => paths.version_jar(version_id),
    };

    libraries.extend(setup.libraries.iter().cloned());
    (libraries, client_jar)
}
