// ─── Processor Runner ───
// Runs the install profile's client processors to produce the patched
// artifacts a loader needs at launch. Skipped when every declared output
// already exists.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use super::profile::{InstallProfile, ProcessorSpec, BINPATCH};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::files::{FileKind, FileRecord};
use crate::core::maven::MavenArtifact;
use crate::core::paths::{arg_path, GamePaths};
use crate::core::platform::Platform;

/// What to do when a processor fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchMode {
    /// Log, emit `PatchError` and keep going.
    #[default]
    Lenient,
    /// Stop at the first failure.
    Strict,
}

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// Files the processors are declared to produce.
    pub outputs: Vec<FileRecord>,
    /// Processors attempted this run.
    pub invocations: usize,
}

pub struct Patcher<'a> {
    pub paths: &'a GamePaths,
    pub platform: &'a Platform,
    pub profile: &'a InstallProfile,
    /// Base game version whose client archive gets patched.
    pub version_id: &'a str,
    /// The installer package the profile came from.
    pub installer: &'a Path,
    pub java: &'a Path,
    pub mode: PatchMode,
    pub events: &'a EventSender,
}

impl Patcher<'_> {
    /// Library files referenced through the data table by client processor
    /// arguments. The client patch data is an input and is left out.
    pub fn expected_outputs(&self) -> LauncherResult<Vec<FileRecord>> {
        let mut seen = HashSet::new();
        let mut outputs = Vec::new();

        for processor in self.profile.client_processors() {
            for arg in &processor.args {
                let Some(key) = data_key(arg) else {
                    continue;
                };
                if key == BINPATCH {
                    continue;
                }
                let Some(entry) = self.profile.data.get(key) else {
                    continue;
                };
                let Some(coordinate) = bracketed(&entry.client) else {
                    continue;
                };
                let record = library_record(coordinate)?;
                if seen.insert(record.identity()) {
                    outputs.push(record);
                }
            }
        }

        Ok(outputs)
    }

    pub async fn patch(&self) -> LauncherResult<PatchOutcome> {
        let outputs = self.expected_outputs()?;
        let root = self.paths.root();

        if outputs.iter().all(|r| r.destination(root).exists()) {
            info!("All {} processor outputs present, nothing to patch", outputs.len());
            self.events.emit(LaunchEvent::PatchEnd { amount: 0 });
            return Ok(PatchOutcome {
                outputs,
                invocations: 0,
            });
        }

        let mut invocations = 0;
        for processor in self.profile.client_processors() {
            invocations += 1;
            match self.run_processor(processor).await {
                Ok(()) => self.events.emit(LaunchEvent::PatchProgress {
                    filename: processor.jar.clone(),
                }),
                Err(err) => {
                    let err = match err {
                        err @ LauncherError::Exec { .. } => err,
                        other => LauncherError::Exec {
                            program: processor.jar.clone(),
                            reason: other.to_string(),
                        },
                    };
                    if self.mode == PatchMode::Strict {
                        return Err(err);
                    }
                    warn!("Processor {} failed: {}", processor.jar, err);
                    self.events.emit(LaunchEvent::PatchError {
                        filename: processor.jar.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!("Ran {} processors", invocations);
        self.events.emit(LaunchEvent::PatchEnd {
            amount: invocations,
        });
        Ok(PatchOutcome {
            outputs,
            invocations,
        })
    }

    async fn run_processor(&self, processor: &ProcessorSpec) -> LauncherResult<()> {
        let jar = self.library_path(&processor.jar)?;
        let main_class = {
            let jar = jar.clone();
            tokio::task::spawn_blocking(move || read_main_class(&jar))
                .await
                .map_err(|e| LauncherError::Other(format!("manifest read task failed: {}", e)))??
        };

        let mut classpath = vec![arg_path(&jar)];
        for coordinate in &processor.classpath {
            classpath.push(arg_path(&self.library_path(coordinate)?));
        }
        let classpath = classpath.join(self.platform.os.classpath_separator());

        let args = processor
            .args
            .iter()
            .map(|arg| self.resolve_arg(arg))
            .collect::<LauncherResult<Vec<_>>>()?;

        debug!("Processor {} {}: {:?}", processor.jar, main_class, args);
        let output = Command::new(self.java)
            .arg("-cp")
            .arg(&classpath)
            .arg(&main_class)
            .args(&args)
            .current_dir(self.paths.root())
            .output()
            .await
            .map_err(|e| LauncherError::Exec {
                program: processor.jar.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LauncherError::Exec {
                program: processor.jar.clone(),
                reason: format!(
                    "exit code {:?}: {}",
                    output.status.code(),
                    stderr.lines().last().unwrap_or_default()
                ),
            });
        }
        Ok(())
    }

    /// Substitute one processor argument.
    fn resolve_arg(&self, arg: &str) -> LauncherResult<String> {
        if let Some(key) = data_key(arg) {
            if key == BINPATCH {
                let relative = self.profile.client_data_relative().ok_or_else(|| {
                    LauncherError::invalid("install profile", "cannot place client patch data")
                })?;
                return Ok(arg_path(&self.paths.root().join(relative)));
            }
            if let Some(entry) = self.profile.data.get(key) {
                return self.data_value(&entry.client);
            }
        }

        let root = self.paths.root();
        let replaced = arg
            .replace("{SIDE}", "client")
            .replace("{ROOT}", &arg_path(root))
            .replace(
                "{MINECRAFT_JAR}",
                &arg_path(&self.paths.version_jar(self.version_id)),
            )
            .replace(
                "{MINECRAFT_VERSION}",
                &arg_path(&self.paths.version_json(self.version_id)),
            )
            .replace("{INSTALLER}", &arg_path(self.installer))
            .replace("{LIBRARY_DIR}", &arg_path(&self.paths.libraries()));

        match bracketed(&replaced) {
            Some(coordinate) => Ok(arg_path(&self.library_path(coordinate)?)),
            None => Ok(replaced),
        }
    }

    fn data_value(&self, value: &str) -> LauncherResult<String> {
        if let Some(coordinate) = bracketed(value) {
            return Ok(arg_path(&self.library_path(coordinate)?));
        }
        if let Some(literal) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            return Ok(literal.to_string());
        }
        Ok(value.to_string())
    }

    fn library_path(&self, coordinate: &str) -> LauncherResult<PathBuf> {
        let artifact = MavenArtifact::parse(coordinate)?;
        Ok(self.paths.libraries().join(artifact.local_path()))
    }
}

/// `KEY` when the whole argument is `{KEY}`.
fn data_key(arg: &str) -> Option<&str> {
    arg.strip_prefix('{')?.strip_suffix('}')
}

fn bracketed(value: &str) -> Option<&str> {
    value.strip_prefix('[')?.strip_suffix(']')
}

fn library_record(coordinate: &str) -> LauncherResult<FileRecord> {
    let artifact = MavenArtifact::parse(coordinate)?;
    Ok(FileRecord::new(
        artifact.filename(),
        format!("libraries/{}", artifact.layout_dir()),
        FileKind::Library,
    ))
}

/// `Main-Class` attribute of a jar's manifest.
fn read_main_class(jar: &Path) -> LauncherResult<String> {
    let file = File::open(jar).map_err(|e| LauncherError::io(jar, e))?;
    let mut zip = ZipArchive::new(file)?;
    let mut manifest = String::new();
    zip.by_name("META-INF/MANIFEST.MF")?
        .read_to_string(&mut manifest)
        .map_err(|e| LauncherError::io(jar, e))?;

    manifest
        .lines()
        .find_map(|line| line.strip_prefix("Main-Class:"))
        .map(|class| class.trim().to_string())
        .filter(|class| !class.is_empty())
        .ok_or_else(|| LauncherError::Exec {
            program: jar.display().to_string(),
            reason: "jar manifest has no Main-Class".into(),
        })
}
