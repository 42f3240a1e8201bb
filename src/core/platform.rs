// ─── Host Environment ───
// OS/arch detection behind a small trait so the rest of the pipeline can be
// driven against a fake host in tests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// OS major version from which a rule's `os.version` requirement is met.
pub const RECENT_OS_MAJOR: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Windows,
    MacOs,
    Linux,
}

impl OsKind {
    /// Name used by Mojang rules and native maps.
    pub fn rule_name(self) -> &'static str {
        match self {
            OsKind::Windows => "windows",
            OsKind::MacOs => "osx",
            OsKind::Linux => "linux",
        }
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            OsKind::Windows => ";",
            _ => ":",
        }
    }

    pub fn java_executable(self) -> &'static str {
        match self {
            OsKind::Windows => "java.exe",
            _ => "java",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchKind {
    X64,
    X86,
    Arm64,
}

impl ArchKind {
    /// Value substituted for `${arch}` in native classifiers.
    pub fn bits(self) -> &'static str {
        match self {
            ArchKind::X86 => "32",
            ArchKind::X64 | ArchKind::Arm64 => "64",
        }
    }

    /// Name used by `os.arch` in Mojang rules.
    pub fn rule_name(self) -> &'static str {
        match self {
            ArchKind::X64 => "x64",
            ArchKind::X86 => "x86",
            ArchKind::Arm64 => "arm64",
        }
    }
}

/// Resolved snapshot of the host, captured once per launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsKind,
    pub arch: ArchKind,
    pub os_version: Option<String>,
}

impl Platform {
    /// Whether the host OS is at or above [`RECENT_OS_MAJOR`].
    pub fn is_recent_os(&self) -> bool {
        self.os_version
            .as_deref()
            .and_then(|v| v.split(|c: char| !c.is_ascii_digit()).next())
            .and_then(|major| major.parse::<u32>().ok())
            .is_some_and(|major| major >= RECENT_OS_MAJOR)
    }

    /// Key of this platform in the managed runtime index.
    pub fn runtime_key(&self) -> LauncherResult<&'static str> {
        let key = match (self.os, self.arch) {
            (OsKind::Windows, ArchKind::X64) => "windows-x64",
            (OsKind::Windows, ArchKind::X86) => "windows-x86",
            (OsKind::Windows, ArchKind::Arm64) => "windows-arm64",
            (OsKind::MacOs, ArchKind::X64) => "mac-os",
            (OsKind::MacOs, ArchKind::Arm64) => "mac-os-arm64",
            (OsKind::Linux, ArchKind::X64) => "linux",
            (OsKind::Linux, ArchKind::X86) => "linux-i386",
            (os, arch) => {
                return Err(LauncherError::UnsupportedPlatform(format!(
                    "{} on {}",
                    os.rule_name(),
                    arch.rule_name()
                )))
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.rule_name(), self.arch.rule_name())?;
        if let Some(version) = &self.os_version {
            write!(f, " ({})", version)?;
        }
        Ok(())
    }
}

/// Source of host facts. Injected into the launcher so tests can fake it.
pub trait HostEnvironment: Send + Sync {
    fn os(&self) -> LauncherResult<OsKind>;
    fn arch(&self) -> LauncherResult<ArchKind>;
    fn os_version(&self) -> Option<String>;

    fn platform(&self) -> LauncherResult<Platform> {
        Ok(Platform {
            os: self.os()?,
            arch: self.arch()?,
            os_version: self.os_version(),
        })
    }
}

/// The real machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostEnvironment for SystemHost {
    fn os(&self) -> LauncherResult<OsKind> {
        match std::env::consts::OS {
            "windows" => Ok(OsKind::Windows),
            "macos" => Ok(OsKind::MacOs),
            "linux" => Ok(OsKind::Linux),
            other => Err(LauncherError::UnknownOs(other.to_string())),
        }
    }

    fn arch(&self) -> LauncherResult<ArchKind> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(ArchKind::X64),
            "x86" => Ok(ArchKind::X86),
            "aarch64" => Ok(ArchKind::Arm64),
            other => Err(LauncherError::UnsupportedPlatform(other.to_string())),
        }
    }

    fn os_version(&self) -> Option<String> {
        sysinfo::System::os_version()
    }
}

/// Fixed host description, for tests and embedders that already know the target.
#[derive(Debug, Clone)]
pub struct StaticHost {
    pub os: OsKind,
    pub arch: ArchKind,
    pub os_version: Option<String>,
}

impl StaticHost {
    pub fn new(os: OsKind, arch: ArchKind) -> Self {
        Self {
            os,
            arch,
            os_version: None,
        }
    }

    pub fn with_os_version(mut self, version: &str) -> Self {
        self.os_version = Some(version.to_string());
        self
    }
}

impl HostEnvironment for StaticHost {
    fn os(&self) -> LauncherResult<OsKind> {
        Ok(self.os)
    }

    fn arch(&self) -> LauncherResult<ArchKind> {
        Ok(self.arch)
    }

    fn os_version(&self) -> Option<String> {
        self.os_version.clone()
    }
}
