pub mod context;
pub mod descriptor;
pub mod installer;
pub mod overlay;
pub mod patcher;
pub mod profile;

pub use context::InstallContext;
pub use descriptor::{LoaderDescriptor, PackageType, VANILLA};
pub use installer::{Installer, LoaderInstaller, LoaderSetup};
pub use patcher::{PatchMode, PatchOutcome, Patcher};
pub use profile::{InstallProfile, ProfileInstaller, ProfileShape};
