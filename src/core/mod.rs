// ─── Launcher Core ───
// Install and launch pipeline for one server's game directory.
//
// Architecture:
//   core/
//     version/   : Mojang version index, version JSON, OS rules
//     manifests  : Loader, version and runtime resolution per launch
//     files/     : Record model, file-set builder, natives and assets
//     downloader/: Bounded concurrent sync with SHA-1 validation
//     cleaner    : Prunes files outside the current file set
//     maven/     : Coordinates and mirror probing
//     loaders/   : Overlay merge, install profiles, processors
//     java/      : Managed runtime manifest and `java -version` check
//     launch/    : Classpath, argument assembly, process spawn
//     launcher   : Orchestrates one launch attempt

pub mod account;
pub mod cleaner;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod files;
pub mod hash;
pub mod http;
pub mod java;
pub mod launch;
pub mod launcher;
pub mod loaders;
pub mod manifests;
pub mod maven;
pub mod paths;
pub mod platform;
pub mod version;

#[cfg(test)]
pub mod test_support;
