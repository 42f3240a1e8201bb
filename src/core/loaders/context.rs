use crate::core::events::EventSender;
use crate::core::maven::MirrorResolver;
use crate::core::paths::GamePaths;
use crate::core::platform::Platform;
use crate::core::version::VersionJson;

use super::descriptor::LoaderDescriptor;

/// Everything an installer needs for one run.
pub struct InstallContext<'a> {
    pub paths: &'a GamePaths,
    pub platform: &'a Platform,
    /// Base game manifest the loader applies to.
    pub version: &'a VersionJson,
    pub descriptor: &'a LoaderDescriptor,
    pub mirrors: &'a MirrorResolver,
    pub events: &'a EventSender,
}
