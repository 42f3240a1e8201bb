pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::account::Account;
pub use crate::core::config::LauncherConfig;
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::events::{EventSender, LaunchEvent};
pub use crate::core::launcher::{Launcher, PreparedLaunch};
pub use crate::core::platform::{HostEnvironment, StaticHost, SystemHost};

/// Install the `tracing` subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launcher_core=debug")),
        )
        .try_init();
}
