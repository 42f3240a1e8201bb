pub mod client;
pub mod progress;

pub use client::{Downloader, SyncOptions};
pub use progress::{ProgressTracker, SyncState};
