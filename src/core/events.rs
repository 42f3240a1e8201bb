// ─── Launch Events ───
// Typed progress notifications for whatever sits above the pipeline.
// Every component gets a clone of one `EventSender`, so the caller sees a
// single ordered stream.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::downloader::SyncState;
use crate::core::files::FileKind;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LaunchEvent {
    // ── Download ───────────────────────────────────────
    ComputeDownload,
    LaunchDownload {
        total: usize,
    },
    DownloadProgress {
        state: SyncState,
        kind: FileKind,
    },
    DownloadError {
        filename: String,
        kind: FileKind,
        message: String,
    },
    DownloadEnd {
        downloaded: usize,
    },

    // ── Loader install / natives ───────────────────────
    InstallLoader {
        loader: String,
        loader_version: String,
    },
    ExtractNatives,
    ExtractProgress {
        filename: String,
    },
    ExtractEnd {
        amount: usize,
    },

    // ── Legacy assets ──────────────────────────────────
    CopyAssets,
    CopyProgress {
        filename: String,
        dest: String,
    },
    CopyEnd {
        amount: usize,
    },

    // ── Patcher ────────────────────────────────────────
    PatchLoader,
    PatchProgress {
        filename: String,
    },
    PatchError {
        filename: String,
        message: String,
    },
    PatchEnd {
        amount: usize,
    },

    // ── Java ───────────────────────────────────────────
    CheckJava,
    JavaInfo {
        version: String,
        arch: String,
    },

    // ── Pruner ─────────────────────────────────────────
    Clean,
    CleanProgress {
        filename: String,
    },
    CleanEnd {
        amount: usize,
    },

    // ── Game process ───────────────────────────────────
    Launch {
        version: String,
        loader: String,
        loader_version: String,
    },
    Data {
        line: String,
    },
    Close {
        code: i32,
    },

    Debug {
        message: String,
    },
}

/// Cloneable handle components emit through. A disabled sender drops events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Option<mpsc::UnboundedSender<LaunchEvent>>,
}

impl EventSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LaunchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event. A dropped receiver is not an error.
    pub fn emit(&self, event: LaunchEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LaunchEvent::Debug {
            message: message.into(),
        });
    }
}
