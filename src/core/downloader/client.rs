use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::progress::{ProgressTracker, SyncState};
use crate::core::config::DownloadConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};
use crate::core::files::{dedup_records, FileKind, FileRecord};
use crate::core::hash::{hash_matches, sha1_file_async};

/// Tuning for one sync batch.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub concurrency: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub window: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&DownloadConfig::default())
    }
}

impl From<&DownloadConfig> for SyncOptions {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
            window: config.speed_window(),
        }
    }
}

/// Reconciles records against the install root: finds what is missing or
/// stale and fetches it with a bounded pool of workers.
pub struct Downloader {
    client: Client,
    root: PathBuf,
    events: EventSender,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(client: Client, root: impl Into<PathBuf>, events: EventSender) -> Self {
        Self {
            client,
            root: root.into(),
            events,
            options: SyncOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Batches run under a child of `token`, so cancelling it stops them.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Pending computation ─────────────────────────────

    /// Records that still need a transfer. Folders are created on the spot;
    /// records without a URL are produced locally and never fetched.
    pub async fn get_pending(&self, records: &[FileRecord]) -> LauncherResult<Vec<FileRecord>> {
        let records = dedup_records(records.to_vec())?;
        let mut pending = Vec::new();

        for record in records {
            let dest = record.destination(&self.root);

            if record.kind == FileKind::Folder {
                tokio::fs::create_dir_all(&dest)
                    .await
                    .map_err(|e| LauncherError::io(&dest, e))?;
                continue;
            }

            if !record.is_downloadable() {
                if !dest.exists() {
                    warn!("{} has no URL and is missing locally", record.identity());
                }
                continue;
            }

            if !is_valid(&dest, record.sha1.as_deref()).await? {
                pending.push(record);
            }
        }

        debug!("{} records pending", pending.len());
        Ok(pending)
    }

    // ── Batch download ──────────────────────────────────

    /// Download every pending record. Resolves once all admitted transfers
    /// have terminated. The first record to exhaust its retries stops new
    /// admissions and becomes the batch error.
    pub async fn download(&self, pending: Vec<FileRecord>) -> LauncherResult<SyncState> {
        let total_bytes = pending.iter().filter_map(|r| r.size).sum();
        let tracker = ProgressTracker::new(pending.len(), total_bytes, self.options.window);

        if pending.is_empty() {
            self.events.emit(LaunchEvent::DownloadEnd { downloaded: 0 });
            return Ok(tracker.snapshot());
        }

        info!(
            "Starting batch download: {} files, {} bytes, concurrency={}",
            pending.len(),
            total_bytes,
            self.options.concurrency
        );

        let batch = self.cancel.child_token();
        let failure: Mutex<Option<LauncherError>> = Mutex::new(None);
        let (tx, rx) = mpsc::channel::<FileRecord>(self.options.concurrency);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let producer = async {
            for record in pending {
                tokio::select! {
                    biased;
                    _ = batch.cancelled() => break,
                    sent = tx.send(record) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            drop(tx);
        };

        let workers = (0..self.options.concurrency).map(|_| {
            let rx = rx.clone();
            let tracker = &tracker;
            let batch = &batch;
            let failure = &failure;
            async move {
                loop {
                    let next = {
                        let mut rx = rx.lock().await;
                        tokio::select! {
                            biased;
                            _ = batch.cancelled() => None,
                            record = rx.recv() => record,
                        }
                    };
                    let Some(record) = next else {
                        break;
                    };
                    if batch.is_cancelled() {
                        break;
                    }

                    if let Err(err) = self.download_with_retry(&record, tracker).await {
                        self.events.emit(LaunchEvent::DownloadError {
                            filename: record.name.clone(),
                            kind: record.kind,
                            message: err.to_string(),
                        });
                        let mut slot = failure.lock().unwrap_or_else(|p| p.into_inner());
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                        batch.cancel();
                    }
                }
            }
        });

        tokio::join!(producer, join_all(workers));

        let failure = failure.into_inner().unwrap_or_else(|p| p.into_inner());
        if let Some(err) = failure {
            return Err(err);
        }
        if batch.is_cancelled() {
            return Err(LauncherError::Cancelled(format!(
                "{} of {} files downloaded",
                tracker.snapshot().downloaded_count,
                tracker.snapshot().total_count
            )));
        }

        let state = tracker.snapshot();
        info!("Batch complete: {} files", state.downloaded_count);
        self.events.emit(LaunchEvent::DownloadEnd {
            downloaded: state.downloaded_count,
        });
        Ok(state)
    }

    /// `get_pending` followed by `download`.
    pub async fn sync(&self, records: &[FileRecord]) -> LauncherResult<SyncState> {
        let pending = self.get_pending(records).await?;
        self.download(pending).await
    }

    // ── Single file ─────────────────────────────────────

    async fn download_with_retry(
        &self,
        record: &FileRecord,
        tracker: &ProgressTracker,
    ) -> LauncherResult<()> {
        let dest = record.destination(&self.root);
        let mut last_error = String::new();

        for attempt in 1..=self.options.max_attempts {
            match self.download_once(record, &dest, tracker).await {
                Ok(()) => {
                    let state = tracker.finish_file();
                    self.events.emit(LaunchEvent::DownloadProgress {
                        state,
                        kind: record.kind,
                    });
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.options.max_attempts,
                        record.identity(),
                        err
                    );
                    last_error = err.to_string();
                    if attempt < self.options.max_attempts {
                        tokio::time::sleep(self.options.retry_delay).await;
                    }
                }
            }
        }

        Err(LauncherError::Download {
            file: record.identity(),
            attempts: self.options.max_attempts,
            reason: last_error,
        })
    }

    /// One attempt: stream into a unique sibling `.part` file, check the
    /// hash, then rename into place.
    async fn download_once(
        &self,
        record: &FileRecord,
        dest: &Path,
        tracker: &ProgressTracker,
    ) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let part = dest.with_file_name(format!("{}.{}.part", record.name, Uuid::new_v4()));
        let mut received = 0u64;

        let result = self
            .stream_to(record, &part, dest, tracker, &mut received)
            .await;

        match result {
            Ok(()) => {
                tokio::fs::rename(&part, dest)
                    .await
                    .map_err(|e| LauncherError::io(dest, e))?;
                if record.executable {
                    set_executable(dest).await?;
                }
                debug!("Downloaded: {} -> {:?}", record.url, dest);
                Ok(())
            }
            Err(err) => {
                tracker.rollback(received);
                let _ = tokio::fs::remove_file(&part).await;
                Err(err)
            }
        }
    }

    async fn stream_to(
        &self,
        record: &FileRecord,
        part: &Path,
        dest: &Path,
        tracker: &ProgressTracker,
        received: &mut u64,
    ) -> LauncherResult<()> {
        let response = self.client.get(&record.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: record.url.clone(),
                status: status.as_u16(),
            });
        }

        let mut hasher = Sha1::new();
        {
            let mut file = tokio::fs::File::create(part)
                .await
                .map_err(|e| LauncherError::io(part, e))?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(part, e))?;
                hasher.update(&chunk);
                *received += chunk.len() as u64;

                let state = tracker.record(chunk.len() as u64);
                self.events.emit(LaunchEvent::DownloadProgress {
                    state,
                    kind: record.kind,
                });
            }
            file.flush().await.map_err(|e| LauncherError::io(part, e))?;
            // Handle dropped here, before the rename.
        }

        if let Some(expected) = record.sha1.as_deref() {
            let actual = hex::encode(hasher.finalize());
            if !hash_matches(&actual, expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// A file is valid when it exists and, if a hash is expected, matches it.
async fn is_valid(dest: &Path, expected: Option<&str>) -> LauncherResult<bool> {
    if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
        return Ok(false);
    }
    match expected {
        None => Ok(true),
        Some(expected) => {
            let actual = sha1_file_async(dest).await?;
            Ok(hash_matches(&actual, expected))
        }
    }
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| LauncherError::io(path, e))
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> LauncherResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::sha1_bytes;
    use crate::core::http::build_http_client;
    use crate::core::test_support::{Route, TestServer};

    fn fast_options() -> SyncOptions {
        SyncOptions {
            retry_delay: Duration::from_millis(50),
            ..SyncOptions::default()
        }
    }

    fn record(server: &TestServer, name: &str, path: &str, body: &[u8]) -> FileRecord {
        FileRecord::new(name, path, FileKind::Library)
            .with_url(server.url(&format!("/{}{}", path, name)))
            .with_sha1(Some(sha1_bytes(body)))
            .with_size(Some(body.len() as u64))
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<LaunchEvent>) -> Vec<LaunchEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn missing_file_is_pending_then_downloaded() {
        let body = vec![7u8; 100];
        let server = TestServer::start(vec![Route::ok("/libs/a.jar", body.clone())]).await;
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            Downloader::new(build_http_client().unwrap(), dir.path(), EventSender::disabled());

        let records = vec![record(&server, "a.jar", "libs/", &body)];
        let pending = downloader.get_pending(&records).await.unwrap();
        assert_eq!(pending, records);

        let state = downloader.download(pending).await.unwrap();
        assert_eq!(state.downloaded_count, 1);
        assert_eq!(state.downloaded_bytes, 100);

        let written = std::fs::read(dir.path().join("libs/a.jar")).unwrap();
        assert_eq!(sha1_bytes(&written), sha1_bytes(&body));
    }

    #[tokio::test]
    async fn second_sync_transfers_nothing() {
        let a = b"first".to_vec();
        let b = b"second".to_vec();
        let server = TestServer::start(vec![
            Route::ok("/libs/a.jar", a.clone()),
            Route::ok("/mods/b.jar", b.clone()),
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            Downloader::new(build_http_client().unwrap(), dir.path(), EventSender::disabled());
        let records = vec![
            record(&server, "a.jar", "libs/", &a),
            record(&server, "b.jar", "mods/", &b),
        ];

        downloader.sync(&records).await.unwrap();
        assert_eq!(server.total_hits(), 2);

        let pending = downloader.get_pending(&records).await.unwrap();
        assert!(pending.is_empty());
        downloader.download(pending).await.unwrap();
        assert_eq!(server.total_hits(), 2);
    }

    #[tokio::test]
    async fn stale_file_is_pending() {
        let body = b"fresh".to_vec();
        let server = TestServer::start(vec![Route::ok("/libs/a.jar", body.clone())]).await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("libs")).unwrap();
        std::fs::write(dir.path().join("libs/a.jar"), b"stale").unwrap();

        let downloader =
            Downloader::new(build_http_client().unwrap(), dir.path(), EventSender::disabled());
        let pending = downloader
            .get_pending(&[record(&server, "a.jar", "libs/", &body)])
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn folders_and_local_records_are_never_pending() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            build_http_client().unwrap(),
            dir.path(),
            EventSender::disabled(),
        );
        let records = vec![
            FileRecord::new("", "runtime/jre/bin", FileKind::Folder),
            FileRecord::new("client-srg.jar", "libraries/net/minecraft", FileKind::Library),
        ];

        let pending = downloader.get_pending(&records).await.unwrap();
        assert!(pending.is_empty());
        assert!(dir.path().join("runtime/jre/bin").is_dir());
    }

    #[tokio::test]
    async fn exhausted_retries_surface_one_error() {
        let server = TestServer::start(vec![Route::status("/libs/broken.jar", 500)]).await;
        let dir = tempfile::tempdir().unwrap();
        let (events, mut rx) = EventSender::channel();
        let options = fast_options();
        let delay = options.retry_delay;
        let downloader = Downloader::new(build_http_client().unwrap(), dir.path(), events)
            .with_options(options);

        let broken = FileRecord::new("broken.jar", "libs/", FileKind::Library)
            .with_url(server.url("/libs/broken.jar"))
            .with_sha1(Some("0".repeat(40)));

        let err = downloader.download(vec![broken]).await.unwrap_err();
        assert_eq!(err.code(), "DOWNLOAD_ERROR");

        let hits = server.hit_times("/libs/broken.jar");
        assert_eq!(hits.len(), 5);
        for pair in hits.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= delay);
        }

        let errors = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, LaunchEvent::DownloadError { .. }))
            .count();
        assert_eq!(errors, 1);
        assert!(!dir.path().join("libs/broken.jar").exists());
    }

    #[tokio::test]
    async fn hash_mismatch_leaves_no_partial_file() {
        let server = TestServer::start(vec![Route::ok("/libs/a.jar", b"wrong".to_vec())]).await;
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            Downloader::new(build_http_client().unwrap(), dir.path(), EventSender::disabled())
                .with_options(SyncOptions {
                    max_attempts: 2,
                    ..fast_options()
                });

        let record = FileRecord::new("a.jar", "libs/", FileKind::Library)
            .with_url(server.url("/libs/a.jar"))
            .with_sha1(Some(sha1_bytes(b"right")));

        assert!(downloader.download(vec![record]).await.is_err());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("libs"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn failure_stops_new_admissions() {
        let mut routes = vec![Route::status("/libs/0.jar", 404)];
        for i in 1..40 {
            routes.push(Route::ok(&format!("/libs/{}.jar", i), vec![1u8; 10]));
        }
        let server = TestServer::start(routes).await;
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            Downloader::new(build_http_client().unwrap(), dir.path(), EventSender::disabled())
                .with_options(SyncOptions {
                    concurrency: 1,
                    max_attempts: 1,
                    ..fast_options()
                });

        let records: Vec<FileRecord> = (0..40)
            .map(|i| {
                FileRecord::new(format!("{}.jar", i), "libs/", FileKind::Library)
                    .with_url(server.url(&format!("/libs/{}.jar", i)))
            })
            .collect();

        assert!(downloader.download(records).await.is_err());
        // The failing record goes first; at most the already-queued one follows.
        assert!(server.total_hits() <= 3);
    }

    #[tokio::test]
    async fn external_cancellation_is_reported() {
        let server = TestServer::start(vec![Route::ok("/libs/a.jar", b"x".to_vec())]).await;
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let downloader =
            Downloader::new(build_http_client().unwrap(), dir.path(), EventSender::disabled())
                .with_cancellation(token);

        let record = FileRecord::new("a.jar", "libs/", FileKind::Library)
            .with_url(server.url("/libs/a.jar"));
        let err = downloader.download(vec![record]).await.unwrap_err();
        assert_eq!(err.code(), "CANCELLED");
    }
}
