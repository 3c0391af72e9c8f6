//! Owned data store
//!
//! Holds the reconciled [`Dataset`] behind a single `RwLock`. Handlers
//! read through [`DataStore::read`]; every write takes the write guard,
//! mutates one table and rewrites that table's JSON file before releasing
//! it, so concurrent writers cannot lose each other's updates. Files are
//! replaced atomically (temp file + rename).
//!
//! A failed rewrite rolls the in-memory table back and surfaces as
//! [`AppError::Storage`]. Sources that failed to parse or read are never
//! rewritten until a reload loads them, so their on-disk rows survive.

use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::dataset::{
    self, email_key, AccessLog, Announcement, Dataset, Decision, LoadReport, Message, RawSources,
    SourceKind, SourceStatus,
};
use crate::errors::{AppError, Result};
use crate::metrics;

/// File backing a source, relative to the data directory.
pub fn file_for(config: &DataConfig, source: SourceKind) -> &str {
    match source {
        SourceKind::Academicians => &config.academicians_file,
        SourceKind::Projects => &config.projects_file,
        SourceKind::Matches => &config.matches_file,
        SourceKind::Decisions => &config.decisions_file,
        SourceKind::AccessLogs => &config.logs_file,
        SourceKind::Announcements => &config.announcements_file,
        SourceKind::Messages => &config.messages_file,
        SourceKind::Passwords => &config.passwords_file,
        SourceKind::WebData => &config.web_data_file,
    }
}

/// Read and parse every source. Missing or malformed files are recorded in
/// the report and skipped; this never fails.
pub async fn read_sources(config: &DataConfig) -> RawSources {
    let mut raw = RawSources::new();

    for source in SourceKind::ALL {
        let path = config.path_of(file_for(config, source));
        let status = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<Value>(text.trim_start_matches('\u{feff}')) {
                Ok(payload) => {
                    let records = payload_len(&payload);
                    raw.insert(source, payload);
                    SourceStatus::Loaded { records }
                }
                Err(e) => {
                    warn!(%source, path = %path.display(), error = %e, "Malformed JSON, skipping source");
                    metrics::record_source_failure(source, "malformed");
                    SourceStatus::Malformed { error: e.to_string() }
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(%source, path = %path.display(), "Source file missing, using empty table");
                metrics::record_source_failure(source, "missing");
                SourceStatus::Missing
            }
            Err(e) => {
                warn!(%source, path = %path.display(), error = %e, "Source file unreadable, skipping");
                metrics::record_source_failure(source, "unreadable");
                SourceStatus::Unreadable { error: e.to_string() }
            }
        };
        raw.report.record(source, status);
    }

    raw.photo_files = list_files(&config.photo_dir()).await;
    raw
}

/// Top-level record count: list length, or the summed sheet lengths of a
/// map (falling back to the number of entries).
fn payload_len(payload: &Value) -> usize {
    match payload {
        Value::Array(items) => items.len(),
        Value::Object(map) => {
            let sheet_rows: usize = map
                .values()
                .filter_map(Value::as_array)
                .map(Vec::len)
                .sum();
            if sheet_rows > 0 { sheet_rows } else { map.len() }
        }
        _ => 0,
    }
}

/// Regular file names in `dir`, sorted. A missing folder is empty.
async fn list_files(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Folder not readable");
            return names;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_file = entry
                    .file_type()
                    .await
                    .map(|t| t.is_file())
                    .unwrap_or(false);
                if is_file {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Stopped listing folder");
                break;
            }
        }
    }

    names.sort();
    names
}

/// Write `bytes` next to `path` and rename over it.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Shared, owned store for the portal's tables.
pub struct DataStore {
    config: DataConfig,
    dataset: RwLock<Dataset>,
}

impl DataStore {
    /// Load every source from disk. Never fails; see [`Dataset::build`].
    pub async fn open(config: DataConfig) -> Self {
        info!(base_dir = %config.base_dir.display(), "Loading dataset");
        let dataset = Dataset::build(read_sources(&config).await);
        metrics::record_dataset_load(&dataset.counts());
        Self::from_dataset(config, dataset)
    }

    /// Wrap an already built dataset.
    pub fn from_dataset(config: DataConfig, dataset: Dataset) -> Self {
        Self {
            config,
            dataset: RwLock::new(dataset),
        }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Dataset> {
        self.dataset.read().await
    }

    /// Rebuild every table from disk and swap it in wholesale.
    pub async fn reload(&self) -> LoadReport {
        let rebuilt = Dataset::build(read_sources(&self.config).await);
        let report = rebuilt.report().clone();
        metrics::record_dataset_load(&rebuilt.counts());

        *self.dataset.write().await = rebuilt;
        info!(degraded = report.degraded().count(), "Dataset reloaded");
        report
    }

    /// Upsert a decision keyed by (normalized name, project id). Returns
    /// `true` when an existing decision was overwritten.
    pub async fn record_decision(&self, decision: Decision) -> Result<bool> {
        self.mutate(SourceKind::Decisions, |d| &mut d.decisions, |decisions| {
            Ok(dataset::upsert_decision(decisions, decision))
        })
        .await
    }

    /// Append an announcement; returns its index.
    pub async fn post_announcement(&self, announcement: Announcement) -> Result<usize> {
        self.mutate(SourceKind::Announcements, |d| &mut d.announcements, |list| {
            list.push(announcement);
            Ok(list.len() - 1)
        })
        .await
    }

    pub async fn delete_announcement(&self, index: usize) -> Result<Announcement> {
        self.mutate(SourceKind::Announcements, |d| &mut d.announcements, |list| {
            remove_at(list, index, "announcement")
        })
        .await
    }

    /// Append a message; returns its index.
    pub async fn send_message(&self, message: Message) -> Result<usize> {
        self.mutate(SourceKind::Messages, |d| &mut d.messages, |list| {
            list.push(message);
            Ok(list.len() - 1)
        })
        .await
    }

    pub async fn delete_message(&self, index: usize) -> Result<Message> {
        self.mutate(SourceKind::Messages, |d| &mut d.messages, |list| {
            remove_at(list, index, "message")
        })
        .await
    }

    /// Store a new password for `email` once `verify` accepts the current
    /// dataset. Both run under the same writer lock.
    pub async fn set_password(
        &self,
        email: &str,
        password: &str,
        verify: impl FnOnce(&Dataset) -> Result<()>,
    ) -> Result<()> {
        let key = email_key(email);
        let password = password.to_string();
        self.mutate_checked(
            SourceKind::Passwords,
            verify,
            |d| &mut d.passwords,
            |passwords| {
                passwords.insert(key, password);
                Ok(())
            },
        )
        .await
    }

    /// Append an access log entry, keeping only the newest
    /// `max_access_logs` entries.
    pub async fn append_access_log(&self, entry: AccessLog) -> Result<()> {
        let cap = self.config.max_access_logs.max(1);
        self.mutate(SourceKind::AccessLogs, |d| &mut d.access_logs, |logs| {
            logs.push(entry);
            if logs.len() > cap {
                let overflow = logs.len() - cap;
                logs.drain(..overflow);
            }
            Ok(())
        })
        .await
    }

    /// Case-insensitive lookup of `file_name` inside one of the served
    /// image folders. Only the final path component of `file_name` is used.
    pub async fn find_image(&self, folder: &str, file_name: &str) -> Option<PathBuf> {
        if !self.config.serves_folder(folder) {
            return None;
        }
        let wanted = Path::new(file_name)
            .file_name()?
            .to_string_lossy()
            .to_lowercase();
        let dir = self.config.base_dir.join(folder);

        list_files(&dir)
            .await
            .into_iter()
            .find(|name| name.to_lowercase() == wanted)
            .map(|name| dir.join(name))
    }

    async fn mutate<T, R>(
        &self,
        source: SourceKind,
        table: fn(&mut Dataset) -> &mut T,
        apply: impl FnOnce(&mut T) -> Result<R>,
    ) -> Result<R>
    where
        T: Clone + Serialize,
    {
        self.mutate_checked(source, |_| Ok(()), table, apply).await
    }

    /// Mutate one table under the writer lock and persist it. `check` sees
    /// the dataset first and can veto the write. The table is restored when
    /// the rewrite fails.
    async fn mutate_checked<T, R>(
        &self,
        source: SourceKind,
        check: impl FnOnce(&Dataset) -> Result<()>,
        table: fn(&mut Dataset) -> &mut T,
        apply: impl FnOnce(&mut T) -> Result<R>,
    ) -> Result<R>
    where
        T: Clone + Serialize,
    {
        let mut dataset = self.dataset.write().await;
        check(&*dataset)?;
        self.ensure_writable(&*dataset, source)?;

        let slot = table(&mut *dataset);
        let backup = slot.clone();

        let outcome = apply(slot)?;

        if let Err(e) = self.persist(source, slot).await {
            *slot = backup;
            return Err(e);
        }
        Ok(outcome)
    }

    /// A source whose file exists but did not load would lose its rows on
    /// rewrite.
    fn ensure_writable(&self, dataset: &Dataset, source: SourceKind) -> Result<()> {
        match dataset.report().status_of(source) {
            Some(SourceStatus::Malformed { error } | SourceStatus::Unreadable { error }) => {
                let path = self.config.path_of(file_for(&self.config, source));
                warn!(%source, path = %path.display(), "Refusing to overwrite a source that failed to load");
                metrics::record_table_write(source, false);
                Err(AppError::Storage {
                    path: path.display().to_string(),
                    message: format!("source failed to load ({error}); fix the file and reload"),
                })
            }
            _ => Ok(()),
        }
    }

    async fn persist<T: Serialize>(&self, source: SourceKind, table: &T) -> Result<()> {
        let path = self.config.path_of(file_for(&self.config, source));
        let bytes = serde_json::to_vec_pretty(table)?;

        match write_atomic(&path, &bytes).await {
            Ok(()) => {
                metrics::record_table_write(source, true);
                debug!(%source, path = %path.display(), bytes = bytes.len(), "Table persisted");
                Ok(())
            }
            Err(e) => {
                metrics::record_table_write(source, false);
                Err(AppError::Storage {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

fn remove_at<T>(list: &mut Vec<T>, index: usize, resource_type: &str) -> Result<T> {
    if index < list.len() {
        Ok(list.remove(index))
    } else {
        Err(AppError::not_found(resource_type, index))
    }
}
