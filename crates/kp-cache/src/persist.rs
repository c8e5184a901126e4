#![forbid(unsafe_code)]

//! Environment-partitioned persistence for measurement stores.
//!
//! One file holds the caches of every environment the host has profiled
//! under, as a JSON document:
//!
//! ```text
//! {
//!   "schema_version": "kernprobe.cache.v1",
//!   "kind": "cpu" | "gpu",
//!   "partitions": { "<env token>": { "file": ..., "entries": [ ... ] } }
//! }
//! ```
//!
//! `save` never rewrites the target in place: the full document is written
//! to a fresh temp file in the same directory (same filesystem), synced,
//! then renamed over the target. A crash at any point before the rename
//! leaves the previous file byte-identical; a reader of the target path can
//! never observe partial content. Concurrent saves from independent
//! processes are not coordinated — the last rename wins and the loser's
//! partition update is silently discarded (single-writer-per-file is the
//! assumed usage).

use crate::record::{CacheKind, MeasureRecord};
use crate::{CacheKey, EnvFingerprint, MeasureStore};
use kp_core::KernelSignature;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{env, fs, process};

/// Version tag of the persisted document. Bump on any layout change; files
/// carrying any other tag are rejected as a format mismatch.
pub const SCHEMA_VERSION: &str = "kernprobe.cache.v1";

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum PersistError {
    /// On-disk content does not match the expected schema or cache kind.
    /// Fatal: never silently coerced or overwritten.
    FormatMismatch { path: PathBuf, detail: String },
    /// Directory creation, read, temp-file write, or rename failed at the
    /// OS level. Not retried; for `save`, failures before the final rename
    /// leave the previous file untouched.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FormatMismatch { path, detail } => {
                write!(f, "cache format mismatch at {}: {detail}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "cache io failure at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FormatMismatch { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl PersistError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn format(path: &Path, detail: impl Into<String>) -> Self {
        Self::FormatMismatch {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}

// ── On-Disk Document ───────────────────────────────────────────────

/// Outer document, parsed in two stages: the header is validated before any
/// partition content is interpreted, so a wrong-kind file is rejected with
/// a precise error instead of a deep deserialization failure.
#[derive(Debug, Serialize, Deserialize)]
struct RawDocument {
    schema_version: String,
    kind: CacheKind,
    partitions: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, R: Serialize",
    deserialize = "S: DeserializeOwned, R: DeserializeOwned"
))]
struct PartitionSnapshot<S, R> {
    /// Path the saving store was bound to. Informational: `open` always
    /// binds to the caller-supplied path so copied files stay usable.
    file: String,
    entries: Vec<StoredEntry<S, R>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, R: Serialize",
    deserialize = "S: DeserializeOwned, R: DeserializeOwned"
))]
struct StoredEntry<S, R> {
    key: CacheKey<S>,
    record: R,
}

type PartitionMap<S, R> = BTreeMap<String, PartitionSnapshot<S, R>>;

fn read_partitions<S, R>(path: &Path, expected: CacheKind) -> Result<PartitionMap<S, R>, PersistError>
where
    S: DeserializeOwned,
    R: DeserializeOwned,
{
    let raw = fs::read(path).map_err(|err| PersistError::io(path, err))?;
    let document: RawDocument = serde_json::from_slice(&raw)
        .map_err(|err| PersistError::format(path, format!("not a cache document: {err}")))?;

    if document.schema_version != SCHEMA_VERSION {
        return Err(PersistError::format(
            path,
            format!(
                "schema {} (expected {SCHEMA_VERSION})",
                document.schema_version
            ),
        ));
    }
    if document.kind != expected {
        return Err(PersistError::format(
            path,
            format!(
                "holds a {} cache (expected {})",
                document.kind.as_str(),
                expected.as_str()
            ),
        ));
    }

    serde_json::from_value(document.partitions)
        .map_err(|err| PersistError::format(path, format!("bad partition content: {err}")))
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("cache"));
    name.push(format!(".tmp.{}", process::id()));
    target.with_file_name(name)
}

// ── Open / Save ────────────────────────────────────────────────────

impl<S, R> MeasureStore<S, R>
where
    S: KernelSignature + Serialize + DeserializeOwned,
    R: MeasureRecord + Clone + Serialize + DeserializeOwned,
{
    /// Bind a store to `path` under the given environment context.
    ///
    /// With `force_new`, or when the file does not exist, the result is a
    /// fresh empty store — on-disk content is ignored but left intact until
    /// the next `save`. Otherwise the file's partition map is parsed
    /// (mismatched schema or kind is fatal) and the partition for `env` is
    /// loaded; a valid file with no partition for this environment also
    /// yields an empty store, which is expected, not an error.
    pub fn open(
        path: impl Into<PathBuf>,
        env: &EnvFingerprint,
        force_new: bool,
    ) -> Result<Self, PersistError> {
        let path = path.into();

        if force_new || !path.exists() {
            debug!(
                "starting empty {} cache at {}",
                R::KIND.as_str(),
                path.display()
            );
            return Ok(Self::empty(path));
        }

        let mut partitions: PartitionMap<S, R> = read_partitions(&path, R::KIND)?;
        match partitions.remove(env.as_str()) {
            Some(snapshot) => {
                let entries: HashMap<CacheKey<S>, R> = snapshot
                    .entries
                    .into_iter()
                    .map(|entry| (entry.key, entry.record))
                    .collect();
                debug!(
                    "loaded {} cached measurement(s) from {} for {env}",
                    entries.len(),
                    path.display()
                );
                Ok(Self::from_entries(path, entries))
            }
            None => {
                debug!(
                    "no partition for {env} in {}, starting empty",
                    path.display()
                );
                Ok(Self::empty(path))
            }
        }
    }

    /// Persist this store into its file's partition for `env`, preserving
    /// every other environment's partition.
    ///
    /// The write path is read-modify-write with atomic replacement: the
    /// updated document lands in a temp file (named with the process id so
    /// concurrent savers cannot tear each other's temp) which is synced and
    /// renamed over the target. Safe to call repeatedly.
    pub fn save(&self, env: &EnvFingerprint) -> Result<(), PersistError> {
        let target = self.file().to_path_buf();

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                // create_dir_all treats an already-existing directory as
                // success, which keeps racing creators safe.
                fs::create_dir_all(parent).map_err(|err| PersistError::io(parent, err))?;
            }
        }

        let mut partitions: PartitionMap<S, R> = if target.exists() {
            read_partitions(&target, R::KIND)?
        } else {
            BTreeMap::new()
        };

        // Transient snapshot of the live entries; the store itself is never
        // handed to the serializer.
        let snapshot = PartitionSnapshot {
            file: target.display().to_string(),
            entries: self
                .iter()
                .map(|(key, record)| StoredEntry {
                    key: key.clone(),
                    record: record.clone(),
                })
                .collect(),
        };
        partitions.insert(env.as_str().to_owned(), snapshot);

        let document = RawDocument {
            schema_version: SCHEMA_VERSION.to_owned(),
            kind: R::KIND,
            partitions: serde_json::to_value(&partitions)
                .map_err(|err| PersistError::format(&target, err.to_string()))?,
        };
        let bytes = serde_json::to_vec(&document)
            .map_err(|err| PersistError::format(&target, err.to_string()))?;

        let tmp = temp_path(&target);
        let write_result = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()
        })();
        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp);
            return Err(PersistError::io(&tmp, err));
        }

        if let Err(err) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistError::io(&target, err));
        }

        info!(
            "saved {} measurement(s) for {env} into {}",
            self.len(),
            target.display()
        );
        Ok(())
    }
}

// ── Default Locations ──────────────────────────────────────────────

/// Directory cache files default to: `$KERNPROBE_CACHE_DIR` when set,
/// otherwise `~/.kernprobe`.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = env::var("KERNPROBE_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_owned());
    PathBuf::from(home).join(".kernprobe")
}

/// Default file for one cache kind, e.g. `~/.kernprobe/cpu_measure_cache.json`.
#[must_use]
pub fn default_cache_file(kind: CacheKind) -> PathBuf {
    default_cache_dir().join(format!("{}_measure_cache.json", kind.as_str()))
}
