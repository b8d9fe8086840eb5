//! Where saved signatures live.
//!
//! The gallery and the save pipeline only talk to [`RecordStore`], so they
//! work the same against a directory on disk and against [`MemoryStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::StoreError;
use crate::record::{self, SignatureRecord};

pub trait RecordStore {
    /// All records, most recently modified first.
    fn list_records(&self) -> Result<Vec<SignatureRecord>, StoreError>;

    /// Stores `bytes` under a new `name`. Never replaces an existing record.
    fn write_record(&mut self, name: &str, bytes: &[u8]) -> Result<SignatureRecord, StoreError>;

    fn delete_record(&mut self, id: &str) -> Result<(), StoreError>;

    fn read_record(&self, id: &str) -> Result<Vec<u8>, StoreError>;

    /// A path other programs can read the record from.
    fn locate(&self, id: &str) -> Result<PathBuf, StoreError>;
}

pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.starts_with('.')
        || id.chars().any(|c| matches!(c, '/' | '\\') || c.is_control());
    if bad {
        return Err(StoreError::InvalidId(id.to_owned()));
    }
    Ok(())
}

pub fn sort_most_recent_first(records: &mut [SignatureRecord]) {
    // names carry a sortable timestamp, which breaks mtime ties
    records.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.id.cmp(&a.id)));
}

const PARTIAL_SUFFIX: &str = ".tmp";

/// One PNG per record in a single directory.
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{name}{PARTIAL_SUFFIX}"))
    }

    /// Removes half-written records left behind by a save that never
    /// finished. Partials younger than `min_age` may belong to a save in
    /// progress elsewhere and are kept. Returns how many were removed.
    pub fn remove_stale_partials(&self, min_age: Duration) -> usize {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)) {
                continue;
            }
            let age = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            if age < min_age {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    log::info!("removed stale partial {name}");
                    removed += 1;
                }
                Err(err) => log::warn!("could not remove stale partial {name}: {err}"),
            }
        }
        removed
    }

    fn io_error(path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn existing(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        let path = self.root.join(id);
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_owned()));
        }
        Ok(path)
    }

    fn record_at(&self, id: &str, path: &Path) -> Result<SignatureRecord, StoreError> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| Self::io_error(path, source))?;
        Ok(SignatureRecord::from_file_name(id, modified))
    }
}

impl RecordStore for DirectoryStore {
    fn list_records(&self) -> Result<Vec<SignatureRecord>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            // nothing saved yet
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(Self::io_error(&self.root, source)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Self::io_error(&self.root, source))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                log::debug!("skipping non UTF-8 file name {:?}", entry.file_name());
                continue;
            };
            if name.starts_with('.') || !record::has_record_extension(&name) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    log::warn!("skipping {name}: {err}");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            records.push(SignatureRecord::from_file_name(name, modified));
        }

        sort_most_recent_first(&mut records);
        log::debug!("listed {} records in {}", records.len(), self.root.display());
        Ok(records)
    }

    fn write_record(&mut self, name: &str, bytes: &[u8]) -> Result<SignatureRecord, StoreError> {
        validate_id(name)?;
        fs::create_dir_all(&self.root).map_err(|source| Self::io_error(&self.root, source))?;

        let target = self.root.join(name);

        // write aside, then publish with a hard link: a failed save never
        // leaves a truncated PNG, and linking refuses to replace a record
        // that appeared in the meantime
        let partial = self.partial_path(name);
        let written = fs::File::create(&partial)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::hard_link(&partial, &target));

        if let Err(err) = fs::remove_file(&partial) {
            if err.kind() != io::ErrorKind::NotFound {
                log::warn!("could not remove {}: {err}", partial.display());
            }
        }
        match written {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(name.to_owned()));
            }
            Err(source) => return Err(Self::io_error(&target, source)),
        }

        log::info!("wrote {} ({} bytes)", target.display(), bytes.len());
        self.record_at(name, &target)
    }

    fn delete_record(&mut self, id: &str) -> Result<(), StoreError> {
        let path = self.existing(id)?;
        fs::remove_file(&path).map_err(|source| Self::io_error(&path, source))?;
        log::info!("deleted {}", path.display());
        Ok(())
    }

    fn read_record(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.existing(id)?;
        fs::read(&path).map_err(|source| Self::io_error(&path, source))
    }

    fn locate(&self, id: &str) -> Result<PathBuf, StoreError> {
        let path = self.existing(id)?;
        // hand out an absolute path; the receiving program has its own cwd
        fs::canonicalize(&path).map_err(|source| Self::io_error(&path, source))
    }
}

/// Keeps records in memory. Each write gets a later modification time than
/// the one before it.
#[derive(Default)]
pub struct MemoryStore {
    records: BTreeMap<String, (Vec<u8>, SystemTime)>,
    writes: u64,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, like a full or read-only disk.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

}

impl RecordStore for MemoryStore {
    fn list_records(&self) -> Result<Vec<SignatureRecord>, StoreError> {
        let mut records: Vec<SignatureRecord> = self
            .records
            .iter()
            .filter(|(id, _)| record::has_record_extension(id))
            .map(|(id, (_, modified))| SignatureRecord::from_file_name(id.as_str(), *modified))
            .collect();
        sort_most_recent_first(&mut records);
        Ok(records)
    }

    fn write_record(&mut self, name: &str, bytes: &[u8]) -> Result<SignatureRecord, StoreError> {
        validate_id(name)?;
        if self.fail_writes {
            return Err(StoreError::Io {
                path: PathBuf::from(name),
                source: io::Error::new(io::ErrorKind::StorageFull, "no space left on device"),
            });
        }
        if self.records.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_owned()));
        }
        self.writes += 1;
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(self.writes);
        self.records.insert(name.to_owned(), (bytes.to_vec(), modified));
        Ok(SignatureRecord::from_file_name(name, modified))
    }

    fn delete_record(&mut self, id: &str) -> Result<(), StoreError> {
        validate_id(id)?;
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    fn read_record(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        validate_id(id)?;
        self.records
            .get(id)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    fn locate(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        if !self.records.contains_key(id) {
            return Err(StoreError::NotFound(id.to_owned()));
        }
        Ok(Path::new("memory").join(id))
    }
}
