//! Filesystem-backed resource store.
//!
//! [`FileResourceStore`] maps `/` to a configured root directory and any
//! other path to `root + path`. A resource is a regular file; its version
//! is the file's modification time in milliseconds. Filesystems may round
//! that timestamp, which is why writes re-read the version they persisted.

use std::fs::{self, File, Metadata};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use metahub_types::{Version, ABSENT_VERSION};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::lock::PathLocks;
use crate::path::{self, ROOT};
use crate::traits::{Resource, ResourceStore};

/// Prefix of in-flight temporary files. Listings skip them.
const TEMP_PREFIX: &str = ".metahub-";

/// Largest step tried when re-stamping a version the filesystem rounded down.
const MAX_RESTAMP_STEP_MS: Version = 10_000;

/// Resource store over a local (or mounted shared) directory tree.
#[derive(Debug)]
pub struct FileResourceStore {
    root: PathBuf,
    locks: PathLocks,
}

impl FileResourceStore {
    /// Open a store rooted at an existing directory.
    ///
    /// Fails with [`StoreError::RootNotFound`] if `root` does not exist or is
    /// not a directory.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = std::path::absolute(root.as_ref())?;
        if !root.is_dir() {
            return Err(StoreError::RootNotFound(root));
        }
        info!(root = %root.display(), "file resource store opened");
        Ok(Self {
            root,
            locks: PathLocks::default(),
        })
    }

    /// The absolute root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, resource_path: &str) -> PathBuf {
        if resource_path == ROOT {
            self.root.clone()
        } else {
            self.root.join(resource_path.trim_start_matches('/'))
        }
    }

    /// Version of a leaf resource, or `None` if there is none at `path`.
    fn version_of(&self, resource_path: &str) -> StoreResult<Option<Version>> {
        match fs::metadata(self.file(resource_path)) {
            Ok(meta) if meta.is_file() => Ok(Some(modified_millis(&meta)?)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write content and stamp the version. Caller holds the path's stripe.
    fn write_locked(&self, resource_path: &str, content: &[u8], version: Version) -> StoreResult<()> {
        let target = self.file(resource_path);
        if target.is_dir() {
            return Err(StoreError::invalid_path(resource_path, "path is a directory"));
        }
        let parent = target
            .parent()
            .ok_or_else(|| StoreError::invalid_path(resource_path, "no parent directory"))?;
        fs::create_dir_all(parent)?;

        // Write into a sibling temp file and rename over the target, so a
        // reader sees either the old resource or the new one.
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.as_file()
            .set_modified(UNIX_EPOCH + Duration::from_millis(version))?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Read back the persisted version of a resource just written, re-stamping
    /// it with growing steps until it lands strictly above `floor`. Caller
    /// holds the path's stripe.
    fn advance_past(&self, resource_path: &str, floor: Version) -> StoreResult<Version> {
        let target = self.file(resource_path);
        let mut step: Version = 1;
        loop {
            let effective = self.version_of(resource_path)?.unwrap_or(ABSENT_VERSION);
            if effective > floor {
                return Ok(effective);
            }
            if step > MAX_RESTAMP_STEP_MS {
                return Err(StoreError::Io(io::Error::other(format!(
                    "{}: modification time stuck at {effective}, cannot advance past {floor}",
                    target.display()
                ))));
            }
            File::options()
                .write(true)
                .open(&target)?
                .set_modified(UNIX_EPOCH + Duration::from_millis(floor.saturating_add(step)))?;
            step *= 10;
        }
    }
}

fn modified_millis(meta: &Metadata) -> StoreResult<Version> {
    let modified = meta.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Version)
        .unwrap_or(ABSENT_VERSION))
}

impl ResourceStore for FileResourceStore {
    fn list(&self, folder: &str) -> StoreResult<Option<Vec<String>>> {
        path::validate(folder)?;
        let dir = self.file(folder);
        if !dir.is_dir() {
            return Ok(None);
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut children = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            children.push(path::child(folder, &name));
        }
        children.sort();
        Ok(Some(children))
    }

    fn exists(&self, resource_path: &str) -> StoreResult<bool> {
        path::validate_resource(resource_path)?;
        Ok(self.version_of(resource_path)?.is_some())
    }

    fn get(&self, resource_path: &str) -> StoreResult<Option<Resource>> {
        path::validate_resource(resource_path)?;
        let location = self.file(resource_path);
        let mut file = match File::open(&location) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %location.display(), "resource not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        // Content and version come from the same handle, so a concurrent
        // rename cannot pair new content with an old version.
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Ok(None);
        }
        let mut content = Vec::with_capacity(meta.len() as usize);
        file.read_to_end(&mut content)?;
        Ok(Some(Resource::new(content, modified_millis(&meta)?)))
    }

    fn get_version(&self, resource_path: &str) -> StoreResult<Version> {
        path::validate_resource(resource_path)?;
        Ok(self.version_of(resource_path)?.unwrap_or(ABSENT_VERSION))
    }

    fn put(&self, resource_path: &str, content: &[u8], version: Version) -> StoreResult<()> {
        path::validate_resource(resource_path)?;
        let _guard = self.locks.lock(resource_path);
        self.write_locked(resource_path, content, version)?;
        debug!(path = resource_path, version, bytes = content.len(), "resource put");
        Ok(())
    }

    fn check_and_put(
        &self,
        resource_path: &str,
        content: &[u8],
        expected_old: Version,
        new_version: Version,
    ) -> StoreResult<Version> {
        path::validate_resource(resource_path)?;
        let _guard = self.locks.lock(resource_path);

        let current = self.version_of(resource_path)?;
        let matches = match current {
            Some(found) => found == expected_old,
            None => expected_old == ABSENT_VERSION,
        };
        if !matches {
            return Err(StoreError::Conflict {
                path: resource_path.to_string(),
                expected: expected_old,
                found: current.unwrap_or(ABSENT_VERSION),
            });
        }

        let floor = current.unwrap_or(ABSENT_VERSION);
        self.write_locked(resource_path, content, new_version.max(floor.saturating_add(1)))?;

        // Some filesystems lose precision on the requested timestamp.
        let effective = self.advance_past(resource_path, floor)?;
        debug!(
            path = resource_path,
            expected_old,
            requested = new_version,
            effective,
            "resource check-and-put"
        );
        Ok(effective)
    }

    fn delete(&self, resource_path: &str) -> StoreResult<()> {
        path::validate_resource(resource_path)?;
        let _guard = self.locks.lock(resource_path);
        let location = self.file(resource_path);
        if !location.is_file() {
            return Ok(());
        }
        match fs::remove_file(&location) {
            Ok(()) => {
                debug!(path = resource_path, "resource deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn readable_path(&self, resource_path: &str) -> String {
        self.file(resource_path).display().to_string()
    }
}
