//! Filesystem image store
//!
//! Every record lives at `{root}/{id}.png`. Uploads are streamed into a
//! temporary file in the same directory and renamed into place on commit, so
//! a reader never observes a half-written record.

use super::{ImageId, StoreError};
use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempPath;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// What the storage medium knows about one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: ImageId,
    pub size: u64,
    /// Last-modified time reported by the filesystem
    pub stored_at: DateTime<Local>,
}

impl ImageRecord {
    fn from_metadata(id: ImageId, metadata: &Metadata) -> io::Result<Self> {
        Ok(Self {
            id,
            size: metadata.len(),
            stored_at: DateTime::from(metadata.modified()?),
        })
    }
}

/// A record together with its content
#[derive(Debug)]
pub struct StoredImage {
    pub record: ImageRecord,
    pub content: Vec<u8>,
}

/// Filesystem-backed image store
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::CreateRoot {
                path: self.root.clone(),
                source,
            })
    }

    fn record_path(&self, id: &ImageId) -> PathBuf {
        self.root.join(id.file_name())
    }

    /// Start writing a new record.
    ///
    /// Nothing becomes visible under `id` until [`PendingImage::commit`].
    /// Dropping the returned value discards the partial upload.
    pub async fn create(&self, id: ImageId) -> Result<PendingImage, StoreError> {
        self.ensure_root().await?;

        let root = self.root.clone();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(".upload-")
                .suffix(".tmp")
                .tempfile_in(root)
        })
        .await
        .map_err(io::Error::other)
        .and_then(|res| res)
        .map_err(|e| StoreError::io(&self.root, e))?;

        let (file, temp_path) = named.into_parts();

        Ok(PendingImage {
            dest: self.record_path(&id),
            id,
            file: fs::File::from_std(file),
            temp_path,
            written: 0,
        })
    }

    /// Store a complete byte buffer under `id`
    pub async fn save(&self, id: ImageId, content: &[u8]) -> Result<ImageRecord, StoreError> {
        let mut pending = self.create(id).await?;
        pending.write_chunk(content).await?;
        pending.commit().await
    }

    /// Look up a record without reading its content.
    ///
    /// Returns `Ok(None)` when nothing is stored under `id`.
    pub async fn exists(&self, id: &ImageId) -> Result<Option<ImageRecord>, StoreError> {
        let path = self.record_path(id);
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => ImageRecord::from_metadata(id.clone(), &metadata)
                .map(Some)
                .map_err(|e| StoreError::io(path, e)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Read a record and its full content
    pub async fn open(&self, id: &ImageId) -> Result<Option<StoredImage>, StoreError> {
        let Some(record) = self.exists(id).await? else {
            return Ok(None);
        };

        let path = self.record_path(id);
        match fs::read(&path).await {
            Ok(content) => Ok(Some(StoredImage { record, content })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

/// An upload in progress, backed by a temporary file in the storage root
#[derive(Debug)]
pub struct PendingImage {
    id: ImageId,
    dest: PathBuf,
    file: fs::File,
    temp_path: TempPath,
    written: u64,
}

impl PendingImage {
    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| StoreError::io(&*self.temp_path, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush the upload to disk and move it to its final name.
    ///
    /// The record's modification time is set from the wall clock at commit,
    /// so `stored_at` is never earlier than the start of the upload. Its
    /// precision is whatever the filesystem keeps (nanoseconds on ext4,
    /// XFS and tmpfs).
    ///
    /// An existing record under the same id is replaced.
    pub async fn commit(self) -> Result<ImageRecord, StoreError> {
        let Self {
            id,
            dest,
            mut file,
            temp_path,
            ..
        } = self;

        file.flush()
            .await
            .map_err(|e| StoreError::io(&*temp_path, e))?;
        let file = file.into_std().await;

        let target = dest.clone();
        tokio::task::spawn_blocking(move || {
            file.set_modified(SystemTime::now())?;
            file.sync_all()?;
            drop(file);
            temp_path.persist(&target).map_err(|e| e.error)
        })
        .await
        .map_err(io::Error::other)
        .and_then(|res| res)
        .map_err(|source| StoreError::Commit {
            path: dest.clone(),
            source,
        })?;

        let metadata = fs::metadata(&dest)
            .await
            .map_err(|e| StoreError::io(&dest, e))?;
        ImageRecord::from_metadata(id, &metadata).map_err(|e| StoreError::io(dest, e))
    }
}
