//! File-system access: pickers, handles and writable streams

use crate::error::FileError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

/// Result type for file-system operations
pub type FileResult<T> = std::result::Result<T, FileError>;

/// Extensions offered by the open and save pickers
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".epub"];

/// Bytes read from a handle plus the source's modification time
#[derive(Debug, Clone, PartialEq)]
pub struct FileContents {
    pub bytes: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Answer to "persist unsaved changes first?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsavedChoice {
    Save,
    Discard,
    #[default]
    Cancel,
}

/// A location a document can be read from and written back to
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// Display name, usually the file name
    fn name(&self) -> String;

    async fn read(&self) -> FileResult<FileContents>;

    async fn open_writable(&self) -> FileResult<Box<dyn WritableFile>>;
}

/// A write stream; nothing is visible at the destination until `close`
#[async_trait]
pub trait WritableFile: Send {
    async fn write(&mut self, bytes: &[u8]) -> FileResult<()>;

    async fn close(&mut self) -> FileResult<()>;
}

/// The platform's pickers and download fallback
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Ask for a file to open; `FileError::UserCancelled` when dismissed
    async fn pick_open_target(&self, accept: &[&str]) -> FileResult<Arc<dyn FileHandle>>;

    /// Ask for a save destination
    async fn pick_save_target(
        &self,
        suggested_name: &str,
        accept: &[&str],
    ) -> FileResult<Arc<dyn FileHandle>>;

    /// Whether handles returned by the pickers can be written to later
    fn supports_persistent_handles(&self) -> bool;

    /// Hand bytes to the user directly, without a handle
    async fn download(&self, name: &str, bytes: Vec<u8>) -> FileResult<()>;

    /// Ask whether to persist the unsaved changes of `title` before replacing it
    async fn confirm_unsaved(&self, title: &str) -> UnsavedChoice;
}

fn io_error(e: std::io::Error) -> FileError {
    FileError::Io(e.to_string())
}

/// Handle on a local path
#[derive(Debug, Clone)]
pub struct LocalFileHandle {
    path: PathBuf,
}

impl LocalFileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileHandle for LocalFileHandle {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    async fn read(&self) -> FileResult<FileContents> {
        let bytes = tokio::fs::read(&self.path).await.map_err(io_error)?;
        let last_modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(FileContents { bytes, last_modified })
    }

    async fn open_writable(&self) -> FileResult<Box<dyn WritableFile>> {
        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        let file = tokio::fs::File::create(&temp_path).await.map_err(io_error)?;
        Ok(Box::new(LocalWritable {
            path: self.path.clone(),
            temp_path,
            file: Some(file),
        }))
    }
}

/// Writes into a sibling temp file, renamed over the target on close
struct LocalWritable {
    path: PathBuf,
    temp_path: PathBuf,
    file: Option<tokio::fs::File>,
}

#[async_trait]
impl WritableFile for LocalWritable {
    async fn write(&mut self, bytes: &[u8]) -> FileResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| FileError::Io("write after close".to_string()))?;
        file.write_all(bytes).await.map_err(io_error)
    }

    async fn close(&mut self) -> FileResult<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush().await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);
        tokio::fs::rename(&self.temp_path, &self.path)
            .await
            .map_err(io_error)
    }
}

/// Local file system with preset picker answers
///
/// Non-interactive front ends decide up front which file "the user picks".
/// With a download directory configured, persistent handles are reported as
/// unsupported and saves land there instead. Unsaved changes are never
/// discarded: the prompt always answers cancel.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    open_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    download_dir: Option<PathBuf>,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.open_path = Some(path.into());
        self
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl FileSystemAccess for LocalFileSystem {
    async fn pick_open_target(&self, _accept: &[&str]) -> FileResult<Arc<dyn FileHandle>> {
        match &self.open_path {
            Some(path) => Ok(Arc::new(LocalFileHandle::new(path))),
            None => Err(FileError::UserCancelled),
        }
    }

    async fn pick_save_target(
        &self,
        _suggested_name: &str,
        _accept: &[&str],
    ) -> FileResult<Arc<dyn FileHandle>> {
        match &self.save_path {
            Some(path) => Ok(Arc::new(LocalFileHandle::new(path))),
            None => Err(FileError::UserCancelled),
        }
    }

    fn supports_persistent_handles(&self) -> bool {
        self.download_dir.is_none()
    }

    async fn download(&self, name: &str, bytes: Vec<u8>) -> FileResult<()> {
        let dir = self.download_dir.as_ref().ok_or(FileError::UnsupportedPlatform)?;
        tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
        tokio::fs::write(dir.join(name), bytes).await.map_err(io_error)
    }

    async fn confirm_unsaved(&self, _title: &str) -> UnsavedChoice {
        UnsavedChoice::Cancel
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    last_modified: DateTime<Utc>,
}

type MemoryFiles = Arc<Mutex<HashMap<String, MemoryFile>>>;

/// In-memory file system (for testing)
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: MemoryFiles,
    open_target: Mutex<Option<String>>,
    save_target: Mutex<Option<String>>,
    unsaved_choice: Mutex<UnsavedChoice>,
    no_persistent_handles: bool,
    fail_writes: Arc<AtomicBool>,
    downloads: Mutex<Vec<(String, Vec<u8>)>>,
    save_prompts: Mutex<Vec<String>>,
    unsaved_prompts: Mutex<Vec<String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave like a platform where only downloads are possible
    pub fn without_persistent_handles() -> Self {
        Self {
            no_persistent_handles: true,
            ..Self::default()
        }
    }

    pub fn put(&self, name: &str, bytes: Vec<u8>, last_modified: DateTime<Utc>) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), MemoryFile { bytes, last_modified });
    }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).map(|f| f.bytes.clone())
    }

    /// Answer the next open pickers with `name`; `None` dismisses them
    pub fn set_open_target(&self, name: Option<&str>) {
        *self.open_target.lock().unwrap() = name.map(str::to_string);
    }

    /// Answer the next save pickers with `name`; `None` dismisses them
    pub fn set_save_target(&self, name: Option<&str>) {
        *self.save_target.lock().unwrap() = name.map(str::to_string);
    }

    pub fn set_unsaved_choice(&self, choice: UnsavedChoice) {
        *self.unsaved_choice.lock().unwrap() = choice;
    }

    /// Make every writable fail to open
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn downloads(&self) -> Vec<(String, Vec<u8>)> {
        self.downloads.lock().unwrap().clone()
    }

    /// Suggested names the save picker was opened with
    pub fn save_prompts(&self) -> Vec<String> {
        self.save_prompts.lock().unwrap().clone()
    }

    /// Titles the unsaved-changes prompt was shown for
    pub fn unsaved_prompts(&self) -> Vec<String> {
        self.unsaved_prompts.lock().unwrap().clone()
    }

    fn handle(&self, name: String) -> Arc<dyn FileHandle> {
        Arc::new(MemoryFileHandle {
            name,
            files: Arc::clone(&self.files),
            fail_writes: Arc::clone(&self.fail_writes),
        })
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn pick_open_target(&self, _accept: &[&str]) -> FileResult<Arc<dyn FileHandle>> {
        let name = self.open_target.lock().unwrap().clone();
        name.map(|n| self.handle(n)).ok_or(FileError::UserCancelled)
    }

    async fn pick_save_target(
        &self,
        suggested_name: &str,
        _accept: &[&str],
    ) -> FileResult<Arc<dyn FileHandle>> {
        if self.no_persistent_handles {
            return Err(FileError::UnsupportedPlatform);
        }
        self.save_prompts.lock().unwrap().push(suggested_name.to_string());
        let name = self.save_target.lock().unwrap().clone();
        name.map(|n| self.handle(n)).ok_or(FileError::UserCancelled)
    }

    fn supports_persistent_handles(&self) -> bool {
        !self.no_persistent_handles
    }

    async fn download(&self, name: &str, bytes: Vec<u8>) -> FileResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FileError::Io("download refused".to_string()));
        }
        self.downloads.lock().unwrap().push((name.to_string(), bytes));
        Ok(())
    }

    async fn confirm_unsaved(&self, title: &str) -> UnsavedChoice {
        self.unsaved_prompts.lock().unwrap().push(title.to_string());
        *self.unsaved_choice.lock().unwrap()
    }
}

struct MemoryFileHandle {
    name: String,
    files: MemoryFiles,
    fail_writes: Arc<AtomicBool>,
}

#[async_trait]
impl FileHandle for MemoryFileHandle {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn read(&self) -> FileResult<FileContents> {
        self.files
            .lock()
            .unwrap()
            .get(&self.name)
            .map(|f| FileContents {
                bytes: f.bytes.clone(),
                last_modified: Some(f.last_modified),
            })
            .ok_or_else(|| FileError::Io(format!("{} not found", self.name)))
    }

    async fn open_writable(&self) -> FileResult<Box<dyn WritableFile>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FileError::Io("disk full".to_string()));
        }
        Ok(Box::new(MemoryWritable {
            name: self.name.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }
}

struct MemoryWritable {
    name: String,
    files: MemoryFiles,
    buffer: Vec<u8>,
}

#[async_trait]
impl WritableFile for MemoryWritable {
    async fn write(&mut self, bytes: &[u8]) -> FileResult<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    async fn close(&mut self) -> FileResult<()> {
        let file = MemoryFile {
            bytes: std::mem::take(&mut self.buffer),
            last_modified: Utc::now(),
        };
        self.files.lock().unwrap().insert(self.name.clone(), file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_write_is_invisible_until_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, b"old").unwrap();
        let handle = LocalFileHandle::new(&path);

        let mut writable = handle.open_writable().await.unwrap();
        writable.write(b"new ").await.unwrap();
        writable.write(b"bytes").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"old");

        writable.close().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new bytes");
        assert!(!dir.path().join("book.epub.tmp").exists());

        let contents = handle.read().await.unwrap();
        assert_eq!(contents.bytes, b"new bytes");
        assert!(contents.last_modified.is_some());
        assert_eq!(handle.name(), "book.epub");
    }

    #[tokio::test]
    async fn test_local_pickers_without_presets_cancel() {
        let fs = LocalFileSystem::new();
        assert!(matches!(
            fs.pick_open_target(ACCEPTED_EXTENSIONS).await,
            Err(FileError::UserCancelled)
        ));
        assert!(matches!(
            fs.pick_save_target("a.epub", ACCEPTED_EXTENSIONS).await,
            Err(FileError::UserCancelled)
        ));
        assert!(fs.supports_persistent_handles());
        assert!(matches!(fs.download("a.epub", vec![]).await, Err(FileError::UnsupportedPlatform)));
        assert_eq!(fs.confirm_unsaved("Draft").await, UnsavedChoice::Cancel);
    }

    #[tokio::test]
    async fn test_local_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new().with_download_dir(dir.path().join("out"));

        assert!(!fs.supports_persistent_handles());
        fs.download("My Book.epub", b"zip".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("out/My Book.epub")).unwrap(), b"zip");
    }

    #[tokio::test]
    async fn test_memory_file_system() {
        let fs = MemoryFileSystem::new();
        fs.set_save_target(Some("a.epub"));

        let handle = fs.pick_save_target("Title.epub", ACCEPTED_EXTENSIONS).await.unwrap();
        let mut writable = handle.open_writable().await.unwrap();
        writable.write(b"abc").await.unwrap();
        assert_eq!(fs.file("a.epub"), None);
        writable.close().await.unwrap();

        assert_eq!(fs.file("a.epub"), Some(b"abc".to_vec()));
        assert_eq!(fs.save_prompts(), vec!["Title.epub"]);
        assert_eq!(handle.read().await.unwrap().bytes, b"abc");
    }
}
