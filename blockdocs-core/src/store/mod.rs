//! The document store
//!
//! Owns every open [`Document`], the shared undo/redo history, file bindings
//! and ephemeral image references, and runs the save and open protocols
//! against the file-system, notifier and recovery collaborators.

mod file;
mod history;
mod notify;
mod recovery;

pub use file::{
    FileContents, FileHandle, FileResult, FileSystemAccess, LocalFileHandle, LocalFileSystem,
    MemoryFileSystem, UnsavedChoice, WritableFile, ACCEPTED_EXTENSIONS,
};
pub use history::{Change, ChangeRecord, Direction, FieldDiff, UndoManager};
pub use notify::{MemoryNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use recovery::{
    clear_copy, content_key, last_write_key, load_copy, store_copy, LocalRecoveryCache,
    MemoryRecoveryCache, RecoveredCopy, RecoveryCache, StorageResult,
};

use crate::assets::{
    collect_refs, collect_refs_in_markup, extract_assets, inline_assets, AssetFetcher,
    AssetResolver, EphemeralStore, HttpFetcher,
};
use crate::config::StoreConfig;
use crate::content::{ContentService, HtmlContentService};
use crate::cover::{cover_image, CoverRenderer};
use crate::decoder::{DecodedPackage, EpubDecoder};
use crate::encoder::{EpubEncoder, Package};
use crate::error::{BlockdocsError, FileError, Result};
use crate::export::DocxExporter;
use crate::types::{assign_anchors, Block, CoverConfig, Document, DocumentId, DocumentStatus};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Warning shown when content newer than the opened file was recovered
pub const RECOVERED_NOTICE: &str = "Recovered unsaved changes. Undo to discard.";

/// Field updates for one document; unset fields are left alone
///
/// When both `blocks` and `content` are set, `blocks` wins and `content` is
/// re-serialized from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentEdit {
    title: Option<String>,
    author: Option<Option<String>>,
    content: Option<String>,
    blocks: Option<Vec<Block>>,
    cover: Option<CoverConfig>,
}

impl DocumentEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.author = Some(author);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = Some(blocks);
        self
    }

    pub fn cover(mut self, cover: CoverConfig) -> Self {
        self.cover = Some(cover);
        self
    }
}

/// How an edit interacts with history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOptions {
    /// Push a change record (and clear redo)
    pub record: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self { record: true }
    }
}

impl EditOptions {
    /// Apply without touching the undo or redo stacks
    pub fn untracked() -> Self {
        Self { record: false }
    }
}

/// Result of a save that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written through a file handle, now bound to the document
    Saved { name: String },
    /// Handed to the user as a download; the document stays unbound
    Downloaded { name: String },
    /// The save picker was dismissed
    Cancelled,
}

/// Builder for [`DocumentStore`]; unset collaborators get the local defaults
pub struct StoreBuilder {
    config: StoreConfig,
    content: Option<Arc<dyn ContentService>>,
    files: Option<Arc<dyn FileSystemAccess>>,
    notifier: Option<Arc<dyn Notifier>>,
    recovery: Option<Arc<dyn RecoveryCache>>,
    fetcher: Option<Arc<dyn AssetFetcher>>,
    encoder: EpubEncoder,
}

impl StoreBuilder {
    pub fn content_service(mut self, content: Arc<dyn ContentService>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn file_system(mut self, files: Arc<dyn FileSystemAccess>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn recovery_cache(mut self, recovery: Arc<dyn RecoveryCache>) -> Self {
        self.recovery = Some(recovery);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn encoder(mut self, encoder: EpubEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Build the store with one fresh document in it
    pub fn build(self) -> DocumentStore {
        let config = self.config;
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher::new(config.http_timeout())));
        let recovery = self
            .recovery
            .unwrap_or_else(|| Arc::new(LocalRecoveryCache::new(config.recovery_dir.clone())));

        let mut store = DocumentStore {
            documents: HashMap::new(),
            bindings: HashMap::new(),
            history: UndoManager::new(),
            ephemeral: EphemeralStore::new(),
            content: self.content.unwrap_or_else(|| Arc::new(HtmlContentService::new())),
            files: self.files.unwrap_or_else(|| Arc::new(LocalFileSystem::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            recovery,
            fetcher,
            encoder: self.encoder,
            decoder: EpubDecoder::new(),
            renderer: None,
            config,
        };
        store.new_document(None);
        store
    }
}

/// Registry of open documents with shared history
pub struct DocumentStore {
    config: StoreConfig,
    documents: HashMap<DocumentId, Document>,
    bindings: HashMap<DocumentId, Arc<dyn FileHandle>>,
    history: UndoManager,
    ephemeral: EphemeralStore,
    content: Arc<dyn ContentService>,
    files: Arc<dyn FileSystemAccess>,
    notifier: Arc<dyn Notifier>,
    recovery: Arc<dyn RecoveryCache>,
    fetcher: Arc<dyn AssetFetcher>,
    encoder: EpubEncoder,
    decoder: EpubDecoder,
    renderer: Option<CoverRenderer>,
}

impl DocumentStore {
    /// Store with local collaborators
    pub fn new(config: StoreConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: StoreConfig) -> StoreBuilder {
        StoreBuilder {
            config,
            content: None,
            files: None,
            notifier: None,
            recovery: None,
            fetcher: None,
            encoder: EpubEncoder::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Add an empty document (one default block); not recorded in history
    pub fn new_document(&mut self, title: Option<&str>) -> DocumentId {
        let mut document = Document::new(title.unwrap_or(&self.config.default_title));
        document.blocks = vec![self.content.create_default_block()];
        document.content = self.content.serialize(&document.blocks);

        let id = document.id.clone();
        tracing::debug!("Created document {}", id);
        self.documents.insert(id.clone(), document);
        id
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Ids of every open document, sorted
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self.documents.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Name of the file a document is bound to
    pub fn binding(&self, id: &DocumentId) -> Option<String> {
        self.bindings.get(id).map(|handle| handle.name())
    }

    pub fn is_bound(&self, id: &DocumentId) -> bool {
        self.bindings.contains_key(id)
    }

    /// Label of the save action on this platform
    pub fn save_label(&self) -> &'static str {
        if self.files.supports_persistent_handles() {
            "Save"
        } else {
            "Download"
        }
    }

    pub fn ephemeral(&self) -> &EphemeralStore {
        &self.ephemeral
    }

    /// Make image bytes referenceable from content; returns the `blob:` URL
    pub fn register_image(&mut self, data: Vec<u8>, suffix: &str) -> String {
        self.ephemeral.register(data, suffix).url()
    }

    /// Edit one document
    pub fn edit(
        &mut self,
        id: &DocumentId,
        edit: DocumentEdit,
        options: EditOptions,
    ) -> Result<()> {
        self.edit_many(vec![(id.clone(), edit)], options)
    }

    /// Edit several documents as one undoable step
    ///
    /// Unchanged fields are not recorded; an edit that changes nothing leaves
    /// history (including redo) untouched.
    pub fn edit_many(
        &mut self,
        edits: Vec<(DocumentId, DocumentEdit)>,
        options: EditOptions,
    ) -> Result<()> {
        if let Some((missing, _)) = edits.iter().find(|(id, _)| !self.documents.contains_key(id)) {
            return Err(BlockdocsError::UnknownDocument(missing.clone()));
        }

        let mut changes = Vec::new();
        for (id, edit) in edits {
            for diff in self.diff(&id, edit) {
                self.apply(&id, &diff, Direction::Redo);
                changes.push((id.clone(), diff));
            }
        }
        if changes.is_empty() {
            return Ok(());
        }

        if options.record {
            self.history.push(ChangeRecord::new(changes));
        }
        self.sweep_ephemeral();
        Ok(())
    }

    /// Revert the most recent record; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.history.undo().cloned() else {
            return false;
        };
        for (id, diff) in record.ordered(Direction::Undo) {
            self.apply(id, diff, Direction::Undo);
        }
        true
    }

    /// Re-apply the most recently undone record
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.history.redo().cloned() else {
            return false;
        };
        for (id, diff) in record.ordered(Direction::Redo) {
            self.apply(id, diff, Direction::Redo);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn diff(&self, id: &DocumentId, edit: DocumentEdit) -> Vec<FieldDiff> {
        let Some(doc) = self.documents.get(id) else {
            return Vec::new();
        };
        let mut diffs = Vec::new();

        if let Some(title) = edit.title.filter(|t| *t != doc.title) {
            diffs.push(FieldDiff::Title(Change::new(doc.title.clone(), title)));
        }
        if let Some(author) = edit.author.filter(|a| *a != doc.author) {
            diffs.push(FieldDiff::Author(Change::new(doc.author.clone(), author)));
        }
        if let Some(cover) = edit.cover.filter(|c| *c != doc.cover) {
            diffs.push(FieldDiff::Cover(Change::new(doc.cover.clone(), cover)));
        }
        match (edit.blocks, edit.content) {
            (Some(blocks), _) if blocks != doc.blocks => {
                diffs.push(FieldDiff::Blocks(Change::new(doc.blocks.clone(), blocks)));
            }
            (None, Some(content)) if content != doc.content => {
                diffs.push(FieldDiff::Content(Change::new(doc.content.clone(), content)));
            }
            _ => {}
        }
        diffs
    }

    /// Set one side of a diff and refresh the derived field
    fn apply(&mut self, id: &DocumentId, diff: &FieldDiff, direction: Direction) {
        let content = Arc::clone(&self.content);
        let Some(doc) = self.documents.get_mut(id) else {
            return;
        };

        match diff {
            FieldDiff::Title(change) => doc.title = change.side(direction).clone(),
            FieldDiff::Author(change) => doc.author = change.side(direction).clone(),
            FieldDiff::Cover(change) => doc.cover = change.side(direction).clone(),
            FieldDiff::Blocks(change) => {
                doc.blocks = change.side(direction).clone();
                doc.content = content.serialize(&doc.blocks);
            }
            FieldDiff::Content(change) => {
                doc.content = change.side(direction).clone();
                doc.blocks = content.parse(&doc.content);
            }
        }
        doc.status = DocumentStatus::Dirty;
    }

    /// Release ephemeral references no document or history record mentions
    fn sweep_ephemeral(&mut self) {
        if self.ephemeral.is_empty() {
            return;
        }

        let mut live = HashSet::new();
        for doc in self.documents.values() {
            collect_refs(&doc.blocks, &mut live);
        }
        for diff in self.history.diffs() {
            match diff {
                FieldDiff::Blocks(change) => {
                    collect_refs(&change.from, &mut live);
                    collect_refs(&change.to, &mut live);
                }
                FieldDiff::Content(change) => {
                    collect_refs_in_markup(&change.from, &mut live);
                    collect_refs_in_markup(&change.to, &mut live);
                }
                _ => {}
            }
        }

        let released = self.ephemeral.retain_live(&live);
        if released > 0 {
            tracing::debug!("Released {} ephemeral reference(s)", released);
        }
    }

    /// Save a document, reporting any failure through the notifier
    ///
    /// Returns whether the document was persisted.
    pub async fn save(&mut self, id: &DocumentId) -> bool {
        match self.try_save(id).await {
            Ok(SaveOutcome::Cancelled) => false,
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Saving {} failed: {}", id, e);
                self.notifier.error(&format!("Could not save: {}", e));
                false
            }
        }
    }

    /// Save protocol; on error nothing about the document has changed
    pub async fn try_save(&mut self, id: &DocumentId) -> Result<SaveOutcome> {
        let doc = self
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| BlockdocsError::UnknownDocument(id.clone()))?;
        let bytes = self.package(&doc).await?;

        let outcome = match self.bindings.get(id).cloned() {
            Some(handle) => {
                write_through(handle.as_ref(), &bytes).await?;
                SaveOutcome::Saved { name: handle.name() }
            }
            None => {
                let suggested = doc.suggested_file_name();
                if !is_portable_file_name(&suggested) {
                    self.notifier.warning(&format!(
                        "\"{}\" contains characters that may not be valid in a file name",
                        suggested
                    ));
                }

                let picked = if self.files.supports_persistent_handles() {
                    self.files.pick_save_target(&suggested, ACCEPTED_EXTENSIONS).await
                } else {
                    Err(FileError::UnsupportedPlatform)
                };
                match picked {
                    Ok(handle) => {
                        write_through(handle.as_ref(), &bytes).await?;
                        let name = handle.name();
                        self.bindings.insert(id.clone(), handle);
                        SaveOutcome::Saved { name }
                    }
                    Err(FileError::UnsupportedPlatform) => {
                        self.files.download(&suggested, bytes).await?;
                        SaveOutcome::Downloaded { name: suggested }
                    }
                    Err(FileError::UserCancelled) => return Ok(SaveOutcome::Cancelled),
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if let Some(doc) = self.documents.get_mut(id) {
            doc.status = DocumentStatus::Clean;
        }
        if let Err(e) = clear_copy(self.recovery.as_ref(), id).await {
            tracing::warn!("Could not clear recovery copy of {}: {}", id, e);
        }
        self.sweep_ephemeral();

        match &outcome {
            SaveOutcome::Saved { name } => {
                tracing::info!("Saved {} to {}", id, name);
                self.notifier.success(&format!("Saved {}", name));
            }
            SaveOutcome::Downloaded { name } => {
                tracing::info!("Downloaded {} as {}", id, name);
                self.notifier.success(&format!("Downloaded {}", name));
            }
            SaveOutcome::Cancelled => {}
        }
        Ok(outcome)
    }

    /// Build the archive for a document without touching store state
    pub async fn package(&mut self, doc: &Document) -> Result<Vec<u8>> {
        let mut blocks = doc.blocks.clone();
        let nav = assign_anchors(&mut blocks);

        let fetcher = Arc::clone(&self.fetcher);
        let resolver = AssetResolver::new(&self.ephemeral, fetcher.as_ref());
        let extracted = extract_assets(&blocks, &resolver).await?;
        let body = self.content.serialize(&extracted.blocks);

        let cover_jpeg = cover_image(
            &mut self.renderer,
            &doc.title,
            doc.author.as_deref(),
            &doc.cover,
            &resolver,
        )
        .await?;

        let package = Package {
            id: &doc.id,
            title: &doc.title,
            author: doc.author.as_deref(),
            language: doc.language.as_deref().unwrap_or(&self.config.language),
            body: &body,
            nav: &nav,
            assets: &extracted.assets,
            cover: &doc.cover,
            cover_jpeg: &cover_jpeg,
        };
        tracing::debug!(
            "Packaging {} with {} asset(s) and {} nav entries",
            doc.id,
            extracted.assets.len(),
            nav.len()
        );
        Ok(self.encoder.encode_to_vec(&package)?)
    }

    /// Pick a file and open it, reporting any failure through the notifier
    pub async fn open(&mut self) -> Option<DocumentId> {
        match self.try_open().await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Opening failed: {}", e);
                self.notifier.error(&e.to_string());
                None
            }
        }
    }

    /// Open protocol; `Ok(None)` when the user backed out
    pub async fn try_open(&mut self) -> Result<Option<DocumentId>> {
        let handle = match self.files.pick_open_target(ACCEPTED_EXTENSIONS).await {
            Ok(handle) => handle,
            Err(FileError::UserCancelled) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.open_handle(handle).await
    }

    /// Open a specific file
    ///
    /// The file is read and decoded before anything changes. When it replaces
    /// a document with unsaved changes, the file-system collaborator decides
    /// whether to save it first, discard, or cancel the open.
    pub async fn open_handle(&mut self, handle: Arc<dyn FileHandle>) -> Result<Option<DocumentId>> {
        let mut contents = handle.read().await?;
        let mut decoded = self.decoder.decode(&contents.bytes)?;

        if let Some(existing) = self.documents.get(&decoded.id).filter(|d| d.is_dirty()) {
            let title = existing.title.clone();
            match self.files.confirm_unsaved(&title).await {
                UnsavedChoice::Save => {
                    if self.try_save(&decoded.id).await? == SaveOutcome::Cancelled {
                        return Ok(None);
                    }
                    // the save may have rewritten the file being opened
                    contents = handle.read().await?;
                    decoded = self.decoder.decode(&contents.bytes)?;
                }
                UnsavedChoice::Discard => {}
                UnsavedChoice::Cancel => return Ok(None),
            }
        }

        let DecodedPackage {
            id,
            metadata,
            mut blocks,
            cover,
            assets,
        } = decoded;

        inline_assets(&mut blocks, &assets, &mut self.ephemeral);
        if !blocks.iter().any(|b| b.name().is_some()) {
            blocks.push(self.content.create_default_block());
        }

        let document = Document {
            id: id.clone(),
            title: metadata
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| self.config.default_title.clone()),
            author: metadata.creator,
            language: metadata.language,
            content: self.content.serialize(&blocks),
            blocks,
            cover,
            status: DocumentStatus::Clean,
        };

        self.documents.insert(id.clone(), document);
        self.history.forget(&id);
        tracing::info!("Opened {} from {}", id, handle.name());
        self.bindings.insert(id.clone(), handle);
        self.sweep_ephemeral();

        self.reconcile_recovery(&id, contents.last_modified).await;
        Ok(Some(id))
    }

    /// Apply a cached copy written after the source was last modified
    ///
    /// The copy is applied as an unrecorded edit; history for the document was
    /// cleared by the open and stays empty. A source without a modification
    /// time is trusted as is.
    async fn reconcile_recovery(
        &mut self,
        id: &DocumentId,
        source_modified: Option<DateTime<Utc>>,
    ) {
        let copy = match load_copy(self.recovery.as_ref(), id).await {
            Ok(Some(copy)) => copy,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Could not read recovery copy of {}: {}", id, e);
                return;
            }
        };

        let newer = source_modified.is_some_and(|modified| copy.written_at > modified);
        if !newer {
            tracing::debug!("Recovery copy of {} is older than the file", id);
            return;
        }

        let edit = DocumentEdit::new().content(copy.content);
        match self.edit(id, edit, EditOptions::untracked()) {
            Ok(()) if self.document(id).is_some_and(Document::is_dirty) => {
                tracing::warn!("Recovered unsaved changes for {}", id);
                self.notifier.warning(RECOVERED_NOTICE);
            }
            Ok(()) => {}
            Err(e) => tracing::warn!("Could not apply recovery copy of {}: {}", id, e),
        }
    }

    /// Write the current content of a document to the recovery cache
    pub async fn persist_recovery(&self, id: &DocumentId) -> Result<()> {
        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| BlockdocsError::UnknownDocument(id.clone()))?;
        store_copy(self.recovery.as_ref(), id, &doc.content, Utc::now()).await?;
        Ok(())
    }

    /// Export a document's content as a `.docx` package
    pub async fn export_docx(&self, id: &DocumentId) -> Result<Vec<u8>> {
        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| BlockdocsError::UnknownDocument(id.clone()))?;
        let resolver = AssetResolver::new(&self.ephemeral, self.fetcher.as_ref());
        DocxExporter::new(&resolver).export(&doc.content).await
    }
}

async fn write_through(handle: &dyn FileHandle, bytes: &[u8]) -> Result<()> {
    let mut writable = handle.open_writable().await?;
    writable.write(bytes).await?;
    writable.close().await?;
    Ok(())
}

/// Whether a file name only uses `[A-Za-z0-9 ._-]`
pub fn is_portable_file_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
}
