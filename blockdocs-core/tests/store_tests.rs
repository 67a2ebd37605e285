//! Save and open protocols of the document store
//!
//! Every test runs against the in-memory collaborators: files, notices and the
//! recovery cache can be inspected after the fact.

use blockdocs_core::assets::MemoryFetcher;
use blockdocs_core::encoder::{EpubEncoder, Package, FIXED_LAYOUT};
use blockdocs_core::error::{BlockdocsError, ParseError};
use blockdocs_core::store::{
    store_copy, MemoryFileSystem, MemoryNotifier, MemoryRecoveryCache, NoticeLevel, RecoveryCache,
    UnsavedChoice, RECOVERED_NOTICE,
};
use blockdocs_core::{
    Block, CoverConfig, DocumentEdit, DocumentId, DocumentStore, EditOptions, SaveOutcome,
    StoreConfig,
};
use chrono::{TimeZone, Utc};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    store: DocumentStore,
    files: Arc<MemoryFileSystem>,
    notices: Arc<MemoryNotifier>,
    recovery: Arc<MemoryRecoveryCache>,
}

impl Harness {
    fn new(files: Arc<MemoryFileSystem>) -> Self {
        Self::with(files, Arc::new(MemoryRecoveryCache::new()), MemoryFetcher::new())
    }

    fn with(
        files: Arc<MemoryFileSystem>,
        recovery: Arc<MemoryRecoveryCache>,
        fetcher: MemoryFetcher,
    ) -> Self {
        let notices = Arc::new(MemoryNotifier::new());
        let store = DocumentStore::builder(StoreConfig::default())
            .file_system(files.clone())
            .notifier(notices.clone())
            .recovery_cache(recovery.clone())
            .fetcher(Arc::new(fetcher))
            .build();
        Self {
            store,
            files,
            notices,
            recovery,
        }
    }

    fn first(&self) -> DocumentId {
        self.store.document_ids().remove(0)
    }

    fn set_content(&mut self, id: &DocumentId, title: &str, content: &str) {
        self.store
            .edit(id, DocumentEdit::new().title(title).content(content), EditOptions::default())
            .unwrap();
    }
}

fn png(shade: u8) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(2, 2, image::Rgb([shade, shade, 0]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut out = Vec::new();
    zip.by_name(name).unwrap().read_to_end(&mut out).unwrap();
    out
}

fn read_text(archive: &[u8], name: &str) -> String {
    String::from_utf8(read_entry(archive, name)).unwrap()
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

fn first_image_src(blocks: &[Block]) -> Option<String> {
    blocks.iter().find_map(|block| {
        if block.is_image() {
            block.attr("src").map(str::to_string)
        } else {
            first_image_src(block.children())
        }
    })
}

/// A document saved as `name` by a throwaway store
async fn saved_file(
    files: &Arc<MemoryFileSystem>,
    name: &str,
    title: &str,
    content: &str,
) -> DocumentId {
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, title, content);
    files.set_save_target(Some(name));
    assert!(h.store.save(&id).await);
    id
}

// =============================================================================
// Save
// =============================================================================

#[tokio::test]
async fn test_saved_archive_for_a_simple_document() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Test", "<p>hello</p>");
    files.set_save_target(Some("test.epub"));

    assert!(h.store.save(&id).await);

    let archive = files.file("test.epub").unwrap();
    assert_eq!(&entry_names(&archive)[..FIXED_LAYOUT.len()], FIXED_LAYOUT);

    let content = read_text(&archive, "index.html");
    assert_eq!(content.matches("<p").count(), 1);
    assert!(content.contains("<p>hello</p>"));
    assert_eq!(
        read_text(&archive, "cover.json"),
        CoverConfig::default().to_json().unwrap()
    );
    assert_eq!(&read_entry(&archive, "cover.jpg")[..2], &[0xff, 0xd8]);
    assert!(read_text(&archive, "_package.xml").contains(&format!(">{}</dc:identifier>", id)));

    assert_eq!(files.save_prompts(), vec!["Test.epub"]);
    assert_eq!(h.store.binding(&id).as_deref(), Some("test.epub"));
    assert!(!h.store.document(&id).unwrap().is_dirty());
    assert_eq!(h.notices.messages(NoticeLevel::Success), vec!["Saved test.epub"]);
}

#[tokio::test]
async fn test_bound_document_saves_in_place() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Bound", "<p>one</p>");
    files.set_save_target(Some("bound.epub"));
    assert!(h.store.save(&id).await);

    files.set_save_target(None);
    h.set_content(&id, "Bound", "<p>two</p>");
    assert_eq!(
        h.store.try_save(&id).await.unwrap(),
        SaveOutcome::Saved { name: "bound.epub".to_string() }
    );

    assert_eq!(files.save_prompts().len(), 1);
    let archive = files.file("bound.epub").unwrap();
    assert!(read_text(&archive, "index.html").contains("<p>two</p>"));
}

#[tokio::test]
async fn test_dismissed_picker_changes_nothing() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Draft", "<p>draft</p>");

    assert_eq!(h.store.try_save(&id).await.unwrap(), SaveOutcome::Cancelled);
    assert!(!h.store.save(&id).await);

    assert!(h.store.document(&id).unwrap().is_dirty());
    assert!(!h.store.is_bound(&id));
    assert_eq!(h.files.save_prompts().len(), 2);
    assert!(h.notices.notices().is_empty());
}

#[tokio::test]
async fn test_download_when_handles_are_unsupported() {
    let files = Arc::new(MemoryFileSystem::without_persistent_handles());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Offline", "<p>x</p>");

    assert_eq!(h.store.save_label(), "Download");
    assert!(h.store.save(&id).await);

    let downloads = files.downloads();
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].0, "Offline.epub");
    assert_eq!(read_text(&downloads[0].1, "mimetype"), "application/epub+zip");
    assert!(!h.store.is_bound(&id));
    assert!(!h.store.document(&id).unwrap().is_dirty());
    assert_eq!(h.notices.messages(NoticeLevel::Success), vec!["Downloaded Offline.epub"]);
}

#[tokio::test]
async fn test_failed_write_leaves_document_dirty() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Doc", "<p>saved</p>");
    files.set_save_target(Some("doc.epub"));
    assert!(h.store.save(&id).await);

    h.set_content(&id, "Doc", "<p>unsaved</p>");
    files.set_fail_writes(true);
    assert!(!h.store.save(&id).await);

    let doc = h.store.document(&id).unwrap();
    assert!(doc.is_dirty());
    assert_eq!(doc.content, "<p>unsaved</p>");
    assert_eq!(h.notices.messages(NoticeLevel::Success).len(), 1);
    assert_eq!(h.notices.messages(NoticeLevel::Error).len(), 1);
    assert!(read_text(&files.file("doc.epub").unwrap(), "index.html").contains("<p>saved</p>"));
}

#[tokio::test]
async fn test_unreachable_image_aborts_save() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Broken", r#"<figure><img src="https://img.test/missing.png" /></figure>"#);
    files.set_save_target(Some("broken.epub"));

    let err = h.store.try_save(&id).await.unwrap_err();
    assert!(matches!(err, BlockdocsError::Asset(_)));
    assert!(!h.store.save(&id).await);

    assert!(files.save_prompts().is_empty());
    assert_eq!(files.file("broken.epub"), None);
    assert!(h.store.document(&id).unwrap().is_dirty());
    assert!(h.notices.messages(NoticeLevel::Success).is_empty());
}

#[tokio::test]
async fn test_missing_cover_font_aborts_save() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    let mut cover = CoverConfig::default();
    cover.font_url = Some("https://fonts.test/missing.ttf".to_string());
    h.store
        .edit(&id, DocumentEdit::new().cover(cover), EditOptions::default())
        .unwrap();
    files.set_save_target(Some("font.epub"));

    let err = h.store.try_save(&id).await.unwrap_err();
    assert!(matches!(err, BlockdocsError::Asset(_)));
    assert!(!h.store.save(&id).await);

    assert_eq!(files.file("font.epub"), None);
    assert!(h.store.binding(&id).is_none());
    assert!(h.store.document(&id).unwrap().is_dirty());
    assert_eq!(h.notices.messages(NoticeLevel::Error).len(), 1);
    assert!(h.notices.messages(NoticeLevel::Success).is_empty());
}

#[tokio::test]
async fn test_zero_font_size_still_saves() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    let cover = CoverConfig::from_json(r#"{"fontSize": 0}"#).unwrap();
    h.store
        .edit(&id, DocumentEdit::new().title("Tiny").cover(cover), EditOptions::default())
        .unwrap();
    files.set_save_target(Some("tiny.epub"));

    assert!(h.store.save(&id).await);
    let archive = files.file("tiny.epub").unwrap();
    assert_eq!(&read_entry(&archive, "cover.jpg")[..2], &[0xff, 0xd8]);
    // the stored config is written back untouched
    let stored = CoverConfig::from_json(&read_text(&archive, "cover.json")).unwrap();
    assert_eq!(stored.font_size, 0.0);
}

#[tokio::test]
async fn test_image_registered_before_unrelated_edits_is_saved() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let first = h.first();
    let second = h.store.new_document(Some("Other"));
    let url = h.store.register_image(png(5), "png");

    h.store
        .edit(&second, DocumentEdit::new().title("Other, renamed"), EditOptions::default())
        .unwrap();
    h.set_content(&first, "Pictures", &format!(r#"<figure><img src="{}" /></figure>"#, url));
    files.set_save_target(Some("pictures.epub"));

    assert!(h.store.save(&first).await);
    let archive = files.file("pictures.epub").unwrap();
    let assets: Vec<String> = entry_names(&archive)
        .into_iter()
        .skip(FIXED_LAYOUT.len())
        .collect();
    assert_eq!(assets.len(), 1);
    assert_eq!(read_entry(&archive, &assets[0]), png(5));
}

#[tokio::test]
async fn test_remote_images_become_assets() {
    let files = Arc::new(MemoryFileSystem::new());
    let fetcher = MemoryFetcher::new().with("https://img.test/a.png", png(9));
    let mut h = Harness::with(files.clone(), Arc::new(MemoryRecoveryCache::new()), fetcher);
    let id = h.first();
    h.set_content(&id, "Remote", r#"<figure><img src="https://img.test/a.png" /></figure>"#);
    files.set_save_target(Some("remote.epub"));
    assert!(h.store.save(&id).await);

    let archive = files.file("remote.epub").unwrap();
    let assets: Vec<String> = entry_names(&archive)
        .into_iter()
        .skip(FIXED_LAYOUT.len())
        .collect();
    assert_eq!(assets.len(), 1);
    assert!(assets[0].ends_with(".png"));
    assert_eq!(read_entry(&archive, &assets[0]), png(9));
    assert!(read_text(&archive, "index.html").contains(&format!(r#"src="{}""#, assets[0])));
    // the stored document still points at the remote image
    assert!(h.store.document(&id).unwrap().content.contains("https://img.test/a.png"));
}

#[tokio::test]
async fn test_odd_file_name_warns() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "What? Now", "<p>x</p>");
    files.set_save_target(Some("what.epub"));

    assert!(h.store.save(&id).await);
    let warnings = h.notices.messages(NoticeLevel::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("What? Now.epub"));
}

// =============================================================================
// Open
// =============================================================================

#[tokio::test]
async fn test_open_restores_a_saved_document() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    let url = h.store.register_image(png(200), "png");
    let cover = CoverConfig::default()
        .with_background("linear-gradient(#336699, #ffffff)")
        .with_color("#ffffff");
    h.store
        .edit(
            &id,
            DocumentEdit::new()
                .title("Round Trip")
                .author(Some("Ann Author".to_string()))
                .content(format!(
                    r#"<!-- wp:heading --><h1>Intro</h1><!-- /wp:heading -->{}"#,
                    format!(r#"<figure><img src="{}" /></figure>"#, url)
                ))
                .cover(cover.clone()),
            EditOptions::default(),
        )
        .unwrap();
    files.set_save_target(Some("round.epub"));
    assert!(h.store.save(&id).await);

    let mut other = Harness::new(files.clone());
    files.set_open_target(Some("round.epub"));
    assert_eq!(other.store.open().await, Some(id.clone()));

    let doc = other.store.document(&id).unwrap();
    assert_eq!(doc.title, "Round Trip");
    assert_eq!(doc.author.as_deref(), Some("Ann Author"));
    assert_eq!(doc.language.as_deref(), Some("en"));
    assert_eq!(doc.cover, cover);
    assert!(!doc.is_dirty());
    assert!(doc.content.starts_with(r#"<!-- wp:heading --><h1 id="intro">Intro</h1>"#));

    let src = first_image_src(&doc.blocks).unwrap();
    assert!(src.starts_with("blob:"));
    assert_eq!(other.store.ephemeral().resolve(&src).as_deref(), Some(&png(200)));
    assert_eq!(other.store.binding(&id).as_deref(), Some("round.epub"));
    assert!(!other.store.can_undo());
}

#[tokio::test]
async fn test_resave_is_stable() {
    let files = Arc::new(MemoryFileSystem::new());
    let content = "<h1>Intro</h1><h2>Chapter One!</h2><p>text</p>";
    let id = saved_file(&files, "stable.epub", "Stable", content).await;

    let mut h = Harness::new(files.clone());
    files.set_open_target(Some("stable.epub"));
    assert_eq!(h.store.open().await, Some(id.clone()));

    assert!(h.store.save(&id).await);
    let first = files.file("stable.epub").unwrap();
    assert!(h.store.save(&id).await);
    let second = files.file("stable.epub").unwrap();

    let without_modified = |xml: String| -> String {
        xml.lines()
            .filter(|line| !line.contains("dcterms:modified"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    for name in ["index.html", "_nav.html"] {
        assert_eq!(read_text(&first, name), read_text(&second, name));
    }
    assert_eq!(
        without_modified(read_text(&first, "_package.xml")),
        without_modified(read_text(&second, "_package.xml"))
    );
    assert_eq!(entry_names(&first), entry_names(&second));
}

#[tokio::test]
async fn test_missing_descriptor_is_rejected() {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    zip.start_file("mimetype", options).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("index.html", options).unwrap();
    zip.write_all(b"<html><body><p>orphan</p></body></html>").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let files = Arc::new(MemoryFileSystem::new());
    files.put("orphan.epub", bytes, Utc::now());
    files.set_open_target(Some("orphan.epub"));
    let mut h = Harness::new(files.clone());
    let before = h.store.document_ids();

    let err = h.store.try_open().await.unwrap_err();
    assert!(matches!(err, BlockdocsError::Parse(ParseError::MissingMetadata(_))));
    assert_eq!(h.store.open().await, None);

    assert_eq!(h.store.document_ids(), before);
    assert_eq!(h.notices.messages(NoticeLevel::Error).len(), 1);
}

#[tokio::test]
async fn test_non_archive_is_rejected() {
    let files = Arc::new(MemoryFileSystem::new());
    files.put("notes.txt", b"just text".to_vec(), Utc::now());
    files.set_open_target(Some("notes.txt"));
    let mut h = Harness::new(files.clone());

    assert_eq!(h.store.open().await, None);
    let errors = h.notices.messages(NoticeLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Parse error: Not a recognized document"));
}

#[tokio::test]
async fn test_dismissed_open_picker_is_silent() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());

    assert_eq!(h.store.open().await, None);
    assert!(h.notices.notices().is_empty());
}

#[tokio::test]
async fn test_empty_body_gets_a_default_block() {
    let id = DocumentId::from("empty-doc");
    let archive = EpubEncoder::new()
        .encode_to_vec(&Package {
            id: &id,
            title: "Empty",
            author: None,
            language: "fr",
            body: "",
            nav: &[],
            assets: &Default::default(),
            cover: &CoverConfig::default(),
            cover_jpeg: &[0xff, 0xd8, 0xff, 0xd9],
        })
        .unwrap();

    let files = Arc::new(MemoryFileSystem::new());
    files.put("empty.epub", archive, Utc::now());
    files.set_open_target(Some("empty.epub"));
    let mut h = Harness::new(files.clone());

    assert_eq!(h.store.open().await, Some(id.clone()));
    let doc = h.store.document(&id).unwrap();
    assert_eq!(doc.blocks, vec![Block::element("p")]);
    assert_eq!(doc.language.as_deref(), Some("fr"));
}

#[tokio::test]
async fn test_unsaved_changes_cancel_the_open() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Mine", "<p>first</p>");
    files.set_save_target(Some("mine.epub"));
    assert!(h.store.save(&id).await);

    h.set_content(&id, "Mine (edited)", "<p>second</p>");
    files.set_open_target(Some("mine.epub"));
    files.set_unsaved_choice(UnsavedChoice::Cancel);

    assert_eq!(h.store.open().await, None);
    assert_eq!(files.unsaved_prompts(), vec!["Mine (edited)"]);
    assert_eq!(h.store.document(&id).unwrap().content, "<p>second</p>");
    assert!(h.store.can_undo());
}

#[tokio::test]
async fn test_unsaved_changes_discarded_on_open() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Mine", "<p>first</p>");
    files.set_save_target(Some("mine.epub"));
    assert!(h.store.save(&id).await);

    h.set_content(&id, "Mine", "<p>second</p>");
    files.set_open_target(Some("mine.epub"));
    files.set_unsaved_choice(UnsavedChoice::Discard);

    assert_eq!(h.store.open().await, Some(id.clone()));
    let doc = h.store.document(&id).unwrap();
    assert_eq!(doc.content, "<p>first</p>");
    assert!(!doc.is_dirty());
    assert!(!h.store.can_undo());
    assert!(!h.store.can_redo());
}

#[tokio::test]
async fn test_unsaved_changes_saved_before_open() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Mine", "<p>first</p>");
    files.set_save_target(Some("mine.epub"));
    assert!(h.store.save(&id).await);

    h.set_content(&id, "Mine", "<p>second</p>");
    files.set_open_target(Some("mine.epub"));
    files.set_unsaved_choice(UnsavedChoice::Save);

    assert_eq!(h.store.open().await, Some(id.clone()));
    assert_eq!(h.store.document(&id).unwrap().content, "<p>second</p>");
    assert!(read_text(&files.file("mine.epub").unwrap(), "index.html").contains("<p>second</p>"));
}

// =============================================================================
// Recovery
// =============================================================================

#[tokio::test]
async fn test_newer_recovery_copy_is_applied() {
    let files = Arc::new(MemoryFileSystem::new());
    let id = saved_file(&files, "r.epub", "Recover", "<p>on disk</p>").await;
    let bytes = files.file("r.epub").unwrap();
    files.put("r.epub", bytes, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());

    let recovery = Arc::new(MemoryRecoveryCache::new());
    store_copy(recovery.as_ref(), &id, "<p>in progress</p>", Utc::now())
        .await
        .unwrap();

    let mut h = Harness::with(files.clone(), recovery, MemoryFetcher::new());
    files.set_open_target(Some("r.epub"));
    assert_eq!(h.store.open().await, Some(id.clone()));

    let doc = h.store.document(&id).unwrap();
    assert_eq!(doc.content, "<p>in progress</p>");
    assert!(doc.is_dirty());
    assert_eq!(h.notices.messages(NoticeLevel::Warning), vec![RECOVERED_NOTICE]);

    // applied outside history
    assert!(!h.store.can_undo());
    assert!(!h.store.undo());
    assert_eq!(h.store.document(&id).unwrap().content, "<p>in progress</p>");
}

#[tokio::test]
async fn test_older_recovery_copy_is_ignored() {
    let files = Arc::new(MemoryFileSystem::new());
    let id = saved_file(&files, "r.epub", "Recover", "<p>on disk</p>").await;

    let recovery = Arc::new(MemoryRecoveryCache::new());
    store_copy(
        recovery.as_ref(),
        &id,
        "<p>stale</p>",
        Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap(),
    )
    .await
    .unwrap();

    let mut h = Harness::with(files.clone(), recovery, MemoryFetcher::new());
    files.set_open_target(Some("r.epub"));
    assert_eq!(h.store.open().await, Some(id.clone()));

    assert_eq!(h.store.document(&id).unwrap().content, "<p>on disk</p>");
    assert!(h.notices.messages(NoticeLevel::Warning).is_empty());
}

#[tokio::test]
async fn test_recovery_copy_is_cleared_by_save() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files.clone());
    let id = h.first();
    h.set_content(&id, "Draft", "<p>draft</p>");

    h.store.persist_recovery(&id).await.unwrap();
    assert_eq!(h.recovery.get(id.as_str()).await.unwrap(), "<p>draft</p>");
    assert!(h.recovery.get(&format!("{}:last-write", id)).await.is_ok());

    files.set_save_target(Some("draft.epub"));
    assert!(h.store.save(&id).await);
    assert!(h.recovery.get(id.as_str()).await.is_err());
}

// =============================================================================
// Export
// =============================================================================

#[tokio::test]
async fn test_export_uses_pasted_images() {
    let files = Arc::new(MemoryFileSystem::new());
    let mut h = Harness::new(files);
    let id = h.first();
    let url = h.store.register_image(png(77), "png");
    h.set_content(
        &id,
        "Export",
        &format!(r#"<p>Hello</p><figure><img src="{}" /></figure>"#, url),
    );

    let docx = h.store.export_docx(&id).await.unwrap();
    assert_eq!(&docx[..2], b"PK");
    assert!(read_text(&docx, "word/document.xml").contains("Hello"));
}
