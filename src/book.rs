use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use epub::doc::EpubDoc;
use log::{debug, info, warn};

use crate::document::Document;
use crate::html_to_document::{HtmlToDocumentConverter, percent_decode};

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("chapter {index} is out of range ({count} chapters)")]
    OutOfRange { index: usize, count: usize },
    #[error("chapter {index} has no readable content")]
    MissingContent { index: usize },
}

/// Navigation entry as stored in the book, before flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: String,
    pub href: String,
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NavEntry>) -> Self {
        self.children = children;
        self
    }
}

/// Archive access the reader needs. Chapters are addressed by spine index.
pub trait ChapterSource {
    fn title(&self) -> Option<String>;
    fn chapter_count(&self) -> usize;
    /// Resource path of a spine item inside the archive.
    fn chapter_path(&self, index: usize) -> Option<String>;
    fn chapter_html(&mut self, index: usize) -> Result<String, BookError>;
    fn navigation(&self) -> Vec<NavEntry>;
}

pub struct EpubSource {
    doc: EpubDoc<BufReader<File>>,
    spine_paths: Vec<String>,
}

impl EpubSource {
    pub fn open(path: &Path) -> Result<Self, BookError> {
        let doc = EpubDoc::new(path).map_err(|e| BookError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let spine_paths = doc
            .spine
            .iter()
            .map(|item| {
                doc.resources
                    .get(&item.idref)
                    .map(|resource| resource.path.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_else(|| {
                        warn!("Spine item {} has no resource", item.idref);
                        item.idref.clone()
                    })
            })
            .collect();

        Ok(Self { doc, spine_paths })
    }
}

fn nav_entries(points: &[epub::doc::NavPoint]) -> Vec<NavEntry> {
    points
        .iter()
        .map(|point| {
            NavEntry::new(
                point.label.trim(),
                point.content.to_string_lossy().replace('\\', "/"),
            )
            .with_children(nav_entries(&point.children))
        })
        .collect()
}

impl ChapterSource for EpubSource {
    fn title(&self) -> Option<String> {
        self.doc
            .mdata("title")
            .map(|m| m.value.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn chapter_count(&self) -> usize {
        self.doc.get_num_chapters()
    }

    fn chapter_path(&self, index: usize) -> Option<String> {
        self.spine_paths.get(index).cloned()
    }

    fn chapter_html(&mut self, index: usize) -> Result<String, BookError> {
        let count = self.chapter_count();
        if !self.doc.set_current_chapter(index) {
            return Err(BookError::OutOfRange { index, count });
        }
        self.doc
            .get_current_str()
            .map(|(content, _mime)| content)
            .ok_or(BookError::MissingContent { index })
    }

    fn navigation(&self) -> Vec<NavEntry> {
        nav_entries(&self.doc.toc)
    }
}

/// Flattened table-of-contents row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub level: usize,
    pub href: String,
    /// Spine index the entry points at, when it could be resolved.
    pub chapter: Option<usize>,
}

/// Resolves a navigation href to a spine index.
///
/// Tried in order: exact path, file name, file name without query or
/// fragment, then any spine path containing the file name.
pub fn find_chapter_index(href: &str, chapter_paths: &[String]) -> Option<usize> {
    if href.is_empty() {
        return None;
    }
    let decoded = percent_decode(href);
    let without_fragment = decoded.split('#').next().unwrap_or(&decoded);
    if let Some(idx) = chapter_paths
        .iter()
        .position(|path| path == without_fragment || path.ends_with(&format!("/{without_fragment}")))
    {
        return Some(idx);
    }

    let file_name = decoded.rsplit('/').next().unwrap_or(&decoded);
    let by_name = |name: &str| {
        chapter_paths
            .iter()
            .position(|path| path.rsplit('/').next() == Some(name))
    };
    if let Some(idx) = by_name(file_name) {
        return Some(idx);
    }

    let base_name = file_name.split(['?', '#']).next().unwrap_or(file_name);
    if base_name.is_empty() {
        return None;
    }
    by_name(base_name).or_else(|| chapter_paths.iter().position(|path| path.contains(base_name)))
}

fn flatten(entries: &[NavEntry], level: usize, chapter_paths: &[String], out: &mut Vec<TocEntry>) {
    for entry in entries {
        let title = entry.label.trim();
        if !title.is_empty() {
            out.push(TocEntry {
                title: title.to_string(),
                level,
                href: entry.href.clone(),
                chapter: find_chapter_index(&entry.href, chapter_paths),
            });
        }
        flatten(&entry.children, level + 1, chapter_paths, out);
    }
}

/// Lists every spine item when the book has no usable navigation.
fn fallback_toc(chapter_paths: &[String]) -> Vec<TocEntry> {
    chapter_paths
        .iter()
        .enumerate()
        .map(|(idx, path)| TocEntry {
            title: format!(
                "Chapter {} ({})",
                idx + 1,
                path.rsplit('/').next().unwrap_or(path)
            ),
            level: 0,
            href: path.clone(),
            chapter: Some(idx),
        })
        .collect()
}

/// An open book: converted chapters, the flat table of contents and the
/// image-visibility switch that shapes conversion.
pub struct Book {
    source: Box<dyn ChapterSource>,
    path: Option<PathBuf>,
    title: String,
    toc: Vec<TocEntry>,
    show_images: bool,
    converter: HtmlToDocumentConverter,
    cache: HashMap<usize, Document>,
}

impl Book {
    pub fn open(path: &Path, show_images: bool) -> anyhow::Result<Self> {
        info!("Opening book {}", path.display());
        let source = EpubSource::open(path)?;
        let fallback_title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        let mut book = Self::from_source(Box::new(source), &fallback_title, show_images);
        book.path = Some(path.to_path_buf());
        Ok(book)
    }

    pub fn from_source(
        source: Box<dyn ChapterSource>,
        fallback_title: &str,
        show_images: bool,
    ) -> Self {
        let title = source
            .title()
            .unwrap_or_else(|| fallback_title.to_string());
        let chapter_paths: Vec<String> = (0..source.chapter_count())
            .filter_map(|idx| source.chapter_path(idx))
            .collect();

        let mut toc = Vec::new();
        flatten(&source.navigation(), 0, &chapter_paths, &mut toc);
        if toc.is_empty() {
            debug!("No navigation in {title}, listing spine items");
            toc = fallback_toc(&chapter_paths);
        }
        info!(
            "Book {title:?}: {} chapters, {} TOC entries",
            source.chapter_count(),
            toc.len()
        );

        Self {
            source,
            path: None,
            title,
            toc,
            show_images,
            converter: HtmlToDocumentConverter::new(show_images),
            cache: HashMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn chapter_count(&self) -> usize {
        self.source.chapter_count()
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    pub fn show_images(&self) -> bool {
        self.show_images
    }

    /// Switches image visibility. Returns `true` when the value changed, in
    /// which case every cached chapter is dropped.
    pub fn set_show_images(&mut self, visible: bool) -> bool {
        if self.show_images == visible {
            return false;
        }
        self.show_images = visible;
        self.converter = HtmlToDocumentConverter::new(visible);
        self.cache.clear();
        true
    }

    /// Converted chapter content. Unreadable chapters yield a placeholder
    /// document instead of an error.
    pub fn chapter(&mut self, index: usize) -> Document {
        if let Some(document) = self.cache.get(&index) {
            return document.clone();
        }
        let document = match self.source.chapter_html(index) {
            Ok(html) => self.converter.convert(&html),
            Err(e) => {
                warn!("Failed to read chapter {index}: {e}");
                return Document::unavailable(&e.to_string());
            }
        };
        self.cache.insert(index, document.clone());
        document
    }

    pub fn is_cached(&self, index: usize) -> bool {
        self.cache.contains_key(&index)
    }
}

/// Book held entirely in memory. Handy for tests and for single HTML files.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub title: Option<String>,
    pub chapters: Vec<(String, String)>,
    pub navigation: Vec<NavEntry>,
}

impl MemorySource {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn chapter(mut self, path: &str, html: &str) -> Self {
        self.chapters.push((path.to_string(), html.to_string()));
        self
    }

    pub fn nav(mut self, entry: NavEntry) -> Self {
        self.navigation.push(entry);
        self
    }
}

impl ChapterSource for MemorySource {
    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    fn chapter_path(&self, index: usize) -> Option<String> {
        self.chapters.get(index).map(|(path, _)| path.clone())
    }

    fn chapter_html(&mut self, index: usize) -> Result<String, BookError> {
        self.chapters
            .get(index)
            .map(|(_, html)| html.clone())
            .ok_or(BookError::OutOfRange {
                index,
                count: self.chapters.len(),
            })
    }

    fn navigation(&self) -> Vec<NavEntry> {
        self.navigation.clone()
    }
}
