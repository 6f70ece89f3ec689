use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bridge::scroll::ScrollRatio;

/// Reading position saved per book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub chapter: usize,
    /// Relative position within the chapter, so it survives reflow.
    #[serde(default)]
    pub scroll_ratio: ScrollRatio,
    pub last_read: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub total_chapters: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Bookmarks {
    books: HashMap<String, Bookmark>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl Bookmarks {
    pub fn ephemeral() -> Self {
        Self {
            books: HashMap::new(),
            file_path: None,
        }
    }

    pub fn with_file(file_path: &Path) -> Self {
        Self {
            books: HashMap::new(),
            file_path: Some(file_path.to_path_buf()),
        }
    }

    pub fn load_or_ephemeral(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load bookmarks from {}: {}", path.display(), e);
                Self::with_file(path)
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn load_from_file(file_path: &Path) -> anyhow::Result<Self> {
        if file_path.exists() {
            let content = fs::read_to_string(file_path)?;
            let mut bookmarks: Self = serde_json::from_str(&content)?;
            bookmarks.file_path = Some(file_path.to_path_buf());
            Ok(bookmarks)
        } else {
            Ok(Self::with_file(file_path))
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_bookmark(&self, book: &str) -> Option<&Bookmark> {
        self.books.get(book)
    }

    pub fn get_most_recent(&self) -> Option<(String, &Bookmark)> {
        self.books
            .iter()
            .max_by_key(|(_, bookmark)| bookmark.last_read)
            .map(|(path, bookmark)| (path.clone(), bookmark))
    }

    pub fn update_bookmark(
        &mut self,
        book: &str,
        chapter: usize,
        scroll_ratio: ScrollRatio,
        total_chapters: usize,
    ) {
        self.books.insert(
            book.to_string(),
            Bookmark {
                chapter,
                scroll_ratio,
                last_read: chrono::Utc::now(),
                total_chapters,
            },
        );
        if let Err(e) = self.save() {
            log::error!("Failed to save bookmark: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bookmarks_persist_ratio() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookmarks.json");

        let mut bookmarks = Bookmarks::with_file(&path);
        bookmarks.update_bookmark("/books/a.epub", 3, ScrollRatio::new(0.42), 12);

        let reloaded = Bookmarks::load_or_ephemeral(Some(&path));
        let bookmark = reloaded.get_bookmark("/books/a.epub").unwrap();
        assert_eq!(bookmark.chapter, 3);
        assert_eq!(bookmark.scroll_ratio, ScrollRatio::new(0.42));
        assert_eq!(bookmark.total_chapters, 12);
    }

    #[test]
    fn most_recent_wins() {
        let mut bookmarks = Bookmarks::ephemeral();
        bookmarks.update_bookmark("first.epub", 0, ScrollRatio::TOP, 1);
        std::thread::sleep(std::time::Duration::from_millis(5));
        bookmarks.update_bookmark("second.epub", 1, ScrollRatio::TOP, 2);

        let (path, bookmark) = bookmarks.get_most_recent().unwrap();
        assert_eq!(path, "second.epub");
        assert_eq!(bookmark.chapter, 1);
    }

    #[test]
    fn hand_edited_ratio_is_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookmarks.json");
        fs::write(
            &path,
            r#"{"books":{"x.epub":{"chapter":2,"scroll_ratio":4.5,"last_read":"2024-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();

        let bookmarks = Bookmarks::load_or_ephemeral(Some(&path));
        let bookmark = bookmarks.get_bookmark("x.epub").unwrap();
        assert_eq!(bookmark.scroll_ratio, ScrollRatio::BOTTOM);
        assert_eq!(bookmark.total_chapters, 0);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookmarks.json");
        fs::write(&path, "not json").unwrap();

        let bookmarks = Bookmarks::load_or_ephemeral(Some(&path));
        assert!(bookmarks.is_empty());
    }
}
