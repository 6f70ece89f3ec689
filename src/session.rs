//! Host-side dispatcher for page-turn actions.
//!
//! The session tracks the logical chapter, the reading-mode flag and the
//! one load that is allowed to complete. Every navigation allocates a new
//! [`LoadId`]; completions carrying any other id are stale and dropped
//! along with the ratio captured for them.

use log::{debug, info};

use crate::bridge::PageAction;
use crate::bridge::scroll::ScrollRatio;
use crate::surface::LoadId;

/// A load the host must issue to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub id: LoadId,
    pub chapter: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingLoad {
    id: LoadId,
    chapter: usize,
    restore: Option<ScrollRatio>,
}

/// What to do once the surface reports a load as complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// Apply this ratio before the next frame.
    Restore(ScrollRatio),
    /// Leave the new content at the top.
    Fresh,
    /// Superseded by a newer navigation; ignore.
    Stale,
}

#[derive(Debug)]
pub struct ReadingSession {
    reading_mode: bool,
    current_chapter: usize,
    chapter_count: usize,
    next_load: u64,
    pending: Option<PendingLoad>,
}

impl ReadingSession {
    pub fn new(chapter_count: usize, current_chapter: usize, reading_mode: bool) -> Self {
        Self {
            reading_mode,
            current_chapter: current_chapter.min(chapter_count.saturating_sub(1)),
            chapter_count,
            next_load: 0,
            pending: None,
        }
    }

    pub fn reading_mode(&self) -> bool {
        self.reading_mode
    }

    pub fn set_reading_mode(&mut self, enabled: bool) {
        if self.reading_mode != enabled {
            info!("Reading mode {}", if enabled { "on" } else { "off" });
        }
        self.reading_mode = enabled;
    }

    pub fn toggle_reading_mode(&mut self) -> bool {
        self.set_reading_mode(!self.reading_mode);
        self.reading_mode
    }

    /// Logical chapter: the target of the latest navigation, even if its
    /// content has not arrived yet.
    pub fn current_chapter(&self) -> usize {
        self.current_chapter
    }

    pub fn chapter_count(&self) -> usize {
        self.chapter_count
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Entry point for actions arriving over the bridge. Ignored while
    /// reading mode is off. `capture` is only called when a navigation
    /// actually happens.
    pub fn handle_action(
        &mut self,
        action: PageAction,
        capture: impl FnOnce() -> ScrollRatio,
    ) -> Option<Navigation> {
        if !self.reading_mode {
            debug!("Ignoring {action:?}: reading mode is off");
            return None;
        }
        self.navigate(action, capture)
    }

    /// Moves one chapter regardless of reading mode. Out-of-range moves are
    /// silent no-ops.
    pub fn navigate(
        &mut self,
        action: PageAction,
        capture: impl FnOnce() -> ScrollRatio,
    ) -> Option<Navigation> {
        let target = match action {
            PageAction::NextChapter => self
                .current_chapter
                .checked_add(1)
                .filter(|next| *next < self.chapter_count),
            PageAction::PreviousChapter => self.current_chapter.checked_sub(1),
        };
        let Some(target) = target else {
            debug!(
                "{action:?} out of range at chapter {}/{}",
                self.current_chapter + 1,
                self.chapter_count
            );
            return None;
        };
        let ratio = capture();
        Some(self.begin_load(target, Some(ratio)))
    }

    /// Jumps to `chapter`. With `restore` set, that ratio is applied once
    /// the chapter is loaded; otherwise it opens at the top.
    pub fn goto_chapter(
        &mut self,
        chapter: usize,
        restore: Option<ScrollRatio>,
    ) -> Option<Navigation> {
        if chapter >= self.chapter_count {
            debug!("Chapter {chapter} out of range ({})", self.chapter_count);
            return None;
        }
        Some(self.begin_load(chapter, restore))
    }

    /// Reloads the current chapter, e.g. after a display setting changed.
    pub fn reload(&mut self, ratio: ScrollRatio) -> Option<Navigation> {
        if self.chapter_count == 0 {
            return None;
        }
        Some(self.begin_load(self.current_chapter, Some(ratio)))
    }

    fn begin_load(&mut self, chapter: usize, restore: Option<ScrollRatio>) -> Navigation {
        self.next_load += 1;
        let id = LoadId(self.next_load);
        if let Some(previous) = self.pending.replace(PendingLoad {
            id,
            chapter,
            restore,
        }) {
            debug!("{:?} superseded by {id:?}", previous.id);
        }
        self.current_chapter = chapter;
        debug!("Load {id:?}: chapter {chapter}, restore {restore:?}");
        Navigation { id, chapter }
    }

    /// Called when the surface reports `id` as loaded.
    pub fn content_loaded(&mut self, id: LoadId) -> LoadOutcome {
        match self.pending {
            Some(pending) if pending.id == id => {
                self.pending = None;
                debug!("Chapter {} ready", pending.chapter);
                match pending.restore {
                    Some(ratio) => LoadOutcome::Restore(ratio),
                    None => LoadOutcome::Fresh,
                }
            }
            _ => {
                debug!("Discarding stale completion {id:?}");
                LoadOutcome::Stale
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(value: f64) -> impl FnOnce() -> ScrollRatio {
        move || ScrollRatio::new(value)
    }

    #[test]
    fn actions_ignored_when_reading_mode_is_off() {
        let mut session = ReadingSession::new(5, 2, false);
        let mut captured = false;
        let nav = session.handle_action(PageAction::NextChapter, || {
            captured = true;
            ScrollRatio::TOP
        });
        assert_eq!(nav, None);
        assert!(!captured);
        assert_eq!(session.current_chapter(), 2);
    }

    #[test]
    fn out_of_range_is_a_silent_no_op() {
        let mut first = ReadingSession::new(3, 0, true);
        assert_eq!(first.handle_action(PageAction::PreviousChapter, ratio(0.3)), None);

        let mut last = ReadingSession::new(3, 2, true);
        assert_eq!(last.handle_action(PageAction::NextChapter, ratio(0.3)), None);
        assert!(!last.is_loading());
    }

    #[test]
    fn navigation_restores_captured_ratio() {
        let mut session = ReadingSession::new(4, 1, true);
        let nav = session
            .handle_action(PageAction::PreviousChapter, ratio(0.25))
            .unwrap();
        assert_eq!(nav.chapter, 0);
        assert!(session.is_loading());
        assert_eq!(
            session.content_loaded(nav.id),
            LoadOutcome::Restore(ScrollRatio::new(0.25))
        );
        assert!(!session.is_loading());
    }

    #[test]
    fn rapid_turns_land_two_chapters_ahead() {
        let mut session = ReadingSession::new(10, 3, true);
        let first = session.handle_action(PageAction::NextChapter, ratio(0.4)).unwrap();
        let second = session.handle_action(PageAction::NextChapter, ratio(0.7)).unwrap();

        assert_eq!(first.chapter, 4);
        assert_eq!(second.chapter, 5);
        assert_ne!(first.id, second.id);
        assert_eq!(session.current_chapter(), 5);

        assert_eq!(session.content_loaded(first.id), LoadOutcome::Stale);
        assert_eq!(
            session.content_loaded(second.id),
            LoadOutcome::Restore(ScrollRatio::new(0.7))
        );
    }

    #[test]
    fn completion_is_consumed_once() {
        let mut session = ReadingSession::new(2, 0, true);
        let nav = session.goto_chapter(1, None).unwrap();
        assert_eq!(session.content_loaded(nav.id), LoadOutcome::Fresh);
        assert_eq!(session.content_loaded(nav.id), LoadOutcome::Stale);
    }

    #[test]
    fn goto_and_reload() {
        let mut session = ReadingSession::new(3, 0, false);
        assert_eq!(session.goto_chapter(3, None), None);

        let jump = session.goto_chapter(2, None).unwrap();
        assert_eq!(jump.chapter, 2);

        let reload = session.reload(ScrollRatio::new(0.5)).unwrap();
        assert_eq!(reload.chapter, 2);
        assert_eq!(session.content_loaded(jump.id), LoadOutcome::Stale);
        assert_eq!(
            session.content_loaded(reload.id),
            LoadOutcome::Restore(ScrollRatio::new(0.5))
        );
    }

    #[test]
    fn navigate_ignores_reading_mode() {
        let mut session = ReadingSession::new(3, 0, false);
        let nav = session.navigate(PageAction::NextChapter, ratio(0.0)).unwrap();
        assert_eq!(nav.chapter, 1);
    }

    #[test]
    fn toggle_reading_mode() {
        let mut session = ReadingSession::new(3, 0, false);
        assert!(session.toggle_reading_mode());
        assert!(session.reading_mode());
        assert!(!session.toggle_reading_mode());
    }

    #[test]
    fn empty_book_has_nowhere_to_go() {
        let mut session = ReadingSession::new(0, 0, true);
        assert_eq!(session.handle_action(PageAction::NextChapter, ratio(0.0)), None);
        assert_eq!(session.reload(ScrollRatio::TOP), None);
    }
}
