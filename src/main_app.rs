use crate::book::Book;
use crate::bookmark::Bookmarks;
use crate::bridge::classifier::RawPointerEvent;
use crate::bridge::scroll::{ScrollRatio, apply_ratio, capture_ratio};
use crate::bridge::{self, HostBridge, PageAction, PageScript};
use crate::event_source::EventSource;
use crate::notification::{NotificationLevel, StatusLine};
use crate::session::{LoadOutcome, Navigation, ReadingSession};
use crate::settings::SettingsStore;
use crate::surface::{ContentSurface, LayoutOptions, SurfaceEvent, SurfaceHandle};
use crate::table_of_contents::TableOfContents;
use crate::theme::ThemeId;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, error, info};
use ratatui::{
    Frame, Terminal,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const TOC_WIDTH: u16 = 32;
const WHEEL_ROWS: i64 = 3;
const LINE_SPACING_STEP: f32 = 0.1;
const PARAGRAPH_SPACING_STEP: f32 = 0.2;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    Toc,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
struct Areas {
    toc: Option<Rect>,
    content: Rect,
    status: Rect,
}

pub struct App {
    book: Option<Book>,
    session: ReadingSession,
    surface: ContentSurface,
    surface_handle: SurfaceHandle,
    page_script: PageScript,
    host_bridge: HostBridge,
    toc: TableOfContents,
    pub focused_panel: FocusedPanel,
    settings: SettingsStore,
    bookmarks: Bookmarks,
    status: StatusLine,
    areas: Areas,
    screen: Rect,
    context_menus_prevented: u64,
}

impl App {
    pub fn new(settings: SettingsStore, bookmarks: Bookmarks) -> Self {
        let (surface, surface_handle) = ContentSurface::new();
        let (page_bridge, host_bridge) = bridge::channel();
        let reading_mode = settings.get().reading_mode;

        Self {
            book: None,
            session: ReadingSession::new(0, 0, reading_mode),
            surface,
            surface_handle,
            page_script: PageScript::new(page_bridge),
            host_bridge,
            toc: TableOfContents::new(),
            focused_panel: FocusedPanel::Content,
            settings,
            bookmarks,
            status: StatusLine::default(),
            areas: Areas::default(),
            screen: Rect::default(),
            context_menus_prevented: 0,
        }
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn session(&self) -> &ReadingSession {
        &self.session
    }

    pub fn surface(&self) -> &ContentSurface {
        &self.surface
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.current().map(|n| n.message.as_str())
    }

    /// Secondary clicks whose default menu the page script prevented.
    pub fn context_menus_prevented(&self) -> u64 {
        self.context_menus_prevented
    }

    pub fn set_reading_mode(&mut self, enabled: bool) {
        self.session.set_reading_mode(enabled);
    }

    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let book = Book::open(path, self.settings.get().show_images)?;
        self.open_book(book);
        Ok(())
    }

    /// Makes `book` current, resuming from its bookmark when there is one.
    pub fn open_book(&mut self, book: Book) {
        self.save_bookmark();

        let saved = book
            .path()
            .and_then(|path| self.bookmarks.get_bookmark(&bookmark_key(path)))
            .filter(|bookmark| bookmark.chapter < book.chapter_count())
            .map(|bookmark| (bookmark.chapter, bookmark.scroll_ratio));

        if let Some(path) = book.path() {
            let path = path.to_path_buf();
            self.settings.update(|s| s.last_opened = Some(path));
        }

        info!("Opened {:?} ({} chapters)", book.title(), book.chapter_count());
        self.status.info(format!("Opened {}", book.title()));
        self.session = ReadingSession::new(book.chapter_count(), 0, self.session.reading_mode());
        self.toc = TableOfContents::new();
        self.book = Some(book);

        let navigation = match saved {
            Some((chapter, ratio)) => self.session.goto_chapter(chapter, Some(ratio)),
            None => self.session.goto_chapter(0, None),
        };
        if let Some(navigation) = navigation {
            self.issue_load(navigation);
        }
    }

    /// Reopens the book read most recently.
    pub fn reopen_last(&mut self) {
        let last = self.settings.get().last_opened.clone().or_else(|| {
            self.bookmarks
                .get_most_recent()
                .map(|(path, _)| PathBuf::from(path))
        });
        let Some(path) = last else {
            self.status.warn("No recently opened book");
            return;
        };
        if let Err(e) = self.open_path(&path) {
            error!("Failed to reopen {}: {e:#}", path.display());
            self.status.error(format!("Failed to open {}", path.display()));
        }
    }

    fn issue_load(&mut self, navigation: Navigation) {
        let Some(book) = self.book.as_mut() else {
            return;
        };
        let document = book.chapter(navigation.chapter);
        self.surface_handle
            .load(navigation.id, document, self.settings.get().layout_options());
        self.toc.follow_chapter(book.toc(), navigation.chapter);
    }

    fn navigate(&mut self, action: PageAction) {
        let surface = &self.surface;
        if let Some(navigation) = self.session.navigate(action, || capture_ratio(surface)) {
            self.issue_load(navigation);
        }
    }

    fn goto_chapter(&mut self, chapter: usize) {
        if let Some(navigation) = self.session.goto_chapter(chapter, None) {
            self.issue_load(navigation);
        }
    }

    /// Reloads the current chapter at the same relative position.
    fn reload_current(&mut self) {
        let ratio = capture_ratio(&self.surface);
        if let Some(navigation) = self.session.reload(ratio) {
            self.issue_load(navigation);
        }
    }

    /// Runs queued bridge actions and finished loads. Returns true when
    /// anything changed on screen.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;

        for action in self.host_bridge.pending_actions() {
            let surface = &self.surface;
            if let Some(navigation) = self
                .session
                .handle_action(action, || capture_ratio(surface))
            {
                self.issue_load(navigation);
                changed = true;
            }
        }

        if let Some(SurfaceEvent::Loaded { id }) = self.surface.process_commands() {
            changed = true;
            match self.session.content_loaded(id) {
                LoadOutcome::Restore(ratio) => {
                    let offset = apply_ratio(&mut self.surface, ratio);
                    debug!("Restored ratio {:.3} at row {offset}", ratio.value());
                    self.save_bookmark();
                }
                LoadOutcome::Fresh => self.save_bookmark(),
                LoadOutcome::Stale => {}
            }
        }

        changed
    }

    fn save_bookmark(&mut self) {
        let Some(book) = &self.book else {
            return;
        };
        let Some(path) = book.path() else {
            return;
        };
        let ratio = if self.session.is_loading() {
            ScrollRatio::TOP
        } else {
            capture_ratio(&self.surface)
        };
        self.bookmarks.update_bookmark(
            &bookmark_key(path),
            self.session.current_chapter(),
            ratio,
            book.chapter_count(),
        );
    }

    /// Drains outstanding work and persists state before exit.
    pub fn shutdown(&mut self) {
        self.pump();
        self.save_bookmark();
        self.settings.save();
    }

    fn toc_visible(&self) -> bool {
        self.book.is_some() && self.settings.get().toc_visible
    }

    /// Recomputes panel areas for a screen of the given size.
    pub fn resize(&mut self, screen: Rect) {
        self.screen = screen;
        let [main, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(screen);

        let (toc, content) = if self.toc_visible() {
            let [toc, content] =
                Layout::horizontal([Constraint::Length(TOC_WIDTH), Constraint::Min(1)])
                    .areas(main);
            (Some(toc), content)
        } else {
            (None, main)
        };

        self.areas = Areas {
            toc,
            content,
            status,
        };
        self.surface.set_area(content);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if self.focused_panel == FocusedPanel::Toc && self.handle_toc_key(key) {
            return None;
        }

        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('r') if ctrl => self.reopen_last(),
            KeyCode::Tab => self.toggle_focus(),
            KeyCode::Char('m') => self.toggle_reading_mode(),
            KeyCode::Char('t') => self.toggle_toc(),
            KeyCode::Char('i') => self.toggle_images(),
            KeyCode::Char('c') if !ctrl => self.cycle_theme(),
            KeyCode::Char('d') if ctrl => self.scroll_half_page(1),
            KeyCode::Char('u') if ctrl => self.scroll_half_page(-1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_half_page(1),
            KeyCode::PageUp => self.scroll_half_page(-1),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_rows(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_rows(-1),
            KeyCode::Char('l') | KeyCode::Right => self.navigate(PageAction::NextChapter),
            KeyCode::Char('h') | KeyCode::Left => self.navigate(PageAction::PreviousChapter),
            KeyCode::Home => self.goto_chapter(0),
            KeyCode::End => {
                let last = self.session.chapter_count().saturating_sub(1);
                self.goto_chapter(last);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.adjust_layout(|o| o.line_spacing += LINE_SPACING_STEP)
            }
            KeyCode::Char('-') => self.adjust_layout(|o| o.line_spacing -= LINE_SPACING_STEP),
            KeyCode::Char(']') => {
                self.adjust_layout(|o| o.paragraph_spacing += PARAGRAPH_SPACING_STEP)
            }
            KeyCode::Char('[') => {
                self.adjust_layout(|o| o.paragraph_spacing -= PARAGRAPH_SPACING_STEP)
            }
            KeyCode::Char('>') => self.adjust_layout(|o| o.margin = o.margin.saturating_add(1)),
            KeyCode::Char('<') => self.adjust_layout(|o| o.margin = o.margin.saturating_sub(1)),
            _ => {}
        }
        None
    }

    /// Keys the TOC panel consumes while focused.
    fn handle_toc_key(&mut self, key: KeyEvent) -> bool {
        let Some(book) = &self.book else {
            return false;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.toc.move_selection_down(book.toc());
                true
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.toc.move_selection_up();
                true
            }
            KeyCode::Enter => {
                let target = self.toc.selected_entry(book.toc()).map(|e| e.chapter);
                match target {
                    Some(Some(chapter)) => {
                        self.goto_chapter(chapter);
                        self.focused_panel = FocusedPanel::Content;
                    }
                    Some(None) => self.status.warn("This entry does not point at a chapter"),
                    None => {}
                }
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_rows(WHEEL_ROWS),
            MouseEventKind::ScrollUp => self.scroll_rows(-WHEEL_ROWS),
            MouseEventKind::Down(button) => {
                if self.in_toc(column, row) {
                    self.click_toc(column, row);
                } else if let Some((x, y)) = self.surface.to_local(column, row) {
                    self.focused_panel = FocusedPanel::Content;
                    self.click_content(button, x, y);
                }
            }
            _ => {}
        }
    }

    fn in_toc(&self, column: u16, row: u16) -> bool {
        self.areas.toc.is_some_and(|area| {
            column >= area.x
                && column < area.x + area.width
                && row >= area.y
                && row < area.y + area.height
        })
    }

    fn click_toc(&mut self, column: u16, row: u16) {
        self.focused_panel = FocusedPanel::Toc;
        let Some(book) = &self.book else {
            return;
        };
        let Some(idx) = self.toc.entry_at(column, row, book.toc()) else {
            return;
        };
        let chapter = book.toc()[idx].chapter;
        self.toc.select(idx);
        if let Some(chapter) = chapter {
            self.goto_chapter(chapter);
        }
    }

    /// Pointer-down inside the content. The context menu is offered to the
    /// page script on every secondary click; only reading mode hands the
    /// click itself to the classifier.
    fn click_content(&mut self, button: MouseButton, x: u16, y: u16) {
        if button == MouseButton::Right {
            if self.page_script.on_context_menu() {
                self.context_menus_prevented += 1;
            } else {
                debug!("Context menu allowed at ({x}, {y})");
            }
        }
        if !self.session.reading_mode() {
            return;
        }
        let event = RawPointerEvent {
            button: button.into(),
            x,
            y,
        };
        let outcome = self.page_script.on_pointer_down(&event, &self.surface);
        debug!("Content click at ({x}, {y}): {outcome:?}");
    }

    fn scroll_rows(&mut self, rows: i64) {
        self.surface.scroll_by(rows);
    }

    fn scroll_half_page(&mut self, direction: i64) {
        let rows = self.surface.half_page() * direction;
        self.surface.scroll_by(rows);
    }

    fn toggle_focus(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Content if self.toc_visible() => FocusedPanel::Toc,
            _ => FocusedPanel::Content,
        };
    }

    fn toggle_reading_mode(&mut self) {
        let enabled = self.session.toggle_reading_mode();
        self.settings.update(|s| s.reading_mode = enabled);
        if enabled {
            self.status
                .info("Reading mode on: left click for next chapter, right click for previous");
        } else {
            self.status.info("Reading mode off");
        }
    }

    fn toggle_toc(&mut self) {
        let visible = !self.settings.get().toc_visible;
        self.settings.update(|s| s.toc_visible = visible);
        if !visible {
            self.focused_panel = FocusedPanel::Content;
        }
        self.resize(self.screen);
    }

    fn toggle_images(&mut self) {
        let visible = !self.settings.get().show_images;
        self.settings.update(|s| s.show_images = visible);
        self.status.info(if visible {
            "Images shown"
        } else {
            "Images hidden"
        });
        let changed = self
            .book
            .as_mut()
            .is_some_and(|book| book.set_show_images(visible));
        if changed {
            self.reload_current();
        }
    }

    fn cycle_theme(&mut self) {
        let theme = self.settings.get().theme_id().next();
        self.settings.update(|s| s.theme = theme.key().to_string());
        self.status.info(format!("Theme: {}", theme.name()));
    }

    fn adjust_layout(&mut self, change: impl FnOnce(&mut LayoutOptions)) {
        let mut options = self.settings.get().layout_options();
        change(&mut options);
        let options = options.clamped();
        if options == self.settings.get().layout_options() {
            return;
        }
        self.settings.update(|s| s.set_layout_options(options));
        self.status.info(format!(
            "Line spacing {:.1}, paragraph spacing {:.1}, margin {}",
            options.line_spacing, options.paragraph_spacing, options.margin
        ));
        self.reload_current();
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let theme: ThemeId = self.settings.get().theme_id();
        let palette = theme.palette();

        if let (Some(area), Some(book)) = (self.areas.toc, &self.book) {
            self.toc.render(
                f,
                area,
                self.focused_panel == FocusedPanel::Toc,
                palette,
                book.toc(),
                self.session.current_chapter(),
                book.title(),
            );
        }

        if self.book.is_some() {
            self.surface.render(f, palette);
        } else {
            let welcome = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Folio",
                    Style::default()
                        .fg(palette.heading)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from("Open a book: folio <path.epub>, or press Ctrl+R for the last one"),
            ])
            .alignment(Alignment::Center)
            .style(Style::default().fg(palette.foreground).bg(palette.background));
            f.render_widget(welcome, self.areas.content);
        }

        self.draw_status(f);
    }

    fn draw_status(&self, f: &mut Frame) {
        let palette = self.settings.get().theme_id().palette();
        let mut spans = Vec::new();
        if let Some(book) = &self.book {
            spans.push(Span::styled(
                format!(" {} ", book.title()),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(
                "| {}/{} ",
                self.session.current_chapter() + 1,
                self.session.chapter_count()
            )));
            if let Some(title) = self.surface.document().and_then(|d| d.title.as_deref()) {
                spans.push(Span::raw(format!("{title} ")));
            }
        }
        let mode = if self.session.reading_mode() {
            "| Reading mode "
        } else {
            "| Browse "
        };
        spans.push(Span::styled(mode, Style::default().fg(palette.accent)));
        if let Some(notification) = self.status.current() {
            let color = match notification.level {
                NotificationLevel::Info => palette.foreground,
                NotificationLevel::Warning => palette.heading,
                NotificationLevel::Error => palette.link,
            };
            spans.push(Span::styled(
                format!("| {}", notification.message),
                Style::default().fg(color),
            ));
        }

        let bar = Paragraph::new(Line::from(spans))
            .style(Style::default().fg(palette.foreground).bg(palette.panel));
        f.render_widget(bar, self.areas.status);
    }
}

/// Bookmarks are keyed by the path the book was opened with.
fn bookmark_key(path: &Path) -> String {
    path.display().to_string()
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut needs_redraw = true;
    loop {
        let size = terminal.size()?;
        app.resize(Rect::new(0, 0, size.width, size.height));

        // Loads finish and their ratio lands before anything is drawn.
        if app.pump() {
            needs_redraw = true;
        }
        if app.status.update() {
            needs_redraw = true;
        }
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                Event::Resize(cols, rows) => debug!("Terminal resized to {cols}x{rows}"),
                _ => {}
            }

            if should_quit {
                break;
            }
        }

        if should_quit {
            app.shutdown();
            return Ok(());
        }

        if events_processed > 0 {
            needs_redraw = true;
        } else {
            // Nothing arrived; wait for input or the next tick.
            let _ = event_source.poll(tick_rate)?;
        }
    }
}
