use crate::book::TocEntry;
use crate::theme::Palette;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Side panel listing the flattened table of contents.
pub struct TableOfContents {
    pub list_state: ListState,
    area: Rect,
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self::new()
    }
}

impl TableOfContents {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            list_state,
            area: Rect::default(),
        }
    }

    pub fn selected_index(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    pub fn move_selection_down(&mut self, entries: &[TocEntry]) {
        let next = self.selected_index() + 1;
        if next < entries.len() {
            self.list_state.select(Some(next));
        }
    }

    pub fn move_selection_up(&mut self) {
        let current = self.selected_index();
        if current > 0 {
            self.list_state.select(Some(current - 1));
        }
    }

    pub fn selected_entry<'a>(&self, entries: &'a [TocEntry]) -> Option<&'a TocEntry> {
        entries.get(self.selected_index())
    }

    /// Moves the selection to the first entry pointing at `chapter`.
    pub fn follow_chapter(&mut self, entries: &[TocEntry], chapter: usize) {
        if let Some(idx) = entries.iter().position(|e| e.chapter == Some(chapter)) {
            self.list_state.select(Some(idx));
        }
    }

    /// Maps a terminal row inside the panel to an entry index.
    pub fn entry_at(&self, column: u16, row: u16, entries: &[TocEntry]) -> Option<usize> {
        let inner_top = self.area.y + 1;
        let inner_bottom = self.area.y + self.area.height.saturating_sub(1);
        let inside = column > self.area.x
            && column + 1 < self.area.x + self.area.width
            && row >= inner_top
            && row < inner_bottom;
        if !inside {
            return None;
        }
        let idx = self.list_state.offset() + usize::from(row - inner_top);
        (idx < entries.len()).then_some(idx)
    }

    pub fn select(&mut self, idx: usize) {
        self.list_state.select(Some(idx));
    }

    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        is_focused: bool,
        palette: &Palette,
        entries: &[TocEntry],
        current_chapter: usize,
        book_title: &str,
    ) {
        self.area = area;
        let border_color = if is_focused {
            palette.accent
        } else {
            palette.border
        };

        let text_width = usize::from(area.width.saturating_sub(2));
        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let style = if entry.chapter == Some(current_chapter) {
                    Style::default()
                        .fg(palette.heading)
                        .add_modifier(Modifier::BOLD)
                } else if entry.chapter.is_none() {
                    Style::default().fg(palette.border)
                } else {
                    Style::default().fg(palette.foreground)
                };
                let label = format!("{}{}", "  ".repeat(entry.level), entry.title);
                ListItem::new(Line::from(vec![Span::styled(
                    fit_width(&label, text_width),
                    style,
                )]))
            })
            .collect();

        let toc_list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(book_title.to_string())
                    .border_style(Style::default().fg(border_color))
                    .style(Style::default().bg(palette.panel)),
            )
            .highlight_style(
                Style::default()
                    .bg(palette.selection_bg)
                    .fg(palette.selection_fg),
            )
            .style(Style::default().bg(palette.panel));

        f.render_stateful_widget(toc_list, area, &mut self.list_state);
    }
}

/// Cuts `text` to at most `width` columns, ending in an ellipsis when cut.
fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
