//! Terminal render surface for chapter content.
//!
//! The surface owns the laid-out rows of the current chapter, the scroll
//! position and the viewport. The host never replaces content directly: it
//! posts a [`SurfaceCommand::Load`] through a [`SurfaceHandle`] and learns
//! that the content is ready from the [`SurfaceEvent::Loaded`] returned by
//! [`ContentSurface::process_commands`]. Only then may a saved scroll ratio
//! be applied.

use log::{debug, info};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use crate::bridge::classifier::{PointerContext, TargetElement};
use crate::bridge::scroll::{ScrollSurface, apply_ratio, capture_ratio};
use crate::document::{BlockKind, Document};
use crate::theme::Palette;

/// Column kept free on the right for the scrollbar.
const SCROLLBAR_GUTTER: u16 = 1;
const MIN_TEXT_WIDTH: u16 = 10;
const PARAGRAPH_INDENT: &str = "  ";

pub const MIN_LINE_SPACING: f32 = 1.2;
pub const MAX_LINE_SPACING: f32 = 3.0;
pub const MIN_PARAGRAPH_SPACING: f32 = 0.4;
pub const MAX_PARAGRAPH_SPACING: f32 = 3.0;
pub const MAX_MARGIN: u16 = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("no content loaded")]
    NoContent,
    #[error("viewport has not been sized")]
    ViewportNotSized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Blank columns on each side of the text.
    pub margin: u16,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            margin: 2,
            line_spacing: 1.8,
            paragraph_spacing: 1.2,
        }
    }
}

impl LayoutOptions {
    pub fn clamped(self) -> Self {
        Self {
            margin: self.margin.min(MAX_MARGIN),
            line_spacing: clamp_finite(self.line_spacing, MIN_LINE_SPACING, MAX_LINE_SPACING),
            paragraph_spacing: clamp_finite(
                self.paragraph_spacing,
                MIN_PARAGRAPH_SPACING,
                MAX_PARAGRAPH_SPACING,
            ),
        }
    }

    /// Blank rows inserted before wrapped row `row` (1-based within its
    /// block). Spacing above 1.0 is spread over the rows, so every tenth
    /// adds up to one extra blank row per ten lines.
    pub fn rows_before_line(&self, row: usize) -> usize {
        let tenths = ((self.line_spacing - 1.0).max(0.0) * 10.0).round() as usize;
        row * tenths / 10 - (row - 1) * tenths / 10
    }

    pub fn rows_between_blocks(&self) -> usize {
        self.paragraph_spacing.round() as usize
    }
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// Identifies one load request so its completion can be matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(pub u64);

#[derive(Debug)]
pub enum SurfaceCommand {
    Load {
        id: LoadId,
        document: Document,
        options: LayoutOptions,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Loaded { id: LoadId },
}

/// Host-side handle for queueing work on the surface.
#[derive(Clone)]
pub struct SurfaceHandle {
    tx: flume::Sender<SurfaceCommand>,
}

impl SurfaceHandle {
    pub fn load(&self, id: LoadId, document: Document, options: LayoutOptions) {
        let command = SurfaceCommand::Load {
            id,
            document,
            options,
        };
        if self.tx.send(command).is_err() {
            debug!("Surface dropped, load {id:?} discarded");
        }
    }
}

/// One laid-out row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidLine {
    pub text: String,
    /// Index of the block the row belongs to; `None` for spacing between blocks.
    pub block: Option<usize>,
}

pub struct ContentSurface {
    commands: flume::Receiver<SurfaceCommand>,
    document: Option<Document>,
    options: LayoutOptions,
    lines: Vec<LaidLine>,
    scroll_offset: u32,
    area: Rect,
}

impl ContentSurface {
    pub fn new() -> (Self, SurfaceHandle) {
        let (tx, rx) = flume::unbounded();
        let surface = Self {
            commands: rx,
            document: None,
            options: LayoutOptions::default(),
            lines: Vec::new(),
            scroll_offset: 0,
            area: Rect::default(),
        };
        (surface, SurfaceHandle { tx })
    }

    /// Runs queued commands. Loads queued behind a newer load are dropped
    /// without being laid out; only the newest completes.
    pub fn process_commands(&mut self) -> Option<SurfaceEvent> {
        let mut newest = None;
        let mut superseded = 0usize;
        for command in self.commands.try_iter() {
            if newest.replace(command).is_some() {
                superseded += 1;
            }
        }
        if superseded > 0 {
            debug!("Dropped {superseded} superseded load(s)");
        }

        let SurfaceCommand::Load {
            id,
            document,
            options,
        } = newest?;
        self.install(document, options);
        info!(
            "Surface loaded {id:?}: {} blocks, {} rows",
            self.document.as_ref().map_or(0, |d| d.blocks.len()),
            self.lines.len()
        );
        Some(SurfaceEvent::Loaded { id })
    }

    fn install(&mut self, document: Document, options: LayoutOptions) {
        self.document = Some(document);
        self.options = options.clamped();
        self.relayout();
        self.scroll_offset = 0;
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Resizes the viewport, reflowing the content while keeping the
    /// reader's relative position.
    pub fn set_area(&mut self, area: Rect) {
        if area == self.area {
            return;
        }
        let ratio = capture_ratio(self);
        let width_changed = area.width != self.area.width;
        self.area = area;
        if width_changed {
            self.relayout();
        }
        apply_ratio(self, ratio);
    }

    fn text_width(&self) -> u16 {
        self.area
            .width
            .saturating_sub(self.options.margin * 2 + SCROLLBAR_GUTTER)
            .max(MIN_TEXT_WIDTH)
    }

    fn relayout(&mut self) {
        self.lines = match &self.document {
            Some(document) => layout(document, self.text_width(), &self.options),
            None => Vec::new(),
        };
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }

    pub fn lines(&self) -> &[LaidLine] {
        &self.lines
    }

    pub fn offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn max_offset(&self) -> u32 {
        (self.lines.len() as u32).saturating_sub(u32::from(self.area.height))
    }

    pub fn has_overflow(&self) -> bool {
        self.max_offset() > 0
    }

    pub fn scrollbar_width(&self) -> u16 {
        if self.has_overflow() {
            SCROLLBAR_GUTTER
        } else {
            0
        }
    }

    pub fn scroll_by(&mut self, rows: i64) -> u32 {
        let target = (i64::from(self.scroll_offset) + rows).clamp(0, i64::from(self.max_offset()));
        self.scroll_to(target as u32)
    }

    pub fn half_page(&self) -> i64 {
        i64::from((self.area.height / 2).max(1))
    }

    /// Translates terminal coordinates into surface-local ones.
    pub fn to_local(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let inside = column >= self.area.x
            && column < self.area.x + self.area.width
            && row >= self.area.y
            && row < self.area.y + self.area.height;
        inside.then(|| (column - self.area.x, row - self.area.y))
    }

    pub fn render(&self, frame: &mut Frame, palette: &Palette) {
        let area = self.area;
        if area.width == 0 || area.height == 0 {
            return;
        }
        let base = Style::default().fg(palette.foreground).bg(palette.background);
        let document = self.document.as_ref();

        let visible: Vec<Line> = self
            .lines
            .iter()
            .skip(self.scroll_offset as usize)
            .take(area.height as usize)
            .map(|line| {
                let kind = line
                    .block
                    .and_then(|idx| document.and_then(|d| d.blocks.get(idx)))
                    .map(|block| block.kind);
                Line::styled(line.text.clone(), style_for(kind, palette))
            })
            .collect();

        let text_area = Rect {
            x: area.x + self.options.margin.min(area.width),
            width: area
                .width
                .saturating_sub(self.options.margin * 2 + SCROLLBAR_GUTTER),
            ..area
        };
        frame.render_widget(Paragraph::new("").style(base), area);
        frame.render_widget(Paragraph::new(visible).style(base), text_area);

        if self.has_overflow() {
            let mut state = ScrollbarState::new(self.max_offset() as usize)
                .viewport_content_length(area.height as usize)
                .position(self.scroll_offset as usize);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None)
                .thumb_style(Style::default().fg(palette.accent))
                .track_style(Style::default().fg(palette.border));
            frame.render_stateful_widget(scrollbar, area, &mut state);
        }
    }
}

fn style_for(kind: Option<BlockKind>, palette: &Palette) -> Style {
    let style = Style::default();
    match kind {
        Some(BlockKind::Heading(_)) => style.fg(palette.heading).add_modifier(Modifier::BOLD),
        Some(BlockKind::Quote) => style.fg(palette.accent).add_modifier(Modifier::ITALIC),
        Some(BlockKind::Image) => style.fg(palette.link).add_modifier(Modifier::ITALIC),
        Some(BlockKind::Rule) => style.fg(palette.border),
        Some(BlockKind::Preformatted) => style.fg(palette.accent),
        Some(BlockKind::TextInput | BlockKind::TextArea) => style
            .fg(palette.selection_fg)
            .bg(palette.selection_bg),
        _ => style,
    }
}

/// Breaks a document into rows of at most `width` columns.
pub fn layout(document: &Document, width: u16, options: &LayoutOptions) -> Vec<LaidLine> {
    let width = width as usize;
    let mut lines = Vec::new();

    for (idx, block) in document.blocks.iter().enumerate() {
        if idx > 0 {
            for _ in 0..options.rows_between_blocks() {
                lines.push(LaidLine {
                    text: String::new(),
                    block: None,
                });
            }
        }

        let rows = block_rows(block.kind, &block.text, width);
        for (row_idx, text) in rows.into_iter().enumerate() {
            if row_idx > 0 {
                for _ in 0..options.rows_before_line(row_idx) {
                    lines.push(LaidLine {
                        text: String::new(),
                        block: Some(idx),
                    });
                }
            }
            lines.push(LaidLine {
                text,
                block: Some(idx),
            });
        }
    }

    lines
}

fn block_rows(kind: BlockKind, text: &str, width: usize) -> Vec<String> {
    match kind {
        BlockKind::Rule => vec!["─".repeat(width)],
        BlockKind::Preformatted => text.lines().map(str::to_string).collect(),
        BlockKind::Paragraph => wrap_segments(text, width, PARAGRAPH_INDENT, ""),
        BlockKind::Quote => wrap_segments(text, width, "│ ", "│ "),
        BlockKind::ListItem => wrap_segments(text, width, "• ", "  "),
        BlockKind::TextInput => vec![format!("[ {text} ]")],
        _ => wrap_segments(text, width, "", ""),
    }
}

fn wrap_segments(text: &str, width: usize, first: &str, rest: &str) -> Vec<String> {
    let mut rows = Vec::new();
    for (idx, segment) in text.split('\n').enumerate() {
        let initial = if idx == 0 { first } else { rest };
        let options = textwrap::Options::new(width)
            .initial_indent(initial)
            .subsequent_indent(rest);
        rows.extend(
            textwrap::wrap(segment, options)
                .into_iter()
                .map(|row| row.into_owned()),
        );
    }
    rows
}

impl ScrollSurface for ContentSurface {
    fn scroll_offset(&self) -> Result<u32, SurfaceError> {
        match self.document {
            Some(_) => Ok(self.scroll_offset),
            None => Err(SurfaceError::NoContent),
        }
    }

    fn document_height(&self) -> Result<u32, SurfaceError> {
        match self.document {
            Some(_) => Ok(self.lines.len() as u32),
            None => Err(SurfaceError::NoContent),
        }
    }

    fn viewport_height(&self) -> Result<u32, SurfaceError> {
        match self.area.height {
            0 => Err(SurfaceError::ViewportNotSized),
            height => Ok(u32::from(height)),
        }
    }

    fn scroll_to(&mut self, offset: u32) -> u32 {
        self.scroll_offset = offset.min(self.max_offset());
        self.scroll_offset
    }
}

impl PointerContext for ContentSurface {
    fn viewport_width(&self) -> Result<u16, SurfaceError> {
        match self.area.width {
            0 => Err(SurfaceError::ViewportNotSized),
            width => Ok(width),
        }
    }

    fn client_width(&self) -> Result<u16, SurfaceError> {
        Ok(self.viewport_width()? - self.scrollbar_width())
    }

    fn target_at(&self, _x: u16, y: u16) -> Result<Option<TargetElement>, SurfaceError> {
        let document = self.document.as_ref().ok_or(SurfaceError::NoContent)?;
        if y >= self.area.height {
            return Ok(None);
        }
        let row = self.scroll_offset as usize + y as usize;
        let target = self
            .lines
            .get(row)
            .and_then(|line| line.block)
            .and_then(|idx| document.blocks.get(idx))
            .map(|block| TargetElement {
                tag_name: block.tag_name().to_string(),
                content_editable: block.content_editable,
            });
        Ok(target)
    }
}
