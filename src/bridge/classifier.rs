//! Pointer-down classification for reading mode.
//!
//! Decides whether a pointer-down on the rendered content is a page-turn
//! gesture or ordinary interaction. Checks run in a fixed order and the
//! first one that trips swallows the event:
//!
//! 1. the pointer sits on the scrollbar at the trailing edge of the viewport
//! 2. the target element is editable (text input, text area, content-editable)
//! 3. otherwise the button decides: primary turns forward, secondary back
//!
//! Failures while measuring the scrollbar or inspecting the target never
//! escape; the affected check simply does not suppress.

use log::trace;

use super::ClickDirection;
use crate::surface::SurfaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl From<crossterm::event::MouseButton> for PointerButton {
    fn from(button: crossterm::event::MouseButton) -> Self {
        match button {
            crossterm::event::MouseButton::Left => PointerButton::Primary,
            crossterm::event::MouseButton::Right => PointerButton::Secondary,
            crossterm::event::MouseButton::Middle => PointerButton::Middle,
        }
    }
}

/// Pointer-down as seen by the page, in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPointerEvent {
    pub button: PointerButton,
    pub x: u16,
    pub y: u16,
}

/// The element under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetElement {
    pub tag_name: String,
    pub content_editable: bool,
}

impl TargetElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            content_editable: false,
        }
    }

    pub fn editable(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            content_editable: true,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.content_editable
            || self.tag_name.eq_ignore_ascii_case("input")
            || self.tag_name.eq_ignore_ascii_case("textarea")
    }
}

/// Ambient document and viewport metrics the classifier consults.
pub trait PointerContext {
    /// Full viewport width, scrollbar included.
    fn viewport_width(&self) -> Result<u16, SurfaceError>;

    /// Width available to content, scrollbar excluded.
    fn client_width(&self) -> Result<u16, SurfaceError>;

    fn target_at(&self, x: u16, y: u16) -> Result<Option<TargetElement>, SurfaceError>;
}

/// A classified pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub button: PointerButton,
    pub target_is_editable: bool,
    pub within_scrollbar_region: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    Scrollbar,
    EditableTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Turn(ClickDirection),
    Suppressed(Suppression),
    /// A button that carries no page-turn meaning.
    Ignored,
}

impl Classification {
    pub fn direction(self) -> Option<ClickDirection> {
        match self {
            Classification::Turn(direction) => Some(direction),
            _ => None,
        }
    }
}

impl ClickEvent {
    /// Inspects the raw event against the current metrics.
    pub fn observe(raw: &RawPointerEvent, context: &impl PointerContext) -> Self {
        Self {
            button: raw.button,
            target_is_editable: target_is_editable(raw, context),
            within_scrollbar_region: within_scrollbar(raw, context),
        }
    }

    pub fn classify(&self) -> Classification {
        if self.within_scrollbar_region {
            return Classification::Suppressed(Suppression::Scrollbar);
        }
        if self.target_is_editable {
            return Classification::Suppressed(Suppression::EditableTarget);
        }
        match self.button {
            PointerButton::Primary => Classification::Turn(ClickDirection::Left),
            PointerButton::Secondary => Classification::Turn(ClickDirection::Right),
            PointerButton::Middle => Classification::Ignored,
        }
    }
}

fn within_scrollbar(raw: &RawPointerEvent, context: &impl PointerContext) -> bool {
    let widths = context
        .viewport_width()
        .and_then(|viewport| Ok((viewport, context.client_width()?)));
    match widths {
        Ok((viewport, client)) => {
            let scrollbar = viewport.saturating_sub(client);
            scrollbar > 0 && raw.x >= viewport - scrollbar
        }
        Err(e) => {
            trace!("Scrollbar width unavailable, not suppressing: {e}");
            false
        }
    }
}

fn target_is_editable(raw: &RawPointerEvent, context: &impl PointerContext) -> bool {
    match context.target_at(raw.x, raw.y) {
        Ok(target) => target.is_some_and(|t| t.is_editable()),
        Err(e) => {
            trace!("Click target unavailable, not suppressing: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Page {
        viewport: Result<u16, SurfaceError>,
        client: Result<u16, SurfaceError>,
        target: Result<Option<TargetElement>, SurfaceError>,
    }

    impl Page {
        fn paragraph(viewport: u16, client: u16) -> Self {
            Self {
                viewport: Ok(viewport),
                client: Ok(client),
                target: Ok(Some(TargetElement::new("p"))),
            }
        }
    }

    impl PointerContext for Page {
        fn viewport_width(&self) -> Result<u16, SurfaceError> {
            self.viewport.clone()
        }

        fn client_width(&self) -> Result<u16, SurfaceError> {
            self.client.clone()
        }

        fn target_at(&self, _x: u16, _y: u16) -> Result<Option<TargetElement>, SurfaceError> {
            self.target.clone()
        }
    }

    fn click(button: PointerButton, x: u16) -> RawPointerEvent {
        RawPointerEvent { button, x, y: 3 }
    }

    #[test]
    fn primary_click_on_paragraph_turns_forward() {
        let page = Page::paragraph(80, 79);
        let event = ClickEvent::observe(&click(PointerButton::Primary, 10), &page);
        assert_eq!(event.classify(), Classification::Turn(ClickDirection::Left));
    }

    #[test]
    fn secondary_click_turns_back() {
        let page = Page::paragraph(80, 80);
        let event = ClickEvent::observe(&click(PointerButton::Secondary, 40), &page);
        assert_eq!(event.classify(), Classification::Turn(ClickDirection::Right));
    }

    #[test]
    fn middle_click_is_ignored() {
        let page = Page::paragraph(80, 80);
        let event = ClickEvent::observe(&click(PointerButton::Middle, 40), &page);
        assert_eq!(event.classify(), Classification::Ignored);
        assert_eq!(event.classify().direction(), None);
    }

    #[test]
    fn click_on_scrollbar_is_suppressed() {
        let page = Page::paragraph(80, 78);
        for x in [78, 79] {
            let event = ClickEvent::observe(&click(PointerButton::Primary, x), &page);
            assert_eq!(
                event.classify(),
                Classification::Suppressed(Suppression::Scrollbar)
            );
        }
        let inside = ClickEvent::observe(&click(PointerButton::Primary, 77), &page);
        assert_eq!(inside.classify(), Classification::Turn(ClickDirection::Left));
    }

    #[test]
    fn scrollbar_check_wins_over_editable_target() {
        let mut page = Page::paragraph(80, 79);
        page.target = Ok(Some(TargetElement::new("input")));
        let event = ClickEvent::observe(&click(PointerButton::Primary, 79), &page);
        assert_eq!(
            event.classify(),
            Classification::Suppressed(Suppression::Scrollbar)
        );
    }

    #[test]
    fn editable_targets_are_suppressed() {
        for target in [
            TargetElement::new("input"),
            TargetElement::new("TEXTAREA"),
            TargetElement::editable("div"),
        ] {
            let mut page = Page::paragraph(80, 80);
            page.target = Ok(Some(target));
            let event = ClickEvent::observe(&click(PointerButton::Secondary, 5), &page);
            assert_eq!(
                event.classify(),
                Classification::Suppressed(Suppression::EditableTarget)
            );
        }
    }

    #[test]
    fn measurement_errors_do_not_suppress() {
        let page = Page {
            viewport: Err(SurfaceError::ViewportNotSized),
            client: Ok(0),
            target: Err(SurfaceError::NoContent),
        };
        let event = ClickEvent::observe(&click(PointerButton::Primary, 0), &page);
        assert!(!event.within_scrollbar_region);
        assert!(!event.target_is_editable);
        assert_eq!(event.classify(), Classification::Turn(ClickDirection::Left));
    }

    #[test]
    fn click_outside_any_element_still_turns() {
        let mut page = Page::paragraph(80, 80);
        page.target = Ok(None);
        let event = ClickEvent::observe(&click(PointerButton::Primary, 5), &page);
        assert_eq!(event.classify(), Classification::Turn(ClickDirection::Left));
    }
}
