//! One-way bridge between the content surface and the host.
//!
//! The page side classifies pointer-downs and posts `onMouseClick`
//! messages; the host drains them and turns them into chapter navigation.
//! Sending never blocks and never reports back: a click posted after the
//! host has gone away is dropped.

pub mod classifier;
pub mod scroll;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use classifier::{Classification, ClickEvent, PointerContext, RawPointerEvent};
use scroll::{ScrollRatio, ScrollSurface, apply_ratio, capture_ratio};

/// Direction argument of `onMouseClick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickDirection {
    Left,
    Right,
}

impl ClickDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickDirection::Left => "left",
            ClickDirection::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(ClickDirection::Left),
            "right" => Some(ClickDirection::Right),
            _ => None,
        }
    }

    pub fn action(self) -> PageAction {
        match self {
            ClickDirection::Left => PageAction::NextChapter,
            ClickDirection::Right => PageAction::PreviousChapter,
        }
    }
}

/// Logical action delivered to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    NextChapter,
    PreviousChapter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum BridgeMessage {
    OnMouseClick(ClickDirection),
}

/// Creates a connected page/host endpoint pair.
pub fn channel() -> (PageBridge, HostBridge) {
    let (tx, rx) = flume::unbounded();
    (PageBridge { tx }, HostBridge { rx })
}

/// Page-side endpoint.
#[derive(Clone)]
pub struct PageBridge {
    tx: flume::Sender<BridgeMessage>,
}

impl PageBridge {
    pub fn on_mouse_click(&self, direction: ClickDirection) {
        if self
            .tx
            .send(BridgeMessage::OnMouseClick(direction))
            .is_err()
        {
            debug!("Host endpoint closed, dropping {} click", direction.as_str());
        }
    }
}

/// Host-side endpoint.
pub struct HostBridge {
    rx: flume::Receiver<BridgeMessage>,
}

impl HostBridge {
    /// Next pending action, if any. Never blocks.
    pub fn try_next_action(&self) -> Option<PageAction> {
        self.rx.try_recv().ok().map(|message| match message {
            BridgeMessage::OnMouseClick(direction) => direction.action(),
        })
    }

    /// Drains every action posted so far.
    pub fn pending_actions(&self) -> Vec<PageAction> {
        std::iter::from_fn(|| self.try_next_action()).collect()
    }
}

/// What the page did with a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerOutcome {
    pub classification: Classification,
    pub forwarded: bool,
}

/// Page-side logic installed into the content surface: the click
/// classifier, the context-menu guard and the scroll-ratio entry points.
pub struct PageScript {
    bridge: PageBridge,
}

impl PageScript {
    pub fn new(bridge: PageBridge) -> Self {
        Self { bridge }
    }

    pub fn on_pointer_down(
        &self,
        event: &RawPointerEvent,
        context: &impl PointerContext,
    ) -> PointerOutcome {
        let click = ClickEvent::observe(event, context);
        let classification = click.classify();
        trace!("Pointer down {event:?} classified as {classification:?}");

        let forwarded = match classification.direction() {
            Some(direction) => {
                self.bridge.on_mouse_click(direction);
                true
            }
            None => false,
        };
        PointerOutcome {
            classification,
            forwarded,
        }
    }

    /// Context-menu handler. Returns `true` when the default menu is
    /// prevented, which is always, so secondary-button page turns never
    /// also open a menu.
    pub fn on_context_menu(&self) -> bool {
        true
    }

    pub fn get_scroll_ratio(&self, surface: &impl ScrollSurface) -> f64 {
        capture_ratio(surface).value()
    }

    /// Returns the offset actually applied.
    pub fn set_scroll_ratio(&self, surface: &mut impl ScrollSurface, ratio: f64) -> u32 {
        apply_ratio(surface, ScrollRatio::new(ratio))
    }
}
