//! Scroll-ratio codec.
//!
//! Converts between an absolute scroll offset and a position that does not
//! depend on content or viewport height. The host captures a ratio before
//! replacing the displayed content and applies it once the new content has
//! been laid out, so the reader keeps their relative place across chapter
//! turns and reflows.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::surface::SurfaceError;

/// Vertical position normalized by the scrollable range, always in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct ScrollRatio(f64);

impl ScrollRatio {
    pub const TOP: ScrollRatio = ScrollRatio(0.0);
    pub const BOTTOM: ScrollRatio = ScrollRatio(1.0);

    /// Builds a ratio from any value. Out-of-range input is corrected, not
    /// rejected: NaN and negative values become `0`, anything above `1`
    /// (including positive infinity) becomes `1`.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::TOP;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for ScrollRatio {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<ScrollRatio> for f64 {
    fn from(ratio: ScrollRatio) -> Self {
        ratio.0
    }
}

/// Measurements and scrolling a render surface exposes to page-side logic.
///
/// Offsets and heights share one unit (terminal rows for the content
/// surface). Measurements may fail while nothing is loaded or before the
/// viewport has been sized.
pub trait ScrollSurface {
    fn scroll_offset(&self) -> Result<u32, SurfaceError>;
    fn document_height(&self) -> Result<u32, SurfaceError>;
    fn viewport_height(&self) -> Result<u32, SurfaceError>;

    /// Scrolls to `offset` and returns the offset actually applied.
    fn scroll_to(&mut self, offset: u32) -> u32;
}

fn scrollable_range(surface: &impl ScrollSurface) -> Result<u32, SurfaceError> {
    let document_height = surface.document_height()?;
    let viewport_height = surface.viewport_height()?;
    Ok(document_height.saturating_sub(viewport_height))
}

/// Reads the current position as a ratio. Never fails: a measurement error
/// yields `0`.
pub fn capture_ratio(surface: &impl ScrollSurface) -> ScrollRatio {
    let measured = scrollable_range(surface).and_then(|range| {
        let offset = surface.scroll_offset()?;
        Ok((offset, range))
    });

    match measured {
        Ok((_, 0)) => ScrollRatio::TOP,
        Ok((offset, range)) => ScrollRatio::new(f64::from(offset) / f64::from(range)),
        Err(e) => {
            trace!("capture_ratio falling back to top: {e}");
            ScrollRatio::TOP
        }
    }
}

/// Scrolls the surface to `ratio` of its current scrollable range and
/// returns the applied offset.
pub fn apply_ratio(surface: &mut impl ScrollSurface, ratio: impl Into<ScrollRatio>) -> u32 {
    let ratio = ratio.into();
    let target = match scrollable_range(surface) {
        Ok(0) => 0,
        Ok(range) => (ratio.value() * f64::from(range)).round() as u32,
        Err(e) => {
            trace!("apply_ratio scrolling to top: {e}");
            0
        }
    };

    let applied = surface.scroll_to(target);
    debug!(
        "Applied scroll ratio {:.4} -> offset {applied}",
        ratio.value()
    );
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSurface {
        offset: u32,
        document: Result<u32, SurfaceError>,
        viewport: Result<u32, SurfaceError>,
    }

    impl FakeSurface {
        fn new(offset: u32, document: u32, viewport: u32) -> Self {
            Self {
                offset,
                document: Ok(document),
                viewport: Ok(viewport),
            }
        }
    }

    impl ScrollSurface for FakeSurface {
        fn scroll_offset(&self) -> Result<u32, SurfaceError> {
            Ok(self.offset)
        }

        fn document_height(&self) -> Result<u32, SurfaceError> {
            self.document.clone()
        }

        fn viewport_height(&self) -> Result<u32, SurfaceError> {
            self.viewport.clone()
        }

        fn scroll_to(&mut self, offset: u32) -> u32 {
            let max = match (&self.document, &self.viewport) {
                (Ok(d), Ok(v)) => d.saturating_sub(*v),
                _ => 0,
            };
            self.offset = offset.min(max);
            self.offset
        }
    }

    #[test]
    fn ratio_is_clamped_on_construction() {
        assert_eq!(ScrollRatio::new(-0.5).value(), 0.0);
        assert_eq!(ScrollRatio::new(1.7).value(), 1.0);
        assert_eq!(ScrollRatio::new(f64::NAN).value(), 0.0);
        assert_eq!(ScrollRatio::new(f64::INFINITY).value(), 1.0);
        assert_eq!(ScrollRatio::new(f64::NEG_INFINITY).value(), 0.0);
        assert_eq!(ScrollRatio::new(0.25).value(), 0.25);
    }

    #[test]
    fn capture_divides_offset_by_scrollable_range() {
        let surface = FakeSurface::new(30, 140, 40);
        assert!((capture_ratio(&surface).value() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn capture_is_zero_when_content_fits() {
        let surface = FakeSurface::new(0, 20, 40);
        assert_eq!(capture_ratio(&surface), ScrollRatio::TOP);

        let exact = FakeSurface::new(0, 40, 40);
        assert_eq!(capture_ratio(&exact), ScrollRatio::TOP);
    }

    #[test]
    fn capture_is_zero_when_measurement_fails() {
        let mut surface = FakeSurface::new(10, 100, 20);
        surface.viewport = Err(SurfaceError::ViewportNotSized);
        assert_eq!(capture_ratio(&surface), ScrollRatio::TOP);
    }

    #[test]
    fn apply_rounds_to_nearest_offset() {
        let mut surface = FakeSurface::new(0, 110, 10);
        assert_eq!(apply_ratio(&mut surface, 0.333), 33);
        assert_eq!(apply_ratio(&mut surface, 0.335), 34);
    }

    #[test]
    fn apply_out_of_range_behaves_as_clamped() {
        let mut surface = FakeSurface::new(50, 110, 10);
        assert_eq!(apply_ratio(&mut surface, -0.5), 0);
        assert_eq!(apply_ratio(&mut surface, 1.7), 100);
        assert_eq!(apply_ratio(&mut surface, f64::NAN), 0);
    }

    #[test]
    fn apply_on_unscrollable_content_goes_to_top() {
        let mut surface = FakeSurface::new(0, 5, 10);
        assert_eq!(apply_ratio(&mut surface, 0.8), 0);
    }

    #[test]
    fn apply_with_failed_measurement_goes_to_top() {
        let mut surface = FakeSurface::new(7, 100, 10);
        surface.document = Err(SurfaceError::NoContent);
        assert_eq!(apply_ratio(&mut surface, 0.5), 0);
    }

    #[test]
    fn capture_then_apply_restores_offset() {
        for (document, viewport) in [(100u32, 10u32), (37, 36), (1000, 7), (999, 500)] {
            for offset in 0..=document - viewport {
                let mut surface = FakeSurface::new(offset, document, viewport);
                let ratio = capture_ratio(&surface);
                let applied = apply_ratio(&mut surface, ratio);
                assert!(
                    applied.abs_diff(offset) <= 1,
                    "offset {offset} came back as {applied} ({document}/{viewport})"
                );
            }
        }
    }

    #[test]
    fn ratio_deserializes_with_clamping() {
        let ratio: ScrollRatio = serde_json::from_str("1.5").unwrap();
        assert_eq!(ratio, ScrollRatio::BOTTOM);
        assert_eq!(serde_json::to_string(&ScrollRatio::new(0.5)).unwrap(), "0.5");
    }
}
