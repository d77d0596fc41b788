//! Viewport geometry: rectangles, visibility checks and the virtual center anchor.
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport (client) coordinates, mirroring `DOMRect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Zero-size rectangle located at `(x, y)`.
    #[must_use]
    pub const fn point(x: f64, y: f64) -> Self {
        Self::new(y, x, 0.0, 0.0)
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Grow the rectangle by `pad` on every side (used for the highlight cut-out).
    #[must_use]
    pub fn inflate(&self, pad: f64) -> Self {
        Self::new(
            self.top - pad,
            self.left - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.top + dy, self.left + dx, self.width, self.height)
    }
}

/// Width/height pair for popovers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Preferred popover side relative to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Let the positioner choose the side with the most room.
    Auto,
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Placement {
    /// Whether the popover sits above or below its anchor.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Auto => Self::Auto,
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// CSS-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Popover offset in positioner terms: `skidding` runs along the anchor edge,
/// `distance` pushes away from the anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub skidding: f64,
    pub distance: f64,
}

impl Offset {
    #[must_use]
    pub const fn distance(distance: f64) -> Self {
        Self {
            skidding: 0.0,
            distance,
        }
    }
}

/// Visible client area of the browser window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when the rectangle lies entirely above or entirely below the viewport.
    #[must_use]
    pub fn is_offscreen_vertically(&self, rect: &Rect) -> bool {
        rect.bottom() <= 0.0 || rect.top >= self.height
    }

    /// True when every edge lies within `[padding, dimension - padding]`.
    #[must_use]
    pub fn is_fully_in_view(&self, rect: &Rect, padding: f64) -> bool {
        rect.top >= padding
            && rect.left >= padding
            && rect.bottom() <= self.height - padding
            && rect.right() <= self.width - padding
    }

    /// Synthetic zero-size anchor at the exact viewport center.
    #[must_use]
    pub fn center_anchor(&self) -> Rect {
        Rect::point(self.width / 2.0, self.height / 2.0)
    }
}

/// Offset that centers a popover on a zero-size anchor: pull it back toward the
/// anchor by half its own extent along the placement axis.
#[must_use]
pub fn center_offset(placement: Placement, popover: Size) -> Offset {
    let extent = match placement {
        Placement::Left | Placement::Right => popover.width,
        Placement::Top | Placement::Bottom | Placement::Auto => popover.height,
    };
    Offset::distance(-extent / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport::new(1024.0, 768.0);

    #[test]
    fn offscreen_detection_uses_inclusive_edges() {
        assert!(VIEW.is_offscreen_vertically(&Rect::new(-40.0, 10.0, 100.0, 40.0)));
        assert!(VIEW.is_offscreen_vertically(&Rect::new(768.0, 10.0, 100.0, 40.0)));
        assert!(!VIEW.is_offscreen_vertically(&Rect::new(-39.0, 10.0, 100.0, 40.0)));
        assert!(!VIEW.is_offscreen_vertically(&Rect::new(700.0, 10.0, 100.0, 200.0)));
    }

    #[test]
    fn fully_in_view_respects_padding() {
        let rect = Rect::new(4.0, 4.0, 100.0, 100.0);
        assert!(VIEW.is_fully_in_view(&rect, 4.0));
        assert!(!VIEW.is_fully_in_view(&rect, 5.0));
        let wide = Rect::new(10.0, 10.0, 1020.0, 10.0);
        assert!(!VIEW.is_fully_in_view(&wide, 0.0));
    }

    #[test]
    fn center_anchor_is_zero_sized_at_midpoint() {
        let anchor = VIEW.center_anchor();
        assert_eq!(anchor, Rect::new(384.0, 512.0, 0.0, 0.0));
    }

    #[test]
    fn center_offset_follows_placement_axis() {
        let size = Size::new(300.0, 120.0);
        assert_eq!(center_offset(Placement::Bottom, size), Offset::distance(-60.0));
        assert_eq!(center_offset(Placement::Top, size), Offset::distance(-60.0));
        assert_eq!(center_offset(Placement::Right, size), Offset::distance(-150.0));
    }

    #[test]
    fn inflate_grows_each_side() {
        let rect = Rect::new(100.0, 50.0, 20.0, 10.0).inflate(8.0);
        assert_eq!(rect, Rect::new(92.0, 42.0, 36.0, 26.0));
    }
}
