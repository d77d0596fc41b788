//! Popover placement.
//!
//! The engine only decides *which side* it prefers; turning an anchor rectangle
//! and a preferred side into coordinates is delegated to a [`Positioner`]. The
//! bundled [`FlipPositioner`] covers the subset the presentation shell needs:
//! automatic side selection, top/bottom flipping and overflow clamping.
use serde::{Deserialize, Serialize};

use crate::geometry::{Offset, Placement, Rect, Size, Viewport, center_offset};

/// How far the popover sits from its anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetRule {
    /// Fixed offset, e.g. `12px` away from a highlighted element.
    Fixed(Offset),
    /// Center the popover on a zero-size anchor once the side is known.
    Centered,
}

/// Everything a positioner needs for one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRequest {
    pub anchor: Rect,
    pub popover: Size,
    pub placement: Placement,
    pub offset: OffsetRule,
    pub viewport: Viewport,
    /// Allow swapping to the opposite side when the preferred one overflows.
    pub flip: bool,
}

/// Final popover coordinates (fixed positioning).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopoverPosition {
    pub top: f64,
    pub left: f64,
    pub placement: Placement,
}

/// Compute placement given an anchor rect and a preferred side.
pub trait Positioner {
    fn position(&self, request: &PositionRequest) -> PopoverPosition;
}

/// Small popper-style positioner: auto side, flip, prevent-overflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipPositioner {
    pub overflow_padding: f64,
}

impl Default for FlipPositioner {
    fn default() -> Self {
        Self {
            overflow_padding: 4.0,
        }
    }
}

fn room(anchor: &Rect, viewport: &Viewport, side: Placement) -> f64 {
    match side {
        Placement::Top => anchor.top,
        Placement::Bottom | Placement::Auto => viewport.height - anchor.bottom(),
        Placement::Left => anchor.left,
        Placement::Right => viewport.width - anchor.right(),
    }
}

fn roomiest_side(anchor: &Rect, viewport: &Viewport) -> Placement {
    [
        Placement::Bottom,
        Placement::Top,
        Placement::Right,
        Placement::Left,
    ]
    .into_iter()
    .fold((Placement::Bottom, f64::MIN), |best, side| {
        let space = room(anchor, viewport, side);
        if space > best.1 { (side, space) } else { best }
    })
    .0
}

fn needed(popover: Size, side: Placement, distance: f64) -> f64 {
    let extent = if side.is_vertical() {
        popover.height
    } else {
        popover.width
    };
    extent + distance
}

fn clamp_axis(value: f64, extent: f64, limit: f64, pad: f64) -> f64 {
    let max = (limit - extent - pad).max(pad);
    value.clamp(pad, max)
}

impl FlipPositioner {
    fn resolve_side(
        request: &PositionRequest,
        distance_for: impl Fn(Placement) -> f64,
    ) -> Placement {
        let mut side = match request.placement {
            Placement::Auto => roomiest_side(&request.anchor, &request.viewport),
            other => other,
        };
        if request.flip && side.is_vertical() {
            let space = room(&request.anchor, &request.viewport, side);
            let opposite = side.opposite();
            let opposite_space = room(&request.anchor, &request.viewport, opposite);
            if needed(request.popover, side, distance_for(side)) > space
                && opposite_space > space
            {
                side = opposite;
            }
        }
        side
    }
}

impl Positioner for FlipPositioner {
    fn position(&self, request: &PositionRequest) -> PopoverPosition {
        let offset_for = |side: Placement| match request.offset {
            OffsetRule::Fixed(offset) => offset,
            OffsetRule::Centered => center_offset(side, request.popover),
        };
        let side = Self::resolve_side(request, |side| offset_for(side).distance);
        let Offset { skidding, distance } = offset_for(side);
        let anchor = request.anchor;
        let popover = request.popover;

        let (top, left) = match side {
            Placement::Top => (
                anchor.top - popover.height - distance,
                anchor.center_x() - popover.width / 2.0 + skidding,
            ),
            Placement::Bottom | Placement::Auto => (
                anchor.bottom() + distance,
                anchor.center_x() - popover.width / 2.0 + skidding,
            ),
            Placement::Left => (
                anchor.center_y() - popover.height / 2.0 + skidding,
                anchor.left - popover.width - distance,
            ),
            Placement::Right => (
                anchor.center_y() - popover.height / 2.0 + skidding,
                anchor.right() + distance,
            ),
        };

        let pad = self.overflow_padding;
        PopoverPosition {
            top: clamp_axis(top, popover.height, request.viewport.height, pad),
            left: clamp_axis(left, popover.width, request.viewport.width, pad),
            placement: side,
        }
    }
}
