//! Selection handles and resize math for images and text.

use crate::element::{Element, ElementId, ElementKind};
use crate::geometry::{TEXT_HEIGHT_TO_FONT, TEXT_LINE_HEIGHT, element_bounds};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Smallest width/height a resize may produce, in canvas units.
pub const MIN_RESIZE_EXTENT: f64 = 10.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Where this corner sits on `rect`.
    pub fn of(&self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }

    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// Growth direction of this corner relative to its anchor.
    fn direction(&self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }
}

/// A resize handle with its position in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    /// Whether a canvas point hits this handle. `tolerance` is in canvas units.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Corner handles of a resizable element. Empty for other kinds.
pub fn handles(element: &Element) -> Vec<Handle> {
    if !element.is_resizable() {
        return Vec::new();
    }
    let bounds = element_bounds(element);
    Corner::ALL
        .into_iter()
        .map(|corner| Handle {
            position: corner.of(bounds),
            corner,
        })
        .collect()
}

/// The handle under `point`, if any.
pub fn hit_test_handles(element: &Element, point: Point, tolerance: f64) -> Option<Corner> {
    handles(element)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.corner)
}

/// An in-progress resize of one element.
#[derive(Debug, Clone)]
pub struct ResizeState {
    pub id: ElementId,
    pub corner: Corner,
    /// The element as it was when the handle was grabbed.
    pub original: Element,
    /// Opposite corner, fixed for the whole gesture.
    pub anchor: Point,
}

impl ResizeState {
    pub fn new(original: Element, corner: Corner) -> Self {
        let anchor = corner.opposite().of(element_bounds(&original));
        Self {
            id: original.id,
            corner,
            original,
            anchor,
        }
    }

    /// The original element resized so the grabbed corner follows `pointer`.
    pub fn apply(&self, pointer: Point, min_extent: f64) -> Element {
        let (sx, sy) = self.corner.direction();
        let width = (sx * (pointer.x - self.anchor.x)).max(min_extent);
        let height = (sy * (pointer.y - self.anchor.y)).max(min_extent);
        let x0 = if sx > 0.0 { self.anchor.x } else { self.anchor.x - width };
        let y0 = if sy > 0.0 { self.anchor.y } else { self.anchor.y - height };
        let rect = Rect::new(x0, y0, x0 + width, y0 + height);
        resize_to(&self.original, rect)
    }
}

/// Fit an element into `rect`.
///
/// Text is anchored at its baseline, so the position moves to the bottom-left
/// corner and the height is chosen so the text band fills the rect.
pub fn resize_to(element: &Element, rect: Rect) -> Element {
    let mut resized = element.clone();
    match element.kind {
        ElementKind::Text { .. } => {
            resized.position = Point::new(rect.x0, rect.y1);
            resized.width = rect.width();
            resized.height = rect.height() / (TEXT_HEIGHT_TO_FONT * TEXT_LINE_HEIGHT);
        }
        _ => {
            resized.position = rect.origin();
            resized.width = rect.width();
            resized.height = rect.height();
        }
    }
    resized
}
