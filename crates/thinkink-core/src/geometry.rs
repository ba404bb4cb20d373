//! Geometry engine: coordinate conversion, element bounds and hit testing.
//!
//! Hit testing is deliberately coarse: a point hits an element when it falls
//! inside the element's bounds grown by a tolerance, so thin strokes stay
//! easy to grab.

use crate::element::{Element, ElementKind};
use crate::viewport::Viewport;
use kurbo::{Point, Rect};

/// Smallest width/height reported for any element.
pub const MIN_EXTENT: f64 = 10.0;

/// Default hit-test padding in canvas units.
pub const DEFAULT_HIT_TOLERANCE: f64 = 5.0;

/// Font size relative to the element height.
pub const TEXT_HEIGHT_TO_FONT: f64 = 0.8;
/// Font size relative to the stroke width, when the element has no height.
pub const TEXT_STROKE_TO_FONT: f64 = 8.0;
/// Estimated advance of one character, relative to the font size.
pub const TEXT_CHAR_WIDTH: f64 = 0.625;
/// Line height relative to the font size.
pub const TEXT_LINE_HEIGHT: f64 = 1.25;

pub fn screen_to_canvas(screen: Point, viewport: &Viewport) -> Point {
    viewport.screen_to_canvas(screen)
}

pub fn canvas_to_screen(canvas: Point, viewport: &Viewport) -> Point {
    viewport.canvas_to_screen(canvas)
}

/// Font size used for a text element.
pub fn text_font_size(element: &Element) -> f64 {
    if element.height > 0.0 {
        element.height * TEXT_HEIGHT_TO_FONT
    } else {
        element.style.stroke_width * TEXT_STROKE_TO_FONT
    }
}

/// Fixed-metric estimate of the rendered text width.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * TEXT_CHAR_WIDTH
}

/// Axis-aligned bounds of an element in canvas space.
///
/// Text boxes grow upward from the baseline anchor. Every axis is at least
/// [`MIN_EXTENT`] wide so degenerate elements stay selectable.
pub fn element_bounds(element: &Element) -> Rect {
    let raw = match &element.kind {
        ElementKind::Line { .. }
        | ElementKind::Arrow { .. }
        | ElementKind::Pen { .. }
        | ElementKind::DisappearingPen { .. } => points_bounds(element),
        ElementKind::Text { text } => {
            let font_size = text_font_size(element);
            let width = estimate_text_width(text, font_size);
            let band = font_size * TEXT_LINE_HEIGHT;
            Rect::new(
                element.position.x,
                element.position.y - band,
                element.position.x + width,
                element.position.y,
            )
        }
        ElementKind::Rectangle | ElementKind::Ellipse | ElementKind::Image { .. } => {
            Rect::new(
                element.position.x,
                element.position.y,
                element.position.x + element.width,
                element.position.y + element.height,
            )
            .abs()
        }
    };
    clamp_extent(raw)
}

fn points_bounds(element: &Element) -> Rect {
    let points = element.points().unwrap_or(&[]);
    let Some(first) = points.first() else {
        return Rect::from_origin_size(element.position, (0.0, 0.0));
    };
    let local = points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p));
    local + element.position.to_vec2()
}

/// Keep the top-left corner and grow each axis to at least [`MIN_EXTENT`].
fn clamp_extent(rect: Rect) -> Rect {
    Rect::new(
        rect.x0,
        rect.y0,
        rect.x0 + rect.width().max(MIN_EXTENT),
        rect.y0 + rect.height().max(MIN_EXTENT),
    )
}

/// Whether `point` lies within the element bounds grown by `tolerance`.
/// Edges count as inside.
pub fn hit_test(point: Point, element: &Element, tolerance: f64) -> bool {
    let bounds = element_bounds(element).inflate(tolerance, tolerance);
    point.x >= bounds.x0 && point.x <= bounds.x1 && point.y >= bounds.y0 && point.y <= bounds.y1
}

/// Whether `point` lies within `bounds`, edges included.
pub fn point_in_rect(point: Point, bounds: Rect) -> bool {
    point.x >= bounds.x0 && point.x <= bounds.x1 && point.y >= bounds.y0 && point.y <= bounds.y1
}

/// Rectangle spanned by two corners in any order.
pub fn normalize_rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Rect {
    Rect::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

/// Union of the bounds of all elements, or None when there are none.
pub fn union_bounds<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Option<Rect> {
    elements
        .into_iter()
        .map(element_bounds)
        .reduce(|acc, r| acc.union(r))
}
