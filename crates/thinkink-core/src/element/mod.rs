//! Element definitions for the whiteboard.
//!
//! Every drawable unit is an [`Element`]: a set of common fields (id, position,
//! size, rotation, style) plus an [`ElementKind`] carrying the fields that only
//! make sense for one kind of element.

mod color;
mod image;

pub use color::{ColorParseError, Rgba};
pub use image::{ImageData, ImageFormat};

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element.
pub type ElementId = Uuid;

fn default_opacity() -> f64 {
    1.0
}

fn default_roughness() -> f64 {
    1.0
}

/// Generate a seed for the hand-drawn jitter of a new element.
///
/// The seed is stored with the element, so the same element always renders
/// with the same jitter.
pub fn generate_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    // splitmix32-style finalizer
    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Visual style shared by all element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    /// Stroke color.
    pub stroke_color: Rgba,
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill_color: Option<Rgba>,
    /// Stroke width in canvas units.
    pub stroke_width: f64,
    /// Overall opacity (0.0 = invisible, 1.0 = opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Amount of hand-drawn jitter (0.0 = clean lines).
    #[serde(default = "default_roughness")]
    pub roughness: f64,
    /// Seed for the hand-drawn jitter.
    #[serde(default = "generate_seed")]
    pub seed: u32,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: Rgba::new(0x1e, 0x1e, 0x1e, 255),
            fill_color: None,
            stroke_width: 6.0,
            opacity: 1.0,
            roughness: 1.0,
            seed: generate_seed(),
        }
    }
}

impl ElementStyle {
    /// Same style with a freshly generated seed.
    pub fn reseeded(&self) -> Self {
        Self {
            seed: generate_seed(),
            ..self.clone()
        }
    }

    pub fn with_stroke_color(mut self, color: Rgba) -> Self {
        self.stroke_color = color;
        self
    }

    pub fn with_fill_color(mut self, color: Option<Rgba>) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = width;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Kind-specific payload of an element.
///
/// Points are stored relative to the element position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Line { points: [Point; 2] },
    Arrow { points: [Point; 2] },
    Pen { points: Vec<Point> },
    DisappearingPen {
        points: Vec<Point>,
        /// Creation time in milliseconds since the UNIX epoch.
        #[serde(default)]
        created_at: Option<u64>,
    },
    Text { text: String },
    Image { image: ImageData },
}

impl ElementKind {
    /// The serialized tag of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line { .. } => "line",
            ElementKind::Arrow { .. } => "arrow",
            ElementKind::Pen { .. } => "pen",
            ElementKind::DisappearingPen { .. } => "disappearing-pen",
            ElementKind::Text { .. } => "text",
            ElementKind::Image { .. } => "image",
        }
    }
}

/// A drawable unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Anchor in canvas space. Top-left for boxes, baseline-left for text.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians around the bounds center.
    #[serde(default)]
    pub rotation: f64,
    pub style: ElementStyle,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create an element of the given kind with zero extent.
    pub fn new(kind: ElementKind, position: Point, style: ElementStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            style,
            kind,
        }
    }

    pub fn rectangle(position: Point, width: f64, height: f64, style: ElementStyle) -> Self {
        Self::new(ElementKind::Rectangle, position, style).with_size(width, height)
    }

    pub fn ellipse(position: Point, width: f64, height: f64, style: ElementStyle) -> Self {
        Self::new(ElementKind::Ellipse, position, style).with_size(width, height)
    }

    /// A line from `start` to `end`, both in canvas space.
    pub fn line(start: Point, end: Point, style: ElementStyle) -> Self {
        let delta = end - start;
        Self::new(
            ElementKind::Line {
                points: [Point::ZERO, delta.to_point()],
            },
            start,
            style,
        )
        .with_size(delta.x.abs(), delta.y.abs())
    }

    /// An arrow from `start` pointing at `end`, both in canvas space.
    pub fn arrow(start: Point, end: Point, style: ElementStyle) -> Self {
        let delta = end - start;
        Self::new(
            ElementKind::Arrow {
                points: [Point::ZERO, delta.to_point()],
            },
            start,
            style,
        )
        .with_size(delta.x.abs(), delta.y.abs())
    }

    /// A freehand stroke through canvas-space points.
    pub fn pen(points: &[Point], style: ElementStyle) -> Self {
        let origin = points.first().copied().unwrap_or(Point::ZERO);
        let relative = points.iter().map(|p| (*p - origin).to_point()).collect();
        Self::new(ElementKind::Pen { points: relative }, origin, style)
    }

    /// A fading freehand stroke through canvas-space points.
    pub fn disappearing_pen(points: &[Point], created_at: u64, style: ElementStyle) -> Self {
        let origin = points.first().copied().unwrap_or(Point::ZERO);
        let relative = points.iter().map(|p| (*p - origin).to_point()).collect();
        Self::new(
            ElementKind::DisappearingPen {
                points: relative,
                created_at: Some(created_at),
            },
            origin,
            style,
        )
    }

    /// A text element anchored at its baseline-left point.
    ///
    /// The stored box is an estimate from the stroke width; bounds are
    /// always recomputed by the geometry engine.
    pub fn text(position: Point, text: impl Into<String>, style: ElementStyle) -> Self {
        let text = text.into();
        let width = text.chars().count() as f64 * style.stroke_width * 5.0;
        let height = style.stroke_width * 10.0;
        Self::new(ElementKind::Text { text }, position, style).with_size(width, height)
    }

    /// An image shown at the given display size.
    pub fn image(position: Point, image: ImageData, width: f64, height: f64) -> Self {
        let style = ElementStyle {
            stroke_color: Rgba::TRANSPARENT,
            fill_color: None,
            stroke_width: 0.0,
            ..ElementStyle::default()
        };
        Self::new(ElementKind::Image { image }, position, style).with_size(width, height)
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Position-relative points for point-sequence kinds.
    pub fn points(&self) -> Option<&[Point]> {
        match &self.kind {
            ElementKind::Line { points } | ElementKind::Arrow { points } => Some(points),
            ElementKind::Pen { points } | ElementKind::DisappearingPen { points, .. } => {
                Some(points)
            }
            _ => None,
        }
    }

    /// Points converted to canvas space.
    pub fn absolute_points(&self) -> Vec<Point> {
        self.points()
            .map(|pts| pts.iter().map(|p| self.position + p.to_vec2()).collect())
            .unwrap_or_default()
    }

    pub fn point_count(&self) -> usize {
        self.points().map_or(0, <[Point]>::len)
    }

    pub fn is_point_based(&self) -> bool {
        self.points().is_some()
    }

    pub fn is_disappearing(&self) -> bool {
        matches!(self.kind, ElementKind::DisappearingPen { .. })
    }

    /// Whether corner handles can resize this element.
    pub fn is_resizable(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. } | ElementKind::Image { .. })
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn image_data(&self) -> Option<&ImageData> {
        match &self.kind {
            ElementKind::Image { image } => Some(image),
            _ => None,
        }
    }

    /// Move the element by a canvas-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Extend a pen stroke with a canvas-space point. Ignored for other kinds.
    pub fn push_point(&mut self, point: Point) {
        let relative = (point - self.position).to_point();
        match &mut self.kind {
            ElementKind::Pen { points } | ElementKind::DisappearingPen { points, .. } => {
                points.push(relative);
            }
            _ => {}
        }
    }

    /// Move the end point of a line or arrow to a canvas-space point.
    pub fn set_end_point(&mut self, point: Point) {
        let delta = point - self.position;
        if let ElementKind::Line { points } | ElementKind::Arrow { points } = &mut self.kind {
            points[0] = Point::ZERO;
            points[1] = delta.to_point();
            self.width = delta.x.abs();
            self.height = delta.y.abs();
        }
    }

    /// Copy of this element with a new id, offset by `delta`.
    pub fn duplicate(&self, delta: Vec2) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.position += delta;
        copy
    }
}
