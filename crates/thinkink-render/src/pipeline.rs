//! Scene renderer: draws every element kind onto a [`Surface`].

use crate::image_cache::{ImageCache, ImageState};
use crate::renderer::{RenderContext, Renderer};
use crate::rough::{ROUGH_PASSES, hand_drawn};
use crate::surface::Surface;
use crate::theme::Theme;
use kurbo::{Affine, BezPath, Cap, Ellipse, Join, Point, Rect, Shape, Stroke};
use peniko::Color;
use std::f64::consts::PI;
use thinkink_core::element::{Element, ElementKind, ImageData, Rgba};
use thinkink_core::geometry::{element_bounds, text_font_size};
use thinkink_core::selection::{HANDLE_SIZE, handles};
use thinkink_core::settings::DEFAULT_IMAGE_CACHE_CAPACITY;

/// Length of each arrow head segment.
pub const ARROW_HEAD_LENGTH: f64 = 15.0;
/// Angle between the shaft and each head segment.
pub const ARROW_HEAD_ANGLE: f64 = PI / 6.0;

/// Halo radius around disappearing ink.
pub const GLOW_BLUR: f64 = 12.0;
const GLOW_CORE_ALPHA: f64 = 0.4;
const GLOW_CORE_WIDTH: f64 = 0.4;

/// Fills wobble less than outlines.
const FILL_ROUGHNESS: f64 = 0.3;

const PLACEHOLDER_FILL: Rgba = Rgba::rgb(200, 200, 200);
const PLACEHOLDER_CROSS: Rgba = Rgba::rgb(150, 150, 150);
const PLACEHOLDER_BORDER: Rgba = Rgba::rgb(100, 100, 100);

/// The default renderer.
#[derive(Debug)]
pub struct SceneRenderer {
    images: ImageCache,
    /// Canvas scale of the frame being drawn.
    zoom: f64,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_IMAGE_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            images: ImageCache::new(capacity),
            zoom: 1.0,
        }
    }

    pub fn image_cache(&self) -> &ImageCache {
        &self.images
    }

    /// Look up a decoded image, queueing the decode on a miss.
    pub fn image_state(&mut self, image: &ImageData) -> ImageState {
        self.images.get(image)
    }

    /// Draw a single element. `transform` maps canvas space to the surface.
    pub fn render_element(&mut self, element: &Element, transform: Affine, theme: Theme, surface: &mut dyn Surface) {
        let transform = transform * element_transform(element);
        let style = &element.style;
        let opacity = style.opacity.clamp(0.0, 1.0);
        let stroke_color = paint(theme.resolve(style.stroke_color), opacity);

        match &element.kind {
            ElementKind::Rectangle => {
                let path = box_rect(element).to_path(0.1);
                self.render_outline(&path, element, theme, transform, surface);
            }
            ElementKind::Ellipse => {
                let path = Ellipse::from_rect(box_rect(element)).to_path(0.1);
                self.render_outline(&path, element, theme, transform, surface);
            }
            ElementKind::Line { .. } => {
                let points = element.absolute_points();
                if let &[start, end, ..] = points.as_slice() {
                    let mut path = BezPath::new();
                    path.move_to(start);
                    path.line_to(end);
                    self.render_outline(&path, element, theme, transform, surface);
                }
            }
            ElementKind::Arrow { .. } => {
                let points = element.absolute_points();
                if let &[start, end, ..] = points.as_slice() {
                    self.render_outline(&arrow_path(start, end), element, theme, transform, surface);
                }
            }
            ElementKind::Pen { .. } => {
                let points = element.absolute_points();
                if points.len() > 1 {
                    surface.stroke(&ink_stroke(style.stroke_width), transform, stroke_color, &smooth_path(&points));
                }
            }
            ElementKind::DisappearingPen { .. } => {
                let points = element.absolute_points();
                if points.len() > 1 {
                    let path = smooth_path(&points);
                    // The glow keeps its own color in every theme.
                    let glow = paint(style.stroke_color, opacity);
                    surface.glow_stroke(&ink_stroke(style.stroke_width), transform, glow, GLOW_BLUR, &path);
                    let core = paint(Rgba::WHITE, GLOW_CORE_ALPHA * opacity);
                    surface.stroke(
                        &ink_stroke(style.stroke_width * GLOW_CORE_WIDTH),
                        transform,
                        core,
                        &path,
                    );
                }
            }
            ElementKind::Text { text } => {
                if !text.is_empty() {
                    surface.text(transform, element.position, text, text_font_size(element), stroke_color);
                }
            }
            ElementKind::Image { image } => {
                let dest = box_rect(element);
                match self.images.get(image) {
                    ImageState::Ready(decoded) => surface.image(transform, &decoded, dest, opacity),
                    ImageState::Pending => {}
                    ImageState::Failed => render_placeholder(dest, transform, surface),
                }
            }
        }
    }

    /// Hand-drawn fill and double stroke.
    fn render_outline(&self, path: &BezPath, element: &Element, theme: Theme, transform: Affine, surface: &mut dyn Surface) {
        let style = &element.style;
        let opacity = style.opacity.clamp(0.0, 1.0);

        if let Some(fill) = style.fill_color.filter(|c| !c.is_transparent()) {
            let fill_path = hand_drawn(path, style.roughness * FILL_ROUGHNESS, self.zoom, style.seed, 0);
            surface.fill(transform, paint(theme.resolve(fill), opacity), &fill_path);
        }

        if style.stroke_width <= 0.0 || style.stroke_color.is_transparent() {
            return;
        }
        let color = paint(theme.resolve(style.stroke_color), opacity);
        let stroke = ink_stroke(style.stroke_width);
        if style.roughness > 0.0 {
            for pass in 0..ROUGH_PASSES {
                let rough = hand_drawn(path, style.roughness, self.zoom, style.seed, pass);
                surface.stroke(&stroke, transform, color, &rough);
            }
        } else {
            surface.stroke(&stroke, transform, color, path);
        }
    }

    /// Dashed bounds outline, plus corner handles for resizable elements.
    /// Sizes are divided by the zoom so they stay constant on screen.
    pub fn render_selection(&self, element: &Element, transform: Affine, color: Color, surface: &mut dyn Surface) {
        let transform = transform * element_transform(element);
        let bounds = element_bounds(element);
        let dash = 4.0 / self.zoom;
        let outline = Stroke::new(1.0 / self.zoom).with_dashes(0.0, [dash, dash]);
        surface.stroke(&outline, transform, color, &bounds.to_path(0.1));

        let size = HANDLE_SIZE / self.zoom;
        let border = Stroke::new(1.5 / self.zoom);
        for handle in handles(element) {
            let square = Rect::from_center_size(handle.position, (size, size)).to_path(0.1);
            surface.fill(transform, Color::WHITE, &square);
            surface.stroke(&border, transform, color, &square);
        }
    }
}

impl Renderer for SceneRenderer {
    fn render(&mut self, ctx: &RenderContext, surface: &mut dyn Surface) {
        self.zoom = ctx.zoom.max(f64::EPSILON);
        self.images.begin_frame();
        surface.clear(ctx.background());

        for element in ctx.elements {
            self.render_element(element, ctx.transform, ctx.theme, surface);
        }

        if ctx.show_selection {
            for element in ctx.elements.iter().filter(|e| ctx.is_selected(e.id)) {
                self.render_selection(element, ctx.transform, ctx.selection_color, surface);
            }
        }

        if let Some(current) = ctx.current {
            self.render_element(current, ctx.transform, ctx.theme, surface);
        }
    }

    fn process_pending(&mut self) -> bool {
        self.images.process_pending()
    }
}

/// Convert a stored color to a draw color, scaling alpha by `opacity`.
fn paint(color: Rgba, opacity: f64) -> Color {
    color.with_opacity(opacity).into()
}

fn ink_stroke(width: f64) -> Stroke {
    Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
}

/// The element's box with negative extents normalized.
fn box_rect(element: &Element) -> Rect {
    Rect::from_origin_size(element.position, (element.width, element.height)).abs()
}

/// Rotation about the center of the element's bounds.
pub fn element_transform(element: &Element) -> Affine {
    if element.rotation == 0.0 {
        return Affine::IDENTITY;
    }
    Affine::rotate_about(element.rotation, element_bounds(element).center())
}

/// Freehand smoothing: quadratic curves through the midpoints between
/// samples, finishing with a straight segment to the last sample.
pub fn smooth_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for pair in rest.windows(2) {
        path.quad_to(pair[0], pair[0].midpoint(pair[1]));
    }
    if let Some(last) = rest.last() {
        path.line_to(*last);
    }
    path
}

/// Tips of the two arrow head segments.
pub fn arrow_head(start: Point, end: Point) -> [Point; 2] {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    [angle - ARROW_HEAD_ANGLE, angle + ARROW_HEAD_ANGLE].map(|a| {
        Point::new(
            end.x - ARROW_HEAD_LENGTH * a.cos(),
            end.y - ARROW_HEAD_LENGTH * a.sin(),
        )
    })
}

fn arrow_path(start: Point, end: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(start);
    path.line_to(end);
    for tip in arrow_head(start, end) {
        path.move_to(end);
        path.line_to(tip);
    }
    path
}

/// Gray box with an X, for images that failed to decode.
fn render_placeholder(rect: Rect, transform: Affine, surface: &mut dyn Surface) {
    let body = rect.to_path(0.1);
    surface.fill(transform, PLACEHOLDER_FILL.into(), &body);

    let mut cross = BezPath::new();
    cross.move_to(Point::new(rect.x0, rect.y0));
    cross.line_to(Point::new(rect.x1, rect.y1));
    cross.move_to(Point::new(rect.x1, rect.y0));
    cross.line_to(Point::new(rect.x0, rect.y1));
    let stroke = Stroke::new(2.0);
    surface.stroke(&stroke, transform, PLACEHOLDER_CROSS.into(), &cross);
    surface.stroke(&stroke, transform, PLACEHOLDER_BORDER.into(), &body);
}
