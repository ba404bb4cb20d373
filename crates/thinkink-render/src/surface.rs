//! Drawing surfaces.
//!
//! [`Surface`] is the seam between the scene renderer and a backend. The
//! renderer never touches pixels itself; it issues fills, strokes, text and
//! images with an explicit transform, the same shape of calls a Vello scene
//! takes.

use crate::image_cache::DecodedImage;
use kurbo::{Affine, BezPath, Point, Rect, Stroke};
use peniko::Color;
use std::sync::Arc;

/// A backend that can draw the primitives the renderer emits.
pub trait Surface {
    /// Fill the whole surface, ignoring any transform.
    fn clear(&mut self, color: Color);

    /// Fill a path (non-zero winding).
    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath);

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath);

    /// Stroke a path with a soft halo of radius `blur` in the stroke color.
    fn glow_stroke(&mut self, style: &Stroke, transform: Affine, color: Color, blur: f64, path: &BezPath);

    /// Draw a single line of text with its baseline starting at `origin`.
    fn text(&mut self, transform: Affine, origin: Point, text: &str, font_size: f64, color: Color);

    /// Draw a decoded image stretched over `dest`.
    fn image(&mut self, transform: Affine, image: &Arc<DecodedImage>, dest: Rect, opacity: f64);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    Fill {
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    Stroke {
        style: Stroke,
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    GlowStroke {
        style: Stroke,
        blur: f64,
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    Text {
        transform: Affine,
        origin: Point,
        text: String,
        font_size: f64,
        color: Color,
    },
    Image {
        transform: Affine,
        image: Arc<DecodedImage>,
        dest: Rect,
        opacity: f64,
    },
}

/// A surface that records draw calls instead of executing them.
///
/// Hosts with their own GPU backend replay the list each frame; tests use it
/// to inspect what a frame contains.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Text of every text command, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Replay the recorded calls onto another surface.
    pub fn replay(&self, target: &mut dyn Surface) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear { color } => target.clear(*color),
                DrawCommand::Fill {
                    transform,
                    color,
                    path,
                } => target.fill(*transform, *color, path),
                DrawCommand::Stroke {
                    style,
                    transform,
                    color,
                    path,
                } => target.stroke(style, *transform, *color, path),
                DrawCommand::GlowStroke {
                    style,
                    blur,
                    transform,
                    color,
                    path,
                } => target.glow_stroke(style, *transform, *color, *blur, path),
                DrawCommand::Text {
                    transform,
                    origin,
                    text,
                    font_size,
                    color,
                } => target.text(*transform, *origin, text, *font_size, *color),
                DrawCommand::Image {
                    transform,
                    image,
                    dest,
                    opacity,
                } => target.image(*transform, image, *dest, *opacity),
            }
        }
    }
}

impl Surface for DisplayList {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear { color });
    }

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Fill {
            transform,
            color,
            path: path.clone(),
        });
    }

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Stroke {
            style: style.clone(),
            transform,
            color,
            path: path.clone(),
        });
    }

    fn glow_stroke(&mut self, style: &Stroke, transform: Affine, color: Color, blur: f64, path: &BezPath) {
        self.commands.push(DrawCommand::GlowStroke {
            style: style.clone(),
            blur,
            transform,
            color,
            path: path.clone(),
        });
    }

    fn text(&mut self, transform: Affine, origin: Point, text: &str, font_size: f64, color: Color) {
        self.commands.push(DrawCommand::Text {
            transform,
            origin,
            text: text.to_string(),
            font_size,
            color,
        });
    }

    fn image(&mut self, transform: Affine, image: &Arc<DecodedImage>, dest: Rect, opacity: f64) {
        self.commands.push(DrawCommand::Image {
            transform,
            image: Arc::clone(image),
            dest,
            opacity,
        });
    }
}
