//! CPU raster backend and PNG export.
//!
//! [`RasterSurface`] executes draw calls into a tiny-skia pixmap. Text needs
//! a font; without one, text commands are skipped.

use crate::image_cache::DecodedImage;
use crate::pipeline::SceneRenderer;
use crate::renderer::{ExportError, RenderContext, RenderResult, Renderer, RendererError};
use crate::surface::Surface;
use crate::theme::Theme;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use kurbo::{Affine, BezPath, Cap, Join, PathEl, Point, Rect, Size, Stroke};
use peniko::Color;
use std::path::Path;
use std::sync::Arc;
use thinkink_core::element::{Element, ElementKind, Rgba};
use thinkink_core::geometry::union_bounds;
use thinkink_core::settings::DEFAULT_IMAGE_CACHE_CAPACITY;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    StrokeDash, Transform,
};

/// Blank margin around exported content, in canvas units.
pub const EXPORT_PADDING: f64 = 20.0;

/// Largest exported edge, in pixels.
pub const MAX_EXPORT_DIMENSION: u32 = 16_384;

/// Halo rings drawn for a glow stroke.
const GLOW_RINGS: u32 = 4;
const GLOW_RING_ALPHA: f32 = 0.12;

/// A tiny-skia pixmap that implements [`Surface`].
pub struct RasterSurface {
    pixmap: Pixmap,
    font: Option<FontArc>,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RendererError::InvalidSize(width, height))?;
        Ok(Self { pixmap, font: None })
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn set_font(&mut self, font: Option<FontArc>) {
        self.font = font;
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::new(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Straight-alpha RGBA8 rows, top to bottom.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Encode the surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let rgba = self.to_rgba();
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width(), self.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| ExportError::Encode(e.to_string()))?;
            writer
                .write_image_data(&rgba)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
        Ok(png_data)
    }

    fn paint(color: Color) -> Paint<'static> {
        let c = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(c.r, c.g, c.b, c.a);
        paint.anti_alias = true;
        paint
    }

    fn stroke_path(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        self.pixmap.stroke_path(
            &path,
            &Self::paint(color),
            &to_skia_stroke(style),
            to_skia_transform(transform),
            None,
        );
    }
}

/// Load a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> RenderResult<FontArc> {
    let bytes = std::fs::read(path).map_err(|e| RendererError::Font(format!("{}: {}", path.display(), e)))?;
    FontArc::try_from_vec(bytes).map_err(|e| RendererError::Font(format!("{}: {}", path.display(), e)))
}

impl Surface for RasterSurface {
    fn clear(&mut self, color: Color) {
        let c = color.to_rgba8();
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
    }

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &Self::paint(color),
            FillRule::Winding,
            to_skia_transform(transform),
            None,
        );
    }

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        self.stroke_path(style, transform, color, path);
    }

    fn glow_stroke(&mut self, style: &Stroke, transform: Affine, color: Color, blur: f64, path: &BezPath) {
        // Approximate a blurred shadow with widening translucent rings.
        let ring_color = color.multiply_alpha(GLOW_RING_ALPHA);
        for ring in (1..=GLOW_RINGS).rev() {
            let mut halo = style.clone();
            halo.width = style.width + blur * ring as f64 / GLOW_RINGS as f64;
            self.stroke_path(&halo, transform, ring_color, path);
        }
        self.stroke_path(style, transform, color, path);
    }

    fn text(&mut self, transform: Affine, origin: Point, text: &str, font_size: f64, color: Color) {
        let Some(font) = self.font.as_ref() else {
            log::debug!("No font loaded, skipping text");
            return;
        };
        // Rasterize at device resolution, then map back into canvas space.
        let device_scale = transform_scale(transform);
        let px = (font_size * device_scale) as f32;
        if px <= 0.0 || text.is_empty() {
            return;
        }
        let scaled = font.as_scaled(PxScale::from(px));
        let ascent = scaled.ascent();
        let height = ascent - scaled.descent();

        let mut caret = 0.0f32;
        let mut prev = None;
        let mut glyphs = Vec::new();
        for c in text.chars() {
            let id = font.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(px, point(caret + 1.0, ascent + 1.0)));
            caret += scaled.h_advance(id);
            prev = Some(id);
        }

        let width = caret.ceil() as u32 + 2;
        let rows = height.ceil() as u32 + 2;
        let Some(mut layer) = Pixmap::new(width, rows) else {
            return;
        };
        let ink = color.to_rgba8();
        let pixels = layer.pixels_mut();
        for glyph in glyphs {
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                let gx = bounds.min.x as i64 + x as i64;
                let gy = bounds.min.y as i64 + y as i64;
                if gx < 0 || gy < 0 || gx >= width as i64 || gy >= rows as i64 {
                    return;
                }
                let idx = gy as usize * width as usize + gx as usize;
                let alpha = (ink.a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
                if alpha > pixels[idx].alpha() {
                    pixels[idx] = ColorU8::from_rgba(ink.r, ink.g, ink.b, alpha).premultiply();
                }
            });
        }

        let placement = transform
            * Affine::translate(origin.to_vec2())
            * Affine::scale(1.0 / device_scale)
            * Affine::translate((-1.0, -(ascent as f64 + 1.0)));
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            to_skia_transform(placement),
            None,
        );
    }

    fn image(&mut self, transform: Affine, image: &Arc<DecodedImage>, dest: Rect, opacity: f64) {
        let Some(source) = to_pixmap(image) else {
            return;
        };
        let placement = transform
            * Affine::translate(dest.origin().to_vec2())
            * Affine::scale_non_uniform(
                dest.width() / image.width as f64,
                dest.height() / image.height as f64,
            );
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0) as f32,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, to_skia_transform(placement), None);
    }
}

fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

/// Uniform scale factor of a transform (geometric mean of the axes).
fn transform_scale(affine: Affine) -> f64 {
    let det = affine.determinant().abs();
    if det > 0.0 { det.sqrt() } else { 1.0 }
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn to_skia_stroke(style: &Stroke) -> tiny_skia::Stroke {
    let line_cap = match style.start_cap {
        Cap::Butt => LineCap::Butt,
        Cap::Round => LineCap::Round,
        Cap::Square => LineCap::Square,
    };
    let line_join = match style.join {
        Join::Bevel => LineJoin::Bevel,
        Join::Miter => LineJoin::Miter,
        Join::Round => LineJoin::Round,
    };
    let dash = if style.dash_pattern.is_empty() {
        None
    } else {
        StrokeDash::new(
            style.dash_pattern.iter().map(|d| *d as f32).collect(),
            style.dash_offset as f32,
        )
    };
    tiny_skia::Stroke {
        width: style.width as f32,
        miter_limit: style.miter_limit as f32,
        line_cap,
        line_join,
        dash,
    }
}

fn to_pixmap(image: &DecodedImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width, image.height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// Options for raster export.
#[derive(Clone, Debug)]
pub struct PngExportOptions {
    /// Output pixels per canvas unit.
    pub scale: f64,
    pub theme: Theme,
    pub font: Option<FontArc>,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            theme: Theme::Light,
            font: None,
        }
    }
}

/// Bounds of all elements plus [`EXPORT_PADDING`] on every side.
pub fn export_bounds(elements: &[Element]) -> Option<Rect> {
    union_bounds(elements).map(|b| b.inflate(EXPORT_PADDING, EXPORT_PADDING))
}

/// Render `elements` into a fresh surface sized to their bounds.
///
/// The viewport is ignored: content is placed relative to its own bounds.
/// Images are decoded before drawing so the export never shows a pending
/// frame.
pub fn render_elements(
    elements: &[Element],
    options: &PngExportOptions,
    renderer: &mut SceneRenderer,
) -> Result<RasterSurface, ExportError> {
    let bounds = export_bounds(elements).ok_or(ExportError::EmptyDocument)?;
    let scale = if options.scale.is_finite() && options.scale > 0.0 {
        options.scale
    } else {
        1.0
    };
    let width = (bounds.width() * scale).ceil();
    let height = (bounds.height() * scale).ceil();
    let max = MAX_EXPORT_DIMENSION as f64;
    if !(1.0..=max).contains(&width) || !(1.0..=max).contains(&height) {
        return Err(ExportError::InvalidSize(width as u32, height as u32));
    }

    let mut surface = RasterSurface::new(width as u32, height as u32)?;
    surface.set_font(options.font.clone());

    for element in elements {
        if let ElementKind::Image { image } = &element.kind {
            renderer.image_state(image);
        }
    }
    renderer.process_pending();

    let transform = Affine::scale(scale) * Affine::translate(-bounds.origin().to_vec2());
    let ctx = RenderContext::for_elements(elements, Size::new(width, height))
        .with_theme(options.theme)
        .with_transform(transform, scale);
    renderer.render(&ctx, &mut surface);
    log::info!("Rendered {} elements at {}x{}", elements.len(), width, height);
    Ok(surface)
}

/// Export `elements` as PNG bytes.
pub fn export_png(elements: &[Element], options: &PngExportOptions) -> Result<Vec<u8>, ExportError> {
    let images = elements
        .iter()
        .filter(|e| matches!(e.kind, ElementKind::Image { .. }))
        .count();
    let mut renderer = SceneRenderer::with_cache_capacity(images.max(DEFAULT_IMAGE_CACHE_CAPACITY));
    render_elements(elements, options, &mut renderer)?.encode_png()
}
