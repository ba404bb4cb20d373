//! ThinkInk Render Library
//!
//! Turns the element collection into draw calls. [`SceneRenderer`] emits a
//! frame onto any [`Surface`]; [`DisplayList`] records it for a host backend
//! and [`RasterSurface`] rasterizes it on the CPU for PNG export.

pub mod image_cache;
mod pipeline;
pub mod raster;
mod renderer;
pub mod rough;
mod surface;
pub mod svg;
pub mod theme;

pub use image_cache::{DecodedImage, ImageCache, ImageState};
pub use pipeline::{
    ARROW_HEAD_ANGLE, ARROW_HEAD_LENGTH, GLOW_BLUR, SceneRenderer, arrow_head, element_transform, smooth_path,
};
pub use raster::{PngExportOptions, RasterSurface, export_png, load_font, render_elements};
pub use renderer::{ExportError, RenderContext, RenderResult, Renderer, RendererError, SELECTION_COLOR};
pub use surface::{DisplayList, DrawCommand, Surface};
pub use svg::export_svg;
pub use theme::Theme;
