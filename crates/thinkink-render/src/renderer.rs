//! Renderer trait abstraction.

use crate::surface::Surface;
use crate::theme::Theme;
use kurbo::{Affine, Size};
use peniko::Color;
use thinkink_core::element::{Element, ElementId, Rgba};
use thinkink_core::store::ElementStore;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size: {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Font error: {0}")]
    Font(String),
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    EmptyDocument,
    #[error("Export size out of range: {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Selection outline color.
pub const SELECTION_COLOR: Rgba = Rgba::rgb(59, 130, 246);

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Elements in draw order.
    pub elements: &'a [Element],
    pub selection: &'a [ElementId],
    /// In-progress element, drawn on top.
    pub current: Option<&'a Element>,
    /// Canvas-to-surface transform.
    pub transform: Affine,
    /// Canvas scale, for zoom-independent decorations.
    pub zoom: f64,
    /// Surface size in pixels.
    pub viewport_size: Size,
    pub theme: Theme,
    /// Overrides the theme background.
    pub background_color: Option<Color>,
    pub selection_color: Color,
    pub show_selection: bool,
}

impl<'a> RenderContext<'a> {
    /// Frame context for the live board.
    pub fn new(store: &'a ElementStore, viewport_size: Size) -> Self {
        let viewport = store.viewport();
        Self {
            elements: store.elements(),
            selection: store.selection(),
            current: store.current(),
            transform: viewport.transform(),
            zoom: viewport.zoom,
            viewport_size,
            theme: Theme::default(),
            background_color: None,
            selection_color: SELECTION_COLOR.into(),
            show_selection: true,
        }
    }

    /// Context for drawing bare elements, e.g. for export.
    pub fn for_elements(elements: &'a [Element], viewport_size: Size) -> Self {
        Self {
            elements,
            selection: &[],
            current: None,
            transform: Affine::IDENTITY,
            zoom: 1.0,
            viewport_size,
            theme: Theme::Light,
            background_color: None,
            selection_color: SELECTION_COLOR.into(),
            show_selection: false,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_transform(mut self, transform: Affine, zoom: f64) -> Self {
        self.transform = transform;
        self.zoom = zoom;
        self
    }

    pub fn with_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }

    pub fn background(&self) -> Color {
        self.background_color
            .unwrap_or_else(|| self.theme.background().into())
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Draw one frame onto `surface`.
    fn render(&mut self, ctx: &RenderContext, surface: &mut dyn Surface);

    /// Finish background work (image decodes). Returns true when the next
    /// frame would look different.
    fn process_pending(&mut self) -> bool {
        false
    }
}
