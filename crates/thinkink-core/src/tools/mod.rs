//! Tool system: which tool is active and how drawing tools build their
//! in-progress element.

use crate::element::{Element, ElementKind, ElementStyle, Rgba};
use crate::geometry::normalize_rect;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Ink color of the disappearing pen.
pub const DISAPPEARING_INK: Rgba = Rgba::rgb(0xf4, 0x72, 0xb6);

/// Minimum extent (or point count) for a drawn element to be kept.
pub const DEFAULT_COMMIT_THRESHOLD: f64 = 2.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Pen,
    DisappearingPen,
    Text,
    Image,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Line,
        ToolKind::Arrow,
        ToolKind::Pen,
        ToolKind::DisappearingPen,
        ToolKind::Text,
        ToolKind::Image,
    ];

    /// Single-key shortcut for this tool.
    pub fn shortcut(&self) -> char {
        match self {
            ToolKind::Select => 'v',
            ToolKind::Pan => 'h',
            ToolKind::Rectangle => 'r',
            ToolKind::Ellipse => 'o',
            ToolKind::Line => 'l',
            ToolKind::Arrow => 'a',
            ToolKind::Pen => 'p',
            ToolKind::DisappearingPen => 'd',
            ToolKind::Text => 't',
            ToolKind::Image => 'i',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|tool| tool.shortcut() == key)
    }

    /// Tools that create an element by dragging.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle
                | ToolKind::Ellipse
                | ToolKind::Line
                | ToolKind::Arrow
                | ToolKind::Pen
                | ToolKind::DisappearingPen
        )
    }
}

/// State of a drawing interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ToolState {
    #[default]
    Idle,
    /// A drawing gesture is in progress.
    Active {
        /// Anchor of the gesture in canvas space.
        start: Point,
        /// Latest pointer position in canvas space.
        current: Point,
    },
}

/// Manages the current tool and the style applied to new elements.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub current_tool: ToolKind,
    pub state: ToolState,
    pub current_style: ElementStyle,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: ElementStyle) -> Self {
        Self {
            current_style: style,
            ..Self::default()
        }
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.current_tool != tool {
            log::debug!("tool: {:?} -> {:?}", self.current_tool, tool);
        }
        self.current_tool = tool;
        self.state = ToolState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Active { .. })
    }

    /// Start a drawing gesture and build its in-progress element with zero
    /// extent. Returns None for tools that don't draw.
    pub fn begin(&mut self, point: Point, now_ms: u64) -> Option<Element> {
        if !self.current_tool.is_drawing() {
            return None;
        }
        self.state = ToolState::Active {
            start: point,
            current: point,
        };

        let style = self.current_style.reseeded();
        let element = match self.current_tool {
            ToolKind::Rectangle => Element::new(ElementKind::Rectangle, point, style),
            ToolKind::Ellipse => Element::new(ElementKind::Ellipse, point, style),
            ToolKind::Line => Element::line(point, point, style),
            ToolKind::Arrow => Element::arrow(point, point, style),
            ToolKind::Pen => Element::pen(&[point], style),
            ToolKind::DisappearingPen => {
                Element::disappearing_pen(&[point], now_ms, style.with_stroke_color(DISAPPEARING_INK))
            }
            ToolKind::Select | ToolKind::Pan | ToolKind::Text | ToolKind::Image => return None,
        };
        Some(element)
    }

    /// Grow the in-progress element towards `point`.
    pub fn update(&mut self, element: &mut Element, point: Point) {
        let ToolState::Active { start, current } = &mut self.state else {
            return;
        };
        *current = point;

        match &element.kind {
            ElementKind::Rectangle | ElementKind::Ellipse => {
                let rect = normalize_rect(start.x, start.y, point.x, point.y);
                element.position = rect.origin();
                element.width = rect.width();
                element.height = rect.height();
            }
            ElementKind::Line { .. } | ElementKind::Arrow { .. } => element.set_end_point(point),
            ElementKind::Pen { .. } | ElementKind::DisappearingPen { .. } => {
                element.push_point(point)
            }
            ElementKind::Text { .. } | ElementKind::Image { .. } => {}
        }
    }

    /// Finish the gesture. Returns its anchor and last point.
    pub fn end(&mut self) -> Option<(Point, Point)> {
        match std::mem::take(&mut self.state) {
            ToolState::Active { start, current } => Some((start, current)),
            ToolState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }
}

/// Whether a freshly drawn element is big enough to keep.
pub fn meets_commit_threshold(element: &Element, threshold: f64) -> bool {
    element.width > threshold || element.height > threshold || element.point_count() as f64 > threshold
}
