//! ThinkInk Core Library
//!
//! Platform-agnostic data model and editing logic for the ThinkInk
//! whiteboard: elements, viewport math, hit testing, undo history, input
//! handling, disappearing ink and local persistence. Rendering lives in
//! `thinkink-render`.

pub mod board;
pub mod document;
pub mod element;
pub mod fade;
pub mod geometry;
pub mod history;
pub mod input;
pub mod interaction;
pub mod selection;
pub mod settings;
pub mod storage;
pub mod store;
pub mod tools;
pub mod viewport;

pub use board::Whiteboard;
pub use document::{Document, DocumentError, export_to_json, import_from_json};
pub use element::{Element, ElementId, ElementKind, ElementStyle, ImageData, ImageFormat, Rgba};
pub use fade::{FadeReport, FadeScheduler};
pub use history::History;
pub use input::{Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{EditContext, ImagePlacement, InteractionController};
pub use settings::Settings;
pub use store::{ElementPatch, ElementStore, Snapshot};
pub use tools::{ToolKind, ToolManager};
pub use viewport::{Viewport, ViewportPatch};
