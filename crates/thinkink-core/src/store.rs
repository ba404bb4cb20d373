//! Element store: the canonical element collection plus selection, viewport,
//! in-progress element and clipboard.
//!
//! The collection lives behind an `Arc` and every mutation goes through
//! `Arc::make_mut`, so snapshots handed to the history engine are never
//! changed after the fact and taking one is O(1).

use crate::element::{Element, ElementId, Rgba};
use crate::geometry::{self, hit_test};
use crate::viewport::{Viewport, ViewportPatch};
use kurbo::{Point, Rect, Vec2};
use std::sync::Arc;

/// Immutable copy of the element collection at one instant.
pub type Snapshot = Arc<Vec<Element>>;

/// Default translation applied to each successive paste.
pub const DEFAULT_PASTE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// Partial element update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub stroke_color: Option<Rgba>,
    /// `Some(None)` clears the fill.
    pub fill_color: Option<Option<Rgba>>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub roughness: Option<f64>,
}

impl ElementPatch {
    pub fn opacity(opacity: f64) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Merge the set fields into `element`.
    pub fn apply_to(&self, element: &mut Element) {
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(width) = self.width {
            element.width = width;
        }
        if let Some(height) = self.height {
            element.height = height;
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(color) = self.stroke_color {
            element.style.stroke_color = color;
        }
        if let Some(fill) = self.fill_color {
            element.style.fill_color = fill;
        }
        if let Some(width) = self.stroke_width {
            element.style.stroke_width = width;
        }
        if let Some(opacity) = self.opacity {
            element.style.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(roughness) = self.roughness {
            element.style.roughness = roughness;
        }
    }
}

/// The whiteboard's mutable session state.
#[derive(Debug, Clone)]
pub struct ElementStore {
    elements: Snapshot,
    selection: Vec<ElementId>,
    viewport: Viewport,
    current: Option<Element>,
    clipboard: Vec<Element>,
    paste_offset: Vec2,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore {
    pub fn new() -> Self {
        Self::with_paste_offset(DEFAULT_PASTE_OFFSET)
    }

    pub fn with_paste_offset(paste_offset: Vec2) -> Self {
        Self {
            elements: Arc::new(Vec::new()),
            selection: Vec::new(),
            viewport: Viewport::default(),
            current: None,
            clipboard: Vec::new(),
            paste_offset,
        }
    }

    // --- queries ---

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// O(1) snapshot of the collection.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.elements)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    /// Selected elements in collection (z) order. Stale ids are skipped.
    pub fn selected_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |e| self.selection.contains(&e.id))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn current(&self) -> Option<&Element> {
        self.current.as_ref()
    }

    pub fn clipboard(&self) -> &[Element] {
        &self.clipboard
    }

    /// Ids of elements under `point`, topmost first.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<ElementId> {
        self.elements
            .iter()
            .rev()
            .filter(|e| hit_test(point, e, tolerance))
            .map(|e| e.id)
            .collect()
    }

    /// Topmost element under `point`.
    pub fn topmost_at(&self, point: Point, tolerance: f64) -> Option<&Element> {
        self.elements.iter().rev().find(|e| hit_test(point, e, tolerance))
    }

    /// Union of all element bounds.
    pub fn bounds(&self) -> Option<Rect> {
        geometry::union_bounds(self.elements.iter())
    }

    // --- mutations ---

    /// Append an element. The caller guarantees the id is unique.
    pub fn add(&mut self, element: Element) {
        Arc::make_mut(&mut self.elements).push(element);
    }

    /// Apply `f` to the element with `id`. Returns false when it doesn't exist.
    pub fn update(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) -> bool {
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        f(&mut Arc::make_mut(&mut self.elements)[index]);
        true
    }

    /// Merge a partial update into the element with `id`.
    pub fn update_with(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        self.update(id, |e| patch.apply_to(e))
    }

    /// Apply `f` to every selected element. Returns how many changed.
    pub fn update_selected(&mut self, mut f: impl FnMut(&mut Element)) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let selection = &self.selection;
        let mut count = 0;
        for element in Arc::make_mut(&mut self.elements).iter_mut() {
            if selection.contains(&element.id) {
                f(element);
                count += 1;
            }
        }
        count
    }

    /// Remove elements and prune them from the selection.
    /// Returns how many were removed.
    pub fn delete_many(&mut self, ids: &[ElementId]) -> usize {
        if ids.is_empty() || !self.elements.iter().any(|e| ids.contains(&e.id)) {
            self.selection.retain(|id| !ids.contains(id));
            return 0;
        }
        let before = self.elements.len();
        Arc::make_mut(&mut self.elements).retain(|e| !ids.contains(&e.id));
        self.selection.retain(|id| !ids.contains(id));
        before - self.elements.len()
    }

    /// Delete the selected elements.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.clone();
        self.delete_many(&ids)
    }

    /// Replace the selection. Duplicates are dropped, stale ids are kept.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.selection.clear();
        for id in ids {
            if !self.selection.contains(&id) {
                self.selection.push(id);
            }
        }
    }

    /// Add or remove one id from the selection.
    pub fn toggle_selection(&mut self, id: ElementId) {
        if let Some(index) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(index);
        } else {
            self.selection.push(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all(&mut self) {
        self.selection = self.elements.iter().map(|e| e.id).collect();
    }

    /// Drop selected ids whose elements no longer exist.
    pub fn prune_selection(&mut self) {
        let elements = &self.elements;
        self.selection.retain(|id| elements.iter().any(|e| e.id == *id));
    }

    pub fn set_viewport(&mut self, patch: ViewportPatch) {
        self.viewport.apply(patch);
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn set_current(&mut self, element: Option<Element>) {
        self.current = element;
    }

    pub fn current_mut(&mut self) -> Option<&mut Element> {
        self.current.as_mut()
    }

    pub fn take_current(&mut self) -> Option<Element> {
        self.current.take()
    }

    /// Replace the whole collection, e.g. from history or a loaded document.
    /// The selection is pruned to ids that still exist.
    pub fn set_elements(&mut self, elements: Snapshot) {
        self.elements = elements;
        self.prune_selection();
    }

    /// Remove all elements and clear the selection.
    pub fn clear(&mut self) {
        self.elements = Arc::new(Vec::new());
        self.selection.clear();
        self.current = None;
    }

    /// Snapshot the selection into the clipboard. Returns how many were copied.
    pub fn copy(&mut self) -> usize {
        self.clipboard = self.selected_elements().cloned().collect();
        self.clipboard.len()
    }

    /// Insert copies of the clipboard with fresh ids, offset from the previous
    /// paste. The copies become both the selection and the new clipboard.
    pub fn paste(&mut self) -> Vec<ElementId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let copies: Vec<Element> = self
            .clipboard
            .iter()
            .map(|e| e.duplicate(self.paste_offset))
            .collect();
        let ids: Vec<ElementId> = copies.iter().map(|e| e.id).collect();

        Arc::make_mut(&mut self.elements).extend(copies.iter().cloned());
        self.selection = ids.clone();
        self.clipboard = copies;
        ids
    }
}
