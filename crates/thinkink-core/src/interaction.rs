//! Interaction controller: turns pointer and keyboard events into store,
//! history and viewport changes.
//!
//! The controller owns no document state. Every handler receives an
//! [`EditContext`] with the store and history it should act on, reads the
//! viewport once on entry, and returns whether the scene needs a redraw.

use crate::element::{Element, ImageData};
use crate::fade::now_millis;
use crate::geometry::DEFAULT_HIT_TOLERANCE;
use crate::history::History;
use crate::input::{Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::selection::{HANDLE_HIT_TOLERANCE, MIN_RESIZE_EXTENT, ResizeState, hit_test_handles};
use crate::settings::Settings;
use crate::store::{ElementStore, Snapshot};
use crate::tools::{DEFAULT_COMMIT_THRESHOLD, ToolKind, ToolManager, meets_commit_threshold};
use kurbo::{Point, Vec2};
use std::collections::VecDeque;
use std::sync::Arc;

/// Screen position where clipboard images land.
pub const PASTE_SCREEN_POSITION: Point = Point::new(100.0, 100.0);

/// Store and history an event handler acts on.
pub struct EditContext<'a> {
    pub store: &'a mut ElementStore,
    pub history: &'a mut History,
}

impl<'a> EditContext<'a> {
    pub fn new(store: &'a mut ElementStore, history: &'a mut History) -> Self {
        Self { store, history }
    }

    /// Record the current collection before a mutation.
    fn checkpoint(&mut self) {
        self.history.record(self.store);
    }
}

/// Thresholds used by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionConfig {
    pub hit_tolerance: f64,
    pub commit_threshold: f64,
    pub min_resize_extent: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            min_resize_extent: MIN_RESIZE_EXTENT,
        }
    }
}

impl From<&Settings> for InteractionConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            hit_tolerance: settings.hit_tolerance,
            commit_threshold: settings.commit_threshold,
            min_resize_extent: settings.min_resize_extent,
        }
    }
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Panning {
        last_screen: Point,
    },
    Dragging {
        last: Point,
        before: Snapshot,
        moved: bool,
    },
    Resizing {
        state: ResizeState,
        before: Snapshot,
        moved: bool,
    },
    Drawing,
}

/// Text being typed before it becomes an element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    /// Baseline-left anchor in canvas space.
    pub anchor: Point,
    pub text: String,
}

/// Where an imported image is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImagePlacement {
    /// Pasted from the system clipboard.
    Paste,
    /// Dropped at a screen position.
    Drop(Point),
}

#[derive(Debug, Clone)]
struct PendingImage {
    bytes: Vec<u8>,
    placement: ImagePlacement,
}

/// Translates input events into edits.
pub struct InteractionController {
    pub tools: ToolManager,
    config: InteractionConfig,
    gesture: Gesture,
    space_held: bool,
    text_entry: Option<TextEntry>,
    pending_images: VecDeque<PendingImage>,
    clock: Arc<dyn Fn() -> u64 + Send + Sync>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("tool", &self.tools.current_tool)
            .field("gesture", &self.gesture)
            .field("text_entry", &self.text_entry)
            .field("pending_images", &self.pending_images.len())
            .finish()
    }
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            tools: ToolManager::new(),
            config,
            gesture: Gesture::Idle,
            space_held: false,
            text_entry: None,
            pending_images: VecDeque::new(),
            clock: Arc::new(now_millis),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut controller = Self::new(InteractionConfig::from(settings));
        controller.tools.current_style = settings.default_style.clone();
        controller
    }

    /// Replace the millisecond clock used to stamp disappearing ink.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.text_entry.as_ref()
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. } | Gesture::Resizing { .. })
    }

    pub fn has_pending_images(&self) -> bool {
        !self.pending_images.is_empty()
    }

    /// Switch tools. Any drawing or text entry in progress is dropped.
    pub fn set_tool(&mut self, store: &mut ElementStore, tool: ToolKind) {
        if matches!(self.gesture, Gesture::Drawing) {
            store.set_current(None);
            self.gesture = Gesture::Idle;
        }
        self.text_entry = None;
        self.tools.set_tool(tool);
    }

    // --- pointer ---

    pub fn handle_pointer(&mut self, cx: &mut EditContext<'_>, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(cx, position, button, modifiers),
            PointerEvent::Move { position } => self.pointer_move(cx, position),
            PointerEvent::Up { position, .. } => self.pointer_up(cx, position),
            PointerEvent::Scroll { position, delta } => {
                cx.store.viewport_mut().wheel_zoom(position, delta.y);
                true
            }
        }
    }

    pub fn pointer_down(
        &mut self,
        cx: &mut EditContext<'_>,
        screen: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> bool {
        let viewport = *cx.store.viewport();
        let canvas = viewport.screen_to_canvas(screen);

        if button == MouseButton::Middle || self.space_held || self.tools.current_tool == ToolKind::Pan {
            self.gesture = Gesture::Panning { last_screen: screen };
            return false;
        }
        if button != MouseButton::Left {
            return false;
        }

        let committed = self.commit_text(cx);

        match self.tools.current_tool {
            ToolKind::Select => {
                self.select_at(cx, canvas, modifiers, viewport.zoom);
                true
            }
            ToolKind::Text => {
                self.text_entry = Some(TextEntry {
                    anchor: canvas,
                    text: String::new(),
                });
                true
            }
            ToolKind::Image | ToolKind::Pan => committed,
            _ => {
                let now = (self.clock)();
                match self.tools.begin(canvas, now) {
                    Some(element) => {
                        cx.store.set_current(Some(element));
                        self.gesture = Gesture::Drawing;
                        true
                    }
                    None => committed,
                }
            }
        }
    }

    fn select_at(&mut self, cx: &mut EditContext<'_>, canvas: Point, modifiers: Modifiers, zoom: f64) {
        let store = &mut *cx.store;

        // Resize handles of a lone selected image or text win over hit testing.
        if let [only] = store.selection() {
            if let Some(element) = store.get(*only).filter(|e| e.is_resizable()) {
                if let Some(corner) = hit_test_handles(element, canvas, HANDLE_HIT_TOLERANCE / zoom) {
                    self.gesture = Gesture::Resizing {
                        state: ResizeState::new(element.clone(), corner),
                        before: store.snapshot(),
                        moved: false,
                    };
                    return;
                }
            }
        }

        let hit = store.topmost_at(canvas, self.config.hit_tolerance).map(|e| e.id);
        match hit {
            Some(id) => {
                if modifiers.shift {
                    store.toggle_selection(id);
                } else if !store.is_selected(id) {
                    store.set_selection([id]);
                }
                if store.is_selected(id) {
                    self.gesture = Gesture::Dragging {
                        last: canvas,
                        before: store.snapshot(),
                        moved: false,
                    };
                }
            }
            None => store.clear_selection(),
        }
    }

    pub fn pointer_move(&mut self, cx: &mut EditContext<'_>, screen: Point) -> bool {
        let viewport = *cx.store.viewport();
        let canvas = viewport.screen_to_canvas(screen);

        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Panning { last_screen } => {
                let delta = screen - *last_screen;
                *last_screen = screen;
                cx.store.viewport_mut().pan(delta);
                true
            }
            Gesture::Dragging { last, moved, .. } => {
                let delta = canvas - *last;
                *last = canvas;
                if delta == Vec2::ZERO {
                    return false;
                }
                cx.store.update_selected(|e| e.translate(delta));
                *moved = true;
                true
            }
            Gesture::Resizing { state, moved, .. } => {
                let resized = state.apply(canvas, self.config.min_resize_extent);
                let changed = cx.store.get(state.id).is_some_and(|e| *e != resized);
                if changed {
                    cx.store.update(state.id, |e| *e = resized);
                    *moved = true;
                }
                changed
            }
            Gesture::Drawing => {
                if let Some(element) = cx.store.current_mut() {
                    self.tools.update(element, canvas);
                }
                true
            }
        }
    }

    pub fn pointer_up(&mut self, cx: &mut EditContext<'_>, screen: Point) -> bool {
        if matches!(self.gesture, Gesture::Drawing) {
            self.pointer_move(cx, screen);
        }
        self.finish_gesture(cx)
    }

    fn finish_gesture(&mut self, cx: &mut EditContext<'_>) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => false,
            Gesture::Panning { .. } => false,
            Gesture::Dragging { before, moved, .. } | Gesture::Resizing { before, moved, .. } => {
                // The pre-gesture collection is pushed once, after the fact.
                if moved {
                    cx.history.push_state(before);
                }
                moved
            }
            Gesture::Drawing => {
                self.tools.end();
                let Some(element) = cx.store.take_current() else {
                    return false;
                };
                if meets_commit_threshold(&element, self.config.commit_threshold) {
                    log::debug!("commit {} {}", element.kind.name(), element.id);
                    cx.checkpoint();
                    cx.store.add(element);
                }
                true
            }
        }
    }

    // --- keyboard ---

    pub fn handle_key(&mut self, cx: &mut EditContext<'_>, event: KeyEvent) -> bool {
        match event {
            KeyEvent::Pressed { key, modifiers } => self.key_down(cx, key, modifiers),
            KeyEvent::Released { key } => {
                if key == Key::Space {
                    self.space_held = false;
                }
                false
            }
        }
    }

    pub fn key_down(&mut self, cx: &mut EditContext<'_>, key: Key, modifiers: Modifiers) -> bool {
        if self.text_entry.is_some() && !modifiers.command() {
            return self.text_key(cx, key);
        }

        if modifiers.command() {
            return match key {
                Key::Char('z') if modifiers.shift => self.redo(cx),
                Key::Char('z') => self.undo(cx),
                Key::Char('y') => self.redo(cx),
                Key::Char('c') => {
                    cx.store.copy();
                    false
                }
                Key::Char('v') => self.paste(cx),
                Key::Char('a') => {
                    cx.store.select_all();
                    true
                }
                _ => false,
            };
        }

        match key {
            Key::Space => {
                self.space_held = true;
                false
            }
            Key::Escape => self.escape(cx),
            Key::Delete | Key::Backspace => self.delete_selected(cx),
            Key::Char(c) => match ToolKind::from_shortcut(c) {
                Some(tool) => {
                    self.set_tool(cx.store, tool);
                    true
                }
                None => false,
            },
            Key::Enter => false,
        }
    }

    fn text_key(&mut self, cx: &mut EditContext<'_>, key: Key) -> bool {
        let Some(entry) = self.text_entry.as_mut() else {
            return false;
        };
        match key {
            Key::Char(c) => entry.text.push(c),
            Key::Space => entry.text.push(' '),
            Key::Backspace | Key::Delete => {
                entry.text.pop();
            }
            Key::Enter => {
                self.commit_text(cx);
            }
            Key::Escape => self.cancel_text(),
        }
        true
    }

    /// Append typed text to the open text entry.
    pub fn insert_text(&mut self, text: &str) -> bool {
        match self.text_entry.as_mut() {
            Some(entry) => {
                entry.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Turn the open text entry into an element. Blank text is discarded.
    pub fn commit_text(&mut self, cx: &mut EditContext<'_>) -> bool {
        let Some(entry) = self.text_entry.take() else {
            return false;
        };
        let text = entry.text.trim();
        if text.is_empty() {
            return false;
        }
        let element = Element::text(entry.anchor, text, self.tools.current_style.reseeded());
        cx.checkpoint();
        cx.store.add(element);
        true
    }

    pub fn cancel_text(&mut self) {
        self.text_entry = None;
    }

    fn escape(&mut self, cx: &mut EditContext<'_>) -> bool {
        if matches!(self.gesture, Gesture::Drawing) {
            cx.store.set_current(None);
            self.tools.cancel();
            self.gesture = Gesture::Idle;
        } else {
            self.finish_gesture(cx);
        }
        cx.store.clear_selection();
        true
    }

    // --- commands ---

    pub fn undo(&mut self, cx: &mut EditContext<'_>) -> bool {
        cx.history.undo(cx.store)
    }

    pub fn redo(&mut self, cx: &mut EditContext<'_>) -> bool {
        cx.history.redo(cx.store)
    }

    /// Paste the internal clipboard. Nothing happens when it is empty.
    pub fn paste(&mut self, cx: &mut EditContext<'_>) -> bool {
        if cx.store.clipboard().is_empty() {
            return false;
        }
        cx.checkpoint();
        !cx.store.paste().is_empty()
    }

    pub fn delete_selected(&mut self, cx: &mut EditContext<'_>) -> bool {
        if cx.store.selected_elements().next().is_none() {
            cx.store.clear_selection();
            return false;
        }
        cx.checkpoint();
        cx.store.delete_selected() > 0
    }

    // --- image import ---

    /// Queue encoded image bytes for insertion on the next
    /// [`process_imports`](Self::process_imports).
    pub fn queue_image(&mut self, bytes: Vec<u8>, placement: ImagePlacement) {
        self.pending_images.push_back(PendingImage { bytes, placement });
    }

    /// Decode queued images and insert them at their natural size.
    /// Undecodable payloads are logged and dropped. Returns whether anything
    /// was inserted.
    pub fn process_imports(&mut self, cx: &mut EditContext<'_>) -> bool {
        let mut inserted = false;
        while let Some(pending) = self.pending_images.pop_front() {
            let Some(data) = ImageData::from_bytes(&pending.bytes) else {
                log::warn!("Dropped image import: unrecognized format");
                continue;
            };
            let (width, height) = match image::load_from_memory(&pending.bytes) {
                Ok(img) => (img.width(), img.height()),
                Err(e) => {
                    log::warn!("Dropped image import: {}", e);
                    continue;
                }
            };

            let viewport = *cx.store.viewport();
            let position = match pending.placement {
                ImagePlacement::Paste => viewport.screen_to_canvas(PASTE_SCREEN_POSITION),
                ImagePlacement::Drop(screen) => viewport.screen_to_canvas(screen),
            };
            let element = Element::image(position, data, width as f64, height as f64);
            log::info!("Imported {}x{} image", width, height);
            cx.checkpoint();
            cx.store.add(element);
            inserted = true;
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use kurbo::Rect;

    struct Harness {
        store: ElementStore,
        history: History,
        controller: InteractionController,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: ElementStore::new(),
                history: History::default(),
                controller: InteractionController::default().with_clock(|| 10_000),
            }
        }

        fn tool(&mut self, tool: ToolKind) {
            self.controller.set_tool(&mut self.store, tool);
        }

        fn down(&mut self, x: f64, y: f64) -> bool {
            self.down_with(x, y, Modifiers::NONE)
        }

        fn down_with(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
            let mut cx = EditContext::new(&mut self.store, &mut self.history);
            self.controller
                .pointer_down(&mut cx, Point::new(x, y), MouseButton::Left, modifiers)
        }

        fn moved(&mut self, x: f64, y: f64) -> bool {
            let mut cx = EditContext::new(&mut self.store, &mut self.history);
            self.controller.pointer_move(&mut cx, Point::new(x, y))
        }

        fn up(&mut self, x: f64, y: f64) -> bool {
            let mut cx = EditContext::new(&mut self.store, &mut self.history);
            self.controller.pointer_up(&mut cx, Point::new(x, y))
        }

        fn drag(&mut self, from: (f64, f64), to: (f64, f64)) {
            self.down(from.0, from.1);
            self.moved((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
            self.moved(to.0, to.1);
            self.up(to.0, to.1);
        }

        fn key(&mut self, key: Key, modifiers: Modifiers) -> bool {
            let mut cx = EditContext::new(&mut self.store, &mut self.history);
            self.controller.key_down(&mut cx, key, modifiers)
        }
    }

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_draw_rectangle_commits() {
        let mut h = Harness::new();
        h.tool(ToolKind::Rectangle);
        h.drag((10.0, 10.0), (110.0, 60.0));

        assert_eq!(h.store.len(), 1);
        let rect = &h.store.elements()[0];
        assert!(matches!(rect.kind, ElementKind::Rectangle));
        assert_eq!(rect.position, Point::new(10.0, 10.0));
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
        assert!(h.store.current().is_none());
        assert!(h.history.can_undo());
    }

    #[test]
    fn test_click_without_drag_discards() {
        let mut h = Harness::new();
        h.tool(ToolKind::Ellipse);
        h.down(50.0, 50.0);
        assert!(h.store.current().is_some());
        h.up(50.0, 50.0);
        assert!(h.store.is_empty());
        assert!(!h.history.can_undo());
    }

    #[test]
    fn test_drawing_respects_viewport() {
        let mut h = Harness::new();
        h.store.viewport_mut().zoom = 2.0;
        h.store.viewport_mut().offset = Vec2::new(100.0, 0.0);
        h.tool(ToolKind::Line);
        h.drag((100.0, 0.0), (300.0, 100.0));
        let line = &h.store.elements()[0];
        assert_eq!(line.position, Point::ZERO);
        assert_eq!(line.points().unwrap()[1], Point::new(100.0, 50.0));
    }

    #[test]
    fn test_pen_needs_three_points() {
        let mut h = Harness::new();
        h.tool(ToolKind::Pen);
        h.down(0.0, 0.0);
        h.moved(1.0, 1.0);
        h.up(1.0, 1.0);
        // down + move + final move on release = 3 points
        assert_eq!(h.store.len(), 1);

        h.down(10.0, 10.0);
        h.up(10.0, 10.0);
        assert_eq!(h.store.len(), 1);
    }

    #[test]
    fn test_disappearing_pen_uses_clock() {
        let mut h = Harness::new();
        h.tool(ToolKind::DisappearingPen);
        h.drag((0.0, 0.0), (30.0, 30.0));
        assert!(matches!(
            h.store.elements()[0].kind,
            ElementKind::DisappearingPen { created_at: Some(10_000), .. }
        ));
    }

    #[test]
    fn test_select_delete_undo_scenario() {
        let mut h = Harness::new();
        h.tool(ToolKind::Rectangle);
        h.drag((10.0, 10.0), (110.0, 60.0));
        let drawn = h.store.elements().to_vec();

        h.tool(ToolKind::Select);
        h.down(50.0, 30.0);
        h.up(50.0, 30.0);
        assert_eq!(h.store.selection(), &[drawn[0].id]);

        assert!(h.key(Key::Delete, Modifiers::NONE));
        assert!(h.store.is_empty());
        assert!(h.store.selection().is_empty());

        assert!(h.key(Key::Char('z'), Modifiers::CTRL));
        assert_eq!(h.store.elements(), drawn.as_slice());
    }

    #[test]
    fn test_click_empty_space_clears_selection() {
        let mut h = Harness::new();
        let rect = Element::rectangle(Point::ZERO, 50.0, 50.0, Default::default());
        h.store.set_selection([rect.id]);
        h.store.add(rect);
        h.down(500.0, 500.0);
        assert!(h.store.selection().is_empty());
    }

    #[test]
    fn test_shift_click_toggles() {
        let mut h = Harness::new();
        let a = Element::rectangle(Point::ZERO, 50.0, 50.0, Default::default());
        let b = Element::rectangle(Point::new(100.0, 0.0), 50.0, 50.0, Default::default());
        let (ida, idb) = (a.id, b.id);
        h.store.add(a);
        h.store.add(b);

        h.down(10.0, 10.0);
        h.up(10.0, 10.0);
        h.down_with(110.0, 10.0, Modifiers::SHIFT);
        h.up(110.0, 10.0);
        assert_eq!(h.store.selection(), &[ida, idb]);

        h.down_with(10.0, 10.0, Modifiers::SHIFT);
        h.up(10.0, 10.0);
        assert_eq!(h.store.selection(), &[idb]);
    }

    #[test]
    fn test_drag_moves_group_with_one_snapshot() {
        let mut h = Harness::new();
        let a = Element::rectangle(Point::ZERO, 50.0, 50.0, Default::default());
        let b = Element::rectangle(Point::new(100.0, 0.0), 50.0, 50.0, Default::default());
        let (ida, idb) = (a.id, b.id);
        h.store.add(a);
        h.store.add(b);
        let before = h.store.snapshot();
        h.store.set_selection([ida, idb]);

        // Clicking a member keeps the whole group selected.
        h.down(10.0, 10.0);
        h.moved(15.0, 12.0);
        h.moved(30.0, 20.0);
        h.up(30.0, 20.0);

        assert_eq!(h.store.get(ida).unwrap().position, Point::new(20.0, 10.0));
        assert_eq!(h.store.get(idb).unwrap().position, Point::new(120.0, 10.0));
        assert_eq!(h.history.undo_depth(), 1);

        h.key(Key::Char('z'), Modifiers::CTRL);
        assert_eq!(h.store.elements(), before.as_slice());
    }

    #[test]
    fn test_click_without_move_records_nothing() {
        let mut h = Harness::new();
        let rect = Element::rectangle(Point::ZERO, 50.0, 50.0, Default::default());
        h.store.add(rect);
        h.down(10.0, 10.0);
        h.up(10.0, 10.0);
        assert!(!h.history.can_undo());
    }

    #[test]
    fn test_resize_image_handle() {
        let mut h = Harness::new();
        let data = ImageData::from_bytes(&tiny_png(4, 4)).unwrap();
        let img = Element::image(Point::new(100.0, 100.0), data, 100.0, 100.0);
        let id = img.id;
        h.store.add(img);
        h.store.set_selection([id]);

        h.down(200.0, 200.0);
        h.moved(250.0, 300.0);
        h.up(250.0, 300.0);

        let resized = h.store.get(id).unwrap();
        assert_eq!(resized.position, Point::new(100.0, 100.0));
        assert!((resized.width - 150.0).abs() < f64::EPSILON);
        assert!((resized.height - 200.0).abs() < f64::EPSILON);
        assert_eq!(h.history.undo_depth(), 1);
    }

    #[test]
    fn test_resize_without_size_change_keeps_history() {
        let mut h = Harness::new();
        let data = ImageData::from_bytes(&tiny_png(4, 4)).unwrap();
        let img = Element::image(Point::new(100.0, 100.0), data, 100.0, 100.0);
        let id = img.id;
        h.store.add(img.clone());
        h.store.set_selection([id]);

        h.down(200.0, 200.0);
        h.moved(200.0, 200.0);
        h.moved(200.0, 200.0);
        h.up(200.0, 200.0);

        assert_eq!(h.store.get(id), Some(&img));
        assert_eq!(h.history.undo_depth(), 0);
    }

    #[test]
    fn test_pan_with_space() {
        let mut h = Harness::new();
        h.tool(ToolKind::Rectangle);
        h.key(Key::Space, Modifiers::NONE);
        h.down(10.0, 10.0);
        h.moved(40.0, 30.0);
        h.up(40.0, 30.0);
        assert!(h.store.is_empty());
        assert_eq!(h.store.viewport().offset, Vec2::new(30.0, 20.0));

        let mut cx = EditContext::new(&mut h.store, &mut h.history);
        h.controller.handle_key(&mut cx, KeyEvent::Released { key: Key::Space });
        assert!(!h.controller.is_panning());
    }

    #[test]
    fn test_middle_button_pans() {
        let mut h = Harness::new();
        let mut cx = EditContext::new(&mut h.store, &mut h.history);
        h.controller
            .pointer_down(&mut cx, Point::ZERO, MouseButton::Middle, Modifiers::NONE);
        assert!(h.controller.is_panning());
        h.controller.pointer_move(&mut cx, Point::new(-5.0, 5.0));
        assert_eq!(cx.store.viewport().offset, Vec2::new(-5.0, 5.0));
    }

    #[test]
    fn test_tool_shortcuts() {
        let mut h = Harness::new();
        h.key(Key::Char('r'), Modifiers::NONE);
        assert_eq!(h.controller.tool(), ToolKind::Rectangle);
        h.key(Key::Char('d'), Modifiers::NONE);
        assert_eq!(h.controller.tool(), ToolKind::DisappearingPen);
        h.key(Key::Char('h'), Modifiers::NONE);
        assert_eq!(h.controller.tool(), ToolKind::Pan);
        h.key(Key::Char('v'), Modifiers::NONE);
        assert_eq!(h.controller.tool(), ToolKind::Select);
    }

    #[test]
    fn test_copy_paste_shortcuts() {
        let mut h = Harness::new();
        let rect = Element::rectangle(Point::ZERO, 50.0, 50.0, Default::default());
        h.store.set_selection([rect.id]);
        h.store.add(rect);

        assert!(!h.key(Key::Char('v'), Modifiers::CTRL));
        assert!(!h.history.can_undo());

        h.key(Key::Char('c'), Modifiers::CTRL);
        assert!(h.key(Key::Char('v'), Modifiers::CTRL));
        assert_eq!(h.store.len(), 2);
        assert_eq!(h.history.undo_depth(), 1);

        h.key(Key::Char('z'), Modifiers::CTRL);
        assert_eq!(h.store.len(), 1);
        h.key(Key::Char('z'), Modifiers { ctrl: true, shift: true, ..Modifiers::NONE });
        assert_eq!(h.store.len(), 2);
        h.key(Key::Char('z'), Modifiers::CTRL);
        h.key(Key::Char('y'), Modifiers::CTRL);
        assert_eq!(h.store.len(), 2);
    }

    #[test]
    fn test_escape_clears_selection_and_drawing() {
        let mut h = Harness::new();
        h.tool(ToolKind::Rectangle);
        h.down(0.0, 0.0);
        h.moved(50.0, 50.0);
        h.store.set_selection([uuid::Uuid::new_v4()]);
        h.key(Key::Escape, Modifiers::NONE);
        assert!(h.store.current().is_none());
        assert!(h.store.selection().is_empty());
        h.up(50.0, 50.0);
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_text_entry() {
        let mut h = Harness::new();
        h.tool(ToolKind::Text);
        h.down(20.0, 40.0);
        assert!(h.controller.text_entry().is_some());
        h.key(Key::Char('h'), Modifiers::NONE);
        h.key(Key::Char('i'), Modifiers::NONE);
        h.key(Key::Char('x'), Modifiers::NONE);
        h.key(Key::Backspace, Modifiers::NONE);
        assert_eq!(h.controller.tool(), ToolKind::Text);
        h.key(Key::Enter, Modifiers::NONE);

        assert_eq!(h.store.len(), 1);
        let text = &h.store.elements()[0];
        assert_eq!(text.text_content(), Some("hi"));
        assert_eq!(text.position, Point::new(20.0, 40.0));
        assert!(h.controller.text_entry().is_none());
    }

    #[test]
    fn test_blank_text_is_discarded() {
        let mut h = Harness::new();
        h.tool(ToolKind::Text);
        h.down(20.0, 40.0);
        h.controller.insert_text("   ");
        // clicking elsewhere commits the open entry
        h.down(100.0, 100.0);
        assert!(h.store.is_empty());
        assert!(!h.history.can_undo());
        h.key(Key::Escape, Modifiers::NONE);
        assert!(h.controller.text_entry().is_none());
    }

    #[test]
    fn test_image_paste_and_drop() {
        let mut h = Harness::new();
        h.store.viewport_mut().offset = Vec2::new(50.0, 50.0);
        h.controller.queue_image(tiny_png(8, 6), ImagePlacement::Paste);
        h.controller
            .queue_image(tiny_png(3, 2), ImagePlacement::Drop(Point::new(250.0, 150.0)));
        h.controller.queue_image(b"definitely not an image".to_vec(), ImagePlacement::Paste);

        let mut cx = EditContext::new(&mut h.store, &mut h.history);
        assert!(h.controller.process_imports(&mut cx));
        assert!(!h.controller.has_pending_images());

        assert_eq!(h.store.len(), 2);
        let pasted = &h.store.elements()[0];
        assert_eq!(pasted.position, Point::new(50.0, 50.0));
        assert!((pasted.width - 8.0).abs() < f64::EPSILON);
        assert!((pasted.height - 6.0).abs() < f64::EPSILON);
        let dropped = &h.store.elements()[1];
        assert_eq!(dropped.position, Point::new(200.0, 100.0));
        assert_eq!(h.history.undo_depth(), 2);
    }

    #[test]
    fn test_corrupt_image_is_dropped() {
        let mut h = Harness::new();
        let mut bytes = tiny_png(4, 4);
        bytes.truncate(20);
        h.controller.queue_image(bytes, ImagePlacement::Paste);
        let mut cx = EditContext::new(&mut h.store, &mut h.history);
        assert!(!h.controller.process_imports(&mut cx));
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_scroll_zooms_around_pointer() {
        let mut h = Harness::new();
        let anchor = Point::new(120.0, 80.0);
        let before = h.store.viewport().screen_to_canvas(anchor);
        let mut cx = EditContext::new(&mut h.store, &mut h.history);
        h.controller.handle_pointer(
            &mut cx,
            PointerEvent::Scroll {
                position: anchor,
                delta: Vec2::new(0.0, -200.0),
            },
        );
        let after = h.store.viewport().screen_to_canvas(anchor);
        assert!(h.store.viewport().zoom > 1.0);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_select_all() {
        let mut h = Harness::new();
        h.store.add(Element::rectangle(Point::ZERO, 5.0, 5.0, Default::default()));
        h.store.add(Element::rectangle(Point::new(50.0, 0.0), 5.0, 5.0, Default::default()));
        h.key(Key::Char('a'), Modifiers::CTRL);
        assert_eq!(h.store.selection().len(), 2);
        let bounds = h.store.bounds().unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 60.0, 10.0));
    }
}
