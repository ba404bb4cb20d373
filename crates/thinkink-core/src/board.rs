//! The whiteboard: one store, its history, and the controllers that edit it.

use crate::document::Document;
use crate::element::Element;
use crate::fade::{FadeReport, FadeScheduler};
use crate::history::History;
use crate::input::{KeyEvent, PointerEvent};
use crate::interaction::{EditContext, ImagePlacement, InteractionController};
use crate::settings::Settings;
use crate::store::ElementStore;
use crate::tools::ToolKind;
use crate::viewport::{Viewport, ViewportPatch};
use std::sync::Arc;
use std::time::Duration;

/// Everything a host needs to drive one board.
#[derive(Debug)]
pub struct Whiteboard {
    store: ElementStore,
    history: History,
    controller: InteractionController,
    fade: FadeScheduler,
    settings: Settings,
}

impl Default for Whiteboard {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl Whiteboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let mut store = ElementStore::with_paste_offset(settings.paste_offset);
        store
            .viewport_mut()
            .set_zoom_limits(settings.min_zoom, settings.max_zoom);

        Self {
            store,
            history: History::new(settings.history_depth),
            controller: InteractionController::from_settings(&settings),
            fade: FadeScheduler::new(
                Duration::from_millis(settings.fade_delay_ms),
                Duration::from_millis(settings.fade_duration_ms),
            ),
            settings,
        }
    }

    /// Replace the clock used to stamp disappearing ink.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.controller = self.controller.with_clock(clock);
        self
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ElementStore {
        &mut self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn elements(&self) -> &[Element] {
        self.store.elements()
    }

    pub fn viewport(&self) -> &Viewport {
        self.store.viewport()
    }

    pub fn tool(&self) -> ToolKind {
        self.controller.tool()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.controller.set_tool(&mut self.store, tool);
    }

    pub fn set_viewport(&mut self, patch: ViewportPatch) {
        self.store.set_viewport(patch);
    }

    fn split(&mut self) -> (EditContext<'_>, &mut InteractionController) {
        (
            EditContext::new(&mut self.store, &mut self.history),
            &mut self.controller,
        )
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let (mut cx, controller) = self.split();
        controller.handle_pointer(&mut cx, event)
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        let (mut cx, controller) = self.split();
        controller.handle_key(&mut cx, event)
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        self.controller.insert_text(text)
    }

    pub fn commit_text(&mut self) -> bool {
        let (mut cx, controller) = self.split();
        controller.commit_text(&mut cx)
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.store)
    }

    pub fn queue_image(&mut self, bytes: Vec<u8>, placement: ImagePlacement) {
        self.controller.queue_image(bytes, placement);
    }

    /// Per-frame work: pending image imports, then disappearing ink.
    /// Returns whether anything visible changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let imported = if self.controller.has_pending_images() {
            let (mut cx, controller) = self.split();
            controller.process_imports(&mut cx)
        } else {
            false
        };
        let faded: FadeReport = self.fade.tick(&mut self.store, now_ms);
        imported || faded.changed()
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.store.elements().to_vec())
    }

    /// Replace the board contents with `document`. The previous contents
    /// stay reachable through undo.
    pub fn load_document(&mut self, document: Document) {
        self.history.record(&self.store);
        self.store.set_elements(Arc::new(document.elements));
        self.store.clear_selection();
    }

    /// Remove everything, undoably.
    pub fn clear(&mut self) {
        if self.store.is_empty() {
            return;
        }
        self.history.record(&self.store);
        self.store.set_elements(Arc::new(Vec::new()));
        self.store.clear_selection();
    }
}
