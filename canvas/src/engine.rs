use web_sys::{File, HtmlCanvasElement};

use crate::config::ViewerConfig;
use crate::error::{RenderError, ViewerError};
use crate::input::{Button, InputEvent, InputState, Key, WheelDelta};
use crate::io::{self, SaveOutcome, TextFileIo};
use crate::render::{self, RendererBackend};
use crate::scene::{LineSegment, Scene};
use crate::viewbox::{Point, Viewbox, ViewboxModel};
use crate::webgl::WebGlBackend;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "default";
const CURSOR_GRABBING: &str = "grabbing";
const CURSOR_CROSSHAIR: &str = "crosshair";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The scene or viewbox changed; draw a frame.
    RenderNeeded,
    /// Cancel the browser's default handling of the event (page scroll).
    SuppressDefault,
    /// A user segment was committed to the scene.
    SegmentAdded(LineSegment),
    /// Whether export is available.
    ExportEnabled(bool),
    SetCursor(String),
}

/// A loaded document: its scene and viewbox always travel together.
#[derive(Debug, Clone)]
struct LoadedDoc {
    scene: Scene,
    view: ViewboxModel,
}

/// Core engine state: everything that does not touch the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug, Clone, Default)]
pub struct EngineCore {
    pub config: ViewerConfig,
    pub input: InputState,
    loaded: Option<LoadedDoc>,
}

impl EngineCore {
    #[must_use]
    pub fn new(config: ViewerConfig) -> Self {
        Self { config, input: InputState::Idle, loaded: None }
    }

    // --- Documents ---

    /// Parse `text` and replace the current scene and viewbox.
    ///
    /// On failure nothing changes.
    ///
    /// # Errors
    ///
    /// [`ViewerError::ParseFailure`] if the text is not well-formed markup.
    pub fn load_document(&mut self, text: &str) -> Result<Vec<Action>, ViewerError> {
        let tree = markup::parse(text).inspect_err(|e| tracing::warn!(error = %e, "document load failed"))?;
        let scene = Scene::load_from_source(tree, self.config.source_default_color);
        let view = ViewboxModel::initialize(scene.declared_bounds(), self.config.surface_size);
        let origin = view.original();
        tracing::info!(
            source_segments = scene.source_segments().len(),
            renderable = scene.renderable_count(),
            x = origin.x,
            y = origin.y,
            size = origin.size,
            "document loaded"
        );

        self.loaded = Some(LoadedDoc { scene, view });
        let mut actions = self.enter_idle();
        actions.push(Action::ExportEnabled(true));
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Read through `io` and load the result.
    ///
    /// # Errors
    ///
    /// [`ViewerError::ReadFailure`] or [`ViewerError::ParseFailure`]; state is untouched either way.
    pub fn open(&mut self, io: &mut dyn TextFileIo) -> Result<Vec<Action>, ViewerError> {
        let text = io
            .read_text_file()
            .inspect_err(|e| tracing::warn!(error = %e, "document read failed"))?;
        self.load_document(&text)
    }

    /// The exported document as text, or `None` with nothing loaded.
    ///
    /// # Errors
    ///
    /// [`ViewerError::WriteFailure`] if the document cannot be serialized.
    pub fn export_text(&self) -> Result<Option<String>, ViewerError> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Ok(None);
        };
        let doc = loaded.scene.export(&self.config.export_style());
        let text = markup::serialize(&doc).map_err(|e| ViewerError::WriteFailure(e.to_string()))?;
        Ok(Some(text))
    }

    /// Write the exported document through `io`.
    ///
    /// Declines without touching `io` when nothing is loaded.
    ///
    /// # Errors
    ///
    /// [`ViewerError::WriteFailure`] from serialization or the writer.
    pub fn export(&self, io: &mut dyn TextFileIo) -> Result<SaveOutcome, ViewerError> {
        let Some(text) = self.export_text()? else {
            tracing::debug!("export requested with no document loaded");
            return Ok(SaveOutcome::Declined);
        };
        let outcome = io.write_text_file(&text)?;
        match outcome {
            SaveOutcome::Saved => tracing::info!(bytes = text.len(), "document exported"),
            SaveOutcome::Declined => tracing::info!("export declined"),
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn export_enabled(&self) -> bool {
        self.loaded.is_some()
    }

    // --- Input events ---

    /// Dispatch a recorded or host-translated event.
    pub fn handle_event(&mut self, event: &InputEvent) -> Vec<Action> {
        match event {
            InputEvent::PointerDown { x, y, button } => self.on_pointer_down(Point::new(*x, *y), *button),
            InputEvent::PointerMove { x, y } => self.on_pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, button } => self.on_pointer_up(Point::new(*x, *y), *button),
            InputEvent::Wheel { x, y, dy } => self.on_wheel(Point::new(*x, *y), WheelDelta { dx: 0.0, dy: *dy }),
            InputEvent::KeyDown { key } => self.on_key_down(key),
        }
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        let surface = self.config.surface_size;
        let user_color = self.config.user_segment_color;
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        let current = loaded.view.current();
        let doc_pt = current.screen_to_doc(screen_pt, surface);

        match (button, self.input.clone()) {
            (Button::Primary, InputState::Idle) => {
                tracing::debug!(x = doc_pt.x, y = doc_pt.y, "drag start");
                self.input = InputState::Dragging { anchor_doc: doc_pt, start: current };
                vec![Action::SetCursor(CURSOR_GRABBING.into())]
            }
            (Button::Secondary, InputState::Idle) => {
                tracing::debug!(x = doc_pt.x, y = doc_pt.y, "segment start");
                self.input = InputState::PlacingSegment { pending: doc_pt, preview_end: None };
                vec![Action::SetCursor(CURSOR_CROSSHAIR.into())]
            }
            (Button::Secondary, InputState::PlacingSegment { pending, .. }) => {
                let segment = loaded.scene.add_user_segment(pending, doc_pt, user_color);
                tracing::debug!(?segment, "segment added");
                self.input = InputState::Idle;
                vec![
                    Action::SegmentAdded(segment),
                    Action::SetCursor(CURSOR_DEFAULT.into()),
                    Action::RenderNeeded,
                ]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        let surface = self.config.surface_size;
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        match &mut self.input {
            InputState::Dragging { anchor_doc, start } => {
                let delta = anchor_doc.minus(start.screen_to_doc(screen_pt, surface));
                loaded.view.pan_from(*start, delta);
                vec![Action::RenderNeeded]
            }
            InputState::PlacingSegment { preview_end, .. } => {
                *preview_end = Some(loaded.view.current().screen_to_doc(screen_pt, surface));
                vec![Action::RenderNeeded]
            }
            InputState::Idle => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        let surface = self.config.surface_size;
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        let InputState::Dragging { anchor_doc, start } = self.input else {
            return Vec::new();
        };
        if button != Button::Primary {
            return Vec::new();
        }
        let delta = anchor_doc.minus(start.screen_to_doc(screen_pt, surface));
        let end = loaded.view.pan_from(start, delta);
        tracing::debug!(x = end.x, y = end.y, "drag end");
        self.input = InputState::Idle;
        vec![Action::SetCursor(CURSOR_DEFAULT.into()), Action::RenderNeeded]
    }

    /// Cursor-anchored zoom; handled in every input state.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        let surface = self.config.surface_size;
        let settings = self.config.zoom_settings();
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        let before = loaded.view.current();
        let cursor = before.screen_to_doc(screen_pt, surface);
        let after = loaded.view.zoom_at(cursor, delta.dy, settings);
        if after == before {
            return vec![Action::SuppressDefault];
        }
        tracing::debug!(dy = delta.dy, size = after.size, "zoom");

        // A drag continues from the zoomed window.
        if let InputState::Dragging { anchor_doc, start } = &mut self.input {
            *start = after;
            *anchor_doc = after.screen_to_doc(screen_pt, surface);
        }
        vec![Action::SuppressDefault, Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if self.loaded.is_none() || !self.config.is_reset_key(&key.0) {
            return Vec::new();
        }
        self.reset_view()
    }

    /// Drop any gesture and restore the load-time viewbox.
    pub fn reset_view(&mut self) -> Vec<Action> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        let restored = loaded.view.reset();
        tracing::debug!(x = restored.x, y = restored.y, size = restored.size, "view reset");
        let mut actions = self.enter_idle();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Add a segment directly in document space, bypassing pointer input.
    pub fn add_user_segment(&mut self, a: Point, b: Point) -> Option<LineSegment> {
        let color = self.config.user_segment_color;
        let loaded = self.loaded.as_mut()?;
        Some(loaded.scene.add_user_segment(a, b, color))
    }

    fn enter_idle(&mut self) -> Vec<Action> {
        let was_idle = self.input.is_idle();
        self.input = InputState::Idle;
        if was_idle { Vec::new() } else { vec![Action::SetCursor(CURSOR_DEFAULT.into())] }
    }

    // --- Render ---

    /// Draw the current scene (plus any preview) through `backend`.
    ///
    /// Returns the number of segments drawn; nothing is drawn with no document.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn render(&self, backend: &mut dyn RendererBackend) -> Result<usize, RenderError> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Ok(0);
        };
        render::draw(
            backend,
            loaded.view.current(),
            &loaded.scene,
            self.input.preview(),
            self.config.user_segment_color,
        )
    }

    // --- Queries ---

    #[must_use]
    pub fn viewbox(&self) -> Option<Viewbox> {
        self.loaded.as_ref().map(|l| l.view.current())
    }

    #[must_use]
    pub fn original_viewbox(&self) -> Option<Viewbox> {
        self.loaded.as_ref().map(|l| l.view.original())
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.loaded.as_ref().map(|l| &l.scene)
    }

    /// Map a surface point through the live viewbox.
    #[must_use]
    pub fn screen_to_doc(&self, screen_pt: Point) -> Option<Point> {
        self.viewbox().map(|v| v.screen_to_doc(screen_pt, self.config.surface_size))
    }

    /// Inverse of [`EngineCore::screen_to_doc`].
    #[must_use]
    pub fn doc_to_screen(&self, doc_pt: Point) -> Option<Point> {
        self.viewbox().map(|v| v.doc_to_screen(doc_pt, self.config.surface_size))
    }
}

/// The full viewer engine. Wraps `EngineCore` and owns the WebGL backend.
pub struct Engine {
    backend: WebGlBackend,
    pub core: EngineCore,
}

impl Engine {
    /// Create an engine drawing into `canvas`.
    ///
    /// # Errors
    ///
    /// Any [`RenderError`] raised while setting up the WebGL program.
    pub fn new(canvas: &HtmlCanvasElement, config: ViewerConfig) -> Result<Self, RenderError> {
        Ok(Self { backend: WebGlBackend::new(canvas)?, core: EngineCore::new(config) })
    }

    // --- Documents ---

    /// Read a user-selected file and load it.
    ///
    /// # Errors
    ///
    /// [`ViewerError::ReadFailure`] or [`ViewerError::ParseFailure`]; the previous document stays.
    pub async fn load_file(&mut self, file: &File) -> Result<Vec<Action>, ViewerError> {
        let text = io::read_file_text(file)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "document read failed"))?;
        self.core.load_document(&text)
    }

    /// Offer the exported document as a browser download.
    ///
    /// # Errors
    ///
    /// [`ViewerError::WriteFailure`] if the download cannot be started.
    pub fn export_download(&self, file_name: &str) -> Result<SaveOutcome, ViewerError> {
        match self.core.export_text()? {
            Some(text) => io::offer_download(file_name, &text),
            None => Ok(SaveOutcome::Declined),
        }
    }

    #[must_use]
    pub fn export_enabled(&self) -> bool {
        self.core.export_enabled()
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        self.core.on_key_down(key)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Propagates WebGL failures.
    pub fn render(&mut self) -> Result<usize, RenderError> {
        self.core.render(&mut self.backend)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn viewbox(&self) -> Option<Viewbox> {
        self.core.viewbox()
    }
}
