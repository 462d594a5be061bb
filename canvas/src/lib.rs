//! Line-drawing viewer engine: viewbox, input state machine, scene and render driver.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! full lifecycle of the viewer: loading a markup document into a scene,
//! translating raw pointer, wheel and key events into viewbox changes and new
//! user segments, and pushing the scene through a renderer backend. The host
//! JavaScript layer is responsible only for wiring DOM events to the engine
//! and acting on the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`viewbox`] | Square document window, zoom/pan/reset and coordinate mapping |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`scene`] | Source and user segments, export back to markup |
//! | [`render`] | Render driver and the [`render::RendererBackend`] seam |
//! | [`webgl`] | WebGL renderer backend |
//! | [`geom`] | Projection, scale and translation matrices |
//! | [`io`] | Text file load/save seam and browser helpers |
//! | [`config`] | Viewer configuration |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (surface size, zoom limits, colors) |

pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod geom;
pub mod input;
pub mod io;
pub mod render;
pub mod scene;
pub mod viewbox;
pub mod webgl;
