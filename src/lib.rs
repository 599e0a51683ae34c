//! Viewport transform engine and device registry for a network-diagram canvas.
//!
//! The crate owns the state behind an interactive diagram editor: where every
//! placed device is, which ones are selected, and how the canvas is zoomed and
//! scrolled inside the host's display area. The host is responsible only for
//! converting its native events into [`input::InputEvent`]s, drawing, and
//! carrying out the [`engine::Action`]s the controller returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::CanvasController`]: input dispatch and entity requests |
//! | [`doc`] | Device model and the [`doc::DeviceRegistry`] store |
//! | [`hit`] | Hit-testing and area queries against the registry |
//! | [`catalog`] | Device type catalog, built-in and JSON-extended |
//! | [`validate`] | Validation of well-known device properties |
//! | [`connections`] | Connection-owner collaborator trait |
//! | [`transform`] | [`transform::TransformEngine`]: zoom, pan, fit, animation |
//! | [`camera`] | Viewport state and coordinate conversions |
//! | [`minimap`] | Overview projection of the visible area |
//! | [`animation`] | Eased scroll animation stepped by the host frame clock |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`state`] | Host-visible application state mirror |
//! | [`config`] | Environment configuration |
//! | [`consts`] | Shared numeric constants (zoom limits, sizes, steps) |

pub mod animation;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod connections;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod minimap;
pub mod state;
pub mod transform;
pub mod validate;
