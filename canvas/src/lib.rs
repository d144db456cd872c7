//! Client-side drawing engine for shared boards.
//!
//! This crate owns everything a client does between raw pointer samples and
//! the wire: capturing and smoothing strokes, hit-testing the stroke eraser,
//! the pan/zoom camera, local undo/redo, and folding remote events into the
//! local stroke set. It performs no I/O. Input handlers return
//! [`engine::Action`]s and the connection layer returns
//! [`connection::Effect`]s; the host (browser glue, native shell, test
//! harness) carries them out.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: local-first editing and remote reconciliation |
//! | [`doc`] | Ordered stroke set and the per-event fold rules |
//! | [`history`] | Snapshot undo/redo stack |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`smooth`] | Moving-average, interpolation and Bezier smoothing |
//! | [`hit`] | Point-to-stroke hit testing |
//! | [`input`] | Gesture state machine and drawing preferences |
//! | [`presence`] | Collaborator roster and remote cursors |
//! | [`connection`] | Transport-agnostic sync protocol state machine |
//! | [`render`] | Backend-neutral display list |
//! | [`consts`] | Shared numeric constants |

pub mod camera;
pub mod connection;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod history;
pub mod hit;
pub mod input;
pub mod presence;
pub mod render;
pub mod smooth;
