// THEORY:
// This file is the entry point for the `motion_reveal` library crate.
//
// The public face of the engine is `MotionRevealSession` (in `session`) together
// with its `SessionConfig`, the `TickReport` it returns every frame and the
// `RevealEvent` stream it pushes to subscribers. The building blocks in
// `core_modules` (grid geometry, per-cell tables, the motion analyzer, brightness
// precomputation) are public too, for callers that want to drive analysis
// themselves, but a typical integration only touches the session.
//
// Capture, drawing and event transport stay outside the crate: frames come in as
// `FrameBuffer`s and events go out through `RevealSink`s.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use core_modules::cell_table::CellTable;
pub use core_modules::frame::FrameBuffer;
pub use core_modules::grid::{AnchorMode, CellBounds, Grid, Rect};
pub use core_modules::reveal_event::{ChannelSink, FnSink, RevealEvent, RevealSink};
pub use error::{Result, RevealError};
pub use session::{MotionRevealSession, RevealProgress, RevealStatus, TickReport};
