//! Application module: the playback state machine.
//!
//! `App` in `app::model` holds the session state read by the UI; the
//! transitions that drive the engine and the store live in `app::actions`.

mod actions;
mod model;

pub use model::*;
