//! Desktop macro recording and playback
//!
//! This crate records global keyboard and mouse input through an OS-level
//! hook, persists the captured timeline as a JSON file, and replays it by
//! synthesizing equivalent input events with the recorded timing.
//! Hooking and injection are consumed through narrow platform traits so
//! the recording and replay logic stays testable with doubles.

pub mod error;
pub mod events;
pub mod platforms;
pub mod player;
pub mod recorder;

pub use error::*;
pub use events::*;
pub use player::*;
pub use recorder::*;
