use std::time::Instant;

use tokio::sync::broadcast;

use crate::{InputEvent, Result};

mod desktop;
mod keycodes;

pub use desktop::{DesktopHook, DesktopInjector};
pub use keycodes::{code_to_key, key_to_code};

/// A subscription-scoped source of global input events
///
/// Implementations deliver key-down/up, button-down/up, and mouse-move
/// callbacks as timestamped [`InputEvent`] messages on the given channel,
/// with `timestamp` measured in ticks since `epoch`.
pub trait InputHook: Send {
    /// Begin delivering hook callbacks
    ///
    /// A hook that cannot be established (e.g. the OS denies global input
    /// access) must surface the failure here rather than log and continue.
    fn subscribe(&mut self, epoch: Instant, tx: broadcast::Sender<InputEvent>) -> Result<()>;

    /// Stop delivering hook callbacks
    ///
    /// Callbacks racing the release may leak at most one boundary event
    /// into the channel; consumers tolerate this.
    fn release(&self) -> Result<()>;
}

/// A sink that synthesizes OS-level input events
pub trait InputInjector: Send + Sync {
    /// Set the absolute cursor position
    fn move_cursor(&self, x: i32, y: i32) -> Result<()>;

    /// Synthesize a button press or release at the current cursor position
    /// (1 = left, 2 = right, 3 = middle)
    fn button(&self, button: u32, is_pressed: bool) -> Result<()>;

    /// Synthesize a key press or release for the given virtual-key code
    fn key(&self, key_code: u32, is_pressed: bool) -> Result<()>;
}

/// Create the input hook for the current desktop
pub fn create_hook() -> Box<dyn InputHook> {
    Box::new(DesktopHook::new())
}

/// Create the input injector for the current desktop
pub fn create_injector() -> Box<dyn InputInjector> {
    Box::new(DesktopInjector)
}
