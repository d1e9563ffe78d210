use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use rdev::{Button, EventType};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::{InputHook, InputInjector};
use crate::events::ticks_since;
use crate::{InputEvent, ReenactError, Result};

/// How long to wait for the listener thread to fail fast before assuming
/// the hook is established. `rdev::listen` reports permission problems
/// immediately and otherwise blocks for the lifetime of the process.
const HOOK_STARTUP_TIMEOUT: Duration = Duration::from_millis(250);

/// Global input hook backed by `rdev::listen`
///
/// The listener runs on a dedicated thread outside our control; releasing
/// the subscription flips a stop flag checked at the top of the callback.
/// The underlying OS hook may remain active until process termination.
pub struct DesktopHook {
    /// Last observed cursor position; button callbacks carry no
    /// coordinates, so clicks reuse the position of the preceding move
    last_mouse_pos: Arc<Mutex<Option<(i32, i32)>>>,

    /// Signal to stop delivering events
    stop_indicator: Arc<AtomicBool>,
}

impl DesktopHook {
    pub fn new() -> Self {
        Self {
            last_mouse_pos: Arc::new(Mutex::new(None)),
            stop_indicator: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for DesktopHook {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHook for DesktopHook {
    fn subscribe(&mut self, epoch: Instant, tx: broadcast::Sender<InputEvent>) -> Result<()> {
        debug!("setting up global input listener");
        self.stop_indicator.store(false, Ordering::SeqCst);

        let stop_indicator = Arc::clone(&self.stop_indicator);
        let last_mouse_pos = Arc::clone(&self.last_mouse_pos);
        let (startup_tx, startup_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let callback_stop = Arc::clone(&stop_indicator);
            let result = rdev::listen(move |event| {
                if callback_stop.load(Ordering::SeqCst) {
                    return;
                }
                let timestamp = ticks_since(epoch);

                match event.event_type {
                    EventType::KeyPress(key) => {
                        let code = super::key_to_code(key);
                        let _ = tx.send(InputEvent::key(timestamp, code, true));
                    }
                    EventType::KeyRelease(key) => {
                        let code = super::key_to_code(key);
                        let _ = tx.send(InputEvent::key(timestamp, code, false));
                    }
                    EventType::ButtonPress(button) => {
                        if let (Some((x, y)), Some(code)) =
                            (*last_mouse_pos.lock().unwrap(), button_to_code(button))
                        {
                            let _ = tx.send(InputEvent::click(timestamp, x, y, code, true));
                        }
                    }
                    EventType::ButtonRelease(button) => {
                        if let (Some((x, y)), Some(code)) =
                            (*last_mouse_pos.lock().unwrap(), button_to_code(button))
                        {
                            let _ = tx.send(InputEvent::click(timestamp, x, y, code, false));
                        }
                    }
                    EventType::MouseMove { x, y } => {
                        let x = x as i32;
                        let y = y as i32;
                        *last_mouse_pos.lock().unwrap() = Some((x, y));
                        let _ = tx.send(InputEvent::mouse_move(timestamp, x, y));
                    }
                    // Wheel events are not part of the recorded timeline
                    EventType::Wheel { .. } => {}
                }
            });

            if let Err(listen_error) = result {
                error!("failed to listen for global input events: {listen_error:?}");
                let _ = startup_tx.send(format!("{listen_error:?}"));
            }
            info!("global input listener thread finished");
        });

        // The listener blocks forever on success, so only a prompt failure
        // arrives on this channel.
        match startup_rx.recv_timeout(HOOK_STARTUP_TIMEOUT) {
            Ok(listen_error) => Err(ReenactError::Hook(listen_error)),
            Err(_) => {
                debug!("global input listener established");
                Ok(())
            }
        }
    }

    fn release(&self) -> Result<()> {
        self.stop_indicator.store(true, Ordering::SeqCst);
        debug!("input hook released; listener delivery stopped");
        Ok(())
    }
}

/// Input synthesis backed by `rdev::simulate`
pub struct DesktopInjector;

impl InputInjector for DesktopInjector {
    fn move_cursor(&self, x: i32, y: i32) -> Result<()> {
        simulate(&EventType::MouseMove {
            x: x as f64,
            y: y as f64,
        })
    }

    fn button(&self, button: u32, is_pressed: bool) -> Result<()> {
        let button = code_to_button(button)
            .ok_or_else(|| ReenactError::Injection(format!("unsupported mouse button {button}")))?;
        if is_pressed {
            simulate(&EventType::ButtonPress(button))
        } else {
            simulate(&EventType::ButtonRelease(button))
        }
    }

    fn key(&self, key_code: u32, is_pressed: bool) -> Result<()> {
        let key = super::code_to_key(key_code);
        if is_pressed {
            simulate(&EventType::KeyPress(key))
        } else {
            simulate(&EventType::KeyRelease(key))
        }
    }
}

fn simulate(event_type: &EventType) -> Result<()> {
    rdev::simulate(event_type)
        .map_err(|simulate_error| ReenactError::Injection(format!("{simulate_error:?}")))
}

fn button_to_code(button: Button) -> Option<u32> {
    match button {
        Button::Left => Some(1),
        Button::Right => Some(2),
        Button::Middle => Some(3),
        _ => None,
    }
}

fn code_to_button(code: u32) -> Option<Button> {
    match code {
        1 => Some(Button::Left),
        2 => Some(Button::Right),
        3 => Some(Button::Middle),
        _ => None,
    }
}
