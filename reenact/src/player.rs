use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::events::ticks_to_millis;
use crate::platforms::{self, InputInjector};
use crate::{EventKind, InputEvent, Recording, Result};

/// Timing configuration for playback
///
/// The defaults reproduce the recorder's observable behavior: a 3 second
/// grace period so the operator can refocus the target window, and a 10 ms
/// settle pause compensating for injection-call latency on platforms that
/// drop or coalesce rapid synthetic events.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Unconditional wait before the first injected event
    pub start_grace: Duration,

    /// Fixed pause after every dispatched event, and between a synthetic
    /// cursor move and the button injection that follows it
    pub settle_pause: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_grace: Duration::from_millis(3000),
            settle_pause: Duration::from_millis(10),
        }
    }
}

/// Replays a recorded timeline by synthesizing equivalent input events
///
/// Playback is strictly sequential: one computed inter-event delay plus
/// one fixed settle pause per event, never two injections concurrently.
/// An injection failure aborts the remaining replay and is surfaced to
/// the caller; the cancel flag is checked at every suspension point so an
/// in-progress replay can be stopped gracefully.
pub struct Player {
    injector: Box<dyn InputInjector>,
    config: PlayerConfig,
    cancelled: Arc<AtomicBool>,
}

impl Player {
    /// Create a player backed by the desktop input injector
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_injector(platforms::create_injector(), config)
    }

    /// Create a player with a specific injector implementation
    pub fn with_injector(injector: Box<dyn InputInjector>, config: PlayerConfig) -> Self {
        Self {
            injector,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a graceful stop of an in-progress replay
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Replay the recording, once or in a loop
    ///
    /// An empty recording returns immediately with no injections and no
    /// suspensions. Events are replayed in stable timestamp order with the
    /// recorded inter-event delays; `loop_playback` restarts the pass
    /// after completion until cancelled.
    pub async fn play(&self, recording: &Recording, loop_playback: bool) -> Result<()> {
        if recording.is_empty() {
            info!("nothing to play");
            return Ok(());
        }

        self.cancelled.store(false, Ordering::SeqCst);
        info!(
            events = recording.len(),
            "replaying macro; switch to the target window"
        );
        self.wait(self.config.start_grace).await;

        // Stable sort: events with equal timestamps keep recording order
        let mut events = recording.events().to_vec();
        events.sort_by_key(|event| event.timestamp);

        loop {
            self.play_pass(&events).await?;
            if !loop_playback || self.is_cancelled() {
                break;
            }
        }
        Ok(())
    }

    /// One sequential pass over the sorted timeline
    async fn play_pass(&self, events: &[InputEvent]) -> Result<()> {
        let mut previous = events[0].timestamp;

        for event in events {
            // Out-of-order or simultaneous timestamps wait zero, never
            // backwards; sub-millisecond remainders are dropped
            let delay = event.timestamp.saturating_sub(previous);
            previous = event.timestamp;

            let millis = ticks_to_millis(delay);
            if millis > 0 {
                self.wait(Duration::from_millis(millis)).await;
            }
            if self.is_cancelled() {
                info!("playback cancelled");
                return Ok(());
            }

            self.dispatch(event).await?;
            self.wait(self.config.settle_pause).await;
            if self.is_cancelled() {
                info!("playback cancelled");
                return Ok(());
            }
        }

        info!("playback pass complete");
        Ok(())
    }

    async fn dispatch(&self, event: &InputEvent) -> Result<()> {
        match event.kind {
            EventKind::KeyPress => {
                debug!(
                    key_code = event.key_code,
                    is_pressed = event.is_pressed,
                    "injecting key event"
                );
                self.injector.key(event.key_code, event.is_pressed)?;
            }
            EventKind::MouseClick => {
                debug!(
                    x = event.x,
                    y = event.y,
                    button = event.mouse_button,
                    is_pressed = event.is_pressed,
                    "injecting mouse button event"
                );
                self.injector.move_cursor(event.x, event.y)?;
                // Let the pointer position settle before the button fires
                self.wait(self.config.settle_pause).await;
                match event.mouse_button {
                    1 | 2 => self
                        .injector
                        .button(event.mouse_button, event.is_pressed)?,
                    other => {
                        debug!(button = other, "unsupported mouse button; skipping injection");
                    }
                }
            }
            EventKind::MouseMove => {
                debug!(x = event.x, y = event.y, "injecting cursor move");
                self.injector.move_cursor(event.x, event.y)?;
            }
        }
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        if duration.is_zero() || self.is_cancelled() {
            return;
        }
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReenactError;
    use std::sync::Mutex;

    /// What a test injector observed, in call order
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Injected {
        MoveCursor { x: i32, y: i32 },
        Button { button: u32, is_pressed: bool },
        Key { key_code: u32, is_pressed: bool },
    }

    #[derive(Default)]
    struct RecordingInjector {
        calls: Arc<Mutex<Vec<Injected>>>,
    }

    impl RecordingInjector {
        fn new() -> (Self, Arc<Mutex<Vec<Injected>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl InputInjector for RecordingInjector {
        fn move_cursor(&self, x: i32, y: i32) -> Result<()> {
            self.calls.lock().unwrap().push(Injected::MoveCursor { x, y });
            Ok(())
        }

        fn button(&self, button: u32, is_pressed: bool) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Injected::Button { button, is_pressed });
            Ok(())
        }

        fn key(&self, key_code: u32, is_pressed: bool) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Injected::Key { key_code, is_pressed });
            Ok(())
        }
    }

    /// Injector double that fails on the first button injection
    struct FailingInjector;

    impl InputInjector for FailingInjector {
        fn move_cursor(&self, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }

        fn button(&self, _button: u32, _is_pressed: bool) -> Result<()> {
            Err(ReenactError::Injection("synthetic input denied".to_string()))
        }

        fn key(&self, _key_code: u32, _is_pressed: bool) -> Result<()> {
            Ok(())
        }
    }

    /// Zeroed pauses keep the suite fast without changing dispatch order
    fn instant_config() -> PlayerConfig {
        PlayerConfig {
            start_grace: Duration::ZERO,
            settle_pause: Duration::ZERO,
        }
    }

    fn player_with(injector: Box<dyn InputInjector>) -> Player {
        Player::with_injector(injector, instant_config())
    }

    #[tokio::test]
    async fn empty_recording_injects_nothing() {
        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));

        player.play(&Recording::new(), false).await.unwrap();

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn key_events_replay_in_order() {
        // The documented example: press and release 100 000 ticks apart
        let recording: Recording = [
            InputEvent::key(0, 65, true),
            InputEvent::key(100_000, 65, false),
        ]
        .into_iter()
        .collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.play(&recording, false).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Injected::Key { key_code: 65, is_pressed: true },
                Injected::Key { key_code: 65, is_pressed: false },
            ]
        );
    }

    #[tokio::test]
    async fn events_are_sorted_by_timestamp_before_replay() {
        let recording: Recording = [
            InputEvent::key(200_000, 66, true),
            InputEvent::key(0, 65, true),
            InputEvent::key(100_000, 67, true),
        ]
        .into_iter()
        .collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.play(&recording, false).await.unwrap();

        let injected: Vec<u32> = calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| match call {
                Injected::Key { key_code, .. } => *key_code,
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(injected, vec![65, 67, 66]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_recording_order() {
        let recording: Recording = [
            InputEvent::key(50_000, 65, true),
            InputEvent::key(50_000, 66, true),
            InputEvent::key(50_000, 67, true),
        ]
        .into_iter()
        .collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.play(&recording, false).await.unwrap();

        let injected: Vec<u32> = calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| match call {
                Injected::Key { key_code, .. } => *key_code,
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(injected, vec![65, 66, 67]);
    }

    #[tokio::test]
    async fn clicks_move_the_cursor_before_the_button() {
        let recording: Recording = [InputEvent::click(0, 300, 400, 2, true)]
            .into_iter()
            .collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.play(&recording, false).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Injected::MoveCursor { x: 300, y: 400 },
                Injected::Button { button: 2, is_pressed: true },
            ]
        );
    }

    #[tokio::test]
    async fn unsupported_buttons_move_the_cursor_but_inject_nothing() {
        let recording: Recording = [InputEvent::click(0, 10, 20, 4, true)]
            .into_iter()
            .collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.play(&recording, false).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![Injected::MoveCursor { x: 10, y: 20 }]
        );
    }

    #[tokio::test]
    async fn mouse_moves_only_move_the_cursor() {
        let recording: Recording = [InputEvent::mouse_move(0, 5, 6)].into_iter().collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.play(&recording, false).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![Injected::MoveCursor { x: 5, y: 6 }]
        );
    }

    #[tokio::test]
    async fn injection_failure_aborts_the_replay() {
        let recording: Recording = [
            InputEvent::click(0, 0, 0, 1, true),
            InputEvent::key(100_000, 65, true),
        ]
        .into_iter()
        .collect();

        let player = player_with(Box::new(FailingInjector));
        match player.play(&recording, false).await {
            Err(ReenactError::Injection(_)) => {}
            other => panic!("expected Injection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_player_stops_at_the_next_suspension_point() {
        let recording: Recording = [
            InputEvent::key(0, 65, true),
            InputEvent::key(100_000, 65, false),
        ]
        .into_iter()
        .collect();

        let (injector, calls) = RecordingInjector::new();
        let player = player_with(Box::new(injector));
        player.cancel();

        // play() resets the flag for the new session, so cancel after the
        // first event has been dispatched instead
        player.play(&recording, false).await.unwrap();
        assert_eq!(calls.lock().unwrap().len(), 2);

        let recording_long: Recording = [
            InputEvent::key(0, 65, true),
            // A 500 ms delay, long enough that cancellation lands inside it
            InputEvent::key(5_000_000, 65, false),
        ]
        .into_iter()
        .collect();
        let (injector, calls) = RecordingInjector::new();
        let player = Arc::new(Player::with_injector(Box::new(injector), instant_config()));

        let playing = {
            let player = Arc::clone(&player);
            tokio::spawn(async move { player.play(&recording_long, false).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        player.cancel();
        playing.await.unwrap().unwrap();

        // Only the first key made it out before the cancel
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn loop_playback_repeats_until_cancelled() {
        let recording: Recording = [InputEvent::key(0, 65, true)].into_iter().collect();

        let (injector, calls) = RecordingInjector::new();
        let player = Arc::new(Player::with_injector(
            Box::new(injector),
            PlayerConfig {
                start_grace: Duration::ZERO,
                settle_pause: Duration::from_millis(5),
            },
        ));

        let playing = {
            let player = Arc::clone(&player);
            tokio::spawn(async move { player.play(&recording, true).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        player.cancel();
        playing.await.unwrap().unwrap();

        // More than one pass ran before the cancel landed
        assert!(calls.lock().unwrap().len() > 1);
    }
}
