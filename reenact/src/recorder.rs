use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::events::TICKS_PER_MILLISECOND;
use crate::platforms::{self, InputHook};
use crate::{EventKind, InputEvent, Recording, ReenactError, Result};

/// Configuration for the macro recorder
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Whether to record key press/release events
    pub record_keyboard: bool,

    /// Whether to record mouse button events
    pub record_mouse_buttons: bool,

    /// Whether to record cursor movement events
    pub record_mouse_moves: bool,

    /// Minimum time between recorded mouse moves (milliseconds);
    /// 0 records every move the hook delivers
    pub mouse_move_throttle_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            record_keyboard: true,
            record_mouse_buttons: true,
            record_mouse_moves: true,
            mouse_move_throttle_ms: 0,
        }
    }
}

/// Recorder lifecycle state, transitioned only by `start()`/`stop()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// The macro recorder
///
/// The platform hook delivers timestamped [`InputEvent`] messages into a
/// broadcast channel; a single drain task consumes them into the
/// mutex-guarded timeline, so native hook threads never touch the
/// timeline directly.
pub struct Recorder {
    /// The captured timeline
    recording: Arc<Mutex<Recording>>,

    /// The event sender shared with the hook
    event_tx: broadcast::Sender<InputEvent>,

    /// The configuration
    config: RecorderConfig,

    /// Current lifecycle state
    state: RecorderState,

    /// The platform hook subscription
    hook: Box<dyn InputHook>,

    /// Recording-active flag for the current session, read-checked by the
    /// drain task before each append; replaced on every `start()` so a
    /// stale drain task can never append into a later session
    active: Arc<AtomicBool>,

    /// Instant the current recording started
    started_at: Option<Instant>,
}

impl Recorder {
    /// Create a recorder backed by the desktop input hook
    pub fn new(config: RecorderConfig) -> Self {
        Self::with_hook(platforms::create_hook(), config)
    }

    /// Create a recorder with a specific hook implementation
    pub fn with_hook(hook: Box<dyn InputHook>, config: RecorderConfig) -> Self {
        // Mouse moves arrive at device rate, so leave generous headroom
        let (event_tx, _) = broadcast::channel(1024);

        Self {
            recording: Arc::new(Mutex::new(Recording::new())),
            event_tx,
            config,
            state: RecorderState::Idle,
            hook,
            active: Arc::new(AtomicBool::new(false)),
            started_at: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// A live stream of the events the hook delivers, for progress display
    pub fn event_stream(&self) -> impl Stream<Item = InputEvent> {
        let mut rx = self.event_tx.subscribe();
        Box::pin(async_stream::stream! {
            while let Ok(event) = rx.recv().await {
                yield event;
            }
        })
    }

    /// Start recording
    ///
    /// Clears any prior timeline, records the start instant, and
    /// subscribes the platform hook. Fails if a recording is already in
    /// progress or the hook cannot be established.
    pub async fn start(&mut self) -> Result<()> {
        if self.state == RecorderState::Recording {
            return Err(ReenactError::Recorder(
                "a recording is already in progress".to_string(),
            ));
        }

        info!("starting macro recording");
        if let Ok(mut recording) = self.recording.lock() {
            recording.clear();
        }

        let started_at = Instant::now();
        self.active = Arc::new(AtomicBool::new(true));

        // Attach the receiver before the hook so no early event is missed
        let event_rx = self.event_tx.subscribe();

        if let Err(err) = self.hook.subscribe(started_at, self.event_tx.clone()) {
            self.active.store(false, Ordering::SeqCst);
            return Err(err);
        }

        let recording = Arc::clone(&self.recording);
        let active = Arc::clone(&self.active);
        let config = self.config.clone();
        tokio::spawn(async move {
            Self::drain_events(recording, event_rx, config, active).await;
        });

        self.started_at = Some(started_at);
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Stop recording
    ///
    /// Releases the hook subscription and freezes the timeline. A callback
    /// racing the stop flag may contribute at most one boundary event.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state == RecorderState::Idle {
            return Ok(());
        }

        info!("stopping macro recording");
        self.active.store(false, Ordering::SeqCst);
        self.hook.release()?;
        self.state = RecorderState::Idle;
        Ok(())
    }

    /// Snapshot of the captured timeline
    pub fn recording(&self) -> Recording {
        self.recording
            .lock()
            .map(|recording| recording.clone())
            .unwrap_or_default()
    }

    /// Single consumer of the hook channel for one recording session
    async fn drain_events(
        recording: Arc<Mutex<Recording>>,
        mut event_rx: broadcast::Receiver<InputEvent>,
        config: RecorderConfig,
        active: Arc<AtomicBool>,
    ) {
        let throttle_ticks = config.mouse_move_throttle_ms * TICKS_PER_MILLISECOND;
        let mut last_move: Option<u64> = None;

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    match event.kind {
                        EventKind::KeyPress if !config.record_keyboard => continue,
                        EventKind::MouseClick if !config.record_mouse_buttons => continue,
                        EventKind::MouseMove => {
                            if !config.record_mouse_moves {
                                continue;
                            }
                            if throttle_ticks > 0 {
                                if let Some(last) = last_move {
                                    if event.timestamp.saturating_sub(last) < throttle_ticks {
                                        continue;
                                    }
                                }
                            }
                            last_move = Some(event.timestamp);
                        }
                        _ => {}
                    }

                    debug!(kind = ?event.kind, timestamp = event.timestamp, "recorded event");
                    if let Ok(mut recording) = recording.lock() {
                        recording.push(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event channel lagged; input events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
