use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ReenactError, Result};

/// Timestamp resolution: one tick is 100 ns, so 10 000 ticks per millisecond.
pub const TICKS_PER_MILLISECOND: u64 = 10_000;

/// Elapsed ticks between `epoch` and now.
pub fn ticks_since(epoch: Instant) -> u64 {
    duration_to_ticks(epoch.elapsed())
}

/// Convert a duration to whole ticks (100 ns units).
pub fn duration_to_ticks(duration: Duration) -> u64 {
    (duration.as_nanos() / 100) as u64
}

/// Convert a tick count to whole milliseconds, dropping the sub-millisecond
/// remainder.
pub fn ticks_to_millis(ticks: u64) -> u64 {
    ticks / TICKS_PER_MILLISECOND
}

/// Discriminates which fields of an [`InputEvent`] are meaningful
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    KeyPress,
    MouseClick,
    MouseMove,
}

/// A single recorded input occurrence
///
/// Serialized with lower-camel-case field names; the persisted file is a
/// bare JSON array of these objects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    /// The kind of event
    #[serde(rename = "eventType")]
    pub kind: EventKind,

    /// Elapsed ticks since recording start; relative ordering and delay
    /// computation only, never wall-clock time
    pub timestamp: u64,

    /// Screen x coordinate; zero for key events
    pub x: i32,

    /// Screen y coordinate; zero for key events
    pub y: i32,

    /// Virtual-key code; zero except for `KeyPress`
    pub key_code: u32,

    /// Mouse button identifier (1 = left, 2 = right, 3 = middle); zero
    /// except for `MouseClick`
    pub mouse_button: u32,

    /// Press vs release; always false for `MouseMove`
    pub is_pressed: bool,
}

impl InputEvent {
    /// Create a key press/release event
    pub fn key(timestamp: u64, key_code: u32, is_pressed: bool) -> Self {
        Self {
            kind: EventKind::KeyPress,
            timestamp,
            x: 0,
            y: 0,
            key_code,
            mouse_button: 0,
            is_pressed,
        }
    }

    /// Create a mouse button press/release event
    pub fn click(timestamp: u64, x: i32, y: i32, mouse_button: u32, is_pressed: bool) -> Self {
        Self {
            kind: EventKind::MouseClick,
            timestamp,
            x,
            y,
            key_code: 0,
            mouse_button,
            is_pressed,
        }
    }

    /// Create a cursor movement event
    pub fn mouse_move(timestamp: u64, x: i32, y: i32) -> Self {
        Self {
            kind: EventKind::MouseMove,
            timestamp,
            x,
            y,
            key_code: 0,
            mouse_button: 0,
            is_pressed: false,
        }
    }
}

/// Per-kind event counts for a recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    pub key_events: usize,
    pub mouse_clicks: usize,
    pub mouse_moves: usize,
}

/// An ordered timeline of recorded input events
///
/// Appended to by the recorder while a recording is active, then handed
/// off wholesale through save/load. Events are kept in append order; the
/// player sorts its own working copy before replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Recording {
    events: Vec<InputEvent>,
}

impl Recording {
    /// Create an empty recording
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// The recorded events in append order
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Append an event to the timeline
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drop all recorded events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Count events by kind
    pub fn stats(&self) -> RecordingStats {
        let mut stats = RecordingStats::default();
        for event in &self.events {
            match event.kind {
                EventKind::KeyPress => stats.key_events += 1,
                EventKind::MouseClick => stats.mouse_clicks += 1,
                EventKind::MouseMove => stats.mouse_moves += 1,
            }
        }
        stats
    }

    /// Serialize the recording to a pretty-printed JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a recording from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ReenactError::Parse {
            source,
            contents: json.to_string(),
        })
    }

    /// Save the recording to a JSON file as a single whole-file write
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), events = self.len(), "macro saved");
        Ok(())
    }

    /// Load a recording from a JSON file
    ///
    /// A missing file is reported as [`ReenactError::FileNotFound`] and
    /// malformed content as [`ReenactError::Parse`]; both are recoverable.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReenactError::FileNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let recording = Self::from_json(&json)?;
        info!(path = %path.display(), events = recording.len(), "macro loaded");
        Ok(recording)
    }
}

impl FromIterator<InputEvent> for Recording {
    fn from_iter<T: IntoIterator<Item = InputEvent>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}
