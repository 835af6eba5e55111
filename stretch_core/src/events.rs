//! Presenter-facing events pushed out of the playback engine.

use crate::{CompletionStats, Exercise, Result, Side};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Everything a presenter needs to redraw the screen
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    ExerciseChanged {
        exercise: Exercise,
        index: usize,
        total: usize,
        side: Side,
    },
    Tick {
        remaining_seconds: u32,
    },
    Expired,
    SideSwitchAnnounced,
    Completed(CompletionStats),
}

/// Event sink trait for presenters
pub trait EventSink {
    fn emit(&mut self, event: PlaybackEvent);
}

/// Recording sink, mostly for tests and offline simulation
impl EventSink for Vec<PlaybackEvent> {
    fn emit(&mut self, event: PlaybackEvent) {
        self.push(event);
    }
}

/// Writes each event as one JSON line
pub struct JsonlEventSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_event(&mut self, event: &PlaybackEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonlEventSink<W> {
    fn emit(&mut self, event: PlaybackEvent) {
        // A closed pipe must not take the session down with it
        if let Err(e) = self.write_event(&event) {
            tracing::warn!("Failed to write event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_sink_writes_one_line_per_event() {
        let mut sink = JsonlEventSink::new(Vec::new());
        sink.emit(PlaybackEvent::Tick {
            remaining_seconds: 12,
        });
        sink.emit(PlaybackEvent::SideSwitchAnnounced);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"event":"tick","remaining_seconds":12}"#);
        assert_eq!(lines[1], r#"{"event":"side_switch_announced"}"#);
    }

    #[test]
    fn test_exercise_changed_serializes_side() {
        let event = PlaybackEvent::ExerciseChanged {
            exercise: Exercise::new("arm_circles", 30, true),
            index: 1,
            total: 2,
            side: Side::Second,
        };
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "exercise_changed");
        assert_eq!(value["side"], "second");
        assert_eq!(value["exercise"]["id"], "arm_circles");
    }
}
