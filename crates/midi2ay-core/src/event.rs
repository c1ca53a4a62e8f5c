//! Boundary types consumed from the event source.
//!
//! The core does not read MIDI files itself; a front-end hands it an
//! [`EventSource`] of already-paired note events with absolute tick times.

/// One paired note-on/note-off event with absolute tick times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// MIDI key number (0-127).
    pub pitch: u8,
    /// Absolute tick of the note-on.
    pub start_tick: u64,
    /// Absolute tick of the note-off.
    pub end_tick: u64,
    /// Note-on velocity (0-127).
    pub velocity: u8,
    /// Source channel the event was read from.
    pub channel: u8,
}

/// A complete event source: one track per source channel, plus the tick
/// resolution needed to quantize.
#[derive(Debug, Clone, Default)]
pub struct EventSource {
    /// Ticks per quarter note (PPQN).
    pub ticks_per_beat: u32,
    /// Tracks indexed by source channel number. A channel mapping that
    /// references an index past the end of this list is degenerate input.
    pub tracks: Vec<Vec<NoteEvent>>,
}

impl EventSource {
    /// Create a source with `channels` empty tracks.
    pub fn with_channels(ticks_per_beat: u32, channels: usize) -> Self {
        Self {
            ticks_per_beat,
            tracks: vec![Vec::new(); channels],
        }
    }

    /// Push an event into its channel's track, growing the track list if the
    /// channel has not been seen yet.
    pub fn push(&mut self, event: NoteEvent) {
        let idx = event.channel as usize;
        if idx >= self.tracks.len() {
            self.tracks.resize(idx + 1, Vec::new());
        }
        self.tracks[idx].push(event);
    }
}
