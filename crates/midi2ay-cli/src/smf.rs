//! Standard MIDI File reading into the core's event source.

use anyhow::{bail, Result};
use midly::{MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::collections::VecDeque;

use midi2ay_core::{EventSource, NoteEvent};

/// Pair note-on/note-off events from every track into one [`EventSource`],
/// keyed by MIDI channel.
///
/// Zero-velocity note-ons count as note-offs; overlapping notes on the same
/// key close first-in-first-out; notes still open at the end of a track are
/// closed at the track's final tick.
pub fn event_source_from_smf(smf: &Smf) -> Result<EventSource> {
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => u32::from(ticks.as_int()),
        Timing::Timecode(..) => bail!("SMPTE-timed MIDI files are not supported"),
    };

    let mut source = EventSource::with_channels(ticks_per_beat, 16);
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        let mut open: HashMap<(u8, u8), VecDeque<(u64, u8)>> = HashMap::new();

        for event in track {
            tick += u64::from(event.delta.as_int());
            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    open.entry((channel, key.as_int()))
                        .or_default()
                        .push_back((tick, vel.as_int()));
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    let slot = open.entry((channel, key.as_int())).or_default();
                    if let Some((start_tick, velocity)) = slot.pop_front() {
                        source.push(NoteEvent {
                            pitch: key.as_int(),
                            start_tick,
                            end_tick: tick,
                            velocity,
                            channel,
                        });
                    }
                }
                _ => {}
            }
        }

        // Close dangling notes at the track's end.
        let mut dangling: Vec<((u8, u8), (u64, u8))> = open
            .into_iter()
            .flat_map(|(key, queue)| queue.into_iter().map(move |v| (key, v)))
            .collect();
        dangling.sort_unstable();
        for ((channel, pitch), (start_tick, velocity)) in dangling {
            source.push(NoteEvent {
                pitch,
                start_tick,
                end_tick: tick,
                velocity,
                channel,
            });
        }
    }

    // Note order within a track follows note-off order; restore start order.
    for track in &mut source.tracks {
        track.sort_by_key(|e| (e.start_tick, e.pitch));
    }
    Ok(source)
}
