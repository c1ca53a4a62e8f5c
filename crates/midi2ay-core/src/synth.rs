//! Note synthesis: flattened cells to final notes.
//!
//! This is where a cell's pitch group becomes a concrete chip note: base
//! pitch, sample, ornament id, volume, and - for envelope channels - the
//! derived hardware envelope fields.

use crate::config::{ChannelSpec, ConvertParams, VoiceMode};
use crate::flatten::FlatCell;
use crate::note::{
    EnvelopeContext, FinalNote, NoteKind, NoteType, ENV_SHAPE_BY_PITCH, SILENT_PITCH,
};
use crate::ornament::{canonicalize, OrnamentTable};

/// Percussion sample per raw MIDI key (General MIDI drum map).
pub const DRUM_SAMPLE: [u8; 128] = build_drum_sample_table();

/// Fixed output pitch per raw MIDI drum key.
pub const DRUM_PITCH: [u8; 128] = build_drum_pitch_table();

const fn build_drum_sample_table() -> [u8; 128] {
    let mut table = [15u8; 128];
    let mut i = 0;
    while i < 128 {
        table[i] = match i {
            35 | 36 => 9,            // bass drum
            37..=40 => 10,           // sticks, snares, clap
            42 | 44 => 11,           // closed/pedal hi-hat
            46 | 49 | 52 | 55 | 57 => 12, // open hat, crash, splash
            41 | 43 | 45 | 47 | 48 | 50 => 13, // toms
            51 | 53 | 59 => 14,      // ride family
            _ => 15,                 // remaining percussion
        };
        i += 1;
    }
    table
}

const fn build_drum_pitch_table() -> [u8; 128] {
    let mut table = [48u8; 128];
    let mut i = 0;
    while i < 128 {
        table[i] = match i {
            35 | 36 => 24,
            37..=40 => 36,
            42 | 44 => 84,
            46 | 49 | 52 | 55 | 57 => 96,
            41 | 43 => 36,
            45 | 47 => 42,
            48 | 50 => 48,
            51 | 53 | 59 => 90,
            _ => 48,
        };
        i += 1;
    }
    table
}

/// MIDI velocity (0-127) to chip volume (0-15).
pub fn scale_velocity(velocity: u8) -> u8 {
    (velocity / 8).min(15)
}

/// Re-derive the envelope fields of an envelope-kind note from its volume.
///
/// Full volume is "non-delayed"; anything quieter (soft input notes and
/// echo copies alike) takes the delayed branch, which turns the envelope off
/// and mutes the played pitch unless the envelope is allowed to change
/// volume. Notes of any other kind pass through unchanged.
pub(crate) fn apply_envelope_policy(
    note: FinalNote,
    params: &ConvertParams,
    env: &EnvelopeContext,
) -> FinalNote {
    if note.kind != NoteKind::Envelope || !note.is_real() {
        return note;
    }
    let shape = ENV_SHAPE_BY_PITCH[note.pitch as usize & 0x7F];
    if note.volume >= 15 {
        FinalNote::new(
            note.pitch,
            params.envelope_sample,
            shape,
            note.ornament,
            note.volume,
            note.typ,
            note.kind,
            env,
        )
    } else {
        let (envelope, pitch) = if env.envelope_changes_volume {
            (shape, note.pitch)
        } else {
            (15, SILENT_PITCH)
        };
        FinalNote::new(
            pitch,
            params.delayed_envelope_sample,
            envelope,
            note.ornament,
            note.volume,
            note.typ,
            note.kind,
            env,
        )
    }
}

/// Shift a pitch by octaves into the C4..C6 register.
fn clamp_to_arpeggio_register(mut pitch: i32) -> i32 {
    while pitch < 60 {
        pitch += 12;
    }
    while pitch > 84 {
        pitch -= 12;
    }
    pitch
}

/// Synthesize one channel's flattened cells into final notes.
///
/// The ornament table is shared across channels and append-only; this is its
/// sole writer while a channel is being synthesized.
pub fn synthesize_channel(
    cells: &[FlatCell],
    spec: &ChannelSpec,
    params: &ConvertParams,
    env: &EnvelopeContext,
    ornaments: &mut OrnamentTable,
) -> Vec<FinalNote> {
    cells
        .iter()
        .map(|cell| match cell {
            FlatCell::Empty => FinalNote::empty(),
            FlatCell::Release(marker) => FinalNote::release(marker.pitch, env),
            FlatCell::Start(group) => {
                let note = synthesize_group(group, spec, params, env, ornaments);
                apply_envelope_policy(note, params, env)
            }
        })
        .collect()
}

fn synthesize_group(
    group: &[(u8, u8)],
    spec: &ChannelSpec,
    params: &ConvertParams,
    env: &EnvelopeContext,
    ornaments: &mut OrnamentTable,
) -> FinalNote {
    let volume = group
        .iter()
        .map(|&(_, velocity)| scale_velocity(velocity))
        .max()
        .unwrap_or(0);
    let base = group.iter().map(|&(pitch, _)| pitch).min().unwrap_or(0) as i32;

    let (pitch, sample, ornament, base_kind) = match spec.mode {
        VoiceMode::Poly => {
            let offsets: Vec<i32> = group.iter().map(|&(p, _)| p as i32 - base).collect();
            let canonical = canonicalize(&offsets, params.max_offset);
            let mut pitch = base + canonical.base_shift;
            let ornament = if canonical.is_trivial() {
                0
            } else {
                ornaments.intern(&canonical)
            };
            if ornament != 0 {
                // An arpeggio in an extreme register jumps octaves audibly;
                // pull it back into C4..C6.
                pitch = clamp_to_arpeggio_register(pitch);
            }
            (pitch, spec.sample, ornament, NoteKind::Plain)
        }
        VoiceMode::Mono => (base, spec.sample, spec.ornament, NoteKind::Mono),
        VoiceMode::Drum => {
            let key = base as usize & 0x7F;
            (DRUM_PITCH[key] as i32, DRUM_SAMPLE[key], 0, NoteKind::Drum)
        }
    };

    let kind = if spec.envelope {
        NoteKind::Envelope
    } else {
        base_kind
    };

    FinalNote::new(
        pitch.clamp(0, 127) as u8,
        sample,
        0,
        ornament,
        volume,
        NoteType::Start,
        kind,
        env,
    )
}
