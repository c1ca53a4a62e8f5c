//! The final per-row note value and its derived envelope fields.
//!
//! A [`FinalNote`] is an immutable value: every builder method rebuilds the
//! whole note through [`FinalNote::new`], which recomputes the derived
//! envelope note, pitch class and octave. The derivation is total for any
//! pitch in 0-127 and idempotent.

use crate::config::SYMBOLS;

/// Pitch forced onto delayed envelope notes when the envelope does not
/// change volume: high enough to be inaudible on the chip.
pub const SILENT_PITCH: u8 = 119;

/// Note names as rendered in a channel token.
const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Envelope shape per MIDI pitch (values 1-14).
pub const ENV_SHAPE_BY_PITCH: [u8; 128] = build_shape_table();

/// Envelope note offset per MIDI pitch, used when `cool_envelope` is set.
pub const ENV_OFFSET_BY_PITCH: [i8; 128] = build_offset_table();

const fn build_shape_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        // Triangle below C4, sawtooth up to C7, hold above.
        table[i] = if i < 60 {
            10
        } else if i < 96 {
            12
        } else {
            14
        };
        i += 1;
    }
    table
}

const fn build_offset_table() -> [i8; 128] {
    let mut table = [0i8; 128];
    let mut i = 0;
    while i < 128 {
        // Keep the envelope period in musical range: one octave down in the
        // low register, two from C5 up.
        table[i] = if i < 72 { -12 } else { -24 };
        i += 1;
    }
    table
}

/// Event type of a rendered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteType {
    #[default]
    Empty,
    Start,
    Release,
}

/// Timbre family of a note, selecting how it is rendered and how envelope
/// conflicts treat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteKind {
    #[default]
    Plain,
    Envelope,
    Mono,
    Drum,
}

/// Global flags and tables the envelope derivation depends on.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeContext {
    pub cool_envelope: bool,
    pub envelope_changes_volume: bool,
}

/// One fully synthesized note cell.
///
/// The `enote`/`epitch`/`eoctave` fields are derived; they are never set
/// directly and always agree with the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalNote {
    pub pitch: u8,
    pub sample: u8,
    /// 0 = no envelope change, 1-14 = active shape, 15 = envelope off.
    pub envelope: u8,
    pub ornament: u8,
    pub volume: u8,
    pub typ: NoteType,
    pub kind: NoteKind,
    /// Envelope note driving the shared hardware envelope.
    pub enote: u8,
    /// Pitch class of `enote` (0-11).
    pub epitch: u8,
    /// Octave of `enote`, clamped to 8.
    pub eoctave: u8,
}

impl FinalNote {
    /// Pure constructor: computes the derived envelope fields from the
    /// explicit ones.
    pub fn new(
        pitch: u8,
        sample: u8,
        envelope: u8,
        ornament: u8,
        volume: u8,
        typ: NoteType,
        kind: NoteKind,
        env: &EnvelopeContext,
    ) -> Self {
        let enote = if kind == NoteKind::Envelope && env.cool_envelope {
            (pitch as i32 + ENV_OFFSET_BY_PITCH[pitch as usize & 0x7F] as i32).clamp(0, 127) as u8
        } else {
            pitch
        };
        Self {
            pitch,
            sample,
            envelope,
            ornament,
            volume,
            typ,
            kind,
            enote,
            epitch: enote % 12,
            eoctave: (enote / 12).min(8),
        }
    }

    /// The canonical empty cell.
    pub fn empty() -> Self {
        Self {
            pitch: 0,
            sample: 0,
            envelope: 0,
            ornament: 0,
            volume: 0,
            typ: NoteType::Empty,
            kind: NoteKind::Plain,
            enote: 0,
            epitch: 0,
            eoctave: 0,
        }
    }

    /// A release cell for the given pitch.
    pub fn release(pitch: u8, env: &EnvelopeContext) -> Self {
        Self::new(pitch, 0, 0, 0, 0, NoteType::Release, NoteKind::Plain, env)
    }

    /// Rebuild with a different pitch.
    pub fn with_pitch(&self, pitch: u8, env: &EnvelopeContext) -> Self {
        Self::new(
            pitch,
            self.sample,
            self.envelope,
            self.ornament,
            self.volume,
            self.typ,
            self.kind,
            env,
        )
    }

    /// Rebuild with a different kind.
    pub fn with_kind(&self, kind: NoteKind, env: &EnvelopeContext) -> Self {
        Self::new(
            self.pitch,
            self.sample,
            self.envelope,
            self.ornament,
            self.volume,
            self.typ,
            kind,
            env,
        )
    }

    /// Rebuild with a different envelope index.
    pub fn with_envelope(&self, envelope: u8, env: &EnvelopeContext) -> Self {
        Self::new(
            self.pitch,
            self.sample,
            envelope,
            self.ornament,
            self.volume,
            self.typ,
            self.kind,
            env,
        )
    }

    /// Rebuild with a different volume.
    pub fn with_volume(&self, volume: u8, env: &EnvelopeContext) -> Self {
        Self::new(
            self.pitch,
            self.sample,
            self.envelope,
            self.ornament,
            volume,
            self.typ,
            self.kind,
            env,
        )
    }

    /// A sounding note, as opposed to a release or an empty cell.
    pub fn is_real(&self) -> bool {
        self.typ == NoteType::Start
    }

    /// Eligible to be overwritten by an echo or a merge.
    pub fn is_vacant(&self) -> bool {
        matches!(self.typ, NoteType::Empty | NoteType::Release)
    }

    /// Carries an active envelope shape this row.
    pub fn has_active_envelope(&self) -> bool {
        self.kind == NoteKind::Envelope && self.is_real() && (1..=14).contains(&self.envelope)
    }
}

/// Render a pitch as a 3-character note token, e.g. `C-4` or `A#5`.
pub fn note_token(pitch: u8) -> String {
    let name = NOTE_NAMES[(pitch % 12) as usize];
    let octave = (pitch / 12).saturating_sub(1).min(9);
    format!("{name}{octave}")
}

/// Render a 4-bit index as a symbol character, `.` for 0.
pub fn index_char(value: u8) -> char {
    if value == 0 {
        '.'
    } else {
        SYMBOLS[value as usize & 0x0F] as char
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ENV: EnvelopeContext = EnvelopeContext {
        cool_envelope: true,
        envelope_changes_volume: false,
    };

    #[test]
    fn derivation_is_total_and_idempotent() {
        for pitch in 0u8..128 {
            let n = FinalNote::new(pitch, 1, 10, 0, 15, NoteType::Start, NoteKind::Envelope, &ENV);
            assert_eq!(n.epitch, n.enote % 12);
            assert!(n.eoctave <= 8);
            // Rebuilding with the same fields changes nothing.
            assert_eq!(n.with_pitch(pitch, &ENV), n);
        }
    }

    #[test]
    fn cool_envelope_offsets_the_envelope_note() {
        let n = FinalNote::new(60, 1, 10, 0, 15, NoteType::Start, NoteKind::Envelope, &ENV);
        assert_eq!(n.enote, 48);
        let plain = FinalNote::new(60, 1, 0, 0, 15, NoteType::Start, NoteKind::Plain, &ENV);
        assert_eq!(plain.enote, 60);
    }

    #[test]
    fn with_kind_recomputes_derived_fields() {
        let n = FinalNote::new(80, 1, 10, 0, 15, NoteType::Start, NoteKind::Envelope, &ENV);
        let masked = n.with_kind(NoteKind::Mono, &ENV);
        assert_eq!(masked.enote, 80);
        assert_eq!(masked.epitch, 80 % 12);
    }

    #[test]
    fn note_tokens() {
        assert_eq!(note_token(60), "C-4");
        assert_eq!(note_token(61), "C#4");
        assert_eq!(note_token(69), "A-4");
        assert_eq!(note_token(0), "C-0");
    }

    #[test]
    fn shape_table_values_are_active_shapes() {
        for pitch in 0..128 {
            assert!((1..=14).contains(&ENV_SHAPE_BY_PITCH[pitch]));
        }
    }
}
