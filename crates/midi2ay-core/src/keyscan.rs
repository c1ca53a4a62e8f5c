//! Optional key detection and diatonic transpose pre-pass.
//!
//! Estimates the major key from a duration-weighted pitch-class histogram
//! matched against the Krumhansl-Kessler major profile, then moves every
//! pitch by a number of major-scale degrees. Only pitches are remapped; the
//! pass never runs unless a transpose amount is configured.

use crate::quantize::QuantizedNote;

/// Krumhansl-Kessler major key profile.
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Major scale intervals in semitones.
const MAJOR_SCALE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Estimate the tonic pitch class (0-11) of the best-fitting major key.
///
/// Notes are weighted by their row length so long notes dominate the
/// histogram; zero-length notes still count with weight 1. Ties resolve to
/// the lower pitch class.
pub fn detect_major_key(notes: &[QuantizedNote]) -> u8 {
    let mut histogram = [0f64; 12];
    for note in notes {
        let weight = note.length().max(1) as f64;
        histogram[(note.pitch % 12) as usize] += weight;
    }

    let mut best_key = 0u8;
    let mut best_score = f64::NEG_INFINITY;
    for key in 0..12u8 {
        let mut score = 0.0;
        for pc in 0..12 {
            score += histogram[(pc + key as usize) % 12] * MAJOR_PROFILE[pc];
        }
        if score > best_score {
            best_score = score;
            best_key = key;
        }
    }
    best_key
}

/// Move a pitch by `degrees` major-scale degrees within the given key.
///
/// Scale tones map to scale tones; a chromatic passing tone transposes as
/// its lower scale neighbour raised a semitone. The result is clamped to
/// the MIDI range.
pub fn diatonic_transpose(pitch: u8, key: u8, degrees: i32) -> u8 {
    let rel = pitch as i32 - key as i32;
    let octave = rel.div_euclid(12);
    let pc = rel.rem_euclid(12);

    let (degree, accidental) = match MAJOR_SCALE.iter().position(|&s| s == pc) {
        Some(d) => (d as i32, 0),
        None => {
            let below = MAJOR_SCALE
                .iter()
                .rposition(|&s| s < pc)
                .unwrap_or(0) as i32;
            (below, 1)
        }
    };

    let shifted = degree + degrees;
    let result = key as i32
        + 12 * (octave + shifted.div_euclid(7))
        + MAJOR_SCALE[shifted.rem_euclid(7) as usize]
        + accidental;
    result.clamp(0, 127) as u8
}

/// Remap the pitches of every quantized note in place.
pub fn transpose_notes(notes: &mut [QuantizedNote], key: u8, degrees: i32) {
    if degrees == 0 {
        return;
    }
    for note in notes {
        note.pitch = diatonic_transpose(note.pitch, key, degrees);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scale_notes(key: u8) -> Vec<QuantizedNote> {
        MAJOR_SCALE
            .iter()
            .enumerate()
            .map(|(i, &s)| QuantizedNote {
                pitch: (60 + key as i32 + s) as u8,
                start_row: i * 2,
                off_row: i * 2 + 1,
                velocity: 100,
            })
            .collect()
    }

    #[test]
    fn detects_major_scales() {
        for key in [0u8, 2, 5, 7, 9] {
            assert_eq!(detect_major_key(&scale_notes(key)), key, "key {key}");
        }
    }

    #[test]
    fn long_notes_weigh_more() {
        // A long G anchors G major over the C major implied by the rest.
        let mut notes = scale_notes(0);
        notes.push(QuantizedNote {
            pitch: 67,
            start_row: 0,
            off_row: 200,
            velocity: 100,
        });
        notes.push(QuantizedNote {
            pitch: 74,
            start_row: 0,
            off_row: 100,
            velocity: 100,
        });
        assert_eq!(detect_major_key(&notes), 7);
    }

    #[test]
    fn transpose_moves_scale_tones_diatonically() {
        // C major, up a third: C->E, E->G, G->B.
        assert_eq!(diatonic_transpose(60, 0, 2), 64);
        assert_eq!(diatonic_transpose(64, 0, 2), 67);
        assert_eq!(diatonic_transpose(67, 0, 2), 71);
        // Down a second: C4 -> B3.
        assert_eq!(diatonic_transpose(60, 0, -1), 59);
    }

    #[test]
    fn transpose_carries_accidentals() {
        // C# in C major sits a semitone over C; up a third lands on E#=F.
        assert_eq!(diatonic_transpose(61, 0, 2), 65);
    }

    #[test]
    fn transpose_zero_is_identity() {
        for pitch in 0u8..128 {
            assert_eq!(diatonic_transpose(pitch, 0, 0), pitch);
        }
    }

    #[test]
    fn transpose_clamps_to_midi_range() {
        assert_eq!(diatonic_transpose(126, 0, 7), 127);
        assert_eq!(diatonic_transpose(1, 0, -14), 0);
    }
}
