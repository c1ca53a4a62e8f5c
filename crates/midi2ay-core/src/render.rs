//! Line rendering: the 3 physical channels to fixed-format text rows.
//!
//! The chip has a single shared hardware envelope, so each row elects a
//! dominant envelope note; competing envelope notes on the same row are
//! masked down to plain mono notes or pulled up an octave into unison.

use crate::note::{index_char, note_token, EnvelopeContext, FinalNote, NoteKind, NoteType};

/// Row token for a cell with no envelope note.
const NO_ENVELOPE: &str = "...";

/// Render every row of the downmixed module.
pub fn render_lines(physical: &[Vec<FinalNote>; 3], env: &EnvelopeContext) -> Vec<String> {
    let rows = physical[0].len();
    debug_assert!(physical.iter().all(|c| c.len() == rows));

    let mut lines = Vec::with_capacity(rows);
    let mut prev_env = [0u8; 3];
    let mut prev_dominant: Option<u8> = None;

    for row in 0..rows {
        let mut notes = [physical[0][row], physical[1][row], physical[2][row]];

        // Dominant envelope note: the highest played pitch among the row's
        // active envelopes. Not the same as the highest envelope note: the
        // cool-envelope offset table steps down an extra octave at C5.
        let cenote = notes
            .iter()
            .filter(|n| n.has_active_envelope())
            .max_by_key(|n| n.pitch)
            .copied();

        if let Some(cen) = cenote {
            for note in &mut notes {
                if !note.has_active_envelope() {
                    continue;
                }
                if note.epitch != cen.epitch {
                    // Incompatible shape on the same row: the lower note
                    // loses its envelope for this row only.
                    *note = note.with_kind(NoteKind::Mono, env).with_envelope(0, env);
                } else if note.eoctave < cen.eoctave {
                    // Same pitch class an octave down: pull into unison.
                    *note = note.with_pitch(note.pitch.saturating_add(12).min(127), env);
                }
            }

            // A full-volume dominant silences stale envelope carry-over in
            // empty cells whose previous row rang a different pitch class.
            if cen.volume == 15 {
                for (ch, note) in notes.iter_mut().enumerate() {
                    if note.typ == NoteType::Empty
                        && (1..=14).contains(&prev_env[ch])
                        && prev_dominant.is_some_and(|pc| pc != cen.epitch)
                    {
                        *note = note.with_envelope(15, env);
                    }
                }
            }
        }

        let env_token = match cenote {
            Some(cen) => note_token(cen.eoctave * 12 + cen.epitch),
            None => NO_ENVELOPE.to_string(),
        };
        let line = format!(
            "{env_token}|{}|{}|{}",
            channel_token(&notes[0]),
            channel_token(&notes[1]),
            channel_token(&notes[2]),
        );
        lines.push(line);

        for (ch, note) in notes.iter().enumerate() {
            prev_env[ch] = note.envelope;
        }
        if let Some(cen) = cenote {
            prev_dominant = Some(cen.epitch);
        }
    }
    lines
}

/// One channel's fixed-width token: note name plus sample, envelope,
/// ornament and volume characters.
fn channel_token(note: &FinalNote) -> String {
    let name = match note.typ {
        NoteType::Empty => "---".to_string(),
        NoteType::Release => "R--".to_string(),
        NoteType::Start => note_token(note.pitch),
    };
    format!(
        "{name} {}{}{}{}",
        index_char(note.sample),
        index_char(note.envelope),
        index_char(note.ornament),
        index_char(note.volume),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::note::ENV_SHAPE_BY_PITCH;

    const ENV: EnvelopeContext = EnvelopeContext {
        cool_envelope: false,
        envelope_changes_volume: false,
    };

    fn start(pitch: u8, volume: u8) -> FinalNote {
        FinalNote::new(pitch, 1, 0, 0, volume, NoteType::Start, NoteKind::Plain, &ENV)
    }

    fn env_note(pitch: u8, volume: u8) -> FinalNote {
        FinalNote::new(
            pitch,
            2,
            ENV_SHAPE_BY_PITCH[pitch as usize],
            0,
            volume,
            NoteType::Start,
            NoteKind::Envelope,
            &ENV,
        )
    }

    fn rows(a: &[FinalNote], b: &[FinalNote], c: &[FinalNote]) -> [Vec<FinalNote>; 3] {
        [a.to_vec(), b.to_vec(), c.to_vec()]
    }

    #[test]
    fn renders_empty_release_and_note_tokens() {
        let physical = rows(
            &[start(60, 15), FinalNote::empty()],
            &[FinalNote::empty(), FinalNote::release(60, &ENV)],
            &[FinalNote::empty(), FinalNote::empty()],
        );
        let lines = render_lines(&physical, &ENV);
        assert_eq!(lines[0], "...|C-4 1..F|--- ....|--- ....");
        assert_eq!(lines[1], "...|--- ....|R-- ....|--- ....");
    }

    #[test]
    fn shared_envelope_slot_shows_the_dominant_note() {
        let physical = rows(&[env_note(60, 15)], &[FinalNote::empty()], &[FinalNote::empty()]);
        let lines = render_lines(&physical, &ENV);
        assert!(lines[0].starts_with("C-4|"), "line: {}", lines[0]);
    }

    #[test]
    fn dominant_is_elected_by_played_pitch() {
        let env = EnvelopeContext {
            cool_envelope: true,
            envelope_changes_volume: false,
        };
        let mk = |pitch: u8| {
            FinalNote::new(
                pitch,
                2,
                ENV_SHAPE_BY_PITCH[pitch as usize],
                0,
                15,
                NoteType::Start,
                NoteKind::Envelope,
                &env,
            )
        };
        // B4 carries envelope note 59, C5 carries 48: the offset table
        // drops an extra octave at C5, so ordering by envelope note would
        // elect the lower played pitch.
        let physical = rows(&[mk(71)], &[mk(72)], &[FinalNote::empty()]);
        let lines = render_lines(&physical, &env);
        assert!(lines[0].starts_with("C-3|"), "line: {}", lines[0]);
    }

    #[test]
    fn conflicting_pitch_class_is_masked_to_mono() {
        let physical = rows(
            &[env_note(62, 15)], // D, loses to the higher E
            &[env_note(64, 15)],
            &[FinalNote::empty()],
        );
        let lines = render_lines(&physical, &ENV);
        // Channel A keeps its pitch but its envelope char is cleared.
        assert_eq!(lines[0], "E-4|D-4 2..F|E-4 2C.F|--- ....");
    }

    #[test]
    fn same_pitch_class_lower_octave_is_pulled_up() {
        let physical = rows(
            &[env_note(48, 15)], // C3 under a C4 dominant
            &[env_note(60, 15)],
            &[FinalNote::empty()],
        );
        let lines = render_lines(&physical, &ENV);
        assert_eq!(lines[0], "C-4|C-4 2A.F|C-4 2C.F|--- ....");
    }

    #[test]
    fn stale_envelope_is_silenced_on_pitch_class_change() {
        let physical = rows(
            &[env_note(60, 15), FinalNote::empty()],
            &[FinalNote::empty(), env_note(62, 15)],
            &[FinalNote::empty(), FinalNote::empty()],
        );
        let lines = render_lines(&physical, &ENV);
        // Channel A rang a C envelope on row 0; row 1's dominant is D at
        // full volume, so A's empty cell gets an explicit envelope-off.
        assert_eq!(lines[1], "D-4|--- .F..|D-4 2C.F|--- ....");
    }

    #[test]
    fn no_silencing_when_pitch_class_is_unchanged() {
        let physical = rows(
            &[env_note(60, 15), FinalNote::empty()],
            &[FinalNote::empty(), env_note(72, 15)],
            &[FinalNote::empty(), FinalNote::empty()],
        );
        let lines = render_lines(&physical, &ENV);
        assert_eq!(lines[1], "C-5|--- ....|C-5 2C.F|--- ....");
    }
}
