//! Cell flattening: a row's marker set resolved under the channel's voice
//! mode.
//!
//! A continuing note under a new onset is kept as a start on mono and poly
//! channels, which models legato: the voice slides instead of retriggering.

use crate::config::VoiceMode;
use crate::expand::{Cell, MarkerType, RowMarker};

/// The resolved content of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatCell {
    Empty,
    /// A release with the pitch of the lowest released note.
    Release(RowMarker),
    /// One or more sounding pitches, all tagged as starts.
    Start(Vec<(u8, u8)>),
}

/// Resolve a cell under a voice mode. Total: every marker combination has an
/// explicit outcome.
pub fn flatten_cell(cell: &Cell, mode: VoiceMode) -> FlatCell {
    if cell.is_empty() {
        return FlatCell::Empty;
    }

    let sounding: Vec<&RowMarker> = cell
        .iter()
        .filter(|m| m.kind != MarkerType::Release)
        .collect();

    // Release-only cell: keep the lowest released pitch.
    if sounding.is_empty() {
        let mut lowest = &cell[0];
        for m in &cell[1..] {
            if m.pitch < lowest.pitch {
                lowest = m;
            }
        }
        return FlatCell::Release(RowMarker {
            kind: MarkerType::Release,
            ..*lowest
        });
    }

    // Any combination containing continues and/or starts drops the releases
    // and retags every survivor as a start.
    match mode {
        VoiceMode::Poly => {
            FlatCell::Start(sounding.iter().map(|m| (m.pitch, m.velocity)).collect())
        }
        VoiceMode::Mono => {
            let mut best = sounding[0];
            for m in &sounding[1..] {
                if m.pitch > best.pitch {
                    best = m;
                }
            }
            FlatCell::Start(vec![(best.pitch, best.velocity)])
        }
        VoiceMode::Drum => {
            // Drum mappings put the meaningful key lowest.
            let mut best = sounding[0];
            for m in &sounding[1..] {
                if m.pitch < best.pitch {
                    best = m;
                }
            }
            FlatCell::Start(vec![(best.pitch, best.velocity)])
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn m(pitch: u8, kind: MarkerType) -> RowMarker {
        RowMarker {
            pitch,
            velocity: 100,
            kind,
        }
    }

    #[test]
    fn empty_cell_stays_empty() {
        for mode in [VoiceMode::Poly, VoiceMode::Mono, VoiceMode::Drum] {
            assert_eq!(flatten_cell(&Vec::new(), mode), FlatCell::Empty);
        }
    }

    #[test]
    fn single_start_is_unchanged_in_every_mode() {
        let cell = vec![m(64, MarkerType::Start)];
        for mode in [VoiceMode::Poly, VoiceMode::Mono, VoiceMode::Drum] {
            assert_eq!(flatten_cell(&cell, mode), FlatCell::Start(vec![(64, 100)]));
        }
    }

    #[test]
    fn release_only_keeps_lowest_pitch() {
        let cell = vec![m(67, MarkerType::Release), m(60, MarkerType::Release)];
        let FlatCell::Release(marker) = flatten_cell(&cell, VoiceMode::Poly) else {
            panic!("expected a release");
        };
        assert_eq!(marker.pitch, 60);
        assert_eq!(marker.kind, MarkerType::Release);
    }

    #[test]
    fn poly_keeps_every_sounding_pitch_and_drops_releases() {
        let cell = vec![
            m(60, MarkerType::Continue),
            m(64, MarkerType::Start),
            m(55, MarkerType::Release),
        ];
        assert_eq!(
            flatten_cell(&cell, VoiceMode::Poly),
            FlatCell::Start(vec![(60, 100), (64, 100)])
        );
    }

    #[test]
    fn mono_keeps_highest_drum_keeps_lowest() {
        let cell = vec![
            m(60, MarkerType::Continue),
            m(64, MarkerType::Start),
            m(36, MarkerType::Start),
        ];
        assert_eq!(
            flatten_cell(&cell, VoiceMode::Mono),
            FlatCell::Start(vec![(64, 100)])
        );
        assert_eq!(
            flatten_cell(&cell, VoiceMode::Drum),
            FlatCell::Start(vec![(36, 100)])
        );
    }

    #[test]
    fn continue_only_retriggers_as_start() {
        let cell = vec![m(60, MarkerType::Continue)];
        assert_eq!(
            flatten_cell(&cell, VoiceMode::Mono),
            FlatCell::Start(vec![(60, 100)])
        );
    }

    #[test]
    fn equal_pitch_ties_keep_source_order() {
        let cell = vec![
            RowMarker { pitch: 64, velocity: 10, kind: MarkerType::Start },
            RowMarker { pitch: 64, velocity: 20, kind: MarkerType::Start },
        ];
        assert_eq!(
            flatten_cell(&cell, VoiceMode::Mono),
            FlatCell::Start(vec![(64, 10)])
        );
    }
}
