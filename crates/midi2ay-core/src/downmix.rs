//! Downmixing: N logical channels merged into the 3 physical chip channels.

use crate::config::{ChannelSpec, MergePolicy};
use crate::note::FinalNote;

/// How far an overwrite-policy channel probes forward for a free row.
const STEAL_DEPTH: usize = 3;

/// Merge the logical channels into 3 physical channels, in source-declared
/// order. Later channels of a group may overwrite earlier ones, never the
/// reverse.
pub fn downmix(
    channels: &[(ChannelSpec, Vec<FinalNote>)],
    rows: usize,
) -> [Vec<FinalNote>; 3] {
    let mut physical = [
        vec![FinalNote::empty(); rows],
        vec![FinalNote::empty(); rows],
        vec![FinalNote::empty(); rows],
    ];

    for (spec, notes) in channels {
        debug_assert!(notes.len() <= rows, "channel array larger than physical rows");
        let target = &mut physical[spec.group as usize];
        for (i, note) in notes.iter().enumerate() {
            merge_note(target, i, note, spec.policy);
        }
    }
    physical
}

/// Write one incoming note under a merge policy. Additive probes only the
/// exact row; overwrite steals forward up to three rows when the exact row
/// is taken.
fn merge_note(target: &mut [FinalNote], row: usize, incoming: &FinalNote, policy: MergePolicy) {
    let depth = match policy {
        MergePolicy::Additive => 0,
        MergePolicy::Overwrite => STEAL_DEPTH,
    };
    for probe in row..=row + depth {
        let Some(existing) = target.get_mut(probe) else {
            return;
        };
        if accepts(existing, incoming) {
            *existing = *incoming;
            return;
        }
    }
}

/// An incoming note lands on a cell that is empty, a release, or strictly
/// quieter. Releases only ever land on empty cells; empties never move.
fn accepts(existing: &FinalNote, incoming: &FinalNote) -> bool {
    use crate::note::NoteType::*;
    match incoming.typ {
        Empty => false,
        Release => existing.typ == Empty,
        Start => match existing.typ {
            Empty | Release => true,
            Start => existing.volume < incoming.volume,
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ChannelSpec;
    use crate::note::{EnvelopeContext, NoteKind, NoteType};

    const ENV: EnvelopeContext = EnvelopeContext {
        cool_envelope: false,
        envelope_changes_volume: false,
    };

    fn start(pitch: u8, volume: u8) -> FinalNote {
        FinalNote::new(pitch, 1, 0, 0, volume, NoteType::Start, NoteKind::Plain, &ENV)
    }

    fn channel(spec: &str, rows: usize, notes: &[(usize, FinalNote)]) -> (ChannelSpec, Vec<FinalNote>) {
        let mut v = vec![FinalNote::empty(); rows];
        for &(i, n) in notes {
            v[i] = n;
        }
        (ChannelSpec::parse(spec).unwrap(), v)
    }

    #[test]
    fn additive_louder_wins_quieter_dropped() {
        let channels = vec![
            channel("0p..1+", 8, &[(2, start(60, 15))]),
            channel("1p..1+", 8, &[(2, start(72, 10))]),
        ];
        let mixed = downmix(&channels, 8);
        assert_eq!(mixed[0][2].pitch, 60);
        assert_eq!(mixed[0][2].volume, 15);
        assert!(mixed[0][3].is_vacant(), "additive never steals forward");
    }

    #[test]
    fn additive_quieter_is_replaced_by_later_louder() {
        let channels = vec![
            channel("0p..1+", 8, &[(2, start(60, 10))]),
            channel("1p..1+", 8, &[(2, start(72, 15))]),
        ];
        let mixed = downmix(&channels, 8);
        assert_eq!(mixed[0][2].pitch, 72);
    }

    #[test]
    fn overwrite_steals_the_next_free_row() {
        let channels = vec![
            channel("0p..1-", 8, &[(2, start(60, 15))]),
            channel("1p..1-", 8, &[(2, start(72, 15))]),
        ];
        let mixed = downmix(&channels, 8);
        assert_eq!(mixed[0][2].pitch, 60, "equal volume does not displace");
        assert_eq!(mixed[0][3].pitch, 72, "stolen into the next row");
    }

    #[test]
    fn overwrite_probe_is_bounded() {
        let channels = vec![
            channel("0p..1-", 4, &[(0, start(60, 15)), (1, start(62, 15)), (2, start(64, 15)), (3, start(65, 15))]),
            channel("1p..1-", 4, &[(0, start(72, 15))]),
        ];
        let mixed = downmix(&channels, 4);
        // All four probe rows hold equally loud notes; the incoming one is
        // dropped without panicking at the array end.
        assert_eq!(mixed[0][3].pitch, 65);
    }

    #[test]
    fn releases_only_land_on_empty_cells() {
        let release = FinalNote::release(60, &ENV);
        let channels = vec![
            channel("0p..1+", 4, &[(1, start(60, 5))]),
            channel("1p..1+", 4, &[(1, release), (2, release)]),
        ];
        let mixed = downmix(&channels, 4);
        assert_eq!(mixed[0][1].typ, NoteType::Start, "release cannot displace a note");
        assert_eq!(mixed[0][2].typ, NoteType::Release);
    }

    #[test]
    fn groups_are_independent() {
        let channels = vec![
            channel("0p..1+", 4, &[(0, start(60, 15))]),
            channel("1p..3+", 4, &[(0, start(72, 15))]),
        ];
        let mixed = downmix(&channels, 4);
        assert_eq!(mixed[0][0].pitch, 60);
        assert!(mixed[1][0].is_vacant());
        assert_eq!(mixed[2][0].pitch, 72);
    }
}
