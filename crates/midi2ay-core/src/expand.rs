//! Row expansion: quantized notes to per-row marker cells.

use crate::quantize::QuantizedNote;

/// How a note touches one particular row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerType {
    Start,
    Continue,
    Release,
}

/// One note's contribution to one row of one logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMarker {
    pub pitch: u8,
    pub velocity: u8,
    pub kind: MarkerType,
}

/// All markers landing on one row of one channel. Order within the cell is
/// source order; flattening treats it as a set.
pub type Cell = Vec<RowMarker>;

/// Expand a channel's notes into a row-indexed cell array of size
/// `max_row + 1`.
///
/// Each note emits exactly one start marker at its start row, one release
/// marker at its off row, and a continue marker for every row strictly
/// between. A zero-length note collapses to start + release on the same row.
pub fn expand_notes(notes: &[QuantizedNote], max_row: usize) -> Vec<Cell> {
    let mut rows: Vec<Cell> = vec![Vec::new(); max_row + 1];
    for note in notes {
        debug_assert!(note.off_row <= max_row, "row array sized without echo margin");
        rows[note.start_row].push(RowMarker {
            pitch: note.pitch,
            velocity: note.velocity,
            kind: MarkerType::Start,
        });
        for row in rows.iter_mut().take(note.off_row).skip(note.start_row + 1) {
            row.push(RowMarker {
                pitch: note.pitch,
                velocity: note.velocity,
                kind: MarkerType::Continue,
            });
        }
        rows[note.off_row].push(RowMarker {
            pitch: note.pitch,
            velocity: note.velocity,
            kind: MarkerType::Release,
        });
    }
    rows
}
