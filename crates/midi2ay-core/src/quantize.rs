//! Tick-to-row quantization.

use crate::event::NoteEvent;

/// One note mapped onto the row grid. `off_row >= start_row`; a zero-length
/// note is legal and simply produces no continue markers downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedNote {
    pub pitch: u8,
    pub start_row: usize,
    pub off_row: usize,
    pub velocity: u8,
}

impl QuantizedNote {
    pub fn length(&self) -> usize {
        self.off_row - self.start_row
    }
}

/// Maps absolute ticks to integer rows and tracks the running maximum row,
/// echo margin included, which sizes every later stage's row arrays.
#[derive(Debug)]
pub struct Quantizer {
    clocks_per_row: f64,
    echo_margin: usize,
    max_row: usize,
}

impl Quantizer {
    /// `clocks_per_row = ticks_per_beat / rows_per_beat` - a rational, not
    /// necessarily an integer.
    pub fn new(ticks_per_beat: u32, rows_per_beat: u32, echo_margin: usize) -> Self {
        Self {
            clocks_per_row: f64::from(ticks_per_beat) / f64::from(rows_per_beat),
            echo_margin,
            max_row: 0,
        }
    }

    /// Round-half-up tick-to-row mapping, monotonic in the tick.
    fn row(&self, tick: u64) -> usize {
        (tick as f64 / self.clocks_per_row + 0.5).floor() as usize
    }

    /// Quantize one event, extending the running maximum row.
    pub fn quantize(&mut self, event: &NoteEvent) -> QuantizedNote {
        let start_row = self.row(event.start_tick);
        let off_row = self.row(event.end_tick).max(start_row);
        self.max_row = self.max_row.max(off_row + self.echo_margin);
        QuantizedNote {
            pitch: event.pitch,
            start_row,
            off_row,
            velocity: event.velocity,
        }
    }

    /// Highest row any stage may touch, echo margin included.
    pub fn max_row(&self) -> usize {
        self.max_row
    }
}
