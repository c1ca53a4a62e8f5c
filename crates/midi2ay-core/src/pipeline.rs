//! The conversion pipeline: event source in, pattern set out.
//!
//! Data flows strictly forward. Each stage owns what it produces; the only
//! shared state is the ornament table (append-only, written by one channel
//! at a time) and the quantizer's running maximum row.

use crate::config::ConvertParams;
use crate::downmix::downmix;
use crate::echo::apply_echo;
use crate::error::ConvertError;
use crate::event::EventSource;
use crate::expand::expand_notes;
use crate::flatten::{flatten_cell, FlatCell};
use crate::keyscan::{detect_major_key, transpose_notes};
use crate::note::EnvelopeContext;
use crate::ornament::OrnamentTable;
use crate::pattern::{deduplicate, PatternSet};
use crate::quantize::{QuantizedNote, Quantizer};
use crate::render::render_lines;
use crate::synth::synthesize_channel;

/// Everything the file writer needs.
#[derive(Debug)]
pub struct ConvertOutput {
    /// Deduplicated pattern blocks and their play order.
    pub patterns: PatternSet,
    /// Ornament definitions `(id, offsets)`, id 0 omitted.
    pub ornaments: Vec<(u8, String)>,
    /// Total rendered rows, before pattern slicing.
    pub rows: usize,
}

/// Run the whole pipeline over one event source.
pub fn convert(source: &EventSource, params: &ConvertParams) -> Result<ConvertOutput, ConvertError> {
    params.validate()?;
    for spec in &params.channels {
        if spec.source >= source.tracks.len() {
            return Err(ConvertError::DegenerateInput {
                channel: spec.source,
            });
        }
    }

    let env = EnvelopeContext {
        cool_envelope: params.cool_envelope,
        envelope_changes_volume: params.envelope_changes_volume,
    };

    // Quantize every mapped channel, tracking one global maximum row so all
    // row arrays line up for the downmix.
    let mut quantizer = Quantizer::new(
        source.ticks_per_beat,
        params.rows_per_beat,
        params.echo_margin(),
    );
    let mut quantized: Vec<Vec<QuantizedNote>> = params
        .channels
        .iter()
        .map(|spec| {
            source.tracks[spec.source]
                .iter()
                .map(|event| quantizer.quantize(event))
                .collect()
        })
        .collect();
    let rows = quantizer.max_row() + 1;

    // Optional key pre-pass: pitches only, never active by default.
    if params.diatonic_transpose != 0 {
        let key = match params.real_key {
            Some(key) => key,
            None => {
                let all: Vec<QuantizedNote> =
                    quantized.iter().flatten().copied().collect();
                detect_major_key(&all)
            }
        };
        for notes in &mut quantized {
            transpose_notes(notes, key, params.diatonic_transpose);
        }
    }

    // Per-channel stages: expand, flatten, synthesize, echo.
    let mut ornaments = OrnamentTable::new(params.orn_repeat);
    let mut channels = Vec::with_capacity(params.channels.len());
    for (spec, notes) in params.channels.iter().zip(&quantized) {
        let cells = expand_notes(notes, rows - 1);
        let flat: Vec<FlatCell> = cells
            .iter()
            .map(|cell| flatten_cell(cell, spec.mode))
            .collect();
        let mut synthesized = synthesize_channel(&flat, spec, params, &env, &mut ornaments);
        apply_echo(&mut synthesized, spec, params, &env);
        channels.push((spec.clone(), synthesized));
    }

    let physical = downmix(&channels, rows);
    let lines = render_lines(&physical, &env);
    let patterns = deduplicate(&lines, params.pattern_size, params.skip_lines);

    Ok(ConvertOutput {
        patterns,
        ornaments: ornaments
            .definitions()
            .map(|(id, text)| (id, text.to_string()))
            .collect(),
        rows: lines.len(),
    })
}
