//! Echo generation: attenuated delayed copies of real notes.

use crate::config::{ChannelSpec, ConvertParams, EchoMode};
use crate::note::{EnvelopeContext, FinalNote};
use crate::synth::apply_envelope_policy;

/// Inject two quieter copies of every real note at `per_delay` and
/// `per_delay2` rows later (doubled for wide channels). A copy only lands on
/// an empty or release cell; foreground notes are never overwritten, and
/// copies are planned from a snapshot so an echo never spawns further
/// echoes.
pub fn apply_echo(
    rows: &mut [FinalNote],
    spec: &ChannelSpec,
    params: &ConvertParams,
    env: &EnvelopeContext,
) {
    if spec.echo == EchoMode::Off {
        return;
    }
    let (d1, d2) = params.echo_delays(spec);

    let sources: Vec<(usize, FinalNote)> = rows
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_real())
        .map(|(i, n)| (i, *n))
        .collect();

    for (i, note) in sources {
        for (delay, factor) in [(d1, 0.7), (d2, 0.49)] {
            let target = i + delay;
            let Some(slot) = rows.get_mut(target) else {
                continue;
            };
            if !slot.is_vacant() {
                continue;
            }
            let volume = (f32::from(note.volume) * factor) as u8;
            let copy = note.with_volume(volume, env);
            *slot = apply_envelope_policy(copy, params, env);
        }
    }
}
