//! midi2ay conversion core.
//!
//! Turns a time-stamped sequence of note events into a row-quantized,
//! pattern-based tracker module for a 3-channel AY-style sound chip.
//! The pipeline is a synchronous, deterministic batch transform:
//!
//! 1. [`quantize`]: absolute ticks to integer rows
//! 2. [`expand`]: notes to per-row start/continue/release markers
//! 3. [`flatten`]: polyphony resolution under the channel's voice mode
//! 4. [`synth`]: final notes, ornament interning, envelope derivation
//! 5. [`echo`]: attenuated delayed copies
//! 6. [`downmix`]: N logical channels onto the 3 physical ones
//! 7. [`render`]: shared-envelope conflict resolution and text rows
//! 8. [`pattern`]: block deduplication and play order
//!
//! [`keyscan`] is an optional pre-pass that only remaps pitches. The whole
//! run is driven by [`config::ConvertParams`] through [`pipeline::convert`].

pub mod config;
pub mod downmix;
pub mod echo;
pub mod error;
pub mod event;
pub mod expand;
pub mod flatten;
pub mod keyscan;
pub mod note;
pub mod ornament;
pub mod pattern;
pub mod pipeline;
pub mod quantize;
pub mod render;
pub mod synth;

pub use config::{ChannelSpec, ConvertParams, EchoMode, MergePolicy, VoiceMode};
pub use error::ConvertError;
pub use event::{EventSource, NoteEvent};
pub use pattern::PatternSet;
pub use pipeline::{convert, ConvertOutput};

/// Crate version for front-end identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
