//! Conversion parameters and channel mapping.
//!
//! A channel mapping is written as a compact string, one per logical
//! channel:
//!
//! ```text
//! <source><mode><flags...><sample><ornament><group><policy>
//! ```
//!
//! * `source` - decimal source track index
//! * `mode` - `p` (poly), `m` (mono) or `d` (drum)
//! * `flags` - zero or more of `u` (no echo), `w` (wide echo), `e` (envelope)
//! * `sample` - sample index symbol (`0`-`F`, or `.` for 0)
//! * `ornament` - fixed ornament index symbol (`0`-`F`, or `.` for 0)
//! * `group` - physical output channel, `1`-`3`
//! * `policy` - `-` (overwrite, with forward note-stealing) or `+` (additive)
//!
//! `0pe2.1-` maps source track 0 into physical channel 1 as a poly voice
//! with hardware envelope, sample 2 and overwrite merging. The whole mapping
//! is validated once, before any transformation begins.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Symbol alphabet for 4-bit sample/ornament/envelope/volume indices.
pub const SYMBOLS: &[u8; 16] = b"0123456789ABCDEF";

/// Per-channel polyphony resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    /// Keep every simultaneous pitch (chords become ornaments).
    Poly,
    /// Keep the highest pitch.
    Mono,
    /// Keep the lowest pitch and remap it through the percussion tables.
    Drum,
}

/// Per-channel echo behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EchoMode {
    /// Echo at `per_delay` / `per_delay2`.
    Normal,
    /// No echo (`u`). Takes priority over `w`.
    Off,
    /// Echo at doubled offsets (`w`).
    Wide,
}

/// How a logical channel's notes merge into their physical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Probe rows `i..=i+3` and write into the first eligible one (`-`).
    Overwrite,
    /// Write only at row `i` (`+`).
    Additive,
}

/// One logical channel of the conversion, validated from its compact
/// mapping string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelSpec {
    /// Index into [`crate::event::EventSource::tracks`].
    pub source: usize,
    pub mode: VoiceMode,
    pub echo: EchoMode,
    /// Route through the shared hardware envelope (`e` flag).
    pub envelope: bool,
    /// Sample index (0-15).
    pub sample: u8,
    /// Fixed ornament id used by mono channels (0-15).
    pub ornament: u8,
    /// Physical output channel (0-2).
    pub group: u8,
    pub policy: MergePolicy,
}

impl ChannelSpec {
    /// Parse a compact mapping string. See the module docs for the grammar.
    pub fn parse(spec: &str) -> Result<Self, ConvertError> {
        let mut chars = spec.chars().peekable();

        let mut digits = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(*c);
                chars.next();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(ConvertError::config(spec, "missing source track index"));
        }
        let source: usize = digits
            .parse()
            .map_err(|_| ConvertError::config(spec, "source track index out of range"))?;

        let mode = match chars.next() {
            Some('p') => VoiceMode::Poly,
            Some('m') => VoiceMode::Mono,
            Some('d') => VoiceMode::Drum,
            Some(c) => {
                return Err(ConvertError::config(
                    spec,
                    format!("unknown voice mode '{c}' (expected p, m or d)"),
                ))
            }
            None => return Err(ConvertError::config(spec, "missing voice mode")),
        };

        let mut echo = EchoMode::Normal;
        let mut envelope = false;
        while let Some(&c) = chars.peek() {
            match c {
                'u' => echo = EchoMode::Off,
                'w' => {
                    if echo == EchoMode::Normal {
                        echo = EchoMode::Wide;
                    }
                }
                'e' => envelope = true,
                _ => break,
            }
            chars.next();
        }

        let rest: Vec<char> = chars.collect();
        let [sample_c, orn_c, group_c, policy_c] = rest.as_slice() else {
            return Err(ConvertError::config(
                spec,
                "expected exactly <sample><ornament><group><policy> after flags",
            ));
        };

        let sample = parse_symbol(*sample_c)
            .ok_or_else(|| ConvertError::config(spec, format!("bad sample symbol '{sample_c}'")))?;
        let ornament = parse_symbol(*orn_c).ok_or_else(|| {
            ConvertError::config(spec, format!("bad ornament symbol '{orn_c}'"))
        })?;
        let group = match group_c {
            '1'..='3' => *group_c as u8 - b'1',
            _ => {
                return Err(ConvertError::config(
                    spec,
                    format!("bad merge group '{group_c}' (expected 1-3)"),
                ))
            }
        };
        let policy = match policy_c {
            '-' => MergePolicy::Overwrite,
            '+' => MergePolicy::Additive,
            _ => {
                return Err(ConvertError::config(
                    spec,
                    format!("bad merge policy '{policy_c}' (expected - or +)"),
                ))
            }
        };

        Ok(Self {
            source,
            mode,
            echo,
            envelope,
            sample,
            ornament,
            group,
            policy,
        })
    }
}

impl std::fmt::Display for ChannelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)?;
        f.write_str(match self.mode {
            VoiceMode::Poly => "p",
            VoiceMode::Mono => "m",
            VoiceMode::Drum => "d",
        })?;
        match self.echo {
            EchoMode::Normal => {}
            EchoMode::Off => f.write_str("u")?,
            EchoMode::Wide => f.write_str("w")?,
        }
        if self.envelope {
            f.write_str("e")?;
        }
        write!(
            f,
            "{}{}{}{}",
            render_symbol(self.sample),
            render_symbol(self.ornament),
            self.group + 1,
            match self.policy {
                MergePolicy::Overwrite => '-',
                MergePolicy::Additive => '+',
            }
        )
    }
}

impl TryFrom<String> for ChannelSpec {
    type Error = ConvertError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChannelSpec::parse(&value)
    }
}

impl From<ChannelSpec> for String {
    fn from(value: ChannelSpec) -> Self {
        value.to_string()
    }
}

fn parse_symbol(c: char) -> Option<u8> {
    if c == '.' {
        return Some(0);
    }
    SYMBOLS
        .iter()
        .position(|&s| s as char == c.to_ascii_uppercase())
        .map(|i| i as u8)
}

fn render_symbol(value: u8) -> char {
    if value == 0 {
        '.'
    } else {
        SYMBOLS[value as usize & 0x0F] as char
    }
}

/// All scalar parameters of one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertParams {
    /// Quantization resolution.
    pub rows_per_beat: u32,
    /// First echo offset, in rows.
    pub per_delay: usize,
    /// Second echo offset, in rows.
    pub per_delay2: usize,
    /// Rows per pattern block.
    pub pattern_size: usize,
    /// Rendered rows dropped before pattern slicing.
    pub skip_lines: usize,
    /// How many consecutive times each ornament offset is written.
    pub orn_repeat: usize,
    /// Ornament offsets further than this from the median are dropped.
    pub max_offset: i32,
    /// Diatonic transpose amount in major-scale degrees; 0 disables the
    /// key-detection pre-pass entirely.
    pub diatonic_transpose: i32,
    /// Overrides the detected key (tonic pitch class 0-11).
    pub real_key: Option<u8>,
    /// Derive the envelope note from the played pitch via the offset table.
    pub cool_envelope: bool,
    /// Whether the hardware envelope is allowed to shape quiet notes.
    pub envelope_changes_volume: bool,
    /// Sample used by envelope channels at full volume.
    pub envelope_sample: u8,
    /// Sample used by envelope channels for delayed/echoed notes.
    pub delayed_envelope_sample: u8,
    /// Logical channel mappings, in merge order.
    pub channels: Vec<ChannelSpec>,
}

impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            rows_per_beat: 4,
            per_delay: 3,
            per_delay2: 6,
            pattern_size: 64,
            skip_lines: 0,
            orn_repeat: 1,
            max_offset: 12,
            diatonic_transpose: 0,
            real_key: None,
            cool_envelope: false,
            envelope_changes_volume: false,
            envelope_sample: 2,
            delayed_envelope_sample: 3,
            channels: Vec::new(),
        }
    }
}

impl ConvertParams {
    /// Effective echo offsets for a channel, honouring the `w` flag.
    pub(crate) fn echo_delays(&self, spec: &ChannelSpec) -> (usize, usize) {
        match spec.echo {
            EchoMode::Wide => (self.per_delay * 2, self.per_delay2 * 2),
            _ => (self.per_delay, self.per_delay2),
        }
    }

    /// The row margin quantization must reserve so that every echo write
    /// stays in bounds.
    pub(crate) fn echo_margin(&self) -> usize {
        let wide = self
            .channels
            .iter()
            .any(|c| c.echo == EchoMode::Wide);
        let d = self.per_delay.max(self.per_delay2);
        if wide {
            d * 2
        } else {
            d
        }
    }

    /// Validate the scalar parameters. Channel strings are validated by
    /// [`ChannelSpec::parse`]; this catches the rest before any work starts.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.rows_per_beat == 0 {
            return Err(ConvertError::InvalidParameter(
                "rows_per_beat must be >= 1".to_string(),
            ));
        }
        if self.pattern_size == 0 {
            return Err(ConvertError::InvalidParameter(
                "pattern_size must be >= 1".to_string(),
            ));
        }
        if self.orn_repeat == 0 {
            return Err(ConvertError::InvalidParameter(
                "orn_repeat must be >= 1".to_string(),
            ));
        }
        if let Some(key) = self.real_key {
            if key > 11 {
                return Err(ConvertError::InvalidParameter(format!(
                    "real_key must be a pitch class 0-11, got {key}"
                )));
            }
        }
        if self.envelope_sample > 15 || self.delayed_envelope_sample > 15 {
            return Err(ConvertError::InvalidParameter(
                "envelope samples must be 0-15".to_string(),
            ));
        }
        if self.channels.is_empty() {
            return Err(ConvertError::InvalidParameter(
                "at least one channel mapping is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_full_spec() {
        let spec = ChannelSpec::parse("10pwe2A3+").unwrap();
        assert_eq!(spec.source, 10);
        assert_eq!(spec.mode, VoiceMode::Poly);
        assert_eq!(spec.echo, EchoMode::Wide);
        assert!(spec.envelope);
        assert_eq!(spec.sample, 2);
        assert_eq!(spec.ornament, 10);
        assert_eq!(spec.group, 2);
        assert_eq!(spec.policy, MergePolicy::Additive);
    }

    #[test]
    fn parse_minimal_spec() {
        let spec = ChannelSpec::parse("0p..1-").unwrap();
        assert_eq!(spec.source, 0);
        assert_eq!(spec.echo, EchoMode::Normal);
        assert!(!spec.envelope);
        assert_eq!(spec.sample, 0);
        assert_eq!(spec.ornament, 0);
        assert_eq!(spec.group, 0);
        assert_eq!(spec.policy, MergePolicy::Overwrite);
    }

    #[test]
    fn u_flag_takes_priority_over_w() {
        let spec = ChannelSpec::parse("0puw..1-").unwrap();
        assert_eq!(spec.echo, EchoMode::Off);
        let spec = ChannelSpec::parse("0pwu..1-").unwrap();
        assert_eq!(spec.echo, EchoMode::Off);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(ChannelSpec::parse("p..1-").is_err(), "missing source");
        assert!(ChannelSpec::parse("0x..1-").is_err(), "unknown mode");
        assert!(ChannelSpec::parse("0p.Z1-").is_err(), "bad ornament symbol");
        assert!(ChannelSpec::parse("0p..4-").is_err(), "group out of range");
        assert!(ChannelSpec::parse("0p..1*").is_err(), "bad policy");
        assert!(ChannelSpec::parse("0p..1").is_err(), "truncated");
        assert!(ChannelSpec::parse("0p..1-x").is_err(), "trailing junk");
    }

    #[test]
    fn display_round_trips() {
        for s in ["0p..1-", "10pwe2A3+", "3du5.2-", "1me.71+"] {
            let spec = ChannelSpec::parse(s).unwrap();
            assert_eq!(spec.to_string(), s);
            assert_eq!(ChannelSpec::parse(&spec.to_string()).unwrap(), spec);
        }
    }

    #[test]
    fn channel_spec_serde_uses_compact_string() {
        let spec = ChannelSpec::parse("0pe2.1-").unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, "\"0pe2.1-\"");
        let back: ChannelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn params_default_and_validate() {
        let mut params = ConvertParams::default();
        assert!(params.validate().is_err(), "no channels yet");
        params.channels.push(ChannelSpec::parse("0p..1-").unwrap());
        params.validate().unwrap();

        params.real_key = Some(12);
        assert!(params.validate().is_err());
    }

    #[test]
    fn echo_margin_accounts_for_wide_channels() {
        let mut params = ConvertParams {
            channels: vec![ChannelSpec::parse("0p..1-").unwrap()],
            ..ConvertParams::default()
        };
        assert_eq!(params.echo_margin(), 6);
        params.channels.push(ChannelSpec::parse("1pw..2-").unwrap());
        assert_eq!(params.echo_margin(), 12);
    }
}
