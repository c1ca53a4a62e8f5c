//! midi2ay - MIDI to AY tracker module conversion.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use midly::Smf;

use midi2ay_core::{convert, ChannelSpec, ConvertParams};

mod output;
mod smf;

/// Convert a Standard MIDI File into a 3-channel AY tracker text module.
#[derive(Parser)]
#[command(name = "midi2ay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input MIDI file
    input: PathBuf,

    /// Output module path (default: input with a .txt extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Conversion parameters as a JSON file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Channel mapping, e.g. `0p..1-` (repeatable; replaces the config's
    /// channel list when given)
    #[arg(short, long = "channel")]
    channels: Vec<String>,

    /// Rows per beat
    #[arg(long)]
    rows_per_beat: Option<u32>,

    /// Rows per pattern block
    #[arg(long)]
    pattern_size: Option<usize>,

    /// Rendered rows to drop before pattern slicing
    #[arg(long)]
    skip_lines: Option<usize>,

    /// First echo offset in rows
    #[arg(long)]
    per_delay: Option<usize>,

    /// Second echo offset in rows
    #[arg(long)]
    per_delay2: Option<usize>,

    /// Ornament speed: times each offset is repeated
    #[arg(long)]
    orn_repeat: Option<usize>,

    /// Widest allowed ornament offset around the median
    #[arg(long)]
    max_offset: Option<i32>,

    /// Diatonic transpose in major-scale degrees (enables key detection)
    #[arg(long, allow_hyphen_values = true)]
    transpose: Option<i32>,

    /// Tonic pitch class 0-11, overriding key detection
    #[arg(long)]
    key: Option<u8>,

    /// Derive the envelope note from the played pitch
    #[arg(long)]
    cool_envelope: bool,

    /// Let the hardware envelope shape quiet notes
    #[arg(long)]
    envelope_changes_volume: bool,

    /// Module title
    #[arg(long, default_value = "midi2ay")]
    title: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(summary) => {
            println!("{} {summary}", "OK".green().bold());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let params = build_params(cli)?;

    let bytes = fs::read(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let smf = Smf::parse(&bytes).context("failed to parse MIDI file")?;
    let source = smf::event_source_from_smf(&smf)?;

    let result = convert(&source, &params)?;
    let text = output::write_module(&result, &cli.title);

    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("txt"));
    fs::write(&out_path, text)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    Ok(format!(
        "{} rows, {} patterns ({} distinct), {} ornaments -> {}",
        result.rows,
        result.patterns.blocks.len(),
        result.patterns.distinct().count(),
        result.ornaments.len(),
        out_path.display()
    ))
}

fn build_params(cli: &Cli) -> Result<ConvertParams> {
    let mut params = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ConvertParams::default(),
    };

    if !cli.channels.is_empty() {
        params.channels = cli
            .channels
            .iter()
            .map(|s| ChannelSpec::parse(s))
            .collect::<Result<_, _>>()?;
    }
    if let Some(v) = cli.rows_per_beat {
        params.rows_per_beat = v;
    }
    if let Some(v) = cli.pattern_size {
        params.pattern_size = v;
    }
    if let Some(v) = cli.skip_lines {
        params.skip_lines = v;
    }
    if let Some(v) = cli.per_delay {
        params.per_delay = v;
    }
    if let Some(v) = cli.per_delay2 {
        params.per_delay2 = v;
    }
    if let Some(v) = cli.orn_repeat {
        params.orn_repeat = v;
    }
    if let Some(v) = cli.max_offset {
        params.max_offset = v;
    }
    if let Some(v) = cli.transpose {
        params.diatonic_transpose = v;
    }
    if let Some(v) = cli.key {
        params.real_key = Some(v);
    }
    if cli.cool_envelope {
        params.cool_envelope = true;
    }
    if cli.envelope_changes_volume {
        params.envelope_changes_volume = true;
    }

    Ok(params)
}
