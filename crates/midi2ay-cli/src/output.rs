//! Text module assembly.

use std::fmt::Write;

use midi2ay_core::ConvertOutput;

/// Render the full text module: header, ornament definitions, and one
/// `[Pattern N]` section per used block.
pub fn write_module(output: &ConvertOutput, title: &str) -> String {
    let mut text = String::new();

    let order: Vec<String> = output
        .patterns
        .play_order
        .iter()
        .map(|i| i.to_string())
        .collect();
    let _ = writeln!(text, "[Module]");
    let _ = writeln!(text, "Title={title}");
    let _ = writeln!(text, "PlayOrder=L{}", order.join(","));
    text.push('\n');

    for (id, offsets) in &output.ornaments {
        let _ = writeln!(text, "[Ornament{id}]");
        let _ = writeln!(text, "{offsets}");
        text.push('\n');
    }

    for (index, pattern) in output.patterns.distinct() {
        let _ = writeln!(text, "[Pattern{index}]");
        let _ = writeln!(text, "{pattern}");
        text.push('\n');
    }

    text
}
