//! Pattern deduplication and play order.

use std::collections::HashMap;

/// One fixed-size block of rendered rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBlock {
    /// The block's rows joined with `\n`.
    pub text: String,
    /// Whether this block is the first occurrence of its text and is
    /// materialized in the output.
    pub used: bool,
}

/// Deduplicated patterns plus the sequence that plays them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    /// All blocks in slicing order, repeats included.
    pub blocks: Vec<PatternBlock>,
    /// One entry per block, pointing at the first occurrence of its text.
    pub play_order: Vec<usize>,
}

impl PatternSet {
    /// Distinct pattern texts with their block indices, in first-seen order.
    pub fn distinct(&self) -> impl Iterator<Item = (usize, &str)> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.used)
            .map(|(i, b)| (i, b.text.as_str()))
    }
}

/// Slice rendered lines into `pattern_size` blocks (after dropping
/// `skip_lines` leading rows) and deduplicate by exact text equality.
pub fn deduplicate(lines: &[String], pattern_size: usize, skip_lines: usize) -> PatternSet {
    debug_assert!(pattern_size > 0);
    let lines = lines.get(skip_lines.min(lines.len())..).unwrap_or(&[]);

    let mut blocks = Vec::new();
    let mut play_order = Vec::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, chunk) in lines.chunks(pattern_size).enumerate() {
        let text = chunk.join("\n");
        match first_seen.get(&text) {
            Some(&first) => {
                play_order.push(first);
                blocks.push(PatternBlock { text, used: false });
            }
            None => {
                first_seen.insert(text.clone(), index);
                play_order.push(index);
                blocks.push(PatternBlock { text, used: true });
            }
        }
    }

    PatternSet { blocks, play_order }
}
