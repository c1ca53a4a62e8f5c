//! Ornament canonicalization and interning.
//!
//! An ornament is an ordered list of signed pitch offsets relative to a base
//! pitch. The table is append-only, lives for one conversion run, and is
//! keyed by the serialized canonical text; id 0 is always the all-zero
//! ornament.

use std::collections::HashMap;

/// Ornament ids render as one 4-bit symbol in the channel token, so a run
/// can address at most 16 of them (id 0 included).
pub const MAX_ORNAMENTS: usize = 16;

/// Result of canonicalizing an offset list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalOrnament {
    /// Sorted offsets with minimum 0, outliers dropped.
    pub offsets: Vec<i32>,
    /// Amount the base pitch must be raised to compensate for the shift.
    pub base_shift: i32,
}

impl CanonicalOrnament {
    pub fn is_trivial(&self) -> bool {
        self.offsets.iter().all(|&o| o == 0)
    }
}

/// Canonicalize an offset list: sort, drop offsets further than `max_offset`
/// from the (lower) median, then shift so the minimum offset is exactly 0.
pub fn canonicalize(offsets: &[i32], max_offset: i32) -> CanonicalOrnament {
    let mut sorted: Vec<i32> = offsets.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.is_empty() {
        return CanonicalOrnament {
            offsets: vec![0],
            base_shift: 0,
        };
    }

    let median = sorted[(sorted.len() - 1) / 2];
    sorted.retain(|&o| (o - median).abs() <= max_offset);
    // The median itself always survives the filter.
    let min = sorted[0];
    for o in &mut sorted {
        *o -= min;
    }
    CanonicalOrnament {
        offsets: sorted,
        base_shift: min,
    }
}

/// Append-only interning table for ornaments, shared across the whole run.
#[derive(Debug)]
pub struct OrnamentTable {
    orn_repeat: usize,
    entries: Vec<String>,
    index: HashMap<String, u8>,
}

impl OrnamentTable {
    /// `orn_repeat` is how many consecutive times each offset is written,
    /// encoding the chip's sub-row ornament speed.
    pub fn new(orn_repeat: usize) -> Self {
        let mut table = Self {
            orn_repeat,
            entries: Vec::new(),
            index: HashMap::new(),
        };
        // Id 0 is reserved for "no ornament".
        table.intern(&CanonicalOrnament {
            offsets: vec![0],
            base_shift: 0,
        });
        table
    }

    /// Serialize a canonical ornament: `L`-prefixed, comma-joined, each
    /// offset repeated `orn_repeat` times.
    fn serialize(&self, ornament: &CanonicalOrnament) -> String {
        let mut out = String::from("L");
        let mut first = true;
        for &offset in &ornament.offsets {
            for _ in 0..self.orn_repeat {
                if !first {
                    out.push(',');
                }
                out.push_str(&offset.to_string());
                first = false;
            }
        }
        out
    }

    /// Intern a canonical ornament, returning its id. The trivial ornament
    /// always resolves to id 0. Once the table holds [`MAX_ORNAMENTS`]
    /// entries, unseen ornaments degrade to id 0 and the note plays its
    /// base pitch alone; a larger table could not be addressed by the
    /// 4-bit symbol anyway.
    pub fn intern(&mut self, ornament: &CanonicalOrnament) -> u8 {
        let key = if ornament.is_trivial() {
            // Every all-zero ornament shares id 0 regardless of length.
            self.serialize(&CanonicalOrnament {
                offsets: vec![0],
                base_shift: 0,
            })
        } else {
            self.serialize(ornament)
        };
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        if self.entries.len() >= MAX_ORNAMENTS {
            return 0;
        }
        let id = self.entries.len() as u8;
        self.entries.push(key.clone());
        self.index.insert(key, id);
        id
    }

    /// Ornament definitions in id order, id 0 omitted.
    pub fn definitions(&self) -> impl Iterator<Item = (u8, &str)> {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, text)| (id as u8, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
