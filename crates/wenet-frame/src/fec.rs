//! Repeat-accumulate parity generation.
//!
//! The code is rate ~0.8: 2064 information bits (payload + checksum) produce
//! 516 parity bits. Each parity bit sums a fixed set of information bits taken
//! from a generator table, then runs through a mod-2 accumulator. The table is
//! the pinned reference artifact shared with the ground-station decoder and is
//! loaded at runtime rather than compiled in.

use std::fmt;
use std::path::Path;

use crate::error::{FrameError, Result};

/// Bytes covered by parity: payload plus checksum.
pub const CHECKED_BLOCK_SIZE: usize = 258;

/// Information bits per block.
pub const INFO_BITS: usize = CHECKED_BLOCK_SIZE * 8;

/// Parity bits per block.
pub const PARITY_BITS: usize = 516;

/// Parity bits zero-padded to a byte boundary.
pub const PARITY_SIZE: usize = PARITY_BITS.div_ceil(8);

/// Produces the parity block appended to an FEC-enabled frame.
pub trait ParityEncoder: Send + Sync {
    /// Encode parity over a payload+checksum block.
    fn encode_parity(&self, block: &[u8; CHECKED_BLOCK_SIZE]) -> [u8; PARITY_SIZE];
}

/// Table-driven repeat-accumulate encoder.
///
/// The table holds `PARITY_BITS * row_weight` one-based information bit
/// indices, laid out column-major: entry `p + i * PARITY_BITS` is the `i`-th
/// bit summed into parity bit `p`.
#[derive(Clone)]
pub struct RepeatAccumulateEncoder {
    table: Vec<u16>,
    row_weight: usize,
}

impl RepeatAccumulateEncoder {
    /// Build an encoder from a generator table.
    pub fn from_table(table: Vec<u16>) -> Result<Self> {
        if table.is_empty() {
            return Err(FrameError::InvalidParityTable("table is empty".to_string()));
        }
        if table.len() % PARITY_BITS != 0 {
            return Err(FrameError::InvalidParityTable(format!(
                "{} entries is not a multiple of {PARITY_BITS}",
                table.len()
            )));
        }
        if let Some((pos, &index)) = table
            .iter()
            .enumerate()
            .find(|&(_, &index)| index == 0 || usize::from(index) > INFO_BITS)
        {
            return Err(FrameError::InvalidParityTable(format!(
                "entry {pos} references bit {index}, valid range is 1..={INFO_BITS}"
            )));
        }

        let row_weight = table.len() / PARITY_BITS;
        Ok(Self { table, row_weight })
    }

    /// Parse a generator table from text.
    ///
    /// Accepts the body of a C array: integers separated by commas, whitespace
    /// or braces, with `//` and `/* */` comments.
    pub fn parse(text: &str) -> Result<Self> {
        let stripped = strip_comments(text);
        let mut table = Vec::new();

        for token in stripped
            .split(|c: char| c == ',' || c == '{' || c == '}' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            let value = token.parse::<u16>().map_err(|_| {
                FrameError::InvalidParityTable(format!("unexpected token {token:?}"))
            })?;
            table.push(value);
        }

        Self::from_table(table)
    }

    /// Load a generator table from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let encoder = Self::parse(&text)?;
        tracing::debug!(
            path = %path.display(),
            row_weight = encoder.row_weight,
            "loaded parity generator table"
        );
        Ok(encoder)
    }

    /// Number of information bits summed into each parity bit.
    pub fn row_weight(&self) -> usize {
        self.row_weight
    }
}

impl ParityEncoder for RepeatAccumulateEncoder {
    fn encode_parity(&self, block: &[u8; CHECKED_BLOCK_SIZE]) -> [u8; PARITY_SIZE] {
        let mut parity = [0u8; PARITY_SIZE];
        let mut prev = 0u8;

        for p in 0..PARITY_BITS {
            let mut sum = 0u8;
            for i in 0..self.row_weight {
                let index = usize::from(self.table[p + i * PARITY_BITS]) - 1;
                sum ^= bit_at(block, index);
            }
            prev ^= sum;
            if prev != 0 {
                parity[p / 8] |= 0x80 >> (p % 8);
            }
        }

        parity
    }
}

impl fmt::Debug for RepeatAccumulateEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatAccumulateEncoder")
            .field("row_weight", &self.row_weight)
            .finish()
    }
}

/// MSB-first bit extraction.
fn bit_at(block: &[u8], index: usize) -> u8 {
    (block[index / 8] >> (7 - index % 8)) & 1
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |end| &after[end + 2..]);
            out.push(' ');
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }

    out
}
