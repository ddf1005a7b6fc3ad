//! Size-bounded, order-preserving splitting of text blocks
//!
//! Blocks are never cut: a block heavier than the bound gets a chunk of its own.

use crate::error::{StoreError, StoreResult};

/// A unit of text that must stay whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub text: String,
    pub weight: usize,
}

impl Block {
    pub fn new(text: impl Into<String>, weight: usize) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }

    /// Weigh a block by its line count (number of `\n`)
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let weight = text.matches('\n').count();
        Self { text, weight }
    }
}

/// Consecutive blocks sharing one output part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub blocks: Vec<Block>,
    pub weight: usize,
}

impl Chunk {
    fn push(&mut self, block: Block) {
        self.weight += block.weight;
        self.blocks.push(block);
    }

    /// Concatenated text of all blocks
    pub fn text(&self) -> String {
        self.blocks.iter().map(|b| b.text.as_str()).collect()
    }
}

/// Split blocks into chunks whose weight stays within `max_weight`
///
/// Input that fits as a whole comes back as one chunk. Otherwise chunks are
/// filled greedily in order, closing the open chunk whenever the next block
/// would push it past the bound.
pub fn split(blocks: Vec<Block>, max_weight: usize) -> StoreResult<Vec<Chunk>> {
    if max_weight == 0 {
        return Err(StoreError::InvalidArgument("max weight must be at least 1".to_string()));
    }
    if blocks.is_empty() {
        return Ok(Vec::new());
    }

    let total: usize = blocks.iter().map(|b| b.weight).sum();
    if total <= max_weight {
        return Ok(vec![Chunk {
            blocks,
            weight: total,
        }]);
    }

    let mut chunks = Vec::new();
    let mut current = Chunk::default();
    for block in blocks {
        if !current.blocks.is_empty() && current.weight.saturating_add(block.weight) > max_weight {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(block);
    }
    if !current.blocks.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}
