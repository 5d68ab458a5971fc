//! Greedy windowing with text-only overlap.

use super::types::{Block, BlockKind};

fn block_len(block: &Block) -> usize {
    block.text.chars().count()
}

fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Trailing text-block overlap to seed the next chunk with.
///
/// Scans the just-closed chunk's blocks from the end, skipping code
/// blocks, accumulating until the budget is met; at least one qualifying
/// block is taken when any exists. Original order is restored.
fn overlap_suffix(blocks: &[Block], overlap_chars: usize) -> Vec<Block> {
    if overlap_chars == 0 {
        return Vec::new();
    }
    let mut total = 0usize;
    let mut picked: Vec<Block> = Vec::new();
    for block in blocks.iter().rev() {
        if block.kind != BlockKind::Text {
            continue;
        }
        let len = block_len(block);
        if total + len > overlap_chars && !picked.is_empty() {
            break;
        }
        total += len;
        picked.push(block.clone());
        if total >= overlap_chars {
            break;
        }
    }
    picked.reverse();
    picked
}

/// Walk a section's blocks in order, accumulating them into chunks of at
/// most `max_chars` (counting a two-character join per appended block).
/// A single block that alone exceeds the budget is emitted whole.
pub(crate) fn window_blocks(
    blocks: &[Block],
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<String> {
    if blocks.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<Block> = Vec::new();
    let mut current_len = 0usize;

    for block in blocks {
        let len = block_len(block);
        if !current.is_empty() && current_len + len + 2 > max_chars {
            chunks.push(join_blocks(&current));
            current = overlap_suffix(&current, overlap_chars);
            current_len = current.iter().map(block_len).sum();
        }
        current.push(block.clone());
        current_len += len + 2;
    }

    if !current.is_empty() {
        chunks.push(join_blocks(&current));
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}
