//! Byte-buffer helpers for reading host stack and memory snapshots.

use ethereum_types::{H256, U256};

/// Narrow a stack word to a native index, saturating at `usize::MAX`.
pub fn narrow_word(word: U256) -> usize {
    if word.bits() > 64 {
        return usize::MAX;
    }
    usize::try_from(word.low_u64()).unwrap_or(usize::MAX)
}

/// Word `n` positions below the top of a bottom-to-top stack snapshot.
pub fn stack_word_from_top(stack: &[U256], n: usize) -> Option<U256> {
    let index = stack.len().checked_sub(n)?.checked_sub(1)?;
    stack.get(index).copied()
}

/// Same as [`stack_word_from_top`], as a 32-byte big-endian word.
pub fn stack_hash_from_top(stack: &[U256], n: usize) -> Option<H256> {
    stack_word_from_top(stack, n).map(|word| H256::from(word.to_big_endian()))
}

/// Read `size` bytes of `memory` starting at `offset`.
///
/// Memory past the end of the buffer reads as zero, so the result is always
/// exactly `size` bytes long.
pub fn read_padded(memory: &[u8], offset: usize, size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    if let Some(available) = memory.get(offset..) {
        let copied = size.min(available.len());
        if let (Some(dst), Some(src)) = (data.get_mut(..copied), available.get(..copied)) {
            dst.copy_from_slice(src);
        }
    }
    data
}

/// `0x` followed by the lowercase hex encoding of `bytes`.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
