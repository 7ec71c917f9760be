//! Pending bits and accumulated letters.
//!
//! Bits arrive one at a time from movement input. A submit decodes them
//! through the [`BitTrie`] into a letter, which is appended to the letter
//! accumulator that keyword handlers scan for suffixes.

use crate::decoder::{bits_to_string, BitTrie, DecodeResult};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors from bit buffer edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("cannot {op}: no pending bits")]
    Empty { op: &'static str },
}

/// Pending bits plus the letter accumulator and keyword history.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    bits: VecDeque<bool>,
    capacity: usize,
    letters: String,
    max_letters: usize,
    history: Vec<String>,
    trie: BitTrie,
}

impl InputBuffer {
    /// Create an empty buffer decoding through `trie`.
    ///
    /// `capacity` is clamped to at least 2 and `max_letters` to at least 1.
    pub fn new(trie: BitTrie, capacity: usize, max_letters: usize) -> Self {
        let capacity = capacity.max(2);
        let max_letters = max_letters.max(1);
        Self {
            bits: VecDeque::with_capacity(capacity),
            capacity,
            letters: String::with_capacity(max_letters),
            max_letters,
            history: Vec::new(),
            trie,
        }
    }

    /// Append a bit. Reaching capacity evicts the oldest bit.
    pub fn insert(&mut self, bit: bool) {
        self.bits.push_back(bit);
        if self.bits.len() >= self.capacity {
            self.bits.pop_front();
        }

        tracing::debug!(
            len = self.bits.len(),
            bits = %self.bit_string(),
            "inserted into bit buffer"
        );
        tracing::debug!(preview = %self.peek_decode(), "letter on submit");
    }

    /// Decode a copy of the pending bits. The buffer is left untouched.
    pub fn peek_decode(&self) -> DecodeResult {
        self.trie.decode(self.bits.iter().copied()).result
    }

    /// Decode the pending bits, draining every bit the walk consumed.
    ///
    /// A letter is appended to the accumulator; the caller is responsible for
    /// notifying keyword handlers. Consumed bits are not restored when the
    /// walk ends on an overflow or incomplete node.
    pub fn submit(&mut self) -> DecodeResult {
        let decoded = self.trie.decode(self.bits.iter().copied());
        self.bits.drain(..decoded.consumed);

        match decoded.result {
            DecodeResult::Letter(letter) => {
                if self.letters.len() >= self.max_letters {
                    self.letters.remove(0);
                }
                self.letters.push(letter);
                tracing::info!(letters = %self.letters, "submission so far");
            }
            DecodeResult::Overflow => {
                tracing::warn!(
                    consumed = decoded.consumed,
                    "submission overflow: no letter at this path"
                );
            }
            DecodeResult::Incomplete => {
                tracing::error!(
                    consumed = decoded.consumed,
                    remaining = self.bits.len(),
                    "insufficient input: submission stopped before a letter"
                );
            }
        }

        decoded.result
    }

    /// Remove and return the newest bit.
    pub fn backspace(&mut self) -> Result<bool, BufferError> {
        self.bits
            .pop_back()
            .ok_or(BufferError::Empty { op: "backspace" })
    }

    /// Remove and return the oldest bit.
    pub fn pop(&mut self) -> Result<bool, BufferError> {
        self.bits.pop_front().ok_or(BufferError::Empty { op: "pop" })
    }

    /// Exact, case-sensitive suffix test against the accumulated letters.
    ///
    /// A match records `keyword` in the history and clears the whole
    /// accumulator, not just the matched suffix.
    pub fn ends_with(&mut self, keyword: &str) -> bool {
        if !self.letters.ends_with(keyword) {
            return false;
        }

        self.history.push(keyword.to_string());
        self.letters.clear();
        true
    }

    /// Empty the bits and the accumulator. History is kept.
    pub fn clear(&mut self) {
        self.bits.clear();
        self.letters.clear();
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    pub fn bit_string(&self) -> String {
        bits_to_string(&self.bits)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn letters(&self) -> &str {
        &self.letters
    }

    pub fn max_letters(&self) -> usize {
        self.max_letters
    }

    /// Keywords matched so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn trie(&self) -> &BitTrie {
        &self.trie
    }
}
