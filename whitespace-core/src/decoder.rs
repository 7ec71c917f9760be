//! Binary-to-letter decoder.
//!
//! A [`BitTrie`] is a complete binary tree of fixed depth. Walking it from the
//! root with a sequence of bits (`false` = left, `true` = right) lands on a
//! node that holds a letter, the overflow sentinel, or nothing at all.
//!
//! Two layouts are supported:
//! - [`TrieLayout::Leaves`] labels only the deepest level, so every letter is
//!   spelled with exactly `depth - 1` bits.
//! - [`TrieLayout::Prefix`] labels every node in breadth-first order, so
//!   short bit strings decode too (`0` is `A`, `10` is `E`, `0000` is `O`).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// How letters are laid out over the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrieLayout {
    /// Letters on the deepest level only.
    #[default]
    Leaves,
    /// Letters on every non-root node, breadth-first.
    Prefix,
}

/// What a node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Internal node with no meaning of its own.
    Empty,
    /// A decodable letter.
    Letter(char),
    /// The alphabet ran out before this slot (also held by the root).
    Overflow,
}

/// Result of walking the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    Letter(char),
    Overflow,
    /// The walk stopped on a node that carries no symbol.
    Incomplete,
}

impl DecodeResult {
    /// The decoded letter, if any.
    pub fn letter(self) -> Option<char> {
        match self {
            DecodeResult::Letter(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeResult::Letter(c) => write!(f, "{c}"),
            DecodeResult::Overflow => write!(f, "_"),
            DecodeResult::Incomplete => write!(f, "?"),
        }
    }
}

/// A decode result plus the number of bits the walk consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub result: DecodeResult,
    pub consumed: usize,
}

#[derive(Debug, Clone)]
struct Node {
    symbol: Symbol,
    depth: usize,
    parent: Option<(usize, bool)>,
    children: Option<[usize; 2]>,
}

/// Fixed-depth binary trie mapping bit sequences to letters.
#[derive(Debug, Clone)]
pub struct BitTrie {
    nodes: Vec<Node>,
    depth: usize,
    layout: TrieLayout,
}

impl BitTrie {
    /// Build a trie of the given depth with letters on the leaves.
    pub fn build(depth: usize) -> Self {
        Self::with_layout(depth, TrieLayout::Leaves)
    }

    /// Build a trie of the given depth and layout.
    ///
    /// Nodes are created breadth-first, left child before right child, and
    /// letters `A..=Z` are handed out in creation order to the labelled
    /// slots. Labelled slots past `Z` hold [`Symbol::Overflow`].
    pub fn with_layout(depth: usize, layout: TrieLayout) -> Self {
        let depth = depth.max(1);
        let leaf_depth = depth - 1;

        let mut nodes = vec![Node {
            symbol: Symbol::Overflow,
            depth: 0,
            parent: None,
            children: None,
        }];
        let mut letters = 'A'..='Z';
        let mut queue = VecDeque::new();
        if leaf_depth > 0 {
            queue.push_back(0);
        }

        while let Some(parent) = queue.pop_front() {
            let child_depth = nodes[parent].depth + 1;
            let mut children = [0usize; 2];

            for (side, slot) in children.iter_mut().enumerate() {
                let labelled = layout == TrieLayout::Prefix || child_depth == leaf_depth;
                let symbol = if labelled {
                    letters.next().map_or(Symbol::Overflow, Symbol::Letter)
                } else {
                    Symbol::Empty
                };

                *slot = nodes.len();
                nodes.push(Node {
                    symbol,
                    depth: child_depth,
                    parent: Some((parent, side == 1)),
                    children: None,
                });

                // Don't expand the final level.
                if child_depth < leaf_depth {
                    queue.push_back(*slot);
                }
            }

            nodes[parent].children = Some(children);
        }

        Self {
            nodes,
            depth,
            layout,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn layout(&self) -> TrieLayout {
        self.layout
    }

    /// Number of nodes on the deepest level.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_none()).count()
    }

    /// Number of nodes holding a letter.
    pub fn letter_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.symbol, Symbol::Letter(_)))
            .count()
    }

    /// Walk the trie with `bits`, oldest first.
    ///
    /// The walk stops when the bits run out or a leaf is reached; bits past
    /// a leaf are left unconsumed.
    pub fn decode<I>(&self, bits: I) -> Decoded
    where
        I: IntoIterator<Item = bool>,
    {
        let mut node = 0;
        let mut consumed = 0;

        for bit in bits {
            let Some(children) = self.nodes[node].children else {
                break;
            };
            node = children[usize::from(bit)];
            consumed += 1;
        }

        let result = match self.nodes[node].symbol {
            Symbol::Letter(c) => DecodeResult::Letter(c),
            Symbol::Overflow => DecodeResult::Overflow,
            Symbol::Empty => DecodeResult::Incomplete,
        };

        Decoded { result, consumed }
    }

    /// The bit path that spells `letter`, oldest bit first.
    pub fn path_for(&self, letter: char) -> Option<Vec<bool>> {
        let mut node = self
            .nodes
            .iter()
            .position(|n| n.symbol == Symbol::Letter(letter))?;

        let mut path = Vec::with_capacity(self.nodes[node].depth);
        while let Some((parent, went_right)) = self.nodes[node].parent {
            path.push(went_right);
            node = parent;
        }
        path.reverse();
        Some(path)
    }
}

/// Render bits as a `0`/`1` string.
pub fn bits_to_string<'a, I>(bits: I) -> String
where
    I: IntoIterator<Item = &'a bool>,
{
    bits.into_iter().map(|&b| if b { '1' } else { '0' }).collect()
}
