//! Canonical Huffman tables for the entropy coded scan.
//!
//! A DHT segment declares a table as sixteen code-length counts followed
//! by the symbol bytes in code order. Construction rebuilds the implied
//! prefix tree by always descending to the leftmost unused slot of the
//! target depth, so the k-th symbol becomes the k-th leaf in left-to-right
//! level order. The nodes live in an arena and reference each other by
//! index; an explicit descent stack stands in for parent pointers during
//! construction.

use std::io::BufRead;

use crate::bitstream::BitStream;
use crate::bytestream::ByteReader;
use crate::errors::DecodeErrors;

/// Number of code lengths a table declares.
pub(crate) const MAX_CODE_LENGTH: usize = 16;

/// One arena slot: an interior node carries children, a leaf carries its
/// symbol. A node never has both.
#[derive(Default)]
struct HuffmanNode {
    left: Option<u16>,
    right: Option<u16>,
    symbol: Option<u8>,
}

/// A canonical Huffman code table, stored as a binary tree in an arena.
#[allow(clippy::module_name_repetitions)]
pub(crate) struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
}

impl HuffmanTree {
    /// Build a tree from the sixteen per-length counts and the flat
    /// symbol list of a DHT segment.
    ///
    /// # Errors
    /// `MalformedHuffman` when the counts claim more leaves than a depth
    /// sixteen binary tree can hold, or declare no symbols at all.
    pub fn from_lengths(counts: &[u8; MAX_CODE_LENGTH], symbols: &[u8]) -> Result<HuffmanTree, DecodeErrors> {
        if symbols.is_empty() {
            return Err(DecodeErrors::MalformedHuffman(
                "table declares no symbols".to_string(),
            ));
        }

        let mut tree = HuffmanTree {
            nodes: vec![HuffmanNode::default()],
        };

        // indices of the nodes from the root down to the construction
        // cursor; the cursor is the last entry
        let mut path: Vec<u16> = vec![0];

        let mut remaining = symbols;

        for (i, &count) in counts.iter().enumerate() {
            let depth = i + 1;

            for _ in 0..count {
                let (&symbol, rest) = remaining.split_first().ok_or_else(|| {
                    DecodeErrors::MalformedHuffman(
                        "symbol list shorter than the declared counts".to_string(),
                    )
                })?;

                remaining = rest;

                tree.add_leaf(&mut path, symbol, depth)?;
            }
        }

        Ok(tree)
    }

    /// Place `symbol` at the leftmost unused slot of `depth`, then leave
    /// the cursor at its parent for the next code.
    fn add_leaf(&mut self, path: &mut Vec<u16>, symbol: u8, depth: usize) -> Result<(), DecodeErrors> {
        loop {
            let current = match path.last() {
                Some(&index) => usize::from(index),
                // ascended past the root: every slot up to depth sixteen
                // is taken
                None => {
                    return Err(DecodeErrors::MalformedHuffman(
                        "length counts overflow the tree capacity".to_string(),
                    ));
                }
            };

            if path.len() - 1 == depth {
                self.nodes[current].symbol = Some(symbol);
                path.pop();
                return Ok(());
            }

            // descend only into freshly created children; a filled pair
            // means this subtree is complete, so back out
            if self.nodes[current].left.is_none() {
                let child = self.alloc();
                self.nodes[current].left = Some(child);
                path.push(child);
            } else if self.nodes[current].right.is_none() {
                let child = self.alloc();
                self.nodes[current].right = Some(child);
                path.push(child);
            } else {
                path.pop();
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn alloc(&mut self) -> u16 {
        self.nodes.push(HuffmanNode::default());

        (self.nodes.len() - 1) as u16
    }

    /// Walk the tree one bit at a time until a leaf is hit and return its
    /// symbol.
    ///
    /// `Ok(None)` means the bit stream terminated mid-walk; the scan
    /// decoder treats that as the end of the entropy coded data.
    ///
    /// # Errors
    /// `CorruptScan` when the bits select a child that was never built,
    /// i.e. the scan data does not follow this table.
    pub fn decode_symbol<R>(
        &self, stream: &mut BitStream, reader: &mut ByteReader<R>,
    ) -> Result<Option<u8>, DecodeErrors>
    where
        R: BufRead,
    {
        let mut node = &self.nodes[0];

        loop {
            if let Some(symbol) = node.symbol {
                return Ok(Some(symbol));
            }

            let bit = match stream.next_bit(reader) {
                Some(bit) => bit,
                None => return Ok(None),
            };

            let child = if bit { node.right } else { node.left };

            match child {
                Some(index) => node = &self.nodes[usize::from(index)],
                None => {
                    return Err(DecodeErrors::CorruptScan(
                        "bit sequence does not resolve to a huffman code".to_string(),
                    ));
                }
            }
        }
    }
}
