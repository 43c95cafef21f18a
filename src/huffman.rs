//! Huffman compression and decompression
//!
//! Classic Huffman coding over any ordered, hashable symbol type: bytes for
//! plain Huffman, LZW codes for the composed pipeline. The payload carries no
//! code table; decoding needs the [`CodeTable`] from the encoding run, or the
//! [`FrequencyTable`] it was built from.
//!
//! Tree construction is deterministic. Leaves are seeded in ascending symbol
//! order and every node pushed onto the heap takes the next sequence number;
//! the heap pops by (frequency, sequence number), and the first node popped
//! becomes the left child.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitstream;
use crate::error::CompressError;

/// Anything that can be counted and placed in a code table.
pub trait Symbol: Copy + Ord + Hash + Debug {}

impl<T: Copy + Ord + Hash + Debug> Symbol for T {}

/// Occurrence count per distinct symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable<S: Ord> {
    counts: BTreeMap<S, u64>,
}

impl<S: Symbol> FrequencyTable<S> {
    pub fn from_symbols(symbols: &[S]) -> Self {
        let mut counts = BTreeMap::new();
        for &symbol in symbols {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, symbol: &S) -> u64 {
        self.counts.get(symbol).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (S, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &freq)| (symbol, freq))
    }
}

impl<S: Symbol> FromIterator<(S, u64)> for FrequencyTable<S> {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

impl<S: Ord> Default for FrequencyTable<S> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum HuffNode<S> {
    Leaf {
        symbol: S,
        freq: u64,
    },
    Internal {
        freq: u64,
        left: Box<HuffNode<S>>,
        right: Box<HuffNode<S>>,
    },
}

impl<S> HuffNode<S> {
    pub fn freq(&self) -> u64 {
        match self {
            HuffNode::Leaf { freq, .. } | HuffNode::Internal { freq, .. } => *freq,
        }
    }

    fn merge(left: Self, right: Self) -> Result<Self, CompressError> {
        let freq = left.freq().checked_add(right.freq()).ok_or_else(|| {
            CompressError::InvalidFrequencies(format!(
                "combined weight of {} and {} overflows",
                left.freq(),
                right.freq()
            ))
        })?;
        Ok(HuffNode::Internal {
            freq,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

struct HeapEntry<S> {
    seq: u64,
    node: HuffNode<S>,
}

impl<S> Eq for HeapEntry<S> {}
impl<S> PartialEq for HeapEntry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<S> PartialOrd for HeapEntry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<S> Ord for HeapEntry<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on (freq, seq)
        (other.node.freq(), other.seq).cmp(&(self.node.freq(), self.seq))
    }
}

#[derive(Debug, Clone)]
pub struct HuffmanTree<S> {
    root: HuffNode<S>,
}

impl<S: Symbol> HuffmanTree<S> {
    /// Returns `None` when there are no symbols at all. Zero counts and
    /// weights that overflow `u64` are rejected.
    pub fn build(frequencies: &FrequencyTable<S>) -> Result<Option<Self>, CompressError> {
        let mut heap = BinaryHeap::with_capacity(frequencies.len());
        let mut seq = 0u64;
        for (symbol, freq) in frequencies.iter() {
            if freq == 0 {
                return Err(CompressError::InvalidFrequencies(format!(
                    "symbol {:?} has a zero count",
                    symbol
                )));
            }
            heap.push(HeapEntry {
                seq,
                node: HuffNode::Leaf { symbol, freq },
            });
            seq += 1;
        }

        loop {
            let Some(first) = heap.pop() else {
                return Ok(None);
            };
            let Some(second) = heap.pop() else {
                return Ok(Some(HuffmanTree { root: first.node }));
            };
            heap.push(HeapEntry {
                seq,
                node: HuffNode::merge(first.node, second.node)?,
            });
            seq += 1;
        }
    }

    pub fn root(&self) -> &HuffNode<S> {
        &self.root
    }
}

/// Symbol to bit-string mapping and its inverse.
#[derive(Debug, Clone)]
pub struct CodeTable<S> {
    codes: HashMap<S, Vec<bool>>,
    reverse: HashMap<Vec<bool>, S>,
    max_len: usize,
}

impl<S: Symbol> CodeTable<S> {
    /// Left edges are `false`, right edges `true`. A tree that is a single
    /// leaf gives its symbol the one-bit code `0`.
    pub fn from_tree(tree: &HuffmanTree<S>) -> Self {
        let mut table = Self::empty();
        if let HuffNode::Leaf { symbol, .. } = tree.root() {
            table.insert(*symbol, vec![false]);
            return table;
        }

        let mut stack: Vec<(&HuffNode<S>, Vec<bool>)> = vec![(tree.root(), Vec::new())];
        while let Some((node, prefix)) = stack.pop() {
            match node {
                HuffNode::Leaf { symbol, .. } => table.insert(*symbol, prefix),
                HuffNode::Internal { left, right, .. } => {
                    let mut right_code = prefix.clone();
                    right_code.push(true);
                    let mut left_code = prefix;
                    left_code.push(false);
                    stack.push((right.as_ref(), right_code));
                    stack.push((left.as_ref(), left_code));
                }
            }
        }
        table
    }

    pub fn from_frequencies(frequencies: &FrequencyTable<S>) -> Result<Self, CompressError> {
        Ok(match HuffmanTree::build(frequencies)? {
            Some(tree) => Self::from_tree(&tree),
            None => Self::empty(),
        })
    }

    fn empty() -> Self {
        Self {
            codes: HashMap::new(),
            reverse: HashMap::new(),
            max_len: 0,
        }
    }

    fn insert(&mut self, symbol: S, code: Vec<bool>) {
        self.max_len = self.max_len.max(code.len());
        self.reverse.insert(code.clone(), symbol);
        self.codes.insert(symbol, code);
    }

    pub fn code(&self, symbol: &S) -> Option<&[bool]> {
        self.codes.get(symbol).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn max_code_len(&self) -> usize {
        self.max_len
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &[bool])> + '_ {
        self.codes.iter().map(|(symbol, code)| (symbol, code.as_slice()))
    }

    /// Concatenate the code of every symbol, no separators.
    pub fn encode(&self, symbols: &[S]) -> Result<Vec<bool>, CompressError> {
        let mut bits = Vec::new();
        for symbol in symbols {
            let code = self.codes.get(symbol).ok_or_else(|| {
                CompressError::UnknownCode(format!("symbol {:?} has no code", symbol))
            })?;
            bits.extend_from_slice(code);
        }
        Ok(bits)
    }

    pub fn decode(&self, bits: &[bool]) -> Result<Vec<S>, CompressError> {
        let mut output = Vec::new();
        let mut candidate = Vec::with_capacity(self.max_len);
        for (pos, &bit) in bits.iter().enumerate() {
            candidate.push(bit);
            if let Some(&symbol) = self.reverse.get(&candidate) {
                output.push(symbol);
                candidate.clear();
            } else if candidate.len() >= self.max_len {
                return Err(CompressError::UnknownCode(format!(
                    "no code matches the {} bits ending at bit {}",
                    candidate.len(),
                    pos
                )));
            }
        }
        if !candidate.is_empty() {
            return Err(CompressError::UnknownCode(format!(
                "{} trailing bits do not form a complete code",
                candidate.len()
            )));
        }
        Ok(output)
    }
}

/// A padded payload together with the tables needed to decode it.
#[derive(Debug, Clone)]
pub struct HuffmanEncoded<S: Ord> {
    pub data: Vec<u8>,
    pub frequencies: FrequencyTable<S>,
    pub table: CodeTable<S>,
}

/// Huffman-encode an arbitrary symbol stream into a padded byte payload.
pub fn encode_symbols<S: Symbol>(symbols: &[S]) -> Result<HuffmanEncoded<S>, CompressError> {
    let frequencies = FrequencyTable::from_symbols(symbols);
    let table = CodeTable::from_frequencies(&frequencies)?;
    let bits = table.encode(symbols)?;
    debug!(
        symbols = symbols.len(),
        distinct = table.len(),
        max_code_len = table.max_code_len(),
        bits = bits.len(),
        "huffman encoded"
    );
    let data = bitstream::pack(&bits)?;
    Ok(HuffmanEncoded {
        data,
        frequencies,
        table,
    })
}

pub fn decode_symbols<S: Symbol>(data: &[u8], table: &CodeTable<S>) -> Result<Vec<S>, CompressError> {
    let bits = bitstream::unpack(data)?;
    table.decode(&bits)
}

/// Compress data using Huffman coding
pub fn compress(data: &[u8]) -> Result<HuffmanEncoded<u8>, CompressError> {
    encode_symbols(data)
}

/// Decompress Huffman-encoded data
pub fn decompress(data: &[u8], table: &CodeTable<u8>) -> Result<Vec<u8>, CompressError> {
    decode_symbols(data, table)
}
