// Block signatures of a base object.
//
// A `Signature` is the per-block (weak, strong) checksum list plus the
// derived weak-checksum index.  It is produced by one `SignatureBuilder`
// pass over the base object (or decoded from its wire form) and is
// read-only afterwards.
//
// - `table`:   WeakIndex: weak checksum -> candidate blocks
// - `builder`: SignatureBuilder: streaming construction
// - `codec`:   wire format (magic, block_len, strong_len, records)

pub mod builder;
pub mod codec;
pub mod table;

pub use builder::{SignatureBuilder, signature};
pub use codec::{deserialize, read_signature, serialize, write_signature};
pub use table::WeakIndex;

use crate::error::ParseError;
use crate::hash::config::{SIGNATURE_HEADER_LEN, SignatureOptions};
use crate::hash::strong::{SigType, StrongHash};

/// Checksums of one base block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSignature<'a> {
    /// Block index (position in the base object, in blocks).
    pub index: u32,
    pub weak: u32,
    pub strong: &'a [u8],
}

/// Finalized signature of a base object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    hash: StrongHash,
    block_len: u32,
    weak_sums: Vec<u32>,
    /// `strong_len` bytes per block, concatenated in block order.
    strong_sums: Vec<u8>,
    index: WeakIndex,
}

impl Signature {
    /// Assemble a signature from validated parts, deriving the weak index.
    pub(crate) fn from_parts(
        hash: StrongHash,
        block_len: u32,
        weak_sums: Vec<u32>,
        strong_sums: Vec<u8>,
    ) -> Self {
        debug_assert!(block_len > 0);
        debug_assert_eq!(strong_sums.len(), weak_sums.len() * hash.strong_len());
        let index = WeakIndex::build(&weak_sums);
        Self {
            hash,
            block_len,
            weak_sums,
            strong_sums,
            index,
        }
    }

    pub fn sig_type(&self) -> SigType {
        self.hash.sig_type()
    }

    pub fn block_len(&self) -> u32 {
        self.block_len
    }

    pub fn strong_len(&self) -> u32 {
        self.hash.strong_len() as u32
    }

    /// The parameters this signature was built with.
    pub fn options(&self) -> SignatureOptions {
        SignatureOptions {
            sig_type: self.sig_type(),
            block_len: self.block_len,
            strong_len: self.strong_len(),
        }
    }

    /// Strong hasher matching this signature's variant and truncation.
    pub fn strong_hash(&self) -> StrongHash {
        self.hash
    }

    pub fn block_count(&self) -> usize {
        self.weak_sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weak_sums.is_empty()
    }

    pub fn weak_sum(&self, index: usize) -> u32 {
        self.weak_sums[index]
    }

    pub fn strong_sum(&self, index: usize) -> &[u8] {
        let len = self.hash.strong_len();
        &self.strong_sums[index * len..(index + 1) * len]
    }

    pub fn block(&self, index: usize) -> Option<BlockSignature<'_>> {
        (index < self.block_count()).then(|| BlockSignature {
            index: index as u32,
            weak: self.weak_sums[index],
            strong: self.strong_sum(index),
        })
    }

    /// Blocks in base-object order.
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = BlockSignature<'_>> + '_ {
        self.weak_sums
            .iter()
            .zip(self.strong_sums.chunks_exact(self.hash.strong_len()))
            .enumerate()
            .map(|(i, (&weak, strong))| BlockSignature {
                index: i as u32,
                weak,
                strong,
            })
    }

    pub fn weak_index(&self) -> &WeakIndex {
        &self.index
    }

    /// Byte offset of block `index` in the base object.
    #[inline]
    pub fn block_offset(&self, index: usize) -> u64 {
        index as u64 * u64::from(self.block_len)
    }

    /// Exact size of the wire encoding.
    pub fn serialized_len(&self) -> usize {
        SIGNATURE_HEADER_LEN + self.block_count() * (4 + self.hash.strong_len())
    }

    pub fn serialize(&self) -> Vec<u8> {
        codec::serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, ParseError> {
        codec::deserialize(bytes)
    }
}
