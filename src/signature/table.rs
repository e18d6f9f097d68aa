// Weak checksum -> block index lookup.
//
// Weak checksums collide by design, so every bucket keeps *all* the blocks
// that share a value.  Collisions are settled later by strong-hash
// verification; nothing is ever dropped here.

use std::collections::HashMap;

/// Multi-valued index from weak checksum to block indices.
///
/// Fully derived from the block list: built once, never mutated afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeakIndex {
    buckets: HashMap<u32, Vec<u32>>,
}

impl WeakIndex {
    /// Build from weak checksums listed in block order.
    pub fn build(weak_sums: &[u32]) -> Self {
        let mut buckets: HashMap<u32, Vec<u32>> = HashMap::with_capacity(weak_sums.len());
        for (idx, &weak) in weak_sums.iter().enumerate() {
            buckets.entry(weak).or_default().push(idx as u32);
        }
        Self { buckets }
    }

    /// Candidate blocks for `weak`, ascending by block index.
    #[inline]
    pub fn candidates(&self, weak: u32) -> &[u32] {
        self.buckets.get(&weak).map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn contains(&self, weak: u32) -> bool {
        self.buckets.contains_key(&weak)
    }

    /// Number of distinct weak values.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Largest bucket size, useful for spotting degenerate inputs.
    pub fn max_bucket_len(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}
