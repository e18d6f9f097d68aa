// Rolling (weak) checksum matching librsync's `rollsum`.
//
// Adler-style: `s1` is the running byte sum, `s2` the sum of prefix sums,
// each truncated to 16 bits.  Every byte contributes `byte + CHAR_OFFSET`
// so that runs of zero bytes still move the checksum.
//
// The state only depends on the bytes fed to it, never on how they were
// grouped into calls, so a window that spans two input chunks hashes the
// same as one delivered in a single slice.

/// Offset added to each byte before accumulation (`ROLLSUM_CHAR_OFFSET`).
pub const CHAR_OFFSET: u16 = 31;

/// Sliding-window weak checksum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rollsum {
    s1: u16,
    s2: u16,
    count: u64,
}

impl Rollsum {
    pub const fn new() -> Self {
        Self {
            s1: 0,
            s2: 0,
            count: 0,
        }
    }

    /// Fresh checksum over `window`, computed in O(len).
    pub fn init(window: &[u8]) -> Self {
        let mut sum = Self::new();
        sum.update(window);
        sum
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of bytes currently inside the window.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Append all of `data` to the window.
    pub fn update(&mut self, data: &[u8]) {
        let mut s1 = self.s1;
        let mut s2 = self.s2;
        for &b in data {
            s1 = s1.wrapping_add(u16::from(b)).wrapping_add(CHAR_OFFSET);
            s2 = s2.wrapping_add(s1);
        }
        self.s1 = s1;
        self.s2 = s2;
        self.count += data.len() as u64;
    }

    /// Grow the window by one byte at the front.
    #[inline]
    pub fn rollin(&mut self, c: u8) {
        self.s1 = self.s1.wrapping_add(u16::from(c)).wrapping_add(CHAR_OFFSET);
        self.s2 = self.s2.wrapping_add(self.s1);
        self.count += 1;
    }

    /// Shrink the window by removing its oldest byte.
    #[inline]
    pub fn rollout(&mut self, c: u8) {
        let v = u16::from(c).wrapping_add(CHAR_OFFSET);
        self.s1 = self.s1.wrapping_sub(v);
        self.s2 = self.s2.wrapping_sub((self.count as u16).wrapping_mul(v));
        self.count -= 1;
    }

    /// Slide a full window by one byte: drop `out`, append `inb`.  O(1).
    #[inline]
    pub fn roll(&mut self, out: u8, inb: u8) {
        let out_v = u16::from(out).wrapping_add(CHAR_OFFSET);
        self.s1 = self.s1.wrapping_add(u16::from(inb)).wrapping_sub(u16::from(out));
        self.s2 = self
            .s2
            .wrapping_add(self.s1)
            .wrapping_sub((self.count as u16).wrapping_mul(out_v));
    }

    /// Current 32-bit weak hash: `s2 << 16 | s1`.
    #[inline]
    pub fn value(&self) -> u32 {
        (u32::from(self.s2) << 16) | u32::from(self.s1)
    }
}

/// Single-shot weak checksum of a whole block.
pub fn weak_checksum(block: &[u8]) -> u32 {
    Rollsum::init(block).value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_is_zero() {
        assert_eq!(weak_checksum(b""), 0);
        assert_eq!(Rollsum::new().count(), 0);
    }

    #[test]
    fn known_value() {
        // s1 = (1+31) + (2+31) + (3+31) = 99
        // s2 = 32 + 65 + 99 = 196
        assert_eq!(weak_checksum(&[1, 2, 3]), (196 << 16) | 99);
    }

    #[test]
    fn zeros_still_move_the_sum() {
        assert_ne!(weak_checksum(&[0; 8]), weak_checksum(&[0; 9]));
    }

    #[test]
    fn rollin_matches_update() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut a = Rollsum::new();
        for &b in data.iter() {
            a.rollin(b);
        }
        assert_eq!(a, Rollsum::init(data));
    }

    #[test]
    fn roll_equals_fresh_checksum() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 + i / 13) as u8).collect();
        let look = 37;
        let mut sum = Rollsum::init(&data[..look]);
        for i in 0..data.len() - look {
            sum.roll(data[i], data[i + look]);
            assert_eq!(
                sum.value(),
                weak_checksum(&data[i + 1..i + 1 + look]),
                "mismatch at offset {i}"
            );
        }
    }

    #[test]
    fn rollout_equals_suffix_checksum() {
        let data = b"abcdefghijklmnopqrstuvwxyz";
        let mut sum = Rollsum::init(data);
        for i in 0..data.len() {
            sum.rollout(data[i]);
            assert_eq!(sum.value(), weak_checksum(&data[i + 1..]));
            assert_eq!(sum.count() as usize, data.len() - i - 1);
        }
    }

    #[test]
    fn roll_handles_high_bytes_wrapping() {
        let data = [0xFFu8; 4096];
        let mut sum = Rollsum::init(&data[..2048]);
        sum.roll(0xFF, 0x00);
        let mut expected = data[1..2048].to_vec();
        expected.push(0);
        assert_eq!(sum.value(), weak_checksum(&expected));
    }

    #[test]
    fn split_updates_are_invariant() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        let whole = weak_checksum(&data);
        for split in [0, 1, 17, 1500, 2999, 3000] {
            let mut sum = Rollsum::new();
            sum.update(&data[..split]);
            sum.update(&data[split..]);
            assert_eq!(sum.value(), whole, "split at {split}");
        }
    }
}
