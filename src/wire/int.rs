// Fixed-width big-endian integer parameters for delta commands.
//
// librsync stores command parameters in 1, 2, 4 or 8 bytes, always using
// the narrowest width that holds the value.  The chosen width is encoded
// in the opcode itself, so no length prefix is needed.

/// Parameter widths in opcode order.
pub const WIDTHS: [usize; 4] = [1, 2, 4, 8];

/// Narrowest width (1/2/4/8) that can hold `v`.
#[inline]
pub fn int_len(v: u64) -> usize {
    if v <= 0xFF {
        1
    } else if v <= 0xFFFF {
        2
    } else if v <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}

/// Position of `width` in `WIDTHS` (0..=3).
#[inline]
pub fn width_index(width: usize) -> u8 {
    match width {
        1 => 0,
        2 => 1,
        4 => 2,
        _ => 3,
    }
}

/// Append the low `width` bytes of `v`, most significant first.
#[inline]
pub fn put_int(out: &mut Vec<u8>, v: u64, width: usize) {
    debug_assert!(WIDTHS.contains(&width));
    debug_assert!(width == 8 || v < 1u64 << (width * 8));
    out.extend_from_slice(&v.to_be_bytes()[8 - width..]);
}

/// Read a big-endian value from exactly `bytes.len()` (<= 8) bytes.
#[inline]
pub fn get_int(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
