// Signature wire format (librsync / rdiff compatible).
//
//   u32 BE  magic       0x72730137 (BLAKE2) | 0x72730136 (MD4)
//   u32 BE  block_len
//   u32 BE  strong_len
//   then, per block in base-object order:
//   u32 BE  weak checksum
//   [u8; strong_len] strong checksum
//
// Decoding is all-or-nothing: any malformed input yields a `ParseError`
// and no signature.

use std::io::{self, Read, Write};

use super::Signature;
use crate::error::ParseError;
use crate::hash::config::SIGNATURE_HEADER_LEN;
use crate::hash::strong::{SigType, StrongHash};

/// Parsed signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader {
    pub sig_type: SigType,
    pub block_len: u32,
    pub strong_len: u32,
}

impl SignatureHeader {
    /// Parse and validate the 12-byte header.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < SIGNATURE_HEADER_LEN {
            return Err(ParseError::TruncatedHeader { len: bytes.len() });
        }
        let magic = read_u32_be(&bytes[0..4]);
        let sig_type = SigType::from_magic(magic).ok_or(ParseError::UnknownMagic(magic))?;
        let header = Self {
            sig_type,
            block_len: read_u32_be(&bytes[4..8]),
            strong_len: read_u32_be(&bytes[8..12]),
        };
        header.hasher()?;
        Ok(header)
    }

    fn hasher(&self) -> Result<StrongHash, ParseError> {
        if self.block_len == 0 {
            return Err(crate::error::ConfigError::InvalidBlockLen.into());
        }
        Ok(StrongHash::new(self.sig_type, self.strong_len as usize)?)
    }

    pub fn encode(&self) -> [u8; SIGNATURE_HEADER_LEN] {
        let mut out = [0u8; SIGNATURE_HEADER_LEN];
        out[0..4].copy_from_slice(&self.sig_type.magic().to_be_bytes());
        out[4..8].copy_from_slice(&self.block_len.to_be_bytes());
        out[8..12].copy_from_slice(&self.strong_len.to_be_bytes());
        out
    }

    /// Size of one block record: weak checksum plus strong checksum.
    pub fn record_len(&self) -> usize {
        4 + self.strong_len as usize
    }
}

#[inline]
fn read_u32_be(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn header_of(sig: &Signature) -> SignatureHeader {
    SignatureHeader {
        sig_type: sig.sig_type(),
        block_len: sig.block_len(),
        strong_len: sig.strong_len(),
    }
}

/// Encode `sig` in block order.
pub fn serialize(sig: &Signature) -> Vec<u8> {
    let mut out = Vec::with_capacity(sig.serialized_len());
    out.extend_from_slice(&header_of(sig).encode());
    for block in sig.blocks() {
        out.extend_from_slice(&block.weak.to_be_bytes());
        out.extend_from_slice(block.strong);
    }
    out
}

/// Stream `sig` to `w`.
pub fn write_signature<W: Write>(sig: &Signature, mut w: W) -> io::Result<()> {
    w.write_all(&header_of(sig).encode())?;
    for block in sig.blocks() {
        w.write_all(&block.weak.to_be_bytes())?;
        w.write_all(block.strong)?;
    }
    Ok(())
}

/// Decode a complete signature buffer.
pub fn deserialize(bytes: &[u8]) -> Result<Signature, ParseError> {
    let header = SignatureHeader::parse(bytes)?;
    let hash = header.hasher()?;
    let body = &bytes[SIGNATURE_HEADER_LEN..];
    let record_len = header.record_len();
    let count = body.len() / record_len;
    let remaining = body.len() % record_len;
    if remaining != 0 {
        return Err(ParseError::TruncatedRecord {
            index: count,
            remaining,
            record_len,
        });
    }

    let strong_len = header.strong_len as usize;
    let mut weak_sums = Vec::with_capacity(count);
    let mut strong_sums = Vec::with_capacity(count * strong_len);
    for record in body.chunks_exact(record_len) {
        weak_sums.push(read_u32_be(&record[..4]));
        strong_sums.extend_from_slice(&record[4..]);
    }
    log::debug!(
        "signature: decoded {} blocks ({}, block_len={}, strong_len={})",
        count,
        header.sig_type,
        header.block_len,
        header.strong_len
    );
    Ok(Signature::from_parts(
        hash,
        header.block_len,
        weak_sums,
        strong_sums,
    ))
}

/// Read a signature from `r` until end of input.
pub fn read_signature<R: Read>(mut r: R) -> Result<Signature, ParseError> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes)?;
    deserialize(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::config::SignatureOptions;
    use crate::signature::SignatureBuilder;

    fn sig_of(data: &[u8], opts: SignatureOptions) -> Signature {
        let mut b = SignatureBuilder::new(opts).unwrap();
        b.digest(data).unwrap();
        b.end().unwrap()
    }

    #[test]
    fn header_layout() {
        let h = SignatureHeader {
            sig_type: SigType::Md4,
            block_len: 0x0102_0304,
            strong_len: 8,
        };
        assert_eq!(
            h.encode(),
            [0x72, 0x73, 0x01, 0x36, 1, 2, 3, 4, 0, 0, 0, 8]
        );
        assert_eq!(SignatureHeader::parse(&h.encode()).unwrap(), h);
    }

    #[test]
    fn record_layout() {
        let opts = SignatureOptions {
            sig_type: SigType::Blake2,
            block_len: 4,
            strong_len: 5,
        };
        let sig = sig_of(b"abcdef", opts);
        let bytes = serialize(&sig);
        assert_eq!(bytes.len(), 12 + 2 * 9);
        assert_eq!(&bytes[0..4], &0x72730137u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &sig.weak_sum(0).to_be_bytes());
        assert_eq!(&bytes[16..21], sig.strong_sum(0));
        assert_eq!(&bytes[21..25], &sig.weak_sum(1).to_be_bytes());
        assert_eq!(&bytes[25..30], sig.strong_sum(1));
    }

    #[test]
    fn roundtrip_preserves_everything() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 253) as u8).collect();
        for opts in [
            SignatureOptions::new(SigType::Md4, 100),
            SignatureOptions {
                strong_len: 12,
                ..SignatureOptions::new(SigType::Blake2, 777)
            },
        ] {
            let sig = sig_of(&data, opts);
            let back = deserialize(&serialize(&sig)).unwrap();
            assert_eq!(back, sig);
            assert_eq!(back.weak_index(), sig.weak_index());
        }
    }

    #[test]
    fn unknown_magic() {
        let mut bytes = serialize(&sig_of(b"hello", SignatureOptions::default()));
        bytes[3] = 0x00;
        assert!(matches!(
            deserialize(&bytes),
            Err(ParseError::UnknownMagic(0x72730100))
        ));
        // Delta magic is not a signature magic.
        bytes[..4].copy_from_slice(&0x72730236u32.to_be_bytes());
        assert!(matches!(
            deserialize(&bytes),
            Err(ParseError::UnknownMagic(0x72730236))
        ));
    }

    #[test]
    fn truncated_header() {
        let bytes = serialize(&sig_of(b"hello", SignatureOptions::default()));
        for len in 0..12 {
            assert!(matches!(
                deserialize(&bytes[..len]),
                Err(ParseError::TruncatedHeader { len: l }) if l == len
            ));
        }
    }

    #[test]
    fn partial_record_rejected() {
        let opts = SignatureOptions::new(SigType::Md4, 8);
        let bytes = serialize(&sig_of(&[1u8; 40], opts));
        assert_eq!(bytes.len(), 12 + 5 * 20);
        for cut in 1..20 {
            let err = deserialize(&bytes[..bytes.len() - cut]).unwrap_err();
            assert!(
                matches!(err, ParseError::TruncatedRecord { index: 4, record_len: 20, .. }),
                "cut={cut}: {err}"
            );
        }
    }

    #[test]
    fn invalid_header_fields_rejected() {
        let mut h = SignatureHeader {
            sig_type: SigType::Md4,
            block_len: 16,
            strong_len: 17,
        }
        .encode();
        assert!(matches!(
            deserialize(&h),
            Err(ParseError::InvalidHeader(_))
        ));
        h[4..8].copy_from_slice(&0u32.to_be_bytes());
        h[8..12].copy_from_slice(&8u32.to_be_bytes());
        assert!(matches!(
            deserialize(&h),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn write_then_read_stream() {
        let sig = sig_of(b"streaming signature bytes", SignatureOptions::new(SigType::Md4, 4));
        let mut buf = Vec::new();
        write_signature(&sig, &mut buf).unwrap();
        assert_eq!(buf, serialize(&sig));
        let back = read_signature(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(back, sig);
    }
}
