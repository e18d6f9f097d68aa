// Streaming signature construction.
//
// The base object arrives through any number of `digest` calls.  Block
// boundaries are fixed by the cumulative byte count alone: a partial block
// left over from one call is completed by the next, so the resulting
// signature does not depend on how the input was chunked.

use std::io::{self, Read};

use log::debug;

use super::Signature;
use crate::error::{Error, StateError};
use crate::hash::config::{MAX_BLOCK_PREALLOC, SignatureOptions};
use crate::hash::rolling::weak_checksum;
use crate::hash::strong::StrongHash;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Builds a `Signature` from a base object delivered in chunks.
///
/// ```
/// use rsdelta::hash::config::SignatureOptions;
/// use rsdelta::hash::strong::SigType;
/// use rsdelta::signature::SignatureBuilder;
///
/// let mut b = SignatureBuilder::new(SignatureOptions::new(SigType::Md4, 32)).unwrap();
/// b.digest(&[7u8; 100]).unwrap();
/// let sig = b.end().unwrap();
/// assert_eq!(sig.block_count(), 4);
/// ```
#[derive(Debug)]
pub struct SignatureBuilder {
    hash: StrongHash,
    block_len: usize,
    /// Bytes of the current, not yet complete block.
    block: Vec<u8>,
    weak_sums: Vec<u32>,
    strong_sums: Vec<u8>,
    bytes_in: u64,
    finished: bool,
}

impl SignatureBuilder {
    /// Start a signature, validating `opts` up front.
    pub fn new(opts: SignatureOptions) -> Result<Self, crate::error::ConfigError> {
        opts.validate()?;
        let hash = StrongHash::new(opts.sig_type, opts.strong_len as usize)?;
        let block_len = opts.block_len as usize;
        debug!(
            "signature: {} block_len={} strong_len={}",
            opts.sig_type, opts.block_len, opts.strong_len
        );
        Ok(Self {
            hash,
            block_len,
            block: Vec::with_capacity(block_len.min(MAX_BLOCK_PREALLOC)),
            weak_sums: Vec::new(),
            strong_sums: Vec::new(),
            bytes_in: 0,
            finished: false,
        })
    }

    /// Feed the next chunk of the base object.
    pub fn digest(&mut self, mut data: &[u8]) -> Result<(), StateError> {
        if self.finished {
            return Err(StateError::Finished);
        }
        self.bytes_in += data.len() as u64;

        // Complete a block left over from the previous call.
        if !self.block.is_empty() {
            let need = self.block_len - self.block.len();
            let take = need.min(data.len());
            self.block.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.block.len() < self.block_len {
                return Ok(());
            }
            let block = std::mem::take(&mut self.block);
            self.push_block(&block);
            self.block = block;
            self.block.clear();
        }

        let mut blocks = data.chunks_exact(self.block_len);
        for block in blocks.by_ref() {
            self.push_block(block);
        }
        self.block.extend_from_slice(blocks.remainder());
        Ok(())
    }

    /// Feed the whole of `reader`.  Returns the number of bytes consumed.
    pub fn digest_reader<R: Read>(&mut self, mut reader: R) -> Result<u64, Error> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut total = 0u64;
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.digest(&buf[..n])?;
                    total += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    /// Finish the signature.  The trailing partial block, if any, becomes
    /// the (shorter) last block.  No further calls are accepted.
    pub fn end(&mut self) -> Result<Signature, StateError> {
        if self.finished {
            return Err(StateError::Finished);
        }
        self.finished = true;
        if !self.block.is_empty() {
            let block = std::mem::take(&mut self.block);
            self.push_block(&block);
        }
        debug!(
            "signature: {} bytes in, {} blocks",
            self.bytes_in,
            self.weak_sums.len()
        );
        Ok(Signature::from_parts(
            self.hash,
            self.block_len as u32,
            std::mem::take(&mut self.weak_sums),
            std::mem::take(&mut self.strong_sums),
        ))
    }

    /// Total bytes digested so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Completed blocks so far (excludes a pending partial block).
    pub fn blocks_done(&self) -> usize {
        self.weak_sums.len()
    }

    fn push_block(&mut self, block: &[u8]) {
        self.weak_sums.push(weak_checksum(block));
        self.strong_sums
            .extend_from_slice(self.hash.digest(block).as_bytes());
    }
}

/// One-shot signature of everything `input` yields.
pub fn signature<R: Read>(input: R, opts: SignatureOptions) -> Result<Signature, Error> {
    let mut builder = SignatureBuilder::new(opts)?;
    builder.digest_reader(input)?;
    Ok(builder.end()?)
}
