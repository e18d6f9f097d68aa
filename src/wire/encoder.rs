// Delta command encoder.
//
// Turns COPY / LITERAL decisions into librsync delta bytes.  Output is
// accumulated in an internal buffer that the session drains after every
// input chunk, so memory stays bounded by one chunk's worth of commands.

use log::trace;

use super::int::put_int;
use super::opcode::{Command, OP_END, copy_opcode, literal_opcode};
use crate::delta::matcher::CommandSink;
use crate::hash::config::DELTA_MAGIC;

/// Counters for an encoded delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub copy_commands: u64,
    pub literal_commands: u64,
    /// Base-object bytes referenced by COPY commands.
    pub copy_bytes: u64,
    /// New-object bytes carried inline by LITERAL commands.
    pub literal_bytes: u64,
    /// Total delta bytes produced, including magic and END.
    pub bytes_out: u64,
}

/// Streaming delta encoder.
#[derive(Debug)]
pub struct CommandEncoder {
    out: Vec<u8>,
    stats: EncodeStats,
    ended: bool,
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandEncoder {
    /// New encoder; the delta magic is already queued for output.
    pub fn new() -> Self {
        let mut enc = Self {
            out: Vec::with_capacity(64),
            stats: EncodeStats::default(),
            ended: false,
        };
        enc.push(&DELTA_MAGIC.to_be_bytes());
        enc
    }

    /// Encode a LITERAL command.  Empty literals are skipped.
    pub fn literal(&mut self, data: &[u8]) {
        debug_assert!(!self.ended);
        if data.is_empty() {
            return;
        }
        let (op, width) = literal_opcode(data.len() as u64);
        self.out.push(op);
        if width > 0 {
            put_int(&mut self.out, data.len() as u64, width);
        }
        self.out.extend_from_slice(data);
        self.stats.bytes_out += 1 + width as u64 + data.len() as u64;
        self.stats.literal_commands += 1;
        self.stats.literal_bytes += data.len() as u64;
        trace!("LITERAL len={}", data.len());
    }

    /// Encode a COPY command.  Zero-length copies are skipped.
    pub fn copy(&mut self, offset: u64, len: u64) {
        debug_assert!(!self.ended);
        if len == 0 {
            return;
        }
        let (op, ow, lw) = copy_opcode(offset, len);
        self.out.push(op);
        put_int(&mut self.out, offset, ow);
        put_int(&mut self.out, len, lw);
        self.stats.bytes_out += 1 + (ow + lw) as u64;
        self.stats.copy_commands += 1;
        self.stats.copy_bytes += len;
        trace!("COPY offset={offset} len={len}");
    }

    pub fn command(&mut self, cmd: &Command) {
        match cmd {
            Command::Copy { offset, len } => self.copy(*offset, *len),
            Command::Literal(data) => self.literal(data),
        }
    }

    /// Terminate the stream with END.  Idempotent.
    pub fn end(&mut self) {
        if !self.ended {
            self.push(&[OP_END]);
            self.ended = true;
        }
    }

    /// Bytes encoded but not yet handed out.
    pub fn pending(&self) -> &[u8] {
        &self.out
    }

    /// Hand out everything encoded so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    /// Move everything encoded so far onto the end of `dst`.
    pub fn drain_into(&mut self, dst: &mut Vec<u8>) {
        if dst.is_empty() {
            std::mem::swap(dst, &mut self.out);
        } else {
            dst.append(&mut self.out);
        }
    }

    pub fn stats(&self) -> &EncodeStats {
        &self.stats
    }

    fn push(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
        self.stats.bytes_out += bytes.len() as u64;
    }
}

impl CommandSink for CommandEncoder {
    fn literal(&mut self, data: &[u8]) {
        CommandEncoder::literal(self, data);
    }

    fn copy(&mut self, offset: u64, len: u64) {
        CommandEncoder::copy(self, offset, len);
    }
}

/// Encode a complete delta (magic, commands, END) from a command list.
pub fn encode_commands<'a, I>(commands: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Command>,
{
    let mut enc = CommandEncoder::new();
    for cmd in commands {
        enc.command(cmd);
    }
    enc.end();
    enc.take_output()
}
