// Delta command opcodes (librsync `prototab`).
//
//   0x00          END
//   0x01..=0x40   LITERAL_1 .. LITERAL_64   (length is the opcode)
//   0x41..=0x44   LITERAL_N1/N2/N4/N8       (length parameter follows)
//   0x45..=0x54   COPY_Nx_Ny                (offset then length follow)
//
// For COPY, `opcode = 0x45 + 4 * idx(offset width) + idx(length width)`
// with idx(1, 2, 4, 8) = 0, 1, 2, 3.

use super::int::{WIDTHS, int_len, width_index};

pub const OP_END: u8 = 0x00;
pub const OP_LITERAL_1: u8 = 0x01;
pub const OP_LITERAL_64: u8 = 0x40;
pub const OP_LITERAL_N1: u8 = 0x41;
pub const OP_LITERAL_N8: u8 = 0x44;
pub const OP_COPY_N1_N1: u8 = 0x45;
pub const OP_COPY_N8_N8: u8 = 0x54;

/// Longest literal whose length fits in the opcode itself.
pub const MAX_IMMEDIATE_LITERAL: usize = 64;

/// A delta command: how to produce the next stretch of the new object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Copy `len` bytes from the base object starting at `offset`.
    Copy { offset: u64, len: u64 },
    /// Emit these bytes verbatim.
    Literal(Vec<u8>),
}

impl Command {
    /// Number of new-object bytes this command produces.
    pub fn output_len(&self) -> u64 {
        match self {
            Self::Copy { len, .. } => *len,
            Self::Literal(data) => data.len() as u64,
        }
    }

    pub fn borrowed(&self) -> CommandRef<'_> {
        match self {
            Self::Copy { offset, len } => CommandRef::Copy {
                offset: *offset,
                len: *len,
            },
            Self::Literal(data) => CommandRef::Literal(data),
        }
    }
}

/// Borrowed form of `Command`, as produced by the delta decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandRef<'a> {
    Copy { offset: u64, len: u64 },
    Literal(&'a [u8]),
}

impl CommandRef<'_> {
    pub fn output_len(&self) -> u64 {
        match self {
            Self::Copy { len, .. } => *len,
            Self::Literal(data) => data.len() as u64,
        }
    }

    pub fn into_owned(self) -> Command {
        match self {
            Self::Copy { offset, len } => Command::Copy { offset, len },
            Self::Literal(data) => Command::Literal(data.to_vec()),
        }
    }
}

/// What an opcode byte announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    End,
    /// Literal whose length is carried by the opcode.
    LiteralImmediate(usize),
    /// Literal whose length follows in `len_width` bytes.
    Literal { len_width: usize },
    Copy {
        offset_width: usize,
        len_width: usize,
    },
}

impl Opcode {
    /// Classify an opcode byte; `None` for reserved values.
    pub fn decode(op: u8) -> Option<Self> {
        match op {
            OP_END => Some(Self::End),
            OP_LITERAL_1..=OP_LITERAL_64 => Some(Self::LiteralImmediate(op as usize)),
            OP_LITERAL_N1..=OP_LITERAL_N8 => Some(Self::Literal {
                len_width: WIDTHS[(op - OP_LITERAL_N1) as usize],
            }),
            OP_COPY_N1_N1..=OP_COPY_N8_N8 => {
                let i = op - OP_COPY_N1_N1;
                Some(Self::Copy {
                    offset_width: WIDTHS[(i / 4) as usize],
                    len_width: WIDTHS[(i % 4) as usize],
                })
            }
            _ => None,
        }
    }

    /// Number of parameter bytes following the opcode.
    pub fn param_len(&self) -> usize {
        match *self {
            Self::End | Self::LiteralImmediate(_) => 0,
            Self::Literal { len_width } => len_width,
            Self::Copy {
                offset_width,
                len_width,
            } => offset_width + len_width,
        }
    }
}

/// Opcode and length width for a literal of `len` bytes (`len > 0`).
pub fn literal_opcode(len: u64) -> (u8, usize) {
    debug_assert!(len > 0);
    if len <= MAX_IMMEDIATE_LITERAL as u64 {
        (len as u8, 0)
    } else {
        let w = int_len(len);
        (OP_LITERAL_N1 + width_index(w), w)
    }
}

/// Opcode plus offset and length widths for a copy.
pub fn copy_opcode(offset: u64, len: u64) -> (u8, usize, usize) {
    let ow = int_len(offset);
    let lw = int_len(len);
    (
        OP_COPY_N1_N1 + 4 * width_index(ow) + width_index(lw),
        ow,
        lw,
    )
}
