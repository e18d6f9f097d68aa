// librsync delta command stream.
//
// - `int`:     1/2/4/8-byte big-endian command parameters
// - `opcode`:  opcode table and the `Command` type
// - `encoder`: CommandEncoder: commands -> delta bytes
// - `decoder`: CommandIterator, `apply` and streaming `patch`

pub mod decoder;
pub mod encoder;
pub mod int;
pub mod opcode;

pub use decoder::{BaseSource, CommandIterator, PatchStats, SeekBase, apply, patch};
pub use encoder::{CommandEncoder, EncodeStats, encode_commands};
pub use opcode::{Command, CommandRef};
