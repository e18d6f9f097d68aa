// Checksums and tuning constants.
//
// - `rolling`: librsync rollsum, the weak checksum used to find candidates
// - `strong`:  MD4 / BLAKE2b strong checksums, selected by signature magic
// - `config`:  wire constants and session options

pub mod config;
pub mod rolling;
pub mod strong;
