// Delta computation against a base signature.
//
// - `matcher`: DeltaMatcher state machine and the `CommandSink` seam
// - `session`: Delta, the streaming session that emits delta bytes

pub mod matcher;
pub mod session;

pub use matcher::{CommandSink, DeltaMatcher, MatchState, MatchStats};
pub use session::{Delta, DeltaStats, delta};
