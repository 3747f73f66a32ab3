//! Event delivery primitives.

mod replay;

pub use replay::{EventStream, MulticastReplayChannel, DEFAULT_BUFFER_SIZE};
