//! Recording of forwarded calls.
//!
//! A relayed call and its outcome are turned into a replayable mock stub
//! and appended to the recordings store.

mod stub_generator;

pub use stub_generator::recorded_stub;
