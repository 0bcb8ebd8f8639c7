//! Nested chains of musical events with exact rational time.
//!
//! Items of a [`Chain`](primitives::Chain) may carry explicit offsets
//! or be placed right after their predecessor. Chains resolve, flatten,
//! split, merge and shift their content. [`dom::Voice`] pins a chain to
//! the score start, and [`synth`] turns chains into playback envelopes.

pub mod dom;
pub mod error;
pub mod primitives;
pub mod settings;
pub mod synth;
