//! Addressing points of the score.
//!
//! A point is either an absolute beat (quarter notes from the score
//! start) or a measure index with a distance from its barline. The
//! latter needs a [`ScoreStruct`] to be converted.
//!
//! # Examples
//!
//! ```
//! use score_chain::primitives::{
//!     beats, Location, ScoreStruct, TimeMap, TimeSignature,
//! };
//!
//! let time_map = TimeMap::uniform(TimeSignature::new(3, 4), 60.0).unwrap();
//! let location = Location::Measure { index: 2, offset: beats(1, 2) };
//! assert_eq!(time_map.as_beat(location), beats(13, 2));
//! assert_eq!(time_map.as_beat(beats(5, 1).into()), beats(5, 1));
//! assert_eq!(location.to_string(), "2:1/2");
//! ```
//!
//! [`ScoreStruct`]: super::ScoreStruct
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{show_time, Time};

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum Location {
    /// Beats from the score start.
    Beat(Time),
    /// Measure (0-based) and distance from its start.
    Measure { index: usize, offset: Time },
}
impl From<Time> for Location {
    fn from(value: Time) -> Self {
        Self::Beat(value)
    }
}
impl From<(usize, Time)> for Location {
    fn from((index, offset): (usize, Time)) -> Self {
        Self::Measure { index, offset }
    }
}
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beat(beat) => write!(f, "beat {}", show_time(*beat)),
            Self::Measure { index, offset } => {
                write!(f, "{index}:{}", show_time(*offset))
            }
        }
    }
}
