//! Elements, from which every score is constructed.
//!
//! Events are leaves. Chains hold events and other chains, and own the
//! stacking of their items. The time map is an independent ruler used
//! only to address measures and real time.

pub mod container;
pub mod event;
pub mod glissando;
pub mod pitch;
pub mod position;
pub mod time;
pub mod time_map;

pub use container::{Chain, Item};
pub use event::{Chord, Event, EventType, Gliss, Note};
pub use glissando::{gliss_target, resolve_glissandi};
pub use pitch::{midi_to_name, pitches_close, Pitch};
pub use position::Location;
pub use time::{
    beats, is_negative, max_time, min_time, show_time, to_f64, zero, Time,
};
pub use time_map::{MeasureInfo, ScoreStruct, TimeMap, TimeSignature};
