//! Playback export: breakpoint envelopes out of a chain.
//!
//! Every sounding note becomes a [`SynthEvent`]. Notes linked by ties or
//! glissandi across consecutive events are joined into lines, and every
//! line is merged into one envelope.
use std::collections::BTreeSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ChainError, ChainResult},
    primitives::{
        beats, min_time, pitches_close, time_map::ScoreStruct, zero, Chain,
        Event, Pitch, Time,
    },
    settings::Settings,
};

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Seconds from the score start.
    pub time: f64,
    pub pitch: Pitch,
    pub amp: f64,
}
impl Breakpoint {
    pub fn new(time: f64, pitch: Pitch, amp: f64) -> Self {
        Self { time, pitch, amp }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SynthEvent {
    pub bps: Vec<Breakpoint>,
    /// The sound continues in the next event.
    pub linked_next: bool,
}
impl SynthEvent {
    pub fn new(bps: Vec<Breakpoint>, linked_next: bool) -> Self {
        Self { bps, linked_next }
    }
    pub fn start(&self) -> f64 {
        self.bps.first().map_or(0.0, |bp| bp.time)
    }
    pub fn end(&self) -> f64 {
        self.bps.last().map_or(0.0, |bp| bp.time)
    }
    pub fn start_pitch(&self) -> Option<Pitch> {
        self.bps.first().map(|bp| bp.pitch)
    }
    pub fn end_pitch(&self) -> Option<Pitch> {
        self.bps.last().map(|bp| bp.pitch)
    }

    /// Join a line of linked events into one envelope.
    ///
    /// Every event but the last has to be linked, and has to end where
    /// the next one starts.
    pub fn merge_events(events: &[SynthEvent]) -> ChainResult<SynthEvent> {
        let (last, init) = events.split_last().ok_or_else(|| {
            ChainError::InvalidArgument("nothing to merge".to_string())
        })?;
        for (event, next) in events.iter().tuple_windows() {
            if !event.linked_next {
                return Err(ChainError::InvalidArgument(format!(
                    "can not merge, event is not linked: {event:?}"
                )));
            }
            if (next.start() - event.end()).abs() > 1e-10 {
                return Err(ChainError::InvalidArgument(format!(
                    "event at {} is not aligned with the end of the last one: {}",
                    next.start(),
                    event.end()
                )));
            }
        }
        let mut bps: Vec<Breakpoint> = init
            .iter()
            .flat_map(|event| event.bps.split_last().map_or(&[][..], |(_, b)| b))
            .copied()
            .collect();
        bps.extend(last.bps.iter().copied());
        Ok(SynthEvent::new(bps, last.linked_next))
    }
}

impl Event {
    /// One envelope per note, from `abs_offset` (beats) to its end.
    ///
    /// Rests produce nothing.
    pub fn synth_events<S: ScoreStruct + ?Sized>(
        &self,
        abs_offset: Time,
        score: &S,
        settings: &Settings,
    ) -> ChainResult<Vec<SynthEvent>> {
        if self.is_rest() {
            return Ok(Vec::new());
        }
        let dur = self.dur()?;
        let start = score.beat_to_time(abs_offset);
        let end = score.beat_to_time(abs_offset + dur);
        if start >= end {
            return Err(ChainError::InvalidArgument(format!(
                "can not play an event without duration: {self}"
            )));
        }
        let amp = self.amp.unwrap_or(settings.default_amp);
        let linked = self.is_gliss();
        let pitches = self.pitches();
        let end_pitches = match linked {
            true => self.resolve_gliss(),
            false => pitches.clone(),
        };
        let gliss_start = match self.gliss_time {
            Some(gliss_time) if gliss_time > zero() && gliss_time < dur => {
                Some(score.beat_to_time(abs_offset + dur - gliss_time))
            }
            _ => None,
        };
        let events = pitches
            .iter()
            .enumerate()
            .map(|(idx, &pitch)| {
                let end_pitch = end_pitches.get(idx).copied().unwrap_or(pitch);
                let mut bps = vec![Breakpoint::new(start, pitch, amp)];
                if let Some(gliss_start) = gliss_start {
                    bps.push(Breakpoint::new(gliss_start, pitch, amp));
                }
                bps.push(Breakpoint::new(end, end_pitch, amp));
                SynthEvent::new(bps, linked || self.tied)
            })
            .collect();
        Ok(events)
    }
}

/// Give grace events a playing duration, in place.
///
/// Graces take their time from the preceding event. Graces at the very
/// beginning are played on the beat and delay the following event.
/// `events` must have explicit offsets, as returned by
/// [`Chain::flat_events`].
pub fn add_duration_to_gracenotes(
    events: &mut [Event],
    dur: Time,
) -> ChainResult<()> {
    let mut idx = 0;
    let mut last_real: Option<usize> = None;
    while idx < events.len() {
        if !events[idx].is_grace() {
            last_real = Some(idx);
            idx += 1;
            continue;
        }
        let first_grace = idx;
        while idx < events.len() && events[idx].is_grace() {
            idx += 1;
        }
        let graces = first_grace..idx;
        let count = beats(graces.len() as i64, 1);
        match last_real {
            Some(real) => {
                let real_dur = events[real].dur()?;
                let grace_dur =
                    min_time(dur, real_dur / (count + beats(1, 1)));
                events[real].set_dur(real_dur - grace_dur * count)?;
                for (nth, grace) in graces.enumerate() {
                    let back = (count - beats(nth as i64, 1)) * grace_dur;
                    let offset = events[grace].relative_offset()? - back;
                    events[grace].set_offset(Some(offset)).set_dur(grace_dur)?;
                }
            }
            None => {
                let start = events[first_grace].relative_offset()?;
                let grace_dur = match events.get(idx) {
                    Some(next) => {
                        let next_dur = next.dur()?;
                        let grace_dur =
                            min_time(dur, next_dur / (count + beats(1, 1)));
                        let next_offset = next.relative_offset()?;
                        events[idx]
                            .set_offset(Some(next_offset + grace_dur * count))
                            .set_dur(next_dur - grace_dur * count)?;
                        grace_dur
                    }
                    None => dur,
                };
                for (nth, grace) in graces.enumerate() {
                    let offset = start + grace_dur * beats(nth as i64, 1);
                    events[grace].set_offset(Some(offset)).set_dur(grace_dur)?;
                }
            }
        }
    }
    Ok(())
}

/// Partition flat events into runs linked by ties or glissandi.
///
/// Every returned group holds at least one event. Events farther apart
/// than `min_gap` are never linked.
pub fn group_linked_events(
    events: Vec<Event>,
    min_gap: Time,
) -> ChainResult<Vec<Vec<Event>>> {
    let mut groups: Vec<Vec<Event>> = Vec::new();
    for event in events {
        let previous = groups.last().and_then(|group| group.last());
        let linked = match previous {
            None => false,
            Some(last) => {
                let gap = event.relative_offset()? - last.end()?;
                if gap < zero() {
                    return Err(ChainError::Overlap {
                        item: event.to_string(),
                        offset: event.relative_offset()?,
                        cursor: last.end()?,
                    });
                }
                gap <= min_gap && last.can_be_linked_to(&event)
            }
        };
        match (linked, groups.last_mut()) {
            (true, Some(group)) => group.push(event),
            _ => groups.push(vec![event]),
        }
    }
    Ok(groups)
}

/// A sound of [`split_synth_groups_into_lines`]: standalone, or a run of
/// linked events to be merged into one envelope.
#[derive(Debug, PartialEq, Clone)]
pub enum SynthLine {
    Single(SynthEvent),
    /// Two or more events, in time order.
    Linked(Vec<SynthEvent>),
}
impl SynthLine {
    pub fn events(&self) -> &[SynthEvent] {
        match self {
            Self::Single(event) => std::slice::from_ref(event),
            Self::Linked(events) => events,
        }
    }
    /// One envelope for the whole line.
    pub fn into_event(self) -> ChainResult<SynthEvent> {
        match self {
            Self::Single(event) => Ok(event),
            Self::Linked(events) => SynthEvent::merge_events(&events),
        }
    }
}

/// Split groups of synth events (one group per source event) into
/// lines of linked sounds.
///
/// A linked event continues with the first still free event of the next
/// group (lowest index) whose start pitch matches its end pitch within
/// `epsilon`. Every event ends up in exactly one line, and the last
/// event of a line is never linked.
pub fn split_synth_groups_into_lines(
    groups: Vec<Vec<SynthEvent>>,
    epsilon: f64,
) -> Vec<SynthLine> {
    let mut available: Vec<BTreeSet<usize>> = groups
        .iter()
        .map(|group| (0..group.len()).collect())
        .collect();
    let mut slots: Vec<Vec<Option<SynthEvent>>> = groups
        .into_iter()
        .map(|group| group.into_iter().map(Some).collect())
        .collect();
    let mut lines = Vec::new();
    for group_idx in 0..slots.len() {
        let starts: Vec<usize> = available[group_idx].iter().copied().collect();
        for start in starts {
            available[group_idx].remove(&start);
            let Some(first) = slots[group_idx][start].take() else {
                continue;
            };
            let mut line = vec![first];
            let mut next_group = group_idx + 1;
            while let Some(current) = line.last() {
                if !current.linked_next || next_group >= slots.len() {
                    break;
                }
                let Some(end_pitch) = current.end_pitch() else {
                    break;
                };
                let found = available[next_group].iter().copied().find(|idx| {
                    slots[next_group][*idx]
                        .as_ref()
                        .and_then(SynthEvent::start_pitch)
                        .map_or(false, |p| pitches_close(p, end_pitch, epsilon))
                });
                let Some(found) = found else {
                    break;
                };
                available[next_group].remove(&found);
                match slots[next_group][found].take() {
                    Some(event) => line.push(event),
                    None => break,
                }
                next_group += 1;
            }
            if let Some(last) = line.last_mut() {
                last.linked_next = false;
            }
            lines.push(match <[SynthEvent; 1]>::try_from(line) {
                Ok([single]) => SynthLine::Single(single),
                Err(line) => SynthLine::Linked(line),
            });
        }
    }
    lines
}

impl Chain {
    /// Playback envelopes of the whole chain.
    ///
    /// Glissandi are resolved, grace events get a playing duration and
    /// linked notes are merged into continuous envelopes.
    pub fn synth_events<S: ScoreStruct + ?Sized>(
        &self,
        score: &S,
        settings: &Settings,
    ) -> ChainResult<Vec<SynthEvent>> {
        let mut events = self.flat_events()?;
        if events.iter().any(Event::is_grace) {
            add_duration_to_gracenotes(&mut events, settings.gracenote_dur)?;
        }
        let mut out = Vec::new();
        for group in group_linked_events(events, settings.link_min_gap)? {
            let mut synth_groups = Vec::with_capacity(group.len());
            for event in group.iter() {
                let offset = event.relative_offset()?;
                synth_groups.push(event.synth_events(offset, score, settings)?);
            }
            if let [single] = synth_groups.as_slice() {
                out.extend(single.iter().cloned());
                continue;
            }
            for line in split_synth_groups_into_lines(synth_groups, settings.link_epsilon)
            {
                out.push(line.into_event()?);
            }
        }
        log::debug!("chain '{}': {} synth events", self.label, out.len());
        Ok(out)
    }
}
