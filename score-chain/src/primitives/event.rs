//! A smallest piece of music, that is held by a Chain.
//!
//! Event is about offset and duration, while [`EventType`] carries the
//! sound content (rest, single pitch or chord). Containers treat the
//! content as opaque, except for merge and link compatibility checks.
use std::{cell::Cell, fmt};

use derivative::Derivative;

use crate::error::{ChainError, ChainResult};

use super::{
    is_negative, max_time, midi_to_name, min_time, show_time, zero, Pitch,
    Time,
};

#[derive(Debug, PartialEq, PartialOrd, Clone)]
pub struct Note {
    pub pitch: Pitch,
}
impl Note {
    pub fn new(pitch: Pitch) -> Self {
        Self { pitch }
    }
}

/// Notes are kept sorted by pitch, lowest first.
#[derive(Debug, PartialEq, PartialOrd, Clone, Default)]
pub struct Chord {
    notes: Vec<Note>,
}
impl Chord {
    pub fn new() -> Self {
        Self { notes: Vec::new() }
    }
    pub fn from_pitches(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        let mut notes: Vec<Note> = pitches.into_iter().map(Note::new).collect();
        notes.sort_by(|a, b| a.pitch.total_cmp(&b.pitch));
        Self { notes }
    }
    pub fn push(mut self, event: EventType) -> ChainResult<Self> {
        match event {
            EventType::Rest => {
                return Err(ChainError::InvalidArgument(format!(
                    "Cannot push rest to chord! {:?}",
                    self
                )))
            }
            EventType::Note(note) => self.notes.push(note),
            EventType::Chord(mut chord) => self.notes.append(&mut chord.notes),
        }
        self.notes.sort_by(|a, b| a.pitch.total_cmp(&b.pitch));
        Ok(self)
    }
    pub fn notes(&self) -> &Vec<Note> {
        &self.notes
    }
    pub fn pitches(&self) -> Vec<Pitch> {
        self.notes.iter().map(|n| n.pitch).collect()
    }
    pub fn len(&self) -> usize {
        self.notes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Various types of events with concrete realizations
/// as variant args.
#[derive(Debug, PartialEq, PartialOrd, Clone, Default)]
pub enum EventType {
    #[default]
    Rest,
    Note(Note),
    Chord(Chord),
}
impl EventType {
    pub fn pitches(&self) -> Vec<Pitch> {
        match self {
            Self::Rest => Vec::new(),
            Self::Note(note) => vec![note.pitch],
            Self::Chord(chord) => chord.pitches(),
        }
    }
    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest)
    }
    /// True if both are rests, both notes or both chords.
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => write!(f, "Rest"),
            Self::Note(note) => write!(f, "{}", midi_to_name(note.pitch)),
            Self::Chord(chord) => {
                let names: Vec<String> =
                    chord.pitches().into_iter().map(midi_to_name).collect();
                write!(f, "‹{}›", names.join(" "))
            }
        }
    }
}

/// Glissando state of an event.
#[derive(Debug, PartialEq, Clone, Default)]
pub enum Gliss {
    #[default]
    Off,
    /// Slide to whatever follows. The target is inferred later.
    ToNext,
    /// Slide to explicit pitches (one per note of the source).
    Target(Vec<Pitch>),
}
impl Gliss {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Leaf of the chain tree.
///
/// `offset` is relative to the enclosing chain; `None` means the
/// event starts right after its previous sibling. The resolved offset
/// is a cache written by the stacking pass.
#[derive(Derivative, Clone)]
#[derivative(Debug, PartialEq)]
pub struct Event {
    pub event: EventType,
    offset: Option<Time>,
    dur: Option<Time>,
    pub tied: bool,
    pub gliss: Gliss,
    /// Playback hint: the glissando takes this many beats at the end.
    pub gliss_time: Option<Time>,
    pub amp: Option<f64>,
    pub dynamic: Option<String>,
    pub label: String,
    #[derivative(PartialEq = "ignore")]
    gliss_target: Option<Vec<Pitch>>,
    #[derivative(PartialEq = "ignore")]
    resolved_offset: Cell<Option<Time>>,
}
impl Event {
    /// A negative `dur` is kept as given and reported as
    /// [`ChainError::InvalidArgument`] by [`Event::dur`], so every time
    /// operation on the event (or on a chain holding it) fails.
    pub fn new(event: EventType, dur: Time) -> Self {
        Self {
            event,
            offset: None,
            dur: Some(dur),
            tied: false,
            gliss: Gliss::Off,
            gliss_time: None,
            amp: None,
            dynamic: None,
            label: String::new(),
            gliss_target: None,
            resolved_offset: Cell::new(None),
        }
    }
    /// # Example
    /// ```
    /// # use score_chain::primitives::{beats, Event};
    /// let c4 = Event::note(60.0, beats(1, 2)).with_tie(true);
    /// assert_eq!(c4.pitches(), vec![60.0]);
    /// assert_eq!(c4.dur().unwrap(), beats(1, 2));
    /// assert_eq!(c4.offset(), None);
    /// ```
    pub fn note(pitch: Pitch, dur: Time) -> Self {
        Self::new(EventType::Note(Note::new(pitch)), dur)
    }
    pub fn chord(pitches: impl IntoIterator<Item = Pitch>, dur: Time) -> Self {
        Self::new(EventType::Chord(Chord::from_pitches(pitches)), dur)
    }
    pub fn rest(dur: Time) -> Self {
        Self::new(EventType::Rest, dur)
    }
    /// Event whose duration is not known yet. Most time operations fail
    /// on it with [`ChainError::MissingDuration`] until a duration is set.
    pub fn placeholder(event: EventType) -> Self {
        let mut ev = Self::new(event, zero());
        ev.dur = None;
        ev
    }

    pub fn with_offset(mut self, offset: Time) -> Self {
        self.offset = Some(offset);
        self
    }
    pub fn with_tie(mut self, tied: bool) -> Self {
        self.tied = tied;
        self
    }
    pub fn with_gliss(mut self, gliss: Gliss) -> Self {
        self.gliss = gliss;
        self
    }
    pub fn with_gliss_time(mut self, gliss_time: Time) -> Self {
        self.gliss_time = Some(gliss_time);
        self
    }
    pub fn with_amp(mut self, amp: f64) -> Self {
        self.amp = Some(amp);
        self
    }
    pub fn with_dynamic(mut self, dynamic: impl Into<String>) -> Self {
        self.dynamic = Some(dynamic.into());
        self
    }
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn offset(&self) -> Option<Time> {
        self.offset
    }
    pub fn set_offset(&mut self, offset: Option<Time>) -> &mut Self {
        self.offset = offset;
        self
    }
    pub fn dur(&self) -> ChainResult<Time> {
        match self.dur {
            None => Err(ChainError::MissingDuration(self.to_string())),
            Some(dur) if is_negative(dur) => {
                Err(ChainError::InvalidArgument(format!(
                    "duration can not be negative: {dur}, event: {self}"
                )))
            }
            Some(dur) => Ok(dur),
        }
    }
    pub fn has_dur(&self) -> bool {
        self.dur.is_some()
    }
    pub fn set_dur(&mut self, dur: Time) -> ChainResult<&mut Self> {
        if is_negative(dur) {
            return Err(ChainError::InvalidArgument(format!(
                "duration can not be negative: {dur}, event: {self}"
            )));
        }
        self.dur = Some(dur);
        Ok(self)
    }

    /// Offset computed by the last stacking pass of the parent chain.
    pub fn resolved_offset(&self) -> Option<Time> {
        self.resolved_offset.get()
    }
    pub(crate) fn set_resolved_offset(&self, offset: Option<Time>) {
        self.resolved_offset.set(offset)
    }

    /// Explicit offset if set, else the resolved one.
    pub fn relative_offset(&self) -> ChainResult<Time> {
        self.offset
            .or_else(|| self.resolved_offset.get())
            .ok_or_else(|| ChainError::UnresolvedOffset(self.to_string()))
    }
    /// `parent_frame` is the absolute offset of the enclosing chain.
    pub fn absolute_offset(&self, parent_frame: Time) -> ChainResult<Time> {
        Ok(parent_frame + self.relative_offset()?)
    }
    pub fn end(&self) -> ChainResult<Time> {
        Ok(self.relative_offset()? + self.dur()?)
    }

    pub fn is_rest(&self) -> bool {
        self.event.is_rest()
    }
    pub fn is_grace(&self) -> bool {
        !self.is_rest() && self.dur == Some(zero())
    }
    pub fn pitches(&self) -> Vec<Pitch> {
        self.event.pitches()
    }
    pub fn pitch_range(&self) -> Option<(Pitch, Pitch)> {
        let pitches = self.pitches();
        let first = *pitches.first()?;
        Some(pitches.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        }))
    }
    pub fn mean_pitch(&self) -> Option<Pitch> {
        let pitches = self.pitches();
        if pitches.is_empty() {
            return None;
        }
        Some(pitches.iter().sum::<Pitch>() / pitches.len() as Pitch)
    }
    /// Starts a glissando, either explicitly or through a playback hint.
    pub fn is_gliss(&self) -> bool {
        self.gliss.is_set() || self.gliss_time.is_some()
    }

    pub fn gliss_target(&self) -> Option<&[Pitch]> {
        self.gliss_target.as_deref()
    }
    pub(crate) fn set_gliss_target(&mut self, target: Option<Vec<Pitch>>) {
        self.gliss_target = target;
    }
    /// Target pitches of the glissando: explicit, inferred, or the
    /// event's own pitches when nothing is known.
    pub fn resolve_gliss(&self) -> Vec<Pitch> {
        match &self.gliss {
            Gliss::Target(pitches) => pitches.clone(),
            _ => match &self.gliss_target {
                Some(target) => target.clone(),
                None => self.pitches(),
            },
        }
    }

    /// New event, moved by `delta`.
    ///
    /// Fails if the event was never stacked and has no explicit offset,
    /// or if the result would be negative.
    pub fn time_shift(&self, delta: Time) -> ChainResult<Self> {
        let mut out = self.clone();
        out.time_shift_in_place(delta)?;
        Ok(out)
    }
    pub fn time_shift_in_place(&mut self, delta: Time) -> ChainResult<()> {
        if delta == zero() {
            return Ok(());
        }
        let offset = self.relative_offset()? + delta;
        if is_negative(offset) {
            return Err(ChainError::NegativeTime {
                item: self.to_string(),
                offset,
            });
        }
        self.offset = Some(offset);
        self.resolved_offset.set(Some(offset));
        Ok(())
    }

    /// Merge with the following event, if it is a tied continuation.
    ///
    /// # Returns
    /// - Some(merged) with summed duration, tie taken from `other`.
    /// - None if merging would lose information.
    ///
    /// # Example
    /// ```
    /// # use score_chain::primitives::{beats, Event};
    /// let a = Event::note(60.0, beats(1, 1)).with_tie(true);
    /// let b = Event::note(60.0, beats(1, 2));
    /// let merged = a.merge_with(&b).unwrap();
    /// assert_eq!(merged.dur().unwrap(), beats(3, 2));
    /// assert!(!merged.tied);
    /// assert_eq!(b.merge_with(&a), None);
    /// ```
    pub fn merge_with(&self, other: &Self) -> Option<Self> {
        let (dur, other_dur) = (self.dur().ok()?, other.dur().ok()?);
        if !other.label.is_empty() {
            return None;
        }
        if self.is_rest() && other.is_rest() {
            let mut out = self.clone();
            out.dur = Some(dur + other_dur);
            return Some(out);
        }
        if !self.tied
            || self.is_rest()
            || other.is_rest()
            || self.is_gliss()
            || other.is_gliss()
            || self.event != other.event
            || self.amp != other.amp
            || self.dynamic != other.dynamic
        {
            return None;
        }
        let mut out = self.clone();
        out.dur = Some(dur + other_dur);
        out.tied = other.tied;
        out.gliss_target = None;
        Some(out)
    }

    /// Cut the event at the given absolute offsets.
    ///
    /// `abs_offset` is where this event starts on the timeline. Offsets
    /// outside of the event span are ignored. The first part keeps the
    /// explicit offset (if any), following parts stack after it. Dynamic
    /// and label stay at the head, glissando stays at the tail.
    ///
    /// # Example
    /// ```
    /// # use score_chain::primitives::{beats, Event};
    /// let ev = Event::note(60.0, beats(2, 1));
    /// let parts = ev.split_at_offsets(beats(1, 1), &[beats(2, 1)], true).unwrap();
    /// assert_eq!(parts.len(), 2);
    /// assert!(parts[0].tied);
    /// assert_eq!(parts[1].dur().unwrap(), beats(1, 1));
    ///
    /// let untouched = ev.split_at_offsets(beats(1, 1), &[beats(5, 1)], true).unwrap();
    /// assert_eq!(untouched, vec![ev]);
    /// ```
    pub fn split_at_offsets(
        &self,
        abs_offset: Time,
        offsets: &[Time],
        tie: bool,
    ) -> ChainResult<Vec<Self>> {
        let end = abs_offset + self.dur()?;
        let mut cuts: Vec<Time> = offsets
            .iter()
            .copied()
            .filter(|o| *o > abs_offset && *o < end)
            .collect();
        if cuts.is_empty() {
            return Ok(vec![self.clone()]);
        }
        cuts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        cuts.dedup();
        cuts.push(end);
        let last_idx = cuts.len() - 1;
        let mut start = abs_offset;
        let mut parts = Vec::with_capacity(cuts.len());
        for (idx, cut) in cuts.into_iter().enumerate() {
            let mut part = self.clone();
            part.dur = Some(cut - start);
            part.resolved_offset.set(None);
            if idx > 0 {
                part.offset = None;
                part.dynamic = None;
                part.label = String::new();
            }
            if idx < last_idx {
                part.tied = tie && !self.is_rest();
                part.gliss = Gliss::Off;
                part.gliss_time = None;
                part.gliss_target = None;
            }
            parts.push(part);
            start = cut;
        }
        log::trace!("split {} into {} parts", self, parts.len());
        Ok(parts)
    }

    /// The part of this event inside `[start, end)`.
    ///
    /// The returned event carries an explicit *absolute* offset; callers
    /// move it into their own frame. Grace events are kept when they sit
    /// inside the range, both edges included.
    pub fn cropped(
        &self,
        abs_offset: Time,
        start: Time,
        end: Time,
    ) -> ChainResult<Option<Self>> {
        let dur = self.dur()?;
        let ev_end = abs_offset + dur;
        if dur == zero() {
            if start <= abs_offset && abs_offset <= end {
                return Ok(Some(self.clone().with_offset(abs_offset)));
            }
            return Ok(None);
        }
        let (new_start, new_end) =
            (max_time(abs_offset, start), min_time(ev_end, end));
        if new_end <= new_start {
            return Ok(None);
        }
        let mut out = self.clone().with_offset(new_start);
        out.dur = Some(new_end - new_start);
        out.resolved_offset.set(None);
        if new_end < ev_end {
            out.tied = false;
            out.gliss = Gliss::Off;
            out.gliss_time = None;
            out.gliss_target = None;
        }
        Ok(Some(out))
    }

    /// True if the sound of this event continues into `next`
    /// (glissando, or a tie onto a common pitch).
    pub fn can_be_linked_to(&self, next: &Self) -> bool {
        if self.is_rest() || next.is_rest() {
            return false;
        }
        if self.gliss == Gliss::ToNext || self.gliss_time.is_some() {
            return true;
        }
        if !self.tied {
            return false;
        }
        let next_pitches = next.pitches();
        let linked = self.pitches().iter().any(|p| next_pitches.contains(p));
        if !linked {
            log::debug!("{} is tied, but {} has no pitches in common", self, next);
        }
        linked
    }
}
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event)?;
        match self.dur {
            Some(dur) => write!(f, ":{}", show_time(dur))?,
            None => write!(f, ":?")?,
        }
        if self.tied {
            write!(f, "~")?;
        }
        if self.gliss.is_set() {
            write!(f, " gliss")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " offset={}", show_time(offset))?;
        }
        if !self.label.is_empty() {
            write!(f, " '{}'", self.label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::ChainError,
        primitives::{beats, zero},
    };

    use super::{Chord, Event, EventType, Gliss, Note};

    #[test]
    fn chord_push() {
        let chord = Chord::new()
            .push(EventType::Note(Note::new(64.0)))
            .unwrap()
            .push(EventType::Chord(Chord::from_pitches([67.0, 60.0])))
            .unwrap();
        assert_eq!(chord.pitches(), vec![60.0, 64.0, 67.0]);
        assert!(Chord::new().push(EventType::Rest).is_err());
    }

    #[test]
    fn offsets() {
        let ev = Event::note(60.0, beats(1, 1));
        assert_eq!(
            ev.relative_offset(),
            Err(ChainError::UnresolvedOffset(ev.to_string()))
        );
        ev.set_resolved_offset(Some(beats(3, 2)));
        assert_eq!(ev.relative_offset().unwrap(), beats(3, 2));
        assert_eq!(ev.absolute_offset(beats(1, 1)).unwrap(), beats(5, 2));
        assert_eq!(ev.end().unwrap(), beats(5, 2));

        let ev = ev.with_offset(beats(1, 4));
        assert_eq!(ev.relative_offset().unwrap(), beats(1, 4));
    }

    #[test]
    fn time_shift() {
        let ev = Event::note(60.0, beats(1, 1)).with_offset(beats(1, 1));
        let shifted = ev.time_shift(beats(1, 2)).unwrap();
        assert_eq!(shifted.offset(), Some(beats(3, 2)));
        assert_eq!(ev.offset(), Some(beats(1, 1)));
        assert!(matches!(
            ev.time_shift(beats(-2, 1)),
            Err(ChainError::NegativeTime { .. })
        ));
        let orphan = Event::note(60.0, beats(1, 1));
        assert!(matches!(
            orphan.time_shift(beats(1, 1)),
            Err(ChainError::UnresolvedOffset(_))
        ));
    }

    #[test]
    fn merge_rules() {
        let c = Event::note(60.0, beats(1, 1)).with_tie(true);
        let c2 = Event::note(60.0, beats(1, 1)).with_tie(true);
        let merged = c.merge_with(&c2).unwrap();
        assert_eq!(merged.dur().unwrap(), beats(2, 1));
        assert!(merged.tied);

        // different pitch
        assert_eq!(c.merge_with(&Event::note(62.0, beats(1, 1))), None);
        // not tied
        assert_eq!(
            Event::note(60.0, beats(1, 1))
                .merge_with(&Event::note(60.0, beats(1, 1))),
            None
        );
        // amplitude differs
        assert_eq!(
            c.merge_with(&Event::note(60.0, beats(1, 1)).with_amp(0.5)),
            None
        );
        // gliss would be lost
        assert_eq!(
            c.clone()
                .with_gliss(Gliss::ToNext)
                .merge_with(&Event::note(60.0, beats(1, 1))),
            None
        );
        // label would be lost
        assert_eq!(
            c.merge_with(&Event::note(60.0, beats(1, 1)).with_label("x")),
            None
        );
        // tied note into rest
        assert_eq!(c.merge_with(&Event::rest(beats(1, 1))), None);
        // rests merge without tie
        let rests = Event::rest(beats(1, 2)).merge_with(&Event::rest(beats(1, 2)));
        assert_eq!(rests.unwrap().dur().unwrap(), beats(1, 1));

        let chord = Event::chord([60.0, 64.0], beats(1, 1)).with_tie(true);
        let chord2 = Event::chord([64.0, 60.0], beats(1, 2));
        assert_eq!(
            chord.merge_with(&chord2).unwrap().dur().unwrap(),
            beats(3, 2)
        );
        assert_eq!(chord.merge_with(&c), None);
    }

    #[test]
    fn split() {
        let ev = Event::note(60.0, beats(3, 1))
            .with_offset(beats(1, 1))
            .with_dynamic("mf")
            .with_gliss(Gliss::ToNext);
        let parts = ev
            .split_at_offsets(
                beats(1, 1),
                &[beats(3, 1), beats(2, 1), beats(0, 1), beats(2, 1)],
                true,
            )
            .unwrap();
        assert_eq!(parts.len(), 3);
        let durs: Vec<_> = parts.iter().map(|p| p.dur().unwrap()).collect();
        assert_eq!(durs, vec![beats(1, 1), beats(1, 1), beats(1, 1)]);
        assert_eq!(parts[0].offset(), Some(beats(1, 1)));
        assert_eq!(parts[1].offset(), None);
        assert!(parts[0].tied && parts[1].tied && !parts[2].tied);
        assert_eq!(parts[0].dynamic.as_deref(), Some("mf"));
        assert_eq!(parts[1].dynamic, None);
        assert_eq!(parts[0].gliss, Gliss::Off);
        assert_eq!(parts[2].gliss, Gliss::ToNext);

        let untied = ev.split_at_offsets(beats(1, 1), &[beats(2, 1)], false).unwrap();
        assert!(!untied[0].tied);

        let rest = Event::rest(beats(2, 1));
        let parts = rest.split_at_offsets(zero(), &[beats(1, 1)], true).unwrap();
        assert!(parts.iter().all(|p| !p.tied));

        let grace = Event::note(60.0, zero());
        assert_eq!(
            grace.split_at_offsets(zero(), &[zero()], true).unwrap(),
            vec![grace]
        );

        let placeholder = Event::placeholder(EventType::Note(Note::new(60.0)));
        assert!(matches!(
            placeholder.split_at_offsets(zero(), &[beats(1, 1)], true),
            Err(ChainError::MissingDuration(_))
        ));
    }

    #[test]
    fn negative_duration() {
        let mut ev = Event::note(60.0, beats(-1, 1));
        assert!(matches!(ev.dur(), Err(ChainError::InvalidArgument(_))));
        assert!(matches!(
            ev.split_at_offsets(zero(), &[beats(1, 2)], true),
            Err(ChainError::InvalidArgument(_))
        ));
        assert_eq!(ev.merge_with(&Event::note(60.0, beats(1, 1))), None);
        assert!(ev.set_dur(beats(-1, 2)).is_err());
        ev.set_dur(beats(1, 1)).unwrap();
        assert_eq!(ev.dur().unwrap(), beats(1, 1));
    }

    #[test]
    fn crop() {
        let ev = Event::note(60.0, beats(4, 1)).with_tie(true);
        let part = ev.cropped(beats(1, 1), beats(2, 1), beats(3, 1)).unwrap().unwrap();
        assert_eq!(part.offset(), Some(beats(2, 1)));
        assert_eq!(part.dur().unwrap(), beats(1, 1));
        assert!(!part.tied);
        let head = ev.cropped(beats(1, 1), beats(3, 1), beats(9, 1)).unwrap().unwrap();
        assert!(head.tied);
        assert_eq!(ev.cropped(beats(1, 1), beats(6, 1), beats(7, 1)).unwrap(), None);
        let grace = Event::note(62.0, zero());
        assert!(grace.cropped(beats(1, 1), beats(1, 1), beats(2, 1)).unwrap().is_some());
        assert!(grace.cropped(beats(1, 1), zero(), beats(1, 1)).unwrap().is_some());
        assert!(grace.cropped(beats(1, 1), zero(), beats(1, 2)).unwrap().is_none());
    }

    #[test]
    fn linking() {
        let tied = Event::note(60.0, beats(1, 1)).with_tie(true);
        assert!(tied.can_be_linked_to(&Event::note(60.0, beats(1, 1))));
        assert!(tied.can_be_linked_to(&Event::chord([55.0, 60.0], beats(1, 1))));
        assert!(!tied.can_be_linked_to(&Event::note(61.0, beats(1, 1))));
        assert!(!tied.can_be_linked_to(&Event::rest(beats(1, 1))));
        let gliss = Event::note(60.0, beats(1, 1)).with_gliss(Gliss::ToNext);
        assert!(gliss.can_be_linked_to(&Event::note(67.0, beats(1, 1))));
        let hint = Event::note(60.0, beats(1, 1)).with_gliss_time(beats(1, 2));
        assert!(hint.is_gliss());
        assert!(hint.can_be_linked_to(&Event::note(67.0, beats(1, 1))));
    }

    #[test]
    fn display() {
        let ev = Event::chord([64.0, 60.0], beats(1, 2))
            .with_tie(true)
            .with_offset(beats(2, 1));
        assert_eq!(ev.to_string(), "‹4C 4E›:1/2~ offset=2");
        assert_eq!(Event::rest(beats(1, 1)).to_string(), "Rest:1");
    }
}
