//! Inference of glissando targets from the following event.
use super::{Chain, Event, EventType, Pitch};

/// Target pitches of a glissando from `source` into `next`.
///
/// - note into note: the next pitch.
/// - note into chord: the highest pitch of the chord.
/// - chord into chord: the highest notes of the next chord, as many as
///   the source has.
/// - chord into note: the next pitch for every source note.
pub fn gliss_target(source: &EventType, next: &EventType) -> Vec<Pitch> {
    match (source, next) {
        (EventType::Note(_), EventType::Note(note)) => vec![note.pitch],
        (EventType::Note(_), EventType::Chord(chord)) => chord
            .pitches()
            .into_iter()
            .reduce(Pitch::max)
            .into_iter()
            .collect(),
        (EventType::Chord(src), EventType::Chord(chord)) => {
            let pitches = chord.pitches();
            let skip = pitches.len().saturating_sub(src.len());
            pitches[skip..].to_vec()
        }
        (EventType::Chord(src), EventType::Note(note)) => {
            vec![note.pitch; src.len()]
        }
        _ => source.pitches(),
    }
}

/// Cache glissando targets on subsequent events, in place.
///
/// An event gets a target if it starts a glissando and neither it nor
/// its successor is a rest. Already resolved targets are kept unless
/// `force`. The last event, when gliding, targets its own pitches.
pub fn resolve_glissandi(events: &mut [&mut Event], force: bool) {
    for idx in 1..events.len() {
        let (head, tail) = events.split_at_mut(idx);
        let (ev, next) = (&mut *head[idx - 1], &*tail[0]);
        if ev.is_rest() || next.is_rest() || !ev.is_gliss() {
            continue;
        }
        if !force && ev.gliss_target().is_some() {
            continue;
        }
        let target = gliss_target(&ev.event, &next.event);
        log::trace!("gliss target of {}: {:?}", ev, target);
        ev.set_gliss_target(Some(target));
    }
    if let Some(last) = events.last_mut() {
        if last.gliss.is_set() && (force || last.gliss_target().is_none()) {
            log::warn!("{} starts a glissando, but nothing follows", last);
            let own = last.pitches();
            last.set_gliss_target(Some(own));
        }
    }
}

impl Chain {
    /// Resolve glissando targets of all events, in place.
    pub fn resolve_glissandi(&mut self, force: bool) {
        let mut events = self.recurse_mut();
        resolve_glissandi(&mut events, force);
    }
}

#[cfg(test)]
mod tests {
    use crate::primitives::{beats, Chain, Event, Gliss};

    use super::resolve_glissandi;

    fn gliss(ev: Event) -> Event {
        ev.with_gliss(Gliss::ToNext)
    }

    #[test]
    fn target_rules() {
        let mut events = vec![
            gliss(Event::note(60.0, beats(1, 1))),
            gliss(Event::chord([62.0, 65.0, 69.0], beats(1, 1))),
            gliss(Event::chord([50.0, 53.0], beats(1, 1))),
            gliss(Event::note(48.0, beats(1, 1))),
            Event::rest(beats(1, 1)),
            gliss(Event::chord([40.0, 43.0], beats(1, 1))),
            Event::note(45.0, beats(1, 1)),
            gliss(Event::note(47.0, beats(1, 1))),
        ];
        let mut refs: Vec<&mut Event> = events.iter_mut().collect();
        resolve_glissandi(&mut refs, false);
        assert_eq!(events[0].gliss_target(), Some(&[69.0][..]));
        // chord into a smaller chord keeps only what exists
        assert_eq!(events[1].gliss_target(), Some(&[50.0, 53.0][..]));
        assert_eq!(events[2].gliss_target(), Some(&[48.0, 48.0][..]));
        // into a rest: unresolved
        assert_eq!(events[3].gliss_target(), None);
        assert_eq!(events[3].resolve_gliss(), vec![48.0]);
        assert_eq!(events[5].gliss_target(), Some(&[45.0, 45.0][..]));
        // last one targets itself
        assert_eq!(events[7].gliss_target(), Some(&[47.0][..]));
    }

    #[test]
    fn highest_notes_of_bigger_chord() {
        let mut events = vec![
            gliss(Event::chord([60.0, 64.0], beats(1, 1))),
            Event::chord([55.0, 62.0, 67.0], beats(1, 1)),
        ];
        let mut refs: Vec<&mut Event> = events.iter_mut().collect();
        resolve_glissandi(&mut refs, false);
        assert_eq!(events[0].gliss_target(), Some(&[62.0, 67.0][..]));
    }

    #[test]
    fn force_and_hints() {
        let mut chain = Chain::new(vec![
            Event::note(60.0, beats(1, 1)).with_gliss_time(beats(1, 2)),
            Event::note(64.0, beats(1, 1)),
        ]);
        chain.resolve_glissandi(false);
        assert_eq!(
            chain.first_event().unwrap().gliss_target(),
            Some(&[64.0][..])
        );
        chain
            .event_at_path_mut(&[1])
            .unwrap()
            .event = Event::note(65.0, beats(1, 1)).event;
        chain.resolve_glissandi(false);
        assert_eq!(
            chain.first_event().unwrap().gliss_target(),
            Some(&[64.0][..])
        );
        chain.resolve_glissandi(true);
        assert_eq!(
            chain.first_event().unwrap().gliss_target(),
            Some(&[65.0][..])
        );
    }
}
