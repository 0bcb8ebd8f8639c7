use crate::{
    error::ChainResult,
    primitives::{
        beats, glissando::resolve_glissandi, max_time, to_f64, zero, Event,
        Pitch, Time,
    },
    settings::Settings,
};

use super::{Chain, Item};

impl Chain {
    /// All events, depth first.
    pub fn recurse(&self) -> Box<dyn Iterator<Item = &Event> + '_> {
        Box::new(self.items.iter().flat_map(
            |item| -> Box<dyn Iterator<Item = &Event> + '_> {
                match item {
                    Item::Event(ev) => Box::new(std::iter::once(ev)),
                    Item::Chain(ch) => ch.recurse(),
                }
            },
        ))
    }
    /// All events, depth first, from the end.
    pub fn recurse_rev(&self) -> Box<dyn Iterator<Item = &Event> + '_> {
        Box::new(self.items.iter().rev().flat_map(
            |item| -> Box<dyn Iterator<Item = &Event> + '_> {
                match item {
                    Item::Event(ev) => Box::new(std::iter::once(ev)),
                    Item::Chain(ch) => ch.recurse_rev(),
                }
            },
        ))
    }
    /// Mutable events, depth first. Every chain on the way is marked dirty.
    pub fn recurse_mut(&mut self) -> Vec<&mut Event> {
        self.invalidate();
        let mut out = Vec::new();
        for item in self.items.iter_mut() {
            match item {
                Item::Event(ev) => out.push(ev),
                Item::Chain(ch) => out.extend(ch.recurse_mut()),
            }
        }
        out
    }
    pub fn first_event(&self) -> Option<&Event> {
        self.recurse().next()
    }
    pub fn last_event(&self) -> Option<&Event> {
        self.recurse_rev().next()
    }

    /// Flattened events with their absolute offsets.
    ///
    /// The list is built on every call from the stacking cached in each
    /// chain, so a clean tree is walked once and never re-stacked. It
    /// borrows the events and is not kept in the cache itself. Callers
    /// scanning it repeatedly should hold on to the result.
    pub fn events_with_offset(&self) -> ChainResult<Vec<(&Event, Time)>> {
        let mut out = Vec::new();
        self.collect_events(self.abs_offset(), &mut out)?;
        Ok(out)
    }
    fn collect_events<'a>(
        &'a self,
        frame: Time,
        out: &mut Vec<(&'a Event, Time)>,
    ) -> ChainResult<()> {
        let stacked = self.stacked()?;
        for (item, offset) in self.items.iter().zip(stacked.offsets.iter()) {
            match item {
                Item::Event(ev) => out.push((ev, frame + *offset)),
                Item::Chain(ch) => ch.collect_events(frame + *offset, out)?,
            }
        }
        Ok(())
    }

    /// Flattened events inside `[start, end]` (absolute).
    ///
    /// With `partial`, events which only overlap the range are included.
    /// Otherwise events must lie completely within it. Grace events at
    /// the edges are always included.
    pub fn events_with_offset_between(
        &self,
        start: Time,
        end: Time,
        partial: bool,
    ) -> ChainResult<Vec<(&Event, Time)>> {
        let mut out = Vec::new();
        for (ev, offset) in self.events_with_offset()? {
            if offset > end {
                break;
            }
            let dur = ev.dur()?;
            let inside = match (partial, dur == zero()) {
                (true, false) => offset < end && offset + dur > start,
                (true, true) => start <= offset && offset <= end,
                (false, _) => start <= offset && offset + dur <= end,
            };
            if inside {
                out.push((ev, offset));
            }
        }
        Ok(out)
    }
    pub fn events_between(
        &self,
        start: Time,
        end: Time,
        partial: bool,
    ) -> ChainResult<Vec<&Event>> {
        Ok(self
            .events_with_offset_between(start, end, partial)?
            .into_iter()
            .map(|(ev, _)| ev)
            .collect())
    }
    /// The first event sounding within `[beat, beat + margin]`.
    ///
    /// Without `margin`, [`Settings::event_at_margin`] of the default
    /// settings is used. Explicit rests are returned, empty space gives
    /// None.
    pub fn event_at(
        &self,
        beat: Time,
        margin: Option<Time>,
    ) -> ChainResult<Option<&Event>> {
        let margin =
            margin.unwrap_or_else(|| Settings::default().event_at_margin);
        Ok(self
            .events_between(beat, beat + margin, true)?
            .into_iter()
            .next())
    }

    /// Direct children with their absolute offsets.
    pub fn items_with_offset(&self) -> ChainResult<Vec<(&Item, Time)>> {
        let frame = self.abs_offset();
        Ok(self
            .items_with_relative_offset()?
            .into_iter()
            .map(|(item, offset)| (item, offset + frame))
            .collect())
    }
    /// Direct children with offsets relative to this chain.
    pub fn items_with_relative_offset(
        &self,
    ) -> ChainResult<Vec<(&Item, Time)>> {
        let stacked = self.stacked()?;
        Ok(self.items.iter().zip(stacked.offsets.iter().copied()).collect())
    }
    /// Direct children within `[start, end]` (absolute).
    ///
    /// With `partial`, an item touching the range is enough. Otherwise
    /// it must lie completely within it.
    pub fn items_between(
        &self,
        start: Time,
        end: Time,
        partial: bool,
    ) -> ChainResult<Vec<&Item>> {
        let mut out = Vec::new();
        for (item, offset) in self.items_with_offset()? {
            let dur = item.dur()?;
            if offset > end || (offset == end && dur > zero()) {
                break;
            }
            let inside = match partial {
                true => offset + dur >= start,
                false => start <= offset && offset + dur <= end,
            };
            if inside {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Offset of the first event, relative to the start of this chain.
    pub fn first_offset(&self) -> ChainResult<Option<Time>> {
        let stacked = self.stacked()?;
        for (item, offset) in self.items.iter().zip(stacked.offsets.iter()) {
            match item {
                Item::Event(_) => return Ok(Some(*offset)),
                Item::Chain(ch) => {
                    if let Some(first) = ch.first_offset()? {
                        return Ok(Some(*offset + first));
                    }
                }
            }
        }
        Ok(None)
    }

    /// True if this chain and all items (recursively) have explicit
    /// offsets.
    pub fn has_offsets(&self) -> bool {
        self.offset.is_some()
            && self.items.iter().all(|item| match item {
                Item::Event(ev) => ev.offset().is_some(),
                Item::Chain(ch) => ch.has_offsets(),
            })
    }
    /// Contains only events, no sub-chains.
    pub fn is_flat(&self) -> bool {
        self.items.iter().all(|item| matches!(item, Item::Event(_)))
    }
    /// True if some item starts later than the end of its predecessor
    /// (or, for the first item, later than the chain start).
    pub fn has_gaps(&self, recurse: bool) -> ChainResult<bool> {
        let stacked = self.stacked()?;
        let mut now = zero();
        for (item, offset) in self.items.iter().zip(stacked.offsets.iter()) {
            if *offset > now {
                return Ok(true);
            }
            now = *offset + item.dur()?;
            if let (true, Item::Chain(ch)) = (recurse, item) {
                if ch.has_gaps(true)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn pitch_range(&self) -> Option<(Pitch, Pitch)> {
        self.items
            .iter()
            .filter_map(Item::pitch_range)
            .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }
    /// Mean pitch weighted by duration. Grace events weight as a 1/16 beat.
    pub fn mean_pitch(&self) -> ChainResult<Option<Pitch>> {
        let grace_weight = beats(1, 16);
        let (mut sum, mut weights) = (0.0, 0.0);
        for ev in self.recurse().filter(|ev| !ev.is_rest()) {
            let Some(pitch) = ev.mean_pitch() else {
                continue;
            };
            let weight = to_f64(max_time(ev.dur()?, grace_weight));
            sum += pitch * weight;
            weights += weight;
        }
        Ok(match weights > 0.0 {
            true => Some(sum / weights),
            false => None,
        })
    }

    /// Clones of all events with their absolute offset set explicitly.
    /// Glissando targets are resolved on the copies.
    pub fn flat_events(&self) -> ChainResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events_with_offset()?
            .into_iter()
            .map(|(ev, offset)| {
                let mut ev = ev.clone();
                ev.set_offset(Some(offset));
                ev
            })
            .collect();
        let mut refs: Vec<&mut Event> = events.iter_mut().collect();
        resolve_glissandi(&mut refs, false);
        Ok(events)
    }
    /// Flat copy: same start, all events explicit, no sub-chains.
    pub fn flat(&self) -> ChainResult<Chain> {
        let own = self.abs_offset();
        let items = self
            .events_with_offset()?
            .into_iter()
            .map(|(ev, offset)| {
                let mut ev = ev.clone();
                ev.set_offset(Some(offset - own));
                Item::Event(ev)
            })
            .collect();
        Ok(Chain {
            items,
            offset: self.offset,
            label: self.label.clone(),
            ..Default::default()
        })
    }
    /// Copy of self where every offset is explicit.
    pub fn with_explicit_offsets(&self) -> ChainResult<Chain> {
        let mut out = self.clone();
        out.stack()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::primitives::{beats, zero, Chain, Event, Gliss, Item};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sample() -> Chain {
        Chain::new(vec![
            Item::from(Event::note(60.0, beats(1, 2))),
            Event::note(62.0, beats(1, 1)).into(),
            Chain::new(vec![
                Event::note(64.0, beats(1, 2)),
                Event::note(65.0, zero()),
                Event::note(67.0, beats(1, 1)),
            ])
            .with_offset(beats(2, 1))
            .into(),
        ])
        .with_offset(beats(1, 1))
    }

    #[test]
    fn flattening() {
        init();
        let chain = sample();
        let flat = chain.events_with_offset().unwrap();
        let expected = [
            (60.0, beats(1, 1)),
            (62.0, beats(3, 2)),
            (64.0, beats(3, 1)),
            (65.0, beats(7, 2)),
            (67.0, beats(7, 2)),
        ];
        for ((ev, offset), (pitch, exp)) in flat.iter().zip_eq(expected) {
            assert_eq!(ev.pitches(), vec![pitch]);
            assert_eq!(*offset, exp);
        }
        assert_eq!(chain.first_event().unwrap().pitches(), vec![60.0]);
        assert_eq!(chain.last_event().unwrap().pitches(), vec![67.0]);
        assert_eq!(chain.recurse_rev().count(), 5);
        assert_eq!(chain.first_offset().unwrap(), Some(zero()));
    }

    #[test]
    fn flattening_follows_stacking_cache() {
        init();
        let mut chain = sample();
        let first: Vec<_> = chain
            .events_with_offset()
            .unwrap()
            .into_iter()
            .map(|(ev, offset)| (ev.clone(), offset))
            .collect();
        assert!(!chain.is_dirty());
        assert!(!chain.get(2).unwrap().as_chain().unwrap().is_dirty());
        let again: Vec<_> = chain
            .events_with_offset()
            .unwrap()
            .into_iter()
            .map(|(ev, offset)| (ev.clone(), offset))
            .collect();
        assert_eq!(again, first);

        chain
            .item_at_path_mut(&[2, 0])
            .unwrap()
            .as_event_mut()
            .unwrap()
            .set_dur(beats(1, 1))
            .unwrap();
        assert!(chain.is_dirty());
        let offsets: Vec<_> = chain
            .events_with_offset()
            .unwrap()
            .into_iter()
            .map(|(_, offset)| offset)
            .collect();
        assert_eq!(
            offsets,
            vec![beats(1, 1), beats(3, 2), beats(3, 1), beats(4, 1), beats(4, 1)]
        );
    }

    #[test]
    fn between() {
        init();
        let chain = sample();
        let pitches = |events: Vec<&Event>| {
            events.into_iter().flat_map(|ev| ev.pitches()).collect::<Vec<_>>()
        };
        assert_eq!(
            pitches(chain.events_between(beats(2, 1), beats(7, 2), true).unwrap()),
            vec![62.0, 64.0, 65.0]
        );
        assert_eq!(
            pitches(chain.events_between(beats(1, 1), beats(7, 2), false).unwrap()),
            vec![60.0, 62.0, 64.0, 65.0]
        );
        let ev = chain.event_at(beats(13, 4), None).unwrap().unwrap();
        assert_eq!(ev.pitches(), vec![64.0]);
        assert!(chain.event_at(beats(11, 4), Some(beats(1, 8))).unwrap().is_none());

        let items = chain.items_between(beats(3, 2), beats(7, 2), true).unwrap();
        assert_eq!(items.len(), 3);
        let items = chain.items_between(beats(3, 2), beats(5, 2), false).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn gaps_and_flags() {
        let chain = sample();
        assert!(chain.has_gaps(false).unwrap());
        assert!(!chain.is_flat());
        assert!(!chain.has_offsets());
        let explicit = chain.with_explicit_offsets().unwrap();
        assert!(explicit.has_offsets());
        assert_eq!(explicit.dur().unwrap(), chain.dur().unwrap());

        let flat = chain.flat().unwrap();
        assert!(flat.is_flat());
        assert_eq!(flat.len(), 5);
        assert_eq!(flat.get(2).unwrap().offset(), Some(beats(2, 1)));
        assert_eq!(flat.dur().unwrap(), chain.dur().unwrap());
    }

    #[test]
    fn pitches() {
        let chain = sample();
        assert_eq!(chain.pitch_range(), Some((60.0, 67.0)));
        let even = Chain::new(vec![
            Event::note(60.0, beats(1, 1)),
            Event::rest(beats(4, 1)),
            Event::note(64.0, beats(1, 1)),
        ]);
        assert_eq!(even.mean_pitch().unwrap(), Some(62.0));
        assert_eq!(Chain::default().mean_pitch().unwrap(), None);
    }

    #[test]
    fn flat_events_resolve_gliss() {
        let chain = Chain::new(vec![
            Event::note(60.0, beats(1, 1)).with_gliss(Gliss::ToNext),
            Event::chord([62.0, 67.0], beats(1, 1)),
        ]);
        let events = chain.flat_events().unwrap();
        assert_eq!(events[0].gliss_target(), Some(&[67.0][..]));
        assert_eq!(events[1].offset(), Some(beats(1, 1)));
        // the chain itself is not touched
        assert_eq!(chain.first_event().unwrap().gliss_target(), None);
    }
}
