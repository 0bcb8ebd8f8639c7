use crate::{
    error::{ChainError, ChainResult},
    primitives::{
        is_negative, max_time, show_time, time_map::ScoreStruct, zero, Event,
        Time,
    },
};

use super::{Chain, Item};

/// Clear offsets which equal the stacked position. Returns the duration
/// of `items`.
fn remove_redundant(items: &mut [Item], frame: Time) -> ChainResult<Time> {
    let mut now = frame;
    for idx in 0..items.len() {
        if let Some(offset) = items[idx].offset() {
            let abs_offset = offset + frame;
            let after_sized = idx == 0 || items[idx - 1].has_dur();
            if abs_offset == now && after_sized {
                items[idx].set_offset(None);
            } else if abs_offset < now {
                return Err(ChainError::Overlap {
                    item: items[idx].to_string(),
                    offset: abs_offset,
                    cursor: now,
                });
            } else {
                now = abs_offset;
            }
        }
        match &mut items[idx] {
            Item::Event(ev) => now += ev.dur()?,
            Item::Chain(ch) => {
                let dur = remove_redundant(&mut ch.items, now)?;
                ch.invalidate();
                now += dur;
            }
        }
    }
    Ok(now - frame)
}

impl Chain {
    /// Insert rests into gaps, in place.
    ///
    /// A gap is an explicit offset later than the end of the previous
    /// item (or than the chain start, for the first item).
    pub fn fill_gaps(&mut self, recurse: bool) -> ChainResult<()> {
        self.update()?;
        if recurse {
            for item in self.items.iter_mut() {
                if let Item::Chain(ch) = item {
                    ch.fill_gaps(true)?;
                }
            }
        }
        let mut now = zero();
        let mut gaps = Vec::new();
        for (idx, item) in self.items.iter().enumerate() {
            if let Some(offset) = item.offset() {
                if offset > now {
                    gaps.push((idx, offset - now));
                    now = offset;
                }
            }
            now += item.dur()?;
        }
        log::debug!("filling {} gaps in chain '{}'", gaps.len(), self.label);
        self.invalidate();
        for (idx, gap) in gaps.into_iter().rev() {
            self.items.insert(idx, Event::rest(gap).into());
        }
        Ok(())
    }

    /// Clear every explicit offset equal to the stacked position, in
    /// place and recursively. A top-level offset of 0 is cleared too.
    ///
    /// # Example
    /// ```
    /// # use score_chain::primitives::{beats, Chain, Event};
    /// let mut chain = Chain::new(vec![
    ///     Event::note(60.0, beats(1, 1)),
    ///     Event::note(62.0, beats(1, 1)),
    ///     Event::note(64.0, beats(1, 1)).with_offset(beats(3, 1)),
    /// ]);
    /// chain.stack().unwrap();
    /// chain.remove_redundant_offsets().unwrap();
    /// let offsets: Vec<_> = chain.items().iter().map(|i| i.offset()).collect();
    /// assert_eq!(offsets, vec![None, None, Some(beats(3, 1))]);
    /// ```
    pub fn remove_redundant_offsets(&mut self) -> ChainResult<()> {
        self.update()?;
        self.invalidate();
        remove_redundant(&mut self.items, zero())?;
        if self.offset == Some(zero()) {
            self.offset = None;
        }
        Ok(())
    }

    /// Merge tied events, in place.
    ///
    /// Only contiguous events are merged; sub-chains are processed on
    /// their own and never merged with siblings.
    pub fn merge_tied_events(&mut self) -> ChainResult<()> {
        let offsets = self.stacked()?.offsets.clone();
        let durs = self
            .items
            .iter()
            .map(Item::dur)
            .collect::<ChainResult<Vec<_>>>()?;
        for item in self.items.iter_mut() {
            if let Item::Chain(ch) = item {
                ch.merge_tied_events()?;
            }
        }
        let before = self.items.len();
        let mut out: Vec<Item> = Vec::with_capacity(before);
        let mut pending: Option<(Event, Time)> = None;
        let items = std::mem::take(&mut self.items);
        for ((item, offset), dur) in items.into_iter().zip(offsets).zip(durs) {
            match item {
                Item::Chain(ch) => {
                    if let Some((last, _)) = pending.take() {
                        out.push(last.into());
                    }
                    out.push(ch.into());
                }
                Item::Event(ev) => {
                    let end = offset + dur;
                    pending = Some(match pending.take() {
                        Some((last, last_end)) if last_end == offset => {
                            match last.merge_with(&ev) {
                                Some(merged) => (merged, end),
                                None => {
                                    out.push(last.into());
                                    (ev, end)
                                }
                            }
                        }
                        Some((last, _)) => {
                            out.push(last.into());
                            (ev, end)
                        }
                        None => (ev, end),
                    });
                }
            }
        }
        if let Some((last, _)) = pending {
            out.push(last.into());
        }
        if out.len() < before {
            log::debug!("merged {} tied events", before - out.len());
        }
        self.set_items(out);
        Ok(())
    }

    /// Split events at absolute offsets, in place and recursively.
    pub fn split_events_at_offsets(
        &mut self,
        offsets: &[Time],
        tie: bool,
    ) -> ChainResult<()> {
        if offsets.is_empty() {
            return Err(ChainError::InvalidArgument(
                "no offsets given to split at".to_string(),
            ));
        }
        let frame = self.abs_offset();
        self.split_in_frame(frame, offsets, tie)
    }
    fn split_in_frame(
        &mut self,
        frame: Time,
        offsets: &[Time],
        tie: bool,
    ) -> ChainResult<()> {
        let relative = self.stacked()?.offsets.clone();
        let mut parts: Vec<Option<Vec<Event>>> =
            Vec::with_capacity(relative.len());
        for (item, offset) in self.items.iter_mut().zip(relative) {
            let abs_offset = frame + offset;
            parts.push(match item {
                Item::Event(ev) => {
                    Some(ev.split_at_offsets(abs_offset, offsets, tie)?)
                }
                Item::Chain(ch) => {
                    ch.split_in_frame(abs_offset, offsets, tie)?;
                    None
                }
            });
        }
        let items = std::mem::take(&mut self.items);
        let mut out = Vec::with_capacity(items.len());
        for (item, split) in items.into_iter().zip(parts) {
            match split {
                Some(events) => out.extend(events.into_iter().map(Item::from)),
                None => out.push(item),
            }
        }
        self.set_items(out);
        Ok(())
    }
    /// Split whatever sounds at the absolute `offset`.
    ///
    /// # Returns
    /// The event starting at `offset` after the split, if any.
    pub fn split_at(
        &mut self,
        offset: Time,
        tie: bool,
    ) -> ChainResult<Option<&Event>> {
        self.split_events_at_offsets(&[offset], tie)?;
        Ok(self
            .events_with_offset()?
            .into_iter()
            .find(|(_, ev_offset)| *ev_offset == offset)
            .map(|(ev, _)| ev))
    }
    /// Split events at barlines, tied.
    ///
    /// `stop` is exclusive. If None, measures up to the end of the chain
    /// are used.
    pub fn split_events_at_measures<S: ScoreStruct + ?Sized>(
        &mut self,
        score: &S,
        start: usize,
        stop: Option<usize>,
    ) -> ChainResult<()> {
        let stop = match stop {
            Some(stop) => stop,
            None => {
                let end = self.abs_offset() + self.dur()?;
                score.beat_to_location(end).0 + 1
            }
        };
        let offsets = score.measure_offsets(start, stop);
        if offsets.is_empty() {
            return Ok(());
        }
        self.split_events_at_offsets(&offsets, true)
    }

    /// Shift this chain as a root, in place.
    ///
    /// Positive deltas move the own offset. Negative deltas first eat the
    /// silence before the first event, then the own offset. What would
    /// go below 0 is clamped.
    pub fn time_shift_in_place(&mut self, delta: Time) -> ChainResult<()> {
        self.shift_in_frame(delta, None, true)
    }
    pub fn time_shift(&self, delta: Time) -> ChainResult<Self> {
        let mut out = self.clone();
        out.time_shift_in_place(delta)?;
        Ok(out)
    }
    /// Shift the child at `index`, in place.
    ///
    /// Fails with [`ChainError::NegativeTime`] if the child would start
    /// before 0 or before the end of its previous sibling.
    pub fn time_shift_item_in_place(
        &mut self,
        index: usize,
        delta: Time,
    ) -> ChainResult<()> {
        if index >= self.items.len() {
            return Err(ChainError::InvalidPath(vec![index]));
        }
        self.update()?;
        let prev_end = match index.checked_sub(1) {
            Some(prev) => {
                Some(self.child_offset(prev)? + self.items[prev].dur()?)
            }
            None => None,
        };
        match &mut self.items[index] {
            Item::Event(ev) => {
                let target = ev.relative_offset()? + delta;
                if is_negative(target) || prev_end.map_or(false, |end| target < end)
                {
                    return Err(ChainError::NegativeTime {
                        item: ev.to_string(),
                        offset: target,
                    });
                }
                ev.set_offset(Some(target));
            }
            Item::Chain(ch) => ch.shift_in_frame(delta, prev_end, false)?,
        }
        self.invalidate();
        Ok(())
    }
    pub(crate) fn shift_in_frame(
        &mut self,
        delta: Time,
        prev_end: Option<Time>,
        clamp: bool,
    ) -> ChainResult<()> {
        if delta == zero() {
            return Ok(());
        }
        self.update()?;
        let rel = self.rel_offset();
        if delta > zero() {
            self.offset = Some(rel + delta);
            return Ok(());
        }
        let first = self.first_offset()?.unwrap_or_else(zero);
        let new_first = max_time(zero(), first + delta);
        let item_shift = new_first - first;
        let rest = delta - item_shift;
        let mut new_rel = None;
        if rest != zero() {
            let target = rel + rest;
            let floor = max_time(zero(), prev_end.unwrap_or_else(zero));
            new_rel = Some(match target < floor {
                false => target,
                true if clamp => {
                    log::debug!(
                        "shift of '{}' clamped: {} -> {}",
                        self.label,
                        show_time(target),
                        show_time(floor)
                    );
                    floor
                }
                true => {
                    return Err(ChainError::NegativeTime {
                        item: self.to_string(),
                        offset: target,
                    })
                }
            });
        }
        if item_shift != zero() {
            for item in self.items.iter_mut() {
                item.shift_in_place(item_shift)?;
            }
            self.invalidate();
        }
        if let Some(offset) = new_rel {
            self.offset = Some(offset);
        }
        Ok(())
    }

    /// Move the silence before the first event into the own offset.
    pub fn absorb_initial_offset(&mut self) -> ChainResult<()> {
        let first = match self.first_offset()? {
            Some(first) if first > zero() => first,
            _ => return Ok(()),
        };
        let rel = self.rel_offset();
        for item in self.items.iter_mut() {
            item.shift_in_place(-first)?;
        }
        self.invalidate();
        self.offset = Some(rel + first);
        self.remove_redundant_offsets()
    }

    /// Copy of the part of this chain within `[start, end)` (absolute).
    ///
    /// The result starts at `start`, its items are relative to it.
    /// Events crossing the edges are cut. None if nothing is left.
    pub fn cropped(&self, start: Time, end: Time) -> ChainResult<Option<Self>> {
        let mut out = self.cropped_from(self.abs_offset(), start, end, false)?;
        if out.is_empty() {
            return Ok(None);
        }
        out.remove_redundant_offsets()?;
        Ok(Some(out))
    }
    fn cropped_from(
        &self,
        frame: Time,
        start: Time,
        end: Time,
        absorb: bool,
    ) -> ChainResult<Self> {
        let relative = self.stacked()?.offsets.clone();
        let mut items: Vec<Item> = Vec::new();
        for (item, rel) in self.items.iter().zip(relative) {
            let offset = frame + rel;
            let dur = item.dur()?;
            if offset > end || (offset == end && dur > zero()) {
                break;
            }
            let fully_inside = start <= offset && offset + dur <= end;
            if fully_inside || (dur == zero() && start <= offset) {
                let mut kept = item.clone();
                kept.set_offset(Some(offset - start));
                items.push(kept);
            } else if offset + dur > start {
                match item {
                    Item::Event(ev) => {
                        if let Some(mut part) = ev.cropped(offset, start, end)? {
                            let part_offset = part.offset().unwrap_or(offset);
                            part.set_offset(Some(part_offset - start));
                            items.push(part.into());
                        }
                    }
                    Item::Chain(ch) => {
                        let mut sub = ch.cropped_from(offset, start, end, true)?;
                        let sub_offset = sub.abs_offset();
                        sub.set_offset(Some(sub_offset - start));
                        items.push(sub.into());
                    }
                }
            }
        }
        let mut out = Chain {
            items,
            offset: Some(start),
            label: self.label.clone(),
            ..Default::default()
        };
        if absorb {
            out.absorb_initial_offset()?;
        }
        Ok(out)
    }

    /// Repeat the events of this chain until `total` is reached.
    ///
    /// Gaps are filled with rests first. With `crop`, the last event is
    /// shortened to end exactly at `total`.
    pub fn cycle(&self, total: Time, crop: bool) -> ChainResult<Self> {
        let mut filled = self.clone();
        filled.fill_gaps(true)?;
        let pattern: Vec<Event> = filled.recurse().cloned().collect();
        if filled.dur()? == zero() {
            return Err(ChainError::InvalidArgument(format!(
                "can not cycle a chain without duration: {self}"
            )));
        }
        let mut items: Vec<Event> = Vec::new();
        let mut accum = zero();
        for ev in pattern.iter().cycle() {
            let mut ev = ev.clone();
            ev.set_offset(None);
            accum += ev.dur()?;
            items.push(ev);
            if accum >= total {
                break;
            }
        }
        if crop && accum > total {
            if let Some(last) = items.last_mut() {
                let dur = last.dur()? - (accum - total);
                last.set_dur(dur)?;
            }
        }
        Ok(Chain {
            items: items.into_iter().map(Item::from).collect(),
            offset: self.offset,
            label: self.label.clone(),
            ..Default::default()
        })
    }
}
