//! Chain: a sequence of events and sub-chains.
//!
//! Every item may carry an explicit offset (relative to its chain) or
//! leave it unset, which means "right after the previous item". The
//! resolved offsets and the total duration are computed by a stacking
//! pass and cached per chain.
//!
//! The cache is a [`OnceCell`]: empty means Dirty, filled means Clean.
//! Every `&mut` access to items goes through the owning chain and
//! empties it, so all ancestors of a mutated node are Dirty before the
//! write happens.
//!
//! # Example
//! ```
//! use score_chain::primitives::{beats, Chain, Event};
//!
//! let chain = Chain::new(vec![
//!     Event::note(60.0, beats(1, 1)),
//!     Event::note(62.0, beats(1, 1)),
//!     Event::note(64.0, beats(2, 1)),
//! ]);
//! assert_eq!(chain.dur().unwrap(), beats(4, 1));
//! let offsets: Vec<_> = chain
//!     .events_with_offset()
//!     .unwrap()
//!     .into_iter()
//!     .map(|(_, offset)| offset)
//!     .collect();
//! assert_eq!(offsets, vec![beats(0, 1), beats(1, 1), beats(2, 1)]);
//! ```
use std::{cell::Cell, fmt};

use derivative::Derivative;
use once_cell::unsync::OnceCell;

use crate::error::{ChainError, ChainResult};

use super::{is_negative, show_time, zero, Event, Pitch, Time};

mod edit;
mod query;

/// Anything a chain can hold.
#[derive(Debug, PartialEq, Clone)]
pub enum Item {
    Event(Event),
    Chain(Chain),
}
impl From<Event> for Item {
    fn from(value: Event) -> Self {
        Self::Event(value)
    }
}
impl From<Chain> for Item {
    fn from(value: Chain) -> Self {
        Self::Chain(value)
    }
}
impl Item {
    pub fn offset(&self) -> Option<Time> {
        match self {
            Self::Event(ev) => ev.offset(),
            Self::Chain(ch) => ch.offset(),
        }
    }
    pub fn set_offset(&mut self, offset: Option<Time>) {
        match self {
            Self::Event(ev) => {
                ev.set_offset(offset);
            }
            Self::Chain(ch) => ch.set_offset(offset),
        }
    }
    /// For a chain this is its stacked duration, without own offset.
    pub fn dur(&self) -> ChainResult<Time> {
        match self {
            Self::Event(ev) => ev.dur(),
            Self::Chain(ch) => ch.dur(),
        }
    }
    pub fn has_dur(&self) -> bool {
        match self {
            Self::Event(ev) => ev.has_dur(),
            Self::Chain(_) => true,
        }
    }
    pub fn resolved_offset(&self) -> Option<Time> {
        match self {
            Self::Event(ev) => ev.resolved_offset(),
            Self::Chain(ch) => ch.resolved_offset(),
        }
    }
    pub(crate) fn set_resolved_offset(&self, offset: Option<Time>) {
        match self {
            Self::Event(ev) => ev.set_resolved_offset(offset),
            Self::Chain(ch) => ch.resolved_offset.set(offset),
        }
    }
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(ev) => Some(ev),
            Self::Chain(_) => None,
        }
    }
    pub fn as_chain(&self) -> Option<&Chain> {
        match self {
            Self::Event(_) => None,
            Self::Chain(ch) => Some(ch),
        }
    }
    pub fn as_event_mut(&mut self) -> Option<&mut Event> {
        match self {
            Self::Event(ev) => Some(ev),
            Self::Chain(_) => None,
        }
    }
    pub fn as_chain_mut(&mut self) -> Option<&mut Chain> {
        match self {
            Self::Event(_) => None,
            Self::Chain(ch) => Some(ch),
        }
    }
    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Event(ev) if ev.is_rest())
    }
    pub fn pitch_range(&self) -> Option<(Pitch, Pitch)> {
        match self {
            Self::Event(ev) => ev.pitch_range(),
            Self::Chain(ch) => ch.pitch_range(),
        }
    }
    /// Move the item as a whole, without looking at siblings. Used when
    /// the content of a chain moves together.
    ///
    /// A sub-chain moves by its own offset, its content stays in place.
    /// The parent has to be stacked before.
    pub(crate) fn shift_in_place(&mut self, delta: Time) -> ChainResult<()> {
        match self {
            Self::Event(ev) => ev.time_shift_in_place(delta),
            Self::Chain(ch) => {
                if delta == zero() {
                    return Ok(());
                }
                let offset = ch.rel_offset() + delta;
                if is_negative(offset) {
                    return Err(ChainError::NegativeTime {
                        item: ch.to_string(),
                        offset,
                    });
                }
                ch.offset = Some(offset);
                Ok(())
            }
        }
    }
}
impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(ev) => write!(f, "{ev}"),
            Self::Chain(ch) => write!(f, "{ch}"),
        }
    }
}

/// Result of a stacking pass: duration and resolved offset of every item.
#[derive(Debug, Clone, PartialEq)]
struct Stacked {
    dur: Time,
    offsets: Vec<Time>,
}

#[derive(Derivative, Clone, Default)]
#[derivative(Debug, PartialEq)]
pub struct Chain {
    items: Vec<Item>,
    offset: Option<Time>,
    pub label: String,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    cache: OnceCell<Stacked>,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    resolved_offset: Cell<Option<Time>>,
}
impl Chain {
    pub fn new<I: Into<Item>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
    pub fn with_offset(mut self, offset: Time) -> Self {
        self.offset = Some(offset);
        self
    }
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn offset(&self) -> Option<Time> {
        self.offset
    }
    /// Own offset is not part of the own cache, so nothing is invalidated
    /// here. The parent is invalidated by the `&mut` path leading here.
    pub fn set_offset(&mut self, offset: Option<Time>) {
        self.offset = offset;
    }
    pub fn items(&self) -> &[Item] {
        &self.items
    }
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn is_dirty(&self) -> bool {
        self.cache.get().is_none()
    }

    pub(crate) fn invalidate(&mut self) {
        if self.cache.take().is_some() {
            log::trace!("chain '{}' marked dirty", self.label);
        }
    }
    pub fn item_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.invalidate();
        self.items.get_mut(index)
    }
    pub fn items_mut(&mut self) -> &mut Vec<Item> {
        self.invalidate();
        &mut self.items
    }
    pub fn append(&mut self, item: impl Into<Item>) {
        self.invalidate();
        self.items.push(item.into());
    }
    pub fn extend<I: Into<Item>>(&mut self, items: impl IntoIterator<Item = I>) {
        self.invalidate();
        self.items.extend(items.into_iter().map(Into::into));
    }
    pub fn insert(
        &mut self,
        index: usize,
        item: impl Into<Item>,
    ) -> ChainResult<()> {
        if index > self.items.len() {
            return Err(ChainError::InvalidPath(vec![index]));
        }
        self.invalidate();
        self.items.insert(index, item.into());
        Ok(())
    }
    pub fn remove(&mut self, index: usize) -> ChainResult<Item> {
        if index >= self.items.len() {
            return Err(ChainError::InvalidPath(vec![index]));
        }
        self.invalidate();
        Ok(self.items.remove(index))
    }
    pub(crate) fn set_items(&mut self, items: Vec<Item>) {
        self.invalidate();
        self.items = items;
    }

    fn stacked(&self) -> ChainResult<&Stacked> {
        self.cache.get_or_try_init(|| self.stack_items())
    }

    /// Single left-to-right pass. Explicit offsets move the cursor
    /// forward, never back.
    fn stack_items(&self) -> ChainResult<Stacked> {
        let mut now = zero();
        let mut offsets = Vec::with_capacity(self.items.len());
        for item in self.items.iter() {
            if let Some(offset) = item.offset() {
                if offset < now {
                    return Err(ChainError::Overlap {
                        item: item.to_string(),
                        offset,
                        cursor: now,
                    });
                }
                now = offset;
            }
            item.set_resolved_offset(Some(now));
            offsets.push(now);
            now += item.dur()?;
        }
        log::debug!(
            "stacked chain '{}': {} items, dur: {}",
            self.label,
            offsets.len(),
            show_time(now)
        );
        Ok(Stacked { dur: now, offsets })
    }

    /// Run the stacking pass if the chain is dirty.
    pub fn update(&self) -> ChainResult<()> {
        self.stacked().map(|_| ())
    }

    /// Total duration of stacked items (own offset not included).
    pub fn dur(&self) -> ChainResult<Time> {
        Ok(self.stacked()?.dur)
    }

    /// Make every offset explicit, recursively.
    ///
    /// # Returns
    /// Total duration of the chain.
    pub fn stack(&mut self) -> ChainResult<Time> {
        let Stacked { dur, offsets } = self.stacked()?.clone();
        // Explicit offsets equal to resolved ones leave the cache valid.
        for (item, offset) in self.items.iter_mut().zip(offsets) {
            item.set_offset(Some(offset));
            if let Item::Chain(ch) = item {
                ch.stack()?;
            }
        }
        Ok(dur)
    }

    /// Offset computed by the last stacking pass of the parent.
    pub fn resolved_offset(&self) -> Option<Time> {
        self.resolved_offset.get()
    }
    /// Explicit offset, else resolved, else 0.
    pub fn rel_offset(&self) -> Time {
        self.offset
            .or_else(|| self.resolved_offset.get())
            .unwrap_or_else(zero)
    }
    /// Absolute offset of this chain, taken as the root of its tree.
    pub fn abs_offset(&self) -> Time {
        self.offset.unwrap_or_else(zero)
    }
    /// Offset of the child at `index`, relative to this chain.
    pub fn child_offset(&self, index: usize) -> ChainResult<Time> {
        let stacked = self.stacked()?;
        stacked
            .offsets
            .get(index)
            .copied()
            .ok_or_else(|| ChainError::InvalidPath(vec![index]))
    }

    /// Absolute offset of the item at `path` (indices from this chain).
    ///
    /// # Example
    /// ```
    /// # use score_chain::primitives::{beats, Chain, Event, Item};
    /// let chain = Chain::new(vec![
    ///     Item::from(Event::note(60.0, beats(1, 1))),
    ///     Chain::new(vec![
    ///         Event::note(62.0, beats(1, 2)),
    ///         Event::note(64.0, beats(1, 2)),
    ///     ])
    ///     .with_offset(beats(2, 1))
    ///     .into(),
    /// ])
    /// .with_offset(beats(1, 1));
    /// assert_eq!(chain.abs_offset_of(&[1, 1]).unwrap(), beats(7, 2));
    /// ```
    pub fn abs_offset_of(&self, path: &[usize]) -> ChainResult<Time> {
        let mut frame = self.abs_offset();
        let mut chain = self;
        for (depth, &index) in path.iter().enumerate() {
            let item = chain
                .items
                .get(index)
                .ok_or_else(|| ChainError::InvalidPath(path.to_vec()))?;
            frame += chain.stacked()?.offsets[index];
            if depth + 1 < path.len() {
                chain = item.as_chain().ok_or_else(|| {
                    ChainError::StructuralType {
                        expected: "chain",
                        index,
                        found: item.to_string(),
                    }
                })?;
            }
        }
        Ok(frame)
    }
    pub fn item_at_path(&self, path: &[usize]) -> ChainResult<&Item> {
        let (&last, parents) = path
            .split_last()
            .ok_or_else(|| ChainError::InvalidPath(path.to_vec()))?;
        let mut chain = self;
        for &index in parents {
            chain = match chain.items.get(index) {
                Some(Item::Chain(ch)) => ch,
                Some(other) => {
                    return Err(ChainError::StructuralType {
                        expected: "chain",
                        index,
                        found: other.to_string(),
                    })
                }
                None => return Err(ChainError::InvalidPath(path.to_vec())),
            };
        }
        chain
            .items
            .get(last)
            .ok_or_else(|| ChainError::InvalidPath(path.to_vec()))
    }
    /// Mutable access to a nested item. Every chain on the way is
    /// marked dirty.
    pub fn item_at_path_mut(
        &mut self,
        path: &[usize],
    ) -> ChainResult<&mut Item> {
        let (&last, parents) = path
            .split_last()
            .ok_or_else(|| ChainError::InvalidPath(path.to_vec()))?;
        let mut chain = self;
        for &index in parents {
            chain.invalidate();
            chain = match chain.items.get_mut(index) {
                Some(Item::Chain(ch)) => ch,
                Some(other) => {
                    return Err(ChainError::StructuralType {
                        expected: "chain",
                        index,
                        found: other.to_string(),
                    })
                }
                None => return Err(ChainError::InvalidPath(path.to_vec())),
            };
        }
        chain.invalidate();
        chain
            .items
            .get_mut(last)
            .ok_or_else(|| ChainError::InvalidPath(path.to_vec()))
    }
    pub fn event_at_path(&self, path: &[usize]) -> ChainResult<&Event> {
        let item = self.item_at_path(path)?;
        item.as_event().ok_or_else(|| ChainError::StructuralType {
            expected: "event",
            index: path.last().copied().unwrap_or_default(),
            found: item.to_string(),
        })
    }
    pub fn event_at_path_mut(
        &mut self,
        path: &[usize],
    ) -> ChainResult<&mut Event> {
        let index = path.last().copied().unwrap_or_default();
        match self.item_at_path_mut(path)? {
            Item::Event(ev) => Ok(ev),
            other => Err(ChainError::StructuralType {
                expected: "event",
                index,
                found: other.to_string(),
            }),
        }
    }

    pub fn next_item(&self, index: usize) -> Option<&Item> {
        self.items.get(index + 1)
    }
    pub fn previous_item(&self, index: usize) -> Option<&Item> {
        index.checked_sub(1).and_then(|idx| self.items.get(idx))
    }
    /// Event following the item at `index`. If the next item is a
    /// chain, its first event.
    pub fn next_event(&self, index: usize) -> Option<&Event> {
        match self.next_item(index)? {
            Item::Event(ev) => Some(ev),
            Item::Chain(ch) => ch.first_event(),
        }
    }
    pub fn previous_event(&self, index: usize) -> Option<&Event> {
        match self.previous_item(index)? {
            Item::Event(ev) => Some(ev),
            Item::Chain(ch) => ch.last_event(),
        }
    }

    /// Consistency check of the whole tree, bypassing caches.
    ///
    /// Every event has a duration and explicit offsets never go back in
    /// time, at any level.
    pub fn check(&self) -> ChainResult<()> {
        let fresh = self.stack_items()?;
        if let Some(cached) = self.cache.get() {
            if *cached != fresh {
                return Err(ChainError::InvalidArgument(format!(
                    "stale stacking cache in chain '{}'",
                    self.label
                )));
            }
        }
        for item in self.items.iter() {
            if let Item::Chain(ch) = item {
                ch.check()?;
            }
        }
        Ok(())
    }

    /// Multiline dump with absolute beat, offset and duration of every
    /// item. Offsets in parenthesis are implicit.
    pub fn dump(&self) -> ChainResult<String> {
        let mut rows = Vec::new();
        self.dump_rows(0, self.abs_offset(), &mut rows)?;
        Ok(rows.join("\n"))
    }
    fn dump_rows(
        &self,
        indents: usize,
        now: Time,
        rows: &mut Vec<String>,
    ) -> ChainResult<()> {
        let ind = "  ".repeat(indents);
        let self_start = match self.offset {
            Some(offset) => show_time(offset),
            None => "None".to_string(),
        };
        let mut header = format!(
            "{ind}Chain -- beat: {}, offset: {self_start}, dur: {}",
            show_time(now),
            show_time(self.dur()?)
        );
        if !self.label.is_empty() {
            header.push_str(&format!(", label: {}", self.label));
        }
        rows.push(header);
        rows.push(format!("{ind}  beat   offset  dur    item"));
        let offsets = self.stacked()?.offsets.clone();
        for (item, offset) in self.items.iter().zip(offsets) {
            match item {
                Item::Event(ev) => {
                    let offset_str = match ev.offset() {
                        Some(explicit) => show_time(explicit),
                        None => format!("({})", show_time(offset)),
                    };
                    rows.push(format!(
                        "{ind}  {:<7}{:<8}{:<7}{}",
                        show_time(now + offset),
                        offset_str,
                        show_time(ev.dur()?),
                        ev
                    ));
                }
                Item::Chain(ch) => ch.dump_rows(indents + 1, now + offset, rows)?,
            }
        }
        Ok(())
    }
}
impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<String> =
            self.items.iter().take(10).map(|item| item.to_string()).collect();
        write!(f, "Chain([{}", shown.join(", "))?;
        if self.items.len() > 10 {
            write!(f, ", …")?;
        }
        write!(f, "]")?;
        if let Some(offset) = self.offset {
            write!(f, ", offset={}", show_time(offset))?;
        }
        write!(f, ")")
    }
}
