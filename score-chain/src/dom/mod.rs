//! Voices: chains pinned to the score start, one staff each.
//!
//! A [`Voice`] reads like a [`Chain`] through `Deref`. Mutation goes
//! through its own methods, so its offset can not leave 0.
use std::{
    collections::BTreeMap,
    fmt,
    ops::Deref,
    rc::{Rc, Weak},
    sync::atomic::{AtomicUsize, Ordering},
};

use derivative::Derivative;

use crate::{
    error::ChainResult,
    primitives::{time_map::ScoreStruct, zero, Chain, Event, Item, Time},
    settings::{validate_config, ConfigValue, Settings},
};

static GROUP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Voices shown within one staff group.
#[derive(Debug, PartialEq, Clone)]
pub struct PartGroup {
    pub name: String,
    pub shortname: String,
    /// If false, only the group name is shown.
    pub show_part_names: bool,
    pub group_id: String,
}
impl PartGroup {
    pub fn new(
        name: impl Into<String>,
        shortname: impl Into<String>,
        show_part_names: bool,
    ) -> Rc<Self> {
        let id = GROUP_COUNTER.fetch_add(1, Ordering::Relaxed);
        Rc::new(Self {
            name: name.into(),
            shortname: shortname.into(),
            show_part_names,
            group_id: format!("group-{id}"),
        })
    }
    /// Attach all `voices` to a new group.
    pub fn make_group(
        voices: &mut [Voice],
        name: impl Into<String>,
        shortname: impl Into<String>,
        show_part_names: bool,
    ) -> Rc<Self> {
        let group = Self::new(name, shortname, show_part_names);
        for voice in voices.iter_mut() {
            voice.set_group(&group);
        }
        group
    }
}

#[derive(Derivative, Clone, Default)]
#[derivative(Debug, PartialEq)]
pub struct Voice {
    chain: Chain,
    pub name: String,
    pub shortname: String,
    pub max_staves: usize,
    config: BTreeMap<String, ConfigValue>,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    group: Option<Weak<PartGroup>>,
}
impl Deref for Voice {
    type Target = Chain;
    fn deref(&self) -> &Self::Target {
        &self.chain
    }
}
impl Voice {
    /// # Example
    /// ```
    /// use score_chain::{dom::Voice, primitives::{beats, Event}};
    ///
    /// let voice = Voice::new(
    ///     vec![Event::note(60.0, beats(1, 1)).with_offset(beats(1, 1))],
    ///     "flute",
    /// );
    /// assert_eq!(voice.abs_offset(), beats(0, 1));
    /// assert_eq!(voice.dur().unwrap(), beats(2, 1));
    /// ```
    pub fn new<I: Into<Item>>(
        items: impl IntoIterator<Item = I>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            chain: Chain::new(items),
            name: name.into(),
            max_staves: Settings::default().voice_max_staves,
            ..Default::default()
        }
    }
    /// Take over the items of `chain`. Its own offset is moved into the
    /// items.
    pub fn from_chain(chain: Chain) -> ChainResult<Self> {
        let name = chain.label.clone();
        let mut voice = Self {
            chain,
            name,
            max_staves: Settings::default().voice_max_staves,
            ..Default::default()
        };
        voice.bake_offset()?;
        Ok(voice)
    }
    pub fn with_shortname(mut self, shortname: impl Into<String>) -> Self {
        self.shortname = shortname.into();
        self
    }
    pub fn with_max_staves(mut self, max_staves: usize) -> Self {
        self.max_staves = max_staves;
        self
    }
    pub fn chain(&self) -> &Chain {
        &self.chain
    }
    pub fn into_chain(self) -> Chain {
        self.chain
    }

    fn bake_offset(&mut self) -> ChainResult<()> {
        let offset = self.chain.abs_offset();
        self.chain.set_offset(None);
        if offset == zero() {
            return Ok(());
        }
        log::debug!("voice '{}': moving offset into items", self.name);
        self.chain.update()?;
        for item in self.chain.items_mut().iter_mut() {
            item.shift_in_place(offset)?;
        }
        self.chain.remove_redundant_offsets()
    }

    pub fn append(&mut self, item: impl Into<Item>) {
        self.chain.append(item)
    }
    pub fn extend<I: Into<Item>>(&mut self, items: impl IntoIterator<Item = I>) {
        self.chain.extend(items)
    }
    pub fn insert(
        &mut self,
        index: usize,
        item: impl Into<Item>,
    ) -> ChainResult<()> {
        self.chain.insert(index, item)
    }
    pub fn remove(&mut self, index: usize) -> ChainResult<Item> {
        self.chain.remove(index)
    }
    pub fn item_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.chain.item_mut(index)
    }
    pub fn items_mut(&mut self) -> &mut Vec<Item> {
        self.chain.items_mut()
    }
    pub fn event_at_path_mut(
        &mut self,
        path: &[usize],
    ) -> ChainResult<&mut Event> {
        self.chain.event_at_path_mut(path)
    }
    pub fn stack(&mut self) -> ChainResult<Time> {
        self.chain.stack()
    }
    pub fn fill_gaps(&mut self, recurse: bool) -> ChainResult<()> {
        self.chain.fill_gaps(recurse)
    }
    pub fn remove_redundant_offsets(&mut self) -> ChainResult<()> {
        self.chain.remove_redundant_offsets()
    }
    pub fn merge_tied_events(&mut self) -> ChainResult<()> {
        self.chain.merge_tied_events()
    }
    pub fn split_events_at_offsets(
        &mut self,
        offsets: &[Time],
        tie: bool,
    ) -> ChainResult<()> {
        self.chain.split_events_at_offsets(offsets, tie)
    }
    pub fn split_events_at_measures<S: ScoreStruct + ?Sized>(
        &mut self,
        score: &S,
        start: usize,
        stop: Option<usize>,
    ) -> ChainResult<()> {
        self.chain.split_events_at_measures(score, start, stop)
    }
    pub fn resolve_glissandi(&mut self, force: bool) {
        self.chain.resolve_glissandi(force)
    }
    /// Shift the content. The voice itself stays at 0; whatever would
    /// fall before it is clamped.
    pub fn time_shift_in_place(&mut self, delta: Time) -> ChainResult<()> {
        self.chain.time_shift_in_place(delta)?;
        self.bake_offset()
    }
    pub fn time_shift(&self, delta: Time) -> ChainResult<Self> {
        let mut out = self.clone();
        out.time_shift_in_place(delta)?;
        Ok(out)
    }

    /// Override a rendering option for this voice only.
    ///
    /// Only `quant.*` and `show.*` keys are known.
    pub fn set_config(
        &mut self,
        key: &str,
        value: impl Into<ConfigValue>,
    ) -> ChainResult<&mut Self> {
        let value = validate_config(key, value.into())?;
        self.config.insert(key.to_string(), value);
        Ok(self)
    }
    pub fn get_config(&self, key: &str) -> Option<&ConfigValue> {
        self.config.get(key)
    }
    pub fn config(&self) -> &BTreeMap<String, ConfigValue> {
        &self.config
    }
    /// Shortcut for the quantization options.
    pub fn config_quantization(
        &mut self,
        break_syncopations_level: Option<&str>,
    ) -> ChainResult<()> {
        if let Some(level) = break_syncopations_level {
            self.set_config("quant.breakSyncopationsLevel", level)?;
        }
        Ok(())
    }

    pub fn set_group(&mut self, group: &Rc<PartGroup>) {
        self.group = Some(Rc::downgrade(group));
    }
    /// None if no group was set or it is already dropped.
    pub fn group(&self) -> Option<Rc<PartGroup>> {
        self.group.as_ref().and_then(Weak::upgrade)
    }
}
impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<String> = self
            .chain
            .items()
            .iter()
            .take(10)
            .map(|item| item.to_string())
            .collect();
        write!(f, "Voice([{}", shown.join(", "))?;
        if self.chain.len() > 10 {
            write!(f, ", …")?;
        }
        write!(f, "]")?;
        if !self.name.is_empty() {
            write!(f, ", name='{}'", self.name)?;
        }
        write!(f, ")")
    }
}

impl Chain {
    /// Copy of this chain as a voice named by its label.
    ///
    /// All offsets are made explicit and shifted by the own offset of
    /// the chain. With `remove_offsets`, redundant ones are cleared
    /// afterwards.
    pub fn as_voice(&self, remove_offsets: bool) -> ChainResult<Voice> {
        let mut chain = self.clone();
        chain.stack()?;
        let offset = chain.abs_offset();
        chain.set_offset(None);
        if offset != zero() {
            for item in chain.items_mut().iter_mut() {
                let item_offset = item.offset().unwrap_or_else(zero);
                item.set_offset(Some(item_offset + offset));
            }
        }
        if remove_offsets {
            chain.remove_redundant_offsets()?;
        }
        Ok(Voice {
            name: chain.label.clone(),
            chain,
            max_staves: Settings::default().voice_max_staves,
            ..Default::default()
        })
    }
}
