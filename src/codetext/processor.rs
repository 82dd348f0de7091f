//! Code-text processor with statum lifecycle
//!
//! Owns every varia and shortcut collection and the one index that is
//! searched while typing.
//!
//! # State Machine
//!
//! ```text
//! Collecting ──(init)──► Ready
//! ```
//!
//! While `Collecting` the loader registers varias, shortcut lists and sets.
//! `init` builds the permanent index once; only a `Ready` processor can be
//! searched or switch shortcut sets.

use super::entry::Entry;
use super::entry_list::EntryList;
use super::error::CodeTextError;
use super::reader::SimpleReader;
use super::varia::{GroupSwitch, KeptCode, Varia, VariaLegend};
use statum::{machine, state};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle states of the code-text processor
#[state]
#[derive(Debug, Clone)]
pub enum CodeTextState {
    Collecting, // Collections are being registered
    Ready,      // Index built, lookups allowed
}

#[machine]
pub struct CodeTextProcessor<S: CodeTextState> {
    varias: BTreeMap<String, Varia>,
    short_cuts: BTreeMap<String, EntryList>,
    // Varia entries, plus every shortcut list when no abbreviation key exists
    permanent_entries: EntryList,
    // The searched index: permanent entries plus the active shortcut set
    code_entries: EntryList,
    active_short_cut: Option<String>,
}

impl<S: CodeTextState> CodeTextProcessor<S> {
    pub fn varia(&self, id: &str) -> Option<&Varia> {
        self.varias.get(id)
    }

    pub fn short_cut(&self, id: &str) -> Option<&EntryList> {
        self.short_cuts.get(id)
    }

    pub fn short_cut_ids(&self) -> impl Iterator<Item = &str> {
        self.short_cuts.keys().map(String::as_str)
    }
}

impl CodeTextProcessor<Collecting> {
    pub fn create() -> Self {
        Self::new(
            BTreeMap::new(),
            BTreeMap::new(),
            EntryList::new(),
            EntryList::new(),
            None,
        )
    }

    pub fn add_varia(&mut self, id: impl Into<String>, varia: Varia) -> Result<(), CodeTextError> {
        let id = id.into();
        if varia.groups().is_empty() {
            return Err(CodeTextError::EmptyVaria(id));
        }
        if self.varias.contains_key(&id) {
            return Err(CodeTextError::DuplicateVaria(id));
        }
        debug!("Registered varia {:?} with {} groups", id, varia.groups().len());
        self.varias.insert(id, varia);
        Ok(())
    }

    pub fn add_short_cut_list(
        &mut self,
        id: impl Into<String>,
        mut list: EntryList,
    ) -> Result<(), CodeTextError> {
        let id = id.into();
        if self.short_cuts.contains_key(&id) {
            return Err(CodeTextError::DuplicateShortCut(id));
        }
        list.sort();
        debug!("Registered shortcut list {:?} with {} entries", id, list.len());
        self.short_cuts.insert(id, list);
        Ok(())
    }

    /// Registers `id` as the union of already registered base lists
    pub fn add_short_cut_set(
        &mut self,
        id: impl Into<String>,
        members: &[&str],
    ) -> Result<(), CodeTextError> {
        let id = id.into();
        if self.short_cuts.contains_key(&id) {
            return Err(CodeTextError::DuplicateShortCut(id));
        }

        let mut lists = Vec::with_capacity(members.len());
        for member in members {
            let list = self
                .short_cuts
                .get_key_value(*member)
                .ok_or_else(|| CodeTextError::UnknownShortCut(member.to_string()))?;
            lists.push((list.0.as_str(), list.1));
        }
        let set = EntryList::set_of(lists)?;

        debug!("Registered shortcut set {:?} from {:?}", id, members);
        self.short_cuts.insert(id, set);
        Ok(())
    }

    /// Builds the permanent index and moves to `Ready`
    ///
    /// `abbreviation_keys` holds the shortcut ids reachable from keys. Without
    /// any key every shortcut list is permanently searchable; with keys the
    /// index holds the varia entries only until a key starts a set.
    pub fn init(mut self, abbreviation_keys: &HashSet<String>) -> CodeTextProcessor<Ready> {
        let mut permanent = EntryList::new();
        for (id, varia) in &self.varias {
            for entry in varia.entries(id) {
                permanent.add(entry);
            }
        }

        if abbreviation_keys.is_empty() {
            for list in self.short_cuts.values().filter(|list| !list.is_set()) {
                permanent.extend_from(list);
            }
        } else {
            for key in abbreviation_keys {
                if !self.short_cuts.contains_key(key) {
                    warn!("Abbreviation key refers to unknown shortcut list {:?}", key);
                }
            }
        }
        permanent.sort();

        info!(
            "Code-text index ready: {} varias, {} shortcut lists, {} permanent entries",
            self.varias.len(),
            self.short_cuts.len(),
            permanent.len()
        );

        self.code_entries = permanent.clone();
        self.permanent_entries = permanent;
        self.active_short_cut = None;
        self.transition()
    }
}

impl CodeTextProcessor<Ready> {
    /// Makes shortcut set `id` searchable, superseding the active one
    pub fn start_abbreviation(&mut self, id: &str) {
        let Some(list) = self.short_cuts.get(id) else {
            warn!("Cannot start unknown shortcut set {:?}", id);
            return;
        };

        let mut entries = EntryList::with_capacity(self.permanent_entries.len() + list.len());
        entries.extend_from(&self.permanent_entries);
        entries.extend_from(list);
        entries.sort();

        info!("Shortcut set {:?} active ({} entries)", id, list.len());
        self.code_entries = entries;
        self.active_short_cut = Some(id.to_string());
    }

    /// Back to the permanent entries only
    pub fn stop_abbreviation(&mut self) {
        if let Some(id) = self.active_short_cut.take() {
            info!("Shortcut set {:?} stopped", id);
        }
        self.code_entries = self.permanent_entries.clone();
    }

    pub fn is_active_short_cut(&self, id: &str) -> bool {
        self.active_short_cut.as_deref() == Some(id)
    }

    pub fn active_short_cut(&self) -> Option<&str> {
        self.active_short_cut.as_deref()
    }

    pub fn code_entries(&self) -> &EntryList {
        &self.code_entries
    }

    pub fn look_up_longest<R: SimpleReader + ?Sized>(&self, text: &mut R) -> Option<Arc<Entry>> {
        self.code_entries.look_up_longest(text).cloned()
    }

    pub fn look_up_shortest<R: SimpleReader + ?Sized>(&self, text: &mut R) -> Option<Arc<Entry>> {
        self.code_entries.look_up_shortest(text).cloned()
    }

    /// Applies the effect of an activated varia entry
    pub fn apply(&mut self, switch: GroupSwitch) {
        match self.varias.get_mut(&switch.varia) {
            Some(varia) => varia.select(switch.group, switch.kept),
            None => warn!("Group switch for unknown varia {:?}", switch.varia),
        }
    }

    pub fn varia_legend(&self, id: &str, index: usize) -> Option<&VariaLegend> {
        self.varias.get(id).and_then(|varia| varia.legend(index))
    }

    pub fn kept_code(&self, id: &str) -> Option<KeptCode> {
        self.varias.get(id).and_then(Varia::kept_code)
    }

    pub fn take_kept_code(&mut self, id: &str) -> Option<KeptCode> {
        self.varias.get_mut(id).and_then(Varia::take_kept_code)
    }
}
