//! Varias: families of interchangeable legends, one group active at a time

use super::entry::Entry;
use super::error::CodeTextError;
use tracing::{debug, warn};

/// Text sent by a varia button plus the title drawn on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariaLegend {
    text: String,
    title: Option<String>,
}

impl VariaLegend {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Title, falling back to the text itself
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.text)
    }
}

/// Legends selected together by one trigger code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariaGroup {
    code: String,
    legends: Vec<VariaLegend>,
}

impl VariaGroup {
    pub fn new(code: impl Into<String>, legends: Vec<VariaLegend>) -> Self {
        Self {
            code: code.into(),
            legends,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn legend(&self, index: usize) -> Option<&VariaLegend> {
        self.legends.get(index)
    }

    pub fn len(&self) -> usize {
        self.legends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legends.is_empty()
    }
}

/// Deletable code left in the editor by a varia that keeps its code
///
/// Only valid while the editor's process counter still equals `counter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeptCode {
    pub counter: u64,
    pub length: usize,
}

/// Effect of an activated varia entry on its varia
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSwitch {
    pub varia: String,
    pub group: usize,
    pub kept: Option<KeptCode>,
}

/// A family of groups with one active group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varia {
    keep_code: bool,
    groups: Vec<VariaGroup>,
    active: usize,
    kept: Option<KeptCode>,
}

impl Varia {
    pub fn new(keep_code: bool) -> Self {
        Self {
            keep_code,
            groups: Vec::new(),
            active: 0,
            kept: None,
        }
    }

    /// Adds a group; trigger codes are unique inside one varia
    pub fn add_group(&mut self, group: VariaGroup) -> Result<(), CodeTextError> {
        if self.groups.iter().any(|known| known.code == group.code) {
            return Err(CodeTextError::DuplicateCode(group.code));
        }
        self.groups.push(group);
        Ok(())
    }

    pub fn with_group(mut self, group: VariaGroup) -> Result<Self, CodeTextError> {
        self.add_group(group)?;
        Ok(self)
    }

    pub fn keep_code(&self) -> bool {
        self.keep_code
    }

    pub fn groups(&self) -> &[VariaGroup] {
        &self.groups
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_group(&self) -> Option<&VariaGroup> {
        self.groups.get(self.active)
    }

    /// Legend at `index` of the active group
    pub fn legend(&self, index: usize) -> Option<&VariaLegend> {
        self.active_group().and_then(|group| group.legend(index))
    }

    /// One entry per group, triggering that group
    pub fn entries<'a>(&'a self, id: &'a str) -> impl Iterator<Item = Entry> + 'a {
        self.groups
            .iter()
            .enumerate()
            .map(move |(index, group)| Entry::varia(group.code(), id, index, self.keep_code))
    }

    pub fn select(&mut self, group: usize, kept: Option<KeptCode>) {
        if group >= self.groups.len() {
            warn!("Varia group {} out of range ({} groups)", group, self.groups.len());
            return;
        }
        debug!("Varia group {} selected", group);
        self.active = group;
        self.kept = kept;
    }

    pub fn kept_code(&self) -> Option<KeptCode> {
        self.kept
    }

    pub fn take_kept_code(&mut self) -> Option<KeptCode> {
        self.kept.take()
    }
}
