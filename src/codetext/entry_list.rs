//! Sorted collections of code-text entries

use super::entry::Entry;
use super::error::CodeTextError;
use super::reader::{compare_codes, SimpleReader};
use super::search::{longest_match, shortest_match};
use std::sync::Arc;
use tracing::{debug, warn};

/// Insertion-ordered entries, sorted once into suffix order and then searched
///
/// Lookups require the list to be sorted. Adding entries drops the sorted
/// flag until the next [`EntryList::sort`].
#[derive(Debug, Clone, Default)]
pub struct EntryList {
    entries: Vec<Arc<Entry>>,
    sorted: bool,
    // Built from other lists by `set_of`
    set: bool,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Aggregates base lists into one sorted set
    ///
    /// Sets are flat: a set never aggregates another set.
    pub fn set_of<'a, I>(lists: I) -> Result<Self, CodeTextError>
    where
        I: IntoIterator<Item = (&'a str, &'a EntryList)>,
    {
        let mut set = EntryList::new();
        for (id, list) in lists {
            if list.is_set() {
                return Err(CodeTextError::NestedSet(id.to_string()));
            }
            set.extend_from(list);
        }
        set.sort();
        set.set = true;
        Ok(set)
    }

    pub fn add(&mut self, entry: Entry) {
        self.add_shared(Arc::new(entry));
    }

    pub fn add_shared(&mut self, entry: Arc<Entry>) {
        if entry.code().is_empty() {
            warn!("Ignoring entry with empty code: {:?}", entry.kind());
            return;
        }
        self.entries.push(entry);
        self.sorted = false;
    }

    /// Shares every entry of `other`
    pub fn extend_from(&mut self, other: &EntryList) {
        if other.is_empty() {
            return;
        }
        self.entries.extend(other.entries.iter().cloned());
        self.sorted = false;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.sorted = true;
    }

    /// Sorts into suffix order; equal codes keep their insertion order
    pub fn sort(&mut self) {
        if !self.sorted {
            self.entries
                .sort_by(|first, second| compare_codes(first.code(), second.code()));
            self.sorted = true;
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted || self.entries.is_empty()
    }

    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.iter()
    }

    /// Longest entry whose code ends the text read backward from `text`
    pub fn look_up_longest<R: SimpleReader + ?Sized>(&self, text: &mut R) -> Option<&Arc<Entry>> {
        if !self.checked_sorted() {
            return None;
        }
        let found = longest_match(&self.entries, text).map(|index| &self.entries[index]);
        debug!("Longest code-text match: {:?}", found.map(|entry| entry.code()));
        found
    }

    /// Shortest entry whose code ends the text read backward from `text`
    pub fn look_up_shortest<R: SimpleReader + ?Sized>(&self, text: &mut R) -> Option<&Arc<Entry>> {
        if !self.checked_sorted() {
            return None;
        }
        let found = shortest_match(&self.entries, text).map(|index| &self.entries[index]);
        debug!("Shortest code-text match: {:?}", found.map(|entry| entry.code()));
        found
    }

    fn checked_sorted(&self) -> bool {
        debug_assert!(self.is_sorted(), "lookup on an unsorted entry list");
        if !self.is_sorted() {
            warn!("Lookup on an unsorted entry list skipped");
            return false;
        }
        true
    }
}

impl PartialEq for EntryList {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(first, second)| first == second)
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a Arc<Entry>;
    type IntoIter = std::slice::Iter<'a, Arc<Entry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
