//! Code-text entries: abbreviations and varia triggers

use super::reader::{compare, SimpleReader, StringReverseReader};
use super::search::Coded;
use super::varia::{GroupSwitch, KeptCode};
use crate::connection::EditorSink;
use tracing::debug;

/// What an entry does once its code was typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Replaces the typed code with `expanded`
    ShortCut { expanded: String },

    /// Selects group `group` of varia `varia`
    Varia {
        varia: String,
        group: usize,
        keep_code: bool,
    },
}

/// A trigger string of the code-text index
///
/// Entries are immutable once built. Lists hold them behind `Arc` so the
/// active index can share them with the collection that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    code: String,
    kind: EntryKind,
}

impl Entry {
    pub fn short_cut(code: impl Into<String>, expanded: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind: EntryKind::ShortCut {
                expanded: expanded.into(),
            },
        }
    }

    pub fn varia(
        code: impl Into<String>,
        varia: impl Into<String>,
        group: usize,
        keep_code: bool,
    ) -> Self {
        Self {
            code: code.into(),
            kind: EntryKind::Varia {
                varia: varia.into(),
                group,
                keep_code,
            },
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// Length of the code in characters
    pub fn code_length(&self) -> usize {
        self.code.chars().count()
    }

    pub fn code_reader(&self) -> StringReverseReader<'_> {
        StringReverseReader::new(&self.code)
    }

    /// Compares the typed text against this entry's code, see [`compare`]
    pub fn compare<R: SimpleReader + ?Sized>(&self, text: &mut R, max_length: Option<usize>) -> i32 {
        compare(text, &mut self.code_reader(), max_length)
    }

    /// Performs the entry's effect on the editor
    ///
    /// A varia entry only edits the text here; the group switch it returns has
    /// to be applied to the owning processor.
    pub fn activate<S: EditorSink + ?Sized>(&self, sink: &mut S) -> Option<GroupSwitch> {
        match &self.kind {
            EntryKind::ShortCut { expanded } => {
                debug!("Expanding shortcut {:?} to {:?}", self.code, expanded);
                sink.change_string_before_cursor(self.code_length(), expanded);
                None
            }
            EntryKind::Varia {
                varia,
                group,
                keep_code,
            } => {
                let kept = if *keep_code {
                    Some(KeptCode {
                        counter: sink.get_process_counter(),
                        length: self.code_length(),
                    })
                } else {
                    sink.delete_char_before_cursor(self.code_length());
                    None
                };
                debug!(
                    "Varia code {:?} selects group {} of {:?} (kept: {:?})",
                    self.code, group, varia, kept
                );
                Some(GroupSwitch {
                    varia: varia.clone(),
                    group: *group,
                    kept,
                })
            }
        }
    }
}

impl Coded for Entry {
    fn code(&self) -> &str {
        &self.code
    }
}
