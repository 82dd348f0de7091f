//! Code-text index
//!
//! Typed trigger strings ("codes") are recognised at the end of the text
//! before the cursor. Shortcut entries expand into longer text, varia entries
//! switch the active legend group of a varia. All entries live in one list
//! sorted in suffix order, so the longest (or shortest) code ending the typed
//! text is found by a binary search that reads the text backward.

pub mod entry;
pub mod entry_list;
pub mod error;
pub mod modify;
pub mod processor;
pub mod reader;
pub mod search;
pub mod varia;

pub use entry::{Entry, EntryKind};
pub use entry_list::EntryList;
pub use error::CodeTextError;
pub use modify::{ModifyText, RollHit};
pub use processor::{CodeTextProcessor, CodeTextState, Collecting, Ready};
pub use reader::{compare, compare_codes, SimpleReader, StringReverseReader};
pub use varia::{GroupSwitch, KeptCode, Varia, VariaGroup, VariaLegend};
