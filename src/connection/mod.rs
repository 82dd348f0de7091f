//! Editor-facing interfaces
//!
//! Three layers talk to the editor:
//!
//! ```text
//! Button / Packet ──► SoftBoardListener ──► SoftBoardService ──► Connection
//!                       (EditorSink)          (buffers, index)     (raw editor)
//! ```
//!
//! [`Connection`] is the raw editor. [`EditorSink`] is the narrow set of edits
//! the code-text index needs, [`SoftBoardListener`] adds everything buttons
//! and packets reach for. [`SoftBoardService`] implements both on top of a
//! connection.

pub mod scratch;
pub mod service;

pub use scratch::ScratchEditor;
pub use service::SoftBoardService;

use crate::board::{BoardTable, MetaState};
use crate::codetext::{KeptCode, VariaLegend};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use tracing::warn;

/// Hard key codes, numbered as Android's `KeyEvent` does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const DPAD_UP: KeyCode = KeyCode(19);
    pub const DPAD_DOWN: KeyCode = KeyCode(20);
    pub const DPAD_LEFT: KeyCode = KeyCode(21);
    pub const DPAD_RIGHT: KeyCode = KeyCode(22);
    pub const TAB: KeyCode = KeyCode(61);
    pub const SPACE: KeyCode = KeyCode(62);
    pub const ENTER: KeyCode = KeyCode(66);
    pub const DEL: KeyCode = KeyCode(67);
    pub const ESCAPE: KeyCode = KeyCode(111);
    pub const FORWARD_DEL: KeyCode = KeyCode(112);
    pub const MOVE_HOME: KeyCode = KeyCode(122);
    pub const MOVE_END: KeyCode = KeyCode(123);
}

/// Modifier flags sent along with hard keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetaFlags(pub u32);

impl MetaFlags {
    pub const NONE: MetaFlags = MetaFlags(0);
    pub const SHIFT: MetaFlags = MetaFlags(0x1);
    pub const ALT: MetaFlags = MetaFlags(0x2);
    pub const CTRL: MetaFlags = MetaFlags(0x1000);

    pub fn contains(self, other: MetaFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MetaFlags {
    type Output = MetaFlags;

    fn bitor(self, rhs: MetaFlags) -> MetaFlags {
        MetaFlags(self.0 | rhs.0)
    }
}

/// Spacing rules applied around sent text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoSpace(pub u8);

impl AutoSpace {
    pub const NONE: AutoSpace = AutoSpace(0);
    /// Insert a space unless the text before the cursor already ends in one
    pub const BEFORE: AutoSpace = AutoSpace(0x1);
    /// Append a space after the text
    pub const AFTER: AutoSpace = AutoSpace(0x2);
    /// Remove spaces directly before the cursor
    pub const ERASE_BEFORE: AutoSpace = AutoSpace(0x4);

    pub fn contains(self, other: AutoSpace) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AutoSpace {
    type Output = AutoSpace;

    fn bitor(self, rhs: AutoSpace) -> AutoSpace {
        AutoSpace(self.0 | rhs.0)
    }
}

/// Selection in characters from the start of the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn cursor(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextAction {
    SelectAll,
    Copy,
    Cut,
    Paste,
}

/// Cursor movements computed from the cached text around the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    CharLeft,
    CharRight,
    WordLeft,
    WordRight,
    LineStart,
    LineEnd,
}

/// Haptic tier requested by a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Primary,
    Secondary,
}

/// Raw editor connection
///
/// Mirrors what an input method gets from its host editor. Every edit acts at
/// the cursor; offsets and lengths are counted in characters.
pub trait Connection: Send {
    fn commit_text(&mut self, text: &str) -> bool;

    fn delete_surrounding_text(&mut self, before: usize, after: usize) -> bool;

    fn send_key_event(&mut self, code: KeyCode, meta: MetaFlags) -> bool;

    fn text_before_cursor(&mut self, limit: usize) -> Option<String>;

    fn text_after_cursor(&mut self, limit: usize) -> Option<String>;

    fn selection(&mut self) -> Option<Selection>;

    fn set_selection(&mut self, start: usize, end: usize) -> bool;

    fn perform_context_action(&mut self, action: ContextAction) -> bool;

    fn launch_application(&mut self, package: &str) -> bool {
        warn!("Connection cannot launch {:?}", package);
        false
    }
}

/// Edits the code-text index and modify rolls perform
pub trait EditorSink {
    fn send_string(&mut self, text: &str, auto_space: AutoSpace);

    fn send_key_down_up(&mut self, code: KeyCode);

    fn delete_char_before_cursor(&mut self, count: usize);

    /// Deletes `delete_length` characters before the cursor and sends `text`
    fn change_string_before_cursor(&mut self, delete_length: usize, text: &str);

    fn get_text_before_cursor(&mut self, limit: usize) -> Option<String>;

    fn get_text_after_cursor(&mut self, limit: usize) -> Option<String>;

    /// Removes the last sent string if nothing was edited since
    ///
    /// A string rewritten by an expansion comes back first, the typed one
    /// goes on the next call.
    fn undo_last_string(&mut self) -> bool;

    /// Like [`undo_last_string`](Self::undo_last_string), but also takes back
    /// whatever the string expanded into
    fn undo_sent_string(&mut self) -> bool {
        self.undo_last_string()
    }

    /// Monotonic counter, advanced by every edit
    fn get_process_counter(&self) -> u64;

    fn check_process_counter(&self, counter: u64) -> bool {
        self.get_process_counter() == counter
    }

    fn is_store_text_enabled(&self) -> bool;
}

/// Everything buttons and packets need from the keyboard
pub trait SoftBoardListener: EditorSink {
    fn delete_char_after_cursor(&mut self, count: usize);

    fn meta_state(&self) -> &MetaState;

    fn meta_state_mut(&mut self) -> &mut MetaState;

    fn board_table(&self) -> &BoardTable;

    fn board_table_mut(&mut self) -> &mut BoardTable;

    /// A packet finished: one-shot metas are consumed
    fn packet_released(&mut self);

    fn start_storing_text(&mut self);

    /// Stops capturing and hands out the text sent meanwhile
    fn stop_storing_text(&mut self) -> String;

    fn feedback(&mut self, _feedback: Feedback) {}

    fn varia_legend(&self, varia: &str, index: usize) -> Option<VariaLegend>;

    fn take_kept_code(&mut self, varia: &str) -> Option<KeptCode>;

    /// Starts shortcut set `id`, or stops it when it is the active one
    fn toggle_abbreviation(&mut self, id: &str);

    fn is_active_short_cut(&self, id: &str) -> bool;

    /// Cycles the text before the cursor through the modify rolls
    fn modify_text(&mut self, reverse: bool) -> bool;

    fn move_cursor(&mut self, movement: Movement, select: bool) -> bool;

    fn context_action(&mut self, action: ContextAction) -> bool;

    fn launch(&mut self, package: &str) -> bool;

    /// Drops the cached text around the cursor
    fn invalidate_text(&mut self);
}

/// Test double recording every edit it receives
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        SendString(String, AutoSpace),
        SendKey(KeyCode),
        DeleteCharBeforeCursor(usize),
        DeleteCharAfterCursor(usize),
        ChangeStringBeforeCursor(usize, String),
        UndoLastString,
        PacketReleased,
        Feedback(Feedback),
        ToggleAbbreviation(String),
        Modify(bool),
        MoveCursor(Movement, bool),
        ContextAction(ContextAction),
        Launch(String),
        InvalidateText,
    }

    /// Editor with the cursor always at the end of `text`
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls: Vec<Call>,
        pub process_counter: u64,
        pub text: String,
        pub meta: MetaState,
        pub boards: BoardTable,
        pub legends: HashMap<(String, usize), VariaLegend>,
        pub kept: HashMap<String, KeptCode>,
        pub active_short_cut: Option<String>,
        pub stored: Option<String>,
        // Length of the last sent string while it can still be undone
        pub last_string: Option<(u64, usize)>,
    }

    impl RecordingSink {
        pub fn with_text(text: &str) -> Self {
            Self {
                text: text.to_string(),
                ..Self::default()
            }
        }

        pub fn with_legend(mut self, varia: &str, index: usize, legend: &str) -> Self {
            self.legends
                .insert((varia.to_string(), index), VariaLegend::new(legend));
            self
        }

        fn remove_before(&mut self, count: usize) {
            for _ in 0..count {
                if self.text.pop().is_none() {
                    break;
                }
            }
        }

        fn insert(&mut self, text: &str) {
            self.text.push_str(text);
            if let Some(stored) = self.stored.as_mut() {
                stored.push_str(text);
            }
        }

        fn edited(&mut self) {
            self.process_counter += 1;
        }
    }

    impl EditorSink for RecordingSink {
        fn send_string(&mut self, text: &str, auto_space: AutoSpace) {
            self.calls.push(Call::SendString(text.to_string(), auto_space));
            self.insert(text);
            self.edited();
            self.last_string = Some((self.process_counter, text.chars().count()));
        }

        fn send_key_down_up(&mut self, code: KeyCode) {
            self.calls.push(Call::SendKey(code));
            self.edited();
        }

        fn delete_char_before_cursor(&mut self, count: usize) {
            self.calls.push(Call::DeleteCharBeforeCursor(count));
            self.remove_before(count);
            self.edited();
        }

        fn change_string_before_cursor(&mut self, delete_length: usize, text: &str) {
            self.calls
                .push(Call::ChangeStringBeforeCursor(delete_length, text.to_string()));
            self.remove_before(delete_length);
            self.insert(text);
            self.edited();
            self.last_string = Some((self.process_counter, text.chars().count()));
        }

        fn get_text_before_cursor(&mut self, limit: usize) -> Option<String> {
            let skip = self.text.chars().count().saturating_sub(limit);
            Some(self.text.chars().skip(skip).collect())
        }

        fn get_text_after_cursor(&mut self, _limit: usize) -> Option<String> {
            Some(String::new())
        }

        fn undo_last_string(&mut self) -> bool {
            match self.last_string.take() {
                Some((counter, length)) if counter == self.process_counter => {
                    self.calls.push(Call::UndoLastString);
                    self.remove_before(length);
                    self.edited();
                    true
                }
                _ => false,
            }
        }

        fn get_process_counter(&self) -> u64 {
            self.process_counter
        }

        fn is_store_text_enabled(&self) -> bool {
            self.stored.is_some()
        }
    }

    impl SoftBoardListener for RecordingSink {
        fn delete_char_after_cursor(&mut self, count: usize) {
            self.calls.push(Call::DeleteCharAfterCursor(count));
            self.edited();
        }

        fn meta_state(&self) -> &MetaState {
            &self.meta
        }

        fn meta_state_mut(&mut self) -> &mut MetaState {
            &mut self.meta
        }

        fn board_table(&self) -> &BoardTable {
            &self.boards
        }

        fn board_table_mut(&mut self) -> &mut BoardTable {
            &mut self.boards
        }

        fn packet_released(&mut self) {
            self.calls.push(Call::PacketReleased);
            self.meta.consume();
            self.boards.mark_used();
        }

        fn start_storing_text(&mut self) {
            self.stored = Some(String::new());
        }

        fn stop_storing_text(&mut self) -> String {
            self.stored.take().unwrap_or_default()
        }

        fn feedback(&mut self, feedback: Feedback) {
            self.calls.push(Call::Feedback(feedback));
        }

        fn varia_legend(&self, varia: &str, index: usize) -> Option<VariaLegend> {
            self.legends.get(&(varia.to_string(), index)).cloned()
        }

        fn take_kept_code(&mut self, varia: &str) -> Option<KeptCode> {
            self.kept.remove(varia)
        }

        fn toggle_abbreviation(&mut self, id: &str) {
            self.calls.push(Call::ToggleAbbreviation(id.to_string()));
            if self.active_short_cut.as_deref() == Some(id) {
                self.active_short_cut = None;
            } else {
                self.active_short_cut = Some(id.to_string());
            }
        }

        fn is_active_short_cut(&self, id: &str) -> bool {
            self.active_short_cut.as_deref() == Some(id)
        }

        fn modify_text(&mut self, reverse: bool) -> bool {
            self.calls.push(Call::Modify(reverse));
            true
        }

        fn move_cursor(&mut self, movement: Movement, select: bool) -> bool {
            self.calls.push(Call::MoveCursor(movement, select));
            true
        }

        fn context_action(&mut self, action: ContextAction) -> bool {
            self.calls.push(Call::ContextAction(action));
            true
        }

        fn launch(&mut self, package: &str) -> bool {
            self.calls.push(Call::Launch(package.to_string()));
            true
        }

        fn invalidate_text(&mut self) {
            self.calls.push(Call::InvalidateText);
        }
    }
}
