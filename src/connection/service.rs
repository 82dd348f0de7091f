//! Keyboard service: the listener buttons talk to
//!
//! Owns the editor connection together with everything that mirrors or
//! decorates it: both text caches, the code-text index, the modify rolls, the
//! modal state and the edit counter. Every edit goes to the editor first and
//! is then applied to the caches in the same order.

use super::{
    AutoSpace, Connection, ContextAction, EditorSink, Feedback, KeyCode, Movement,
    SoftBoardListener,
};
use crate::board::{BoardTable, MetaState};
use crate::codetext::{CodeTextProcessor, KeptCode, ModifyText, Ready, SimpleReader, VariaLegend};
use crate::text::{TextAfterCursor, TextBeforeCursor};
use tracing::{debug, info, warn};

/// Last string sent, kept while it can still be taken back
#[derive(Debug, Clone)]
struct UndoRecord {
    counter: u64,
    inserted: usize,
    // Text the string replaced
    removed: String,
    // Typed string an expansion rewrote, undone on its own after this one
    earlier: Option<Box<UndoRecord>>,
}

impl UndoRecord {
    /// One record taking the text back to before the earliest send
    fn flatten(mut self) -> UndoRecord {
        match self.earlier.take() {
            Some(earlier) => earlier.chain(self),
            None => self,
        }
    }

    /// Folds a later rewrite of the text before the cursor into this record
    fn chain(self, later: UndoRecord) -> UndoRecord {
        let rewritten = later.removed.chars().count();
        if rewritten >= self.inserted {
            let kept = rewritten - self.inserted;
            let mut removed: String = later.removed.chars().take(kept).collect();
            removed.push_str(&self.removed);
            UndoRecord {
                counter: later.counter,
                inserted: later.inserted,
                removed,
                earlier: None,
            }
        } else {
            UndoRecord {
                counter: later.counter,
                inserted: later.inserted + self.inserted - rewritten,
                removed: self.removed,
                earlier: None,
            }
        }
    }
}

pub struct SoftBoardService {
    connection: Box<dyn Connection>,
    before: TextBeforeCursor,
    after: TextAfterCursor,
    code_text: CodeTextProcessor<Ready>,
    modify: Option<ModifyText>,
    meta: MetaState,
    boards: BoardTable,
    process_counter: u64,
    undo: Option<UndoRecord>,
    stored_text: Option<String>,
}

impl SoftBoardService {
    pub fn new(
        connection: Box<dyn Connection>,
        code_text: CodeTextProcessor<Ready>,
        text_limit: usize,
    ) -> Self {
        info!("Soft board service connected (text limit {})", text_limit);
        Self {
            connection,
            before: TextBeforeCursor::new(text_limit),
            after: TextAfterCursor::new(text_limit),
            code_text,
            modify: None,
            meta: MetaState::new(),
            boards: BoardTable::default(),
            process_counter: 0,
            undo: None,
            stored_text: None,
        }
    }

    pub fn with_modify(mut self, modify: Option<ModifyText>) -> Self {
        self.modify = modify;
        self
    }

    pub fn with_boards(mut self, boards: BoardTable) -> Self {
        self.boards = boards;
        self
    }

    pub fn code_text(&self) -> &CodeTextProcessor<Ready> {
        &self.code_text
    }

    pub fn active_short_cut(&self) -> Option<&str> {
        self.code_text.active_short_cut()
    }

    /// Editor content was changed by someone else
    pub fn editor_changed(&mut self) {
        self.invalidate_text();
        self.undo = None;
        self.edited();
    }

    fn edited(&mut self) {
        self.process_counter += 1;
    }

    /// The undo record, if nothing was edited since it was written
    fn take_undo(&mut self) -> Option<UndoRecord> {
        let record = self.undo.take()?;
        if record.counter != self.process_counter {
            debug!("Undo skipped, editor changed since");
            return None;
        }
        Some(record)
    }

    fn revert(&mut self, record: &UndoRecord) {
        self.delete_before(record.inserted);
        self.commit(&record.removed);
        self.edited();
        debug!(
            "Undid {} chars, restored {:?}",
            record.inserted, record.removed
        );
    }

    /// Commits `text` without code-text processing
    fn commit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.connection.commit_text(text) {
            warn!("Editor rejected text, caches invalidated");
            self.invalidate_text();
            return;
        }
        self.before.send_string(text);
        if let Some(stored) = self.stored_text.as_mut() {
            stored.push_str(text);
        }
    }

    fn delete_before(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        if !self.connection.delete_surrounding_text(count, 0) {
            warn!("Editor rejected delete, caches invalidated");
            self.invalidate_text();
            return;
        }
        self.before.send_delete(count);
        if let Some(stored) = self.stored_text.as_mut() {
            for _ in 0..count {
                if stored.pop().is_none() {
                    break;
                }
            }
        }
    }

    /// Up to `limit` characters before the cursor, in reading order
    fn read_before(&mut self, limit: usize) -> String {
        let mut reader = self.before.reader(self.connection.as_mut());
        let mut text: Vec<char> = std::iter::from_fn(|| reader.read()).take(limit).collect();
        text.reverse();
        text.into_iter().collect()
    }

    fn count_before(&mut self, skip: fn(char) -> bool, count: fn(char) -> bool) -> usize {
        let mut reader = self.before.reader(self.connection.as_mut());
        count_run(&mut reader, skip, count)
    }

    fn count_after(&mut self, skip: fn(char) -> bool, count: fn(char) -> bool) -> usize {
        let mut reader = self.after.reader(self.connection.as_mut());
        count_run(&mut reader, skip, count)
    }

    /// Activates the longest code ending the text before the cursor
    fn process_code_text(&mut self) {
        let entry = {
            let mut reader = self.before.reader(self.connection.as_mut());
            self.code_text.look_up_longest(&mut reader)
        };
        let Some(entry) = entry else {
            return;
        };
        debug!("Code text {:?} activated", entry.code());
        if let Some(switch) = entry.activate(self) {
            self.code_text.apply(switch);
        }
    }
}

/// Skips chars matching `skip`, then counts chars matching `count`
fn count_run<R: SimpleReader>(reader: &mut R, skip: fn(char) -> bool, count: fn(char) -> bool) -> usize {
    let mut length = 0;
    let mut skipping = true;
    while let Some(ch) = reader.read() {
        if skipping && skip(ch) {
            length += 1;
            continue;
        }
        skipping = false;
        if !count(ch) {
            break;
        }
        length += 1;
    }
    length
}

impl EditorSink for SoftBoardService {
    fn send_string(&mut self, text: &str, auto_space: AutoSpace) {
        let mut erased = 0;
        if auto_space.contains(AutoSpace::ERASE_BEFORE) {
            erased = self.count_before(|ch| ch == ' ', |_| false);
            self.delete_before(erased);
        }

        let mut out = String::with_capacity(text.len() + 2);
        if auto_space.contains(AutoSpace::BEFORE) {
            let last = self.read_before(1);
            if last.chars().next().is_some_and(|ch| !ch.is_whitespace()) {
                out.push(' ');
            }
        }
        out.push_str(text);
        if auto_space.contains(AutoSpace::AFTER) {
            out.push(' ');
        }
        if out.is_empty() {
            return;
        }

        self.commit(&out);
        self.edited();
        self.undo = Some(UndoRecord {
            counter: self.process_counter,
            inserted: out.chars().count(),
            removed: " ".repeat(erased),
            earlier: None,
        });
        self.process_code_text();
    }

    fn send_key_down_up(&mut self, code: KeyCode) {
        let flags = self.meta.flags();
        debug!("Key {:?} with {:?}", code, flags);
        if !self.connection.send_key_event(code, flags) {
            warn!("Editor rejected key {:?}", code);
        }

        match code {
            KeyCode::ENTER if flags == Default::default() => self.before.send_string("\n"),
            KeyCode::SPACE if flags == Default::default() => self.before.send_string(" "),
            KeyCode::TAB if flags == Default::default() => self.before.send_string("\t"),
            _ => self.invalidate_text(),
        }
        self.undo = None;
        self.edited();
    }

    fn delete_char_before_cursor(&mut self, count: usize) {
        self.delete_before(count);
        self.undo = None;
        self.edited();
    }

    fn change_string_before_cursor(&mut self, delete_length: usize, text: &str) {
        let removed = self.read_before(delete_length);
        // A rewrite right after a send keeps that send undoable
        let earlier = self
            .undo
            .take()
            .filter(|record| record.counter == self.process_counter)
            .map(|record| Box::new(record.flatten()));
        self.delete_before(delete_length);
        self.commit(text);
        self.edited();
        self.undo = Some(UndoRecord {
            counter: self.process_counter,
            inserted: text.chars().count(),
            removed,
            earlier,
        });
    }

    fn get_text_before_cursor(&mut self, limit: usize) -> Option<String> {
        Some(self.read_before(limit))
    }

    fn get_text_after_cursor(&mut self, limit: usize) -> Option<String> {
        let mut reader = self.after.reader(self.connection.as_mut());
        Some(std::iter::from_fn(|| reader.read()).take(limit).collect())
    }

    fn undo_last_string(&mut self) -> bool {
        let Some(mut record) = self.take_undo() else {
            return false;
        };
        let earlier = record.earlier.take();
        self.revert(&record);
        self.undo = earlier.map(|mut earlier| {
            earlier.counter = self.process_counter;
            *earlier
        });
        true
    }

    fn undo_sent_string(&mut self) -> bool {
        let Some(record) = self.take_undo() else {
            return false;
        };
        self.revert(&record.flatten());
        true
    }

    fn get_process_counter(&self) -> u64 {
        self.process_counter
    }

    fn is_store_text_enabled(&self) -> bool {
        self.stored_text.is_some()
    }
}

impl SoftBoardListener for SoftBoardService {
    fn delete_char_after_cursor(&mut self, count: usize) {
        if !self.connection.delete_surrounding_text(0, count) {
            warn!("Editor rejected forward delete");
            self.invalidate_text();
        } else {
            self.after.send_delete(count);
        }
        self.undo = None;
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
        self.meta.consume();
        self.boards.mark_used();
    }

    fn start_storing_text(&mut self) {
        info!("Storing typed text");
        self.stored_text = Some(String::new());
    }

    fn stop_storing_text(&mut self) -> String {
        let stored = self.stored_text.take().unwrap_or_default();
        info!("Stored {} chars", stored.chars().count());
        stored
    }

    fn feedback(&mut self, feedback: Feedback) {
        debug!("Feedback {:?}", feedback);
    }

    fn varia_legend(&self, varia: &str, index: usize) -> Option<VariaLegend> {
        self.code_text.varia_legend(varia, index).cloned()
    }

    fn take_kept_code(&mut self, varia: &str) -> Option<KeptCode> {
        self.code_text.take_kept_code(varia)
    }

    fn toggle_abbreviation(&mut self, id: &str) {
        if self.code_text.is_active_short_cut(id) {
            self.code_text.stop_abbreviation();
        } else {
            self.code_text.start_abbreviation(id);
        }
    }

    fn is_active_short_cut(&self, id: &str) -> bool {
        self.code_text.is_active_short_cut(id)
    }

    fn modify_text(&mut self, reverse: bool) -> bool {
        let Some(modify) = self.modify.take() else {
            debug!("No modify rolls configured");
            return false;
        };
        let modified = modify.modify(self, reverse);
        self.modify = Some(modify);
        modified
    }

    fn move_cursor(&mut self, movement: Movement, select: bool) -> bool {
        let Some(selection) = self.connection.selection() else {
            warn!("Editor has no selection, cannot move");
            return false;
        };

        let left = matches!(
            movement,
            Movement::CharLeft | Movement::WordLeft | Movement::LineStart
        );
        let distance = match movement {
            Movement::CharLeft => self.count_before(|_| false, |_| true).min(1),
            Movement::CharRight => self.count_after(|_| false, |_| true).min(1),
            Movement::WordLeft => self.count_before(char::is_whitespace, |ch| !ch.is_whitespace()),
            Movement::WordRight => self.count_after(char::is_whitespace, |ch| !ch.is_whitespace()),
            Movement::LineStart => self.count_before(|_| false, |ch| ch != '\n'),
            Movement::LineEnd => self.count_after(|_| false, |ch| ch != '\n'),
        };
        if distance == 0 {
            return false;
        }

        let (anchor, head) = if left {
            (selection.end, selection.start)
        } else {
            (selection.start, selection.end)
        };
        let head = if left { head - distance.min(head) } else { head + distance };
        let moved = if select {
            self.connection.set_selection(anchor, head)
        } else {
            self.connection.set_selection(head, head)
        };

        self.invalidate_text();
        self.undo = None;
        self.edited();
        moved
    }

    fn context_action(&mut self, action: ContextAction) -> bool {
        let done = self.connection.perform_context_action(action);
        // Copy is the only action that leaves text and selection alone
        if !matches!(action, ContextAction::Copy) {
            self.invalidate_text();
            self.undo = None;
            self.edited();
        }
        done
    }

    fn launch(&mut self, package: &str) -> bool {
        info!("Launching {}", package);
        self.connection.launch_application(package)
    }

    fn invalidate_text(&mut self) {
        self.before.invalidate();
        self.after.invalidate();
    }
}
