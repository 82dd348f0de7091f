//! In-memory editor
//!
//! Stands in for the platform editor in the demo binary and in tests. Clones
//! share one editor, so a clone kept outside the board engine can inspect the
//! text the engine produced.

use super::{Connection, ContextAction, KeyCode, MetaFlags, Selection};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ScratchState {
    text: Vec<char>,
    selection: Selection,
    clipboard: String,
    keys: Vec<(KeyCode, MetaFlags)>,
    launched: Vec<String>,
}

impl ScratchState {
    fn replace_selection(&mut self, text: &str) {
        let Selection { start, end } = self.selection;
        let inserted: Vec<char> = text.chars().collect();
        let cursor = start + inserted.len();
        self.text.splice(start..end, inserted);
        self.selection = Selection::cursor(cursor);
    }

    fn selected(&self) -> String {
        self.text[self.selection.start..self.selection.end]
            .iter()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScratchEditor {
    state: Arc<Mutex<ScratchState>>,
}

impl ScratchEditor {
    /// Editor holding `text` with the cursor at its end
    pub fn with_text(text: &str) -> Self {
        let editor = Self::default();
        {
            let mut state = editor.lock();
            state.text = text.chars().collect();
            state.selection = Selection::cursor(state.text.len());
        }
        editor
    }

    fn lock(&self) -> MutexGuard<'_, ScratchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn text(&self) -> String {
        self.lock().text.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.lock().selection.end
    }

    pub fn clipboard(&self) -> String {
        self.lock().clipboard.clone()
    }

    /// Hard keys received, in order
    pub fn keys(&self) -> Vec<(KeyCode, MetaFlags)> {
        self.lock().keys.clone()
    }

    pub fn launched(&self) -> Vec<String> {
        self.lock().launched.clone()
    }
}

impl Connection for ScratchEditor {
    fn commit_text(&mut self, text: &str) -> bool {
        self.lock().replace_selection(text);
        true
    }

    fn delete_surrounding_text(&mut self, before: usize, after: usize) -> bool {
        let mut state = self.lock();
        let Selection { start, end } = state.selection;
        let after_end = (end + after).min(state.text.len());
        state.text.drain(end..after_end);
        let before_start = start.saturating_sub(before);
        state.text.drain(before_start..start);

        let removed = start - before_start;
        state.selection = Selection {
            start: before_start,
            end: end - removed,
        };
        true
    }

    fn send_key_event(&mut self, code: KeyCode, meta: MetaFlags) -> bool {
        let mut state = self.lock();
        state.keys.push((code, meta));
        debug!("Scratch editor key {:?} with {:?}", code, meta);

        let Selection { start, end } = state.selection;
        let length = state.text.len();
        match code {
            KeyCode::ENTER => state.replace_selection("\n"),
            KeyCode::SPACE => state.replace_selection(" "),
            KeyCode::TAB => state.replace_selection("\t"),
            KeyCode::DEL => {
                if start == end {
                    if start > 0 {
                        state.text.remove(start - 1);
                        state.selection = Selection::cursor(start - 1);
                    }
                } else {
                    state.replace_selection("");
                }
            }
            KeyCode::FORWARD_DEL => {
                if start == end {
                    if end < length {
                        state.text.remove(end);
                    }
                } else {
                    state.replace_selection("");
                }
            }
            KeyCode::DPAD_LEFT => state.selection = Selection::cursor(start.saturating_sub(1)),
            KeyCode::DPAD_RIGHT => state.selection = Selection::cursor((end + 1).min(length)),
            KeyCode::MOVE_HOME => state.selection = Selection::cursor(0),
            KeyCode::MOVE_END => state.selection = Selection::cursor(length),
            _ => {}
        }
        true
    }

    fn text_before_cursor(&mut self, limit: usize) -> Option<String> {
        let state = self.lock();
        let start = state.selection.start;
        Some(state.text[start.saturating_sub(limit)..start].iter().collect())
    }

    fn text_after_cursor(&mut self, limit: usize) -> Option<String> {
        let state = self.lock();
        let end = state.selection.end;
        let stop = (end + limit).min(state.text.len());
        Some(state.text[end..stop].iter().collect())
    }

    fn selection(&mut self) -> Option<Selection> {
        Some(self.lock().selection)
    }

    fn set_selection(&mut self, start: usize, end: usize) -> bool {
        let mut state = self.lock();
        let length = state.text.len();
        if start > length || end > length {
            return false;
        }
        state.selection = Selection {
            start: start.min(end),
            end: start.max(end),
        };
        true
    }

    fn perform_context_action(&mut self, action: ContextAction) -> bool {
        let mut state = self.lock();
        match action {
            ContextAction::SelectAll => {
                state.selection = Selection {
                    start: 0,
                    end: state.text.len(),
                };
            }
            ContextAction::Copy => state.clipboard = state.selected(),
            ContextAction::Cut => {
                state.clipboard = state.selected();
                state.replace_selection("");
            }
            ContextAction::Paste => {
                let clipboard = state.clipboard.clone();
                state.replace_selection(&clipboard);
            }
        }
        true
    }

    fn launch_application(&mut self, package: &str) -> bool {
        info!("Scratch editor launching {}", package);
        self.lock().launched.push(package.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_and_delete_at_cursor() {
        let mut editor = ScratchEditor::with_text("hello");
        editor.set_selection(2, 2);
        editor.commit_text("XY");
        assert_eq!(editor.text(), "heXYllo");
        assert_eq!(editor.cursor(), 4);

        editor.delete_surrounding_text(1, 2);
        assert_eq!(editor.text(), "heXo");
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn clones_share_the_text() {
        let editor = ScratchEditor::default();
        let mut clone = editor.clone();
        clone.commit_text("shared");
        assert_eq!(editor.text(), "shared");
    }

    #[test]
    fn context_actions() {
        let mut editor = ScratchEditor::with_text("cut me");
        editor.perform_context_action(ContextAction::SelectAll);
        editor.perform_context_action(ContextAction::Cut);
        assert_eq!(editor.text(), "");
        editor.perform_context_action(ContextAction::Paste);
        editor.perform_context_action(ContextAction::Paste);
        assert_eq!(editor.text(), "cut mecut me");
        assert_eq!(editor.clipboard(), "cut me");
    }

    #[test]
    fn keys_edit_and_are_recorded() {
        let mut editor = ScratchEditor::with_text("ab");
        editor.send_key_event(KeyCode::DEL, MetaFlags::NONE);
        editor.send_key_event(KeyCode::ENTER, MetaFlags::SHIFT);
        assert_eq!(editor.text(), "a\n");
        assert_eq!(editor.keys().len(), 2);
    }

    #[test]
    fn text_around_cursor_is_bounded() {
        let mut editor = ScratchEditor::with_text("0123456789");
        editor.set_selection(5, 5);
        assert_eq!(editor.text_before_cursor(3).as_deref(), Some("234"));
        assert_eq!(editor.text_after_cursor(3).as_deref(), Some("567"));
        assert_eq!(editor.text_after_cursor(30).as_deref(), Some("56789"));
    }
}
