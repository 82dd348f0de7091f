//! Cache of the text before the cursor
//!
//! Sent strings are appended as fragments instead of being copied into one
//! buffer on every keystroke; the fragments are coalesced once there are too
//! many. The cache is read backward, from the cursor towards the start of the
//! text. While it is not ready, the first read that runs out of cached text
//! fetches the text from the editor once and carries on where it stopped.

use super::LENGTH_LIMIT;
use crate::codetext::SimpleReader;
use crate::connection::Connection;
use tracing::{debug, warn};

const FRAGMENT_LIMIT: usize = 64;

#[derive(Debug, Clone)]
pub struct TextBeforeCursor {
    // Oldest fragment first
    fragments: Vec<String>,
    length: usize,
    limit: usize,
    text_ready: bool,
    // Cached text reaches back to the start of the editor text
    reached_start: bool,
}

impl Default for TextBeforeCursor {
    fn default() -> Self {
        Self::new(LENGTH_LIMIT)
    }
}

impl TextBeforeCursor {
    pub fn new(limit: usize) -> Self {
        Self {
            fragments: Vec::new(),
            length: 0,
            limit: limit.max(1),
            text_ready: false,
            reached_start: false,
        }
    }

    /// Cached length in characters
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_ready(&self) -> bool {
        self.text_ready
    }

    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    /// Records a string committed at the cursor
    pub fn send_string(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.fragments.push(text.to_string());
        self.length += text.chars().count();

        if self.fragments.len() > FRAGMENT_LIMIT {
            let joined = self.fragments.concat();
            self.fragments = vec![joined];
        }
        if self.length >= self.limit {
            self.truncate();
            // Everything up to the bound is known now
            self.text_ready = true;
        }
    }

    /// Records `count` characters deleted before the cursor
    pub fn send_delete(&mut self, count: usize) {
        let mut remaining = count;
        while remaining > 0 {
            let Some(last) = self.fragments.last_mut() else {
                break;
            };
            let chars = last.chars().count();
            if chars <= remaining {
                remaining -= chars;
                self.length -= chars;
                self.fragments.pop();
            } else {
                let keep = chars - remaining;
                let cut = last
                    .char_indices()
                    .nth(keep)
                    .map(|(index, _)| index)
                    .unwrap_or(last.len());
                last.truncate(cut);
                self.length -= remaining;
                remaining = 0;
            }
        }

        // Characters beyond the old bound are unknown
        if count > 0 && !self.reached_start {
            self.text_ready = false;
        }
    }

    /// Forgets everything, the next exhausting read resynchronizes
    pub fn invalidate(&mut self) {
        debug!("Text before cursor invalidated");
        self.fragments.clear();
        self.length = 0;
        self.text_ready = false;
        self.reached_start = false;
    }

    fn truncate(&mut self) {
        if self.length <= self.limit {
            return;
        }
        let mut excess = self.length - self.limit;
        while excess > 0 {
            let Some(first) = self.fragments.first_mut() else {
                break;
            };
            let chars = first.chars().count();
            if chars <= excess {
                excess -= chars;
                self.length -= chars;
                self.fragments.remove(0);
            } else {
                let cut = first
                    .char_indices()
                    .nth(excess)
                    .map(|(index, _)| index)
                    .unwrap_or(first.len());
                first.drain(..cut);
                self.length -= excess;
                excess = 0;
            }
        }
        self.reached_start = false;
    }

    fn resync(&mut self, connection: &mut dyn Connection) {
        self.text_ready = true;
        let Some(text) = connection.text_before_cursor(self.limit) else {
            warn!("Editor did not return the text before the cursor");
            return;
        };
        let length = text.chars().count();
        debug!("Text before cursor resynchronized: {} chars", length);

        self.reached_start = length < self.limit;
        self.length = length;
        self.fragments = vec![text];
        self.truncate();
    }

    /// Reader streaming the text backward from the cursor
    pub fn reader<'a>(&'a mut self, connection: &'a mut dyn Connection) -> BeforeCursorReader<'a> {
        let mut reader = BeforeCursorReader {
            buffer: self,
            connection,
            fragment: 0,
            offset: 0,
            read: 0,
        };
        reader.reset();
        reader
    }
}

/// Backward reader over a [`TextBeforeCursor`]
pub struct BeforeCursorReader<'a> {
    buffer: &'a mut TextBeforeCursor,
    connection: &'a mut dyn Connection,
    // Position: byte end inside fragment `fragment - 1`
    fragment: usize,
    offset: usize,
    read: usize,
}

impl BeforeCursorReader<'_> {
    fn step(&mut self) -> Option<char> {
        loop {
            if self.fragment == 0 {
                return None;
            }
            let text = &self.buffer.fragments[self.fragment - 1];
            if let Some(ch) = text[..self.offset].chars().next_back() {
                self.offset -= ch.len_utf8();
                return Some(ch);
            }
            self.fragment -= 1;
            self.offset = match self.fragment {
                0 => 0,
                index => self.buffer.fragments[index - 1].len(),
            };
        }
    }

    fn rewind(&mut self) {
        self.fragment = self.buffer.fragments.len();
        self.offset = self.buffer.fragments.last().map_or(0, String::len);
    }
}

impl SimpleReader for BeforeCursorReader<'_> {
    fn read(&mut self) -> Option<char> {
        if let Some(ch) = self.step() {
            self.read += 1;
            return Some(ch);
        }
        if self.buffer.text_ready {
            return None;
        }

        self.buffer.resync(&mut *self.connection);
        self.rewind();
        for _ in 0..self.read {
            self.step()?;
        }
        let ch = self.step()?;
        self.read += 1;
        Some(ch)
    }

    fn reset(&mut self) {
        self.rewind();
        self.read = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ScratchEditor;

    fn read_all<R: SimpleReader>(reader: &mut R) -> String {
        std::iter::from_fn(|| reader.read()).collect()
    }

    #[test]
    fn reads_sent_text_backward() {
        let mut editor = ScratchEditor::with_text("abcdő");
        let mut before = TextBeforeCursor::default();
        before.send_string("ab");
        before.send_string("cd");
        before.send_string("ő");

        let mut reader = before.reader(&mut editor);
        assert_eq!(read_all(&mut reader), "ődcba");
        reader.reset();
        assert_eq!(reader.read(), Some('ő'));
    }

    #[test]
    fn delete_restores_previous_content() {
        let mut before = TextBeforeCursor::default();
        before.send_string("hello ");
        let snapshot = before.text();

        before.send_string("wörld");
        before.send_delete(5);
        assert_eq!(before.text(), snapshot);
        assert_eq!(before.len(), 6);

        before.send_delete(2);
        assert_eq!(before.text(), "hell");
    }

    #[test]
    fn retention_is_bounded_and_drops_oldest() {
        let mut before = TextBeforeCursor::new(8);
        before.send_string("0123");
        before.send_string("4567");
        assert!(before.is_ready());
        before.send_string("89");

        assert_eq!(before.len(), 8);
        assert_eq!(before.text(), "23456789");
        assert!(before.is_ready());

        for _ in 0..100 {
            before.send_string("x");
            assert!(before.len() <= 8);
        }
    }

    #[test]
    fn exhausting_read_resyncs_once() {
        let mut editor = ScratchEditor::with_text("earlier text ");
        let mut before = TextBeforeCursor::default();
        before.send_string("new");
        editor.commit_text("new");

        let mut reader = before.reader(&mut editor);
        assert_eq!(read_all(&mut reader), "wen txet reilrae");
        assert_eq!(reader.read(), None);
        drop(reader);

        assert!(before.is_ready());
        assert_eq!(before.text(), "earlier text new");
    }

    #[test]
    fn ready_buffer_never_fetches() {
        let mut editor = ScratchEditor::with_text("0123456789");
        let mut before = TextBeforeCursor::new(4);
        before.send_string("abcd");

        let mut reader = before.reader(&mut editor);
        assert_eq!(read_all(&mut reader), "dcba");
    }

    #[test]
    fn invalidate_forces_resync() {
        let mut editor = ScratchEditor::with_text("synced");
        let mut before = TextBeforeCursor::new(4);
        before.send_string("abcd");
        before.invalidate();
        assert!(before.is_empty());

        let mut reader = before.reader(&mut editor);
        assert_eq!(read_all(&mut reader), "decn");
    }

    #[test]
    fn many_fragments_are_coalesced() {
        let mut before = TextBeforeCursor::default();
        for _ in 0..(FRAGMENT_LIMIT * 2) {
            before.send_string("a");
        }
        assert!(before.fragments.len() <= FRAGMENT_LIMIT);
        assert_eq!(before.len(), FRAGMENT_LIMIT * 2);
    }
}
