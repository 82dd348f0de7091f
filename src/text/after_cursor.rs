//! Cache of the text after the cursor
//!
//! Typing at the cursor never changes the text after it, so one flat string
//! is enough. Only forward deletes and cursor moves touch it.

use super::LENGTH_LIMIT;
use crate::codetext::SimpleReader;
use crate::connection::Connection;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TextAfterCursor {
    text: String,
    limit: usize,
    text_ready: bool,
    // Cached text reaches the end of the editor text
    reached_end: bool,
}

impl Default for TextAfterCursor {
    fn default() -> Self {
        Self::new(LENGTH_LIMIT)
    }
}

impl TextAfterCursor {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit: limit.max(1),
            text_ready: false,
            reached_end: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_ready(&self) -> bool {
        self.text_ready
    }

    /// Records `count` characters deleted after the cursor
    pub fn send_delete(&mut self, count: usize) {
        let cut = self
            .text
            .char_indices()
            .nth(count)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len());
        self.text.drain(..cut);
        if count > 0 && !self.reached_end {
            self.text_ready = false;
        }
    }

    pub fn invalidate(&mut self) {
        debug!("Text after cursor invalidated");
        self.text.clear();
        self.text_ready = false;
        self.reached_end = false;
    }

    fn resync(&mut self, connection: &mut dyn Connection) {
        self.text_ready = true;
        let Some(text) = connection.text_after_cursor(self.limit) else {
            warn!("Editor did not return the text after the cursor");
            return;
        };
        let length = text.chars().count();
        debug!("Text after cursor resynchronized: {} chars", length);

        self.reached_end = length < self.limit;
        self.text = text.chars().take(self.limit).collect();
    }

    /// Reader streaming the text forward from the cursor
    pub fn reader<'a>(&'a mut self, connection: &'a mut dyn Connection) -> AfterCursorReader<'a> {
        AfterCursorReader {
            buffer: self,
            connection,
            offset: 0,
            read: 0,
        }
    }
}

/// Forward reader over a [`TextAfterCursor`]
pub struct AfterCursorReader<'a> {
    buffer: &'a mut TextAfterCursor,
    connection: &'a mut dyn Connection,
    offset: usize,
    read: usize,
}

impl AfterCursorReader<'_> {
    fn step(&mut self) -> Option<char> {
        let ch = self.buffer.text[self.offset..].chars().next()?;
        self.offset += ch.len_utf8();
        Some(ch)
    }
}

impl SimpleReader for AfterCursorReader<'_> {
    fn read(&mut self) -> Option<char> {
        if let Some(ch) = self.step() {
            self.read += 1;
            return Some(ch);
        }
        if self.buffer.text_ready {
            return None;
        }

        self.buffer.resync(&mut *self.connection);
        self.offset = 0;
        for _ in 0..self.read {
            self.step()?;
        }
        let ch = self.step()?;
        self.read += 1;
        Some(ch)
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.read = 0;
    }
}
