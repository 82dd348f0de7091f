//! Bounded caches of the editor text around the cursor
//!
//! The caches mirror every edit the keyboard sends, in the order it sends
//! them. Whenever the editor may have changed behind the keyboard's back the
//! caches are invalidated and refetched on the next read.

pub mod after_cursor;
pub mod before_cursor;

pub use after_cursor::{AfterCursorReader, TextAfterCursor};
pub use before_cursor::{BeforeCursorReader, TextBeforeCursor};

/// Default bound of both caches in characters
pub const LENGTH_LIMIT: usize = 2048;
