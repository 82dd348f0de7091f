//! Modify rolls: cycling the text before the cursor through alternatives
//!
//! A roll is an ordered ring of strings ("a", "á", "à"). When the text before
//! the cursor ends with one element of a roll it can be replaced by the next
//! (or previous) element. Every element of every roll goes into one
//! suffix-ordered index, so finding the current element is the same search the
//! code-text index uses. The result is returned as a plain [`RollHit`] instead
//! of being kept in mutable cursor fields.

use super::error::CodeTextError;
use super::reader::{compare_codes, SimpleReader, StringReverseReader};
use super::search::{longest_match, Coded};
use crate::connection::EditorSink;
use tracing::debug;

#[derive(Debug, Clone)]
struct RollKey {
    text: String,
    roll: usize,
    element: usize,
}

impl Coded for RollKey {
    fn code(&self) -> &str {
        &self.text
    }
}

/// Position of the roll element found before the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollHit {
    pub roll: usize,
    pub element: usize,
    /// Length of the element in characters
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct ModifyText {
    rolls: Vec<Vec<String>>,
    keys: Vec<RollKey>,
    longest: usize,
}

impl ModifyText {
    pub fn new(rolls: Vec<Vec<String>>) -> Result<Self, CodeTextError> {
        if rolls.is_empty() {
            return Err(CodeTextError::InvalidRoll("no rolls given".to_string()));
        }

        let mut keys = Vec::new();
        for (roll_index, roll) in rolls.iter().enumerate() {
            if roll.is_empty() {
                return Err(CodeTextError::InvalidRoll(format!(
                    "roll {} is empty",
                    roll_index
                )));
            }
            for (element, text) in roll.iter().enumerate() {
                if text.is_empty() {
                    return Err(CodeTextError::InvalidRoll(format!(
                        "roll {} has an empty element at {}",
                        roll_index, element
                    )));
                }
                keys.push(RollKey {
                    text: text.clone(),
                    roll: roll_index,
                    element,
                });
            }
        }
        keys.sort_by(|first, second| compare_codes(&first.text, &second.text));

        let longest = keys
            .iter()
            .map(|key| key.text.chars().count())
            .max()
            .unwrap_or(0);

        Ok(Self {
            rolls,
            keys,
            longest,
        })
    }

    /// A single roll, as used by list buttons
    pub fn single(roll: Vec<String>) -> Result<Self, CodeTextError> {
        Self::new(vec![roll])
    }

    /// First element of the first roll
    pub fn first(&self) -> &str {
        self.rolls
            .first()
            .and_then(|roll| roll.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn rolls(&self) -> &[Vec<String>] {
        &self.rolls
    }

    /// Longest element in characters: the text needed before the cursor
    pub fn longest(&self) -> usize {
        self.longest
    }

    /// Longest roll element ending the text read backward from `text`
    pub fn find<R: SimpleReader + ?Sized>(&self, text: &mut R) -> Option<RollHit> {
        longest_match(&self.keys, text).map(|index| {
            let key = &self.keys[index];
            RollHit {
                roll: key.roll,
                element: key.element,
                length: key.text.chars().count(),
            }
        })
    }

    /// Element following (or preceding) `hit` in its roll, wrapping around
    pub fn step(&self, hit: &RollHit, reverse: bool) -> Option<&str> {
        let roll = self.rolls.get(hit.roll)?;
        let next = if reverse {
            (hit.element + roll.len() - 1) % roll.len()
        } else {
            (hit.element + 1) % roll.len()
        };
        roll.get(next).map(String::as_str)
    }

    /// Replaces the roll element before the cursor with its neighbour
    ///
    /// Returns `false` when no element ends the text or the roll has nothing
    /// to cycle to.
    pub fn modify<S: EditorSink + ?Sized>(&self, sink: &mut S, reverse: bool) -> bool {
        self.modify_before(sink, reverse, "")
    }

    /// Like [`modify`](Self::modify), for an element followed by `suffix`
    ///
    /// The suffix is written back after the new element.
    pub fn modify_before<S: EditorSink + ?Sized>(
        &self,
        sink: &mut S,
        reverse: bool,
        suffix: &str,
    ) -> bool {
        let suffix_length = suffix.chars().count();
        let Some(before) = sink.get_text_before_cursor(self.longest + suffix_length) else {
            return false;
        };
        let Some(before) = before.strip_suffix(suffix) else {
            debug!("Text before the cursor does not end with {:?}", suffix);
            return false;
        };
        let Some(hit) = self.find(&mut StringReverseReader::new(before)) else {
            debug!("No roll element before the cursor");
            return false;
        };
        if self.rolls[hit.roll].len() < 2 {
            return false;
        }
        let Some(next) = self.step(&hit, reverse) else {
            return false;
        };
        debug!("Modifying roll {} element {} to {:?}", hit.roll, hit.element, next);
        sink.change_string_before_cursor(hit.length + suffix_length, &format!("{}{}", next, suffix));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::{Call, RecordingSink};

    fn rolls() -> ModifyText {
        ModifyText::new(vec![
            vec!["a".into(), "á".into(), "à".into()],
            vec!["o".into(), "ó".into(), "ö".into(), "ő".into()],
            vec!["...".into(), "…".into()],
        ])
        .unwrap()
    }

    #[test]
    fn finds_roll_position() {
        let modify = rolls();
        let hit = modify.find(&mut StringReverseReader::new("szőlő"));
        assert_eq!(
            hit,
            Some(RollHit {
                roll: 1,
                element: 3,
                length: 1
            })
        );
        assert_eq!(modify.find(&mut StringReverseReader::new("xyz")), None);
    }

    #[test]
    fn steps_wrap_around() {
        let modify = rolls();
        let last = RollHit {
            roll: 0,
            element: 2,
            length: 1,
        };
        assert_eq!(modify.step(&last, false), Some("a"));
        assert_eq!(modify.step(&last, true), Some("á"));
    }

    #[test]
    fn modify_replaces_text_before_cursor() {
        let modify = rolls();
        let mut sink = RecordingSink::with_text("wait...");

        assert!(modify.modify(&mut sink, false));
        assert_eq!(
            sink.calls,
            vec![Call::ChangeStringBeforeCursor(3, "…".to_string())]
        );
        assert_eq!(sink.text, "wait…");
    }

    #[test]
    fn modify_keeps_trailing_suffix() {
        let modify = rolls();
        let mut sink = RecordingSink::with_text("szia ");

        assert!(modify.modify_before(&mut sink, false, " "));
        assert_eq!(sink.text, "sziá ");
        assert!(!modify.modify_before(&mut sink, false, "!"));
        assert_eq!(sink.text, "sziá ");
    }

    #[test]
    fn nothing_to_modify() {
        let modify = rolls();
        let mut sink = RecordingSink::with_text("hmm");
        assert!(!modify.modify(&mut sink, false));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn empty_rolls_are_rejected() {
        assert!(ModifyText::new(Vec::new()).is_err());
        assert!(ModifyText::single(Vec::new()).is_err());
        assert!(ModifyText::single(vec!["a".into(), String::new()]).is_err());
    }
}
