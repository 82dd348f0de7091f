//! Character streams and the backward comparison used by the code-text index
//!
//! Every code is matched against the text typed before the cursor, so both
//! sides are read from their last character towards the first. The readers
//! here are the common currency between the text buffers, the entries and the
//! modify rolls.

use std::cmp::Ordering;

/// Pull-based character stream
///
/// `read` hands out the next character or `None` once the stream is
/// exhausted. `reset` rewinds to the first character of the stream.
pub trait SimpleReader {
    fn read(&mut self) -> Option<char>;

    fn reset(&mut self);
}

impl<R: SimpleReader + ?Sized> SimpleReader for &mut R {
    fn read(&mut self) -> Option<char> {
        (**self).read()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Streams a fixed string back-to-front
#[derive(Debug, Clone)]
pub struct StringReverseReader<'a> {
    text: &'a str,
    // Byte offset of the next character's end
    position: usize,
}

impl<'a> StringReverseReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            position: text.len(),
        }
    }
}

impl SimpleReader for StringReverseReader<'_> {
    fn read(&mut self) -> Option<char> {
        let ch = self.text[..self.position].chars().next_back()?;
        self.position -= ch.len_utf8();
        Some(ch)
    }

    fn reset(&mut self) {
        self.position = self.text.len();
    }
}

/// Compares the stream `text` against a candidate `ending`
///
/// Returns `0` as soon as `ending` is exhausted with every character matched,
/// i.e. `ending` is a suffix of `text`. Otherwise the result is signed by the
/// first mismatch (`+` when the text character is greater) and its magnitude
/// is one more than the number of characters that matched before it.
///
/// `max_length` caps the number of characters taken from `text`. Past the cap
/// the text behaves as exhausted, which orders below every character.
pub fn compare<T, E>(text: &mut T, ending: &mut E, max_length: Option<usize>) -> i32
where
    T: SimpleReader + ?Sized,
    E: SimpleReader + ?Sized,
{
    let mut remaining = max_length;
    let mut counter: i32 = 1;

    while let Some(expected) = ending.read() {
        let actual = match remaining {
            Some(0) => None,
            Some(left) => {
                remaining = Some(left - 1);
                text.read()
            }
            None => text.read(),
        };

        match actual {
            Some(actual) if actual == expected => counter += 1,
            Some(actual) if actual > expected => return counter,
            _ => return -counter,
        }
    }
    0
}

/// Total suffix order between two codes
///
/// Walks both strings from their ends, a string that runs out first is the
/// smaller one. `Equal` only for identical strings.
pub fn compare_codes(first: &str, second: &str) -> Ordering {
    first.chars().rev().cmp(second.chars().rev())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(text: &str, ending: &str, max_length: Option<usize>) -> i32 {
        compare(
            &mut StringReverseReader::new(text),
            &mut StringReverseReader::new(ending),
            max_length,
        )
    }

    #[test]
    fn reverse_reader_streams_back_to_front() {
        let mut reader = StringReverseReader::new("aő€");
        assert_eq!(reader.read(), Some('€'));
        assert_eq!(reader.read(), Some('ő'));
        assert_eq!(reader.read(), Some('a'));
        assert_eq!(reader.read(), None);

        reader.reset();
        assert_eq!(reader.read(), Some('€'));
    }

    #[test]
    fn string_matches_itself() {
        for text in ["", "a", "btw", "árvíztűrő"] {
            assert_eq!(cmp(text, text, None), 0, "{text}");
        }
    }

    #[test]
    fn suffix_is_a_match() {
        assert_eq!(cmp("omg btw", "btw", None), 0);
        assert_eq!(cmp("xcba", "a", None), 0);
        assert_eq!(cmp("anything", "", None), 0);
    }

    #[test]
    fn mismatch_sign_follows_trailing_characters() {
        // 'c' > 'b' at the very first character
        assert_eq!(cmp("abc", "b", None), 1);
        assert_eq!(cmp("abb", "c", None), -1);
    }

    #[test]
    fn magnitude_counts_agreed_characters() {
        // "zba" vs "cba": two trailing chars agree, then 'z' > 'c'
        assert_eq!(cmp("zba", "cba", None), 3);
        assert_eq!(cmp("aba", "cba", None), -3);
    }

    #[test]
    fn exhausted_text_orders_below_the_candidate() {
        assert_eq!(cmp("ba", "cba", None), -3);
        assert_eq!(cmp("", "a", None), -1);
    }

    #[test]
    fn cap_truncates_the_text() {
        assert_eq!(cmp("xcba", "cba", Some(3)), 0);
        assert_eq!(cmp("xcba", "cba", Some(2)), -3);
        assert_eq!(cmp("xcba", "a", Some(0)), -1);
    }

    #[test]
    fn codes_are_ordered_from_their_ends() {
        assert_eq!(compare_codes("ba", "ab"), Ordering::Less);
        assert_eq!(compare_codes("a", "ba"), Ordering::Less);
        assert_eq!(compare_codes("cba", "cba"), Ordering::Equal);
        assert_eq!(compare_codes("zz", "a"), Ordering::Greater);
    }
}
