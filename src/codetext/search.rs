//! Longest and shortest suffix match over a suffix-ordered slice
//!
//! Matching codes are not contiguous in suffix order ("a" < "aa" < "ba" with
//! only "a" and "ba" matching "xba"), so a plain binary search is not enough.
//! A partial match of `k` characters says that every match on the lower side
//! is at most `k` characters long: that side is searched with the text capped
//! at `k`, the upper side keeps the inherited cap.

use super::reader::{compare, SimpleReader, StringReverseReader};

/// Anything searchable by its code
pub trait Coded {
    fn code(&self) -> &str;
}

impl<T: Coded + ?Sized> Coded for std::sync::Arc<T> {
    fn code(&self) -> &str {
        (**self).code()
    }
}

/// Index of the longest item whose code is a suffix of `text`
///
/// `items` must be sorted by [`compare_codes`](super::reader::compare_codes).
pub fn longest_match<T, R>(items: &[T], text: &mut R) -> Option<usize>
where
    T: Coded,
    R: SimpleReader + ?Sized,
{
    longest(items, text, 0, items.len(), None)
}

/// Index of the shortest item whose code is a suffix of `text`
pub fn shortest_match<T, R>(items: &[T], text: &mut R) -> Option<usize>
where
    T: Coded,
    R: SimpleReader + ?Sized,
{
    shortest(items, text, 0, items.len(), None)
}

fn compare_item<T, R>(item: &T, text: &mut R, max_length: Option<usize>) -> i32
where
    T: Coded,
    R: SimpleReader + ?Sized,
{
    text.reset();
    compare(text, &mut StringReverseReader::new(item.code()), max_length)
}

fn tighten(max_length: Option<usize>, agreed: usize) -> Option<usize> {
    Some(max_length.map_or(agreed, |limit| limit.min(agreed)))
}

// Half-open range [first, end)
fn longest<T, R>(
    items: &[T],
    text: &mut R,
    first: usize,
    end: usize,
    max_length: Option<usize>,
) -> Option<usize>
where
    T: Coded,
    R: SimpleReader + ?Sized,
{
    if end <= first {
        return None;
    }
    let middle = first + (end - 1 - first) / 2;

    match compare_item(&items[middle], text, max_length) {
        0 => longest(items, text, middle + 1, end, max_length).or(Some(middle)),
        cmp if cmp < 0 => longest(items, text, first, middle, max_length),
        1 => longest(items, text, middle + 1, end, max_length),
        cmp => {
            let agreed = (cmp - 1) as usize;
            longest(items, text, middle + 1, end, max_length)
                .or_else(|| longest(items, text, first, middle, tighten(max_length, agreed)))
        }
    }
}

fn shortest<T, R>(
    items: &[T],
    text: &mut R,
    first: usize,
    end: usize,
    max_length: Option<usize>,
) -> Option<usize>
where
    T: Coded,
    R: SimpleReader + ?Sized,
{
    if end <= first {
        return None;
    }
    let middle = first + (end - 1 - first) / 2;

    match compare_item(&items[middle], text, max_length) {
        0 => {
            // Only proper suffixes of this code can be shorter
            let shorter = items[middle].code().chars().count().saturating_sub(1);
            shortest(items, text, first, middle, tighten(max_length, shorter)).or(Some(middle))
        }
        cmp if cmp < 0 => shortest(items, text, first, middle, max_length),
        1 => shortest(items, text, middle + 1, end, max_length),
        cmp => {
            let agreed = (cmp - 1) as usize;
            shortest(items, text, first, middle, tighten(max_length, agreed))
                .or_else(|| shortest(items, text, middle + 1, end, max_length))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codetext::reader::compare_codes;

    struct Code(&'static str);

    impl Coded for Code {
        fn code(&self) -> &str {
            self.0
        }
    }

    fn sorted(codes: &[&'static str]) -> Vec<Code> {
        let mut items: Vec<Code> = codes.iter().map(|code| Code(code)).collect();
        items.sort_by(|a, b| compare_codes(a.0, b.0));
        items
    }

    fn longest_code(items: &[Code], text: &str) -> Option<&'static str> {
        longest_match(items, &mut StringReverseReader::new(text)).map(|index| items[index].0)
    }

    fn shortest_code(items: &[Code], text: &str) -> Option<&'static str> {
        shortest_match(items, &mut StringReverseReader::new(text)).map(|index| items[index].0)
    }

    #[test]
    fn nested_suffixes() {
        let items = sorted(&["a", "ba", "cba"]);
        assert_eq!(longest_code(&items, "xcba"), Some("cba"));
        assert_eq!(shortest_code(&items, "xcba"), Some("a"));
        assert_eq!(longest_code(&items, "xba"), Some("ba"));
        assert_eq!(shortest_code(&items, "xba"), Some("a"));
    }

    #[test]
    fn matches_separated_by_non_matching_codes() {
        let items = sorted(&["a", "aa", "ca", "dca", "zca", "b", "xyz"]);
        assert_eq!(longest_code(&items, "qdca"), Some("dca"));
        assert_eq!(shortest_code(&items, "qdca"), Some("a"));
        assert_eq!(longest_code(&items, "qqa"), Some("a"));
        assert_eq!(longest_code(&items, "xyz"), Some("xyz"));
    }

    #[test]
    fn no_match() {
        let items = sorted(&["btw", "omg", "lol"]);
        assert_eq!(longest_code(&items, "hello"), None);
        assert_eq!(shortest_code(&items, ""), None);
        assert_eq!(longest_code(&[], "btw"), None);
    }

    #[test]
    fn agrees_with_exhaustive_scan() {
        let codes = [
            "a", "aa", "ba", "aba", "cba", "bcba", "b", "ab", "bb", "cb", "c", "acc", "bc",
        ];
        let items = sorted(&codes);
        let texts = ["", "a", "xa", "aba", "cba", "bcba", "xbb", "acc", "zzc", "abcb", "ccb"];

        for text in texts {
            let matching: Vec<&str> = codes
                .iter()
                .copied()
                .filter(|code| text.ends_with(code))
                .collect();
            let expected_longest = matching.iter().copied().max_by_key(|code| code.len());
            let expected_shortest = matching.iter().copied().min_by_key(|code| code.len());

            assert_eq!(longest_code(&items, text), expected_longest, "longest {text:?}");
            assert_eq!(shortest_code(&items, text), expected_shortest, "shortest {text:?}");
        }
    }
}
