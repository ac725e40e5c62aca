/**
This module converts a sequence of tags (`B-PER`, `I-PER`, `O`, ...) into spans. It is lenient: any
combination of the `O`, `B`, `I`, `E` and `S` prefixes is accepted and malformed tags only produce a
warning.
*/
use crate::entity::Span;
use either::Either;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt::Display,
    iter::once,
    mem::take,
};

/// Sequence of tags for a sentence. `Left` is a flat sequence of tags, `Right` is a list of layers
/// of tags (e.g. one layer per entity type, produced by upstream annotation).
pub type TagSequence<'a> = Either<Vec<&'a str>, Vec<Vec<&'a str>>>;

const OUTSIDE: &str = "O";

/// Where the prefix of a tag is located and what separates it from the entity type.
///
/// With `suffix == false`, tags look like `B-PER`. With `suffix == true`, tags look like `PER-B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagConvention {
    pub(crate) suffix: bool,
    pub(crate) delimiter: char,
}

impl Default for TagConvention {
    fn default() -> Self {
        TagConvention {
            suffix: false,
            delimiter: '-',
        }
    }
}

impl TagConvention {
    pub fn new(suffix: bool, delimiter: char) -> Self {
        TagConvention { suffix, delimiter }
    }

    pub fn is_suffix(&self) -> bool {
        self.suffix
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Emits a warning if the tag is not one of `O`, `B`, `I`, `E`, `S` and does not follow the
    /// convention.
    fn validate(&self, chunk: &str) {
        if matches!(chunk, "O" | "B" | "I" | "E" | "S") {
            return;
        }
        let delimiter = self.delimiter;
        let is_valid = ['B', 'I', 'E', 'S'].into_iter().any(|p| {
            if self.suffix {
                chunk
                    .strip_suffix(p)
                    .is_some_and(|rest| rest.ends_with(delimiter))
            } else {
                chunk
                    .strip_prefix(p)
                    .is_some_and(|rest| rest.starts_with(delimiter))
            }
        });
        if !is_valid {
            warn!("{} seems not to be NE tag.", chunk);
        }
    }

    /// Splits the tag into its prefix and its entity type. An empty type is replaced by `_`.
    fn decode<'a>(&self, chunk: &'a str) -> (Prefix, Cow<'a, str>) {
        let decoded = if self.suffix {
            chunk.chars().next_back().map(|c| {
                let rest = &chunk[..chunk.len() - c.len_utf8()];
                (c, rest.rsplitn(2, self.delimiter).last().unwrap_or(""))
            })
        } else {
            chunk.chars().next().map(|c| {
                let rest = &chunk[c.len_utf8()..];
                (c, rest.splitn(2, self.delimiter).last().unwrap_or(""))
            })
        };
        match decoded {
            Some((c, "")) => (Prefix::from(c), Cow::Borrowed("_")),
            Some((c, chunk_type)) => (Prefix::from(c), Cow::Borrowed(chunk_type)),
            None => (Prefix::O, Cow::Borrowed("_")),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
/// Position of a token inside a chunk. Any character that is not one of the five known prefixes is
/// kept as `Other`.
pub enum Prefix {
    I,
    O,
    B,
    E,
    S,
    Other(char),
}

impl From<char> for Prefix {
    fn from(value: char) -> Self {
        match value {
            'I' => Self::I,
            'O' => Self::O,
            'B' => Self::B,
            'E' => Self::E,
            'S' => Self::S,
            c => Self::Other(c),
        }
    }
}

impl Prefix {
    /// `O` and `.` both mark a token outside of any chunk.
    fn is_outside(&self) -> bool {
        matches!(self, Prefix::O | Prefix::Other('.'))
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(c) => write!(f, "{}", c),
            p => write!(f, "{:?}", p),
        }
    }
}

/// This wrapper around the content iterator appends a single `"O"` at the end of its inner
/// iterator.
struct InnerChunkIter<I> {
    content: I,
    is_at_end: bool,
}

impl<'a, I: Iterator<Item = &'a str>> InnerChunkIter<I> {
    fn new(content: I) -> Self {
        InnerChunkIter {
            content,
            is_at_end: false,
        }
    }
}

impl<'a, I: Iterator<Item = &'a str>> Iterator for InnerChunkIter<I> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        match self.content.next() {
            Some(chunk) => Some(chunk),
            None if self.is_at_end => None,
            None => {
                self.is_at_end = true;
                Some(OUTSIDE)
            }
        }
    }
}

/// This struct iterates over a *single* sequence of tags and returns the spans found in it.
pub struct SpanChunkIter<'a, I: Iterator<Item = &'a str>> {
    /// The tags on which we are iterating
    inner: InnerChunkIter<I>,
    /// The prefix of the previous tag (e.g. 'I')
    prev_prefix: Prefix,
    /// The type of the previous tag (e.g. `"PER"`)
    prev_type: Cow<'a, str>,
    begin_offset: usize,
    convention: TagConvention,
    index: usize,
}

impl<'a, I: Iterator<Item = &'a str>> SpanChunkIter<'a, I> {
    pub fn new(sequence: I, convention: TagConvention) -> Self {
        SpanChunkIter {
            inner: InnerChunkIter::new(sequence),
            prev_prefix: Prefix::O,
            prev_type: Cow::Borrowed(""),
            begin_offset: 0,
            convention,
            index: 0,
        }
    }
}

impl<'a, I: Iterator<Item = &'a str>> Iterator for SpanChunkIter<'a, I> {
    type Item = Span<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chunk = self.inner.next()?; // no more chunks. We are done
            self.convention.validate(chunk);
            let (prefix, chunk_type) = self.convention.decode(chunk);
            let is_end = self.end_of_chunk(&prefix, &chunk_type);
            let is_start = self.start_of_chunk(&prefix, &chunk_type);
            let finished = is_end.then(|| Span {
                tag: take(&mut self.prev_type),
                start: self.begin_offset,
                end: self.index - 1,
            });
            if is_start {
                self.begin_offset = self.index;
            }
            self.prev_prefix = prefix;
            self.prev_type = chunk_type;
            self.index += 1;
            if finished.is_some() {
                return finished;
            }
        }
    }
}

impl<'a, I: Iterator<Item = &'a str>> SpanChunkIter<'a, I> {
    /// Checks if a chunk ended between the previous and current tag.
    fn end_of_chunk(&self, current_prefix: &Prefix, current_type: &Cow<'a, str>) -> bool {
        match (self.prev_prefix, current_prefix) {
            (Prefix::E, _) => true,
            (Prefix::S, _) => true,
            (Prefix::B, Prefix::B) => true,
            (Prefix::B, Prefix::S) => true,
            (Prefix::B, Prefix::O) => true,
            (Prefix::I, Prefix::B) => true,
            (Prefix::I, Prefix::S) => true,
            (Prefix::I, Prefix::O) => true,
            (prev_prefix, _) => !prev_prefix.is_outside() && &self.prev_type != current_type,
        }
    }

    /// Checks if a chunk started between the previous and current tag.
    fn start_of_chunk(&self, current_prefix: &Prefix, current_type: &Cow<'a, str>) -> bool {
        match (self.prev_prefix, current_prefix) {
            (_, Prefix::B) => true,
            (_, Prefix::S) => true,
            (Prefix::E, Prefix::E) => true,
            (Prefix::E, Prefix::I) => true,
            (Prefix::S, Prefix::E) => true,
            (Prefix::S, Prefix::I) => true,
            (Prefix::O, Prefix::E) => true,
            (Prefix::O, Prefix::I) => true,
            (_, curr_prefix) => !curr_prefix.is_outside() && &self.prev_type != current_type,
        }
    }
}

/// Retrieves the spans of a flat sequence of tags.
///
/// ```rust
/// use nested_ner_eval::{get_spans, TagConvention};
///
/// let spans = get_spans(&["B-PER", "I-PER", "O", "B-LOC"], TagConvention::default());
/// let tuples: Vec<_> = spans.iter().map(|s| s.as_tuple()).collect();
/// assert_eq!(tuples, vec![("PER", 0, 1), ("LOC", 3, 3)]);
/// ```
pub fn get_spans<'a>(sequence: &[&'a str], convention: TagConvention) -> Vec<Span<'a>> {
    SpanChunkIter::new(sequence.iter().copied(), convention).collect()
}

/// Retrieves the spans of a layered sequence of tags. Every layer is followed by an `"O"` before
/// the layers are concatenated, so the indices of the spans refer to the concatenated sequence.
pub fn get_spans_layered<'a>(layers: &[Vec<&'a str>], convention: TagConvention) -> Vec<Span<'a>> {
    let concatenated = layers
        .iter()
        .flat_map(|layer| layer.iter().copied().chain(once(OUTSIDE)));
    SpanChunkIter::new(concatenated, convention).collect()
}

/// Retrieves the spans of a flat or layered sequence of tags.
pub fn spans_from_tag_sequence<'a>(
    sequence: &TagSequence<'a>,
    convention: TagConvention,
) -> Vec<Span<'a>> {
    match sequence {
        Either::Left(flat) => get_spans(flat, convention),
        Either::Right(layers) => get_spans_layered(layers, convention),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enum_iterator::{all, Sequence};
    use quickcheck::TestResult;
    use rstest::rstest;

    fn tuples<'a>(spans: &'a [Span<'a>]) -> Vec<(&'a str, usize, usize)> {
        spans.iter().map(|s| s.as_tuple()).collect()
    }

    #[test]
    fn test_get_spans() {
        let seq = vec![
            "O", "O", "O", "B-MISC", "I-MISC", "I-MISC", "O", "B-PER", "I-PER",
        ];
        let spans = get_spans(&seq, TagConvention::default());
        assert_eq!(tuples(&spans), vec![("MISC", 3, 5), ("PER", 7, 8)]);
    }

    #[test]
    fn test_get_spans_with_suffix() {
        let seq = vec![
            "O", "O", "O", "MISC-B", "MISC-I", "MISC-I", "O", "PER-B", "PER-I",
        ];
        let spans = get_spans(&seq, TagConvention::new(true, '-'));
        assert_eq!(tuples(&spans), vec![("MISC", 3, 5), ("PER", 7, 8)]);
    }

    #[rstest]
    #[case(vec!["B-PER", "I-PER", "O", "O", "O"], vec![("PER", 0, 1)])]
    #[case(vec!["B-PER", "B-PER"], vec![("PER", 0, 0), ("PER", 1, 1)])]
    #[case(vec!["B-PER", "I-PER", "O", "B-LOC"], vec![("PER", 0, 1), ("LOC", 3, 3)])]
    #[case(vec!["S-PER", "B-LOC", "I-LOC", "E-LOC", "O"], vec![("PER", 0, 0), ("LOC", 1, 3)])]
    #[case(vec!["I-PER", "I-PER", "O"], vec![("PER", 0, 1)])]
    #[case(vec!["B-PER", "I-LOC"], vec![("PER", 0, 0), ("LOC", 1, 1)])]
    #[case(vec!["E-PER", "E-PER"], vec![("PER", 0, 0), ("PER", 1, 1)])]
    #[case(vec!["B-PER", "I-PER", "I-PER"], vec![("PER", 0, 2)])]
    #[case(vec!["O", "O"], vec![])]
    #[case(vec![], vec![])]
    fn test_get_spans_cases(
        #[case] seq: Vec<&'static str>,
        #[case] expected: Vec<(&'static str, usize, usize)>,
    ) {
        let spans = get_spans(&seq, TagConvention::default());
        assert_eq!(tuples(&spans), expected);
    }

    #[test]
    fn test_get_spans_without_type() {
        let spans = get_spans(&["B", "I", "O"], TagConvention::default());
        assert_eq!(tuples(&spans), vec![("_", 0, 1)]);
    }

    #[test]
    fn test_get_spans_custom_delimiter() {
        let spans = get_spans(&["B_Body Part", "I_Body Part"], TagConvention::new(false, '_'));
        assert_eq!(tuples(&spans), vec![("Body Part", 0, 1)]);
    }

    #[test]
    fn test_malformed_tag_does_not_stop_extraction() {
        let spans = get_spans(&["X-PER", "B-LOC", ""], TagConvention::default());
        assert_eq!(tuples(&spans), vec![("PER", 0, 0), ("LOC", 1, 1)]);
    }

    #[test]
    fn test_malformed_tags_are_warned_about() {
        testing_logger::setup();
        get_spans(&["X-PER", "B-LOC", ""], TagConvention::default());
        testing_logger::validate(|captured_logs| {
            let bodies: Vec<&str> = captured_logs.iter().map(|l| l.body.as_str()).collect();
            assert_eq!(
                bodies,
                vec!["X-PER seems not to be NE tag.", " seems not to be NE tag."]
            );
            assert!(captured_logs.iter().all(|l| l.level == log::Level::Warn));
        });
    }

    #[rstest]
    #[case(vec!["B-PER", "I-PER", "O", "E-LOC", "S-LOC"], TagConvention::default())]
    #[case(vec!["PER-B", "PER-I", "O", "B"], TagConvention::new(true, '-'))]
    fn test_valid_tags_are_not_warned_about(
        #[case] seq: Vec<&'static str>,
        #[case] convention: TagConvention,
    ) {
        testing_logger::setup();
        get_spans(&seq, convention);
        testing_logger::validate(|captured_logs| assert!(captured_logs.is_empty()));
    }

    #[test]
    fn test_dot_is_outside() {
        let spans = get_spans(&["B-PER", ".", "B-PER"], TagConvention::default());
        assert_eq!(tuples(&spans), vec![("PER", 0, 0), ("PER", 2, 2)]);
    }

    #[test]
    fn test_get_spans_layered() {
        let layers = vec![vec!["B-Disease", "I-Disease", "I-Disease"], vec!["O", "O", "B-Body"]];
        let spans = get_spans_layered(&layers, TagConvention::default());
        assert_eq!(tuples(&spans), vec![("Disease", 0, 2), ("Body", 6, 6)]);
    }

    #[test]
    fn test_spans_from_tag_sequence() {
        let flat: TagSequence = Either::Left(vec!["B-PER", "I-PER"]);
        let layered: TagSequence = Either::Right(vec![vec!["B-PER", "I-PER"]]);
        let convention = TagConvention::default();
        assert_eq!(
            spans_from_tag_sequence(&flat, convention),
            spans_from_tag_sequence(&layered, convention)
        );
    }

    #[test]
    fn test_decode() {
        let prefix = TagConvention::default();
        assert_eq!(prefix.decode("B-PER"), (Prefix::B, Cow::Borrowed("PER")));
        assert_eq!(prefix.decode("O"), (Prefix::O, Cow::Borrowed("_")));
        assert_eq!(prefix.decode("I-A-B"), (Prefix::I, Cow::Borrowed("A-B")));
        let suffix = TagConvention::new(true, '-');
        assert_eq!(suffix.decode("A-B-E"), (Prefix::E, Cow::Borrowed("A-B")));
        assert_eq!(suffix.decode("S"), (Prefix::S, Cow::Borrowed("_")));
        assert_eq!(prefix.decode(""), (Prefix::O, Cow::Borrowed("_")));
    }

    #[derive(Debug, PartialEq, Hash, Clone, Sequence, Eq)]
    enum TagsToTest {
        BPER,
        BGEO,
        BLOC,
        O,
    }

    impl From<TagsToTest> for &str {
        fn from(value: TagsToTest) -> Self {
            match value {
                TagsToTest::BPER => "B-PER",
                TagsToTest::BLOC => "B-LOC",
                TagsToTest::BGEO => "B-GEO",
                TagsToTest::O => "O",
            }
        }
    }

    impl quickcheck::Arbitrary for TagsToTest {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let choice_slice: Vec<TagsToTest> = all::<TagsToTest>().collect();
            g.choose(choice_slice.as_ref()).unwrap().clone()
        }
    }

    #[test]
    fn test_propertie_single_token_spans() {
        #[allow(non_snake_case)]
        fn propertie_B_and_O_only(tags: Vec<TagsToTest>) -> TestResult {
            let seq: Vec<&str> = tags.iter().cloned().map(<&str>::from).collect();
            let expected = seq.iter().filter(|t| **t != "O").count();
            let spans = get_spans(&seq, TagConvention::default());
            let all_single = spans.iter().all(|s| s.start() == s.end());
            TestResult::from_bool(all_single && spans.len() == expected)
        }
        let mut qc = quickcheck::QuickCheck::new().tests(2000);
        qc.quickcheck(propertie_B_and_O_only as fn(Vec<TagsToTest>) -> TestResult)
    }
}
