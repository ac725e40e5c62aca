/**
This module holds the datastructures shared by the whole crate: the `Span` (a typed entity mention),
the `SentenceRecord` (gold and predicted spans of one sentence) and the `SpanBag`, a multiset used to
check the membership of a span in one side of a sentence.
*/
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::{
    borrow::{Borrow, Cow},
    error::Error,
    fmt::Display,
    ops::Deref,
};

mod chunks;
mod depth;
mod nesting;

// Re-exporting
pub use chunks::{
    get_spans, get_spans_layered, spans_from_tag_sequence, Prefix, SpanChunkIter, TagConvention,
    TagSequence,
};
pub use depth::{DepthBucket, DepthBuckets};
pub(crate) use depth::merged_depth_buckets;
pub use nesting::{get_nestings, NestingCluster};

/// A span represents a named entity mention. It contains a start and an end (i.e. at what index of
/// the sentence does it start and end, both inclusive) and a tag, which is the type of the entity
/// (such as `Disease`, `PER`, `LOC`, etc.).
///
/// Two spans are equal if their tag, start and end are equal. Two spans with the same boundaries
/// but different tags are different entities.
///
/// Spans are (de)serialized as `(tag, start, end)` tuples. Deserialization goes through
/// `Span::try_new` and fails on a degenerate span.
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(
    try_from = "(String, usize, usize)",
    into = "(String, usize, usize)"
)]
pub struct Span<'a> {
    pub(crate) tag: Cow<'a, str>,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl<'a> Span<'a> {
    /// Builds a new span. Returns an error if `start > end`.
    ///
    /// * `tag`: Type of the entity, such as `"Disease"`.
    /// * `start`: Index of the first token of the entity.
    /// * `end`: Index of the last token of the entity (inclusive).
    pub fn try_new<T: Into<Cow<'a, str>>>(
        tag: T,
        start: usize,
        end: usize,
    ) -> Result<Self, DegenerateSpanError> {
        let tag = tag.into();
        if start > end {
            return Err(DegenerateSpanError {
                tag: tag.into_owned(),
                start,
                end,
            });
        }
        Ok(Span { tag, start, end })
    }

    pub fn tag(&self) -> &str {
        self.tag.borrow()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of tokens covered by the span.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// `(tag, start, end)` view of the span.
    pub fn as_tuple(&self) -> (&str, usize, usize) {
        (self.tag.borrow(), self.start, self.end)
    }

    /// Detaches the span from the string its tag was borrowed from.
    pub fn into_owned(self) -> Span<'static> {
        Span {
            tag: Cow::Owned(self.tag.into_owned()),
            start: self.start,
            end: self.end,
        }
    }

    /// Returns `true` if `other` lies inside `self`, boundaries included. A span contains itself.
    pub fn contains(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Returns `true` if `self` contains `other` with at least one boundary strictly outside of
    /// `other`. Spans with identical boundaries never strictly contain each other.
    pub fn strictly_contains(&self, other: &Span) -> bool {
        self.contains(other) && (self.start < other.start || self.end > other.end)
    }
}

impl<'a> Display for Span<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.tag, self.start, self.end)
    }
}

impl<'a> TryFrom<(&'a str, usize, usize)> for Span<'a> {
    type Error = DegenerateSpanError;
    fn try_from(value: (&'a str, usize, usize)) -> Result<Self, Self::Error> {
        Span::try_new(value.0, value.1, value.2)
    }
}

impl<'a> TryFrom<(String, usize, usize)> for Span<'a> {
    type Error = DegenerateSpanError;
    fn try_from(value: (String, usize, usize)) -> Result<Self, Self::Error> {
        Span::try_new(value.0, value.1, value.2)
    }
}

impl<'a> From<Span<'a>> for (String, usize, usize) {
    fn from(value: Span<'a>) -> Self {
        (value.tag.into_owned(), value.start, value.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Error returned when building a span whose start is after its end.
pub struct DegenerateSpanError {
    tag: String,
    start: usize,
    end: usize,
}

impl Display for DegenerateSpanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The span ({}, {}, {}) starts after its end",
            self.tag, self.start, self.end
        )
    }
}

impl Error for DegenerateSpanError {}

/// The gold and predicted spans of a single sentence. The order of insertion is preserved and
/// duplicated spans are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentenceRecord<'a> {
    pub(crate) gold: Vec<Span<'a>>,
    pub(crate) predicted: Vec<Span<'a>>,
}

impl<'a> SentenceRecord<'a> {
    pub fn new(gold: Vec<Span<'a>>, predicted: Vec<Span<'a>>) -> Self {
        SentenceRecord { gold, predicted }
    }

    /// Builds the record by running the span extractor on the gold and the predicted tags of a
    /// sentence.
    pub fn from_tags(gold: &[&'a str], predicted: &[&'a str], convention: TagConvention) -> Self {
        SentenceRecord {
            gold: get_spans(gold, convention),
            predicted: get_spans(predicted, convention),
        }
    }

    pub fn gold(&self) -> &[Span<'a>] {
        &self.gold
    }

    pub fn predicted(&self) -> &[Span<'a>] {
        &self.predicted
    }

    /// Appends the spans of `other` to the spans of `self`, side by side.
    pub fn extend(&mut self, other: SentenceRecord<'a>) {
        self.gold.extend(other.gold);
        self.predicted.extend(other.predicted);
    }

    pub fn into_owned(self) -> SentenceRecord<'static> {
        SentenceRecord {
            gold: self.gold.into_iter().map(Span::into_owned).collect(),
            predicted: self.predicted.into_iter().map(Span::into_owned).collect(),
        }
    }
}

/// Multiset of spans. Membership is "at least one equal span". The bag keeps a count per distinct
/// span instead of deduplicating: scores depend on duplicated spans being counted once per
/// occurrence when they are iterated over.
#[derive(Debug, Clone, Default)]
pub struct SpanBag<'s, 'a> {
    counts: AHashMap<&'s Span<'a>, usize>,
}

impl<'s, 'a> SpanBag<'s, 'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, span: &'s Span<'a>) {
        *self.counts.entry(span).or_insert(0) += 1;
    }

    pub fn contains(&self, span: &Span<'a>) -> bool {
        self.count(span) > 0
    }

    /// Number of occurrences of `span` in the bag.
    pub fn count(&self, span: &Span<'a>) -> usize {
        self.counts.get(span).copied().unwrap_or(0)
    }

    /// Total number of spans, duplicates included.
    pub fn len(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<'s, 'a> FromIterator<&'s Span<'a>> for SpanBag<'s, 'a> {
    fn from_iter<T: IntoIterator<Item = &'s Span<'a>>>(iter: T) -> Self {
        let mut bag = SpanBag::new();
        for span in iter {
            bag.insert(span);
        }
        bag
    }
}

/// Spans of a whole corpus, one `Vec` per sentence.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Spans<'a>(Vec<Vec<Span<'a>>>);

impl<'a> Deref for Spans<'a> {
    type Target = Vec<Vec<Span<'a>>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for Spans<'a> {
    type Item = Vec<Span<'a>>;
    type IntoIter = std::vec::IntoIter<Vec<Span<'a>>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> Spans<'a> {
    /// Extracts the spans of every sequence of tags.
    pub fn from_sequences(sequences: &[Vec<&'a str>], convention: TagConvention) -> Self {
        Spans(
            sequences
                .iter()
                .map(|sequence| get_spans(sequence, convention))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use rstest::rstest;
    use serde_jsonlines::JsonLinesReader;

    fn span(tag: &'static str, start: usize, end: usize) -> Span<'static> {
        Span::try_new(tag, start, end).unwrap()
    }

    #[test]
    fn test_degenerate_span_is_rejected() {
        let actual = Span::try_new("PER", 3, 2);
        assert!(actual.is_err());
        assert_eq!(
            actual.unwrap_err().to_string(),
            "The span (PER, 3, 2) starts after its end"
        );
    }

    #[rstest]
    #[case(span("Disease", 0, 2), span("Body Part", 2, 2), true, true)]
    #[case(span("Disease", 0, 2), span("Disease", 0, 2), true, false)]
    #[case(span("Disease", 0, 2), span("Drug", 0, 2), true, false)]
    #[case(span("Disease", 0, 2), span("Body Part", 0, 1), true, true)]
    #[case(span("Disease", 1, 2), span("Body Part", 0, 1), false, false)]
    #[case(span("Disease", 1, 1), span("Body Part", 0, 2), false, false)]
    fn test_containment(
        #[case] outer: Span,
        #[case] inner: Span,
        #[case] contains: bool,
        #[case] strictly_contains: bool,
    ) {
        assert_eq!(outer.contains(&inner), contains);
        assert_eq!(outer.strictly_contains(&inner), strictly_contains);
    }

    #[test]
    fn test_span_len_and_display() {
        let s = span("PER", 3, 5);
        assert_eq!(s.len(), 3);
        assert_eq!(s.to_string(), "(PER, 3, 5)");
        assert_eq!(s.as_tuple(), ("PER", 3, 5));
    }

    #[test]
    fn test_span_equality_is_structural() {
        let borrowed = span("PER", 0, 1);
        let owned = Span::try_new(String::from("PER"), 0, 1).unwrap();
        assert_eq!(borrowed, owned);
        assert_ne!(borrowed, span("LOC", 0, 1));
    }

    #[test]
    fn test_span_bag_counts_duplicates() {
        let spans = [span("PER", 0, 1), span("PER", 0, 1), span("LOC", 3, 3)];
        let bag: SpanBag = spans.iter().collect();
        assert_eq!(bag.count(&span("PER", 0, 1)), 2);
        assert_eq!(bag.count(&span("LOC", 3, 3)), 1);
        assert!(!bag.contains(&span("LOC", 0, 1)));
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn test_sentence_record_from_tags() {
        let gold = ["B-Disease", "I-Disease", "I-Disease"];
        let pred = ["O", "O", "B-Disease"];
        let record = SentenceRecord::from_tags(&gold, &pred, TagConvention::default());
        assert_eq!(record.gold(), &[span("Disease", 0, 2)]);
        assert_eq!(record.predicted(), &[span("Disease", 2, 2)]);
    }

    #[test]
    fn test_sentence_record_extend() {
        let mut record = SentenceRecord::new(vec![span("PER", 0, 1)], vec![]);
        record.extend(SentenceRecord::new(
            vec![span("ORG", 0, 1)],
            vec![span("ORG", 0, 1)],
        ));
        assert_eq!(record.gold(), &[span("PER", 0, 1), span("ORG", 0, 1)]);
        assert_eq!(record.predicted(), &[span("ORG", 0, 1)]);
    }

    #[test]
    fn test_spans_from_sequences() {
        let sequences = vec![
            vec!["B-PER", "I-PER", "O", "B-LOC"],
            vec![
                "B-GEO", "I-GEO", "O", "B-GEO", "O", "B-PER", "I-PER", "I-PER", "B-LOC",
            ],
        ];
        let spans = Spans::from_sequences(&sequences, TagConvention::default());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], vec![span("PER", 0, 1), span("LOC", 3, 3)]);
        assert_eq!(
            spans[1],
            vec![
                span("GEO", 0, 1),
                span("GEO", 3, 3),
                span("PER", 5, 7),
                span("LOC", 8, 8)
            ]
        );
    }

    #[test]
    fn test_propertie_try_new() {
        fn propertie_start_not_after_end(tag: String, start: usize, end: usize) -> TestResult {
            match Span::try_new(tag, start, end) {
                Ok(s) => TestResult::from_bool(s.start() <= s.end()),
                Err(_) => TestResult::from_bool(start > end),
            }
        }
        let mut qc = quickcheck::QuickCheck::new().tests(1000);
        qc.quickcheck(propertie_start_not_after_end as fn(String, usize, usize) -> TestResult)
    }

    #[test]
    fn test_deserialized_span_is_validated() {
        let content = "[\"PER\", 0, 1]\n[\"PER\", 3, 1]\n";
        let mut reader = JsonLinesReader::new(content.as_bytes());
        assert_eq!(
            reader.read::<Span<'static>>().unwrap(),
            Some(span("PER", 0, 1))
        );
        assert!(reader.read::<Span<'static>>().is_err());
    }

    #[rstest]
    #[case("{\"gold\": [[\"Disease\", 0, 2]], \"predicted\": []}", true)]
    #[case("{\"gold\": [[\"Disease\", 2, 0]], \"predicted\": []}", false)]
    #[case("{\"gold\": [], \"predicted\": [[\"Body\", 5, 4]]}", false)]
    fn test_deserialized_sentence_rejects_degenerate_spans(
        #[case] line: &str,
        #[case] is_ok: bool,
    ) {
        let mut reader = JsonLinesReader::new(line.as_bytes());
        let actual = reader.read::<SentenceRecord<'static>>();
        assert_eq!(actual.is_ok(), is_ok);
    }
}
