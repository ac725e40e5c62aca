/**
This module reads prediction files in a column format and merges the runs made on different entity
types.

A prediction file holds one token per line, with at least three whitespace-separated columns: the
token, its gold tag and its predicted tag. Sentences are separated by blank lines. The predicted
column is mandatory: a token line with only two columns is rejected with `ReadError::MissingColumn`
instead of being read as a sentence without predictions.

```text
Barack      B-PER   B-PER
Obama       I-PER   I-PER
is          O       O
a           O       O
politician  O       O
```
*/
use crate::entity::{get_spans, SentenceRecord, TagConvention};
use crate::metrics::InconsistentLengthError;
use log::{debug, warn};
use std::error::Error;
use std::fmt::Display;
use std::io::BufRead;

#[derive(Debug)]
/// Enum error encompassing the failures that could happen when reading a prediction file.
pub enum ReadError {
    Io(std::io::Error),
    /// The line (1-indexed) has fewer than three columns.
    MissingColumn {
        line: usize,
    },
    InconsistentLength(InconsistentLengthError),
}

impl Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(io_err) => std::fmt::Display::fmt(io_err, f),
            Self::MissingColumn { line } => write!(
                f,
                "Line {} should contain a token, a gold tag and a predicted tag",
                line
            ),
            Self::InconsistentLength(length_err) => std::fmt::Display::fmt(length_err, f),
        }
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(io_err) => Some(io_err),
            Self::InconsistentLength(length_err) => Some(length_err),
            Self::MissingColumn { .. } => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<InconsistentLengthError> for ReadError {
    fn from(value: InconsistentLengthError) -> Self {
        Self::InconsistentLength(value)
    }
}

/// Gold and predicted tags of the sentence being read.
#[derive(Default)]
struct SentenceColumns {
    gold: Vec<String>,
    predicted: Vec<String>,
}

impl SentenceColumns {
    fn is_empty(&self) -> bool {
        self.gold.is_empty()
    }

    fn to_record(&self, convention: TagConvention) -> SentenceRecord<'static> {
        let gold: Vec<&str> = self.gold.iter().map(String::as_str).collect();
        let predicted: Vec<&str> = self.predicted.iter().map(String::as_str).collect();
        SentenceRecord::new(
            get_spans(&gold, convention),
            get_spans(&predicted, convention),
        )
        .into_owned()
    }
}

/// Reads a prediction file and extracts the gold and predicted spans of every sentence. Blank
/// lines and lines made only of whitespaces end a sentence. Consecutive blank lines do not produce
/// empty sentences.
///
/// ```rust
/// use nested_ner_eval::{read_prediction_columns, TagConvention};
///
/// let content = "Barack B-PER B-PER\nObama I-PER O\n\nParis B-LOC B-LOC\n";
/// let sentences = read_prediction_columns(content.as_bytes(), TagConvention::default()).unwrap();
/// assert_eq!(sentences.len(), 2);
/// assert_eq!(sentences[0].gold()[0].as_tuple(), ("PER", 0, 1));
/// assert_eq!(sentences[0].predicted()[0].as_tuple(), ("PER", 0, 0));
/// ```
pub fn read_prediction_columns<R: BufRead>(
    reader: R,
    convention: TagConvention,
) -> Result<Vec<SentenceRecord<'static>>, ReadError> {
    let mut sentences = Vec::new();
    let mut current = SentenceColumns::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let mut columns = line.split_whitespace();
        let Some(_token) = columns.next() else {
            if !current.is_empty() {
                sentences.push(current.to_record(convention));
                current = SentenceColumns::default();
            }
            continue;
        };
        match (columns.next(), columns.next()) {
            (Some(gold), Some(predicted)) => {
                current.gold.push(String::from(gold));
                current.predicted.push(String::from(predicted));
            }
            _ => return Err(ReadError::MissingColumn { line: index + 1 }),
        }
    }
    if !current.is_empty() {
        sentences.push(current.to_record(convention));
    }
    debug!("Read {} sentences", sentences.len());
    Ok(sentences)
}

/// Merges the sentences of runs made on different entity types. The first run defines the
/// sentences and the spans of every following run are appended to the sentence at the same
/// position. Every run must hold the same number of sentences.
///
/// ```rust
/// use nested_ner_eval::{merge_predictions, SentenceRecord, Span};
///
/// let per = vec![SentenceRecord::new(
///     vec![Span::try_new("PER", 0, 1).unwrap()],
///     vec![Span::try_new("PER", 0, 1).unwrap()],
/// )];
/// let org = vec![SentenceRecord::new(vec![], vec![Span::try_new("ORG", 0, 1).unwrap()])];
/// let merged = merge_predictions(vec![per, org]).unwrap();
/// assert_eq!(merged[0].gold().len(), 1);
/// assert_eq!(merged[0].predicted().len(), 2);
/// ```
pub fn merge_predictions<'a>(
    runs: Vec<Vec<SentenceRecord<'a>>>,
) -> Result<Vec<SentenceRecord<'a>>, InconsistentLengthError> {
    let mut runs = runs.into_iter();
    let Some(mut merged) = runs.next() else {
        return Ok(Vec::new());
    };
    for run in runs {
        if run.len() != merged.len() {
            warn!(
                "Cannot merge a run of {} sentences into a run of {} sentences",
                run.len(),
                merged.len()
            );
            return Err(InconsistentLengthError(merged.len(), run.len()));
        }
        for (sentence, other) in merged.iter_mut().zip(run) {
            sentence.extend(other);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Span;
    use rstest::rstest;

    fn span(tag: &'static str, start: usize, end: usize) -> Span<'static> {
        Span::try_new(tag, start, end).unwrap()
    }

    #[test]
    fn test_read_prediction_columns() {
        let content = "Lung B-Disease B-Disease\ncancer I-Disease I-Disease\n  \n\n\nAspirin B-Drug O\n";
        let sentences = read_prediction_columns(content.as_bytes(), TagConvention::default()).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].gold(), &[span("Disease", 0, 1)]);
        assert_eq!(sentences[0].predicted(), &[span("Disease", 0, 1)]);
        assert_eq!(sentences[1].gold(), &[span("Drug", 0, 0)]);
        assert!(sentences[1].predicted().is_empty());
    }

    #[rstest]
    #[case("Barack B-PER\n", 1)]
    #[case("Barack B-PER B-PER\nObama\n", 2)]
    #[case("Barack B-PER B-PER\n\nObama I-PER\n", 3)]
    fn test_missing_column(#[case] content: &str, #[case] line: usize) {
        let actual = read_prediction_columns(content.as_bytes(), TagConvention::default());
        assert!(matches!(actual, Err(ReadError::MissingColumn { line: l }) if l == line));
    }

    #[test]
    fn test_read_empty_file() {
        let sentences = read_prediction_columns("\n\n".as_bytes(), TagConvention::default()).unwrap();
        assert!(sentences.is_empty());
    }

    #[test]
    fn test_merge_predictions() {
        let per = vec![
            SentenceRecord::new(vec![span("PER", 0, 1)], vec![span("PER", 0, 1)]),
            SentenceRecord::new(vec![], vec![]),
        ];
        let org = vec![
            SentenceRecord::new(vec![], vec![span("ORG", 0, 1)]),
            SentenceRecord::new(vec![span("ORG", 2, 2)], vec![]),
        ];
        let merged = merge_predictions(vec![per, org]).unwrap();
        assert_eq!(merged[0].gold(), &[span("PER", 0, 1)]);
        assert_eq!(merged[0].predicted(), &[span("PER", 0, 1), span("ORG", 0, 1)]);
        assert_eq!(merged[1].gold(), &[span("ORG", 2, 2)]);
    }

    #[test]
    fn test_merge_predictions_rejects_different_lengths() {
        let first = vec![SentenceRecord::default(), SentenceRecord::default()];
        let second = vec![SentenceRecord::default()];
        assert_eq!(
            merge_predictions(vec![first, second]),
            Err(InconsistentLengthError(2, 1))
        );
        assert_eq!(merge_predictions(vec![]), Ok(vec![]));
    }
}
