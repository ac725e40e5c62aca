/**
This modules gives a few tools to prettyprint the output of the policies, the length buckets and the
depth buckets, along with their overall averages.
*/
use crate::entity::DepthBucket;
use crate::metrics::Policy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// The reporter holds one row of metrics per policy or per bucket. It can be used to display the
/// results (i.e. prettyprint them) as if they were collected into a dataframe and can be consumed
/// to obtain a `HashSet` containing the rows. The reporter can be built with the
/// `nested_ner_report`, `length_report` and `depth_report` functions.
///
/// # Example
///
/// ```rust
/// use nested_ner_eval::{nested_ner_report, SentenceRecord, Span};
///
/// let gold = vec![
///     Span::try_new("Body Part", 2, 2).unwrap(),
///     Span::try_new("Disease", 0, 2).unwrap(),
/// ];
/// let predicted = vec![Span::try_new("Disease", 0, 2).unwrap()];
/// let reporter = nested_ner_report(&[SentenceRecord::new(gold, predicted)]);
///
/// let expected_report = "Metric, Precision, Recall, Fscore, Support
/// Standard, 1, 0.5, 0.6666667, 2
/// Flat, 0, 0, 0, 0
/// Inner, 0, 0, 0, 1
/// Outer, 1, 1, 1, 1
/// Nested, 1, 0.5, 0.6666667, 2
/// Nesting, 0, 0, 0, 1\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Reporter {
    pub(crate) rows: BTreeSet<RowMetrics>,
}

/// By converting the reporter into a `HashSet` of `RowMetrics`, you lose the ordering of the rows.
/// If you mean to consume the data without prettypriting it, this is not a problem.
impl From<Reporter> for HashSet<RowMetrics> {
    fn from(value: Reporter) -> Self {
        value.rows.into_iter().collect()
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, row: RowMetrics) -> bool {
        self.rows.insert(row)
    }

    /// Returns the row with the given key, if any.
    pub fn get(&self, key: &ReportKey) -> Option<&RowMetrics> {
        self.rows.iter().find(|row| &row.key == key)
    }

    /// Iterates over the rows in display order.
    pub fn iter(&self) -> impl Iterator<Item = &RowMetrics> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Metric, Precision, Recall, Fscore, Support")?;
        for row in self.rows.iter() {
            writeln!(f, "{}", row)?
        }
        Ok(())
    }
}

/// Identifies a row of a report. Rows are ordered by kind (policies, then length buckets, then
/// depth buckets, then overall averages) and then by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportKey {
    Policy(Policy),
    Length(usize),
    Depth(DepthBucket),
    Overall(OverallAverage),
}

impl Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Policy(policy) => write!(f, "{}", policy),
            Self::Length(length) => write!(f, "Length_{}", length),
            Self::Depth(bucket) => write!(f, "Depth_{}", bucket),
            Self::Overall(average) => write!(f, "{}", average),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// Metrics of a single row. Two rows are equal if they have the same key, whatever their metrics
/// are. They implement a special version of the `Display` trait, allowing them to be treated as the
/// line of a dataframe.
pub struct RowMetrics {
    /// The policy or the bucket of this row, such as `Nesting` or `Length_2`.
    pub key: ReportKey,
    /// The average used to compute this row's metrics
    pub average: Average,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    pub support: usize,
}

impl Hash for RowMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialEq for RowMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for RowMetrics {}

impl PartialOrd for RowMetrics {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RowMetrics {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl RowMetrics {
    pub(crate) fn new(key: ReportKey, precision: f32, recall: f32, fscore: f32, support: usize) -> Self {
        RowMetrics {
            key,
            average: Average::None,
            precision,
            recall,
            fscore,
            support,
        }
    }

    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f32,
        recall: f32,
        fscore: f32,
        support: usize,
    ) -> Self {
        RowMetrics {
            key: ReportKey::Overall(average),
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

/// The RowMetrics struct acts as a line in a dataframe when displayed.
impl Display for RowMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.key, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the different types of averaging over buckets. &str can be parsed to create an
/// `Average`.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    None,
    Micro,
    Macro,
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct AverageParsingError(String);

impl Display for AverageParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an Average",
            self.0
        )
    }
}
impl Error for AverageParsingError {}

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl OverallAverage {
    pub(crate) const ALL: [OverallAverage; 3] = [
        OverallAverage::Micro,
        OverallAverage::Macro,
        OverallAverage::Weighted,
    ];
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}

/// Every report of an evaluation run: one row per policy, one row per span length and one row per
/// depth bucket.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct EvaluationReport {
    pub policies: Reporter,
    pub lengths: Reporter,
    pub depths: Reporter,
}

impl Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.policies)?;
        writeln!(f, "{}", self.lengths)?;
        write!(f, "{}", self.depths)
    }
}
