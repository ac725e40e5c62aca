/**
This module computes the metrics (precision, recall, f-score, support) of the gold and predicted spans
of a corpus under the different counting policies, by span length and by nesting depth.
*/
use crate::entity::{
    get_nestings, merged_depth_buckets, DepthBucket, NestingCluster, SentenceRecord, Span, SpanBag,
};
use crate::reporter::{Average, EvaluationReport, OverallAverage, ReportKey, Reporter, RowMetrics};
use ahash::AHashSet;
use core::fmt;
use enum_iterator::{all, Sequence};
use itertools::multizip;
use ndarray::{prelude::*, Data, Zip};
use ndarray_stats::{errors::MultiInputError, SummaryStatisticsExt};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::Display,
    ops::{Add, AddAssign},
    str::FromStr,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNotUniqueOrEmpty(usize);

impl Display for ArrayNotUniqueOrEmpty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "This array contains more than one element or is empty. It has length: {} Cannot call `item` on it", self.0
        )
    }
}
impl Error for ArrayNotUniqueOrEmpty {}

trait ItemArrayExt<Output> {
    /// Returns the element out of the Array. Can return an error if the array is empty of if the
    /// array has a length superior to 1.
    fn item(&self) -> Result<Output, ArrayNotUniqueOrEmpty>;
}

impl<F: Clone, T: Data<Elem = F>> ItemArrayExt<F> for ArrayBase<T, Ix1> {
    fn item(&self) -> Result<F, ArrayNotUniqueOrEmpty> {
        match (self.len(), self.first()) {
            (1, Some(value)) => Ok(value.clone()),
            (n, _) => Err(ArrayNotUniqueOrEmpty(n)),
        }
    }
}

/// Counting policy. Each policy defines what a unit is (a span, a cluster member, a whole cluster)
/// and when a unit matches.
///
/// * `Standard`: every span.
/// * `Flat`: spans belonging to no nesting cluster.
/// * `Inner`: every member of a cluster except its outer span.
/// * `Outer`: the outer span of every cluster.
/// * `Nested`: every member of every cluster.
/// * `Nesting`: whole clusters, matched by their ordered members.
///
/// Apart from `Nesting`, a unit matches if an equal span exists on the other side, in the full span
/// set of the other side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum Policy {
    Standard,
    Flat,
    Inner,
    Outer,
    Nested,
    Nesting,
}

impl Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Policy {
    type Err = PolicyParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Policy::Standard),
            "flat" => Ok(Policy::Flat),
            "inner" => Ok(Policy::Inner),
            "outer" => Ok(Policy::Outer),
            "nested" => Ok(Policy::Nested),
            "nesting" => Ok(Policy::Nesting),
            _ => Err(PolicyParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PolicyParsingError(String);

impl Display for PolicyParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Impossible to parse the string ({}) into a Policy", self.0)
    }
}
impl Error for PolicyParsingError {}

/// Which reference the spans of a depth bucket are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthMatching {
    /// The spans of a bucket are matched against every span of the other side.
    #[default]
    Relaxed,
    /// The spans of a bucket are matched against the same bucket of the other side.
    Strict,
}

impl Display for DepthMatching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for DepthMatching {
    type Err = DepthMatchingParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relaxed" => Ok(DepthMatching::Relaxed),
            "strict" => Ok(DepthMatching::Strict),
            _ => Err(DepthMatchingParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DepthMatchingParsingError(String);

impl Display for DepthMatchingParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a DepthMatching",
            self.0
        )
    }
}
impl Error for DepthMatchingParsingError {}

/// True positives, false positives, false negatives and support of a policy or of a bucket.
/// `support` is the number of gold units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub support: usize,
}

impl ConfusionCounts {
    /// Precision, recall and f1 of these counts.
    pub fn scores(&self) -> (f32, f32, f32) {
        calculate_f1_score(
            self.true_positives,
            self.false_positives,
            self.false_negatives,
        )
    }
}

impl Add for ConfusionCounts {
    type Output = ConfusionCounts;
    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.true_positives += rhs.true_positives;
        self.false_positives += rhs.false_positives;
        self.false_negatives += rhs.false_negatives;
        self.support += rhs.support;
    }
}

/// Computes the precision, recall and f1 score. Each of them is 0 when its denominator is 0.
pub fn calculate_f1_score(
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
) -> (f32, f32, f32) {
    let tp = true_positives as f32;
    let precision = if true_positives + false_positives != 0 {
        tp / (true_positives + false_positives) as f32
    } else {
        0.0
    };
    let recall = if true_positives + false_negatives != 0 {
        tp / (true_positives + false_negatives) as f32
    } else {
        0.0
    };
    let f1 = if precision + recall != 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Error type to represent when two lists or arrays are not of the
/// same length (when they should be).
pub struct InconsistentLengthError(pub(crate) usize, pub(crate) usize);

impl Display for InconsistentLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inconsistent length between two lists. `y_true` is length {}, `y_pred` is length {}",
            self.0, self.1
        )
    }
}
impl Error for InconsistentLengthError {}

pub(crate) fn check_consistent_length<T>(
    y_true: &[Vec<T>],
    y_pred: &[Vec<T>],
) -> Result<(), InconsistentLengthError> {
    let y_true_lengths: Vec<_> = y_true.iter().map(|v| v.len()).collect();
    let y_pred_lengths: Vec<_> = y_pred.iter().map(|v| v.len()).collect();
    let y_true_len = y_true_lengths.len();
    let y_pred_len = y_pred_lengths.len();
    if y_true_len != y_pred_len {
        return Err(InconsistentLengthError(y_true_len, y_pred_len));
    }
    let iter = y_true_lengths.into_iter().zip(y_pred_lengths);
    for (t_l, p_l) in iter {
        if t_l != p_l {
            return Err(InconsistentLengthError(t_l, p_l));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
/// Enum error encompassing many type of failures that could happen when computing the precison,
/// recall, f-score and the support of buckets.
pub enum ComputationError {
    InconsistentLength(InconsistentLengthError),
    InputError(MultiInputError),
    EmptyInput(String),
    EmptyOrNotUnique(ArrayNotUniqueOrEmpty),
}

impl Display for ComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentLength(length_err) => std::fmt::Display::fmt(length_err, f),
            Self::InputError(input_err) => std::fmt::Display::fmt(&input_err, f),
            Self::EmptyInput(empty_err) => write!(f, "Found an empty input: {}", empty_err),
            Self::EmptyOrNotUnique(size_err) => std::fmt::Display::fmt(size_err, f),
        }
    }
}
impl Error for ComputationError {}

impl From<InconsistentLengthError> for ComputationError {
    fn from(value: InconsistentLengthError) -> Self {
        Self::InconsistentLength(value)
    }
}

impl From<MultiInputError> for ComputationError {
    fn from(value: MultiInputError) -> Self {
        Self::InputError(value)
    }
}

impl From<ArrayNotUniqueOrEmpty> for ComputationError {
    fn from(value: ArrayNotUniqueOrEmpty) -> Self {
        Self::EmptyOrNotUnique(value)
    }
}

/// Which spans of a side are units of a span-level policy.
#[derive(Debug, Clone, Copy)]
enum SpanSelection {
    All,
    Flat,
    ClusterMembers,
    Outer,
    Inner,
}

#[derive(Debug, Clone, Copy)]
enum Units {
    Spans(SpanSelection),
    Clusters,
}

/// Side whose matched units are counted as true positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Gold,
    Predicted,
}

#[derive(Debug, Clone, Copy)]
struct PolicyDescriptor {
    units: Units,
    true_positives_from: Side,
}

impl From<Policy> for PolicyDescriptor {
    fn from(value: Policy) -> Self {
        let (units, true_positives_from) = match value {
            Policy::Standard => (Units::Spans(SpanSelection::All), Side::Predicted),
            Policy::Flat => (Units::Spans(SpanSelection::Flat), Side::Gold),
            Policy::Inner => (Units::Spans(SpanSelection::Inner), Side::Gold),
            Policy::Outer => (Units::Spans(SpanSelection::Outer), Side::Gold),
            Policy::Nested => (Units::Spans(SpanSelection::ClusterMembers), Side::Gold),
            Policy::Nesting => (Units::Clusters, Side::Gold),
        };
        PolicyDescriptor {
            units,
            true_positives_from,
        }
    }
}

/// Counts the units of both sides. Gold units found on the predicted side are matched (or else
/// false negatives), predicted units absent from the gold side are false positives. True positives
/// are the matched units of `true_positives_from`.
fn count_units<U>(
    gold_units: &[U],
    predicted_units: &[U],
    in_gold: impl Fn(&U) -> bool,
    in_predicted: impl Fn(&U) -> bool,
    true_positives_from: Side,
) -> ConfusionCounts {
    let mut counts = ConfusionCounts {
        support: gold_units.len(),
        ..Default::default()
    };
    for unit in gold_units {
        if in_predicted(unit) {
            if true_positives_from == Side::Gold {
                counts.true_positives += 1;
            }
        } else {
            counts.false_negatives += 1;
        }
    }
    for unit in predicted_units {
        if in_gold(unit) {
            if true_positives_from == Side::Predicted {
                counts.true_positives += 1;
            }
        } else {
            counts.false_positives += 1;
        }
    }
    counts
}

/// Spans, multiset and nesting clusters of one side of a sentence.
struct SideAnalysis<'s, 'a> {
    spans: &'s [Span<'a>],
    bag: SpanBag<'s, 'a>,
    nestings: Vec<NestingCluster<'a>>,
}

impl<'s, 'a> SideAnalysis<'s, 'a> {
    fn new(spans: &'s [Span<'a>]) -> Self {
        SideAnalysis {
            spans,
            bag: spans.iter().collect(),
            nestings: get_nestings(spans),
        }
    }

    fn units(&self, selection: SpanSelection) -> Vec<&Span<'a>> {
        match selection {
            SpanSelection::All => self.spans.iter().collect(),
            SpanSelection::Flat => {
                let members: AHashSet<&Span<'a>> =
                    self.nestings.iter().flat_map(|c| c.iter()).collect();
                self.spans
                    .iter()
                    .filter(|span| !members.contains(span))
                    .collect()
            }
            SpanSelection::ClusterMembers => self.nestings.iter().flat_map(|c| c.iter()).collect(),
            SpanSelection::Outer => self.nestings.iter().map(|c| c.outer()).collect(),
            SpanSelection::Inner => self.nestings.iter().flat_map(|c| c.inner()).collect(),
        }
    }
}

/// Both sides of a sentence, analysed once and shared by every policy.
struct SentenceAnalysis<'s, 'a> {
    gold: SideAnalysis<'s, 'a>,
    predicted: SideAnalysis<'s, 'a>,
}

impl<'s, 'a> SentenceAnalysis<'s, 'a> {
    fn new(sentence: &'s SentenceRecord<'a>) -> Self {
        SentenceAnalysis {
            gold: SideAnalysis::new(&sentence.gold),
            predicted: SideAnalysis::new(&sentence.predicted),
        }
    }

    fn counts(&self, policy: Policy) -> ConfusionCounts {
        let descriptor = PolicyDescriptor::from(policy);
        match descriptor.units {
            Units::Spans(selection) => count_units(
                &self.gold.units(selection),
                &self.predicted.units(selection),
                |span| self.gold.bag.contains(span),
                |span| self.predicted.bag.contains(span),
                descriptor.true_positives_from,
            ),
            Units::Clusters => count_units(
                &self.gold.nestings,
                &self.predicted.nestings,
                |cluster| self.gold.nestings.contains(cluster),
                |cluster| self.predicted.nestings.contains(cluster),
                descriptor.true_positives_from,
            ),
        }
    }

    fn depth_counts(&self, matching: DepthMatching) -> Vec<(DepthBucket, ConfusionCounts)> {
        let gold_buckets = merged_depth_buckets(&self.gold.nestings);
        let predicted_buckets = merged_depth_buckets(&self.predicted.nestings);
        let mut counts = Vec::with_capacity(2);
        for bucket in all::<DepthBucket>() {
            let gold_units = gold_buckets.get(bucket);
            let predicted_units = predicted_buckets.get(bucket);
            if gold_units.is_empty() && predicted_units.is_empty() {
                continue;
            }
            let bucket_counts = match matching {
                DepthMatching::Relaxed => count_units(
                    gold_units,
                    predicted_units,
                    |span| self.gold.bag.contains(span),
                    |span| self.predicted.bag.contains(span),
                    Side::Gold,
                ),
                DepthMatching::Strict => {
                    let gold_bag: SpanBag = gold_units.iter().collect();
                    let predicted_bag: SpanBag = predicted_units.iter().collect();
                    count_units(
                        gold_units,
                        predicted_units,
                        |span| gold_bag.contains(span),
                        |span| predicted_bag.contains(span),
                        Side::Gold,
                    )
                }
            };
            counts.push((bucket, bucket_counts));
        }
        counts
    }
}

fn analyse<'s, 'a>(sentences: &'s [SentenceRecord<'a>]) -> Vec<SentenceAnalysis<'s, 'a>> {
    sentences.iter().map(SentenceAnalysis::new).collect()
}

fn sum_policy_counts(analyses: &[SentenceAnalysis], policy: Policy) -> ConfusionCounts {
    analyses
        .iter()
        .fold(ConfusionCounts::default(), |acc, analysis| {
            acc + analysis.counts(policy)
        })
}

/// Sums the confusion counts of every sentence under the given policy.
pub fn policy_counts(sentences: &[SentenceRecord], policy: Policy) -> ConfusionCounts {
    sum_policy_counts(&analyse(sentences), policy)
}

/// Computes the micro precision, recall, f1 and support of the sentences under the given policy.
///
/// ```rust
/// use nested_ner_eval::{score, Policy, SentenceRecord, Span};
///
/// let gold = vec![
///     Span::try_new("Body Part", 2, 2).unwrap(),
///     Span::try_new("Disease", 0, 2).unwrap(),
/// ];
/// let sentences = vec![SentenceRecord::new(gold.clone(), gold)];
/// assert_eq!(score(&sentences, Policy::Standard), (1.0, 1.0, 1.0, 2));
/// assert_eq!(score(&sentences, Policy::Nesting), (1.0, 1.0, 1.0, 1));
/// ```
pub fn score(sentences: &[SentenceRecord], policy: Policy) -> (f32, f32, f32, usize) {
    let counts = policy_counts(sentences, policy);
    let (precision, recall, f1) = counts.scores();
    (precision, recall, f1, counts.support)
}

fn sum_length_counts(analyses: &[SentenceAnalysis]) -> BTreeMap<usize, ConfusionCounts> {
    let mut counts: BTreeMap<usize, ConfusionCounts> = BTreeMap::new();
    for analysis in analyses {
        for span in analysis.gold.spans {
            let bucket = counts.entry(span.len()).or_default();
            bucket.support += 1;
            if analysis.predicted.bag.contains(span) {
                bucket.true_positives += 1;
            } else {
                bucket.false_negatives += 1;
            }
        }
        for span in analysis
            .predicted
            .spans
            .iter()
            .filter(|span| !analysis.gold.bag.contains(span))
        {
            counts.entry(span.len()).or_default().false_positives += 1;
        }
    }
    counts
}

/// Confusion counts of the spans grouped by length (number of tokens). A bucket exists only if a
/// gold or a predicted span has this length.
pub fn length_counts(sentences: &[SentenceRecord]) -> BTreeMap<usize, ConfusionCounts> {
    sum_length_counts(&analyse(sentences))
}

/// Metrics of a length bucket. `accuracy` is the share of the gold spans of the bucket that were
/// predicted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
    pub accuracy: f32,
}

impl From<ConfusionCounts> for LengthMetrics {
    fn from(value: ConfusionCounts) -> Self {
        let (precision, recall, f1) = value.scores();
        let accuracy = if value.support != 0 {
            value.true_positives as f32 / value.support as f32
        } else {
            0.0
        };
        LengthMetrics {
            precision,
            recall,
            f1,
            support: value.support,
            accuracy,
        }
    }
}

pub fn score_by_length(sentences: &[SentenceRecord]) -> BTreeMap<usize, LengthMetrics> {
    length_counts(sentences)
        .into_iter()
        .map(|(length, counts)| (length, LengthMetrics::from(counts)))
        .collect()
}

fn sum_depth_counts(
    analyses: &[SentenceAnalysis],
    matching: DepthMatching,
) -> BTreeMap<DepthBucket, ConfusionCounts> {
    let mut counts: BTreeMap<DepthBucket, ConfusionCounts> = BTreeMap::new();
    for analysis in analyses {
        for (bucket, bucket_counts) in analysis.depth_counts(matching) {
            *counts.entry(bucket).or_default() += bucket_counts;
        }
    }
    counts
}

/// Confusion counts of the cluster members grouped by depth bucket. Units are the members of the
/// clusters of each side, split by `NestingCluster::depth_buckets`.
pub fn depth_counts(
    sentences: &[SentenceRecord],
    matching: DepthMatching,
) -> BTreeMap<DepthBucket, ConfusionCounts> {
    sum_depth_counts(&analyse(sentences), matching)
}

/// F1 and support of every depth bucket.
pub fn score_by_depth(
    sentences: &[SentenceRecord],
    matching: DepthMatching,
) -> BTreeMap<DepthBucket, (f32, usize)> {
    depth_counts(sentences, matching)
        .into_iter()
        .map(|(bucket, counts)| (bucket, (counts.scores().2, counts.support)))
        .collect()
}

/// Type alias for representing the output of the `precision_recall_fscore_support`. Each arrays
/// contain a vector of f32. The first array contains the precision, the second the recall, the
/// third the f-score and the last one the support.
pub type PrecisionRecallFScoreSupport = (Array1<f32>, Array1<f32>, Array1<f32>, Array1<usize>);

/// Computes the precision, recall, fscore and support of every bucket and averages them.
///
/// * `counts`: Confusion counts of the buckets, such as the values of `length_counts`.
/// * `average`: What type of average to use. With `Average::None`, the arrays hold one value per
///   bucket. Otherwise, they hold a single value.
pub fn precision_recall_fscore_support(
    counts: &[ConfusionCounts],
    average: Average,
) -> Result<PrecisionRecallFScoreSupport, ComputationError> {
    if counts.is_empty() {
        return Err(ComputationError::EmptyInput(String::from("counts")));
    }
    let mut tp_sum: Array1<usize> = counts.iter().map(|c| c.true_positives).collect();
    let mut pred_sum: Array1<usize> = counts
        .iter()
        .map(|c| c.true_positives + c.false_positives)
        .collect();
    let mut true_sum: Array1<usize> = counts
        .iter()
        .map(|c| c.true_positives + c.false_negatives)
        .collect();
    let mut support: Array1<usize> = counts.iter().map(|c| c.support).collect();
    if matches!(average, Average::Micro) {
        tp_sum = array![tp_sum.sum()];
        pred_sum = array![pred_sum.sum()];
        true_sum = array![true_sum.sum()];
        support = array![support.sum()];
    };
    let arc_tp_sum = tp_sum.mapv(|x| x as f32).to_shared();
    let precision = prf_divide(arc_tp_sum.clone(), pred_sum.mapv(|x| x as f32).view_mut());
    let recall = prf_divide(arc_tp_sum, true_sum.mapv(|x| x as f32).view_mut());
    let f_score = {
        let numerator = (precision.clone() * recall.view()).mapv(|x| 2.0 * x);
        let mut denominator = precision.clone() + recall.view();
        prf_divide(numerator.into_shared(), denominator.view_mut())
    };
    match average {
        Average::None | Average::Micro => Ok((
            precision.into_owned(),
            recall.into_owned(),
            f_score.into_owned(),
            support,
        )),
        Average::Macro => {
            let final_precision = array![precision.mean().ok_or_else(|| {
                ComputationError::EmptyInput(String::from("precision array was empty"))
            })?];
            let final_recall = array![recall.mean().ok_or_else(|| {
                ComputationError::EmptyInput(String::from("recall array was empty"))
            })?];
            let final_f_score = array![f_score.mean().ok_or_else(|| {
                ComputationError::EmptyInput(String::from("fscore array was empty"))
            })?];
            Ok((
                final_precision,
                final_recall,
                final_f_score,
                array![support.sum()],
            ))
        }
        Average::Weighted => {
            let total_support = support.sum();
            if total_support == 0 {
                return Ok((array![0.0], array![0.0], array![0.0], array![0]));
            }
            let weights = support.mapv(|x| x as f32).into_shared();
            let final_precision = array![precision.weighted_mean(&weights)?];
            let final_recall = array![recall.weighted_mean(&weights)?];
            let final_f_score = array![f_score.weighted_mean(&weights)?];
            Ok((
                final_precision,
                final_recall,
                final_f_score,
                array![total_support],
            ))
        }
    }
}

/// Divides the numerator by the denominator. Where the denominator is 0, the result is 0.
fn prf_divide<D: Dimension>(
    numerator: ArcArray<f32, D>,
    denominator: ArrayViewMut<f32, D>,
) -> ArcArray<f32, D> {
    let (result, zero_mask) = prf_divide_results_and_mask(numerator, denominator);
    result * zero_mask
}

/// Returns the result of the division, where the zeros of the denominator were replaced by ones,
/// and a mask holding 0 where the denominator was 0 and 1 elsewhere.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: denominator of the division
fn prf_divide_results_and_mask<D: Dimension>(
    numerator: ArcArray<f32, D>,
    mut denominator: ArrayViewMut<f32, D>,
) -> (ArcArray<f32, D>, Array<f32, D>) {
    let zero_at_mask =
        Zip::from(&mut denominator).map_collect(|d| if *d == 0.0 { 0.0 } else { 1.0 });
    denominator.mapv_inplace(|v| if v == 0.0 { 1.0 } else { v });
    (numerator / denominator, zero_at_mask)
}

fn policy_report(analyses: &[SentenceAnalysis]) -> Reporter {
    let mut reporter = Reporter::default();
    for policy in all::<Policy>() {
        let counts = sum_policy_counts(analyses, policy);
        let (precision, recall, fscore) = counts.scores();
        reporter.insert(RowMetrics::new(
            ReportKey::Policy(policy),
            precision,
            recall,
            fscore,
            counts.support,
        ));
    }
    reporter
}

/// Builds a report with one row per bucket and, if `overall_rows` is set, one row per overall
/// average. An empty map gives an empty report.
fn buckets_report<K: Copy>(
    buckets: BTreeMap<K, ConfusionCounts>,
    to_key: impl Fn(K) -> ReportKey,
    overall_rows: bool,
) -> Result<Reporter, ComputationError> {
    let mut reporter = Reporter::default();
    if buckets.is_empty() {
        return Ok(reporter);
    }
    let (keys, counts): (Vec<K>, Vec<ConfusionCounts>) = buckets.into_iter().unzip();
    let (p, r, f1, s) = precision_recall_fscore_support(&counts, Average::None)?;
    for (key, precision, recall, fscore, support) in multizip((
        keys.into_iter(),
        p.into_iter(),
        r.into_iter(),
        f1.into_iter(),
        s.into_iter(),
    )) {
        reporter.insert(RowMetrics::new(
            to_key(key),
            precision,
            recall,
            fscore,
            support,
        ));
    }
    if overall_rows {
        for avg in OverallAverage::ALL {
            let (p, r, f1, s) = precision_recall_fscore_support(&counts, avg.into())?;
            reporter.insert(RowMetrics::new_overall(
                avg,
                p.item()?,
                r.item()?,
                f1.item()?,
                s.item()?,
            ));
        }
    }
    Ok(reporter)
}

/// Report with one row per policy, in the order `Standard`, `Flat`, `Inner`, `Outer`, `Nested`,
/// `Nesting`.
pub fn nested_ner_report(sentences: &[SentenceRecord]) -> Reporter {
    policy_report(&analyse(sentences))
}

/// Report with one row per span length and the overall averages over the lengths.
pub fn length_report(
    sentences: &[SentenceRecord],
    overall_rows: bool,
) -> Result<Reporter, ComputationError> {
    buckets_report(length_counts(sentences), ReportKey::Length, overall_rows)
}

/// Report with one row per depth bucket and the overall averages over the buckets.
pub fn depth_report(
    sentences: &[SentenceRecord],
    matching: DepthMatching,
    overall_rows: bool,
) -> Result<Reporter, ComputationError> {
    buckets_report(
        depth_counts(sentences, matching),
        ReportKey::Depth,
        overall_rows,
    )
}

/// Every report, computed from a single analysis of the sentences.
pub(crate) fn evaluation_report(
    sentences: &[SentenceRecord],
    matching: DepthMatching,
    overall_rows: bool,
) -> Result<EvaluationReport, ComputationError> {
    let analyses = analyse(sentences);
    Ok(EvaluationReport {
        policies: policy_report(&analyses),
        lengths: buckets_report(sum_length_counts(&analyses), ReportKey::Length, overall_rows)?,
        depths: buckets_report(
            sum_depth_counts(&analyses, matching),
            ReportKey::Depth,
            overall_rows,
        )?,
    })
}
