/*!
This library evaluates named entity recognition when entities may nest, i.e. when an entity can be
fully contained in another one (`Body Part` inside `Disease` in "lung cancer"). A single micro F1 over
every entity hides how a model handles the nested entities; this library scores the same predictions
under several counting policies, by entity length and by nesting depth.

# Terminology
* A span is an entity mention: a type (such as `Disease`, `PER`, `LOC`) and the indices of its first
    and last tokens, both inclusive. Two spans are equal if their type, start and end are equal.
* A tag is the label of a token, such as `B-PER`. Its prefix (`O`, `B`, `I`, `E` or `S`) indicates
    where the token is in the current chunk. The prefix can be placed at the end of the tag
    (`PER-B`) and the delimiter is configurable.
* A nesting cluster is a group of spans of one sentence in which one span, the outer span, contains
    every other span, the inner spans. Members are ordered by length, longest first, and spans of
    equal length by type in reverse lexicographic order.
* A flat span is a span that belongs to no nesting cluster.
* The depth bucket of a cluster member is `Outer` if no other member strictly contains it and
    `Nested` otherwise. Every depth beyond the first collapses into `Nested`.

# Policies
* `Standard`: every span.
* `Flat`: the flat spans, matched against every span of the other side.
* `Inner`: the inner spans of the clusters, matched against every span of the other side.
* `Outer`: the outer spans of the clusters, matched against every span of the other side.
* `Nested`: every cluster member, matched against every span of the other side.
* `Nesting`: whole clusters. A cluster matches only if the other side holds the same members in the
    same order.
* By length: the spans grouped by number of tokens, with the share of gold spans found by bucket.
* By depth: the cluster members grouped by depth bucket, matched either against every span of the
    other side (`DepthMatching::Relaxed`) or against the same bucket of the other side
    (`DepthMatching::Strict`).

Precision, recall and f1 are 0 when their denominator is 0.
*/

mod config;
mod entity;
mod metrics;
mod reader;
mod reporter;

// The public api starts here
pub use entity::{
    get_nestings, get_spans, get_spans_layered, spans_from_tag_sequence, DegenerateSpanError,
    DepthBucket, DepthBuckets, NestingCluster, Prefix, SentenceRecord, Span, SpanBag,
    SpanChunkIter, Spans, TagConvention, TagSequence,
};

pub use metrics::{
    calculate_f1_score, depth_counts, depth_report, length_counts, length_report,
    nested_ner_report, policy_counts, precision_recall_fscore_support, score, score_by_depth,
    score_by_length, ArrayNotUniqueOrEmpty, ComputationError, ConfusionCounts, DepthMatching,
    DepthMatchingParsingError, InconsistentLengthError, LengthMetrics, Policy, PolicyParsingError,
    PrecisionRecallFScoreSupport,
};

pub use reporter::{
    Average, AverageParsingError, EvaluationReport, OverallAverage, ReportKey, Reporter,
    RowMetrics,
};

pub use config::{NestedEvalConfig, NestedEvalConfigBuilder};

pub use reader::{merge_predictions, read_prediction_columns, ReadError};

/// Main entrypoint of the library. Computes the report of every policy, of every span length and
/// of every depth bucket of the sentences. The nesting clusters of each sentence are computed only
/// once.
///
/// * `sentences`: Gold and predicted spans of every sentence
/// * `config`: Parameters of the evaluation. The tag convention is not used.
pub fn evaluate(
    sentences: &[SentenceRecord],
    config: &NestedEvalConfig,
) -> Result<EvaluationReport, ComputationError> {
    metrics::evaluation_report(sentences, config.depth_matching, config.overall_rows)
}

/// Extracts the spans of the gold and predicted tags and evaluates them. Instead of taking in the
/// raw parameters, this function takes a `NestedEvalConfig` struct and uses sensible defaults.
///
/// * `y_true`: Gold tags, one sequence per sentence
/// * `y_pred`: Predicted tags, one sequence per sentence
/// * `config`: Parameters of the evaluation.
///
/// # Example
/// ```rust
/// use nested_ner_eval::{evaluate_tags, NestedEvalConfigBuilder, Policy, ReportKey};
///
/// let y_true = vec![vec!["B-PER", "I-PER", "O", "B-LOC"]];
/// let y_pred = vec![vec!["B-PER", "I-PER", "O", "O"]];
/// let config = NestedEvalConfigBuilder::default().overall_rows(false).build();
///
/// let report = evaluate_tags(y_true, y_pred, &config).unwrap();
/// let standard = report.policies.get(&ReportKey::Policy(Policy::Standard)).unwrap();
/// assert_eq!((standard.precision, standard.recall, standard.support), (1.0, 0.5, 2));
/// assert_eq!(report.lengths.len(), 2);
/// assert!(report.depths.is_empty());
/// ```
pub fn evaluate_tags<'a>(
    y_true: Vec<Vec<&'a str>>,
    y_pred: Vec<Vec<&'a str>>,
    config: &NestedEvalConfig,
) -> Result<EvaluationReport, ComputationError> {
    metrics::check_consistent_length(&y_true, &y_pred)?;
    let spans_true = Spans::from_sequences(&y_true, config.convention);
    let spans_pred = Spans::from_sequences(&y_pred, config.convention);
    let sentences: Vec<SentenceRecord<'a>> = spans_true
        .into_iter()
        .zip(spans_pred)
        .map(|(gold, predicted)| SentenceRecord::new(gold, predicted))
        .collect();
    evaluate(&sentences, config)
}
