/*
 * This modules contains the `NestedEvalConfig` struct, which implements the default trait. This
 * config can be passed to the `evaluate` and `evaluate_tags` functions to simplify their arguments.
*/
use crate::entity::TagConvention;
use crate::metrics::DepthMatching;
use either::Either as LeftOrRight;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of parameters to the main functions of the crate. It
/// Implements the default trait.
pub struct NestedEvalConfig {
    /// Location of the prefix in the tags and delimiter between the prefix and the entity type.
    /// Only used when the spans are extracted from tags.
    pub(crate) convention: TagConvention,
    /// What the spans of a depth bucket are matched against.
    pub(crate) depth_matching: DepthMatching,
    /// Should the length and depth reports hold the `Overall_Micro`, `Overall_Macro` and
    /// `Overall_Weighted` rows?
    pub(crate) overall_rows: bool,
}

impl Default for NestedEvalConfig {
    fn default() -> Self {
        Self {
            convention: TagConvention::default(),
            depth_matching: DepthMatching::Relaxed,
            overall_rows: true,
        }
    }
}

impl NestedEvalConfig {
    pub fn convention(&self) -> TagConvention {
        self.convention
    }

    pub fn depth_matching(&self) -> DepthMatching {
        self.depth_matching
    }

    pub fn overall_rows(&self) -> bool {
        self.overall_rows
    }
}

impl<Matching: Into<DepthMatching>> From<NestedEvalConfigBuilder<Matching>> for NestedEvalConfig {
    fn from(value: NestedEvalConfigBuilder<Matching>) -> Self {
        Self {
            convention: TagConvention::new(value.suffix, value.delimiter),
            depth_matching: value.depth_matching.either_into(),
            overall_rows: value.overall_rows,
        }
    }
}

impl Display for NestedEvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Prefix located at the end of the tags: {}\n Delimiter between the prefix and the type: {:?}\n Depth buckets matched: {}\n Overall rows in the bucket reports: {}", self.convention.is_suffix(), self.convention.delimiter(), self.depth_matching, self.overall_rows);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `NestedEvalConfig` stucture.
pub struct NestedEvalConfigBuilder<Matching: Into<DepthMatching>> {
    suffix: bool,
    delimiter: char,
    depth_matching: LeftOrRight<Matching, DepthMatching>,
    overall_rows: bool,
}

impl Default for NestedEvalConfigBuilder<DepthMatching> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Matching: Into<DepthMatching>> NestedEvalConfigBuilder<Matching> {
    pub fn suffix(mut self, suffix: bool) -> Self {
        self.suffix = suffix;
        self
    }
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
    pub fn depth_matching(mut self, depth_matching: Matching) -> Self {
        self.depth_matching = LeftOrRight::Left(depth_matching);
        self
    }
    pub fn overall_rows(mut self, overall_rows: bool) -> Self {
        self.overall_rows = overall_rows;
        self
    }
    pub fn new() -> Self {
        Self {
            suffix: false,
            delimiter: '-',
            depth_matching: LeftOrRight::Right(DepthMatching::Relaxed),
            overall_rows: true,
        }
    }
    pub fn build(self) -> NestedEvalConfig {
        NestedEvalConfig::from(self)
    }
}
