use crate::entity::{NestingCluster, Span};
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Depth of a span inside its nesting cluster. Only two levels are distinguished: the spans exposed
/// by the first peel of the cluster are `Outer`, every deeper span is `Nested`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum DepthBucket {
    Outer,
    Nested,
}

impl DepthBucket {
    pub fn index(&self) -> usize {
        match self {
            DepthBucket::Outer => 0,
            DepthBucket::Nested => 1,
        }
    }
}

impl Display for DepthBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepthBucket::Outer => write!(f, "Outer"),
            DepthBucket::Nested => write!(f, "Nested"),
        }
    }
}

/// Members of one or more clusters, split by depth bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepthBuckets<'a> {
    pub(crate) outer: Vec<Span<'a>>,
    pub(crate) nested: Vec<Span<'a>>,
}

impl<'a> DepthBuckets<'a> {
    pub fn get(&self, bucket: DepthBucket) -> &[Span<'a>] {
        match bucket {
            DepthBucket::Outer => &self.outer,
            DepthBucket::Nested => &self.nested,
        }
    }

    fn get_mut(&mut self, bucket: DepthBucket) -> &mut Vec<Span<'a>> {
        match bucket {
            DepthBucket::Outer => &mut self.outer,
            DepthBucket::Nested => &mut self.nested,
        }
    }

    pub fn outer(&self) -> &[Span<'a>] {
        &self.outer
    }

    pub fn nested(&self) -> &[Span<'a>] {
        &self.nested
    }

    /// Appends the buckets of `other` to the buckets of `self`.
    pub fn merge(&mut self, other: DepthBuckets<'a>) {
        self.outer.extend(other.outer);
        self.nested.extend(other.nested);
    }

    /// Iterates over the buckets, `Outer` first.
    pub fn iter(&self) -> impl Iterator<Item = (DepthBucket, &[Span<'a>])> + '_ {
        all::<DepthBucket>().map(move |bucket| (bucket, self.get(bucket)))
    }
}

impl<'a> NestingCluster<'a> {
    /// Splits the members of the cluster by depth.
    ///
    /// The cluster is peeled layer by layer: at each round, the spans that no other remaining span
    /// strictly contains are exposed and removed. The spans exposed by the first round go in the
    /// `Outer` bucket and the spans exposed by any later round go in the `Nested` bucket.
    pub fn depth_buckets(&self) -> DepthBuckets<'a> {
        let mut buckets = DepthBuckets::default();
        let mut remaining: Vec<&Span<'a>> = self.0.iter().collect();
        let mut bucket = DepthBucket::Outer;
        while !remaining.is_empty() {
            let (exposed, covered): (Vec<&Span<'a>>, Vec<&Span<'a>>) = remaining
                .iter()
                .copied()
                .partition(|span| !remaining.iter().any(|other| other.strictly_contains(span)));
            buckets.get_mut(bucket).extend(exposed.into_iter().cloned());
            remaining = covered;
            bucket = DepthBucket::Nested;
        }
        buckets
    }
}

/// Depth buckets of every cluster of a side, merged together.
pub(crate) fn merged_depth_buckets<'a>(clusters: &[NestingCluster<'a>]) -> DepthBuckets<'a> {
    clusters
        .iter()
        .fold(DepthBuckets::default(), |mut acc, cluster| {
            acc.merge(cluster.depth_buckets());
            acc
        })
}
