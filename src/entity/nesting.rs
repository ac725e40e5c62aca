use crate::entity::Span;
use serde::Serialize;
use std::ops::Deref;

/// A group of spans of one side of a sentence in which the first span (the outer span) contains
/// every other span (the inner spans). A cluster always has at least two members.
///
/// Members are ordered by length, longest first, and spans of equal length are ordered by type in
/// reverse lexicographic order. Two clusters are equal if their ordered members are equal: the same
/// spans in a different order form a different cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NestingCluster<'a>(pub(crate) Vec<Span<'a>>);

impl<'a> NestingCluster<'a> {
    /// The designated outer span of the cluster.
    pub fn outer(&self) -> &Span<'a> {
        &self.0[0]
    }

    /// Every member except the outer span.
    pub fn inner(&self) -> &[Span<'a>] {
        &self.0[1..]
    }

    pub fn into_inner(self) -> Vec<Span<'a>> {
        self.0
    }
}

impl<'a> Deref for NestingCluster<'a> {
    type Target = [Span<'a>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Groups the spans of one side of a sentence into nesting clusters.
///
/// A span roots a cluster if no other span strictly contains it and it contains at least one other
/// span (boundaries included). A cluster holds its root and every span the root contains. Spans
/// that are equal to the root are not counted twice. Clusters with the same ordered members are only
/// returned once; the order of the returned clusters follows the order of their roots in `spans`.
///
/// ```rust
/// use nested_ner_eval::{get_nestings, Span};
///
/// let spans = vec![
///     Span::try_new("Body Part", 2, 2).unwrap(),
///     Span::try_new("Disease", 0, 2).unwrap(),
/// ];
/// let clusters = get_nestings(&spans);
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].outer().as_tuple(), ("Disease", 0, 2));
/// ```
pub fn get_nestings<'a>(spans: &[Span<'a>]) -> Vec<NestingCluster<'a>> {
    let mut nestings: Vec<Vec<&Span<'a>>> = Vec::new();
    for root in spans {
        let mut is_outer = true;
        let mut members = vec![root];
        for other in spans.iter().filter(|other| *other != root) {
            if other.strictly_contains(root) {
                is_outer = false;
            }
            if root.contains(other) {
                members.push(other);
            }
        }
        if !is_outer || members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.tag.cmp(&a.tag)));
        if !nestings.contains(&members) {
            nestings.push(members);
        }
    }
    nestings
        .into_iter()
        .map(|members| NestingCluster(members.into_iter().cloned().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn span(tag: &'static str, start: usize, end: usize) -> Span<'static> {
        Span::try_new(tag, start, end).unwrap()
    }

    fn tuples<'a>(cluster: &'a NestingCluster<'a>) -> Vec<(&'a str, usize, usize)> {
        cluster.iter().map(|s| s.as_tuple()).collect()
    }

    #[test]
    fn test_single_cluster() {
        let spans = vec![span("Body Part", 2, 2), span("Disease", 0, 2)];
        let clusters = get_nestings(&spans);
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            tuples(&clusters[0]),
            vec![("Disease", 0, 2), ("Body Part", 2, 2)]
        );
        assert_eq!(clusters[0].outer(), &span("Disease", 0, 2));
        assert_eq!(clusters[0].inner(), &[span("Body Part", 2, 2)]);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![span("PER", 0, 1)])]
    #[case(vec![span("PER", 0, 1), span("LOC", 3, 3)])]
    #[case(vec![span("PER", 0, 1), span("LOC", 1, 2)])]
    fn test_no_cluster(#[case] spans: Vec<Span<'static>>) {
        assert!(get_nestings(&spans).is_empty());
    }

    #[test]
    fn test_equal_boundaries_form_one_cluster() {
        // Both spans root a candidate cluster; they sort to the same order and are deduplicated.
        let spans = vec![span("Drug", 0, 2), span("Chemical", 0, 2)];
        let clusters = get_nestings(&spans);
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            tuples(&clusters[0]),
            vec![("Drug", 0, 2), ("Chemical", 0, 2)]
        );
    }

    #[test]
    fn test_duplicated_span_is_not_its_own_member() {
        let spans = vec![span("PER", 0, 1), span("PER", 0, 1)];
        assert!(get_nestings(&spans).is_empty());
        let spans = vec![span("Disease", 0, 2), span("Disease", 0, 2), span("Body", 1, 1)];
        let clusters = get_nestings(&spans);
        assert_eq!(clusters.len(), 1);
        assert_eq!(tuples(&clusters[0]), vec![("Disease", 0, 2), ("Body", 1, 1)]);
    }

    #[test]
    fn test_duplicated_root_with_equal_boundaries_gives_two_clusters() {
        // Each `Drug` skips its duplicate, while `Chemical` gathers both of them.
        let spans = vec![span("Drug", 0, 2), span("Drug", 0, 2), span("Chemical", 0, 2)];
        let clusters = get_nestings(&spans);
        assert_eq!(clusters.len(), 2);
        assert_eq!(
            tuples(&clusters[0]),
            vec![("Drug", 0, 2), ("Chemical", 0, 2)]
        );
        assert_eq!(
            tuples(&clusters[1]),
            vec![("Drug", 0, 2), ("Drug", 0, 2), ("Chemical", 0, 2)]
        );
    }

    #[test]
    fn test_three_levels() {
        let spans = vec![span("C", 2, 2), span("A", 0, 4), span("B", 1, 3)];
        let clusters = get_nestings(&spans);
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            tuples(&clusters[0]),
            vec![("A", 0, 4), ("B", 1, 3), ("C", 2, 2)]
        );
    }

    #[test]
    fn test_two_clusters_in_order_of_their_roots() {
        let spans = vec![
            span("Disease", 0, 2),
            span("Body", 1, 1),
            span("Drug", 5, 6),
            span("Chemical", 6, 6),
            span("PER", 8, 8),
        ];
        let clusters = get_nestings(&spans);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].outer(), &span("Disease", 0, 2));
        assert_eq!(clusters[1].outer(), &span("Drug", 5, 6));
    }

    #[test]
    fn test_members_of_equal_length_sorted_by_reversed_type() {
        let spans = vec![span("Outer", 0, 5), span("Alpha", 1, 1), span("Zeta", 3, 3)];
        let clusters = get_nestings(&spans);
        assert_eq!(
            tuples(&clusters[0]),
            vec![("Outer", 0, 5), ("Zeta", 3, 3), ("Alpha", 1, 1)]
        );
    }
}
