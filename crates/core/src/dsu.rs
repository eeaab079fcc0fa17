//! Union-find over record ids, used to take the transitive closure of
//! accepted similarity pairs.
//!
//! Parents live in an explicit map populated lazily on first reference.
//! `union` always hangs the second root under the first; there is no rank
//! balancing, so chains can grow on adversarial input. Path compression in
//! `find` keeps repeated lookups cheap, which is enough for batch sizes here.

use std::collections::{BTreeMap, HashMap};

use crate::{RecordId, SimilarityPair};

#[derive(Debug, Default, Clone)]
pub struct ClusterBuilder {
    parent: HashMap<RecordId, RecordId>,
}

impl ClusterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a pair list by unioning every pair in order.
    #[must_use]
    pub fn from_pairs(pairs: &[SimilarityPair]) -> Self {
        let mut builder = Self::new();
        for pair in pairs {
            builder.union(pair.low(), pair.high());
        }
        builder
    }

    /// Representative of `x`. Ids never seen are their own representative.
    pub fn find(&mut self, x: RecordId) -> RecordId {
        let mut root = x;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }

        let mut cur = x;
        while cur != root {
            let Some(next) = self.parent.insert(cur, root) else {
                break;
            };
            cur = next;
        }
        root
    }

    /// Merge the components of `a` and `b`, keeping `a`'s representative.
    pub fn union(&mut self, a: RecordId, b: RecordId) {
        self.parent.entry(a).or_insert(a);
        self.parent.entry(b).or_insert(b);
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(rb, ra);
        }
    }

    /// Number of ids referenced so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Group every referenced id by representative.
    ///
    /// Members are sorted ascending and clusters are ordered by their smallest
    /// member, so the output does not depend on hash iteration order.
    pub fn clusters(&mut self) -> Vec<Vec<RecordId>> {
        let mut ids: Vec<RecordId> = self.parent.keys().copied().collect();
        ids.sort_unstable();

        let mut groups: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
        for id in ids {
            let root = self.find(id);
            groups.entry(root).or_default().push(id);
        }

        let ordered: BTreeMap<RecordId, Vec<RecordId>> = groups
            .into_values()
            .filter_map(|members| members.first().copied().map(|first| (first, members)))
            .collect();
        ordered.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: i64, b: i64) -> SimilarityPair {
        SimilarityPair::new(RecordId(a), RecordId(b)).unwrap()
    }

    fn ids(raw: &[i64]) -> Vec<RecordId> {
        raw.iter().copied().map(RecordId).collect()
    }

    #[test]
    fn unseen_id_is_its_own_root() {
        let mut dsu = ClusterBuilder::new();
        assert_eq!(dsu.find(RecordId(42)), RecordId(42));
        assert!(dsu.is_empty());
    }

    #[test]
    fn union_keeps_first_root() {
        let mut dsu = ClusterBuilder::new();
        dsu.union(RecordId(5), RecordId(1));
        assert_eq!(dsu.find(RecordId(1)), RecordId(5));
    }

    #[test]
    fn transitive_pairs_form_one_cluster() {
        let mut dsu = ClusterBuilder::from_pairs(&[pair(1, 2), pair(2, 3)]);
        assert_eq!(dsu.clusters(), vec![ids(&[1, 2, 3])]);
    }

    #[test]
    fn transitivity_independent_of_order() {
        let mut a = ClusterBuilder::from_pairs(&[pair(3, 4), pair(1, 2), pair(2, 3)]);
        let mut b = ClusterBuilder::from_pairs(&[pair(2, 3), pair(3, 4), pair(1, 2)]);
        assert_eq!(a.clusters(), b.clusters());
        assert_eq!(a.clusters(), vec![ids(&[1, 2, 3, 4])]);
    }

    #[test]
    fn disjoint_clusters_sorted_by_smallest_member() {
        let mut dsu = ClusterBuilder::from_pairs(&[pair(10, 11), pair(2, 7), pair(7, 3)]);
        assert_eq!(dsu.clusters(), vec![ids(&[2, 3, 7]), ids(&[10, 11])]);
    }

    #[test]
    fn path_compression_flattens_chain() {
        let mut dsu = ClusterBuilder::new();
        for i in 1..50 {
            dsu.union(RecordId(i), RecordId(i + 1));
        }
        let root = dsu.find(RecordId(50));
        assert_eq!(root, RecordId(1));
        assert_eq!(dsu.parent.get(&RecordId(50)), Some(&RecordId(1)));
    }

    #[test]
    fn every_member_in_exactly_one_cluster() {
        let pairs = [pair(1, 2), pair(3, 4), pair(4, 5), pair(6, 1)];
        let mut dsu = ClusterBuilder::from_pairs(&pairs);
        let clusters = dsu.clusters();
        let mut all: Vec<RecordId> = clusters.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, ids(&[1, 2, 3, 4, 5, 6]));
        assert!(clusters.iter().all(|c| c.len() >= 2));
    }
}
