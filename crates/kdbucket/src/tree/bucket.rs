use std::mem::take;

use tap::Tap;

use super::{Tree, TreeEvent, TreeNode, TreeNodeIndex, TreeNodeLeaf, TreeNodeSplit};

use crate::accessor::Accessor;
use crate::error::DimensionNotFound;
use crate::primitive::{cmp_number, midpoint, Dimension, Number};

/// A point along with its keys on every dimension, indexed by dimension.
struct Keyed<P, N> {
    keys: Vec<N>,
    point: P,
}

/// Output of a midpoint partition. Both sides are ordered by the dimension below the
/// split.
struct Partition<P, N> {
    value: N,
    minus: Vec<Keyed<P, N>>,
    plus: Vec<Keyed<P, N>>,
}

/* ---------------------------------------- Insertion ---------------------------------------- */

impl<P, A: Accessor<P>> Tree<P, A> {
    /// Puts `point` into leaf `node`, splitting the leaf if it is already full.
    pub(super) fn insert_into_leaf(
        &mut self,
        node: TreeNodeIndex,
        point: P,
        on_update: &mut impl FnMut(TreeEvent),
    ) -> Result<(), DimensionNotFound> {
        let leaf = self.leaf(node);
        let dimension = leaf.dimension;

        if leaf.bucket.len() < self.params.bucket_capacity {
            let key = self.accessor.value(&point, dimension)?;
            let keys = self.read_keys(&leaf.bucket, dimension)?;

            // Goes after every equal key, so ties keep insertion order.
            let at = keys.partition_point(|x| cmp_number(x, &key).is_le());
            self.leaf_mut(node).bucket.insert(at, point);

            return Ok(());
        }

        // A split may cascade through every dimension. Read them all up front.
        let keys = leaf
            .bucket
            .iter()
            .map(|x| self.read_point(x))
            .collect::<Result<Vec<_>, _>>()?;
        let point_keys = self.read_point(&point)?;

        // Nothing can fail from here on.
        let bucket = take(&mut self.leaf_mut(node).bucket);
        let entries = zip_keyed(bucket, keys).tap_mut(|x| {
            x.push(Keyed {
                keys: point_keys,
                point,
            })
        });

        self.split_leaf(node, dimension, entries, on_update);
        Ok(())
    }

    /// Replaces leaf `node` with a split node over `entries`, which are the leaf's points
    /// plus the overflowing one.
    fn split_leaf(
        &mut self,
        node: TreeNodeIndex,
        dimension: Dimension,
        entries: Vec<Keyed<P, A::Num>>,
        on_update: &mut impl FnMut(TreeEvent),
    ) {
        let next = self.next_dimension(dimension);
        let Partition { value, minus, plus } = partition(entries, dimension, next);

        tracing::debug!(
            ?node,
            dimension,
            ?value,
            minus = minus.len(),
            plus = plus.len(),
            "split leaf"
        );

        let (minus_id, plus_id) = self.install_split(node, dimension, value);

        on_update(TreeEvent::Split {
            from: node,
            minus: minus_id,
            plus: plus_id,
        });

        self.fill(minus_id, minus, on_update);
        self.fill(plus_id, plus, on_update);
    }

    /// Writes a new split node into `node`'s slot, with two fresh empty leaves.
    fn install_split(
        &mut self,
        node: TreeNodeIndex,
        dimension: Dimension,
        value: A::Num,
    ) -> (TreeNodeIndex, TreeNodeIndex) {
        let next = self.next_dimension(dimension);

        let [minus_id, plus_id] = [(); 2].map(|_| {
            self.nodes.insert(TreeNode::Leaf(TreeNodeLeaf {
                dimension: next,
                bucket: Vec::new(),
            }))
        });

        self.nodes[node] = TreeNode::Split(TreeNodeSplit {
            dimension,
            value,
            minus: minus_id,
            plus: plus_id,
        });

        (minus_id, plus_id)
    }

    /// Moves `entries` into the empty leaf `node`, which they are already ordered for.
    ///
    /// A partition may hand a leaf more than the capacity when the midpoint landed
    /// unevenly. Such a leaf is split again along its own dimension as long as that puts
    /// points on both sides; each of those splits strictly shrinks both halves, so the
    /// cascade terminates.
    fn fill(
        &mut self,
        node: TreeNodeIndex,
        entries: Vec<Keyed<P, A::Num>>,
        on_update: &mut impl FnMut(TreeEvent),
    ) {
        let dimension = self.leaf(node).dimension;

        if entries.len() > self.params.bucket_capacity {
            let keys = entries.iter().map(|x| x.keys[dimension]).collect::<Vec<_>>();

            if super::is_separable(&keys) {
                return self.split_leaf(node, dimension, entries, on_update);
            }
        }

        self.leaf_mut(node).bucket = entries.into_iter().map(|x| x.point).collect();
    }
}

/* ----------------------------------------- Deletion ----------------------------------------- */

enum Reaction {
    Keep,
    Merge,
    Rebalance,
}

impl<P, A: Accessor<P>> Tree<P, A> {
    /// Removes the point at `at` of leaf `leaf`, a child of split node `node`, then merges
    /// or rebalances `node` if its two leaves call for it.
    ///
    /// Keys needed for restructuring are read before the point is removed, therefore an
    /// accessor failure leaves the tree intact.
    pub(super) fn remove_from_split(
        &mut self,
        node: TreeNodeIndex,
        leaf: TreeNodeIndex,
        at: usize,
        on_update: &mut impl FnMut(TreeEvent),
    ) -> Result<(), DimensionNotFound> {
        let TreeNode::Split(TreeNodeSplit {
            dimension,
            minus,
            plus,
            ..
        }) = self.nodes[node]
        else {
            unreachable!("{node:?} is expected to be a split")
        };

        // Sibling is a subtree; there's no pair of buckets to weigh against each other.
        if !(self.nodes[minus].is_leaf() && self.nodes[plus].is_leaf()) {
            self.leaf_mut(leaf).bucket.remove(at);
            return Ok(());
        }

        let (leaf_m, leaf_p) = (self.leaf(minus), self.leaf(plus));

        let cnt_m = leaf_m.bucket.len() - (leaf == minus) as usize;
        let cnt_p = leaf_p.bucket.len() - (leaf == plus) as usize;
        let total = cnt_m + cnt_p;

        let reaction = if total < self.params.bucket_capacity / 2 {
            Reaction::Merge
        } else if cnt_m.abs_diff(cnt_p) > 2 {
            Reaction::Rebalance
        } else {
            Reaction::Keep
        };

        // Every point that stays, in minus-then-plus order.
        let survivors = move || {
            let skip = move |side: TreeNodeIndex, i: usize| side == leaf && i == at;
            let m = leaf_m.bucket.iter().enumerate().filter(move |&(i, _)| !skip(minus, i));
            let p = leaf_p.bucket.iter().enumerate().filter(move |&(i, _)| !skip(plus, i));
            m.chain(p).map(|(_, x)| x)
        };

        match reaction {
            Reaction::Keep => {
                self.leaf_mut(leaf).bucket.remove(at);
            }
            Reaction::Merge => {
                let keys = self.read_keys(survivors(), dimension)?;
                let bucket = self.take_children(minus, plus, leaf, at);

                let bucket = bucket
                    .into_iter()
                    .zip(keys)
                    .collect::<Vec<_>>()
                    .tap_mut(|x| x.sort_by(|a, b| cmp_number(&a.1, &b.1)))
                    .into_iter()
                    .map(|(x, _)| x)
                    .collect::<Vec<_>>();

                tracing::debug!(?node, dimension, len = bucket.len(), "merge leaves");

                // The merged leaf inherits the split's dimension, not its children's.
                self.nodes[node] = TreeNode::Leaf(TreeNodeLeaf { dimension, bucket });

                on_update(TreeEvent::Merge {
                    from: minus,
                    into: node,
                });
                on_update(TreeEvent::Merge {
                    from: plus,
                    into: node,
                });
            }
            Reaction::Rebalance => {
                let keys = survivors()
                    .map(|x| self.read_point(x))
                    .collect::<Result<Vec<_>, _>>()?;
                let bucket = self.take_children(minus, plus, leaf, at);

                let next = self.next_dimension(dimension);
                let Partition { value, minus, plus } =
                    partition(zip_keyed(bucket, keys), dimension, next);

                tracing::debug!(
                    ?node,
                    dimension,
                    ?value,
                    minus = minus.len(),
                    plus = plus.len(),
                    "rebalance leaves"
                );

                let (minus_id, plus_id) = self.install_split(node, dimension, value);

                on_update(TreeEvent::Rebalance {
                    node,
                    minus: minus_id,
                    plus: plus_id,
                });

                self.fill(minus_id, minus, on_update);
                self.fill(plus_id, plus, on_update);
            }
        }

        Ok(())
    }

    /// Disposes both leaf children and returns their points, minus-then-plus, without the
    /// one at `at` of `leaf`.
    fn take_children(
        &mut self,
        minus: TreeNodeIndex,
        plus: TreeNodeIndex,
        leaf: TreeNodeIndex,
        at: usize,
    ) -> Vec<P> {
        let [mut bucket, rest] = [minus, plus].map(|side| match self.nodes.remove(side) {
            Some(TreeNode::Leaf(TreeNodeLeaf { mut bucket, .. })) => {
                if side == leaf {
                    bucket.remove(at);
                }
                bucket
            }
            _ => unreachable!("{side:?} is expected to be a leaf"),
        });

        bucket.extend(rest);
        bucket
    }
}

/* ------------------------------------------ Helpers ------------------------------------------ */

fn zip_keyed<P, N>(points: Vec<P>, keys: Vec<Vec<N>>) -> Vec<Keyed<P, N>> {
    debug_assert!(points.len() == keys.len());

    points
        .into_iter()
        .zip(keys)
        .map(|(point, keys)| Keyed { keys, point })
        .collect()
}

/// Splits `entries` at the midpoint of their key range on `dimension`. Keys strictly below
/// the midpoint go minus, everything else goes plus. Each side comes out ordered by `next`.
fn partition<P, N: Number>(
    mut entries: Vec<Keyed<P, N>>,
    dimension: Dimension,
    next: Dimension,
) -> Partition<P, N> {
    // Stable, therefore equal keys retain their previous order.
    entries.sort_by(|a, b| cmp_number(&a.keys[dimension], &b.keys[dimension]));

    let (Some(lo), Some(hi)) = (entries.first(), entries.last()) else {
        unreachable!("only non-empty buckets are partitioned")
    };
    let value = midpoint(lo.keys[dimension], hi.keys[dimension]);

    let (mut minus, mut plus): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|x| value > x.keys[dimension]);

    for side in [&mut minus, &mut plus] {
        side.sort_by(|a, b| cmp_number(&a.keys[next], &b.keys[next]));
    }

    Partition { value, minus, plus }
}
