mod bucket;
mod view;

use enum_as_inner::EnumAsInner;
use slotmap::SlotMap;

use crate::accessor::Accessor;
use crate::error::{DeleteError, DimensionNotFound, ParameterError};
use crate::param::TreeParameter;
use crate::primitive::{cmp_number, next_dimension, Dimension, Number};

pub use view::*;

/* ---------------------------------------------------------------------------------------------- */
/*                                             KD-TREE                                            */
/* ---------------------------------------------------------------------------------------------- */

/// A bucketed KD-tree.
///
/// Points are stored in leaf buckets of at most `bucket_capacity` elements. Inserting into
/// a full leaf splits it at the midpoint of the bucket's value range; deleting from a pair
/// of sibling leaves merges them back once they run low, or redistributes them when they
/// drift out of balance.
pub struct Tree<P, A: Accessor<P>> {
    nodes: SlotMap<TreeNodeIndex, TreeNode<P, A::Num>>,
    root: TreeNodeIndex,
    accessor: A,
    params: TreeParameter,
    dimensions: usize,
    len: usize,
}

#[derive(EnumAsInner)]
enum TreeNode<P, N> {
    Split(TreeNodeSplit<N>),
    Leaf(TreeNodeLeaf<P>),
}

#[derive(Clone, Copy)]
struct TreeNodeSplit<N> {
    dimension: Dimension,
    value: N,
    /// Points with `value(p, dimension) < value`
    minus: TreeNodeIndex,
    /// Everything else
    plus: TreeNodeIndex,
}

struct TreeNodeLeaf<P> {
    dimension: Dimension,
    /// Ascending by `dimension`, equal keys in insertion order.
    bucket: Vec<P>,
}

/// Structural change reported by [`Tree::insert_with`] and [`Tree::delete_with`].
#[derive(EnumAsInner, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// Leaf `from` became a split node with two new leaves.
    Split {
        from: TreeNodeIndex,
        minus: TreeNodeIndex,
        plus: TreeNodeIndex,
    },

    /// Leaf `from` was disposed and its points moved into the new leaf `into`, which took
    /// over the slot of their former parent.
    Merge {
        from: TreeNodeIndex,
        into: TreeNodeIndex,
    },

    /// Both children of split node `node` were replaced by `minus` and `plus`.
    Rebalance {
        node: TreeNodeIndex,
        minus: TreeNodeIndex,
        plus: TreeNodeIndex,
    },
}

/* --------------------------------------- Public Tree API -------------------------------------- */

impl<P, A: Accessor<P>> Tree<P, A> {
    /// # Panics
    ///
    /// Panics if `bucket_capacity` is zero, or `seed_dimension` is not one of the
    /// accessor's dimensions. Use [`Tree::with_params`] to handle that as an error.
    pub fn new(accessor: A, bucket_capacity: usize, seed_dimension: Dimension) -> Self {
        let params = TreeParameter::new(bucket_capacity, seed_dimension);

        match Self::with_params(accessor, params) {
            Ok(tree) => tree,
            Err(e) => panic!("invalid tree parameter: {e}"),
        }
    }

    pub fn with_params(accessor: A, params: TreeParameter) -> Result<Self, ParameterError> {
        let dimensions = accessor.dimensions();
        params.validate(dimensions)?;

        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TreeNode::Leaf(TreeNodeLeaf {
            dimension: params.seed_dimension,
            bucket: Vec::new(),
        }));

        Ok(Self {
            nodes,
            root,
            accessor,
            params,
            dimensions,
            len: 0,
        })
    }

    pub fn params(&self) -> &TreeParameter {
        &self.params
    }

    pub fn bucket_capacity(&self) -> usize {
        self.params.bucket_capacity
    }

    pub fn seed_dimension(&self) -> Dimension {
        self.params.seed_dimension
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every point, leaving a single empty root leaf ordered by the seed dimension.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(TreeNode::Leaf(TreeNodeLeaf {
            dimension: self.params.seed_dimension,
            bucket: Vec::new(),
        }));
        self.len = 0;
    }

    /// Finds the leaf `point` routes to. Fails only if the accessor can't resolve a split
    /// dimension on the way down.
    pub fn query(&self, point: &P) -> Result<TreeNodeIndex, DimensionNotFound> {
        let mut index = self.root; // Starts from root

        loop {
            match &self.nodes[index] {
                TreeNode::Split(split) => index = self.route(split, point)?,
                TreeNode::Leaf(..) => return Ok(index),
            }
        }
    }

    pub fn insert(&mut self, point: P) -> Result<(), DimensionNotFound> {
        self.insert_with(point, |_| {})
    }

    /// Inserts `point`, reporting every split it causes to `on_update`.
    ///
    /// On error the tree is left exactly as it was.
    pub fn insert_with(
        &mut self,
        point: P,
        mut on_update: impl FnMut(TreeEvent),
    ) -> Result<(), DimensionNotFound> {
        let leaf = self.query(&point)?;
        self.insert_into_leaf(leaf, point, &mut on_update)?;
        self.len += 1;

        Ok(())
    }
}

impl<P: PartialEq, A: Accessor<P>> Tree<P, A> {
    pub fn delete(&mut self, point: &P) -> Result<(), DeleteError> {
        self.delete_with(point, |_| {})
    }

    /// Removes one occurrence of `point`, reporting merges and rebalances to `on_update`.
    ///
    /// Only the leaf `point` routes to is searched. If it isn't there, this returns
    /// [`DeleteError::NotFound`] and the tree is untouched.
    pub fn delete_with(
        &mut self,
        point: &P,
        mut on_update: impl FnMut(TreeEvent),
    ) -> Result<(), DeleteError> {
        // A root leaf has no parent to rebalance; just look into its bucket.
        let root = self.root;

        if let TreeNode::Leaf(leaf) = &mut self.nodes[root] {
            let at = leaf
                .bucket
                .iter()
                .position(|x| x == point)
                .ok_or(DeleteError::NotFound)?;

            leaf.bucket.remove(at);
            self.len -= 1;

            return Ok(());
        }

        let mut parent = root;

        loop {
            let TreeNode::Split(split) = &self.nodes[parent] else {
                unreachable!("descent only continues through split nodes")
            };

            let child = self.route(split, point)?;

            match &self.nodes[child] {
                TreeNode::Split(..) => {
                    tracing::trace!(?parent, ?child, "descend");
                    parent = child;
                }
                TreeNode::Leaf(leaf) => {
                    let at = leaf
                        .bucket
                        .iter()
                        .position(|x| x == point)
                        .ok_or(DeleteError::NotFound)?;

                    self.remove_from_split(parent, child, at, &mut on_update)?;
                    self.len -= 1;

                    return Ok(());
                }
            }
        }
    }

    /// Whether `point` is stored in the leaf it routes to.
    pub fn contains(&self, point: &P) -> Result<bool, DimensionNotFound> {
        let leaf = self.query(point)?;
        Ok(self.leaf(leaf).bucket.contains(point))
    }
}

/* ---------------------------------------- Internal APIs --------------------------------------- */

impl<P, A: Accessor<P>> Tree<P, A> {
    /// Picks the child of `split` that `point` belongs to.
    fn route(
        &self,
        split: &TreeNodeSplit<A::Num>,
        point: &P,
    ) -> Result<TreeNodeIndex, DimensionNotFound> {
        let value = self.accessor.value(point, split.dimension)?;

        Ok(if value < split.value {
            split.minus
        } else {
            split.plus
        })
    }

    fn next_dimension(&self, dimension: Dimension) -> Dimension {
        next_dimension(dimension, self.dimensions)
    }

    /// Reads the key of every point along `dimension`. Reading keys is the only fallible
    /// part of any restructuring, and it never touches the tree.
    fn read_keys<'a>(
        &self,
        points: impl IntoIterator<Item = &'a P>,
        dimension: Dimension,
    ) -> Result<Vec<A::Num>, DimensionNotFound>
    where
        P: 'a,
    {
        points
            .into_iter()
            .map(|x| self.accessor.value(x, dimension))
            .collect()
    }

    /// Reads `point` along every dimension, in dimension order.
    fn read_point(&self, point: &P) -> Result<Vec<A::Num>, DimensionNotFound> {
        (0..self.dimensions)
            .map(|dimension| self.accessor.value(point, dimension))
            .collect()
    }

    fn leaf(&self, node: TreeNodeIndex) -> &TreeNodeLeaf<P> {
        match &self.nodes[node] {
            TreeNode::Leaf(leaf) => leaf,
            TreeNode::Split(..) => unreachable!("{node:?} is expected to be a leaf"),
        }
    }

    fn leaf_mut(&mut self, node: TreeNodeIndex) -> &mut TreeNodeLeaf<P> {
        match &mut self.nodes[node] {
            TreeNode::Leaf(leaf) => leaf,
            TreeNode::Split(..) => unreachable!("{node:?} is expected to be a leaf"),
        }
    }
}

/* ---------------------------------------------------------------------------------------------- */
/*                                           VALIDATION                                           */
/* ---------------------------------------------------------------------------------------------- */

impl<P, A: Accessor<P>> Tree<P, A> {
    /// Walks the whole tree and checks every structural invariant:
    ///
    /// - Root dimension matches seed while the root is a leaf, every child's dimension is
    ///   the one after its parent's.
    /// - Buckets are ordered by their leaf's dimension.
    /// - Every point below a split node sits on the correct side of it.
    /// - No leaf exceeds the bucket capacity, unless its points can't be told apart by
    ///   the midpoint rule along its dimension.
    /// - Every slot is reachable exactly once and the cached length is correct.
    #[doc(hidden)]
    pub fn __debug_verify_tree_state(&self) -> Result<(), String> {
        if self.nodes[self.root].is_leaf()
            && self.leaf(self.root).dimension != self.params.seed_dimension
        {
            return Err("root leaf dimension differs from seed dimension".into());
        }

        let mut visited = 0;
        let count = self.verify_recursive(self.root, None, &mut visited)?;

        if count != self.len {
            return Err(format!("cached len {} but {} points found", self.len, count));
        }

        if visited != self.nodes.len() {
            return Err(format!(
                "{} nodes allocated but {} reachable",
                self.nodes.len(),
                visited
            ));
        }

        Ok(())
    }

    fn verify_recursive(
        &self,
        node: TreeNodeIndex,
        parent_dimension: Option<Dimension>,
        visited: &mut usize,
    ) -> Result<usize, String> {
        let Some(tree_node) = self.nodes.get(node) else {
            return Err(format!("{node:?} is dangling"));
        };

        *visited += 1;

        let dimension = match tree_node {
            TreeNode::Split(split) => split.dimension,
            TreeNode::Leaf(leaf) => leaf.dimension,
        };

        if dimension >= self.dimensions {
            return Err(format!("{node:?} has out-of-range dimension {dimension}"));
        }

        if let Some(parent) = parent_dimension {
            if dimension != self.next_dimension(parent) {
                return Err(format!(
                    "{node:?} has dimension {dimension}, parent has {parent}"
                ));
            }
        }

        match tree_node {
            TreeNode::Split(split) => {
                let cnt_m = self.verify_recursive(split.minus, Some(dimension), visited)?;
                let cnt_p = self.verify_recursive(split.plus, Some(dimension), visited)?;

                for (side, is_minus) in [(split.minus, true), (split.plus, false)] {
                    let mut points = Vec::new();
                    self.collect_points(side, &mut points);

                    for key in self.read_keys(points, dimension).map_err(|e| e.to_string())? {
                        if (key < split.value) != is_minus {
                            return Err(format!(
                                "{node:?}: key {key:?} is on the wrong side of {:?}",
                                split.value
                            ));
                        }
                    }
                }

                Ok(cnt_m + cnt_p)
            }
            TreeNode::Leaf(leaf) => {
                let keys = self
                    .read_keys(&leaf.bucket, dimension)
                    .map_err(|e| e.to_string())?;

                if keys.windows(2).any(|x| cmp_number(&x[0], &x[1]).is_gt()) {
                    return Err(format!("{node:?}: bucket is not ordered"));
                }

                if keys.len() > self.params.bucket_capacity && is_separable(&keys) {
                    return Err(format!(
                        "{node:?}: {} points exceed capacity {}",
                        keys.len(),
                        self.params.bucket_capacity
                    ));
                }

                Ok(keys.len())
            }
        }
    }

    fn collect_points<'a>(&'a self, node: TreeNodeIndex, out: &mut Vec<&'a P>) {
        match &self.nodes[node] {
            TreeNode::Split(split) => {
                self.collect_points(split.minus, out);
                self.collect_points(split.plus, out);
            }
            TreeNode::Leaf(leaf) => out.extend(leaf.bucket.iter()),
        }
    }
}

/// Whether splitting the sorted `keys` at the midpoint of their range puts points on both
/// sides, under the same rule the partition uses.
fn is_separable<N: Number>(keys: &[N]) -> bool {
    let (Some(&lo), Some(&hi)) = (keys.first(), keys.last()) else {
        return false;
    };

    let value = crate::primitive::midpoint(lo, hi);
    keys.iter().any(|x| *x < value) && keys.iter().any(|x| *x >= value)
}

/* ------------------------------------------ Id Types ------------------------------------------ */

slotmap::new_key_type! {
    /// Index of tree node
    pub struct TreeNodeIndex;
}

static_assertions::assert_impl_all!(Tree<[i32; 2], crate::accessor::Axes>: Send, Sync);

/* ---------------------------------------------------------------------------------------------- */
/*                                              TESTS                                             */
/* ---------------------------------------------------------------------------------------------- */
