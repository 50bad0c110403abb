use std::fmt;

use super::{Tree, TreeNode, TreeNodeIndex};

use crate::accessor::Accessor;
use crate::primitive::Dimension;

/* ---------------------------------------------------------------------------------------------- */
/*                                            TRAVERSAL                                           */
/* ---------------------------------------------------------------------------------------------- */

/// Read-only view of a single tree node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a, P, N> {
    Split {
        dimension: Dimension,
        value: N,
        minus: TreeNodeIndex,
        plus: TreeNodeIndex,
    },
    Leaf {
        dimension: Dimension,
        points: &'a [P],
    },
}

impl<'a, P, N> NodeRef<'a, P, N> {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Split { dimension, .. } | Self::Leaf { dimension, .. } => *dimension,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Points of a leaf; empty for split nodes.
    pub fn points(&self) -> &'a [P] {
        match self {
            Self::Leaf { points, .. } => *points,
            Self::Split { .. } => &[],
        }
    }
}

impl<P, A: Accessor<P>> Tree<P, A> {
    pub fn root(&self) -> TreeNodeIndex {
        self.root
    }

    /// Returns `None` if `id` is not a live node of this tree.
    pub fn node(&self, id: TreeNodeIndex) -> Option<NodeRef<'_, P, A::Num>> {
        Some(match self.nodes.get(id)? {
            TreeNode::Split(split) => NodeRef::Split {
                dimension: split.dimension,
                value: split.value,
                minus: split.minus,
                plus: split.plus,
            },
            TreeNode::Leaf(leaf) => NodeRef::Leaf {
                dimension: leaf.dimension,
                points: &leaf.bucket,
            },
        })
    }

    pub fn is_leaf(&self, id: TreeNodeIndex) -> Option<bool> {
        self.nodes.get(id).map(|x| x.is_leaf())
    }

    /// Number of points in leaf `id`, or zero if it's not a leaf.
    pub fn leaf_len(&self, id: TreeNodeIndex) -> usize {
        self.leaf_points(id).len()
    }

    pub fn leaf_points(&self, id: TreeNodeIndex) -> &[P] {
        match self.nodes.get(id) {
            Some(TreeNode::Leaf(leaf)) => &leaf.bucket,
            _ => &[],
        }
    }

    /// Visits every leaf depth-first, minus before plus.
    pub fn visit_leaves(&self, mut visit: impl FnMut(&Self, TreeNodeIndex)) {
        recurse(self, self.root, &mut visit);

        fn recurse<P, A: Accessor<P>>(
            tree: &Tree<P, A>,
            node: TreeNodeIndex,
            visit: &mut impl FnMut(&Tree<P, A>, TreeNodeIndex),
        ) {
            match &tree.nodes[node] {
                TreeNode::Split(split) => {
                    recurse(tree, split.minus, visit);
                    recurse(tree, split.plus, visit);
                }
                TreeNode::Leaf(..) => visit(tree, node),
            }
        }
    }

    /// Every stored point, in leaf visiting order.
    pub fn iter(&self) -> impl Iterator<Item = &P> + '_ {
        let mut leaves = Vec::new();
        self.visit_leaves(|_, leaf| leaves.push(leaf));

        leaves
            .into_iter()
            .flat_map(move |leaf| self.leaf_points(leaf).iter())
    }

    /// Displays every leaf bucket on its own line, in leaf visiting order.
    pub fn dump(&self) -> Dump<'_, P, A> {
        Dump { tree: self }
    }
}

/* --------------------------------------------- Dump -------------------------------------------- */

pub struct Dump<'a, P, A: Accessor<P>> {
    tree: &'a Tree<P, A>,
}

impl<P: fmt::Debug, A: Accessor<P>> fmt::Display for Dump<'_, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut leaves = Vec::new();
        self.tree.visit_leaves(|_, leaf| leaves.push(leaf));

        for leaf in leaves {
            write!(f, "|")?;

            for point in self.tree.leaf_points(leaf) {
                write!(f, " {point:?} |")?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}
