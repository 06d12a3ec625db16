// This file is part of fortune-sweep.
//
// fortune-sweep is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public
// License as published by the Free Software Foundation,
// either version 3 of the License, or (at your option)
// any later version.
//
// fortune-sweep is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty
// of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General
// Public License along with fortune-sweep. If not, see
// <https://www.gnu.org/licenses/>.

//! The beachline: a height-balanced binary tree whose leaves are the
//! parabolic arcs currently intersected by the sweep line and whose
//! internal nodes are the breakpoints between adjacent arcs.
//!
//! Breakpoint keys are never stored; they are evaluated on demand from the
//! two site indices and the sweep coordinate passed in by the caller, which
//! keeps every comparison pure. Leaves are additionally threaded into a
//! doubly-linked list equal to the in-order traversal, so arc neighborhoods
//! can be read without walking the tree.
//!
//! Nodes live in an append-only arena and refer to each other by id; the
//! arena slot of a removed node is marked free and never reused.

use crate::algorithm::priority_queue::CircleId;
use crate::dcel::{Dcel, HalfEdgeId};
use crate::geometry::{parabola_intersections, ParabolaIntersections, Point2D, Scalar};
use ahash::RandomState;
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use hashbrown::HashSet as HbHashSet;

type HashSet<K> = HbHashSet<K, RandomState>;

/// Identifies a node in the beachline arena.
///
/// This is the index of the node in the arena, plus one, so that we can
/// take advantage of niching optimizations for the parent/child/list links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(NonZeroUsize);

impl NodeId {
    fn from_index(index: usize) -> Self {
        NodeId(NonZeroUsize::new(index + 1).expect("cannot have more than usize::MAX - 1 nodes"))
    }

    fn index(self) -> usize {
        self.0.get() - 1
    }
}

/// What a beachline node stands for.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NodeKind {
    /// A parabolic arc, owning its site and the reference to a scheduled
    /// collapse, if any.
    Arc {
        site: usize,
        circle: Option<CircleId>,
    },
    /// The moving boundary between the arcs of `sites.0` (left) and
    /// `sites.1` (right), tracing `edge` as it goes.
    Breakpoint {
        sites: (usize, usize),
        edge: Option<HalfEdgeId>,
    },
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    height: i32,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    /// Previous leaf in the arc list. Meaningful for arcs only.
    prev: Option<NodeId>,
    /// Next leaf in the arc list. Meaningful for arcs only.
    next: Option<NodeId>,
    freed: bool,
}

/// A freshly built replacement subtree, with its outer leaves exposed so
/// the caller can splice them into the arc list and test circle events.
pub(crate) struct Subtree {
    pub(crate) root: NodeId,
    pub(crate) left_leaf: NodeId,
    pub(crate) right_leaf: NodeId,
}

/// The beachline tree plus the arena backing it.
#[derive(Debug, Default)]
pub(crate) struct Beachline {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Beachline {
    pub(crate) fn new() -> Self {
        Beachline {
            nodes: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Install the very first arc.
    pub(crate) fn init_root(&mut self, site: usize) -> NodeId {
        debug_assert!(self.root.is_none());
        let id = self.push(NodeKind::Arc { site, circle: None });
        self.root = Some(id);
        id
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            kind,
            height: 1,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
            freed: false,
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id.index()).expect("node index out of bounds")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(id.index()).expect("node index out of bounds")
    }

    fn free(&mut self, id: NodeId) {
        self.node_mut(id).freed = true;
    }

    pub(crate) fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Arc { .. })
    }

    /// The site of an arc node.
    pub(crate) fn site(&self, id: NodeId) -> usize {
        match self.node(id).kind {
            NodeKind::Arc { site, .. } => site,
            NodeKind::Breakpoint { .. } => panic!("site of a breakpoint node"),
        }
    }

    /// The index pair of a node; an arc reads as `(site, site)`.
    pub(crate) fn indices(&self, id: NodeId) -> (usize, usize) {
        match self.node(id).kind {
            NodeKind::Arc { site, .. } => (site, site),
            NodeKind::Breakpoint { sites, .. } => sites,
        }
    }

    fn has_indices(&self, id: NodeId, pair: (usize, usize)) -> bool {
        self.indices(id) == pair
    }

    fn set_breakpoint_sites(&mut self, id: NodeId, pair: (usize, usize)) {
        match &mut self.node_mut(id).kind {
            NodeKind::Breakpoint { sites, .. } => *sites = pair,
            NodeKind::Arc { .. } => panic!("rewriting the sites of an arc node"),
        }
    }

    /// The half-edge a breakpoint is tracing.
    pub(crate) fn edge(&self, id: NodeId) -> Option<HalfEdgeId> {
        match self.node(id).kind {
            NodeKind::Breakpoint { edge, .. } => edge,
            NodeKind::Arc { .. } => panic!("edge of an arc node"),
        }
    }

    pub(crate) fn set_edge(&mut self, id: NodeId, new_edge: HalfEdgeId) {
        match &mut self.node_mut(id).kind {
            NodeKind::Breakpoint { edge, .. } => *edge = Some(new_edge),
            NodeKind::Arc { .. } => panic!("tracing an edge from an arc node"),
        }
    }

    #[cfg(test)]
    pub(crate) fn circle_event(&self, id: NodeId) -> Option<CircleId> {
        match self.node(id).kind {
            NodeKind::Arc { circle, .. } => circle,
            NodeKind::Breakpoint { .. } => panic!("circle event of a breakpoint node"),
        }
    }

    pub(crate) fn set_circle_event(&mut self, id: NodeId, event: CircleId) {
        match &mut self.node_mut(id).kind {
            NodeKind::Arc { circle, .. } => *circle = Some(event),
            NodeKind::Breakpoint { .. } => panic!("scheduling a collapse on a breakpoint node"),
        }
    }

    /// Clear and return the arc's scheduled collapse.
    pub(crate) fn take_circle_event(&mut self, id: NodeId) -> Option<CircleId> {
        match &mut self.node_mut(id).kind {
            NodeKind::Arc { circle, .. } => circle.take(),
            NodeKind::Breakpoint { .. } => None,
        }
    }

    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Thread two leaves together in the arc list.
    pub(crate) fn connect(&mut self, prev: NodeId, next: NodeId) {
        self.node_mut(prev).next = Some(next);
        self.node_mut(next).prev = Some(prev);
    }

    fn height(&self, id: Option<NodeId>) -> i32 {
        id.map_or(0, |id| self.node(id).height)
    }

    fn update_height(&mut self, id: NodeId) {
        let h = self
            .height(self.node(id).left)
            .max(self.height(self.node(id).right))
            + 1;
        self.node_mut(id).height = h;
    }

    fn balance(&self, id: NodeId) -> i32 {
        self.height(self.node(id).left) - self.height(self.node(id).right)
    }

    /// The x coordinate a node sorts at for the given sweep position.
    ///
    /// For an arc this is the focus abscissa; for a breakpoint it is the
    /// abscissa of the parabola intersection belonging to the ordered
    /// (left, right) pair: the first of the two x-ordered crossings when
    /// the left site sits lower, the second otherwise.
    pub(crate) fn key<Num: Scalar>(
        &self,
        id: NodeId,
        sites: &[Point2D<Num>],
        sweep: Num,
    ) -> Num {
        match self.node(id).kind {
            NodeKind::Arc { site, .. } => sites[site].x,
            NodeKind::Breakpoint { sites: (l, r), .. } => {
                let p1 = sites[l];
                let p2 = sites[r];
                match parabola_intersections(p1, p2, sweep) {
                    ParabolaIntersections::One(p) => p.x,
                    ParabolaIntersections::Two(a, b) => {
                        if p1.y < p2.y {
                            a.x
                        } else {
                            b.x
                        }
                    }
                    ParabolaIntersections::Duplicate => {
                        panic!("breakpoint between coincident sites")
                    }
                }
            }
        }
    }

    /// Find the arc covering the abscissa `x`.
    pub(crate) fn find<Num: Scalar>(
        &self,
        x: Num,
        sites: &[Point2D<Num>],
        sweep: Num,
    ) -> Option<NodeId> {
        let mut node = self.root?;
        while !self.is_leaf(node) {
            node = if self.key(node, sites, sweep) < x {
                self.node(node).right.expect("breakpoint without a right child")
            } else {
                self.node(node).left.expect("breakpoint without a left child")
            };
        }
        Some(node)
    }

    /// Rotate the subtree at `node` to the left; returns the new subtree
    /// root. The parent's child link and all three affected heights are
    /// re-derived.
    fn rotate_left(&mut self, node: NodeId) -> NodeId {
        let rnode = self.node(node).right.expect("left rotation without a right child");

        // hang the new subtree root off the old parent
        let parent = self.node(node).parent;
        if let Some(parent) = parent {
            if self.node(parent).left == Some(node) {
                self.node_mut(parent).left = Some(rnode);
            } else {
                self.node_mut(parent).right = Some(rnode);
            }
        }
        self.node_mut(rnode).parent = parent;

        // the right child's left subtree moves under `node`
        let transfer = self.node(rnode).left;
        self.node_mut(node).right = transfer;
        if let Some(transfer) = transfer {
            self.node_mut(transfer).parent = Some(node);
        }

        // `node` becomes the left child of its old right child
        self.node_mut(rnode).left = Some(node);
        self.node_mut(node).parent = Some(rnode);

        self.update_height(node);
        self.update_height(rnode);
        if let Some(parent) = parent {
            self.update_height(parent);
        }

        rnode
    }

    /// Mirror image of [`Self::rotate_left`].
    fn rotate_right(&mut self, node: NodeId) -> NodeId {
        let lnode = self.node(node).left.expect("right rotation without a left child");

        let parent = self.node(node).parent;
        if let Some(parent) = parent {
            if self.node(parent).left == Some(node) {
                self.node_mut(parent).left = Some(lnode);
            } else {
                self.node_mut(parent).right = Some(lnode);
            }
        }
        self.node_mut(lnode).parent = parent;

        let transfer = self.node(lnode).right;
        self.node_mut(node).left = transfer;
        if let Some(transfer) = transfer {
            self.node_mut(transfer).parent = Some(node);
        }

        self.node_mut(lnode).right = Some(node);
        self.node_mut(node).parent = Some(lnode);

        self.update_height(node);
        self.update_height(lnode);
        if let Some(parent) = parent {
            self.update_height(parent);
        }

        lnode
    }

    /// Splice `subtree` in place of the leaf `leaf`, then rebalance on the
    /// way back to the root.
    ///
    /// Before the inner rotation of a double rotation, the chosen child is
    /// checked to not be a leaf; rotating into a leaf would tear the arc
    /// list apart.
    pub(crate) fn replace<Num: Scalar>(
        &mut self,
        leaf: NodeId,
        subtree: NodeId,
        sites: &[Point2D<Num>],
        sweep: Num,
    ) {
        let x = self.key(subtree, sites, sweep);
        let parent = self.node(leaf).parent;

        self.node_mut(subtree).parent = parent;
        if let Some(parent) = parent {
            if self.key(parent, sites, sweep) < x {
                self.node_mut(parent).right = Some(subtree);
            } else {
                self.node_mut(parent).left = Some(subtree);
            }
        }
        self.free(leaf);

        let mut new_root = subtree;
        let mut current = parent;
        while let Some(mut node) = current {
            self.update_height(node);
            let balance = self.balance(node);
            if balance > 1 {
                if let Some(left) = self.node(node).left {
                    if !self.is_leaf(left) && self.balance(left) < 0 {
                        self.rotate_left(left);
                    }
                }
                node = self.rotate_right(node);
            } else if balance < -1 {
                if let Some(right) = self.node(node).right {
                    if !self.is_leaf(right) && self.balance(right) > 0 {
                        self.rotate_right(right);
                    }
                }
                node = self.rotate_left(node);
            }
            new_root = node;
            current = self.node(node).parent;
        }

        self.root = Some(new_root);
    }

    /// Remove the arc collapsed by a circle event.
    ///
    /// The leaf and the parent breakpoint disappear; the sibling subtree is
    /// promoted into the grandparent's slot. The two breakpoints bounding
    /// the arc coincide at the collapse instant, so on the way up the first
    /// ancestor holding the untouched pair is rewritten to the merged
    /// (previous-site, next-site) pair. Finishes by rebalancing and by
    /// splicing the leaf out of the arc list.
    pub(crate) fn remove(&mut self, leaf: NodeId) {
        let prev = self.node(leaf).prev.expect("collapsing arc without a left neighbor");
        let next = self.node(leaf).next.expect("collapsing arc without a right neighbor");
        let parent = self.node(leaf).parent.expect("collapsing arc without a parent");
        let grandparent = self
            .node(parent)
            .parent
            .expect("collapsing arc directly under the root");

        let bp1 = (self.site(prev), self.site(leaf));
        let bp2 = (self.site(leaf), self.site(next));
        let merged = (self.site(prev), self.site(next));

        assert!(
            self.has_indices(parent, bp1) || self.has_indices(parent, bp2),
            "parent is not a breakpoint of the collapsing arc"
        );
        let other_bp = if self.has_indices(parent, bp1) { bp2 } else { bp1 };

        let other_subtree = if self.node(parent).left == Some(leaf) {
            self.node(parent).right
        } else {
            self.node(parent).left
        }
        .expect("breakpoint without both children");

        self.node_mut(other_subtree).parent = Some(grandparent);
        if self.node(grandparent).left == Some(parent) {
            self.node_mut(grandparent).left = Some(other_subtree);
        } else {
            self.node_mut(grandparent).right = Some(other_subtree);
        }

        let mut new_root = grandparent;
        let mut current = Some(grandparent);
        while let Some(mut node) = current {
            if self.has_indices(node, other_bp) {
                self.set_breakpoint_sites(node, merged);
            }
            self.update_height(node);
            let balance = self.balance(node);
            if balance > 1 {
                if let Some(left) = self.node(node).left {
                    if !self.is_leaf(left) && self.balance(left) < 0 {
                        self.rotate_left(left);
                    }
                }
                node = self.rotate_right(node);
            } else if balance < -1 {
                if let Some(right) = self.node(node).right {
                    if !self.is_leaf(right) && self.balance(right) > 0 {
                        self.rotate_right(right);
                    }
                }
                node = self.rotate_left(node);
            }
            new_root = node;
            current = self.node(node).parent;
        }
        self.root = Some(new_root);

        self.connect(prev, next);
        self.free(leaf);
        self.free(parent);
    }

    /// The two breakpoints bounding an arc, `(left, right)`.
    ///
    /// The parent is one of them; which side it is on depends on the tree
    /// shape, so the pair it holds decides, and the other breakpoint is the
    /// first ancestor holding the complementary pair. Either side comes
    /// back `None` when the arc has no neighbor there or the beachline has
    /// drifted since the caller last looked (a stale circle event).
    pub(crate) fn breakpoints(&self, leaf: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        let (prev, next) = match (self.node(leaf).prev, self.node(leaf).next) {
            (Some(prev), Some(next)) => (prev, next),
            _ => return (None, None),
        };
        let parent = match self.node(leaf).parent {
            Some(parent) => parent,
            None => return (None, None),
        };

        let bp1 = (self.site(prev), self.site(leaf)); // left breakpoint
        let bp2 = (self.site(leaf), self.site(next)); // right breakpoint

        let (other_bp, left_is_missing) = if self.has_indices(parent, bp1) {
            (bp2, false)
        } else if self.has_indices(parent, bp2) {
            (bp1, true)
        } else {
            return (None, None);
        };

        let mut other = Some(parent);
        while let Some(node) = other {
            if self.has_indices(node, other_bp) {
                break;
            }
            other = self.node(node).parent;
        }

        if left_is_missing {
            (other, Some(parent))
        } else {
            (Some(parent), other)
        }
    }

    /// Build the three-leaf subtree of a generic arc split.
    ///
    /// The arc of `index_behind` is duplicated on the outside, the new arc
    /// of `index` sits in the middle, and the two breakpoints trace the two
    /// halves of a fresh twin pair.
    pub(crate) fn make_subtree<Num>(
        &mut self,
        index: usize,
        index_behind: usize,
        dcel: &mut Dcel<Num>,
    ) -> Subtree {
        let node1 = self.push(NodeKind::Breakpoint {
            sites: (index_behind, index),
            edge: None,
        });
        let node2 = self.push(NodeKind::Breakpoint {
            sites: (index, index_behind),
            edge: None,
        });
        let leaf1 = self.push(NodeKind::Arc {
            site: index_behind,
            circle: None,
        });
        let leaf2 = self.push(NodeKind::Arc {
            site: index,
            circle: None,
        });
        let leaf3 = self.push(NodeKind::Arc {
            site: index_behind,
            circle: None,
        });

        self.node_mut(node1).right = Some(node2);
        self.node_mut(node2).parent = Some(node1);

        self.node_mut(node1).left = Some(leaf1);
        self.node_mut(leaf1).parent = Some(node1);

        self.node_mut(node2).left = Some(leaf2);
        self.node_mut(leaf2).parent = Some(node2);

        self.node_mut(node2).right = Some(leaf3);
        self.node_mut(leaf3).parent = Some(node2);

        let (h, h_twin) = dcel.make_twins(index_behind, index);
        self.set_edge(node1, h);
        self.set_edge(node2, h_twin);

        self.connect(leaf1, leaf2);
        self.connect(leaf2, leaf3);

        self.update_height(node2);
        self.update_height(node1);

        Subtree {
            root: node1,
            left_leaf: leaf1,
            right_leaf: leaf3,
        }
    }

    /// Build the two-leaf subtree of the tangent case (new site level with
    /// the split arc's site); the single breakpoint is ordered by site x
    /// and traces the matching half of the twin pair.
    pub(crate) fn make_simple_subtree<Num: Scalar>(
        &mut self,
        index: usize,
        index_behind: usize,
        sites: &[Point2D<Num>],
        dcel: &mut Dcel<Num>,
    ) -> Subtree {
        let (h, h_twin) = dcel.make_twins(index_behind, index);

        let (node, leaf_l, leaf_r) = if sites[index].x < sites[index_behind].x {
            let node = self.push(NodeKind::Breakpoint {
                sites: (index, index_behind),
                edge: Some(h_twin),
            });
            let leaf_l = self.push(NodeKind::Arc {
                site: index,
                circle: None,
            });
            let leaf_r = self.push(NodeKind::Arc {
                site: index_behind,
                circle: None,
            });
            (node, leaf_l, leaf_r)
        } else {
            let node = self.push(NodeKind::Breakpoint {
                sites: (index_behind, index),
                edge: Some(h),
            });
            let leaf_l = self.push(NodeKind::Arc {
                site: index_behind,
                circle: None,
            });
            let leaf_r = self.push(NodeKind::Arc {
                site: index,
                circle: None,
            });
            (node, leaf_l, leaf_r)
        };

        self.node_mut(node).left = Some(leaf_l);
        self.node_mut(node).right = Some(leaf_r);
        self.node_mut(leaf_l).parent = Some(node);
        self.node_mut(leaf_r).parent = Some(node);

        self.connect(leaf_l, leaf_r);
        self.update_height(node);

        Subtree {
            root: node,
            left_leaf: leaf_l,
            right_leaf: leaf_r,
        }
    }

    /// The arcs currently on the beachline, left to right, read off the
    /// leaf list.
    #[cfg(test)]
    pub(crate) fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut leaf = self.root.map(|root| {
            let mut node = root;
            while let Some(left) = self.node(node).left {
                node = left;
            }
            node
        });
        while let Some(id) = leaf {
            leaves.push(id);
            leaf = self.node(id).next;
        }
        leaves
    }

    /// The sites of the arcs currently on the beachline, left to right.
    #[cfg(test)]
    pub(crate) fn leaf_sites(&self) -> Vec<usize> {
        self.leaves().into_iter().map(|id| self.site(id)).collect()
    }

    /// Exhaustively check every structural invariant of the tree.
    ///
    /// Panics on: a freed slot still linked, an arc with children, a
    /// breakpoint missing a child, a broken parent link, a stored height
    /// diverging from the recomputed one, a balance factor outside
    /// `[-1, 1]`, the arc list diverging from the in-order leaf sequence,
    /// and two live breakpoints holding the same index pair.
    pub(crate) fn validate(&self) {
        let root = match self.root {
            Some(root) => root,
            None => return,
        };
        assert!(self.node(root).parent.is_none(), "root with a parent link");

        let mut pairs: HashSet<(usize, usize)> = HashSet::default();
        self.validate_node(root, &mut pairs);

        let mut inorder = Vec::new();
        self.collect_leaves(root, &mut inorder);

        let head = *inorder.first().expect("tree without leaves");
        assert!(self.node(head).prev.is_none(), "leftmost leaf with a predecessor");
        assert!(
            self.node(*inorder.last().expect("tree without leaves")).next.is_none(),
            "rightmost leaf with a successor"
        );

        let mut listed = Vec::new();
        let mut leaf = Some(head);
        while let Some(id) = leaf {
            listed.push(id);
            leaf = self.node(id).next;
        }
        assert_eq!(inorder, listed, "arc list diverges from the in-order leaves");
    }

    fn validate_node(&self, id: NodeId, pairs: &mut HashSet<(usize, usize)>) -> i32 {
        let node = self.node(id);
        assert!(!node.freed, "live link to a freed slot");

        match node.kind {
            NodeKind::Arc { .. } => {
                assert!(
                    node.left.is_none() && node.right.is_none(),
                    "arc node with children"
                );
                assert_eq!(node.height, 1, "arc node with a stale height");
                1
            }
            NodeKind::Breakpoint { sites, .. } => {
                assert!(pairs.insert(sites), "two breakpoints hold the same pair");

                let (left, right) = match (node.left, node.right) {
                    (Some(left), Some(right)) => (left, right),
                    _ => panic!("breakpoint missing a child"),
                };
                assert_eq!(self.node(left).parent, Some(id), "broken parent link");
                assert_eq!(self.node(right).parent, Some(id), "broken parent link");

                let lh = self.validate_node(left, pairs);
                let rh = self.validate_node(right, pairs);
                assert!((lh - rh).abs() <= 1, "balance factor out of range");
                assert_eq!(node.height, lh.max(rh) + 1, "stale height");
                lh.max(rh) + 1
            }
        }
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        match (node.left, node.right) {
            (Some(left), Some(right)) => {
                self.collect_leaves(left, out);
                self.collect_leaves(right, out);
            }
            _ => out.push(id),
        }
    }
}
