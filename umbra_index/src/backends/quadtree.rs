// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region quadtree backend with oversized children and an outside-root set.
//!
//! Nodes live in an arena and refer to each other by index. Every tracked slot
//! remembers which node holds it (or that it sits outside the root region), so
//! updates start from the current node instead of searching from the root.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb2D, Scalar};

/// Tuning knobs for [`QuadTree`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadTreeConfig {
    /// A leaf partitions once it would hold more than this many occupants.
    pub max_occupants: usize,
    /// A subtree whose occupant count drops below this collapses into its root.
    pub min_occupants: usize,
    /// Child regions are scaled by this factor around their quadrant center.
    pub oversize_multiplier: f32,
    /// Nodes at this depth never partition and tolerate overflow.
    pub max_levels: u32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_occupants: 3,
            min_occupants: 1,
            oversize_multiplier: 1.2,
            max_levels: 20,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
struct QNode<T> {
    region: Aabb2D<T>,
    center: (T, T),
    parent: Option<NodeIdx>,
    children: Option<[NodeIdx; 4]>,
    occupants: Vec<usize>,
    // Rollup over the whole subtree, including `occupants`.
    num_occupants: usize,
    level: u32,
}

impl<T: Scalar> QNode<T> {
    fn new(region: Aabb2D<T>, parent: Option<NodeIdx>, level: u32) -> Self {
        Self {
            region,
            center: region.center(),
            parent,
            children: None,
            occupants: Vec::new(),
            num_occupants: 0,
            level,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Home {
    Node(NodeIdx),
    OutsideRoot,
}

#[derive(Copy, Clone, Debug)]
struct SlotState<T> {
    aabb: Aabb2D<T>,
    home: Home,
}

/// Region quadtree over movable boxes.
///
/// - Occupants descend into the child quadrant that fully contains them and
///   otherwise stay at the deepest node that does.
/// - Child regions are oversized so that boxes near a split line still fit a
///   child most of the time.
/// - Boxes outside the root region are kept in a separate set instead of
///   growing the root.
pub struct QuadTree<T: Scalar> {
    config: QuadTreeConfig,
    root: NodeIdx,
    arena: Vec<Option<QNode<T>>>,
    free_nodes: Vec<usize>,
    slots: Vec<Option<SlotState<T>>>,
    outside_root: Vec<usize>,
}

impl<T: Scalar> QuadTree<T> {
    /// Create an empty tree covering `region` with the default configuration.
    pub fn new(region: Aabb2D<T>) -> Self {
        Self::with_config(region, QuadTreeConfig::default())
    }

    /// Create an empty tree covering `region`.
    pub fn with_config(region: Aabb2D<T>, config: QuadTreeConfig) -> Self {
        assert!(!region.is_empty(), "quadtree root region is inverted");
        assert!(
            config.max_occupants >= 1,
            "max_occupants must allow at least one occupant per node"
        );
        Self {
            config,
            root: NodeIdx::new(0),
            arena: vec![Some(QNode::new(region, None, 0))],
            free_nodes: Vec::new(),
            slots: Vec::new(),
            outside_root: Vec::new(),
        }
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Region covered by the root node.
    pub fn root_region(&self) -> Aabb2D<T> {
        self.node(self.root).region
    }

    /// Number of occupants stored inside the root region.
    pub fn num_occupants(&self) -> usize {
        self.node(self.root).num_occupants
    }

    /// Number of occupants tracked outside the root region.
    pub fn num_outside_root(&self) -> usize {
        self.outside_root.len()
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len() - self.free_nodes.len()
    }

    /// Deepest level currently present. The root is level 0.
    pub fn depth(&self) -> u32 {
        self.arena
            .iter()
            .flatten()
            .map(|n| n.level)
            .max()
            .unwrap_or(0)
    }

    /// Visit every node region with its level, root first.
    ///
    /// Intended for debug overlays.
    pub fn node_regions(&self) -> impl Iterator<Item = (Aabb2D<T>, u32)> + '_ {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(i) = stack.pop() {
            let n = self.node(i);
            out.push((n.region, n.level));
            if let Some(children) = n.children {
                stack.extend(children.iter().rev());
            }
        }
        out.into_iter()
    }

    fn node(&self, idx: NodeIdx) -> &QNode<T> {
        self.arena[idx.get()].as_ref().expect("dangling quadtree node")
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut QNode<T> {
        self.arena[idx.get()]
            .as_mut()
            .expect("dangling quadtree node")
    }

    fn slot(&self, slot: usize) -> &SlotState<T> {
        self.slots
            .get(slot)
            .and_then(|s| s.as_ref())
            .expect("slot is not tracked by this quadtree")
    }

    fn slot_mut(&mut self, slot: usize) -> &mut SlotState<T> {
        self.slots
            .get_mut(slot)
            .and_then(|s| s.as_mut())
            .expect("slot is not tracked by this quadtree")
    }

    fn alloc_node(&mut self, node: QNode<T>) -> NodeIdx {
        if let Some(i) = self.free_nodes.pop() {
            self.arena[i] = Some(node);
            NodeIdx::new(i)
        } else {
            self.arena.push(Some(node));
            NodeIdx::new(self.arena.len() - 1)
        }
    }

    /// Return a node's arena slot to the free list and hand the node back.
    fn free_node(&mut self, idx: NodeIdx) -> QNode<T> {
        let node = self.arena[idx.get()]
            .take()
            .expect("dangling quadtree node");
        self.free_nodes.push(idx.get());
        node
    }

    /// Quadrant index picked from the box's min corner.
    ///
    /// If the min corner and the rest of the box land in different quadrants
    /// the box fits no child, which the containment check catches.
    fn quadrant_for(&self, node: NodeIdx, aabb: &Aabb2D<T>) -> usize {
        let (cx, cy) = self.node(node).center;
        let x = usize::from(aabb.min_x > cx);
        let y = usize::from(aabb.min_y > cy);
        x * 2 + y
    }

    /// Child of `node` that fully contains `aabb`, if any.
    fn fitting_child(&self, node: NodeIdx, aabb: &Aabb2D<T>) -> Option<NodeIdx> {
        let children = self.node(node).children?;
        let child = children[self.quadrant_for(node, aabb)];
        self.node(child).region.contains(aabb).then_some(child)
    }

    fn partition(&mut self, node: NodeIdx) {
        let (region, center, level) = {
            let n = self.node(node);
            debug_assert!(n.children.is_none(), "node is already partitioned");
            (n.region, n.center, n.level)
        };
        let (w, h) = region.dims();
        let (hw, hh) = (T::half(w), T::half(h));
        let m = T::from_f32(self.config.oversize_multiplier);
        let step = |on: bool, v: T| if on { v } else { T::zero() };

        let mut children = [NodeIdx::new(0); 4];
        for x in 0..2 {
            for y in 0..2 {
                let (ox, oy) = (step(x == 1, hw), step(y == 1, hh));
                let mut child_region = Aabb2D::new(
                    T::add(region.min_x, ox),
                    T::add(region.min_y, oy),
                    T::add(center.0, ox),
                    T::add(center.1, oy),
                );
                child_region.set_dims(T::mul(hw, m), T::mul(hh, m));
                children[x * 2 + y] =
                    self.alloc_node(QNode::new(child_region, Some(node), level + 1));
            }
        }
        self.node_mut(node).children = Some(children);

        // Push existing occupants down where they now fit.
        let existing = core::mem::take(&mut self.node_mut(node).occupants);
        for slot in existing {
            let aabb = self.slot(slot).aabb;
            match self.fitting_child(node, &aabb) {
                Some(child) => self.add_occupant(child, slot),
                None => self.node_mut(node).occupants.push(slot),
            }
        }
    }

    /// Place `slot` at or below `node`. `node` must contain the slot's box.
    fn add_occupant(&mut self, node: NodeIdx, slot: usize) {
        let aabb = self.slot(slot).aabb;
        let mut node = node;
        loop {
            self.node_mut(node).num_occupants += 1;
            if self.node(node).children.is_none() {
                let n = self.node(node);
                if n.occupants.len() < self.config.max_occupants
                    || n.level >= self.config.max_levels
                {
                    break;
                }
                self.partition(node);
            }
            match self.fitting_child(node, &aabb) {
                Some(child) => node = child,
                None => break,
            }
        }
        self.node_mut(node).occupants.push(slot);
        self.slot_mut(slot).home = Home::Node(node);
    }

    /// Decrement the rollup of `node` for a departing occupant and collapse
    /// its subtree if the count fell below the minimum.
    fn release(&mut self, node: NodeIdx) {
        let min_occupants = self.config.min_occupants;
        let n = self.node_mut(node);
        assert!(
            n.num_occupants >= 1,
            "quadtree occupant rollup underflow"
        );
        n.num_occupants -= 1;
        if n.num_occupants < min_occupants && n.children.is_some() {
            self.merge(node);
        }
    }

    /// Destroy the children of `node`, lifting their occupants into it.
    fn merge(&mut self, node: NodeIdx) {
        let Some(children) = self.node_mut(node).children.take() else {
            return;
        };
        let mut stack: Vec<NodeIdx> = children.to_vec();
        let mut lifted = Vec::new();
        while let Some(i) = stack.pop() {
            let n = self.free_node(i);
            lifted.extend_from_slice(&n.occupants);
            if let Some(grandchildren) = n.children {
                stack.extend_from_slice(&grandchildren);
            }
        }
        for &slot in &lifted {
            self.slot_mut(slot).home = Home::Node(node);
        }
        self.node_mut(node).occupants.extend(lifted);
    }

    fn detach_from_node(&mut self, node: NodeIdx, slot: usize) {
        let occupants = &mut self.node_mut(node).occupants;
        let pos = occupants
            .iter()
            .position(|&s| s == slot)
            .expect("occupant missing from its quadtree node");
        occupants.swap_remove(pos);
    }

    fn detach_from_outside(&mut self, slot: usize) {
        let pos = self
            .outside_root
            .iter()
            .position(|&s| s == slot)
            .expect("occupant missing from the outside-root set");
        self.outside_root.swap_remove(pos);
    }

    fn place_from_root(&mut self, slot: usize) {
        let aabb = self.slot(slot).aabb;
        if self.root_region().contains(&aabb) {
            self.add_occupant(self.root, slot);
        } else {
            self.outside_root.push(slot);
            self.slot_mut(slot).home = Home::OutsideRoot;
        }
    }

    fn collect_subtree(&self, node: NodeIdx, out: &mut Vec<usize>) {
        let mut stack = vec![node];
        while let Some(i) = stack.pop() {
            let n = self.node(i);
            out.extend_from_slice(&n.occupants);
            if let Some(children) = n.children {
                stack.extend_from_slice(&children);
            }
        }
    }

    fn collect_to_depth(
        &self,
        node: NodeIdx,
        rect: &Aabb2D<T>,
        depth: usize,
        out: &mut Vec<usize>,
    ) {
        let n = self.node(node);
        if !n.region.intersects(rect) {
            return;
        }
        if depth == 0 {
            self.collect_subtree(node, out);
            return;
        }
        out.extend(
            n.occupants
                .iter()
                .copied()
                .filter(|&s| self.slot(s).aabb.intersects(rect)),
        );
        if let Some(children) = n.children {
            for child in children {
                self.collect_to_depth(child, rect, depth - 1, out);
            }
        }
    }

    fn outside_hits(&self, rect: &Aabb2D<T>, out: &mut Vec<usize>) {
        out.extend(
            self.outside_root
                .iter()
                .copied()
                .filter(|&s| self.slot(s).aabb.intersects(rect)),
        );
    }

    /// Walk the whole structure and assert every internal invariant.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn rollup<T: Scalar>(tree: &QuadTree<T>, idx: NodeIdx) -> usize {
            let n = tree.node(idx);
            let mut count = n.occupants.len();
            for &slot in &n.occupants {
                assert_eq!(tree.slot(slot).home, Home::Node(idx), "slot home mismatch");
                assert!(n.region.contains(&tree.slot(slot).aabb), "node does not contain occupant");
            }
            match n.children {
                Some(children) => {
                    for c in children {
                        assert_eq!(tree.node(c).parent, Some(idx), "broken parent link");
                        assert_eq!(tree.node(c).level, n.level + 1, "broken level");
                        count += rollup(tree, c);
                    }
                }
                None => assert!(
                    n.occupants.len() <= tree.config.max_occupants.max(tree.config.min_occupants)
                        || n.level >= tree.config.max_levels,
                    "overfull leaf"
                ),
            }
            assert_eq!(count, n.num_occupants, "rollup mismatch");
            count
        }
        let inside = rollup(self, self.root);
        let tracked = self.slots.iter().flatten().count();
        assert_eq!(inside + self.outside_root.len(), tracked, "lost occupants");
        for &slot in &self.outside_root {
            assert_eq!(self.slot(slot).home, Home::OutsideRoot, "slot home mismatch");
        }
    }
}

impl<T: Scalar> Backend<T> for QuadTree<T> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        assert!(
            self.slots[slot].is_none(),
            "slot is already tracked by this quadtree"
        );
        self.slots[slot] = Some(SlotState {
            aabb,
            home: Home::OutsideRoot,
        });
        self.place_from_root(slot);
    }

    fn update(&mut self, slot: usize, aabb: Aabb2D<T>) {
        let home = {
            let state = self.slot_mut(slot);
            state.aabb = aabb;
            state.home
        };
        match home {
            Home::OutsideRoot => {
                if self.root_region().contains(&aabb) {
                    self.detach_from_outside(slot);
                    self.add_occupant(self.root, slot);
                }
            }
            Home::Node(node) => {
                self.detach_from_node(node, slot);
                if self.node(node).region.contains(&aabb) {
                    // Re-add from the same node; it may settle deeper.
                    self.node_mut(node).num_occupants -= 1;
                    self.add_occupant(node, slot);
                    return;
                }
                let mut cur = Some(node);
                while let Some(c) = cur {
                    self.release(c);
                    if self.node(c).region.contains(&aabb) {
                        self.add_occupant(c, slot);
                        return;
                    }
                    cur = self.node(c).parent;
                }
                self.outside_root.push(slot);
                self.slot_mut(slot).home = Home::OutsideRoot;
            }
        }
    }

    fn remove(&mut self, slot: usize) {
        let state = self.slots[slot]
            .take()
            .expect("slot is not tracked by this quadtree");
        match state.home {
            Home::OutsideRoot => self.detach_from_outside(slot),
            Home::Node(node) => {
                self.detach_from_node(node, slot);
                let mut cur = Some(node);
                while let Some(c) = cur {
                    self.release(c);
                    cur = self.node(c).parent;
                }
            }
        }
    }

    fn clear(&mut self) {
        let region = self.root_region();
        self.arena.clear();
        self.arena.push(Some(QNode::new(region, None, 0)));
        self.root = NodeIdx::new(0);
        self.free_nodes.clear();
        self.slots.clear();
        self.outside_root.clear();
    }

    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a> {
        self.query_rect(Aabb2D::new(x, y, x, y))
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        self.outside_hits(&rect, &mut out);
        let mut stack = vec![self.root];
        while let Some(i) = stack.pop() {
            let n = self.node(i);
            if !n.region.intersects(&rect) {
                continue;
            }
            out.extend(
                n.occupants
                    .iter()
                    .copied()
                    .filter(|&s| self.slot(s).aabb.intersects(&rect)),
            );
            if let Some(children) = n.children {
                stack.extend_from_slice(&children);
            }
        }
        Box::new(out.into_iter())
    }

    fn query_rect_to_depth<'a>(
        &'a self,
        rect: Aabb2D<T>,
        depth: usize,
    ) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        self.outside_hits(&rect, &mut out);
        self.collect_to_depth(self.root, &rect, depth, &mut out);
        Box::new(out.into_iter())
    }
}

impl<T: Scalar> Debug for QuadTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("root_region", &self.root_region())
            .field("config", &self.config)
            .field("nodes", &self.node_count())
            .field("inside", &self.num_occupants())
            .field("outside_root", &self.outside_root.len())
            .finish_non_exhaustive()
    }
}

/// Quadtree with f32 coordinates.
pub type QuadTreeF32 = QuadTree<f32>;

/// Quadtree with f64 coordinates.
pub type QuadTreeF64 = QuadTree<f64>;
