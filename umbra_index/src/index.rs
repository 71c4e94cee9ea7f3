// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::marker::PhantomData;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::quadtree::{QuadTree, QuadTreeConfig};
use crate::occupant::Occupant;
use crate::types::{Aabb2D, Scalar};

/// Generational handle for entries.
///
/// A key stays valid until its entry is removed. Slots are reused afterwards,
/// but with a bumped generation, so an old key never aliases a new occupant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are 32-bit; an index never holds 2^32 slots."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this key.
    pub const fn slot(self) -> u32 {
        self.0
    }

    /// Generation of this key.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// An index that owns its occupants and tracks their boxes in a backend.
///
/// Operations apply immediately: a query right after
/// [`update_status`](Self::update_status) sees the new box.
pub struct IndexGeneric<T, P, B> {
    entries: Vec<Option<P>>,
    // Last generation issued per slot, kept across removals.
    generations: Vec<u32>,
    free_list: Vec<usize>,
    len: usize,
    backend: B,
    _t: PhantomData<T>,
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Occupant<T>,
    B: Backend<T> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Occupant<T>,
    B: Backend<T>,
{
    /// Create an empty index over an explicitly constructed backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            backend,
            _t: PhantomData,
        }
    }

    /// Reserve space for at least `n` more entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
        self.generations.reserve(n);
    }

    /// Take ownership of `occupant` and start tracking its box.
    pub fn insert(&mut self, occupant: P) -> Key {
        let aabb = occupant.aabb();
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.entries[idx] = Some(occupant);
            idx
        } else {
            self.entries.push(Some(occupant));
            self.generations.push(1);
            self.entries.len() - 1
        };
        self.len += 1;
        self.backend.insert(idx, aabb);
        Key::new(idx, self.generations[idx])
    }

    /// Re-read the occupant's box and re-place it.
    ///
    /// Call this after every mutation that changes the occupant's AABB.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn update_status(&mut self, key: Key) {
        let aabb = self.entry(key).aabb();
        self.backend.update(key.idx(), aabb);
    }

    /// Mutate an occupant and re-place it in one step.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn modify<R>(&mut self, key: Key, f: impl FnOnce(&mut P) -> R) -> R {
        let result = f(self.entry_mut(key));
        self.update_status(key);
        result
    }

    /// Stop tracking an occupant and hand it back.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn remove(&mut self, key: Key) -> P {
        self.assert_alive(key);
        let idx = key.idx();
        self.backend.remove(idx);
        self.free_list.push(idx);
        self.len -= 1;
        self.entries[idx].take().expect("checked above")
    }

    /// Whether `key` refers to a live entry.
    pub fn is_alive(&self, key: Key) -> bool {
        let idx = key.idx();
        self.generations.get(idx) == Some(&key.1)
            && self.entries.get(idx).is_some_and(Option::is_some)
    }

    /// Shared access to an occupant, or `None` for a stale key.
    pub fn get(&self, key: Key) -> Option<&P> {
        if self.is_alive(key) {
            self.entries[key.idx()].as_ref()
        } else {
            None
        }
    }

    /// Mutable access to an occupant, or `None` for a stale key.
    ///
    /// Box changes made through this reference are not seen by queries until
    /// [`update_status`](Self::update_status) is called.
    pub fn get_mut(&mut self, key: Key) -> Option<&mut P> {
        if self.is_alive(key) {
            self.entries[key.idx()].as_mut()
        } else {
            None
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate all live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &P)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|p| (Key::new(i, self.generations[i]), p)))
    }

    /// Iterate all live entries mutably in slot order.
    ///
    /// Box changes made here are not seen by queries until
    /// [`update_status`](Self::update_status) is called.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Key, &mut P)> + '_ {
        let generations = &self.generations;
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, e)| e.as_mut().map(|p| (Key::new(i, generations[i]), p)))
    }

    /// Drop every entry. Previously issued keys become stale.
    pub fn clear(&mut self) {
        for (i, e) in self.entries.iter_mut().enumerate() {
            if e.take().is_some() {
                self.free_list.push(i);
            }
        }
        self.len = 0;
        self.backend.clear();
    }

    /// Entries whose AABB contains the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (Key, &P)> + '_ {
        self.resolve(self.backend.query_point(x, y))
    }

    /// Entries whose AABB intersects `rect`. Touching counts.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is inverted.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = (Key, &P)> + '_ {
        assert!(!rect.is_empty(), "query rectangle is inverted");
        self.resolve(self.backend.query_rect(rect))
    }

    /// Like [`query_rect`](Self::query_rect) but stops descending the
    /// backend's hierarchy after `depth` levels.
    ///
    /// Below the cut every occupant of a matched subtree is returned without
    /// an exact test, so the result is a superset of `query_rect`.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is inverted.
    pub fn query_rect_to_depth(
        &self,
        rect: Aabb2D<T>,
        depth: usize,
    ) -> impl Iterator<Item = (Key, &P)> + '_ {
        assert!(!rect.is_empty(), "query rectangle is inverted");
        self.resolve(self.backend.query_rect_to_depth(rect, depth))
    }

    /// The spatial backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn resolve<'a>(
        &'a self,
        slots: impl Iterator<Item = usize> + 'a,
    ) -> impl Iterator<Item = (Key, &'a P)> + 'a {
        slots.filter_map(move |i| {
            self.entries
                .get(i)?
                .as_ref()
                .map(|p| (Key::new(i, self.generations[i]), p))
        })
    }

    fn assert_alive(&self, key: Key) {
        assert!(self.is_alive(key), "stale index key {key:?}");
    }

    fn entry(&self, key: Key) -> &P {
        self.assert_alive(key);
        self.entries[key.idx()].as_ref().expect("checked above")
    }

    fn entry_mut(&mut self, key: Key) -> &mut P {
        self.assert_alive(key);
        self.entries[key.idx()].as_mut().expect("checked above")
    }
}

impl<T, P, B: Debug> Debug for IndexGeneric<T, P, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexGeneric")
            .field("len", &self.len)
            .field("slots", &self.entries.len())
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/// Default index, backed by a region quadtree.
pub type Index<T, P> = IndexGeneric<T, P, QuadTree<T>>;

/// Index backed by a linear scan.
pub type FlatIndex<T, P> = IndexGeneric<T, P, FlatVec<T>>;

impl<T: Copy + PartialOrd + Debug, P: Occupant<T>> Default for FlatIndex<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, P: Occupant<T>> Index<T, P> {
    /// Create a quadtree index covering `region`.
    pub fn with_region(region: Aabb2D<T>) -> Self {
        Self::with_backend(QuadTree::new(region))
    }

    /// Create a quadtree index covering `region` with explicit tuning.
    pub fn with_config(region: Aabb2D<T>, config: QuadTreeConfig) -> Self {
        Self::with_backend(QuadTree::with_config(region, config))
    }

    /// Region covered by the quadtree root.
    pub fn root_region(&self) -> Aabb2D<T> {
        self.backend.root_region()
    }

    /// Node regions and levels, root first. Intended for debug overlays.
    pub fn node_regions(&self) -> impl Iterator<Item = (Aabb2D<T>, u32)> + '_ {
        self.backend.node_regions()
    }

    /// Rebuild the quadtree under a new root region.
    ///
    /// Keys stay valid; every occupant is placed again from scratch.
    pub fn reset_region(&mut self, region: Aabb2D<T>) {
        self.backend = QuadTree::with_config(region, *self.backend.config());
        for (i, e) in self.entries.iter().enumerate() {
            if let Some(p) = e {
                self.backend.insert(i, p.aabb());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Debug)]
    struct Body {
        id: u32,
        aabb: Aabb2D<f64>,
    }

    impl Occupant<f64> for Body {
        fn aabb(&self) -> Aabb2D<f64> {
            self.aabb
        }
    }

    fn body(id: u32, x: f64, y: f64, w: f64) -> Body {
        Body {
            id,
            aabb: Aabb2D::new(x, y, x + w, y + w),
        }
    }

    fn ids<'a>(it: impl Iterator<Item = (Key, &'a Body)>) -> Vec<u32> {
        let mut v: Vec<_> = it.map(|(_, b)| b.id).collect();
        v.sort_unstable();
        v
    }

    struct Rng(u64);

    impl Rng {
        fn next_u64(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        #[allow(clippy::cast_precision_loss, reason = "test data")]
        fn range(&mut self, lo: f64, hi: f64) -> f64 {
            let u = (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64;
            lo + (hi - lo) * u
        }
    }

    #[test]
    fn insert_update_and_query() {
        let mut idx: Index<f64, Body> = Index::with_region(Aabb2D::new(0.0, 0.0, 100.0, 100.0));
        let k1 = idx.insert(body(1, 0.0, 0.0, 10.0));
        let _k2 = idx.insert(body(2, 50.0, 50.0, 10.0));

        idx.get_mut(k1).unwrap().aabb = Aabb2D::new(60.0, 60.0, 70.0, 70.0);
        // Not yet re-placed, but the quadtree filters on the stored box.
        assert_eq!(ids(idx.query_point(5.0, 5.0)), [1]);
        idx.update_status(k1);
        assert!(idx.query_point(5.0, 5.0).next().is_none());
        assert_eq!(ids(idx.query_point(60.0, 60.0)), [1, 2]);
    }

    #[test]
    fn remove_hands_occupant_back_and_staleness_is_tracked() {
        let mut idx: FlatIndex<f64, Body> = FlatIndex::new();
        let k = idx.insert(body(7, 0.0, 0.0, 1.0));
        let b = idx.remove(k);
        assert_eq!(b.id, 7);
        assert!(!idx.is_alive(k));
        assert!(idx.get(k).is_none());

        // Slot is reused with a new generation.
        let k2 = idx.insert(body(8, 0.0, 0.0, 1.0));
        assert_eq!(k2.slot(), k.slot());
        assert_ne!(k2.generation(), k.generation());
        assert!(!idx.is_alive(k));
        assert_eq!(idx.get(k2).map(|b| b.id), Some(8));
    }

    #[test]
    fn generations_survive_clear() {
        let mut idx: FlatIndex<f64, Body> = FlatIndex::new();
        let k = idx.insert(body(1, 0.0, 0.0, 1.0));
        idx.clear();
        assert!(idx.is_empty());
        let k2 = idx.insert(body(2, 0.0, 0.0, 1.0));
        assert_ne!(k, k2);
        assert!(!idx.is_alive(k));
    }

    #[test]
    #[should_panic(expected = "stale index key")]
    fn stale_key_update_panics() {
        let mut idx: FlatIndex<f64, Body> = FlatIndex::new();
        let k = idx.insert(body(1, 0.0, 0.0, 1.0));
        let _ = idx.remove(k);
        idx.update_status(k);
    }

    #[test]
    #[should_panic(expected = "inverted")]
    fn inverted_query_panics() {
        let idx: FlatIndex<f64, Body> = FlatIndex::new();
        let _ = idx.query_rect(Aabb2D::new(1.0, 1.0, 0.0, 0.0)).count();
    }

    #[test]
    fn reset_region_keeps_keys() {
        let mut idx: Index<f64, Body> = Index::with_region(Aabb2D::new(0.0, 0.0, 10.0, 10.0));
        let k = idx.insert(body(1, 50.0, 50.0, 5.0));
        assert_eq!(idx.backend().num_outside_root(), 1);
        idx.reset_region(Aabb2D::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(idx.backend().num_outside_root(), 0);
        assert_eq!(idx.root_region(), Aabb2D::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(ids(idx.query_point(52.0, 52.0)), [1]);
        assert!(idx.is_alive(k));
    }

    #[test]
    fn quadtree_matches_linear_scan_under_churn() {
        let region = Aabb2D::new(0.0, 0.0, 1000.0, 1000.0);
        let mut tree: Index<f64, Body> = Index::with_region(region);
        let mut flat: FlatIndex<f64, Body> = FlatIndex::new();
        let mut keys: Vec<(Key, Key)> = Vec::new();
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);

        for step in 0..2000_u32 {
            match rng.next_u64() % 4 {
                0 | 1 => {
                    // Some boxes hang off the root region on purpose.
                    let x = rng.range(-100.0, 1050.0);
                    let y = rng.range(-100.0, 1050.0);
                    let w = rng.range(0.5, 80.0);
                    keys.push((tree.insert(body(step, x, y, w)), flat.insert(body(step, x, y, w))));
                }
                2 if !keys.is_empty() => {
                    #[allow(clippy::cast_possible_truncation, reason = "test data")]
                    let i = (rng.next_u64() % keys.len() as u64) as usize;
                    let (kt, kf) = keys[i];
                    let dx = rng.range(-200.0, 200.0);
                    let dy = rng.range(-200.0, 200.0);
                    tree.modify(kt, |b| b.aabb.inc_center(dx, dy));
                    flat.modify(kf, |b| b.aabb.inc_center(dx, dy));
                }
                3 if !keys.is_empty() => {
                    #[allow(clippy::cast_possible_truncation, reason = "test data")]
                    let i = (rng.next_u64() % keys.len() as u64) as usize;
                    let (kt, kf) = keys.swap_remove(i);
                    assert_eq!(tree.remove(kt).id, flat.remove(kf).id);
                }
                _ => {}
            }

            if step % 50 == 0 {
                tree.backend().check_invariants();
                let x = rng.range(-50.0, 950.0);
                let y = rng.range(-50.0, 950.0);
                let q = Aabb2D::new(x, y, x + rng.range(1.0, 300.0), y + rng.range(1.0, 300.0));
                assert_eq!(ids(tree.query_rect(q)), ids(flat.query_rect(q)));
                let coarse = ids(tree.query_rect_to_depth(q, 2));
                for id in ids(flat.query_rect(q)) {
                    assert!(coarse.contains(&id), "depth query lost {id}");
                }
            }
        }
        assert_eq!(tree.len(), flat.len());
    }

    fn random_bodies(seed: u64, count: u32) -> Vec<Body> {
        let mut rng = Rng(seed);
        (0..count)
            .map(|i| {
                let x = rng.range(0.0, 500.0);
                let y = rng.range(0.0, 500.0);
                body(i, x, y, rng.range(1.0, 12.0))
            })
            .collect()
    }

    fn query_grid() -> Vec<Aabb2D<f64>> {
        let mut out = Vec::new();
        for i in 0..8_u32 {
            for j in 0..8_u32 {
                let (x, y) = (f64::from(i) * 64.0, f64::from(j) * 64.0);
                out.push(Aabb2D::new(x, y, x + 40.0, y + 90.0));
            }
        }
        out.push(Aabb2D::new(0.0, 0.0, 512.0, 512.0));
        out
    }

    #[test]
    fn removing_a_subset_matches_a_fresh_build() {
        let region = Aabb2D::new(0.0, 0.0, 512.0, 512.0);
        // With the merge threshold above the split threshold a node is
        // partitioned exactly when its subtree holds more than
        // `max_occupants`, so the tree shape depends only on the set.
        let config = QuadTreeConfig {
            max_occupants: 3,
            min_occupants: 4,
            ..QuadTreeConfig::default()
        };
        let mut churned: Index<f64, Body> = Index::with_config(region, config);
        let keys: Vec<_> = random_bodies(7, 300)
            .into_iter()
            .map(|b| (b.id, churned.insert(b)))
            .collect();
        for &(id, k) in &keys {
            if id % 3 != 0 {
                let _ = churned.remove(k);
            }
        }
        churned.backend().check_invariants();

        let mut fresh: Index<f64, Body> = Index::with_config(region, config);
        for b in random_bodies(7, 300).into_iter().filter(|b| b.id % 3 == 0) {
            let _ = fresh.insert(b);
        }

        assert_eq!(churned.len(), fresh.len());
        assert_eq!(
            churned.node_regions().collect::<Vec<_>>(),
            fresh.node_regions().collect::<Vec<_>>()
        );
        for q in query_grid() {
            assert_eq!(ids(churned.query_rect(q)), ids(fresh.query_rect(q)));
            assert_eq!(
                ids(churned.query_rect_to_depth(q, 2)),
                ids(fresh.query_rect_to_depth(q, 2))
            );
        }
    }

    #[test]
    fn removing_a_subset_with_default_merging_answers_like_a_fresh_build() {
        let region = Aabb2D::new(0.0, 0.0, 512.0, 512.0);
        let mut churned: Index<f64, Body> = Index::with_region(region);
        let keys: Vec<_> = random_bodies(11, 300)
            .into_iter()
            .map(|b| (b.id, churned.insert(b)))
            .collect();
        for &(id, k) in &keys {
            if id % 4 != 0 {
                let _ = churned.remove(k);
            }
        }
        churned.backend().check_invariants();

        let mut fresh: Index<f64, Body> = Index::with_region(region);
        for b in random_bodies(11, 300).into_iter().filter(|b| b.id % 4 == 0) {
            let _ = fresh.insert(b);
        }

        // Subtrees only collapse once empty, so extra nodes may remain.
        assert!(churned.backend().node_count() >= fresh.backend().node_count());
        assert_eq!(churned.backend().num_occupants(), fresh.backend().num_occupants());
        for q in query_grid() {
            assert_eq!(ids(churned.query_rect(q)), ids(fresh.query_rect(q)));
        }
    }

    #[test]
    fn insert_then_remove_all_converges() {
        let region = Aabb2D::new(0.0, 0.0, 512.0, 512.0);
        let mut idx: Index<f64, Body> = Index::with_region(region);
        let mut rng = Rng(42);
        let keys: Vec<_> = (0..300)
            .map(|i| {
                let x = rng.range(0.0, 500.0);
                let y = rng.range(0.0, 500.0);
                idx.insert(body(i, x, y, rng.range(1.0, 12.0)))
            })
            .collect();
        assert!(idx.backend().node_count() > 1);
        for k in keys {
            let _ = idx.remove(k);
        }
        assert!(idx.is_empty());
        assert_eq!(idx.backend().node_count(), 1);
        assert_eq!(idx.node_regions().count(), 1);
        assert!(idx.query_rect(region).next().is_none());
    }
}
