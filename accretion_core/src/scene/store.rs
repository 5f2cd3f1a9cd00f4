// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and frame
//! management.

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, LayerId};
use super::traverse::Children;
use crate::component::Invalidation;
use crate::dirty;
use crate::id::Tag;

/// Struct-of-arrays storage for all layers of one surface.
///
/// Layers are addressed by [`LayerId`] handles. Destroyed layers are
/// recycled via a free list, and generation counters make stale handles
/// panic instead of silently aliasing a newer layer.
#[derive(Debug)]
pub struct SceneStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties --
    pub(crate) tag: Vec<Tag>,
    pub(crate) frame: Vec<Rect>,
    pub(crate) hidden: Vec<bool>,

    // -- Computed properties (written by evaluate) --
    pub(crate) absolute_frame: Vec<Rect>,
    pub(crate) effective_hidden: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) root: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Paint order cache --
    pub(crate) paint_order: Vec<u32>,
    pub(crate) order_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl SceneStore {
    /// Creates a store holding only the root layer, tagged `root_tag`.
    #[must_use]
    pub fn new(root_tag: Tag) -> Self {
        let mut store = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            tag: Vec::new(),
            frame: Vec::new(),
            hidden: Vec::new(),
            absolute_frame: Vec::new(),
            effective_hidden: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            paint_order: Vec::new(),
            order_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        };
        store.root = store.create_layer(root_tag).idx;
        store
    }

    /// Returns the root layer, which stands for the bound surface.
    #[must_use]
    pub fn root(&self) -> LayerId {
        LayerId {
            idx: self.root,
            generation: self.generation[self.root as usize],
        }
    }

    // -- Allocation API --

    /// Creates a detached layer for the component tagged `tag`.
    ///
    /// The layer starts with a zero frame, visible, with no parent.
    pub fn create_layer(&mut self, tag: Tag) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.tag[i] = tag;
            self.frame[i] = Rect::ZERO;
            self.hidden[i] = false;
            self.absolute_frame[i] = Rect::ZERO;
            self.effective_hidden[i] = false;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.tag.push(tag);
            self.frame.push(Rect::ZERO);
            self.hidden.push(false);
            self.absolute_frame.push(Rect::ZERO);
            self.effective_hidden.push(false);
            self.alive.push(true);
            self.generation.push(0);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::FRAME);

        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// The layer is detached from its parent. Children that are still
    /// attached become detached (they are not destroyed); their number is
    /// returned so callers can report the upstream protocol slip.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or refers to the root layer.
    pub fn destroy_layer(&mut self, id: LayerId) -> usize {
        self.validate(id);
        let idx = id.idx;
        assert!(idx != self.root, "cannot destroy the root layer");

        let mut orphaned = 0;
        while self.first_child[idx as usize] != INVALID {
            let child = self.first_child[idx as usize];
            self.detach(child);
            orphaned += 1;
        }

        if self.parent[idx as usize] != INVALID {
            self.detach(idx);
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.alive[idx as usize] = false;
        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.order_dirty = true;
        orphaned
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live layers, including the root.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|alive| **alive).count()
    }

    // -- Topology API --

    /// Inserts `child` as the `index`-th child of `parent`.
    ///
    /// An index past the end appends. Later siblings shift one position
    /// towards the front of the paint order.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `child` is the root layer.
    pub fn insert_child(&mut self, parent: LayerId, child: LayerId, index: usize) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(c != self.root, "cannot attach the root layer");
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        // Find the sibling currently at `index`, if any.
        let mut before = self.first_child[p as usize];
        let mut last = INVALID;
        let mut position = 0;
        while before != INVALID && position < index {
            last = before;
            before = self.next_sibling[before as usize];
            position += 1;
        }

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = last;
        self.next_sibling[c as usize] = before;
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
        }
        if before != INVALID {
            self.prev_sibling[before as usize] = c;
        }

        // Child depends on parent for its absolute frame and hidden state.
        let _ = self.dirty.add_dependency(c, p, dirty::FRAME);

        self.dirty.mark_with(c, dirty::FRAME, &EagerPolicy);
        self.order_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "layer has no parent"
        );
        self.detach(child.idx);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(LayerId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children of a layer.
    #[must_use]
    pub fn child_count(&self, id: LayerId) -> usize {
        self.children(id).count()
    }

    /// Returns the tag of the component owning a layer.
    #[must_use]
    pub fn tag(&self, id: LayerId) -> Tag {
        self.validate(id);
        self.tag[id.idx as usize]
    }

    // -- Property API (auto-marks dirty) --

    /// Returns the layout frame of a layer, relative to its parent.
    #[must_use]
    pub fn frame(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.frame[id.idx as usize]
    }

    /// Sets the layout frame of a layer.
    ///
    /// Marks the FRAME channel dirty with eager propagation to descendants.
    pub fn set_frame(&mut self, id: LayerId, frame: Rect) {
        self.validate(id);
        self.frame[id.idx as usize] = frame;
        self.dirty.mark_with(id.idx, dirty::FRAME, &EagerPolicy);
    }

    /// Returns the local hidden flag of a layer.
    #[must_use]
    pub fn hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.hidden[id.idx as usize]
    }

    /// Sets the local hidden flag of a layer.
    ///
    /// Hiding suppresses the whole subtree, so this marks FRAME with eager
    /// propagation.
    pub fn set_hidden(&mut self, id: LayerId, hidden: bool) {
        self.validate(id);
        self.hidden[id.idx as usize] = hidden;
        self.dirty.mark_with(id.idx, dirty::FRAME, &EagerPolicy);
    }

    /// Records that a layer's content must be repainted at `level`.
    ///
    /// [`Invalidation::None`] is ignored.
    pub fn invalidate(&mut self, id: LayerId, level: Invalidation) {
        self.validate(id);
        match level {
            Invalidation::None => {}
            Invalidation::Partial => self.dirty.mark(id.idx, dirty::PAINT),
            Invalidation::Full => self.dirty.mark(id.idx, dirty::REDRAW),
        }
    }

    /// Returns the computed absolute frame of a layer.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn absolute_frame(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.absolute_frame[id.idx as usize]
    }

    /// Returns whether the layer is effectively hidden, including by an
    /// ancestor's hidden flag.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.effective_hidden[id.idx as usize]
    }

    // -- Raw-index accessors for presenters --
    //
    // These take raw slot indices as found in `SceneChanges` or
    // `paint_order()` and skip generation validation.

    /// Returns the tag at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn tag_at(&self, idx: u32) -> Tag {
        self.check_slot(idx);
        self.tag[idx as usize]
    }

    /// Returns the computed absolute frame at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn absolute_frame_at(&self, idx: u32) -> Rect {
        self.check_slot(idx);
        self.absolute_frame[idx as usize]
    }

    /// Returns whether the layer at raw slot `idx` is effectively hidden.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn effective_hidden_at(&self, idx: u32) -> bool {
        self.check_slot(idx);
        self.effective_hidden[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: LayerId) {
        assert!(
            self.is_alive(id),
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn check_slot(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    /// Unlinks `idx` from its parent, drops the dependency edge, and marks
    /// the detached subtree for frame recomputation.
    fn detach(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev == INVALID {
            self.first_child[p as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;

        self.dirty.remove_dependency(idx, p, dirty::FRAME);
        self.dirty.mark_with(idx, dirty::FRAME, &EagerPolicy);
        self.order_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SceneStore {
        SceneStore::new(Tag(1))
    }

    #[test]
    fn create_and_destroy() {
        let mut store = store();
        let id = store.create_layer(Tag(10));
        assert!(store.is_alive(id));
        assert_eq!(store.tag(id), Tag(10));
        assert_eq!(store.destroy_layer(id), 0);
        assert!(!store.is_alive(id));
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = store();
        let id1 = store.create_layer(Tag(10));
        store.destroy_layer(id1);
        let id2 = store.create_layer(Tag(11));
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn insert_child_respects_index() {
        let mut store = store();
        let root = store.root();
        let a = store.create_layer(Tag(10));
        let b = store.create_layer(Tag(11));
        let c = store.create_layer(Tag(12));

        store.insert_child(root, a, 0);
        store.insert_child(root, c, 1);
        store.insert_child(root, b, 1);

        let kids: Vec<_> = store.children(root).collect();
        assert_eq!(kids, vec![a, b, c]);
        assert_eq!(store.parent(b), Some(root));
    }

    #[test]
    fn insert_child_at_front_and_past_end() {
        let mut store = store();
        let root = store.root();
        let a = store.create_layer(Tag(10));
        let b = store.create_layer(Tag(11));
        let c = store.create_layer(Tag(12));

        store.insert_child(root, a, 0);
        store.insert_child(root, b, 0);
        store.insert_child(root, c, 99);

        let kids: Vec<_> = store.children(root).collect();
        assert_eq!(kids, vec![b, a, c]);
        assert_eq!(store.child_count(root), 3);
    }

    #[test]
    fn remove_from_parent_keeps_layer_alive() {
        let mut store = store();
        let root = store.root();
        let a = store.create_layer(Tag(10));
        let b = store.create_layer(Tag(11));
        store.insert_child(root, a, 0);
        store.insert_child(root, b, 1);

        store.remove_from_parent(a);
        assert!(store.is_alive(a));
        assert_eq!(store.parent(a), None);
        let kids: Vec<_> = store.children(root).collect();
        assert_eq!(kids, vec![b]);
    }

    #[test]
    fn destroy_detaches_and_orphans_children() {
        let mut store = store();
        let root = store.root();
        let parent = store.create_layer(Tag(10));
        let child = store.create_layer(Tag(11));
        store.insert_child(root, parent, 0);
        store.insert_child(parent, child, 0);

        assert_eq!(store.destroy_layer(parent), 1);
        assert!(store.is_alive(child));
        assert_eq!(store.parent(child), None);
        assert!(store.children(root).next().is_none());
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_insert_panics() {
        let mut store = store();
        let root = store.root();
        let a = store.create_layer(Tag(10));
        store.insert_child(root, a, 0);
        store.insert_child(root, a, 0);
    }

    #[test]
    #[should_panic(expected = "layer has no parent")]
    fn remove_detached_panics() {
        let mut store = store();
        let a = store.create_layer(Tag(10));
        store.remove_from_parent(a);
    }

    #[test]
    #[should_panic(expected = "cannot destroy the root layer")]
    fn destroy_root_panics() {
        let mut store = store();
        let root = store.root();
        store.destroy_layer(root);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_set_frame() {
        let mut store = store();
        let id = store.create_layer(Tag(10));
        store.destroy_layer(id);
        store.set_frame(id, Rect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_parent() {
        let mut store = store();
        let id = store.create_layer(Tag(10));
        store.destroy_layer(id);
        let _ = store.parent(id);
    }

    #[test]
    fn set_frame_round_trips() {
        let mut store = store();
        let id = store.create_layer(Tag(10));
        let frame = Rect::new(1.0, 2.0, 3.0, 4.0);
        store.set_frame(id, frame);
        assert_eq!(store.frame(id), frame);
        store.set_hidden(id, true);
        assert!(store.hidden(id));
    }
}
