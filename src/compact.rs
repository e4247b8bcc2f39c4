//! Storage compaction.
//!
//! Removals leave holes scattered across the bucket table. Compaction packs
//! the live elements, in logical order, into the smallest set of buckets the
//! current bucket sizes allow, then either releases the emptied buckets or
//! rethreads them for reuse. It is the one operation that relocates nodes,
//! and therefore the one operation that invalidates outstanding
//! [`Slot`](crate::Slot)s.
//!
//! The walk keeps the list fully traversable after every step: each element
//! is moved with its links, and both neighbors are repaired immediately, so
//! a panic in the middle (e.g. from the allocator) cannot leave the chain
//! torn.

use crate::list::BucketList;
use crate::slot::Slot;
use crate::storage::HEAD;

impl<T> BucketList<T> {
    /// Compacts live elements into the fewest buckets, preserving order.
    ///
    /// With `shrink_to_fit`, emptied buckets are released and the tail of
    /// the last destination bucket is trimmed, leaving `capacity() == len()`.
    /// Otherwise every slot is kept and emptied buckets are rethreaded onto
    /// the hole chain, largest first.
    ///
    /// All outstanding [`Slot`](crate::Slot)s are invalidated. `len()`,
    /// element order, and element values are unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use bucket_list::BucketList;
    ///
    /// let mut list: BucketList<u64> = (0..100).collect();
    /// let slots: Vec<_> = list.slots().collect();
    /// for slot in slots.iter().skip(1).step_by(2) {
    ///     list.remove(*slot);
    /// }
    ///
    /// assert_eq!(list.len(), 50);
    /// assert!(list.capacity() > 50);
    ///
    /// list.optimize(true);
    /// assert_eq!(list.capacity(), list.len());
    /// let evens: Vec<_> = list.iter().copied().collect();
    /// assert!(evens.iter().all(|v| v % 2 == 0));
    /// ```
    pub fn optimize(&mut self, shrink_to_fit: bool) {
        if self.len == 0 {
            if shrink_to_fit {
                self.table.release_all();
            }
            return;
        }

        let bucket_count = self.table.bucket_count();
        let lens: Vec<usize> = (0..bucket_count).map(|b| self.table.bucket_len(b)).collect();

        // Rank user buckets by descending size; the stable sort keeps ties
        // in bucket order.
        let mut ranked: Vec<usize> = (1..bucket_count).collect();
        ranked.sort_by_key(|&b| core::cmp::Reverse(lens[b]));

        let dests = select_destinations(&ranked, &lens, self.len);
        self.place_live_chain(&dests, &lens);
        self.rebuild_table(&ranked, &dests, &lens, shrink_to_fit);
    }

    /// Walks the live chain in logical order, settling each element into
    /// the next destination slot.
    fn place_live_chain(&mut self, dests: &[usize], lens: &[usize]) {
        let mut dest_bucket = 0;
        let mut dest_offset = 0;
        let mut cur = self.table.node(HEAD).next;

        for _ in 0..self.len {
            if dest_offset == lens[dests[dest_bucket]] {
                dest_bucket += 1;
                dest_offset = 0;
            }
            let dst = Slot::new(dests[dest_bucket], dest_offset);
            dest_offset += 1;

            if cur != dst {
                if self.table.node(dst).value.is_some() {
                    // The occupant is a later, not-yet-placed element.
                    self.exchange(cur, dst);
                } else {
                    self.relocate(cur, dst);
                }
            }
            cur = self.table.node(dst).next;
        }
    }

    /// Moves the element at `src` into the hole at `dst`, taking over its
    /// links and repairing both neighbors. `src` is left as a stale hole.
    fn relocate(&mut self, src: Slot, dst: Slot) {
        let node = self.table.node_mut(src);
        let value = node.value.take();
        let (prev, next) = (node.prev, node.next);
        self.table.node_mut(dst).value = value;
        self.table.link(prev, dst);
        self.table.link(dst, next);
    }

    /// Swaps the elements at `a` and `b`, where `b`'s occupant sits
    /// strictly later in the live chain, and repairs every affected link.
    fn exchange(&mut self, a: Slot, b: Slot) {
        let node = self.table.node_mut(a);
        let a_value = node.value.take();
        let (a_prev, a_next) = (node.prev, node.next);
        let node = self.table.node_mut(b);
        let b_value = node.value.take();
        let (b_prev, b_next) = (node.prev, node.next);

        self.table.node_mut(a).value = b_value;
        self.table.node_mut(b).value = a_value;

        if a_next == b {
            // Adjacent in the chain: the middle link collapses.
            self.table.link(a_prev, b);
            self.table.link(b, a);
            self.table.link(a, b_next);
        } else {
            self.table.link(a_prev, b);
            self.table.link(b, a_next);
            self.table.link(b_prev, a);
            self.table.link(a, b_next);
        }
    }

    /// Reorders the bucket table to [sentinels] + destinations + leftovers,
    /// rewrites surviving links against the new numbering, and rebuilds the
    /// hole chain (or trims and releases, with `shrink_to_fit`).
    fn rebuild_table(
        &mut self,
        ranked: &[usize],
        dests: &[usize],
        lens: &[usize],
        shrink_to_fit: bool,
    ) {
        let bucket_count = self.table.bucket_count();
        let mut is_dest = vec![false; bucket_count];
        for &b in dests {
            is_dest[b] = true;
        }
        // `ranked` is descending by size, so leftovers inherit largest-first.
        let leftovers: Vec<usize> = ranked.iter().copied().filter(|&b| !is_dest[b]).collect();

        let mut order: Vec<usize> = dests.to_vec();
        if !shrink_to_fit {
            order.extend(&leftovers);
        }

        let mut map = vec![usize::MAX; bucket_count];
        map[0] = 0;
        for (i, &b) in order.iter().enumerate() {
            map[b] = i + 1;
        }

        // Permute the buckets; with shrink_to_fit the leftovers drop here.
        let old = core::mem::take(&mut self.table.buckets);
        let mut taken: Vec<Option<_>> = old.into_iter().map(Some).collect();
        let mut buckets = Vec::with_capacity(order.len() + 1);
        buckets.push(taken[0].take().expect("sentinel bucket"));
        for &b in &order {
            buckets.push(taken[b].take().expect("bucket moved once"));
        }
        drop(taken);
        self.table.buckets = buckets;

        // Rewrite the links of the sentinels and every live node. Hole links
        // are stale by now (they may name dropped buckets) and are rebuilt
        // below, so they are left alone.
        let remap = |slot: Slot| -> Slot {
            if slot.is_none() || slot.bucket() == 0 {
                slot
            } else {
                Slot::new(map[slot.bucket()], slot.offset())
            }
        };
        for node in self.table.buckets[0].iter_mut() {
            node.prev = remap(node.prev);
            node.next = remap(node.next);
        }
        for bucket in 1..=dests.len() {
            for node in self.table.buckets[bucket].iter_mut() {
                if node.value.is_some() {
                    node.prev = remap(node.prev);
                    node.next = remap(node.next);
                }
            }
        }

        // Rebuild the hole chain from scratch.
        self.table.first_hole = Slot::NONE;
        self.table.last_hole = Slot::NONE;
        self.table.holes = 0;

        let last_dest = dests.len();
        let full: usize = dests[..dests.len() - 1].iter().map(|&b| lens[b]).sum();
        let used_in_last = self.len - full;

        if shrink_to_fit {
            if used_in_last < self.table.bucket_len(last_dest) {
                let bucket = core::mem::take(&mut self.table.buckets[last_dest]);
                let mut nodes = Vec::from(bucket);
                nodes.truncate(used_in_last);
                self.table.buckets[last_dest] = nodes.into_boxed_slice();
            }
            self.table.capacity = self.len;
        } else {
            for new_index in (dests.len() + 1)..self.table.bucket_count() {
                self.table.thread_holes(new_index, 0);
            }
            self.table.thread_holes(last_dest, used_in_last);
        }
    }
}

/// Greedy prefix of `ranked` whose combined capacity first covers `need`.
///
/// At the boundary, a look-ahead picks the smallest ranked candidate that
/// still covers the remainder, so the selection never overshoots more than
/// the available bucket sizes force it to.
fn select_destinations(ranked: &[usize], lens: &[usize], mut need: usize) -> Vec<usize> {
    let mut dests = Vec::new();
    let mut i = 0;
    while need > 0 {
        debug_assert!(i < ranked.len(), "bucket capacities cover the live count");
        if lens[ranked[i]] >= need {
            let mut j = i;
            while j + 1 < ranked.len() && lens[ranked[j + 1]] >= need {
                j += 1;
            }
            dests.push(ranked[j]);
            need = 0;
        } else {
            need -= lens[ranked[i]];
            dests.push(ranked[i]);
            i += 1;
        }
    }
    dests
}
