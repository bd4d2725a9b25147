//! The forward dependency graph: for each cell `a`, the cells whose
//! formulas reference `a` ("dependents").
//!
//! Edges are never physically removed — a cell edit tombstones the old
//! ones instead, so readers that traverse concurrently with an edit never
//! have to synchronize against a resize or compaction, only a single
//! boolean flip per stale edge.
//!
//! Each predecessor bucket lives behind a `parking_lot::RwLock`: writers
//! (Phase A's concurrent `add_edge` and edit Step 1's single-threaded
//! `tombstone_edges`) never overlap a bucket's readers (Phase C's drain and
//! the edit-time invalidation BFS both run after their evaluator call's
//! writes are done), so the lock sees no real contention — it exists for
//! soundness, not throughput. `neighbors` maps the read guard straight onto
//! the backing slice instead of cloning it, so the drain hot loop pays for
//! a lock acquisition but not an allocation.

use parking_lot::{MappedRwLockReadGuard, RwLock};

use cellengine_common::CellId;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    pub to: CellId,
    pub tombstoned: bool,
}

/// `edges[from]` holds every edge `from -> to` ever added, live or
/// tombstoned.
#[derive(Default)]
pub struct DependencyGraph {
    edges: Vec<RwLock<Vec<Edge>>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes to hold `len` predecessor buckets, discarding old edges.
    /// Called once per bulk evaluation, mirroring the cell store's resize.
    pub fn reset(&mut self, len: usize) {
        self.edges = (0..len).map(|_| RwLock::new(Vec::new())).collect();
    }

    /// Appends `{to, false}` to `edges[from]`. Safe to call from multiple
    /// threads building distinct cells concurrently, even when two cells
    /// share a predecessor and both append to the same bucket.
    pub fn add_edge(&self, from: CellId, to: CellId) {
        self.edges[from.index()].write().push(Edge { to, tombstoned: false });
    }

    /// Marks every live edge `from -> victim` as tombstoned. Called once,
    /// single-threaded, at the start of a cell edit before any worker
    /// starts reading this bucket for the new run.
    pub fn tombstone_edges(&self, from: CellId, victim: CellId) {
        let mut bucket = self.edges[from.index()].write();
        for edge in bucket.iter_mut() {
            if edge.to == victim {
                edge.tombstoned = true;
            }
        }
    }

    /// All edges out of `from`, live and tombstoned; callers check the bit.
    /// Returns a read-lock guard mapped onto the backing slice rather than
    /// a clone of it, since this is called once per completed cell in the
    /// drain hot loop.
    pub fn neighbors(&self, from: CellId) -> MappedRwLockReadGuard<'_, [Edge]> {
        parking_lot::RwLockReadGuard::map(self.edges[from.index()].read(), |edges| edges.as_slice())
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_list_neighbors() {
        let mut dag = DependencyGraph::new();
        dag.reset(3);
        dag.add_edge(CellId(0), CellId(1));
        dag.add_edge(CellId(0), CellId(2));
        let neighbors = dag.neighbors(CellId(0));
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|e| !e.tombstoned));
    }

    #[test]
    fn tombstone_marks_matching_edges_only() {
        let mut dag = DependencyGraph::new();
        dag.reset(2);
        dag.add_edge(CellId(0), CellId(1));
        dag.add_edge(CellId(0), CellId(1));
        dag.tombstone_edges(CellId(0), CellId(1));
        let neighbors = dag.neighbors(CellId(0));
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|e| e.tombstoned));
    }

    #[test]
    fn concurrent_appends_to_shared_bucket_are_not_lost() {
        use std::thread;
        let mut dag = DependencyGraph::new();
        dag.reset(1);
        let dag = std::sync::Arc::new(dag);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dag = dag.clone();
                thread::spawn(move || dag.add_edge(CellId(0), CellId(i)))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(dag.neighbors(CellId(0)).len(), 8);
    }
}
