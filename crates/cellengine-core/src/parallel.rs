//! The concurrent evaluator. Two entry points: [`ParallelEvaluator::initial_calculate`]
//! for the first bulk pass over every cell, and [`ParallelEvaluator::change_cell`] for
//! incremental recomputation after a single edit, with a fallback to a full
//! bulk pass when the invalidated fraction gets too large to bother being
//! incremental about.
//!
//! Grounded on the breadth-first, queue-driven design: a worker pulls a
//! ready cell, computes it, and fans out to dependents whose last
//! unresolved predecessor it just resolved. No worker ever blocks; an
//! empty queue is retried until the completion counter says the run is
//! over.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, instrument};

use cellengine_common::{Addend, CellId, CellName, EngineError, Formula};

use crate::dag::DependencyGraph;
use crate::queue::{run_workers, GrowableQueue, MpmcQueue};
use crate::store::CellStore;

/// Above this fraction of invalidated cells, `change_cell` abandons
/// incremental recomputation and reruns the full bulk pass instead.
pub const FALLBACK_THRESHOLD: f64 = 0.8;

pub struct ParallelEvaluator {
    store: CellStore,
    dag: DependencyGraph,
    starting: Vec<CellId>,
    calculated_count: AtomicUsize,
    worker_threads: usize,
    fallback_threshold: f64,
}

impl ParallelEvaluator {
    pub fn new(worker_threads: usize) -> Self {
        Self {
            store: CellStore::new(),
            dag: DependencyGraph::new(),
            starting: Vec::new(),
            calculated_count: AtomicUsize::new(0),
            worker_threads: worker_threads.max(1),
            fallback_threshold: FALLBACK_THRESHOLD,
        }
    }

    pub fn with_fallback_threshold(mut self, threshold: f64) -> Self {
        self.fallback_threshold = threshold;
        self
    }

    pub fn cell_count(&self) -> usize {
        self.store.len()
    }

    /// Phase A (build) + Phase B (seed) + Phase C (drain).
    #[instrument(skip(self, inputs))]
    pub fn initial_calculate(&mut self, inputs: &[(CellName, Formula)]) -> Result<(), EngineError> {
        let len = inputs.len();
        self.store.reset(len);
        self.dag.reset(len);

        for (name, formula) in inputs {
            self.store.ensure(name.clone(), formula.clone());
        }

        let store = &self.store;
        let dag = &self.dag;
        let starting: Vec<CellId> = (0..len)
            .into_par_iter()
            .filter_map(|idx| {
                let id = CellId(idx as u32);
                let slot = store.slot(idx);
                let mut has_ref = false;
                for addend in slot.formula().addends() {
                    if let Addend::Ref(predecessor) = addend {
                        dag.add_edge(*predecessor, id);
                        slot.unresolved().fetch_add(1, Ordering::Relaxed);
                        has_ref = true;
                    }
                }
                (!has_ref).then_some(id)
            })
            .collect();

        debug!(cells = len, starting = starting.len(), "built DAG");
        self.starting = starting;
        self.calculated_count.store(0, Ordering::Relaxed);

        let seed = self.starting.clone();
        self.drain(&seed, 0)
    }

    /// Steps 1-5 of edit recomputation, or a full bulk rerun if step 3's
    /// fallback test trips.
    #[instrument(skip(self, new_formula))]
    pub fn change_cell(&mut self, cell: CellId, new_formula: Formula) -> Result<(), EngineError> {
        // Step 1 — rewire the DAG.
        let old_formula = self.store.slot(cell.index()).formula().clone();
        for addend in old_formula.addends() {
            if let Addend::Ref(predecessor) = addend {
                self.dag.tombstone_edges(*predecessor, cell);
            }
        }
        self.store.set_formula(cell.index(), new_formula.clone());
        for addend in new_formula.addends() {
            if let Addend::Ref(predecessor) = addend {
                self.dag.add_edge(*predecessor, cell);
            }
        }

        // Step 2 — find the affected set.
        let cell_count = self.store.len();
        let count_to_recalculate = AtomicUsize::new(0);
        let need_to_recalculate = Mutex::new(Vec::new());
        self.find_affected_set(cell, &count_to_recalculate, &need_to_recalculate);

        let affected = count_to_recalculate.load(Ordering::Relaxed);
        debug!(affected, cell_count, "invalidation complete");

        // Step 3 — fallback test.
        if affected as f64 > self.fallback_threshold * cell_count as f64 {
            debug!("affected set exceeds fallback threshold, rerunning bulk evaluation");
            let inputs: Vec<(CellName, Formula)> = self
                .store
                .iter()
                .map(|slot| (slot.name().clone(), slot.formula().clone()))
                .collect();
            return self.initial_calculate(&inputs);
        }

        // Step 4 — recompute unresolved counts for the affected set.
        let need_to_recalculate = need_to_recalculate.into_inner().expect("lock poisoned");
        let store = &self.store;
        need_to_recalculate.par_iter().for_each(|&id| {
            let slot = store.slot(id.index());
            let unresolved = slot
                .formula()
                .addends()
                .iter()
                .filter(|addend| match addend {
                    Addend::Ref(predecessor) => {
                        !store.slot(predecessor.index()).state(Ordering::Acquire).calculated
                    }
                    Addend::Literal(_) => false,
                })
                .count();
            slot.unresolved().store(unresolved as u32, Ordering::Relaxed);
        });

        // Step 5 — drain, seeded with just the edited cell.
        let already_calculated = cell_count - affected;
        self.drain(&[cell], already_calculated)
    }

    fn find_affected_set(
        &self,
        edited: CellId,
        count_to_recalculate: &AtomicUsize,
        need_to_recalculate: &Mutex<Vec<CellId>>,
    ) {
        let queue = GrowableQueue::new();
        queue.push(edited);
        let done_consumers = AtomicUsize::new(0);
        let worker_threads = self.worker_threads;

        run_workers(worker_threads, || loop {
            match queue.try_pop() {
                Some(cell) => {
                    done_consumers.store(0, Ordering::SeqCst);
                    if self.store.slot(cell.index())
                        .try_mark_uncalculated(Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        continue;
                    }
                    count_to_recalculate.fetch_add(1, Ordering::AcqRel);
                    need_to_recalculate.lock().expect("lock poisoned").push(cell);

                    for edge in self.dag.neighbors(cell).iter() {
                        if edge.tombstoned {
                            continue;
                        }
                        let dependent = self.store.slot(edge.to.index());
                        if dependent.state(Ordering::Acquire).calculated {
                            queue.push(edge.to);
                        }
                    }
                }
                None => {
                    let reached = done_consumers.fetch_add(1, Ordering::AcqRel) + 1;
                    if reached >= worker_threads && queue.is_empty() {
                        break;
                    }
                }
            }
        });
    }

    /// The shared drain loop backing Phase C and edit Step 5: one worker
    /// per `worker_threads`, each pulling ready cells off `queue` until
    /// `already_calculated + (cells this run computes) == cell_count`.
    fn drain(&self, seed: &[CellId], already_calculated: usize) -> Result<(), EngineError> {
        let cell_count = self.store.len();
        if cell_count == 0 {
            return Ok(());
        }

        // A cycle would leave some cell's `unresolved` forever above zero,
        // which would spin the real workers below forever. Simulate the
        // same unresolved-counter drain serially first, off the atomics, so
        // a cycle is reported instead of hung on.
        if let Some(stuck) = self.find_unreachable_cells(seed) {
            return Err(EngineError::Cycle { cells: stuck });
        }

        let queue = MpmcQueue::<CellId>::with_capacity(cell_count);
        for &id in seed {
            queue
                .enqueue(id)
                .expect("seed set larger than cell count, violates queue sizing invariant");
        }

        let calculated = AtomicUsize::new(already_calculated);
        let worker_threads = self.worker_threads;

        run_workers(worker_threads, || self.drain_worker(&queue, &calculated, cell_count));

        self.calculated_count.store(calculated.load(Ordering::Relaxed), Ordering::Relaxed);
        Ok(())
    }

    /// Replays the unresolved-counter drain protocol single-threaded,
    /// starting from `seed` plus every already-calculated cell. Returns the
    /// ids that would never be reached, or `None` if every cell would be.
    fn find_unreachable_cells(&self, seed: &[CellId]) -> Option<Vec<CellId>> {
        let cell_count = self.store.len();
        let mut unresolved: Vec<u32> = (0..cell_count)
            .map(|idx| self.store.slot(idx).unresolved().load(Ordering::Relaxed))
            .collect();
        let mut visited = vec![false; cell_count];
        let mut reached = 0usize;

        for idx in 0..cell_count {
            if self.store.slot(idx).state(Ordering::Relaxed).calculated {
                visited[idx] = true;
                reached += 1;
            }
        }

        let mut queue: std::collections::VecDeque<CellId> = std::collections::VecDeque::new();
        for &id in seed {
            if !visited[id.index()] {
                visited[id.index()] = true;
                reached += 1;
                queue.push_back(id);
            }
        }

        while let Some(id) = queue.pop_front() {
            for edge in self.dag.neighbors(id).iter() {
                if edge.tombstoned {
                    continue;
                }
                let idx = edge.to.index();
                if visited[idx] || unresolved[idx] == 0 {
                    continue;
                }
                unresolved[idx] -= 1;
                if unresolved[idx] == 0 {
                    visited[idx] = true;
                    reached += 1;
                    queue.push_back(edge.to);
                }
            }
        }

        if reached == cell_count {
            None
        } else {
            Some(
                (0..cell_count)
                    .filter(|&idx| !visited[idx])
                    .map(|idx| CellId(idx as u32))
                    .collect(),
            )
        }
    }

    fn drain_worker(&self, queue: &MpmcQueue<CellId>, calculated: &AtomicUsize, cell_count: usize) {
        while calculated.load(Ordering::Acquire) < cell_count {
            let Some(id) = queue.dequeue() else {
                continue;
            };
            let slot = self.store.slot(id.index());
            if slot.state(Ordering::Acquire).calculated {
                continue;
            }

            let value = slot
                .formula()
                .evaluate(|predecessor| self.store.slot(predecessor.index()).state(Ordering::Acquire).value);

            if slot.try_mark_calculated(value, Ordering::AcqRel, Ordering::Acquire).is_err() {
                continue;
            }
            calculated.fetch_add(1, Ordering::AcqRel);

            for edge in self.dag.neighbors(id).iter() {
                if edge.tombstoned {
                    continue;
                }
                let next = self.store.slot(edge.to.index());
                if !next.state(Ordering::Acquire).calculated {
                    let prev = next.unresolved().fetch_sub(1, Ordering::AcqRel);
                    if prev - 1 == 0 {
                        let _ = queue.enqueue(edge.to);
                    }
                }
            }
        }
    }

    pub fn get_current_values(&self) -> Vec<(CellName, i32)> {
        self.store
            .iter()
            .map(|slot| (slot.name().clone(), slot.state(Ordering::Acquire).value))
            .collect()
    }
}
