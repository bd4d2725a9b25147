//! The single-threaded reference evaluator: a depth-first recompute used as
//! the correctness oracle the parallel evaluator is diff-tested against.
//!
//! Deliberately the simplest correct implementation of the evaluation
//! semantics: no atomics, no queue, recursion instead of a worklist. Its
//! only job is to define those semantics unambiguously for acyclic inputs.

use rustc_hash::FxHashSet;

use cellengine_common::{CellId, CellName, Formula};

struct OracleCell {
    formula: Formula,
    dependents: FxHashSet<CellId>,
    calculated: bool,
    value: i32,
}

/// Single-threaded oracle. Holds its own copy of the cell state; never
/// shared across threads.
#[derive(Default)]
pub struct ReferenceEvaluator {
    names: Vec<CellName>,
    cells: Vec<OracleCell>,
}

/// Returned when a cycle makes depth-first recursion unable to terminate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CycleDetected {
    pub path: Vec<CellId>,
}

impl ReferenceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_calculate(
        &mut self,
        inputs: &[(CellName, Formula)],
    ) -> Result<(), CycleDetected> {
        self.names = inputs.iter().map(|(n, _)| n.clone()).collect();
        self.cells = inputs
            .iter()
            .map(|(_, formula)| OracleCell {
                formula: formula.clone(),
                dependents: FxHashSet::default(),
                calculated: false,
                value: 0,
            })
            .collect();

        for (id, (_, formula)) in inputs.iter().enumerate() {
            for predecessor in formula.iter_refs() {
                self.cells[predecessor.index()]
                    .dependents
                    .insert(CellId(id as u32));
            }
        }

        for id in 0..self.cells.len() {
            let mut path = Vec::new();
            self.calculate(CellId(id as u32), &mut path)?;
        }
        Ok(())
    }

    fn calculate(&mut self, cell: CellId, path: &mut Vec<CellId>) -> Result<(), CycleDetected> {
        if self.cells[cell.index()].calculated {
            return Ok(());
        }
        if path.contains(&cell) {
            let mut cycle = path[path.iter().position(|c| *c == cell).unwrap()..].to_vec();
            cycle.push(cell);
            return Err(CycleDetected { path: cycle });
        }
        path.push(cell);

        let predecessors: Vec<CellId> = self.cells[cell.index()].formula.iter_refs().collect();
        for predecessor in predecessors {
            if !self.cells[predecessor.index()].calculated {
                self.calculate(predecessor, path)?;
            }
        }

        let value = self.cells[cell.index()]
            .formula
            .evaluate(|id| self.cells[id.index()].value);
        let cell_info = &mut self.cells[cell.index()];
        cell_info.value = value;
        cell_info.calculated = true;
        path.pop();
        Ok(())
    }

    /// Installs `formula` for `cell`, rewiring dependent tracking, then
    /// recomputes the cell and its full transitive dependent closure in
    /// post-order.
    pub fn change_cell(
        &mut self,
        cell: CellId,
        formula: Formula,
    ) -> Result<(), CycleDetected> {
        for predecessor in self.cells[cell.index()].formula.iter_refs() {
            self.cells[predecessor.index()].dependents.remove(&cell);
        }
        self.cells[cell.index()].formula = formula;
        let new_predecessors: Vec<CellId> = self.cells[cell.index()].formula.iter_refs().collect();
        for predecessor in new_predecessors {
            self.cells[predecessor.index()].dependents.insert(cell);
        }

        let mut visited = FxHashSet::default();
        let mut post_order = Vec::new();
        self.build_post_order(cell, &mut visited, &mut post_order);

        for id in &post_order {
            self.cells[id.index()].calculated = false;
        }
        for id in post_order {
            let mut path = Vec::new();
            self.calculate(id, &mut path)?;
        }
        Ok(())
    }

    fn build_post_order(&self, cell: CellId, visited: &mut FxHashSet<CellId>, order: &mut Vec<CellId>) {
        if !visited.insert(cell) {
            return;
        }
        let dependents: Vec<CellId> = self.cells[cell.index()].dependents.iter().copied().collect();
        for dependent in dependents {
            self.build_post_order(dependent, visited, order);
        }
        order.push(cell);
    }

    pub fn get_current_values(&self) -> Vec<(CellName, i32)> {
        self.names
            .iter()
            .cloned()
            .zip(self.cells.iter().map(|c| c.value))
            .collect()
    }
}
