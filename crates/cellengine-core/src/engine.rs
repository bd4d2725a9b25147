//! The capability trait shared by both evaluators, and the config knobs
//! that select and tune the parallel one.
//!
//! Two interchangeable evaluation strategies exist behind one operational
//! surface: evaluate from scratch, apply a formula change, read back
//! current values. Modeling this as a trait lets the oracle stand in for
//! the parallel evaluator in tests, and lets callers pick either at
//! runtime.

use cellengine_common::{CellId, CellName, EngineError, Formula};

use crate::oracle::{CycleDetected, ReferenceEvaluator};
use crate::parallel::ParallelEvaluator;

/// Tunables for the parallel evaluator. Defaults mirror the documented
/// behavior: one worker per available hardware thread, fallback to a full
/// bulk pass once an edit invalidates more than 80% of cells.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub worker_threads: usize,
    pub fallback_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            fallback_threshold: crate::parallel::FALLBACK_THRESHOLD,
        }
    }
}

/// The operational surface both evaluators implement.
pub trait Evaluator {
    fn initial_calculate(&mut self, inputs: &[(CellName, Formula)]) -> Result<(), EngineError>;
    fn change_cell(&mut self, cell: CellId, formula: Formula) -> Result<(), EngineError>;
    fn get_current_values(&self) -> Vec<(CellName, i32)>;
}

impl Evaluator for ParallelEvaluator {
    fn initial_calculate(&mut self, inputs: &[(CellName, Formula)]) -> Result<(), EngineError> {
        ParallelEvaluator::initial_calculate(self, inputs)
    }

    fn change_cell(&mut self, cell: CellId, formula: Formula) -> Result<(), EngineError> {
        ParallelEvaluator::change_cell(self, cell, formula)
    }

    fn get_current_values(&self) -> Vec<(CellName, i32)> {
        ParallelEvaluator::get_current_values(self)
    }
}

impl Evaluator for ReferenceEvaluator {
    fn initial_calculate(&mut self, inputs: &[(CellName, Formula)]) -> Result<(), EngineError> {
        ReferenceEvaluator::initial_calculate(self, inputs).map_err(cycle_to_engine_error)
    }

    fn change_cell(&mut self, cell: CellId, formula: Formula) -> Result<(), EngineError> {
        ReferenceEvaluator::change_cell(self, cell, formula).map_err(cycle_to_engine_error)
    }

    fn get_current_values(&self) -> Vec<(CellName, i32)> {
        ReferenceEvaluator::get_current_values(self)
    }
}

fn cycle_to_engine_error(detected: CycleDetected) -> EngineError {
    EngineError::Cycle { cells: detected.path }
}

/// Constructs a [`ParallelEvaluator`] from an [`EngineConfig`], as the
/// default production entry point.
pub fn new_parallel_evaluator(config: EngineConfig) -> ParallelEvaluator {
    ParallelEvaluator::new(config.worker_threads).with_fallback_threshold(config.fallback_threshold)
}
