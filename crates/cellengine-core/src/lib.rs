//! The concurrent cell-evaluation engine: identifier interning, cell
//! storage, the dependency graph, and the two evaluators (reference and
//! parallel) that compute over them.

mod dag;
mod engine;
mod ident;
mod oracle;
mod parallel;
mod queue;
mod store;

pub use dag::{DependencyGraph, Edge};
pub use engine::{new_parallel_evaluator, EngineConfig, Evaluator};
pub use ident::IdentTable;
pub use oracle::{CycleDetected, ReferenceEvaluator};
pub use parallel::{ParallelEvaluator, FALLBACK_THRESHOLD};
pub use queue::{run_workers, GrowableQueue, MpmcQueue};
pub use store::{CellSlot, CellState, CellStore};
