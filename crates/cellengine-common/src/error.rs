//! The error kinds the engine and its text-format collaborators can raise,
//! collected into one enum so every crate in the workspace reports
//! failures the same way.

use crate::cell_id::CellId;
use thiserror::Error;

/// Every failure mode the engine and its text-format collaborators can
/// surface. No errors are recovered inside the evaluator — callers decide
/// what to do with these.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum EngineError {
    /// Line `line` has no `=` separating the cell name from its formula.
    #[error("line {line}: missing '=' separating cell name from formula")]
    MissingEquals { line: usize },

    /// A cell name (on either side of `=` or inside a formula) is not
    /// `[A-Z][0-9]+`.
    #[error("malformed cell name '{0}'")]
    MalformedName(String),

    /// An addend is neither a valid cell name nor a valid signed integer.
    #[error("line {line}: addend '{addend}' is neither a cell reference nor an integer")]
    InvalidAddend { line: usize, addend: String },

    /// The same cell name was defined twice in one input.
    #[error("cell '{0}' defined more than once")]
    DuplicateCell(String),

    /// An edit named a cell, or referenced a cell, that the initial
    /// evaluation never saw.
    #[error("unknown cell '{0}' in edit")]
    UnknownCell(String),

    /// The formula set contains a cycle; acyclicity is a precondition this
    /// engine does not attempt to repair.
    #[error("cycle detected among {n} cell(s)", n = cells.len())]
    Cycle { cells: Vec<CellId> },
}
