//! Interns cell names to dense ids in first-seen order.
//!
//! Thread-safety is only required during the (sequential, per the core's
//! contract) parsing phase; the evaluator never mutates this table.

use cellengine_common::{CellId, CellName};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct IdentTable {
    by_name: FxHashMap<CellName, CellId>,
    names: Vec<CellName>,
}

impl IdentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing id for `name`, or assigns the next one.
    pub fn intern(&mut self, name: CellName) -> CellId {
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = CellId(self.names.len() as u32);
        self.names.push(name.clone());
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, name: &CellName) -> Option<CellId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: CellId) -> &CellName {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
