//! The dense, indexed collection of per-cell slots.
//!
//! `CellSlot.state` packs `{calculated: bool, value: i32}` into a single
//! 64-bit word so the pair is read and written atomically — a torn read
//! would otherwise let a worker observe a value that doesn't belong to the
//! `calculated` flag it read alongside it.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use cellengine_common::{CellName, Formula};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CellState {
    pub calculated: bool,
    pub value: i32,
}

struct StateWord(AtomicU64);

impl StateWord {
    fn pack(calculated: bool, value: i32) -> u64 {
        ((calculated as u64) << 32) | (value as u32 as u64)
    }

    fn unpack(word: u64) -> CellState {
        CellState {
            calculated: (word >> 32) & 1 != 0,
            value: (word & 0xFFFF_FFFF) as u32 as i32,
        }
    }

    fn new(state: CellState) -> Self {
        Self(AtomicU64::new(Self::pack(state.calculated, state.value)))
    }

    fn load(&self, ordering: Ordering) -> CellState {
        Self::unpack(self.0.load(ordering))
    }

    /// Attempts `(false, _) -> (true, value)`. Returns the value observed
    /// just before the attempt either way, matching
    /// `std::sync::atomic`'s compare_exchange contract.
    fn try_mark_calculated(&self, value: i32, success: Ordering, failure: Ordering) -> Result<CellState, CellState> {
        let current = self.0.load(failure);
        let current_state = Self::unpack(current);
        if current_state.calculated {
            return Err(current_state);
        }
        let expected = Self::pack(false, current_state.value);
        let desired = Self::pack(true, value);
        match self.0.compare_exchange(expected, desired, success, failure) {
            Ok(prev) => Ok(Self::unpack(prev)),
            Err(prev) => Err(Self::unpack(prev)),
        }
    }

    /// Attempts `(true, _) -> (false, 0)`, used by edit-time invalidation.
    fn try_mark_uncalculated(&self, success: Ordering, failure: Ordering) -> Result<CellState, CellState> {
        let current = self.0.load(failure);
        let current_state = Self::unpack(current);
        if !current_state.calculated {
            return Err(current_state);
        }
        let expected = Self::pack(true, current_state.value);
        let desired = Self::pack(false, 0);
        match self.0.compare_exchange(expected, desired, success, failure) {
            Ok(prev) => Ok(Self::unpack(prev)),
            Err(prev) => Err(Self::unpack(prev)),
        }
    }

    fn store(&self, state: CellState, ordering: Ordering) {
        self.0.store(Self::pack(state.calculated, state.value), ordering);
    }
}

/// One cell's storage: its immutable name, its formula (mutated only
/// between evaluator runs), and the two atomics the evaluators coordinate
/// through.
pub struct CellSlot {
    name: CellName,
    formula: Formula,
    state: StateWord,
    unresolved: AtomicU32,
}

impl CellSlot {
    fn new(name: CellName, formula: Formula) -> Self {
        Self {
            name,
            formula,
            state: StateWord::new(CellState { calculated: false, value: 0 }),
            unresolved: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &CellName {
        &self.name
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn state(&self, ordering: Ordering) -> CellState {
        self.state.load(ordering)
    }

    pub fn try_mark_calculated(
        &self,
        value: i32,
        success: Ordering,
        failure: Ordering,
    ) -> Result<CellState, CellState> {
        self.state.try_mark_calculated(value, success, failure)
    }

    pub fn try_mark_uncalculated(
        &self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<CellState, CellState> {
        self.state.try_mark_uncalculated(success, failure)
    }

    pub fn reset_state(&self) {
        self.state.store(CellState { calculated: false, value: 0 }, Ordering::Relaxed);
    }

    pub fn unresolved(&self) -> &AtomicU32 {
        &self.unresolved
    }
}

/// Dense indexed collection of `CellSlot`s, one per interned `CellId`.
#[derive(Default)]
pub struct CellStore {
    slots: Vec<CellSlot>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes the store to hold exactly `len` slots, dropping any that
    /// existed beyond it. Used at the start of bulk evaluation, before any
    /// cell is installed.
    pub fn reset(&mut self, len: usize) {
        self.slots.clear();
        self.slots.reserve(len);
    }

    /// Idempotently installs (or replaces) the slot at `id`, growing the
    /// store if needed. `id`s are assigned densely and in order by the
    /// identifier table, so callers install in id order.
    pub fn ensure(&mut self, name: CellName, formula: Formula) {
        self.slots.push(CellSlot::new(name, formula));
    }

    pub fn set_formula(&mut self, index: usize, formula: Formula) {
        self.slots[index].formula = formula;
    }

    pub fn slot(&self, index: usize) -> &CellSlot {
        &self.slots[index]
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellSlot> {
        self.slots.iter()
    }
}
