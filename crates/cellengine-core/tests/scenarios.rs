//! End-to-end scenarios exercising `ParallelEvaluator` and `ReferenceEvaluator`
//! through the public `Evaluator` trait, as a caller outside the crate would.

use cellengine_common::{Addend, CellId, CellName, Formula};
use cellengine_core::{new_parallel_evaluator, EngineConfig, Evaluator, ReferenceEvaluator};

fn name(s: &str) -> CellName {
    s.parse().unwrap()
}

fn both_evaluators() -> (impl Evaluator, impl Evaluator) {
    (new_parallel_evaluator(EngineConfig { worker_threads: 4, ..EngineConfig::default() }), ReferenceEvaluator::new())
}

fn run(evaluator: &mut dyn Evaluator, inputs: &[(CellName, Formula)]) -> Vec<i32> {
    evaluator.initial_calculate(inputs).unwrap();
    evaluator.get_current_values().into_iter().map(|(_, v)| v).collect()
}

#[test]
fn sum_of_literals_and_references() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![Addend::Literal(1)])),
        (name("A1"), Formula::new(vec![Addend::Literal(2)])),
        (name("A2"), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Ref(CellId(1)), Addend::Literal(3)])),
    ];
    let (mut parallel, mut reference) = both_evaluators();
    assert_eq!(run(&mut parallel, &inputs), vec![1, 2, 6]);
    assert_eq!(run(&mut reference, &inputs), vec![1, 2, 6]);
}

#[test]
fn forward_reference_to_a_cell_defined_later() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![Addend::Ref(CellId(1)), Addend::Literal(1)])),
        (name("A1"), Formula::new(vec![Addend::Literal(41)])),
    ];
    let (mut parallel, mut reference) = both_evaluators();
    assert_eq!(run(&mut parallel, &inputs), vec![42, 41]);
    assert_eq!(run(&mut reference, &inputs), vec![42, 41]);
}

#[test]
fn empty_sheet_evaluates_to_no_cells() {
    let inputs: Vec<(CellName, Formula)> = vec![];
    let (mut parallel, mut reference) = both_evaluators();
    assert!(run(&mut parallel, &inputs).is_empty());
    assert!(run(&mut reference, &inputs).is_empty());
}

#[test]
fn single_literal_cell() {
    let inputs = vec![(name("A0"), Formula::new(vec![Addend::Literal(7)]))];
    let (mut parallel, mut reference) = both_evaluators();
    assert_eq!(run(&mut parallel, &inputs), vec![7]);
    assert_eq!(run(&mut reference, &inputs), vec![7]);
}

#[test]
fn cell_with_zero_addends_propagates_as_zero() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![])),
        (name("A1"), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(5)])),
    ];
    let (mut parallel, mut reference) = both_evaluators();
    assert_eq!(run(&mut parallel, &inputs), vec![0, 5]);
    assert_eq!(run(&mut reference, &inputs), vec![0, 5]);
}

#[test]
fn fan_out_greater_than_thread_count() {
    let mut inputs = vec![(name("A0"), Formula::new(vec![Addend::Literal(1)]))];
    for i in 1..60 {
        inputs.push((CellName::new('A', i as u32), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(i)])));
    }
    let mut parallel = new_parallel_evaluator(EngineConfig { worker_threads: 2, ..EngineConfig::default() });
    let values = run(&mut parallel, &inputs);
    assert_eq!(values.len(), 60);
    for i in 1..60 {
        assert_eq!(values[i as usize], 1 + i);
    }
}

#[test]
fn a_cycle_is_reported_instead_of_evaluated() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![Addend::Ref(CellId(1))])),
        (name("A1"), Formula::new(vec![Addend::Ref(CellId(0))])),
    ];
    let mut parallel = new_parallel_evaluator(EngineConfig::default());
    assert!(parallel.initial_calculate(&inputs).is_err());

    let mut reference = ReferenceEvaluator::new();
    assert!(reference.initial_calculate(&inputs).is_err());
}

#[test]
fn editing_a_cell_is_idempotent_when_applied_twice_with_the_same_formula() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![Addend::Literal(1)])),
        (name("A1"), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(1)])),
    ];
    let mut evaluator = new_parallel_evaluator(EngineConfig { worker_threads: 2, ..EngineConfig::default() });
    evaluator.initial_calculate(&inputs).unwrap();

    evaluator.change_cell(CellId(0), Formula::new(vec![Addend::Literal(9)])).unwrap();
    let once: Vec<i32> = evaluator.get_current_values().into_iter().map(|(_, v)| v).collect();

    evaluator.change_cell(CellId(0), Formula::new(vec![Addend::Literal(9)])).unwrap();
    let twice: Vec<i32> = evaluator.get_current_values().into_iter().map(|(_, v)| v).collect();

    assert_eq!(once, twice);
}

#[test]
fn editing_a_cell_only_affects_its_downstream_subset() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![Addend::Literal(1)])),
        (name("A1"), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(1)])),
        (name("B0"), Formula::new(vec![Addend::Literal(100)])),
        (name("B1"), Formula::new(vec![Addend::Ref(CellId(2)), Addend::Literal(1)])),
    ];
    let mut evaluator = new_parallel_evaluator(EngineConfig { worker_threads: 2, ..EngineConfig::default() });
    evaluator.initial_calculate(&inputs).unwrap();
    evaluator.change_cell(CellId(0), Formula::new(vec![Addend::Literal(50)])).unwrap();

    let values: Vec<i32> = evaluator.get_current_values().into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![50, 51, 100, 101]);
}

#[test]
fn reverting_an_edit_reproduces_the_original_output() {
    let inputs = vec![
        (name("A0"), Formula::new(vec![Addend::Literal(1)])),
        (name("A1"), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(1)])),
    ];
    let mut evaluator = new_parallel_evaluator(EngineConfig { worker_threads: 2, ..EngineConfig::default() });
    evaluator.initial_calculate(&inputs).unwrap();
    let original: Vec<i32> = evaluator.get_current_values().into_iter().map(|(_, v)| v).collect();

    evaluator.change_cell(CellId(0), Formula::new(vec![Addend::Literal(999)])).unwrap();
    evaluator.change_cell(CellId(0), Formula::new(vec![Addend::Literal(1)])).unwrap();

    let restored: Vec<i32> = evaluator.get_current_values().into_iter().map(|(_, v)| v).collect();
    assert_eq!(original, restored);
}

#[test]
fn large_fallback_edit_matches_the_reference_oracle() {
    let mut inputs = vec![(name("A0"), Formula::new(vec![Addend::Literal(1)]))];
    for i in 1..40 {
        inputs.push((CellName::new('A', i as u32), Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(i)])));
    }

    let mut parallel = new_parallel_evaluator(EngineConfig {
        worker_threads: 4,
        fallback_threshold: 0.5,
    });
    let mut reference = ReferenceEvaluator::new();
    parallel.initial_calculate(&inputs).unwrap();
    reference.initial_calculate(&inputs).unwrap();

    parallel.change_cell(CellId(0), Formula::new(vec![Addend::Literal(1000)])).unwrap();
    reference.change_cell(CellId(0), Formula::new(vec![Addend::Literal(1000)])).unwrap();

    assert_eq!(parallel.get_current_values(), reference.get_current_values());
}
