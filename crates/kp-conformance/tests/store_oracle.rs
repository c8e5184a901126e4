#![forbid(unsafe_code)]

//! Store-contract oracles: structural key equality, port-order sensitivity,
//! sum-type behavior of accelerator records.

use kp_cache::{CpuMeasureStore, GpuMeasureStore, GpuMeasurement, StoreError};
use kp_conformance::{FixtureNode, cpu_cost, gpu_algorithms};

#[test]
fn value_inserted_under_one_signature_is_found_under_a_field_identical_rebuild() {
    let mut store = CpuMeasureStore::empty("unused.json");
    store.insert_or_update(FixtureNode::conv2d().cpu_key("host:host"), cpu_cost(3.5));

    // Key rebuilt from an independently constructed but field-identical node.
    let rebuilt = FixtureNode::conv2d().cpu_key("host:host");
    assert_eq!(store.lookup(&rebuilt), Some(&cpu_cost(3.5)));
}

#[test]
fn swapping_two_distinct_input_ports_misses() {
    let mut store = CpuMeasureStore::empty("unused.json");
    store.insert_or_update(FixtureNode::conv2d().cpu_key("host:host"), cpu_cost(3.5));

    let mut swapped = FixtureNode::conv2d();
    swapped.inputs.swap(0, 1);
    swapped.layouts.swap(0, 1);
    assert!(!store.contains(&swapped.cpu_key("host:host")));
}

#[test]
fn same_signature_different_io_config_is_a_distinct_entry() {
    let mut store = CpuMeasureStore::empty("unused.json");
    let node = FixtureNode::matmul(64, 128, 64);
    store.insert_or_update(node.cpu_key("host:host"), cpu_cost(1.0));
    store.insert_or_update(node.cpu_key("host:pinned"), cpu_cost(2.0));

    assert_eq!(store.len(), 2);
    assert_eq!(store.lookup(&node.cpu_key("host:pinned")), Some(&cpu_cost(2.0)));
}

#[test]
fn last_write_wins_on_repeated_insert() {
    let mut store = GpuMeasureStore::empty("unused.json");
    let key = FixtureNode::matmul(8, 8, 8).gpu_key("device:device");

    store.insert_or_update(key.clone(), GpuMeasurement::cost(10.0));
    store.insert_or_update(key.clone(), GpuMeasurement::cost(0.25));

    assert_eq!(store.len(), 1);
    assert_eq!(store.lookup(&key), Some(&GpuMeasurement::cost(0.25)));
}

#[test]
fn algorithm_list_record_reports_selectable_and_cost_record_does_not() {
    let mut store = GpuMeasureStore::empty("unused.json");
    let algo_key = FixtureNode::conv2d().gpu_key("device:device");
    let cost_key = FixtureNode::matmul(32, 32, 32).gpu_key("device:device");

    store.insert_or_update(algo_key.clone(), gpu_algorithms());
    store.insert_or_update(cost_key.clone(), GpuMeasurement::cost(1.5));

    assert!(store.can_select_algorithm(&algo_key).expect("present"));
    assert!(!store.can_select_algorithm(&cost_key).expect("present"));
}

#[test]
fn algorithm_query_for_absent_key_is_a_loud_error() {
    let store = GpuMeasureStore::empty("unused.json");
    let missing = FixtureNode::matmul(3, 3, 3).gpu_key("device:device");

    let err = store.can_select_algorithm(&missing).unwrap_err();
    let StoreError::MissingKey { detail } = err;
    assert!(detail.contains("FullyConnected"), "detail: {detail}");
}

#[test]
fn remove_of_absent_key_is_a_quiet_none() {
    let mut store = GpuMeasureStore::empty("unused.json");
    assert!(store
        .remove(&FixtureNode::matmul(2, 2, 2).gpu_key("device:device"))
        .is_none());
}
