//! Simulator runs across seeds and configurations

use mos_session::{SelfCheck, SessionConfig};
use mos_sim::{run_simulator, Outcome, SimulatedOperation, SimulatorConfig};
use proptest::prelude::*;

#[test]
fn long_run_passes() {
    let report = run_simulator(SimulatorConfig {
        operations: 5000,
        ..SimulatorConfig::default()
    });
    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.stats.operations, 5000);
    assert!(report.stats.succeeded > 0);
    assert!(report.stats.dangling > 0, "workload should hit removed placements");
    assert!(report.stats.non_empty_scope > 0);
}

#[test]
fn checked_session_passes() {
    let report = run_simulator(SimulatorConfig {
        seed: 3,
        operations: 1000,
        stop_on_first_violation: true,
        session: SessionConfig::new().with_self_check(SelfCheck::OnMutation),
    });
    assert!(report.passed(), "{}", report.generate_text());
}

#[test]
fn final_size_matches_bookkeeping() {
    let report = run_simulator(SimulatorConfig {
        seed: 11,
        operations: 2000,
        ..SimulatorConfig::default()
    });
    let stats = &report.stats;
    assert_eq!(
        report.final_size as u64,
        stats.placements_inserted - stats.placements_removed
    );
}

#[test]
fn config_from_json() {
    let config: SimulatorConfig =
        serde_json::from_str(r#"{"seed": 9, "session": {"root_name": "sim"}}"#).unwrap();
    assert_eq!(config.seed, 9);
    assert_eq!(config.operations, 1000);
    assert_eq!(config.session.root_name, "sim");
}

#[test]
fn operations_serialise_tagged() {
    let json = serde_json::to_value(SimulatedOperation::Remove { target: 4 }).unwrap();
    assert_eq!(json["op"], "remove");
    assert_eq!(json["target"], 4);
    let json = serde_json::to_value(Outcome::Success).unwrap();
    assert_eq!(json["outcome"], "success");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_any_seed_passes(seed in any::<u64>()) {
        let report = run_simulator(SimulatorConfig {
            seed,
            operations: 400,
            ..SimulatorConfig::default()
        });
        prop_assert!(report.passed(), "{}", report.generate_text());
    }
}
