//! Randomised session simulator
//!
//! Drives a session through a seeded sequence of index mutations, reference
//! activations and focus moves. Before each step the expected outcome is
//! derived from the current model; afterwards the actual outcome is compared
//! and the index self-check is run.
//!
//! Key invariants tested:
//! - the index stays consistent after every step
//! - errors are raised exactly where the model predicts them
//! - active references share ownership of the placed object

use mos_model::{Binding, Clip, Effect, Fork, MObject, Placement, PlacementId, Time};
use mos_session::{
    MObjectRef, QueryFocus, Scope, Session, SessionConfig, SessionError, SessionResult,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of operations to run
    pub operations: u64,
    /// Stop at the first violation
    pub stop_on_first_violation: bool,
    /// Configuration of the simulated session
    pub session: SessionConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            operations: 1000,
            stop_on_first_violation: false,
            session: SessionConfig::default(),
        }
    }
}

/// Kind of object placed by an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacedKind {
    Fork,
    Clip,
    Effect,
    Binding,
}

/// Simulated operation
///
/// Slots index into the list of every id handed out so far, removed ones
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum SimulatedOperation {
    Insert { parent: usize, kind: PlacedKind },
    Remove { target: usize },
    ClearScope { target: usize },
    Activate { target: usize },
    Resolve { reference: usize },
    Navigate { target: usize },
    PushFocus { target: usize },
    PopFocus,
}

/// Error classes the simulator tells apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    NonEmptyScope,
    RootRefused,
    Dangling,
    Navigation,
    Type,
}

impl From<&SessionError> for ErrorClass {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::NonEmptyScope { .. } => Self::NonEmptyScope,
            SessionError::ModelRoot { .. } => Self::RootRefused,
            e if e.is_dangling() => Self::Dangling,
            e if e.is_type_error() => Self::Type,
            _ => Self::Navigation,
        }
    }
}

/// Outcome predicted or observed for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "class")]
pub enum Outcome {
    Success,
    Failure(ErrorClass),
    Skipped,
}

impl<T> From<&SessionResult<T>> for Outcome {
    fn from(result: &SessionResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => Self::Failure(e.into()),
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "violation")]
pub enum Violation {
    /// Index self-check failed
    SelfCheck { step: u64, failure: String },
    /// Outcome differs from the prediction
    UnexpectedOutcome {
        step: u64,
        operation: SimulatedOperation,
        expected: Outcome,
        actual: Outcome,
        detail: Option<String>,
    },
    /// Operation succeeded but left an inconsistent result
    WrongResult {
        step: u64,
        operation: SimulatedOperation,
        detail: String,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorStats {
    pub operations: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub non_empty_scope: u64,
    pub root_refused: u64,
    pub dangling: u64,
    pub navigation: u64,
    pub type_errors: u64,
    pub placements_inserted: u64,
    pub placements_removed: u64,
    pub max_focus_depth: usize,
}

impl SimulatorStats {
    fn record(&mut self, outcome: Outcome) {
        self.operations += 1;
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failure(ErrorClass::NonEmptyScope) => self.non_empty_scope += 1,
            Outcome::Failure(ErrorClass::RootRefused) => self.root_refused += 1,
            Outcome::Failure(ErrorClass::Dangling) => self.dangling += 1,
            Outcome::Failure(ErrorClass::Navigation) => self.navigation += 1,
            Outcome::Failure(ErrorClass::Type) => self.type_errors += 1,
        }
    }
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
    /// Placements left in the index, root excluded
    pub final_size: usize,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let stats = &self.stats;
        let mut report = String::new();

        report.push_str("=== MOS Session Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Operations: {}", stats.operations);
        let _ = writeln!(report, "Succeeded: {}", stats.succeeded);
        let _ = writeln!(report, "Skipped: {}", stats.skipped);
        let _ = writeln!(report, "Rejected (non-empty scope): {}", stats.non_empty_scope);
        let _ = writeln!(report, "Rejected (model root): {}", stats.root_refused);
        let _ = writeln!(report, "Dangling references: {}", stats.dangling);
        let _ = writeln!(report, "Navigation failures: {}", stats.navigation);
        let _ = writeln!(report, "Type mismatches: {}", stats.type_errors);
        let _ = writeln!(report, "Placements inserted: {}", stats.placements_inserted);
        let _ = writeln!(report, "Placements removed: {}", stats.placements_removed);
        let _ = writeln!(report, "Max focus depth: {}", stats.max_focus_depth);
        let _ = writeln!(report, "Final index size: {}", self.final_size);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {:?}", i + 1, v);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// References the simulator keeps alive at most
const MAX_HELD_REFS: usize = 64;

/// Mutable state of one simulation run
struct World {
    session: Session,
    known: Vec<PlacementId>,
    refs: Vec<MObjectRef>,
    focus: QueryFocus,
    pushed: Vec<QueryFocus>,
}

impl World {
    fn new(config: &SessionConfig) -> Self {
        let session = Session::new(config.clone());
        let root = session.index().root_id();
        let focus = session.query_focus();
        Self {
            session,
            known: vec![root],
            refs: Vec::new(),
            focus,
            pushed: Vec::new(),
        }
    }

    /// Hold on to an active reference; once full, a random one is replaced
    fn keep_ref(&mut self, reference: MObjectRef, rng: &mut StdRng) {
        if self.refs.len() < MAX_HELD_REFS {
            self.refs.push(reference);
        } else {
            let slot = rng.random_range(0..self.refs.len());
            self.refs[slot] = reference;
        }
    }

    fn pick(&self, slot: usize) -> PlacementId {
        self.known[slot % self.known.len()]
    }

    /// Number of placements removed by clearing `id`, the scope included
    fn subtree_size(&self, id: PlacementId) -> usize {
        let index = self.session.index();
        let mut pending = vec![id];
        let mut count = 0;
        while let Some(current) = pending.pop() {
            count += 1;
            if let Ok(members) = index.get_referrers(current) {
                pending.extend(members.map(Placement::id));
            }
        }
        count
    }
}

/// Run the session simulator
#[must_use]
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut world = World::new(&config.session);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    tracing::info!(
        "Starting simulation: {} operations, seed {}",
        config.operations,
        config.seed
    );

    for step in 0..config.operations {
        let operation = generate_operation(&mut rng, &world);
        let expected = predict_outcome(&operation, &world);
        let (actual, detail) = execute_operation(&operation, &mut world, &mut rng, &mut stats);
        stats.record(actual);
        stats.max_focus_depth = stats.max_focus_depth.max(world.session.focus_depth());

        let before = violations.len();
        if actual != expected && expected != Outcome::Skipped {
            tracing::warn!(
                "Step {}: {:?} gave {:?}, expected {:?}",
                step,
                operation,
                actual,
                expected
            );
            violations.push(Violation::UnexpectedOutcome {
                step,
                operation: operation.clone(),
                expected,
                actual,
                detail: detail.clone(),
            });
        } else if let (Outcome::Success, Some(detail)) = (actual, detail) {
            violations.push(Violation::WrongResult {
                step,
                operation,
                detail,
            });
        }
        if let Err(failure) = world.session.index().verify() {
            tracing::error!("Step {}: {}", step, failure);
            violations.push(Violation::SelfCheck {
                step,
                failure: failure.to_string(),
            });
        }
        if config.stop_on_first_violation && violations.len() > before {
            break;
        }
    }

    tracing::info!(
        "Simulation finished: {} operations, {} violations",
        stats.operations,
        violations.len()
    );
    SimulatorReport {
        final_size: world.session.index().len(),
        config,
        stats,
        violations,
    }
}

/// Generate a random operation
fn generate_operation(rng: &mut StdRng, world: &World) -> SimulatedOperation {
    let slot = rng.random_range(0..world.known.len() * 2);
    match rng.random_range(0..20) {
        0..=6 => SimulatedOperation::Insert {
            parent: slot,
            kind: match rng.random_range(0..4) {
                0 => PlacedKind::Fork,
                1 => PlacedKind::Clip,
                2 => PlacedKind::Effect,
                _ => PlacedKind::Binding,
            },
        },
        7..=9 => SimulatedOperation::Remove { target: slot },
        10 => SimulatedOperation::ClearScope { target: slot },
        11 | 12 => SimulatedOperation::Activate { target: slot },
        13 | 14 => SimulatedOperation::Resolve {
            reference: rng.random_range(0..world.refs.len().max(1)),
        },
        15 | 16 => SimulatedOperation::Navigate { target: slot },
        17 | 18 => SimulatedOperation::PushFocus { target: slot },
        _ => SimulatedOperation::PopFocus,
    }
}

/// Derive the outcome the session must produce
fn predict_outcome(operation: &SimulatedOperation, world: &World) -> Outcome {
    let index = world.session.index();
    let registered = |slot: usize| index.contains(world.pick(slot));
    match operation {
        SimulatedOperation::Insert { parent, .. } => {
            if registered(*parent) {
                Outcome::Success
            } else {
                Outcome::Failure(ErrorClass::Navigation)
            }
        }
        SimulatedOperation::Remove { target } => {
            let id = world.pick(*target);
            if id == index.root_id() {
                Outcome::Failure(ErrorClass::RootRefused)
            } else if index.member_count(id) > 0 {
                Outcome::Failure(ErrorClass::NonEmptyScope)
            } else {
                Outcome::Success
            }
        }
        SimulatedOperation::ClearScope { target }
        | SimulatedOperation::Activate { target }
        | SimulatedOperation::Navigate { target }
        | SimulatedOperation::PushFocus { target } => {
            if registered(*target) {
                Outcome::Success
            } else {
                Outcome::Failure(ErrorClass::Dangling)
            }
        }
        SimulatedOperation::Resolve { reference } => match world.refs.get(*reference) {
            Some(r) if r.id().is_some_and(|id| index.contains(id)) => Outcome::Success,
            Some(_) => Outcome::Failure(ErrorClass::Dangling),
            None => Outcome::Skipped,
        },
        SimulatedOperation::PopFocus => {
            if world.pushed.is_empty() {
                Outcome::Skipped
            } else {
                Outcome::Success
            }
        }
    }
}

/// Execute one operation, returning its outcome and a result complaint
fn execute_operation(
    operation: &SimulatedOperation,
    world: &mut World,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
) -> (Outcome, Option<String>) {
    match operation {
        SimulatedOperation::Insert { parent, kind } => {
            let scope = world.pick(*parent);
            let placement = create_placement(*kind, rng, world);
            let expected_id = placement.id();
            let result = world.session.index_mut().insert(placement, scope);
            let outcome = Outcome::from(&result);
            let complaint = match result {
                Ok(id) => {
                    stats.placements_inserted += 1;
                    world.known.push(id);
                    (id != expected_id).then(|| format!("insert changed identity to {id}"))
                }
                Err(_) => None,
            };
            (outcome, complaint)
        }
        SimulatedOperation::Remove { target } => {
            let id = world.pick(*target);
            let was_registered = world.session.index().contains(id);
            let result = world.session.index_mut().remove(id);
            let complaint = match result {
                Ok(removed) if removed != was_registered => {
                    Some(format!("remove reported {removed} for {id}"))
                }
                Ok(removed) => {
                    stats.placements_removed += u64::from(removed);
                    None
                }
                Err(_) => None,
            };
            (Outcome::from(&result), complaint)
        }
        SimulatedOperation::ClearScope { target } => {
            let id = world.pick(*target);
            let root = world.session.index().root_id();
            let expected = if id == root {
                world.session.index().len()
            } else {
                world.subtree_size(id)
            };
            let result = world.session.index_mut().clear_scope(id);
            let complaint = match result {
                Ok(removed) => {
                    stats.placements_removed += removed as u64;
                    (removed != expected)
                        .then(|| format!("cleared {removed} placements, expected {expected}"))
                }
                Err(_) => None,
            };
            (Outcome::from(&result), complaint)
        }
        SimulatedOperation::Activate { target } => {
            let id = world.pick(*target);
            let mut reference = MObjectRef::<dyn MObject>::new();
            let result = reference.activate(world.session.index(), &id).map(|_| ());
            let complaint = match &result {
                Ok(()) => {
                    let owners = world
                        .session
                        .index()
                        .find(id)
                        .map(Placement::use_count)
                        .unwrap_or_default();
                    let counted = reference.use_count();
                    (counted != owners)
                        .then(|| format!("reference counts {counted} owners, placement {owners}"))
                }
                Err(_) => None,
            };
            if reference.is_active() {
                world.keep_ref(reference, rng);
            }
            (Outcome::from(&result), complaint)
        }
        SimulatedOperation::Resolve { reference } => match world.refs.get(*reference) {
            Some(r) => {
                let result = r.subject(world.session.index()).map(|_| ());
                (Outcome::from(&result), None)
            }
            None => (Outcome::Skipped, None),
        },
        SimulatedOperation::Navigate { target } => {
            let id = world.pick(*target);
            let session = &world.session;
            let result = Scope::new(session.index(), id)
                .and_then(|scope| world.focus.shift(session, scope).map(|_| ()));
            let complaint = result
                .as_ref()
                .ok()
                .and_then(|()| check_focus_leaf(&world.focus, id));
            (Outcome::from(&result), complaint)
        }
        SimulatedOperation::PushFocus { target } => {
            let id = world.pick(*target);
            let session = &world.session;
            let result =
                Scope::new(session.index(), id).and_then(|scope| QueryFocus::push(session, scope));
            let outcome = Outcome::from(&result);
            let complaint = match result {
                Ok(focus) => {
                    let complaint = check_focus_leaf(&focus, id);
                    world.pushed.push(focus);
                    complaint
                }
                Err(_) => None,
            };
            (outcome, complaint)
        }
        SimulatedOperation::PopFocus => match world.pushed.pop() {
            Some(focus) => {
                drop(focus);
                let depth_before = world.session.focus_depth();
                let depth_after = world.session.prune_focus();
                let complaint = (depth_after > world.pushed.len() + 1
                    || depth_after > depth_before)
                    .then(|| format!("focus stack kept {depth_after} frames"));
                (Outcome::Success, complaint)
            }
            None => (Outcome::Skipped, None),
        },
    }
}

fn check_focus_leaf(focus: &QueryFocus, id: PlacementId) -> Option<String> {
    let path = focus.current_path();
    match path.leaf() {
        Ok(leaf) if leaf.id() == Some(id) => None,
        Ok(leaf) => Some(format!("focus ended at {leaf}, expected {}", id.short())),
        Err(e) => Some(e.to_string()),
    }
}

/// Create a placement of the requested kind
fn create_placement(kind: PlacedKind, rng: &mut StdRng, world: &World) -> Placement {
    let n = world.known.len();
    let placement = match kind {
        PlacedKind::Fork => Placement::new(Fork::new(format!("fork-{n}"))),
        PlacedKind::Clip => Placement::new(Clip::new(
            format!("clip-{n}.mov"),
            Time::from_secs(rng.random_range(1..120)),
        )),
        PlacedKind::Effect => Placement::new(Effect::new(format!("effect-{n}"))),
        PlacedKind::Binding => {
            let sequence = world.pick(rng.random_range(0..n));
            Placement::new(Binding::new(sequence))
        }
    };
    placement.located(|pin| {
        pin.fix_at(Time::from_secs(rng.random_range(0..3600)));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_is_reproducible() {
        let config = SimulatorConfig {
            operations: 300,
            ..SimulatorConfig::default()
        };
        let a = run_simulator(config.clone());
        let b = run_simulator(config);
        assert_eq!(a.stats.succeeded, b.stats.succeeded);
        assert_eq!(a.stats.dangling, b.stats.dangling);
        assert_eq!(a.final_size, b.final_size);
    }

    #[test]
    fn default_run_passes() {
        let report = run_simulator(SimulatorConfig {
            operations: 500,
            seed: 7,
            ..SimulatorConfig::default()
        });
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.operations, 500);
        assert!(report.stats.placements_inserted > 0);
    }

    #[test]
    fn held_references_are_bounded() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = World::new(&SessionConfig::default());
        let mut stats = SimulatorStats::default();
        let activate = SimulatedOperation::Activate { target: 0 };
        for _ in 0..MAX_HELD_REFS * 3 {
            let (outcome, complaint) =
                execute_operation(&activate, &mut world, &mut rng, &mut stats);
            assert_eq!(outcome, Outcome::Success);
            assert_eq!(complaint, None);
        }
        assert_eq!(world.refs.len(), MAX_HELD_REFS);
        let root = world.session.index().root();
        assert_eq!(root.use_count(), MAX_HELD_REFS + 1);
    }

    #[test]
    fn popping_focus_releases_frames() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = World::new(&SessionConfig::default());
        let mut stats = SimulatorStats::default();
        let push = SimulatedOperation::PushFocus { target: 0 };
        for _ in 0..3 {
            execute_operation(&push, &mut world, &mut rng, &mut stats);
        }
        assert_eq!(world.session.focus_depth(), 4);
        let (outcome, complaint) =
            execute_operation(&SimulatedOperation::PopFocus, &mut world, &mut rng, &mut stats);
        assert_eq!((outcome, complaint), (Outcome::Success, None));
        assert_eq!(world.session.focus_depth(), 3);
    }

    #[test]
    fn error_classes() {
        let id = PlacementId::fresh();
        assert_eq!(
            ErrorClass::from(&SessionError::NonEmptyScope { id, members: 1 }),
            ErrorClass::NonEmptyScope
        );
        assert_eq!(
            ErrorClass::from(&SessionError::NotInSession { id }),
            ErrorClass::Dangling
        );
        assert_eq!(
            ErrorClass::from(&SessionError::InvalidScope("x".into())),
            ErrorClass::Navigation
        );
    }

    #[test]
    fn report_serialises() {
        let report = run_simulator(SimulatorConfig {
            operations: 20,
            ..SimulatorConfig::default()
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stats"]["operations"], 20);
        assert!(report.generate_text().contains("Result: PASS"));
    }
}
