//! MOS simulator
//!
//! Seeded workload generator for the session store, plus helpers to build
//! and print scope trees.
//!
//! ```rust
//! use mos_sim::{run_simulator, SimulatorConfig};
//!
//! let report = run_simulator(SimulatorConfig {
//!     operations: 200,
//!     ..SimulatorConfig::default()
//! });
//! assert!(report.passed());
//! ```

pub mod simulator;
pub mod tree;

pub use simulator::{
    run_simulator, ErrorClass, Outcome, PlacedKind, SimulatedOperation, SimulatorConfig,
    SimulatorReport, SimulatorStats, Violation,
};
pub use tree::{build_tree, render_tree, tree_size, TreeError, MAX_TREE_SIZE};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if running with strict debugging enabled
#[must_use]
pub const fn strict_debug() -> bool {
    cfg!(feature = "strict-debug")
}
