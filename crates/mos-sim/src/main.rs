use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use mos_session::{Session, SessionConfig};
use mos_sim::{build_tree, render_tree, run_simulator, SimulatorConfig};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("mos-sim")
        .version(mos_sim::VERSION)
        .about("Session store simulator and scope-tree explorer")
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Run a seeded random workload against a session")
                .arg(
                    Arg::new("ops")
                        .long("ops")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Session configuration file (JSON)"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("certify")
                .about("Run the simulator over a range of seeds")
                .arg(
                    Arg::new("seeds")
                        .long("seeds")
                        .default_value("32")
                        .value_parser(value_parser!(u64))
                        .help("Number of seeds to run"),
                )
                .arg(
                    Arg::new("ops")
                        .long("ops")
                        .default_value("500")
                        .value_parser(value_parser!(u64))
                        .help("Operations per seed"),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Build and print a regular scope tree")
                .arg(
                    Arg::new("depth")
                        .long("depth")
                        .default_value("3")
                        .value_parser(value_parser!(usize))
                        .help("Levels below the root"),
                )
                .arg(
                    Arg::new("width")
                        .long("width")
                        .default_value("2")
                        .value_parser(value_parser!(usize))
                        .help("Members per scope"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let session = match args.get_one::<PathBuf>("config") {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    SessionConfig::from_json(&text)
                        .with_context(|| format!("loading {}", path.display()))?
                }
                None => SessionConfig::default(),
            };
            let config = SimulatorConfig {
                seed: *args.get_one::<u64>("seed").unwrap_or(&42),
                operations: *args.get_one::<u64>("ops").unwrap_or(&1000),
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                session,
            };

            let report = run_simulator(config);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("certify", args)) => {
            let seeds = *args.get_one::<u64>("seeds").unwrap_or(&32);
            let operations = *args.get_one::<u64>("ops").unwrap_or(&500);

            println!("Running certification over {seeds} seeds...");
            let mut failed = Vec::new();
            for seed in 0..seeds {
                let report = run_simulator(SimulatorConfig {
                    seed,
                    operations,
                    ..SimulatorConfig::default()
                });
                if !report.passed() {
                    failed.push((seed, report.violations.len()));
                }
            }
            for (seed, violations) in &failed {
                println!("  seed {seed}: {violations} violations");
            }
            println!(
                "Status: {}",
                if failed.is_empty() { "PASSED" } else { "FAILED" }
            );
            std::process::exit(if failed.is_empty() { 0 } else { 1 });
        }
        Some(("tree", args)) => {
            let depth = *args.get_one::<usize>("depth").unwrap_or(&3);
            let width = *args.get_one::<usize>("width").unwrap_or(&2);

            let mut session = Session::default();
            build_tree(session.index_mut(), depth, width)?;
            print!("{}", render_tree(session.index()));
            println!("{} placements below the root", session.index().len());
        }
        _ => {}
    }
    Ok(())
}
