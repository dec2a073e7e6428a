//! Philo CLI
//!
//! Run the dining philosophers on threads or on processes.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use philo_core::{Outcome, PhilosopherId, Rules, StopFlag};
use philo_env::RunId;
use philo_sim::{
    exit_code, run_threads, run_unit, signals, Launcher, Model, RunReport, ScenarioId,
    ScenarioResult, TimeLimit, UnitSpec,
};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Dining philosophers simulation
#[derive(Parser, Debug)]
#[command(name = "philo")]
#[command(about = "Simulate the dining philosophers on threads or processes", long_about = None)]
struct Args {
    /// Number of philosophers and forks (1-200)
    number_of_philosophers: Option<u64>,

    /// Milliseconds a philosopher survives without starting a meal
    time_to_die: Option<u64>,

    /// Milliseconds a meal takes
    time_to_eat: Option<u64>,

    /// Milliseconds of sleep after a meal
    time_to_sleep: Option<u64>,

    /// Stop once every philosopher has eaten this many times
    number_of_times_each_philosopher_must_eat: Option<u64>,

    /// Execution model
    #[arg(short, long, value_enum, default_value_t = Model::Threads)]
    model: Model,

    /// Run a named preset instead of positional arguments
    #[arg(short = 'S', long, conflicts_with = "number_of_philosophers")]
    scenario: Option<ScenarioId>,

    /// List the presets and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Stop after this many seconds; outliving it counts as survival
    /// (presets default to their own limit)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Do not stretch the think phase on odd tables
    #[arg(long)]
    no_odd_balance: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report: Option<String>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Run as philosopher N of a process launch
    #[arg(long, hide = true, requires_all = ["epoch_us", "run_id"])]
    unit: Option<u32>,

    /// Launch time on the monotonic clock, in microseconds
    #[arg(long, hide = true)]
    epoch_us: Option<u64>,

    /// Run whose semaphores to attach to
    #[arg(long, hide = true)]
    run_id: Option<RunId>,
}

impl Args {
    fn rules(&self) -> Result<Rules, String> {
        let rules = match self.scenario {
            Some(scenario) => scenario.rules(),
            None => match (
                self.number_of_philosophers,
                self.time_to_die,
                self.time_to_eat,
                self.time_to_sleep,
            ) {
                (Some(n), Some(die), Some(eat), Some(sleep)) => Rules::new(
                    n,
                    die,
                    eat,
                    sleep,
                    self.number_of_times_each_philosopher_must_eat,
                ),
                _ => return Err("expected 4 or 5 arguments".to_string()),
            },
        };
        rules
            .map(|rules| rules.with_odd_balance(!self.no_odd_balance))
            .map_err(|e| e.to_string())
    }

    fn time_limit(&self) -> Result<Option<Duration>, String> {
        match self.duration {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(limit) if !limit.is_zero() => Ok(Some(limit)),
                _ => Err(format!("duration must be a positive number of seconds (got {secs})")),
            },
            None => Ok(self.scenario.map(|scenario| scenario.time_limit())),
        }
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", Args::command().render_usage());
    process::exit(1);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprint!("{}", e);
            process::exit(1);
        }
    };

    init_logging(args.verbose);

    if args.list_scenarios {
        for scenario in ScenarioId::all() {
            println!("{:<14} {}", scenario.name(), scenario.description());
        }
        return;
    }

    let rules = args.rules().unwrap_or_else(|e| usage_error(&e));

    // Child process: one philosopher of a process launch.
    if let (Some(number), Some(epoch_us), Some(run_id)) = (args.unit, args.epoch_us, args.run_id) {
        let id = PhilosopherId::new(number)
            .filter(|id| id.index() < rules.philosophers())
            .unwrap_or_else(|| usage_error("unit number out of range"));
        let spec = UnitSpec {
            id,
            epoch: Duration::from_micros(epoch_us),
            run_id,
        };
        process::exit(run_unit(rules, &spec).code());
    }

    let time_limit = args.time_limit().unwrap_or_else(|e| usage_error(&e));

    let stop = Arc::new(StopFlag::new());
    if let Err(e) = signals::install(Arc::clone(&stop)) {
        warn!("Interrupts will not stop the run cleanly: {}", e);
    }
    let limit = time_limit.map(|limit| {
        TimeLimit::start(Arc::clone(&stop), limit).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        })
    });

    info!(model = %args.model, "starting simulation");
    let started = Instant::now();
    let result = match args.model {
        Model::Threads => {
            run_threads(rules.clone(), Arc::clone(&stop)).map(|run| (run.outcome, Some(run.meals)))
        }
        Model::Processes => Launcher::current(rules.clone())
            .and_then(|launcher| launcher.verbose(args.verbose).run(&stop))
            .map(|outcome| (outcome, None)),
    };

    let (outcome, meals) = match result {
        Ok(finished) => finished,
        Err(e) => {
            error!("Simulation failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let outcome = match outcome {
        Outcome::Interrupted if limit.as_ref().is_some_and(TimeLimit::reached) => Outcome::Survived,
        other => other,
    };
    info!(%outcome, "simulation finished");

    let verdict = args
        .scenario
        .map(|scenario| ScenarioResult::evaluate(scenario, &outcome));
    if let Some(result) = &verdict {
        if result.passed {
            info!("✓ {} PASSED ({})", result.scenario.name(), outcome);
        } else {
            error!(
                "✗ {} FAILED: {}",
                result.scenario.name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
    }
    let failed = outcome != Outcome::Interrupted && verdict.as_ref().is_some_and(|r| !r.passed);

    if let Some(path) = &args.report {
        let report = RunReport {
            model: args.model,
            scenario: verdict,
            rules,
            outcome,
            wall_time_ms: started.elapsed().as_millis() as u64,
            meals,
        };
        if let Err(e) = report.write_to_file(path) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    if failed {
        process::exit(1);
    }
    process::exit(exit_code(&outcome));
}
