use clap::{Parser, Subcommand, ValueEnum};
use rxrisk_engine::{AnalysisRequest, EngineConfig, RiskEngine, RiskReport, Sense, SolutionStatus};
use rxrisk_solver::{ExactSearch, SimulatedAnnealing};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rxrisk")]
#[command(about = "Drug-interaction risk optimizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Safest combination
    Min,
    /// Most dangerous combination
    Max,
    /// Whatever the request file asks for
    Request,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(clap::Args)]
struct SolverArgs {
    /// Largest drug count solved by exhaustive search
    #[arg(long, default_value_t = 10)]
    exact_threshold: usize,
    /// Hard limit on exhaustive search size
    #[arg(long, default_value_t = 24)]
    exact_limit: usize,
    /// Seed for the annealing search
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Annealing sweeps per restart
    #[arg(long, default_value_t = 500)]
    sweeps: usize,
    /// Annealing restarts
    #[arg(long, default_value_t = 8)]
    restarts: usize,
}

impl SolverArgs {
    fn engine(&self) -> RiskEngine {
        RiskEngine::new(
            EngineConfig::default()
                .with_exact_threshold(self.exact_threshold)
                .with_exact(ExactSearch::new().with_max_variables(self.exact_limit))
                .with_annealing(
                    SimulatedAnnealing::new()
                        .with_seed(self.seed)
                        .with_sweeps(self.sweeps)
                        .with_restarts(self.restarts),
                ),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find the optimal drug combination for a request file
    Analyze {
        /// JSON request file
        file: PathBuf,
        /// Optimization direction
        #[arg(short, long, value_enum, default_value_t = Mode::Request)]
        mode: Mode,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Validate a request file
    Check {
        /// JSON request file
        file: PathBuf,
    },
    /// Print the objective matrix built from a request file
    Qubo {
        /// JSON request file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { file, mode, format, solver } => {
            let mut request = read_request(&file);
            match mode {
                Mode::Min => request.sense = Sense::Minimize,
                Mode::Max => request.sense = Sense::Maximize,
                Mode::Request => {}
            }

            let report = match solver.engine().run(&request) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Invalid request: {}", e);
                    std::process::exit(1);
                }
            };

            if format == Format::Json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing report: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print_report(&report);
            }
        }
        Commands::Check { file } => {
            let request = read_request(&file);
            let engine = RiskEngine::default();

            match engine.instance(&request) {
                Ok(instance) => {
                    let params = instance.params();
                    println!("✓ {} is valid", file.display());
                    println!("  {} drugs", instance.num_drugs());
                    println!("  {} interactions", instance.interactions().len());
                    println!("  patient modifier {}", params.patient_modifier);
                    println!("  target count {}", params.target_count);
                    println!("  penalty strength {}", params.penalty_strength);

                    for drug in &request.drugs {
                        if rxrisk_engine::parse_dose_mg(&drug.dose).is_none() {
                            println!("  warning: no numeric dose for {}", drug.name);
                        }
                        if engine.encoder().time_table().get(&drug.time).is_none() {
                            println!("  warning: unrecognized time {:?} for {}", drug.time, drug.name);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Qubo { file, format } => {
            let request = read_request(&file);
            let engine = RiskEngine::default();

            let q = match engine.qubo(&request) {
                Ok(q) => q,
                Err(e) => {
                    eprintln!("Invalid request: {}", e);
                    std::process::exit(1);
                }
            };

            if format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&q.to_rows()).unwrap_or_else(|_| "[]".to_string()));
            } else {
                let names: Vec<&str> = request.drugs.iter().map(|d| d.name.as_str()).collect();
                print!("{:>14}", "");
                for name in &names {
                    print!(" {:>12}", truncate(name, 12));
                }
                println!();
                for (i, name) in names.iter().enumerate() {
                    print!("{:>14}", truncate(name, 14));
                    for value in q.row(i) {
                        print!(" {:>12.4}", value);
                    }
                    println!();
                }
            }
        }
    }
}

fn read_request(file: &Path) -> AnalysisRequest {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str::<AnalysisRequest>(&source) {
        Ok(r) => {
            log::debug!("loaded {} drugs from {}", r.drugs.len(), file.display());
            r
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn truncate(name: &str, width: usize) -> &str {
    match name.char_indices().nth(width) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

fn print_report(report: &RiskReport) {
    let heading = match report.sense {
        Sense::Minimize => "Safest combination",
        Sense::Maximize => "Most dangerous combination",
    };
    println!("{}", heading);
    println!();

    match report.status {
        SolutionStatus::Exact => println!("Status: EXACT"),
        SolutionStatus::Approximate => println!("Status: APPROXIMATE (heuristic search)"),
        SolutionStatus::Fallback => println!("Status: FALLBACK (search unavailable, full regimen assumed)"),
    }
    println!("Objective: {:.4}", report.objective_value);
    println!("Interaction risk: {:.4}", report.risk);
    println!("Penalized risk: {:.4}", report.penalized_risk);
    println!("Risk level: {}", report.risk_level);
    println!("Safety score: {}/100", report.safety_score);
    println!();

    println!("Drugs:");
    for decision in &report.assignment {
        let mark = if decision.active { "active" } else { "-" };
        println!("  {:20} {}", decision.name, mark);
    }
}
