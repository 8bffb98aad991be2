//! GeoAR DST Simulator CLI
//!
//! Run deterministic simulation tests against field-condition scenarios.

use clap::Parser;
use geoar_core::ProviderConfig;
use geoar_sim::{ScenarioId, ScenarioResult, ScenarioRunner, SimError};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Ticks between exported frames.
const EXPORT_INTERVAL_TICKS: u64 = 10;

/// GeoAR Deterministic Simulation Testing CLI
#[derive(Parser, Debug)]
#[command(name = "geoar-sim")]
#[command(about = "Run deterministic simulation tests for the GeoAR location provider", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (city_walk, cold_start_timeout, gps_denied, noisy_fix, north_crossing, path_follow, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Walk duration in seconds
    #[arg(short, long, default_value = "60")]
    duration: f64,

    /// Frame rate in Hz
    #[arg(long, default_value = "30")]
    tick_rate: u32,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export simulation frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Provider configuration (JSON) to use instead of the defaults
    #[arg(long)]
    provider_config: Option<String>,
}

fn parse_scenarios(arg: &str) -> Result<Vec<ScenarioId>, SimError> {
    if arg == "all" {
        return Ok(ScenarioId::all());
    }
    let id = arg
        .parse::<ScenarioId>()
        .map_err(|_| SimError::UnknownScenario(arg.to_string()))?;
    Ok(vec![id])
}

fn load_provider_config(path: Option<&str>) -> Result<Option<ProviderConfig>, SimError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(path)?;
    Ok(Some(ProviderConfig::from_json_str(&json)?))
}

fn runner_for(args: &Args, seed: u64, provider: &Option<ProviderConfig>) -> ScenarioRunner {
    let runner = ScenarioRunner::new(seed)
        .with_duration(args.duration)
        .with_tick_rate(args.tick_rate);
    match provider {
        Some(config) => runner.with_provider_config(config.clone()),
        None => runner,
    }
}

fn base_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

fn report(result: &ScenarioResult) {
    if result.passed {
        info!("✓ {} (seed={}) PASSED", result.scenario.name(), result.seed);
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

async fn run_export(
    args: &Args,
    scenarios: &[ScenarioId],
    seed: u64,
    provider: &Option<ProviderConfig>,
    path: &str,
) -> Result<bool, SimError> {
    let [scenario] = scenarios else {
        return Err(SimError::InvalidArgument(
            "--export only supports a single scenario, not 'all'".to_string(),
        ));
    };

    info!("Running with export to: {}", path);

    let runner = runner_for(args, seed, provider);
    let (result, export) = runner.run_with_export(*scenario, EXPORT_INTERVAL_TICKS).await;

    export.write_to_file(path)?;
    info!("Exported {} frames to {}", export.frames.len(), path);

    report(&result);
    Ok(result.passed)
}

async fn run(args: Args) -> Result<bool, SimError> {
    if !args.json {
        info!("GeoAR DST Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios = parse_scenarios(&args.scenario)?;
    let seed = base_seed(args.seed);
    let provider = load_provider_config(args.provider_config.as_deref())?;

    if let Some(path) = &args.export {
        return run_export(&args, &scenarios, seed, &provider, path).await;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();

    for seed_offset in 0..args.seeds {
        let runner = runner_for(&args, seed.wrapping_add(seed_offset as u64), &provider);

        for scenario in &scenarios {
            let result = runner.run(*scenario).await;
            if !args.json {
                report(&result);
            }
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed: Vec<&ScenarioResult> = all_results.iter().filter(|r| !r.passed).collect();

    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed.len(),
            "failed": failed.len(),
            "results": all_results,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed.is_empty() {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed.len(), total);
            for result in &failed {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    Ok(failed.is_empty())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            if matches!(e, SimError::UnknownScenario(_)) {
                eprintln!(
                    "Available scenarios: {}, all",
                    ScenarioId::all()
                        .iter()
                        .map(|s| s.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            std::process::exit(1);
        }
    }
}
