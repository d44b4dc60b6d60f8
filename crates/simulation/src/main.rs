use anyhow::Context;
use bootstrap_core::EngineConfig;
use bootstrap_simulation::Scenario;
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioArg {
    All,
    PriceImpact,
    MaxTrade,
    MultiVenue,
    FeeDecay,
    SkewFee,
}

impl ScenarioArg {
    fn scenarios(self) -> Vec<Scenario> {
        match self {
            ScenarioArg::All => Scenario::ALL.to_vec(),
            ScenarioArg::PriceImpact => vec![Scenario::PriceImpact],
            ScenarioArg::MaxTrade => vec![Scenario::MaxTrade],
            ScenarioArg::MultiVenue => vec![Scenario::MultiVenue],
            ScenarioArg::FeeDecay => vec![Scenario::FeeDecay],
            ScenarioArg::SkewFee => vec![Scenario::SkewFee],
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bootstrap-sim")]
#[command(about = "Replay router, vault and fee curve scenarios against the in-memory engine")]
struct Args {
    /// Scenario to run
    #[arg(short, long, value_enum, default_value = "all")]
    scenario: ScenarioArg,

    /// Engine configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => EngineConfig::default(),
    };
    info!(scenario = ?args.scenario, "starting simulation");

    for scenario in args.scenario.scenarios() {
        let table = scenario.run(&config)?;
        println!("{table}");
    }
    Ok(())
}
