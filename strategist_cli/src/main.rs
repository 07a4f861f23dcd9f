use strategist_core::config::{DistributionSettings, StrategistConfig};
use strategist_core::selection::SelectionMethod;
use strategist_core::selector::{Selection, StrategySelector};
use strategist_core::store::{DistributionStore, InMemoryDistributionStore, JsonFileDistributionStore};
use strategist_core::{PoolOrigin, StrategyId};

use clap::Parser;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    /// JSON distribution snapshot; overrides `[distribution] path`.
    #[clap(short, long)]
    distribution: Option<PathBuf>,
    #[clap(short, long)]
    engine: Option<String>,
    /// Selection method, e.g. `default` or `multi_armed_bandit_medium`. Enables bandit mode.
    #[clap(short, long)]
    method: Option<String>,
    #[clap(long, default_value_t = 0)]
    seed: u64,
    #[clap(short = 'n', long, default_value_t = 1)]
    sessions: u64,
    /// Print one JSON object per session.
    #[clap(long)]
    json: bool,
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct SessionReport<'a> {
    session: u64,
    engine: &'static str,
    method: &'static str,
    origin: String,
    snapshot: Option<&'a str>,
    enabled: Vec<&'static str>,
}

fn origin_label(origin: &PoolOrigin) -> String {
    match origin {
        PoolOrigin::Default => "default".to_string(),
        PoolOrigin::Degraded(reason) => format!("degraded ({reason})"),
        PoolOrigin::Drawn { index, combination } => format!("drawn #{index} [{combination}]"),
    }
}

fn report_session(session: u64, selection: &Selection, json: bool) -> Result<(), anyhow::Error> {
    let pool = &selection.weighted.pool;
    let report = SessionReport {
        session,
        engine: pool.catalog().name(),
        method: selection.method.name(),
        origin: origin_label(selection.origin()),
        snapshot: selection.snapshot.as_deref(),
        enabled: pool.enabled_ids().iter().map(|id| id.tag()).collect(),
    };
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "Session {}: {} -> [{}]",
            report.session,
            report.origin,
            report.enabled.join(", ")
        );
    }
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match cli.config_file {
        Some(config_path) => {
            tracing::info!("Loading configuration from specified path: {config_path:?}");
            StrategistConfig::load_from_file(&config_path)?
        }
        None => {
            let default_config_path = PathBuf::from("strategist.toml");
            if default_config_path.exists() {
                tracing::info!(
                    "No config file specified via CLI, loading default: {default_config_path:?}"
                );
                StrategistConfig::load_from_file(&default_config_path)?
            } else {
                tracing::info!(
                    "No config file specified and default 'strategist.toml' not found, using built-in defaults."
                );
                StrategistConfig::default()
            }
        }
    };

    if let Some(engine) = cli.engine {
        config.selection.engine = engine;
    }
    if let Some(method) = cli.method {
        config.selection.method = method.parse::<SelectionMethod>()?;
        config.selection.use_bandit = true;
    }
    if let Some(path) = cli.distribution {
        config.distribution = Some(DistributionSettings { path: Some(path) });
    }
    config.validate()?;

    tracing::debug!("Effective configuration: {config:#?}");

    let selector = StrategySelector::from_config(&config)?;
    let store: Box<dyn DistributionStore> = match config.distribution_path() {
        Some(path) => Box::new(JsonFileDistributionStore::new(path)),
        None => {
            if matches!(selector.method(), SelectionMethod::Bandit(_)) {
                tracing::warn!("Bandit selection requested without a distribution file");
            }
            Box::new(InMemoryDistributionStore::new())
        }
    };

    tracing::info!(
        engine = selector.catalog().name(),
        method = %selector.method(),
        sessions = cli.sessions,
        seed = cli.seed,
        "Generating strategy pools"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let start_time = Instant::now();
    let mut origins: BTreeMap<&'static str, u64> = BTreeMap::new();
    let mut enabled_counts: BTreeMap<StrategyId, u64> = BTreeMap::new();

    for session in 0..cli.sessions {
        let selection = selector.select(store.as_ref(), &mut rng)?;
        let kind = match selection.origin() {
            PoolOrigin::Default => "default",
            PoolOrigin::Degraded(_) => "degraded",
            PoolOrigin::Drawn { .. } => "drawn",
        };
        *origins.entry(kind).or_default() += 1;
        for id in selection.weighted.pool.enabled_ids() {
            *enabled_counts.entry(*id).or_default() += 1;
        }
        report_session(session, &selection, cli.json)?;
    }

    let elapsed_total = start_time.elapsed();
    if !cli.json {
        println!("\nGenerated {} pools in {elapsed_total:.2?}.", cli.sessions);
        println!("Origins: {origins:?}");
        for id in selector.catalog().strategies() {
            let count = enabled_counts.get(id).copied().unwrap_or(0);
            let share = if cli.sessions > 0 {
                count as f64 / cli.sessions as f64
            } else {
                0.0
            };
            println!("  {:<26} {:>8} ({:.3})", id.tag(), count, share);
        }
    }

    Ok(())
}
