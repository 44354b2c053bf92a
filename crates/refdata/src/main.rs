use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refdata::seed::seed_demo_data;
use refdata::{AppState, Config};
use refdata_core::aggregate::{Aggregate, LifecycleError};
use refdata_core::events::{EventEnvelope, Mutation};
use refdata_core::geography::{Country, CountryCriteria, RegionCriteria};

/// How long the CLI waits for each published event to come back.
const EVENT_WAIT: Duration = Duration::from_secs(2);

/// refdata - Query and maintain reference data
#[derive(Parser, Debug)]
#[command(name = "refdata")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List countries
    Countries {
        /// Exact country code
        #[arg(long)]
        code: Option<String>,
        /// Case-insensitive name fragment
        #[arg(long)]
        name: Option<String>,
        /// Status filter (defaults to enabled only)
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10, env = "REFDATA_PAGE_SIZE")]
        size: u32,
        /// Navigations to eager-load (e.g. `regions`)
        #[arg(long)]
        include: Vec<String>,
    },
    /// List regions
    Regions {
        #[arg(long)]
        code: Option<String>,
        /// Code of the owning country
        #[arg(long)]
        country_code: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10, env = "REFDATA_PAGE_SIZE")]
        size: u32,
    },
    /// Disable a country that has no live regions
    DisableCountry { code: String },
    /// Re-enable a disabled country
    ActivateCountry { code: String },
}

/// Result of a command, with the events it dispatched.
#[derive(Serialize)]
struct CommandOutput<A> {
    changed: bool,
    state: A,
    events: Vec<EventEnvelope>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling");
                cancel.cancel();
            }
        }
    });

    let config = Config::from_env();
    let state = AppState::from_config(&config)
        .await
        .context("failed to initialize application state")?;

    seed_demo_data(&state, &cancel)
        .await
        .context("failed to seed demo data")?;

    let output = run(&state, cli.command, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "refdata=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(
    state: &AppState,
    command: Command,
    cancel: &CancellationToken,
) -> Result<serde_json::Value> {
    let value = match command {
        Command::Countries {
            code,
            name,
            enabled,
            page,
            size,
            include,
        } => {
            let criteria = CountryCriteria {
                code,
                name,
                is_enabled: enabled,
                page_number: page,
                page_size: size,
                ..Default::default()
            };
            let includes: Vec<&str> = include.iter().map(String::as_str).collect();
            let result = state
                .countries
                .fetch_page(&criteria, &includes, cancel)
                .await?;
            serde_json::to_value(result)?
        }
        Command::Regions {
            code,
            country_code,
            page,
            size,
        } => {
            let country_id = match country_code {
                Some(country_code) => Some(country_by_code(state, &country_code, cancel).await?.id),
                None => None,
            };
            let criteria = RegionCriteria {
                code,
                country_id,
                page_number: page,
                page_size: size,
                ..Default::default()
            };
            let result = state.regions.fetch_page(&criteria, &[], cancel).await?;
            serde_json::to_value(result)?
        }
        Command::DisableCountry { code } => {
            let country = country_by_code(state, &code, cancel).await?;
            let mut events = state.events.subscribe(Country::CACHE_PREFIX).await?;
            let mutation = state.countries.disable(country.id, cancel).await?;
            serde_json::to_value(output(mutation, &mut events).await)?
        }
        Command::ActivateCountry { code } => {
            let country = country_by_code(state, &code, cancel).await?;
            let mut events = state.events.subscribe(Country::CACHE_PREFIX).await?;
            let mutation = state.countries.activate(country.id, cancel).await?;
            serde_json::to_value(output(mutation, &mut events).await)?
        }
    };

    Ok(value)
}

async fn country_by_code(
    state: &AppState,
    code: &str,
    cancel: &CancellationToken,
) -> Result<Country> {
    let country = state
        .countries
        .find_by_natural_key(code, cancel)
        .await?
        .ok_or_else(|| LifecycleError::NotFound {
            entity_type: Country::ENTITY,
            id: code.to_string(),
        })?;
    Ok(country)
}

/// Collects the events the mutation published, waiting briefly for each.
async fn output<A: Aggregate>(
    mutation: Mutation<A>,
    events: &mut broadcast::Receiver<EventEnvelope>,
) -> CommandOutput<A> {
    let expected = mutation.events.len();
    let mut dispatched = Vec::with_capacity(expected);
    while dispatched.len() < expected {
        match tokio::time::timeout(EVENT_WAIT, events.recv()).await {
            Ok(Ok(event)) => dispatched.push(event),
            Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                tracing::warn!(skipped, "Event receiver lagged");
            }
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => {
                tracing::warn!(
                    expected,
                    received = dispatched.len(),
                    "Not every published event was observed"
                );
                break;
            }
        }
    }

    CommandOutput {
        changed: mutation.is_changed(),
        state: mutation.aggregate,
        events: dispatched,
    }
}
