use clap::{Parser, Subcommand};
use obsrest_core::model::Obs;
use obsrest_core::{
    default_registry, obs_by_encounter, obs_by_patient, pipeline, project, CoreConfig,
    PagingContext, Representation, RequestContext,
};
use obsrest_store::{load_seed_file, MemoryStore};
use obsrest_types::NonEmptyText;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "obsrest")]
#[command(about = "Observation representation CLI over a seeded in-memory store")]
struct Cli {
    /// YAML seed file to load before running the command
    #[arg(long, env = "OBSREST_SEED")]
    seed: Option<PathBuf>,

    /// Representation to print: ref, default or full
    #[arg(long, short = 'v', default_value = "default")]
    representation: String,

    /// Locale used for display strings and values (e.g. en_GB)
    #[arg(long)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one observation
    Get {
        /// Observation UUID
        uuid: String,
    },
    /// Free-text search over concept name, person name and comment
    Search {
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// List a patient's observations
    ByPatient {
        /// Patient UUID
        uuid: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// List the observations of an encounter
    ByEncounter {
        /// Encounter UUID
        uuid: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Create an observation from a JSON object of properties and print the result
    Create {
        /// e.g. '{"person": "...", "concept": "...", "obsDatetime": "...", "value": "5"}'
        json: String,
    },
    /// Void an observation, or purge it with --purge
    Delete {
        /// Observation UUID
        uuid: String,
        /// Void reason
        #[arg(long, default_value = obsrest_core::constants::DEFAULT_VOID_REASON)]
        reason: String,
        /// Remove permanently instead of voiding
        #[arg(long)]
        purge: bool,
    },
}

#[derive(clap::Args)]
struct PageArgs {
    #[arg(long)]
    start_index: Option<usize>,
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("obsrest_cli=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'obsrest --help' for commands");
        return Ok(());
    };

    let config = CoreConfig::from_lookup(|name| std::env::var(name).ok())?;
    let store = match &cli.seed {
        Some(path) => load_seed_file(path)?,
        None => {
            tracing::warn!("no seed file given; the store is empty");
            MemoryStore::new()
        }
    };

    let output = run(
        command,
        &config,
        Arc::new(store),
        &cli.representation,
        cli.locale.as_deref(),
    )?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Executes `command` against `store` and returns the JSON to print.
fn run(
    command: Commands,
    config: &CoreConfig,
    store: Arc<MemoryStore>,
    representation: &str,
    locale: Option<&str>,
) -> anyhow::Result<Value> {
    let registry = default_registry()?;
    let services = store.services();
    let representation = Representation::parse(representation)?;
    let mut ctx = RequestContext::new(config, &registry, &services)
        .with_representation(representation);
    if let Some(locale) = locale {
        ctx = ctx.with_locale(obsrest_types::Locale::parse(locale)?);
    }

    let value = match command {
        Commands::Get { uuid } => {
            let obs = pipeline::retrieve::<Obs>(&uuid, &ctx)?;
            Value::Object(project(&obs, representation, &ctx)?)
        }
        Commands::Search { query, page } => {
            let ctx = paged(ctx, &page, config)?;
            Value::Object(pipeline::search::<Obs>(&query, &ctx)?.to_simple_object(&ctx)?)
        }
        Commands::ByPatient { uuid, page } => {
            let ctx = paged(ctx, &page, config)?;
            Value::Object(obs_by_patient(&uuid, &ctx)?.to_simple_object(&ctx)?)
        }
        Commands::ByEncounter { uuid, page } => {
            let ctx = paged(ctx, &page, config)?;
            Value::Object(obs_by_encounter(&uuid, &ctx)?.to_simple_object(&ctx)?)
        }
        Commands::Create { json } => {
            let Value::Object(input) = serde_json::from_str::<Value>(&json)? else {
                anyhow::bail!("create expects a JSON object");
            };
            let created = pipeline::create::<Obs>(&input, &ctx)?;
            Value::Object(project(&created, representation, &ctx)?)
        }
        Commands::Delete {
            uuid,
            reason,
            purge,
        } => {
            let obs = pipeline::retrieve::<Obs>(&uuid, &ctx)?;
            if purge {
                pipeline::purge(&obs, &ctx)?;
                json!({ "uuid": uuid, "purged": true })
            } else {
                pipeline::delete(&obs, &NonEmptyText::new(&reason)?, &ctx)?;
                json!({ "uuid": uuid, "voided": true, "reason": reason })
            }
        }
    };
    Ok(value)
}

/// Applies the requested window to `ctx`; listings always report the total count.
fn paged<'a>(
    ctx: RequestContext<'a>,
    page: &PageArgs,
    config: &CoreConfig,
) -> anyhow::Result<RequestContext<'a>> {
    let paging = PagingContext::from_request(page.start_index, page.limit, config)?;
    Ok(ctx.with_paging(paging).with_total_count(true))
}
