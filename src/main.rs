//! CLI entry point for the collection factory.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use collection_factory::collection::read_collections;
use collection_factory::collector::parse_collection_id;
use collection_factory::{
    CollectorClient, CollectorFilter, Gateway, GatewayConfig, IgnorePolicy, OsuApi, OutputTarget,
    run_collector_pipeline, run_file_pipeline,
};
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::{Args, CollectorArgs, Command, FileArgs, InspectArgs, OutputArgs};

/// Collection name used when neither the CLI nor the config file gives one.
const DEFAULT_COLLECTION_NAME: &str = "collection";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let file_config = app_config::load_file_config(args.config.as_deref());

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let config_level = file_config
        .as_ref()
        .ok()
        .and_then(Option::as_ref)
        .and_then(|cfg| cfg.verbosity)
        .map_or("info", |verbosity| verbosity.level());
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => config_level,
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        verbose = args.verbose,
        quiet = args.quiet,
        config = ?args.config,
        "CLI arguments parsed"
    );
    let file_config = file_config?.unwrap_or_default();

    match args.command {
        Command::File(file_args) => run_file(file_args, &file_config).await,
        Command::Collector(collector_args) => run_collector(collector_args, &file_config).await,
        Command::Inspect(inspect_args) => run_inspect(&inspect_args),
    }
}

fn output_target(output: &OutputArgs, file_config: &FileConfig) -> Result<OutputTarget> {
    let name = output
        .name
        .as_deref()
        .or(file_config.collection_name.as_deref())
        .unwrap_or(DEFAULT_COLLECTION_NAME);
    let dir = output
        .output_dir
        .clone()
        .or_else(|| file_config.collection_path.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    OutputTarget::new(dir, name).context("Invalid collection name")
}

fn gateway_config(file_config: &FileConfig) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    if let Some(secs) = file_config.connect_timeout_secs {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file_config.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    config
}

async fn run_file(args: FileArgs, file_config: &FileConfig) -> Result<()> {
    let (Some(client_id), Some(client_secret)) = (&args.client_id, &args.client_secret) else {
        bail!(
            "osu! API credentials are required\n  Suggestion: Pass --client-id and --client-secret, or set the ID and SECRET environment variables"
        );
    };

    let target = output_target(&args.output, file_config)?;
    let policy = IgnorePolicy {
        invalid_set_ids: args.ignore_invalid_set_ids
            || file_config.ignore_invalid_set_ids.unwrap_or(false),
        invalid_map_ids: args.ignore_invalid_map_ids
            || file_config.ignore_invalid_map_ids.unwrap_or(false),
    };

    let config = GatewayConfig {
        api_base: args.api_base.clone(),
        token_url: args.token_url.clone(),
        ..gateway_config(file_config)
    };
    let gateway = Gateway::new(&config, client_id, client_secret)
        .context("Failed to set up the osu! API client")?;
    let api = OsuApi::new(gateway);

    info!(input = %args.input.display(), "Building collection from file");
    let report = run_file_pipeline(&api, &args.input, &target, policy).await?;
    println!("{report}");
    Ok(())
}

async fn run_collector(args: CollectorArgs, file_config: &FileConfig) -> Result<()> {
    let collection_id = parse_collection_id(&args.collection)?;
    let filter = match (args.sort_by, args.min, args.max) {
        (Some(sort_by), Some(min), Some(max)) => {
            Some(CollectorFilter::new(sort_by.into(), min, max)?)
        }
        _ => None,
    };
    let target = output_target(&args.output, file_config)?;

    let client = CollectorClient::new(&gateway_config(file_config), &args.collector_base)
        .context("Failed to set up the osu!collector client")?;
    let report = run_collector_pipeline(&client, collection_id, filter.as_ref(), &target).await?;
    println!("{report}");
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let collections = read_collections(&args.file)?;
    for collection in &collections {
        println!(
            "{} ({} beatmap(s))",
            collection.name,
            collection.checksums.len()
        );
        for checksum in &collection.checksums {
            println!("  {checksum}");
        }
    }
    Ok(())
}
