//! # Folio CLI
//!
//! Usage:
//!   folio render --fixture family.json --storage-root ./buckets \
//!       --family fam-1 --start 2026-03-01 --end 2026-03-31
//!
//! Buckets are directories under `--storage-root`; the finished album lands
//! in `<storage-root>/albums/`. The response is printed as JSON on stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio::font::{FontResolver, TrueTypeEmbedder};
use folio::store::local::{LocalStorage, LocalStore};
use folio::{AlbumConfig, AlbumService, RenderRequest};

#[derive(Parser, Debug)]
#[command(name = "folio", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an album from a local fixture.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// JSON file with `families` and `posts`.
    #[arg(long)]
    fixture: PathBuf,

    /// Directory holding one sub-directory per bucket.
    #[arg(long)]
    storage_root: PathBuf,

    #[arg(long)]
    family: String,

    /// First day of the period (YYYY-MM-DD).
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the period, inclusive.
    #[arg(long)]
    end: NaiveDate,

    #[arg(long, default_value = "cli")]
    requested_by: String,

    /// Optional JSON config overriding geometry, typography or bucket names.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_render(args: RenderArgs) -> ExitCode {
    let mut config = match args.config.as_deref() {
        None => AlbumConfig::default(),
        Some(path) => match AlbumConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ Failed to read config: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    // font paths from the environment go ahead of any configured chain
    config.fonts = config.fonts.with_env();

    let store = match LocalStore::open(&args.fixture) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ Failed to load fixture: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let storage = LocalStorage::new(args.storage_root);

    let fonts = FontResolver::new(Box::new(TrueTypeEmbedder)).resolve(&config.fonts);
    let service = AlbumService::new(Arc::new(store), Arc::new(storage), config, fonts);

    let (status, response) = service.handle(&RenderRequest {
        family_id: args.family,
        start: args.start,
        end: args.end,
        requested_by: args.requested_by,
    });

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("✗ Failed to encode response: {}", e),
    }

    if response.ok {
        ExitCode::SUCCESS
    } else {
        eprintln!("✗ Render failed with status {}", status);
        ExitCode::FAILURE
    }
}
