pub mod cli;
pub mod columns;
pub mod combine;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod dates;
pub mod derive;
pub mod error;
pub mod export;
pub mod frequency;
pub mod ingest;
pub mod io_utils;
pub mod keys;
pub mod merge;
pub mod normalize;
pub mod session;
pub mod source;
pub mod stats;
pub mod status;
pub mod table;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::{
    cli::{Cli, Commands, SessionArgs},
    session::FileSessionStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => ingest::execute(&args),
        Commands::Combine(args) => combine::execute(&args),
        Commands::Dashboard(args) => dashboard::execute(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Status(args) => status::execute(&args),
        Commands::Reset(args) => status::reset(&args),
    }
}

pub(crate) fn open_store(args: &SessionArgs) -> FileSessionStore {
    FileSessionStore::new(&args.state_dir)
}
