pub mod cli;
pub mod columns;
pub mod config;
pub mod ddl;
pub mod delimited;
pub mod delimiter;
pub mod error;
pub mod fixed_width;
pub mod frequency;
pub mod io_utils;
pub mod prep;
pub mod preview;
pub mod process;
pub mod profile;
pub mod profile_cmd;
pub mod reader;
pub mod split;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("flatload", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => profile_cmd::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Detect(args) => handle_detect(&args),
        Commands::Prep(args) => prep::execute(&args),
    }
}

fn handle_detect(args: &cli::DetectArgs) -> Result<()> {
    info!("Sampling '{}' for a delimiter", args.input.display());
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = delimiter::detect_delimiter_in_path(&args.input, encoding)
        .with_context(|| format!("Detecting delimiter of {:?}", args.input))?;
    println!("{}", io_utils::printable_delimiter(delimiter));
    Ok(())
}
