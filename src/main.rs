use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod input;
mod orchestrator;
mod prompt;
mod providers;
mod store;

use crate::app::Application;
use crate::cli::Args;
use crate::config::{Config, Credentials, load_env_files};
use crate::core::error::MemchatError;
use crate::store::Store;

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "memchat=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<(), MemchatError> {
    load_env_files();
    let config = Config::load()?;
    let backend = config.resolve_backend(args.backend.as_deref(), |name| std::env::var(name).ok())?;
    let credentials = Credentials::from_env(backend)?;

    let features_dir = args
        .features_dir
        .clone()
        .unwrap_or_else(|| config.features_dir.clone());
    let store = Store::new(features_dir).with_memory_tail(config.memory_tail_chars);

    let completion_backend = providers::factory::create_backend(&config, &credentials, store.clone())?;
    Application::new(args, store, completion_backend).run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
