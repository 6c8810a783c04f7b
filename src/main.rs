use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod audit;
mod cli;
mod diff;
mod extract;
mod key;
mod publish;
mod registry;
mod report;
mod rewrite;
mod segment;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::RootArgs::parse();
    audit::run(&args)
}
