mod backend;
mod cache;
mod fetch;
mod prices;
mod report;
mod sessions;

use clap::{Parser, Subcommand};

use crate::prelude::*;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch sessions, reconstruct their energy, price it, and print an
    /// aggregated report.
    Report(Box<report::ReportArgs>),

    /// List sessions, or show one session's hourly breakdown.
    Sessions(Box<sessions::SessionsArgs>),

    /// Prefetch day-ahead spot prices into the local cache.
    Prices(Box<prices::PricesArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Report(args) => report::run(*args).await,
            Self::Sessions(args) => sessions::run(*args).await,
            Self::Prices(args) => prices::run(*args).await,
        }
    }
}
