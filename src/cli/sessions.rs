use chrono::Local;
use clap::Parser;

use crate::{
    cli::{backend::BackendArgs, cache::CacheArgs, fetch},
    prelude::*,
    tables::{build_breakdown_table, build_sessions_table},
};

#[derive(Parser)]
pub struct SessionsArgs {
    #[clap(flatten)]
    backend: BackendArgs,

    #[clap(flatten)]
    cache: CacheArgs,

    /// Show the hourly breakdown of one session instead of the listing.
    #[clap(long)]
    session_id: Option<String>,

    /// Leave out sessions that are still in progress.
    #[clap(long)]
    skip_live: bool,
}

pub async fn run(args: SessionsArgs) -> Result {
    let now = Local::now();
    let client = args.backend.connect().await?;
    let priced = fetch::load(&client, &args.cache, !args.skip_live, &now).await?;

    match args.session_id {
        Some(session_id) => {
            let breakdown = priced
                .breakdowns
                .get(&session_id)
                .with_context(|| format!("no such session (or no samples): {session_id}"))?;
            println!("{}", build_breakdown_table(breakdown));
        }
        None => println!("{}", build_sessions_table(&priced.rows())),
    }
    Ok(())
}
