use chrono::{Days, Local, NaiveDate};
use clap::Parser;

use crate::{
    api::elprisen,
    cli::cache::CacheArgs,
    prelude::*,
    tables::build_price_table,
};

#[derive(Parser)]
pub struct PricesArgs {
    #[clap(flatten)]
    cache: CacheArgs,

    /// First day to fetch; defaults to today.
    #[clap(long)]
    from: Option<NaiveDate>,

    /// Last day to fetch; defaults to tomorrow (the day-ahead market
    /// publishes tomorrow's prices in the afternoon).
    #[clap(long)]
    until: Option<NaiveDate>,
}

pub async fn run(args: PricesArgs) -> Result {
    let today = Local::now().date_naive();
    let from = args.from.unwrap_or(today);
    let until = args.until.unwrap_or(today + Days::new(1));
    ensure!(from <= until, "`--from` must not be after `--until`");

    let book =
        elprisen::Api::new()?.load_price_book(&args.cache.open()?, from, until, today).await;
    println!("{}", build_price_table(&book));
    Ok(())
}
