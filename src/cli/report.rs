use chrono::{Local, NaiveDate, TimeZone};
use clap::Parser;

use crate::{
    cli::{backend::BackendArgs, cache::CacheArgs, fetch},
    core::report::{Period, ReportRequest, build_report},
    prelude::*,
    tables::build_report_table,
};

#[derive(Parser)]
pub struct ReportArgs {
    #[clap(flatten)]
    backend: BackendArgs,

    #[clap(flatten)]
    cache: CacheArgs,

    /// Report window and granularity preset.
    #[clap(long, value_enum, default_value = "last-48-hours")]
    period: Period,

    /// Explicit window start date; defaults per period.
    #[clap(long)]
    start: Option<NaiveDate>,

    /// Only count sessions from this group.
    #[clap(long)]
    group: Option<String>,

    /// Only count sessions from this charger.
    #[clap(long)]
    charger: Option<String>,

    /// Leave out sessions that are still in progress.
    #[clap(long)]
    skip_live: bool,
}

pub async fn run(args: ReportArgs) -> Result {
    let now = Local::now();
    let client = args.backend.connect().await?;
    if let Some(group) = &args.group {
        let groups = client.get_groups().await?;
        ensure!(
            groups.iter().any(|known| &known.group_id == group),
            "unknown group `{group}`"
        );
    }
    let priced = fetch::load(&client, &args.cache, !args.skip_live, &now).await?;

    let start = match args.start {
        Some(date) => Local
            .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
            .single()
            .with_context(|| format!("ambiguous local start date {date}"))?,
        None => args.period.default_start(&now, priced.earliest_start),
    };
    let request = ReportRequest {
        period: args.period,
        start,
        now,
        group: args.group,
        charger: args.charger,
    };
    let report = build_report(
        &request,
        priced.sessions.iter().filter_map(|session| {
            priced.breakdowns.get(&session.session_id).map(|breakdown| (session, breakdown))
        }),
    );
    println!("{}", build_report_table(&report));
    Ok(())
}
