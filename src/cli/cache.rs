use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{cache::PriceCache, prelude::*};

#[derive(Parser)]
pub struct CacheArgs {
    /// Directory holding cached day-ahead prices.
    #[clap(long = "cache-dir", env = "WATTSON_CACHE_DIR", default_value = ".wattson-cache")]
    directory: PathBuf,

    /// Evict cached prices older than this.
    #[clap(long = "price-retention", env = "PRICE_RETENTION", default_value = "400days")]
    retention: humantime::Duration,
}

impl CacheArgs {
    pub fn open(&self) -> Result<PriceCache> {
        PriceCache::new(&self.directory, Duration::from(self.retention))
    }
}
