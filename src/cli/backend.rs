use clap::Parser;

use crate::{api::balanz, prelude::*};

#[derive(Parser)]
pub struct BackendArgs {
    /// balanz WebSocket endpoint, e.g. `wss://host/api`.
    #[clap(long = "backend-url", env = "BALANZ_URL")]
    url: String,

    /// API token for the `Login` call.
    #[clap(long = "backend-token", env = "BALANZ_TOKEN", hide_env_values = true)]
    token: String,
}

impl BackendArgs {
    pub async fn connect(&self) -> Result<balanz::Client> {
        balanz::Client::connect(&self.url, &self.token).await
    }
}
