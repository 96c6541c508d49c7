use reqwest::Client;

use crate::config::Config;
use crate::error::Result;
use crate::http::build_client;

/// Configuration plus the shared HTTP client, built once at startup and passed
/// by reference to every pipeline stage.
#[derive(Clone, Debug)]
pub struct AppContext {
    pub cfg: Config,
    pub client: Client,
}

impl AppContext {
    pub fn new(cfg: Config) -> Result<Self> {
        let client = build_client(cfg.request_timeout_secs)?;
        Ok(Self { cfg, client })
    }
}
