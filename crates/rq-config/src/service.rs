use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Root of the remote service, e.g. `"https://api.example.com/v1"`.
    pub base_uri: String,
    /// `$top` applied when a query sets none.
    #[serde(default)]
    pub default_top: Option<u32>,
}

impl ServiceConfig {
    /// Base URI without trailing slashes.
    pub fn base(&self) -> &str {
        self.base_uri.trim_end_matches('/')
    }
}
