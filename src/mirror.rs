// 🪞 Remote Mirror - read-only pass-through to a peer banks service
//
// GET {base_url}/api/banks, body returned as-is. No retries, no caching,
// no reconciliation: a failed call is a failed request.

use crate::dto::BankResponse;
use crate::error::BankError;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed path of the bank listing on the peer
pub const BANKS_PATH: &str = "/api/banks";

#[derive(Debug, Clone)]
pub struct RemoteMirror {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteMirror {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BankError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(RemoteMirror {
            client,
            base_url: base_url.into(),
        })
    }

    /// Full URL of the peer listing; a trailing slash on the base is tolerated
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), BANKS_PATH)
    }

    /// Fetch every bank the peer knows about
    pub async fn fetch_banks(&self) -> Result<Vec<BankResponse>, BankError> {
        let url = self.url();
        debug!(url = %url, "Fetching banks from remote service");

        let banks: Vec<BankResponse> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(url = %url, count = banks.len(), "Fetched banks from remote service");

        Ok(banks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_fixed_path() {
        let timeout = Duration::from_secs(1);

        let mirror = RemoteMirror::new("http://localhost:8080", timeout).unwrap();
        assert_eq!(mirror.url(), "http://localhost:8080/api/banks");

        let mirror = RemoteMirror::new("http://peer:9000/", timeout).unwrap();
        assert_eq!(mirror.url(), "http://peer:9000/api/banks");
    }
}
