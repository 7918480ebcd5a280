//! HTTP transit API client
//!
//! Queries `GET {base_url}/arrivals?line=..&station=..&direction=..` and
//! decodes a body of the form:
//!
//! ```json
//! {"arrivals": [{"minutes": 5}, {"minutes": 12}]}
//! ```

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use twatch_core::prelude::*;
use twatch_core::{sort_samples, ArrivalQuery, ArrivalSample, FetchError};

use crate::source::ArrivalSource;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ArrivalsResponse {
    #[serde(default)]
    arrivals: Vec<ArrivalEntry>,
}

#[derive(Debug, Deserialize)]
struct ArrivalEntry {
    minutes: i64,
}

/// Arrival source backed by the transit HTTP API
#[derive(Debug, Clone)]
pub struct HttpArrivalSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpArrivalSource {
    /// Create a client for `base_url` with a per-request `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::transit(format!("Invalid base URL '{}': {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(Error::transit(format!(
                "Base URL '{}' cannot carry a path",
                base_url
            )));
        }

        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transit(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Build the arrivals URL for a query
    pub fn arrivals_url(&self, query: &ArrivalQuery) -> std::result::Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("arrivals")
            .map_err(|e| FetchError::network(format!("invalid request URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("line", &query.line_id)
            .append_pair("station", &query.station_name)
            .append_pair("direction", &query.direction);

        Ok(url)
    }
}

impl ArrivalSource for HttpArrivalSource {
    async fn fetch_arrivals(
        &self,
        query: &ArrivalQuery,
    ) -> std::result::Result<Vec<ArrivalSample>, FetchError> {
        let url = self.arrivals_url(query)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::network(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(describe_request_error(&e)))?;

        parse_arrivals(&body)
    }
}

/// Decode an arrivals response body into samples sorted ascending.
///
/// An empty arrivals list is reported as [`FetchError::NoData`].
pub fn parse_arrivals(body: &str) -> std::result::Result<Vec<ArrivalSample>, FetchError> {
    let response: ArrivalsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::decode(e.to_string()))?;

    if response.arrivals.is_empty() {
        return Err(FetchError::NoData);
    }

    let mut samples: Vec<ArrivalSample> = response
        .arrivals
        .into_iter()
        .map(|entry| ArrivalSample::new(entry.minutes))
        .collect();
    sort_samples(&mut samples);

    Ok(samples)
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
