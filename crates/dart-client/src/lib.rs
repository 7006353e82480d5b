#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # Example
//!
//! ```no_run
//! use dart_client::DartClient;
//! use dart_core::ReportCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DartClient::new("your_api_key");
//!
//!     // Consolidated and separate statements of Samsung Electronics
//!     let table = client
//!         .fetch_company("00126380", &[2022, 2023], ReportCode::Annual)
//!         .await?;
//!     println!("{} line items", table.len());
//!
//!     // Registration details
//!     if let Some(info) = client.fetch_company_info("00126380").await? {
//!         println!("{} ({})", info.corp_name, info.stock_code);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Response wire format and status handling.
pub mod response;

use dart_core::{CompanyInfo, DartError, FsDivision, LineItemTable, ReportCode, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

pub use response::{check_status, parse_company_info, parse_statement};

/// OpenDART API base URL
const DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// Full financial statement endpoint
const STATEMENT_ENDPOINT: &str = "fnlttSinglAcntAll.json";

/// Company registration details endpoint
const COMPANY_ENDPOINT: &str = "company.json";

/// Default minimum delay between two requests.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1200);

/// Default number of requests in flight during a company fetch.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Rate limiter spacing requests at least `min_interval` apart
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// One `fnlttSinglAcntAll` query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementRequest {
    /// Eight-digit DART company code.
    pub corp_code: String,
    /// Business year (`bsns_year`).
    pub business_year: i32,
    /// Report code (`reprt_code`).
    pub report_code: ReportCode,
    /// Fiscal statement kind (`fs_div`).
    pub fs_division: FsDivision,
}

impl StatementRequest {
    /// Creates a request for the consolidated annual report of a year.
    #[must_use]
    pub fn new(corp_code: impl Into<String>, business_year: i32) -> Self {
        Self {
            corp_code: corp_code.into(),
            business_year,
            report_code: ReportCode::default(),
            fs_division: FsDivision::default(),
        }
    }

    /// Sets the report code.
    #[must_use]
    pub const fn with_report_code(mut self, report_code: ReportCode) -> Self {
        self.report_code = report_code;
        self
    }

    /// Sets the fiscal statement kind.
    #[must_use]
    pub const fn with_fs_division(mut self, fs_division: FsDivision) -> Self {
        self.fs_division = fs_division;
        self
    }
}

/// OpenDART client.
///
/// All requests made through one client share a rate limiter, so clones of
/// an `Arc<DartClient>` stay within the configured delay together.
pub struct DartClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    api_key: String,
    base_url: String,
    concurrency: usize,
}

impl fmt::Debug for DartClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DartClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl DartClient {
    /// Create a new client with the given API key (`crtfc_key`).
    ///
    /// # Example
    /// ```
    /// use dart_client::DartClient;
    ///
    /// let client = DartClient::new("your_api_key");
    /// ```
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(client, api_key)
    }

    /// Create a new client with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_DELAY))),
            api_key: api_key.into(),
            base_url: DART_BASE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets how many requests a company fetch keeps in flight. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the minimum delay between two requests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(delay)));
        self
    }

    /// Sets the API base URL, e.g. for a proxy.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured concurrency.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn query(&self, request: &StatementRequest) -> [(&'static str, String); 5] {
        [
            ("crtfc_key", self.api_key.clone()),
            ("corp_code", request.corp_code.clone()),
            ("bsns_year", request.business_year.to_string()),
            ("reprt_code", request.report_code.code().to_string()),
            ("fs_div", request.fs_division.code().to_string()),
        ]
    }

    /// Fetch one full financial statement.
    ///
    /// A query DART has no data for yields an empty table.
    ///
    /// # Errors
    /// Returns [`DartError::InvalidParameter`] for an empty corp code,
    /// [`DartError::Network`] for transport failures and the errors of
    /// [`parse_statement`].
    pub async fn fetch_statement(&self, request: &StatementRequest) -> Result<LineItemTable> {
        if request.corp_code.trim().is_empty() {
            return Err(DartError::InvalidParameter("Empty corp code".to_string()));
        }

        debug!(
            corp_code = %request.corp_code,
            year = request.business_year,
            reprt_code = %request.report_code,
            fs_div = %request.fs_division,
            "Fetching financial statement"
        );
        let body = self.get(STATEMENT_ENDPOINT, &self.query(request)).await?;
        parse_statement(&body, request)
    }

    /// Fetch the registration details of a company.
    ///
    /// Returns `Ok(None)` if DART has no company under `corp_code`. The
    /// returned details carry no `company_id`.
    ///
    /// # Errors
    /// Returns [`DartError::InvalidParameter`] for an empty corp code,
    /// [`DartError::Network`] for transport failures and the errors of
    /// [`parse_company_info`].
    pub async fn fetch_company_info(&self, corp_code: &str) -> Result<Option<CompanyInfo>> {
        if corp_code.trim().is_empty() {
            return Err(DartError::InvalidParameter("Empty corp code".to_string()));
        }

        debug!(corp_code, "Fetching company info");
        let query = [
            ("crtfc_key", self.api_key.clone()),
            ("corp_code", corp_code.to_string()),
        ];
        let body = self.get(COMPANY_ENDPOINT, &query).await?;
        parse_company_info(&body)
    }

    /// Fetch the registration details of many companies.
    ///
    /// Requests run with the configured concurrency. A corp code that fails
    /// or has no data is logged and skipped; the result keeps input order.
    ///
    /// # Errors
    /// Returns [`DartError::AuthenticationFailed`] as soon as DART rejects
    /// the API key.
    pub async fn fetch_company_infos(&self, corp_codes: &[String]) -> Result<Vec<CompanyInfo>> {
        let mut results: Vec<(usize, &String, Result<Option<CompanyInfo>>)> =
            stream::iter(corp_codes.iter().enumerate())
                .map(|(i, corp_code)| async move {
                    (i, corp_code, self.fetch_company_info(corp_code).await)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(i, _, _)| *i);

        let mut infos = Vec::with_capacity(results.len());
        for (_, corp_code, result) in results {
            match result {
                Ok(Some(info)) => infos.push(info),
                Ok(None) => debug!(corp_code = %corp_code, "No company info"),
                Err(DartError::AuthenticationFailed(message)) => {
                    return Err(DartError::AuthenticationFailed(message));
                }
                Err(e) => {
                    warn!(corp_code = %corp_code, error = %e, "Skipping company info");
                }
            }
        }

        info!(
            requested = corp_codes.len(),
            fetched = infos.len(),
            "Fetched company infos"
        );
        Ok(infos)
    }

    /// Sends one rate-limited GET and returns the body.
    async fn get(&self, endpoint: &str, query: &[(&'static str, String)]) -> Result<String> {
        // Rate limit
        self.rate_limiter.lock().await.wait().await;

        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| DartError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DartError::Network(format!(
                "Failed to fetch {endpoint}: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DartError::Network(e.to_string()))
    }

    /// Fetch the consolidated and separate statements of a company for each
    /// year and concatenate them.
    ///
    /// Requests run with the configured concurrency. A failed request is
    /// logged and skipped; the table keeps year order, consolidated before
    /// separate.
    ///
    /// # Errors
    /// Returns [`DartError::AuthenticationFailed`] as soon as DART rejects
    /// the API key, since no other request can succeed.
    pub async fn fetch_company(
        &self,
        corp_code: &str,
        years: &[i32],
        report_code: ReportCode,
    ) -> Result<LineItemTable> {
        let requests: Vec<StatementRequest> = years
            .iter()
            .flat_map(|&year| {
                FsDivision::ALL.into_iter().map(move |fs| {
                    StatementRequest::new(corp_code, year)
                        .with_report_code(report_code)
                        .with_fs_division(fs)
                })
            })
            .collect();

        let mut results: Vec<(usize, StatementRequest, Result<LineItemTable>)> =
            stream::iter(requests.into_iter().enumerate())
                .map(|(i, request)| async move {
                    let result = self.fetch_statement(&request).await;
                    (i, request, result)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(i, _, _)| *i);

        let mut table = LineItemTable::new();
        for (_, request, result) in results {
            match result {
                Ok(part) => table.append(part),
                Err(DartError::AuthenticationFailed(message)) => {
                    return Err(DartError::AuthenticationFailed(message));
                }
                Err(e) => {
                    warn!(
                        corp_code = %request.corp_code,
                        year = request.business_year,
                        fs_div = %request.fs_division,
                        error = %e,
                        "Skipping statement"
                    );
                }
            }
        }

        info!(corp_code, rows = table.len(), "Fetched company statements");
        Ok(table)
    }
}
