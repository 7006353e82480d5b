//! Company registration details: fetch, attach internal ids and store.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use dart_core::{CollectionStore, CompanyDirectory, CompanyInfo, DartError, Result, UpsertSummary};

/// Default number of company detail requests in flight.
pub const DEFAULT_INFO_CONCURRENCY: usize = 5;

/// Default number of company details written per store call.
pub const DEFAULT_INFO_BATCH_SIZE: usize = 100;

/// Source of company registration details.
#[async_trait]
pub trait CompanyInfoSource: Send + Sync {
    /// Fetches the details of one company, `None` if DART has none.
    async fn fetch_company_info(&self, corp_code: &str) -> Result<Option<CompanyInfo>>;
}

#[cfg(feature = "client")]
#[async_trait]
impl CompanyInfoSource for dart_client::DartClient {
    async fn fetch_company_info(&self, corp_code: &str) -> Result<Option<CompanyInfo>> {
        Self::fetch_company_info(self, corp_code).await
    }
}

/// Collects company registration details and answers lookups on them.
///
/// Each fetched company is matched to an internal company id through the
/// directory by business registration number. Details are upserted by corp
/// code in batches.
pub struct CompanyInfoCollector {
    source: Arc<dyn CompanyInfoSource>,
    directory: Arc<dyn CompanyDirectory>,
    store: Arc<dyn CollectionStore>,
    concurrency: usize,
    batch_size: usize,
}

impl std::fmt::Debug for CompanyInfoCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanyInfoCollector")
            .field("source", &"configured")
            .field("directory", &"configured")
            .field("store", &"configured")
            .field("concurrency", &self.concurrency)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl CompanyInfoCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(
        source: Arc<dyn CompanyInfoSource>,
        directory: Arc<dyn CompanyDirectory>,
        store: Arc<dyn CollectionStore>,
    ) -> Self {
        Self {
            source,
            directory,
            store,
            concurrency: DEFAULT_INFO_CONCURRENCY,
            batch_size: DEFAULT_INFO_BATCH_SIZE,
        }
    }

    /// Sets how many requests are in flight at once. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets how many details are written per store call. Zero is treated as
    /// one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Fetch and store the details of every corp code.
    ///
    /// A corp code that fails or has no data is logged and skipped.
    ///
    /// # Errors
    /// Returns [`DartError::AuthenticationFailed`] as soon as the source
    /// rejects the API key, and store errors. Batches written before a store
    /// error stay written.
    #[instrument(skip(self, corp_codes), fields(count = corp_codes.len()))]
    pub async fn collect(&self, corp_codes: &[String]) -> Result<UpsertSummary> {
        let results: Vec<(&String, Result<Option<CompanyInfo>>)> = stream::iter(corp_codes)
            .map(|corp_code| async move {
                (corp_code, self.source.fetch_company_info(corp_code).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut infos = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (corp_code, result) in results {
            match result {
                Ok(Some(info)) => infos.push(self.attach_company_id(info).await),
                Ok(None) => debug!(corp_code = %corp_code, "No company info"),
                Err(DartError::AuthenticationFailed(message)) => {
                    return Err(DartError::AuthenticationFailed(message));
                }
                Err(e) => {
                    failed += 1;
                    warn!(corp_code = %corp_code, error = %e, "Failed to fetch company info");
                }
            }
        }
        infos.sort_by(|a, b| a.corp_code.cmp(&b.corp_code));

        let mut total = UpsertSummary::default();
        for batch in infos.chunks(self.batch_size) {
            total += self.store.upsert_company_infos(batch).await?;
        }

        info!(
            requested = corp_codes.len(),
            failed,
            inserted = total.inserted,
            updated = total.updated,
            "Company info collection finished"
        );
        Ok(total)
    }

    async fn attach_company_id(&self, mut info: CompanyInfo) -> CompanyInfo {
        let biz_num = info.biz_num.trim();
        if biz_num.is_empty() {
            return info;
        }

        match self.directory.company_id_by_biz_num(biz_num).await {
            Ok(company_id) => info.company_id = company_id,
            Err(e) => {
                warn!(corp_code = %info.corp_code, error = %e, "Company id lookup failed");
            }
        }
        info
    }

    /// Returns the stored details of the company with a business
    /// registration number.
    ///
    /// # Errors
    /// Returns [`DartError::InvalidParameter`] for an empty number and any
    /// store error.
    pub async fn info_by_biz_num(&self, biz_num: &str) -> Result<Option<CompanyInfo>> {
        let biz_num = non_empty(biz_num, "business registration number")?;
        self.store.company_info_by_biz_num(biz_num).await
    }

    /// Returns the stored details of a corp code.
    ///
    /// # Errors
    /// Returns [`DartError::InvalidParameter`] for an empty code and any
    /// store error.
    pub async fn info_by_corp_code(&self, corp_code: &str) -> Result<Option<CompanyInfo>> {
        let corp_code = non_empty(corp_code, "corp code")?;
        self.store.company_info_by_corp_code(corp_code).await
    }

    /// Returns the stored details attached to an internal company id.
    ///
    /// # Errors
    /// Returns any store error.
    pub async fn info_by_company_id(&self, company_id: i64) -> Result<Option<CompanyInfo>> {
        self.store.company_info_by_company_id(company_id).await
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DartError::InvalidParameter(format!("Empty {what}")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_core::{CompanyIdentity, ListingMarket};
    use dart_store::InMemoryStore;
    use std::collections::HashMap;

    /// Serves canned details by corp code; anything else is an API error.
    #[derive(Default)]
    struct FixtureSource {
        infos: HashMap<String, Option<CompanyInfo>>,
        reject_key: bool,
    }

    #[async_trait]
    impl CompanyInfoSource for FixtureSource {
        async fn fetch_company_info(&self, corp_code: &str) -> Result<Option<CompanyInfo>> {
            if self.reject_key {
                return Err(DartError::AuthenticationFailed("010".to_string()));
            }
            self.infos
                .get(corp_code)
                .cloned()
                .ok_or_else(|| DartError::Api {
                    status: "100".to_string(),
                    message: format!("unknown corp code {corp_code}"),
                })
        }
    }

    fn source() -> FixtureSource {
        let mut source = FixtureSource::default();
        source.infos.insert(
            "00126380".to_string(),
            Some(
                CompanyInfo::new("00126380")
                    .with_biz_num("1248100998")
                    .with_corp_cls("Y"),
            ),
        );
        source.infos.insert(
            "00164779".to_string(),
            Some(
                CompanyInfo::new("00164779")
                    .with_biz_num("1368100001")
                    .with_corp_cls("K"),
            ),
        );
        source.infos.insert("00000013".to_string(), None);
        source
    }

    async fn collector(source: FixtureSource) -> (CompanyInfoCollector, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store
            .register_company(CompanyIdentity::new(1).with_biz_num("1248100998"))
            .await;
        let collector = CompanyInfoCollector::new(Arc::new(source), store.clone(), store.clone())
            .with_batch_size(1);
        (collector, store)
    }

    fn codes(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| (*c).to_string()).collect()
    }

    #[tokio::test]
    async fn test_collect_attaches_company_id() {
        let (collector, _) = collector(source()).await;
        let summary = collector
            .collect(&codes(&["00126380", "00164779", "00000013", "99999999"]))
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);

        let samsung = collector.info_by_company_id(1).await.unwrap().unwrap();
        assert_eq!(samsung.corp_code, "00126380");
        assert_eq!(samsung.listing_market(), Some(ListingMarket::Kospi));

        let unmatched = collector.info_by_corp_code("00164779").await.unwrap().unwrap();
        assert_eq!(unmatched.company_id, None);
        assert_eq!(unmatched.listing_market().map(|m| m.id()), Some(2));

        assert_eq!(collector.info_by_corp_code("00000013").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_collect_twice_updates_by_corp_code() {
        let (collector, _) = collector(source()).await;
        let corp_codes = codes(&["00126380", "00164779"]);
        collector.collect(&corp_codes).await.unwrap();
        let summary = collector.collect(&corp_codes).await.unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.updated, 2);
    }

    #[tokio::test]
    async fn test_rejected_key_aborts() {
        let source = FixtureSource {
            reject_key: true,
            ..source()
        };
        let (collector, store) = collector(source).await;
        let err = collector.collect(&codes(&["00126380"])).await.unwrap_err();
        assert!(matches!(err, DartError::AuthenticationFailed(_)));
        assert_eq!(store.company_info_by_corp_code("00126380").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookups() {
        let (collector, _) = collector(source()).await;
        collector.collect(&codes(&["00126380"])).await.unwrap();

        let by_biz = collector.info_by_biz_num(" 1248100998 ").await.unwrap();
        assert_eq!(by_biz.map(|i| i.corp_code), Some("00126380".to_string()));
        assert!(matches!(
            collector.info_by_biz_num("").await,
            Err(DartError::InvalidParameter(_))
        ));
        assert!(matches!(
            collector.info_by_corp_code("  ").await,
            Err(DartError::InvalidParameter(_))
        ));
    }
}
