//! Collection pipeline: fetch, preprocess and store company financials.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use dart_core::{
    CollectionStore, CompanyDirectory, DartError, FinanceStore, FinancialRecord, LineItemTable,
    ReportCode, Result, UpsertSummary,
};
use dart_finance::{FinanceAssembler, SliceFailurePolicy};

/// Default number of companies collected at once.
pub const DEFAULT_COLLECT_CONCURRENCY: usize = 4;

/// Source of raw statement tables.
///
/// [`DartClient`](dart_client::DartClient) is the production source; tests
/// and replays plug in their own.
#[async_trait]
pub trait StatementSource: Send + Sync {
    /// Fetches the line items of a company for the given business years.
    async fn fetch_company(
        &self,
        corp_code: &str,
        years: &[i32],
        report_code: ReportCode,
    ) -> Result<LineItemTable>;
}

#[cfg(feature = "client")]
#[async_trait]
impl StatementSource for dart_client::DartClient {
    async fn fetch_company(
        &self,
        corp_code: &str,
        years: &[i32],
        report_code: ReportCode,
    ) -> Result<LineItemTable> {
        Self::fetch_company(self, corp_code, years, report_code).await
    }
}

/// A company to collect: internal id plus DART corp code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectTarget {
    /// Internal company id, resolved through the company directory.
    pub company_id: i64,
    /// Eight-digit DART company code.
    pub corp_code: String,
}

impl CollectTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(company_id: i64, corp_code: impl Into<String>) -> Self {
        Self {
            company_id,
            corp_code: corp_code.into(),
        }
    }
}

/// Fetches statements, turns them into financial records and stores them.
///
/// With [`Self::with_line_item_store`] the fetched rows are also kept as
/// delivered, attributed to the target's company id.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use dart::{CollectTarget, DartClient, FinanceCollector, SqliteStore};
///
/// let store = Arc::new(SqliteStore::new("dart.db")?);
/// let collector = FinanceCollector::new(
///     Arc::new(DartClient::new("your_api_key")),
///     store.clone(),
///     store,
/// )
/// .with_years(vec![2023]);
///
/// let summary = collector.collect(&CollectTarget::new(1, "00126380")).await?;
/// ```
pub struct FinanceCollector {
    source: Arc<dyn StatementSource>,
    store: Arc<dyn FinanceStore>,
    line_items: Option<Arc<dyn CollectionStore>>,
    assembler: FinanceAssembler,
    years: Vec<i32>,
    report_code: ReportCode,
    concurrency: usize,
}

impl std::fmt::Debug for FinanceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceCollector")
            .field("source", &"configured")
            .field("store", &"configured")
            .field("line_items", &self.line_items.is_some())
            .field("policy", &self.assembler.policy())
            .field("years", &self.years)
            .field("report_code", &self.report_code)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl FinanceCollector {
    /// Create a collector.
    ///
    /// Defaults to the annual report of the last completed business year,
    /// whose statements also carry the two years before it.
    #[must_use]
    pub fn new(
        source: Arc<dyn StatementSource>,
        directory: Arc<dyn CompanyDirectory>,
        store: Arc<dyn FinanceStore>,
    ) -> Self {
        Self {
            source,
            assembler: FinanceAssembler::new(directory, store.clone()),
            store,
            line_items: None,
            years: vec![Utc::now().year() - 1],
            report_code: ReportCode::default(),
            concurrency: DEFAULT_COLLECT_CONCURRENCY,
        }
    }

    /// Keeps every fetched row in `store` before preprocessing.
    #[must_use]
    pub fn with_line_item_store(mut self, store: Arc<dyn CollectionStore>) -> Self {
        self.line_items = Some(store);
        self
    }

    /// Sets the business years to fetch.
    ///
    /// Consecutive years overlap: each annual report also carries the two
    /// years before it. Where two reports describe the same period, the
    /// record of the later report is stored.
    #[must_use]
    pub fn with_years(mut self, years: Vec<i32>) -> Self {
        self.years = years;
        self
    }

    /// Sets the report to fetch.
    #[must_use]
    pub const fn with_report_code(mut self, report_code: ReportCode) -> Self {
        self.report_code = report_code;
        self
    }

    /// Sets how many companies [`Self::collect_all`] processes at once. Zero
    /// is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the slice failure policy of the preprocessing step.
    #[must_use]
    pub fn with_policy(mut self, policy: SliceFailurePolicy) -> Self {
        self.assembler = self.assembler.with_policy(policy);
        self
    }

    /// Collect one company.
    ///
    /// # Errors
    /// Returns fetch errors, [`DartError::CompanyNotFound`] for a company
    /// the directory does not know, and store errors.
    #[instrument(skip(self), fields(company_id = target.company_id, corp_code = %target.corp_code))]
    pub async fn collect(&self, target: &CollectTarget) -> Result<UpsertSummary> {
        let table = self
            .source
            .fetch_company(&target.corp_code, &self.years, self.report_code)
            .await?;

        if table.is_empty() {
            debug!("No line items fetched");
            return Ok(UpsertSummary::default());
        }

        if let Some(line_items) = &self.line_items {
            let stored = line_items
                .upsert_line_items(target.company_id, &table)
                .await?;
            debug!(
                inserted = stored.inserted,
                updated = stored.updated,
                "Stored line items"
            );
        }

        self.assembler
            .preprocess_and_store(target.company_id, &table)
            .await
    }

    /// Collect many companies with bounded concurrency.
    ///
    /// A company that fails is logged and skipped. Returns the summed
    /// summary of the companies that succeeded.
    pub async fn collect_all(&self, targets: &[CollectTarget]) -> UpsertSummary {
        let results: Vec<(&CollectTarget, Result<UpsertSummary>)> = stream::iter(targets)
            .map(|target| async move { (target, self.collect(target).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut total = UpsertSummary::default();
        let mut failed = 0usize;
        for (target, result) in results {
            match result {
                Ok(summary) => total += summary,
                Err(e) => {
                    failed += 1;
                    warn!(
                        company_id = target.company_id,
                        corp_code = %target.corp_code,
                        error = %e,
                        "Failed to collect company"
                    );
                }
            }
        }

        info!(
            companies = targets.len(),
            failed,
            inserted = total.inserted,
            updated = total.updated,
            "Collection finished"
        );
        total
    }

    /// Returns the stored records of a company by business registration
    /// number, most recent period first.
    ///
    /// # Errors
    /// Returns [`DartError::InvalidParameter`] for an empty number and any
    /// store error.
    pub async fn finance_by_biz_num(&self, biz_num: &str) -> Result<Vec<FinancialRecord>> {
        let biz_num = biz_num.trim();
        if biz_num.is_empty() {
            return Err(DartError::InvalidParameter(
                "Empty business registration number".to_string(),
            ));
        }
        self.store.records_by_biz_num(biz_num).await
    }

    /// Returns the stored records with a DART corp code, most recent period
    /// first.
    ///
    /// # Errors
    /// Returns [`DartError::InvalidParameter`] for an empty code and any
    /// store error.
    pub async fn finance_by_corp_code(&self, corp_code: &str) -> Result<Vec<FinancialRecord>> {
        let corp_code = corp_code.trim();
        if corp_code.is_empty() {
            return Err(DartError::InvalidParameter("Empty corp code".to_string()));
        }
        self.store.records_by_corp_code(corp_code).await
    }

    /// Returns the stored records of an internal company id, most recent
    /// period first.
    ///
    /// # Errors
    /// Returns any store error.
    pub async fn finance_by_company_id(&self, company_id: i64) -> Result<Vec<FinancialRecord>> {
        self.store.records_by_company_id(company_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_core::{CompanyIdentity, FsDivision, RawLineItem, StatementDivision};
    use dart_store::InMemoryStore;
    use std::collections::HashMap;

    /// Serves canned tables by corp code.
    #[derive(Default)]
    struct FixtureSource {
        tables: HashMap<String, LineItemTable>,
    }

    #[async_trait]
    impl StatementSource for FixtureSource {
        async fn fetch_company(
            &self,
            corp_code: &str,
            _years: &[i32],
            _report_code: ReportCode,
        ) -> Result<LineItemTable> {
            self.tables
                .get(corp_code)
                .cloned()
                .ok_or_else(|| DartError::Api {
                    status: "100".to_string(),
                    message: format!("unknown corp code {corp_code}"),
                })
        }
    }

    fn row(corp_code: &str, name: &str, amount: &str) -> RawLineItem {
        year_row(corp_code, name, "2023", [Some(amount), Some(amount), None])
    }

    fn year_row(
        corp_code: &str,
        name: &str,
        year: &str,
        amounts: [Option<&str>; 3],
    ) -> RawLineItem {
        RawLineItem::new(
            name,
            StatementDivision::BalanceSheet,
            "제 10 기",
            year,
            FsDivision::Consolidated,
        )
        .with_amounts(amounts[0], amounts[1], amounts[2])
        .with_corp_code(corp_code)
    }

    async fn collector() -> (FinanceCollector, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store
            .register_company(CompanyIdentity::new(1).with_biz_num("1111111111"))
            .await;
        store
            .register_company(CompanyIdentity::new(2).with_biz_num("2222222222"))
            .await;

        let mut source = FixtureSource::default();
        source.tables.insert(
            "00000001".to_string(),
            LineItemTable::from_rows(vec![
                row("00000001", "자본총계", "1000000"),
                row("00000001", "부채총계", "500000"),
            ]),
        );
        source.tables.insert(
            "00000002".to_string(),
            LineItemTable::from_rows(vec![row("00000002", "자본총계", "2000000")]),
        );
        source
            .tables
            .insert("00000009".to_string(), LineItemTable::new());
        // The 2023 report restates 2022 debt from 400000 to 450000.
        source.tables.insert(
            "00000004".to_string(),
            LineItemTable::from_rows(vec![
                year_row(
                    "00000004",
                    "자본총계",
                    "2022",
                    [Some("1000000"), Some("1000000"), Some("1000000")],
                ),
                year_row(
                    "00000004",
                    "부채총계",
                    "2022",
                    [Some("400000"), Some("300000"), Some("200000")],
                ),
                year_row(
                    "00000004",
                    "자본총계",
                    "2023",
                    [Some("1000000"), Some("1000000"), Some("1000000")],
                ),
                year_row(
                    "00000004",
                    "부채총계",
                    "2023",
                    [Some("500000"), Some("450000"), Some("300000")],
                ),
            ]),
        );

        let collector = FinanceCollector::new(Arc::new(source), store.clone(), store.clone())
            .with_years(vec![2023]);
        (collector, store)
    }

    #[tokio::test]
    async fn test_collect() {
        let (collector, _) = collector().await;
        let summary = collector
            .collect(&CollectTarget::new(1, "00000001"))
            .await
            .unwrap();
        assert_eq!(summary.inserted, 3);

        let records = collector.finance_by_biz_num("1111111111").await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].business_year, 2023);
        assert_eq!(records[0].metrics.financial_debt_ratio, "50.0");
        assert_eq!(records[1].metrics.financial_debt_ratio, "50.0");
        assert_eq!(records[2].metrics.financial_debt_ratio, "");
    }

    #[tokio::test]
    async fn test_collect_twice_updates() {
        let (collector, _) = collector().await;
        let target = CollectTarget::new(1, "00000001");
        collector.collect(&target).await.unwrap();
        let summary = collector.collect(&target).await.unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.updated, 3);
    }

    #[tokio::test]
    async fn test_collect_unknown_company() {
        let (collector, store) = collector().await;
        let err = collector
            .collect(&CollectTarget::new(99, "00000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, DartError::CompanyNotFound(99)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_collect_empty_table() {
        let (collector, _) = collector().await;
        let summary = collector
            .collect(&CollectTarget::new(1, "00000009"))
            .await
            .unwrap();
        assert_eq!(summary.total(), 0);
    }

    #[tokio::test]
    async fn test_collect_all_skips_failures() {
        let (collector, store) = collector().await;
        let summary = collector
            .collect_all(&[
                CollectTarget::new(1, "00000001"),
                CollectTarget::new(2, "00000002"),
                CollectTarget::new(3, "00000003"),
                CollectTarget::new(99, "00000001"),
            ])
            .await;
        assert_eq!(summary.inserted, 6);
        assert_eq!(store.len().await, 6);
    }

    #[tokio::test]
    async fn test_collect_overlapping_years_keeps_restated_figures() {
        let (collector, store) = collector().await;
        store
            .register_company(CompanyIdentity::new(4).with_biz_num("4444444444"))
            .await;
        let collector = collector.with_years(vec![2022, 2023]);

        let summary = collector
            .collect(&CollectTarget::new(4, "00000004"))
            .await
            .unwrap();
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.updated, 0);

        let records = collector.finance_by_company_id(4).await.unwrap();
        let ratios: Vec<(i32, &str)> = records
            .iter()
            .map(|r| (r.business_year, r.metrics.financial_debt_ratio.as_str()))
            .collect();
        assert_eq!(
            ratios,
            vec![(2023, "50.0"), (2022, "45.0"), (2021, "30.0"), (2020, "20.0")]
        );
    }

    #[tokio::test]
    async fn test_collect_stores_line_items() {
        let (collector, store) = collector().await;
        let collector = collector.with_line_item_store(store.clone());
        collector
            .collect(&CollectTarget::new(1, "00000001"))
            .await
            .unwrap();

        let table = store.line_items(1, "00000001").await.unwrap();
        let names: Vec<&str> = table.iter().map(|r| r.account_name.as_str()).collect();
        assert_eq!(names, vec!["자본총계", "부채총계"]);
    }

    #[tokio::test]
    async fn test_line_items_are_kept_for_unknown_company() {
        let (collector, store) = collector().await;
        let collector = collector.with_line_item_store(store.clone());
        let err = collector
            .collect(&CollectTarget::new(99, "00000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, DartError::CompanyNotFound(99)));
        assert_eq!(store.line_items(99, "00000001").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_finance_lookups() {
        let (collector, _) = collector().await;
        collector
            .collect(&CollectTarget::new(1, "00000001"))
            .await
            .unwrap();

        let by_corp = collector.finance_by_corp_code(" 00000001 ").await.unwrap();
        let by_id = collector.finance_by_company_id(1).await.unwrap();
        assert_eq!(by_corp.len(), 3);
        assert_eq!(by_corp, by_id);
        assert!(collector.finance_by_company_id(2).await.unwrap().is_empty());
        assert!(matches!(
            collector.finance_by_corp_code("").await,
            Err(DartError::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn test_finance_by_biz_num_rejects_empty() {
        let (collector, _) = collector().await;
        let err = collector.finance_by_biz_num("  ").await.unwrap_err();
        assert!(matches!(err, DartError::InvalidParameter(_)));
    }
}
