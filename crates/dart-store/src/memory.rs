//! In-memory store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dart_core::{
    CollectionStore, CompanyDirectory, CompanyIdentity, CompanyInfo, FinanceStore,
    FinancialRecord, LineItemKey, LineItemTable, RawLineItem, RecordKey, Result, UpsertSummary,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Stored record with its write timestamps.
#[derive(Debug, Clone)]
struct StoredRecord {
    record: FinancialRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredRecord {
    fn new(record: FinancialRecord) -> Self {
        let now = Utc::now();
        Self {
            record,
            created_at: now,
            updated_at: now,
        }
    }

    fn update(&mut self, record: FinancialRecord) {
        self.record = record;
        self.updated_at = Utc::now();
    }
}

/// Raw rows in first-stored order, indexed by natural key.
#[derive(Debug, Default)]
struct LineItemLog {
    rows: Vec<(LineItemKey, RawLineItem)>,
    index: HashMap<LineItemKey, usize>,
}

/// Simple in-memory store for testing and development.
///
/// Identities, records and collected data live in `RwLock`-protected
/// `HashMap`s and are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    companies: RwLock<HashMap<i64, CompanyIdentity>>,
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
    company_infos: RwLock<HashMap<String, CompanyInfo>>,
    line_items: RwLock<LineItemLog>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a company identity.
    pub async fn register_company(&self, identity: CompanyIdentity) {
        debug!(company_id = identity.company_id, "Registering company");
        self.companies
            .write()
            .await
            .insert(identity.company_id, identity);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Returns when the record with `key` was first inserted and last written.
    pub async fn timestamps(&self, key: &RecordKey) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.records
            .read()
            .await
            .get(key)
            .map(|stored| (stored.created_at, stored.updated_at))
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryStore {
    async fn identity(&self, company_id: i64) -> Result<Option<CompanyIdentity>> {
        Ok(self.companies.read().await.get(&company_id).cloned())
    }

    async fn company_id_by_biz_num(&self, biz_num: &str) -> Result<Option<i64>> {
        Ok(self
            .companies
            .read()
            .await
            .values()
            .filter(|identity| identity.biz_num.as_deref() == Some(biz_num))
            .map(|identity| identity.company_id)
            .min())
    }
}

#[async_trait]
impl FinanceStore for InMemoryStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_many(&self, records: &[FinancialRecord]) -> Result<UpsertSummary> {
        let mut stored = self.records.write().await;
        let mut summary = UpsertSummary::default();

        for record in records {
            match stored.get_mut(&record.key()) {
                Some(existing) => {
                    existing.update(record.clone());
                    summary.updated += 1;
                }
                None => {
                    stored.insert(record.key(), StoredRecord::new(record.clone()));
                    summary.inserted += 1;
                }
            }
        }

        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted records"
        );
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn records_by_biz_num(&self, biz_num: &str) -> Result<Vec<FinancialRecord>> {
        Ok(self
            .records_where(|r| r.identity.biz_num.as_deref() == Some(biz_num))
            .await)
    }

    #[instrument(skip(self))]
    async fn records_by_corp_code(&self, corp_code: &str) -> Result<Vec<FinancialRecord>> {
        Ok(self.records_where(|r| r.corp_code == corp_code).await)
    }

    #[instrument(skip(self))]
    async fn records_by_company_id(&self, company_id: i64) -> Result<Vec<FinancialRecord>> {
        Ok(self
            .records_where(|r| r.identity.company_id == company_id)
            .await)
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        debug!("Cleared in-memory store");
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for InMemoryStore {
    #[instrument(skip(self, infos), fields(count = infos.len()))]
    async fn upsert_company_infos(&self, infos: &[CompanyInfo]) -> Result<UpsertSummary> {
        let mut stored = self.company_infos.write().await;
        let mut summary = UpsertSummary::default();

        for info in infos {
            match stored.insert(info.corp_code.clone(), info.clone()) {
                Some(_) => summary.updated += 1,
                None => summary.inserted += 1,
            }
        }

        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted company infos"
        );
        Ok(summary)
    }

    async fn company_info_by_corp_code(&self, corp_code: &str) -> Result<Option<CompanyInfo>> {
        Ok(self.company_infos.read().await.get(corp_code).cloned())
    }

    async fn company_info_by_biz_num(&self, biz_num: &str) -> Result<Option<CompanyInfo>> {
        Ok(self
            .company_infos
            .read()
            .await
            .values()
            .filter(|info| info.biz_num == biz_num)
            .min_by(|a, b| a.corp_code.cmp(&b.corp_code))
            .cloned())
    }

    async fn company_info_by_company_id(&self, company_id: i64) -> Result<Option<CompanyInfo>> {
        Ok(self
            .company_infos
            .read()
            .await
            .values()
            .filter(|info| info.company_id == Some(company_id))
            .min_by(|a, b| a.corp_code.cmp(&b.corp_code))
            .cloned())
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    async fn upsert_line_items(
        &self,
        company_id: i64,
        table: &LineItemTable,
    ) -> Result<UpsertSummary> {
        let mut guard = self.line_items.write().await;
        let log = &mut *guard;
        let mut summary = UpsertSummary::default();

        for row in table.iter() {
            let key = row.key(company_id);
            match log.index.get(&key) {
                Some(&i) => {
                    log.rows[i].1 = row.clone();
                    summary.updated += 1;
                }
                None => {
                    let i = log.rows.len();
                    log.index.insert(key.clone(), i);
                    log.rows.push((key, row.clone()));
                    summary.inserted += 1;
                }
            }
        }

        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted line items"
        );
        Ok(summary)
    }

    async fn line_items(&self, company_id: i64, corp_code: &str) -> Result<LineItemTable> {
        Ok(self
            .line_items
            .read()
            .await
            .rows
            .iter()
            .filter(|(key, _)| key.company_id == company_id && key.corp_code == corp_code)
            .map(|(_, row)| row.clone())
            .collect())
    }
}

impl InMemoryStore {
    async fn records_where(&self, keep: impl Fn(&FinancialRecord) -> bool) -> Vec<FinancialRecord> {
        let stored = self.records.read().await;
        let mut records: Vec<FinancialRecord> = stored
            .values()
            .filter(|s| keep(&s.record))
            .map(|s| s.record.clone())
            .collect();
        sort_most_recent_first(&mut records);

        debug!("Found {} records", records.len());
        records
    }
}

/// Orders records by period year descending, then report and statement kind.
pub(crate) fn sort_most_recent_first(records: &mut [FinancialRecord]) {
    records.sort_by(|a, b| {
        b.business_year
            .cmp(&a.business_year)
            .then_with(|| a.report_code.code().cmp(b.report_code.code()))
            .then_with(|| a.fs_division.code().cmp(b.fs_division.code()))
    });
}
