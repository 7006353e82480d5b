//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::Utc;
use dart_core::{
    CollectionStore, CompanyDirectory, CompanyIdentity, CompanyInfo, DartError, FinanceStore,
    FinancialMetrics, FinancialRecord, FsDivision, LineItemTable, RawLineItem, ReportCode,
    Result, UpsertSummary,
};
use rusqlite::{Connection, OptionalExtension, Params, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-based store for company identities, financial records and
/// collected DART data.
///
/// Records are keyed by `(company_id, corp_code, business_year, reprt_code,
/// fs_div)`. Metric values are kept as one JSON document per record.
/// Company details are keyed by corp code and raw line items by their ten
/// natural-key columns; absent key parts are stored as empty text.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DartError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DartError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS companies (
                company_id INTEGER PRIMARY KEY,
                biz_num TEXT,
                corporation_num TEXT,
                illu_id TEXT,
                registered_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS company_finance (
                company_id INTEGER NOT NULL,
                corp_code TEXT NOT NULL,
                business_year INTEGER NOT NULL,
                reprt_code TEXT NOT NULL,
                fs_div TEXT NOT NULL,
                biz_num TEXT,
                corporation_num TEXT,
                illu_id TEXT,
                acct_dt TEXT NOT NULL,
                financial_decide_code TEXT NOT NULL,
                financial_decide_desc TEXT NOT NULL,
                metrics_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (company_id, corp_code, business_year, reprt_code, fs_div)
            )",
            [],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_company_finance_biz_num
             ON company_finance(biz_num)",
            [],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS company_infos (
                corp_code TEXT PRIMARY KEY,
                company_id INTEGER,
                biz_num TEXT NOT NULL,
                info_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_company_infos_biz_num
             ON company_infos(biz_num)",
            [],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS line_items (
                company_id INTEGER NOT NULL,
                corp_code TEXT NOT NULL,
                bsns_year TEXT NOT NULL,
                reprt_code TEXT NOT NULL,
                fs_div TEXT NOT NULL,
                sj_div TEXT NOT NULL,
                sj_nm TEXT NOT NULL,
                account_id TEXT NOT NULL,
                account_nm TEXT NOT NULL,
                account_detail TEXT NOT NULL,
                item_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (company_id, corp_code, bsns_year, reprt_code, fs_div,
                             sj_div, sj_nm, account_id, account_nm, account_detail)
            )",
            [],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }

    /// Adds or replaces a company identity.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    #[instrument(skip(self, identity), fields(company_id = identity.company_id))]
    pub fn register_company(&self, identity: &CompanyIdentity) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO companies
             (company_id, biz_num, corporation_num, illu_id, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                identity.company_id,
                identity.biz_num,
                identity.corporation_num,
                identity.illu_id,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| DartError::Store(e.to_string()))?;

        debug!("Registered company");
        Ok(())
    }

    /// Reads records matching `filter`, most recent period first.
    fn select_records<P: Params>(&self, filter: &str, params: P) -> Result<Vec<FinancialRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT company_id, corp_code, business_year, reprt_code, fs_div,
                        biz_num, corporation_num, illu_id, acct_dt, metrics_json
                 FROM company_finance
                 WHERE {filter}
                 ORDER BY business_year DESC, reprt_code ASC, fs_div ASC"
            ))
            .map_err(|e| DartError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    CompanyIdentity {
                        company_id: row.get(0)?,
                        biz_num: row.get(5)?,
                        corporation_num: row.get(6)?,
                        illu_id: row.get(7)?,
                    },
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                ))
            })
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (identity, corp_code, year, reprt_code, fs_div, acct_dt, metrics_json) =
                row.map_err(|e| DartError::Store(e.to_string()))?;
            let metrics: FinancialMetrics =
                serde_json::from_str(&metrics_json).map_err(|e| DartError::Parse(e.to_string()))?;

            let mut record = FinancialRecord::new(
                identity,
                corp_code,
                reprt_code.parse::<ReportCode>()?,
                fs_div.parse::<FsDivision>()?,
                year,
            )
            .with_metrics(metrics);
            record.acct_dt = acct_dt;
            records.push(record);
        }

        debug!("Found {} records", records.len());
        Ok(records)
    }

    /// Reads the first company details matching `filter`, by corp code.
    fn select_company_info<P: Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Option<CompanyInfo>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        let info_json: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT info_json FROM company_infos WHERE {filter}
                     ORDER BY corp_code LIMIT 1"
                ),
                params,
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DartError::Store(e.to_string()))?;

        info_json
            .map(|json| serde_json::from_str(&json).map_err(|e| DartError::Parse(e.to_string())))
            .transpose()
    }
}

#[async_trait]
impl CompanyDirectory for SqliteStore {
    #[instrument(skip(self))]
    async fn identity(&self, company_id: i64) -> Result<Option<CompanyIdentity>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        conn.query_row(
            "SELECT biz_num, corporation_num, illu_id FROM companies WHERE company_id = ?1",
            params![company_id],
            |row| {
                Ok(CompanyIdentity {
                    company_id,
                    biz_num: row.get(0)?,
                    corporation_num: row.get(1)?,
                    illu_id: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| DartError::Store(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn company_id_by_biz_num(&self, biz_num: &str) -> Result<Option<i64>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        conn.query_row(
            "SELECT company_id FROM companies WHERE biz_num = ?1
             ORDER BY company_id LIMIT 1",
            params![biz_num],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| DartError::Store(e.to_string()))
    }
}

#[async_trait]
impl FinanceStore for SqliteStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_many(&self, records: &[FinancialRecord]) -> Result<UpsertSummary> {
        let now = Utc::now().to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut summary = UpsertSummary::default();
        for record in records {
            let metrics_json = serde_json::to_string(&record.metrics)
                .map_err(|e| DartError::Parse(e.to_string()))?;

            let exists = tx
                .query_row(
                    "SELECT 1 FROM company_finance
                     WHERE company_id = ?1 AND corp_code = ?2 AND business_year = ?3
                       AND reprt_code = ?4 AND fs_div = ?5",
                    params![
                        record.identity.company_id,
                        record.corp_code,
                        record.business_year,
                        record.report_code.code(),
                        record.fs_division.code()
                    ],
                    |_| Ok(()),
                )
                .optional()
                .map_err(|e| DartError::Store(e.to_string()))?
                .is_some();

            if exists {
                tx.execute(
                    "UPDATE company_finance
                     SET biz_num = ?6, corporation_num = ?7, illu_id = ?8, acct_dt = ?9,
                         financial_decide_code = ?10, financial_decide_desc = ?11,
                         metrics_json = ?12, updated_at = ?13
                     WHERE company_id = ?1 AND corp_code = ?2 AND business_year = ?3
                       AND reprt_code = ?4 AND fs_div = ?5",
                    params![
                        record.identity.company_id,
                        record.corp_code,
                        record.business_year,
                        record.report_code.code(),
                        record.fs_division.code(),
                        record.identity.biz_num,
                        record.identity.corporation_num,
                        record.identity.illu_id,
                        record.acct_dt,
                        record.financial_decide_code(),
                        record.financial_decide_desc(),
                        metrics_json,
                        now
                    ],
                )
                .map_err(|e| DartError::Store(e.to_string()))?;
                summary.updated += 1;
            } else {
                tx.execute(
                    "INSERT INTO company_finance
                     (company_id, corp_code, business_year, reprt_code, fs_div, biz_num,
                      corporation_num, illu_id, acct_dt, financial_decide_code,
                      financial_decide_desc, metrics_json, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                    params![
                        record.identity.company_id,
                        record.corp_code,
                        record.business_year,
                        record.report_code.code(),
                        record.fs_division.code(),
                        record.identity.biz_num,
                        record.identity.corporation_num,
                        record.identity.illu_id,
                        record.acct_dt,
                        record.financial_decide_code(),
                        record.financial_decide_desc(),
                        metrics_json,
                        now
                    ],
                )
                .map_err(|e| DartError::Store(e.to_string()))?;
                summary.inserted += 1;
            }
        }

        tx.commit().map_err(|e| DartError::Store(e.to_string()))?;
        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted records"
        );
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn records_by_biz_num(&self, biz_num: &str) -> Result<Vec<FinancialRecord>> {
        self.select_records("biz_num = ?1", params![biz_num])
    }

    #[instrument(skip(self))]
    async fn records_by_corp_code(&self, corp_code: &str) -> Result<Vec<FinancialRecord>> {
        self.select_records("corp_code = ?1", params![corp_code])
    }

    #[instrument(skip(self))]
    async fn records_by_company_id(&self, company_id: i64) -> Result<Vec<FinancialRecord>> {
        self.select_records("company_id = ?1", params![company_id])
    }

    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        conn.execute("DELETE FROM company_finance", [])
            .map_err(|e| DartError::Store(e.to_string()))?;

        debug!("Cleared SQLite store");
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for SqliteStore {
    #[instrument(skip(self, infos), fields(count = infos.len()))]
    async fn upsert_company_infos(&self, infos: &[CompanyInfo]) -> Result<UpsertSummary> {
        let now = Utc::now().to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut summary = UpsertSummary::default();
        for info in infos {
            let info_json =
                serde_json::to_string(info).map_err(|e| DartError::Parse(e.to_string()))?;

            let exists = tx
                .query_row(
                    "SELECT 1 FROM company_infos WHERE corp_code = ?1",
                    params![info.corp_code],
                    |_| Ok(()),
                )
                .optional()
                .map_err(|e| DartError::Store(e.to_string()))?
                .is_some();

            if exists {
                tx.execute(
                    "UPDATE company_infos
                     SET company_id = ?2, biz_num = ?3, info_json = ?4, updated_at = ?5
                     WHERE corp_code = ?1",
                    params![info.corp_code, info.company_id, info.biz_num, info_json, now],
                )
                .map_err(|e| DartError::Store(e.to_string()))?;
                summary.updated += 1;
            } else {
                tx.execute(
                    "INSERT INTO company_infos
                     (corp_code, company_id, biz_num, info_json, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![info.corp_code, info.company_id, info.biz_num, info_json, now],
                )
                .map_err(|e| DartError::Store(e.to_string()))?;
                summary.inserted += 1;
            }
        }

        tx.commit().map_err(|e| DartError::Store(e.to_string()))?;
        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted company infos"
        );
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn company_info_by_corp_code(&self, corp_code: &str) -> Result<Option<CompanyInfo>> {
        self.select_company_info("corp_code = ?1", params![corp_code])
    }

    #[instrument(skip(self))]
    async fn company_info_by_biz_num(&self, biz_num: &str) -> Result<Option<CompanyInfo>> {
        self.select_company_info("biz_num = ?1", params![biz_num])
    }

    #[instrument(skip(self))]
    async fn company_info_by_company_id(&self, company_id: i64) -> Result<Option<CompanyInfo>> {
        self.select_company_info("company_id = ?1", params![company_id])
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    async fn upsert_line_items(
        &self,
        company_id: i64,
        table: &LineItemTable,
    ) -> Result<UpsertSummary> {
        let now = Utc::now().to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut summary = UpsertSummary::default();
        for row in table.iter() {
            let item_json =
                serde_json::to_string(row).map_err(|e| DartError::Parse(e.to_string()))?;
            let key = row.key(company_id);
            let sj_nm = key.statement_name.as_deref().unwrap_or_default();
            let account_id = key.account_id.as_deref().unwrap_or_default();
            let account_detail = key.account_detail.as_deref().unwrap_or_default();

            let updated = tx
                .execute(
                    "UPDATE line_items SET item_json = ?11, updated_at = ?12
                     WHERE company_id = ?1 AND corp_code = ?2 AND bsns_year = ?3
                       AND reprt_code = ?4 AND fs_div = ?5 AND sj_div = ?6 AND sj_nm = ?7
                       AND account_id = ?8 AND account_nm = ?9 AND account_detail = ?10",
                    params![
                        key.company_id,
                        key.corp_code,
                        key.business_year,
                        key.report_code.code(),
                        key.fs_division.code(),
                        key.statement_division.code(),
                        sj_nm,
                        account_id,
                        key.account_name,
                        account_detail,
                        item_json,
                        now
                    ],
                )
                .map_err(|e| DartError::Store(e.to_string()))?;

            if updated > 0 {
                summary.updated += 1;
            } else {
                tx.execute(
                    "INSERT INTO line_items
                     (company_id, corp_code, bsns_year, reprt_code, fs_div, sj_div, sj_nm,
                      account_id, account_nm, account_detail, item_json, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                    params![
                        key.company_id,
                        key.corp_code,
                        key.business_year,
                        key.report_code.code(),
                        key.fs_division.code(),
                        key.statement_division.code(),
                        sj_nm,
                        account_id,
                        key.account_name,
                        account_detail,
                        item_json,
                        now
                    ],
                )
                .map_err(|e| DartError::Store(e.to_string()))?;
                summary.inserted += 1;
            }
        }

        tx.commit().map_err(|e| DartError::Store(e.to_string()))?;
        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted line items"
        );
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn line_items(&self, company_id: i64, corp_code: &str) -> Result<LineItemTable> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT item_json FROM line_items
                 WHERE company_id = ?1 AND corp_code = ?2
                 ORDER BY rowid",
            )
            .map_err(|e| DartError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![company_id, corp_code], |row| row.get::<_, String>(0))
            .map_err(|e| DartError::Store(e.to_string()))?;

        let mut table = LineItemTable::new();
        for row in rows {
            let item_json = row.map_err(|e| DartError::Store(e.to_string()))?;
            let item: RawLineItem =
                serde_json::from_str(&item_json).map_err(|e| DartError::Parse(e.to_string()))?;
            table.push(item);
        }

        debug!(rows = table.len(), "Loaded line items");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> CompanyIdentity {
        CompanyIdentity::new(7)
            .with_biz_num("1248100998")
            .with_corporation_num("1301110006246")
            .with_illu_id("ILLU-7")
    }

    fn record(year: i32, fs: FsDivision, debt_ratio: &str) -> FinancialRecord {
        FinancialRecord::new(identity(), "00126380", ReportCode::Annual, fs, year).with_metrics(
            FinancialMetrics {
                capital_total: "1000".to_string(),
                debt_total: "500".to_string(),
                financial_debt_ratio: debt_ratio.to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_sqlite_store_initialization() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_directory() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.identity(7).await.unwrap().is_none());

        store.register_company(&identity()).unwrap();
        let found = store.identity(7).await.unwrap().unwrap();
        assert_eq!(found, identity());

        assert_eq!(store.company_id_by_biz_num("1248100998").await.unwrap(), Some(7));
        assert_eq!(store.company_id_by_biz_num("0000000000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_round_trip() {
        let store = SqliteStore::in_memory().unwrap();

        let summary = store
            .upsert_many(&[
                record(2023, FsDivision::Consolidated, "50.0"),
                record(2022, FsDivision::Consolidated, ""),
            ])
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.updated, 0);

        let records = store.records_by_biz_num("1248100998").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record(2023, FsDivision::Consolidated, "50.0"));
        assert_eq!(records[0].financial_decide_desc(), "연결재무제표");
        assert_eq!(records[1].business_year, 2022);
        assert_eq!(records[1].acct_dt, "2022");
    }

    #[tokio::test]
    async fn test_upsert_updates_on_natural_key() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_many(&[record(2023, FsDivision::Consolidated, "")])
            .await
            .unwrap();

        let summary = store
            .upsert_many(&[
                record(2023, FsDivision::Consolidated, "50.0"),
                record(2023, FsDivision::Separate, "40.0"),
            ])
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.updated, 1);

        let records = store.records_by_biz_num("1248100998").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fs_division, FsDivision::Consolidated);
        assert_eq!(records[0].metrics.financial_debt_ratio, "50.0");
        assert_eq!(records[1].fs_division, FsDivision::Separate);
    }

    #[tokio::test]
    async fn test_unknown_biz_num() {
        let store = SqliteStore::in_memory().unwrap();
        let records = store.records_by_biz_num("0000000000").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteStore::in_memory().unwrap();
        store.register_company(&identity()).unwrap();
        store
            .upsert_many(&[record(2023, FsDivision::Consolidated, "50.0")])
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert!(store.records_by_biz_num("1248100998").await.unwrap().is_empty());
        // Identities survive a clear
        assert!(store.identity(7).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_records_by_corp_code_and_company_id() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_many(&[
                record(2022, FsDivision::Consolidated, ""),
                record(2023, FsDivision::Consolidated, "50.0"),
            ])
            .await
            .unwrap();

        let by_corp = store.records_by_corp_code("00126380").await.unwrap();
        assert_eq!(by_corp.len(), 2);
        assert_eq!(by_corp[0].business_year, 2023);

        let by_id = store.records_by_company_id(7).await.unwrap();
        assert_eq!(by_id, by_corp);
        assert!(store.records_by_corp_code("00164779").await.unwrap().is_empty());
        assert!(store.records_by_company_id(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_company_infos() {
        let store = SqliteStore::in_memory().unwrap();
        let mut info = CompanyInfo::new("00126380")
            .with_biz_num("1248100998")
            .with_corp_cls("Y");
        info.corp_name = "삼성전자(주)".to_string();

        let first = store.upsert_company_infos(&[info.clone()]).await.unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(store.company_info_by_company_id(7).await.unwrap(), None);

        let info = info.with_company_id(7);
        let second = store.upsert_company_infos(&[info.clone()]).await.unwrap();
        assert_eq!(second.updated, 1);

        assert_eq!(
            store.company_info_by_corp_code("00126380").await.unwrap(),
            Some(info.clone())
        );
        assert_eq!(
            store.company_info_by_biz_num("1248100998").await.unwrap(),
            Some(info.clone())
        );
        assert_eq!(store.company_info_by_company_id(7).await.unwrap(), Some(info));
        assert_eq!(store.company_info_by_corp_code("00000000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_items() {
        use dart_core::StatementDivision;

        let store = SqliteStore::in_memory().unwrap();
        let row = |detail: Option<&str>, amount: &str| {
            let row = RawLineItem::new(
                "자본금",
                StatementDivision::ChangesInEquity,
                "제 55 기",
                "2023",
                FsDivision::Consolidated,
            )
            .with_statement_name("자본변동표")
            .with_corp_code("00126380")
            .with_amounts(Some(amount), None, None);
            match detail {
                Some(detail) => row.with_account_detail(detail),
                None => row,
            }
        };

        let first = store
            .upsert_line_items(
                7,
                &LineItemTable::from_rows(vec![
                    row(None, "100"),
                    row(Some("기초자본"), "200"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(first.inserted, 2);

        let second = store
            .upsert_line_items(
                7,
                &LineItemTable::from_rows(vec![
                    row(Some("기초자본"), "250"),
                    row(Some("기말자본"), "300"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(second.inserted, 1);
        assert_eq!(second.updated, 1);

        let table = store.line_items(7, "00126380").await.unwrap();
        let amounts: Vec<Option<&str>> =
            table.iter().map(|r| r.current_amount.as_deref()).collect();
        assert_eq!(amounts, vec![Some("100"), Some("250"), Some("300")]);
        assert_eq!(
            table.iter().next().unwrap().statement_name.as_deref(),
            Some("자본변동표")
        );
        assert!(store.line_items(8, "00126380").await.unwrap().is_empty());
    }
}
