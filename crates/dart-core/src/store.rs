//! Store traits for company identities and canonical financial records.
//!
//! This module defines the two collaborators the preprocessing pipeline talks
//! to: [`CompanyDirectory`] for identity lookups and [`FinanceStore`] for
//! persisting records with natural-key upsert semantics. [`CollectionStore`]
//! keeps what was collected from DART as delivered.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::{
    company::CompanyInfo,
    error::Result,
    table::LineItemTable,
    types::{CompanyIdentity, FinancialRecord},
};

/// Lookup of company identity fields by internal company id.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// Returns the identity for `company_id`.
    ///
    /// Returns `Ok(None)` if the directory has no such company.
    async fn identity(&self, company_id: i64) -> Result<Option<CompanyIdentity>>;

    /// Returns the internal id of the company with the given business
    /// registration number.
    async fn company_id_by_biz_num(&self, biz_num: &str) -> Result<Option<i64>>;
}

/// Outcome of an upsert batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    /// Records with no natural-key match, inserted as new rows.
    pub inserted: usize,
    /// Records whose natural key matched, updated field by field.
    pub updated: usize,
}

impl UpsertSummary {
    /// Total number of records written.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

impl AddAssign for UpsertSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.updated += rhs.updated;
    }
}

/// Persistence for canonical financial records.
///
/// Records are keyed by [`FinancialRecord::key`]: `(company_id, corp_code,
/// business_year, report_code, fs_division)`.
#[async_trait]
pub trait FinanceStore: Send + Sync {
    /// Inserts records without a key match and updates those with one.
    async fn upsert_many(&self, records: &[FinancialRecord]) -> Result<UpsertSummary>;

    /// Returns every record of the company with the given business
    /// registration number, most recent period first.
    async fn records_by_biz_num(&self, biz_num: &str) -> Result<Vec<FinancialRecord>>;

    /// Returns every record with the given DART corp code, most recent
    /// period first.
    async fn records_by_corp_code(&self, corp_code: &str) -> Result<Vec<FinancialRecord>>;

    /// Returns every record of an internal company id, most recent period
    /// first.
    async fn records_by_company_id(&self, company_id: i64) -> Result<Vec<FinancialRecord>>;

    /// Removes all stored records.
    async fn clear(&self) -> Result<()>;
}

/// Persistence for collected DART data before preprocessing.
///
/// Company details are keyed by corp code. Line items are keyed by
/// [`RawLineItem::key`](crate::RawLineItem::key).
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Inserts company details without a corp code match and replaces those
    /// with one.
    async fn upsert_company_infos(&self, infos: &[CompanyInfo]) -> Result<UpsertSummary>;

    /// Returns the details stored for a corp code.
    async fn company_info_by_corp_code(&self, corp_code: &str) -> Result<Option<CompanyInfo>>;

    /// Returns the details of the company with the given business
    /// registration number.
    async fn company_info_by_biz_num(&self, biz_num: &str) -> Result<Option<CompanyInfo>>;

    /// Returns the details attached to an internal company id.
    async fn company_info_by_company_id(&self, company_id: i64) -> Result<Option<CompanyInfo>>;

    /// Inserts or updates the rows of `table`, attributed to `company_id`.
    async fn upsert_line_items(
        &self,
        company_id: i64,
        table: &LineItemTable,
    ) -> Result<UpsertSummary>;

    /// Returns the stored rows of a company and corp code in the order they
    /// were first stored.
    async fn line_items(&self, company_id: i64, corp_code: &str) -> Result<LineItemTable>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accumulates() {
        let mut total = UpsertSummary::default();
        total += UpsertSummary {
            inserted: 3,
            updated: 0,
        };
        total += UpsertSummary {
            inserted: 1,
            updated: 2,
        };
        assert_eq!(total.inserted, 4);
        assert_eq!(total.updated, 2);
        assert_eq!(total.total(), 6);
    }
}
