//! Period fan-out: slices in, canonical records out.

use std::collections::HashMap;
use std::sync::Arc;

use dart_core::{
    CompanyDirectory, CompanyIdentity, DartError, FinanceStore, FinancialMetrics,
    FinancialRecord, LineItemTable, PeriodOffset, RecordKey, Result, StatementSlice,
    UpsertSummary,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{concepts::CONCEPTS, derive, resolver::resolve};

/// What happens to a call when one of its slices fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceFailurePolicy {
    /// Log the failed slice and keep the records of the others.
    #[default]
    Isolate,
    /// Fail the whole call and discard every record, including those of
    /// slices that already succeeded.
    AbortAll,
}

/// Turns a company's line-item table into canonical financial records.
///
/// The company directory and the record store are injected at construction.
/// Each slice yields three records: the current period and the two prior
/// periods DART reports alongside it.
pub struct FinanceAssembler {
    directory: Arc<dyn CompanyDirectory>,
    store: Arc<dyn FinanceStore>,
    policy: SliceFailurePolicy,
}

impl std::fmt::Debug for FinanceAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceAssembler")
            .field("directory", &"configured")
            .field("store", &"configured")
            .field("policy", &self.policy)
            .finish()
    }
}

impl FinanceAssembler {
    /// Creates an assembler with the default [`SliceFailurePolicy::Isolate`].
    #[must_use]
    pub fn new(directory: Arc<dyn CompanyDirectory>, store: Arc<dyn FinanceStore>) -> Self {
        Self {
            directory,
            store,
            policy: SliceFailurePolicy::default(),
        }
    }

    /// Sets the slice failure policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: SliceFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the slice failure policy.
    #[must_use]
    pub const fn policy(&self) -> SliceFailurePolicy {
        self.policy
    }

    /// Preprocesses a company's table into records.
    ///
    /// # Errors
    /// Returns [`DartError::CompanyNotFound`] if the directory has no identity
    /// for `company_id`, a directory error as-is, or a slice error under
    /// [`SliceFailurePolicy::AbortAll`]. No records are returned in any of
    /// these cases.
    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub async fn preprocess(
        &self,
        company_id: i64,
        table: &LineItemTable,
    ) -> Result<Vec<FinancialRecord>> {
        let identity = match self.directory.identity(company_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                error!(company_id, "No company identity, dropping preprocessing result");
                return Err(DartError::CompanyNotFound(company_id));
            }
            Err(e) => {
                error!(company_id, error = %e, "Company directory lookup failed");
                return Err(e);
            }
        };

        self.assemble(&identity, table)
    }

    /// Preprocesses a company's table and upserts the records.
    ///
    /// # Errors
    /// Returns the errors of [`Self::preprocess`] and any store error.
    pub async fn preprocess_and_store(
        &self,
        company_id: i64,
        table: &LineItemTable,
    ) -> Result<UpsertSummary> {
        let records = self.preprocess(company_id, table).await?;
        if records.is_empty() {
            debug!(company_id, "No records to store");
            return Ok(UpsertSummary::default());
        }

        let summary = self.store.upsert_many(&records).await?;
        info!(
            company_id,
            inserted = summary.inserted,
            updated = summary.updated,
            "Stored financial records"
        );
        Ok(summary)
    }

    /// Assembles records for an already resolved identity.
    ///
    /// Slices of consecutive business years overlap: the 2023 report's prior
    /// column and the 2022 report's current column both describe 2022. Each
    /// natural key is emitted once, and the record built from the most recent
    /// report wins since it carries the restated figures. The winner takes
    /// the position of the key's first occurrence.
    ///
    /// # Errors
    /// Returns a slice error under [`SliceFailurePolicy::AbortAll`].
    pub fn assemble(
        &self,
        identity: &CompanyIdentity,
        table: &LineItemTable,
    ) -> Result<Vec<FinancialRecord>> {
        let slices = table.slices();
        let mut records: Vec<FinancialRecord> =
            Vec::with_capacity(slices.len() * PeriodOffset::ALL.len());
        // Report year each kept record was built from, by position.
        let mut report_years: Vec<i32> = Vec::with_capacity(records.capacity());
        let mut positions: HashMap<RecordKey, usize> = HashMap::new();
        let mut superseded = 0usize;

        for slice in &slices {
            match assemble_slice(identity, slice) {
                Ok(slice_records) => {
                    // The first record is the slice's current period.
                    let report_year = slice_records[0].business_year;
                    for record in slice_records {
                        match positions.get(&record.key()) {
                            Some(&i) => {
                                superseded += 1;
                                if report_year >= report_years[i] {
                                    records[i] = record;
                                    report_years[i] = report_year;
                                }
                            }
                            None => {
                                positions.insert(record.key(), records.len());
                                records.push(record);
                                report_years.push(report_year);
                            }
                        }
                    }
                }
                Err(e) => match self.policy {
                    SliceFailurePolicy::Isolate => {
                        warn!(
                            company_id = identity.company_id,
                            year = slice.business_year(),
                            fs_div = %slice.fs_division(),
                            error = %e,
                            "Skipping slice"
                        );
                    }
                    SliceFailurePolicy::AbortAll => {
                        error!(
                            company_id = identity.company_id,
                            year = slice.business_year(),
                            fs_div = %slice.fs_division(),
                            error = %e,
                            "Slice failed, discarding all records"
                        );
                        return Err(e);
                    }
                },
            }
        }

        debug!(
            company_id = identity.company_id,
            slices = slices.len(),
            records = records.len(),
            superseded,
            "Assembled financial records"
        );
        Ok(records)
    }
}

/// Builds the current, prior and prior-two records of one slice.
///
/// # Errors
/// Returns [`DartError::Slice`] if the slice's business year is not a number.
pub fn assemble_slice(
    identity: &CompanyIdentity,
    slice: &StatementSlice<'_>,
) -> Result<[FinancialRecord; 3]> {
    let year: i32 = slice
        .business_year()
        .trim()
        .parse()
        .map_err(|e| DartError::Slice {
            business_year: slice.business_year().to_string(),
            fs_division: slice.fs_division().code().to_string(),
            reason: format!("invalid business year: {e}"),
        })?;

    let resolved: Vec<_> = CONCEPTS
        .iter()
        .map(|concept| (concept.metric, resolve(slice, &concept.spec)))
        .collect();

    Ok(PeriodOffset::ALL.map(|offset| {
        let mut metrics = FinancialMetrics::default();
        for (metric, value) in &resolved {
            metrics.set(*metric, value.get(offset));
        }
        derive::apply(&mut metrics);

        FinancialRecord::new(
            identity.clone(),
            slice.corp_code(),
            slice.report_code(),
            slice.fs_division(),
            year - offset.years_back(),
        )
        .with_metrics(metrics)
    }))
}
