#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for DART financial statement processing.
//!
//! This crate provides the foundational abstractions shared by the client,
//! the preprocessing engine and the stores:
//!
//! - [`RawLineItem`](types::RawLineItem) - One account row as delivered by DART
//! - [`LineItemTable`](table::LineItemTable) - Rows of one company, split into slices
//! - [`FinancialRecord`](types::FinancialRecord) - Canonical output record
//! - [`CompanyDirectory`](store::CompanyDirectory) - Identity lookup
//! - [`FinanceStore`](store::FinanceStore) - Natural-key upsert persistence
//! - [`CompanyInfo`](company::CompanyInfo) - Company registration details
//! - [`CollectionStore`](store::CollectionStore) - Collected data as delivered

/// Company registration details and listing markets.
pub mod company;
/// Error types for DART operations.
pub mod error;
/// Report codes, period offsets and report-period labels.
pub mod period;
/// Store traits for identities and records.
pub mod store;
/// Line-item tables and statement slices.
pub mod table;
/// Core data types (line items, metrics, records).
pub mod types;

// Re-export commonly used items at crate root
pub use company::{CompanyInfo, ListingMarket};
pub use error::{DartError, Result};
pub use period::{PeriodOffset, ReportCode, is_report_period};
pub use store::{CollectionStore, CompanyDirectory, FinanceStore, UpsertSummary};
pub use table::{LineItemTable, StatementSlice};
pub use types::{
    CompanyIdentity, FinancialMetrics, FinancialRecord, FsDivision, LineItemKey, Metric,
    RawLineItem, RecordKey, StatementDivision,
};
