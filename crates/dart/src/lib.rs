#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # Features
//!
//! - `client` - OpenDART HTTP client
//! - `sqlite` - SQLite-based store
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dart::{
//!     CollectTarget, CompanyIdentity, CompanyInfoCollector, DartClient, FinanceCollector,
//!     SqliteStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> dart::Result<()> {
//!     let store = Arc::new(SqliteStore::new("dart.db")?);
//!     store.register_company(&CompanyIdentity::new(1).with_biz_num("1248100998"))?;
//!
//!     let collector = FinanceCollector::new(
//!         Arc::new(DartClient::new("your_api_key")),
//!         store.clone(),
//!         store.clone(),
//!     )
//!     .with_line_item_store(store.clone());
//!     collector.collect(&CollectTarget::new(1, "00126380")).await?;
//!
//!     for record in collector.finance_by_biz_num("1248100998").await? {
//!         println!("{} {}: {}", record.business_year, record.fs_division, record.metrics.sales);
//!     }
//!
//!     let infos = CompanyInfoCollector::new(
//!         Arc::new(DartClient::new("your_api_key")),
//!         store.clone(),
//!         store.clone(),
//!     );
//!     infos.collect(&["00126380".to_string()]).await?;
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use dart_core::*;

// Preprocessing
pub use dart_finance::{FinanceAssembler, SliceFailurePolicy};

// Stores
pub use dart_store::InMemoryStore;
#[cfg(feature = "sqlite")]
pub use dart_store::SqliteStore;

// Client
#[cfg(feature = "client")]
pub use dart_client::{DartClient, StatementRequest};

mod collector;
pub use collector::{CollectTarget, DEFAULT_COLLECT_CONCURRENCY, FinanceCollector, StatementSource};

mod company;
pub use company::{
    CompanyInfoCollector, CompanyInfoSource, DEFAULT_INFO_BATCH_SIZE, DEFAULT_INFO_CONCURRENCY,
};
