#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Period fan-out of slices into records.
pub mod assembler;
/// Metric concepts and their lookup keys.
pub mod concepts;
/// Derived metric calculation.
pub mod derive;
/// Amount normalization.
pub mod normalize;
/// Concept resolution with fallbacks.
pub mod resolver;

pub use assembler::{FinanceAssembler, SliceFailurePolicy, assemble_slice};
pub use concepts::{CONCEPTS, Concept, concept_for};
pub use normalize::normalize;
pub use resolver::{Candidate, ConceptKey, ConceptSpec, ResolvedMetric, resolve};
