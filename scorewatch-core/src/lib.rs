// scorewatch-core/src/lib.rs

// 1. Documentation is not enforced yet
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Domain (statistical core)
// Reference building, PSI, AUC/KS, fairness, thresholds.
// Depends on nothing else (no infra, no app).
pub mod domain;

// 2. Infrastructure (Adapters)
// DuckDB CSV reader, filesystem repository, YAML config.
// Depends on the Domain and its ports.
pub mod infrastructure;

// 3. Application (Use Cases)
// build reference, run monitor, fairness audit, status.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use scorewatch_core::ScorewatchError;
pub use error::ScorewatchError;
