pub mod dataset;
pub mod error;
pub mod monitoring;
pub mod ports;
pub mod stats;

// Handy re-exports to keep imports short elsewhere
pub use dataset::Table;
pub use error::DomainError;
