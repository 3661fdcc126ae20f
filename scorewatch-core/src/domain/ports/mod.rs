// src/domain/ports/mod.rs

pub mod repository;
pub mod table;

pub use repository::{BatchLogRepository, ReferenceRepository};
pub use table::TableSource;
