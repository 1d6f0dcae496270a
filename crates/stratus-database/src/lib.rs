//! # stratus-database
//!
//! Metadata store contract and implementations for Stratus: connection
//! pool management, the migration runner, the [`store::MetadataStore`]
//! trait with its transactional changeset, and the PostgreSQL and
//! in-memory stores.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryMetadataStore;
pub use postgres::PostgresMetadataStore;
pub use store::{MetadataStore, MetadataTxn, TxnOp};
