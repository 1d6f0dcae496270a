//! Audit log domain entities.

pub mod model;

pub use model::{LogEntry, LogKind, NewLogEntry};
