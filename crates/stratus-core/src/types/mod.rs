//! Core type definitions used across the Stratus workspace.

pub mod id;

pub use id::*;
