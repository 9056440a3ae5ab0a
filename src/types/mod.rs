//! Shared type definitions
//!
//! Configuration, cached financial records and session types.

pub mod config;
pub mod finance;
pub mod session;
