//! fincache
//!
//! Client-side persistence for a personal-finance application: a versioned
//! local cache of financial data plus the remote backend session it runs
//! alongside.

pub mod app;
pub mod remote;
pub mod storage;
pub mod types;
