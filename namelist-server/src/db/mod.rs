//! Database layer - connection pool and the customer listing
//!
//! # Design Principles
//!
//! - One pool per process, built before the listener starts
//! - Every store await is bounded by the request's effective deadline
//! - A single attempt per request, no retries
//! - Listing and count run on one connection but not in one transaction

pub mod customers;
pub mod pool;

pub use customers::{CustomerRepo, Page, Record, RecordColumn, PAGE_SIZE};
pub use pool::{PoolSettings, StorePool};
