//! Route handlers
//!
//! - health: liveness check
//! - index: customer listing page

pub mod health;
pub mod index;
