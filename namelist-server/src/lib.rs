//! namelist-server: paginated customer listing over PostgreSQL
//!
//! Resolves the store connection from a base connection string plus
//! overrides, owns the process-wide pool, runs the listing and count
//! statements under a per-request deadline, and renders the result (or the
//! error) as an HTML page.

pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod http;
pub mod render;

pub use config::{resolve, ConfigError, ConnectionDescriptor, Overrides};
pub use db::{CustomerRepo, Page, PoolSettings, Record, StorePool, PAGE_SIZE};
pub use deadline::{RequestContext, QUERY_CEILING};
pub use error::{Cause, ConnectionError, ListingError, ScanError, ServerError};
pub use http::{build_router, run_server, ServerConfig};
pub use render::{render_page, ViewModel};
