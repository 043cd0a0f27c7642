//! Customer listing repository
//!
//! Runs the two fixed statements of the index page on one pooled connection:
//! - list: first page of display names, ascending
//! - count: total rows in the relation
//!
//! The count is a separate statement and may see a different snapshot than
//! the list. Nothing wraps them in a transaction.

use std::future::Future;

use sqlx::postgres::PgRow;
use sqlx::{Column, Row};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use super::pool::StorePool;
use crate::deadline::RequestContext;
use crate::error::{Cause, ListingError, ScanError};

/// Maximum number of records on the page.
pub const PAGE_SIZE: i64 = 15;

const LIST_QUERY: &str = "SELECT c_name FROM customer ORDER BY c_name ASC LIMIT $1";
const COUNT_QUERY: &str = "SELECT COUNT(*) FROM customer";

/// One listed customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
}

/// Columns a listing row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordColumn {
    Name,
}

impl RecordColumn {
    /// Map a result column name onto a record field. Unquoted identifiers
    /// come back lowercased from Postgres, but match case-insensitively anyway.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("c_name") {
            Some(Self::Name)
        } else {
            None
        }
    }
}

/// Records plus the independently counted total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<Record>,
    pub total: i64,
}

/// Customer listing over a shared pool.
pub struct CustomerRepo<'a> {
    pool: &'a StorePool,
}

impl<'a> CustomerRepo<'a> {
    pub fn new(pool: &'a StorePool) -> Self {
        Self { pool }
    }

    /// Fetch the first page and the total count.
    ///
    /// The effective deadline is fixed once, on entry, and bounds acquisition
    /// and both statements. When it passes, the in-flight driver future is
    /// dropped, which aborts the store operation. Any failure discards
    /// everything fetched so far.
    pub async fn page(&self, ctx: RequestContext) -> Result<Page, ListingError> {
        let deadline = ctx.effective_deadline();

        let mut conn = self
            .pool
            .acquire(deadline)
            .await
            .map_err(ListingError::Connection)?;

        let rows = bounded(
            deadline,
            sqlx::query(LIST_QUERY).bind(PAGE_SIZE).fetch_all(&mut *conn),
        )
        .await
        .map_err(|cause| ListingError::query(LIST_QUERY, cause))?;

        let records = rows
            .iter()
            .map(decode_record)
            .collect::<Result<Vec<_>, _>>()?;

        let row = bounded(deadline, sqlx::query(COUNT_QUERY).fetch_one(&mut *conn))
            .await
            .map_err(|cause| ListingError::query(COUNT_QUERY, cause))?;
        let total: i64 = row.try_get(0).map_err(ScanError::Decode)?;

        debug!(records = records.len(), total, "customer page fetched");
        Ok(Page { records, total })
    }
}

/// Await a driver future, abandoning it at `deadline`.
async fn bounded<T, F>(deadline: Instant, fut: F) -> Result<T, Cause>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(Cause::Driver),
        Err(_) => Err(Cause::DeadlineExceeded),
    }
}

/// Decode one listing row through the column table.
fn decode_record(row: &PgRow) -> Result<Record, ScanError> {
    let ordinal = name_ordinal(row.columns().iter().map(|c| c.name()))?;
    let name = row.try_get::<String, _>(ordinal)?;
    Ok(Record { name })
}

/// Position of the display-name column among the result columns. Any column
/// outside [`RecordColumn`] is an error, as is a row without a name.
fn name_ordinal<'c>(names: impl Iterator<Item = &'c str>) -> Result<usize, ScanError> {
    let mut ordinal = None;

    for (i, name) in names.enumerate() {
        match RecordColumn::from_name(name) {
            Some(RecordColumn::Name) => ordinal = Some(i),
            None => return Err(ScanError::UnrecognizedColumn(name.to_string())),
        }
    }

    ordinal.ok_or(ScanError::MissingColumn("c_name"))
}
