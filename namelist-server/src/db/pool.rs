//! Database connection pool management
//!
//! Wraps a sqlx `PgPool` with explicit connection limits. The pool is opened
//! lazily: physical connections are made on first acquire, so opening only
//! fails on bad options unless `verify_on_open` asks for a round trip.
//!
//! The sqlx pool retries refused connections with backoff until its acquire
//! timeout. A request gets one dial instead: when the pool would have to open
//! a new connection, [`StorePool::acquire`] dials once itself and reports the
//! failure as-is.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::{Connection, Postgres};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

use crate::config::ConnectionDescriptor;
use crate::deadline::QUERY_CEILING;
use crate::error::{Cause, ConnectionError};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Pool tuning.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// Driver-side bound on acquisition; the request deadline usually fires first.
    pub acquire_timeout: Duration,
    /// Run `SELECT 1` while opening and fail if the store is unreachable.
    pub verify_on_open: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: QUERY_CEILING,
            verify_on_open: false,
        }
    }
}

/// Process-wide handle to the store. Cloning shares the same pool.
#[derive(Clone, Debug)]
pub struct StorePool {
    pool: PgPool,
    options: PgConnectOptions,
    max_connections: u32,
}

impl StorePool {
    /// Open the pool for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Options`] if the driver rejects the
    /// descriptor, and [`ConnectionError::Connect`] if `verify_on_open` is set
    /// and the store cannot be reached.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let descriptor = config::resolve(Some(&dsn), &Overrides::default())?;
    /// let pool = StorePool::open(&descriptor, PoolSettings::default()).await?;
    /// ```
    pub async fn open(
        descriptor: &ConnectionDescriptor,
        settings: PoolSettings,
    ) -> Result<Self, ConnectionError> {
        let options = descriptor.connect_options()?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_lazy_with(options.clone());

        if settings.verify_on_open {
            sqlx::query("SELECT 1")
                .execute(&pool)
                .await
                .map_err(|source| ConnectionError::Connect {
                    target: descriptor.redacted_url(),
                    source,
                })?;
            info!(store = %descriptor, "store connection verified");
        }

        info!(
            store = %descriptor,
            max_connections = settings.max_connections,
            "connection pool opened"
        );
        Ok(Self {
            pool,
            options,
            max_connections: settings.max_connections,
        })
    }

    /// Check out a connection, giving up at `deadline`.
    ///
    /// An idle connection is handed out directly. If the pool has room to
    /// grow, the store is dialled once first; a refused or failed dial is
    /// returned immediately instead of being retried. A full pool is waited
    /// on until the deadline. The returned guard goes back to the pool when
    /// dropped.
    pub async fn acquire(&self, deadline: Instant) -> Result<PoolConnection<Postgres>, Cause> {
        if Instant::now() >= deadline {
            return Err(Cause::DeadlineExceeded);
        }

        if let Some(conn) = self.pool.try_acquire() {
            return Ok(conn);
        }

        if self.pool.size() < self.max_connections {
            self.dial_once(deadline).await?;
        }

        match timeout_at(deadline, self.pool.acquire()).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(Cause::Driver(e)),
            Err(_) => Err(Cause::DeadlineExceeded),
        }
    }

    /// Single connection attempt against the store, closed straight away.
    async fn dial_once(&self, deadline: Instant) -> Result<(), Cause> {
        let conn = match timeout_at(deadline, PgConnection::connect_with(&self.options)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(Cause::Driver(e)),
            Err(_) => return Err(Cause::DeadlineExceeded),
        };

        // The pool opens its own connection next; a failed close is harmless.
        if let Ok(Err(e)) = timeout_at(deadline, conn.close()).await {
            debug!("closing store dial failed: {}", e);
        }
        Ok(())
    }

    /// Close all connections; waits for checked-out ones to come back.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
