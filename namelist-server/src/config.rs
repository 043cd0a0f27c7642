//! Connection descriptor resolution
//!
//! Builds a validated PostgreSQL connection descriptor from a base connection
//! string plus optional overrides. Nothing here reads the environment: the
//! binary collects the values (flags or env vars) and hands them in.
//!
//! Accepted grammar:
//!
//! ```text
//! postgres://[user[:password]@]host[:port][/database][?schema=name&param=value...]
//! ```
//!
//! `schema` is reserved and becomes the connection's `search_path`. Every other
//! query parameter is passed through to the driver untouched. A host is
//! required in the authority; Unix-socket paths given as `?host=` are not
//! supported.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;
use url::{form_urlencoded, Url};

/// Query parameter that carries the schema name.
const SCHEMA_PARAM: &str = "schema";

/// Characters left as-is when re-encoding user, password and database.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Configuration failures. All of them are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base connection string is not specified")]
    MissingDsn,

    #[error("connection string cannot be parsed: {reason}")]
    InvalidDsn { reason: String },

    #[error("unsupported connection string scheme '{scheme}' (expected postgres or postgresql)")]
    UnsupportedScheme { scheme: String },

    #[error("connection string has no host (Unix-socket `host=` parameters are not supported)")]
    MissingHost,
}

/// Optional values that replace the ones embedded in the base string.
///
/// An empty string counts as absent.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

/// Fully specified connection target. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    host: String,
    port: Option<u16>,
    user: String,
    password: String,
    database: String,
    schema: String,
    params: BTreeMap<String, String>,
}

/// Password-free view of a descriptor, for logs and `namelist config`.
#[derive(Debug, Serialize)]
pub struct DescriptorSummary<'a> {
    pub host: &'a str,
    pub port: Option<u16>,
    pub user: &'a str,
    pub password_set: bool,
    pub database: &'a str,
    pub schema: &'a str,
    pub params: &'a BTreeMap<String, String>,
}

/// Resolve the descriptor used to open the pool.
///
/// For each override that is present, its value wins over the base string.
/// Username and password travel together: a username override replaces the
/// password as well, with an empty one if no password override was given. A
/// password override on its own is ignored.
///
/// The result is checked against the driver's own parser before it is
/// returned, so a descriptor that comes back `Ok` is one the pool will accept.
pub fn resolve(base: Option<&str>, overrides: &Overrides) -> Result<ConnectionDescriptor, ConfigError> {
    let base = base
        .filter(|dsn| !dsn.trim().is_empty())
        .ok_or(ConfigError::MissingDsn)?;

    let mut descriptor = ConnectionDescriptor::parse(base)?;

    if let Some(username) = present(&overrides.username) {
        descriptor.user = username.to_string();
        descriptor.password = present(&overrides.password).unwrap_or_default().to_string();
    }
    if let Some(database) = present(&overrides.database) {
        descriptor.database = database.to_string();
    }
    if let Some(schema) = present(&overrides.schema) {
        descriptor.schema = schema.to_string();
    }

    descriptor.connect_options()?;
    Ok(descriptor)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn decode(raw: &str, field: &str) -> Result<String, ConfigError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ConfigError::InvalidDsn {
            reason: format!("{} is not valid UTF-8: {}", field, e),
        })
}

impl ConnectionDescriptor {
    /// Parse a connection string into its fields.
    pub fn parse(dsn: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(dsn.trim()).map_err(|e| ConfigError::InvalidDsn {
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "postgres" | "postgresql" => {}
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingHost)?
            .to_string();

        let user = decode(url.username(), "user")?;
        let password = match url.password() {
            Some(raw) => decode(raw, "password")?,
            None => String::new(),
        };
        let database = decode(url.path().trim_start_matches('/'), "database")?;

        let mut schema = String::new();
        let mut params = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            if key == SCHEMA_PARAM {
                schema = value.into_owned();
            } else {
                params.insert(key.into_owned(), value.into_owned());
            }
        }

        Ok(Self {
            host,
            port: url.port(),
            user,
            password,
            database,
            schema,
            params,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Store-specific parameters other than the schema.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Reassemble the full connection string, schema included.
    pub fn to_url(&self) -> String {
        self.build_url(false, true)
    }

    /// Connection string with the password masked.
    pub fn redacted_url(&self) -> String {
        self.build_url(true, true)
    }

    pub fn summary(&self) -> DescriptorSummary<'_> {
        DescriptorSummary {
            host: &self.host,
            port: self.port,
            user: &self.user,
            password_set: !self.password.is_empty(),
            database: &self.database,
            schema: &self.schema,
            params: &self.params,
        }
    }

    /// Driver options for this descriptor.
    ///
    /// The reassembled string is run through the driver's own parser, so
    /// parameters it rejects (e.g. an unknown `sslmode`) surface here.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let url = self.build_url(false, false);
        let options = PgConnectOptions::from_str(&url).map_err(|e| ConfigError::InvalidDsn {
            reason: e.to_string(),
        })?;

        if self.schema.is_empty() {
            Ok(options)
        } else {
            Ok(options.options([("search_path", self.schema.as_str())]))
        }
    }

    fn build_url(&self, mask_password: bool, with_schema: bool) -> String {
        let mut out = String::from("postgres://");

        if !self.user.is_empty() || !self.password.is_empty() {
            out.extend(utf8_percent_encode(&self.user, COMPONENT));
            if !self.password.is_empty() {
                out.push(':');
                if mask_password {
                    out.push_str("***");
                } else {
                    out.extend(utf8_percent_encode(&self.password, COMPONENT));
                }
            }
            out.push('@');
        }

        out.push_str(&self.host);
        if let Some(port) = self.port {
            out.push_str(&format!(":{}", port));
        }

        out.push('/');
        out.extend(utf8_percent_encode(&self.database, COMPONENT));

        let mut query = form_urlencoded::Serializer::new(String::new());
        if with_schema && !self.schema.is_empty() {
            query.append_pair(SCHEMA_PARAM, &self.schema);
        }
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }
        let query = query.finish();
        if !query.is_empty() {
            out.push('?');
            out.push_str(&query);
        }

        out
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted_url())
    }
}
