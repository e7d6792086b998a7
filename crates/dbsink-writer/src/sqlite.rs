//! `rusqlite` adapter.
//!
//! [`SqliteConnectionFactory`] hands out either a fresh connection to a
//! database file per call, or a connection borrowed from an `r2d2` pool.
//! Parameters bind by name (`@p0`, ...). Date-times bind as
//! `YYYY-MM-DD HH:MM:SS.ffffff` text and enumerated levels as their ordinal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dbsink_sql::ColumnValue;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

use crate::connection::{ConnectionFactory, DbCommand, DbConnection};
use crate::error::DriverError;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for a file-backed pool.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum pool size (default: 4).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 5000).
    pub busy_timeout_ms: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Pragmas applied to each pooled connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
    }
}

#[derive(Clone)]
enum Source {
    File(PathBuf),
    Pool(ConnectionPool),
}

/// `rusqlite` connection factory.
#[derive(Clone)]
pub struct SqliteConnectionFactory {
    source: Source,
    busy_timeout: Duration,
}

impl SqliteConnectionFactory {
    /// Open a new connection to `path` on every call.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
            busy_timeout: Duration::from_millis(u64::from(PoolConfig::default().busy_timeout_ms)),
        }
    }

    /// Borrow connections from an existing pool.
    pub fn pooled(pool: ConnectionPool) -> Self {
        Self {
            source: Source::Pool(pool),
            busy_timeout: Duration::from_millis(u64::from(PoolConfig::default().busy_timeout_ms)),
        }
    }

    /// Build a WAL-mode pool over a database file.
    pub fn pool_file(path: impl AsRef<Path>, config: &PoolConfig) -> Result<Self, DriverError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(manager)?;
        Ok(Self::pooled(pool))
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    type Connection = SqliteConnection;

    fn connect(&self) -> Result<SqliteConnection, DriverError> {
        match &self.source {
            Source::File(path) => {
                let conn = Connection::open(path)?;
                conn.busy_timeout(self.busy_timeout)?;
                Ok(SqliteConnection::Owned(conn))
            }
            Source::Pool(pool) => Ok(SqliteConnection::Pooled(pool.get()?)),
        }
    }
}

/// A connection owned outright or borrowed from a pool.
pub enum SqliteConnection {
    /// Owned connection, closed on drop.
    Owned(Connection),
    /// Pooled connection, returned to the pool on drop.
    Pooled(PooledConnection),
}

impl SqliteConnection {
    fn raw(&self) -> &Connection {
        match self {
            Self::Owned(conn) => conn,
            Self::Pooled(conn) => &**conn,
        }
    }
}

impl DbConnection for SqliteConnection {
    type Command<'c> = SqliteCommand<'c>;

    fn open(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn create_command(&mut self) -> SqliteCommand<'_> {
        SqliteCommand {
            conn: self.raw(),
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

/// Command over a borrowed connection.
pub struct SqliteCommand<'c> {
    conn: &'c Connection,
    sql: String,
    params: Vec<(String, ColumnValue)>,
}

impl DbCommand for SqliteCommand<'_> {
    fn set_text(&mut self, sql: &str) {
        sql.clone_into(&mut self.sql);
    }

    fn add_parameter(&mut self, name: &str, value: &ColumnValue) {
        self.params.push((name.to_string(), value.clone()));
    }

    fn clear_parameters(&mut self) {
        self.params.clear();
    }

    /// Parameterless text may hold several statements (DDL scripts) and
    /// runs as a batch.
    fn execute_non_query(&mut self) -> Result<usize, DriverError> {
        if self.params.is_empty() {
            self.conn.execute_batch(&self.sql)?;
            return Ok(usize::try_from(self.conn.changes()).unwrap_or(usize::MAX));
        }
        let mut stmt = self.conn.prepare_cached(&self.sql)?;
        let values: Vec<SqlValue<'_>> = self.params.iter().map(|(_, v)| SqlValue(v)).collect();
        let named: Vec<(&str, &dyn ToSql)> = self
            .params
            .iter()
            .zip(values.iter())
            .map(|((name, _), value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        Ok(stmt.execute(named.as_slice())?)
    }
}

/// Binds a [`ColumnValue`] as a `SQLite` value.
struct SqlValue<'a>(&'a ColumnValue);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            ColumnValue::Null => ToSqlOutput::Owned(Value::Null),
            ColumnValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            ColumnValue::Int32(i) => ToSqlOutput::Owned(Value::Integer(i64::from(*i))),
            ColumnValue::Int64(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            ColumnValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            ColumnValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            ColumnValue::DateTime(dt) => {
                ToSqlOutput::Owned(Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()))
            }
            ColumnValue::Level(level) => ToSqlOutput::Owned(Value::Integer(i64::from(level.as_num()))),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
