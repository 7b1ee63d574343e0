//! SQLite-backed query source
//!
//! Executes rendered plans against an embedded SQLite database. The
//! connection is not `Sync`, so it sits behind a tokio mutex; the lock
//! is held only for the duration of a single statement.

use crate::error::Result;
use crate::expr::Expr;
use crate::source::{QueryPlan, QuerySource};
use crate::sql::{self, Dialect, RenderedQuery};
use crate::types::{JsonObject, JsonValue, Row};
use anyhow::Context as _;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// Query source over a single SQLite table
pub struct SqliteSource {
    /// SQLite connection
    conn: Mutex<Connection>,
    /// Table queried by every plan
    table: String,
    /// Column counted by [`QuerySource::count`]
    primary_key: String,
}

impl SqliteSource {
    /// Open a database file
    pub fn open(
        path: impl AsRef<Path>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).with_context(|| {
            format!(
                "failed to open SQLite database at {}",
                path.as_ref().display()
            )
        })?;
        Ok(Self::from_connection(conn, table, primary_key))
    }

    /// Open an in-memory database. The caller is responsible for
    /// creating and populating the table.
    pub fn open_in_memory(table: impl Into<String>, primary_key: impl Into<String>) -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("failed to open in-memory SQLite database")?;
        Ok(Self::from_connection(conn, table, primary_key))
    }

    /// Wrap an existing connection
    pub fn from_connection(
        conn: Connection,
        table: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            conn: Mutex::new(conn),
            table: table.into(),
            primary_key: primary_key.into(),
        }
    }

    /// Run raw statements against the underlying connection, mainly
    /// for schema setup and seeding
    pub async fn execute_batch(&self, statements: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(statements)
            .context("failed to execute batch statement")?;
        Ok(())
    }

    /// Table this source reads from
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl QuerySource for SqliteSource {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Row>> {
        let RenderedQuery { sql, params } = sql::render_select(&self.table, plan, Dialect::Sqlite);

        tracing::debug!(sql = %sql, params = params.len(), "executing page query");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql).context("failed to prepare page query")?;
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter().map(bind_value)))
            .context("failed to execute page query")?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().context("failed to read row")? {
            let mut object = JsonObject::new();
            for (idx, name) in column_names.iter().enumerate() {
                let value = row
                    .get_ref(idx)
                    .with_context(|| format!("failed to read column '{name}'"))?;
                object.insert(name.clone(), sqlite_value_to_json(value));
            }
            out.push(object);
        }

        Ok(out)
    }

    async fn count(&self, filter: Option<&Expr>) -> Result<u64> {
        let RenderedQuery { sql, params } =
            sql::render_count(&self.table, &self.primary_key, filter, Dialect::Sqlite);

        tracing::debug!(sql = %sql, "executing count query");

        let conn = self.conn.lock().await;
        let total: i64 = conn
            .query_row(
                &sql,
                rusqlite::params_from_iter(params.iter().map(bind_value)),
                |row| row.get(0),
            )
            .context("failed to execute count query")?;

        Ok(u64::try_from(total).unwrap_or(0))
    }
}

/// Convert a JSON value to a SQLite bind value
fn bind_value(value: &JsonValue) -> rusqlite::types::Value {
    match value {
        JsonValue::Null => rusqlite::types::Value::Null,
        JsonValue::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                rusqlite::types::Value::Real(f)
            } else {
                rusqlite::types::Value::Text(n.to_string())
            }
        }
        JsonValue::String(s) => rusqlite::types::Value::Text(s.clone()),
        // Arrays and objects bind as their JSON text.
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

/// Convert a SQLite column value to a JSON value
fn sqlite_value_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::Number(i.into()),
        ValueRef::Real(f) => {
            serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
        }
        ValueRef::Text(t) => JsonValue::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => JsonValue::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            b,
        )),
    }
}
