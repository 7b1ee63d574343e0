//! CLI runner - executes commands

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config;
use crate::cursor;
use crate::engine::{Connection, PageEngine, PageRequest};
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::sortkey::{ColumnSpec, SortKeyRegistry, ValueKind};
use crate::source::{QuerySource, SqliteSource};
use crate::types::{JsonValue, Row};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Validate => self.validate(),
            Commands::Keys => self.keys(),
            Commands::DecodeCursor { token, sort_key } => {
                self.decode_cursor(token, sort_key.as_deref())
            }
            Commands::Page {
                database,
                table,
                primary_key,
                sort_key,
                first,
                last,
                after,
                before,
                filter,
            } => {
                let request = Self::build_request(
                    sort_key.as_deref(),
                    *first,
                    *last,
                    after.as_deref(),
                    before.as_deref(),
                    filter.as_deref(),
                )?;
                self.page(database, table, primary_key, request).await
            }
            Commands::Count {
                database,
                table,
                primary_key,
                filter,
            } => {
                self.count(database, table, primary_key, filter.as_deref())
                    .await
            }
        }
    }

    /// Load the sort-key registry
    fn load_registry(&self) -> Result<SortKeyRegistry> {
        let path = self
            .cli
            .registry
            .as_ref()
            .ok_or_else(|| Error::config("Registry file not specified (use -r flag)"))?;
        config::load_registry(path)
    }

    /// Parse an inline JSON filter expression
    fn parse_filter(filter: Option<&str>) -> Result<Option<Expr>> {
        filter
            .map(|text| {
                serde_json::from_str(text)
                    .map_err(|e| Error::config(format!("Invalid filter JSON: {e}")))
            })
            .transpose()
    }

    /// Assemble a page request from CLI flags
    fn build_request(
        sort_key: Option<&str>,
        first: Option<i64>,
        last: Option<i64>,
        after: Option<&str>,
        before: Option<&str>,
        filter: Option<&str>,
    ) -> Result<PageRequest> {
        let mut request = PageRequest::new();
        if let Some(name) = sort_key {
            request = request.with_sort_key(name);
        }
        if let Some(n) = first {
            request = request.with_first(n);
        }
        if let Some(n) = last {
            request = request.with_last(n);
        }
        if let Some(token) = after {
            request = request.with_after(token);
        }
        if let Some(token) = before {
            request = request.with_before(token);
        }
        if let Some(expr) = Self::parse_filter(filter)? {
            request = request.with_filter(expr);
        }
        Ok(request)
    }

    /// Validate a registry file
    fn validate(&self) -> Result<()> {
        let registry = self.load_registry()?;

        match self.cli.output {
            OutputFormat::Table => {
                let default = registry.default_key().unwrap_or("(none)");
                println!("ok: {} sort keys, default {}", registry.len(), default);
            }
            OutputFormat::Json | OutputFormat::Jsonl => {
                self.emit(&json!({
                    "status": "ok",
                    "sortKeys": registry.names(),
                    "defaultSortKey": registry.default_key(),
                }));
            }
        }

        Ok(())
    }

    /// List registered sort keys and their columns
    fn keys(&self) -> Result<()> {
        let registry = self.load_registry()?;
        let names = registry.names();

        match self.cli.output {
            OutputFormat::Json => {
                let keys: Vec<JsonValue> = names
                    .iter()
                    .filter_map(|name| registry.get(name))
                    .map(|spec| {
                        json!({
                            "name": &spec.name,
                            "default": registry.default_key() == Some(spec.name.as_str()),
                            "columns": &spec.columns,
                        })
                    })
                    .collect();
                self.emit(&json!({ "sortKeys": keys }));
            }
            OutputFormat::Jsonl => {
                for name in &names {
                    if let Some(spec) = registry.get(name) {
                        self.emit(&json!({
                            "name": &spec.name,
                            "default": registry.default_key() == Some(spec.name.as_str()),
                            "columns": &spec.columns,
                        }));
                    }
                }
            }
            OutputFormat::Table => {
                let rows: Vec<Row> = names
                    .iter()
                    .filter_map(|name| registry.get(name))
                    .map(|spec| {
                        let mut row = Row::new();
                        row.insert("name".to_string(), json!(&spec.name));
                        row.insert(
                            "default".to_string(),
                            json!(registry.default_key() == Some(spec.name.as_str())),
                        );
                        row.insert(
                            "columns".to_string(),
                            json!(describe_columns(&spec.columns)),
                        );
                        row
                    })
                    .collect();
                print!("{}", render_table(&rows));
            }
        }

        Ok(())
    }

    /// Decode a cursor token
    fn decode_cursor(&self, token: &str, sort_key: Option<&str>) -> Result<()> {
        // With a sort key the registry supplies the arity check and
        // column names; without one the raw tuple is printed as-is.
        let spec = match sort_key {
            Some(name) => {
                let registry = self.load_registry()?;
                Some(registry.resolve(Some(name))?)
            }
            None => None,
        };

        let tuple = match &spec {
            Some(spec) => cursor::decode(token, spec)?,
            None => cursor::decode_unchecked(token)?,
        };

        match self.cli.output {
            OutputFormat::Json | OutputFormat::Jsonl => {
                self.emit(&JsonValue::Array(tuple));
            }
            OutputFormat::Table => {
                let rows: Vec<Row> = tuple
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let column = spec
                            .as_ref()
                            .and_then(|s| s.columns.get(i))
                            .map_or_else(|| format!("[{i}]"), |c| c.column.clone());
                        let mut row = Row::new();
                        row.insert("column".to_string(), json!(column));
                        row.insert("value".to_string(), value);
                        row
                    })
                    .collect();
                print!("{}", render_table(&rows));
            }
        }

        Ok(())
    }

    /// Run a page query against a SQLite database
    async fn page(
        &self,
        database: &Path,
        table: &str,
        primary_key: &str,
        request: PageRequest,
    ) -> Result<()> {
        let registry = Arc::new(self.load_registry()?);
        let source = Arc::new(SqliteSource::open(database, table, primary_key)?);
        let engine = PageEngine::new(registry, source);

        let connection = engine.get_connection(&request).await?;
        self.print_connection(&connection)
    }

    /// Run the total-count query against a SQLite database
    async fn count(
        &self,
        database: &Path,
        table: &str,
        primary_key: &str,
        filter: Option<&str>,
    ) -> Result<()> {
        let filter = Self::parse_filter(filter)?;
        let source = SqliteSource::open(database, table, primary_key)?;
        let total = source.count(filter.as_ref()).await?;

        match self.cli.output {
            OutputFormat::Table => println!("{total}"),
            OutputFormat::Json | OutputFormat::Jsonl => {
                self.emit(&json!({ "totalCount": total }));
            }
        }

        Ok(())
    }

    /// Print a connection per the selected format
    fn print_connection(&self, connection: &Connection) -> Result<()> {
        match self.cli.output {
            OutputFormat::Json => {
                self.emit(&serde_json::to_value(connection)?);
            }
            OutputFormat::Jsonl => {
                for edge in &connection.edges {
                    self.emit(&serde_json::to_value(edge)?);
                }
                self.emit(&json!({
                    "pageInfo": &connection.page_info,
                    "totalCount": connection.total_count,
                }));
            }
            OutputFormat::Table => {
                let nodes: Vec<Row> = connection
                    .edges
                    .iter()
                    .map(|edge| edge.node.clone())
                    .collect();
                print!("{}", render_table(&nodes));
                println!(
                    "({} rows, hasNextPage {}, totalCount {})",
                    connection.edges.len(),
                    connection.page_info.has_next_page,
                    connection.total_count
                );
            }
        }

        Ok(())
    }

    /// Print a JSON document
    fn emit(&self, doc: &JsonValue) {
        println!("{}", serde_json::to_string(doc).unwrap_or_default());
    }
}

/// One-line description of a sort key's columns
fn describe_columns(columns: &[ColumnSpec]) -> String {
    let parts: Vec<String> = columns
        .iter()
        .map(|col| {
            let mut text = format!("{} {}", col.column, col.direction.as_sql().to_lowercase());
            if col.reversible {
                text.push_str(" reversible");
            }
            match &col.value_kind {
                ValueKind::Plain => {}
                ValueKind::Timestamp => text.push_str(" timestamp"),
                ValueKind::Cast(ty) => {
                    text.push_str(" cast(");
                    text.push_str(ty);
                    text.push(')');
                }
            }
            text
        })
        .collect();
    parts.join(", ")
}

/// Render rows as aligned columns, header first
fn render_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)\n".to_string();
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    let mut lines: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let line: Vec<String> = headers
            .iter()
            .map(|header| cell_text(row.get(*header)))
            .collect();
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
        lines.push(line);
    }

    let mut out = String::new();
    append_row(&mut out, &headers, &widths);
    for line in &lines {
        let cells: Vec<&str> = line.iter().map(String::as_str).collect();
        append_row(&mut out, &cells, &widths);
    }
    out
}

fn append_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        if i + 1 < cells.len() {
            out.push_str(&format!("{cell:<width$}", width = widths[i]));
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Cell text for a JSON value: bare strings, JSON for the rest
fn cell_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortDirection;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(pairs: &[(&str, JsonValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            row(&[("id", json!(1)), ("name", json!("short"))]),
            row(&[("id", json!(25)), ("name", json!("much longer name"))]),
        ];

        let rendered = render_table(&rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "id  name");
        assert_eq!(lines[1], "1   short");
        assert_eq!(lines[2], "25  much longer name");
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&[]), "(no rows)\n");
    }

    #[test]
    fn test_cell_text_renders_values() {
        assert_eq!(cell_text(Some(&json!("plain"))), "plain");
        assert_eq!(cell_text(Some(&json!(3.5))), "3.5");
        assert_eq!(cell_text(Some(&json!(null))), "");
        assert_eq!(cell_text(None), "");
    }

    #[test]
    fn test_describe_columns() {
        let columns = vec![
            ColumnSpec::new("created_at")
                .with_direction(SortDirection::Desc)
                .timestamp()
                .reversible(),
            ColumnSpec::new("id"),
        ];
        assert_eq!(
            describe_columns(&columns),
            "created_at desc reversible timestamp, id asc"
        );
    }

    #[test]
    fn test_build_request_parses_filter() {
        let filter = r#"{"compare":{"column":{"column":"status"},"op":"eq","value":"active"}}"#;
        let request =
            Runner::build_request(Some("chrono"), Some(5), None, None, None, Some(filter));
        assert!(request.is_ok());

        let bad = Runner::build_request(None, None, None, None, None, Some("{nope"));
        assert!(matches!(bad, Err(Error::Config { .. })));
    }
}
