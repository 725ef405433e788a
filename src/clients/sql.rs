//! Relational-query collaborator used by the `query` tool.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Connection, Row, Sqlite, SqliteConnection, TypeInfo, ValueRef};
use thiserror::Error;

use crate::tools::filter::{is_identifier, quote_ident, Filter, Literal};

pub type RowMap = Map<String, JsonValue>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    #[error("no database configured")]
    NotConfigured,
    #[error("invalid relation name '{0}'")]
    InvalidRelation(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("query failed: {0}")]
    Execute(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    All,
    Named(Vec<String>),
}

/// A bounded `SELECT` against the executor's fixed relation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub columns: Columns,
    pub filter: Option<Filter>,
    pub limit: u32,
}

impl SelectQuery {
    /// Build parameterized SQL. Column names in `columns` and in the filter
    /// were checked by the caller; the relation is checked here.
    pub fn to_sql(&self, relation: &str) -> Result<(String, Vec<Literal>), QueryFailure> {
        let relation = quote_relation(relation)?;
        let cols = match &self.columns {
            Columns::All => "*".to_string(),
            Columns::Named(names) => names.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
        };
        let mut params = Vec::new();
        let mut sql = format!("SELECT {cols} FROM {relation}");
        if let Some(f) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&f.to_sql(&mut params));
        }
        sql.push_str(" LIMIT ?");
        params.push(Literal::Integer(i64::from(self.limit)));
        Ok((sql, params))
    }
}

/// `table` or `schema.table`, each part an identifier.
pub fn quote_relation(relation: &str) -> Result<String, QueryFailure> {
    let parts: Vec<&str> = relation.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| is_identifier(p)) {
        return Err(QueryFailure::InvalidRelation(relation.to_string()));
    }
    Ok(parts.iter().map(|p| quote_ident(p)).collect::<Vec<_>>().join("."))
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &SelectQuery) -> Result<Vec<RowMap>, QueryFailure>;
}

/// Executor used when no database URL is configured; every call fails.
#[derive(Clone, Default)]
pub struct UnconfiguredExecutor;

#[async_trait]
impl QueryExecutor for UnconfiguredExecutor {
    async fn execute(&self, _query: &SelectQuery) -> Result<Vec<RowMap>, QueryFailure> {
        Err(QueryFailure::NotConfigured)
    }
}

/// Opens a new connection for every query and closes it before returning.
#[derive(Clone)]
pub struct SqliteQueryExecutor {
    url: String,
    relation: String,
}

impl SqliteQueryExecutor {
    pub fn new(url: impl Into<String>, relation: impl Into<String>) -> Result<Self, QueryFailure> {
        let relation = relation.into();
        quote_relation(&relation)?;
        Ok(Self { url: url.into(), relation })
    }
}

#[async_trait]
impl QueryExecutor for SqliteQueryExecutor {
    async fn execute(&self, query: &SelectQuery) -> Result<Vec<RowMap>, QueryFailure> {
        let (sql, params) = query.to_sql(&self.relation)?;
        tracing::debug!(sql = %sql, params = params.len(), "executing query");

        let mut conn = SqliteConnection::connect(&self.url)
            .await
            .map_err(|e| QueryFailure::Connect(e.to_string()))?;
        let result = fetch(&mut conn, &sql, params).await;
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close query connection");
        }
        result
    }
}

async fn fetch(
    conn: &mut SqliteConnection,
    sql: &str,
    params: Vec<Literal>,
) -> Result<Vec<RowMap>, QueryFailure> {
    let mut q = sqlx::query::<Sqlite>(sql);
    for p in params {
        q = bind(q, p);
    }
    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| QueryFailure::Execute(e.to_string()))?;
    Ok(rows.iter().map(row_to_json).collect())
}

fn bind<'q>(
    q: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    p: Literal,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match p {
        Literal::Integer(i) => q.bind(i),
        Literal::Real(f) => q.bind(f),
        Literal::Text(s) => q.bind(s),
        Literal::Bool(b) => q.bind(b),
    }
}

fn row_to_json(row: &SqliteRow) -> RowMap {
    let mut out = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        out.insert(col.name().to_string(), cell(row, i));
    }
    out
}

fn cell(row: &SqliteRow, i: usize) -> JsonValue {
    let type_name = match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return JsonValue::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(_) => return JsonValue::Null,
    };
    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(i).map(JsonValue::from).unwrap_or(JsonValue::Null),
        "REAL" => row.try_get::<f64, _>(i).map(JsonValue::from).unwrap_or(JsonValue::Null),
        "BLOB" => row.try_get::<Vec<u8>, _>(i).map(JsonValue::from).unwrap_or(JsonValue::Null),
        _ => row
            .try_get::<String, _>(i)
            .map(JsonValue::from)
            .or_else(|_| row.try_get::<i64, _>(i).map(JsonValue::from))
            .or_else(|_| row.try_get::<f64, _>(i).map(JsonValue::from))
            .unwrap_or(JsonValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::filter::parse;

    async fn fixture() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("fixture.db").display());
        let mut conn = SqliteConnection::connect(&url).await.unwrap();
        sqlx::query(
            "CREATE TABLE records (id INTEGER PRIMARY KEY, name TEXT, score REAL, note TEXT, raw BLOB)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        for (id, name, score) in [(1, "alpha", 1.5), (2, "beta", 2.5), (3, "gamma", 3.5)] {
            sqlx::query("INSERT INTO records (id, name, score, note, raw) VALUES (?, ?, ?, NULL, x'0102')")
                .bind(id)
                .bind(name)
                .bind(score)
                .execute(&mut conn)
                .await
                .unwrap();
        }
        conn.close().await.unwrap();
        (dir, url)
    }

    fn select(columns: Columns, filter: Option<&str>, limit: u32) -> SelectQuery {
        SelectQuery { columns, filter: filter.and_then(|f| parse(f).unwrap()), limit }
    }

    #[test]
    fn sql_uses_placeholders_for_values_and_limit() {
        let q = select(Columns::Named(vec!["id".into(), "name".into()]), Some("name = 'x'"), 5);
        let (sql, params) = q.to_sql("main.records").unwrap();
        assert_eq!(sql, "SELECT [id], [name] FROM [main].[records] WHERE [name] = ? LIMIT ?");
        assert_eq!(params, vec![Literal::Text("x".into()), Literal::Integer(5)]);
    }

    #[test]
    fn relation_names_are_validated() {
        assert!(quote_relation("records").is_ok());
        assert!(quote_relation("a.b.c").is_err());
        assert!(quote_relation("records; drop").is_err());
        assert!(SqliteQueryExecutor::new("sqlite::memory:", "bad name").is_err());
    }

    #[tokio::test]
    async fn unconfigured_executor_always_fails() {
        let err = UnconfiguredExecutor.execute(&select(Columns::All, None, 1)).await.unwrap_err();
        assert_eq!(err, QueryFailure::NotConfigured);
    }

    #[tokio::test]
    async fn sqlite_executor_returns_typed_rows() {
        let (_dir, url) = fixture().await;
        let exec = SqliteQueryExecutor::new(url, "records").unwrap();
        let rows = exec
            .execute(&select(Columns::All, Some("score > 2 AND name != 'gamma'"), 10))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 2);
        assert_eq!(rows[0]["name"], "beta");
        assert_eq!(rows[0]["score"], 2.5);
        assert!(rows[0]["note"].is_null());
        assert_eq!(rows[0]["raw"], serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn sqlite_executor_applies_limit_and_columns() {
        let (_dir, url) = fixture().await;
        let exec = SqliteQueryExecutor::new(url, "records").unwrap();
        let rows = exec
            .execute(&select(Columns::Named(vec!["name".into()]), None, 2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 1);
        assert!(rows[0].contains_key("name"));
    }

    #[tokio::test]
    async fn sqlite_executor_surfaces_failures() {
        let (_dir, url) = fixture().await;
        let missing_table = SqliteQueryExecutor::new(url.clone(), "nope").unwrap();
        let err = missing_table.execute(&select(Columns::All, None, 1)).await.unwrap_err();
        assert!(matches!(err, QueryFailure::Execute(_)));

        let missing_column = SqliteQueryExecutor::new(url, "records").unwrap();
        let err = missing_column
            .execute(&select(Columns::Named(vec!["ghost".into()]), None, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryFailure::Execute(_)));
    }
}
