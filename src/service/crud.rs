//! Generic CRUD execution against PostgreSQL for any `ResourceDef`.

use crate::config::ResourceDef;
use crate::error::AppError;
use crate::sql::{build_query_clauses, build_set_clause, number_placeholders, BindValue, QueryOptions};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool};

/// One page of rows plus the number of rows matching the same WHERE clause.
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: i64,
}

pub struct CrudService;

impl CrudService {
    /// Search, filter, sort and paginate. Without both `page` and `limit` every matching row is returned.
    pub async fn list(pool: &PgPool, resource: &ResourceDef, options: &QueryOptions) -> Result<Page, AppError> {
        let clauses = build_query_clauses(options, &resource.query);
        let select = format!("SELECT {} FROM {}", resource.select_list(), resource.table);
        let sql = number_placeholders(&clauses.apply_to(&select));
        let rows = fetch_all(pool, &sql, &clauses.values).await?;

        let count_sql = if clauses.where_sql.is_empty() {
            format!("SELECT COUNT(*) FROM {}", resource.table)
        } else {
            number_placeholders(&format!("SELECT COUNT(*) FROM {} {}", resource.table, clauses.where_sql))
        };
        let total = fetch_count(pool, &count_sql, clauses.where_values()).await?;
        Ok(Page { rows, total })
    }

    pub async fn read<'e>(
        exec: impl PgExecutor<'e>,
        resource: &ResourceDef,
        id: &BindValue,
    ) -> Result<Option<Value>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            resource.select_list(),
            resource.table,
            resource.pk
        );
        fetch_optional(exec, &sql, std::slice::from_ref(id)).await
    }

    /// INSERT the given columns; returns the created row.
    pub async fn create<'e>(
        exec: impl PgExecutor<'e>,
        resource: &ResourceDef,
        fields: &[(&str, BindValue)],
    ) -> Result<Value, AppError> {
        let sql = if fields.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", resource.table, resource.select_list())
        } else {
            let cols: Vec<&str> = fields.iter().map(|(c, _)| *c).collect();
            let placeholders = vec!["?"; fields.len()].join(", ");
            number_placeholders(&format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                resource.table,
                cols.join(", "),
                placeholders,
                resource.select_list()
            ))
        };
        let values: Vec<BindValue> = fields.iter().map(|(_, v)| v.clone()).collect();
        fetch_optional(exec, &sql, &values)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// UPDATE only the given columns. With no columns this degrades to a read.
    pub async fn update<'e>(
        exec: impl PgExecutor<'e>,
        resource: &ResourceDef,
        id: &BindValue,
        fields: &[(&str, BindValue)],
    ) -> Result<Option<Value>, AppError> {
        let set = build_set_clause(fields);
        if set.is_empty() {
            return Self::read(exec, resource, id).await;
        }
        let sql = number_placeholders(&format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
            resource.table,
            set.sql,
            resource.pk,
            resource.select_list()
        ));
        let mut values = set.values;
        values.push(id.clone());
        fetch_optional(exec, &sql, &values).await
    }

    /// DELETE by primary key; returns the deleted row.
    pub async fn delete<'e>(
        exec: impl PgExecutor<'e>,
        resource: &ResourceDef,
        id: &BindValue,
    ) -> Result<Option<Value>, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 RETURNING {}",
            resource.table,
            resource.pk,
            resource.select_list()
        );
        fetch_optional(exec, &sql, std::slice::from_ref(id)).await
    }
}

fn bind_all<'q>(
    sql: &'q str,
    params: &[BindValue],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = query.bind(p.clone());
    }
    query
}

pub(crate) async fn fetch_all<'e>(
    exec: impl PgExecutor<'e>,
    sql: &str,
    params: &[BindValue],
) -> Result<Vec<Value>, AppError> {
    tracing::debug!(sql = %sql, params = ?params, "query");
    let rows = bind_all(sql, params).fetch_all(exec).await?;
    Ok(rows.iter().map(row_to_json).collect())
}

pub(crate) async fn fetch_optional<'e>(
    exec: impl PgExecutor<'e>,
    sql: &str,
    params: &[BindValue],
) -> Result<Option<Value>, AppError> {
    tracing::debug!(sql = %sql, params = ?params, "query");
    let row = bind_all(sql, params).fetch_optional(exec).await?;
    Ok(row.map(|r| row_to_json(&r)))
}

pub(crate) async fn fetch_count<'e>(
    exec: impl PgExecutor<'e>,
    sql: &str,
    params: &[BindValue],
) -> Result<i64, AppError> {
    tracing::debug!(sql = %sql, params = ?params, "query");
    let mut query = sqlx::query_scalar::<sqlx::Postgres, i64>(sql);
    for p in params {
        query = query.bind(p.clone());
    }
    Ok(query.fetch_one(exec).await?)
}

pub(crate) async fn execute<'e>(
    exec: impl PgExecutor<'e>,
    sql: &str,
    params: &[BindValue],
) -> Result<u64, AppError> {
    tracing::debug!(sql = %sql, params = ?params, "execute");
    let done = bind_all(sql, params).execute(exec).await?;
    Ok(done.rows_affected())
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

/// Try the column types the catalog schema uses, narrowest first.
fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(f)) = row.try_get::<Option<f64>, _>(name) {
        return serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
