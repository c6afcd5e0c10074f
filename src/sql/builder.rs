//! Query clause builder: request-level search/filter/sort/page intent into SQL fragments plus positional binds.
//!
//! Fragments use `?` placeholders so they can be composed freely; [`number_placeholders`] turns the
//! final statement into PostgreSQL's `$1..$n` form. Column names only ever come from static config.

use super::params::BindValue;
use crate::config::QueryConfig;
use std::collections::HashMap;

/// Parsed filter values keyed by column name.
pub type Filters = HashMap<String, BindValue>;

/// A SQL fragment and the values for its placeholders, in placeholder order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub values: Vec<BindValue>,
}

impl SqlFragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Per-request list options. `filters` are already parsed (see `service::parse_filters`).
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub filters: Filters,
}

/// WHERE / ORDER BY / LIMIT fragments for one list query.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryClauses {
    /// `WHERE ...` or empty.
    pub where_sql: String,
    /// Always `ORDER BY <column> <ASC|DESC>`.
    pub sort_sql: String,
    /// `LIMIT ? OFFSET ?` or empty.
    pub page_sql: String,
    /// Search values, then filter values, then pagination values.
    pub values: Vec<BindValue>,
    /// How many leading entries of `values` belong to `where_sql`.
    pub where_value_count: usize,
}

impl QueryClauses {
    /// Appends the clauses to `base` (a `SELECT ... FROM ...` prefix) in bind order.
    pub fn apply_to(&self, base: &str) -> String {
        let mut sql = base.to_string();
        for part in [&self.where_sql, &self.sort_sql, &self.page_sql] {
            if !part.is_empty() {
                sql.push(' ');
                sql.push_str(part);
            }
        }
        sql
    }

    /// Values for a statement that only uses `where_sql` (e.g. a COUNT).
    pub fn where_values(&self) -> &[BindValue] {
        &self.values[..self.where_value_count]
    }
}

/// `(a ILIKE ? OR b ILIKE ?)`, one `%search%` per column. Empty search or no columns yields nothing.
pub fn build_search_clause(search: Option<&str>, columns: &[&str]) -> SqlFragment {
    let search = match search {
        Some(s) if !s.is_empty() && !columns.is_empty() => s,
        _ => return SqlFragment::default(),
    };
    let pattern = format!("%{}%", search);
    let parts: Vec<String> = columns.iter().map(|c| format!("{} ILIKE ?", c)).collect();
    SqlFragment {
        sql: format!("({})", parts.join(" OR ")),
        values: columns.iter().map(|_| BindValue::Text(pattern.clone())).collect(),
    }
}

/// `a = ? AND b = ?` for every allow-listed column present in `filters`, in allow-list order.
/// Keys outside the allow-list never reach SQL.
pub fn build_filter_clause(filters: &Filters, filterable: &[&str]) -> SqlFragment {
    let mut parts = Vec::new();
    let mut values = Vec::new();
    for col in filterable {
        if let Some(v) = filters.get(*col) {
            parts.push(format!("{} = ?", col));
            values.push(v.clone());
        }
    }
    SqlFragment {
        sql: parts.join(" AND "),
        values,
    }
}

/// Resolve `-col`, `col:asc|desc` or `col` against the allow-list. Anything unknown yields `fallback` verbatim.
pub fn build_sort_clause(sort: Option<&str>, sortable: &[&str], fallback: &str) -> String {
    let Some(sort) = sort.filter(|s| !s.is_empty()) else {
        return fallback.to_string();
    };
    let (column, descending) = if let Some(rest) = sort.strip_prefix('-') {
        (rest, true)
    } else if let Some((col, dir)) = sort.split_once(':') {
        (col, dir.eq_ignore_ascii_case("desc"))
    } else {
        (sort, false)
    };
    match sortable.iter().find(|c| **c == column) {
        Some(col) => format!("{} {}", col, if descending { "DESC" } else { "ASC" }),
        None => fallback.to_string(),
    }
}

/// `LIMIT ? OFFSET ?` with `[limit, offset]`, only when both are given. Both are clamped to at least 1.
pub fn build_pagination_clause(page: Option<i64>, limit: Option<i64>) -> SqlFragment {
    let (Some(page), Some(limit)) = (page, limit) else {
        return SqlFragment::default();
    };
    let page = page.max(1);
    let limit = limit.max(1);
    let offset = (page - 1).saturating_mul(limit);
    SqlFragment {
        sql: "LIMIT ? OFFSET ?".to_string(),
        values: vec![BindValue::I64(limit), BindValue::I64(offset)],
    }
}

pub fn build_query_clauses(options: &QueryOptions, config: &QueryConfig) -> QueryClauses {
    let search = build_search_clause(options.search.as_deref(), config.searchable);
    let filter = build_filter_clause(&options.filters, config.filterable);
    let sort = build_sort_clause(options.sort.as_deref(), config.sortable, config.default_sort);
    let page = build_pagination_clause(options.page, options.limit);

    let conditions: Vec<&str> = [&search, &filter]
        .into_iter()
        .filter(|f| !f.is_empty())
        .map(|f| f.sql.as_str())
        .collect();
    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let mut values = search.values;
    values.extend(filter.values);
    let where_value_count = values.len();
    values.extend(page.values);

    QueryClauses {
        where_sql,
        sort_sql: format!("ORDER BY {}", sort),
        page_sql: page.sql,
        values,
        where_value_count,
    }
}

/// `a = ?, b = ?` in the given order. Empty input yields an empty fragment; callers must skip the UPDATE.
pub fn build_set_clause<K: AsRef<str>>(updates: &[(K, BindValue)]) -> SqlFragment {
    SqlFragment {
        sql: updates
            .iter()
            .map(|(k, _)| format!("{} = ?", k.as_ref()))
            .collect::<Vec<_>>()
            .join(", "),
        values: updates.iter().map(|(_, v)| v.clone()).collect(),
    }
}

/// Rewrite `?` placeholders as `$1, $2, ...` left to right.
pub fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for c in sql.chars() {
        if c == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> BindValue {
        BindValue::Text(s.to_string())
    }

    #[test]
    fn unknown_sort_falls_back_verbatim() {
        assert_eq!(build_sort_clause(Some("unknown"), &["name"], "id ASC"), "id ASC");
        assert_eq!(build_sort_clause(Some("-unknown"), &["name"], "id ASC"), "id ASC");
        assert_eq!(build_sort_clause(Some("name; DROP TABLE planets"), &["name"], "id ASC"), "id ASC");
        assert_eq!(build_sort_clause(None, &["name"], "id ASC"), "id ASC");
        assert_eq!(build_sort_clause(Some(""), &["name"], "id ASC"), "id ASC");
    }

    #[test]
    fn sort_direction_forms() {
        let s = &["name"];
        assert_eq!(build_sort_clause(Some("-name"), s, "id ASC"), "name DESC");
        assert_eq!(build_sort_clause(Some("name:desc"), s, "id ASC"), "name DESC");
        assert_eq!(build_sort_clause(Some("name:DESC"), s, "id ASC"), "name DESC");
        assert_eq!(build_sort_clause(Some("name:bogus"), s, "id ASC"), "name ASC");
        assert_eq!(build_sort_clause(Some("name"), s, "id ASC"), "name ASC");
    }

    #[test]
    fn pagination_needs_both_values() {
        assert_eq!(build_pagination_clause(None, Some(10)), SqlFragment::default());
        assert_eq!(build_pagination_clause(Some(2), None), SqlFragment::default());
        let p = build_pagination_clause(Some(2), Some(10));
        assert_eq!(p.sql, "LIMIT ? OFFSET ?");
        assert_eq!(p.values, vec![BindValue::I64(10), BindValue::I64(10)]);
    }

    #[test]
    fn pagination_clamps_to_one() {
        let p = build_pagination_clause(Some(0), Some(-5));
        assert_eq!(p.values, vec![BindValue::I64(1), BindValue::I64(0)]);
    }

    #[test]
    fn filters_outside_allow_list_are_dropped() {
        let mut filters = Filters::new();
        filters.insert("name".into(), text("x"));
        filters.insert("hacked".into(), text("1=1"));
        let f = build_filter_clause(&filters, &["name"]);
        assert_eq!(f.sql, "name = ?");
        assert_eq!(f.values, vec![text("x")]);
    }

    #[test]
    fn search_spans_all_columns() {
        let s = build_search_clause(Some("ear"), &["name", "planet_type"]);
        assert_eq!(s.sql, "(name ILIKE ? OR planet_type ILIKE ?)");
        assert_eq!(s.values, vec![text("%ear%"), text("%ear%")]);
        assert!(build_search_clause(Some(""), &["name"]).is_empty());
        assert!(build_search_clause(Some("ear"), &[]).is_empty());
    }

    #[test]
    fn values_follow_fragment_order() {
        let config = QueryConfig {
            searchable: &["a", "b"],
            filterable: &["c"],
            sortable: &["a"],
            default_sort: "a ASC",
        };
        let mut options = QueryOptions {
            search: Some("abc".into()),
            ..Default::default()
        };
        options.filters.insert("c".into(), BindValue::I64(1));
        let q = build_query_clauses(&options, &config);
        assert_eq!(q.values, vec![text("%abc%"), text("%abc%"), BindValue::I64(1)]);
        assert_eq!(q.where_sql, "WHERE (a ILIKE ? OR b ILIKE ?) AND c = ?");
        assert_eq!(q.sort_sql, "ORDER BY a ASC");
        assert_eq!(q.page_sql, "");

        options.page = Some(3);
        options.limit = Some(5);
        let q = build_query_clauses(&options, &config);
        assert_eq!(q.where_values().len(), 3);
        assert_eq!(&q.values[3..], &[BindValue::I64(5), BindValue::I64(10)]);
        assert_eq!(
            number_placeholders(&q.apply_to("SELECT a FROM t")),
            "SELECT a FROM t WHERE (a ILIKE $1 OR b ILIKE $2) AND c = $3 ORDER BY a ASC LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn no_where_without_conditions() {
        let config = QueryConfig {
            searchable: &["a"],
            filterable: &[],
            sortable: &[],
            default_sort: "id ASC",
        };
        let q = build_query_clauses(&QueryOptions::default(), &config);
        assert_eq!(q.apply_to("SELECT * FROM t"), "SELECT * FROM t ORDER BY id ASC");
        assert!(q.values.is_empty());
    }

    #[test]
    fn set_clause_keeps_order() {
        let set = build_set_clause(&[("pressure_atm", BindValue::F64(2.0)), ("texture_url", text("x"))]);
        assert_eq!(set.sql, "pressure_atm = ?, texture_url = ?");
        assert_eq!(set.values, vec![BindValue::F64(2.0), text("x")]);
        assert!(build_set_clause::<&str>(&[]).is_empty());
    }
}
