//! Resource definition types. Every identifier that reaches SQL comes from one of these.

/// Storage kind of a column; drives body validation and filter parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Bool,
    Timestamp,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Accepted from request bodies on create/update.
    pub writable: bool,
    /// Must be present (and non-null) on create and full update.
    pub required: bool,
    /// `false` when the table column is NOT NULL; an explicit null is then rejected.
    pub nullable: bool,
    /// Regex a text value must match.
    pub pattern: Option<&'static str>,
}

impl ColumnDef {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        ColumnDef { name, kind, writable: true, required: true, nullable: false, pattern: None }
    }

    pub const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        ColumnDef { name, kind, writable: true, required: false, nullable: true, pattern: None }
    }

    /// Server-managed column (serial ids, timestamps).
    pub const fn generated(name: &'static str, kind: ColumnKind) -> Self {
        ColumnDef { name, kind, writable: false, required: false, nullable: true, pattern: None }
    }

    /// Optional in bodies, but backed by a NOT NULL column with a default.
    pub const fn not_null(self) -> Self {
        ColumnDef { nullable: false, ..self }
    }

    pub const fn with_pattern(self, pattern: &'static str) -> Self {
        ColumnDef { pattern: Some(pattern), ..self }
    }
}

/// Which columns take part in free-text search, exact-match filters and ordering.
#[derive(Clone, Copy, Debug)]
pub struct QueryConfig {
    /// Ordered; search fragments and their bind values follow this order.
    pub searchable: &'static [&'static str],
    pub filterable: &'static [&'static str],
    pub sortable: &'static [&'static str],
    /// Used verbatim as the ORDER BY term when no valid sort is requested, e.g. `"id ASC"`.
    pub default_sort: &'static str,
}

/// Coercion applied to a raw (query-string) filter value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterParser {
    Integer,
    Float,
    Text,
    Bool,
}

#[derive(Debug)]
pub struct ResourceDef {
    /// URL path segment, e.g. `planetary-systems`.
    pub path_segment: &'static str,
    pub table: &'static str,
    pub pk: &'static str,
    pub columns: &'static [ColumnDef],
    pub query: QueryConfig,
    pub filter_parsers: &'static [(&'static str, FilterParser)],
}

impl ResourceDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.writable)
    }

    /// Comma-separated column list for SELECT and RETURNING.
    pub fn select_list(&self) -> String {
        self.columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
    }
}
