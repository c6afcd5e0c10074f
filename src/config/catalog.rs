//! The five catalog resources.

use super::resource::{ColumnDef, ColumnKind::*, FilterParser, QueryConfig, ResourceDef};

pub static USERS: ResourceDef = ResourceDef {
    path_segment: "users",
    table: "users",
    pk: "id",
    columns: &[
        ColumnDef::generated("id", Integer),
        ColumnDef::required("username", Text).with_pattern(r"^[A-Za-z0-9_.-]{3,32}$"),
        ColumnDef::required("email", Text).with_pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
        ColumnDef::optional("display_name", Text),
        ColumnDef::optional("role", Text).not_null().with_pattern(r"^(explorer|curator|admin)$"),
        ColumnDef::generated("created_at", Timestamp),
    ],
    query: QueryConfig {
        searchable: &["username", "email", "display_name"],
        filterable: &["role"],
        sortable: &["id", "username", "created_at"],
        default_sort: "id ASC",
    },
    filter_parsers: &[("role", FilterParser::Text)],
};

pub static PLANETARY_SYSTEMS: ResourceDef = ResourceDef {
    path_segment: "planetary-systems",
    table: "planetary_systems",
    pk: "id",
    columns: &[
        ColumnDef::generated("id", Integer),
        ColumnDef::required("name", Text),
        ColumnDef::optional("description", Text),
        ColumnDef::required("owner_id", Integer),
        ColumnDef::generated("created_at", Timestamp),
    ],
    query: QueryConfig {
        searchable: &["name", "description"],
        filterable: &["owner_id"],
        sortable: &["id", "name", "created_at"],
        default_sort: "id ASC",
    },
    filter_parsers: &[("owner_id", FilterParser::Integer)],
};

pub static STARS: ResourceDef = ResourceDef {
    path_segment: "stars",
    table: "stars",
    pk: "id",
    columns: &[
        ColumnDef::generated("id", Integer),
        ColumnDef::required("system_id", Integer),
        ColumnDef::required("name", Text),
        ColumnDef::required("spectral_type", Text).with_pattern(r"^[OBAFGKMLTY][0-9]?(\.[0-9])?(I|II|III|IV|V|VI|VII)?$"),
        ColumnDef::optional("mass_solar", Float),
        ColumnDef::optional("radius_solar", Float),
        ColumnDef::optional("temperature_k", Float),
        ColumnDef::optional("luminosity_solar", Float),
        ColumnDef::optional("texture_url", Text),
    ],
    query: QueryConfig {
        searchable: &["name", "spectral_type"],
        filterable: &["system_id", "spectral_type"],
        sortable: &["id", "name", "mass_solar", "temperature_k"],
        default_sort: "id ASC",
    },
    filter_parsers: &[("system_id", FilterParser::Integer), ("spectral_type", FilterParser::Text)],
};

pub static PLANETS: ResourceDef = ResourceDef {
    path_segment: "planets",
    table: "planets",
    pk: "id",
    columns: &[
        ColumnDef::generated("id", Integer),
        ColumnDef::required("system_id", Integer),
        ColumnDef::required("name", Text),
        ColumnDef::required("planet_type", Text),
        ColumnDef::required("radius_km", Float),
        ColumnDef::optional("mass_earth", Float),
        ColumnDef::optional("orbital_period_days", Float),
        ColumnDef::optional("semi_major_axis_au", Float),
        ColumnDef::optional("texture_url", Text),
        ColumnDef::generated("created_at", Timestamp),
    ],
    query: QueryConfig {
        searchable: &["name", "planet_type"],
        filterable: &["system_id", "planet_type"],
        sortable: &["id", "name", "radius_km", "mass_earth", "semi_major_axis_au"],
        default_sort: "id ASC",
    },
    filter_parsers: &[("system_id", FilterParser::Integer), ("planet_type", FilterParser::Text)],
};

pub static COMPOUNDS: ResourceDef = ResourceDef {
    path_segment: "compounds",
    table: "compounds",
    pk: "cid",
    columns: &[
        ColumnDef::required("cid", Integer),
        ColumnDef::optional("name", Text),
        ColumnDef::optional("formula", Text),
    ],
    query: QueryConfig {
        searchable: &["name", "formula"],
        filterable: &["cid"],
        sortable: &["cid", "name"],
        default_sort: "cid ASC",
    },
    filter_parsers: &[("cid", FilterParser::Integer)],
};

pub static RESOURCES: [&ResourceDef; 5] = [&USERS, &PLANETARY_SYSTEMS, &STARS, &PLANETS, &COMPOUNDS];

pub fn resource_by_path(path_segment: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().copied().find(|r| r.path_segment == path_segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Allow-listed names must be real columns, otherwise they silently never match.
    #[test]
    fn query_config_names_are_real_columns() {
        for r in RESOURCES {
            let q = &r.query;
            for name in q.searchable.iter().chain(q.filterable).chain(q.sortable) {
                assert!(r.column(name).is_some(), "{}: unknown column {}", r.path_segment, name);
            }
            for (name, _) in r.filter_parsers {
                assert!(q.filterable.contains(name), "{}: parser for unfilterable {}", r.path_segment, name);
            }
            let default_col = q.default_sort.split_whitespace().next().unwrap();
            assert!(r.column(default_col).is_some());
        }
    }

    /// Writable columns declared NOT NULL (or PRIMARY KEY) in the DDL must refuse an explicit null.
    #[test]
    fn not_null_columns_reject_null() {
        for r in RESOURCES {
            let header = format!("EXISTS {} (", r.table);
            let ddl = crate::store::SCHEMA
                .iter()
                .find(|s| s.contains(&header))
                .unwrap_or_else(|| panic!("no DDL for {}", r.table));
            for line in ddl.lines().map(str::trim) {
                let Some(name) = line.split_whitespace().next() else { continue };
                let Some(col) = r.column(name) else { continue };
                if col.writable && (line.contains("NOT NULL") || line.contains("PRIMARY KEY")) {
                    assert!(!col.nullable, "{}.{} is NOT NULL but accepts null", r.table, name);
                }
            }
        }
    }

    #[test]
    fn lookup_by_path() {
        assert_eq!(resource_by_path("planetary-systems").map(|r| r.table), Some("planetary_systems"));
        assert!(resource_by_path("galaxies").is_none());
    }
}
