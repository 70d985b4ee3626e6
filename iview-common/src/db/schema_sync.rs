//! Schema introspection and automatic column sync
//!
//! Tables are declared once in code ([`TableSchema`]). On startup the actual
//! columns are read with `pragma_table_info`, compared against the declaration,
//! and missing columns are added with `ALTER TABLE ... ADD COLUMN`. Type or
//! constraint drift is reported but never auto-fixed; that needs a versioned
//! migration.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Declared column with the constraints sync cares about
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type, e.g. `TEXT`, `INTEGER`
    pub sql_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            default_value: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// DEFAULT clause, written verbatim (quote string literals yourself)
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column clause for `ALTER TABLE ... ADD COLUMN`
    ///
    /// SQLite only accepts NOT NULL on an added column when a default is
    /// present, so NOT NULL without a default is dropped with a warning.
    fn add_column_clause(&self, table: &str) -> String {
        let mut clause = format!("{} {}", self.name, self.sql_type);
        match (&self.default_value, self.not_null) {
            (Some(default), true) => {
                clause.push_str(&format!(" NOT NULL DEFAULT {}", default));
            }
            (Some(default), false) => {
                clause.push_str(&format!(" DEFAULT {}", default));
            }
            (None, true) => {
                warn!(
                    "Column {}.{} declared NOT NULL without default; adding as nullable",
                    table, self.name
                );
            }
            (None, false) => {}
        }
        clause
    }
}

/// Column as reported by `pragma_table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
}

/// Difference between a declaration and the live table
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    MissingColumn { column: ColumnDefinition },
    TypeMismatch { column: String, expected: String, actual: String },
}

/// Expected schema for one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Whether `table` has a column named `column`.
///
/// Returns `false` (not an error) when the table itself does not exist.
pub async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Whether a table named `table` exists
pub async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Read actual columns ordered by position
pub async fn introspect_table(pool: &SqlitePool, table: &str) -> Result<Vec<ActualColumn>> {
    let rows = sqlx::query(
        r#"SELECT cid, name, type, "notnull" FROM pragma_table_info(?) ORDER BY cid"#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i64, _>("notnull") != 0,
        })
        .collect())
}

/// Compare declared columns against the live table
pub fn diff(expected: &[ColumnDefinition], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
    expected
        .iter()
        .filter_map(|col| match actual.iter().find(|a| a.name == col.name) {
            None => Some(SchemaDrift::MissingColumn { column: col.clone() }),
            Some(a) if !types_compatible(&col.sql_type, &a.type_name) => {
                Some(SchemaDrift::TypeMismatch {
                    column: col.name.clone(),
                    expected: col.sql_type.clone(),
                    actual: a.type_name.clone(),
                })
            }
            Some(_) => None,
        })
        .collect()
}

/// SQLite type-affinity compatibility
fn types_compatible(expected: &str, actual: &str) -> bool {
    fn affinity(t: &str) -> &'static str {
        let t = t.to_uppercase();
        if t.contains("INT") {
            "INTEGER"
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            "TEXT"
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            "REAL"
        } else if t.is_empty() || t.contains("BLOB") {
            "BLOB"
        } else {
            "NUMERIC"
        }
    }
    affinity(expected) == affinity(actual)
}

/// Add missing columns for `T`. Returns the number of columns added.
pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<usize> {
    let table = T::table_name();

    if !table_exists(pool, table).await? {
        warn!("Schema sync: table '{}' does not exist, skipping", table);
        return Ok(0);
    }

    let actual = introspect_table(pool, table).await?;
    let mut added = 0;

    for drift in diff(&T::expected_columns(), &actual) {
        match drift {
            SchemaDrift::MissingColumn { column } => {
                // Re-check: another pool connection may have raced us
                if column_exists(pool, table, &column.name).await? {
                    continue;
                }
                let sql = format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    table,
                    column.add_column_clause(table)
                );
                sqlx::query(&sql).execute(pool).await?;
                info!("Schema sync: added column {}.{}", table, column.name);
                added += 1;
            }
            SchemaDrift::TypeMismatch { column, expected, actual } => {
                warn!(
                    "Schema sync: type mismatch in {}.{}: expected '{}', found '{}'. \
                     Manual migration required.",
                    table, column, expected, actual
                );
            }
        }
    }

    if added == 0 {
        debug!("Schema sync: '{}' up to date", table);
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn bare_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    struct WidgetsV2;

    impl TableSchema for WidgetsV2 {
        fn table_name() -> &'static str {
            "widgets"
        }

        fn expected_columns() -> Vec<ColumnDefinition> {
            vec![
                ColumnDefinition::new("id", "TEXT").not_null(),
                ColumnDefinition::new("label", "TEXT"),
                ColumnDefinition::new("weight", "INTEGER").not_null().default("0"),
            ]
        }
    }

    #[tokio::test]
    async fn test_column_exists_true_for_existing_column() {
        let pool = bare_pool().await;
        sqlx::query("CREATE TABLE widgets (id TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        assert!(column_exists(&pool, "widgets", "id").await.unwrap());
    }

    #[tokio::test]
    async fn test_column_exists_false_for_missing_column() {
        let pool = bare_pool().await;
        sqlx::query("CREATE TABLE widgets (id TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        assert!(!column_exists(&pool, "widgets", "label").await.unwrap());
    }

    #[tokio::test]
    async fn test_column_exists_false_for_missing_table() {
        let pool = bare_pool().await;
        assert!(!column_exists(&pool, "nope", "id").await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_adds_missing_columns_once() {
        let pool = bare_pool().await;
        sqlx::query("CREATE TABLE widgets (id TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO widgets (id) VALUES ('w1')")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(sync_table::<WidgetsV2>(&pool).await.unwrap(), 2);
        assert_eq!(sync_table::<WidgetsV2>(&pool).await.unwrap(), 0);

        let weight: i64 = sqlx::query_scalar("SELECT weight FROM widgets WHERE id = 'w1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(weight, 0);
    }

    #[tokio::test]
    async fn test_sync_skips_missing_table() {
        let pool = bare_pool().await;
        assert_eq!(sync_table::<WidgetsV2>(&pool).await.unwrap(), 0);
    }

    #[test]
    fn test_diff_reports_type_mismatch() {
        let actual = vec![ActualColumn {
            cid: 0,
            name: "id".to_string(),
            type_name: "INTEGER".to_string(),
            not_null: true,
        }];
        let drift = diff(&[ColumnDefinition::new("id", "TEXT")], &actual);
        assert_eq!(
            drift,
            vec![SchemaDrift::TypeMismatch {
                column: "id".to_string(),
                expected: "TEXT".to_string(),
                actual: "INTEGER".to_string(),
            }]
        );
    }

    #[test]
    fn test_affinity_compatibility() {
        assert!(types_compatible("TEXT", "VARCHAR(20)"));
        assert!(types_compatible("INTEGER", "BIGINT"));
        assert!(!types_compatible("TEXT", "INTEGER"));
    }
}
