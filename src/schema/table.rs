use crate::warehouse::Dialect;

#[macro_export]
macro_rules! warehouse_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `is_primary_key = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_identity: false,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    Char,
    Int,
    BigInt,
    DoublePrecision,
    Timestamp,
}

impl SqlType {
    pub fn render(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Redshift => match self {
                SqlType::Varchar => "VARCHAR",
                SqlType::Char => "CHAR",
                SqlType::Int => "INT",
                SqlType::BigInt => "BIGINT",
                SqlType::DoublePrecision => "DOUBLE PRECISION",
                SqlType::Timestamp => "TIMESTAMP",
            },
            Dialect::Sqlite => match self {
                SqlType::Varchar | SqlType::Char | SqlType::Timestamp => "TEXT",
                SqlType::Int | SqlType::BigInt => "INTEGER",
                SqlType::DoublePrecision => "REAL",
            },
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, SqlType::Int | SqlType::BigInt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    Staging,
    Fact,
    Dimension,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    /// Surrogate key generated by the engine on insert.
    pub is_identity: bool,
}

impl Column {
    fn render(&self, dialect: Dialect) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.render(dialect));
        if self.is_identity {
            match dialect {
                Dialect::Redshift => sql.push_str(" IDENTITY(0,1)"),
                // SQLite only generates keys for an INTEGER PRIMARY KEY rowid alias
                Dialect::Sqlite => {
                    return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name);
                }
            }
        }
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub role: TableRole,
    pub columns: &'static [Column],
}

impl Table {
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let width = self
            .columns
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0);
        let body = self
            .columns
            .iter()
            .map(|column| {
                let rendered = column.render(dialect);
                // Align types after the column name the way hand-written DDL is laid out
                let (name, rest) = rendered.split_at(column.name.len());
                format!("    {:<width$}{}", name, rest, width = width)
            })
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE {} (\n{})", self.name, body)
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Compares the declared column names with the ones reported by the
    /// engine. Redshift folds unquoted identifiers to lower case, so the
    /// comparison ignores case.
    pub fn check_columns(&self, actual: &[String]) -> Result<(), String> {
        if actual.len() != self.columns.len() {
            return Err(format!(
                "has {} columns, expected {}. Found column names: {}, expected: {}",
                actual.len(),
                self.columns.len(),
                actual.join(", "),
                self.column_names().join(", ")
            ));
        }
        for (actual_name, expected) in actual.iter().zip(self.columns.iter()) {
            if !actual_name.eq_ignore_ascii_case(expected.name) {
                return Err(format!(
                    "column name mismatch: expected {}, got {}",
                    expected.name, actual_name
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYS: Table = Table {
        name: "plays",
        role: TableRole::Fact,
        columns: &[
            warehouse_column!("play_id", SqlType::Int, is_primary_key = true, is_identity = true),
            warehouse_column!("ts", SqlType::BigInt, non_null = true),
            warehouse_column!("score", SqlType::DoublePrecision),
        ],
    };

    #[test]
    fn test_redshift_create_sql() {
        let sql = PLAYS.create_sql(Dialect::Redshift);
        assert_eq!(
            sql,
            "CREATE TABLE plays (\n    play_id INT IDENTITY(0,1) PRIMARY KEY,\n    ts      BIGINT NOT NULL,\n    score   DOUBLE PRECISION)"
        );
    }

    #[test]
    fn test_sqlite_create_sql_uses_rowid_alias_for_identity() {
        let sql = PLAYS.create_sql(Dialect::Sqlite);
        assert!(sql.contains("play_id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("ts      INTEGER NOT NULL"));
        assert!(sql.contains("score   REAL"));
    }

    #[test]
    fn test_drop_sql_is_guarded() {
        assert_eq!(PLAYS.drop_sql(), "DROP TABLE IF EXISTS plays");
    }

    #[test]
    fn test_check_columns() {
        let ok = vec!["PLAY_ID".to_string(), "ts".to_string(), "score".to_string()];
        assert!(PLAYS.check_columns(&ok).is_ok());

        let short = vec!["play_id".to_string(), "ts".to_string()];
        let err = PLAYS.check_columns(&short).unwrap_err();
        assert!(err.contains("has 2 columns, expected 3"));

        let renamed = vec!["play_id".to_string(), "ts".to_string(), "rating".to_string()];
        let err = PLAYS.check_columns(&renamed).unwrap_err();
        assert!(err.contains("expected score, got rating"));
    }
}
