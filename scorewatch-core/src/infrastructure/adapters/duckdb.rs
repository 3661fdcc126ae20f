// scorewatch-core/src/infrastructure/adapters/duckdb.rs

use duckdb::{Config, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::dataset::Table;
use crate::domain::ports::TableSource;
use crate::error::ScorewatchError;
use crate::infrastructure::error::InfrastructureError;

const INPUT_VIEW: &str = "scorewatch_input";

/// CSV reader backed by an embedded DuckDB. Every column is read as text;
/// numeric coercion happens in the domain.
pub struct DuckDbTableSource {
    conn: Mutex<Connection>,
}

impl DuckDbTableSource {
    pub fn in_memory() -> Result<Self, InfrastructureError> {
        Self::new(":memory:")
    }

    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn fetch_column_names(conn: &Connection) -> Result<Vec<String>, InfrastructureError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", INPUT_VIEW))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>("name"))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    fn fetch_rows(
        conn: &Connection,
        width: usize,
    ) -> Result<Vec<Vec<Option<String>>>, InfrastructureError> {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", INPUT_VIEW))?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(row.get::<_, Option<String>>(i)?);
            }
            out.push(cells);
        }
        Ok(out)
    }
}

impl TableSource for DuckDbTableSource {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn read_table(&self, path: &Path) -> Result<Table, ScorewatchError> {
        if !path.is_file() {
            return Err(InfrastructureError::DataFileNotFound(path.display().to_string()).into());
        }

        let conn = self.conn.lock().map_err(|_| {
            InfrastructureError::Io(std::io::Error::other("DuckDB Mutex Poisoned"))
        })?;

        let escaped = path.display().to_string().replace('\'', "''");
        conn.execute(
            &format!(
                "CREATE OR REPLACE TEMP VIEW {} AS SELECT * FROM read_csv_auto('{}', all_varchar = true, header = true)",
                INPUT_VIEW, escaped
            ),
            [],
        )
        .map_err(InfrastructureError::from)?;

        let names = Self::fetch_column_names(&conn)?;
        let rows = Self::fetch_rows(&conn, names.len())?;
        debug!(columns = names.len(), rows = rows.len(), "CSV loaded");

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Table::new(name, names, rows))
    }
}
