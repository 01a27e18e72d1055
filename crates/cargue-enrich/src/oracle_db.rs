//! Oracle-backed procedure sessions.

use std::path::PathBuf;

use oracle::sql_type::{OracleType, RefCursor};
use oracle::{Connection, InitParams};
use tracing::debug;

use crate::error::DatabaseError;
use crate::session::{ProcedureConnector, ProcedureSession, ResultRow};

/// Connection settings for the core banking database.
#[derive(Debug, Clone)]
pub struct OracleConnector {
    pub user: String,
    pub password: String,
    pub dsn: String,
    /// Oracle client library directory, when not on the loader path.
    pub lib_dir: Option<PathBuf>,
}

impl ProcedureConnector for OracleConnector {
    fn connect(&self) -> Result<Box<dyn ProcedureSession>, DatabaseError> {
        if let Some(dir) = &self.lib_dir {
            // Only the first initialization in a process takes effect.
            InitParams::new().oracle_client_lib_dir(dir)?.init()?;
        }
        debug!(dsn = %self.dsn, user = %self.user, "connecting to Oracle");
        let conn = Connection::connect(&self.user, &self.password, &self.dsn)?;
        Ok(Box::new(OracleSession { conn }))
    }
}

struct OracleSession {
    conn: Connection,
}

impl ProcedureSession for OracleSession {
    fn call_procedure(
        &mut self,
        name: &str,
        identity: i64,
        amount: i64,
    ) -> Result<Vec<ResultRow>, DatabaseError> {
        let sql = format!("BEGIN {name}(:1, :2, :3); END;");
        let mut stmt = self.conn.statement(&sql).build()?;
        stmt.execute(&[&identity, &amount, &OracleType::RefCursor])?;
        let mut cursor: RefCursor = stmt.bind_value(3)?;
        let mut rows = Vec::new();
        for row in cursor.query()? {
            let row = row?;
            let cells = row
                .sql_values()
                .iter()
                .map(|value| value.get::<Option<String>>())
                .collect::<oracle::Result<ResultRow>>()?;
            rows.push(cells);
        }
        Ok(rows)
    }

    fn close(self: Box<Self>) -> Result<(), DatabaseError> {
        self.conn.close()?;
        Ok(())
    }
}
