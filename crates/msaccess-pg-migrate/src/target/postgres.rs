//! Blocking PostgreSQL implementation of the target executor.

use bytes::BytesMut;
use postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use postgres::{Client, NoTls};
use tracing::debug;

use crate::config::TargetConfig;
use crate::error::Result;
use crate::value::SqlValue;

use super::{TargetError, TargetErrorKind, TargetExecutor};

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql(ty, out),
            SqlValue::I16(v) => v.to_sql(ty, out),
            SqlValue::I32(v) => v.to_sql(ty, out),
            SqlValue::I64(v) => v.to_sql(ty, out),
            SqlValue::F32(v) => v.to_sql(ty, out),
            SqlValue::F64(v) => v.to_sql(ty, out),
            SqlValue::Decimal(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => v.to_sql(ty, out),
            SqlValue::Bytes(v) => v.to_sql(ty, out),
            SqlValue::Timestamp(v) => v.to_sql(ty, out),
        }
    }

    // Parameter types come from statement inference; each variant's inner
    // to_sql rejects a genuinely incompatible type at bind time.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn classify(err: postgres::Error) -> TargetError {
    if let Some(db) = err.as_db_error() {
        let code = db.code().code().to_string();
        let kind = if code.starts_with("23") {
            TargetErrorKind::ConstraintViolation
        } else {
            TargetErrorKind::Other
        };
        return TargetError {
            kind,
            code: Some(code),
            message: db.message().to_string(),
        };
    }
    if err.is_closed() {
        return TargetError {
            kind: TargetErrorKind::Connectivity,
            code: None,
            message: err.to_string(),
        };
    }
    TargetError {
        kind: TargetErrorKind::Other,
        code: None,
        message: err.to_string(),
    }
}

/// Target executor over one blocking PostgreSQL connection.
pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    /// Connect with the configured parameters.
    pub fn connect(target: &TargetConfig) -> Result<Self> {
        debug!("Connecting to target {}:{}", target.host, target.port);
        let client = Client::connect(&target.connection_string(), NoTls)?;
        Ok(PgExecutor { client })
    }

    /// Run a multi-statement script (the generated DDL file).
    pub fn run_script(&mut self, sql: &str) -> Result<()> {
        self.client.batch_execute(sql)?;
        Ok(())
    }
}

impl TargetExecutor for PgExecutor {
    fn begin(&mut self) -> std::result::Result<(), TargetError> {
        self.client.batch_execute("BEGIN").map_err(classify)
    }

    fn execute(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> std::result::Result<u64, TargetError> {
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        self.client.execute(sql, &refs).map_err(classify)
    }

    fn commit(&mut self) -> std::result::Result<(), TargetError> {
        self.client.batch_execute("COMMIT").map_err(classify)
    }

    fn rollback(&mut self) -> std::result::Result<(), TargetError> {
        self.client.batch_execute("ROLLBACK").map_err(classify)
    }
}
