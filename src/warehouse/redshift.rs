//! Redshift backend over the Postgres wire protocol.

use super::{CopyDirective, Dialect, Warehouse};
use crate::config::ClusterSettings;
use crate::error::{EtlError, EtlResult};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, warn};

pub struct RedshiftWarehouse {
    client: Client,
    connection: JoinHandle<()>,
}

impl RedshiftWarehouse {
    pub async fn connect(cluster: &ClusterSettings) -> EtlResult<Self> {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&cluster.host)
            .port(cluster.port)
            .dbname(&cluster.dbname)
            .user(&cluster.user)
            .password(&cluster.password);

        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| EtlError::Connect(Box::new(e)))?;
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("Redshift connection closed with error: {}", e);
            }
        });

        Ok(Self { client, connection })
    }

    /// Runs `sql` through the simple query protocol, the way interactive
    /// clients send COPY and DDL to Redshift.
    async fn simple(&self, name: &str, sql: &str) -> EtlResult<u64> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| EtlError::statement(name, e))?;
        let affected = messages
            .iter()
            .filter_map(|m| match m {
                SimpleQueryMessage::CommandComplete(rows) => Some(*rows),
                _ => None,
            })
            .sum();
        Ok(affected)
    }
}

pub(super) fn render_copy(directive: &CopyDirective) -> String {
    let mut sql = format!(
        "COPY {} FROM '{}'\n",
        directive.table.name,
        escape_literal(&directive.source)
    );
    if let Some(credential) = &directive.credential {
        sql.push_str(&format!(
            "CREDENTIALS 'aws_iam_role={}'\n",
            escape_literal(&credential.arn)
        ));
    }
    sql.push_str(&format!(
        "json '{}'\nregion '{}'",
        escape_literal(directive.mapping.as_copy_option()),
        escape_literal(&directive.region)
    ));
    sql
}

/// COPY from S3 on Redshift always authenticates through an IAM role.
fn check_credential(directive: &CopyDirective) -> EtlResult<()> {
    if directive.credential.is_none() {
        return Err(EtlError::Config(format!(
            "bulk copy into {} needs an IAM role credential",
            directive.table.name
        )));
    }
    Ok(())
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    async fn execute(&mut self, name: &str, sql: &str) -> EtlResult<u64> {
        self.simple(name, sql).await
    }

    async fn bulk_copy(&mut self, directive: &CopyDirective) -> EtlResult<u64> {
        check_credential(directive)?;
        let name = format!("copy {}", directive.table.name);
        self.simple(&name, &render_copy(directive)).await
    }

    async fn begin(&mut self) -> EtlResult<()> {
        self.simple("begin", "BEGIN").await.map(|_| ())
    }

    async fn commit(&mut self) -> EtlResult<()> {
        self.simple("commit", "COMMIT").await.map(|_| ())
    }

    async fn rollback(&mut self) -> EtlResult<()> {
        self.simple("rollback", "ROLLBACK").await.map(|_| ())
    }

    async fn table_columns(&mut self, table: &str) -> EtlResult<Option<Vec<String>>> {
        let rows = self
            .client
            .query(
                "SELECT column_name::varchar FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name::varchar = $1 \
                 ORDER BY ordinal_position",
                &[&table],
            )
            .await
            .map_err(|e| EtlError::statement("describe table", e))?;
        if rows.is_empty() {
            return Ok(None);
        }
        let columns = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EtlError::statement("describe table", e))?;
        Ok(Some(columns))
    }

    async fn count_rows(&mut self, table: &str) -> EtlResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let row = self
            .client
            .query_one(sql.as_str(), &[])
            .await
            .map_err(|e| EtlError::statement("count rows", e))?;
        row.try_get::<_, i64>(0)
            .map_err(|e| EtlError::statement("count rows", e))
    }

    async fn close(self: Box<Self>) -> EtlResult<()> {
        let RedshiftWarehouse { client, connection } = *self;
        drop(client);
        if let Err(e) = connection.await {
            debug!("Redshift connection task ended abnormally: {}", e);
        }
        Ok(())
    }
}
