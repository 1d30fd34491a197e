use crate::{
    collectors::{
        Collector,
        Sample,
    },
    metrics::MysqlData,
};
use eyre::{
    bail,
    Context as _,
    Result,
};
use logtick_config::MysqlConfig;
use sea_orm::{
    ConnectOptions,
    ConnectionTrait,
    Database,
    DatabaseConnection,
    DbBackend,
    Statement,
};
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    time::Duration,
};
use tracing::warn;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Samples `SHOW GLOBAL STATUS` of a MySQL server.
pub struct MysqlCollector {
    db: DatabaseConnection,
    interval: Duration,
}

impl MysqlCollector {
    pub const NAME: &'static str = "mysql";

    /// Opens the pool and pings the server, so an unreachable database
    /// fails here rather than on every sample.
    pub async fn connect(config: &MysqlConfig) -> Result<Self> {
        if config.dsn.trim().is_empty() {
            bail!("MySQL DSN cannot be empty");
        }

        let mut options = ConnectOptions::new(config.dsn.clone());
        options
            .max_connections(2)
            .min_connections(1)
            .connect_timeout(CONNECT_TIMEOUT)
            .sqlx_logging(false);

        let db = tokio::time::timeout(CONNECT_TIMEOUT, async {
            let db = Database::connect(options).await?;
            db.ping().await?;
            Ok::<_, sea_orm::DbErr>(db)
        })
        .await
        .wrap_err("Timed out connecting to MySQL")?
        .wrap_err("Failed to connect to MySQL")?;

        Ok(Self {
            db,
            interval: config.interval(),
        })
    }

    async fn read(&self) -> Result<MysqlData> {
        let rows = self
            .db
            .query_all(Statement::from_string(DbBackend::MySql, "SHOW GLOBAL STATUS"))
            .await
            .wrap_err("Failed to query global status")?;

        let mut status = HashMap::with_capacity(rows.len());
        for row in rows {
            match (
                row.try_get::<String>("", "Variable_name"),
                row.try_get::<String>("", "Value"),
            ) {
                (Ok(name), Ok(value)) => {
                    status.insert(name, value);
                }
                (Err(e), _) | (_, Err(e)) => warn!(collector = Self::NAME, error = %e, "Skipping unreadable status row"),
            }
        }

        Ok(MysqlData::from_status(&status))
    }
}

impl Collector for MysqlCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send + '_>> {
        Box::pin(async move {
            let data = self.read().await?;
            Sample::new(&data)
        })
    }
}
