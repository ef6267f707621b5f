//! The public entry point the HTTP/CLI layer talks to.

use futures::future::try_join_all;
use mysql_async::Pool;
use tracing::warn;

use crate::config::WarehouseConfig;
use crate::error::Result;
use crate::executor::{create_all_tables, drop_all_tables, insert_run, seed_key_bank};
use crate::keybank::KeyBank;
use crate::schema::Run;

/// Owns the connection pool and the surrogate-key bank. One `Warehouse`
/// is built per process and shared behind an `Arc` by the HTTP handlers.
pub struct Warehouse {
    pool: Pool,
    key_bank: KeyBank,
    config: WarehouseConfig,
}

impl Warehouse {
    /// Build a pool for `config` and seed the key bank from whatever
    /// surrogate keys already exist. A fresh warehouse (tables not created
    /// yet) has nothing to seed from — that's not a startup failure, the
    /// bank just starts every counter at 1.
    pub async fn new(config: WarehouseConfig) -> Result<Self> {
        let pool = Pool::new(config.to_opts());
        let seeds = match pool.get_conn().await {
            Ok(mut conn) => seed_key_bank(&mut conn).await.unwrap_or_else(|err| {
                warn!(error = %err, "could not seed key bank, starting from 1 (tables may not exist yet)");
                Default::default()
            }),
            Err(err) => {
                warn!(error = %err, "could not acquire a seeding connection, starting key bank from 1");
                Default::default()
            }
        };
        Ok(Self {
            pool,
            key_bank: KeyBank::new(seeds),
            config,
        })
    }

    /// Create every table the schema names.
    pub async fn init(&self) -> Result<()> {
        let mut conn = self.pool.get_conn().await?;
        create_all_tables(&mut conn, &self.config.ddl).await
    }

    /// Drop every table the schema names. Destructive — callers gate this
    /// behind an explicit admin action.
    pub async fn drop_tables(&self) -> Result<()> {
        let mut conn = self.pool.get_conn().await?;
        drop_all_tables(&mut conn).await
    }

    /// Resolve dimensions and insert fact rows for every record in `runs`,
    /// concurrently, each in its own transaction.
    pub async fn insert_runs(&self, runs: &[Run]) -> Result<()> {
        let futures = runs.iter().map(|run| insert_run(&self.pool, &self.key_bank, run));
        try_join_all(futures).await?;
        Ok(())
    }
}
