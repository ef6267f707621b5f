//! Runs the statements the emitters produce against a pooled connection.
//!
//! A record is written in two phases, each its own transaction, matching the
//! data flow the schema is designed around: first every dimension's lookup
//! statement runs concurrently against one connection, producing a
//! `table -> Option<id>` map of what already exists; then, once the
//! surrogate-key bank has minted (or reused) an id for every dimension that
//! came back empty, every insert statement for the record — the dimensions
//! that needed one, plus the fact row — runs concurrently in a second
//! transaction. Because every dimension's lookup statement is now
//! self-contained (it joins through its own nested foreign keys rather than
//! depending on a sibling's resolved id), siblings *and* nested dimensions
//! run in the same concurrent batch instead of bottom-up.
//!
//! `mysql_async::Transaction` needs `&mut self` per statement, so true
//! simultaneous execution on one connection isn't expressible; the
//! statements in a phase instead share their transaction behind a
//! `tokio::sync::Mutex`, each acquiring it only for the moment it needs to
//! run its own statement. The driver still serializes the actual network
//! round trips, but from the caller's side the batch looks and schedules
//! like ordinary concurrent work.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::try_join_all;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Pool, Transaction, TxOpts};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ddl::{create_table_statements, drop_table_statements, DdlOptions};
use crate::error::{Result, WarehouseError};
use crate::insert::{insert_dimension_statement, insert_fact_statement};
use crate::keybank::{content_key, hash_content_key, KeyBank};
use crate::lookup::build_lookup_map;
use crate::schema::{fact_schema, Run, Schema, Table};
use crate::traversal::record_condition;

/// Run every `CREATE TABLE` statement the schema describes.
pub async fn create_all_tables(conn: &mut Conn, options: &DdlOptions) -> Result<()> {
    for (table, sql) in create_table_statements(options)? {
        debug!(table = table.name(), sql = %sql, "creating table");
        conn.query_drop(sql).await?;
    }
    Ok(())
}

/// Drop every table the schema names.
pub async fn drop_all_tables(conn: &mut Conn) -> Result<()> {
    for (table, sql) in drop_table_statements() {
        debug!(table = table.name(), sql = %sql, "dropping table");
        conn.query_drop(sql).await?;
    }
    Ok(())
}

/// Read `MAX(id)` out of every dimension table, to seed a [`KeyBank`] that
/// continues a previous process's id sequence instead of colliding with it.
pub async fn seed_key_bank(conn: &mut Conn) -> Result<HashMap<Table, u64>> {
    let mut seeds = HashMap::new();
    for table in Table::all().iter().filter(|t| t.is_dimension()) {
        let max: Option<u64> = conn
            .query_first::<Option<u64>, _>(format!("SELECT MAX(id) FROM {};", table.name()))
            .await?
            .flatten();
        seeds.insert(*table, max.unwrap_or(0) + 1);
    }
    Ok(seeds)
}

type SharedTx = Arc<Mutex<Transaction<'static>>>;
type StatementFuture<R> = Pin<Box<dyn Future<Output = Result<R>> + Send>>;

/// The reusable core of [`4.7 Query executor`]: acquire a connection, begin a
/// transaction, submit every statement in `statements` concurrently over it,
/// pipe each raw result through `validate` then `map`, and commit on success
/// or roll back and propagate on any failure — releasing the connection on
/// every exit path.
async fn run_statement_map<Raw, Mapped>(
    pool: &Pool,
    statements: HashMap<Table, String>,
    run_query: impl Fn(SharedTx, String) -> StatementFuture<Raw> + Send + Sync,
    validate: impl Fn(Table, &Raw) -> Result<()> + Send + Sync,
    map: impl Fn(Table, Raw) -> Mapped + Send + Sync,
) -> Result<HashMap<Table, Mapped>>
where
    Raw: Send + 'static,
    Mapped: Send + 'static,
{
    let conn = pool.get_conn().await?;
    let transaction = conn.start_transaction(TxOpts::default()).await?;
    let tx: SharedTx = Arc::new(Mutex::new(transaction));

    let result: std::result::Result<Vec<(Table, Mapped)>, WarehouseError> = try_join_all(statements.into_iter().map(
        |(table, sql)| {
            let fut = run_query(Arc::clone(&tx), sql);
            let validate = &validate;
            let map = &map;
            async move {
                let raw = fut.await?;
                validate(table, &raw)?;
                Ok::<_, WarehouseError>((table, map(table, raw)))
            }
        },
    ))
    .await;

    let transaction = Arc::try_unwrap(tx)
        .map_err(|_| WarehouseError::SchemaMisuseError("transaction still shared after statement map".to_string()))?
        .into_inner();

    match result {
        Ok(pairs) => {
            transaction.commit().await?;
            Ok(pairs.into_iter().collect())
        }
        Err(err) => {
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(error = %rollback_err, "rollback failed after statement map error");
            } else {
                warn!(error = %err, "rolled back statement map");
            }
            Err(err)
        }
    }
}

fn run_select(tx: SharedTx, sql: String) -> StatementFuture<Option<u64>> {
    Box::pin(async move {
        let mut guard = tx.lock().await;
        let id: Option<u64> = guard.query_first::<Option<u64>, _>(sql).await?.flatten();
        Ok(id)
    })
}

fn run_insert(tx: SharedTx, sql: String) -> StatementFuture<()> {
    Box::pin(async move {
        let mut guard = tx.lock().await;
        guard.exec_drop(sql, ()).await?;
        Ok(())
    })
}

/// Phase one: build and run the lookup map for the whole record in a single
/// concurrent batch over one transaction, returning the id already on file
/// for every dimension that has one.
async fn run_lookup_phase(pool: &Pool, run: &Run) -> Result<HashMap<Table, Option<u64>>> {
    let lookup_map = build_lookup_map(&fact_schema(), run)?;
    run_statement_map(
        pool,
        lookup_map,
        run_select,
        |_table, _raw| Ok(()),
        |_table, raw| raw,
    )
    .await
}

/// Phase two: for every dimension without a lookup hit, mint (or reuse, by
/// content hash) a surrogate key from `key_bank`, building the insert
/// statements as it goes, then run the whole insert map — dimensions plus
/// the fact row — concurrently in a second transaction.
async fn run_insert_phase(
    pool: &Pool,
    key_bank: &KeyBank,
    run: &Run,
    lookup_results: &HashMap<Table, Option<u64>>,
) -> Result<()> {
    let nodes = fact_schema();
    let mut resolved: HashMap<Table, u64> = HashMap::new();
    let mut insert_map: HashMap<Table, String> = HashMap::new();

    build_insert_plan(&nodes, run, lookup_results, key_bank, &mut resolved, &mut insert_map).await?;

    let fact_sql = insert_fact_statement(&nodes, run, &resolved)?;
    insert_map.insert(Table::Fact, fact_sql);

    run_statement_map(
        pool,
        insert_map,
        run_insert,
        |_table, _raw: &()| Ok(()),
        |_table, _raw| (),
    )
    .await?;
    Ok(())
}

/// Walk `nodes`' own `ForeignKey` children depth-first, filling `resolved`
/// with every dimension's id (from the lookup phase or freshly minted) and
/// `inserts` with the statement for every dimension that needs one. Pure
/// key-bank/CPU work — no statement is executed here.
fn build_insert_plan<'a>(
    nodes: &'a [Schema],
    run: &'a Run,
    lookup_results: &'a HashMap<Table, Option<u64>>,
    key_bank: &'a KeyBank,
    resolved: &'a mut HashMap<Table, u64>,
    inserts: &'a mut HashMap<Table, String>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        for node in nodes {
            let (table, schema) = match node {
                Schema::ForeignKey { table, schema, .. } => (*table, schema.as_slice()),
                _ => continue,
            };
            if !record_condition(node, Some(run)) {
                continue;
            }

            build_insert_plan(schema, run, lookup_results, key_bank, &mut *resolved, &mut *inserts).await?;

            let id = match lookup_results.get(&table).copied().flatten() {
                Some(existing) => existing,
                None => {
                    let raw = content_key(schema, run);
                    let hash = hash_content_key(&raw);
                    let (speculative_id, hit) = key_bank.request_key(table, &hash).await;
                    if !hit {
                        let sql = insert_dimension_statement(table, schema, run, speculative_id, resolved)?;
                        debug!(table = table.name(), sql = %sql, "inserting dimension row");
                        inserts.insert(table, sql);
                    }
                    speculative_id
                }
            };
            resolved.insert(table, id);
        }
        Ok(())
    })
}

/// Resolve every dimension a record touches, then insert whatever was
/// missing and the fact row — the lookup phase and insert phase each in
/// their own transaction, serialized relative to each other for this
/// record. Distinct records run independently.
pub async fn insert_run(pool: &Pool, key_bank: &KeyBank, run: &Run) -> Result<()> {
    let lookup_results = run_lookup_phase(pool, run).await?;
    run_insert_phase(pool, key_bank, run, &lookup_results).await?;
    info!("committed run");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::own_children;

    #[test]
    fn fact_schema_has_no_top_level_table_of_its_own_among_children() {
        let children = own_children(&fact_schema());
        assert!(!children.is_empty());
        for node in children {
            assert!(matches!(node, Schema::ForeignKey { .. }));
        }
    }
}
