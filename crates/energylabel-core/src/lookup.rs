//! Emits the `SELECT` statement that checks whether a dimension row already
//! exists for a record, before falling back to an insert.
//!
//! Deliberately `SELECT MAX(id)` rather than `... LIMIT 1`: the tables carry
//! no primary key or uniqueness constraint (ColumnStore can't enforce one),
//! so more than one row can in principle share a content key; `MAX` picks a
//! single, deterministic survivor rather than depending on storage order.
//! No `COALESCE` — a genuine miss must come back as SQL `NULL`, not a
//! sentinel value a real id could collide with.
//!
//! A dimension's own leaves aren't enough to identify its row once it has
//! nested foreign keys of its own (e.g. `Plugin` references `PluginName`):
//! the statement joins through the whole subtree and compares every leaf
//! directly, rather than requiring the caller to have already resolved each
//! child's id. That makes every dimension's lookup self-contained, so
//! siblings and nested dimensions alike can run in one concurrent batch.

use std::collections::HashMap;

use crate::error::{Result, WarehouseError};
use crate::sanitize::render_literal;
use crate::schema::{Run, Schema, Table, CHILD_KEY};
use crate::traversal::walk;

/// Build the lookup statement for `table`, whose own schema nodes are
/// `nodes`. Descends into every nested `ForeignKey` subtree, joining each
/// child in by its surrogate key and comparing its leaves directly against
/// `run` — no pre-resolved id is required for any table in the subtree.
pub fn lookup_statement(table: Table, nodes: &[Schema], run: &Run) -> Result<String> {
    let mut joins = Vec::new();
    let mut conditions = Vec::new();
    collect(table, nodes, run, &mut joins, &mut conditions);

    if conditions.is_empty() {
        return Err(WarehouseError::SchemaMisuseError(format!(
            "{} has no columns to look up by",
            table.name()
        )));
    }

    let mut sql = format!("SELECT MAX({}.{}) AS id FROM {}", table.name(), CHILD_KEY, table.name());
    for join in &joins {
        sql.push(' ');
        sql.push_str(join);
    }
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    sql.push(';');
    Ok(sql)
}

/// Walk every dimension's own lookup statement for the whole record at
/// once. Since each is now self-contained (see module docs), the resulting
/// map can be submitted to the executor as a single concurrent batch.
pub fn build_lookup_map(nodes: &[Schema], run: &Run) -> Result<HashMap<Table, String>> {
    let mut map = walk(
        nodes,
        Some(run),
        |_, _| Ok(String::new()),
        |table, children, run| lookup_statement(table, children, run.expect("lookup always has a run")),
        false,
        &crate::traversal::record_condition,
    )?;
    map.remove(&Table::Fact);
    Ok(map)
}

fn collect(parent: Table, nodes: &[Schema], run: &Run, joins: &mut Vec<String>, conditions: &mut Vec<String>) {
    for node in nodes {
        match node {
            Schema::Int { column, field } | Schema::Text { column, field } => {
                conditions.push(format!(
                    "{}.{} = {}",
                    parent.name(),
                    column,
                    render_literal(field.value(run).as_ref())
                ));
            }
            Schema::ForeignKey {
                column,
                table: child_table,
                schema,
                ..
            } => {
                joins.push(format!(
                    "INNER JOIN {} ON {}.{} = {}.{}",
                    child_table.name(),
                    parent.name(),
                    column,
                    child_table.name(),
                    CHILD_KEY
                ));
                collect(*child_table, schema, run, joins, conditions);
            }
        }
    }
}
