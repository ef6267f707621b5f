//! Generic post-order walk over a schema tree.
//!
//! One traversal function drives the DDL, lookup, and insert emitters alike:
//! each supplies its own `fact`/`dimension` closures and gets back a
//! statement per table it visited. Children are always emitted before their
//! parent, so a dimension's own foreign keys are already resolved by the time
//! its own statement is built.

use std::collections::HashMap;

use crate::error::Result;
use crate::schema::{Run, Schema, Table};

/// Whether a `ForeignKey` subtree should be walked for a given record.
///
/// A node with no `optional_field` is never skipped. One with
/// `optional_field: Some(field)` is skipped when `run` is given and that
/// field is absent on it — e.g. a record with no `error_message` never
/// touches the `ErrorMessage` dimension.
pub fn record_condition(node: &Schema, run: Option<&Run>) -> bool {
    match node {
        Schema::ForeignKey {
            optional_field: Some(field),
            ..
        } => run.map(|r| field.is_present(*r)).unwrap_or(true),
        _ => true,
    }
}

/// Walk `nodes` post-order, calling `dimension` for every `ForeignKey`
/// subtree (children first) and `fact` once for the root list.
///
/// `always_extend` forces every subtree to be visited regardless of
/// `condition` — the DDL emitter wants every table's statement regardless of
/// any particular record, so it passes `true`; the lookup and insert
/// emitters pass `false` and let `condition` (normally [`record_condition`])
/// decide per record.
pub fn walk<F, D>(
    nodes: &[Schema],
    run: Option<&Run>,
    fact: F,
    dimension: D,
    always_extend: bool,
    condition: &dyn Fn(&Schema, Option<&Run>) -> bool,
) -> Result<HashMap<Table, String>>
where
    F: Fn(&[Schema], Option<&Run>) -> Result<String>,
    D: Fn(Table, &[Schema], Option<&Run>) -> Result<String> + Copy,
{
    let mut out = HashMap::new();
    walk_nodes(nodes, run, dimension, always_extend, condition, &mut out)?;
    let fact_sql = fact(nodes, run)?;
    out.insert(Table::Fact, fact_sql);
    Ok(out)
}

fn walk_nodes<D>(
    nodes: &[Schema],
    run: Option<&Run>,
    dimension: D,
    always_extend: bool,
    condition: &dyn Fn(&Schema, Option<&Run>) -> bool,
    out: &mut HashMap<Table, String>,
) -> Result<()>
where
    D: Fn(Table, &[Schema], Option<&Run>) -> Result<String> + Copy,
{
    for node in nodes {
        if let Schema::ForeignKey { table, schema, .. } = node {
            if always_extend || condition(node, run) {
                walk_nodes(schema, run, dimension, always_extend, condition, out)?;
                let sql = dimension(*table, schema, run)?;
                out.insert(*table, sql);
            }
        }
    }
    Ok(())
}

/// Every leaf (`Int`/`Text`) column directly under `nodes`, not descending
/// into nested `ForeignKey` subtrees. Used by the lookup and insert emitters
/// to build a table's own WHERE/column list without re-walking its children.
pub fn own_leaves(nodes: &[Schema]) -> Vec<&Schema> {
    nodes
        .iter()
        .filter(|n| !matches!(n, Schema::ForeignKey { .. }))
        .collect()
}

/// Every `ForeignKey` node directly under `nodes`, not descending further.
pub fn own_children(nodes: &[Schema]) -> Vec<&Schema> {
    nodes
        .iter()
        .filter(|n| matches!(n, Schema::ForeignKey { .. }))
        .collect()
}
