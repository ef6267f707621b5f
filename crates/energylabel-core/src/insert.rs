//! Emits `INSERT` statements once a record's dimension ids are resolved.

use std::collections::HashMap;

use crate::error::{Result, WarehouseError};
use crate::sanitize::render_literal;
use crate::schema::{Run, Schema, Table};

fn columns_and_values(
    table: Table,
    nodes: &[Schema],
    run: &Run,
    resolved: &HashMap<Table, u64>,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut columns = Vec::with_capacity(nodes.len());
    let mut values = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Schema::Int { column, field } | Schema::Text { column, field } => {
                columns.push(column.to_string());
                values.push(render_literal(field.value(run).as_ref()));
            }
            Schema::ForeignKey {
                column,
                table: child_table,
                optional_field,
                ..
            } => {
                columns.push(column.to_string());
                match optional_field {
                    Some(field) if !field.is_present(run) => values.push("NULL".to_string()),
                    _ => {
                        let id = resolved.get(child_table).ok_or_else(|| {
                            WarehouseError::SchemaMisuseError(format!(
                                "insert into {} needs a resolved id for {} first",
                                table.name(),
                                child_table.name()
                            ))
                        })?;
                        values.push(id.to_string());
                    }
                }
            }
        }
    }
    Ok((columns, values))
}

/// Build the insert statement for a dimension row with its freshly-minted
/// surrogate key `id`.
pub fn insert_dimension_statement(
    table: Table,
    nodes: &[Schema],
    run: &Run,
    id: u64,
    resolved: &HashMap<Table, u64>,
) -> Result<String> {
    let (mut columns, mut values) = columns_and_values(table, nodes, run, resolved)?;
    columns.insert(0, crate::schema::CHILD_KEY.to_string());
    values.insert(0, id.to_string());
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table.name(),
        columns.join(", "),
        values.join(", ")
    ))
}

/// Build the insert statement for the fact row. The fact table has no
/// surrogate key of its own — it is the leaf of the star schema, nothing
/// references it.
pub fn insert_fact_statement(nodes: &[Schema], run: &Run, resolved: &HashMap<Table, u64>) -> Result<String> {
    let (columns, values) = columns_and_values(Table::Fact, nodes, run, resolved)?;
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        Table::Fact.name(),
        columns.join(", "),
        values.join(", ")
    ))
}
