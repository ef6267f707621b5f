//! Emits `CREATE TABLE` / `DROP TABLE` statements from the schema.

use std::collections::HashMap;

use crate::error::Result;
use crate::schema::{fact_schema, Schema, Table, CHILD_KEY};
use crate::traversal::walk;

/// Knobs that vary the emitted DDL without changing the schema itself.
#[derive(Debug, Clone)]
pub struct DdlOptions {
    /// Whether to append `ENGINE = ColumnStore` to every `CREATE TABLE`
    /// statement. ColumnStore tables have no primary key or auto-increment
    /// support, which is exactly why the key bank exists; disabling this is
    /// only useful against a plain InnoDB instance for local testing, in
    /// which case the clause is omitted entirely rather than swapped out.
    pub column_store: bool,
}

impl Default for DdlOptions {
    fn default() -> Self {
        Self { column_store: true }
    }
}

/// One `CREATE TABLE` statement per table in the schema.
pub fn create_table_statements(options: &DdlOptions) -> Result<HashMap<Table, String>> {
    walk(
        &fact_schema(),
        None,
        |nodes, _| Ok(create_fact_table(nodes, options)),
        |table, nodes, _| Ok(create_dimension_table(table, nodes, options)),
        true,
        &|_, _| true,
    )
}

/// One `DROP TABLE IF EXISTS` statement per table in the schema.
pub fn drop_table_statements() -> HashMap<Table, String> {
    Table::all()
        .iter()
        .map(|table| (*table, format!("DROP TABLE IF EXISTS {};", table.name())))
        .collect()
}

fn column_def(node: &Schema) -> String {
    match node {
        Schema::Int { column, .. } => format!("{} INT UNSIGNED", column),
        Schema::Text { column, .. } => format!("{} TINYTEXT", column),
        Schema::ForeignKey { column, .. } => format!("{} INT UNSIGNED", column),
    }
}

fn engine_clause(options: &DdlOptions) -> &'static str {
    if options.column_store {
        " ENGINE = ColumnStore"
    } else {
        ""
    }
}

fn create_fact_table(nodes: &[Schema], options: &DdlOptions) -> String {
    let columns: Vec<String> = nodes.iter().map(column_def).collect();
    format!(
        "CREATE TABLE {} (\n  {}\n){};",
        Table::Fact.name(),
        columns.join(",\n  "),
        engine_clause(options)
    )
}

fn create_dimension_table(table: Table, nodes: &[Schema], options: &DdlOptions) -> String {
    let mut columns = vec![format!("{} INT UNSIGNED", CHILD_KEY)];
    columns.extend(nodes.iter().map(column_def));
    format!(
        "CREATE TABLE {} (\n  {}\n){};",
        table.name(),
        columns.join(",\n  "),
        engine_clause(options)
    )
}
