//! Statement-shape properties that hold with no database connection at all:
//! the emitters are pure functions of the schema and a record.

use std::collections::HashMap;

use energylabel_core::ddl::{create_table_statements, drop_table_statements, DdlOptions};
use energylabel_core::insert::{insert_dimension_statement, insert_fact_statement};
use energylabel_core::lookup::lookup_statement;
use energylabel_core::sanitize::escape_text;
use energylabel_core::schema::{fact_schema, Run, Schema, Table};

fn sample_run() -> Run {
    Run {
        score: 87,
        status_code: 200,
        error_message: Some("timeout".to_string()),
        plugin_version: "2.3.1".to_string(),
        plugin_name: "DBTest".to_string(),
        extension_version: "1.0.0".to_string(),
        browser_version: "121.0".to_string(),
        browser_name: "Firefox".to_string(),
        path: "/product/123".to_string(),
        url: "https://shop.example.com".to_string(),
    }
}

#[test]
fn ddl_declares_every_table_under_the_columnstore_engine() {
    let statements = create_table_statements(&DdlOptions::default()).unwrap();
    assert_eq!(statements.len(), Table::all().len());
    for table in Table::all() {
        let sql = &statements[table];
        assert!(sql.starts_with(&format!("CREATE TABLE {}", table.name())));
        assert!(sql.contains("ENGINE = ColumnStore"));
    }
}

#[test]
fn ddl_uses_int_unsigned_and_tinytext_columns() {
    let statements = create_table_statements(&DdlOptions::default()).unwrap();
    let plugin = &statements[&Table::Plugin];
    assert!(plugin.contains("id INT UNSIGNED"));
    assert!(plugin.contains("name_id INT UNSIGNED"));
    assert!(plugin.contains("version TINYTEXT"));
    assert!(!plugin.to_uppercase().contains("BIGINT"));
}

#[test]
fn engine_clause_can_be_omitted() {
    let statements = create_table_statements(&DdlOptions { column_store: false }).unwrap();
    assert!(!statements[&Table::Fact].contains("ENGINE"));
    assert!(statements[&Table::Fact].ends_with(");"));
}

#[test]
fn drop_statements_are_idempotent_text() {
    let statements = drop_table_statements();
    for table in Table::all() {
        assert!(statements[table].contains("IF EXISTS"));
    }
}

#[test]
fn lookup_statement_never_uses_limit_or_coalesce() {
    let run = sample_run();
    let plugin_name_nodes = match &fact_schema()[3] {
        Schema::ForeignKey { schema, .. } => match &schema[1] {
            Schema::ForeignKey { schema, .. } => schema.clone(),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    };
    let sql = lookup_statement(Table::PluginName, &plugin_name_nodes, &run).unwrap();
    assert!(sql.starts_with("SELECT MAX(PluginName.id)"));
    let upper = sql.to_uppercase();
    assert!(!upper.contains("LIMIT"));
    assert!(!upper.contains("COALESCE"));
}

#[test]
fn lookup_statement_joins_through_nested_foreign_keys() {
    let run = sample_run();
    let plugin_nodes = match &fact_schema()[3] {
        Schema::ForeignKey { schema, .. } => schema.clone(),
        _ => unreachable!(),
    };
    let sql = lookup_statement(Table::Plugin, &plugin_nodes, &run).unwrap();
    assert!(sql.contains("INNER JOIN PluginName ON Plugin.name_id = PluginName.id"));
    assert!(sql.contains("PluginName.name = 'DBTest'"));
}

#[test]
fn insert_statement_embeds_the_minted_surrogate_key() {
    let run = sample_run();
    let browser_name_nodes = match &fact_schema()[4] {
        Schema::ForeignKey { schema, .. } => match &schema[1] {
            Schema::ForeignKey { schema, .. } => schema.clone(),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    };
    let sql = insert_dimension_statement(Table::BrowserName, &browser_name_nodes, &run, 17, &HashMap::new()).unwrap();
    assert!(sql.starts_with("INSERT INTO BrowserName (id, name)"));
    assert!(sql.contains("VALUES (17, 'Firefox')"));
}

#[test]
fn fact_insert_references_every_resolved_dimension() {
    let run = sample_run();
    let mut resolved = HashMap::new();
    for table in [Table::Plugin, Table::Browser, Table::Url, Table::ErrorMessage] {
        resolved.insert(table, 1u64);
    }
    let sql = insert_fact_statement(&fact_schema(), &run, &resolved).unwrap();
    assert!(sql.contains("plugin_id"));
    assert!(sql.contains("browser_id"));
    assert!(sql.contains("url_id"));
    assert!(sql.contains("error_message_id"));
}

#[test]
fn sanitizer_escapes_only_the_quote_before_splicing() {
    let value = escape_text("a'b\\c");
    assert_eq!(value, "a\\'b\\c");
}
