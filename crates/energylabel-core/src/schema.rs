//! Declarative description of the fact + dimension tables.
//!
//! The schema is a process-wide constant: a tree of tagged `Schema` nodes
//! driven by pattern match, not a visitor hierarchy. [`fact_schema`] is the
//! single source of truth every emitter (DDL, lookup, insert) walks.

/// The closed set of tables this warehouse writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Fact,
    Plugin,
    PluginName,
    Browser,
    BrowserName,
    Url,
    Domain,
    ErrorMessage,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Fact => "Fact",
            Table::Plugin => "Plugin",
            Table::PluginName => "PluginName",
            Table::Browser => "Browser",
            Table::BrowserName => "BrowserName",
            Table::Url => "Url",
            Table::Domain => "Domain",
            Table::ErrorMessage => "ErrorMessage",
        }
    }

    /// Every table the schema touches, in declaration order. DDL and
    /// surrogate-key seeding walk this rather than the schema tree, since
    /// they must visit tables regardless of which records have been seen.
    pub fn all() -> &'static [Table] {
        &[
            Table::Fact,
            Table::Plugin,
            Table::PluginName,
            Table::Browser,
            Table::BrowserName,
            Table::Url,
            Table::Domain,
            Table::ErrorMessage,
        ]
    }

    pub fn is_dimension(self) -> bool {
        !matches!(self, Table::Fact)
    }
}

/// The fixed set of scalar fields on an ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Score,
    StatusCode,
    ErrorMessage,
    PluginVersion,
    PluginName,
    ExtensionVersion,
    BrowserVersion,
    BrowserName,
    Path,
    Url,
}

/// A scalar value pulled off a [`Run`] by a schema leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Int(i64),
    Text(String),
}

/// One ingested telemetry record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub score: i64,
    pub status_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub plugin_version: String,
    pub plugin_name: String,
    pub extension_version: String,
    pub browser_version: String,
    pub browser_name: String,
    pub path: String,
    pub url: String,
}

impl RecordField {
    /// Extract this field's value from a record. `None` means "absent" —
    /// only possible for `ErrorMessage`, the one optional field.
    pub fn value(self, run: &Run) -> Option<RecordValue> {
        match self {
            RecordField::Score => Some(RecordValue::Int(run.score)),
            RecordField::StatusCode => Some(RecordValue::Int(run.status_code)),
            RecordField::ErrorMessage => run.error_message.clone().map(RecordValue::Text),
            RecordField::PluginVersion => Some(RecordValue::Text(run.plugin_version.clone())),
            RecordField::PluginName => Some(RecordValue::Text(run.plugin_name.clone())),
            RecordField::ExtensionVersion => Some(RecordValue::Text(run.extension_version.clone())),
            RecordField::BrowserVersion => Some(RecordValue::Text(run.browser_version.clone())),
            RecordField::BrowserName => Some(RecordValue::Text(run.browser_name.clone())),
            RecordField::Path => Some(RecordValue::Text(run.path.clone())),
            RecordField::Url => Some(RecordValue::Text(run.url.clone())),
        }
    }

    /// Whether this field is present on the record at all (as opposed to
    /// present-but-absent-value, which only applies to `ErrorMessage`).
    pub fn is_present(self, run: &Run) -> bool {
        !matches!(self, RecordField::ErrorMessage) || run.error_message.is_some()
    }
}

/// The surrogate key column every dimension table carries.
pub const CHILD_KEY: &str = "id";

/// A node in the recursive schema tree.
///
/// `Int` and `Text` are scalar columns bound to a record field. `ForeignKey`
/// references a dimension table and inlines that table's own schema (which
/// may itself contain further `ForeignKey` nodes — e.g. `Plugin` references
/// `PluginName`).
#[derive(Debug, Clone)]
pub enum Schema {
    Int {
        column: &'static str,
        field: RecordField,
    },
    Text {
        column: &'static str,
        field: RecordField,
    },
    ForeignKey {
        column: &'static str,
        table: Table,
        schema: Vec<Schema>,
        /// If set, this dimension is skipped for a record that lacks this field.
        optional_field: Option<RecordField>,
    },
}

/// The complete schema for the fact table: its own columns plus every
/// (possibly nested) dimension it references.
pub fn fact_schema() -> Vec<Schema> {
    vec![
        Schema::Int {
            column: "score",
            field: RecordField::Score,
        },
        Schema::Int {
            column: "status_code",
            field: RecordField::StatusCode,
        },
        Schema::Text {
            column: "extension_version",
            field: RecordField::ExtensionVersion,
        },
        Schema::ForeignKey {
            column: "plugin_id",
            table: Table::Plugin,
            optional_field: None,
            schema: plugin_schema(),
        },
        Schema::ForeignKey {
            column: "browser_id",
            table: Table::Browser,
            optional_field: None,
            schema: browser_schema(),
        },
        Schema::ForeignKey {
            column: "url_id",
            table: Table::Url,
            optional_field: None,
            schema: url_schema(),
        },
        Schema::ForeignKey {
            column: "error_message_id",
            table: Table::ErrorMessage,
            optional_field: Some(RecordField::ErrorMessage),
            schema: vec![Schema::Text {
                column: "message",
                field: RecordField::ErrorMessage,
            }],
        },
    ]
}

fn plugin_schema() -> Vec<Schema> {
    vec![
        Schema::Text {
            column: "version",
            field: RecordField::PluginVersion,
        },
        Schema::ForeignKey {
            column: "name_id",
            table: Table::PluginName,
            optional_field: None,
            schema: vec![Schema::Text {
                column: "name",
                field: RecordField::PluginName,
            }],
        },
    ]
}

fn browser_schema() -> Vec<Schema> {
    vec![
        Schema::Text {
            column: "version",
            field: RecordField::BrowserVersion,
        },
        Schema::ForeignKey {
            column: "name_id",
            table: Table::BrowserName,
            optional_field: None,
            schema: vec![Schema::Text {
                column: "name",
                field: RecordField::BrowserName,
            }],
        },
    ]
}

fn url_schema() -> Vec<Schema> {
    vec![
        Schema::Text {
            column: "path",
            field: RecordField::Path,
        },
        Schema::ForeignKey {
            column: "domain_id",
            table: Table::Domain,
            optional_field: None,
            schema: vec![Schema::Text {
                column: "domain",
                field: RecordField::Url,
            }],
        },
    ]
}
