//! Error types surfaced by the warehouse write pipeline.

/// Errors the core can produce.
///
/// Variants map directly onto the failure classes a caller needs to
/// distinguish: a bad CLI/config value, a schema that was built wrong (a
/// programmer error, not a runtime one), a driver/transaction failure, and a
/// rejected input payload.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// A numeric configuration value (port, connection limit) did not parse.
    #[error("invalid configuration value for `{field}`: {value}")]
    ConfigError { field: &'static str, value: String },

    /// An emitter was asked to resolve a primary key in a schema subtree that
    /// has none — indicates a broken schema literal, not a data problem.
    #[error("schema misuse: {0}")]
    SchemaMisuseError(String),

    /// Connection acquisition, query, commit, or rollback failed.
    #[error("database driver error: {0}")]
    DriverError(#[from] mysql_async::Error),

    /// An inbound record failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, WarehouseError>;
