//! Schema-driven write pipeline for the energy-label telemetry warehouse.
//!
//! A record arrives as a flat [`schema::Run`] and is fanned out across a
//! small star schema (one fact table, several dimension tables) described by
//! [`schema::fact_schema`]. Every SQL statement — DDL, dimension lookup,
//! dimension insert, fact insert — is generated from that one schema rather
//! than hand-written per table, and surrogate keys are minted by
//! [`keybank::KeyBank`] rather than by the database, since the target
//! storage engine supports neither auto-increment nor primary keys.

pub mod config;
pub mod ddl;
pub mod error;
pub mod executor;
pub mod facade;
pub mod insert;
pub mod keybank;
pub mod lookup;
pub mod sanitize;
pub mod schema;
pub mod traversal;

pub use config::WarehouseConfig;
pub use error::{Result, WarehouseError};
pub use facade::Warehouse;
pub use schema::{Run, Table};
