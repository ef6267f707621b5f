//! Resolved configuration the façade needs to talk to MariaDB.
//!
//! This struct holds values only — parsing them out of CLI flags or
//! environment variables is the binary's job, not the core's.

use mysql_async::{Opts, OptsBuilder};

use crate::ddl::DdlOptions;

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_max_connections: usize,
    pub ddl: DdlOptions,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "energylabel".to_string(),
            password: "energylabel".to_string(),
            database: "energylabel".to_string(),
            pool_max_connections: 50,
            ddl: DdlOptions::default(),
        }
    }
}

impl WarehouseConfig {
    /// Build the `mysql_async` connection options this configuration
    /// describes.
    pub fn to_opts(&self) -> Opts {
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database.clone()))
            .into()
    }
}
