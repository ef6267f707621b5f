//! Hand-rolled `--key=value` flag parsing.
//!
//! The flag surface is flat and every multi-value flag takes its value as
//! `--flag=value`, never as a following argument — a shape `clap`'s derive
//! API doesn't fit cleanly, and not worth a dependency for. Unknown flags
//! and missing values are deliberately distinct failures: an unrecognized
//! `--key=value` flag exits `-1`, a recognized multi-value flag given bare
//! (no `=value`) exits `1`.

use energylabel_core::WarehouseConfig;

const MULTI_VALUE_FLAGS: &[&str] = &[
    "--host",
    "--port",
    "--mariadb-host",
    "--mariadb-port",
    "--mariadb-user",
    "--mariadb-password",
    "--mariadb-database",
    "--mariadb-conn-limit",
    "--mariadb-column-store",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Serve,
    Help,
    MariadbInit,
    MariadbUnsafeDropTables,
    MariadbInsertTestRun,
}

#[derive(Debug, Clone)]
pub struct Cli {
    pub host: String,
    pub port: u16,
    pub warehouse: WarehouseConfig,
    pub action: Action,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            warehouse: WarehouseConfig::default(),
            action: Action::Serve,
        }
    }
}

/// A parse failure carries the process exit code `main` should use.
#[derive(Debug, PartialEq, Eq)]
pub struct ExitCode(pub i32);

/// Parse `args` (excluding argv[0]) into a [`Cli`].
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Cli, ExitCode> {
    let mut cli = Cli::default();

    for arg in args {
        if arg == "--help" || arg == "-h" {
            cli.action = Action::Help;
            continue;
        }
        if arg == "--mariadb-init" {
            cli.action = Action::MariadbInit;
            continue;
        }
        if arg == "--mariadb-unsafe-drop-tables" {
            cli.action = Action::MariadbUnsafeDropTables;
            continue;
        }
        if arg == "--mariadb-insert-test-run" {
            cli.action = Action::MariadbInsertTestRun;
            continue;
        }

        if let Some((key, value)) = arg.split_once('=') {
            apply_flag(&mut cli, key, value)?;
        } else if MULTI_VALUE_FLAGS.contains(&arg.as_str()) {
            eprintln!("flag {arg} requires a value: {arg}=<value>");
            return Err(ExitCode(1));
        } else {
            eprintln!("unrecognized argument: {arg}");
            return Err(ExitCode(1));
        }
    }

    Ok(cli)
}

fn apply_flag(cli: &mut Cli, key: &str, value: &str) -> Result<(), ExitCode> {
    match key {
        "--host" => cli.host = value.to_string(),
        "--port" => cli.port = parse_u16(key, value)?,
        "--mariadb-host" => cli.warehouse.host = value.to_string(),
        "--mariadb-port" => cli.warehouse.port = parse_u16(key, value)?,
        "--mariadb-user" => cli.warehouse.user = value.to_string(),
        "--mariadb-password" => cli.warehouse.password = value.to_string(),
        "--mariadb-database" => cli.warehouse.database = value.to_string(),
        "--mariadb-conn-limit" => {
            cli.warehouse.pool_max_connections = value.parse().map_err(|_| {
                eprintln!("invalid value for {key}: {value}");
                ExitCode(1)
            })?;
        }
        "--mariadb-column-store" => {
            cli.warehouse.ddl.column_store = parse_bool(key, value)?;
        }
        _ => {
            eprintln!("unknown flag: {key}");
            return Err(ExitCode(-1));
        }
    }
    Ok(())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ExitCode> {
    value.parse().map_err(|_| {
        eprintln!("invalid value for {key}: {value}");
        ExitCode(1)
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ExitCode> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => {
            eprintln!("invalid value for {key}: {value}");
            Err(ExitCode(1))
        }
    }
}

pub const USAGE: &str = "\
energylabel-server [OPTIONS]

OPTIONS:
    --host=<ADDR>                  HTTP bind address (default localhost)
    --port=<PORT>                  HTTP bind port (default 3000)
    --mariadb-host=<HOST>          MariaDB host (default localhost)
    --mariadb-port=<PORT>          MariaDB port (default 3306)
    --mariadb-user=<USER>          MariaDB user (default energylabel)
    --mariadb-password=<PASSWORD>  MariaDB password (default energylabel)
    --mariadb-database=<NAME>      MariaDB database (default energylabel)
    --mariadb-conn-limit=<N>       Max pooled connections (default 50)
    --mariadb-column-store=<BOOL>  Append ENGINE = ColumnStore to DDL (default true)
    --mariadb-init                 Create tables and exit
    --mariadb-unsafe-drop-tables   Drop all tables and exit
    --mariadb-insert-test-run      Insert two synthetic records and exit
    --help, -h                     Print this message and exit
";
