mod cli;
mod http;
mod validation;

use std::process::ExitCode;
use std::sync::Arc;

use energylabel_core::{Run, Warehouse};
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use cli::{Action, Cli};

/// Shared state every HTTP handler reaches through `State<Arc<AppState>>`.
pub struct AppState {
    pub warehouse: Warehouse,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();
}

/// Two fixture records for `--mariadb-insert-test-run` — distinct enough
/// that a real run exercises more than one row per dimension.
fn synthetic_test_runs() -> [Run; 2] {
    [
        Run {
            score: 100,
            status_code: 200,
            error_message: None,
            plugin_version: "0.0.0-test".to_string(),
            plugin_name: "energylabel-server".to_string(),
            extension_version: "0.0.0-test".to_string(),
            browser_version: "0".to_string(),
            browser_name: "synthetic".to_string(),
            path: "/".to_string(),
            url: "https://example.invalid/synthetic".to_string(),
        },
        Run {
            score: 50,
            status_code: 500,
            error_message: Some("synthetic failure".to_string()),
            plugin_version: "0.0.0-test".to_string(),
            plugin_name: "energylabel-server".to_string(),
            extension_version: "0.0.0-test".to_string(),
            browser_version: "1".to_string(),
            browser_name: "synthetic-2".to_string(),
            path: "/second".to_string(),
            url: "https://example.invalid/synthetic-2".to_string(),
        },
    ]
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli: Cli = match cli::parse_args(args) {
        Ok(cli) => cli,
        Err(cli::ExitCode(code)) => {
            return exit_code(code);
        }
    };

    if cli.action == Action::Help {
        print!("{}", cli::USAGE);
        return ExitCode::from(0);
    }

    init_logging();

    let warehouse = match Warehouse::new(cli.warehouse.clone()).await {
        Ok(warehouse) => warehouse,
        Err(err) => {
            error!(error = %err, "failed to initialize warehouse");
            return ExitCode::from(1);
        }
    };

    let result = match cli.action {
        Action::MariadbInit => warehouse.init().await,
        Action::MariadbUnsafeDropTables => warehouse.drop_tables().await,
        Action::MariadbInsertTestRun => warehouse.insert_runs(&synthetic_test_runs()).await,
        Action::Serve => {
            return serve(cli, warehouse).await;
        }
        Action::Help => unreachable!("handled above"),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            error!(error = %err, "admin action failed");
            ExitCode::from(1)
        }
    }
}

async fn serve(cli: Cli, warehouse: Warehouse) -> ExitCode {
    let state = Arc::new(AppState { warehouse });
    let router = http::build_router(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr, "failed to bind HTTP listener");
            return ExitCode::from(1);
        }
    };

    info!(addr, "energylabel-server listening");
    if let Err(err) = axum::serve(listener, router).await {
        error!(error = %err, "server error");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn exit_code(code: i32) -> ExitCode {
    if code < 0 {
        ExitCode::from((code.rem_euclid(256)) as u8)
    } else {
        ExitCode::from(code as u8)
    }
}
