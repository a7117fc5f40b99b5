//! CLI probe for a configured Topotik store.
//!
//! # Responsibility
//! - Load `.env`, build `CoreConfig` and start logging when `LOG_DIR` is set.
//! - Open (and migrate) the configured database and print a status line.

use log::error;
use std::process::ExitCode;
use topotik_core::db::migrations::latest_version;
use topotik_core::{core_version, init_logging, CoreConfig, TopotikCore};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("topotik: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("topotik: {err}");
            return ExitCode::FAILURE;
        }
    }

    let core = match TopotikCore::open(&config) {
        Ok(core) => core,
        Err(err) => {
            error!("event=cli_open module=cli status=error");
            eprintln!("topotik: {err}");
            return ExitCode::FAILURE;
        }
    };

    let schema_version = match core.schema_version() {
        Ok(version) => version,
        Err(err) => {
            eprintln!("topotik: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("topotik_core version={}", core_version());
    println!(
        "topotik_core schema_version={schema_version} latest={}",
        latest_version()
    );
    ExitCode::SUCCESS
}
