//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store and report per-collection document counts.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use saep_core::{init_logging, Collection, DocumentStore, SqliteDocumentStore, StoreConfig};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("saep error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let config = StoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }

    let conn = config.open_store()?;
    let store = SqliteDocumentStore::new(&conn);

    println!("saep_core version={}", saep_core::core_version());
    match &config.db_path {
        Some(path) => println!("store path={}", path.display()),
        None => println!("store path=:memory:"),
    }
    for collection in Collection::ALL {
        let count = store.count(collection)?;
        println!("collection {collection}={count}");
    }

    info!("event=cli_probe module=cli status=ok");
    Ok(())
}
