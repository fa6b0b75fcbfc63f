//! Storage-table migrations.
//!
//! # Invariants
//! - Versions are contiguous from 1; the applied version lives in
//!   `PRAGMA user_version`.
//! - Pending steps run in one transaction: a failed step leaves the file at
//!   its previous version.
//! - A file stamped with a version this binary does not know is refused.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "documents",
        sql: include_str!("0001_documents.sql"),
    },
    Step {
        version: 2,
        name: "parent_index",
        sql: include_str!("0002_parent_index.sql"),
    },
];

/// Schema version written by the newest step this binary carries.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings the document table up to `latest_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();

    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        run_step(&tx, step)?;
    }
    tx.commit()?;
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &Step) -> DbResult<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    info!(
        "event=store_migrate module=db status=ok version={} name={}",
        step.version, step.name
    );
    Ok(())
}
