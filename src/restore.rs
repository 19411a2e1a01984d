//! Restore orchestration: open a backup stream, wipe the store, import, then
//! recompute derived balances.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use log::info;
use rusqlite::Connection;

use crate::error::Result;
use crate::financisto::{self, ImportCounts};
use crate::integrity::{self, FixReport};
use crate::store;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub struct RestoreSummary {
    pub counts: ImportCounts,
    pub fix: FixReport,
}

/// Open a backup file, transparently unwrapping gzip. The magic number is
/// inspected through the buffer without consuming it, so plain-text files
/// starting with arbitrary bytes pass through untouched.
pub fn open_backup(path: &Path) -> Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(File::open(path)?);
    let magic = reader.fill_buf()?;
    if magic.len() >= 2 && magic[..2] == GZIP_MAGIC {
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Run the full restore pipeline. The store is emptied before parsing so a
/// fatal error anywhere in the import leaves it empty, never half-legacy and
/// half-new. Errors propagate to the caller as the single failure outcome.
pub fn restore(conn: &mut Connection, path: &Path) -> Result<RestoreSummary> {
    let input = open_backup(path)?;

    store::delete_all(conn)?;
    info!("finished emptying existing database");

    let backup = financisto::parse_backup(input)?;
    info!("finished parsing backup file");

    let counts = financisto::persist(conn, &backup)?;
    info!("finished importing backup file");

    let fix = integrity::fix(conn)?;

    Ok(RestoreSummary { counts, fix })
}
