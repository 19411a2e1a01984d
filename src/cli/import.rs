use std::path::PathBuf;

use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::restore;
use crate::settings::get_data_dir;

pub fn run(file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let mut conn = get_connection(&data_dir.join("expenses.db"))?;
    init_db(&conn)?;

    let summary = restore::restore(&mut conn, &file_path)?;

    println!("{}", "Restore complete.".green());
    println!(
        "  {} accounts, {} categories, {} payees, {} projects",
        summary.counts.accounts, summary.counts.categories, summary.counts.payees, summary.counts.projects
    );
    println!(
        "  {} transactions, {} splits",
        summary.counts.transactions, summary.counts.splits
    );
    println!(
        "Recomputed balances for {} accounts ({} transactions replayed)",
        summary.fix.accounts, summary.fix.transactions
    );
    Ok(())
}
