use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::integrity;
use crate::settings::get_data_dir;

pub fn run() -> Result<()> {
    let mut conn = get_connection(&get_data_dir().join("expenses.db"))?;
    init_db(&conn)?;

    let report = integrity::fix(&mut conn)?;
    println!(
        "Recomputed {} accounts ({} transactions replayed)",
        report.accounts, report.transactions
    );
    Ok(())
}
