use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt;
use crate::settings::get_data_dir;
use crate::store;

pub fn run() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("expenses.db"))?;
    let accounts = store::accounts_sorted(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Type", "Balance", "Active", "Last activity"]);
    for account in accounts {
        let last_activity = account
            .last_transaction_at
            .map(fmt::timestamp)
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(&account.title),
            Cell::new(account.account_type.as_str()),
            Cell::new(fmt::money(account.balance, &account.currency)),
            Cell::new(if account.is_active { "yes" } else { "no" }),
            Cell::new(last_activity),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
