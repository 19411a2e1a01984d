use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("expenses.db");

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;

        let accounts: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let categories: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0))?;
        let payees: i64 = conn.query_row("SELECT count(*) FROM payees", [], |r| r.get(0))?;
        let projects: i64 = conn.query_row("SELECT count(*) FROM projects", [], |r| r.get(0))?;
        let transactions: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let splits: i64 = conn.query_row("SELECT count(*) FROM transaction_splits", [], |r| r.get(0))?;

        println!();
        println!("Accounts:      {accounts}");
        println!("Categories:    {categories}");
        println!("Payees:        {payees}");
        println!("Projects:      {projects}");
        println!("Transactions:  {transactions}");
        println!("Splits:        {splits}");
    } else {
        println!();
        println!("Database not found. Run `expenses init` to set up.");
    }

    Ok(())
}
