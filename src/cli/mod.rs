pub mod accounts;
pub mod fixup;
pub mod import;
pub mod init;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "expenses", about = "Personal finance tracker with Financisto backup restore.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up expenses: choose a data directory and initialize the database.
    Init {
        /// Path for expenses data (default: ~/Documents/expenses)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Restore everything from a Financisto backup file (.backup, optionally gzipped).
    Import {
        /// Path to the backup file
        file: String,
    },
    /// Recompute account balances and running balances from transaction history.
    Fixup,
    /// List accounts with their recomputed balances.
    Accounts,
    /// Show the data directory and database statistics.
    Status,
}
