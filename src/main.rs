mod cli;
mod db;
mod error;
mod financisto;
mod fmt;
mod integrity;
mod models;
mod restore;
mod settings;
mod store;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file } => cli::import::run(&file),
        Commands::Fixup => cli::fixup::run(),
        Commands::Accounts => cli::accounts::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
