//! # featherdb CLI Entry Point
//!
//! ```bash
//! # Open (or create) a database and enter the shell
//! featherdb ./users.db
//!
//! # Show version / help
//! featherdb --version
//! featherdb --help
//! ```

use std::env;
use std::path::PathBuf;

use eyre::{Result, WrapErr, bail};
use featherdb::Table;
use featherdb::cli::Repl;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-v" => {
                println!("featherdb {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other if other.starts_with('-') => {
                bail!("Unknown option: {}", other);
            }
            path => {
                if db_path.is_some() {
                    bail!("Multiple database paths specified");
                }
                db_path = Some(PathBuf::from(path));
            }
        }
    }

    let db_path = match db_path {
        Some(path) => path,
        None => {
            print_usage();
            return Ok(());
        }
    };

    println!("featherdb {}", env!("CARGO_PKG_VERSION"));
    println!("Opening database: {}", db_path.display());

    let table = Table::open(&db_path)
        .wrap_err_with(|| format!("failed to open database at {:?}", db_path))?;

    Repl::new(table)?.run()
}

fn print_usage() {
    println!("featherdb - feather-weight single-file storage engine");
    println!();
    println!("USAGE:");
    println!("    featherdb [OPTIONS] <DATABASE_FILE>");
    println!();
    println!("ARGS:");
    println!("    <DATABASE_FILE>    Path to the database file (created if missing)");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help         Print help information");
    println!("    -v, --version      Print version information");
    println!();
    println!("COMMANDS INSIDE THE SHELL:");
    println!("    insert <id> <username> <email>    Insert a row");
    println!("    select                            Print every row in key order");
    println!("    .btree                            Pretty-print the tree");
    println!("    .constants                        Print layout constants");
    println!("    .exit                             Flush pages and leave");
}
