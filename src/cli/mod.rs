//! # Interactive Shell
//!
//! The featherdb binary wraps the engine in a small REPL. Lines starting
//! with `.` are meta-commands (`.exit`, `.help`, `.constants`, `.btree`);
//! everything else is parsed as a statement (`insert <id> <username>
//! <email>` or `select`).
//!
//! Input validation - field lengths, non-negative ids - lives here, not in
//! the engine.

mod commands;
mod repl;

pub use commands::{MetaOutcome, Statement, execute_meta_command, is_meta_command, parse_statement};
pub use repl::Repl;
