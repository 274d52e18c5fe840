//! Statement and meta-command handling for the shell.

use std::io;

use eyre::{Result, bail, ensure};

use crate::config::{
    COMMON_NODE_HEADER_SIZE, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_SPACE_FOR_CELLS, ROW_SIZE,
};
use crate::row::Row;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// Parses one non-meta input line.
pub fn parse_statement(input: &str) -> Result<Statement> {
    let mut parts = input.split_whitespace();

    match parts.next() {
        Some("insert") => {
            let (id, username, email) = match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(username), Some(email)) => (id, username, email),
                _ => bail!("syntax error: expected 'insert <id> <username> <email>'"),
            };
            ensure!(
                parts.next().is_none(),
                "syntax error: trailing input after email"
            );

            let id: i32 = id
                .parse()
                .map_err(|_| eyre::eyre!("syntax error: id is not a number"))?;
            ensure!(id >= 0, "ID must be positive");

            Ok(Statement::Insert(Row::new(id, username, email)?))
        }
        Some("select") => Ok(Statement::Select),
        Some(_) => bail!("unrecognized keyword at start of '{}'", input),
        None => bail!("empty statement"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaOutcome {
    Continue,
    Exit,
}

pub fn is_meta_command(line: &str) -> bool {
    line.starts_with('.')
}

/// Runs a `.`-command against the open table.
pub fn execute_meta_command(line: &str, table: &mut Table) -> Result<MetaOutcome> {
    match line {
        ".exit" => Ok(MetaOutcome::Exit),
        ".help" => {
            println!("Available commands: .help, .exit, .constants, .btree");
            Ok(MetaOutcome::Continue)
        }
        ".constants" => {
            print_constants();
            Ok(MetaOutcome::Continue)
        }
        ".btree" => {
            table.print_tree(&mut io::stdout())?;
            Ok(MetaOutcome::Continue)
        }
        _ => bail!("unrecognized command: {}", line),
    }
}

fn print_constants() {
    println!("ROW_SIZE: {}", ROW_SIZE);
    println!("COMMON_NODE_HEADER_SIZE: {}", COMMON_NODE_HEADER_SIZE);
    println!("LEAF_NODE_HEADER_SIZE: {}", LEAF_NODE_HEADER_SIZE);
    println!("LEAF_NODE_CELL_SIZE: {}", LEAF_NODE_CELL_SIZE);
    println!("LEAF_NODE_SPACE_FOR_CELLS: {}", LEAF_NODE_SPACE_FOR_CELLS);
    println!("LEAF_NODE_MAX_CELLS: {}", LEAF_NODE_MAX_CELLS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_into_a_row() {
        let stmt = parse_statement("insert 1 user1 person1@example.com").unwrap();

        match stmt {
            Statement::Insert(row) => {
                assert_eq!(row.id(), 1);
                assert_eq!(row.username(), "user1");
                assert_eq!(row.email(), "person1@example.com");
            }
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn parses_select() {
        assert_eq!(parse_statement("select").unwrap(), Statement::Select);
    }

    #[test]
    fn negative_id_is_rejected() {
        let err = parse_statement("insert -1 user email").unwrap_err();
        assert_eq!(err.to_string(), "ID must be positive");
    }

    #[test]
    fn oversized_username_is_rejected() {
        let long = "a".repeat(33);
        let err = parse_statement(&format!("insert 1 {} e@x.com", long)).unwrap_err();
        assert_eq!(err.to_string(), "string is too long");
    }

    #[test]
    fn oversized_email_is_rejected() {
        let long = "a".repeat(256);
        let err = parse_statement(&format!("insert 1 user {}", long)).unwrap_err();
        assert_eq!(err.to_string(), "string is too long");
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let err = parse_statement("delete 1").unwrap_err();
        assert!(err.to_string().contains("unrecognized keyword"));
    }

    #[test]
    fn missing_fields_are_a_syntax_error() {
        let err = parse_statement("insert 1 user").unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn meta_commands_are_detected_by_leading_dot() {
        assert!(is_meta_command(".exit"));
        assert!(is_meta_command(".btree"));
        assert!(!is_meta_command("select"));
    }
}
