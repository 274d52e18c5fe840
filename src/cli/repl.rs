//! The read-eval-print loop.
//!
//! Reads lines with rustyline (history, line editing), dispatches
//! meta-commands and statements, and prints results. Statement errors are
//! displayed and the loop continues; `.exit` or Ctrl-D closes the table
//! (flushing every cached page) before leaving.

use eyre::{Result, WrapErr};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::cli::commands::{
    MetaOutcome, Statement, execute_meta_command, is_meta_command, parse_statement,
};
use crate::table::Table;

const PROMPT: &str = "featherdb> ";

pub struct Repl {
    table: Table,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(table: Table) -> Result<Self> {
        let editor = DefaultEditor::new().wrap_err("failed to initialize line editor")?;
        Ok(Self { table, editor })
    }

    pub fn run(mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(trimmed).ok();

                    if is_meta_command(trimmed) {
                        match execute_meta_command(trimmed, &mut self.table) {
                            Ok(MetaOutcome::Exit) => break,
                            Ok(MetaOutcome::Continue) => {}
                            Err(err) => println!("{}", err),
                        }
                        continue;
                    }

                    match parse_statement(trimmed) {
                        Ok(statement) => self.execute_statement(statement),
                        Err(err) => println!("{}.", err),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error reading input: {}", err);
                    break;
                }
            }
        }

        self.table.close()?;
        println!("Bye!");
        Ok(())
    }

    fn execute_statement(&mut self, statement: Statement) {
        match statement {
            Statement::Insert(row) => match self.table.insert(&row) {
                Ok(()) => println!("Executed."),
                Err(err) => println!("Error: {}.", err),
            },
            Statement::Select => {
                let scan = match self.table.scan() {
                    Ok(scan) => scan,
                    Err(err) => {
                        println!("Error: {}.", err);
                        return;
                    }
                };
                for row in scan {
                    match row {
                        Ok(row) => println!("{}", row),
                        Err(err) => {
                            println!("Error: {}.", err);
                            return;
                        }
                    }
                }
                println!("Executed.");
            }
        }
    }
}
