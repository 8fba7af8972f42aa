use thiserror::Error;

use crate::query::SortDirection;

/// One line typed at the interactive prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    /// 1-based, as typed.
    Page(usize),
    Size(usize),
    /// Without a direction this behaves like a header click.
    Sort {
        column: String,
        direction: Option<SortDirection>,
    },
    Unsort,
    Filter(String),
    ClearFilter,
    Retry,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("'{value}' is not a page number")]
    InvalidNumber { value: String },
}

pub const HELP: &str = "\
commands:
  next | n              next page
  prev | p              previous page
  page N                jump to page N
  size N                rows per page (10, 25, 50, 100)
  sort COLUMN [asc|desc]
                        sort by column; without a direction acts like a header click
  unsort                remove the sort
  filter TEXT           filter by name or address
  clear                 remove the filter
  retry                 request the current page again
  show                  redraw the table
  help                  this list
  quit | q              exit";

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" | "show" | "ls" => Ok(Command::Show),
        "next" | "n" => Ok(Command::Next),
        "prev" | "previous" | "p" => Ok(Command::Previous),
        "page" | "goto" => Ok(Command::Page(number("page", rest)?)),
        "size" => Ok(Command::Size(number("size", rest)?)),
        "sort" => parse_sort(rest),
        "unsort" => Ok(Command::Unsort),
        "filter" | "f" | "search" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "filter",
                    expected: "some text",
                });
            }
            Ok(Command::Filter(rest.to_string()))
        }
        "clear" => Ok(Command::ClearFilter),
        "retry" | "reload" => Ok(Command::Retry),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(word.to_string())),
    }
}

fn number(command: &'static str, rest: &str) -> Result<usize, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            expected: "a number",
        });
    }
    rest.parse().map_err(|_| CommandError::InvalidNumber {
        value: rest.to_string(),
    })
}

// Column labels may contain spaces, so the direction is only taken from the
// last word.
fn parse_sort(rest: &str) -> Result<Command, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "sort",
            expected: "a column",
        });
    }
    if let Some((column, last)) = rest.rsplit_once(char::is_whitespace) {
        if let Some(direction) = SortDirection::parse(last) {
            return Ok(Command::Sort {
                column: column.trim().to_string(),
                direction: Some(direction),
            });
        }
    }
    Ok(Command::Sort {
        column: rest.to_string(),
        direction: None,
    })
}
