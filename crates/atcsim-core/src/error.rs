//! Errors raised while turning text into scenario commands.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommandError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,

    #[error("unknown command {0}")]
    UnknownCommand(String),

    #[error("{command}: missing argument <{arg}>")]
    MissingArgument { command: &'static str, arg: &'static str },

    #[error("{command}: too many arguments")]
    TooManyArguments { command: &'static str },

    #[error("{command}: bad value {value:?} for <{arg}>")]
    BadValue {
        command: &'static str,
        arg: &'static str,
        value: String,
    },

    #[error("bad timestamp {0:?}")]
    BadTimestamp(String),

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<CommandError>,
    },
}
