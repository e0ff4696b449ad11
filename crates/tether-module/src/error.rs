use thiserror::Error;

use tether_core::CoreError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error("module is already initialised")]
    AlreadyInitialized,

    #[error("module is not initialised")]
    NotInitialized,

    #[error("handle store is busy: re-entrant call")]
    Reentrant,

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("function already registered: {0}")]
    DuplicateFunction(String),

    #[error("function {name} declares arity {min}..={max}, callable takes {takes}")]
    InvalidArity {
        name: String,
        min: usize,
        max: usize,
        takes: usize,
    },

    #[error("no such function: {0}")]
    UnknownFunction(String),

    #[error("{name} takes {min}..={max} arguments, got {got}")]
    WrongArgCount {
        name: String,
        min: usize,
        max: usize,
        got: usize,
    },
}

pub type ModuleResult<T> = Result<T, ModuleError>;
