use miette::Diagnostic;
use thiserror::Error;

use crate::parser::FileLineData;

/// Main error type for PBS compilation.
#[derive(Error, Diagnostic, Debug)]
pub enum PbsError {
    #[error("IO error: {0}")]
    #[diagnostic(code(pbs::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(pbs::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(pbs::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(pbs::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(pbs::aggregate))]
    Aggregate {
        message: String,
        #[related]
        errors: Vec<PbsError>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(pbs::config))]
    Configuration {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Edit error: {message}")]
    #[diagnostic(code(pbs::edit))]
    Edit { message: String },

    #[error("Compilation was cancelled")]
    #[diagnostic(code(pbs::cancelled))]
    Cancelled,
}

impl PbsError {
    /// Parse error with the line report of `line` appended.
    pub fn parse_at(message: impl AsRef<str>, line: &FileLineData) -> Self {
        PbsError::Parse {
            message: format!("{}\n{}", message.as_ref(), line.line_report()),
            help: None,
        }
    }

    /// Validation error with the line report of `line` appended.
    pub fn validation_at(message: impl AsRef<str>, line: &FileLineData) -> Self {
        PbsError::Validation {
            message: format!("{}\n{}", message.as_ref(), line.line_report()),
            help: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PbsError::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        PbsError::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// An edit or diff that does not fit the value it targets.
    pub fn edit(message: impl Into<String>) -> Self {
        PbsError::Edit {
            message: message.into(),
        }
    }

    /// Collects several errors into one; a single error is returned as is.
    pub fn aggregate(mut errors: Vec<PbsError>) -> Self {
        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }
        PbsError::Aggregate {
            message: "One or more validation errors occurred:".to_string(),
            errors,
        }
    }
}

pub type Result<T> = std::result::Result<T, PbsError>;
