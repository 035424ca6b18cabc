//! Error types and reporting

use crate::interp::error::RuntimeError;
use crate::script::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Front-end and driver error
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    /// Input ended inside a construct; more lines may complete it
    #[error("Parser error at {span:?}: unexpected end of input, expected {expected}")]
    Incomplete { expected: String, span: Span },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn incomplete(expected: impl Into<String>, span: Span) -> Self {
        Self::Incomplete {
            expected: expected.into(),
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } | Self::Incomplete { span, .. } => {
                Some(*span)
            }
            Self::Io { .. } | Self::Config { .. } | Self::Runtime(_) => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Lexer { message, .. }
            | Self::Parser { message, .. }
            | Self::Io { message }
            | Self::Config { message } => message.clone(),
            Self::Incomplete { expected, .. } => format!("unexpected end of input, expected {expected}"),
            Self::Runtime(e) => e.message.clone(),
        }
    }
}

/// Report error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error {
        CompileError::Lexer { .. } => "Lexer",
        CompileError::Parser { .. } | CompileError::Incomplete { .. } => "Parser",
        CompileError::Io { .. } => "IO",
        CompileError::Config { .. } => "Config",
        CompileError::Runtime(_) => "Runtime",
    };

    let report = if let Some(span) = error.span() {
        Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish()
    } else {
        Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {}", error.message()))
            .finish()
    };

    if let Err(e) = report.eprint((filename, Source::from(source))) {
        log::error!("cannot render diagnostic: {e}");
        eprintln!("{error}");
    }
}
