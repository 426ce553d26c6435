//! Module containing error definitions for the lex/parse/evaluation pipeline.

use crate::value::Value;
use std::fmt;

/// The kind of error raised anywhere in the pipeline.
///
/// Every variant carries just enough context to render the one-line
/// `<Kind>: <description> (line <N>)` message required by the language's
/// error taxonomy; the line number itself lives alongside the kind in
/// [`ConvoError`] rather than inside each variant, since every site that
/// raises one already has a current line in hand.
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Lex or parse failure.
    Syntax(String),
    /// Identifier lookup failed.
    Name(String),
    /// An operator or built-in received a value of the wrong type.
    Type(String),
    /// List index out of range, or dict key missing.
    Index(String),
    /// Function called with the wrong number of arguments.
    Arity(String),
    /// Division by zero, I/O failure, or another runtime condition.
    Runtime(String),
    /// `Throw expr` — the value is whatever the script supplied.
    Thrown(Value),
    /// `Return expr` unwinding out of a function call. Not a real error —
    /// routed through the same `Result` channel purely so `?` carries it
    /// up through nested statement execution, the way the teacher's own
    /// `EvalAltResult` folds its loop/return control signals in alongside
    /// real errors.
    Return(Value),
    /// `Stop` unwinding to the top of the running program.
    Stop,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SyntaxError",
            Self::Name(_) => "NameError",
            Self::Type(_) => "TypeError",
            Self::Index(_) => "IndexError",
            Self::Arity(_) => "ArityError",
            Self::Runtime(_) => "RuntimeError",
            Self::Thrown(_) => "Thrown",
            Self::Return(_) => "Return",
            Self::Stop => "Stop",
        }
    }

    fn description(&self) -> String {
        match self {
            Self::Syntax(s)
            | Self::Name(s)
            | Self::Type(s)
            | Self::Index(s)
            | Self::Arity(s)
            | Self::Runtime(s) => s.clone(),
            Self::Thrown(v) => v.to_display_string(),
            Self::Return(v) => v.to_display_string(),
            Self::Stop => "stop".to_string(),
        }
    }

    /// True for `Return`/`Stop`: control-flow signals that unwind through
    /// the same `Result` channel as errors but are never reported to the
    /// user and are never caught by `Try/Catch`.
    pub fn is_pseudo_signal(&self) -> bool {
        matches!(self, Self::Return(_) | Self::Stop)
    }

    /// True for everything `Try/Catch` intercepts: `Thrown` plus every
    /// ordinary runtime-error kind (§4.3.2 — a runtime error "converts
    /// into a thrown String"). `Syntax` never reaches evaluation and the
    /// pseudo-signals above are excluded so `Return`/`Stop` keep unwinding
    /// through an enclosing `Try`.
    pub fn is_catchable(&self) -> bool {
        !matches!(self, Self::Syntax(_) | Self::Return(_) | Self::Stop)
    }
}

/// An error raised anywhere in the lex/parse/eval pipeline, carrying the
/// 1-based source line it occurred on (0 when no line is known, e.g. a
/// host-side configuration error raised before any script ran).
#[derive(Debug, Clone)]
pub struct ConvoError {
    pub kind: ErrorKind,
    pub line: usize,
}

impl ConvoError {
    pub fn new(kind: ErrorKind, line: usize) -> Self {
        Self { kind, line }
    }

    pub fn syntax(msg: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Syntax(msg.into()), line)
    }

    pub fn name(msg: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Name(msg.into()), line)
    }

    pub fn type_error(msg: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Type(msg.into()), line)
    }

    pub fn index(msg: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Index(msg.into()), line)
    }

    pub fn arity(msg: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Arity(msg.into()), line)
    }

    pub fn runtime(msg: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Runtime(msg.into()), line)
    }

    pub fn thrown(value: Value, line: usize) -> Self {
        Self::new(ErrorKind::Thrown(value), line)
    }

    pub fn return_signal(value: Value, line: usize) -> Self {
        Self::new(ErrorKind::Return(value), line)
    }

    pub fn stop_signal(line: usize) -> Self {
        Self::new(ErrorKind::Stop, line)
    }

    /// Convert this error into the `Value` a `Catch` block binds, per §4.3.2:
    /// a runtime error "converts into a thrown String containing the error message".
    pub fn into_thrown_value(self) -> Value {
        match self.kind {
            ErrorKind::Thrown(v) => v,
            other => Value::from(other.description()),
        }
    }
}

impl fmt::Display for ConvoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(
                f,
                "{}: {} (line {})",
                self.kind.label(),
                self.kind.description(),
                self.line
            )
        } else {
            write!(f, "{}: {}", self.kind.label(), self.kind.description())
        }
    }
}

impl std::error::Error for ConvoError {}

pub type ConvoResult<T> = Result<T, Box<ConvoError>>;

impl From<ConvoError> for Box<ConvoError> {
    fn from(e: ConvoError) -> Self {
        Box::new(e)
    }
}
