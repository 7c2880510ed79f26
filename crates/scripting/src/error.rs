//! Error types for the scripting crate

use tickscript_core::TickError;

/// Script-specific error types
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Character outside the language's alphabet
    #[error("Unknown character '{ch}' at column {column}")]
    UnknownCharacter { ch: char, column: usize },

    /// Token sequence that doesn't form a statement or expression
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    /// Multi-token expression run without a binary operator
    #[error("No operator found in expression: {0}")]
    NoOperatorFound(String),

    /// Token that can't stand as an expression operand
    #[error("Unexpected node kind: {0}")]
    UnexpectedNodeKind(String),

    /// Variable used before its `var` declaration
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// Variable declared twice
    #[error("Variable already declared: {0}")]
    DuplicateVariable(String),

    /// Call to a name the builtin registry doesn't know
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Call with the wrong number of arguments
    #[error("{name} expects {expected} argument(s) but got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Builtin without a result used inside an expression
    #[error("{0} does not return a value")]
    NoReturnValue(String),

    /// Fault raised while executing bytecode
    #[error("Runtime fault: {0}")]
    RuntimeFault(String),

    /// Error raised while loading one line of a program
    #[error("Line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ScriptError>,
    },
}

impl ScriptError {
    /// Attach a 1-based source line number
    pub fn at_line(self, line: usize) -> Self {
        ScriptError::Line {
            line,
            source: Box::new(self),
        }
    }

    /// True for errors raised by the VM rather than the compile pipeline
    pub fn is_runtime(&self) -> bool {
        matches!(self, ScriptError::RuntimeFault(_))
    }
}

impl From<ScriptError> for TickError {
    fn from(err: ScriptError) -> Self {
        TickError::Script(err.to_string())
    }
}

/// Result type for scripting operations
pub type Result<T> = std::result::Result<T, ScriptError>;
