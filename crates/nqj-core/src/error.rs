//! Error types for every phase of NotQuiteJava processing.
//!
//! ## Error Hierarchy
//!
//! ```text
//! NqjError (top-level wrapper)
//! ├── ParseErrors      - Lexer/parser errors (with ParseErrorKind)
//! ├── Diagnostics      - Ordered name/type analysis diagnostics (CompilationError)
//! └── RuntimeError     - Errors raised while interpreting generated IR
//! ```
//!
//! Analysis never stops at the first problem: every failed check is pushed
//! onto a [`Diagnostics`] collection and analysis continues with a degraded
//! value. A program is rejected iff the collection is non-empty.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// An unexpected character was encountered by the lexer.
    UnexpectedChar,
    /// A block comment was not closed.
    UnterminatedComment,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A statement was expected.
    ExpectedStatement,
    /// The left side of an assignment is not assignable.
    InvalidAssignTarget,
    /// A literal could not be represented.
    InvalidLiteral,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedChar => "unexpected character",
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::InvalidAssignTarget => "invalid assignment target",
            ParseErrorKind::InvalidLiteral => "invalid literal",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!(
            "Error at {}:{}: {}\n",
            self.span.line, self.span.col, self.kind
        );
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }
        if let Some(line_text) = source.lines().nth(self.span.line.saturating_sub(1) as usize) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", self.span.line, line_text));
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            let underline = "~".repeat(self.span.len.saturating_sub(1) as usize);
            output.push_str(&format!("  | {indent}^{underline}\n"));
        }
        output
    }
}

/// A collection of parse errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Compilation Errors
// ============================================================================

/// A diagnostic produced by name and type analysis.
///
/// Every variant except [`MissingMain`](Self::MissingMain) is anchored at a
/// source span; `MissingMain` is reported at program level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    // ---- hierarchy ----
    /// Two classes share a name; the later declaration is ignored.
    #[error("at {span}: class with name {name} is already defined")]
    DuplicateClass { name: String, span: Span },

    /// A class extends a name that is not a declared class.
    #[error("at {span}: class {class} extends undeclared class {superclass}")]
    UndeclaredSuperclass {
        class: String,
        superclass: String,
        span: Span,
    },

    /// A class is part of an inheritance cycle. One diagnostic per member.
    #[error("at {span}: cyclic dependency involving: [{}]", cycle.join(", "))]
    CyclicInheritance {
        class: String,
        cycle: Vec<String>,
        span: Span,
    },

    // ---- name resolution ----
    /// A field name is declared twice in one class.
    #[error("at {span}: variable with name {name} is already defined in class {class}")]
    DuplicateField {
        name: String,
        class: String,
        span: Span,
    },

    /// A method name is declared twice in one class.
    #[error("at {span}: method with name {name} is already defined in class {class}")]
    DuplicateMethod {
        name: String,
        class: String,
        span: Span,
    },

    /// A global function name is declared twice (or shadows a builtin).
    #[error("at {span}: there already is a global function with name {name}")]
    DuplicateFunction { name: String, span: Span },

    /// Two parameters of one function share a name.
    #[error("at {span}: parameter with name {name} already exists")]
    DuplicateParameter { name: String, span: Span },

    /// A local variable redeclares a visible local or parameter.
    #[error("at {span}: variable with name {name} already exists in function {function}")]
    DuplicateVariable {
        name: String,
        function: String,
        span: Span,
    },

    /// A type or `new` expression names an undeclared class.
    #[error("at {span}: the type {name} is an undeclared class")]
    UndeclaredClass { name: String, span: Span },

    /// A variable use resolves to nothing.
    #[error("at {span}: there is no variable with name {name}")]
    UnknownVariable { name: String, span: Span },

    /// A field is neither in the receiver's class nor its ancestors.
    #[error("at {span}: there is no field {name} in class {class} or its superclasses")]
    UnknownField {
        name: String,
        class: String,
        span: Span,
    },

    /// A method is neither in the receiver's class nor its ancestors.
    #[error("at {span}: there is no method with name {name} in class {class}")]
    UnknownMethod {
        name: String,
        class: String,
        span: Span,
    },

    /// An unqualified call names no method and no global function.
    #[error("at {span}: function {name} does not exist")]
    UnknownFunction { name: String, span: Span },

    /// A call passes more arguments than the callee declares.
    #[error("at {span}: too many arguments (expected {expected}, found {found})")]
    TooManyArguments {
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A call passes fewer arguments than the callee declares.
    #[error("at {span}: not enough arguments (expected {expected}, found {found})")]
    NotEnoughArguments {
        expected: usize,
        found: usize,
        span: Span,
    },

    // ---- type errors ----
    /// An operand or argument is not a subtype of the expected type.
    #[error("at {span}: expected expression of type {expected} but found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    /// The assigned value is not a subtype of the target.
    #[error("at {span}: cannot assign value of type {found} to {target}")]
    InvalidAssignment {
        target: String,
        found: String,
        span: Span,
    },

    /// An `if`/`while` condition is not boolean.
    #[error("at {span}: {construct}-condition must be of type boolean, found {found}")]
    InvalidCondition {
        construct: &'static str,
        found: String,
        span: Span,
    },

    /// A returned value does not fit the declared return type.
    #[error("at {span}: should return value of type {expected}, but found {found}")]
    InvalidReturn {
        expected: String,
        found: String,
        span: Span,
    },

    /// Neither side of `==` is a subtype of the other.
    #[error("at {span}: cannot compare types {left} and {right}")]
    IncomparableTypes {
        left: String,
        right: String,
        span: Span,
    },

    /// An array operation is applied to a non-array.
    #[error("at {span}: expected expression of array type, but found {found}")]
    NotAnArray { found: String, span: Span },

    /// A field access or method call has a non-class receiver.
    #[error("at {span}: receiver of type {found} is not a class")]
    NotAClass { found: String, span: Span },

    /// `this` used outside a method body.
    #[error("at {span}: cannot use the keyword 'this' outside a method")]
    ThisOutsideMethod { span: Span },

    // ---- structural ----
    /// An overriding method has a different number of parameters.
    #[error("at {span}: method {method} must have same number of parameters as method in super class")]
    OverrideParameterCount { method: String, span: Span },

    /// An overriding method changes a parameter type.
    #[error("at {span}: parameter types must be equal for overridden method {method}")]
    OverrideParameterType { method: String, span: Span },

    /// An overriding method widens the return type.
    #[error("at {span}: return type of {method} must be a subtype of the overridden method's")]
    OverrideReturnType { method: String, span: Span },

    // ---- control flow ----
    /// A function or method does not end with `return`.
    #[error("at {span}: method {function} does not have a return statement as the last statement")]
    MissingReturn { function: String, span: Span },

    /// A statement follows a `return` in the same block.
    #[error("at {span}: unreachable statement")]
    UnreachableStatement { span: Span },

    /// The program has no global `main` function.
    #[error("main method must be present")]
    MissingMain,

    /// `main` does not return `int`.
    #[error("at {span}: return type of the main method must be int")]
    MainReturnType { span: Span },

    /// `main` declares parameters.
    #[error("at {span}: main method does not take parameters")]
    MainParameters { span: Span },

    /// `main` does not end with `return`.
    #[error("at {span}: main method does not have a return statement as the last statement")]
    MainMissingReturn { span: Span },
}

impl CompilationError {
    /// Get the span where this error occurred, `None` for program-level errors.
    pub fn span(&self) -> Option<Span> {
        use CompilationError::*;
        match self {
            MissingMain => None,
            DuplicateClass { span, .. }
            | UndeclaredSuperclass { span, .. }
            | CyclicInheritance { span, .. }
            | DuplicateField { span, .. }
            | DuplicateMethod { span, .. }
            | DuplicateFunction { span, .. }
            | DuplicateParameter { span, .. }
            | DuplicateVariable { span, .. }
            | UndeclaredClass { span, .. }
            | UnknownVariable { span, .. }
            | UnknownField { span, .. }
            | UnknownMethod { span, .. }
            | UnknownFunction { span, .. }
            | TooManyArguments { span, .. }
            | NotEnoughArguments { span, .. }
            | TypeMismatch { span, .. }
            | InvalidAssignment { span, .. }
            | InvalidCondition { span, .. }
            | InvalidReturn { span, .. }
            | IncomparableTypes { span, .. }
            | NotAnArray { span, .. }
            | NotAClass { span, .. }
            | ThisOutsideMethod { span }
            | OverrideParameterCount { span, .. }
            | OverrideParameterType { span, .. }
            | OverrideReturnType { span, .. }
            | MissingReturn { span, .. }
            | UnreachableStatement { span }
            | MainReturnType { span }
            | MainParameters { span }
            | MainMissingReturn { span } => Some(*span),
        }
    }
}

/// Append-only, insertion-ordered collection of analysis diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<CompilationError>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn push(&mut self, error: CompilationError) {
        self.errors.push(error);
    }

    /// True when analysis accepted the program.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate in the order the diagnostics were reported.
    pub fn iter(&self) -> impl Iterator<Item = &CompilationError> {
        self.errors.iter()
    }

    /// Borrow the diagnostics as a slice.
    pub fn as_slice(&self) -> &[CompilationError] {
        &self.errors
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<CompilationError> {
        self.errors
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a CompilationError;
    type IntoIter = std::slice::Iter<'a, CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while interpreting generated IR.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Generated code executed a `HaltWithError` terminator.
    #[error("halted: {message}")]
    Halt { message: String },

    /// A load, store or pointer computation left its allocation.
    #[error("invalid memory access: {message}")]
    InvalidMemoryAccess { message: String },

    /// A load read a location that was never stored to.
    #[error("read of uninitialized memory at offset {offset}")]
    UninitializedRead { offset: u32 },

    /// An instruction received an operand of the wrong shape.
    #[error("type error in {procedure}: {message}")]
    TypeError { procedure: String, message: String },

    /// The procedure or block structure is malformed.
    #[error("malformed IR: {message}")]
    Malformed { message: String },

    /// The configured instruction budget was exhausted.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
}

impl RuntimeError {
    /// The halt message, if this error came from a runtime check.
    pub fn halt_message(&self) -> Option<&str> {
        match self {
            RuntimeError::Halt { message } => Some(message),
            _ => None,
        }
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for parsing, compiling and running a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NqjError {
    /// The source text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseErrors),

    /// Analysis rejected the program.
    #[error(transparent)]
    Compilation(#[from] Diagnostics),

    /// Executing the generated IR failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl NqjError {
    /// Check if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, NqjError::Parse(_))
    }

    /// Check if this is a compilation error.
    pub fn is_compilation(&self) -> bool {
        matches!(self, NqjError::Compilation(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, NqjError::Runtime(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new(
            ParseErrorKind::ExpectedToken,
            Span::new(1, 10, 3),
            "expected ';', found '}'",
        );
        assert_eq!(
            err.to_string(),
            "expected token at 1:10: expected ';', found '}'"
        );
    }

    #[test]
    fn parse_error_with_source_points_at_column() {
        let err = ParseError::expected_identifier(Span::new(2, 5, 3), "'int'");
        let rendered = err.display_with_source("class A {\n    int int;\n}");
        assert!(rendered.contains("  2 |     int int;"));
        assert!(rendered.contains("  |     ^~~"));
    }

    #[test]
    fn compilation_error_display_includes_span() {
        let err = CompilationError::UnknownVariable {
            name: "x".into(),
            span: Span::new(4, 9, 1),
        };
        assert_eq!(err.to_string(), "at 4:9: there is no variable with name x");
    }

    #[test]
    fn cyclic_inheritance_names_whole_cycle() {
        let err = CompilationError::CyclicInheritance {
            class: "A".into(),
            cycle: vec!["A".into(), "B".into(), "C".into()],
            span: Span::new(1, 1, 5),
        };
        assert_eq!(err.to_string(), "at 1:1: cyclic dependency involving: [A, B, C]");
    }

    #[test]
    fn missing_main_is_program_level() {
        assert_eq!(CompilationError::MissingMain.span(), None);
        assert_eq!(
            CompilationError::MissingMain.to_string(),
            "main method must be present"
        );
    }

    #[test]
    fn diagnostics_keep_insertion_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.push(CompilationError::MissingMain);
        diagnostics.push(CompilationError::UnreachableStatement {
            span: Span::new(2, 1, 1),
        });

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics.as_slice(),
            [
                CompilationError::MissingMain,
                CompilationError::UnreachableStatement { .. }
            ]
        ));
        assert_eq!(
            diagnostics.to_string(),
            "main method must be present\nat 2:1: unreachable statement"
        );
    }

    #[test]
    fn unified_error_conversions() {
        let err: NqjError = RuntimeError::Halt {
            message: "Division by zero in line 3".into(),
        }
        .into();
        assert!(err.is_runtime());

        let err: NqjError = Diagnostics::new().into();
        assert!(err.is_compilation());

        let err: NqjError = ParseErrors::from(ParseError::expected_expression(
            Span::default(),
            "';'",
        ))
        .into();
        assert!(err.is_parse());
    }

    #[test]
    fn halt_message_only_for_halts() {
        let halt = RuntimeError::Halt {
            message: "Array Size must be positive".into(),
        };
        assert_eq!(halt.halt_message(), Some("Array Size must be positive"));
        assert_eq!(RuntimeError::StepLimitExceeded { limit: 5 }.halt_message(), None);
    }
}
