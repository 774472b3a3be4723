//! Semantic errors and warnings.
//!
//! A [`TransformError`] aborts the running pass. Warnings are collected by
//! the compilation unit and never stop analysis unless promoted by
//! configuration.

use std::fmt;

use thiserror::Error;
use vsl_ast::{Ast, NodeId, Span};

/// Stable classification of semantic errors. Every kind maps to a
/// diagnostic code and may carry fix-it templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Declarations
    DuplicateDeclaration,
    UndeclaredIdentifier,
    CannotResolveIdentifier,
    FunctionArgMissingType,
    AssignmentTypeRequired,
    AssignmentValueRequired,

    // Type resolution
    NoValidType,
    NoValidOverload,
    AmbiguousExpression,
    AmbiguousCall,
    InvalidFunctionCall,
    PropertyDoesNotExist,
    MethodDoesNotExist,

    // Structure
    SelfIsNotFunction,
    UnexpectedOverride,
    ExpectedOverride,
    CannotCreateImplicitInitializer,

    // Annotations
    BadAnnotationParent,
    AnnotationNoArgs,
    WrongAnnotationArgCount,
    UnknownAnnotationReference,

    // Generics and tuples
    TupleDuplicateLabel,
    GenericSpecializationRequired,

    // Access and inheritance
    InvalidAccess,
    CannotSubclassType,
    CannotMultipleInherit,
    SuperclassShouldBeFirstParam,
    InterfaceCannotInheritClass,

    // Modules
    UndefinedModule,
    DuplicateByImport,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateDeclaration => "E0001",
            ErrorKind::UndeclaredIdentifier => "E0002",
            ErrorKind::CannotResolveIdentifier => "E0003",
            ErrorKind::FunctionArgMissingType => "E0004",
            ErrorKind::AssignmentTypeRequired => "E0005",
            ErrorKind::AssignmentValueRequired => "E0006",
            ErrorKind::NoValidType => "E1001",
            ErrorKind::NoValidOverload => "E1002",
            ErrorKind::AmbiguousExpression => "E1003",
            ErrorKind::AmbiguousCall => "E1004",
            ErrorKind::InvalidFunctionCall => "E1005",
            ErrorKind::PropertyDoesNotExist => "E1006",
            ErrorKind::MethodDoesNotExist => "E1007",
            ErrorKind::SelfIsNotFunction => "E2001",
            ErrorKind::UnexpectedOverride => "E2002",
            ErrorKind::ExpectedOverride => "E2003",
            ErrorKind::CannotCreateImplicitInitializer => "E2004",
            ErrorKind::BadAnnotationParent => "E3001",
            ErrorKind::AnnotationNoArgs => "E3002",
            ErrorKind::WrongAnnotationArgCount => "E3003",
            ErrorKind::UnknownAnnotationReference => "E3004",
            ErrorKind::TupleDuplicateLabel => "E4001",
            ErrorKind::GenericSpecializationRequired => "E4002",
            ErrorKind::InvalidAccess => "E5001",
            ErrorKind::CannotSubclassType => "E5002",
            ErrorKind::CannotMultipleInherit => "E5003",
            ErrorKind::SuperclassShouldBeFirstParam => "E5004",
            ErrorKind::InterfaceCannotInheritClass => "E5005",
            ErrorKind::UndefinedModule => "E6001",
            ErrorKind::DuplicateByImport => "E6002",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateDeclaration => "DUPLICATE_DECLARATION",
            ErrorKind::UndeclaredIdentifier => "UNDECLARED_IDENTIFIER",
            ErrorKind::CannotResolveIdentifier => "CANNOT_RESOLVE_IDENTIFIER",
            ErrorKind::FunctionArgMissingType => "FUNCTION_ARG_MISSING_TYPE",
            ErrorKind::AssignmentTypeRequired => "ASSIGNMENT_TYPE_REQUIRED",
            ErrorKind::AssignmentValueRequired => "ASSIGNMENT_VALUE_REQUIRED",
            ErrorKind::NoValidType => "NO_VALID_TYPE",
            ErrorKind::NoValidOverload => "NO_VALID_OVERLOAD",
            ErrorKind::AmbiguousExpression => "AMBIGUOUS_EXPRESSION",
            ErrorKind::AmbiguousCall => "AMBIGUOUS_CALL",
            ErrorKind::InvalidFunctionCall => "INVALID_FUNCTION_CALL",
            ErrorKind::PropertyDoesNotExist => "PROPERTY_DOES_NOT_EXIST",
            ErrorKind::MethodDoesNotExist => "METHOD_DOES_NOT_EXIST",
            ErrorKind::SelfIsNotFunction => "SELF_IS_NOT_FUNCTION",
            ErrorKind::UnexpectedOverride => "UNEXPECTED_OVERRIDE",
            ErrorKind::ExpectedOverride => "EXPECTED_OVERRIDE",
            ErrorKind::CannotCreateImplicitInitializer => "CANNOT_CREATE_IMPLICIT_INITIALIZER",
            ErrorKind::BadAnnotationParent => "BAD_ANNOTATION_PARENT",
            ErrorKind::AnnotationNoArgs => "ANNOTATION_NO_ARGS",
            ErrorKind::WrongAnnotationArgCount => "WRONG_ANNOTATION_ARG_COUNT",
            ErrorKind::UnknownAnnotationReference => "UNKNOWN_ANNOTATION_REFERENCE",
            ErrorKind::TupleDuplicateLabel => "TUPLE_DUPLICATE_LABEL",
            ErrorKind::GenericSpecializationRequired => "GENERIC_SPECIALIZATION_REQUIRED",
            ErrorKind::InvalidAccess => "INVALID_ACCESS",
            ErrorKind::CannotSubclassType => "CANNOT_SUBCLASS_TYPE",
            ErrorKind::CannotMultipleInherit => "CANNOT_MULTIPLE_INHERIT",
            ErrorKind::SuperclassShouldBeFirstParam => "SUPERCLASS_SHOULD_BE_FIRST_PARAM",
            ErrorKind::InterfaceCannotInheritClass => "INTERFACE_CANNOT_INHERIT_CLASS",
            ErrorKind::UndefinedModule => "UNDEFINED_MODULE",
            ErrorKind::DuplicateByImport => "DUPLICATE_BY_IMPORT",
        }
    }

    /// Fix-its offered for this kind, anchored at `span`.
    pub fn fixits(&self, span: Span) -> Vec<FixIt> {
        match self {
            ErrorKind::UnknownAnnotationReference => vec![
                FixIt::replace("rename the annotation", span, "@<annotation name>")
                    .with_argument("annotation name"),
                FixIt::remove("delete the annotation", span),
            ],
            ErrorKind::BadAnnotationParent => vec![FixIt::remove("remove the annotation", span)],
            ErrorKind::FunctionArgMissingType | ErrorKind::AssignmentTypeRequired => {
                vec![FixIt::insert_after("add a type", span, ": <type>").with_argument("type")]
            }
            ErrorKind::AssignmentValueRequired => {
                vec![FixIt::insert_after("add an initial value", span, " = <value>").with_argument("value")]
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixItEdit {
    Remove,
    Replace(String),
    InsertAfter(String),
}

/// A mechanical correction attached to an error. `argument` names the
/// `<placeholder>` the user has to fill in, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixIt {
    pub description: String,
    pub span: Span,
    pub edit: FixItEdit,
    pub argument: Option<String>,
}

impl FixIt {
    pub fn remove(description: impl Into<String>, span: Span) -> Self {
        Self {
            description: description.into(),
            span,
            edit: FixItEdit::Remove,
            argument: None,
        }
    }

    pub fn replace(description: impl Into<String>, span: Span, text: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            span,
            edit: FixItEdit::Replace(text.into()),
            argument: None,
        }
    }

    pub fn insert_after(description: impl Into<String>, span: Span, text: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            span,
            edit: FixItEdit::InsertAfter(text.into()),
            argument: None,
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }
}

/// A position-tagged semantic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
    pub message: String,
    pub kind: Option<ErrorKind>,
    pub node: Option<NodeId>,
    pub span: Span,
    pub fixits: Vec<FixIt>,
}

impl TransformError {
    pub fn new(message: impl Into<String>, node: Option<NodeId>, span: Span) -> Self {
        Self {
            message: message.into(),
            kind: None,
            node,
            span,
            fixits: Vec::new(),
        }
    }

    /// An error located at `node`.
    pub fn at(ast: &Ast, node: NodeId, message: impl Into<String>) -> Self {
        Self::new(message, Some(node), ast.span(node))
    }

    /// Classifies the error and attaches the kind's fix-its.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self.fixits.extend(kind.fixits(self.span));
        self
    }

    pub fn with_fixit(mut self, fixit: FixIt) -> Self {
        self.fixits.push(fixit);
        self
    }

    /// Fills in a missing span from the error's node. Errors raised inside
    /// the scope graph have a node but no span.
    pub fn located(mut self, ast: &Ast) -> Self {
        if self.span.is_dummy() {
            if let Some(node) = self.node {
                self.span = ast.span(node);
                for fixit in &mut self.fixits {
                    fixit.span = self.span;
                }
            }
        }
        self
    }

    /// Errors that do not originate from user code.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, None, Span::dummy())
    }
}

pub type TypeResult<T> = Result<T, TransformError>;

/// Shorthand for a classified error at `node`.
pub fn emit(ast: &Ast, node: NodeId, message: impl Into<String>, kind: Option<ErrorKind>) -> TransformError {
    let error = TransformError::at(ast, node, message);
    match kind {
        Some(kind) => error.with_kind(kind),
        None => error,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Use of an item carrying `@deprecated`.
    Deprecated,
    /// `protected` is accepted but treated as `local`.
    ProtectedAccess,
}

impl WarningKind {
    pub fn code(&self) -> &'static str {
        match self {
            WarningKind::Deprecated => "W0001",
            WarningKind::ProtectedAccess => "W0002",
        }
    }
}

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub node: Option<NodeId>,
    pub span: Span,
}

impl Warning {
    pub fn at(ast: &Ast, node: NodeId, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            node: Some(node),
            span: ast.span(node),
        }
    }

    /// The fatal form used when warnings are promoted to errors.
    pub fn into_error(self) -> TransformError {
        TransformError::new(
            format!("{} (warning {} treated as an error)", self.message, self.kind.code()),
            self.node,
            self.span,
        )
    }
}

/// Adds `warning` to `warnings` once per node and kind, or fails when
/// warnings are fatal.
pub fn collect_warning(warnings: &mut Vec<Warning>, warnings_as_errors: bool, warning: Warning) -> TypeResult<()> {
    if warnings_as_errors {
        return Err(warning.into_error());
    }
    if warnings.iter().any(|w| w.node == warning.node && w.kind == warning.kind) {
        return Ok(());
    }
    tracing::warn!(code = warning.kind.code(), "{}", warning.message);
    warnings.push(warning);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsl_ast::AstBuilder;

    #[test]
    fn test_kind_codes_are_unique() {
        let kinds = [
            ErrorKind::DuplicateDeclaration,
            ErrorKind::UndeclaredIdentifier,
            ErrorKind::NoValidType,
            ErrorKind::NoValidOverload,
            ErrorKind::AmbiguousExpression,
            ErrorKind::AmbiguousCall,
            ErrorKind::SelfIsNotFunction,
            ErrorKind::BadAnnotationParent,
            ErrorKind::TupleDuplicateLabel,
            ErrorKind::InvalidAccess,
            ErrorKind::UndefinedModule,
        ];
        let mut codes: Vec<_> = kinds.iter().map(ErrorKind::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_with_kind_attaches_fixits() {
        let mut b = AstBuilder::new();
        let annotation = b.annotation("primitve", Some(&["Integer"]));
        let annotation = b.at(annotation, 0..20);
        let ast = b.program([]);

        let error = emit(&ast, annotation, "unknown annotation", Some(ErrorKind::UnknownAnnotationReference));
        assert_eq!(error.kind, Some(ErrorKind::UnknownAnnotationReference));
        assert_eq!(error.fixits.len(), 2);
        assert_eq!(error.fixits[0].argument.as_deref(), Some("annotation name"));
        assert_eq!(error.fixits[1].edit, FixItEdit::Remove);
        assert_eq!(error.span, Span::new(0, 20));
    }

    #[test]
    fn test_warning_collected_once_per_node_and_kind() {
        let mut b = AstBuilder::new();
        let node = b.ident("old");
        let ast = b.program([]);
        let mut warnings = Vec::new();

        let deprecated = Warning::at(&ast, node, WarningKind::Deprecated, "`old` is deprecated");
        collect_warning(&mut warnings, false, deprecated.clone()).unwrap();
        collect_warning(&mut warnings, false, deprecated.clone()).unwrap();
        let protected = Warning::at(&ast, node, WarningKind::ProtectedAccess, "`old` is protected");
        collect_warning(&mut warnings, false, protected).unwrap();
        assert_eq!(warnings.len(), 2);

        let error = collect_warning(&mut warnings, true, deprecated).unwrap_err();
        assert!(error.message.contains("W0001"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_unclassified_error_has_no_fixits() {
        let error = TransformError::internal("unreachable resolver state");
        assert_eq!(error.kind, None);
        assert!(error.fixits.is_empty());
        assert_eq!(error.to_string(), "unreachable resolver state");
    }
}
