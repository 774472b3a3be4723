//! VSL Semantic Core
//!
//! Scope graph, type resolution and the semantic passes of the VSL compiler.
//!
//! ## Scope graph
//!
//! Every code block owns a [`Scope`]. Declarations become [`ScopeItem`]s
//! stored in an arena inside the [`ScopeGraph`] and addressed by
//! [`ItemId`]. Classes and type aliases are declared *indefinite*: their
//! heritage or target is resolved on first use, or when every declaration of
//! the unit is known, whichever comes first. Resolution runs at most once.
//!
//! ## Constraint negotiation
//!
//! Expressions are typed by negotiation rather than by a single inference
//! pass. A resolver receives [`Constraints`] (the requested type, whether to
//! collapse to a preferred type, whether an empty answer is an error, ...)
//! and returns every [`TypeCandidate`] the expression could have. Parents
//! speculate over their children's candidates, pick a combination, then
//! resolve each child again with its final type. Annotations are written
//! only by that final resolution.
//!
//! ```text
//! let x = 1 + 2.0
//!
//! 1    -> [Int (preferred), Float]
//! 2.0  -> [Float (preferred)]
//! +    -> Int.+(Int, Int) rejects 2.0, Float.+(Float, Float) fits
//! x    -> Float
//! ```
//!
//! ## Pipelines
//!
//! A [`CompilationUnit`] runs three pipelines of tree passes:
//!
//! - **preprocessor**: desugaring, structural checks, class and alias
//!   declaration
//! - **registration**: functions, initializers and fields
//! - **deduction**: statement types, returns, initializer delegation and
//!   override checks

pub mod annotations;
pub mod config;
pub mod constraint;
pub mod context;
pub mod error;
mod error_diagnostic;
pub mod graph;
pub mod item;
pub mod resolver;
pub mod scope;
pub mod transform;
pub mod type_lookup;
pub mod unit;

pub use annotations::{Annotations, NodeAnnotation};
pub use config::{OverloadEquality, SemaConfig};
pub use constraint::{Constraints, TypeCandidate};
pub use context::{PrimitiveFamily, TransformationContext, TypeContext};
pub use error::{emit, ErrorKind, FixIt, FixItEdit, TransformError, TypeResult, Warning, WarningKind};
pub use graph::{ResolveItem, ScopeGraph, VOID};
pub use item::{
    AliasItem, AliasKind, FuncArgument, FuncItem, ItemId, ItemKind, ItemQuery, ItemVariant, PendingResolution,
    ScopeForm, ScopeItem, TupleItem, TypeAliasItem, TypeItem,
};
pub use resolver::ResolveCx;
pub use scope::{Scope, ScopeId};
pub use transform::{AstTool, Transformation, Transformer};
pub use type_lookup::TypeLookup;
pub use unit::CompilationUnit;
