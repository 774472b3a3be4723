//! VSL Abstract Syntax Tree
//!
//! Arena-allocated syntax tree consumed by the semantic core. The tree is
//! mutable: desugaring passes rewrite node kinds in place, and semantic
//! results are stored next to it rather than inside it.

pub mod builder;
pub mod node;
mod span;

pub use builder::{AstBuilder, ClassDecl, FunctionDecl, InitDecl};
pub use node::{
    Access, Ancestors, Ast, CallArgument, DelegationHead, LiteralKind, Mutability, Node, NodeId,
    NodeKind, ShortCircuitOp, TupleElement, TupleTypeParam,
};
pub use smol_str::SmolStr;
pub use span::Span;
