//! Node kinds and the node arena.
//!
//! Every node lives in an [`Ast`] and is addressed by a [`NodeId`]. Child
//! slots hold ids, so passes can rewrite a node's kind in place without
//! touching its subtree.

use std::fmt;

use smol_str::SmolStr;

use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Leaf data
// ============================================================================

/// Declared access of a class, function, initializer or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    #[default]
    Local,
    Public,
    Private,
    Protected,
}

impl Access {
    pub fn keyword(&self) -> &'static str {
        match self {
            Access::Local => "local",
            Access::Public => "public",
            Access::Private => "private",
            Access::Protected => "protected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mutability {
    #[default]
    Let,
    Const,
}

/// Literal token families. Classes opt into a family with `@primitive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralKind {
    Integer,
    FloatingPoint,
    String,
    ByteSequence,
    Boolean,
    Regex,
}

impl LiteralKind {
    pub const ALL: [LiteralKind; 6] = [
        LiteralKind::Integer,
        LiteralKind::FloatingPoint,
        LiteralKind::String,
        LiteralKind::ByteSequence,
        LiteralKind::Boolean,
        LiteralKind::Regex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LiteralKind::Integer => "Integer",
            LiteralKind::FloatingPoint => "FloatingPoint",
            LiteralKind::String => "String",
            LiteralKind::ByteSequence => "ByteSequence",
            LiteralKind::Boolean => "Boolean",
            LiteralKind::Regex => "Regex",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        LiteralKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Target of an initializer delegation: `self.init(..)` or `super.init(..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegationHead {
    SelfInit,
    SuperInit,
}

impl DelegationHead {
    pub fn keyword(&self) -> &'static str {
        match self {
            DelegationHead::SelfInit => "self",
            DelegationHead::SuperInit => "super",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortCircuitOp {
    And,
    Or,
}

impl ShortCircuitOp {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "&&" => Some(ShortCircuitOp::And),
            "||" => Some(ShortCircuitOp::Or),
            _ => None,
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            ShortCircuitOp::And => "&&",
            ShortCircuitOp::Or => "||",
        }
    }
}

/// A possibly labelled call or subscript argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgument {
    pub label: Option<SmolStr>,
    pub value: NodeId,
}

/// A labelled element of a tuple literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleElement {
    pub label: SmolStr,
    pub value: NodeId,
}

/// A named slot of a tuple type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleTypeParam {
    pub name: SmolStr,
    pub ty: NodeId,
}

// ============================================================================
// Node kinds
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    // Statements
    CodeBlock {
        statements: Vec<NodeId>,
    },
    /// Class or interface declaration. `heritage` lists the superclass and
    /// conformed interfaces as type expressions, in source order.
    ClassStatement {
        name: SmolStr,
        access: Access,
        is_interface: bool,
        generics: Vec<NodeId>,
        heritage: Vec<NodeId>,
        annotations: Vec<NodeId>,
        body: NodeId,
    },
    FunctionStatement {
        name: SmolStr,
        access: Access,
        is_static: bool,
        is_override: bool,
        args: Vec<NodeId>,
        return_type: Option<NodeId>,
        annotations: Vec<NodeId>,
        body: Option<NodeId>,
    },
    FunctionArgument {
        external_name: Option<SmolStr>,
        name: SmolStr,
        ty: Option<NodeId>,
        default_value: Option<NodeId>,
    },
    InitializerStatement {
        access: Access,
        args: Vec<NodeId>,
        annotations: Vec<NodeId>,
        body: Option<NodeId>,
    },
    InitDelegationCall {
        head: DelegationHead,
        args: Vec<CallArgument>,
    },
    TypeAliasStatement {
        name: SmolStr,
        access: Access,
        target: NodeId,
    },
    /// `let` / `const` declaration. Inside a class body this declares a field.
    AssignmentStatement {
        mutability: Mutability,
        access: Access,
        is_static: bool,
        name: SmolStr,
        ty: Option<NodeId>,
        value: Option<NodeId>,
        annotations: Vec<NodeId>,
    },
    IfStatement {
        condition: NodeId,
        body: NodeId,
        else_body: Option<NodeId>,
    },
    WhileStatement {
        condition: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        condition: NodeId,
    },
    ReturnStatement {
        value: Option<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    /// `@name` or `@name(args)`.
    Annotation {
        name: SmolStr,
        args: Option<Vec<SmolStr>>,
    },
    GenericParameter {
        name: SmolStr,
    },

    // Expressions
    Identifier {
        name: SmolStr,
    },
    Literal {
        kind: LiteralKind,
        value: SmolStr,
    },
    SelfRef,
    BinaryExpression {
        op: SmolStr,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryExpression {
        op: SmolStr,
        operand: NodeId,
    },
    FunctionCall {
        head: NodeId,
        args: Vec<CallArgument>,
    },
    Subscript {
        head: NodeId,
        args: Vec<CallArgument>,
    },
    PropertyExpression {
        head: NodeId,
        property: SmolStr,
    },
    /// `value :: Target` when `checked`, otherwise a bitcast.
    CastExpression {
        value: NodeId,
        target: NodeId,
        checked: bool,
    },
    Ternary {
        condition: NodeId,
        if_true: NodeId,
        if_false: NodeId,
    },
    Tuple {
        elements: Vec<TupleElement>,
    },
    /// Generic application in expression position: `Box<Int>`.
    Generic {
        head: NodeId,
        arguments: Vec<NodeId>,
    },
    AssignmentExpression {
        target: NodeId,
        value: NodeId,
    },
    ShortCircuit {
        op: ShortCircuitOp,
        lhs: NodeId,
        rhs: NodeId,
    },

    // Type expressions
    TypeName {
        name: SmolStr,
    },
    GenericType {
        base: NodeId,
        arguments: Vec<NodeId>,
    },
    TupleType {
        params: Vec<TupleTypeParam>,
    },
}

impl NodeKind {
    /// Kind name used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::CodeBlock { .. } => "CodeBlock",
            NodeKind::ClassStatement { .. } => "ClassStatement",
            NodeKind::FunctionStatement { .. } => "FunctionStatement",
            NodeKind::FunctionArgument { .. } => "FunctionArgument",
            NodeKind::InitializerStatement { .. } => "InitializerStatement",
            NodeKind::InitDelegationCall { .. } => "InitDelegationCall",
            NodeKind::TypeAliasStatement { .. } => "TypeAliasStatement",
            NodeKind::AssignmentStatement { .. } => "AssignmentStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::GenericParameter { .. } => "GenericParameter",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::SelfRef => "SelfRef",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::PropertyExpression { .. } => "PropertyExpression",
            NodeKind::CastExpression { .. } => "CastExpression",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::Generic { .. } => "Generic",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::ShortCircuit { .. } => "ShortCircuit",
            NodeKind::TypeName { .. } => "TypeName",
            NodeKind::GenericType { .. } => "GenericType",
            NodeKind::TupleType { .. } => "TupleType",
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Identifier { .. }
                | NodeKind::Literal { .. }
                | NodeKind::SelfRef
                | NodeKind::BinaryExpression { .. }
                | NodeKind::UnaryExpression { .. }
                | NodeKind::FunctionCall { .. }
                | NodeKind::Subscript { .. }
                | NodeKind::PropertyExpression { .. }
                | NodeKind::CastExpression { .. }
                | NodeKind::Ternary { .. }
                | NodeKind::Tuple { .. }
                | NodeKind::Generic { .. }
                | NodeKind::AssignmentExpression { .. }
                | NodeKind::ShortCircuit { .. }
        )
    }

    pub fn is_type_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeName { .. } | NodeKind::GenericType { .. } | NodeKind::TupleType { .. }
        )
    }

    /// Annotation nodes attached to a declaration.
    pub fn annotations(&self) -> &[NodeId] {
        match self {
            NodeKind::ClassStatement { annotations, .. }
            | NodeKind::FunctionStatement { annotations, .. }
            | NodeKind::InitializerStatement { annotations, .. }
            | NodeKind::AssignmentStatement { annotations, .. } => annotations,
            _ => &[],
        }
    }

    /// Child slots in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::CodeBlock { statements } => out.extend(statements),
            NodeKind::ClassStatement {
                generics,
                heritage,
                annotations,
                body,
                ..
            } => {
                out.extend(annotations);
                out.extend(generics);
                out.extend(heritage);
                out.push(*body);
            }
            NodeKind::FunctionStatement {
                args,
                return_type,
                annotations,
                body,
                ..
            } => {
                out.extend(annotations);
                out.extend(args);
                out.extend(return_type);
                out.extend(body);
            }
            NodeKind::FunctionArgument { ty, default_value, .. } => {
                out.extend(ty);
                out.extend(default_value);
            }
            NodeKind::InitializerStatement {
                args,
                annotations,
                body,
                ..
            } => {
                out.extend(annotations);
                out.extend(args);
                out.extend(body);
            }
            NodeKind::InitDelegationCall { args, .. } => out.extend(args.iter().map(|arg| arg.value)),
            NodeKind::TypeAliasStatement { target, .. } => out.push(*target),
            NodeKind::AssignmentStatement {
                ty,
                value,
                annotations,
                ..
            } => {
                out.extend(annotations);
                out.extend(ty);
                out.extend(value);
            }
            NodeKind::IfStatement {
                condition,
                body,
                else_body,
            } => {
                out.push(*condition);
                out.push(*body);
                out.extend(else_body);
            }
            NodeKind::WhileStatement { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            NodeKind::DoWhileStatement { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            NodeKind::ReturnStatement { value } => out.extend(value),
            NodeKind::ExpressionStatement { expression } => out.push(*expression),
            NodeKind::Annotation { .. }
            | NodeKind::GenericParameter { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::SelfRef
            | NodeKind::TypeName { .. } => {}
            NodeKind::BinaryExpression { lhs, rhs, .. } | NodeKind::ShortCircuit { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            NodeKind::UnaryExpression { operand, .. } => out.push(*operand),
            NodeKind::FunctionCall { head, args } | NodeKind::Subscript { head, args } => {
                out.push(*head);
                out.extend(args.iter().map(|arg| arg.value));
            }
            NodeKind::PropertyExpression { head, .. } => out.push(*head),
            NodeKind::CastExpression { value, target, .. } => {
                out.push(*value);
                out.push(*target);
            }
            NodeKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                out.push(*condition);
                out.push(*if_true);
                out.push(*if_false);
            }
            NodeKind::Tuple { elements } => out.extend(elements.iter().map(|element| element.value)),
            NodeKind::Generic { head, arguments } => {
                out.push(*head);
                out.extend(arguments);
            }
            NodeKind::AssignmentExpression { target, value } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::GenericType { base, arguments } => {
                out.push(*base);
                out.extend(arguments);
            }
            NodeKind::TupleType { params } => out.extend(params.iter().map(|param| param.ty)),
        }
        out
    }
}

// ============================================================================
// Arena
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// Arena owning every node of one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    /// The top-level code block, once the tree has been finished.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Sets the root block and links every reachable node to its parent.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
        self.nodes[root.index()].parent = None;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in self.nodes[id.index()].kind.children() {
                self.nodes[child.index()].parent = Some(id);
                stack.push(child);
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    /// Replaces a node's kind, relinking the children of the new kind.
    pub fn replace_kind(&mut self, id: NodeId, kind: NodeKind) -> NodeKind {
        let children = kind.children();
        let old = std::mem::replace(&mut self.nodes[id.index()].kind, kind);
        for child in children {
            self.nodes[child.index()].parent = Some(id);
        }
        old
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.index()].span = span;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            next: self.parent(id),
        }
    }

    /// Strict descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identifier-like name of a node, if it has one.
    pub fn name_of(&self, id: NodeId) -> Option<&SmolStr> {
        match self.kind(id) {
            NodeKind::ClassStatement { name, .. }
            | NodeKind::FunctionStatement { name, .. }
            | NodeKind::FunctionArgument { name, .. }
            | NodeKind::TypeAliasStatement { name, .. }
            | NodeKind::AssignmentStatement { name, .. }
            | NodeKind::Annotation { name, .. }
            | NodeKind::GenericParameter { name }
            | NodeKind::Identifier { name }
            | NodeKind::TypeName { name } => Some(name),
            _ => None,
        }
    }
}

pub struct Ancestors<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.parent(current);
        Some(current)
    }
}
