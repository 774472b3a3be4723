//! Programmatic AST construction.
//!
//! The parser is an external component; this builder is how embedders and
//! tests produce trees. Nodes get a dummy span unless one is attached with
//! [`AstBuilder::at`].

use smol_str::SmolStr;

use crate::node::{
    Access, Ast, CallArgument, DelegationHead, LiteralKind, Mutability, NodeId, NodeKind,
    TupleElement, TupleTypeParam,
};
use crate::Span;

/// Parts of a class or interface declaration.
#[derive(Debug, Clone, Default)]
pub struct ClassDecl {
    pub name: SmolStr,
    pub access: Access,
    pub is_interface: bool,
    pub generics: Vec<SmolStr>,
    pub heritage: Vec<NodeId>,
    pub annotations: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

impl ClassDecl {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn interface(name: impl Into<SmolStr>) -> Self {
        Self {
            is_interface: true,
            ..Self::new(name)
        }
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn generic(mut self, name: impl Into<SmolStr>) -> Self {
        self.generics.push(name.into());
        self
    }

    pub fn inherits(mut self, ty: NodeId) -> Self {
        self.heritage.push(ty);
        self
    }

    pub fn annotated(mut self, annotation: NodeId) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn member(mut self, member: NodeId) -> Self {
        self.members.push(member);
        self
    }

    pub fn members(mut self, members: impl IntoIterator<Item = NodeId>) -> Self {
        self.members.extend(members);
        self
    }
}

/// Parts of a function or method declaration. A `None` body declares an
/// interface requirement.
#[derive(Debug, Clone, Default)]
pub struct FunctionDecl {
    pub name: SmolStr,
    pub access: Access,
    pub is_static: bool,
    pub is_override: bool,
    pub args: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub annotations: Vec<NodeId>,
    pub body: Option<Vec<NodeId>>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            body: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn override_(mut self) -> Self {
        self.is_override = true;
        self
    }

    pub fn arg(mut self, arg: NodeId) -> Self {
        self.args.push(arg);
        self
    }

    pub fn returns(mut self, ty: NodeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn annotated(mut self, annotation: NodeId) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn body(mut self, statements: impl IntoIterator<Item = NodeId>) -> Self {
        self.body = Some(statements.into_iter().collect());
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct InitDecl {
    pub access: Access,
    pub args: Vec<NodeId>,
    pub annotations: Vec<NodeId>,
    pub body: Option<Vec<NodeId>>,
}

impl InitDecl {
    pub fn new() -> Self {
        Self {
            body: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn arg(mut self, arg: NodeId) -> Self {
        self.args.push(arg);
        self
    }

    pub fn annotated(mut self, annotation: NodeId) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn body(mut self, statements: impl IntoIterator<Item = NodeId>) -> Self {
        self.body = Some(statements.into_iter().collect());
        self
    }

    /// A native initializer without a code block.
    pub fn native(mut self) -> Self {
        self.body = None;
        self
    }
}

/// Builds an [`Ast`] bottom-up.
#[derive(Debug, Default)]
pub struct AstBuilder {
    ast: Ast,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, kind: NodeKind) -> NodeId {
        self.ast.alloc(kind, Span::dummy())
    }

    /// Attaches a source span to an already built node.
    pub fn at(&mut self, node: NodeId, span: impl Into<Span>) -> NodeId {
        self.ast.set_span(node, span.into());
        node
    }

    /// Finishes the tree with `root` as the top-level block.
    pub fn finish(mut self, root: NodeId) -> Ast {
        self.ast.set_root(root);
        self.ast
    }

    /// Wraps `statements` in a top-level block and finishes the tree.
    pub fn program(mut self, statements: impl IntoIterator<Item = NodeId>) -> Ast {
        let root = self.block(statements);
        self.finish(root)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn ident(&mut self, name: impl Into<SmolStr>) -> NodeId {
        self.node(NodeKind::Identifier { name: name.into() })
    }

    pub fn literal(&mut self, kind: LiteralKind, value: impl Into<SmolStr>) -> NodeId {
        self.node(NodeKind::Literal {
            kind,
            value: value.into(),
        })
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.literal(LiteralKind::Integer, value.to_string())
    }

    pub fn float(&mut self, value: impl Into<SmolStr>) -> NodeId {
        self.literal(LiteralKind::FloatingPoint, value)
    }

    pub fn string(&mut self, value: impl Into<SmolStr>) -> NodeId {
        self.literal(LiteralKind::String, value)
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.literal(LiteralKind::Boolean, if value { "true" } else { "false" })
    }

    pub fn self_ref(&mut self) -> NodeId {
        self.node(NodeKind::SelfRef)
    }

    pub fn binary(&mut self, op: impl Into<SmolStr>, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.node(NodeKind::BinaryExpression {
            op: op.into(),
            lhs,
            rhs,
        })
    }

    pub fn unary(&mut self, op: impl Into<SmolStr>, operand: NodeId) -> NodeId {
        self.node(NodeKind::UnaryExpression {
            op: op.into(),
            operand,
        })
    }

    pub fn call(&mut self, head: NodeId, args: impl IntoIterator<Item = NodeId>) -> NodeId {
        let args = args
            .into_iter()
            .map(|value| CallArgument { label: None, value })
            .collect();
        self.node(NodeKind::FunctionCall { head, args })
    }

    pub fn labeled_call<L: Into<SmolStr>>(
        &mut self,
        head: NodeId,
        args: impl IntoIterator<Item = (Option<L>, NodeId)>,
    ) -> NodeId {
        let args = args
            .into_iter()
            .map(|(label, value)| CallArgument {
                label: label.map(Into::into),
                value,
            })
            .collect();
        self.node(NodeKind::FunctionCall { head, args })
    }

    pub fn subscript(&mut self, head: NodeId, args: impl IntoIterator<Item = NodeId>) -> NodeId {
        let args = args
            .into_iter()
            .map(|value| CallArgument { label: None, value })
            .collect();
        self.node(NodeKind::Subscript { head, args })
    }

    pub fn property(&mut self, head: NodeId, property: impl Into<SmolStr>) -> NodeId {
        self.node(NodeKind::PropertyExpression {
            head,
            property: property.into(),
        })
    }

    /// Unchecked reinterpretation of `value` as `target`.
    pub fn bitcast(&mut self, value: NodeId, target: NodeId) -> NodeId {
        self.node(NodeKind::CastExpression {
            value,
            target,
            checked: false,
        })
    }

    pub fn ternary(&mut self, condition: NodeId, if_true: NodeId, if_false: NodeId) -> NodeId {
        self.node(NodeKind::Ternary {
            condition,
            if_true,
            if_false,
        })
    }

    pub fn tuple<L: Into<SmolStr>>(&mut self, elements: impl IntoIterator<Item = (L, NodeId)>) -> NodeId {
        let elements = elements
            .into_iter()
            .map(|(label, value)| TupleElement {
                label: label.into(),
                value,
            })
            .collect();
        self.node(NodeKind::Tuple { elements })
    }

    pub fn generic(&mut self, head: NodeId, arguments: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.node(NodeKind::Generic {
            head,
            arguments: arguments.into_iter().collect(),
        })
    }

    // ========================================================================
    // Type expressions
    // ========================================================================

    pub fn type_name(&mut self, name: impl Into<SmolStr>) -> NodeId {
        self.node(NodeKind::TypeName { name: name.into() })
    }

    pub fn generic_type(
        &mut self,
        base: impl Into<SmolStr>,
        arguments: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let base = self.type_name(base);
        self.node(NodeKind::GenericType {
            base,
            arguments: arguments.into_iter().collect(),
        })
    }

    pub fn tuple_type<N: Into<SmolStr>>(&mut self, params: impl IntoIterator<Item = (N, NodeId)>) -> NodeId {
        let params = params
            .into_iter()
            .map(|(name, ty)| TupleTypeParam { name: name.into(), ty })
            .collect();
        self.node(NodeKind::TupleType { params })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn block(&mut self, statements: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.node(NodeKind::CodeBlock {
            statements: statements.into_iter().collect(),
        })
    }

    pub fn expr_stmt(&mut self, expression: NodeId) -> NodeId {
        self.node(NodeKind::ExpressionStatement { expression })
    }

    pub fn let_(&mut self, name: impl Into<SmolStr>, ty: Option<NodeId>, value: Option<NodeId>) -> NodeId {
        self.assignment(Mutability::Let, name, ty, value)
    }

    pub fn const_(&mut self, name: impl Into<SmolStr>, ty: Option<NodeId>, value: Option<NodeId>) -> NodeId {
        self.assignment(Mutability::Const, name, ty, value)
    }

    fn assignment(
        &mut self,
        mutability: Mutability,
        name: impl Into<SmolStr>,
        ty: Option<NodeId>,
        value: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::AssignmentStatement {
            mutability,
            access: Access::Local,
            is_static: false,
            name: name.into(),
            ty,
            value,
            annotations: Vec::new(),
        })
    }

    /// A static `let` field of a class.
    pub fn static_let(&mut self, name: impl Into<SmolStr>, ty: NodeId, value: Option<NodeId>) -> NodeId {
        self.node(NodeKind::AssignmentStatement {
            mutability: Mutability::Let,
            access: Access::Local,
            is_static: true,
            name: name.into(),
            ty: Some(ty),
            value,
            annotations: Vec::new(),
        })
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let expression = self.binary("=", target, value);
        self.expr_stmt(expression)
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.node(NodeKind::ReturnStatement { value })
    }

    pub fn if_(
        &mut self,
        condition: NodeId,
        body: impl IntoIterator<Item = NodeId>,
        else_body: Option<Vec<NodeId>>,
    ) -> NodeId {
        let body = self.block(body);
        let else_body = else_body.map(|statements| self.block(statements));
        self.node(NodeKind::IfStatement {
            condition,
            body,
            else_body,
        })
    }

    pub fn while_(&mut self, condition: NodeId, body: impl IntoIterator<Item = NodeId>) -> NodeId {
        let body = self.block(body);
        self.node(NodeKind::WhileStatement { condition, body })
    }

    pub fn do_while(&mut self, body: impl IntoIterator<Item = NodeId>, condition: NodeId) -> NodeId {
        let body = self.block(body);
        self.node(NodeKind::DoWhileStatement { body, condition })
    }

    pub fn annotation(&mut self, name: impl Into<SmolStr>, args: Option<&[&str]>) -> NodeId {
        self.node(NodeKind::Annotation {
            name: name.into(),
            args: args.map(|args| args.iter().map(|arg| SmolStr::new(arg)).collect()),
        })
    }

    pub fn type_alias(&mut self, name: impl Into<SmolStr>, target: NodeId) -> NodeId {
        self.node(NodeKind::TypeAliasStatement {
            name: name.into(),
            access: Access::Local,
            target,
        })
    }

    /// Argument `name: ty`.
    pub fn argument(&mut self, name: impl Into<SmolStr>, ty: NodeId) -> NodeId {
        self.node(NodeKind::FunctionArgument {
            external_name: None,
            name: name.into(),
            ty: Some(ty),
            default_value: None,
        })
    }

    pub fn argument_with(
        &mut self,
        external_name: Option<&str>,
        name: impl Into<SmolStr>,
        ty: Option<NodeId>,
        default_value: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::FunctionArgument {
            external_name: external_name.map(SmolStr::new),
            name: name.into(),
            ty,
            default_value,
        })
    }

    pub fn class(&mut self, decl: ClassDecl) -> NodeId {
        let generics = decl
            .generics
            .into_iter()
            .map(|name| self.node(NodeKind::GenericParameter { name }))
            .collect();
        let body = self.block(decl.members);
        self.node(NodeKind::ClassStatement {
            name: decl.name,
            access: decl.access,
            is_interface: decl.is_interface,
            generics,
            heritage: decl.heritage,
            annotations: decl.annotations,
            body,
        })
    }

    pub fn function(&mut self, decl: FunctionDecl) -> NodeId {
        let body = decl.body.map(|statements| self.block(statements));
        self.node(NodeKind::FunctionStatement {
            name: decl.name,
            access: decl.access,
            is_static: decl.is_static,
            is_override: decl.is_override,
            args: decl.args,
            return_type: decl.return_type,
            annotations: decl.annotations,
            body,
        })
    }

    pub fn initializer(&mut self, decl: InitDecl) -> NodeId {
        let body = decl.body.map(|statements| self.block(statements));
        self.node(NodeKind::InitializerStatement {
            access: decl.access,
            args: decl.args,
            annotations: decl.annotations,
            body,
        })
    }

    pub fn delegate(&mut self, head: DelegationHead, args: impl IntoIterator<Item = NodeId>) -> NodeId {
        let args = args
            .into_iter()
            .map(|value| CallArgument { label: None, value })
            .collect();
        self.node(NodeKind::InitDelegationCall { head, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_builder_links_members() {
        let mut b = AstBuilder::new();
        let ty = b.type_name("Int");
        let field = b.let_("value", Some(ty), None);
        let class = b.class(ClassDecl::new("Box").generic("T").member(field));
        let ast = b.program([class]);

        let NodeKind::ClassStatement { generics, body, .. } = ast.kind(class) else {
            panic!("expected class");
        };
        assert_eq!(generics.len(), 1);
        assert_eq!(ast.parent(field), Some(*body));
        assert_eq!(ast.parent(*body), Some(class));
        assert_eq!(ast.parent(class), ast.root());
    }

    #[test]
    fn test_spans_attach() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let one = b.at(one, 8..9);
        let stmt = b.expr_stmt(one);
        let ast = b.program([stmt]);
        assert_eq!(ast.span(one), Span::new(8, 9));
        assert!(ast.span(stmt).is_dummy());
    }

    #[test]
    fn test_function_without_body() {
        let mut b = AstBuilder::new();
        let func = b.function(FunctionDecl::new("describe").without_body());
        let ast = b.program([func]);
        assert!(matches!(ast.kind(func), NodeKind::FunctionStatement { body: None, .. }));
    }
}
