//! Structural checks that need no type information, plus the override and
//! constant checks that run once types are known.

use vsl_ast::{Access, Ast, LiteralKind, NodeId, NodeKind};

use super::{is_operator_name, AstTool, Transformation};
use crate::error::{ErrorKind, TypeResult, Warning, WarningKind};
use crate::item::{AliasKind, ItemKind};

/// The class declaring `node` directly in its body.
pub(super) fn member_of(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let block = ast.parent(node)?;
    let class = ast.parent(block)?;
    matches!(ast.kind(class), NodeKind::ClassStatement { .. }).then_some(class)
}

/// Assignment targets must denote storage.
pub struct VerifyLValue;

impl Transformation for VerifyLValue {
    fn name(&self) -> &'static str {
        "VerifyLValue"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::AssignmentExpression { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::AssignmentExpression { target, .. } = tool.ast.kind(node) else {
            return Ok(());
        };
        match tool.ast.kind(*target) {
            NodeKind::Identifier { .. } | NodeKind::PropertyExpression { .. } | NodeKind::Subscript { .. } => Ok(()),
            other => Err(tool.error(*target, format!("Cannot assign to {}", other.name()), None)),
        }
    }
}

/// Marks top-level declarations as globals.
pub struct TransformGlobalAssignment;

impl Transformation for TransformGlobalAssignment {
    fn name(&self) -> &'static str {
        "TransformGlobalAssignment"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::AssignmentStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        if tool.ast.parent(node).is_some() && tool.ast.parent(node) == tool.ast.root() {
            tool.annotations.set_global(node);
        }
        Ok(())
    }
}

pub struct VerifyFunctionAccessScope;

impl Transformation for VerifyFunctionAccessScope {
    fn name(&self) -> &'static str {
        "VerifyFunctionAccessScope"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::FunctionStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::FunctionStatement { name, access, .. } = tool.ast.kind(node) else {
            return Ok(());
        };
        match access {
            Access::Protected => {
                let message = format!("`protected` on `{name}` is treated as `local`");
                let warning = Warning::at(&*tool.ast, node, WarningKind::ProtectedAccess, message);
                tool.warn(warning)
            }
            Access::Private if member_of(tool.ast, node).is_none() => Err(tool.error(
                node,
                format!("`{name}` cannot be private outside of a class"),
                Some(ErrorKind::InvalidAccess),
            )),
            _ => Ok(()),
        }
    }
}

/// Checks annotation names, argument counts and where they are attached.
pub struct VerifyAnnotationSignature;

impl Transformation for VerifyAnnotationSignature {
    fn name(&self) -> &'static str {
        "VerifyAnnotationSignature"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::Annotation { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let ast = &*tool.ast;
        let NodeKind::Annotation { name, args } = ast.kind(node) else {
            return Ok(());
        };
        let parent = ast.parent(node).map(|parent| ast.kind(parent));
        let on_class = matches!(parent, Some(NodeKind::ClassStatement { .. }));
        let on_callable = matches!(
            parent,
            Some(NodeKind::FunctionStatement { .. } | NodeKind::InitializerStatement { .. })
        );

        let (arity, allowed_parent, parents) = match name.as_str() {
            "primitive" => (1..=2, on_class, "classes"),
            "mock" => (1..=1, on_class, "classes"),
            "deprecated" => (0..=1, on_class || on_callable, "classes, functions and initializers"),
            _ => {
                return Err(tool.error(
                    node,
                    format!("Unknown annotation `@{name}`"),
                    Some(ErrorKind::UnknownAnnotationReference),
                ));
            }
        };

        let count = args.as_ref().map_or(0, |args| args.len());
        if args.is_none() && *arity.start() > 0 {
            return Err(tool.error(
                node,
                format!("`@{name}` requires arguments"),
                Some(ErrorKind::AnnotationNoArgs),
            ));
        }
        if !arity.contains(&count) {
            return Err(tool.error(
                node,
                format!(
                    "`@{name}` takes {} to {} argument(s) but {count} were given",
                    arity.start(),
                    arity.end()
                ),
                Some(ErrorKind::WrongAnnotationArgCount),
            ));
        }
        if !allowed_parent {
            return Err(tool.error(
                node,
                format!("`@{name}` can only be applied to {parents}"),
                Some(ErrorKind::BadAnnotationParent),
            ));
        }

        if name == "primitive" {
            let args = args.as_deref().unwrap_or_default();
            if let Some(kind) = args.first().filter(|kind| LiteralKind::from_name(kind).is_none()) {
                return Err(tool.error(node, format!("`{kind}` is not a literal kind"), None));
            }
            if let Some(flag) = args.get(1).filter(|flag| flag.as_str() != "default") {
                return Err(tool.error(
                    node,
                    format!("Expected `default` as the second argument of `@primitive`, found `{flag}`"),
                    None,
                ));
            }
        }
        Ok(())
    }
}

/// An initializer delegates at most once, as a statement of its own body.
pub struct VerifyInitializerFormat;

impl Transformation for VerifyInitializerFormat {
    fn name(&self) -> &'static str {
        "VerifyInitializerFormat"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::InitializerStatement { body: Some(_), .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let ast = &*tool.ast;
        let NodeKind::InitializerStatement { body: Some(body), .. } = ast.kind(node) else {
            return Ok(());
        };
        let delegations: Vec<NodeId> = ast
            .descendants(*body)
            .into_iter()
            .filter(|&child| matches!(ast.kind(child), NodeKind::InitDelegationCall { .. }))
            .collect();
        if let Some(&second) = delegations.get(1) {
            return Err(tool.error(second, "An initializer can delegate only once", None));
        }
        if let Some(&delegation) = delegations.first() {
            if ast.parent(delegation) != Some(*body) {
                return Err(tool.error(
                    delegation,
                    "Initializer delegation must be a statement of the initializer body",
                    None,
                ));
            }
        }
        Ok(())
    }
}

/// Operator functions are static class members taking one or two operands.
pub struct VerifyOperatorOverload;

impl Transformation for VerifyOperatorOverload {
    fn name(&self) -> &'static str {
        "VerifyOperatorOverload"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::FunctionStatement { name, .. } if is_operator_name(name))
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::FunctionStatement {
            name, is_static, args, ..
        } = tool.ast.kind(node)
        else {
            return Ok(());
        };
        if member_of(tool.ast, node).is_none() {
            return Err(tool.error(node, format!("Operator `{name}` must be declared in a class"), None));
        }
        if !is_static {
            return Err(tool.error(node, format!("Operator `{name}` must be static"), None));
        }
        if !(1..=2).contains(&args.len()) {
            return Err(tool.error(
                node,
                format!("Operator `{name}` takes one or two operands, not {}", args.len()),
                None,
            ));
        }
        Ok(())
    }
}

/// A method that shadows a superclass method must say `override`, and
/// `override` must shadow something.
pub struct VerifyOverride;

impl Transformation for VerifyOverride {
    fn name(&self) -> &'static str {
        "VerifyOverride"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::FunctionStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::FunctionStatement {
            name,
            is_static,
            is_override,
            args,
            ..
        } = tool.ast.kind(node)
        else {
            return Ok(());
        };
        let Some((_, class)) = tool.enclosing_class() else {
            if *is_override {
                return Err(tool.error(
                    node,
                    format!("`{name}` is not a method and cannot override"),
                    Some(ErrorKind::UnexpectedOverride),
                ));
            }
            return Ok(());
        };

        let graph = &*tool.graph;
        let overridden = class.superclass.into_iter().flat_map(|sup| graph.class_chain(sup)).any(|ancestor| {
            let Some(ty) = graph.item(ancestor).as_type() else {
                return false;
            };
            let scope = if *is_static { ty.static_scope } else { ty.subscope };
            graph.get_all(scope, name).iter().any(|&id| {
                graph
                    .item(id)
                    .as_func()
                    .is_some_and(|func| !func.is_initializer() && func.args.len() == args.len())
            })
        });

        match (overridden, *is_override) {
            (true, false) => Err(tool.error(
                node,
                format!("`{name}` overrides a superclass method and must be marked `override`"),
                Some(ErrorKind::ExpectedOverride),
            )),
            (false, true) => Err(tool.error(
                node,
                format!("`{name}` is marked `override` but overrides nothing"),
                Some(ErrorKind::UnexpectedOverride),
            )),
            _ => Ok(()),
        }
    }
}

/// Constants are only assigned at declaration, except fields, which an
/// initializer may set.
pub struct VerifyLValueBinding;

impl Transformation for VerifyLValueBinding {
    fn name(&self) -> &'static str {
        "VerifyLValueBinding"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::AssignmentExpression { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::AssignmentExpression { target, .. } = tool.ast.kind(node) else {
            return Ok(());
        };
        let Some(reference) = tool.annotations.reference(*target) else {
            return Ok(());
        };
        let item = tool.graph.item(reference);
        let ItemKind::Alias(alias) = &item.kind else {
            return Ok(());
        };
        if !alias.is_constant {
            return Ok(());
        }
        let in_initializer = tool
            .declaration_node
            .is_some_and(|decl| matches!(tool.ast.kind(decl), NodeKind::InitializerStatement { .. }));
        if alias.kind == AliasKind::Field && in_initializer {
            return Ok(());
        }
        Err(tool.error(
            *target,
            format!("Cannot assign to constant `{}`", item.root_id),
            None,
        ))
    }
}
