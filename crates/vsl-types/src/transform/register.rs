//! Declares functions, initializers and fields. Runs after every class is
//! known, so signatures may name types declared later in the source.

use vsl_ast::{Access, DelegationHead, Mutability, NodeId, NodeKind};

use super::verify::member_of;
use super::{deprecation_of, AstTool, Transformation};
use crate::error::{ErrorKind, TypeResult};
use crate::item::{AliasItem, AliasKind, FuncArgument, FuncItem, ItemId, ItemKind, ScopeItem};
use crate::scope::ScopeId;

/// Builds the signature of `args`.
fn register_arguments(tool: &mut AstTool<'_>, args: &[NodeId]) -> TypeResult<Vec<(NodeId, FuncArgument)>> {
    let mut signature = Vec::with_capacity(args.len());
    for &arg in args {
        let NodeKind::FunctionArgument {
            external_name,
            name,
            ty,
            default_value,
        } = tool.ast.kind(arg).clone()
        else {
            continue;
        };
        let Some(ty_node) = ty else {
            return Err(tool.error(
                arg,
                format!("Argument `{name}` needs a type"),
                Some(ErrorKind::FunctionArgMissingType),
            ));
        };
        let ty = tool.lookup_type(ty_node)?;
        signature.push((
            arg,
            FuncArgument {
                external_name: external_name.unwrap_or_else(|| name.clone()),
                name,
                ty,
                optional: default_value.is_some(),
                source: Some(arg),
            },
        ));
    }
    Ok(signature)
}

/// Declares each argument in the body scope, when there is one.
fn declare_arguments(
    tool: &mut AstTool<'_>,
    args: &[(NodeId, FuncArgument)],
    body_scope: Option<ScopeId>,
) -> TypeResult<()> {
    for (node, arg) in args {
        let alias = ScopeItem::definite(
            arg.name.clone(),
            ItemKind::Alias(AliasItem {
                ty: Some(arg.ty),
                kind: AliasKind::Argument,
                ..AliasItem::default()
            }),
        )
        .with_source(*node);
        let id = match body_scope {
            Some(scope) => tool.graph.set(scope, alias).ok_or_else(|| {
                tool.error(
                    *node,
                    format!("Duplicate argument `{}`", arg.name),
                    Some(ErrorKind::DuplicateDeclaration),
                )
            })?,
            None => tool.graph.alloc(alias),
        };
        tool.annotations.set_declared(*node, id);
    }
    Ok(())
}

fn body_scope(tool: &AstTool<'_>, body: Option<NodeId>) -> Option<ScopeId> {
    body.and_then(|body| tool.annotations.scope(body))
}

/// Generic parameters were declared with their class. A parameter may not
/// shadow the class itself.
pub struct RegisterGenericParameters;

impl Transformation for RegisterGenericParameters {
    fn name(&self) -> &'static str {
        "RegisterGenericParameters"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::GenericParameter { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let Some(name) = tool.ast.name_of(node) else {
            return Ok(());
        };
        let class_name = tool.ast.parent(node).and_then(|class| tool.ast.name_of(class));
        if class_name == Some(name) {
            return Err(tool.error(
                node,
                format!("Generic parameter `{name}` has the same name as its class"),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        }
        if let Some(param) = tool.annotations.declared(node) {
            tool.annotations.set_reference(node, param);
            tool.graph.item_mut(param).references.push(node);
        }
        Ok(())
    }
}

pub struct RegisterFunctionDeclaration;

impl Transformation for RegisterFunctionDeclaration {
    fn name(&self) -> &'static str {
        "RegisterFunctionDeclaration"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::FunctionStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::FunctionStatement {
            name,
            access,
            is_static,
            args,
            return_type,
            body,
            ..
        } = tool.ast.kind(node).clone()
        else {
            return Ok(());
        };

        let in_interface = member_of(tool.ast, node).is_some()
            && tool.enclosing_class().is_some_and(|(_, class)| class.is_interface);
        if body.is_none() && !(in_interface && !is_static) {
            return Err(tool.error(node, format!("Function `{name}` needs a body"), None));
        }

        let body_scope = body_scope(tool, body);
        let signature = register_arguments(tool, &args)?;
        let return_type = match return_type {
            Some(ty) => Some(tool.lookup_type(ty)?).filter(|&ty| ty != tool.graph.void_type()),
            None => None,
        };

        let func = FuncItem {
            args: signature.iter().map(|(_, arg)| arg.clone()).collect(),
            return_type,
            access,
            is_static,
            subscope: body_scope,
            ..FuncItem::default()
        };
        let mut item = ScopeItem::definite(name.clone(), ItemKind::Func(func))
            .with_source(node)
            .restricted(tool.is_private);
        item.deprecation_status = deprecation_of(tool.ast, node);
        let Some(func) = tool.graph.set(tool.assignment_scope, item) else {
            return Err(tool.error(
                node,
                format!("Redeclaration of function `{name}`"),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        };
        tool.annotations.set_declared(node, func);
        if let Some(scope) = body_scope {
            tool.graph.scope_mut(scope).owner = Some(func);
        }
        declare_arguments(tool, &signature, body_scope)
    }
}

pub struct RegisterInitializer;

impl Transformation for RegisterInitializer {
    fn name(&self) -> &'static str {
        "RegisterInitializer"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::InitializerStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::InitializerStatement { access, args, body, .. } = tool.ast.kind(node).clone() else {
            return Ok(());
        };
        let Some((class, _)) = tool.enclosing_class() else {
            return Err(tool.error(node, "Initializers can only be declared in a class", None));
        };

        let body_scope = body_scope(tool, body);
        let signature = register_arguments(tool, &args)?;
        let init = FuncItem {
            args: signature.iter().map(|(_, arg)| arg.clone()).collect(),
            access: if access == Access::Local { Access::Public } else { access },
            subscope: body_scope,
            initializing_type: Some(class),
            ..FuncItem::default()
        };
        let mut item = ScopeItem::definite("init", ItemKind::Func(init))
            .with_source(node)
            .restricted(tool.is_private);
        item.deprecation_status = deprecation_of(tool.ast, node);
        let Some(init) = tool.graph.set(tool.scope, item) else {
            return Err(tool.error(
                node,
                format!("Redeclaration of initializer of `{}`", tool.graph.describe(class)),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        };
        tool.annotations.set_declared(node, init);
        if let Some(scope) = body_scope {
            tool.graph.scope_mut(scope).owner = Some(init);
        }
        declare_arguments(tool, &signature, body_scope)
    }
}

/// `let` and `const` directly in a class body declare fields.
pub struct RegisterFieldDeclaration;

impl Transformation for RegisterFieldDeclaration {
    fn name(&self) -> &'static str {
        "RegisterFieldDeclaration"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::AssignmentStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        if member_of(tool.ast, node).is_none() {
            return Ok(());
        }
        let NodeKind::AssignmentStatement {
            mutability,
            access,
            is_static,
            name,
            ty,
            ..
        } = tool.ast.kind(node).clone()
        else {
            return Ok(());
        };
        let Some(ty) = ty else {
            return Err(tool.error(
                node,
                format!("Field `{name}` needs a type"),
                Some(ErrorKind::AssignmentTypeRequired),
            ));
        };
        let ty = tool.lookup_type(ty)?;
        let field = ScopeItem::definite(
            name.clone(),
            ItemKind::Alias(AliasItem {
                ty: Some(ty),
                kind: AliasKind::Field,
                access,
                is_static,
                is_constant: mutability == Mutability::Const,
                ..AliasItem::default()
            }),
        )
        .with_source(node);
        let Some(field) = tool.graph.set(tool.assignment_scope, field) else {
            return Err(tool.error(
                node,
                format!("Duplicate declaration of field `{name}`"),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        };
        tool.annotations.set_declared(node, field);
        Ok(())
    }
}

/// Subclass initializers chain to the superclass, either explicitly through
/// `super.init` or implicitly when the superclass initializer is implicit.
pub struct VerifyInitializerDelegation;

impl Transformation for VerifyInitializerDelegation {
    fn name(&self) -> &'static str {
        "VerifyInitializerDelegation"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::InitializerStatement { body: Some(_), .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::InitializerStatement { body: Some(body), .. } = tool.ast.kind(node) else {
            return Ok(());
        };
        let delegation = tool.ast.children(*body).into_iter().find_map(|statement| match tool.ast.kind(statement) {
            NodeKind::InitDelegationCall { head, .. } => Some((statement, *head)),
            _ => None,
        });
        let Some((class, ty)) = tool.enclosing_class() else {
            return Ok(());
        };
        let class_name = tool.graph.describe(class);

        match (ty.superclass, delegation) {
            (None, Some((call, DelegationHead::SuperInit))) => Err(tool.error(
                call,
                format!("`super.init` used in `{class_name}`, which has no superclass"),
                None,
            )),
            (Some(superclass), None) => {
                let implicit = tool
                    .graph
                    .item(superclass)
                    .as_type()
                    .is_some_and(|sup| sup.implicit_initializer);
                if !implicit {
                    return Err(tool.error(
                        node,
                        format!(
                            "Initializer of `{class_name}` must call `super.init`, `{}` has no implicit initializer",
                            tool.graph.describe(superclass)
                        ),
                        None,
                    ));
                }
                let init: Option<ItemId> = tool.annotations.declared(node);
                if let Some(func) = init.and_then(|init| tool.graph.item_mut(init).as_func_mut()) {
                    func.implicit_superclass_call = true;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
