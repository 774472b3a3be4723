//! Type deduction for statements. Each pass hands one statement root to
//! the resolver with a fresh set of constraints.

use vsl_ast::{DelegationHead, Mutability, NodeId, NodeKind};

use super::verify::member_of;
use super::{AstTool, Transformation};
use crate::error::{ErrorKind, TypeResult};
use crate::item::{AliasItem, AliasKind, ItemKind, ScopeItem};

fn deduct_condition(tool: &mut AstTool<'_>, condition: NodeId) -> TypeResult<()> {
    let boolean = tool.boolean_type();
    let ty = tool.resolve_expecting(condition, boolean)?;
    tool.annotations.set_type(condition, ty);
    Ok(())
}

pub struct TypeDeductIfStatement;

impl Transformation for TypeDeductIfStatement {
    fn name(&self) -> &'static str {
        "TypeDeductIfStatement"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::IfStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::IfStatement { condition, .. } = *tool.ast.kind(node) else {
            return Ok(());
        };
        deduct_condition(tool, condition)
    }
}

pub struct TypeDeductWhileStatement;

impl Transformation for TypeDeductWhileStatement {
    fn name(&self) -> &'static str {
        "TypeDeductWhileStatement"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::WhileStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::WhileStatement { condition, .. } = *tool.ast.kind(node) else {
            return Ok(());
        };
        deduct_condition(tool, condition)
    }
}

pub struct TypeDeductDoWhileStatement;

impl Transformation for TypeDeductDoWhileStatement {
    fn name(&self) -> &'static str {
        "TypeDeductDoWhileStatement"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::DoWhileStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::DoWhileStatement { condition, .. } = *tool.ast.kind(node) else {
            return Ok(());
        };
        deduct_condition(tool, condition)
    }
}

pub struct TypeDeductExpression;

impl Transformation for TypeDeductExpression {
    fn name(&self) -> &'static str {
        "TypeDeductExpression"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::ExpressionStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::ExpressionStatement { expression } = *tool.ast.kind(node) else {
            return Ok(());
        };
        let ty = tool.resolve_root(expression)?;
        tool.annotations.set_type(node, ty);
        Ok(())
    }
}

/// `let` and `const` statements outside class bodies declare variables.
/// Field initial values are checked against the declared field type.
pub struct TypeDeductAssignment;

impl Transformation for TypeDeductAssignment {
    fn name(&self) -> &'static str {
        "TypeDeductAssignment"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::AssignmentStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::AssignmentStatement {
            mutability,
            access,
            name,
            ty,
            value,
            ..
        } = tool.ast.kind(node).clone()
        else {
            return Ok(());
        };

        if member_of(tool.ast, node).is_some() {
            let field_ty = tool
                .annotations
                .declared(node)
                .and_then(|field| tool.graph.item(field).as_alias())
                .and_then(|alias| alias.ty);
            if let (Some(value), Some(field_ty)) = (value, field_ty) {
                tool.resolve_expecting(value, Some(field_ty))?;
                tool.annotations.set_type(node, field_ty);
            }
            return Ok(());
        }

        let is_constant = mutability == Mutability::Const;
        if is_constant && value.is_none() {
            return Err(tool.error(
                node,
                format!("Constant `{name}` needs a value"),
                Some(ErrorKind::AssignmentValueRequired),
            ));
        }
        if ty.is_none() && value.is_none() {
            return Err(tool.error(
                node,
                format!("`{name}` needs a type or a value"),
                Some(ErrorKind::AssignmentTypeRequired),
            ));
        }

        let declared = match ty {
            Some(ty) => Some(tool.lookup_type(ty)?),
            None => None,
        };
        // The value is resolved before the name is declared, so it cannot
        // refer to itself.
        let resolved = match value {
            Some(value) => Some(tool.resolve_expecting(value, declared)?),
            None => None,
        };
        let Some(var_ty) = declared.or(resolved) else {
            return Ok(());
        };

        let is_global = tool.annotations.is_global(node);
        let alias = ScopeItem::definite(
            name.clone(),
            ItemKind::Alias(AliasItem {
                ty: Some(var_ty),
                kind: AliasKind::Variable,
                access,
                escapes_scope: is_global,
                is_constant,
                ..AliasItem::default()
            }),
        )
        .with_source(node);
        let Some(alias) = tool.graph.set(tool.scope, alias) else {
            return Err(tool.error(
                node,
                format!("Redeclaration of variable `{name}`"),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        };
        tool.annotations.set_declared(node, alias);
        tool.annotations.set_type(node, var_ty);
        Ok(())
    }
}

pub struct TypeDeductReturnStatement;

impl Transformation for TypeDeductReturnStatement {
    fn name(&self) -> &'static str {
        "TypeDeductReturnStatement"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::ReturnStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::ReturnStatement { value } = *tool.ast.kind(node) else {
            return Ok(());
        };
        let Some(declaration) = tool.declaration_node else {
            return Err(tool.error(node, "`return` outside of a function", None));
        };

        let name = match tool.ast.kind(declaration) {
            NodeKind::InitializerStatement { .. } => {
                return match value {
                    Some(value) => Err(tool.error(value, "Initializers cannot return a value", None)),
                    None => Ok(()),
                };
            }
            NodeKind::FunctionStatement { name, .. } => name.clone(),
            _ => return Err(tool.error(node, "`return` outside of a function", None)),
        };
        let expected = tool
            .annotations
            .declared(declaration)
            .and_then(|func| tool.graph.item(func).as_func())
            .and_then(|func| func.return_type);
        match (value, expected) {
            (Some(value), Some(expected)) => {
                let ty = tool.resolve_expecting(value, Some(expected))?;
                tool.annotations.set_type(node, ty);
                Ok(())
            }
            (Some(value), None) => Err(tool.error(
                value,
                format!("`{name}` does not return a value"),
                Some(ErrorKind::NoValidType),
            )),
            (None, Some(expected)) => Err(tool.error(
                node,
                format!("`{name}` must return `{}`", tool.graph.describe(expected)),
                Some(ErrorKind::NoValidType),
            )),
            (None, None) => Ok(()),
        }
    }
}

pub struct TypeDeductDefaultFunctionArguments;

impl Transformation for TypeDeductDefaultFunctionArguments {
    fn name(&self) -> &'static str {
        "TypeDeductDefaultFunctionArguments"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::FunctionArgument { default_value: Some(_), .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::FunctionArgument {
            default_value: Some(default),
            ..
        } = *tool.ast.kind(node)
        else {
            return Ok(());
        };
        let expected = tool
            .annotations
            .declared(node)
            .and_then(|arg| tool.graph.item(arg).as_alias())
            .and_then(|alias| alias.ty);
        tool.resolve_expecting(default, expected)?;
        Ok(())
    }
}

/// `self.init(...)` and `super.init(...)` pick an initializer like a call.
pub struct TypeDeductInitDelegation;

impl Transformation for TypeDeductInitDelegation {
    fn name(&self) -> &'static str {
        "TypeDeductInitDelegation"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::InitDelegationCall { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::InitDelegationCall { head, args } = tool.ast.kind(node).clone() else {
            return Ok(());
        };
        let Some(class) = tool.graph.enclosing_type(tool.scope) else {
            return Err(tool.error(node, format!("`{}` outside of a class", head.keyword()), None));
        };
        let target = match head {
            DelegationHead::SelfInit => Some(class),
            DelegationHead::SuperInit => tool.graph.item(class).as_type().and_then(|ty| ty.superclass),
        };
        let Some(target) = target else {
            return Err(tool.error(
                node,
                format!("`{}` has no superclass to delegate to", tool.graph.describe(class)),
                None,
            ));
        };
        tool.resolve_initializer_call(node, target, &args)?;
        Ok(())
    }
}
