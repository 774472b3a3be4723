//! Rewrites of generic binary expressions into dedicated node kinds.

use vsl_ast::{Ast, NodeId, NodeKind, ShortCircuitOp, TupleTypeParam};

use super::{AstTool, Transformation};
use crate::error::{emit, TypeResult};

fn binary_op(kind: &NodeKind) -> Option<&str> {
    match kind {
        NodeKind::BinaryExpression { op, .. } => Some(op.as_str()),
        _ => None,
    }
}

/// `a && b` and `a || b`.
pub struct TransformShortCircuit;

impl Transformation for TransformShortCircuit {
    fn name(&self) -> &'static str {
        "TransformShortCircuit"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        binary_op(kind).and_then(ShortCircuitOp::from_operator).is_some()
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::BinaryExpression { op, lhs, rhs } = tool.ast.kind(node) else {
            return Ok(());
        };
        let (lhs, rhs) = (*lhs, *rhs);
        let Some(op) = ShortCircuitOp::from_operator(op) else {
            return Ok(());
        };
        tool.ast.replace_kind(node, NodeKind::ShortCircuit { op, lhs, rhs });
        Ok(())
    }
}

/// `target = value` in expression position.
pub struct TransformAssignmentExpression;

impl Transformation for TransformAssignmentExpression {
    fn name(&self) -> &'static str {
        "TransformAssignmentExpression"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        binary_op(kind) == Some("=")
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        if let NodeKind::BinaryExpression { lhs, rhs, .. } = tool.ast.kind(node) {
            let (target, value) = (*lhs, *rhs);
            tool.ast.replace_kind(node, NodeKind::AssignmentExpression { target, value });
        }
        Ok(())
    }
}

/// `value :: Type` becomes a checked cast. The right-hand side was parsed
/// as an expression and is reinterpreted as a type expression.
pub struct TransformCastExpression;

impl Transformation for TransformCastExpression {
    fn name(&self) -> &'static str {
        "TransformCastExpression"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        binary_op(kind) == Some("::")
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::BinaryExpression { lhs, rhs, .. } = tool.ast.kind(node) else {
            return Ok(());
        };
        let (value, target) = (*lhs, *rhs);
        as_type_expression(tool.ast, target)?;
        tool.ast.replace_kind(
            node,
            NodeKind::CastExpression {
                value,
                target,
                checked: true,
            },
        );
        Ok(())
    }
}

fn as_type_expression(ast: &mut Ast, node: NodeId) -> TypeResult<()> {
    let kind = match ast.kind(node).clone() {
        NodeKind::Identifier { name } => NodeKind::TypeName { name },
        NodeKind::Generic { head, arguments } => {
            as_type_expression(ast, head)?;
            for &argument in &arguments {
                as_type_expression(ast, argument)?;
            }
            NodeKind::GenericType { base: head, arguments }
        }
        NodeKind::Tuple { elements } => {
            let mut params = Vec::with_capacity(elements.len());
            for element in elements {
                as_type_expression(ast, element.value)?;
                params.push(TupleTypeParam {
                    name: element.label,
                    ty: element.value,
                });
            }
            NodeKind::TupleType { params }
        }
        kind if kind.is_type_expression() => return Ok(()),
        kind => {
            return Err(emit(
                ast,
                node,
                format!("Expected a type after `::`, found {}", kind.name()),
                None,
            ));
        }
    };
    ast.replace_kind(node, kind);
    Ok(())
}
