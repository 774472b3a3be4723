//! Declares classes, type aliases and class annotations before anything
//! refers to them. Heritage and alias targets stay pending until every
//! declaration of the unit is known.

use vsl_ast::{Access, LiteralKind, NodeId, NodeKind};

use super::{AstTool, Transformation};
use crate::error::{ErrorKind, TransformError, TypeResult};
use crate::item::{
    FuncItem, GenericParameterItem, ItemId, ItemKind, PendingResolution, ScopeItem, TypeAliasItem, TypeItem,
};

/// The class an annotation is attached to, once declared.
fn annotated_class(node: NodeId, tool: &AstTool<'_>) -> TypeResult<Option<(ItemId, Vec<String>)>> {
    let ast = &*tool.ast;
    let NodeKind::Annotation { args, .. } = ast.kind(node) else {
        return Ok(None);
    };
    let Some(parent) = ast.parent(node) else {
        return Ok(None);
    };
    if !matches!(ast.kind(parent), NodeKind::ClassStatement { .. }) {
        return Ok(None);
    }
    let Some(class) = tool.annotations.declared(parent) else {
        return Err(TransformError::internal("annotated class was not declared"));
    };
    let args = args
        .iter()
        .flatten()
        .map(|arg| arg.trim_matches('"').to_string())
        .collect();
    Ok(Some((class, args)))
}

fn annotation_named(kind: &NodeKind, expected: &str) -> bool {
    matches!(kind, NodeKind::Annotation { name, .. } if name == expected)
}

pub struct DescribeClassDeclaration;

impl Transformation for DescribeClassDeclaration {
    fn name(&self) -> &'static str {
        "DescribeClassDeclaration"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::ClassStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::ClassStatement {
            name,
            is_interface,
            generics,
            body,
            ..
        } = tool.ast.kind(node).clone()
        else {
            return Ok(());
        };
        let Some(subscope) = tool.annotations.scope(body) else {
            return Err(TransformError::internal(format!("class `{name}` has no body scope")));
        };
        let implicit = !is_interface
            && !tool
                .ast
                .children(body)
                .iter()
                .any(|&member| matches!(tool.ast.kind(member), NodeKind::InitializerStatement { .. }));

        let static_scope = tool.graph.new_scope(Some(tool.scope));
        tool.graph.scope_mut(static_scope).is_static_context = true;

        let mut ty = TypeItem::new(subscope, static_scope);
        ty.is_interface = is_interface;
        ty.implicit_initializer = implicit;
        let item = ScopeItem::indefinite(
            name.clone(),
            ItemKind::Type(ty),
            PendingResolution::ClassHeritage { scope: subscope, node },
        )
        .with_source(node)
        .restricted(tool.is_private);
        let Some(class) = tool.graph.set(tool.scope, item) else {
            return Err(tool.error(
                node,
                format!("Duplicate declaration of class `{name}`"),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        };
        tool.graph.scope_mut(subscope).owner = Some(class);
        tool.graph.scope_mut(static_scope).owner = Some(class);
        tool.annotations.set_declared(node, class);

        for (index, &generic) in generics.iter().enumerate() {
            let Some(param_name) = tool.ast.name_of(generic).cloned() else {
                continue;
            };
            let param = ScopeItem::definite(
                param_name.clone(),
                ItemKind::GenericParameter(GenericParameterItem {
                    declaring_type: Some(class),
                    index,
                }),
            )
            .with_source(generic);
            let Some(param) = tool.graph.set(subscope, param) else {
                return Err(tool.error(
                    generic,
                    format!("Duplicate generic parameter `{param_name}`"),
                    Some(ErrorKind::DuplicateDeclaration),
                ));
            };
            tool.annotations.set_declared(generic, param);
            if let Some(ty) = tool.graph.item_mut(class).as_type_mut() {
                ty.generic_parameters.push(param);
            }
        }

        if implicit {
            let init = FuncItem {
                access: Access::Public,
                generated: true,
                initializing_type: Some(class),
                ..FuncItem::default()
            };
            let init = ScopeItem::definite("init", ItemKind::Func(init)).with_source(node);
            if tool.graph.set(subscope, init).is_none() {
                return Err(tool.error(
                    node,
                    format!("`{name}` declares a member named `init`"),
                    Some(ErrorKind::DuplicateDeclaration),
                ));
            }
        }
        Ok(())
    }
}

/// `@mock(name)`: the backend representation of a class.
pub struct DescribeTypeMockAnnotation;

impl Transformation for DescribeTypeMockAnnotation {
    fn name(&self) -> &'static str {
        "DescribeTypeMockAnnotation"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        annotation_named(kind, "mock")
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let Some((class, args)) = annotated_class(node, tool)? else {
            return Ok(());
        };
        if let (Some(ty), Some(mock)) = (tool.graph.item_mut(class).as_type_mut(), args.into_iter().next()) {
            ty.mock_type = Some(mock.into());
        }
        Ok(())
    }
}

/// `@primitive(Kind)` and `@primitive(Kind, default)`.
pub struct DescribePrimitiveAnnotation;

impl Transformation for DescribePrimitiveAnnotation {
    fn name(&self) -> &'static str {
        "DescribePrimitiveAnnotation"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        annotation_named(kind, "primitive")
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let Some((class, args)) = annotated_class(node, tool)? else {
            return Ok(());
        };
        let Some(kind) = args.first().and_then(|name| LiteralKind::from_name(name)) else {
            return Ok(());
        };
        let is_default = args.get(1).is_some_and(|flag| flag == "default");
        tracing::debug!(class = %tool.graph.describe(class), kind = kind.name(), is_default, "registered primitive");
        tool.context.register_primitive(kind, class, is_default);
        Ok(())
    }
}

/// `@deprecated` on a class. Functions read theirs when registered.
pub struct DescribeDeprecatedAnnotation;

impl Transformation for DescribeDeprecatedAnnotation {
    fn name(&self) -> &'static str {
        "DescribeDeprecatedAnnotation"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        annotation_named(kind, "deprecated")
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let Some((class, args)) = annotated_class(node, tool)? else {
            return Ok(());
        };
        tool.graph.item_mut(class).deprecation_status = Some(args.into_iter().next().unwrap_or_default());
        Ok(())
    }
}

pub struct DescribeTypeAlias;

impl Transformation for DescribeTypeAlias {
    fn name(&self) -> &'static str {
        "DescribeTypeAlias"
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::TypeAliasStatement { .. })
    }

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let NodeKind::TypeAliasStatement { name, target, .. } = tool.ast.kind(node).clone() else {
            return Ok(());
        };
        let item = ScopeItem::indefinite(
            name.clone(),
            ItemKind::TypeAlias(TypeAliasItem::default()),
            PendingResolution::TypeAliasTarget {
                scope: tool.scope,
                node: target,
            },
        )
        .with_source(node)
        .restricted(tool.is_private);
        let Some(alias) = tool.graph.set(tool.scope, item) else {
            return Err(tool.error(
                node,
                format!("Duplicate declaration of type `{name}`"),
                Some(ErrorKind::DuplicateDeclaration),
            ));
        };
        tool.annotations.set_declared(node, alias);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::unit::CompilationUnit;
    use pretty_assertions::assert_eq;
    use vsl_ast::{AstBuilder, ClassDecl, LiteralKind};

    #[test]
    fn test_class_gets_implicit_initializer() {
        let mut b = AstBuilder::new();
        let class = b.class(ClassDecl::new("Point"));
        let ast = b.program([class]);

        let mut unit = CompilationUnit::new(ast);
        unit.preprocess().unwrap();
        let item = unit.annotations().declared(class).unwrap();
        let ty = unit.graph().item(item).as_type().unwrap();
        assert!(ty.implicit_initializer);
        assert_eq!(unit.graph().get_all(ty.subscope, "init").len(), 1);
    }

    #[test]
    fn test_annotations_describe_class() {
        let mut b = AstBuilder::new();
        let primitive = b.annotation("primitive", Some(&["Integer", "default"]));
        let mock = b.annotation("mock", Some(&["i64"]));
        let deprecated = b.annotation("deprecated", Some(&["\"use Int64\""]));
        let class = b.class(
            ClassDecl::new("Int")
                .annotated(primitive)
                .annotated(mock)
                .annotated(deprecated),
        );
        let ast = b.program([class]);

        let mut unit = CompilationUnit::new(ast);
        unit.preprocess().unwrap();
        let item = unit.annotations().declared(class).unwrap();
        assert_eq!(unit.context().default_primitive(LiteralKind::Integer), Some(item));
        let scope_item = unit.graph().item(item);
        assert_eq!(scope_item.as_type().unwrap().mock_type.as_deref(), Some("i64"));
        assert_eq!(scope_item.deprecation_status.as_deref(), Some("use Int64"));
    }

    #[test]
    fn test_generic_parameters_are_declared() {
        let mut b = AstBuilder::new();
        let class = b.class(ClassDecl::new("Pair").generic("A").generic("B"));
        let ast = b.program([class]);

        let mut unit = CompilationUnit::new(ast);
        unit.preprocess().unwrap();
        let item = unit.annotations().declared(class).unwrap();
        let ty = unit.graph().item(item).as_type().unwrap();
        let names: Vec<_> = ty
            .generic_parameters
            .iter()
            .map(|&param| unit.graph().item(param).root_id.to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
