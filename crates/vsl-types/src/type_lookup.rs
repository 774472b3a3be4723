//! Resolution of type expressions and deferred class heritage.

use smol_str::SmolStr;
use tracing::trace;
use vsl_ast::{Ast, NodeId, NodeKind};

use crate::error::{emit, ErrorKind, TypeResult};
use crate::graph::{ResolveItem, ScopeGraph};
use crate::item::{ItemId, ItemKind, PendingResolution};
use crate::scope::ScopeId;

/// Resolves type expressions against the scope graph. Also the driver for
/// items whose resolution was deferred at declaration time.
#[derive(Debug, Clone, Copy)]
pub struct TypeLookup<'a> {
    ast: &'a Ast,
}

impl<'a> TypeLookup<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self { ast }
    }

    /// The type denoted by the type expression `node`, looked up from
    /// `scope`.
    pub fn lookup(&mut self, graph: &mut ScopeGraph, scope: ScopeId, node: NodeId) -> TypeResult<ItemId> {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::TypeName { name } | NodeKind::Identifier { name } => self.named(graph, scope, node, name, false),
            NodeKind::GenericType { base, arguments } | NodeKind::Generic { head: base, arguments } => {
                self.specialized(graph, scope, node, *base, arguments)
            }
            NodeKind::TupleType { params } => {
                let mut parameters: Vec<(SmolStr, ItemId)> = Vec::with_capacity(params.len());
                for param in params {
                    if parameters.iter().any(|(name, _)| *name == param.name) {
                        return Err(emit(
                            ast,
                            node,
                            format!("Duplicate tuple label `{}`", param.name),
                            Some(ErrorKind::TupleDuplicateLabel),
                        ));
                    }
                    let ty = self.lookup(graph, scope, param.ty)?;
                    parameters.push((param.name.clone(), ty));
                }
                Ok(graph.intern_tuple(parameters))
            }
            other => Err(emit(ast, node, format!("Expected a type, found {}", other.name()), None)),
        }
    }

    fn named(
        &mut self,
        graph: &mut ScopeGraph,
        scope: ScopeId,
        node: NodeId,
        name: &SmolStr,
        allow_generic: bool,
    ) -> TypeResult<ItemId> {
        let ast = self.ast;
        let found = graph.lookup(scope, name).to_vec();
        if found.is_empty() {
            return Err(emit(
                ast,
                node,
                format!("Undeclared type `{name}`"),
                Some(ErrorKind::UndeclaredIdentifier),
            ));
        }
        let Some(&item) = found.iter().find(|&&id| graph.item(id).variant().is_type_like()) else {
            let description = graph.item(found[0]).type_description();
            return Err(emit(
                ast,
                node,
                format!("`{name}` is a {description}, not a type"),
                Some(ErrorKind::CannotResolveIdentifier),
            ));
        };

        let ty = graph.resolved(item, self).map_err(|error| error.located(ast))?;
        let is_generic = graph.item(ty).as_type().is_some_and(|ty| ty.is_generic());
        if is_generic && !allow_generic {
            return Err(emit(
                ast,
                node,
                format!("Generic class `{name}` must be specialized"),
                Some(ErrorKind::GenericSpecializationRequired),
            ));
        }
        trace!(name = %name, ty = %graph.describe(ty), "type name resolved");
        Ok(ty)
    }

    fn specialized(
        &mut self,
        graph: &mut ScopeGraph,
        scope: ScopeId,
        node: NodeId,
        base: NodeId,
        arguments: &[NodeId],
    ) -> TypeResult<ItemId> {
        let ast = self.ast;
        let Some(name) = ast.name_of(base) else {
            return Err(emit(ast, base, "Expected the name of a generic class", None));
        };
        let base_ty = self.named(graph, scope, base, name, true)?;
        let expected = graph
            .item(base_ty)
            .as_type()
            .map(|ty| ty.generic_parameters.len())
            .unwrap_or(0);
        if expected != arguments.len() {
            return Err(emit(
                ast,
                node,
                format!(
                    "`{name}` takes {expected} type argument(s) but {} were given",
                    arguments.len()
                ),
                Some(ErrorKind::GenericSpecializationRequired),
            ));
        }

        let mut resolved = Vec::with_capacity(arguments.len());
        for &argument in arguments {
            resolved.push(self.lookup(graph, scope, argument)?);
        }
        Ok(graph.specialize(base_ty, resolved))
    }

    fn heritage(&mut self, graph: &mut ScopeGraph, class: ItemId, scope: ScopeId, node: NodeId) -> TypeResult<()> {
        let ast = self.ast;
        let NodeKind::ClassStatement {
            name,
            heritage,
            is_interface,
            ..
        } = ast.kind(node)
        else {
            return Err(emit(ast, node, "Heritage resolution requires a class declaration", None));
        };

        for (index, &parent_node) in heritage.iter().enumerate() {
            let parent = self.lookup(graph, scope, parent_node)?;
            let parent_name = graph.describe(parent);
            let Some(parent_ty) = graph.item(parent).as_type() else {
                return Err(emit(
                    ast,
                    parent_node,
                    format!("Cannot inherit from `{parent_name}`, which is not a class or interface"),
                    Some(ErrorKind::CannotSubclassType),
                ));
            };
            let parent_is_interface = parent_ty.is_interface;
            if parent == class || graph.supertypes(parent).contains(&class) {
                return Err(emit(
                    ast,
                    parent_node,
                    format!("Circular inheritance between `{name}` and `{parent_name}`"),
                    Some(ErrorKind::CannotSubclassType),
                ));
            }

            let Some(ty) = graph.item_mut(class).as_type_mut() else {
                return Err(emit(ast, node, format!("`{name}` is not a class"), None));
            };
            if parent_is_interface {
                if !ty.interfaces.contains(&parent) {
                    ty.interfaces.push(parent);
                }
                continue;
            }
            if *is_interface {
                return Err(emit(
                    ast,
                    parent_node,
                    format!("Interface `{name}` cannot inherit from class `{parent_name}`"),
                    Some(ErrorKind::InterfaceCannotInheritClass),
                ));
            }
            if ty.superclass.is_some() {
                return Err(emit(
                    ast,
                    parent_node,
                    format!("`{name}` cannot inherit from more than one class"),
                    Some(ErrorKind::CannotMultipleInherit),
                ));
            }
            if index != 0 {
                return Err(emit(
                    ast,
                    parent_node,
                    format!("Superclass `{parent_name}` must come first in the heritage list"),
                    Some(ErrorKind::SuperclassShouldBeFirstParam),
                ));
            }
            ty.superclass = Some(parent);
        }

        let ty = graph.item(class).as_type();
        let superclass = ty.and_then(|ty| ty.superclass.filter(|_| ty.implicit_initializer));
        if let Some(superclass) = superclass {
            let super_implicit = graph.item(superclass).as_type().is_some_and(|ty| ty.implicit_initializer);
            if !super_implicit {
                return Err(emit(
                    ast,
                    node,
                    format!(
                        "`{name}` has no initializer and its superclass `{}` has no implicit one",
                        graph.describe(superclass)
                    ),
                    Some(ErrorKind::CannotCreateImplicitInitializer),
                ));
            }
            // The implicit initializer chains to the superclass one.
            let subscope = graph.item(class).as_type().map(|ty| ty.subscope);
            let inits = subscope.map(|s| graph.get_all(s, "init").to_vec()).unwrap_or_default();
            for init in inits {
                if let Some(func) = graph.item_mut(init).as_func_mut() {
                    func.implicit_superclass_call = true;
                }
            }
        }
        Ok(())
    }
}

impl ResolveItem for TypeLookup<'_> {
    fn resolve_item(&mut self, graph: &mut ScopeGraph, item: ItemId, pending: PendingResolution) -> TypeResult<()> {
        match pending {
            PendingResolution::TypeAliasTarget { scope, node } => {
                let target = self.lookup(graph, scope, node)?;
                if let ItemKind::TypeAlias(alias) = &mut graph.item_mut(item).kind {
                    alias.target = Some(target);
                }
                Ok(())
            }
            PendingResolution::ClassHeritage { scope, node } => self.heritage(graph, item, scope, node),
        }
    }
}
