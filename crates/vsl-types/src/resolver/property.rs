use smol_str::SmolStr;
use vsl_ast::{Access, NodeId};

use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::error::{emit, ErrorKind, TypeResult};
use crate::item::{ItemId, ItemKind};
use crate::scope::ScopeId;

impl ResolveCx<'_> {
    /// Field access: instance fields through the superclass chain, static
    /// fields when the head names a type, and tuple fields.
    pub(super) fn resolve_property(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        head: NodeId,
        property: &SmolStr,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let (owner, is_static) = match self.named_type(scope, head)? {
            Some(ty) => (ty, true),
            None => (self.receiver_type(head, scope, constraints)?, false),
        };

        let context = self.graph.type_context(owner).cloned();
        let found = match &self.graph.item(owner).kind {
            ItemKind::Tuple(tuple) if !is_static => tuple
                .parameters
                .iter()
                .find(|param| param.name == *property)
                .map(|param| (param.field, Some(param.ty))),
            ItemKind::Type(_) => self
                .field(owner, property, is_static)
                .map(|field| (field, self.graph.item(field).as_alias().and_then(|a| a.ty))),
            _ => None,
        };
        let Some((field, ty)) = found else {
            return Err(emit(
                self.ast,
                node,
                format!("`{}` has no property `{property}`", self.graph.describe(owner)),
                Some(ErrorKind::PropertyDoesNotExist),
            ));
        };
        let Some(mut ty) = ty else {
            return Err(emit(
                self.ast,
                node,
                format!("The type of `{property}` is not known at this point"),
                Some(ErrorKind::CannotResolveIdentifier),
            ));
        };

        let private = self
            .graph
            .item(field)
            .as_alias()
            .is_some_and(|alias| alias.access == Access::Private);
        if private && !self.can_access(scope, field) {
            return Err(emit(
                self.ast,
                node,
                format!("`{property}` is private to `{}`", self.graph.describe(owner)),
                Some(ErrorKind::InvalidAccess),
            ));
        }
        if let Some(context) = &context {
            ty = self.graph.contextual_type(ty, context);
        }

        let mut candidates = vec![TypeCandidate::plain(ty)];
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                let requested = constraints.requested_type.map(|ty| graph.describe(ty)).unwrap_or_default();
                format!("`{property}` has type `{}`, expected `{requested}`", graph.describe(ty))
            });
        }

        self.check_deprecation(node, field)?;
        self.bind(node, field, ty);
        self.bind_context(node, context);
        Ok(candidates)
    }

    /// Field `name` of `ty`, searching superclasses.
    fn field(&self, ty: ItemId, name: &str, is_static: bool) -> Option<ItemId> {
        self.graph.class_chain(ty).into_iter().find_map(|class| {
            let item = self.graph.item(class).as_type()?;
            let scope = if is_static { item.static_scope } else { item.subscope };
            self.graph.get_all(scope, name).iter().copied().find(|&id| {
                self.graph
                    .item(id)
                    .as_alias()
                    .is_some_and(|alias| alias.is_static == is_static)
            })
        })
    }
}
