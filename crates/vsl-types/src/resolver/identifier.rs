use vsl_ast::NodeId;

use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::error::{emit, ErrorKind, TypeResult};
use crate::item::ItemKind;
use crate::scope::ScopeId;

impl ResolveCx<'_> {
    pub(super) fn resolve_identifier(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let found = self.lookup_name(scope, name);
        let Some(&item) = found.first() else {
            return Err(emit(
                self.ast,
                node,
                format!("Undeclared identifier `{name}`"),
                Some(ErrorKind::UndeclaredIdentifier),
            ));
        };

        let resolved = self.graph.item(item);
        let ty = match &resolved.kind {
            ItemKind::Alias(alias) => alias.ty,
            _ => {
                let description = resolved.type_description();
                return Err(emit(
                    self.ast,
                    node,
                    format!("`{name}` is a {description} and cannot be used as a value"),
                    Some(ErrorKind::CannotResolveIdentifier),
                ));
            }
        };
        if constraints.bounded_function.is_some() {
            return Err(emit(
                self.ast,
                node,
                format!("`{name}` is not a function"),
                Some(ErrorKind::InvalidFunctionCall),
            ));
        }
        let Some(ty) = ty else {
            return Err(emit(
                self.ast,
                node,
                format!("The type of `{name}` is not known at this point"),
                Some(ErrorKind::CannotResolveIdentifier),
            ));
        };

        let mut candidates = vec![TypeCandidate::plain(ty)];
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                let requested = constraints.requested_type.map(|ty| graph.describe(ty)).unwrap_or_default();
                format!("`{name}` has type `{}`, expected `{requested}`", graph.describe(ty))
            });
        }

        self.check_deprecation(node, item)?;
        self.bind(node, item, ty);
        Ok(candidates)
    }

    /// `self` is the innermost type whose body encloses the expression,
    /// unless a static function lies in between.
    pub(super) fn resolve_self(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        if constraints.bounded_function.is_some() {
            return Err(emit(
                self.ast,
                node,
                "`self` is not a function",
                Some(ErrorKind::SelfIsNotFunction),
            ));
        }

        let mut enclosing = None;
        let mut current = Some(scope);
        while let Some(id) = current {
            let owner = self.graph.scope(id).owner.map(|owner| &self.graph.item(owner).kind);
            match owner {
                Some(ItemKind::Func(func)) if func.is_static => break,
                Some(ItemKind::Type(_)) => {
                    enclosing = self.graph.scope(id).owner;
                    break;
                }
                _ => current = self.graph.scope(id).parent,
            }
        }
        let Some(ty) = enclosing else {
            return Err(emit(
                self.ast,
                node,
                "Attempted to use `self` in a context where it does not belong",
                None,
            ));
        };

        let mut candidates = vec![TypeCandidate::plain(ty)];
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                let requested = constraints.requested_type.map(|ty| graph.describe(ty)).unwrap_or_default();
                format!("`self` of type `{}` cannot be used as `{requested}`", graph.describe(ty))
            });
        }
        self.bind(node, ty, ty);
        Ok(candidates)
    }
}
