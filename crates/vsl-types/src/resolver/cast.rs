use vsl_ast::NodeId;

use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::error::{emit, ErrorKind, TypeResult};
use crate::scope::ScopeId;

impl ResolveCx<'_> {
    /// A cast has the target type whatever its value resolves to. The
    /// value itself must settle on exactly one type.
    pub(super) fn resolve_cast(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        value: NodeId,
        target: NodeId,
        checked: bool,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let target_ty = self.lookup_type(scope, target)?;
        let source = constraints.requesting(None).simplify(true).require(false).value();
        let candidates = self.resolve(value, scope, source)?;
        let source_ty = match candidates.as_slice() {
            [only] => only.ty,
            [] => {
                return Err(emit(
                    self.ast,
                    value,
                    "The value being cast has no valid type",
                    Some(ErrorKind::NoValidType),
                ));
            }
            many => {
                return Err(emit(
                    self.ast,
                    value,
                    format!(
                        "Ambiguous value in cast, candidates are {}",
                        self.graph.describe_all(many.iter().map(|c| c.ty))
                    ),
                    Some(ErrorKind::AmbiguousExpression),
                ));
            }
        };

        if checked && !self.graph.castable(source_ty, target_ty) && !self.graph.castable(target_ty, source_ty) {
            return Err(emit(
                self.ast,
                node,
                format!(
                    "Cannot cast `{}` to `{}`",
                    self.graph.describe(source_ty),
                    self.graph.describe(target_ty)
                ),
                Some(ErrorKind::NoValidType),
            ));
        }

        let mut result = vec![TypeCandidate::plain(target_ty)];
        self.filter_requested(&mut result, &constraints);
        if result.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                format!("Cast to `{}` does not produce the expected type", graph.describe(target_ty))
            });
        }
        self.bind(node, target_ty, target_ty);
        Ok(result)
    }
}
