use vsl_ast::{LiteralKind, NodeId};

use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::error::{emit, ErrorKind, TypeResult};

impl ResolveCx<'_> {
    /// Literals take any type registered for their family. The family's
    /// default is preferred.
    pub(super) fn resolve_literal(
        &mut self,
        node: NodeId,
        kind: LiteralKind,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let family = constraints
            .transformation_context
            .primitives(kind)
            .filter(|family| !family.types.is_empty());
        let Some(family) = family else {
            return Err(emit(
                self.ast,
                node,
                format!("No type is registered for {} literals", kind.name()),
                Some(ErrorKind::NoValidType),
            ));
        };

        let mut candidates: Vec<TypeCandidate> = family
            .types
            .iter()
            .map(|&ty| TypeCandidate::new(ty, family.default == Some(ty)))
            .collect();
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                let requested = constraints.requested_type.map(|ty| graph.describe(ty)).unwrap_or_default();
                format!("{} literal cannot be used as `{requested}`", kind.name())
            });
        }

        let candidates = self.simplify(candidates, &constraints);
        if let [only] = candidates.as_slice() {
            self.bind(node, only.ty, only.ty);
        }
        Ok(candidates)
    }
}
