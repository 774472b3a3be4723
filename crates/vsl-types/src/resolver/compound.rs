//! Ternaries, tuples, generic applications, assignments and short-circuit
//! operators.

use vsl_ast::{NodeId, TupleElement};

use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::error::{emit, ErrorKind, TypeResult};
use crate::item::ItemId;
use crate::scope::ScopeId;

/// Limit on the element type combinations a tuple literal offers.
const MAX_TUPLE_CANDIDATES: usize = 64;

impl ResolveCx<'_> {
    pub(super) fn resolve_ternary(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        condition: NodeId,
        if_true: NodeId,
        if_false: NodeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let context = constraints.transformation_context;
        let boolean = self.boolean_type(context);
        self.resolve_expecting(condition, scope, context, boolean)?;

        let branch = constraints.simplify(false).require(false).value();
        let true_candidates = self.resolve(if_true, scope, branch)?;
        let false_candidates = self.resolve(if_false, scope, branch)?;
        let common: Vec<TypeCandidate> = true_candidates
            .iter()
            .filter_map(|a| {
                false_candidates
                    .iter()
                    .find(|b| b.ty == a.ty)
                    .map(|b| TypeCandidate::new(a.ty, a.preferred || b.preferred))
            })
            .collect();
        if common.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                format!(
                    "Branches of the conditional have no common type: `{}` and `{}`",
                    graph.describe_all(true_candidates.iter().map(|c| c.ty)),
                    graph.describe_all(false_candidates.iter().map(|c| c.ty))
                )
            });
        }

        let candidates = self.simplify(common, &constraints);
        match candidates.as_slice() {
            [only] => {
                let ty = only.ty;
                self.resolve_expecting(if_true, scope, context, Some(ty))?;
                self.resolve_expecting(if_false, scope, context, Some(ty))?;
                self.annotations.set_type(node, ty);
                Ok(candidates)
            }
            many if constraints.simplify_to_prec_type => Err(emit(
                self.ast,
                node,
                format!(
                    "Ambiguous conditional, candidates are {}",
                    self.graph.describe_all(many.iter().map(|c| c.ty))
                ),
                Some(ErrorKind::AmbiguousExpression),
            )),
            _ => Ok(candidates),
        }
    }

    pub(super) fn resolve_tuple(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        elements: &[TupleElement],
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        for (index, element) in elements.iter().enumerate() {
            if elements[..index].iter().any(|e| e.label == element.label) {
                return Err(emit(
                    self.ast,
                    element.value,
                    format!("Duplicate tuple label `{}`", element.label),
                    Some(ErrorKind::TupleDuplicateLabel),
                ));
            }
        }

        // A requested tuple of the same shape fixes every element type.
        let expected: Option<Vec<ItemId>> = constraints.requested_type.and_then(|requested| {
            let requested = self.graph.canonical(requested);
            let tuple = self.graph.item(requested).as_tuple()?;
            let same_shape = tuple.parameters.len() == elements.len()
                && tuple.parameters.iter().zip(elements).all(|(p, e)| p.name == e.label);
            same_shape.then(|| tuple.parameters.iter().map(|p| p.ty).collect())
        });
        let expected_at = |index: usize| expected.as_ref().map(|types| types[index]);

        let context = constraints.transformation_context;
        let mut element_candidates: Vec<Vec<TypeCandidate>> = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let speculative = constraints
                .requesting(expected_at(index))
                .simplify(false)
                .require(false)
                .value();
            let candidates = self.resolve(element.value, scope, speculative)?;
            if candidates.is_empty() && constraints.require_type {
                // Reports why the element has no type.
                self.resolve_expecting(element.value, scope, context, expected_at(index))?;
            }
            element_candidates.push(candidates);
        }

        // Every combination of element candidates, preferred when each
        // element uses a preferred candidate.
        let mut combinations: Vec<(Vec<ItemId>, bool)> = vec![(Vec::new(), true)];
        for candidates in &element_candidates {
            let mut next = Vec::new();
            'product: for (types, preferred) in &combinations {
                for candidate in candidates {
                    if next.len() == MAX_TUPLE_CANDIDATES {
                        break 'product;
                    }
                    let mut types = types.clone();
                    types.push(candidate.ty);
                    next.push((types, *preferred && candidate.preferred));
                }
            }
            combinations = next;
        }

        let mut shapes: Vec<(ItemId, Vec<ItemId>)> = Vec::with_capacity(combinations.len());
        let mut candidates: Vec<TypeCandidate> = Vec::with_capacity(combinations.len());
        for (types, preferred) in combinations {
            let parameters = elements.iter().map(|e| e.label.clone()).zip(types.iter().copied()).collect();
            let ty = self.graph.intern_tuple(parameters);
            if !shapes.iter().any(|(existing, _)| *existing == ty) {
                shapes.push((ty, types));
            }
            candidates.push(TypeCandidate::new(ty, preferred));
        }
        let mut candidates = super::operator::merge_candidates(candidates);
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                let requested = constraints.requested_type.map(|ty| graph.describe(ty)).unwrap_or_default();
                format!(
                    "Tuple `{}` cannot be used as `{requested}`",
                    graph.describe_all(shapes.iter().map(|(ty, _)| *ty))
                )
            });
        }

        let candidates = self.simplify(candidates, &constraints);
        match candidates.as_slice() {
            [only] if constraints.simplify_to_prec_type => {
                let ty = only.ty;
                let types = shapes
                    .iter()
                    .find(|(shape, _)| *shape == ty)
                    .map(|(_, types)| types.clone())
                    .unwrap_or_default();
                for (element, &element_ty) in elements.iter().zip(&types) {
                    self.resolve_expecting(element.value, scope, context, Some(element_ty))?;
                }
                self.bind(node, ty, ty);
                Ok(candidates)
            }
            many if constraints.simplify_to_prec_type => Err(emit(
                self.ast,
                node,
                format!(
                    "Ambiguous tuple, candidates are {}",
                    self.graph.describe_all(many.iter().map(|c| c.ty))
                ),
                Some(ErrorKind::AmbiguousExpression),
            )),
            _ => Ok(candidates),
        }
    }

    /// A generic application in value position names a type.
    pub(super) fn resolve_generic(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let ty = self.lookup_type(scope, node)?;
        let mut candidates = vec![TypeCandidate::plain(ty)];
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                format!("`{}` is not the expected type", graph.describe(ty))
            });
        }
        Ok(candidates)
    }

    pub(super) fn resolve_assignment(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        target: NodeId,
        value: NodeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let context = constraints.transformation_context;
        let target_ty = self.resolve_expecting(target, scope, context, None)?;
        self.resolve_expecting(value, scope, context, Some(target_ty))?;

        let void = self.graph.void_type();
        let mut candidates = vec![TypeCandidate::plain(void)];
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |_| "An assignment does not produce a value".to_string());
        }
        self.annotations.set_type(node, void);
        Ok(candidates)
    }

    pub(super) fn resolve_short_circuit(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        op: &str,
        lhs: NodeId,
        rhs: NodeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let context = constraints.transformation_context;
        let Some(boolean) = self.boolean_type(context) else {
            return Err(emit(
                self.ast,
                node,
                format!("`{op}` requires a default Boolean primitive"),
                Some(ErrorKind::NoValidType),
            ));
        };
        self.resolve_expecting(lhs, scope, context, Some(boolean))?;
        self.resolve_expecting(rhs, scope, context, Some(boolean))?;

        let mut candidates = vec![TypeCandidate::plain(boolean)];
        self.filter_requested(&mut candidates, &constraints);
        if candidates.is_empty() {
            return self.no_candidates(node, &constraints, |graph| {
                format!("`{op}` produces `{}`", graph.describe(boolean))
            });
        }
        self.annotations.set_type(node, boolean);
        Ok(candidates)
    }
}
