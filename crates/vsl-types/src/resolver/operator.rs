//! Operator overload negotiation.
//!
//! Operators are static functions named after the operator, declared in the
//! static scope of a class. The overloads considered for an expression are
//! those of every candidate operand type, deduplicated in insertion order.

use vsl_ast::NodeId;

use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::context::TypeContext;
use crate::error::{emit, ErrorKind, TypeResult};
use crate::item::ItemId;
use crate::scope::ScopeId;

/// An operator function with its signature substituted for the operand
/// type it was found on.
#[derive(Debug, Clone)]
pub(super) struct Overload {
    pub func: ItemId,
    pub params: Vec<ItemId>,
    pub ret: ItemId,
    pub context: Option<TypeContext>,
}

/// Merges candidates of the same type, keeping the first position.
pub(super) fn merge_candidates(candidates: impl IntoIterator<Item = TypeCandidate>) -> Vec<TypeCandidate> {
    let mut merged: Vec<TypeCandidate> = Vec::new();
    for candidate in candidates {
        match merged.iter_mut().find(|c| c.ty == candidate.ty) {
            Some(existing) => existing.preferred |= candidate.preferred,
            None => merged.push(candidate),
        }
    }
    merged
}

impl ResolveCx<'_> {
    /// Static functions named `op` with `arity` arguments declared on any
    /// of `types` or their superclasses.
    pub(super) fn operator_overloads(&mut self, op: &str, arity: usize, types: &[ItemId]) -> Vec<Overload> {
        let mut overloads: Vec<Overload> = Vec::new();
        for &ty in types {
            let context = self.graph.type_context(ty).cloned();
            for class in self.graph.class_chain(ty) {
                let Some(static_scope) = self.graph.item(class).as_type().map(|t| t.static_scope) else {
                    continue;
                };
                for func in self.graph.get_all(static_scope, op).to_vec() {
                    if overloads.iter().any(|o| o.func == func) {
                        continue;
                    }
                    let Some(signature) = self.graph.item(func).as_func().cloned() else {
                        continue;
                    };
                    if signature.args.len() != arity {
                        continue;
                    }
                    let void = self.graph.void_type();
                    let mut params = Vec::with_capacity(arity);
                    let mut ret = signature.return_type.unwrap_or(void);
                    if let Some(context) = &context {
                        for arg in &signature.args {
                            params.push(self.graph.contextual_type(arg.ty, context));
                        }
                        ret = self.graph.contextual_type(ret, context);
                    } else {
                        params.extend(signature.args.iter().map(|arg| arg.ty));
                    }
                    overloads.push(Overload {
                        func,
                        params,
                        ret,
                        context: context.clone(),
                    });
                }
            }
        }
        overloads
    }

    /// Best operand candidate usable as `param`, preferring preferred ones.
    pub(super) fn best_operand(&self, operands: &[TypeCandidate], param: ItemId) -> Option<TypeCandidate> {
        let mut usable = operands.iter().filter(|c| self.graph.castable(c.ty, param));
        let first = usable.next().copied();
        first.map(|first| {
            if first.preferred {
                first
            } else {
                operands
                    .iter()
                    .copied()
                    .find(|c| c.preferred && self.graph.castable(c.ty, param))
                    .unwrap_or(first)
            }
        })
    }

    pub(super) fn returns_requested(&self, ret: ItemId, constraints: &Constraints<'_>) -> bool {
        constraints
            .requested_type
            .map_or(true, |requested| self.graph.castable(ret, requested))
    }

    /// Drops overloads returning `Void` where a value is needed. Fails when
    /// they were the only ones and a type is required.
    fn retain_valued<S>(
        &self,
        node: NodeId,
        what: &str,
        options: &mut Vec<(Overload, S)>,
        constraints: &Constraints<'_>,
    ) -> TypeResult<()> {
        if constraints.voidable {
            return Ok(());
        }
        let void = self.graph.void_type();
        let before = options.len();
        options.retain(|(overload, _)| overload.ret != void);
        if before > 0 && options.is_empty() && constraints.require_type {
            return Err(emit(
                self.ast,
                node,
                format!("{what} does not return anything"),
                Some(ErrorKind::NoValidType),
            ));
        }
        Ok(())
    }

    pub(super) fn resolve_unary(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        op: &str,
        operand: NodeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let speculative = constraints.requesting(None).simplify(false).value();
        let operands = self.resolve(operand, scope, speculative)?;
        let types: Vec<ItemId> = operands.iter().map(|c| c.ty).collect();

        let mut options: Vec<(Overload, bool)> = Vec::new();
        for overload in self.operator_overloads(op, 1, &types) {
            let Some(best) = self.best_operand(&operands, overload.params[0]) else {
                continue;
            };
            if self.returns_requested(overload.ret, &constraints) {
                options.push((overload, best.preferred));
            }
        }
        self.retain_valued(node, &format!("Unary operator `{op}`"), &mut options, &constraints)?;

        let chosen = match options.len() {
            0 => {
                if constraints.require_type {
                    return Err(emit(
                        self.ast,
                        node,
                        format!(
                            "No overload of unary `{op}` accepts `{}`",
                            self.graph.describe_all(types.iter().copied())
                        ),
                        Some(ErrorKind::NoValidOverload),
                    ));
                }
                return Ok(Vec::new());
            }
            1 => 0,
            _ if constraints.simplify_to_prec_type => {
                let preferred: Vec<usize> = (0..options.len()).filter(|&i| options[i].1).collect();
                match preferred.as_slice() {
                    [only] => *only,
                    _ => {
                        return Err(emit(
                            self.ast,
                            node,
                            format!(
                                "Ambiguous use of unary `{op}`, candidates are {}",
                                self.graph.describe_all(options.iter().map(|(o, _)| o.func))
                            ),
                            Some(ErrorKind::AmbiguousExpression),
                        ));
                    }
                }
            }
            _ => {
                return Ok(merge_candidates(
                    options.iter().map(|(o, preferred)| TypeCandidate::new(o.ret, *preferred)),
                ));
            }
        };

        let (overload, preferred) = options.swap_remove(chosen);
        let context = constraints.transformation_context;
        self.resolve_expecting(operand, scope, context, Some(overload.params[0]))?;
        self.finish_operator(node, &overload)?;
        Ok(vec![TypeCandidate::new(overload.ret, preferred)])
    }

    pub(super) fn resolve_binary(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        op: &str,
        lhs: NodeId,
        rhs: NodeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let speculative = constraints.requesting(None).simplify(false).value();
        let lhs_candidates = self.resolve(lhs, scope, speculative)?;
        let rhs_candidates = self.resolve(rhs, scope, speculative)?;
        let mut types: Vec<ItemId> = Vec::new();
        for candidate in lhs_candidates.iter().chain(&rhs_candidates) {
            if !types.contains(&candidate.ty) {
                types.push(candidate.ty);
            }
        }

        // Score: number of preferred operand candidates the overload uses.
        let mut options: Vec<(Overload, usize)> = Vec::new();
        for overload in self.operator_overloads(op, 2, &types) {
            let mut best: Option<usize> = None;
            for l in lhs_candidates.iter().filter(|c| self.graph.castable(c.ty, overload.params[0])) {
                for r in rhs_candidates.iter().filter(|c| self.graph.castable(c.ty, overload.params[1])) {
                    let score = usize::from(l.preferred) + usize::from(r.preferred);
                    best = Some(best.map_or(score, |b| b.max(score)));
                }
            }
            if let Some(score) = best {
                if self.returns_requested(overload.ret, &constraints) {
                    options.push((overload, score));
                }
            }
        }
        self.retain_valued(node, &format!("Operator `{op}`"), &mut options, &constraints)?;

        let top = options.iter().map(|(_, score)| *score).max().unwrap_or(0);
        let at_top: Vec<usize> = (0..options.len()).filter(|&i| options[i].1 == top).collect();
        let chosen = match options.len() {
            0 => {
                if constraints.require_type {
                    return Err(emit(
                        self.ast,
                        node,
                        format!(
                            "No overload of `{op}` accepts `{}` and `{}`",
                            self.graph.describe_all(lhs_candidates.iter().map(|c| c.ty)),
                            self.graph.describe_all(rhs_candidates.iter().map(|c| c.ty))
                        ),
                        Some(ErrorKind::NoValidOverload),
                    ));
                }
                return Ok(Vec::new());
            }
            1 => 0,
            _ if constraints.simplify_to_prec_type => match at_top.as_slice() {
                [only] => *only,
                _ => {
                    return Err(emit(
                        self.ast,
                        node,
                        format!(
                            "Ambiguous use of `{op}`, candidates are {}",
                            self.graph.describe_all(at_top.iter().map(|&i| options[i].0.func))
                        ),
                        Some(ErrorKind::AmbiguousExpression),
                    ));
                }
            },
            _ => {
                let unique_top = at_top.len() == 1;
                return Ok(merge_candidates(options.iter().map(|(o, score)| {
                    TypeCandidate::new(o.ret, unique_top && *score == top)
                })));
            }
        };

        let (overload, score) = options.swap_remove(chosen);
        let context = constraints.transformation_context;
        self.resolve_expecting(lhs, scope, context, Some(overload.params[0]))?;
        self.resolve_expecting(rhs, scope, context, Some(overload.params[1]))?;
        self.finish_operator(node, &overload)?;
        Ok(vec![TypeCandidate::new(overload.ret, score > 0)])
    }

    fn finish_operator(&mut self, node: NodeId, overload: &Overload) -> TypeResult<()> {
        self.bind(node, overload.func, overload.ret);
        self.bind_context(node, overload.context.clone());
        self.check_deprecation(node, overload.func)
    }
}
