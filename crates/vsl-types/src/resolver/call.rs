//! Calls, initializer calls, method calls and subscripts.

use smol_str::SmolStr;
use vsl_ast::{Access, CallArgument, NodeId, NodeKind};

use super::operator::merge_candidates;
use super::ResolveCx;
use crate::constraint::{Constraints, TypeCandidate};
use crate::context::TypeContext;
use crate::error::{emit, ErrorKind, TypeResult};
use crate::item::{ItemId, ItemKind};
use crate::scope::ScopeId;

/// The overload set a call chooses from.
#[derive(Debug, Clone)]
struct Callee {
    name: SmolStr,
    overloads: Vec<ItemId>,
    context: Option<TypeContext>,
    /// Set for initializer calls: the type being constructed.
    constructs: Option<ItemId>,
}

#[derive(Debug, Clone)]
struct Applicable {
    func: ItemId,
    params: Vec<ItemId>,
    ret: ItemId,
    score: usize,
}

impl ResolveCx<'_> {
    pub(super) fn resolve_call(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        head: NodeId,
        args: &[CallArgument],
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let arg_candidates = self.speculate_arguments(scope, args, constraints)?;
        let callee = self.callee(scope, head, &arg_candidates, constraints)?;
        self.select_overload(node, scope, Some(head), callee, args, &arg_candidates, constraints)
    }

    pub(super) fn resolve_subscript(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        head: NodeId,
        args: &[CallArgument],
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let ty = self.receiver_type(head, scope, constraints)?;
        let arg_candidates = self.speculate_arguments(scope, args, constraints)?;
        let overloads = self.members(ty, "subscript", false);
        if overloads.is_empty() {
            return Err(emit(
                self.ast,
                node,
                format!("`{}` has no subscript", self.graph.describe(ty)),
                Some(ErrorKind::MethodDoesNotExist),
            ));
        }
        let callee = Callee {
            name: SmolStr::new_inline("subscript"),
            overloads,
            context: self.graph.type_context(ty).cloned(),
            constructs: None,
        };
        self.select_overload(node, scope, None, callee, args, &arg_candidates, constraints)
    }

    /// Resolves an `init` delegation to an initializer of `ty` and returns
    /// the chosen initializer.
    pub fn resolve_initializer_call(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        ty: ItemId,
        args: &[CallArgument],
        context: &crate::context::TransformationContext,
    ) -> TypeResult<ItemId> {
        let constraints = Constraints::root(context);
        let arg_candidates = self.speculate_arguments(scope, args, constraints)?;
        let callee = self.initializers(node, ty)?;
        self.select_overload(node, scope, None, callee, args, &arg_candidates, constraints)?;
        self.annotations.reference(node).ok_or_else(|| {
            emit(self.ast, node, "Initializer delegation was not resolved", None)
        })
    }

    fn speculate_arguments(
        &mut self,
        scope: ScopeId,
        args: &[CallArgument],
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<Vec<TypeCandidate>>> {
        let speculative = Constraints::new(constraints.transformation_context);
        let mut candidates = Vec::with_capacity(args.len());
        for arg in args {
            candidates.push(self.resolve(arg.value, scope, speculative)?);
        }
        Ok(candidates)
    }

    fn callee(
        &mut self,
        scope: ScopeId,
        head: NodeId,
        arg_candidates: &[Vec<TypeCandidate>],
        constraints: Constraints<'_>,
    ) -> TypeResult<Callee> {
        let ast = self.ast;
        match ast.kind(head) {
            NodeKind::Identifier { name } => {
                let found = self.lookup_name(scope, name);
                let Some(&first) = found.first() else {
                    return Err(emit(
                        ast,
                        head,
                        format!("Undeclared function `{name}`"),
                        Some(ErrorKind::UndeclaredIdentifier),
                    ));
                };
                let variant = self.graph.item(first).variant();
                if found.iter().all(|&id| matches!(self.graph.item(id).kind, ItemKind::Func(_))) {
                    return Ok(Callee {
                        name: name.clone(),
                        overloads: found,
                        context: None,
                        constructs: None,
                    });
                }
                if variant.is_type_like() {
                    let ty = self.resolved(first)?;
                    if self.graph.item(ty).as_type().is_some_and(|t| t.is_generic()) {
                        return Err(emit(
                            ast,
                            head,
                            format!("Generic class `{name}` must be specialized before it is initialized"),
                            Some(ErrorKind::GenericSpecializationRequired),
                        ));
                    }
                    self.annotations.set_reference(head, ty);
                    return self.initializers(head, ty);
                }
                // A value in callee position: its resolver reports the misuse.
                self.resolve(head, scope, constraints.bounded(Some(arg_candidates)))?;
                Err(emit(
                    ast,
                    head,
                    format!("`{name}` is not a function"),
                    Some(ErrorKind::InvalidFunctionCall),
                ))
            }
            NodeKind::PropertyExpression {
                head: receiver,
                property,
            } => self.method_callee(scope, head, *receiver, property, constraints),
            NodeKind::Generic { .. } => {
                let ty = self.lookup_type(scope, head)?;
                self.initializers(head, ty)
            }
            _ => {
                self.resolve(head, scope, constraints.bounded(Some(arg_candidates)))?;
                Err(emit(
                    ast,
                    head,
                    "Expression is not callable",
                    Some(ErrorKind::InvalidFunctionCall),
                ))
            }
        }
    }

    fn initializers(&self, head: NodeId, ty: ItemId) -> TypeResult<Callee> {
        let name = self.graph.describe(ty);
        let Some(item) = self.graph.item(ty).as_type() else {
            return Err(emit(
                self.ast,
                head,
                format!("`{name}` cannot be initialized"),
                Some(ErrorKind::InvalidFunctionCall),
            ));
        };
        if item.is_interface {
            return Err(emit(
                self.ast,
                head,
                format!("Interface `{name}` cannot be initialized"),
                Some(ErrorKind::InvalidFunctionCall),
            ));
        }
        let overloads: Vec<ItemId> = self
            .graph
            .get_all(item.subscope, "init")
            .iter()
            .copied()
            .filter(|&id| self.graph.item(id).as_func().is_some_and(|f| f.is_initializer()))
            .collect();
        if overloads.is_empty() {
            return Err(emit(
                self.ast,
                head,
                format!("`{name}` has no initializer"),
                Some(ErrorKind::MethodDoesNotExist),
            ));
        }
        Ok(Callee {
            name: name.into(),
            overloads,
            context: self.graph.type_context(ty).cloned(),
            constructs: Some(ty),
        })
    }

    fn method_callee(
        &mut self,
        scope: ScopeId,
        head: NodeId,
        receiver: NodeId,
        property: &SmolStr,
        constraints: Constraints<'_>,
    ) -> TypeResult<Callee> {
        let (ty, is_static) = match self.named_type(scope, receiver)? {
            Some(ty) => (ty, true),
            None => (self.receiver_type(receiver, scope, constraints)?, false),
        };
        let overloads = self.members(ty, property, is_static);
        if overloads.is_empty() {
            let kind = if is_static { "static method" } else { "method" };
            return Err(emit(
                self.ast,
                head,
                format!("`{}` has no {kind} `{property}`", self.graph.describe(ty)),
                Some(ErrorKind::MethodDoesNotExist),
            ));
        }
        Ok(Callee {
            name: property.clone(),
            overloads,
            context: self.graph.type_context(ty).cloned(),
            constructs: None,
        })
    }

    /// Methods named `name` of `ty`, from the nearest class in its
    /// superclass chain that declares any.
    fn members(&self, ty: ItemId, name: &str, is_static: bool) -> Vec<ItemId> {
        for class in self.graph.class_chain(ty) {
            let Some(item) = self.graph.item(class).as_type() else {
                continue;
            };
            let scope = if is_static { item.static_scope } else { item.subscope };
            let found: Vec<ItemId> = self
                .graph
                .get_all(scope, name)
                .iter()
                .copied()
                .filter(|&id| {
                    self.graph
                        .item(id)
                        .as_func()
                        .is_some_and(|f| f.is_static == is_static && !f.is_initializer())
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Whether code in `scope` may use the private member `item`.
    pub(super) fn can_access(&self, scope: ScopeId, item: ItemId) -> bool {
        let Some(owner) = self.graph.item(item).owner else {
            return true;
        };
        let declaring = self
            .graph
            .scope(owner)
            .owner
            .and_then(|owner| self.graph.item(owner).as_type());
        match declaring {
            Some(ty) => self.graph.is_within(scope, ty.subscope),
            None => self.graph.is_within(scope, owner),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn select_overload(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        head: Option<NodeId>,
        callee: Callee,
        args: &[CallArgument],
        arg_candidates: &[Vec<TypeCandidate>],
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        let void = self.graph.void_type();
        let mut options: Vec<Applicable> = Vec::new();
        let mut private_hit = false;

        'overloads: for &func in &callee.overloads {
            let Some(signature) = self.graph.item(func).as_func().cloned() else {
                continue;
            };
            if args.len() > signature.args.len() || args.len() < signature.required_arity() {
                continue;
            }
            let labels_match = args
                .iter()
                .zip(&signature.args)
                .all(|(arg, param)| arg.label.as_ref().map_or(true, |label| *label == param.external_name));
            if !labels_match {
                continue;
            }

            let mut params = Vec::with_capacity(signature.args.len());
            for arg in &signature.args {
                params.push(match &callee.context {
                    Some(context) => self.graph.contextual_type(arg.ty, context),
                    None => arg.ty,
                });
            }
            let ret = match (callee.constructs, signature.return_type, &callee.context) {
                (Some(ty), _, _) => ty,
                (None, Some(ret), Some(context)) => self.graph.contextual_type(ret, context),
                (None, Some(ret), None) => ret,
                (None, None, _) => void,
            };

            let mut score = 0;
            for (candidates, &param) in arg_candidates.iter().zip(&params) {
                match self.best_operand(candidates, param) {
                    Some(candidate) => score += usize::from(candidate.preferred),
                    None => continue 'overloads,
                }
            }
            if !self.returns_requested(ret, &constraints) {
                continue;
            }
            if signature.access == Access::Private && !self.can_access(scope, func) {
                private_hit = true;
                continue;
            }
            options.push(Applicable {
                func,
                params,
                ret,
                score,
            });
        }

        let top = options.iter().map(|o| o.score).max().unwrap_or(0);
        let at_top: Vec<usize> = (0..options.len()).filter(|&i| options[i].score == top).collect();
        let chosen = match options.len() {
            0 if private_hit => {
                return Err(emit(
                    self.ast,
                    node,
                    format!("`{}` is private and cannot be called here", callee.name),
                    Some(ErrorKind::InvalidAccess),
                ));
            }
            0 if constraints.require_type => {
                let described: Vec<String> = arg_candidates
                    .iter()
                    .map(|candidates| match candidates.as_slice() {
                        [] => "?".to_string(),
                        _ => self.graph.describe_all(candidates.iter().map(|c| c.ty)),
                    })
                    .collect();
                return Err(emit(
                    self.ast,
                    node,
                    format!("No overload of `{}` accepts ({})", callee.name, described.join(", ")),
                    Some(ErrorKind::NoValidOverload),
                ));
            }
            0 => return Ok(Vec::new()),
            1 => 0,
            _ if constraints.simplify_to_prec_type => match at_top.as_slice() {
                [only] => *only,
                _ => {
                    return Err(emit(
                        self.ast,
                        node,
                        format!(
                            "Ambiguous call to `{}`, candidates are {}",
                            callee.name,
                            self.graph.describe_all(at_top.iter().map(|&i| options[i].func))
                        ),
                        Some(ErrorKind::AmbiguousCall),
                    ));
                }
            },
            _ => {
                let unique_top = at_top.len() == 1;
                return Ok(merge_candidates(
                    options
                        .iter()
                        .map(|o| TypeCandidate::new(o.ret, unique_top && o.score == top)),
                ));
            }
        };

        let chosen = options.swap_remove(chosen);
        if chosen.ret == void && !constraints.voidable {
            return Err(emit(
                self.ast,
                node,
                format!("`{}` does not return a value", self.callee_name(chosen.func)),
                Some(ErrorKind::NoValidType),
            ));
        }
        let context = constraints.transformation_context;
        for (arg, &param) in args.iter().zip(&chosen.params) {
            self.resolve_expecting(arg.value, scope, context, Some(param))?;
        }

        self.bind(node, chosen.func, chosen.ret);
        if let Some(head) = head {
            self.annotations.set_reference(head, chosen.func);
        }
        self.bind_context(node, callee.context);
        self.check_deprecation(node, chosen.func)?;
        Ok(vec![TypeCandidate::plain(chosen.ret)])
    }
}
