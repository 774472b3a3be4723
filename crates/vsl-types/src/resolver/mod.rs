//! Constraint-negotiation type resolution.
//!
//! Every expression kind has one resolver, reached through the exhaustive
//! dispatch in [`ResolveCx::resolve`]. A resolver receives the constraints
//! imposed by its parent and returns the candidate types the expression can
//! take. Resolution may run twice on the same node: once speculatively to
//! discover candidates, and once definitively after the parent has chosen a
//! type. Annotations are only written once a result is final.

mod call;
mod cast;
mod compound;
mod identifier;
mod literal;
mod operator;
mod property;

use smol_str::SmolStr;
use tracing::trace;
use vsl_ast::{Ast, NodeId, NodeKind};

use crate::annotations::Annotations;
use crate::config::SemaConfig;
use crate::constraint::{Constraints, TypeCandidate};
use crate::context::{TransformationContext, TypeContext};
use crate::error::{collect_warning, emit, ErrorKind, TransformError, TypeResult, Warning, WarningKind};
use crate::graph::ScopeGraph;
use crate::item::{ItemId, ItemKind};
use crate::scope::ScopeId;
use crate::type_lookup::TypeLookup;

/// Mutable state shared by the resolvers of one statement.
pub struct ResolveCx<'a> {
    pub ast: &'a Ast,
    pub graph: &'a mut ScopeGraph,
    pub annotations: &'a mut Annotations,
    pub warnings: &'a mut Vec<Warning>,
    pub config: &'a SemaConfig,
    depth: usize,
}

impl<'a> ResolveCx<'a> {
    pub fn new(
        ast: &'a Ast,
        graph: &'a mut ScopeGraph,
        annotations: &'a mut Annotations,
        warnings: &'a mut Vec<Warning>,
        config: &'a SemaConfig,
    ) -> Self {
        Self {
            ast,
            graph,
            annotations,
            warnings,
            config,
            depth: 0,
        }
    }

    /// Resolves the expression statement root `node` to a single type.
    pub fn resolve_root(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        context: &TransformationContext,
    ) -> TypeResult<ItemId> {
        let constraints = Constraints::root(context);
        let candidates = self.resolve(node, scope, constraints)?;
        self.single(node, &candidates)
    }

    /// Resolves `node` to exactly `expected`, or to its single preferred
    /// type when nothing is expected.
    pub fn resolve_expecting(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        context: &TransformationContext,
        expected: Option<ItemId>,
    ) -> TypeResult<ItemId> {
        let candidates = self.resolve(node, scope, Constraints::expecting(context, expected))?;
        self.single(node, &candidates)
    }

    /// Runs the resolver for `node` under `constraints`.
    pub fn resolve(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        constraints: Constraints<'_>,
    ) -> TypeResult<Vec<TypeCandidate>> {
        if self.depth >= self.config.max_resolution_depth {
            return Err(emit(
                self.ast,
                node,
                format!(
                    "Expression nests deeper than the resolution limit of {}",
                    self.config.max_resolution_depth
                ),
                None,
            ));
        }
        self.depth += 1;
        let result = self.dispatch(node, scope, constraints);
        self.depth -= 1;

        if let Ok(candidates) = &result {
            trace!(
                node = %node,
                kind = self.ast.kind(node).name(),
                candidates = %self.graph.describe_all(candidates.iter().map(|c| c.ty)),
                "resolved"
            );
        }
        result
    }

    fn dispatch(&mut self, node: NodeId, scope: ScopeId, constraints: Constraints<'_>) -> TypeResult<Vec<TypeCandidate>> {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Identifier { name } => self.resolve_identifier(node, scope, name, constraints),
            NodeKind::Literal { kind, .. } => self.resolve_literal(node, *kind, constraints),
            NodeKind::SelfRef => self.resolve_self(node, scope, constraints),
            NodeKind::BinaryExpression { op, lhs, rhs } => self.resolve_binary(node, scope, op, *lhs, *rhs, constraints),
            NodeKind::UnaryExpression { op, operand } => self.resolve_unary(node, scope, op, *operand, constraints),
            NodeKind::FunctionCall { head, args } => self.resolve_call(node, scope, *head, args, constraints),
            NodeKind::Subscript { head, args } => self.resolve_subscript(node, scope, *head, args, constraints),
            NodeKind::PropertyExpression { head, property } => {
                self.resolve_property(node, scope, *head, property, constraints)
            }
            NodeKind::CastExpression { value, target, checked } => {
                self.resolve_cast(node, scope, *value, *target, *checked, constraints)
            }
            NodeKind::Ternary {
                condition,
                if_true,
                if_false,
            } => self.resolve_ternary(node, scope, *condition, *if_true, *if_false, constraints),
            NodeKind::Tuple { elements } => self.resolve_tuple(node, scope, elements, constraints),
            NodeKind::Generic { .. } => self.resolve_generic(node, scope, constraints),
            NodeKind::AssignmentExpression { target, value } => {
                self.resolve_assignment(node, scope, *target, *value, constraints)
            }
            NodeKind::ShortCircuit { op, lhs, rhs } => {
                self.resolve_short_circuit(node, scope, op.operator(), *lhs, *rhs, constraints)
            }
            NodeKind::TypeName { .. } | NodeKind::GenericType { .. } | NodeKind::TupleType { .. } => Err(emit(
                ast,
                node,
                "A type cannot be used as a value",
                Some(ErrorKind::CannotResolveIdentifier),
            )),
            NodeKind::CodeBlock { .. }
            | NodeKind::ClassStatement { .. }
            | NodeKind::FunctionStatement { .. }
            | NodeKind::FunctionArgument { .. }
            | NodeKind::InitializerStatement { .. }
            | NodeKind::InitDelegationCall { .. }
            | NodeKind::TypeAliasStatement { .. }
            | NodeKind::AssignmentStatement { .. }
            | NodeKind::IfStatement { .. }
            | NodeKind::WhileStatement { .. }
            | NodeKind::DoWhileStatement { .. }
            | NodeKind::ReturnStatement { .. }
            | NodeKind::ExpressionStatement { .. }
            | NodeKind::Annotation { .. }
            | NodeKind::GenericParameter { .. } => Err(TransformError::at(
                ast,
                node,
                format!("{} is not an expression", ast.kind(node).name()),
            )),
        }
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// The only candidate of a simplified, required resolution.
    fn single(&self, node: NodeId, candidates: &[TypeCandidate]) -> TypeResult<ItemId> {
        match candidates {
            [only] => Ok(only.ty),
            [] => Err(emit(
                self.ast,
                node,
                "Expression has no valid type",
                Some(ErrorKind::NoValidType),
            )),
            many => Err(emit(
                self.ast,
                node,
                format!(
                    "Ambiguous expression, candidates are {}",
                    self.graph.describe_all(many.iter().map(|c| c.ty))
                ),
                Some(ErrorKind::AmbiguousExpression),
            )),
        }
    }

    /// Resolves the type expression `node` and records it as the node's
    /// reference.
    pub fn lookup_type(&mut self, scope: ScopeId, node: NodeId) -> TypeResult<ItemId> {
        let ast = self.ast;
        let ty = TypeLookup::new(ast)
            .lookup(self.graph, scope, node)
            .map_err(|error| error.located(ast))?;
        self.annotations.set_reference(node, ty);
        self.annotations.set_type(node, ty);
        Ok(ty)
    }

    /// Canonical form of `item`, running any pending resolution.
    fn resolved(&mut self, item: ItemId) -> TypeResult<ItemId> {
        let ast = self.ast;
        self.graph
            .resolved(item, &mut TypeLookup::new(ast))
            .map_err(|error| error.located(ast))
    }

    /// Overload set visible as `name` from `scope`: lexical scopes first,
    /// then the static members of enclosing types.
    fn lookup_name(&self, scope: ScopeId, name: &str) -> Vec<ItemId> {
        let found = self.graph.lookup(scope, name);
        if !found.is_empty() {
            return found.to_vec();
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(owner) = self.graph.scope(id).owner {
                if let Some(ty) = self.graph.item(owner).as_type() {
                    let statics = self.graph.get_all(ty.static_scope, name);
                    if !statics.is_empty() {
                        return statics.to_vec();
                    }
                }
            }
            current = self.graph.scope(id).parent;
        }
        Vec::new()
    }

    /// The type named by `node` when it is a bare identifier bound to a
    /// type, as in `Foo.make()`.
    fn named_type(&mut self, scope: ScopeId, node: NodeId) -> TypeResult<Option<ItemId>> {
        let ast = self.ast;
        let NodeKind::Identifier { name } = ast.kind(node) else {
            return Ok(None);
        };
        let found = self.lookup_name(scope, name);
        match found.first() {
            Some(&item) if self.graph.item(item).variant().is_type_like() => {
                let ty = self.resolved(item)?;
                self.annotations.set_reference(node, ty);
                Ok(Some(ty))
            }
            _ => Ok(None),
        }
    }

    /// The single type of a receiver expression.
    fn receiver_type(&mut self, node: NodeId, scope: ScopeId, constraints: Constraints<'_>) -> TypeResult<ItemId> {
        let receiver = Constraints::expecting(constraints.transformation_context, None);
        let candidates = self.resolve(node, scope, receiver)?;
        self.single(node, &candidates)
    }

    /// Keeps the candidates usable as the requested type.
    fn filter_requested(&self, candidates: &mut Vec<TypeCandidate>, constraints: &Constraints<'_>) {
        if let Some(requested) = constraints.requested_type {
            candidates.retain(|candidate| self.graph.castable(candidate.ty, requested));
        }
    }

    /// Collapses to the single preferred candidate when simplifying.
    fn simplify(&self, candidates: Vec<TypeCandidate>, constraints: &Constraints<'_>) -> Vec<TypeCandidate> {
        if !constraints.simplify_to_prec_type || candidates.len() < 2 {
            return candidates;
        }
        let preferred: Vec<TypeCandidate> = candidates.iter().copied().filter(|c| c.preferred).collect();
        if preferred.len() == 1 {
            preferred
        } else {
            candidates
        }
    }

    /// The error or empty result for a resolution with no candidates left.
    fn no_candidates(
        &self,
        node: NodeId,
        constraints: &Constraints<'_>,
        message: impl FnOnce(&ScopeGraph) -> String,
    ) -> TypeResult<Vec<TypeCandidate>> {
        if constraints.require_type {
            Err(emit(self.ast, node, message(&*self.graph), Some(ErrorKind::NoValidType)))
        } else {
            Ok(Vec::new())
        }
    }

    /// Records a final, single resolution.
    fn bind(&mut self, node: NodeId, reference: ItemId, ty: ItemId) {
        let references = &mut self.graph.item_mut(reference).references;
        if !references.contains(&node) {
            references.push(node);
        }
        self.annotations.set_reference(node, reference);
        self.annotations.set_type(node, ty);
    }

    fn bind_context(&mut self, node: NodeId, context: Option<TypeContext>) {
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            self.annotations.set_type_context(node, context);
        }
    }

    /// The default `Boolean` primitive, used by conditions.
    fn boolean_type(&self, context: &TransformationContext) -> Option<ItemId> {
        context.default_primitive(vsl_ast::LiteralKind::Boolean)
    }

    /// Warns about a use of a deprecated item.
    fn check_deprecation(&mut self, node: NodeId, item: ItemId) -> TypeResult<()> {
        if !self.config.deprecation_warnings {
            return Ok(());
        }
        let item = self.graph.item(item);
        let Some(status) = &item.deprecation_status else {
            return Ok(());
        };
        let message = if status.is_empty() {
            format!("`{}` is deprecated", item.root_id)
        } else {
            format!("`{}` is deprecated: {status}", item.root_id)
        };
        self.warn(Warning::at(self.ast, node, WarningKind::Deprecated, message))
    }

    fn warn(&mut self, warning: Warning) -> TypeResult<()> {
        collect_warning(self.warnings, self.config.warnings_as_errors, warning)
    }

    /// Describes a function's name for messages.
    fn callee_name(&self, item: ItemId) -> SmolStr {
        let item = self.graph.item(item);
        match &item.kind {
            ItemKind::Func(func) if func.is_initializer() => func
                .initializing_type
                .map(|ty| SmolStr::from(self.graph.describe(ty)))
                .unwrap_or_else(|| item.root_id.clone()),
            _ => item.root_id.clone(),
        }
    }
}
