//! Tree passes and the transformer that runs them.
//!
//! A [`Transformation`] matches node kinds and mutates the tree or the
//! scope graph when it sees one. A [`Transformer`] walks the tree in
//! pre-order and applies every matching pass to each node, in list order,
//! before descending. Later passes observe what earlier passes did to the
//! same node, so desugaring passes come first.

mod deduct;
mod describe;
mod desugar;
mod pipeline;
mod register;
mod verify;

pub use pipeline::{deduction, preprocessor, registration};

use tracing::{debug, trace};
use vsl_ast::{Access, Ast, NodeId, NodeKind};

use crate::annotations::Annotations;
use crate::config::SemaConfig;
use crate::context::TransformationContext;
use crate::error::{collect_warning, emit, ErrorKind, TransformError, TypeResult, Warning};
use crate::graph::ScopeGraph;
use crate::item::{ItemId, TypeItem};
use crate::resolver::ResolveCx;
use crate::scope::ScopeId;

pub trait Transformation {
    fn name(&self) -> &'static str;

    fn matches(&self, kind: &NodeKind) -> bool;

    fn modify(&self, node: NodeId, tool: &mut AstTool<'_>) -> TypeResult<()>;
}

/// Everything a pass may read or change, plus facts about the node being
/// visited.
pub struct AstTool<'a> {
    pub ast: &'a mut Ast,
    pub graph: &'a mut ScopeGraph,
    pub annotations: &'a mut Annotations,
    pub context: &'a mut TransformationContext,
    pub config: &'a SemaConfig,
    pub warnings: &'a mut Vec<Warning>,

    /// Scope of the nearest enclosing code block.
    pub scope: ScopeId,
    /// Where a declaration at this node is inserted: the static scope of
    /// the class for static members, otherwise `scope`.
    pub assignment_scope: ScopeId,
    pub is_private: bool,
    pub is_static: bool,
    /// Nearest enclosing class, function or initializer declaration.
    pub declaration_node: Option<NodeId>,
}

impl<'a> AstTool<'a> {
    pub fn new(
        ast: &'a mut Ast,
        graph: &'a mut ScopeGraph,
        annotations: &'a mut Annotations,
        context: &'a mut TransformationContext,
        config: &'a SemaConfig,
        warnings: &'a mut Vec<Warning>,
    ) -> Self {
        let builtin = graph.builtin_scope();
        Self {
            ast,
            graph,
            annotations,
            context,
            config,
            warnings,
            scope: builtin,
            assignment_scope: builtin,
            is_private: false,
            is_static: false,
            declaration_node: None,
        }
    }

    /// Fills in the per-node fields for `node`.
    fn prepare(&mut self, node: NodeId) {
        let ast = &*self.ast;
        self.scope = ast
            .ancestors(node)
            .find_map(|ancestor| match ast.kind(ancestor) {
                NodeKind::CodeBlock { .. } => self.annotations.scope(ancestor),
                _ => None,
            })
            .unwrap_or_else(|| self.graph.builtin_scope());
        self.declaration_node = ast.ancestors(node).find(|&ancestor| {
            matches!(
                ast.kind(ancestor),
                NodeKind::ClassStatement { .. }
                    | NodeKind::FunctionStatement { .. }
                    | NodeKind::InitializerStatement { .. }
            )
        });

        let (access, is_static) = match ast.kind(node) {
            NodeKind::ClassStatement { access, .. }
            | NodeKind::InitializerStatement { access, .. }
            | NodeKind::TypeAliasStatement { access, .. } => (*access, false),
            NodeKind::FunctionStatement { access, is_static, .. }
            | NodeKind::AssignmentStatement { access, is_static, .. } => (*access, *is_static),
            _ => (Access::Local, false),
        };
        self.is_private = access == Access::Private;
        self.is_static = is_static;
        self.assignment_scope = match self.enclosing_class() {
            Some((_, ty)) if is_static => ty.static_scope,
            _ => self.scope,
        };
    }

    /// The class whose body is the current scope.
    pub fn enclosing_class(&self) -> Option<(ItemId, &TypeItem)> {
        let owner = self.graph.scope(self.scope).owner?;
        self.graph.item(owner).as_type().map(|ty| (owner, ty))
    }

    pub fn error(&self, node: NodeId, message: impl Into<String>, kind: Option<ErrorKind>) -> TransformError {
        emit(&*self.ast, node, message, kind)
    }

    /// Collects a warning, or fails when warnings are fatal.
    pub fn warn(&mut self, warning: Warning) -> TypeResult<()> {
        collect_warning(self.warnings, self.config.warnings_as_errors, warning)
    }

    fn resolver(&mut self) -> (ResolveCx<'_>, &TransformationContext) {
        (
            ResolveCx::new(&*self.ast, &mut *self.graph, &mut *self.annotations, &mut *self.warnings, self.config),
            &*self.context,
        )
    }

    /// Resolves an expression statement root.
    pub fn resolve_root(&mut self, node: NodeId) -> TypeResult<ItemId> {
        let scope = self.scope;
        let (mut cx, context) = self.resolver();
        cx.resolve_root(node, scope, context)
    }

    /// Resolves a value to `expected`, or to its preferred type.
    pub fn resolve_expecting(&mut self, node: NodeId, expected: Option<ItemId>) -> TypeResult<ItemId> {
        let scope = self.scope;
        let (mut cx, context) = self.resolver();
        cx.resolve_expecting(node, scope, context, expected)
    }

    /// Resolves a type expression from the current scope.
    pub fn lookup_type(&mut self, node: NodeId) -> TypeResult<ItemId> {
        let scope = self.scope;
        let (mut cx, _) = self.resolver();
        cx.lookup_type(scope, node)
    }

    /// Resolves `init` of `ty` called with `args` and returns the chosen
    /// initializer.
    pub fn resolve_initializer_call(
        &mut self,
        node: NodeId,
        ty: ItemId,
        args: &[vsl_ast::CallArgument],
    ) -> TypeResult<ItemId> {
        let scope = self.scope;
        let (mut cx, context) = self.resolver();
        cx.resolve_initializer_call(node, scope, ty, args, context)
    }

    /// The default `Boolean` primitive, if one is registered.
    pub fn boolean_type(&self) -> Option<ItemId> {
        self.context.default_primitive(vsl_ast::LiteralKind::Boolean)
    }
}

/// An ordered list of passes.
pub struct Transformer {
    name: &'static str,
    passes: Vec<Box<dyn Transformation>>,
}

impl Transformer {
    pub fn new(name: &'static str, passes: Vec<Box<dyn Transformation>>) -> Self {
        Self { name, passes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Applies the passes to every node reachable from the root.
    pub fn run(&self, tool: &mut AstTool<'_>) -> TypeResult<()> {
        let Some(root) = tool.ast.root() else {
            return Ok(());
        };
        debug!(pipeline = self.name, passes = self.passes.len(), "running pipeline");

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for pass in &self.passes {
                if !pass.matches(tool.ast.kind(node)) {
                    continue;
                }
                tool.prepare(node);
                trace!(pass = pass.name(), node = %node, "applying pass");
                pass.modify(node, tool).map_err(|error| error.located(&*tool.ast))?;
            }
            // Children are read after the passes ran, so desugared nodes are
            // walked in their new shape.
            stack.extend(tool.ast.children(node).into_iter().rev());
        }
        Ok(())
    }
}

/// Deprecation message carried by a `@deprecated` annotation of `node`.
pub(crate) fn deprecation_of(ast: &Ast, node: NodeId) -> Option<String> {
    ast.kind(node).annotations().iter().find_map(|&annotation| match ast.kind(annotation) {
        NodeKind::Annotation { name, args } if name == "deprecated" => Some(
            args.as_ref()
                .and_then(|args| args.first())
                .map(|message| message.trim_matches('"').to_string())
                .unwrap_or_default(),
        ),
        _ => None,
    })
}

/// Whether `name` is spelled as an operator rather than an identifier.
pub(crate) fn is_operator_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| !(c.is_alphanumeric() || c == '_'))
}
