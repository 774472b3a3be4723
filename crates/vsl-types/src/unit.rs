//! A compilation unit: one tree and everything semantic analysis learns
//! about it.

use tracing::{debug, instrument};
use vsl_ast::{Ast, NodeId, NodeKind};
use vsl_diagnostics::Diagnostic;

use crate::annotations::Annotations;
use crate::config::SemaConfig;
use crate::context::TransformationContext;
use crate::error::{TransformError, TypeResult, Warning};
use crate::graph::ScopeGraph;
use crate::item::ItemId;
use crate::resolver::ResolveCx;
use crate::scope::ScopeId;
use crate::transform::{self, AstTool, Transformer};
use crate::type_lookup::TypeLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fresh,
    Preprocessed,
    Analyzed,
}

/// Owns the tree, the scope graph and the per-node annotations.
///
/// ```
/// use vsl_ast::{AstBuilder, ClassDecl};
/// use vsl_types::CompilationUnit;
///
/// let mut b = AstBuilder::new();
/// let class = b.class(ClassDecl::new("Point"));
/// let mut unit = CompilationUnit::new(b.program([class]));
/// unit.analyze().unwrap();
/// assert!(unit.annotations().declared(class).is_some());
/// ```
pub struct CompilationUnit {
    ast: Ast,
    graph: ScopeGraph,
    annotations: Annotations,
    context: TransformationContext,
    config: SemaConfig,
    warnings: Vec<Warning>,
    stage: Stage,
}

impl CompilationUnit {
    pub fn new(ast: Ast) -> Self {
        Self::with_config(ast, SemaConfig::default())
    }

    pub fn with_config(ast: Ast, config: SemaConfig) -> Self {
        Self {
            ast,
            graph: ScopeGraph::new().with_overload_equality(config.overload_equality),
            annotations: Annotations::new(),
            context: TransformationContext::new(),
            config,
            warnings: Vec::new(),
            stage: Stage::Fresh,
        }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn graph(&self) -> &ScopeGraph {
        &self.graph
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn context(&self) -> &TransformationContext {
        &self.context
    }

    pub fn config(&self) -> &SemaConfig {
        &self.config
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Scope of the top-level block, once scopes are built.
    pub fn root_scope(&self) -> Option<ScopeId> {
        self.ast.root().and_then(|root| self.annotations.scope(root))
    }

    /// A resolver over this unit, for expressions typed outside the
    /// pipelines such as editor queries.
    pub fn resolver(&mut self) -> (ResolveCx<'_>, &TransformationContext) {
        (
            ResolveCx::new(
                &self.ast,
                &mut self.graph,
                &mut self.annotations,
                &mut self.warnings,
                &self.config,
            ),
            &self.context,
        )
    }

    /// Resolved type of an expression or declaration.
    pub fn type_of(&self, node: NodeId) -> Option<ItemId> {
        self.annotations.ty(node)
    }

    /// Display name of the resolved type of `node`.
    pub fn type_name_of(&self, node: NodeId) -> Option<String> {
        self.type_of(node).map(|ty| self.graph.describe(ty))
    }

    /// Mangled name of the item `node` refers to, for the backend.
    pub fn unique_name_of(&self, node: NodeId) -> Option<String> {
        self.annotations.reference(node).map(|item| self.graph.unique_name(item))
    }

    /// Collected warnings as diagnostics.
    pub fn warning_diagnostics(&self, source_name: &str) -> Vec<Diagnostic> {
        self.warnings.iter().map(|warning| warning.to_diagnostic(source_name)).collect()
    }

    /// Runs every pipeline. Stops at the first error.
    #[instrument(skip_all)]
    pub fn analyze(&mut self) -> TypeResult<()> {
        match self.stage {
            Stage::Fresh => self.preprocess()?,
            Stage::Preprocessed => {}
            Stage::Analyzed => return Err(TransformError::internal("compilation unit was already analyzed")),
        }
        self.run(&transform::registration())?;
        self.run(&transform::deduction())?;
        self.stage = Stage::Analyzed;
        debug!(
            items = self.graph.item_count(),
            warnings = self.warnings.len(),
            "analysis finished"
        );
        Ok(())
    }

    /// Builds scopes, desugars and declares classes and type aliases, then
    /// resolves their heritage and targets.
    pub fn preprocess(&mut self) -> TypeResult<()> {
        if self.stage != Stage::Fresh {
            return Err(TransformError::internal("compilation unit was already preprocessed"));
        }
        self.build_scopes();
        self.run(&transform::preprocessor())?;
        let mut lookup = TypeLookup::new(&self.ast);
        self.graph
            .resolve_pending(&mut lookup)
            .map_err(|error| error.located(&self.ast))?;
        self.stage = Stage::Preprocessed;
        Ok(())
    }

    /// Gives every code block its own scope, nested like the blocks.
    fn build_scopes(&mut self) {
        let Some(root) = self.ast.root() else {
            return;
        };
        let mut stack = vec![(root, self.graph.builtin_scope())];
        while let Some((node, parent)) = stack.pop() {
            let scope = match self.ast.kind(node) {
                NodeKind::CodeBlock { .. } => {
                    let scope = self.graph.new_scope(Some(parent));
                    self.annotations.set_scope(node, scope);
                    scope
                }
                _ => parent,
            };
            stack.extend(self.ast.children(node).into_iter().rev().map(|child| (child, scope)));
        }
    }

    fn run(&mut self, transformer: &Transformer) -> TypeResult<()> {
        let mut tool = AstTool::new(
            &mut self.ast,
            &mut self.graph,
            &mut self.annotations,
            &mut self.context,
            &self.config,
            &mut self.warnings,
        );
        transformer.run(&mut tool)
    }
}
