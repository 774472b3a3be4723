//! The scope graph: arenas of scopes and items for one compilation unit.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::config::OverloadEquality;
use crate::context::TypeContext;
use crate::error::{TransformError, TypeResult};
use crate::item::{
    AliasItem, AliasKind, CloneOptions, ItemId, ItemKind, ItemQuery, PendingResolution, ScopeForm,
    ScopeItem, Specialization, TupleItem, TupleParameter, TypeItem,
};
use crate::scope::{Scope, ScopeId};

/// Performs deferred resolution of indefinite items.
///
/// The graph flips an item to definite before calling the driver, so a
/// driver that reaches the same item again sees it as already resolved.
pub trait ResolveItem {
    fn resolve_item(&mut self, graph: &mut ScopeGraph, item: ItemId, pending: PendingResolution) -> TypeResult<()>;
}

/// Name of the builtin type of expressions that produce no value.
pub const VOID: &str = "Void";

#[derive(Debug, Clone)]
pub struct ScopeGraph {
    scopes: Vec<Scope>,
    items: Vec<ScopeItem>,
    builtin: ScopeId,
    void: ItemId,
    overload_equality: OverloadEquality,
    tuples: FxHashMap<Vec<(SmolStr, ItemId)>, ItemId>,
    specializations: FxHashMap<(ItemId, Vec<ItemId>), ItemId>,
}

impl Default for ScopeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeGraph {
    /// A graph holding only the builtin scope with the `Void` type.
    pub fn new() -> Self {
        let mut graph = Self {
            scopes: Vec::new(),
            items: Vec::new(),
            builtin: ScopeId(0),
            void: ItemId(0),
            overload_equality: OverloadEquality::default(),
            tuples: FxHashMap::default(),
            specializations: FxHashMap::default(),
        };
        graph.builtin = graph.new_scope(None);
        let subscope = graph.new_scope(None);
        let static_scope = graph.new_scope(None);
        graph.scopes[static_scope.index()].is_static_context = true;

        let mut void = TypeItem::new(subscope, static_scope);
        void.implicit_initializer = false;
        void.mock_type = Some(SmolStr::new_inline("void"));
        let builtin = graph.builtin;
        if let Some(id) = graph.set(builtin, ScopeItem::definite(VOID, ItemKind::Type(void))) {
            graph.void = id;
            graph.scopes[subscope.index()].owner = Some(id);
            graph.scopes[static_scope.index()].owner = Some(id);
        }
        graph
    }

    pub fn with_overload_equality(mut self, mode: OverloadEquality) -> Self {
        self.overload_equality = mode;
        self
    }

    pub fn overload_equality(&self) -> OverloadEquality {
        self.overload_equality
    }

    /// Scope holding builtin items. Root code blocks use it as parent.
    pub fn builtin_scope(&self) -> ScopeId {
        self.builtin
    }

    pub fn void_type(&self) -> ItemId {
        self.void
    }

    // ========================================================================
    // Arenas
    // ========================================================================

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(parent));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn item(&self, id: ItemId) -> &ScopeItem {
        &self.items[id.index()]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut ScopeItem {
        &mut self.items[id.index()]
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Allocates an item that is not declared in any scope.
    pub fn alloc(&mut self, item: ScopeItem) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.items.push(item);
        id
    }

    // ========================================================================
    // Scope operations
    // ========================================================================

    /// Declares `item` in `scope`.
    ///
    /// Returns `None`, leaving the scope unchanged, when the name is taken by
    /// a non-overloadable item or by a function with an equal signature.
    pub fn set(&mut self, scope: ScopeId, mut item: ScopeItem) -> Option<ItemId> {
        let collides = self.scopes[scope.index()]
            .get_all(&item.root_id)
            .iter()
            .any(|&existing| {
                let existing = &self.items[existing.index()];
                match (&existing.kind, &item.kind) {
                    (ItemKind::Func(_), ItemKind::Func(_)) => self.items_equal(existing, &item),
                    _ => true,
                }
            });
        if collides {
            trace!(name = %item.root_id, scope = %scope, "declaration collides");
            return None;
        }

        item.owner = Some(scope);
        let name = item.root_id.clone();
        let id = self.alloc(item);
        self.scopes[scope.index()].insert(name, id);
        Some(id)
    }

    pub fn get_all(&self, scope: ScopeId, name: &str) -> &[ItemId] {
        self.scopes[scope.index()].get_all(name)
    }

    /// Nearest scope, walking parents from `scope`, that declares `name`.
    pub fn lookup_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id.index()].contains(name) {
                return Some(id);
            }
            current = self.scopes[id.index()].parent;
        }
        None
    }

    /// Overload set of the nearest declaration of `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> &[ItemId] {
        match self.lookup_scope(scope, name) {
            Some(found) => self.get_all(found, name),
            None => &[],
        }
    }

    /// Items matching `query` in the nearest scope that has any.
    pub fn query(&self, scope: ScopeId, query: &ItemQuery) -> Vec<ItemId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let found: Vec<ItemId> = self
                .get_all(id, &query.root_id)
                .iter()
                .copied()
                .filter(|&item| query.matches(self.item(item)))
                .collect();
            if !found.is_empty() {
                return found;
            }
            current = self.scopes[id.index()].parent;
        }
        Vec::new()
    }

    /// Functions of `scope` visible outside it.
    pub fn functions(&self, scope: ScopeId) -> Vec<ItemId> {
        self.scopes[scope.index()]
            .iter()
            .filter(|&id| {
                let item = self.item(id);
                matches!(item.kind, ItemKind::Func(_)) && !item.is_scope_restricted
            })
            .collect()
    }

    /// Whether `inner` is `outer` or lexically nested in it.
    pub fn is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.scopes[id.index()].parent;
        }
        false
    }

    /// Innermost type whose body encloses `scope`.
    pub fn enclosing_type(&self, scope: ScopeId) -> Option<ItemId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            if let Some(owner) = scope.owner {
                if matches!(self.item(owner).kind, ItemKind::Type(_)) {
                    return Some(owner);
                }
            }
            current = scope.parent;
        }
        None
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Runs pending resolution of `id` once. Later calls do nothing.
    pub fn resolve(&mut self, id: ItemId, driver: &mut dyn ResolveItem) -> TypeResult<()> {
        let form = std::mem::replace(&mut self.items[id.index()].form, ScopeForm::Definite);
        if let ScopeForm::Indefinite(pending) = form {
            trace!(item = %self.items[id.index()].root_id, "resolving pending item");
            driver.resolve_item(self, id, pending)?;
        }
        Ok(())
    }

    /// Resolves `id` and returns its canonical item, following type alias
    /// chains.
    pub fn resolved(&mut self, id: ItemId, driver: &mut dyn ResolveItem) -> TypeResult<ItemId> {
        let mut current = id;
        for _ in 0..=self.items.len() {
            self.resolve(current, driver)?;
            match &self.items[current.index()].kind {
                ItemKind::TypeAlias(alias) => match alias.target {
                    Some(target) => current = target,
                    None => return Err(self.circular_alias(id)),
                },
                _ => return Ok(current),
            }
        }
        Err(self.circular_alias(id))
    }

    fn circular_alias(&self, id: ItemId) -> TransformError {
        let item = self.item(id);
        TransformError::new(
            format!("type alias `{}` refers to itself", item.root_id),
            item.source,
            vsl_ast::Span::dummy(),
        )
    }

    /// Resolves every indefinite item, in declaration order.
    pub fn resolve_pending(&mut self, driver: &mut dyn ResolveItem) -> TypeResult<()> {
        for index in 0..self.items.len() {
            self.resolve(ItemId(index as u32), driver)?;
        }
        Ok(())
    }

    /// Follows already resolved type alias targets.
    pub fn canonical(&self, id: ItemId) -> ItemId {
        let mut current = id;
        for _ in 0..=self.items.len() {
            match &self.items[current.index()].kind {
                ItemKind::TypeAlias(alias) => match alias.target {
                    Some(target) => current = target,
                    None => return current,
                },
                _ => return current,
            }
        }
        current
    }

    // ========================================================================
    // Type relations
    // ========================================================================

    /// Whether a value of `from` can be used where `to` is expected.
    pub fn castable(&self, from: ItemId, to: ItemId) -> bool {
        let from = self.canonical(from);
        let to = self.canonical(to);
        if from == to {
            return true;
        }

        match (&self.item(from).kind, &self.item(to).kind) {
            (ItemKind::Tuple(_), ItemKind::Tuple(_)) => self.tuples_equal(from, to),
            (ItemKind::Type(_), ItemKind::Type(_)) => self.supertypes(from).contains(&to),
            _ => false,
        }
    }

    /// Superclasses and interfaces of `ty`, transitively, nearest first.
    pub fn supertypes(&self, ty: ItemId) -> Vec<ItemId> {
        let mut out: Vec<ItemId> = Vec::new();
        let mut stack = vec![self.canonical(ty)];
        while let Some(current) = stack.pop() {
            let Some(item) = self.item(current).as_type() else { continue };
            let mut parents: Vec<ItemId> = Vec::new();
            parents.extend(item.superclass);
            parents.extend(&item.interfaces);
            for parent in parents.into_iter().rev() {
                let parent = self.canonical(parent);
                if parent != ty && !out.contains(&parent) {
                    out.push(parent);
                    stack.push(parent);
                }
            }
        }
        out
    }

    /// Superclass chain of `ty`, starting with `ty` itself.
    pub fn class_chain(&self, ty: ItemId) -> Vec<ItemId> {
        let mut chain = vec![self.canonical(ty)];
        while let Some(next) = chain
            .last()
            .and_then(|&last| self.item(last).as_type())
            .and_then(|item| item.superclass)
        {
            let next = self.canonical(next);
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
        }
        chain
    }

    fn tuples_equal(&self, a: ItemId, b: ItemId) -> bool {
        let (Some(a), Some(b)) = (self.item(a).as_tuple(), self.item(b).as_tuple()) else {
            return false;
        };
        a.parameters.len() == b.parameters.len()
            && a
                .parameters
                .iter()
                .zip(&b.parameters)
                .all(|(x, y)| x.name == y.name && self.canonical(x.ty) == self.canonical(y.ty))
    }

    /// Signature equality used for collision checks. Functions compare by
    /// arity and argument cast-compatibility according to the configured
    /// [`OverloadEquality`]; tuples compare structurally; everything else
    /// compares by name and variant.
    pub fn items_equal(&self, existing: &ScopeItem, candidate: &ScopeItem) -> bool {
        if existing.root_id != candidate.root_id {
            return false;
        }
        match (&existing.kind, &candidate.kind) {
            (ItemKind::Func(a), ItemKind::Func(b)) => {
                if a.args.len() != b.args.len() {
                    return false;
                }
                let mut compatible = a.args.iter().zip(&b.args).map(|(a, b)| self.castable(b.ty, a.ty));
                match self.overload_equality {
                    OverloadEquality::AllArguments => compatible.all(|c| c),
                    OverloadEquality::AnyArgument => a.args.is_empty() || compatible.any(|c| c),
                }
            }
            (ItemKind::Tuple(a), ItemKind::Tuple(b)) => {
                a.parameters.len() == b.parameters.len()
                    && a
                        .parameters
                        .iter()
                        .zip(&b.parameters)
                        .all(|(x, y)| x.name == y.name && self.canonical(x.ty) == self.canonical(y.ty))
            }
            (a, b) => a.variant() == b.variant(),
        }
    }

    // ========================================================================
    // Interning
    // ========================================================================

    /// The tuple type with the given named parameters, created on first use.
    pub fn intern_tuple(&mut self, parameters: Vec<(SmolStr, ItemId)>) -> ItemId {
        let key: Vec<(SmolStr, ItemId)> = parameters
            .into_iter()
            .map(|(name, ty)| (name, self.canonical(ty)))
            .collect();
        if let Some(&existing) = self.tuples.get(&key) {
            return existing;
        }

        let name = format!(
            "({})",
            key.iter()
                .map(|(name, ty)| format!("{name}: {}", self.describe(*ty)))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let parameters = key
            .iter()
            .map(|(name, ty)| {
                let field = self.alloc(ScopeItem::definite(
                    name.clone(),
                    ItemKind::Alias(AliasItem {
                        ty: Some(*ty),
                        kind: AliasKind::TupleField,
                        ..AliasItem::default()
                    }),
                ));
                TupleParameter {
                    name: name.clone(),
                    ty: *ty,
                    field,
                }
            })
            .collect();
        let id = self.alloc(ScopeItem::definite(name, ItemKind::Tuple(TupleItem { parameters })));
        self.tuples.insert(key, id);
        id
    }

    /// The instance of generic `base` for `arguments`, created on first use.
    /// The caller checks arity.
    pub fn specialize(&mut self, base: ItemId, arguments: Vec<ItemId>) -> ItemId {
        let base = self.canonical(base);
        let arguments: Vec<ItemId> = arguments.into_iter().map(|ty| self.canonical(ty)).collect();
        let key = (base, arguments.clone());
        if let Some(&existing) = self.specializations.get(&key) {
            return existing;
        }

        let base_item = self.item(base);
        let parameters = base_item.as_type().map(|ty| ty.generic_parameters.clone()).unwrap_or_default();
        let context = TypeContext::from_pairs(parameters.into_iter().zip(arguments.iter().copied()));
        let name = format!(
            "{}<{}>",
            base_item.root_id,
            arguments.iter().map(|&ty| self.describe(ty)).collect::<Vec<_>>().join(", ")
        );
        let mut item = base_item.duplicate(CloneOptions {
            root_id: Some(name.into()),
            ..CloneOptions::default()
        });
        item.form = ScopeForm::Definite;
        item.owner = base_item.owner;
        if let Some(ty) = item.as_type_mut() {
            ty.generic_parameters.clear();
            ty.specialization = Some(Specialization {
                base,
                arguments,
                context,
            });
        }
        let id = self.alloc(item);
        self.specializations.insert(key, id);
        id
    }

    /// The substitution context of a generic instance.
    pub fn type_context(&self, ty: ItemId) -> Option<&TypeContext> {
        self.item(self.canonical(ty))
            .as_type()
            .and_then(|item| item.specialization.as_ref())
            .map(|spec| &spec.context)
    }

    /// `ty` with every generic parameter replaced through `context`.
    pub fn contextual_type(&mut self, ty: ItemId, context: &TypeContext) -> ItemId {
        let ty = self.canonical(ty);
        if context.is_empty() {
            return ty;
        }
        match &self.item(ty).kind {
            ItemKind::GenericParameter(_) => context.get(ty).unwrap_or(ty),
            ItemKind::Tuple(tuple) => {
                let parameters: Vec<(SmolStr, ItemId)> =
                    tuple.parameters.iter().map(|p| (p.name.clone(), p.ty)).collect();
                let parameters = parameters
                    .into_iter()
                    .map(|(name, param)| (name, self.contextual_type(param, context)))
                    .collect();
                self.intern_tuple(parameters)
            }
            ItemKind::Type(item) => match &item.specialization {
                Some(spec) => {
                    let base = spec.base;
                    let arguments = spec.arguments.clone();
                    let arguments = arguments
                        .into_iter()
                        .map(|argument| self.contextual_type(argument, context))
                        .collect();
                    self.specialize(base, arguments)
                }
                None => ty,
            },
            _ => ty,
        }
    }

    /// Substitutes `outer` into every value of `inner`.
    pub fn compose(&mut self, inner: &TypeContext, outer: &TypeContext) -> TypeContext {
        TypeContext::from_pairs(
            inner
                .iter()
                .map(|(param, ty)| (param, self.contextual_type(ty, outer)))
                .collect::<Vec<_>>(),
        )
    }

    // ========================================================================
    // Naming
    // ========================================================================

    /// Stable mangling name.
    pub fn unique_name(&self, id: ItemId) -> String {
        let item = self.item(id);
        let scoped = || match item.owner {
            Some(owner) => format!("{owner}N{}", item.root_id),
            None => format!("N{}", item.root_id),
        };
        match &item.kind {
            ItemKind::Func(_) => format!("{}.{}", scoped(), id),
            ItemKind::Tuple(tuple) => format!(
                "T.tuple.{}",
                tuple
                    .parameters
                    .iter()
                    .map(|param| self.unique_name(param.ty))
                    .collect::<Vec<_>>()
                    .join(".")
            ),
            ItemKind::Type(TypeItem {
                specialization: Some(spec),
                ..
            }) => format!(
                "{}<{}>",
                self.unique_name(spec.base),
                spec.arguments
                    .iter()
                    .map(|&arg| self.unique_name(arg))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            ItemKind::TypeAlias(alias) => match alias.target {
                Some(target) => self.unique_name(target),
                None => scoped(),
            },
            _ => scoped(),
        }
    }

    /// Human readable description used in diagnostics.
    pub fn describe(&self, id: ItemId) -> String {
        let item = self.item(id);
        match &item.kind {
            ItemKind::Func(func) => {
                let args = func
                    .args
                    .iter()
                    .map(|arg| format!("{}: {}", arg.external_name, self.describe(arg.ty)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let name = if func.is_initializer() { "init" } else { item.root_id.as_str() };
                match func.return_type {
                    Some(ret) => format!("func {name}({args}) -> {}", self.describe(ret)),
                    None => format!("func {name}({args})"),
                }
            }
            ItemKind::TypeAlias(alias) => match alias.target {
                Some(target) => format!("{} -> {}", item.root_id, self.describe(target)),
                None => item.root_id.to_string(),
            },
            _ => item.root_id.to_string(),
        }
    }

    /// Describes a candidate set as `A | B`.
    pub fn describe_all(&self, ids: impl IntoIterator<Item = ItemId>) -> String {
        ids.into_iter().map(|id| self.describe(id)).collect::<Vec<_>>().join(" | ")
    }
}
