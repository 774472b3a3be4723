//! Scope items: every nameable declared entity.
//!
//! Items live in the [`ScopeGraph`](crate::ScopeGraph) arena and are
//! addressed by [`ItemId`]. The id doubles as the mangling counter, so ids
//! are unique and increase in declaration order.

use std::fmt;

use smol_str::SmolStr;
use vsl_ast::{Access, NodeId};

use crate::context::TypeContext;
use crate::scope::ScopeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work deferred until an item is first resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingResolution {
    /// Resolve the heritage list of the class declared at `node`, looking
    /// names up from `scope`.
    ClassHeritage { scope: ScopeId, node: NodeId },
    /// Resolve the target type expression `node` of a type alias.
    TypeAliasTarget { scope: ScopeId, node: NodeId },
}

/// Resolution state of an allocated item.
///
/// Probes used for lookups are a separate type ([`ItemQuery`]), so a query
/// can never end up inside a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeForm {
    Indefinite(PendingResolution),
    Definite,
}

impl ScopeForm {
    pub fn is_definite(&self) -> bool {
        matches!(self, ScopeForm::Definite)
    }
}

// ============================================================================
// Variant payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncArgument {
    /// Label used at call sites. Defaults to `name`.
    pub external_name: SmolStr,
    pub name: SmolStr,
    pub ty: ItemId,
    pub optional: bool,
    pub source: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncItem {
    pub args: Vec<FuncArgument>,
    /// `None` for functions returning `Void`.
    pub return_type: Option<ItemId>,
    pub access: Access,
    pub is_static: bool,
    /// Set once a backend has emitted the function.
    pub generated: bool,
    /// Body scope, absent for interface requirements and native functions.
    pub subscope: Option<ScopeId>,
    /// For initializers: the type being initialized.
    pub initializing_type: Option<ItemId>,
    /// For initializers: the superclass initializer is called implicitly.
    pub implicit_superclass_call: bool,
}

impl FuncItem {
    pub fn is_initializer(&self) -> bool {
        self.initializing_type.is_some()
    }

    /// Number of arguments without a default value.
    pub fn required_arity(&self) -> usize {
        self.args.iter().filter(|arg| !arg.optional).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasKind {
    #[default]
    Variable,
    Argument,
    Field,
    TupleField,
}

/// A value binding: variable, argument or field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasItem {
    pub ty: Option<ItemId>,
    pub kind: AliasKind,
    pub access: Access,
    /// The value is captured by a closure or returned.
    pub escapes_scope: bool,
    pub is_static: bool,
    /// Declared with `const`.
    pub is_constant: bool,
}

/// How a generic instance was produced from its base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialization {
    pub base: ItemId,
    pub arguments: Vec<ItemId>,
    pub context: TypeContext,
}

/// A class or interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeItem {
    /// Instance members.
    pub subscope: ScopeId,
    /// Static members and operator overloads.
    pub static_scope: ScopeId,
    pub is_interface: bool,
    pub mock_type: Option<SmolStr>,
    pub generic_parameters: Vec<ItemId>,
    pub superclass: Option<ItemId>,
    pub interfaces: Vec<ItemId>,
    /// The class declares no initializer, so a zero-argument one exists.
    pub implicit_initializer: bool,
    pub specialization: Option<Specialization>,
}

impl TypeItem {
    pub fn new(subscope: ScopeId, static_scope: ScopeId) -> Self {
        Self {
            subscope,
            static_scope,
            is_interface: false,
            mock_type: None,
            generic_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            implicit_initializer: true,
            specialization: None,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleParameter {
    pub name: SmolStr,
    pub ty: ItemId,
    /// Field alias used as the reference of `tuple.name`.
    pub field: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TupleItem {
    pub parameters: Vec<TupleParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeAliasItem {
    /// Set once the target expression is resolved.
    pub target: Option<ItemId>,
}

/// Placeholder for a class's generic parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenericParameterItem {
    pub declaring_type: Option<ItemId>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Func(FuncItem),
    Alias(AliasItem),
    Type(TypeItem),
    Tuple(TupleItem),
    TypeAlias(TypeAliasItem),
    GenericParameter(GenericParameterItem),
}

impl ItemKind {
    pub fn variant(&self) -> ItemVariant {
        match self {
            ItemKind::Func(_) => ItemVariant::Func,
            ItemKind::Alias(_) => ItemVariant::Alias,
            ItemKind::Type(_) => ItemVariant::Type,
            ItemKind::Tuple(_) => ItemVariant::Tuple,
            ItemKind::TypeAlias(_) => ItemVariant::TypeAlias,
            ItemKind::GenericParameter(_) => ItemVariant::GenericParameter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemVariant {
    Func,
    Alias,
    Type,
    Tuple,
    TypeAlias,
    GenericParameter,
}

impl ItemVariant {
    /// Items that can stand where a type is expected.
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            ItemVariant::Type | ItemVariant::Tuple | ItemVariant::TypeAlias | ItemVariant::GenericParameter
        )
    }
}

// ============================================================================
// Scope item
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeItem {
    pub form: ScopeForm,
    /// Declared name.
    pub root_id: SmolStr,
    /// Declaring scope, set when the item is inserted.
    pub owner: Option<ScopeId>,
    /// Nodes referring to this item.
    pub references: Vec<NodeId>,
    /// Present when the item is `@deprecated`.
    pub deprecation_status: Option<String>,
    /// Visible only inside the immediately enclosing scope.
    pub is_scope_restricted: bool,
    /// Declaring node.
    pub source: Option<NodeId>,
    pub kind: ItemKind,
}

/// Overrides for [`ScopeItem::duplicate`].
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    pub root_id: Option<SmolStr>,
    pub is_scope_restricted: Option<bool>,
    pub source: Option<NodeId>,
}

impl ScopeItem {
    pub fn definite(root_id: impl Into<SmolStr>, kind: ItemKind) -> Self {
        Self {
            form: ScopeForm::Definite,
            root_id: root_id.into(),
            owner: None,
            references: Vec::new(),
            deprecation_status: None,
            is_scope_restricted: false,
            source: None,
            kind,
        }
    }

    pub fn indefinite(root_id: impl Into<SmolStr>, kind: ItemKind, pending: PendingResolution) -> Self {
        Self {
            form: ScopeForm::Indefinite(pending),
            ..Self::definite(root_id, kind)
        }
    }

    pub fn with_source(mut self, source: NodeId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn restricted(mut self, is_scope_restricted: bool) -> Self {
        self.is_scope_restricted = is_scope_restricted;
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation_status.is_some()
    }

    pub fn variant(&self) -> ItemVariant {
        self.kind.variant()
    }

    /// A new unplaced item of the same variant. Pending resolution and scope
    /// restriction carry over unless overridden; references do not.
    pub fn duplicate(&self, opts: CloneOptions) -> ScopeItem {
        ScopeItem {
            form: self.form.clone(),
            root_id: opts.root_id.unwrap_or_else(|| self.root_id.clone()),
            owner: None,
            references: Vec::new(),
            deprecation_status: self.deprecation_status.clone(),
            is_scope_restricted: opts.is_scope_restricted.unwrap_or(self.is_scope_restricted),
            source: opts.source.or(self.source),
            kind: self.kind.clone(),
        }
    }

    /// A payload-free probe of the same variant and name.
    pub fn get_query(&self) -> ItemQuery {
        ItemQuery::new(self.variant(), self.root_id.clone())
    }

    pub fn type_description(&self) -> &'static str {
        match &self.kind {
            ItemKind::Func(func) if func.is_initializer() => "initializer",
            ItemKind::Func(_) => "function",
            ItemKind::Alias(alias) if alias.kind == AliasKind::Field => "field",
            ItemKind::Alias(alias) if alias.kind == AliasKind::Argument => "argument",
            ItemKind::Alias(_) => "variable",
            ItemKind::Type(ty) if ty.is_interface => "interface",
            ItemKind::Type(_) => "class",
            ItemKind::Tuple(_) => "tuple",
            ItemKind::TypeAlias(_) => "type alias",
            ItemKind::GenericParameter(_) => "generic parameter",
        }
    }

    pub fn as_func(&self) -> Option<&FuncItem> {
        match &self.kind {
            ItemKind::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_func_mut(&mut self) -> Option<&mut FuncItem> {
        match &mut self.kind {
            ItemKind::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasItem> {
        match &self.kind {
            ItemKind::Alias(alias) => Some(alias),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeItem> {
        match &self.kind {
            ItemKind::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_type_mut(&mut self) -> Option<&mut TypeItem> {
        match &mut self.kind {
            ItemKind::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleItem> {
        match &self.kind {
            ItemKind::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }
}

/// Lookup probe: a variant and a name, no payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemQuery {
    pub variant: ItemVariant,
    pub root_id: SmolStr,
}

impl ItemQuery {
    pub fn new(variant: ItemVariant, root_id: impl Into<SmolStr>) -> Self {
        Self {
            variant,
            root_id: root_id.into(),
        }
    }

    pub fn matches(&self, item: &ScopeItem) -> bool {
        item.variant() == self.variant && item.root_id == self.root_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(args: usize) -> ScopeItem {
        let args = (0..args)
            .map(|i| FuncArgument {
                external_name: format!("a{i}").into(),
                name: format!("a{i}").into(),
                ty: ItemId(0),
                optional: i > 0,
                source: None,
            })
            .collect();
        ScopeItem::definite(
            "f",
            ItemKind::Func(FuncItem {
                args,
                ..FuncItem::default()
            }),
        )
    }

    #[test]
    fn test_query_has_variant_and_name() {
        let item = func(1);
        let query = item.get_query();
        assert_eq!(query.variant, ItemVariant::Func);
        assert_eq!(query.root_id, "f");
        assert!(query.matches(&item));
        assert!(!ItemQuery::new(ItemVariant::Alias, "f").matches(&item));
    }

    #[test]
    fn test_duplicate_carries_pending_and_restriction() {
        let pending = PendingResolution::TypeAliasTarget {
            scope: ScopeId(1),
            node: NodeId(4),
        };
        let mut item = ScopeItem::indefinite("X", ItemKind::TypeAlias(TypeAliasItem::default()), pending.clone())
            .restricted(true);
        item.references.push(NodeId(9));

        let copy = item.duplicate(CloneOptions::default());
        assert_eq!(copy.form, ScopeForm::Indefinite(pending));
        assert!(copy.is_scope_restricted);
        assert!(copy.references.is_empty());

        let public = item.duplicate(CloneOptions {
            is_scope_restricted: Some(false),
            ..CloneOptions::default()
        });
        assert!(!public.is_scope_restricted);
    }

    #[test]
    fn test_required_arity() {
        let item = func(3);
        assert_eq!(item.as_func().map(FuncItem::required_arity), Some(1));
        assert_eq!(item.type_description(), "function");
    }
}
