//! Semantic side table attached to AST nodes.

use rustc_hash::FxHashMap;
use vsl_ast::NodeId;

use crate::context::TypeContext;
use crate::item::ItemId;
use crate::scope::ScopeId;

/// Facts recorded for one node. Resolvers only write here once a
/// resolution is final.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAnnotation {
    /// Item an expression refers to: variable, overload, literal type.
    pub reference: Option<ItemId>,
    /// Resolved type of an expression or declaration.
    pub ty: Option<ItemId>,
    /// Scope opened by a code block.
    pub scope_ref: Option<ScopeId>,
    /// Item declared by a declaration node.
    pub alias_ref: Option<ItemId>,
    /// Substitution context propagated upward from a generic member use.
    pub type_context: Option<TypeContext>,
    /// Declaration at the top level of the unit.
    pub is_global: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Annotations {
    nodes: FxHashMap<NodeId, NodeAnnotation>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeAnnotation> {
        self.nodes.get(&node)
    }

    pub fn entry(&mut self, node: NodeId) -> &mut NodeAnnotation {
        self.nodes.entry(node).or_default()
    }

    pub fn reference(&self, node: NodeId) -> Option<ItemId> {
        self.get(node).and_then(|a| a.reference)
    }

    pub fn ty(&self, node: NodeId) -> Option<ItemId> {
        self.get(node).and_then(|a| a.ty)
    }

    pub fn scope(&self, node: NodeId) -> Option<ScopeId> {
        self.get(node).and_then(|a| a.scope_ref)
    }

    pub fn declared(&self, node: NodeId) -> Option<ItemId> {
        self.get(node).and_then(|a| a.alias_ref)
    }

    pub fn type_context(&self, node: NodeId) -> Option<&TypeContext> {
        self.get(node).and_then(|a| a.type_context.as_ref())
    }

    pub fn is_global(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|a| a.is_global)
    }

    pub fn set_reference(&mut self, node: NodeId, item: ItemId) {
        self.entry(node).reference = Some(item);
    }

    pub fn set_type(&mut self, node: NodeId, ty: ItemId) {
        self.entry(node).ty = Some(ty);
    }

    pub fn set_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.entry(node).scope_ref = Some(scope);
    }

    pub fn set_declared(&mut self, node: NodeId, item: ItemId) {
        self.entry(node).alias_ref = Some(item);
    }

    pub fn set_type_context(&mut self, node: NodeId, context: TypeContext) {
        self.entry(node).type_context = Some(context);
    }

    pub fn set_global(&mut self, node: NodeId) {
        self.entry(node).is_global = true;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_share_one_entry() {
        let mut annotations = Annotations::new();
        annotations.set_reference(NodeId(2), ItemId(7));
        annotations.set_type(NodeId(2), ItemId(3));
        annotations.set_global(NodeId(5));

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations.reference(NodeId(2)), Some(ItemId(7)));
        assert_eq!(annotations.ty(NodeId(2)), Some(ItemId(3)));
        assert!(annotations.is_global(NodeId(5)));
        assert!(!annotations.is_global(NodeId(2)));
        assert_eq!(annotations.scope(NodeId(9)), None);
    }
}
