//! Generic substitution contexts and the registered primitive families.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use vsl_ast::LiteralKind;

use crate::item::ItemId;

/// Maps generic parameters to the types substituted for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeContext {
    substitutions: IndexMap<ItemId, ItemId>,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (ItemId, ItemId)>) -> Self {
        Self {
            substitutions: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, parameter: ItemId, ty: ItemId) {
        self.substitutions.insert(parameter, ty);
    }

    pub fn get(&self, parameter: ItemId) -> Option<ItemId> {
        self.substitutions.get(&parameter).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, ItemId)> + '_ {
        self.substitutions.iter().map(|(param, ty)| (*param, *ty))
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// Classes registered for one literal family through `@primitive`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveFamily {
    pub types: Vec<ItemId>,
    /// The preferred type, when one was marked `default`.
    pub default: Option<ItemId>,
}

/// State shared by every pass of one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct TransformationContext {
    primitives: FxHashMap<LiteralKind, PrimitiveFamily>,
}

impl TransformationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `ty` to a literal family. Registering the same type twice only
    /// updates the default marker.
    pub fn register_primitive(&mut self, kind: LiteralKind, ty: ItemId, is_default: bool) {
        let family = self.primitives.entry(kind).or_default();
        if !family.types.contains(&ty) {
            family.types.push(ty);
        }
        if is_default {
            family.default = Some(ty);
        }
    }

    pub fn primitives(&self, kind: LiteralKind) -> Option<&PrimitiveFamily> {
        self.primitives.get(&kind)
    }

    pub fn default_primitive(&self, kind: LiteralKind) -> Option<ItemId> {
        self.primitives.get(&kind).and_then(|family| family.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_primitive() {
        let mut context = TransformationContext::new();
        context.register_primitive(LiteralKind::Integer, ItemId(3), false);
        context.register_primitive(LiteralKind::Integer, ItemId(4), true);
        context.register_primitive(LiteralKind::Integer, ItemId(3), false);

        let family = context.primitives(LiteralKind::Integer).unwrap();
        assert_eq!(family.types, vec![ItemId(3), ItemId(4)]);
        assert_eq!(family.default, Some(ItemId(4)));
        assert_eq!(context.default_primitive(LiteralKind::String), None);
    }

    #[test]
    fn test_type_context_keeps_order() {
        let context = TypeContext::from_pairs([(ItemId(7), ItemId(1)), (ItemId(5), ItemId(2))]);
        assert_eq!(context.iter().collect::<Vec<_>>(), vec![(ItemId(7), ItemId(1)), (ItemId(5), ItemId(2))]);
        assert_eq!(context.get(ItemId(5)), Some(ItemId(2)));
        assert_eq!(context.get(ItemId(1)), None);
    }
}
