//! Constraint context threaded down through type resolvers.

use crate::context::TransformationContext;
use crate::item::ItemId;

/// A type an expression may take. `preferred` marks candidates that win
/// when the expression is simplified, such as the default primitive of a
/// literal family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCandidate {
    pub ty: ItemId,
    pub preferred: bool,
}

impl TypeCandidate {
    pub fn new(ty: ItemId, preferred: bool) -> Self {
        Self { ty, preferred }
    }

    pub fn plain(ty: ItemId) -> Self {
        Self::new(ty, false)
    }
}

/// Downward negotiation state of one resolution.
///
/// Constraints are values: a resolver narrows them for a child by building
/// a modified copy, and fields it does not touch pass through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Constraints<'a> {
    /// Type the parent expects, if any.
    pub requested_type: Option<ItemId>,
    /// Collapse several candidates to the preferred one.
    pub simplify_to_prec_type: bool,
    /// An empty candidate list is an error rather than a result.
    pub require_type: bool,
    /// The expression may produce no value.
    pub voidable: bool,
    /// Registered primitive families.
    pub transformation_context: &'a TransformationContext,
    /// Argument candidates of the call whose callee is being resolved.
    pub bounded_function: Option<&'a [Vec<TypeCandidate>]>,
}

impl<'a> Constraints<'a> {
    /// An unconstrained, speculative context.
    pub fn new(transformation_context: &'a TransformationContext) -> Self {
        Self {
            requested_type: None,
            simplify_to_prec_type: false,
            require_type: false,
            voidable: false,
            transformation_context,
            bounded_function: None,
        }
    }

    /// Context of a statement root: a single, possibly void, type.
    pub fn root(transformation_context: &'a TransformationContext) -> Self {
        Self {
            simplify_to_prec_type: true,
            require_type: true,
            voidable: true,
            ..Self::new(transformation_context)
        }
    }

    /// Context of a value that must resolve to exactly `ty`.
    pub fn expecting(transformation_context: &'a TransformationContext, ty: Option<ItemId>) -> Self {
        Self {
            requested_type: ty,
            simplify_to_prec_type: true,
            require_type: true,
            ..Self::new(transformation_context)
        }
    }

    pub fn requesting(self, requested_type: Option<ItemId>) -> Self {
        Self { requested_type, ..self }
    }

    pub fn simplify(self, simplify_to_prec_type: bool) -> Self {
        Self {
            simplify_to_prec_type,
            ..self
        }
    }

    pub fn require(self, require_type: bool) -> Self {
        Self { require_type, ..self }
    }

    pub fn voidable(self, voidable: bool) -> Self {
        Self { voidable, ..self }
    }

    pub fn bounded(self, bounded_function: Option<&'a [Vec<TypeCandidate>]>) -> Self {
        Self {
            bounded_function,
            ..self
        }
    }

    /// A value context: not voidable and not a callee.
    pub fn value(self) -> Self {
        self.voidable(false).bounded(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_keep_other_fields() {
        let context = TransformationContext::new();
        let root = Constraints::root(&context);
        let child = root.requesting(Some(ItemId(4))).voidable(false);

        assert_eq!(child.requested_type, Some(ItemId(4)));
        assert!(!child.voidable);
        assert!(child.simplify_to_prec_type);
        assert!(child.require_type);
        assert!(root.voidable);
        assert_eq!(root.requested_type, None);
    }
}
