//! The three pipelines of a compilation unit, in the order they run.

use super::deduct::*;
use super::describe::*;
use super::desugar::*;
use super::register::*;
use super::verify::*;
use super::Transformer;

/// Desugaring, structural checks and class/alias declaration.
pub fn preprocessor() -> Transformer {
    Transformer::new(
        "preprocessor",
        vec![
            Box::new(TransformShortCircuit),
            Box::new(TransformAssignmentExpression),
            Box::new(TransformCastExpression),
            Box::new(VerifyLValue),
            Box::new(TransformGlobalAssignment),
            Box::new(VerifyFunctionAccessScope),
            Box::new(VerifyAnnotationSignature),
            Box::new(VerifyInitializerFormat),
            Box::new(VerifyOperatorOverload),
            Box::new(DescribeTypeMockAnnotation),
            Box::new(DescribeClassDeclaration),
            Box::new(DescribePrimitiveAnnotation),
            Box::new(DescribeDeprecatedAnnotation),
            Box::new(DescribeTypeAlias),
        ],
    )
}

/// Function, initializer and field declaration.
pub fn registration() -> Transformer {
    Transformer::new(
        "registration",
        vec![
            Box::new(RegisterGenericParameters),
            Box::new(RegisterFunctionDeclaration),
            Box::new(RegisterInitializer),
            Box::new(RegisterFieldDeclaration),
            Box::new(VerifyInitializerDelegation),
        ],
    )
}

/// Statement-level type deduction.
pub fn deduction() -> Transformer {
    Transformer::new(
        "deduction",
        vec![
            Box::new(TypeDeductIfStatement),
            Box::new(TypeDeductWhileStatement),
            Box::new(TypeDeductDoWhileStatement),
            Box::new(TypeDeductExpression),
            Box::new(TypeDeductAssignment),
            Box::new(TypeDeductReturnStatement),
            Box::new(TypeDeductDefaultFunctionArguments),
            Box::new(TypeDeductInitDelegation),
            Box::new(VerifyOverride),
            Box::new(VerifyLValueBinding),
        ],
    )
}
