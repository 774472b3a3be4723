//! Integration tests for declarations: classes, functions, variables and
//! the checks the pipelines run on them.

use vsl_ast::{Access, AstBuilder, ClassDecl, FunctionDecl, NodeId};
use vsl_types::{CompilationUnit, ErrorKind, SemaConfig, WarningKind};

fn int_class(b: &mut AstBuilder) -> NodeId {
    let primitive = b.annotation("primitive", Some(&["Integer", "default"]));
    b.class(ClassDecl::new("Int").annotated(primitive))
}

/// `func name(a: Int, b: <second>)`
fn binary_function(b: &mut AstBuilder, name: &str, second: &str) -> NodeId {
    let first_ty = b.type_name("Int");
    let first = b.argument("a", first_ty);
    let second_ty = b.type_name(second);
    let second = b.argument("b", second_ty);
    b.function(FunctionDecl::new(name).arg(first).arg(second))
}

// ============================================================================
// Classes
// ============================================================================

mod classes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_class() {
        let mut b = AstBuilder::new();
        let first = b.class(ClassDecl::new("Foo"));
        let second = b.class(ClassDecl::new("Foo"));
        b.at(second, 20..23);

        let mut unit = CompilationUnit::new(b.program([first, second]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::DuplicateDeclaration));
        assert_eq!(error.message, "Duplicate declaration of class `Foo`");
        assert_eq!(error.node, Some(second));

        let diagnostic = error.to_diagnostic("main.vsl");
        assert_eq!(diagnostic.code.as_deref(), Some("E0001"));
        let primary = diagnostic.spans.primary_span().unwrap();
        assert_eq!((primary.start, primary.end), (20, 23));
    }

    #[test]
    fn test_function_refers_to_later_class() {
        let mut b = AstBuilder::new();
        let ret = b.type_name("Point");
        let make = b.function(FunctionDecl::new("make").returns(ret));
        let point = b.class(ClassDecl::new("Point"));

        let mut unit = CompilationUnit::new(b.program([make, point]));
        unit.analyze().unwrap();
        let func = unit.annotations().declared(make).unwrap();
        let return_type = unit.graph().item(func).as_func().and_then(|f| f.return_type);
        assert_eq!(return_type, unit.annotations().declared(point));
    }

    #[test]
    fn test_superclass_declared_later() {
        let mut b = AstBuilder::new();
        let base = b.type_name("Shape");
        let circle = b.class(ClassDecl::new("Circle").inherits(base));
        let shape = b.class(ClassDecl::new("Shape"));

        let mut unit = CompilationUnit::new(b.program([circle, shape]));
        unit.analyze().unwrap();
        let circle_ty = unit.annotations().declared(circle).unwrap();
        let shape_ty = unit.annotations().declared(shape).unwrap();
        assert!(unit.graph().castable(circle_ty, shape_ty));
        assert!(!unit.graph().castable(shape_ty, circle_ty));
    }

    #[test]
    fn test_type_alias_before_target() {
        let mut b = AstBuilder::new();
        let target = b.type_name("Int");
        let alias = b.type_alias("Number", target);
        let ret = b.type_name("Number");
        let make = b.function(FunctionDecl::new("make").returns(ret));
        let int = int_class(&mut b);

        let mut unit = CompilationUnit::new(b.program([alias, make, int]));
        unit.analyze().unwrap();
        let func = unit.annotations().declared(make).unwrap();
        let return_type = unit.graph().item(func).as_func().and_then(|f| f.return_type).unwrap();
        let int_ty = unit.annotations().declared(int).unwrap();
        assert!(unit.graph().castable(return_type, int_ty));
    }

    #[test]
    fn test_unknown_annotation() {
        let mut b = AstBuilder::new();
        let shiny = b.annotation("shiny", None);
        let class = b.class(ClassDecl::new("Foo").annotated(shiny));

        let mut unit = CompilationUnit::new(b.program([class]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::UnknownAnnotationReference));
        assert_eq!(error.fixits.len(), 2);
    }
}

// ============================================================================
// Heritage
// ============================================================================

mod heritage {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A class named `name` inheriting from `parents`, in order.
    fn class(b: &mut AstBuilder, decl: ClassDecl, parents: &[&str]) -> NodeId {
        let mut decl = decl;
        for parent in parents {
            let ty = b.type_name(*parent);
            decl = decl.inherits(ty);
        }
        b.class(decl)
    }

    fn analyze_error(b: AstBuilder, statements: Vec<NodeId>) -> vsl_types::TransformError {
        let mut unit = CompilationUnit::new(b.program(statements));
        unit.analyze().unwrap_err()
    }

    #[test]
    fn test_two_superclasses() {
        let mut b = AstBuilder::new();
        let a = class(&mut b, ClassDecl::new("A"), &[]);
        let c = class(&mut b, ClassDecl::new("B"), &[]);
        let derived = class(&mut b, ClassDecl::new("C"), &["A", "B"]);

        let error = analyze_error(b, vec![a, c, derived]);
        assert_eq!(error.kind, Some(ErrorKind::CannotMultipleInherit));
        assert_eq!(error.message, "`C` cannot inherit from more than one class");
    }

    #[test]
    fn test_superclass_after_interface() {
        let mut b = AstBuilder::new();
        let shape = class(&mut b, ClassDecl::interface("Shape"), &[]);
        let base = class(&mut b, ClassDecl::new("Base"), &[]);
        let derived = class(&mut b, ClassDecl::new("Square"), &["Shape", "Base"]);

        let error = analyze_error(b, vec![shape, base, derived]);
        assert_eq!(error.kind, Some(ErrorKind::SuperclassShouldBeFirstParam));
    }

    #[test]
    fn test_interfaces_after_superclass() {
        let mut b = AstBuilder::new();
        let shape = class(&mut b, ClassDecl::interface("Shape"), &[]);
        let base = class(&mut b, ClassDecl::new("Base"), &[]);
        let derived = class(&mut b, ClassDecl::new("Square"), &["Base", "Shape"]);

        let mut unit = CompilationUnit::new(b.program([shape, base, derived]));
        unit.analyze().unwrap();
        let square = unit.annotations().declared(derived).unwrap();
        let shape_ty = unit.annotations().declared(shape).unwrap();
        let base_ty = unit.annotations().declared(base).unwrap();
        let class = unit.graph().item(square).as_type().unwrap();
        assert_eq!(class.superclass, Some(base_ty));
        assert_eq!(class.interfaces, vec![shape_ty]);
        assert!(unit.graph().castable(square, shape_ty));
    }

    #[test]
    fn test_interface_inheriting_class() {
        let mut b = AstBuilder::new();
        let base = class(&mut b, ClassDecl::new("Base"), &[]);
        let shape = class(&mut b, ClassDecl::interface("Shape"), &["Base"]);

        let error = analyze_error(b, vec![base, shape]);
        assert_eq!(error.kind, Some(ErrorKind::InterfaceCannotInheritClass));
        assert_eq!(error.message, "Interface `Shape` cannot inherit from class `Base`");
    }

    #[test]
    fn test_circular_inheritance() {
        let mut b = AstBuilder::new();
        let a = class(&mut b, ClassDecl::new("A"), &["B"]);
        let c = class(&mut b, ClassDecl::new("B"), &["A"]);

        let error = analyze_error(b, vec![a, c]);
        assert_eq!(error.kind, Some(ErrorKind::CannotSubclassType));
        assert!(error.message.starts_with("Circular inheritance"), "{}", error.message);
    }
}

// ============================================================================
// Functions
// ============================================================================

mod functions {
    use super::*;
    use pretty_assertions::assert_eq;

    fn overloads(config: SemaConfig) -> Result<CompilationUnit, vsl_types::TransformError> {
        let mut b = AstBuilder::new();
        let int = int_class(&mut b);
        let float = b.class(ClassDecl::new("Float"));
        let ints = binary_function(&mut b, "f", "Int");
        let mixed = binary_function(&mut b, "f", "Float");

        let mut unit = CompilationUnit::with_config(b.program([int, float, ints, mixed]), config);
        unit.analyze()?;
        Ok(unit)
    }

    #[test]
    fn test_overloads_differing_in_one_argument() {
        let unit = overloads(SemaConfig::default()).unwrap();
        let root = unit.root_scope().unwrap();
        assert_eq!(unit.graph().get_all(root, "f").len(), 2);
    }

    #[test]
    fn test_legacy_overload_collision() {
        let error = overloads(SemaConfig::legacy()).err().unwrap();
        assert_eq!(error.kind, Some(ErrorKind::DuplicateDeclaration));
        assert_eq!(error.message, "Redeclaration of function `f`");
    }

    #[test]
    fn test_protected_function_warns() {
        let mut b = AstBuilder::new();
        let helper = b.function(FunctionDecl::new("helper").access(Access::Protected));

        let mut unit = CompilationUnit::new(b.program([helper]));
        unit.analyze().unwrap();
        let kinds: Vec<WarningKind> = unit.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::ProtectedAccess]);
        let diagnostics = unit.warning_diagnostics("main.vsl");
        assert_eq!(diagnostics[0].code.as_deref(), Some("W0002"));
    }

    #[test]
    fn test_strict_config_fails_on_warning() {
        let mut b = AstBuilder::new();
        let helper = b.function(FunctionDecl::new("helper").access(Access::Protected));

        let mut unit = CompilationUnit::with_config(b.program([helper]), SemaConfig::strict());
        assert!(unit.analyze().is_err());
        assert!(unit.warnings().is_empty());
    }

    #[test]
    fn test_private_function_outside_class() {
        let mut b = AstBuilder::new();
        let helper = b.function(FunctionDecl::new("helper").access(Access::Private));

        let mut unit = CompilationUnit::new(b.program([helper]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::InvalidAccess));
    }

    #[test]
    fn test_deprecated_call_warns() {
        let mut b = AstBuilder::new();
        let deprecated = b.annotation("deprecated", Some(&["\"use fresh\""]));
        let old = b.function(FunctionDecl::new("old").annotated(deprecated));
        let head = b.ident("old");
        let call = b.call(head, Vec::<NodeId>::new());
        let statement = b.expr_stmt(call);
        let main = b.function(FunctionDecl::new("main").body([statement]));

        let mut unit = CompilationUnit::new(b.program([old, main]));
        unit.analyze().unwrap();
        let warnings = unit.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::Deprecated);
        assert_eq!(warnings[0].message, "`old` is deprecated: use fresh");
        let func = unit.annotations().declared(old).unwrap();
        assert_eq!(unit.annotations().reference(call), Some(func));
        assert!(unit.graph().item(func).references.contains(&call));
    }

    #[test]
    fn test_return_value_checked_against_signature() {
        let mut b = AstBuilder::new();
        let int = int_class(&mut b);
        let one = b.int(1);
        let ret = b.ret(Some(one));
        let nothing = b.function(FunctionDecl::new("nothing").body([ret]));

        let mut unit = CompilationUnit::new(b.program([int, nothing]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.message, "`nothing` does not return a value");
    }
}

// ============================================================================
// Variables
// ============================================================================

mod variables {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constant_cannot_be_reassigned() {
        let mut b = AstBuilder::new();
        let int = int_class(&mut b);
        let one = b.int(1);
        let constant = b.const_("c", None, Some(one));
        let target = b.ident("c");
        let two = b.int(2);
        let reassign = b.assign(target, two);

        let mut unit = CompilationUnit::new(b.program([int, constant, reassign]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.message, "Cannot assign to constant `c`");
    }

    #[test]
    fn test_constant_needs_value() {
        let mut b = AstBuilder::new();
        let int = int_class(&mut b);
        let ty = b.type_name("Int");
        let constant = b.const_("c", Some(ty), None);

        let mut unit = CompilationUnit::new(b.program([int, constant]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::AssignmentValueRequired));
    }

    #[test]
    fn test_variable_needs_type_or_value() {
        let mut b = AstBuilder::new();
        let variable = b.let_("v", None, None);

        let mut unit = CompilationUnit::new(b.program([variable]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::AssignmentTypeRequired));
    }

    #[test]
    fn test_top_level_variable_is_global() {
        let mut b = AstBuilder::new();
        let int = int_class(&mut b);
        let one = b.int(1);
        let variable = b.let_("v", None, Some(one));

        let mut unit = CompilationUnit::new(b.program([int, variable]));
        unit.analyze().unwrap();
        assert!(unit.annotations().is_global(variable));
        let alias = unit.annotations().declared(variable).unwrap();
        assert!(unit.graph().item(alias).as_alias().is_some_and(|a| a.escapes_scope));
    }

    #[test]
    fn test_variable_cannot_refer_to_itself() {
        let mut b = AstBuilder::new();
        let itself = b.ident("v");
        let variable = b.let_("v", None, Some(itself));

        let mut unit = CompilationUnit::new(b.program([variable]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::UndeclaredIdentifier));
    }
}

// ============================================================================
// Overrides
// ============================================================================

mod overrides {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hierarchy(mark_override: bool, in_base: bool) -> CompilationUnit {
        let mut b = AstBuilder::new();
        let mut base = ClassDecl::new("Animal");
        if in_base {
            let speak = b.function(FunctionDecl::new("speak"));
            base = base.member(speak);
        }
        let base = b.class(base);
        let mut speak = FunctionDecl::new("speak");
        if mark_override {
            speak = speak.override_();
        }
        let speak = b.function(speak);
        let heritage = b.type_name("Animal");
        let dog = b.class(ClassDecl::new("Dog").inherits(heritage).member(speak));
        CompilationUnit::new(b.program([base, dog]))
    }

    #[test]
    fn test_override_marked() {
        let mut unit = hierarchy(true, true);
        unit.analyze().unwrap();
    }

    #[test]
    fn test_override_unmarked() {
        let mut unit = hierarchy(false, true);
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::ExpectedOverride));
    }

    #[test]
    fn test_override_of_nothing() {
        let mut unit = hierarchy(true, false);
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::UnexpectedOverride));
    }
}
