//! Integration tests for expression typing.
//!
//! Programs are built with the AST builder, analyzed as a whole unit, and
//! checked through the annotations the resolvers leave behind.

use vsl_ast::{Access, AstBuilder, ClassDecl, FunctionDecl, Mutability, NodeId, NodeKind};
use vsl_types::{CompilationUnit, Constraints, ErrorKind, TypeCandidate};

/// A class registered for the given `@primitive` annotations, with a
/// static operator per entry of `operators` taking `Self` operands.
fn primitive_class(b: &mut AstBuilder, name: &str, primitives: &[&[&str]], operators: &[(&str, usize)]) -> NodeId {
    let mut decl = ClassDecl::new(name);
    for args in primitives {
        let annotation = b.annotation("primitive", Some(*args));
        decl = decl.annotated(annotation);
    }
    for &(op, arity) in operators {
        let mut func = FunctionDecl::new(op).static_();
        for i in 0..arity {
            let ty = b.type_name(name);
            let arg = b.argument(format!("operand{i}"), ty);
            func = func.arg(arg);
        }
        let ret = b.type_name(name);
        let member = b.function(func.returns(ret));
        decl = decl.member(member);
    }
    b.class(decl)
}

/// `Int` is the default integer type, `Float` accepts integer literals
/// too and is the default floating point type.
fn numbers(b: &mut AstBuilder) -> (NodeId, NodeId) {
    let int = primitive_class(b, "Int", &[&["Integer", "default"]], &[("+", 2)]);
    let float = primitive_class(
        b,
        "Float",
        &[&["Integer"], &["FloatingPoint", "default"]],
        &[("+", 2)],
    );
    (int, float)
}

/// `func name(x: ty) -> ty`
fn identity(b: &mut AstBuilder, name: &str, ty: &str) -> NodeId {
    let arg_ty = b.type_name(ty);
    let x = b.argument("x", arg_ty);
    let ret = b.type_name(ty);
    b.function(FunctionDecl::new(name).arg(x).returns(ret))
}

/// An instance field `name: ty` with the given access.
fn field(b: &mut AstBuilder, access: Access, name: &str, ty: &str) -> NodeId {
    let ty = b.type_name(ty);
    b.node(NodeKind::AssignmentStatement {
        mutability: Mutability::Let,
        access,
        is_static: false,
        name: name.into(),
        ty: Some(ty),
        value: None,
        annotations: Vec::new(),
    })
}

fn analyze(b: AstBuilder, statements: Vec<NodeId>) -> CompilationUnit {
    let mut unit = CompilationUnit::new(b.program(statements));
    if let Err(error) = unit.analyze() {
        panic!("analysis failed: {}", error.message);
    }
    unit
}

// ============================================================================
// Literals
// ============================================================================

mod literals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_takes_family_default() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let x = b.let_("x", None, Some(one));
        let half = b.float("0.5");
        let y = b.let_("y", None, Some(half));

        let unit = analyze(b, vec![int, float, x, y]);
        assert_eq!(unit.type_of(x), unit.annotations().declared(int));
        assert_eq!(unit.type_of(y), unit.annotations().declared(float));
    }

    #[test]
    fn test_literal_follows_declared_type() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let ty = b.type_name("Float");
        let one = b.int(1);
        let x = b.let_("x", Some(ty), Some(one));

        let unit = analyze(b, vec![int, float, x]);
        assert_eq!(unit.type_of(one), unit.annotations().declared(float));
        assert_eq!(unit.type_name_of(x).as_deref(), Some("Float"));
    }

    #[test]
    fn test_literal_without_registered_type() {
        let mut b = AstBuilder::new();
        let text = b.string("hello");
        let x = b.let_("x", None, Some(text));

        let mut unit = CompilationUnit::new(b.program([x]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::NoValidType));
        assert!(error.message.contains("String"));
    }
}

// ============================================================================
// Operators
// ============================================================================

mod operators {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mixed_operands_pick_float_addition() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let two = b.float("2.0");
        let sum = b.binary("+", one, two);
        let x = b.let_("x", None, Some(sum));

        let unit = analyze(b, vec![int, float, x]);
        let float_ty = unit.annotations().declared(float);
        assert_eq!(unit.type_of(x), float_ty);
        assert_eq!(unit.type_of(one), float_ty);
        assert_eq!(unit.type_of(sum), float_ty);
        assert!(unit.unique_name_of(sum).is_some());
    }

    #[test]
    fn test_integer_operands_prefer_default() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let two = b.int(2);
        let sum = b.binary("+", one, two);
        let x = b.let_("x", None, Some(sum));

        let unit = analyze(b, vec![int, float, x]);
        assert_eq!(unit.type_of(x), unit.annotations().declared(int));
    }

    #[test]
    fn test_unary_ambiguity_without_default() {
        let mut b = AstBuilder::new();
        let a = primitive_class(&mut b, "A", &[&["Integer"]], &[("-", 1)]);
        let c = primitive_class(&mut b, "B", &[&["Integer"]], &[("-", 1)]);
        let one = b.int(1);
        let negated = b.unary("-", one);
        let x = b.let_("x", None, Some(negated));

        let mut unit = CompilationUnit::new(b.program([a, c, x]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::AmbiguousExpression));
        assert!(error.message.contains("unary `-`"), "{}", error.message);
    }

    #[test]
    fn test_unary_ambiguity_settled_by_default() {
        let mut b = AstBuilder::new();
        let a = primitive_class(&mut b, "A", &[&["Integer", "default"]], &[("-", 1)]);
        let c = primitive_class(&mut b, "B", &[&["Integer"]], &[("-", 1)]);
        let one = b.int(1);
        let negated = b.unary("-", one);
        let x = b.let_("x", None, Some(negated));

        let unit = analyze(b, vec![a, c, x]);
        assert_eq!(unit.type_of(x), unit.annotations().declared(a));
    }

    #[test]
    fn test_speculative_unary_keeps_every_candidate() {
        let mut b = AstBuilder::new();
        let a = primitive_class(&mut b, "A", &[&["Integer"]], &[("-", 1)]);
        let c = primitive_class(&mut b, "B", &[&["Integer"]], &[("-", 1)]);
        let one = b.int(1);
        // Detached from the program, resolved by hand below.
        let negated = b.unary("-", one);

        let mut unit = analyze(b, vec![a, c]);
        let a_ty = unit.annotations().declared(a).unwrap();
        let b_ty = unit.annotations().declared(c).unwrap();
        let scope = unit.root_scope().unwrap();

        let (mut cx, context) = unit.resolver();
        let candidates = cx.resolve(negated, scope, Constraints::new(context)).unwrap();
        assert_eq!(
            candidates,
            vec![TypeCandidate::new(a_ty, false), TypeCandidate::new(b_ty, false)]
        );
        // Nothing is final yet, so nothing is recorded.
        assert_eq!(unit.type_of(negated), None);
    }

    /// `Int` whose unary `-` is declared without a return type.
    fn int_with_void_negation(b: &mut AstBuilder) -> NodeId {
        let ty = b.type_name("Int");
        let operand = b.argument("v", ty);
        let minus = b.function(FunctionDecl::new("-").static_().arg(operand));
        let primitive = b.annotation("primitive", Some(&["Integer", "default"]));
        b.class(ClassDecl::new("Int").annotated(primitive).member(minus))
    }

    #[test]
    fn test_void_operator_in_value_position() {
        let mut b = AstBuilder::new();
        let int = int_with_void_negation(&mut b);
        let one = b.int(1);
        let negated = b.unary("-", one);
        let z = b.let_("z", None, Some(negated));

        let mut unit = CompilationUnit::new(b.program([int, z]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::NoValidType));
        assert_eq!(error.message, "Unary operator `-` does not return anything");
        assert_eq!(error.node, Some(negated));
    }

    #[test]
    fn test_void_operator_as_statement() {
        let mut b = AstBuilder::new();
        let int = int_with_void_negation(&mut b);
        let one = b.int(1);
        let negated = b.unary("-", one);
        let statement = b.expr_stmt(negated);

        let unit = analyze(b, vec![int, statement]);
        assert_eq!(unit.type_of(negated), Some(unit.graph().void_type()));
    }

    #[test]
    fn test_missing_operator_overload() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let negated = b.unary("-", one);
        let statement = b.expr_stmt(negated);

        let mut unit = CompilationUnit::new(b.program([int, float, statement]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::NoValidOverload));
    }
}

// ============================================================================
// Casts
// ============================================================================

mod casts {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cast_has_target_type() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let target = b.type_name("Float");
        let cast = b.bitcast(one, target);
        let x = b.let_("x", None, Some(cast));

        let unit = analyze(b, vec![int, float, x]);
        assert_eq!(unit.type_of(x), unit.annotations().declared(float));
        assert_eq!(unit.type_of(one), unit.annotations().declared(int));
    }

    #[test]
    fn test_cast_of_untyped_value() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let negated = b.unary("-", one);
        let target = b.type_name("Int");
        let cast = b.bitcast(negated, target);
        let x = b.let_("x", None, Some(cast));

        let mut unit = CompilationUnit::new(b.program([int, float, x]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::NoValidType));
        assert_eq!(error.message, "The value being cast has no valid type");
    }

    #[test]
    fn test_cast_of_ambiguous_value() {
        let mut b = AstBuilder::new();
        let a = primitive_class(&mut b, "A", &[&["Integer"]], &[]);
        let c = primitive_class(&mut b, "B", &[&["Integer"]], &[]);
        let one = b.int(1);
        let target = b.type_name("A");
        let cast = b.bitcast(one, target);
        let x = b.let_("x", None, Some(cast));

        let mut unit = CompilationUnit::new(b.program([a, c, x]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::AmbiguousExpression));
        assert!(error.message.starts_with("Ambiguous value in cast"));
    }
}

// ============================================================================
// Self
// ============================================================================

mod self_reference {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_self_in_free_function() {
        let mut b = AstBuilder::new();
        let this = b.self_ref();
        let statement = b.expr_stmt(this);
        let main = b.function(FunctionDecl::new("main").body([statement]));

        let mut unit = CompilationUnit::new(b.program([main]));
        let error = unit.analyze().unwrap_err();
        assert!(error.message.contains("does not belong"), "{}", error.message);
    }

    #[test]
    fn test_self_in_method() {
        let mut b = AstBuilder::new();
        let this = b.self_ref();
        let statement = b.expr_stmt(this);
        let method = b.function(FunctionDecl::new("touch").body([statement]));
        let class = b.class(ClassDecl::new("Point").member(method));

        let unit = analyze(b, vec![class]);
        assert_eq!(unit.type_of(this), unit.annotations().declared(class));
    }

    #[test]
    fn test_self_in_static_method() {
        let mut b = AstBuilder::new();
        let this = b.self_ref();
        let statement = b.expr_stmt(this);
        let method = b.function(FunctionDecl::new("make").static_().body([statement]));
        let class = b.class(ClassDecl::new("Point").member(method));

        let mut unit = CompilationUnit::new(b.program([class]));
        assert!(unit.analyze().is_err());
    }
}

// ============================================================================
// Calls
// ============================================================================

mod calls {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `A` is the default integer type, `B` accepts integer literals too.
    /// Both have a unary `-`, and `f` is overloaded on them.
    fn overloaded(b: &mut AstBuilder) -> Vec<NodeId> {
        let a = primitive_class(b, "A", &[&["Integer", "default"]], &[("-", 1)]);
        let c = primitive_class(b, "B", &[&["Integer"]], &[("-", 1)]);
        let f_a = identity(b, "f", "A");
        let f_b = identity(b, "f", "B");
        vec![a, c, f_a, f_b]
    }

    #[test]
    fn test_overloaded_call_under_operator_keeps_preference() {
        let mut b = AstBuilder::new();
        let mut statements = overloaded(&mut b);
        let (a, f_a) = (statements[0], statements[2]);
        let one = b.int(1);
        let head = b.ident("f");
        let call = b.call(head, [one]);
        let negated = b.unary("-", call);
        let z = b.let_("z", None, Some(negated));
        statements.push(z);

        let unit = analyze(b, statements);
        let a_ty = unit.annotations().declared(a);
        assert_eq!(unit.type_of(z), a_ty);
        assert_eq!(unit.type_of(call), a_ty);
        assert_eq!(unit.annotations().reference(call), unit.annotations().declared(f_a));
    }

    #[test]
    fn test_speculative_call_marks_best_overload() {
        let mut b = AstBuilder::new();
        let statements = overloaded(&mut b);
        let (a, c) = (statements[0], statements[1]);
        let one = b.int(1);
        let head = b.ident("f");
        // Detached from the program, resolved by hand below.
        let call = b.call(head, [one]);

        let mut unit = analyze(b, statements);
        let a_ty = unit.annotations().declared(a).unwrap();
        let b_ty = unit.annotations().declared(c).unwrap();
        let scope = unit.root_scope().unwrap();

        let (mut cx, context) = unit.resolver();
        let candidates = cx.resolve(call, scope, Constraints::new(context)).unwrap();
        assert_eq!(
            candidates,
            vec![TypeCandidate::new(a_ty, true), TypeCandidate::new(b_ty, false)]
        );
    }

    /// `class Counter { func count() -> Int; func touch(); static func make() -> Counter }`
    fn counter(b: &mut AstBuilder) -> NodeId {
        let int = b.type_name("Int");
        let count = b.function(FunctionDecl::new("count").returns(int));
        let touch = b.function(FunctionDecl::new("touch"));
        let this = b.type_name("Counter");
        let make = b.function(FunctionDecl::new("make").static_().returns(this));
        b.class(ClassDecl::new("Counter").members([count, touch, make]))
    }

    #[test]
    fn test_method_call() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = counter(&mut b);
        let ty = b.type_name("Counter");
        let c = b.let_("c", Some(ty), None);
        let receiver = b.ident("c");
        let method = b.property(receiver, "count");
        let call = b.call(method, Vec::<NodeId>::new());
        let n = b.let_("n", None, Some(call));

        let unit = analyze(b, vec![int, float, class, c, n]);
        assert_eq!(unit.type_of(n), unit.annotations().declared(int));
        let count = unit.annotations().reference(call).unwrap();
        assert_eq!(unit.graph().item(count).root_id, "count");
    }

    #[test]
    fn test_static_call() {
        let mut b = AstBuilder::new();
        let class = counter(&mut b);
        let (int, float) = numbers(&mut b);
        let head = b.ident("Counter");
        let method = b.property(head, "make");
        let call = b.call(method, Vec::<NodeId>::new());
        let made = b.let_("made", None, Some(call));

        let unit = analyze(b, vec![int, float, class, made]);
        assert_eq!(unit.type_of(made), unit.annotations().declared(class));
        assert_eq!(unit.annotations().reference(head), unit.annotations().declared(class));
    }

    #[test]
    fn test_missing_method() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = counter(&mut b);
        let ty = b.type_name("Counter");
        let c = b.let_("c", Some(ty), None);
        let receiver = b.ident("c");
        let method = b.property(receiver, "reset");
        let call = b.call(method, Vec::<NodeId>::new());
        let statement = b.expr_stmt(call);

        let mut unit = CompilationUnit::new(b.program([int, float, class, c, statement]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::MethodDoesNotExist));
        assert_eq!(error.message, "`Counter` has no method `reset`");
    }

    #[test]
    fn test_void_method_in_value_position() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = counter(&mut b);
        let ty = b.type_name("Counter");
        let c = b.let_("c", Some(ty), None);
        let receiver = b.ident("c");
        let method = b.property(receiver, "touch");
        let call = b.call(method, Vec::<NodeId>::new());
        let n = b.let_("n", None, Some(call));

        let mut unit = CompilationUnit::new(b.program([int, float, class, c, n]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.message, "`touch` does not return a value");
    }

    /// `class Row { func subscript(i: Int) -> Float }`
    fn row(b: &mut AstBuilder) -> NodeId {
        let index = b.type_name("Int");
        let i = b.argument("i", index);
        let ret = b.type_name("Float");
        let subscript = b.function(FunctionDecl::new("subscript").arg(i).returns(ret));
        b.class(ClassDecl::new("Row").member(subscript))
    }

    #[test]
    fn test_subscript() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = row(&mut b);
        let ty = b.type_name("Row");
        let r = b.let_("r", Some(ty), None);
        let receiver = b.ident("r");
        let zero = b.int(0);
        let element = b.subscript(receiver, [zero]);
        let v = b.let_("v", None, Some(element));

        let unit = analyze(b, vec![int, float, class, r, v]);
        assert_eq!(unit.type_of(v), unit.annotations().declared(float));
        assert_eq!(unit.type_of(zero), unit.annotations().declared(int));
    }

    #[test]
    fn test_subscript_of_type_without_one() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let ty = b.type_name("Int");
        let n = b.let_("n", Some(ty), None);
        let receiver = b.ident("n");
        let zero = b.int(0);
        let element = b.subscript(receiver, [zero]);
        let statement = b.expr_stmt(element);

        let mut unit = CompilationUnit::new(b.program([int, float, n, statement]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::MethodDoesNotExist));
        assert_eq!(error.message, "`Int` has no subscript");
    }
}

// ============================================================================
// Generics
// ============================================================================

mod generics {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `class Box<T> { let value: T; func get() -> T { return self.value } }`
    fn boxed(b: &mut AstBuilder) -> NodeId {
        let value = field(b, Access::Local, "value", "T");
        let this = b.self_ref();
        let read = b.property(this, "value");
        let ret = b.ret(Some(read));
        let ret_ty = b.type_name("T");
        let get = b.function(FunctionDecl::new("get").returns(ret_ty).body([ret]));
        b.class(ClassDecl::new("Box").generic("T").members([value, get]))
    }

    /// `let boxed = Box<Int>()`
    fn instance(b: &mut AstBuilder) -> (NodeId, NodeId) {
        let head = b.ident("Box");
        let argument = b.type_name("Int");
        let generic = b.generic(head, [argument]);
        let call = b.call(generic, Vec::<NodeId>::new());
        (b.let_("boxed", None, Some(call)), call)
    }

    #[test]
    fn test_method_of_instance_returns_argument_type() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = boxed(&mut b);
        let (boxed, _) = instance(&mut b);
        let receiver = b.ident("boxed");
        let method = b.property(receiver, "get");
        let call = b.call(method, Vec::<NodeId>::new());
        let v = b.let_("v", None, Some(call));

        let unit = analyze(b, vec![int, float, class, boxed, v]);
        assert_eq!(unit.type_name_of(boxed).as_deref(), Some("Box<Int>"));
        assert_eq!(unit.type_of(v), unit.annotations().declared(int));
    }

    #[test]
    fn test_field_of_instance_has_argument_type() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = boxed(&mut b);
        let (boxed, call) = instance(&mut b);
        let receiver = b.ident("boxed");
        let read = b.property(receiver, "value");
        let v = b.let_("v", None, Some(read));

        let unit = analyze(b, vec![int, float, class, boxed, v]);
        assert_eq!(unit.type_of(v), unit.annotations().declared(int));
        assert_eq!(unit.type_of(call), unit.type_of(boxed));
    }

    #[test]
    fn test_unspecialized_initialization() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let class = boxed(&mut b);
        let head = b.ident("Box");
        let call = b.call(head, Vec::<NodeId>::new());
        let boxed = b.let_("boxed", None, Some(call));

        let mut unit = CompilationUnit::new(b.program([int, float, class, boxed]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::GenericSpecializationRequired));
    }
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `class Point { let x: Int; private let secret: Int }` and `let p: Point`
    fn point(b: &mut AstBuilder, extra: Vec<NodeId>) -> (NodeId, NodeId) {
        let x = field(b, Access::Local, "x", "Int");
        let secret = field(b, Access::Private, "secret", "Int");
        let class = b.class(ClassDecl::new("Point").members([x, secret]).members(extra));
        let ty = b.type_name("Point");
        (class, b.let_("p", Some(ty), None))
    }

    fn read(b: &mut AstBuilder, receiver: &str, property: &str) -> NodeId {
        let receiver = b.ident(receiver);
        b.property(receiver, property)
    }

    #[test]
    fn test_instance_field() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let (class, p) = point(&mut b, Vec::new());
        let x = read(&mut b, "p", "x");
        let v = b.let_("v", None, Some(x));

        let unit = analyze(b, vec![int, float, class, p, v]);
        assert_eq!(unit.type_of(v), unit.annotations().declared(int));
        let field = unit.annotations().reference(x).unwrap();
        assert!(unit.graph().item(field).references.contains(&x));
    }

    #[test]
    fn test_static_field() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let ty = b.type_name("Int");
        let limit = b.static_let("limit", ty, None);
        let class = b.class(ClassDecl::new("Limits").member(limit));
        let read = read(&mut b, "Limits", "limit");
        let v = b.let_("v", None, Some(read));

        let unit = analyze(b, vec![int, float, class, v]);
        assert_eq!(unit.type_of(v), unit.annotations().declared(int));
    }

    #[test]
    fn test_tuple_field() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let half = b.float("0.5");
        let tuple = b.tuple([("a", one), ("b", half)]);
        let t = b.let_("t", None, Some(tuple));
        let read = read(&mut b, "t", "b");
        let v = b.let_("v", None, Some(read));

        let unit = analyze(b, vec![int, float, t, v]);
        assert_eq!(unit.type_of(v), unit.annotations().declared(float));
    }

    #[test]
    fn test_missing_property() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let (class, p) = point(&mut b, Vec::new());
        let z = read(&mut b, "p", "z");
        let v = b.let_("v", None, Some(z));

        let mut unit = CompilationUnit::new(b.program([int, float, class, p, v]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::PropertyDoesNotExist));
        assert_eq!(error.message, "`Point` has no property `z`");
    }

    #[test]
    fn test_private_field_outside_class() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let (class, p) = point(&mut b, Vec::new());
        let secret = read(&mut b, "p", "secret");
        let v = b.let_("v", None, Some(secret));

        let mut unit = CompilationUnit::new(b.program([int, float, class, p, v]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::InvalidAccess));
        assert_eq!(error.node, Some(secret));
    }

    #[test]
    fn test_private_field_inside_class() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let this = b.self_ref();
        let secret = b.property(this, "secret");
        let ret = b.ret(Some(secret));
        let ret_ty = b.type_name("Int");
        let reveal = b.function(FunctionDecl::new("reveal").returns(ret_ty).body([ret]));
        let (class, p) = point(&mut b, vec![reveal]);

        let unit = analyze(b, vec![int, float, class, p]);
        assert_eq!(unit.type_of(secret), unit.annotations().declared(int));
    }
}

// ============================================================================
// Tuples
// ============================================================================

mod tuples {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tuple_elements_take_defaults() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let half = b.float("0.5");
        let tuple = b.tuple([("a", one), ("b", half)]);
        let t = b.let_("t", None, Some(tuple));

        let unit = analyze(b, vec![int, float, t]);
        assert_eq!(unit.type_name_of(t).as_deref(), Some("(a: Int, b: Float)"));
        assert_eq!(unit.type_of(one), unit.annotations().declared(int));
    }

    #[test]
    fn test_tuple_argument_negotiates_element_types() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let element_ty = b.type_name("Float");
        let param_ty = b.tuple_type([("a", element_ty)]);
        let p = b.argument("p", param_ty);
        let g = b.function(FunctionDecl::new("g").arg(p));
        let one = b.int(1);
        let tuple = b.tuple([("a", one)]);
        let head = b.ident("g");
        let call = b.call(head, [tuple]);
        let statement = b.expr_stmt(call);

        let unit = analyze(b, vec![int, float, g, statement]);
        assert_eq!(unit.type_name_of(tuple).as_deref(), Some("(a: Float)"));
        assert_eq!(unit.type_of(one), unit.annotations().declared(float));
    }

    #[test]
    fn test_speculative_tuple_offers_every_combination() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        // Detached from the program, resolved by hand below.
        let tuple = b.tuple([("a", one)]);

        let mut unit = analyze(b, vec![int, float]);
        let scope = unit.root_scope().unwrap();
        let (mut cx, context) = unit.resolver();
        let candidates = cx.resolve(tuple, scope, Constraints::new(context)).unwrap();
        let described: Vec<(String, bool)> = candidates
            .iter()
            .map(|c| (cx.graph.describe(c.ty), c.preferred))
            .collect();
        assert_eq!(
            described,
            vec![("(a: Int)".to_string(), true), ("(a: Float)".to_string(), false)]
        );
        assert_eq!(unit.type_of(one), None);
    }

    #[test]
    fn test_duplicate_label_in_value() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let one = b.int(1);
        let two = b.int(2);
        let tuple = b.tuple([("a", one), ("a", two)]);
        let t = b.let_("t", None, Some(tuple));

        let mut unit = CompilationUnit::new(b.program([int, float, t]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.kind, Some(ErrorKind::TupleDuplicateLabel));
        assert_eq!(error.node, Some(two));
    }
}

// ============================================================================
// Conditionals
// ============================================================================

mod conditionals {
    use super::*;
    use pretty_assertions::assert_eq;

    fn boolean(b: &mut AstBuilder) -> NodeId {
        primitive_class(b, "Bool", &[&["Boolean", "default"]], &[])
    }

    #[test]
    fn test_ternary_branches_agree_on_type() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let bool_class = boolean(&mut b);
        let condition = b.boolean(true);
        let one = b.int(1);
        let half = b.float("0.5");
        let ternary = b.ternary(condition, one, half);
        let v = b.let_("v", None, Some(ternary));

        let unit = analyze(b, vec![int, float, bool_class, v]);
        let float_ty = unit.annotations().declared(float);
        assert_eq!(unit.type_of(v), float_ty);
        assert_eq!(unit.type_of(one), float_ty);
        assert_eq!(unit.type_of(condition), unit.annotations().declared(bool_class));
    }

    #[test]
    fn test_ternary_prefers_default_when_branches_allow() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let bool_class = boolean(&mut b);
        let condition = b.boolean(false);
        let one = b.int(1);
        let two = b.int(2);
        let ternary = b.ternary(condition, one, two);
        let v = b.let_("v", None, Some(ternary));

        let unit = analyze(b, vec![int, float, bool_class, v]);
        assert_eq!(unit.type_of(v), unit.annotations().declared(int));
    }

    #[test]
    fn test_ternary_without_common_type() {
        let mut b = AstBuilder::new();
        let (int, float) = numbers(&mut b);
        let bool_class = boolean(&mut b);
        let condition = b.boolean(true);
        let one = b.int(1);
        let yes = b.boolean(true);
        let ternary = b.ternary(condition, one, yes);
        let v = b.let_("v", None, Some(ternary));

        let mut unit = CompilationUnit::new(b.program([int, float, bool_class, v]));
        let error = unit.analyze().unwrap_err();
        assert!(error.message.starts_with("Branches of the conditional have no common type"), "{}", error.message);
    }

    #[test]
    fn test_short_circuit_is_boolean() {
        let mut b = AstBuilder::new();
        let bool_class = boolean(&mut b);
        let lhs = b.boolean(true);
        let rhs = b.boolean(false);
        let both = b.binary("&&", lhs, rhs);
        let v = b.let_("v", None, Some(both));

        let unit = analyze(b, vec![bool_class, v]);
        let bool_ty = unit.annotations().declared(bool_class);
        assert_eq!(unit.type_of(v), bool_ty);
        assert_eq!(unit.type_of(rhs), bool_ty);
    }

    #[test]
    fn test_short_circuit_without_boolean_type() {
        let mut b = AstBuilder::new();
        let lhs = b.boolean(true);
        let rhs = b.boolean(false);
        let either = b.binary("||", lhs, rhs);
        let statement = b.expr_stmt(either);

        let mut unit = CompilationUnit::new(b.program([statement]));
        let error = unit.analyze().unwrap_err();
        assert_eq!(error.message, "`||` requires a default Boolean primitive");
    }
}
