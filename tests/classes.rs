mod common;

#[cfg(test)]
mod class_tests {
    use super::common::*;

    use treelox::error::RuntimeError;
    use treelox::value::Value;

    fn number(source: &str) -> f64 {
        match last_printed(source) {
            Value::Number(n) => n,
            other => panic!("expected a number, got {}", other),
        }
    }

    #[test]
    fn test_print_class() {
        assert_eq!(run_ok("class abc {} print abc;").output, "abc\n");
    }

    #[test]
    fn test_create_instance() {
        let outcome = run_ok("class Foo {} var x = Foo(); print x;");

        assert_eq!(outcome.output, "Foo instance\n");
        assert!(matches!(outcome.last, Some(Value::Instance(_))));
    }

    #[test]
    fn test_set_and_get_property() {
        let source = "class Foo {}
                      var x = Foo();
                      x.abc = 15;
                      print x.abc;";

        assert_eq!(number(source), 15.0);
    }

    #[test]
    fn test_set_expression_yields_value() {
        assert_eq!(number("class Foo {} var x = Foo(); print x.a = 9;"), 9.0);
    }

    #[test]
    fn test_method_call() {
        let source = "class Foo { bar() { print 123; } }
                      Foo().bar();";

        assert_eq!(number(source), 123.0);
    }

    #[test]
    fn test_method_display() {
        let source = "class Foo { bar() {} } print Foo().bar;";

        assert_eq!(run_ok(source).output, "<fn bar>\n");
    }

    #[test]
    fn test_use_this() {
        let source = "class Foo {
                        bar() { print this.abc; }
                      }
                      var x = Foo();
                      x.abc = 5;
                      x.bar();";

        assert_eq!(number(source), 5.0);
    }

    #[test]
    fn test_set_this_property() {
        let source = "class Foo {
                        setAbc() { this.abc = 4; }
                      }
                      var x = Foo();
                      x.setAbc();
                      print x.abc;";

        assert_eq!(number(source), 4.0);
    }

    #[test]
    fn test_method_calls_sibling_through_this() {
        let source = "class M { a() { return this.b(); } b() { return 7; } }
                      print M().a();";

        assert_eq!(number(source), 7.0);
    }

    #[test]
    fn test_bound_method_keeps_its_instance() {
        let source = "class Foo {
                        init(x) { this.x = x; }
                        getX() { return this.x; }
                      }
                      var f = Foo(3);
                      var g = Foo(10);
                      g.o = f.getX;
                      print g.o();";

        assert_eq!(number(source), 3.0);
    }

    #[test]
    fn test_bound_method_reads_fields_at_call_time() {
        let source = "class Foo { p() { print this.abc; } }
                      var f = Foo();
                      f.abc = 3;
                      var m = f.p;
                      f.abc = 20;
                      m();";

        let outcome = run_ok(source);

        assert_eq!(outcome.output, "20.0\n");
        assert_eq!(outcome.last, Some(Value::Number(20.0)));
    }

    #[test]
    fn test_init() {
        let source = "class Foo {
                        init(x) { this.abc = x; return nil; }
                      }
                      var f = Foo(2);
                      print f.abc;";

        assert_eq!(number(source), 2.0);
    }

    #[test]
    fn test_init_bare_return() {
        let source = "class Foo {
                        init() { this.a = 1; return; this.a = 2; }
                      }
                      print Foo().a;";

        assert_eq!(number(source), 1.0);
    }

    #[test]
    fn test_init_returning_value_is_an_error() {
        let source = "class Foo {
                        init() { return 1; }
                      }
                      var f = Foo();";

        assert_eq!(
            runtime_error(source),
            RuntimeError::InvalidConstructorReturn {
                class: "Foo".into(),
                line: 4,
            }
        );
    }

    #[test]
    fn test_init_can_be_called_again() {
        let source = "class Foo { init(x) { this.abc = x; } }
                      var f = Foo(1);
                      f.init(5);
                      print f.abc;";

        assert_eq!(number(source), 5.0);
    }

    #[test]
    fn test_class_arity_follows_init() {
        assert_eq!(
            runtime_error("class P { init(a, b) {} } P(1);"),
            RuntimeError::ArityMismatch {
                expected: 2,
                got: 1,
                line: 1,
            }
        );
        assert_eq!(
            runtime_error("class E {} E(1);"),
            RuntimeError::ArityMismatch {
                expected: 0,
                got: 1,
                line: 1,
            }
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = "class Foo { bar() { return 1; } }
                      var f = Foo();
                      f.bar = 2;
                      print f.bar;";

        assert_eq!(number(source), 2.0);
    }

    #[test]
    fn test_instances_are_shared_references() {
        let source = "class C {}
                      var a = C();
                      var b = a;
                      b.x = 1;
                      print a.x;";

        assert_eq!(number(source), 1.0);
    }

    #[test]
    fn test_instances_compare_by_identity() {
        assert_eq!(
            last_printed("class C {} var a = C(); var b = a; print a == b;"),
            Value::Bool(true)
        );
        assert_eq!(
            last_printed("class C {} print C() == C();"),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_undefined_property() {
        assert_eq!(
            runtime_error("class Foo {} print Foo().y;"),
            RuntimeError::UndefinedProperty {
                instance: "Foo instance".into(),
                name: "y".into(),
                line: 1,
            }
        );
    }

    #[test]
    fn test_set_property_on_non_instance() {
        match runtime_error("var x = 1; x.abc = 2;") {
            RuntimeError::NotAnInstance { value, line } => {
                assert_eq!(value, "1.0");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_get_property_on_non_instance() {
        match runtime_error("class Foo {} print Foo.bar;") {
            RuntimeError::NotAnInstance { value, .. } => assert_eq!(value, "Foo"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_this_outside_method() {
        match runtime_error("print this;") {
            RuntimeError::UndefinedVariable { name, .. } => assert_eq!(name, "this"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
