#[cfg(test)]
mod parser_tests {
    use treelox::ast::Stmt;
    use treelox::ast_printer::AstPrinter;
    use treelox::driver;
    use treelox::error::LoxError;
    use treelox::parser::Parser;
    use treelox::token::{Literal, Token, TokenType};

    fn parse(source: &str) -> Vec<Stmt> {
        match driver::parse(source) {
            Ok(statements) => statements,
            Err(e) => panic!("parse failed for {:?}: {}", source, e),
        }
    }

    /// Prefix rendering of a single-statement program.
    fn render(source: &str) -> String {
        let statements = parse(source);
        assert_eq!(statements.len(), 1, "expected one statement in {:?}", source);

        AstPrinter::print_stmt(&statements[0])
    }

    fn parse_error(source: &str) -> (String, usize) {
        match driver::parse(source) {
            Err(LoxError::Parse { message, line }) => (message, line),
            Err(other) => panic!("expected a parse error, got: {}", other),
            Ok(statements) => panic!(
                "expected a parse error, got {} statements",
                statements.len()
            ),
        }
    }

    #[test]
    fn test_factor_binds_tighter_than_term() {
        assert_eq!(render("1 + 5 * 10;"), "(+ 1.0 (* 5.0 10.0))");
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        assert_eq!(render("(1 + 5) * 10;"), "(* (group (+ 1.0 5.0)) 10.0)");
    }

    #[test]
    fn test_binary_operators_are_left_associative() {
        assert_eq!(render("1 - 1 + 1;"), "(+ (- 1.0 1.0) 1.0)");
        assert_eq!(render("8 / 4 / 2;"), "(/ (/ 8.0 4.0) 2.0)");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(render("a = b = 3;"), "(= a (= b 3.0))");
    }

    #[test]
    fn test_unary_and_equality() {
        assert_eq!(render("!-x == y;"), "(== (! (- x)) y)");
        assert_eq!(render("1 < 2 != false;"), "(!= (< 1.0 2.0) false)");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(render("x or y and z;"), "(or x (and y z))");
    }

    #[test]
    fn test_chained_calls_and_gets() {
        assert_eq!(render("f()().x();"), "(call (. (call (call f)) x))");
        assert_eq!(render("f(1, g(2));"), "(call f 1.0 (call g 2.0))");
    }

    #[test]
    fn test_property_assignment_becomes_set() {
        assert_eq!(render("a.b.c = 1;"), "(= (. (. a b) c) 1.0)");
    }

    #[test]
    fn test_literals() {
        assert_eq!(render("print nil;"), "(print nil)");
        assert_eq!(render("print \"hi\";"), "(print hi)");
        assert_eq!(render("print 2.5;"), "(print 2.5)");
        assert_eq!(render("print true;"), "(print true)");
    }

    #[test]
    fn test_var_with_and_without_initializer() {
        assert_eq!(render("var a;"), "(var a)");
        assert_eq!(render("var a = 1;"), "(var a 1.0)");
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            render("if (a) print 1; else print 2;"),
            "(if a (print 1.0) (print 2.0))"
        );
        assert_eq!(render("while (a) a = false;"), "(while a (= a false))");
    }

    #[test]
    fn test_dangling_else_binds_to_nearest_if() {
        assert_eq!(
            render("if (a) if (b) print 1; else print 2;"),
            "(if a (if b (print 1.0) (print 2.0)))"
        );
    }

    #[test]
    fn test_for_loop_is_desugared() {
        assert_eq!(
            render("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i 0.0) (while (< i 3.0) (block (print i) (= i (+ i 1.0)))))"
        );
    }

    #[test]
    fn test_empty_for_clauses() {
        assert_eq!(render("for (;;) {}"), "(block (while true (block (block))))");
    }

    #[test]
    fn test_function_declaration() {
        assert_eq!(
            render("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
        assert_eq!(render("fun noop() { return; }"), "(fun noop () (return))");
    }

    #[test]
    fn test_class_declaration() {
        assert_eq!(
            render("class Foo { init(x) { this.x = x; } get() { return this.x; } }"),
            "(class Foo (fun init (x) (= (. this x) x)) (fun get () (return (. this x))))"
        );
    }

    #[test]
    fn test_program_renders_one_line_per_statement() {
        let statements = parse("var a = 1;\nprint a;");

        assert_eq!(
            AstPrinter::print_program(&statements),
            "(var a 1.0)\n(print a)"
        );
    }

    #[test]
    fn test_empty_program() {
        assert!(parse("").is_empty());
        assert!(parse("// nothing here").is_empty());
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (message, line) = parse_error("1 + 2 = 3;");

        assert_eq!(message, "Invalid assignment target.");
        assert_eq!(line, 1);
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let (message, _) = parse_error("(1 + 5 * 10;");
        assert_eq!(message, "Expected ')' after expression.");

        let (message, _) = parse_error("1 + 5 * 10);");
        assert_eq!(message, "Expected ';' after expression.");
    }

    #[test]
    fn test_missing_expression() {
        let (message, line) = parse_error("var a = 1;\nprint ;");

        assert_eq!(message, "Expected expression.");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_missing_semicolons() {
        assert_eq!(parse_error("print 1").0, "Expected ';' after value.");
        assert_eq!(parse_error("var a").0, "Expected ';' after variable declaration.");
        assert_eq!(parse_error("var;").0, "Expected variable name.");
    }

    #[test]
    fn test_superclass_clause_is_rejected() {
        assert_eq!(
            parse_error("class Foo < Bar {}").0,
            "Expected '{' before class body."
        );
    }

    #[test]
    fn test_unclosed_block() {
        assert_eq!(parse_error("{ print 1;").0, "Expected '}' after block.");
    }

    #[test]
    fn test_many_arguments_only_warn() {
        let args: Vec<String> = (0..300).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let statements = parse(&source);

        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_token_list_without_eof() {
        let tokens = vec![
            Token::new(TokenType::NUMBER, "1", Some(Literal::Number(1.0)), 1),
            Token::new(TokenType::SEMICOLON, ";", None, 1),
        ];

        let statements = Parser::new(&tokens).parse().unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(AstPrinter::print_stmt(&statements[0]), "1.0");
    }
}
