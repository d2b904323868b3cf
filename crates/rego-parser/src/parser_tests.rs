//! Statement-level tests for the grammar.
//!
//! These tests run whole sources through [`parse_statements`],
//! [`parse_module`] and [`parse_query`] and check the resulting statements
//! and diagnostics.

use rego_core::{Body, Expr, ExprTerms, Module, Ref, Rule, Statement, Term, Value};

use crate::{
    ParseConfig, error::ErrorCode, error::ParseError, parse_module, parse_query, parse_statements,
};

/// Parse `source` into statements with the default configuration.
fn statements(source: &str) -> Vec<Statement> {
    parse_statements("test.rego", source, &ParseConfig::default())
        .unwrap_or_else(|err| panic!("Expected parsing to succeed, but got error: {err}"))
}

/// Parse `source` and return the error.
fn parse_error(source: &str) -> ParseError {
    match parse_statements("test.rego", source, &ParseConfig::default()) {
        Ok(statements) => panic!("Expected parsing to fail, but got {statements:?}"),
        Err(err) => err,
    }
}

/// Assert that `source` fails with `code`.
fn assert_fails_with(source: &str, code: ErrorCode) {
    let err = parse_error(source);
    assert_eq!(err.diagnostic().code(), code, "{err}");
}

/// Parse `source` as a module with the default configuration.
fn module(source: &str) -> Module {
    parse_module("test.rego", source, &ParseConfig::default())
        .unwrap_or_else(|err| panic!("Expected module to parse, but got error: {err}"))
}

/// The single body statement of `source`.
fn body(source: &str) -> Body {
    match statements(source).as_slice() {
        [Statement::Body(body)] => body.clone(),
        other => panic!("Expected one body, got {other:?}"),
    }
}

/// The rules of the single rule statement of `source`.
fn rules(source: &str) -> Vec<Rule> {
    match statements(source).as_slice() {
        [Statement::Rules(rules)] => rules.clone(),
        other => panic!("Expected one rule statement, got {other:?}"),
    }
}

fn num(text: &str) -> Term {
    Term::number(serde_json::from_str(text).unwrap())
}

fn reference(head: &str, path: Vec<Term>) -> Term {
    Term::reference(Ref::new(Term::var(head), path))
}

fn op(name: &str) -> Term {
    reference(name, Vec::new())
}

mod program_tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(statements("").is_empty());
        assert!(statements("  \n\t\n").is_empty());
    }

    #[test]
    fn test_comment_only_input() {
        let parsed = statements("# just a note\n");
        let [Statement::Comment(comment)] = parsed.as_slice() else {
            panic!("Expected one comment, got {parsed:?}");
        };
        assert_eq!(comment.text, " just a note");
        assert_eq!(comment.location.as_ref().unwrap().text(), "# just a note");
    }

    #[test]
    fn test_statements_in_source_order() {
        let parsed = statements(
            "package a.b\n\nimport data.foo as bar\n\n# rules\np { true }\nx = 1\n",
        );
        let kinds: Vec<&str> = parsed
            .iter()
            .map(|s| match s {
                Statement::Package(_) => "package",
                Statement::Import(_) => "import",
                Statement::Rules(_) => "rules",
                Statement::Body(_) => "body",
                Statement::Comment(_) => "comment",
            })
            .collect();
        // A top-level `x = 1` stays an expression until a module is assembled.
        assert_eq!(kinds, ["package", "import", "comment", "rules", "body"]);
    }

    #[test]
    fn test_comments_inside_rules_are_kept() {
        let parsed = statements("p {\n  # inside\n  true\n}\n");
        assert!(matches!(parsed[0], Statement::Rules(_)));
        let Statement::Comment(comment) = &parsed[1] else {
            panic!("Expected comment, got {:?}", parsed[1]);
        };
        assert_eq!(comment.text, " inside");
        assert_eq!(comment.location.as_ref().unwrap().row(), 2);
    }

    #[test]
    fn test_statements_need_separation() {
        // Two literals on one line without `;` are two statements only when
        // whitespace separates them.
        let parsed = statements("x y");
        assert_eq!(parsed.len(), 2);
        assert_fails_with("x)", ErrorCode::E100);
    }

    #[test]
    fn test_statement_locations() {
        let parsed = statements("package foo\n\nallow {\n  true\n}");
        let Statement::Rules(rules) = &parsed[1] else {
            panic!("Expected rules, got {:?}", parsed[1]);
        };
        let location = rules[0].head.location.as_ref().unwrap();
        assert_eq!(location.row(), 3);
        assert_eq!(location.col(), 1);
        assert_eq!(location.text(), "allow");
        assert_eq!(location.file(), "test.rego");
    }
}

mod package_import_tests {
    use super::*;

    #[test]
    fn test_package_path_is_rooted() {
        let parsed = statements("package a.b[\"c\"]");
        let [Statement::Package(package)] = parsed.as_slice() else {
            panic!("Expected one package, got {parsed:?}");
        };
        assert_eq!(
            package.path,
            Ref::new(
                Term::var("data"),
                vec![Term::string("a"), Term::string("b"), Term::string("c")]
            )
        );
        assert_eq!(package.location.as_ref().unwrap().text(), "package a.b[\"c\"]");
    }

    #[test]
    fn test_package_requires_ground_string_path() {
        assert_fails_with("package a[x]", ErrorCode::E200);
        assert_fails_with("package a[1]", ErrorCode::E201);
        assert_fails_with("package a[x][1]", ErrorCode::E200);
    }

    #[test]
    fn test_package_error_message_names_ref() {
        let err = parse_error("package foo[x]");
        assert_eq!(
            err.diagnostic().message(),
            "package name cannot contain variables: foo[x]"
        );
    }

    #[test]
    fn test_imports() {
        let parsed = statements("import data.foo\nimport input.bar as baz\nimport input");
        let imports: Vec<_> = parsed
            .iter()
            .map(|s| match s {
                Statement::Import(import) => import.clone(),
                other => panic!("Expected import, got {other:?}"),
            })
            .collect();
        assert_eq!(imports[0].path, reference("data", vec![Term::string("foo")]));
        assert_eq!(imports[0].alias, None);
        assert_eq!(imports[1].alias.as_ref().unwrap().as_str(), "baz");
        assert_eq!(imports[2].path, Term::var("input"));
    }

    #[test]
    fn test_invalid_import_paths() {
        assert_fails_with("import foo.bar", ErrorCode::E204);
        assert_fails_with("import data[x]", ErrorCode::E204);
        let err = parse_error("import foo");
        assert_eq!(err.diagnostic().location().unwrap().text(), "foo");
    }

    #[test]
    fn test_custom_import_validator() {
        let config = ParseConfig::default().with_import_validator(
            |_: &Term| -> Result<(), rego_core::ImportPathError> { Ok(()) },
        );
        assert!(parse_statements("t.rego", "import anything.goes", &config).is_ok());
    }
}

mod rule_tests {
    use super::*;

    #[test]
    fn test_boolean_rule_defaults_to_true() {
        let rules = rules("allow { input.user = \"alice\" }");
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert!(!rule.default);
        assert_eq!(rule.head.name.as_str(), "allow");
        assert_eq!(rule.head.key, None);
        assert_eq!(rule.head.value, Some(Term::boolean(true)));
        assert_eq!(rule.body.len(), 1);
    }

    #[test]
    fn test_rule_with_key_and_value() {
        let rules = rules("p[x] = y { x = 1; y = 2 }");
        let head = &rules[0].head;
        assert_eq!(head.key, Some(Term::var("x")));
        assert_eq!(head.value, Some(Term::var("y")));
        assert_eq!(rules[0].body.len(), 2);
        assert_eq!(head.location.as_ref().unwrap().text(), "p[x] = y");
    }

    #[test]
    fn test_partial_set_rule_has_no_value() {
        let rules = rules("p[x] { x = 1 }");
        assert_eq!(rules[0].head.key, Some(Term::var("x")));
        assert_eq!(rules[0].head.value, None);
    }

    #[test]
    fn test_disjunctive_bodies_share_head() {
        let rules = rules("p = 7 { a } { b }\n{ c }");
        assert_eq!(rules.len(), 3);
        for (rule, name) in rules.iter().zip(["a", "b", "c"]) {
            assert_eq!(rule.head, rules[0].head);
            assert_eq!(rule.body.exprs()[0].terms, ExprTerms::Term(Term::var(name)));
        }
    }

    #[test]
    fn test_body_separators() {
        let rules = rules("p {\n  a\n  b; c\n\n  d # trailing\n  e\n}");
        assert_eq!(rules[0].body.len(), 5);
    }

    #[test]
    fn test_empty_body_is_illegal() {
        assert_fails_with("p { }", ErrorCode::E205);
        assert_fails_with("p = 1 {}", ErrorCode::E205);
    }

    #[test]
    fn test_head_key_legality() {
        assert_fails_with("p[1] = 2 { true }", ErrorCode::E202);
        assert_fails_with("p[[x]] = 2 { true }", ErrorCode::E202);
        let rules = rules("p[\"k\"] = 2 { true }");
        assert_eq!(rules[0].head.key, Some(Term::string("k")));
        let rules = super::rules("p[1] { true }");
        assert_eq!(rules[0].head.key, Some(num("1")));
    }

    #[test]
    fn test_illegal_key_without_body_is_a_query() {
        let body = body("p[1] = 2");
        assert_eq!(
            body.exprs()[0].terms,
            ExprTerms::Call(vec![
                op("eq"),
                reference("p", vec![num("1")]),
                num("2")
            ])
        );
    }

    #[test]
    fn test_default_rule() {
        let rules = rules("default allow = false");
        let rule = &rules[0];
        assert!(rule.default);
        assert_eq!(rule.head.value, Some(Term::boolean(false)));
        assert_eq!(rule.body.len(), 1);
        assert_eq!(rule.body.exprs()[0].terms, ExprTerms::Term(Term::boolean(true)));
    }

    #[test]
    fn test_default_value_must_be_constant() {
        assert_fails_with("default x = input.y", ErrorCode::E203);
        assert_fails_with("default x = [1, y]", ErrorCode::E203);
        assert_fails_with("default x = {\"a\": {b}}", ErrorCode::E203);
        assert!(!rules("default x = [y | y = input[_]]").is_empty());
    }

    #[test]
    fn test_default_error_message() {
        let err = parse_error("default x = input.y");
        assert_eq!(
            err.diagnostic().message(),
            "default rule value cannot contain ref"
        );
        assert_eq!(err.diagnostic().location().unwrap().text(), "input.y");
    }
}

mod expression_tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        let body = body(source);
        assert_eq!(body.len(), 1, "{body:?}");
        body.exprs()[0].clone()
    }

    #[test]
    fn test_term_expression() {
        assert_eq!(
            expr("input.allowed").terms,
            ExprTerms::Term(reference("input", vec![Term::string("allowed")]))
        );
    }

    #[test]
    fn test_infix_operators_resolve_through_registry() {
        let config = ParseConfig::default()
            .with_builtins(rego_core::BuiltinRegistry::default().with_infix("=", "equal"));
        let parsed = parse_statements("t.rego", "x = 1", &config).unwrap();
        let [Statement::Body(body)] = parsed.as_slice() else {
            panic!("Expected one body, got {parsed:?}");
        };
        assert_eq!(body.exprs()[0].operator(), Some(&op("equal")));
    }

    #[test]
    fn test_arithmetic_operators() {
        for (symbol, name) in [
            ("+", "plus"),
            ("-", "minus"),
            ("*", "mul"),
            ("/", "div"),
            ("&", "and"),
            ("|", "or"),
        ] {
            assert_eq!(
                expr(&format!("z = x {symbol} y")).terms,
                ExprTerms::Call(vec![op(name), Term::var("x"), Term::var("y"), Term::var("z")]),
                "{symbol}"
            );
        }
    }

    #[test]
    fn test_arithmetic_requires_output() {
        // The farthest attempt read `x + y` and wanted `= output` next.
        let err = parse_error("x + y");
        assert_eq!(err.diagnostic().code(), ErrorCode::E101);
        assert_eq!(err.diagnostic().help(), Some("expected `=`"));
    }

    #[test]
    fn test_subtraction_of_negative_number() {
        assert_eq!(
            expr("z = x - -1").terms,
            ExprTerms::Call(vec![op("minus"), Term::var("x"), num("-1"), Term::var("z")])
        );
    }

    #[test]
    fn test_set_call_and_empty_set() {
        assert_eq!(
            expr("s = set()").terms,
            ExprTerms::Call(vec![op("eq"), Term::var("s"), Term::set(Default::default())])
        );
        assert_eq!(
            expr("set(x)").terms,
            ExprTerms::Call(vec![op("set"), Term::var("x")])
        );
    }

    #[test]
    fn test_call_requires_adjacent_paren() {
        let err = parse_error("f (x)");
        assert_eq!(err.diagnostic().code(), ErrorCode::E100);
        assert_eq!(err.diagnostic().message(), "unexpected token `(`");
    }

    #[test]
    fn test_call_rejects_trailing_comma() {
        assert_fails_with("f(x,)", ErrorCode::E100);
    }

    #[test]
    fn test_negated_literal_with_modifiers() {
        let expr = expr("not p with input as {\"x\": 1}");
        assert!(expr.negated);
        assert_eq!(expr.with.len(), 1);
        assert_eq!(expr.with[0].target, Term::var("input"));
        assert_eq!(expr.location.unwrap().text(), "not p with input as {\"x\": 1}");
    }

    #[test]
    fn test_not_requires_whitespace() {
        assert_fails_with("not(x)", ErrorCode::E100);
    }

    #[test]
    fn test_query_separated_by_semicolons() {
        let body = body("x = 1; y = 2;z = 3");
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn test_dangling_semicolon() {
        assert_fails_with("x = 1;", ErrorCode::E101);
        assert_fails_with("x = 1; }", ErrorCode::E100);
    }

    #[test]
    fn test_comprehension_body_uses_newlines() {
        let body = body("xs = [x |\n  x = input[_]\n  x > 1\n]");
        let ExprTerms::Call(terms) = &body.exprs()[0].terms else {
            panic!("Expected call, got {body:?}");
        };
        let Value::ArrayComprehension(comprehension) = &terms[2].value else {
            panic!("Expected comprehension, got {:?}", terms[2]);
        };
        assert_eq!(comprehension.body.len(), 2);
    }
}

mod error_location_tests {
    use super::*;

    fn error_at(source: &str) -> (usize, usize) {
        let err = parse_error(source);
        let location = err.diagnostic().location().expect("located error");
        (location.row(), location.col())
    }

    #[test]
    fn test_error_points_at_farthest_token() {
        assert_eq!(error_at("p { x = }"), (1, 9));
        assert_eq!(error_at("package a\n\np {\n  x = [1, 2\n}"), (5, 1));
    }

    #[test]
    fn test_unexpected_token_message() {
        let err = parse_error("p { x ) }");
        assert_eq!(err.diagnostic().code(), ErrorCode::E100);
        assert_eq!(err.diagnostic().message(), "unexpected token `)`");
        assert!(err.diagnostic().help().is_some());
    }

    #[test]
    fn test_end_of_input_message() {
        let err = parse_error("p { x = 1");
        assert_eq!(err.diagnostic().code(), ErrorCode::E101);
        assert_eq!(err.diagnostic().message(), "unexpected end of input");
        assert_eq!(err.to_string(), "test.rego:1:10: error[E101]: unexpected end of input");
    }

    #[test]
    fn test_lexical_errors_surface() {
        assert_fails_with("x = \"abc", ErrorCode::E001);
        assert_fails_with("x = 1 ~ 2", ErrorCode::E002);
        assert_fails_with("x = 01", ErrorCode::E005);
    }
}

mod module_tests {
    use super::*;

    #[test]
    fn test_module_assembly() {
        let module = module(
            "# policy\npackage authz\n\nimport input.user\n\ndefault allow = false\nallow { user = \"admin\" }\nlimit = 10\n",
        );
        assert_eq!(module.package.to_string(), "package authz");
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.rules.len(), 3);
        assert_eq!(module.comments.len(), 1);

        let constant = &module.rules[2];
        assert_eq!(constant.head.name.as_str(), "limit");
        assert_eq!(constant.head.value, Some(num("10")));
        assert_eq!(constant.body.exprs()[0].terms, ExprTerms::Term(Term::boolean(true)));
    }

    #[test]
    fn test_module_requires_leading_package() {
        let config = ParseConfig::default();
        let err = parse_module("m.rego", "p { true }\npackage a", &config).unwrap_err();
        assert_eq!(err.diagnostic().code(), ErrorCode::E206);
        assert_eq!(
            err.diagnostic().message(),
            "expected package declaration before rule"
        );

        let err = parse_module("m.rego", "", &config).unwrap_err();
        assert_eq!(err.diagnostic().code(), ErrorCode::E206);

        let err = parse_module("m.rego", "# only a comment", &config).unwrap_err();
        assert_eq!(err.diagnostic().code(), ErrorCode::E206);
    }

    #[test]
    fn test_module_rejects_second_package() {
        let config = ParseConfig::default();
        let err = parse_module("m.rego", "package a\npackage b", &config).unwrap_err();
        assert_eq!(err.diagnostic().code(), ErrorCode::E206);
        assert_eq!(err.diagnostic().location().unwrap().row(), 2);
    }

    #[test]
    fn test_module_rejects_non_rule_bodies() {
        let config = ParseConfig::default();
        for source in [
            "package a\nx > 1",
            "package a\nnot x = 1",
            "package a\nx = 1; y = 2",
            "package a\ninput.x = 1",
            "package a\nx = 1 with input as 2",
        ] {
            let err = parse_module("m.rego", source, &config).unwrap_err();
            assert_eq!(err.diagnostic().code(), ErrorCode::E207, "{source}");
        }
    }

    #[test]
    fn test_query_assembly() {
        let config = ParseConfig::default();
        let query = parse_query("q", "x = input.a; y = x\n# note\nz = 1", &config).unwrap();
        assert_eq!(query.len(), 3);
        assert_eq!(query.to_string(), "eq(x, input.a); eq(y, x); eq(z, 1)");
    }

    #[test]
    fn test_query_rejects_other_statements() {
        let config = ParseConfig::default();
        for source in ["package a", "import data.x", "p { true }", ""] {
            let err = parse_query("q", source, &config).unwrap_err();
            assert_eq!(err.diagnostic().code(), ErrorCode::E208, "{source:?}");
        }
    }
}
