use stick_syntax::ast::{BinaryOperator, Body, Expr, Module, Node, Pos};
use stick_syntax::parser::parse_expression;
use stick_syntax::{ParseError, parse};

fn parse_ok(source: &str) -> Module {
    parse(source).expect("parse failed")
}

fn parse_err(source: &str) -> ParseError {
    parse(source).expect_err("expected a parse error")
}

fn name(s: &str) -> Expr {
    Expr::Name(s.to_string())
}

fn string(s: &str) -> Expr {
    Expr::StringLiteral(s.to_string())
}

fn expr(source: &str) -> Expr {
    parse_expression(source, 0).expect("expression failed to parse")
}

#[test]
fn plain_text() {
    let module = parse_ok("Hello, World!");
    assert_eq!(module.parent, None);
    assert_eq!(
        module.body.nodes,
        vec![Node::Text {
            data: "Hello, World!".into(),
            pos: Pos::new(1, 0),
        }]
    );
}

#[test]
fn print_positions_follow_lines() {
    let module = parse_ok("a\n  {{ user }}");
    assert_eq!(
        module.body.nodes[1],
        Node::Print {
            expr: name("user"),
            pos: Pos::new(2, 2),
        }
    );
}

#[test]
fn comments_are_dropped() {
    let module = parse_ok("a{# hidden {{ x }} #}b");
    let texts: Vec<_> = module
        .body
        .nodes
        .iter()
        .map(|n| match n {
            Node::Text { data, .. } => data.clone(),
            other => panic!("unexpected node {:?}", other),
        })
        .collect();
    assert_eq!(texts, vec!["a", "b"]);
}

#[test]
fn extends_sets_parent() {
    let module = parse_ok("{% extends 'base.twig' %}{% block body %}x{% endblock %}");
    assert_eq!(module.parent, Some(string("base.twig")));
    assert!(matches!(&module.body.nodes[0], Node::Block { name, .. } if name == "body"));
}

#[test]
fn extends_must_be_top_level() {
    let err = parse_err("{% block a %}{% extends 'x' %}{% endblock %}");
    assert!(err.message.contains("top level"), "{}", err.message);
}

#[test]
fn extends_twice_is_rejected() {
    let err = parse_err("{% extends 'a' %}{% extends 'b' %}");
    assert!(err.message.contains("already extends"), "{}", err.message);
}

#[test]
fn block_with_matching_end_name() {
    let module = parse_ok("{% block content %}hi{% endblock content %}");
    let Node::Block { name, body, .. } = &module.body.nodes[0] else {
        panic!("expected block");
    };
    assert_eq!(name, "content");
    assert_eq!(body.nodes.len(), 1);
}

#[test]
fn block_with_mismatched_end_name() {
    let err = parse_err("{% block a %}{% endblock b %}");
    assert!(err.message.contains("does not close"), "{}", err.message);
}

#[test]
fn unclosed_block() {
    let err = parse_err("{% block a %}never closed");
    assert_eq!(err.message, "unclosed `block` tag");
    assert_eq!(err.span, 0..13);
}

#[test]
fn for_with_key_and_value() {
    let module = parse_ok("{% for key, val in items %}{{ val }}{% endfor %}");
    let Node::For {
        key,
        val,
        iterable,
        body,
        ..
    } = &module.body.nodes[0]
    else {
        panic!("expected for");
    };
    assert_eq!(key.as_deref(), Some("key"));
    assert_eq!(val, "val");
    assert_eq!(iterable, &name("items"));
    assert_eq!(body.nodes.len(), 1);
}

#[test]
fn for_without_key() {
    let module = parse_ok("{% for item in items %}{% endfor %}");
    assert!(matches!(
        &module.body.nodes[0],
        Node::For { key: None, val, .. } if val == "item"
    ));
}

#[test]
fn for_requires_in() {
    let err = parse_err("{% for item of items %}{% endfor %}");
    assert_eq!(err.message, "expected `in`");
}

#[test]
fn if_else() {
    let module = parse_ok("{% if user %}Hi{% else %}Bye{% endif %}");
    let Node::If {
        cond,
        body,
        alternate,
        ..
    } = &module.body.nodes[0]
    else {
        panic!("expected if");
    };
    assert_eq!(cond, &name("user"));
    assert_eq!(body.nodes.len(), 1);
    assert_eq!(alternate.nodes.len(), 1);
}

#[test]
fn elseif_nests_in_alternate() {
    let module = parse_ok("{% if a %}A{% elseif b %}B{% else %}C{% endif %}after");
    assert_eq!(module.body.nodes.len(), 2);
    let Node::If { alternate, .. } = &module.body.nodes[0] else {
        panic!("expected if");
    };
    let Node::If {
        cond,
        alternate: inner_alternate,
        ..
    } = &alternate.nodes[0]
    else {
        panic!("expected nested if");
    };
    assert_eq!(cond, &name("b"));
    assert_eq!(inner_alternate.nodes.len(), 1);
}

#[test]
fn if_without_else_has_empty_alternate() {
    let module = parse_ok("{% if a %}A{% endif %}");
    assert!(matches!(&module.body.nodes[0], Node::If { alternate, .. } if *alternate == Body::empty()));
}

#[test]
fn stray_end_tag() {
    let err = parse_err("{% endif %}");
    assert_eq!(err.message, "unexpected `endif`");
}

#[test]
fn unknown_tag() {
    let err = parse_err("{% macro x %}");
    assert_eq!(err.message, "unknown tag `macro`");
}

#[test]
fn include_target() {
    let module = parse_ok("{% include \"partials/nav.twig\" %}");
    assert!(matches!(
        &module.body.nodes[0],
        Node::Include { target, .. } if *target == string("partials/nav.twig")
    ));
}

#[test]
fn whitespace_control() {
    let module = parse_ok("<ul>\n  {%- for i in items -%}\n  <li>{%- endfor %}");
    let Node::Text { data, .. } = &module.body.nodes[0] else {
        panic!("expected text");
    };
    assert_eq!(data, "<ul>");
    let Node::For { body, .. } = &module.body.nodes[1] else {
        panic!("expected for");
    };
    assert!(matches!(&body.nodes[0], Node::Text { data, .. } if data == "<li>"));
}

#[test]
fn attribute_access() {
    assert_eq!(
        expr("user.name"),
        Expr::GetAttr {
            base: Box::new(name("user")),
            attr: Box::new(string("name")),
            args: vec![],
        }
    );
}

#[test]
fn subscript_and_method_call() {
    assert_eq!(
        expr("users[key].greet('hi')"),
        Expr::GetAttr {
            base: Box::new(Expr::GetAttr {
                base: Box::new(name("users")),
                attr: Box::new(name("key")),
                args: vec![],
            }),
            attr: Box::new(string("greet")),
            args: vec![string("hi")],
        }
    );
}

#[test]
fn function_calls() {
    assert_eq!(
        expr("upper(user.name)"),
        Expr::FuncCall {
            name: "upper".into(),
            args: vec![expr("user.name")],
        }
    );
    assert_eq!(
        expr("now()"),
        Expr::FuncCall {
            name: "now".into(),
            args: vec![],
        }
    );
}

#[test]
fn operator_precedence() {
    let parsed = expr("a == b and c ~ d == e");
    let Expr::BinaryOp { op, left, right } = parsed else {
        panic!("expected binary op");
    };
    assert_eq!(op, BinaryOperator::And);
    assert!(matches!(*left, Expr::BinaryOp { op: BinaryOperator::Equal, .. }));
    let Expr::BinaryOp { op, left, .. } = *right else {
        panic!("expected binary op");
    };
    assert_eq!(op, BinaryOperator::Equal);
    assert!(matches!(*left, Expr::BinaryOp { op: BinaryOperator::Concat, .. }));
}

#[test]
fn parentheses_group() {
    let parsed = expr("(a or b) and c");
    assert!(matches!(
        parsed,
        Expr::BinaryOp { op: BinaryOperator::And, left, .. }
            if matches!(*left, Expr::BinaryOp { op: BinaryOperator::Or, .. })
    ));
}

#[test]
fn string_escapes() {
    assert_eq!(expr(r#""a\"b\n""#), string("a\"b\n"));
    assert_eq!(expr("'it\\'s'"), string("it's"));
}

#[test]
fn number_literals_are_rejected() {
    let err = parse_err("{{ 42 }}");
    assert_eq!(err.message, "number literals are not supported");
    assert_eq!(err.span, 3..5);
}

#[test]
fn unary_operators_are_rejected() {
    let err = parse_expression("not a", 0).unwrap_err();
    assert!(err.message.contains("not"), "{}", err.message);
}

#[test]
fn trailing_tokens_are_rejected() {
    let err = parse_err("{{ a b }}");
    assert_eq!(err.message, "unexpected `b`");
}

#[test]
fn unterminated_string() {
    let err = parse_expression("'abc", 0).unwrap_err();
    assert_eq!(err.message, "unterminated string literal");
}

#[test]
fn diagnostic_carries_span() {
    let err = parse_err("{{ a b }}");
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.labels[0].range, 5..6);
}
