// Integration tests for the block dialect front end

use rstest::rstest;
use tinyj::symbols::SymbolTable;
use tinyj::{DiagnosticKind, Dialect, ParseOptions, Parser, Session};

fn parse(source: &str) -> (Session, String) {
    let _ = env_logger::builder().is_test(true).try_init();
    let options = ParseOptions::new().with_dialect(Dialect::Block);
    let mut parser = Parser::new(source, options).expect("Parser creation failed");
    let root = parser.parse().expect("Parsing failed");
    let session = parser.into_session();
    let rendered = session.ast.render(root);
    (session, rendered)
}

fn location_of(session: &Session, name: &str) -> (usize, i64, usize) {
    let symbols: &SymbolTable = &session.symbols;
    let (_, entry) = symbols
        .iter()
        .find(|(_, e)| e.name == name)
        .unwrap_or_else(|| panic!("no entry for {}", name));
    let loc = symbols.locations().get(entry.location.expect("no location"));
    (loc.depth, loc.offset, loc.size)
}

#[test]
fn test_dangling_else_binds_to_inner_if() {
    let source = r#"
        {
            int x, y, a;
            if (x>0) if (y>0) a=1; else a=2;
        }
    "#;
    let (session, ast) = parse(source);

    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    assert!(
        ast.contains("(stmts (if (> x 0) (if (> y 0) (= a 1) (= a 2))))"),
        "{}",
        ast
    );
}

#[test]
fn test_else_after_block_binds_to_outer_if() {
    let source = "{ int x, a; if (x>0) { if (x>1) a=1; } else a=2; }";
    let (session, ast) = parse(source);

    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    assert!(ast.contains("(if (> x 0) (block (vardecls) (stmts (if (> x 1) (= a 1)))) (= a 2))"));
}

#[test]
fn test_missing_semicolon_between_declarations() {
    let (session, ast) = parse("{ int x int y; }");

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 1);
    assert_eq!(
        ast,
        "(block (vardecls (vardecl (vars x)) (vardecl (vars y))) (stmts))"
    );
    assert_eq!(location_of(&session, "x"), (1, 0, 1));
    assert_eq!(location_of(&session, "y"), (1, 1, 1));
}

#[test]
fn test_duplicate_declaration_in_one_block() {
    let (session, _) = parse("{ int x; int x; x = 1; }");

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::Redeclaration), 1);
    assert_eq!(session.symbols.iter().filter(|(_, e)| e.name == "x").count(), 1);
}

#[test]
fn test_shadowing_in_nested_block_is_allowed() {
    let (session, _) = parse("{ int x; { float x; x = 1.5; } x = 2; }");
    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
}

#[rstest]
#[case("{ int a; break; a = 1; }")]
#[case("{ int a; continue; a = 1; }")]
#[case("{ int a; if (a > 0) break; a = 1; }")]
fn test_jump_outside_loop_is_reported_and_ignored(#[case] source: &str) {
    let (session, ast) = parse(source);

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert!(!ast.contains("(break)"));
    assert!(!ast.contains("(continue)"));
    assert!(ast.contains("(= a 1)"));
}

#[test]
fn test_jump_inside_loop() {
    let source = r#"
        {
            int i;
            while (i < 3) {
                if (i == 1) continue;
                while (true) break;
                i += 1;
            }
        }
    "#;
    let (session, ast) = parse(source);
    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    assert!(ast.contains("(continue)"));
    assert!(ast.contains("(while true (break))"));
}

#[test]
fn test_sibling_blocks_share_storage() {
    let (session, _) = parse("{ { int a; } { int b; } { { int c; } } }");

    assert!(session.diagnostics.is_empty());
    let a = location_of(&session, "a");
    let b = location_of(&session, "b");
    let c = location_of(&session, "c");
    assert_eq!(a, (2, 0, 1));
    assert_eq!(a, b);
    assert_ne!(a, c);

    let entry = |name: &str| {
        session
            .symbols
            .iter()
            .find(|(_, e)| e.name == name)
            .and_then(|(_, e)| e.location)
    };
    assert_eq!(entry("a"), entry("b"));
    assert_ne!(entry("a"), entry("c"));
}

#[rstest]
#[case("{ int a; a = ; a = 1; }", 1)]
#[case("{ int a; a = 1 a = 2; }", 1)]
#[case("{ int a; a = (1 + 2; a = 1; }", 1)]
#[case("{ int a; a = 1 * / 2; }", 1)]
#[case("{ int a; a = 1; } }", 1)]
#[case("{ int a; a = b; c = a; }", 2)]
fn test_recovery_keeps_parsing(#[case] source: &str, #[case] expected: usize) {
    let (session, _) = parse(source);
    assert_eq!(session.diagnostics.len(), expected, "{:?}", session.diagnostics);
}

#[test]
fn test_errors_do_not_hide_later_errors() {
    let source = r#"
        {
            int a;
            float f;
            a = ;
            a = f;
            break;
            a = zz;
        }
    "#;
    let (session, _) = parse(source);

    assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 2);
    assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 1);
    assert_eq!(session.diagnostics.count(DiagnosticKind::UndefinedReference), 1);

    let lines: Vec<usize> = session.diagnostics.iter().map(|d| d.location.line).collect();
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);
}

#[test]
fn test_block_dialect_signed_literals() {
    let (session, ast) = parse("{ int a, b; a = b+1; b = a-2*3; }");
    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    assert!(ast.contains("(= a (+ b +1))"));
    assert!(ast.contains("(= b (+ a (* -2 3)))"));
}
