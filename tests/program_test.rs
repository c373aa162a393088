// Integration tests for the class-based program dialect

use tinyj::symbols::StorageClass;
use tinyj::{DiagnosticKind, Dialect, ParseOptions, Parser, Session};

fn parse(source: &str) -> (Session, String) {
    let _ = env_logger::builder().is_test(true).try_init();
    let options = ParseOptions::new().with_dialect(Dialect::Program);
    let mut parser = Parser::new(source, options).expect("Parser creation failed");
    let root = parser.parse().expect("Parsing failed");
    let session = parser.into_session();
    let rendered = session.ast.render(root);
    (session, rendered)
}

#[test]
fn test_complete_class() {
    let source = r#"
        class Counter {
            int total;

            int add(int step, int times) {
                int i;
                i = 0;
                while (i < times) {
                    total += step;
                    i += 1;
                }
                return total;
            }

            void main() {
                int r;
                r = add(2, 3);
            }
        }
    "#;
    let (session, ast) = parse(source);

    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    assert!(ast.starts_with("(program (classes (class (name Counter)"));
    assert!(ast.contains("(vardecls (vardecl (vars total)))"));
    assert!(ast.contains("(func (fn add) (argdecls (argdecl step) (argdecl times))"));
    assert!(ast.contains("(while (< i times) (block (vardecls) (stmts (+= total step) (+= i 1))))"));
    assert!(ast.contains("(return total)"));
    assert!(ast.contains("(= r (call add (args 2 3)))"));

    let location = |name: &str| {
        let (_, entry) = session
            .symbols
            .iter()
            .find(|(_, e)| e.name == name)
            .unwrap_or_else(|| panic!("no entry for {}", name));
        let loc = session.symbols.locations().get(entry.location.unwrap());
        (entry.class, loc.depth, loc.offset)
    };
    assert_eq!(location("step"), (StorageClass::Argument, 2, -1));
    assert_eq!(location("times"), (StorageClass::Argument, 2, -2));
    assert_eq!(location("i"), (StorageClass::LocalVar, 2, 0));
    assert_eq!(location("add").0, StorageClass::LocalFunc);
}

#[test]
fn test_arguments_do_not_leak_between_functions() {
    let source = r#"
        class A {
            void f(int x) { x = 1; }
            void g() { x = 2; }
            void h(float x) { x = 1.5; }
        }
    "#;
    let (session, _) = parse(source);

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::UndefinedReference), 1);
}

#[test]
fn test_duplicate_argument() {
    let (session, _) = parse("class A { void f(int x, int x) { } }");
    assert_eq!(session.diagnostics.count(DiagnosticKind::Redeclaration), 1);
}

#[test]
fn test_class_functions_are_scoped_to_their_class() {
    let source = r#"
        class A { void f() { } }
        class B {
            int n;
            void g() { f(); n = f(); }
        }
    "#;
    let (session, ast) = parse(source);

    assert_eq!(session.diagnostics.count(DiagnosticKind::UndefinedReference), 2);
    assert!(ast.contains("(class (name B)"));
}

#[test]
fn test_calling_a_variable() {
    let (session, _) = parse("class A { int n; void g() { n(); } }");
    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 1);
}

#[test]
fn test_call_result_type_is_checked() {
    let source = r#"
        class A {
            float half(int n) { return 0.5; }
            void main() { int r; r = half(4); }
        }
    "#;
    let (session, _) = parse(source);
    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 1);
}

#[test]
fn test_loop_context_does_not_cross_function_bodies() {
    let source = r#"
        class A {
            void f() { while (true) { break; } }
            void g() { continue; }
        }
    "#;
    let (session, ast) = parse(source);

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 1);
    assert!(ast.contains("(break)"));
    assert!(!ast.contains("(continue)"));
}

#[test]
fn test_struct_declaration_and_globals() {
    let source = r#"
        class Shapes {
            struct Point { int x; int y; };
            int[8] buffer;
            void main() { buffer[1] = 3; }
        }
    "#;
    let (session, _) = parse(source);
    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);

    let (_, point) = session.symbols.iter().find(|(_, e)| e.name == "Point").unwrap();
    assert_eq!(point.class, StorageClass::Global);
    assert_eq!(session.types.size_of(point.ty.unwrap()), 2);
}

#[test]
fn test_malformed_function_does_not_hide_the_next_one() {
    let source = r#"
        class A {
            int x;
            int f(int x) { return x; }
            int y;
            void g() { }
        }
    "#;
    let (session, ast) = parse(source);

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 1);
    assert!(ast.contains("(func (fn f)"));
    assert!(ast.contains("(func (fn g) (argdecls) (block (vardecls) (stmts)))"));
}

#[test]
fn test_stray_token_in_body_is_skipped() {
    let source = r#"
        class A {
            void f() { int a; 5; a = zz; }
            void g() { b = 1; }
        }
    "#;
    let (session, ast) = parse(source);

    assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 1);
    assert_eq!(session.diagnostics.count(DiagnosticKind::UndefinedReference), 2);
    assert_eq!(session.diagnostics.len(), 3, "{:?}", session.diagnostics);
    assert!(ast.contains("(func (fn g)"));
}

#[test]
fn test_stray_token_before_closing_brace() {
    let (session, ast) = parse("class A { void f() { int a; a = 1; else } void g() { } }");

    assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
    assert!(ast.contains("(func (fn g)"));
}

#[test]
fn test_empty_program() {
    let (session, ast) = parse("");
    assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 1);
    assert_eq!(ast, "(program (classes))");
}
