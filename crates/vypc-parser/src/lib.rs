//! Frontend for the VYP compiler
//!
//! Tokenizes the source, runs the index pass to register every
//! top-level class and function, then runs the full pass over the same
//! tokens with the pass-1 global table pre-seeded so forward
//! references resolve. The result is the typed IR hanging off the
//! global symbol table, ready for the code generator.

pub mod builtins;
pub mod driver;
pub mod index;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod token;

pub use driver::{Driver, ParserDriver};
pub use index::IndexDriver;
pub use parser::Parser;
pub use symbol_table::{ScopeStack, Symbol, SymbolTable};
pub use token::{Span, Token};

use vypc_ir::{CompileResult, Program};

/// Run both passes over one source file.
pub fn parse(source: &str) -> CompileResult<(Program, SymbolTable)> {
    let tokens = lexer::tokenize(source)?;

    let mut index = IndexDriver::new();
    Parser::new(&tokens, &mut index).parse_program()?;
    let (program, global) = index.finish();

    let mut driver = ParserDriver::new(program, global);
    Parser::new(&tokens, &mut driver).parse_program()?;
    driver.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vypc_ir::{CompileError, Datatype, PrimitiveType};

    fn parse_err(source: &str) -> CompileError {
        parse(source).expect_err("expected a compile error")
    }

    #[test]
    fn test_empty_main_parses() {
        let (program, global) = parse("void main(void) { return; }").unwrap();
        let main = match global.get("main") {
            Some(Symbol::Function(f)) => f,
            other => panic!("main not a function: {:?}", other),
        };
        assert!(program.function(main).is_void());
        assert!(program.function(main).args.is_empty());
        assert!(program.function(main).body.is_some());
    }

    #[test]
    fn test_missing_main_is_semantic() {
        let err = parse_err("int Main(void) { return 0; }");
        assert_eq!(err.exit_code(), 14);
        assert!(err.to_string().contains("main not defined"));
    }

    #[test]
    fn test_wrong_main_signature_is_semantic() {
        let err = parse_err("int main(void) { return 0; }");
        assert_eq!(err.exit_code(), 14);
        assert!(err.to_string().contains("main not defined"));
    }

    #[test]
    fn test_assignment_type_clash_is_incompatibility() {
        let err = parse_err("void main(void) { int a; a = \"error\"; }");
        assert_eq!(err.exit_code(), 13);
        assert!(err.to_string().contains("assignment"));
    }

    #[test]
    fn test_redefinition_is_semantic() {
        let err = parse_err(
            "void foo(void) {}\nvoid foo(void) {}\nvoid main(void) {}",
        );
        assert_eq!(err.exit_code(), 14);
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn test_redefining_builtin_rejected() {
        let err = parse_err("int readInt(void) { return 1; } void main(void) {}");
        assert_eq!(err.exit_code(), 14);
    }

    #[test]
    fn test_undefined_variable_assignment() {
        let err = parse_err("void main(void) { x = 1; }");
        assert_eq!(err.exit_code(), 14);
        assert!(err.to_string().contains("Assignment to undefined variable x"));
    }

    #[test]
    fn test_forward_reference_between_functions() {
        parse("void main(void) { helper(); }\nvoid helper(void) { return; }").unwrap();
    }

    #[test]
    fn test_forward_reference_between_classes() {
        parse(
            "class A : Object { B other(void) { return new B; } }\n\
             class B : A { }\n\
             void main(void) { }",
        )
        .unwrap();
    }

    #[test]
    fn test_syntax_error_has_position() {
        let err = parse_err("void main(void) { int ; }");
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn test_non_call_expression_statement_is_syntax_error() {
        let err = parse_err("void main(void) { int a; a; }");
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn test_condition_must_be_int_or_object() {
        let err = parse_err("void main(void) { while (1.5) { } }");
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_return_type_checked() {
        let err = parse_err("int f(void) { return \"s\"; } void main(void) {}");
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_void_return_with_value_rejected() {
        let err = parse_err("void main(void) { return 1; }");
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_print_rejects_objects() {
        let err = parse_err(
            "void main(void) { print(new Object); }",
        );
        assert_eq!(err.exit_code(), 13);
        assert!(err.to_string().contains("print"));
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let err = parse_err(
            "class A : B { }\nclass B : A { }\nvoid main(void) { }",
        );
        assert_eq!(err.exit_code(), 14);
    }

    #[test]
    fn test_constructor_with_params_rejected() {
        let err = parse_err(
            "class A : Object { void A(int x) { } }\nvoid main(void) { }",
        );
        assert_eq!(err.exit_code(), 14);
    }

    #[test]
    fn test_override_signature_mismatch() {
        let err = parse_err(
            "class A : Object { int f(void) { return 1; } }\n\
             class B : A { string f(void) { return \"x\"; } }\n\
             void main(void) { }",
        );
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_subsumption_assignment() {
        parse(
            "class A : Object { }\nclass B : A { }\n\
             void main(void) { A a; a = new B; }",
        )
        .unwrap();
        let err = parse_err(
            "class A : Object { }\nclass B : A { }\n\
             void main(void) { B b; b = new A; }",
        );
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_private_member_access_is_visibility_violation() {
        let err = parse_err(
            "class A : Object { private int x; }\n\
             void main(void) { A a; int y; a = new A; y = a.x; }",
        );
        assert_eq!(err.exit_code(), 13);
        assert!(err.to_string().contains("not accessible"));
    }

    #[test]
    fn test_unknown_member_is_semantic() {
        let err = parse_err(
            "class A : Object { }\n\
             void main(void) { A a; int y; a = new A; y = a.nope; }",
        );
        assert_eq!(err.exit_code(), 14);
        assert!(err.to_string().contains("not a member"));
    }

    #[test]
    fn test_member_access_inside_class() {
        parse(
            "class A : Object {\n\
               private int x;\n\
               int get(void) { return x; }\n\
               void set(int v) { x = v; }\n\
             }\n\
             void main(void) { A a; int y; a = new A; y = a.get(); a.set(3); }",
        )
        .unwrap();
    }

    #[test]
    fn test_super_requires_parent_method() {
        parse(
            "class A : Object { int f(void) { return 1; } }\n\
             class B : A { int f(void) { return super.f() + 1; } }\n\
             void main(void) { }",
        )
        .unwrap();
    }

    #[test]
    fn test_string_cast_of_int_accepted() {
        parse("void main(void) { string s; s = (string) 42; }").unwrap();
        let err = parse_err("void main(void) { string s; s = (string) 1.5; }");
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_object_cast() {
        parse(
            "class A : Object { }\nclass B : A { }\n\
             void main(void) { A a; B b; a = new B; b = (B) a; }",
        )
        .unwrap();
    }

    #[test]
    fn test_declared_type_resolves_expr_type() {
        let (program, global) = parse(
            "int f(void) { return 2 + 3; }\nvoid main(void) { }",
        )
        .unwrap();
        let f = match global.get("f") {
            Some(Symbol::Function(f)) => f,
            _ => unreachable!(),
        };
        assert_eq!(
            program.function(f).ret,
            Some(Datatype::Primitive(PrimitiveType::Int))
        );
    }

    #[test]
    fn test_pass1_literal_type_clash_reported() {
        // Both operand types are known in pass 1, so the index pass
        // itself reports the clash.
        let tokens = lexer::tokenize("void main(void) { int a; a = 1 + \"x\"; }").unwrap();
        let mut index = IndexDriver::new();
        let err = Parser::new(&tokens, &mut index)
            .parse_program()
            .expect_err("expected pass-1 type clash");
        assert_eq!(err.exit_code(), 13);
    }
}
