//! Literal end-to-end scenarios over the emitted program text.

use crate::harness::*;

#[test]
fn test_empty_main() {
    let output = compile_ok("void main(void) { return; }");
    assert!(output.starts_with("#! /bin/vypint\n# VYPcode: 1.0\n"));
    assert_lines_in_order(
        &output,
        &[
            "CALL [$SP] main",
            "JUMP ENDOFPROGRAM",
            "LABEL main",
            "SET $0, 0",
            "SET $1, [$SP]",
            "SUBI $SP, $SP, 1",
            "RETURN $1",
            "LABEL ENDOFPROGRAM",
        ],
    );
}

#[test]
fn test_missing_main() {
    expect_error("int Main(void) { return 0; }", 14, "main not defined");
}

#[test]
fn test_assignment_type_mismatch() {
    expect_error(
        "void main(void){ int a; a = \"error\"; }",
        13,
        "assignment",
    );
}

#[test]
fn test_redefinition_at_file_scope() {
    expect_error(
        "void foo(void) {}\nvoid foo(void) {}\nvoid main(void) {}",
        14,
        "foo",
    );
}

#[test]
fn test_print_of_mixed_primitives() {
    let output = compile_ok("void main(void){ print(\"x=\", 42, \"\\n\"); }");
    // Three write instructions in argument order, each preceded by the
    // load of its argument.
    assert_lines_in_order(
        &output,
        &[
            "SET $0, \"x=\"",
            "WRITES $0",
            "SET $0, 42",
            "WRITEI $0",
            "SET $0, \"\\n\"",
            "WRITES $0",
        ],
    );
}

#[test]
fn test_simple_loop() {
    let output = compile_ok("void main(void){ int i; i=0; while (i) { i = i - 1; } }");
    assert_eq!(count_lines(&output, "LABEL while_cond_0"), 1);
    assert_eq!(count_lines(&output, "LABEL while_end_0"), 1);
    assert_eq!(count_lines(&output, "JUMPZ while_end_0, $0"), 1);
    assert_eq!(count_lines(&output, "JUMP while_cond_0"), 1);
}

#[test]
fn test_output_is_deterministic() {
    let source = "class A : Object { int x; int get(void) { return x; } }\n\
                  void main(void) { A a; a = new A; print(a.get()); }";
    let first = compile_ok(source);
    let second = compile_ok(source);
    assert_eq!(first, second);
}

#[test]
fn test_label_counters_reset_per_compile() {
    let source = "void main(void) { int i; while (i) { i = i - 1; } }";
    let first = compile_ok(source);
    // A fresh compile starts its counters over, so the same labels
    // come out.
    let second = compile_ok(source);
    assert!(first.contains("LABEL while_cond_0"));
    assert_eq!(first, second);
}

#[test]
fn test_builtin_templates_present() {
    let output = compile_ok("void main(void) { }");
    for label in [
        "LABEL readInt",
        "LABEL readFloat",
        "LABEL readString",
        "LABEL length",
        "LABEL subStr",
        "LABEL int2string$support",
        "LABEL Object$toString",
        "LABEL Object$getClass",
        "LABEL Object$constructor",
        "LABEL vtable$Object",
    ] {
        assert_eq!(count_lines(&output, label), 1, "missing {}", label);
    }
    // print has no body, only inline lowering.
    assert_eq!(count_lines(&output, "LABEL print"), 0);
}

#[test]
fn test_function_call_reserves_and_callee_cleans() {
    let output = compile_ok(
        "int twice(int x) { return x + x; }\n\
         void main(void) { int y; y = twice(4); }",
    );
    // Caller reserves one arg slot plus the return-address slot; the
    // callee's epilog reclaims both.
    assert_lines_in_order(
        &output,
        &[
            "LABEL main",
            "ADDI $SP, $SP, 2",
            "SET [$SP-1], $0",
            "CALL [$SP] twice",
        ],
    );
    assert_lines_in_order(&output, &["LABEL twice", "SUBI $SP, $SP, 2", "RETURN $1"]);
}

#[test]
fn test_verbose_annotates_offsets() {
    let output = vypc_compiler::compile("void main(void) { int a; int b; }", true).unwrap();
    assert!(output.contains("# a [$SP-1]"));
    assert!(output.contains("# b [$SP]"));
}
