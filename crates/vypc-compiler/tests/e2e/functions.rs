//! Function calls, argument passing, and recursion.

use crate::harness::*;

#[test]
fn test_arguments_fill_reserved_slots_in_order() {
    let output = compile_ok(
        "int add(int a, int b) { return a + b; }\n\
         void main(void) { int r; r = add(1, 2); }",
    );
    // Two args: slot [$SP-2] gets the first, [$SP-1] the second.
    assert_lines_in_order(
        &output,
        &[
            "LABEL main",
            "ADDI $SP, $SP, 3",
            "SET $0, 1",
            "SET [$SP-2], $0",
            "SET $0, 2",
            "SET [$SP-1], $0",
            "CALL [$SP] add",
        ],
    );
}

#[test]
fn test_callee_reads_parameters_relative_to_frame() {
    let output = compile_ok(
        "int add(int a, int b) { return a + b; }\n\
         void main(void) { int r; r = add(1, 2); }",
    );
    // No locals in add: a at [$SP-2], b at [$SP-1].
    assert_lines_in_order(
        &output,
        &[
            "LABEL add",
            "SET $1, [$SP-2]",
            "SET $2, [$SP-1]",
            "ADDI $0, $1, $2",
            "SET $1, [$SP]",
            "SUBI $SP, $SP, 3",
            "RETURN $1",
        ],
    );
}

#[test]
fn test_nested_call_as_argument() {
    let output = compile_ok(
        "int twice(int x) { return x + x; }\n\
         void main(void) { int r; r = twice(twice(2)); }",
    );
    // Inner call completes inside the outer reservation, then its
    // result fills the outer argument slot.
    assert_lines_in_order(
        &output,
        &[
            "LABEL main",
            "ADDI $SP, $SP, 2",
            "ADDI $SP, $SP, 2",
            "SET $0, 2",
            "SET [$SP-1], $0",
            "CALL [$SP] twice",
            "SET [$SP-1], $0",
            "CALL [$SP] twice",
        ],
    );
}

#[test]
fn test_recursion_compiles_with_branch_epilogs() {
    let output = compile_ok(
        "int fact(int n) {\n\
           if (n) { return n * fact(n - 1); } else { return 1; }\n\
         }\n\
         void main(void) { int r; r = fact(5); }",
    );
    assert_lines_in_order(&output, &["LABEL fact", "CALL [$SP] fact"]);
    // The recursive arm's multiply runs after the call returns.
    assert_lines_in_order(&output, &["JUMPZ if_else_0, $0", "MULI $0, $1, $2", "RETURN $1"]);
}

#[test]
fn test_float_parameters_and_writef() {
    let output = compile_ok(
        "float half(float x) { return x / 2.0; }\n\
         void main(void) { print(half(3.0)); }",
    );
    assert_lines_in_order(&output, &["LABEL half", "DIVF $0, $1, $2"]);
    assert_lines_in_order(&output, &["CALL [$SP] half", "WRITEF $0"]);
}

#[test]
fn test_void_call_discards_result() {
    let output = compile_ok(
        "void ping(void) { return; }\n\
         void main(void) { ping(); }",
    );
    assert_lines_in_order(&output, &["LABEL main", "ADDI $SP, $SP, 1", "CALL [$SP] ping"]);
}

#[test]
fn test_builtin_reads_are_plain_calls() {
    let output = compile_ok(
        "void main(void) { int i; float f; string s;\n\
           i = readInt(); f = readFloat(); s = readString();\n\
           print(i, f, s);\n\
         }",
    );
    assert_lines_in_order(
        &output,
        &[
            "CALL [$SP] readInt",
            "CALL [$SP] readFloat",
            "CALL [$SP] readString",
            "WRITEI $0",
            "WRITEF $0",
            "WRITES $0",
        ],
    );
}
