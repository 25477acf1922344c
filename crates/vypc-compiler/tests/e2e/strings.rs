//! String operations: concatenation, comparison, casts, built-ins.

use crate::harness::*;

#[test]
fn test_concat_expands_inline() {
    let output = compile_ok(
        "void main(void) { string s; s = \"a\" + \"b\"; }",
    );
    assert_lines_in_order(
        &output,
        &[
            "SET $1, \"a\"",
            "SET $2, \"b\"",
            "COPY $3, $1",
            "GETSIZE $4, $1",
            "GETSIZE $5, $2",
            "RESIZE $3, $6",
            "LABEL concat_loop_0",
            "JUMPZ concat_end_0, $0",
            "SETWORD $3, $8, $0",
            "JUMP concat_loop_0",
            "LABEL concat_end_0",
        ],
    );
}

#[test]
fn test_string_equality_uses_eqs() {
    let output = compile_ok(
        "void main(void) { int a; a = \"x\" == \"y\"; }",
    );
    assert_lines_in_order(&output, &["EQS $0, $1, $2"]);

    let output = compile_ok(
        "void main(void) { int a; a = \"x\" != \"y\"; }",
    );
    assert_lines_in_order(&output, &["EQS $0, $1, $2", "NOT $0, $0"]);
}

#[test]
fn test_string_ordering_uses_lts() {
    let output = compile_ok(
        "void main(void) { int a; a = \"x\" < \"y\"; }",
    );
    assert_lines_in_order(&output, &["LTS $0, $1, $2"]);
}

#[test]
fn test_string_cast_calls_support_routine() {
    let output = compile_ok("void main(void) { string s; s = (string) 42; }");
    assert_lines_in_order(
        &output,
        &[
            "LABEL main",
            "ADDI $SP, $SP, 2",
            "SET $0, 42",
            "SET [$SP-1], $0",
            "CALL [$SP] int2string$support",
        ],
    );
}

#[test]
fn test_length_and_substr_calls() {
    let output = compile_ok(
        "void main(void) {\n\
           int n; string s;\n\
           s = \"hello\";\n\
           n = length(s);\n\
           s = subStr(s, 1, 2);\n\
         }",
    );
    assert_lines_in_order(&output, &["CALL [$SP] length", "CALL [$SP] subStr"]);
}

#[test]
fn test_float_arithmetic_and_hex_literals() {
    let output = compile_ok(
        "void main(void) { float f; f = 1.5 + 0.5; }",
    );
    assert_lines_in_order(
        &output,
        &["SET $1, 0x1.8p+0", "SET $2, 0x1p-1", "ADDF $0, $1, $2"],
    );
}

#[test]
fn test_nested_non_simple_operands_use_temporaries() {
    // Both operands of the outer + are calls, so each lands in its own
    // frame temporary before the add.
    let output = compile_ok(
        "int one(void) { return 1; }\n\
         void main(void) { int a; a = one() + one(); }",
    );
    // Frame: a plus two temporaries.
    assert_lines_in_order(&output, &["LABEL main", "ADDI $SP, $SP, 3"]);
    // First call lands in its temporary, the operands reload into
    // $1/$2, and the sum stores to a's slot.
    assert_lines_in_order(
        &output,
        &["SET [$SP-1], $0", "ADDI $0, $1, $2", "SET [$SP-2], $0"],
    );
}

#[test]
fn test_logical_ops_lower_to_and_or_not() {
    let output = compile_ok(
        "void main(void) { int a; a = 1 && 0; a = a || 1; a = !a; }",
    );
    assert_lines_in_order(
        &output,
        &["AND $0, $1, $2", "OR $0, $1, $2", "NOT $0, $0"],
    );
}
