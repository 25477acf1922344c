//! Branches, loops, and stack discipline.

use crate::harness::*;

#[test]
fn test_branch_labels_and_shape() {
    let output = compile_ok(
        "void main(void) { int a; a = 1; if (a) { a = 2; } else { a = 3; } }",
    );
    assert_lines_in_order(
        &output,
        &[
            "JUMPZ if_else_0, $0",
            "LABEL if_begin_0",
            "JUMP if_end_0",
            "LABEL if_else_0",
            "LABEL if_end_0",
        ],
    );
}

#[test]
fn test_branch_without_else_gets_empty_block() {
    let output = compile_ok("void main(void) { int a; a = 1; if (a) { a = 2; } }");
    assert_eq!(count_lines(&output, "LABEL if_else_0"), 1);
    assert_eq!(count_lines(&output, "LABEL if_end_0"), 1);
}

#[test]
fn test_nested_branches_use_monotonic_labels() {
    let output = compile_ok(
        "void main(void) {\n\
           int a;\n\
           a = 1;\n\
           if (a) { if (a) { a = 2; } } else { a = 3; }\n\
           if (a) { a = 4; }\n\
         }",
    );
    for label in ["LABEL if_end_0", "LABEL if_end_1", "LABEL if_end_2"] {
        assert_eq!(count_lines(&output, label), 1, "missing {}", label);
    }
}

#[test]
fn test_nested_loops() {
    let output = compile_ok(
        "void main(void) {\n\
           int i; int j;\n\
           i = 2;\n\
           while (i) {\n\
             j = 2;\n\
             while (j) { j = j - 1; }\n\
             i = i - 1;\n\
           }\n\
         }",
    );
    assert_lines_in_order(
        &output,
        &[
            "LABEL while_cond_0",
            "LABEL while_cond_1",
            "JUMP while_cond_1",
            "LABEL while_end_1",
            "JUMP while_cond_0",
            "LABEL while_end_0",
        ],
    );
}

#[test]
fn test_locals_from_nested_blocks_are_frame_slots() {
    // Declarations inside branch arms still get frame slots reserved
    // by the function prolog.
    let output = compile_ok(
        "void main(void) { int a; a = 1; if (a) { int b; b = 2; } else { int c; c = 3; } }",
    );
    assert_lines_in_order(&output, &["LABEL main", "ADDI $SP, $SP, 3"]);
}

#[test]
fn test_return_inside_branch_emits_full_epilog() {
    let output = compile_ok(
        "int f(int x) { if (x) { return 1; } else { return 2; } }\n\
         void main(void) { }",
    );
    // Both arms reclaim the argument and return-address slots.
    let epilogs = output
        .lines()
        .filter(|l| *l == "SUBI $SP, $SP, 2")
        .count();
    assert!(epilogs >= 2, "expected an epilog per return:\n{}", output);
}

#[test]
fn test_missing_trailing_return_synthesized() {
    let output = compile_ok("void main(void) { int a; a = 1; }");
    assert_lines_in_order(
        &output,
        &[
            "LABEL main",
            "ADDI $SP, $SP, 1",
            "SET $0, 0",
            "SUBI $SP, $SP, 1",
            "SET $1, [$SP]",
            "SUBI $SP, $SP, 1",
            "RETURN $1",
        ],
    );
}

#[test]
fn test_call_condition_shifts_offsets() {
    // While the call's two reserved slots are live, the load of `i`
    // (base offset [$SP]) must be emitted shifted by 2.
    let output = compile_ok(
        "int id(int x) { return x; }\n\
         void main(void) { int i; i = 3; while (id(i)) { i = i - 1; } }",
    );
    assert_lines_in_order(
        &output,
        &[
            "LABEL while_cond_0",
            "ADDI $SP, $SP, 2",
            "SET $0, [$SP-2]",
            "SET [$SP-1], $0",
            "CALL [$SP] id",
        ],
    );
}
