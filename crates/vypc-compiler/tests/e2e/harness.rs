//! Test harness for end-to-end compilation
//!
//! Compiles VYP source and inspects the emitted VYPcode textually.

use vypc_ir::CompileError;

/// Compile without the verbose annotations.
pub fn compile(source: &str) -> Result<String, CompileError> {
    vypc_compiler::compile(source, false)
}

/// Compile, panicking with the error and source on failure.
pub fn compile_ok(source: &str) -> String {
    match compile(source) {
        Ok(output) => output,
        Err(e) => panic!("compilation failed: {}\nSource:\n{}", e, source),
    }
}

/// Expect a compile error with the given exit code whose message
/// contains `pattern`.
pub fn expect_error(source: &str, exit_code: i32, pattern: &str) {
    match compile(source) {
        Ok(_) => panic!(
            "expected error containing '{}', but compilation succeeded\nSource:\n{}",
            pattern, source
        ),
        Err(e) => {
            assert_eq!(
                e.exit_code(),
                exit_code,
                "wrong exit code for error: {}\nSource:\n{}",
                e,
                source
            );
            assert!(
                e.to_string().contains(pattern),
                "expected error containing '{}', got: {}\nSource:\n{}",
                pattern,
                e,
                source
            );
        }
    }
}

/// Assert the given lines appear in the output in this order (not
/// necessarily adjacent).
pub fn assert_lines_in_order(output: &str, expected: &[&str]) {
    let mut lines = output.lines();
    for want in expected {
        assert!(
            lines.any(|line| line == *want),
            "line '{}' missing (or out of order) in output:\n{}",
            want,
            output
        );
    }
}

/// Number of lines equal to `line`.
pub fn count_lines(output: &str, line: &str) -> usize {
    output.lines().filter(|l| *l == line).count()
}
