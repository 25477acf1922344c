//! Fixed code templates for the built-in environment
//!
//! Each built-in free function gets a hand-written body following the
//! standard calling convention (arguments below the return-address
//! slot, result in `$0`, callee cleans the stack). `print` has no body
//! here; every call site lowers it inline.

/// Label of the int-to-string conversion routine backing the
/// `(string)` cast. Takes one int argument, returns the decimal string.
pub const INT2STRING: &str = "int2string$support";

/// `int readInt(void)`
pub const READ_INT: &str = "\
LABEL readInt
READI $0
SET $1, [$SP]
SUBI $SP, $SP, 1
RETURN $1
";

/// `float readFloat(void)`
pub const READ_FLOAT: &str = "\
LABEL readFloat
READF $0
SET $1, [$SP]
SUBI $SP, $SP, 1
RETURN $1
";

/// `string readString(void)`
pub const READ_STRING: &str = "\
LABEL readString
READS $0
SET $1, [$SP]
SUBI $SP, $SP, 1
RETURN $1
";

/// `int length(string s)`
pub const LENGTH: &str = "\
LABEL length
SET $0, [$SP-1]
GETSIZE $0, $0
SET $1, [$SP]
SUBI $SP, $SP, 2
RETURN $1
";

/// `string subStr(string s, int i, int n)`
///
/// An out-of-range start or non-positive length yields `""`; the
/// length clamps to the string tail.
pub const SUBSTR: &str = "\
LABEL subStr
SET $2, [$SP-3]
SET $3, [$SP-2]
SET $4, [$SP-1]
GETSIZE $5, $2
SET $0, \"\"
LTI $6, $3, 0
NOT $6, $6
LTI $7, $3, $5
AND $6, $6, $7
GTI $7, $4, 0
AND $6, $6, $7
JUMPZ subStr$end, $6
SUBI $7, $5, $3
LTI $8, $7, $4
JUMPZ subStr$clamp, $8
JUMP subStr$copy
LABEL subStr$clamp
SET $7, $4
LABEL subStr$copy
RESIZE $0, $7
SET $8, 0
LABEL subStr$loop
LTI $9, $8, $7
JUMPZ subStr$end, $9
ADDI $10, $3, $8
GETWORD $11, $2, $10
SETWORD $0, $8, $11
ADDI $8, $8, 1
JUMP subStr$loop
LABEL subStr$end
SET $1, [$SP]
SUBI $SP, $SP, 4
RETURN $1
";

/// Decimal rendering of an int, digit by digit from the end; a leading
/// `-` for negatives.
pub const INT2STRING_BODY: &str = "\
LABEL int2string$support
SET $2, [$SP-1]
SET $0, \"\"
SET $3, 0
LTI $4, $2, 0
JUMPZ int2string$count, $4
SET $3, 1
SET $5, 0
SUBI $2, $5, $2
LABEL int2string$count
SET $6, 0
SET $7, $2
LABEL int2string$count_loop
ADDI $6, $6, 1
DIVI $7, $7, 10
JUMPZ int2string$counted, $7
JUMP int2string$count_loop
LABEL int2string$counted
ADDI $8, $6, $3
RESIZE $0, $8
JUMPZ int2string$digits, $3
SETWORD $0, 0, 45
LABEL int2string$digits
SET $9, $8
LABEL int2string$write
SUBI $9, $9, 1
DIVI $10, $2, 10
MULI $11, $10, 10
SUBI $11, $2, $11
ADDI $11, $11, 48
SETWORD $0, $9, $11
SET $2, $10
GTI $12, $9, $3
JUMPZ int2string$done, $12
JUMP int2string$write
LABEL int2string$done
SET $1, [$SP]
SUBI $SP, $SP, 2
RETURN $1
";

/// `string Object.toString()` and `string Object.getClass()` both read
/// the class-name string the vtable keeps in word 0; word 0 of the
/// object itself is the vtable pointer.
pub const OBJECT_TO_STRING: &str = "\
LABEL Object$toString
SET $0, [$SP-1]
GETWORD $0, $0, 0
GETWORD $0, $0, 0
SET $1, [$SP]
SUBI $SP, $SP, 2
RETURN $1
";

pub const OBJECT_GET_CLASS: &str = "\
LABEL Object$getClass
SET $0, [$SP-1]
GETWORD $0, $0, 0
GETWORD $0, $0, 0
SET $1, [$SP]
SUBI $SP, $SP, 2
RETURN $1
";

#[cfg(test)]
mod tests {
    use super::*;

    /// Every `ADDI $SP` in a template must be matched by a `SUBI $SP`
    /// and vice versa, counting operands, so the built-ins keep the
    /// stack-parity property of generated code.
    fn sp_delta(template: &str) -> i64 {
        let mut delta = 0i64;
        for line in template.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("ADDI $SP, $SP, ") {
                delta += rest.parse::<i64>().unwrap();
            } else if let Some(rest) = line.strip_prefix("SUBI $SP, $SP, ") {
                delta -= rest.parse::<i64>().unwrap();
            }
        }
        delta
    }

    #[test]
    fn test_templates_clean_their_frames() {
        // Each template must reclaim its arguments plus the return
        // slot: -(argc + 1) net movement.
        assert_eq!(sp_delta(READ_INT), -1);
        assert_eq!(sp_delta(READ_FLOAT), -1);
        assert_eq!(sp_delta(READ_STRING), -1);
        assert_eq!(sp_delta(LENGTH), -2);
        assert_eq!(sp_delta(SUBSTR), -4);
        assert_eq!(sp_delta(INT2STRING_BODY), -2);
        assert_eq!(sp_delta(OBJECT_TO_STRING), -2);
        assert_eq!(sp_delta(OBJECT_GET_CLASS), -2);
    }

    #[test]
    fn test_templates_end_with_return() {
        for template in [
            READ_INT,
            READ_FLOAT,
            READ_STRING,
            LENGTH,
            SUBSTR,
            INT2STRING_BODY,
            OBJECT_TO_STRING,
            OBJECT_GET_CLASS,
        ] {
            assert!(template.trim_end().ends_with("RETURN $1"));
        }
    }
}
