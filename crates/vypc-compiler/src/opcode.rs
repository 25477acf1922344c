//! Target VM instruction mnemonics
//!
//! The generator emits textual VYPcode; this enum is the single source
//! of mnemonic spellings so typed-operation selection stays in one
//! place.

/// VYPcode instruction mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Register or memory move.
    Set,
    /// String clone (fresh writable buffer).
    Copy,

    // Integer arithmetic
    AddI,
    SubI,
    MulI,
    DivI,

    // Float arithmetic
    AddF,
    SubF,
    MulF,
    DivF,

    // Comparisons, typed by operand
    LtI,
    LtF,
    LtS,
    GtI,
    GtF,
    GtS,
    EqI,
    EqF,
    EqS,

    // Logical
    And,
    Or,
    Not,

    // I/O
    ReadI,
    ReadF,
    ReadS,
    WriteI,
    WriteF,
    WriteS,

    // Strings and heap chunks
    GetSize,
    Resize,
    GetWord,
    SetWord,
    Create,

    // Control flow
    Call,
    Return,
    Jump,
    JumpZ,
    Label,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Op::Set => "SET",
            Op::Copy => "COPY",
            Op::AddI => "ADDI",
            Op::SubI => "SUBI",
            Op::MulI => "MULI",
            Op::DivI => "DIVI",
            Op::AddF => "ADDF",
            Op::SubF => "SUBF",
            Op::MulF => "MULF",
            Op::DivF => "DIVF",
            Op::LtI => "LTI",
            Op::LtF => "LTF",
            Op::LtS => "LTS",
            Op::GtI => "GTI",
            Op::GtF => "GTF",
            Op::GtS => "GTS",
            Op::EqI => "EQI",
            Op::EqF => "EQF",
            Op::EqS => "EQS",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::ReadI => "READI",
            Op::ReadF => "READF",
            Op::ReadS => "READS",
            Op::WriteI => "WRITEI",
            Op::WriteF => "WRITEF",
            Op::WriteS => "WRITES",
            Op::GetSize => "GETSIZE",
            Op::Resize => "RESIZE",
            Op::GetWord => "GETWORD",
            Op::SetWord => "SETWORD",
            Op::Create => "CREATE",
            Op::Call => "CALL",
            Op::Return => "RETURN",
            Op::Jump => "JUMP",
            Op::JumpZ => "JUMPZ",
            Op::Label => "LABEL",
        };
        write!(f, "{}", s)
    }
}
