//! Basic blocks
//!
//! A block is an ordered list of instructions with no internal
//! control-flow entry points. Structured constructs (`Branch`, `Loop`)
//! own their nested blocks directly; labels only appear at code
//! generation time.

use crate::program::{BlockId, InstrId};

#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique name: user name plus the program's monotonic suffix.
    pub name: String,
    pub instrs: Vec<InstrId>,
    /// Optional continuation block.
    pub next: Option<BlockId>,
}

impl BasicBlock {
    pub fn first(&self) -> Option<InstrId> {
        self.instrs.first().copied()
    }

    pub fn last(&self) -> Option<InstrId> {
        self.instrs.last().copied()
    }
}
