//! IR instructions
//!
//! One tagged enum for the whole statement family; every consumer
//! matches it exhaustively. Top-level `Function` and `Class` nodes live
//! in their own arenas and never appear inside blocks.

use crate::program::{AllocaId, BlockId, ExprId};

#[derive(Debug, Clone)]
pub enum Instr {
    /// Storage declaration; layout happens in the generator.
    Alloca(AllocaId),

    /// `dest = expr`, or expression evaluated for side effect when
    /// `dest` is absent (call statements).
    Assignment {
        dest: Option<AllocaId>,
        expr: ExprId,
    },

    /// `object.attr = expr`; `dest` is an attribute access expression.
    ObjectAssignment { dest: ExprId, expr: ExprId },

    /// Two-armed conditional over nested blocks.
    Branch {
        cond: ExprId,
        if_block: BlockId,
        else_block: BlockId,
    },

    /// Pre-tested loop over a nested body block.
    Loop { cond: ExprId, body: BlockId },

    /// Return; absent expression means void return.
    Return { expr: Option<ExprId> },

    /// Placeholder produced by the index pass. Reaching the generator
    /// with one of these is an internal error.
    Dummy,
}
