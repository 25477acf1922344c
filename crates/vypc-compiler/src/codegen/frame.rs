//! Call-frame layout
//!
//! Frames grow upward; `$SP` points at the topmost live slot. For a
//! callee with `A` arguments and `L` locals the layout (low to high)
//! is `arg0 .. argA-1, returnAddr, loc0 .. locL-1`, with `$SP` at the
//! return-address slot on entry and at the last local after the
//! prolog. Every local, parameter, and lowered temporary is a frame
//! slot addressed as `[$SP-k]`; when emitted code moves `$SP`
//! mid-expression (a nested call's reservation), the pending delta is
//! folded into every lookup so the emitted offsets stay correct.

use rustc_hash::FxHashMap;
use vypc_ir::{
    AllocaId, BlockId, CompileError, CompileResult, ExprId, ExprKind, FunctionId, Instr,
    Program,
};

/// Render a frame offset in the VM's addressing syntax.
pub fn format_slot(offset: i64) -> String {
    if offset == 0 {
        "[$SP]".to_string()
    } else {
        format!("[$SP-{}]", offset)
    }
}

/// Offset map for one routine.
pub struct Frame {
    offsets: FxHashMap<AllocaId, i64>,
    /// Non-simple sub-expressions pinned to frame slots.
    temps: FxHashMap<ExprId, AllocaId>,
    /// Pending `$SP` movement from open call reservations.
    shift: i64,
    pub arg_count: i64,
    pub local_count: i64,
    /// Locals in layout order, for the verbose offset dump.
    pub layout: Vec<(AllocaId, i64)>,
}

impl Frame {
    /// Lay out a function: parameters from the signature, locals from
    /// the instruction tree (nested blocks included), and a fresh
    /// temporary slot for every non-simple operand position. Temps are
    /// created in the program arena so they have ordinary alloca
    /// identities.
    pub fn build(program: &mut Program, function: FunctionId) -> CompileResult<Frame> {
        let args = program.function(function).args.clone();
        let body = program.function(function).body;

        let mut locals = Vec::new();
        if let Some(body) = body {
            collect_locals(program, body, &mut locals);
        }

        let mut temps = FxHashMap::default();
        if let Some(body) = body {
            let mut temp_order = Vec::new();
            collect_block_temps(program, body, &mut temps, &mut temp_order);
            locals.extend(temp_order);
        }

        Ok(Frame::from_layout(&args, &locals, temps))
    }

    /// Assemble a frame from explicit argument and local lists; the
    /// class-constructor synthesis uses this directly.
    pub fn from_layout(
        args: &[AllocaId],
        locals: &[AllocaId],
        temps: FxHashMap<ExprId, AllocaId>,
    ) -> Frame {
        let arg_count = args.len() as i64;
        let local_count = locals.len() as i64;
        let mut offsets = FxHashMap::default();
        let mut layout = Vec::new();

        // Last local sits at [$SP].
        for (j, local) in locals.iter().enumerate() {
            let offset = local_count - 1 - j as i64;
            offsets.insert(*local, offset);
            layout.push((*local, offset));
        }
        // Arguments live below the return-address slot at [$SP-L].
        for (i, arg) in args.iter().enumerate() {
            offsets.insert(*arg, local_count + arg_count - i as i64);
        }

        Frame {
            offsets,
            temps,
            shift: 0,
            arg_count,
            local_count,
            layout,
        }
    }

    /// Current `[$SP-k]` spelling of an alloca's slot.
    pub fn slot(&self, program: &Program, alloca: AllocaId) -> CompileResult<String> {
        match self.offsets.get(&alloca) {
            Some(base) => Ok(format_slot(base + self.shift)),
            None => Err(CompileError::internal(format!(
                "no stack offset for variable {}",
                program.alloca(alloca).prefixed_name()
            ))),
        }
    }

    /// Temporary slot assigned to a non-simple sub-expression.
    pub fn temp(&self, expr: ExprId) -> CompileResult<AllocaId> {
        self.temps.get(&expr).copied().ok_or_else(|| {
            CompileError::internal("no temporary slot assigned to a non-simple operand")
        })
    }

    /// Record `$SP` movement from an emitted reservation; lookups
    /// adjust until the matching release.
    pub fn shift_sp(&mut self, delta: i64) {
        self.shift += delta;
    }
}

/// Every alloca reachable through nested blocks, in declaration order.
fn collect_locals(program: &Program, block: BlockId, out: &mut Vec<AllocaId>) {
    let instrs = program.block(block).instrs.clone();
    for instr in instrs {
        match program.instr(instr) {
            Instr::Alloca(a) => out.push(*a),
            Instr::Branch {
                if_block,
                else_block,
                ..
            } => {
                collect_locals(program, *if_block, out);
                collect_locals(program, *else_block, out);
            }
            Instr::Loop { body, .. } => collect_locals(program, *body, out),
            _ => {}
        }
    }
    if let Some(next) = program.block(block).next {
        collect_locals(program, next, out);
    }
}

/// Walk every expression of a block tree and pin the non-simple
/// operands that must survive a sibling evaluation to fresh frame
/// slots: binary operands and object-assignment values.
fn collect_block_temps(
    program: &mut Program,
    block: BlockId,
    temps: &mut FxHashMap<ExprId, AllocaId>,
    order: &mut Vec<AllocaId>,
) {
    let instrs = program.block(block).instrs.clone();
    for instr in instrs {
        match program.instr(instr).clone() {
            Instr::Assignment { expr, .. } => collect_expr_temps(program, expr, temps, order),
            Instr::ObjectAssignment { dest, expr } => {
                if !program.expr(expr).is_simple() {
                    pin(program, expr, temps, order);
                }
                collect_expr_temps(program, dest, temps, order);
                collect_expr_temps(program, expr, temps, order);
            }
            Instr::Branch {
                cond,
                if_block,
                else_block,
            } => {
                collect_expr_temps(program, cond, temps, order);
                collect_block_temps(program, if_block, temps, order);
                collect_block_temps(program, else_block, temps, order);
            }
            Instr::Loop { cond, body } => {
                collect_expr_temps(program, cond, temps, order);
                collect_block_temps(program, body, temps, order);
            }
            Instr::Return { expr: Some(expr) } => {
                collect_expr_temps(program, expr, temps, order)
            }
            _ => {}
        }
    }
    if let Some(next) = program.block(block).next {
        collect_block_temps(program, next, temps, order);
    }
}

pub(crate) fn collect_expr_temps(
    program: &mut Program,
    expr: ExprId,
    temps: &mut FxHashMap<ExprId, AllocaId>,
    order: &mut Vec<AllocaId>,
) {
    match program.expr(expr).kind.clone() {
        ExprKind::Binary { lhs, rhs, .. } => {
            for operand in [lhs, rhs] {
                if !program.expr(operand).is_simple() {
                    pin(program, operand, temps, order);
                }
                collect_expr_temps(program, operand, temps, order);
            }
        }
        ExprKind::Not(inner)
        | ExprKind::StringCast { inner }
        | ExprKind::ObjectCast { inner, .. } => {
            collect_expr_temps(program, inner, temps, order)
        }
        ExprKind::FunctionCall {
            args: Some(args), ..
        } => {
            for arg in args {
                collect_expr_temps(program, arg, temps, order);
            }
        }
        ExprKind::Method {
            args: Some(args), ..
        } => {
            for arg in args {
                collect_expr_temps(program, arg, temps, order);
            }
        }
        ExprKind::ObjectAttribute { object, .. } => {
            collect_expr_temps(program, object, temps, order)
        }
        _ => {}
    }
}

fn pin(
    program: &mut Program,
    expr: ExprId,
    temps: &mut FxHashMap<ExprId, AllocaId>,
    order: &mut Vec<AllocaId>,
) {
    if temps.contains_key(&expr) {
        return;
    }
    let ty = program.expr_type(expr).clone();
    let temp = program.new_temp(ty);
    temps.insert(expr, temp);
    order.push(temp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vypc_ir::{Datatype, PrimitiveType};

    #[test]
    fn test_format_slot() {
        assert_eq!(format_slot(0), "[$SP]");
        assert_eq!(format_slot(3), "[$SP-3]");
    }

    #[test]
    fn test_layout_offsets() {
        let mut program = Program::new();
        let int = Datatype::Primitive(PrimitiveType::Int);
        let a0 = program.new_alloca(int.clone(), "a0");
        let a1 = program.new_alloca(int.clone(), "a1");
        let l0 = program.new_alloca(int.clone(), "l0");
        let l1 = program.new_alloca(int.clone(), "l1");
        let l2 = program.new_alloca(int, "l2");

        let frame = Frame::from_layout(&[a0, a1], &[l0, l1, l2], FxHashMap::default());
        // Last local at [$SP], first at [$SP-(L-1)].
        assert_eq!(frame.slot(&program, l2).unwrap(), "[$SP]");
        assert_eq!(frame.slot(&program, l0).unwrap(), "[$SP-2]");
        // arg i at [$SP-(L+A-i)].
        assert_eq!(frame.slot(&program, a0).unwrap(), "[$SP-5]");
        assert_eq!(frame.slot(&program, a1).unwrap(), "[$SP-4]");
    }

    #[test]
    fn test_shift_folds_into_lookup() {
        let mut program = Program::new();
        let int = Datatype::Primitive(PrimitiveType::Int);
        let l0 = program.new_alloca(int, "l0");
        let mut frame = Frame::from_layout(&[], &[l0], FxHashMap::default());
        assert_eq!(frame.slot(&program, l0).unwrap(), "[$SP]");
        frame.shift_sp(3);
        assert_eq!(frame.slot(&program, l0).unwrap(), "[$SP-3]");
        frame.shift_sp(-3);
        assert_eq!(frame.slot(&program, l0).unwrap(), "[$SP]");
    }

    #[test]
    fn test_missing_offset_is_internal_error() {
        let mut program = Program::new();
        let int = Datatype::Primitive(PrimitiveType::Int);
        let stray = program.new_alloca(int, "stray");
        let frame = Frame::from_layout(&[], &[], FxHashMap::default());
        let err = frame.slot(&program, stray).unwrap_err();
        assert_eq!(err.exit_code(), 19);
    }
}
