//! Expression lowering
//!
//! Destination convention: every expression evaluates into a named
//! destination (`$0`, another register, or a `[$SP-k]` slot); an empty
//! destination discards the result and is only legal for statement-
//! level calls. Binary operands follow the simple/non-simple policy:
//! a simple operand is materialized into `$1`/`$2` late, a non-simple
//! operand is evaluated into its pre-assigned frame temporary first.

use super::frame::{format_slot, Frame};
use super::Generator;
use crate::builtins;
use crate::opcode::Op;
use vypc_ir::{
    BinaryOp, CompileError, CompileResult, Datatype, ExprId, ExprKind, Literal, PrimitiveType,
    Program,
};

impl Generator {
    pub(crate) fn gen_expr(
        &mut self,
        program: &Program,
        expr: ExprId,
        dest: &str,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        match program.expr(expr).kind.clone() {
            ExprKind::Literal(value) => {
                if !dest.is_empty() {
                    self.line(format!("{} {}, {}", Op::Set, dest, value.vypcode_repr()));
                }
                Ok(())
            }
            ExprKind::Symbol(alloca) => {
                if !dest.is_empty() {
                    let slot = frame.slot(program, alloca)?;
                    self.line(format!("{} {}, {}", Op::Set, dest, slot));
                }
                Ok(())
            }
            ExprKind::Super { this, .. } => {
                if !dest.is_empty() {
                    let slot = frame.slot(program, this)?;
                    self.line(format!("{} {}, {}", Op::Set, dest, slot));
                }
                Ok(())
            }
            ExprKind::Binary { op, lhs, rhs } => self.gen_binary(program, op, lhs, rhs, dest, frame),
            ExprKind::Not(inner) => {
                self.gen_expr(program, inner, "$0", frame)?;
                self.line(format!("{} $0, $0", Op::Not));
                self.move_to(dest);
                Ok(())
            }
            ExprKind::ObjectCast { inner, .. } => {
                // Pointers are untyped at the bit level.
                self.gen_expr(program, inner, dest, frame)
            }
            ExprKind::StringCast { inner } => {
                self.gen_call(program, builtins::INT2STRING, &[inner], dest, frame)
            }
            ExprKind::FunctionCall {
                function,
                args: Some(args),
            } => {
                let f = program.function(function);
                if f.name == "print" && f.prefix.is_none() {
                    return self.gen_print(program, &args, frame);
                }
                let label = f.label();
                self.gen_call(program, &label, &args, dest, frame)
            }
            ExprKind::Constructor { class } => {
                // `new C` is a constructor call with the "allocate"
                // sentinel as its only argument.
                let label = format!("{}$constructor", program.class(class).name);
                self.line(format!("{} $SP, $SP, 2", Op::AddI));
                frame.shift_sp(2);
                self.line(format!("{} [$SP-1], 0", Op::Set));
                self.line(format!("{} [$SP] {}", Op::Call, label));
                frame.shift_sp(-2);
                self.move_to(dest);
                Ok(())
            }
            ExprKind::Method {
                function,
                context,
                args: Some(args),
            } => {
                if matches!(program.expr(context).kind, ExprKind::Super { .. }) {
                    // Static dispatch to the resolved ancestor method.
                    let label = program.function(function).label();
                    return self.gen_call(program, &label, &args, dest, frame);
                }
                self.gen_dynamic_call(program, function, context, &args, dest, frame)
            }
            ExprKind::ObjectAttribute {
                object,
                attribute,
                class,
            } => {
                self.load_operand(program, object, "$1", frame)?;
                let offset = super::class::attribute_offset(program, class, attribute)?;
                self.line(format!("{} $0, $1, {}", Op::GetWord, offset));
                self.move_to(dest);
                Ok(())
            }
            ExprKind::FunctionCall { args: None, .. } | ExprKind::Method { args: None, .. } => {
                Err(CompileError::internal(
                    "bare function reference reached the generator",
                ))
            }
            ExprKind::Dummy => Err(CompileError::internal(
                "dummy expression reached the generator",
            )),
        }
    }

    /// Materialize `expr` into a specific register: simple expressions
    /// load directly, everything else evaluates through `$0`.
    fn load_operand(
        &mut self,
        program: &Program,
        expr: ExprId,
        register: &str,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        if program.expr(expr).is_simple() {
            let value = self.operand_value(program, expr, frame)?;
            self.line(format!("{} {}, {}", Op::Set, register, value));
        } else {
            self.gen_expr(program, expr, "$0", frame)?;
            if register != "$0" {
                self.line(format!("{} {}, $0", Op::Set, register));
            }
        }
        Ok(())
    }

    /// Source spelling of an already-available operand: a literal, a
    /// frame slot, or the temporary the operand was evaluated into.
    pub(crate) fn operand_value(
        &self,
        program: &Program,
        expr: ExprId,
        frame: &Frame,
    ) -> CompileResult<String> {
        match &program.expr(expr).kind {
            ExprKind::Literal(value) => Ok(value.vypcode_repr()),
            ExprKind::Symbol(alloca) => frame.slot(program, *alloca),
            ExprKind::Super { this, .. } => frame.slot(program, *this),
            _ => frame.slot(program, frame.temp(expr)?),
        }
    }

    fn gen_binary(
        &mut self,
        program: &Program,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        dest: &str,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        let operand_ty = program.expr_type(lhs).clone();

        // Evaluate non-simple operands into their frame temporaries so
        // neither evaluation clobbers the other.
        for operand in [lhs, rhs] {
            if !program.expr(operand).is_simple() {
                let temp = frame.temp(operand)?;
                let slot = frame.slot(program, temp)?;
                self.gen_expr(program, operand, &slot, frame)?;
            }
        }

        if op == BinaryOp::Add && operand_ty == Datatype::Primitive(PrimitiveType::String) {
            return self.gen_concat(program, lhs, rhs, dest, frame);
        }

        let lhs_value = self.operand_value(program, lhs, frame)?;
        let rhs_value = self.operand_value(program, rhs, frame)?;
        self.line(format!("{} $1, {}", Op::Set, lhs_value));
        self.line(format!("{} $2, {}", Op::Set, rhs_value));

        // Objects compare and combine as pointer words.
        let prim = match &operand_ty {
            Datatype::Primitive(p) => *p,
            _ => PrimitiveType::Int,
        };

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let mnemonic = arithmetic_op(op, prim);
                self.line(format!("{} $0, $1, $2", mnemonic));
            }
            BinaryOp::And => self.line(format!("{} $0, $1, $2", Op::And)),
            BinaryOp::Or => self.line(format!("{} $0, $1, $2", Op::Or)),
            _ => {
                let (mnemonic, negate) = comparison_op(op, prim);
                self.line(format!("{} $0, $1, $2", mnemonic));
                if negate {
                    self.line(format!("{} $0, $0", Op::Not));
                }
            }
        }
        self.move_to(dest);
        Ok(())
    }

    /// String concatenation: clone the left operand, grow it, and copy
    /// the right operand word by word.
    fn gen_concat(
        &mut self,
        program: &Program,
        lhs: ExprId,
        rhs: ExprId,
        dest: &str,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        let lhs_value = self.operand_value(program, lhs, frame)?;
        let rhs_value = self.operand_value(program, rhs, frame)?;
        self.line(format!("{} $1, {}", Op::Set, lhs_value));
        self.line(format!("{} $2, {}", Op::Set, rhs_value));

        let n = self.concat_label;
        self.concat_label += 1;
        let loop_label = format!("concat_loop_{}", n);
        let end_label = format!("concat_end_{}", n);

        self.line(format!("{} $3, $1", Op::Copy));
        self.line(format!("{} $4, $1", Op::GetSize));
        self.line(format!("{} $5, $2", Op::GetSize));
        self.line(format!("{} $6, $4, $5", Op::AddI));
        self.line(format!("{} $3, $6", Op::Resize));
        self.line(format!("{} $7, 0", Op::Set));
        self.line(format!("{} {}", Op::Label, loop_label));
        self.line(format!("{} $0, $7, $5", Op::LtI));
        self.line(format!("{} {}, $0", Op::JumpZ, end_label));
        self.line(format!("{} $0, $2, $7", Op::GetWord));
        self.line(format!("{} $8, $4, $7", Op::AddI));
        self.line(format!("{} $3, $8, $0", Op::SetWord));
        self.line(format!("{} $7, $7, 1", Op::AddI));
        self.line(format!("{} {}", Op::Jump, loop_label));
        self.line(format!("{} {}", Op::Label, end_label));
        self.line(format!("{} $0, $3", Op::Set));
        self.move_to(dest);
        Ok(())
    }

    /// Standard direct call: reserve argument slots plus the return-
    /// address slot, fill them, call, and let the callee clean up.
    pub(crate) fn gen_call(
        &mut self,
        program: &Program,
        label: &str,
        args: &[ExprId],
        dest: &str,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        let n = args.len() as i64;
        self.line(format!("{} $SP, $SP, {}", Op::AddI, n + 1));
        frame.shift_sp(n + 1);
        for (i, arg) in args.iter().enumerate() {
            self.gen_expr(program, *arg, "$0", frame)?;
            self.line(format!("{} {}, $0", Op::Set, format_slot(n - i as i64)));
        }
        self.line(format!("{} [$SP] {}", Op::Call, label));
        frame.shift_sp(-(n + 1));
        self.move_to(dest);
        Ok(())
    }

    /// Virtual dispatch: the receiver is argument 0; its vtable lives
    /// in object word 0 and the method pointer at the class's slot.
    fn gen_dynamic_call(
        &mut self,
        program: &Program,
        function: vypc_ir::FunctionId,
        context: ExprId,
        args: &[ExprId],
        dest: &str,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        let method_name = program.function(function).name.clone();
        let class_name = program
            .expr_type(context)
            .object_name()
            .ok_or_else(|| CompileError::internal("method receiver is not object-typed"))?
            .to_string();
        let class = program
            .find_class(&class_name)
            .ok_or_else(|| CompileError::internal("method receiver class is missing"))?;
        let slot = self
            .method_slots
            .get(&(class, method_name.clone()))
            .copied()
            .ok_or_else(|| {
                CompileError::internal(format!(
                    "no vtable slot for method {} of class {}",
                    method_name, class_name
                ))
            })?;

        let n = args.len() as i64;
        self.line(format!("{} $SP, $SP, {}", Op::AddI, n + 1));
        frame.shift_sp(n + 1);
        for (i, arg) in args.iter().enumerate() {
            self.gen_expr(program, *arg, "$0", frame)?;
            self.line(format!("{} {}, $0", Op::Set, format_slot(n - i as i64)));
        }
        self.line(format!("{} $1, {}", Op::Set, format_slot(n)));
        self.line(format!("{} $2, $1, 0", Op::GetWord));
        self.line(format!("{} $2, $2, {}", Op::GetWord, slot + 1));
        self.line(format!("{} [$SP] $2", Op::Call));
        frame.shift_sp(-(n + 1));
        self.move_to(dest);
        Ok(())
    }

    /// `print` lowers inline: one typed write per argument.
    fn gen_print(
        &mut self,
        program: &Program,
        args: &[ExprId],
        frame: &mut Frame,
    ) -> CompileResult<()> {
        for arg in args {
            self.gen_expr(program, *arg, "$0", frame)?;
            let write = match program.expr_type(*arg) {
                Datatype::Primitive(PrimitiveType::Int) => Op::WriteI,
                Datatype::Primitive(PrimitiveType::Float) => Op::WriteF,
                Datatype::Primitive(PrimitiveType::String) => Op::WriteS,
                other => {
                    return Err(CompileError::internal(format!(
                        "non-primitive print argument of type {}",
                        other
                    )))
                }
            };
            self.line(format!("{} $0", write));
        }
        Ok(())
    }

    /// Default value an attribute of the given type initializes to.
    pub(crate) fn default_value(ty: &Datatype) -> String {
        match ty {
            Datatype::Primitive(PrimitiveType::Int) => Literal::Int(0).vypcode_repr(),
            Datatype::Primitive(PrimitiveType::Float) => Literal::Float(0.0).vypcode_repr(),
            Datatype::Primitive(PrimitiveType::String) => {
                Literal::String(String::new()).vypcode_repr()
            }
            // Object references start out null.
            _ => "0".to_string(),
        }
    }
}

fn arithmetic_op(op: BinaryOp, prim: PrimitiveType) -> Op {
    match (op, prim) {
        (BinaryOp::Add, PrimitiveType::Int) => Op::AddI,
        (BinaryOp::Sub, PrimitiveType::Int) => Op::SubI,
        (BinaryOp::Mul, PrimitiveType::Int) => Op::MulI,
        (BinaryOp::Div, PrimitiveType::Int) => Op::DivI,
        (BinaryOp::Add, PrimitiveType::Float) => Op::AddF,
        (BinaryOp::Sub, PrimitiveType::Float) => Op::SubF,
        (BinaryOp::Mul, PrimitiveType::Float) => Op::MulF,
        (BinaryOp::Div, PrimitiveType::Float) => Op::DivF,
        // String arithmetic is concat only, handled before dispatch.
        _ => unreachable!("expression construction rejects other arithmetic operands"),
    }
}

/// Typed comparison mnemonic plus whether the result must be negated
/// (`!=`, `<=`, `>=` derive from their complements).
fn comparison_op(op: BinaryOp, prim: PrimitiveType) -> (Op, bool) {
    let eq = match prim {
        PrimitiveType::Int => Op::EqI,
        PrimitiveType::Float => Op::EqF,
        PrimitiveType::String => Op::EqS,
    };
    let lt = match prim {
        PrimitiveType::Int => Op::LtI,
        PrimitiveType::Float => Op::LtF,
        PrimitiveType::String => Op::LtS,
    };
    let gt = match prim {
        PrimitiveType::Int => Op::GtI,
        PrimitiveType::Float => Op::GtF,
        PrimitiveType::String => Op::GtS,
    };
    match op {
        BinaryOp::Equal => (eq, false),
        BinaryOp::NotEqual => (eq, true),
        BinaryOp::Less => (lt, false),
        BinaryOp::GreaterEqual => (lt, true),
        BinaryOp::Greater => (gt, false),
        BinaryOp::LessEqual => (gt, true),
        _ => unreachable!("arithmetic and logical ops dispatch elsewhere"),
    }
}
