//! Code generator
//!
//! Consumes the global symbol table after pass 2 and emits the textual
//! VM program: prolog, built-in templates, every function and method,
//! synthesized constructors, per-class vtable routines, and the final
//! `ENDOFPROGRAM` label. Semantic violations are already filtered; any
//! IR shape this module cannot lower raises an internal error, never a
//! user-error kind.

mod class;
mod expr;
mod frame;

pub use class::{attribute_offset, object_size};
pub use frame::Frame;

use crate::builtins;
use crate::opcode::Op;
use frame::format_slot;
use rustc_hash::FxHashMap;
use vypc_ir::{
    ClassId, CompileError, CompileResult, ExprKind, FunctionId, Instr, InstrId, Program,
};
use vypc_parser::{Symbol, SymbolTable};

/// Generate the complete VM program for a compiled unit.
pub fn generate(
    program: &mut Program,
    global: &SymbolTable,
    verbose: bool,
) -> CompileResult<String> {
    let mut generator = Generator::new(verbose);
    generator.run(program, global)?;
    Ok(generator.out)
}

pub struct Generator {
    verbose: bool,
    out: String,
    // Per-compile monotonic label counters.
    if_label: u32,
    while_label: u32,
    concat_label: u32,
    vtables: FxHashMap<ClassId, Vec<FunctionId>>,
    method_slots: FxHashMap<(ClassId, String), usize>,
}

impl Generator {
    fn new(verbose: bool) -> Self {
        Generator {
            verbose,
            out: String::new(),
            if_label: 0,
            while_label: 0,
            concat_label: 0,
            vtables: FxHashMap::default(),
            method_slots: FxHashMap::default(),
        }
    }

    pub(crate) fn line(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    fn template(&mut self, body: &str) {
        self.out.push_str(body);
    }

    /// Copy `$0` into a non-trivial destination.
    pub(crate) fn move_to(&mut self, dest: &str) {
        if !dest.is_empty() && dest != "$0" {
            self.line(format!("{} {}, $0", Op::Set, dest));
        }
    }

    pub(crate) fn emit_offset_comments(&mut self, program: &Program, frame: &Frame) {
        if !self.verbose {
            return;
        }
        for (alloca, offset) in &frame.layout {
            self.line(format!(
                "# {} {}",
                program.alloca(*alloca).name,
                format_slot(*offset)
            ));
        }
    }

    fn run(&mut self, program: &mut Program, global: &SymbolTable) -> CompileResult<()> {
        self.line("#! /bin/vypint");
        self.line("# VYPcode: 1.0");
        self.line(format!("{} [$SP] main", Op::Call));
        self.line(format!("{} ENDOFPROGRAM", Op::Jump));

        let classes: Vec<ClassId> = global
            .iter()
            .filter_map(|(_, symbol)| match symbol {
                Symbol::Class(c) => Some(c),
                _ => None,
            })
            .collect();
        self.build_vtables(program, &classes);

        let symbols: Vec<(String, Symbol)> = global
            .iter()
            .map(|(name, symbol)| (name.to_string(), symbol))
            .collect();
        for (name, symbol) in symbols {
            match symbol {
                Symbol::Function(function) => match name.as_str() {
                    "readInt" => self.template(builtins::READ_INT),
                    "readFloat" => self.template(builtins::READ_FLOAT),
                    "readString" => self.template(builtins::READ_STRING),
                    "length" => self.template(builtins::LENGTH),
                    "subStr" => self.template(builtins::SUBSTR),
                    // Lowered inline at every call site.
                    "print" => {}
                    _ => self.generate_function(program, function)?,
                },
                Symbol::Class(class) => {
                    if name == "Object" {
                        self.template(builtins::OBJECT_TO_STRING);
                        self.template(builtins::OBJECT_GET_CLASS);
                    } else {
                        for (method, _) in program.class(class).methods.clone() {
                            self.generate_function(program, method)?;
                        }
                    }
                    self.generate_constructor(program, class)?;
                }
                Symbol::Variable(_) => {
                    return Err(CompileError::internal(format!(
                        "unexpected variable {} in the global scope",
                        name
                    )))
                }
            }
        }

        self.template(builtins::INT2STRING_BODY);

        for class in classes {
            self.generate_vtable(program, class)?;
        }

        self.line("LABEL ENDOFPROGRAM");
        Ok(())
    }

    fn generate_function(
        &mut self,
        program: &mut Program,
        function: FunctionId,
    ) -> CompileResult<()> {
        let body = match program.function(function).body {
            Some(body) => body,
            // Built-in shells have no bodies; their templates are
            // emitted elsewhere.
            None => return Ok(()),
        };
        let label = program.function(function).label();
        let mut frame = Frame::build(program, function)?;

        self.line(format!("{} {}", Op::Label, label));
        if frame.local_count > 0 {
            self.line(format!("{} $SP, $SP, {}", Op::AddI, frame.local_count));
        }
        self.emit_offset_comments(program, &frame);

        self.generate_block(program, body, &mut frame)?;

        let ends_with_return = program
            .block(body)
            .last()
            .map(|i| matches!(program.instr(i), Instr::Return { .. }))
            .unwrap_or(false);
        if !ends_with_return {
            self.line(format!("{} $0, 0", Op::Set));
            self.generate_epilog(&frame);
        }
        Ok(())
    }

    fn generate_block(
        &mut self,
        program: &Program,
        block: vypc_ir::BlockId,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        let instrs = program.block(block).instrs.clone();
        for instr in instrs {
            self.generate_instr(program, instr, frame)?;
        }
        if let Some(next) = program.block(block).next {
            self.generate_block(program, next, frame)?;
        }
        Ok(())
    }

    fn generate_instr(
        &mut self,
        program: &Program,
        instr: InstrId,
        frame: &mut Frame,
    ) -> CompileResult<()> {
        match program.instr(instr).clone() {
            // Storage is laid out in the frame pass.
            Instr::Alloca(_) => Ok(()),

            Instr::Assignment { dest: Some(dest), expr } => {
                self.gen_expr(program, expr, "$0", frame)?;
                let slot = frame.slot(program, dest)?;
                self.line(format!("{} {}, $0", Op::Set, slot));
                Ok(())
            }
            Instr::Assignment { dest: None, expr } => {
                self.gen_expr(program, expr, "", frame)
            }

            Instr::ObjectAssignment { dest, expr } => {
                let (object, attribute, class) = match program.expr(dest).kind.clone() {
                    ExprKind::ObjectAttribute {
                        object,
                        attribute,
                        class,
                    } => (object, attribute, class),
                    _ => {
                        return Err(CompileError::internal(
                            "object assignment destination is not an attribute access",
                        ))
                    }
                };
                // The value goes first; a non-simple value waits in its
                // temporary while the object pointer is computed.
                if !program.expr(expr).is_simple() {
                    let temp = frame.temp(expr)?;
                    let slot = frame.slot(program, temp)?;
                    self.gen_expr(program, expr, &slot, frame)?;
                }
                if program.expr(object).is_simple() {
                    let value = self.operand_value(program, object, frame)?;
                    self.line(format!("{} $1, {}", Op::Set, value));
                } else {
                    self.gen_expr(program, object, "$0", frame)?;
                    self.line(format!("{} $1, $0", Op::Set));
                }
                let value = self.operand_value(program, expr, frame)?;
                self.line(format!("{} $0, {}", Op::Set, value));
                let offset = attribute_offset(program, class, attribute)?;
                self.line(format!("{} $1, {}, $0", Op::SetWord, offset));
                Ok(())
            }

            Instr::Branch {
                cond,
                if_block,
                else_block,
            } => {
                let n = self.if_label;
                self.if_label += 1;
                let begin_label = format!("if_begin_{}", n);
                let else_label = format!("if_else_{}", n);
                let end_label = format!("if_end_{}", n);

                self.gen_expr(program, cond, "$0", frame)?;
                self.line(format!("{} {}, $0", Op::JumpZ, else_label));
                self.line(format!("{} {}", Op::Label, begin_label));
                self.generate_block(program, if_block, frame)?;
                self.line(format!("{} {}", Op::Jump, end_label));
                self.line(format!("{} {}", Op::Label, else_label));
                self.generate_block(program, else_block, frame)?;
                self.line(format!("{} {}", Op::Label, end_label));
                Ok(())
            }

            Instr::Loop { cond, body } => {
                let n = self.while_label;
                self.while_label += 1;
                let cond_label = format!("while_cond_{}", n);
                let end_label = format!("while_end_{}", n);

                self.line(format!("{} {}", Op::Label, cond_label));
                self.gen_expr(program, cond, "$0", frame)?;
                self.line(format!("{} {}, $0", Op::JumpZ, end_label));
                self.generate_block(program, body, frame)?;
                self.line(format!("{} {}", Op::Jump, cond_label));
                self.line(format!("{} {}", Op::Label, end_label));
                Ok(())
            }

            Instr::Return { expr } => {
                match expr {
                    Some(expr) => self.gen_expr(program, expr, "$0", frame)?,
                    // Void returns clear the result register.
                    None => self.line(format!("{} $0, 0", Op::Set)),
                }
                self.generate_epilog(frame);
                Ok(())
            }

            Instr::Dummy => Err(CompileError::internal(
                "dummy instruction reached the generator",
            )),
        }
    }

    fn generate_epilog(&mut self, frame: &Frame) {
        if frame.local_count > 0 {
            self.line(format!("{} $SP, $SP, {}", Op::SubI, frame.local_count));
        }
        self.line(format!("{} $1, [$SP]", Op::Set));
        self.line(format!("{} $SP, $SP, {}", Op::SubI, frame.arg_count + 1));
        self.line(format!("{} $1", Op::Return));
    }
}
