//! Class layout, vtables, and constructor synthesis
//!
//! Object layout: word 0 is the vtable pointer, attributes follow with
//! parent attributes first. Each class gets a `vtable$C` routine that
//! builds the dispatch table (word 0: the class-name string, words
//! 1..: method labels), and a synthesized `C$constructor` that
//! allocates, wires the vtable, chains to the parent constructor with
//! the same object, runs field initializers, and calls the explicit
//! constructor body if the user wrote one.

use super::frame::{collect_expr_temps, Frame};
use super::Generator;
use crate::opcode::Op;
use rustc_hash::FxHashMap;
use vypc_ir::{
    AllocaId, ClassId, CompileError, CompileResult, Datatype, FunctionId, Literal, Program,
};

/// Total object size in words: the vtable slot plus every attribute in
/// the ancestor chain.
pub fn object_size(program: &Program, class: ClassId) -> i64 {
    let c = program.class(class);
    let base = match c.parent {
        Some(parent) => object_size(program, parent),
        None => 1,
    };
    base + c.attributes.len() as i64
}

/// Word offset of an attribute within objects of its defining class
/// (and, by layout-prefix, of every subclass).
pub fn attribute_offset(
    program: &Program,
    class: ClassId,
    attribute: AllocaId,
) -> CompileResult<i64> {
    let c = program.class(class);
    let base = match c.parent {
        Some(parent) => object_size(program, parent),
        None => 1,
    };
    match c.attributes.iter().position(|(a, _)| *a == attribute) {
        Some(index) => Ok(base + index as i64),
        None => Err(CompileError::internal(format!(
            "attribute {} is not laid out in class {}",
            program.alloca(attribute).name,
            c.name
        ))),
    }
}

impl Generator {
    /// Compute every class's vtable order and the per-class
    /// method-name → slot map. Inherited methods keep the parent's
    /// slot, overrides replace in place, new methods append.
    pub(crate) fn build_vtables(&mut self, program: &Program, classes: &[ClassId]) {
        for class in classes {
            self.vtable_for(program, *class);
        }
    }

    fn vtable_for(&mut self, program: &Program, class: ClassId) -> Vec<FunctionId> {
        if let Some(table) = self.vtables.get(&class) {
            return table.clone();
        }
        let mut table = match program.class(class).parent {
            Some(parent) => self.vtable_for(program, parent),
            None => Vec::new(),
        };
        let class_name = program.class(class).name.clone();
        for (method, _) in program.class(class).methods.clone() {
            let name = program.function(method).name.clone();
            // The constructor is not dispatched.
            if name == class_name {
                continue;
            }
            match table
                .iter()
                .position(|f| program.function(*f).name == name)
            {
                Some(slot) => table[slot] = method,
                None => table.push(method),
            }
        }
        for (index, method) in table.iter().enumerate() {
            self.method_slots
                .insert((class, program.function(*method).name.clone()), index);
        }
        self.vtables.insert(class, table.clone());
        table
    }

    /// Emit the `vtable$C` routine: builds the table array and returns
    /// it in `$0`.
    pub(crate) fn generate_vtable(
        &mut self,
        program: &Program,
        class: ClassId,
    ) -> CompileResult<()> {
        let name = program.class(class).name.clone();
        let table = self
            .vtables
            .get(&class)
            .cloned()
            .ok_or_else(|| CompileError::internal(format!("no vtable built for class {}", name)))?;

        self.line(format!("{} vtable${}", Op::Label, name));
        self.line(format!("{} $0, {}", Op::Create, table.len() as i64 + 1));
        self.line(format!(
            "{} $2, {}",
            Op::Set,
            Literal::String(name).vypcode_repr()
        ));
        self.line(format!("{} $0, 0, $2", Op::SetWord));
        for (index, method) in table.iter().enumerate() {
            self.line(format!(
                "{} $2, {}",
                Op::Set,
                program.function(*method).label()
            ));
            self.line(format!("{} $0, {}, $2", Op::SetWord, index + 1));
        }
        self.line(format!("{} $1, [$SP]", Op::Set));
        self.line(format!("{} $SP, $SP, 1", Op::SubI));
        self.line(format!("{} $1", Op::Return));
        Ok(())
    }

    /// Emit the synthesized `C$constructor`. Its single argument is an
    /// object pointer, or `0` meaning "allocate a fresh object": the
    /// outermost call allocates and wires the vtable, the parent chain
    /// receives the existing pointer and only initializes its own
    /// attribute range. Returns the object pointer in `$0`.
    pub(crate) fn generate_constructor(
        &mut self,
        program: &mut Program,
        class: ClassId,
    ) -> CompileResult<()> {
        let name = program.class(class).name.clone();
        let parent = program.class(class).parent;
        let implicit = program.class(class).implicit.clone();
        let explicit = program.class(class).constructor;
        let size = object_size(program, class);

        // Synthesized frame: one argument (the pointer-or-zero), one
        // local holding the object, plus temporaries for initializer
        // expressions.
        let input = program.new_alloca(Datatype::Object(name.clone()), "obj");
        let this_slot = program.new_alloca(Datatype::Object(name.clone()), "this");
        let mut temps = FxHashMap::default();
        let mut temp_order = Vec::new();
        for (_, init) in &implicit {
            if let Some(init) = init {
                collect_expr_temps(program, *init, &mut temps, &mut temp_order);
            }
        }
        let mut locals = vec![this_slot];
        locals.extend(temp_order);
        let mut frame = Frame::from_layout(&[input], &locals, temps);

        let alloc_label = format!("{}$constructor_alloc", name);
        let init_label = format!("{}$constructor_init", name);

        self.line(format!("{} {}$constructor", Op::Label, name));
        self.line(format!("{} $SP, $SP, {}", Op::AddI, frame.local_count));
        self.emit_offset_comments(program, &frame);

        let input_slot = frame.slot(program, input)?;
        let self_slot = frame.slot(program, this_slot)?;
        self.line(format!("{} $0, {}", Op::Set, input_slot));
        self.line(format!("{} {}, $0", Op::Set, self_slot));
        self.line(format!("{} {}, $0", Op::JumpZ, alloc_label));
        self.line(format!("{} {}", Op::Jump, init_label));

        // Fresh allocation: create the object and install the vtable.
        self.line(format!("{} {}", Op::Label, alloc_label));
        self.line(format!("{} $0, {}", Op::Create, size));
        self.line(format!("{} {}, $0", Op::Set, self_slot));
        self.line(format!("{} $SP, $SP, 1", Op::AddI));
        frame.shift_sp(1);
        self.line(format!("{} [$SP] vtable${}", Op::Call, name));
        frame.shift_sp(-1);
        self.line(format!("{} $1, {}", Op::Set, self_slot));
        self.line(format!("{} $1, 0, $0", Op::SetWord));

        self.line(format!("{} {}", Op::Label, init_label));

        // Parent constructor on the same object.
        if let Some(parent) = parent {
            let parent_name = program.class(parent).name.clone();
            self.line(format!("{} $SP, $SP, 2", Op::AddI));
            frame.shift_sp(2);
            self.line(format!("{} $0, {}", Op::Set, frame.slot(program, this_slot)?));
            self.line(format!("{} [$SP-1], $0", Op::Set));
            self.line(format!("{} [$SP] {}$constructor", Op::Call, parent_name));
            frame.shift_sp(-2);
        }

        // This class's attribute initializers.
        for (attribute, init) in &implicit {
            match init {
                Some(init) => self.gen_expr(program, *init, "$0", &mut frame)?,
                None => {
                    let ty = program.alloca(*attribute).ty.clone();
                    self.line(format!("{} $0, {}", Op::Set, Self::default_value(&ty)));
                }
            }
            let offset = attribute_offset(program, class, *attribute)?;
            self.line(format!("{} $1, {}", Op::Set, frame.slot(program, this_slot)?));
            self.line(format!("{} $1, {}, $0", Op::SetWord, offset));
        }

        // Explicit constructor body, as an ordinary method call.
        if let Some(explicit) = explicit {
            let label = program.function(explicit).label();
            self.line(format!("{} $SP, $SP, 2", Op::AddI));
            frame.shift_sp(2);
            self.line(format!("{} $0, {}", Op::Set, frame.slot(program, this_slot)?));
            self.line(format!("{} [$SP-1], $0", Op::Set));
            self.line(format!("{} [$SP] {}", Op::Call, label));
            frame.shift_sp(-2);
        }

        // Return the object pointer.
        self.line(format!("{} $0, {}", Op::Set, frame.slot(program, this_slot)?));
        self.line(format!("{} $SP, $SP, {}", Op::SubI, frame.local_count));
        self.line(format!("{} $1, [$SP]", Op::Set));
        self.line(format!("{} $SP, $SP, 2", Op::SubI));
        self.line(format!("{} $1", Op::Return));
        Ok(())
    }
}
