//! Index driver (pass 1)
//!
//! Recognizes every top-level class and function and registers shells
//! with full signatures so the second pass resolves forward references
//! without ordering constraints. Statement actions return `Dummy`
//! nodes; expression actions carry types but stay inert. Checks run
//! here only when their inputs are fully known, so each error is
//! reported exactly once across the two passes.

use crate::builtins::seed_global;
use crate::driver::Driver;
use crate::symbol_table::{ScopeStack, Symbol, SymbolTable};
use vypc_ir::{
    BinaryOp, Class, ClassId, CompileError, CompileResult, Datatype, ExprId, Function, Instr,
    InstrId, Literal, PrimitiveType, Program, Visibility,
};

pub struct IndexDriver {
    program: Program,
    scopes: ScopeStack,
    current_class: Option<ClassId>,
    in_function: bool,
    pending_visibility: Visibility,
}

impl IndexDriver {
    pub fn new() -> Self {
        let mut program = Program::new();
        let global = seed_global(&mut program);
        IndexDriver {
            program,
            scopes: ScopeStack::new(global),
            current_class: None,
            in_function: false,
            pending_visibility: Visibility::Public,
        }
    }

    /// Terminal state of pass 1: every top-level symbol registered with
    /// its signature, bodies empty.
    pub fn finish(self) -> (Program, SymbolTable) {
        (self.program, self.scopes.into_global())
    }

    fn dummy_instr(&mut self) -> InstrId {
        self.program.add_instr(Instr::Dummy)
    }

    fn dummy_expr(&mut self, ty: Datatype) -> ExprId {
        self.program.new_dummy_expr(ty)
    }
}

impl Default for IndexDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for IndexDriver {
    fn begin_function(
        &mut self,
        ret: Option<Datatype>,
        name: &str,
        params: &[(Datatype, String)],
    ) -> CompileResult<()> {
        if self.scopes.search_current(name).is_some() {
            return Err(CompileError::semantic(format!("Redefinition of {}", name)));
        }

        let mut function = Function::new(ret, name);
        let mut args = Vec::with_capacity(params.len() + 1);
        if let Some(class) = self.current_class {
            let class_name = self.program.class(class).name.clone();
            args.push(
                self.program
                    .new_alloca(Datatype::Object(class_name.clone()), "this"),
            );
            function.prefix = Some(class_name);
        }
        for (ty, pname) in params {
            args.push(self.program.new_alloca(ty.clone(), pname.clone()));
        }
        function.args = args;
        let function = self.program.add_function(function);

        self.scopes.insert(name, Symbol::Function(function));
        if let Some(class) = self.current_class {
            let visibility = self.pending_visibility;
            self.program.class_add_method(class, function, visibility)?;
        }

        self.scopes.push(false);
        for arg in self.program.function(function).args.clone() {
            let arg_name = self.program.alloca(arg).name.clone();
            if !self.scopes.insert(arg_name.clone(), Symbol::Variable(arg)) {
                return Err(CompileError::semantic(format!(
                    "Redefinition of {}",
                    arg_name
                )));
            }
        }
        self.in_function = true;
        Ok(())
    }

    fn end_function(&mut self, _body: Vec<InstrId>) -> CompileResult<()> {
        self.scopes.pop();
        self.in_function = false;
        Ok(())
    }

    fn begin_class(&mut self, name: &str, base: &str) -> CompileResult<()> {
        if self.scopes.search_global(name).is_some() {
            return Err(CompileError::semantic(format!("Redefinition of {}", name)));
        }
        let class = self.program.add_class(Class::new(name, None));

        // Tentative base: an unresolved name defaults to Object here
        // and is re-resolved by pass 2 once every class is known.
        match self.scopes.search_global(base) {
            Some(Symbol::Class(parent)) => {
                self.program.set_class_parent(class, parent)?;
            }
            Some(_) => {
                return Err(CompileError::incompatibility(format!(
                    "class {} inherits from {}, which is not a class",
                    name, base
                )))
            }
            None => {
                if let Some(Symbol::Class(object)) = self.scopes.search_global("Object") {
                    self.program.set_class_parent(class, object)?;
                }
            }
        }

        self.scopes.insert(name, Symbol::Class(class));
        self.scopes.push(true);
        self.current_class = Some(class);
        self.pending_visibility = Visibility::Public;
        Ok(())
    }

    fn end_class(&mut self) -> CompileResult<()> {
        self.scopes.pop();
        self.current_class = None;
        Ok(())
    }

    fn begin_block(&mut self) {
        self.scopes.push(false);
    }

    fn end_block(&mut self) {
        self.scopes.pop();
    }

    fn set_visibility(&mut self, vis: Visibility) {
        self.pending_visibility = vis;
    }

    fn declare(
        &mut self,
        ty: &Datatype,
        name: &str,
        init: Option<ExprId>,
    ) -> CompileResult<Vec<InstrId>> {
        if let (Some(class), false) = (self.current_class, self.in_function) {
            let class_name = self.program.class(class).name.clone();
            let alloca = self
                .program
                .new_member_alloca(ty.clone(), name, class_name);
            if !self.scopes.insert(name, Symbol::Variable(alloca)) {
                return Err(CompileError::semantic(format!("Redefinition of {}", name)));
            }
            let visibility = self.pending_visibility;
            self.program
                .class_add_attribute(class, alloca, visibility, init)?;
            return Ok(Vec::new());
        }

        let alloca = self.program.new_alloca(ty.clone(), name);
        if !self.scopes.insert(name, Symbol::Variable(alloca)) {
            return Err(CompileError::semantic(format!("Redefinition of {}", name)));
        }
        Ok(vec![self.dummy_instr()])
    }

    fn resolve_type(&mut self, name: &str) -> CompileResult<Datatype> {
        // Forward references are legal; existence is pass 2's check.
        Ok(Datatype::Object(name.to_string()))
    }

    fn assign(&mut self, _dest: ExprId, _value: ExprId) -> CompileResult<InstrId> {
        Ok(self.dummy_instr())
    }

    fn assign_to_name(&mut self, _name: &str, _value: ExprId) -> CompileResult<InstrId> {
        Ok(self.dummy_instr())
    }

    fn call_statement(&mut self, _call: ExprId) -> CompileResult<InstrId> {
        Ok(self.dummy_instr())
    }

    fn create_if(
        &mut self,
        _cond: ExprId,
        _if_body: Vec<InstrId>,
        _else_body: Vec<InstrId>,
    ) -> CompileResult<InstrId> {
        Ok(self.dummy_instr())
    }

    fn create_while(&mut self, _cond: ExprId, _body: Vec<InstrId>) -> CompileResult<InstrId> {
        Ok(self.dummy_instr())
    }

    fn create_return(&mut self, _value: Option<ExprId>) -> CompileResult<InstrId> {
        Ok(self.dummy_instr())
    }

    fn literal(&mut self, value: Literal) -> CompileResult<ExprId> {
        let ty = value.datatype();
        Ok(self.dummy_expr(ty))
    }

    fn identifier(&mut self, name: &str) -> CompileResult<ExprId> {
        let ty = match self.scopes.search_all(name) {
            Some(Symbol::Variable(a)) => self.program.alloca(a).ty.clone(),
            Some(Symbol::Function(_)) => Datatype::Function,
            _ => Datatype::Invalid,
        };
        Ok(self.dummy_expr(ty))
    }

    fn this_expr(&mut self) -> CompileResult<ExprId> {
        let ty = match self.current_class {
            Some(class) => Datatype::Object(self.program.class(class).name.clone()),
            None => Datatype::Invalid,
        };
        Ok(self.dummy_expr(ty))
    }

    fn super_expr(&mut self) -> CompileResult<ExprId> {
        let ty = self
            .current_class
            .and_then(|c| self.program.class(c).parent)
            .map(|p| Datatype::Object(self.program.class(p).name.clone()))
            .unwrap_or(Datatype::Invalid);
        Ok(self.dummy_expr(ty))
    }

    fn new_expr(&mut self, class_name: &str) -> CompileResult<ExprId> {
        Ok(self.dummy_expr(Datatype::Object(class_name.to_string())))
    }

    fn call_expr(&mut self, _callee: ExprId, _args: Vec<ExprId>) -> CompileResult<ExprId> {
        // The callee collapsed to a dummy, so the return type is gone;
        // pass 2 redoes this with the real function at hand.
        Ok(self.dummy_expr(Datatype::Invalid))
    }

    fn dot_expr(&mut self, _object: ExprId, _member: &str) -> CompileResult<ExprId> {
        // Member lists are still under construction in this pass.
        Ok(self.dummy_expr(Datatype::Invalid))
    }

    fn binary_expr(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> CompileResult<ExprId> {
        let lhs_ty = self.program.expr_type(lhs).clone();
        let rhs_ty = self.program.expr_type(rhs).clone();
        if lhs_ty.is_invalid() || rhs_ty.is_invalid() {
            return Ok(self.dummy_expr(Datatype::Invalid));
        }
        let ty = self.program.check_binary(op, &lhs_ty, &rhs_ty)?;
        Ok(self.dummy_expr(ty))
    }

    fn not_expr(&mut self, operand: ExprId) -> CompileResult<ExprId> {
        let ty = self.program.expr_type(operand).clone();
        if ty.is_invalid() {
            return Ok(self.dummy_expr(Datatype::Invalid));
        }
        if ty != Datatype::Primitive(PrimitiveType::Int) && !ty.is_object() {
            return Err(CompileError::incompatibility(format!(
                "invalid operand of type {} in ! operation",
                ty
            )));
        }
        Ok(self.dummy_expr(Datatype::Primitive(PrimitiveType::Int)))
    }

    fn string_cast_expr(&mut self, inner: ExprId) -> CompileResult<ExprId> {
        let ty = self.program.expr_type(inner).clone();
        if !ty.is_invalid() && ty != Datatype::Primitive(PrimitiveType::Int) {
            return Err(CompileError::incompatibility(format!(
                "invalid cast of {} value to string",
                ty
            )));
        }
        Ok(self.dummy_expr(Datatype::Primitive(PrimitiveType::String)))
    }

    fn object_cast_expr(&mut self, class_name: &str, _inner: ExprId) -> CompileResult<ExprId> {
        Ok(self.dummy_expr(Datatype::Object(class_name.to_string())))
    }
}
