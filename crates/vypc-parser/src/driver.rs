//! Parse drivers
//!
//! The grammar recognizer is generic over `Driver`, the semantic-action
//! surface both passes implement: `IndexDriver` (pass 1) registers
//! top-level shapes leniently, `ParserDriver` (pass 2) builds the full
//! IR with every check enabled. The grammar itself never constructs IR
//! nodes; it only calls these actions.

use crate::symbol_table::{ScopeStack, Symbol, SymbolTable};
use vypc_ir::{
    AllocaId, BinaryOp, ClassId, CompileError, CompileResult, Datatype, ExprId, ExprKind,
    FunctionId, Instr, InstrId, Literal, PrimitiveType, Program, Visibility,
};

/// Semantic actions invoked by the grammar. One method per parse
/// event; all IR construction and all semantic checks live behind this
/// surface.
pub trait Driver {
    fn begin_function(
        &mut self,
        ret: Option<Datatype>,
        name: &str,
        params: &[(Datatype, String)],
    ) -> CompileResult<()>;
    fn end_function(&mut self, body: Vec<InstrId>) -> CompileResult<()>;
    fn begin_class(&mut self, name: &str, base: &str) -> CompileResult<()>;
    fn end_class(&mut self) -> CompileResult<()>;
    /// Nested statement blocks get their own alloca-only scope.
    fn begin_block(&mut self);
    fn end_block(&mut self);
    fn set_visibility(&mut self, vis: Visibility);
    fn declare(
        &mut self,
        ty: &Datatype,
        name: &str,
        init: Option<ExprId>,
    ) -> CompileResult<Vec<InstrId>>;
    fn resolve_type(&mut self, name: &str) -> CompileResult<Datatype>;

    fn assign(&mut self, dest: ExprId, value: ExprId) -> CompileResult<InstrId>;
    fn assign_to_name(&mut self, name: &str, value: ExprId) -> CompileResult<InstrId>;
    fn call_statement(&mut self, call: ExprId) -> CompileResult<InstrId>;
    fn create_if(
        &mut self,
        cond: ExprId,
        if_body: Vec<InstrId>,
        else_body: Vec<InstrId>,
    ) -> CompileResult<InstrId>;
    fn create_while(&mut self, cond: ExprId, body: Vec<InstrId>) -> CompileResult<InstrId>;
    fn create_return(&mut self, value: Option<ExprId>) -> CompileResult<InstrId>;

    fn literal(&mut self, value: Literal) -> CompileResult<ExprId>;
    fn identifier(&mut self, name: &str) -> CompileResult<ExprId>;
    fn this_expr(&mut self) -> CompileResult<ExprId>;
    fn super_expr(&mut self) -> CompileResult<ExprId>;
    fn new_expr(&mut self, class_name: &str) -> CompileResult<ExprId>;
    fn call_expr(&mut self, callee: ExprId, args: Vec<ExprId>) -> CompileResult<ExprId>;
    fn dot_expr(&mut self, object: ExprId, member: &str) -> CompileResult<ExprId>;
    fn binary_expr(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> CompileResult<ExprId>;
    fn not_expr(&mut self, operand: ExprId) -> CompileResult<ExprId>;
    fn string_cast_expr(&mut self, inner: ExprId) -> CompileResult<ExprId>;
    fn object_cast_expr(&mut self, class_name: &str, inner: ExprId) -> CompileResult<ExprId>;
}

/// Pass-2 driver: resolves every name against the pass-1 global table,
/// runs all type checks, and assembles the IR.
pub struct ParserDriver {
    program: Program,
    scopes: ScopeStack,
    current_class: Option<ClassId>,
    current_function: Option<FunctionId>,
    this_alloca: Option<AllocaId>,
    pending_visibility: Visibility,
}

impl ParserDriver {
    /// Build from the global table produced by pass 1 so forward
    /// references resolve.
    pub fn new(program: Program, global: SymbolTable) -> Self {
        ParserDriver {
            program,
            scopes: ScopeStack::new(global),
            current_class: None,
            current_function: None,
            this_alloca: None,
            pending_visibility: Visibility::Public,
        }
    }

    /// Final checks after the parse; hands the IR to the generator.
    pub fn finish(self) -> CompileResult<(Program, SymbolTable)> {
        self.ensure_main_defined()?;
        Ok((self.program, self.scopes.into_global()))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    fn ensure_main_defined(&self) -> CompileResult<()> {
        match self.scopes.search_global("main") {
            Some(Symbol::Function(f)) => {
                let f = self.program.function(f);
                if f.is_void() && f.args.is_empty() {
                    Ok(())
                } else {
                    Err(CompileError::semantic(
                        "main not defined with signature void main(void)",
                    ))
                }
            }
            _ => Err(CompileError::semantic("main not defined")),
        }
    }

    fn current_class_name(&self) -> Option<&str> {
        self.current_class
            .map(|c| self.program.class(c).name.as_str())
    }

    /// Visibility window for member lookup on a value of class
    /// `class_name`: class-internal access when we are compiling a
    /// method of that very class, public otherwise.
    fn lookup_visibility(&self, class_name: &str) -> Visibility {
        if self.current_class_name() == Some(class_name) {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    fn this_symbol(&mut self) -> CompileResult<ExprId> {
        match self.this_alloca {
            Some(this) => Ok(self.program.new_symbol_expr(this)),
            None => Err(CompileError::semantic("this used outside of a method")),
        }
    }

    /// Turn a bare attribute name into `this.attr`.
    fn implicit_attribute_access(&mut self, name: &str) -> CompileResult<ExprId> {
        let class = self.current_class.ok_or_else(|| {
            CompileError::semantic(format!("attribute {} used outside of a class", name))
        })?;
        let (attribute, owner) = self
            .program
            .class_get_attribute(class, name, Visibility::Private)
            .ok_or_else(|| {
                CompileError::semantic(format!(
                    "{} is not a member of class {}",
                    name,
                    self.program.class(class).name
                ))
            })?;
        let this = self.this_symbol()?;
        Ok(self.program.new_attribute_expr(this, attribute, owner))
    }

    fn check_condition(&self, cond: ExprId) -> CompileResult<()> {
        let ty = self.program.expr_type(cond);
        if *ty == Datatype::Primitive(PrimitiveType::Int) || ty.is_object() {
            Ok(())
        } else {
            Err(CompileError::incompatibility(format!(
                "condition must be int or an object, found {}",
                ty
            )))
        }
    }

    /// Bind call arguments on a function expression, checking arity and
    /// per-position assignability.
    fn bind_call(
        &mut self,
        callee: ExprId,
        function: FunctionId,
        args: Vec<ExprId>,
    ) -> CompileResult<ExprId> {
        let f = self.program.function(function);
        let name = f.name.clone();

        // print is variadic over primitives and has no declared args.
        if name == "print" && f.prefix.is_none() {
            if args.is_empty() {
                return Err(CompileError::incompatibility(
                    "print requires at least one argument",
                ));
            }
            for arg in &args {
                if !self.program.expr_type(*arg).is_primitive() {
                    return Err(CompileError::incompatibility(
                        "print accepts only primitive arguments",
                    ));
                }
            }
            self.set_call_args(callee, args, Datatype::Invalid);
            return Ok(callee);
        }

        let param_types = self.program.function_arg_types(function);
        if args.len() != param_types.len() {
            return Err(CompileError::semantic(format!(
                "wrong number of arguments in call to {} (expected {}, found {})",
                name,
                param_types.len(),
                args.len()
            )));
        }
        for (arg, param_ty) in args.iter().zip(param_types.iter()) {
            let arg_ty = self.program.expr_type(*arg);
            if !self.program.can_assign(param_ty, arg_ty) {
                return Err(CompileError::incompatibility(format!(
                    "incompatible argument of type {} in call to {} (expected {})",
                    arg_ty, name, param_ty
                )));
            }
        }
        let ty = self
            .program
            .function(function)
            .ret
            .clone()
            .unwrap_or(Datatype::Invalid);
        self.set_call_args(callee, args, ty);
        Ok(callee)
    }

    fn set_call_args(&mut self, callee: ExprId, args: Vec<ExprId>, ty: Datatype) {
        let expr = self.program.expr_mut(callee);
        match &mut expr.kind {
            ExprKind::FunctionCall { args: slot, .. } | ExprKind::Method { args: slot, .. } => {
                *slot = Some(args);
            }
            _ => unreachable!("bind_call is only reached for call expressions"),
        }
        expr.ty = ty;
    }
}

impl Driver for ParserDriver {
    fn begin_function(
        &mut self,
        ret: Option<Datatype>,
        name: &str,
        params: &[(Datatype, String)],
    ) -> CompileResult<()> {
        let function = if let Some(class) = self.current_class {
            // Method: reuse the pass-1 shell found in the class scope.
            let function = match self.scopes.search_current(name) {
                Some(Symbol::Function(f)) => f,
                _ => {
                    return Err(CompileError::internal(format!(
                        "method {} missing from the index of class {}",
                        name,
                        self.program.class(class).name
                    )))
                }
            };
            let class_name = self.program.class(class).name.clone();

            // Every method gets the synthetic receiver, the
            // constructor included.
            let this = self
                .program
                .new_alloca(Datatype::Object(class_name.clone()), "this");
            let mut args = vec![this];
            for (ty, pname) in params {
                args.push(self.program.new_alloca(ty.clone(), pname.clone()));
            }

            {
                let f = self.program.function_mut(function);
                f.ret = ret;
                f.args = args;
                f.prefix = Some(class_name.clone());
                f.body = None;
            }
            let visibility = self.pending_visibility;
            self.program.class_update_method(class, function, visibility)?;

            // Overrides must match the original signature, ignoring
            // the receiver.
            if name != class_name {
                if let Some(original) = self.program.class_original_method(class, name) {
                    if !self.program.override_compatible(function, original) {
                        return Err(CompileError::incompatibility(format!(
                            "override of method {} does not match the signature inherited by class {}",
                            name, class_name
                        )));
                    }
                }
            }

            self.this_alloca = Some(this);
            function
        } else {
            // Free function: the pass-1 binding is the function;
            // re-insertion is a no-op by design.
            let function = match self.scopes.search_global(name) {
                Some(Symbol::Function(f)) => f,
                _ => {
                    return Err(CompileError::internal(format!(
                        "function {} missing from the index",
                        name
                    )))
                }
            };
            let mut args = Vec::with_capacity(params.len());
            for (ty, pname) in params {
                args.push(self.program.new_alloca(ty.clone(), pname.clone()));
            }
            let f = self.program.function_mut(function);
            f.ret = ret;
            f.args = args;
            f.body = None;
            function
        };

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
        self.current_function = Some(function);
        Ok(())
    }

    fn end_function(&mut self, body: Vec<InstrId>) -> CompileResult<()> {
        let function = self
            .current_function
            .ok_or_else(|| CompileError::internal("end_function outside of a function"))?;
        let name = self.program.function(function).name.clone();
        let block = self.program.new_block(&name, body);
        self.program.function_mut(function).body = Some(block);
        self.scopes.pop();
        self.current_function = None;
        self.this_alloca = None;
        Ok(())
    }

    fn begin_class(&mut self, name: &str, base: &str) -> CompileResult<()> {
        let class = match self.scopes.search_global(name) {
            Some(Symbol::Class(c)) => c,
            _ => {
                return Err(CompileError::internal(format!(
                    "class {} missing from the index",
                    name
                )))
            }
        };
        // Pass 1 may have left a tentative base; resolve it for real
        // now that every class is known.
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
                return Err(CompileError::semantic(format!(
                    "base class {} of {} is not defined",
                    base, name
                )))
            }
        }

        // Re-seed a class scope with the indexed members so method
        // bodies can refer to fellow members by bare name. The pass-1
        // member lists stay in place and are refreshed entry by entry,
        // so a method parsed before an attribute's re-declaration still
        // resolves it.
        self.scopes.push(true);
        let members: Vec<(String, Symbol)> = {
            let c = self.program.class(class);
            let methods = c
                .methods
                .iter()
                .map(|(f, _)| (self.program.function(*f).name.clone(), Symbol::Function(*f)));
            let attributes = c
                .attributes
                .iter()
                .map(|(a, _)| (self.program.alloca(*a).name.clone(), Symbol::Variable(*a)));
            methods.chain(attributes).collect()
        };
        for (member_name, symbol) in members {
            self.scopes.insert(member_name, symbol);
        }

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
        if self.current_function.is_none() {
            // Attribute of the current class: reuse the pass-1 alloca,
            // updating its type.
            let class = self.current_class.ok_or_else(|| {
                CompileError::internal("declaration outside of any function or class")
            })?;
            let class_name = self.program.class(class).name.clone();
            let alloca = match self.scopes.search_current(name) {
                Some(Symbol::Variable(a)) => {
                    self.program.alloca_mut(a).ty = ty.clone();
                    a
                }
                _ => {
                    let a = self
                        .program
                        .new_member_alloca(ty.clone(), name, class_name);
                    self.scopes.insert(name, Symbol::Variable(a));
                    a
                }
            };
            if let Some(init) = init {
                let init_ty = self.program.expr_type(init);
                if !self.program.can_assign(ty, init_ty) {
                    return Err(CompileError::incompatibility(format!(
                        "incompatible types in initialization of attribute {}",
                        name
                    )));
                }
            }
            let visibility = self.pending_visibility;
            self.program
                .class_update_attribute(class, alloca, visibility, init);
            return Ok(Vec::new());
        }

        // Local variable.
        let alloca = self.program.new_alloca(ty.clone(), name);
        if !self.scopes.insert(name, Symbol::Variable(alloca)) {
            return Err(CompileError::semantic(format!("Redefinition of {}", name)));
        }
        let mut instrs = vec![self.program.add_instr(Instr::Alloca(alloca))];
        if let Some(init) = init {
            let init_ty = self.program.expr_type(init);
            if !self.program.can_assign(ty, init_ty) {
                return Err(CompileError::incompatibility(format!(
                    "types do not match in assignment to {}",
                    name
                )));
            }
            instrs.push(self.program.add_instr(Instr::Assignment {
                dest: Some(alloca),
                expr: init,
            }));
        }
        Ok(instrs)
    }

    fn resolve_type(&mut self, name: &str) -> CompileResult<Datatype> {
        match self.scopes.search_global(name) {
            Some(Symbol::Class(_)) => Ok(Datatype::Object(name.to_string())),
            _ => Err(CompileError::semantic(format!(
                "class {} is not defined",
                name
            ))),
        }
    }

    fn assign(&mut self, dest: ExprId, value: ExprId) -> CompileResult<InstrId> {
        match self.program.expr(dest).kind.clone() {
            ExprKind::Symbol(alloca) => {
                let dest_ty = self.program.alloca(alloca).ty.clone();
                let value_ty = self.program.expr_type(value);
                if !self.program.can_assign(&dest_ty, value_ty) {
                    return Err(CompileError::incompatibility(format!(
                        "types do not match in assignment to {}",
                        self.program.alloca(alloca).name
                    )));
                }
                Ok(self.program.add_instr(Instr::Assignment {
                    dest: Some(alloca),
                    expr: value,
                }))
            }
            ExprKind::ObjectAttribute { attribute, .. } => {
                let dest_ty = self.program.alloca(attribute).ty.clone();
                let value_ty = self.program.expr_type(value);
                if !self.program.can_assign(&dest_ty, value_ty) {
                    return Err(CompileError::incompatibility(format!(
                        "types do not match in assignment to attribute {}",
                        self.program.alloca(attribute).name
                    )));
                }
                Ok(self
                    .program
                    .add_instr(Instr::ObjectAssignment { dest, expr: value }))
            }
            _ => Err(CompileError::semantic("invalid assignment target")),
        }
    }

    fn assign_to_name(&mut self, name: &str, value: ExprId) -> CompileResult<InstrId> {
        match self.scopes.search_all(name) {
            None => Err(CompileError::semantic(format!(
                "Assignment to undefined variable {}",
                name
            ))),
            Some(Symbol::Variable(alloca)) => {
                let dest = if self.program.alloca(alloca).prefix.is_some() {
                    self.implicit_attribute_access(name)?
                } else {
                    self.program.new_symbol_expr(alloca)
                };
                self.assign(dest, value)
            }
            Some(Symbol::Function(_)) | Some(Symbol::Class(_)) => Err(
                CompileError::incompatibility(format!("{} is not assignable", name)),
            ),
        }
    }

    fn call_statement(&mut self, call: ExprId) -> CompileResult<InstrId> {
        let is_call = matches!(
            self.program.expr(call).kind,
            ExprKind::FunctionCall { args: Some(_), .. } | ExprKind::Method { args: Some(_), .. }
        );
        if !is_call {
            return Err(CompileError::syntax("expression is not a statement"));
        }
        Ok(self.program.add_instr(Instr::Assignment {
            dest: None,
            expr: call,
        }))
    }

    fn create_if(
        &mut self,
        cond: ExprId,
        if_body: Vec<InstrId>,
        else_body: Vec<InstrId>,
    ) -> CompileResult<InstrId> {
        self.check_condition(cond)?;
        let if_block = self.program.new_block("if", if_body);
        let else_block = self.program.new_block("else", else_body);
        Ok(self.program.add_instr(Instr::Branch {
            cond,
            if_block,
            else_block,
        }))
    }

    fn create_while(&mut self, cond: ExprId, body: Vec<InstrId>) -> CompileResult<InstrId> {
        self.check_condition(cond)?;
        let body = self.program.new_block("while", body);
        Ok(self.program.add_instr(Instr::Loop { cond, body }))
    }

    fn create_return(&mut self, value: Option<ExprId>) -> CompileResult<InstrId> {
        let function = self
            .current_function
            .ok_or_else(|| CompileError::syntax("return outside of a function"))?;
        let f = self.program.function(function);
        let name = f.name.clone();
        match (&f.ret, value) {
            (None, None) => {}
            (None, Some(_)) => {
                return Err(CompileError::incompatibility(format!(
                    "return with a value in void function {}",
                    name
                )))
            }
            (Some(_), None) => {
                return Err(CompileError::incompatibility(format!(
                    "return without a value in function {}",
                    name
                )))
            }
            (Some(ret), Some(value)) => {
                let ret = ret.clone();
                let value_ty = self.program.expr_type(value);
                if !self.program.can_assign(&ret, value_ty) {
                    return Err(CompileError::incompatibility(format!(
                        "incompatible return type in function {} ({} expected, {} found)",
                        name, ret, value_ty
                    )));
                }
            }
        }
        Ok(self.program.add_instr(Instr::Return { expr: value }))
    }

    fn literal(&mut self, value: Literal) -> CompileResult<ExprId> {
        Ok(self.program.new_literal_expr(value))
    }

    fn identifier(&mut self, name: &str) -> CompileResult<ExprId> {
        match self.scopes.search_all(name) {
            Some(Symbol::Variable(alloca)) => {
                if self.program.alloca(alloca).prefix.is_some() {
                    self.implicit_attribute_access(name)
                } else {
                    Ok(self.program.new_symbol_expr(alloca))
                }
            }
            Some(Symbol::Function(function)) => {
                if self.program.function(function).prefix.is_some() {
                    // Bare method name inside a class body: implicit
                    // receiver.
                    let this = self.this_symbol()?;
                    self.program.new_method_expr(function, this)
                } else {
                    Ok(self.program.new_function_expr(function))
                }
            }
            Some(Symbol::Class(_)) => Err(CompileError::semantic(format!(
                "{} is a class, not a value",
                name
            ))),
            None => Err(CompileError::semantic(format!(
                "Symbol {} is not defined",
                name
            ))),
        }
    }

    fn this_expr(&mut self) -> CompileResult<ExprId> {
        self.this_symbol()
    }

    fn super_expr(&mut self) -> CompileResult<ExprId> {
        let class = self
            .current_class
            .ok_or_else(|| CompileError::semantic("super used outside of a method"))?;
        let this = self
            .this_alloca
            .ok_or_else(|| CompileError::semantic("super used outside of a method"))?;
        self.program.new_super_expr(this, class)
    }

    fn new_expr(&mut self, class_name: &str) -> CompileResult<ExprId> {
        match self.scopes.search_global(class_name) {
            Some(Symbol::Class(class)) => Ok(self.program.new_constructor_expr(class)),
            _ => Err(CompileError::semantic(format!(
                "class {} is not defined",
                class_name
            ))),
        }
    }

    fn call_expr(&mut self, callee: ExprId, args: Vec<ExprId>) -> CompileResult<ExprId> {
        match self.program.expr(callee).kind.clone() {
            ExprKind::FunctionCall {
                function,
                args: None,
            } => self.bind_call(callee, function, args),
            ExprKind::Method {
                function,
                context,
                args: None,
            } => {
                // The receiver is the implicit first argument.
                let mut full_args = Vec::with_capacity(args.len() + 1);
                full_args.push(context);
                full_args.extend(args);
                self.bind_call(callee, function, full_args)
            }
            _ => Err(CompileError::semantic("expression is not callable")),
        }
    }

    fn dot_expr(&mut self, object: ExprId, member: &str) -> CompileResult<ExprId> {
        let object_ty = self.program.expr_type(object).clone();
        let class_name = object_ty.object_name().ok_or_else(|| {
            CompileError::incompatibility(format!(
                "member access on non-object value of type {}",
                object_ty
            ))
        })?;
        let class = self.program.find_class(class_name).ok_or_else(|| {
            CompileError::semantic(format!("class {} is not defined", class_name))
        })?;
        let visibility = self.lookup_visibility(class_name);

        if let Some((attribute, owner)) =
            self.program.class_get_attribute(class, member, visibility)
        {
            return Ok(self.program.new_attribute_expr(object, attribute, owner));
        }
        if let Some((method, _)) = self
            .program
            .class_get_method(class, member, None, visibility)
        {
            return self.program.new_method_expr(method, object);
        }
        // A member that exists but is outside the visibility window is
        // an access violation, not a missing name.
        if self
            .program
            .class_get_attribute(class, member, Visibility::Private)
            .is_some()
            || self
                .program
                .class_get_method(class, member, None, Visibility::Private)
                .is_some()
        {
            return Err(CompileError::incompatibility(format!(
                "member {} of class {} is not accessible from here",
                member,
                self.program.class(class).name
            )));
        }
        Err(CompileError::semantic(format!(
            "{} is not a member of class {}",
            member,
            self.program.class(class).name
        )))
    }

    fn binary_expr(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> CompileResult<ExprId> {
        self.program.new_binary_expr(op, lhs, rhs)
    }

    fn not_expr(&mut self, operand: ExprId) -> CompileResult<ExprId> {
        self.program.new_not_expr(operand)
    }

    fn string_cast_expr(&mut self, inner: ExprId) -> CompileResult<ExprId> {
        self.program.new_string_cast_expr(inner)
    }

    fn object_cast_expr(&mut self, class_name: &str, inner: ExprId) -> CompileResult<ExprId> {
        match self.scopes.search_global(class_name) {
            Some(Symbol::Class(class)) => self.program.new_object_cast_expr(class, inner),
            _ => Err(CompileError::semantic(format!(
                "class {} is not defined",
                class_name
            ))),
        }
    }
}