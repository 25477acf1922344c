//! Program arena
//!
//! All IR nodes live in typed arenas owned by a single `Program`; the
//! rest of the compiler passes around copyable ids. Shared ownership
//! (one alloca referenced by a function's arg list and by several
//! expressions) is just the same id in several places, and the IR's
//! back-edges (attribute → owning class, `super` → child class) are
//! ids too, so no reference cycles exist anywhere.

use crate::block::BasicBlock;
use crate::class::Class;
use crate::expr::Expr;
use crate::function::Function;
use crate::instr::Instr;
use crate::types::Datatype;
use rustc_hash::FxHashMap;

/// Frame-slot binding identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocaId(pub u32);

/// Expression node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// Instruction node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub u32);

/// Basic-block identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// Function identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// Class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "class{}", self.0)
    }
}

/// A named storage binding: local variable, parameter, class attribute,
/// or a lowered temporary. Two allocas are distinct identities even
/// when their names collide.
#[derive(Debug, Clone)]
pub struct Alloca {
    pub ty: Datatype,
    pub name: String,
    /// Mangling prefix for class members (the class name).
    pub prefix: Option<String>,
}

impl Alloca {
    /// Name with the member prefix applied, for dumps and labels.
    pub fn prefixed_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}${}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

/// Arena owning every IR node of one compile invocation.
///
/// The monotonic block counter lives here so block names are unique per
/// compile and reset with it; there are no process-wide counters.
#[derive(Debug, Default)]
pub struct Program {
    allocas: Vec<Alloca>,
    exprs: Vec<Expr>,
    instrs: Vec<Instr>,
    blocks: Vec<BasicBlock>,
    functions: Vec<Function>,
    classes: Vec<Class>,
    class_index: FxHashMap<String, ClassId>,
    next_block_suffix: u32,
    next_temp: u32,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- allocas -----

    pub fn new_alloca(&mut self, ty: Datatype, name: impl Into<String>) -> AllocaId {
        let id = AllocaId(self.allocas.len() as u32);
        self.allocas.push(Alloca {
            ty,
            name: name.into(),
            prefix: None,
        });
        id
    }

    pub fn new_member_alloca(
        &mut self,
        ty: Datatype,
        name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> AllocaId {
        let id = self.new_alloca(ty, name);
        self.allocas[id.0 as usize].prefix = Some(prefix.into());
        id
    }

    /// Fresh synthetic temporary for expression lowering.
    pub fn new_temp(&mut self, ty: Datatype) -> AllocaId {
        let n = self.next_temp;
        self.next_temp += 1;
        self.new_alloca(ty, format!("tmp{}", n))
    }

    pub fn alloca(&self, id: AllocaId) -> &Alloca {
        &self.allocas[id.0 as usize]
    }

    pub fn alloca_mut(&mut self, id: AllocaId) -> &mut Alloca {
        &mut self.allocas[id.0 as usize]
    }

    // ----- expressions -----

    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.0 as usize]
    }

    /// Type of an expression node.
    pub fn expr_type(&self, id: ExprId) -> &Datatype {
        &self.exprs[id.0 as usize].ty
    }

    // ----- instructions -----

    pub fn add_instr(&mut self, instr: Instr) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        self.instrs.push(instr);
        id
    }

    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.instrs[id.0 as usize]
    }

    // ----- blocks -----

    /// Create a block whose name is the user name plus a monotonic
    /// suffix, so every block in a compile is uniquely named.
    pub fn new_block(&mut self, user_name: &str, instrs: Vec<InstrId>) -> BlockId {
        let suffix = self.next_block_suffix;
        self.next_block_suffix += 1;
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            name: format!("{}_{}", user_name, suffix),
            instrs,
            next: None,
        });
        id
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    // ----- functions -----

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0 as usize]
    }

    /// Argument types of a function, in declaration order.
    pub fn function_arg_types(&self, id: FunctionId) -> Vec<Datatype> {
        self.function(id)
            .args
            .iter()
            .map(|a| self.alloca(*a).ty.clone())
            .collect()
    }

    // ----- classes -----

    pub fn add_class(&mut self, class: Class) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.class_index.insert(class.name.clone(), id);
        self.classes.push(class);
        id
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.0 as usize]
    }

    /// Look a class up by name. This is a lookup relation over the
    /// arena, not ownership.
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }
}
