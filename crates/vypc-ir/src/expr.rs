//! IR expressions
//!
//! Expressions carry their static type, computed and checked at
//! construction. Constructors are methods on `Program` returning
//! `CompileResult<ExprId>`, so an ill-typed node is never wired into a
//! parent: either the whole construction succeeds or the error unwinds
//! before any linking happens.

use crate::error::{CompileError, CompileResult};
use crate::program::{AllocaId, ClassId, ExprId, FunctionId, Program};
use crate::types::{Datatype, Literal, PrimitiveType};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// An expression node: a kind plus its computed static type.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Datatype,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),

    /// Load of a named storage binding.
    Symbol(AllocaId),

    /// `super`: the receiver viewed as the parent class. Carries the
    /// child class it was taken in for static dispatch later.
    Super { this: AllocaId, child: ClassId },

    /// `(ClassName) expr` — bit-level no-op, retypes the pointer.
    ObjectCast { class: ClassId, inner: ExprId },

    /// `(string) intExpr`.
    StringCast { inner: ExprId },

    /// Free-function reference; `args` is `None` until a call binds
    /// arguments.
    FunctionCall {
        function: FunctionId,
        args: Option<Vec<ExprId>>,
    },

    /// `new ClassName`.
    Constructor { class: ClassId },

    /// Method reference over a receiver; `args` (once bound) has the
    /// receiver prepended at position 0.
    Method {
        function: FunctionId,
        context: ExprId,
        args: Option<Vec<ExprId>>,
    },

    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },

    Not(ExprId),

    /// Field access with the class the attribute was resolved in, for
    /// offset computation later.
    ObjectAttribute {
        object: ExprId,
        attribute: AllocaId,
        class: ClassId,
    },

    /// Inert pass-1 placeholder; only its type is meaningful.
    Dummy,
}

impl Expr {
    /// True for expressions that materialize with a single register
    /// load (literals and symbol-like loads).
    pub fn is_simple(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Literal(_) | ExprKind::Symbol(_) | ExprKind::Super { .. }
        )
    }
}

impl Program {
    pub fn new_literal_expr(&mut self, value: Literal) -> ExprId {
        let ty = value.datatype();
        self.add_expr(Expr {
            kind: ExprKind::Literal(value),
            ty,
        })
    }

    pub fn new_symbol_expr(&mut self, alloca: AllocaId) -> ExprId {
        let ty = self.alloca(alloca).ty.clone();
        self.add_expr(Expr {
            kind: ExprKind::Symbol(alloca),
            ty,
        })
    }

    /// `super` typed as the parent class so member lookup starts there.
    pub fn new_super_expr(&mut self, this: AllocaId, child: ClassId) -> CompileResult<ExprId> {
        let parent = self.class(child).parent.ok_or_else(|| {
            CompileError::semantic(format!(
                "super used in class {} which has no base class",
                self.class(child).name
            ))
        })?;
        let ty = Datatype::Object(self.class(parent).name.clone());
        Ok(self.add_expr(Expr {
            kind: ExprKind::Super { this, child },
            ty,
        }))
    }

    pub fn new_object_cast_expr(
        &mut self,
        class: ClassId,
        inner: ExprId,
    ) -> CompileResult<ExprId> {
        if !self.expr_type(inner).is_object() {
            return Err(CompileError::incompatibility(format!(
                "invalid cast of {} value to class {}",
                self.expr_type(inner),
                self.class(class).name
            )));
        }
        let ty = Datatype::Object(self.class(class).name.clone());
        Ok(self.add_expr(Expr {
            kind: ExprKind::ObjectCast { class, inner },
            ty,
        }))
    }

    pub fn new_string_cast_expr(&mut self, inner: ExprId) -> CompileResult<ExprId> {
        if *self.expr_type(inner) != Datatype::Primitive(PrimitiveType::Int) {
            return Err(CompileError::incompatibility(format!(
                "invalid cast of {} value to string",
                self.expr_type(inner)
            )));
        }
        Ok(self.add_expr(Expr {
            kind: ExprKind::StringCast { inner },
            ty: Datatype::Primitive(PrimitiveType::String),
        }))
    }

    /// Bare function reference; typed `Function` until arguments bind.
    pub fn new_function_expr(&mut self, function: FunctionId) -> ExprId {
        self.add_expr(Expr {
            kind: ExprKind::FunctionCall {
                function,
                args: None,
            },
            ty: Datatype::Function,
        })
    }

    pub fn new_constructor_expr(&mut self, class: ClassId) -> ExprId {
        let ty = Datatype::Object(self.class(class).name.clone());
        self.add_expr(Expr {
            kind: ExprKind::Constructor { class },
            ty,
        })
    }

    /// Method reference; the context must be object-typed.
    pub fn new_method_expr(
        &mut self,
        function: FunctionId,
        context: ExprId,
    ) -> CompileResult<ExprId> {
        if !self.expr_type(context).is_object() {
            return Err(CompileError::incompatibility(format!(
                "method {} called on non-object value of type {}",
                self.function(function).name,
                self.expr_type(context)
            )));
        }
        Ok(self.add_expr(Expr {
            kind: ExprKind::Method {
                function,
                context,
                args: None,
            },
            ty: Datatype::Function,
        }))
    }

    pub fn new_binary_expr(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    ) -> CompileResult<ExprId> {
        let ty = self.check_binary(op, self.expr_type(lhs), self.expr_type(rhs))?;
        Ok(self.add_expr(Expr {
            kind: ExprKind::Binary { op, lhs, rhs },
            ty,
        }))
    }

    /// Type-check a binary operation without building a node. The index
    /// pass reuses this so type errors surface exactly once.
    pub fn check_binary(
        &self,
        op: BinaryOp,
        lhs: &Datatype,
        rhs: &Datatype,
    ) -> CompileResult<Datatype> {
        if lhs != rhs {
            return Err(CompileError::incompatibility(format!(
                "types do not match in {} operation ({} and {})",
                op, lhs, rhs
            )));
        }
        if op.is_arithmetic() {
            let allowed = match lhs {
                Datatype::Primitive(PrimitiveType::Int)
                | Datatype::Primitive(PrimitiveType::Float) => true,
                // String concatenation.
                Datatype::Primitive(PrimitiveType::String) => op == BinaryOp::Add,
                _ => false,
            };
            if !allowed {
                return Err(CompileError::incompatibility(format!(
                    "invalid operand of type {} in {} operation",
                    lhs, op
                )));
            }
            return Ok(lhs.clone());
        }
        if op.is_comparison() {
            // == and != accept any identical type including objects;
            // orderings require a primitive.
            let allowed = if op.is_equality() {
                lhs.is_primitive() || lhs.is_object()
            } else {
                lhs.is_primitive()
            };
            if !allowed {
                return Err(CompileError::incompatibility(format!(
                    "invalid operand of type {} in {} operation",
                    lhs, op
                )));
            }
            return Ok(Datatype::Primitive(PrimitiveType::Int));
        }
        // Logical: int or object operands only.
        let allowed = *lhs == Datatype::Primitive(PrimitiveType::Int) || lhs.is_object();
        if !allowed {
            return Err(CompileError::incompatibility(format!(
                "invalid operand of type {} in {} operation",
                lhs, op
            )));
        }
        Ok(Datatype::Primitive(PrimitiveType::Int))
    }

    pub fn new_not_expr(&mut self, operand: ExprId) -> CompileResult<ExprId> {
        let ty = self.expr_type(operand);
        if *ty != Datatype::Primitive(PrimitiveType::Int) && !ty.is_object() {
            return Err(CompileError::incompatibility(format!(
                "invalid operand of type {} in ! operation",
                ty
            )));
        }
        Ok(self.add_expr(Expr {
            kind: ExprKind::Not(operand),
            ty: Datatype::Primitive(PrimitiveType::Int),
        }))
    }

    pub fn new_attribute_expr(
        &mut self,
        object: ExprId,
        attribute: AllocaId,
        class: ClassId,
    ) -> ExprId {
        let ty = self.alloca(attribute).ty.clone();
        self.add_expr(Expr {
            kind: ExprKind::ObjectAttribute {
                object,
                attribute,
                class,
            },
            ty,
        })
    }

    /// Inert pass-1 node carrying only a type.
    pub fn new_dummy_expr(&mut self, ty: Datatype) -> ExprId {
        self.add_expr(Expr {
            kind: ExprKind::Dummy,
            ty,
        })
    }
}
