//! IR pretty-printing
//!
//! Human-readable dump of the IR, used by the CLI's verbose mode after
//! pass 2 and in test assertions.

use crate::class::Visibility;
use crate::expr::ExprKind;
use crate::instr::Instr;
use crate::program::{BlockId, ClassId, ExprId, FunctionId, InstrId, Program};

impl Program {
    pub fn dump_function(&self, id: FunctionId) -> String {
        let f = self.function(id);
        let ret = f
            .ret
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "void".to_string());
        let args = f
            .args
            .iter()
            .map(|a| {
                let alloca = self.alloca(*a);
                format!("{} {}", alloca.ty, alloca.name)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!("{} {}({})\n", ret, f.label(), args);
        if let Some(body) = f.body {
            out.push_str(&self.dump_block(body, "  "));
        }
        out
    }

    pub fn dump_class(&self, id: ClassId) -> String {
        let c = self.class(id);
        let parent = c
            .parent
            .map(|p| self.class(p).name.clone())
            .unwrap_or_default();
        let mut out = if parent.is_empty() {
            format!("class {}\n", c.name)
        } else {
            format!("class {} : {}\n", c.name, parent)
        };
        for vis in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            for a in c.attributes_with(vis) {
                let alloca = self.alloca(a);
                out.push_str(&format!("  {} {} {}\n", vis, alloca.ty, alloca.name));
            }
        }
        for vis in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            for m in c.methods_with(vis) {
                out.push_str(&format!("  {} ", vis));
                out.push_str(&self.dump_function(m));
            }
        }
        out
    }

    pub fn dump_block(&self, id: BlockId, indent: &str) -> String {
        let block = self.block(id);
        let mut out = String::new();
        for instr in &block.instrs {
            out.push_str(&self.dump_instr(*instr, indent));
        }
        if let Some(next) = block.next {
            out.push_str(&self.dump_block(next, indent));
        }
        out
    }

    pub fn dump_instr(&self, id: InstrId, indent: &str) -> String {
        let deeper = format!("{}  ", indent);
        match self.instr(id) {
            Instr::Alloca(a) => {
                let alloca = self.alloca(*a);
                format!("{}declare {} {}\n", indent, alloca.ty, alloca.name)
            }
            Instr::Assignment { dest: Some(d), expr } => format!(
                "{}{} = {}\n",
                indent,
                self.alloca(*d).name,
                self.dump_expr(*expr)
            ),
            Instr::Assignment { dest: None, expr } => {
                format!("{}{}\n", indent, self.dump_expr(*expr))
            }
            Instr::ObjectAssignment { dest, expr } => format!(
                "{}{} = {}\n",
                indent,
                self.dump_expr(*dest),
                self.dump_expr(*expr)
            ),
            Instr::Branch {
                cond,
                if_block,
                else_block,
            } => {
                let mut out = format!("{}if {}\n", indent, self.dump_expr(*cond));
                out.push_str(&self.dump_block(*if_block, &deeper));
                out.push_str(&format!("{}else\n", indent));
                out.push_str(&self.dump_block(*else_block, &deeper));
                out
            }
            Instr::Loop { cond, body } => {
                let mut out = format!("{}while {}\n", indent, self.dump_expr(*cond));
                out.push_str(&self.dump_block(*body, &deeper));
                out
            }
            Instr::Return { expr: Some(e) } => {
                format!("{}return {}\n", indent, self.dump_expr(*e))
            }
            Instr::Return { expr: None } => format!("{}return\n", indent),
            Instr::Dummy => format!("{}<dummy>\n", indent),
        }
    }

    pub fn dump_expr(&self, id: ExprId) -> String {
        match &self.expr(id).kind {
            ExprKind::Literal(lit) => lit.vypcode_repr(),
            ExprKind::Symbol(a) => self.alloca(*a).name.clone(),
            ExprKind::Super { .. } => "super".to_string(),
            ExprKind::ObjectCast { class, inner } => format!(
                "({}){}",
                self.class(*class).name,
                self.dump_expr(*inner)
            ),
            ExprKind::StringCast { inner } => format!("(string){}", self.dump_expr(*inner)),
            ExprKind::FunctionCall { function, args } => {
                let name = self.function(*function).name.clone();
                match args {
                    Some(args) => format!("{}({})", name, self.dump_args(args)),
                    None => name,
                }
            }
            ExprKind::Constructor { class } => format!("new {}", self.class(*class).name),
            ExprKind::Method {
                function,
                context,
                args,
            } => {
                let base = format!(
                    "{}.{}",
                    self.dump_expr(*context),
                    self.function(*function).name
                );
                match args {
                    // Position 0 is the receiver, already printed.
                    Some(args) => format!("{}({})", base, self.dump_args(&args[1..])),
                    None => base,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => format!(
                "({} {} {})",
                self.dump_expr(*lhs),
                op,
                self.dump_expr(*rhs)
            ),
            ExprKind::Not(e) => format!("!{}", self.dump_expr(*e)),
            ExprKind::ObjectAttribute {
                object, attribute, ..
            } => format!(
                "{}.{}",
                self.dump_expr(*object),
                self.alloca(*attribute).name
            ),
            ExprKind::Dummy => "<dummy>".to_string(),
        }
    }

    fn dump_args(&self, args: &[ExprId]) -> String {
        args.iter()
            .map(|a| self.dump_expr(*a))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
