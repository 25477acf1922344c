//! Classes, visibility, and inheritance
//!
//! Member lists keep declaration order with a visibility tag per entry;
//! the visibility-window lookups and the ancestor walk live on
//! `Program` because they cross arenas.

use crate::error::{CompileError, CompileResult};
use crate::program::{AllocaId, ClassId, ExprId, FunctionId, Program};
use crate::types::Datatype;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    /// `None` only for the root class `Object`.
    pub parent: Option<ClassId>,
    /// Methods in declaration order. The explicit constructor (name ==
    /// class name) also appears here.
    pub methods: Vec<(FunctionId, Visibility)>,
    /// Attributes in declaration order.
    pub attributes: Vec<(AllocaId, Visibility)>,
    /// Explicit constructor, if the user wrote one.
    pub constructor: Option<FunctionId>,
    /// Per-attribute initializers: the attribute and its explicit
    /// initializer expression (`None` means the type's default).
    pub implicit: Vec<(AllocaId, Option<ExprId>)>,
}

impl Class {
    pub fn new(name: impl Into<String>, parent: Option<ClassId>) -> Self {
        Class {
            name: name.into(),
            parent,
            methods: Vec::new(),
            attributes: Vec::new(),
            constructor: None,
            implicit: Vec::new(),
        }
    }

    /// Wipe all members while preserving identity and parent link. Pass
    /// 2 uses this to rebuild bodies over the pass-1 shell.
    pub fn clear(&mut self) {
        self.methods.clear();
        self.attributes.clear();
        self.constructor = None;
        self.implicit.clear();
    }

    pub fn methods_with(&self, vis: Visibility) -> impl Iterator<Item = FunctionId> + '_ {
        self.methods
            .iter()
            .filter(move |(_, v)| *v == vis)
            .map(|(f, _)| *f)
    }

    pub fn attributes_with(&self, vis: Visibility) -> impl Iterator<Item = AllocaId> + '_ {
        self.attributes
            .iter()
            .filter(move |(_, v)| *v == vis)
            .map(|(a, _)| *a)
    }
}

/// Buckets scanned for a lookup with the given visibility window. A
/// class-internal request sees private, then protected, then public;
/// an outside request sees public only.
fn visibility_window(vis: Visibility) -> &'static [Visibility] {
    match vis {
        Visibility::Private | Visibility::Protected => &[
            Visibility::Private,
            Visibility::Protected,
            Visibility::Public,
        ],
        Visibility::Public => &[Visibility::Public],
    }
}

impl Program {
    /// Set or replace a class's base, rejecting inheritance cycles.
    pub fn set_class_parent(&mut self, class: ClassId, parent: ClassId) -> CompileResult<()> {
        // Walk up from the prospective parent; finding `class` there
        // would close a cycle.
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == class {
                return Err(CompileError::semantic(format!(
                    "class {} transitively derives from itself",
                    self.class(class).name
                )));
            }
            cursor = self.class(c).parent;
        }
        self.class_mut(class).parent = Some(parent);
        Ok(())
    }

    /// True when `ancestor` appears strictly above `class` in the
    /// inheritance chain.
    pub fn is_ancestor(&self, ancestor: ClassId, class: ClassId) -> bool {
        let mut cursor = self.class(class).parent;
        while let Some(c) = cursor {
            if c == ancestor {
                return true;
            }
            cursor = self.class(c).parent;
        }
        false
    }

    /// Assignability: equal types, or subsumption for object types
    /// (`dest` an ancestor of `src`). Function values are never
    /// assignable.
    pub fn can_assign(&self, dest: &Datatype, src: &Datatype) -> bool {
        if matches!(dest, Datatype::Function) || matches!(src, Datatype::Function) {
            return false;
        }
        if dest == src {
            return true;
        }
        match (dest.object_name(), src.object_name()) {
            (Some(d), Some(s)) => {
                match (self.find_class(d), self.find_class(s)) {
                    (Some(dc), Some(sc)) => self.is_ancestor(dc, sc),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Add a method, rejecting duplicate member names within the class.
    /// A method named like its class is the constructor: it must be
    /// void and take no user parameters.
    pub fn class_add_method(
        &mut self,
        class: ClassId,
        function: FunctionId,
        vis: Visibility,
    ) -> CompileResult<()> {
        let name = self.function(function).name.clone();
        if self.class_member_exists(class, &name) {
            return Err(CompileError::semantic(format!(
                "Redefinition of {} in class {}",
                name,
                self.class(class).name
            )));
        }
        let is_constructor = name == self.class(class).name;
        if is_constructor {
            let f = self.function(function);
            // The only argument a constructor carries is the synthetic
            // receiver.
            if !f.is_void() || f.args.len() > 1 {
                return Err(CompileError::semantic(format!(
                    "constructor of class {} must be void and take no arguments",
                    self.class(class).name
                )));
            }
        }
        let c = self.class_mut(class);
        c.methods.push((function, vis));
        if is_constructor {
            c.constructor = Some(function);
        }
        Ok(())
    }

    /// Add an attribute, rejecting duplicate member names.
    pub fn class_add_attribute(
        &mut self,
        class: ClassId,
        attribute: AllocaId,
        vis: Visibility,
        init: Option<ExprId>,
    ) -> CompileResult<()> {
        let name = self.alloca(attribute).name.clone();
        if self.class_member_exists(class, &name) {
            return Err(CompileError::semantic(format!(
                "Redefinition of {} in class {}",
                name,
                self.class(class).name
            )));
        }
        let c = self.class_mut(class);
        c.attributes.push((attribute, vis));
        c.implicit.push((attribute, init));
        Ok(())
    }

    /// Refresh an indexed attribute in place: pass 2 re-resolves its
    /// visibility and initializer while keeping the pass-1 identity, so
    /// method bodies parsed before the attribute's own re-declaration
    /// still resolve it.
    pub fn class_update_attribute(
        &mut self,
        class: ClassId,
        attribute: AllocaId,
        vis: Visibility,
        init: Option<ExprId>,
    ) {
        let c = self.class_mut(class);
        match c.attributes.iter_mut().find(|(a, _)| *a == attribute) {
            Some(entry) => entry.1 = vis,
            None => c.attributes.push((attribute, vis)),
        }
        match c.implicit.iter_mut().find(|(a, _)| *a == attribute) {
            Some(entry) => entry.1 = init,
            None => c.implicit.push((attribute, init)),
        }
    }

    /// Refresh an indexed method in place (pass-2 counterpart of
    /// `class_add_method`), re-running the constructor constraints
    /// against the rebuilt signature.
    pub fn class_update_method(
        &mut self,
        class: ClassId,
        function: FunctionId,
        vis: Visibility,
    ) -> CompileResult<()> {
        let is_constructor = self.function(function).name == self.class(class).name;
        if is_constructor {
            let f = self.function(function);
            if !f.is_void() || f.args.len() > 1 {
                return Err(CompileError::semantic(format!(
                    "constructor of class {} must be void and take no arguments",
                    self.class(class).name
                )));
            }
        }
        let c = self.class_mut(class);
        match c.methods.iter_mut().find(|(f, _)| *f == function) {
            Some(entry) => entry.1 = vis,
            None => c.methods.push((function, vis)),
        }
        if is_constructor {
            c.constructor = Some(function);
        }
        Ok(())
    }

    fn class_member_exists(&self, class: ClassId, name: &str) -> bool {
        let c = self.class(class);
        c.methods
            .iter()
            .any(|(f, _)| self.function(*f).name == name)
            || c.attributes
                .iter()
                .any(|(a, _)| self.alloca(*a).name == name)
    }

    /// Look a method up by name (and argument count when the call site
    /// knows its argument types), searching the class under the given
    /// visibility window and then ancestors under `Public` only.
    pub fn class_get_method(
        &self,
        class: ClassId,
        name: &str,
        argtypes: Option<&[Datatype]>,
        vis: Visibility,
    ) -> Option<(FunctionId, ClassId)> {
        let mut cursor = Some(class);
        let mut window = vis;
        while let Some(c) = cursor {
            for bucket in visibility_window(window) {
                for f in self.class(c).methods_with(*bucket) {
                    let func = self.function(f);
                    if func.name != name {
                        continue;
                    }
                    if let Some(types) = argtypes {
                        if types.len() != func.args.len() {
                            continue;
                        }
                    }
                    return Some((f, c));
                }
            }
            cursor = self.class(c).parent;
            // Private and protected members are not inherited.
            window = Visibility::Public;
        }
        None
    }

    /// Attribute lookup with the same ladder as `class_get_method`.
    /// Returns the attribute and the class it was resolved in.
    pub fn class_get_attribute(
        &self,
        class: ClassId,
        name: &str,
        vis: Visibility,
    ) -> Option<(AllocaId, ClassId)> {
        let mut cursor = Some(class);
        let mut window = vis;
        while let Some(c) = cursor {
            for bucket in visibility_window(window) {
                for a in self.class(c).attributes_with(*bucket) {
                    if self.alloca(a).name == name {
                        return Some((a, c));
                    }
                }
            }
            cursor = self.class(c).parent;
            window = Visibility::Public;
        }
        None
    }

    /// Walk the parent chain for a method with the same name, any
    /// visibility. Used only for the override compatibility check.
    pub fn class_original_method(&self, class: ClassId, name: &str) -> Option<FunctionId> {
        let mut cursor = self.class(class).parent;
        while let Some(c) = cursor {
            for (f, _) in &self.class(c).methods {
                if self.function(*f).name == name {
                    return Some(*f);
                }
            }
            cursor = self.class(c).parent;
        }
        None
    }

    /// Check that `method` can override `original`: identical return
    /// type and parameter types, ignoring the receiver at position 0.
    /// `Invalid` acts as a wildcard so error-recovery stubs never
    /// double-report.
    pub fn override_compatible(&self, method: FunctionId, original: FunctionId) -> bool {
        let m = self.function(method);
        let o = self.function(original);
        match (&m.ret, &o.ret) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                if !a.is_invalid() && !b.is_invalid() && a != b {
                    return false;
                }
            }
            _ => return false,
        }
        if m.args.len() != o.args.len() {
            return false;
        }
        for (ma, oa) in m.args.iter().zip(o.args.iter()).skip(1) {
            let (mt, ot) = (&self.alloca(*ma).ty, &self.alloca(*oa).ty);
            if !mt.is_invalid() && !ot.is_invalid() && mt != ot {
                return false;
            }
        }
        true
    }
}
