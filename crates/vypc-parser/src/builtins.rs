//! Built-in environment
//!
//! The global scope is seeded before any parsing with the `Object`
//! root class, the reading/string free functions, and the variadic
//! `print` sentinel. The generator recognizes these by name and emits
//! fixed templates for them.

use crate::symbol_table::{Symbol, SymbolTable};
use vypc_ir::{Class, Datatype, Function, PrimitiveType, Program, Visibility};

/// Names of the free functions whose bodies are fixed templates.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "readInt",
    "readFloat",
    "readString",
    "length",
    "subStr",
    "print",
];

fn int() -> Datatype {
    Datatype::Primitive(PrimitiveType::Int)
}

fn float() -> Datatype {
    Datatype::Primitive(PrimitiveType::Float)
}

fn string() -> Datatype {
    Datatype::Primitive(PrimitiveType::String)
}

/// Populate a fresh program with the built-in environment and return
/// the seeded global scope.
pub fn seed_global(program: &mut Program) -> SymbolTable {
    let mut global = SymbolTable::new(true);

    // Root class with its built-in methods. Both take the synthetic
    // receiver and return a string.
    let object = program.add_class(Class::new("Object", None));
    for name in ["toString", "getClass"] {
        let this = program.new_alloca(Datatype::Object("Object".into()), "this");
        let mut f = Function::new(Some(string()), name);
        f.prefix = Some("Object".into());
        f.args = vec![this];
        let f = program.add_function(f);
        program
            .class_add_method(object, f, Visibility::Public)
            .expect("fresh Object class has no members");
    }
    global.insert("Object", Symbol::Class(object));

    let mut free_function = |program: &mut Program,
                             global: &mut SymbolTable,
                             ret: Option<Datatype>,
                             name: &str,
                             params: &[(Datatype, &str)]| {
        let mut f = Function::new(ret, name);
        f.args = params
            .iter()
            .map(|(ty, pname)| program.new_alloca(ty.clone(), *pname))
            .collect();
        let f = program.add_function(f);
        global.insert(name, Symbol::Function(f));
    };

    free_function(program, &mut global, Some(int()), "readInt", &[]);
    free_function(program, &mut global, Some(float()), "readFloat", &[]);
    free_function(program, &mut global, Some(string()), "readString", &[]);
    free_function(program, &mut global, Some(int()), "length", &[(string(), "s")]);
    free_function(
        program,
        &mut global,
        Some(string()),
        "subStr",
        &[(string(), "s"), (int(), "i"), (int(), "n")],
    );
    // Variadic sentinel; calls are checked specially and lowered
    // inline, so the declared arg list stays empty.
    free_function(program, &mut global, None, "print", &[]);

    global
}
