//! Symbol tables and the scope stack
//!
//! A `SymbolTable` is one scope mapping names to symbols; insertion
//! preserves the first writer. Iteration follows insertion order — the
//! generator walks the global scope, and hash-order iteration would
//! break byte-deterministic output.

use rustc_hash::FxHashMap;
use vypc_ir::{AllocaId, ClassId, FunctionId};

/// A named entity visible in some scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Function(FunctionId),
    Class(ClassId),
    Variable(AllocaId),
}

/// One scope. Function and class bindings are only accepted in scopes
/// flagged as function-storing (the global scope and class bodies).
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: FxHashMap<String, Symbol>,
    order: Vec<String>,
    stores_functions: bool,
}

impl SymbolTable {
    pub fn new(stores_functions: bool) -> Self {
        SymbolTable {
            entries: FxHashMap::default(),
            order: Vec::new(),
            stores_functions,
        }
    }

    pub fn stores_functions(&self) -> bool {
        self.stores_functions
    }

    /// Insert a binding; returns false if the name is already bound or
    /// the scope does not accept this kind of symbol.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> bool {
        let name = name.into();
        if !self.stores_functions
            && matches!(symbol, Symbol::Function(_) | Symbol::Class(_))
        {
            return false;
        }
        if self.entries.contains_key(&name) {
            return false;
        }
        self.order.push(name.clone());
        self.entries.insert(name, symbol);
        true
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.entries.get(name).copied()
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Symbol)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.entries[name]))
    }
}

/// Ordered stack of scopes. The bottom scope is the global one and can
/// never be popped.
#[derive(Debug)]
pub struct ScopeStack {
    tables: Vec<SymbolTable>,
}

impl ScopeStack {
    pub fn new(global: SymbolTable) -> Self {
        ScopeStack {
            tables: vec![global],
        }
    }

    pub fn push(&mut self, stores_functions: bool) {
        self.tables.push(SymbolTable::new(stores_functions));
    }

    pub fn pop(&mut self) {
        if self.tables.len() > 1 {
            self.tables.pop();
        }
    }

    /// Insert into the innermost scope.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> bool {
        self.tables
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, symbol)
    }

    pub fn search_current(&self, name: &str) -> Option<Symbol> {
        self.tables.last().and_then(|t| t.get(name))
    }

    pub fn search_global(&self, name: &str) -> Option<Symbol> {
        self.tables[0].get(name)
    }

    /// Innermost binding wins.
    pub fn search_all(&self, name: &str) -> Option<Symbol> {
        self.tables.iter().rev().find_map(|t| t.get(name))
    }

    pub fn global(&self) -> &SymbolTable {
        &self.tables[0]
    }

    pub fn into_global(mut self) -> SymbolTable {
        self.tables.truncate(1);
        self.tables.pop().expect("scope stack is never empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() {
        let mut table = SymbolTable::new(true);
        assert!(table.insert("x", Symbol::Variable(AllocaId(0))));
        assert!(!table.insert("x", Symbol::Variable(AllocaId(1))));
        assert_eq!(table.get("x"), Some(Symbol::Variable(AllocaId(0))));
    }

    #[test]
    fn test_non_storing_scope_rejects_functions() {
        let mut table = SymbolTable::new(false);
        assert!(!table.insert("f", Symbol::Function(FunctionId(0))));
        assert!(!table.insert("C", Symbol::Class(ClassId(0))));
        assert!(table.insert("x", Symbol::Variable(AllocaId(0))));
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let mut table = SymbolTable::new(true);
        table.insert("b", Symbol::Variable(AllocaId(0)));
        table.insert("a", Symbol::Variable(AllocaId(1)));
        table.insert("c", Symbol::Variable(AllocaId(2)));
        let names: Vec<_> = table.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_innermost_binding_wins() {
        let mut scopes = ScopeStack::new(SymbolTable::new(true));
        scopes.insert("x", Symbol::Variable(AllocaId(0)));
        scopes.push(false);
        scopes.insert("x", Symbol::Variable(AllocaId(1)));
        assert_eq!(scopes.search_all("x"), Some(Symbol::Variable(AllocaId(1))));
        assert_eq!(scopes.search_global("x"), Some(Symbol::Variable(AllocaId(0))));
        scopes.pop();
        assert_eq!(scopes.search_all("x"), Some(Symbol::Variable(AllocaId(0))));
    }

    #[test]
    fn test_global_scope_survives_pop() {
        let mut scopes = ScopeStack::new(SymbolTable::new(true));
        scopes.pop();
        scopes.insert("x", Symbol::Variable(AllocaId(0)));
        assert!(scopes.search_global("x").is_some());
    }
}
