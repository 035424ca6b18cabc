//! Name resolution tables
//!
//! Four independent tables map an upper-cased name to a chain of handles.
//! A lookup matches the name *and* the stored handle's context, so two
//! routines each owning a local `X` never see each other's variable.

use super::SymbolTable;
use super::handle::{Context, Handle, RangeKind};
use super::record::{Payload, RoutineKind};
use crate::interp::error::InterpResult;
use std::collections::HashMap;

/// Which table a name lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Variable,
    Subroutine,
    Function,
    Block,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Variable,
        Namespace::Subroutine,
        Namespace::Function,
        Namespace::Block,
    ];

    fn position(self) -> usize {
        match self {
            Namespace::Variable => 0,
            Namespace::Subroutine => 1,
            Namespace::Function => 2,
            Namespace::Block => 3,
        }
    }

    fn range(self) -> RangeKind {
        match self {
            Namespace::Variable => RangeKind::NamedVariable,
            _ => RangeKind::NamedExecutable,
        }
    }
}

impl From<RoutineKind> for Namespace {
    fn from(kind: RoutineKind) -> Self {
        match kind {
            RoutineKind::Subroutine => Namespace::Subroutine,
            RoutineKind::Function => Namespace::Function,
            RoutineKind::Block => Namespace::Block,
        }
    }
}

/// Canonical spelling of a name
pub fn normalize(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Names starting with these characters always resolve at top level
pub fn is_global_name(name: &str) -> bool {
    name.starts_with(['$', '!', '#'])
}

/// One name table
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    chains: HashMap<String, Vec<Handle>>,
    by_handle: HashMap<Handle, String>,
}

impl NameTable {
    pub fn insert(&mut self, name: &str, handle: Handle) {
        let key = normalize(name);
        self.chains.entry(key.clone()).or_default().push(handle);
        self.by_handle.insert(handle, key);
    }

    /// Every handle chained under `name`, oldest first
    pub fn chain(&self, name: &str) -> &[Handle] {
        self.chains
            .get(&normalize(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Unlinks `handle`; the rest of its chain is untouched
    pub fn remove(&mut self, handle: Handle) -> Option<String> {
        let key = self.by_handle.remove(&handle)?;
        if let Some(chain) = self.chains.get_mut(&key) {
            chain.retain(|&h| h != handle);
            if chain.is_empty() {
                self.chains.remove(&key);
            }
        }
        Some(key)
    }

    pub fn name_of(&self, handle: Handle) -> Option<&str> {
        self.by_handle.get(&handle).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Handle)> + '_ {
        self.by_handle.iter().map(|(h, name)| (name.as_str(), *h))
    }
}

/// The four tables together
#[derive(Debug, Clone, Default)]
pub struct NameTables {
    tables: [NameTable; 4],
}

impl NameTables {
    pub fn table(&self, ns: Namespace) -> &NameTable {
        &self.tables[ns.position()]
    }

    pub fn table_mut(&mut self, ns: Namespace) -> &mut NameTable {
        &mut self.tables[ns.position()]
    }

    /// Unlinks `handle` from whichever table holds it
    pub fn remove(&mut self, handle: Handle) -> Option<String> {
        self.tables.iter_mut().find_map(|t| t.remove(handle))
    }

    pub fn name_of(&self, handle: Handle) -> Option<&str> {
        self.tables.iter().find_map(|t| t.name_of(handle))
    }
}

impl SymbolTable {
    /// Finds the handle named `name` whose context is exactly `context`.
    /// Routine names with a dotted suffix get one retry with the suffix cut.
    pub fn lookup(&self, ns: Namespace, name: &str, context: Context) -> Option<Handle> {
        match self.lookup_exact(ns, name, context) {
            None if ns != Namespace::Variable => {
                let (stem, _) = name.rsplit_once('.')?;
                log::trace!("retrying {name} as {stem}");
                self.lookup_exact(ns, stem, context)
            }
            found => found,
        }
    }

    fn lookup_exact(&self, ns: Namespace, name: &str, context: Context) -> Option<Handle> {
        self.names
            .table(ns)
            .chain(name)
            .iter()
            .rev()
            .copied()
            .find(|&h| self.arena.get(h).is_some_and(|r| r.context == context))
    }

    /// Allocates a named handle for `name` in `context` and chains it.
    /// The new record is Undefined.
    pub fn install(&mut self, ns: Namespace, name: &str, context: Context) -> InterpResult<Handle> {
        let handle = self.allocate(ns.range())?;
        if let Some(record) = self.arena.get_mut(handle) {
            record.context = context;
        }
        self.names.table_mut(ns).insert(name, handle);
        log::trace!("installed {} as {handle} in context {context}", normalize(name));
        Ok(handle)
    }

    /// Name under which `handle` is installed, if any
    pub fn name_of(&self, handle: Handle) -> Option<&str> {
        self.names.name_of(handle)
    }

    pub fn names(&self) -> &NameTables {
        &self.names
    }

    /// Resolves a variable in the current compile scope
    pub fn find_variable(&self, name: &str) -> Option<Handle> {
        self.lookup(Namespace::Variable, name, self.scope_for(name))
    }

    /// Resolves or creates a variable in the current compile scope. New
    /// variables inside a routine are recorded among its locals.
    pub fn install_variable(&mut self, name: &str) -> InterpResult<Handle> {
        let scope = self.scope_for(name);
        if let Some(h) = self.lookup(Namespace::Variable, name, scope) {
            return Ok(h);
        }
        let handle = self.install(Namespace::Variable, name, scope)?;
        if let Some(owner) = scope.owner() {
            if let Some(Payload::Routine(routine)) = self.arena.get_mut(owner).map(|r| &mut r.payload) {
                routine.locals.push(handle);
            }
        }
        Ok(handle)
    }

    fn scope_for(&self, name: &str) -> Context {
        if is_global_name(name) {
            Context::TopLevel
        } else {
            self.scope
        }
    }
}
