//! Routine declaration and definition.
//!
//! Routines are compiled in two steps. `declare_routine` reserves the named
//! handle and the parameter slots before the body is parsed, so recursive
//! and forward calls resolve to a stable handle. `define_routine` then
//! attaches the statement list. A call to a routine nobody has declared yet
//! goes through `defer_routine`, whose placeholder a later definition fills
//! in without renumbering.

use super::handle::{Context, Handle, RangeKind};
use super::names::{Namespace, normalize};
use super::record::{Payload, Routine, RoutineKind};
use super::SymbolTable;
use crate::interp::error::{InterpResult, RuntimeError};

impl SymbolTable {
    pub fn find_routine(&self, kind: RoutineKind, name: &str) -> Option<Handle> {
        self.lookup(kind.into(), name, Context::TopLevel)
    }

    /// The routine behind `handle`
    pub fn routine(&self, handle: Handle) -> InterpResult<&Routine> {
        match self.payload(handle)? {
            Payload::Routine(r) => Ok(r),
            other => Err(RuntimeError::type_error("routine", other.class().name())),
        }
    }

    fn routine_mut(&mut self, handle: Handle) -> InterpResult<&mut Routine> {
        match self.get_mut(handle).map(|r| &mut r.payload) {
            Some(Payload::Routine(r)) => Ok(r),
            Some(other) => Err(RuntimeError::type_error("routine", other.class().name())),
            None => Err(RuntimeError::invalid_handle(handle)),
        }
    }

    /// First pass: reserves (or reuses) the routine handle and installs the
    /// parameters as variables owned by it. Redefinition tears down the old
    /// parameters, locals and body but keeps the handle.
    pub fn declare_routine(
        &mut self,
        kind: RoutineKind,
        name: &str,
        params: &[&str],
    ) -> InterpResult<Handle> {
        let handle = match self.find_routine(kind, name) {
            Some(existing) => {
                let saved = self.zap_guard;
                self.zap_guard = Some(existing);
                let result = self.undefine(existing);
                self.zap_guard = saved;
                result?;
                log::debug!("redefining {} {}", kind.class(), normalize(name));
                existing
            }
            None => self.install(kind.into(), name, Context::TopLevel)?,
        };

        let mut slots = Vec::with_capacity(params.len());
        for param in params {
            slots.push(self.install(Namespace::Variable, param, Context::Owner(handle))?);
        }

        if let Some(record) = self.get_mut(handle) {
            record.payload = Payload::Routine(Routine {
                kind,
                name: normalize(name),
                params: slots,
                locals: Vec::new(),
                body: None,
            });
        }
        Ok(handle)
    }

    /// Second pass: attaches `body` and takes ownership of its statements
    pub fn define_routine(&mut self, handle: Handle, body: Vec<Handle>) -> InterpResult<()> {
        self.routine(handle)?;
        for &statement in &body {
            self.embed(statement, handle);
        }
        self.routine_mut(handle)?.body = Some(body);
        Ok(())
    }

    /// Returns the routine called `name`, creating an empty declaration for a
    /// forward reference
    pub fn defer_routine(&mut self, kind: RoutineKind, name: &str) -> InterpResult<Handle> {
        if let Some(h) = self.find_routine(kind, name) {
            return Ok(h);
        }
        let handle = self.install(kind.into(), name, Context::TopLevel)?;
        if let Some(record) = self.get_mut(handle) {
            record.payload = Payload::Routine(Routine {
                kind,
                name: normalize(name),
                params: Vec::new(),
                locals: Vec::new(),
                body: None,
            });
        }
        log::trace!("deferred declaration of {}", normalize(name));
        Ok(handle)
    }

    /// Makes `routine` the scope for variables installed while its body is
    /// compiled. Returns the previous scope for [`SymbolTable::leave_routine`].
    pub fn enter_routine(&mut self, routine: Handle) -> Context {
        std::mem::replace(&mut self.scope, Context::Owner(routine))
    }

    pub fn leave_routine(&mut self, previous: Context) {
        self.scope = previous;
    }

    /// Routines currently installed, with their handles
    pub fn routines(&self) -> Vec<(RoutineKind, Handle)> {
        self.arena
            .live(RangeKind::NamedExecutable)
            .filter_map(|h| match self.get(h).map(|r| &r.payload) {
                Some(Payload::Routine(r)) => Some((r.kind, h)),
                _ => None,
            })
            .collect()
    }
}
