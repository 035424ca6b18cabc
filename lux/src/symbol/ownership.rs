//! Ownership and cascading deletion

use super::class::Class;
use super::handle::{Context, Handle, RangeKind};
use super::record::Payload;
use super::{STACK_GROW_SIZE, STACK_RED_ZONE, SymbolTable};
use crate::interp::error::{InterpResult, RuntimeError};

impl SymbolTable {
    /// Makes `owner` the context of `child` if `child` is an anonymous,
    /// unowned, live handle. Returns whether ownership was taken.
    pub fn embed(&mut self, child: Handle, owner: Handle) -> bool {
        if child == owner || self.is_named(child) || self.is_constant(child) {
            return false;
        }
        match self.get_mut(child) {
            Some(record) if !record.context.is_owned() => {
                record.context = Context::Owner(owner);
                true
            }
            _ => false,
        }
    }

    /// Releases the payload of `handle`, zapping the children it owns (or
    /// that the active zap guard owns). Class becomes Undefined; the handle
    /// and its context are kept.
    pub fn undefine(&mut self, handle: Handle) -> InterpResult<()> {
        self.check_mutable(handle)?;
        if self.class_of(handle) == Class::Unused {
            return Err(RuntimeError::invalid_handle(handle));
        }
        self.undefine_inner(handle);
        Ok(())
    }

    fn undefine_inner(&mut self, handle: Handle) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let Some(record) = self.arena.get_mut(handle) else {
                return;
            };
            let payload = std::mem::replace(&mut record.payload, Payload::Undefined);
            for child in payload.children() {
                if child == handle {
                    continue;
                }
                let owned = match self.context_of(child) {
                    Some(Context::Owner(owner)) => {
                        owner == handle || Some(owner) == self.zap_guard
                    }
                    _ => false,
                };
                if owned {
                    self.zap_inner(child);
                }
            }
        })
    }

    /// Deletes `handle` and everything it owns. Deleting an Unused handle is
    /// a no-op; constants and out-of-range handles are refused.
    pub fn zap(&mut self, handle: Handle) -> InterpResult<()> {
        self.check_mutable(handle)?;
        if self.class_of(handle) != Class::Unused {
            self.zap_inner(handle);
        }
        Ok(())
    }

    fn zap_inner(&mut self, handle: Handle) {
        let class = self.class_of(handle);
        if class == Class::Unused {
            return;
        }
        let saved_guard = self.zap_guard;
        if class.is_routine() {
            log::debug!("tearing down routine {handle}");
            self.zap_guard = Some(handle);
        }
        self.names.remove(handle);
        self.undefine_inner(handle);
        self.arena.release(handle);
        self.zap_guard = saved_guard;
        log::trace!("zapped {handle} ({class})");
    }

    fn check_mutable(&self, handle: Handle) -> InterpResult<()> {
        if !self.arena.contains(handle) {
            log::warn!("refusing to delete out-of-range symbol {handle}");
            return Err(RuntimeError::invalid_handle(handle));
        }
        if self.is_constant(handle) {
            log::warn!("refusing to modify constant {handle}");
            return Err(RuntimeError::protected_handle(handle));
        }
        Ok(())
    }

    /// Gives `target` the value of `source`. A free temporary source is moved
    /// (its children re-parented to `target`, the source slot freed); any
    /// other source is deep-copied first.
    pub fn replace(&mut self, target: Handle, source: Handle) -> InterpResult<()> {
        if target == source {
            return Ok(());
        }
        self.check_mutable(target)?;
        self.record(target)?;
        self.record(source)?;

        let source = if self.is_free_temp(source) {
            source
        } else {
            self.copy(source)?
        };

        let mut payload = match self.get_mut(source) {
            Some(record) => std::mem::replace(&mut record.payload, Payload::Undefined),
            None => return Err(RuntimeError::invalid_handle(source)),
        };
        let moved: Vec<Handle> = payload
            .children()
            .into_iter()
            .filter(|&c| self.context_of(c) == Some(Context::Owner(source)))
            .collect();
        for child in &moved {
            if let Some(record) = self.get_mut(*child) {
                record.context = Context::Owner(target);
            }
        }
        // The source may have referenced itself through a child slot
        for slot in payload.children_mut() {
            if *slot == source {
                *slot = target;
            }
        }

        self.undefine_inner(target);
        if let Some(record) = self.get_mut(target) {
            record.payload = payload;
        }
        self.zap_inner(source);
        Ok(())
    }

    /// Deep copy of `source` into a fresh temporary. Owned children are copied
    /// recursively; references to values owned elsewhere are shared.
    pub fn copy(&mut self, source: Handle) -> InterpResult<Handle> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.copy_inner(source))
    }

    fn copy_inner(&mut self, source: Handle) -> InterpResult<Handle> {
        let record = self.record(source)?;
        let class = record.class();
        if class.is_routine() {
            return Err(RuntimeError::type_error("value", class.name()));
        }
        let mut payload = record.payload.clone();

        let mut copies = Vec::new();
        for child in payload.children() {
            if self.context_of(child) == Some(Context::Owner(source)) {
                copies.push(Some(self.copy_inner(child)?));
            } else {
                copies.push(None);
            }
        }
        for (slot, copy) in payload.children_mut().into_iter().zip(copies) {
            if let Some(copy) = copy {
                *slot = copy;
            }
        }

        let range = if class.is_executable() {
            RangeKind::TempExecutable
        } else {
            RangeKind::TempVariable
        };
        self.build(range, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interp::error::ErrorKind;
    use crate::symbol::{Namespace, Number, Pending};

    fn table() -> SymbolTable {
        SymbolTable::new(&Config::default())
    }

    fn list_of_two(st: &mut SymbolTable) -> (Handle, Handle, Handle) {
        let a = st.new_scalar(Number::Int32(1)).unwrap();
        let b = st.new_string("b".into()).unwrap();
        st.push_pending(Pending { key: None, value: a });
        st.push_pending(Pending { key: None, value: b });
        let list = st.new_compact_list(2).unwrap();
        (list, a, b)
    }

    #[test]
    fn test_embed_takes_single_ownership() {
        let mut st = table();
        let (list, a, _) = list_of_two(&mut st);
        assert_eq!(st.context_of(a), Some(Context::Owner(list)));
        let other = st.new_scalar(Number::Int32(0)).unwrap();
        assert!(!st.embed(a, other));
        assert_eq!(st.context_of(a), Some(Context::Owner(list)));
    }

    #[test]
    fn test_embed_refuses_named_and_constants() {
        let mut st = table();
        let owner = st.new_scalar(Number::Int32(0)).unwrap();
        let x = st.install_variable("X").unwrap();
        assert!(!st.embed(x, owner));
        assert!(!st.embed(st.constants().pi, owner));
    }

    #[test]
    fn test_zap_cascades_and_is_idempotent() {
        let mut st = table();
        let (list, a, b) = list_of_two(&mut st);
        st.zap(list).unwrap();
        for h in [list, a, b] {
            assert_eq!(st.class_of(h), Class::Unused);
        }
        assert!(st.zap(list).is_ok());
    }

    #[test]
    fn test_undefine_keeps_handle_and_context() {
        let mut st = table();
        let (list, a, _) = list_of_two(&mut st);
        st.undefine(list).unwrap();
        assert_eq!(st.class_of(list), Class::Undefined);
        assert_eq!(st.class_of(a), Class::Unused);
        assert_eq!(st.context_of(list), Some(Context::TopLevel));
    }

    #[test]
    fn test_zap_refuses_constants_and_out_of_range() {
        let mut st = table();
        let pi = st.constants().pi;
        assert_eq!(st.zap(pi).unwrap_err().kind, ErrorKind::ProtectedHandle);
        assert_eq!(st.class_of(pi), Class::Scalar);
        let far = Handle::new(u32::MAX);
        assert_eq!(st.zap(far).unwrap_err().kind, ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_zap_removes_name() {
        let mut st = table();
        let x = st.install_variable("X").unwrap();
        st.zap(x).unwrap();
        assert_eq!(st.lookup(Namespace::Variable, "X", Context::TopLevel), None);
    }

    #[test]
    fn test_replace_moves_free_temporary() {
        let mut st = table();
        let x = st.install_variable("X").unwrap();
        let (list, a, b) = list_of_two(&mut st);
        st.replace(x, list).unwrap();
        assert_eq!(st.class_of(x), Class::CompactList);
        assert_eq!(st.class_of(list), Class::Unused);
        assert_eq!(st.context_of(a), Some(Context::Owner(x)));
        assert_eq!(st.context_of(b), Some(Context::Owner(x)));
    }

    #[test]
    fn test_replace_copies_named_source() {
        let mut st = table();
        let x = st.install_variable("X").unwrap();
        let y = st.install_variable("Y").unwrap();
        let (list, a, _) = list_of_two(&mut st);
        st.replace(x, list).unwrap();
        st.replace(y, x).unwrap();
        let Payload::CompactList(items) = st.payload(y).unwrap().clone() else {
            panic!("expected a compact list");
        };
        assert_ne!(items[0], a);
        assert_eq!(st.context_of(items[0]), Some(Context::Owner(y)));
        assert_eq!(st.class_of(a), Class::Scalar);
    }

    #[test]
    fn test_copy_is_deep() {
        let mut st = table();
        let (list, a, _) = list_of_two(&mut st);
        let dup = st.copy(list).unwrap();
        st.zap(list).unwrap();
        assert_eq!(st.class_of(a), Class::Unused);
        let Payload::CompactList(items) = st.payload(dup).unwrap().clone() else {
            panic!("expected a compact list");
        };
        assert_eq!(st.payload(items[0]).unwrap(), &Payload::Scalar(Number::Int32(1)));
    }

    #[test]
    fn test_deep_nesting_teardown() {
        let mut st = table();
        let mut inner = st.new_scalar(Number::Int32(0)).unwrap();
        for _ in 0..2000 {
            st.push_pending(Pending { key: None, value: inner });
            inner = st.new_compact_list(1).unwrap();
        }
        st.zap(inner).unwrap();
        assert_eq!(st.arena().live(RangeKind::TempVariable).count(), 0);
    }
}
