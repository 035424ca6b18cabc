//! Per-class constructors and the pending-build stack.
//!
//! Each constructor allocates a slot, embeds every child handle the payload
//! stores, and writes the payload last. An error before that point leaves at
//! most an Undefined handle, which rollback reclaims.

use super::buffer::Buffer;
use super::class::ElementType;
use super::handle::{Handle, RangeKind};
use super::record::{
    ArrayValue, AssocFile, BinOp, Callee, Elements, ListEntry, Member, Payload, Statement,
    StructField,
};
use super::value::Number;
use super::{Pending, SymbolTable};
use crate::interp::error::{InterpResult, RuntimeError};

impl SymbolTable {
    /// Allocates in `range`, embeds the payload's children, then stamps it
    pub(crate) fn build(&mut self, range: RangeKind, payload: Payload) -> InterpResult<Handle> {
        let handle = self.allocate(range)?;
        for child in payload.children() {
            self.embed(child, handle);
        }
        if let Some(record) = self.get_mut(handle) {
            record.payload = payload;
        }
        Ok(handle)
    }

    fn temp_value(&mut self, payload: Payload) -> InterpResult<Handle> {
        self.build(RangeKind::TempVariable, payload)
    }

    fn temp_node(&mut self, payload: Payload) -> InterpResult<Handle> {
        self.build(RangeKind::TempExecutable, payload)
    }

    pub fn push_pending(&mut self, entry: Pending) {
        self.pending.push(entry);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pops the newest `count` pending entries, restored to push order
    fn pop_pending(&mut self, count: usize) -> InterpResult<Vec<Pending>> {
        if count > self.pending.len() {
            return Err(RuntimeError::syntax(&format!(
                "pending-build stack holds {} entries, {count} requested",
                self.pending.len()
            )));
        }
        let at = self.pending.len() - count;
        Ok(self.pending.split_off(at))
    }

    fn pop_values(&mut self, count: usize) -> InterpResult<Vec<Handle>> {
        Ok(self.pop_pending(count)?.into_iter().map(|p| p.value).collect())
    }

    /// Discards the pending-build stack after a failed parse
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn new_scalar(&mut self, value: Number) -> InterpResult<Handle> {
        self.temp_value(Payload::scalar(value))
    }

    pub fn new_string(&mut self, text: String) -> InterpResult<Handle> {
        self.temp_value(Payload::String(text))
    }

    /// Zero-filled numeric array
    pub fn new_array(&mut self, ty: ElementType, dims: Vec<usize>) -> InterpResult<Handle> {
        if !ty.is_numeric() {
            return self.new_text_array(dims.clone(), vec![String::new(); dims.iter().product()]);
        }
        let len = dims.iter().product();
        self.new_array_from(ArrayValue {
            dims,
            elements: Elements::Numeric(Buffer::zeroed(ty, len)),
        })
    }

    pub fn new_text_array(&mut self, dims: Vec<usize>, items: Vec<String>) -> InterpResult<Handle> {
        self.new_array_from(ArrayValue {
            dims,
            elements: Elements::Text(items),
        })
    }

    pub fn new_array_from(&mut self, value: ArrayValue) -> InterpResult<Handle> {
        self.temp_value(Payload::array(value))
    }

    pub fn new_range(&mut self, start: Handle, end: Handle) -> InterpResult<Handle> {
        self.temp_value(Payload::Range { start, end })
    }

    /// Keyed list from the newest `count` pending entries
    pub fn new_list(&mut self, count: usize) -> InterpResult<Handle> {
        let entries = self
            .pop_pending(count)?
            .into_iter()
            .map(|p| ListEntry {
                key: p.key,
                value: p.value,
            })
            .collect();
        self.temp_value(Payload::List(entries))
    }

    pub fn new_compact_list(&mut self, count: usize) -> InterpResult<Handle> {
        let items = self.pop_values(count)?;
        self.temp_value(Payload::CompactList(items))
    }

    /// Structure from the newest `count` pending entries; every entry needs a key
    pub fn new_struct(&mut self, count: usize) -> InterpResult<Handle> {
        let fields = self
            .pop_pending(count)?
            .into_iter()
            .map(|p| match p.key {
                Some(name) => Ok(StructField {
                    name: super::names::normalize(&name),
                    value: p.value,
                }),
                None => Err(RuntimeError::type_error("named field", "bare value")),
            })
            .collect::<InterpResult<Vec<_>>>()?;
        self.temp_value(Payload::Struct(fields))
    }

    pub fn new_list_pointer(&mut self, list: Handle, member: Member) -> InterpResult<Handle> {
        self.temp_value(Payload::ListPointer { list, member })
    }

    pub fn new_keyword(&mut self, name: &str, value: Handle) -> InterpResult<Handle> {
        self.temp_value(Payload::Keyword {
            name: super::names::normalize(name),
            value,
        })
    }

    /// Pointer to another variable
    pub fn new_transfer(&mut self, target: Option<Handle>) -> InterpResult<Handle> {
        self.temp_value(Payload::Transfer(target))
    }

    pub fn new_function_pointer(&mut self, callee: Callee) -> InterpResult<Handle> {
        self.temp_value(Payload::FunctionPointer(callee))
    }

    pub fn new_scalar_pointer(&mut self, array: Handle, index: usize) -> InterpResult<Handle> {
        self.temp_value(Payload::ScalarPointer { array, index })
    }

    pub fn new_subscript_pointer(&mut self, count: usize) -> InterpResult<Handle> {
        let items = self.pop_values(count)?;
        self.temp_value(Payload::SubscriptPointer(items))
    }

    pub fn new_assoc_file(&mut self, file: AssocFile) -> InterpResult<Handle> {
        self.temp_value(Payload::AssociatedFile(file))
    }

    pub fn new_binary(&mut self, op: BinOp, lhs: Handle, rhs: Handle) -> InterpResult<Handle> {
        self.temp_node(Payload::BinaryOp { op, lhs, rhs })
    }

    /// Function call node whose arguments are the newest `count` pending entries
    pub fn new_call(&mut self, callee: Callee, count: usize) -> InterpResult<Handle> {
        let args = self.pop_values(count)?;
        self.temp_node(Payload::FunctionCall { callee, args })
    }

    /// Subroutine call statement; arguments come from the pending stack
    pub fn new_call_statement(&mut self, callee: Callee, count: usize) -> InterpResult<Handle> {
        let args = self.pop_values(count)?;
        self.temp_node(Payload::Executable(Statement::Call { callee, args }))
    }

    /// Subscripted read; subscripts come from the pending stack
    pub fn new_extract(&mut self, source: Handle, count: usize) -> InterpResult<Handle> {
        let subscripts = self.pop_values(count)?;
        self.temp_node(Payload::Extract { source, subscripts })
    }

    pub fn new_statement(&mut self, statement: Statement) -> InterpResult<Handle> {
        self.temp_node(Payload::Executable(statement))
    }
}
