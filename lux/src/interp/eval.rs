//! Statement execution and expression evaluation over symbol handles

use super::arith;
use super::builtins;
use super::error::{ErrorKind, InterpResult, RuntimeError};
use crate::config::Config;
use crate::error::{CompileError, Result};
use crate::script::Parser;
use crate::symbol::{
    ArrayValue, Buffer, Callee, Class, Context, Elements, Handle, MarkKind, Number, Payload,
    Pending, RangeKind, Routine, RoutineKind, STACK_GROW_SIZE, STACK_RED_ZONE, Statement,
    SymbolTable,
};
use std::path::{Path, PathBuf};

/// Extension tried when an `@file` include names no extension
const SOURCE_EXTENSION: &str = "lux";

/// Where `print` output goes
#[derive(Debug)]
enum Output {
    Stdout,
    Captured(Vec<String>),
}

/// Subscript after evaluation
#[derive(Debug, Clone, Copy)]
enum Subscript {
    Index(i64),
    Span(i64, i64),
}

/// The interpreter
#[derive(Debug)]
pub struct Interpreter {
    symbols: SymbolTable,
    output: Output,
    /// Directory `@file` includes are resolved against
    base_dir: PathBuf,
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        Interpreter {
            symbols: SymbolTable::new(config),
            output: Output::Stdout,
            base_dir: PathBuf::from("."),
        }
    }

    /// Interpreter whose output is collected for [`Interpreter::take_output`]
    pub fn capturing(config: &Config) -> Self {
        Interpreter {
            output: Output::Captured(Vec::new()),
            ..Interpreter::new(config)
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = dir.into();
    }

    /// Writes one line of program output
    pub fn emit(&mut self, line: String) {
        match &mut self.output {
            Output::Stdout => println!("{line}"),
            Output::Captured(lines) => lines.push(line),
        }
    }

    /// Drains captured output; always empty when writing to stdout
    pub fn take_output(&mut self) -> Vec<String> {
        match &mut self.output {
            Output::Stdout => Vec::new(),
            Output::Captured(lines) => std::mem::take(lines),
        }
    }

    // ========================================================================
    // Statement loop
    // ========================================================================

    /// Compiles and runs `source` one statement at a time. Each statement is
    /// bracketed by a checkpoint whose temporaries are rolled back when it
    /// finishes, whether it succeeded or not.
    pub fn run_source(&mut self, source: &str) -> Result<()> {
        let mut parser = Parser::new(source)?;
        loop {
            self.symbols.checkpoint(MarkKind::Statement);
            let outcome = match parser.next_statement(&mut self.symbols) {
                Ok(Some(statement)) => self.execute(statement).map_err(CompileError::from),
                Ok(None) => {
                    self.symbols.rollback_to(MarkKind::Statement);
                    return Ok(());
                }
                Err(e) => {
                    self.symbols.clear_pending();
                    Err(e)
                }
            };
            self.symbols.rollback_to(MarkKind::Statement);

            match outcome {
                Ok(()) => {}
                Err(CompileError::Runtime(e)) if e.is_control_flow() => {
                    if let ErrorKind::Return(Some(value)) = e.kind {
                        self.discard(value);
                    }
                    log::warn!("line {}: {} ignored", self.symbols.line(), e.message);
                }
                Err(e) => {
                    log::debug!("statement at line {} failed: {e}", self.symbols.line());
                    return Err(e);
                }
            }
        }
    }

    /// Runs a source file; includes resolve relative to its directory
    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))?;
        if let Some(dir) = path.parent() {
            self.base_dir = dir.to_path_buf();
        }
        self.run_source(&source)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Executes one statement handle inside its own checkpoint window. A
    /// returned value is kept out of the window so it survives the rollback.
    pub fn execute(&mut self, statement: Handle) -> InterpResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.symbols.checkpoint(MarkKind::Statement);
            let result = self.execute_inner(statement);
            if let Err(RuntimeError { kind: ErrorKind::Return(Some(value)), .. }) = &result {
                self.symbols.unmark(*value);
            }
            self.symbols.rollback();
            result
        })
    }

    fn execute_inner(&mut self, statement: Handle) -> InterpResult<()> {
        let record = self.symbols.record(statement)?;
        let (class, line) = (record.class(), record.line);
        let stmt = match &record.payload {
            Payload::Executable(stmt) => Some(stmt.clone()),
            _ => None,
        };
        let Some(stmt) = stmt else {
            // Compiling a definition was its whole effect
            if !class.is_routine() {
                self.evaluate(statement)?;
            }
            return Ok(());
        };
        self.symbols.set_line(line);
        self.symbols.tick();
        self.run_statement(stmt)
    }

    fn run_statement(&mut self, stmt: Statement) -> InterpResult<()> {
        match stmt {
            Statement::Replace { target, value } => {
                let value = self.evaluate(value)?;
                let target = self.resolve_target(target)?;
                self.symbols.replace(target, value)
            }
            Statement::Call { callee, args } => {
                let result = self.call(callee, &args)?;
                self.discard(result);
                Ok(())
            }
            Statement::Block(items) => {
                for item in items {
                    self.execute(item)?;
                }
                Ok(())
            }
            Statement::If { cond, then, otherwise } => {
                if self.test(cond)? {
                    self.execute(then)
                } else if let Some(otherwise) = otherwise {
                    self.execute(otherwise)
                } else {
                    Ok(())
                }
            }
            Statement::For { var, start, end, body } => self.run_for(var, start, end, body),
            Statement::While { cond, body } => {
                while self.test(cond)? {
                    if !self.run_body(body)? {
                        break;
                    }
                }
                Ok(())
            }
            Statement::Repeat { body, cond } => {
                while self.run_body(body)? && !self.test(cond)? {}
                Ok(())
            }
            Statement::Return(value) => {
                let value = match value {
                    Some(expr) => {
                        let v = self.evaluate(expr)?;
                        Some(self.detach(v)?)
                    }
                    None => None,
                };
                Err(RuntimeError::return_value(value))
            }
            Statement::Break => Err(RuntimeError::break_loop()),
            Statement::Continue => Err(RuntimeError::continue_loop()),
            Statement::Run(block) => {
                let result = self.call_user(block, &[])?;
                self.discard(result);
                Ok(())
            }
            Statement::Include(path) => self.include(&path),
        }
    }

    /// Runs a loop body. `Ok(false)` means the loop was broken out of.
    fn run_body(&mut self, body: Handle) -> InterpResult<bool> {
        match self.execute(body) {
            Ok(()) => Ok(true),
            Err(e) if e.kind == ErrorKind::Continue => Ok(true),
            Err(e) if e.kind == ErrorKind::Break => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn run_for(&mut self, var: Handle, start: Handle, end: Handle, body: Handle) -> InterpResult<()> {
        let first = self.index_value(start)?;
        let last = self.index_value(end)?;
        let var = self.resolve_target(var)?;
        let wide = i32::try_from(first).is_err() || i32::try_from(last).is_err();

        let mut i = first;
        while i <= last {
            let n = if wide {
                Number::Int64(i)
            } else {
                Number::Int32(i as i32)
            };
            let value = self.symbols.new_scalar(n)?;
            self.symbols.replace(var, value)?;
            if !self.run_body(body)? {
                break;
            }
            match i.checked_add(1) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(())
    }

    /// Evaluates a condition inside its own window
    fn test(&mut self, cond: Handle) -> InterpResult<bool> {
        self.symbols.checkpoint(MarkKind::Statement);
        let result = self.evaluate(cond).and_then(|v| self.truthy(v));
        self.symbols.rollback();
        result
    }

    /// Scalars are true when nonzero, strings when non-empty, arrays when
    /// every element is
    pub fn truthy(&self, value: Handle) -> InterpResult<bool> {
        match self.symbols.payload(value)? {
            Payload::Scalar(n) | Payload::ComplexScalar(n) => Ok(!n.is_zero()),
            Payload::String(s) => Ok(!s.is_empty()),
            Payload::Array(a) | Payload::ComplexArray(a) => Ok(match &a.elements {
                Elements::Numeric(b) => b.iter().all(|n| !n.is_zero()),
                Elements::Text(t) => t.iter().all(|s| !s.is_empty()),
            }),
            other => Err(RuntimeError::type_error("condition", other.class().name())),
        }
    }

    fn include(&mut self, path: &str) -> InterpResult<()> {
        let mut full = self.base_dir.join(path);
        if full.extension().is_none() && !full.exists() {
            full.set_extension(SOURCE_EXTENSION);
        }
        let source = std::fs::read_to_string(&full)
            .map_err(|e| RuntimeError::io_error(&format!("{}: {e}", full.display())))?;

        let saved_dir = self.base_dir.clone();
        if let Some(dir) = full.parent() {
            self.base_dir = dir.to_path_buf();
        }
        self.symbols.enter_compile();
        let result = self.run_source(&source);
        self.symbols.leave_compile();
        self.base_dir = saved_dir;

        result.map_err(|e| match e {
            CompileError::Runtime(e) => e,
            other => RuntimeError::syntax(&format!("{}: {}", full.display(), other.message())),
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Reduces `handle` to a value handle. Values evaluate to themselves.
    pub fn evaluate(&mut self, handle: Handle) -> InterpResult<Handle> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_inner(handle))
    }

    fn evaluate_inner(&mut self, handle: Handle) -> InterpResult<Handle> {
        let class = self.symbols.record(handle)?.class();
        match class {
            Class::Scalar
            | Class::ComplexScalar
            | Class::String
            | Class::Array
            | Class::ComplexArray
            | Class::Struct
            | Class::ListPointer
            | Class::FunctionPointer
            | Class::SubscriptPointer
            | Class::AssociatedFile => return Ok(handle),
            Class::Undefined => return Err(self.undefined(handle)),
            Class::Unused => return Err(RuntimeError::invalid_handle(handle)),
            Class::Subroutine | Class::Function | Class::BlockRoutine | Class::ExecutableNode => {
                return Err(RuntimeError::type_error("value", class.name()));
            }
            _ => {}
        }

        match self.symbols.payload(handle)?.clone() {
            Payload::Range { .. } | Payload::List(_) | Payload::CompactList(_) => {
                if self.is_literal(handle) {
                    Ok(handle)
                } else {
                    self.rebuild(handle)
                }
            }
            Payload::Keyword { value, .. } => self.evaluate(value),
            Payload::Transfer(Some(target)) => self.evaluate(target),
            Payload::Transfer(None) => Err(self.undefined(handle)),
            Payload::BinaryOp { op, lhs, rhs } => {
                let l = self.evaluate(lhs)?;
                let r = self.evaluate(rhs)?;
                arith::binary(&mut self.symbols, op, l, r)
            }
            Payload::FunctionCall { callee, args } => self.call(callee, &args),
            Payload::Extract { source, subscripts } => self.extract(source, &subscripts),
            Payload::ScalarPointer { array, index } => self.element(array, index),
            other => Err(RuntimeError::type_error("value", other.class().name())),
        }
    }

    fn undefined(&self, handle: Handle) -> RuntimeError {
        RuntimeError::undefined_variable(self.symbols.name_of(handle).unwrap_or("<anonymous>"))
    }

    /// A container whose children are all its own literal values
    fn is_literal(&self, handle: Handle) -> bool {
        let Ok(payload) = self.symbols.payload(handle) else {
            return false;
        };
        match payload {
            Payload::Range { .. } | Payload::List(_) | Payload::CompactList(_) => {
                payload.children().into_iter().all(|child| {
                    self.symbols.context_of(child) == Some(Context::Owner(handle))
                        && self.is_literal(child)
                })
            }
            other => other.class().is_numeric_or_text(),
        }
    }

    /// Builds a fresh container from the evaluated children of `handle`
    fn rebuild(&mut self, handle: Handle) -> InterpResult<Handle> {
        match self.symbols.payload(handle)?.clone() {
            Payload::Range { start, end } => {
                let start = self.evaluate_detached(start)?;
                let end = self.evaluate_detached(end)?;
                self.symbols.new_range(start, end)
            }
            Payload::List(entries) => {
                let mut items = Vec::with_capacity(entries.len());
                for entry in entries {
                    let value = self.evaluate_detached(entry.value)?;
                    items.push(Pending { key: entry.key, value });
                }
                let count = items.len();
                for item in items {
                    self.symbols.push_pending(item);
                }
                self.symbols.new_list(count)
            }
            Payload::CompactList(members) => {
                let mut items = Vec::with_capacity(members.len());
                for member in members {
                    items.push(self.evaluate_detached(member)?);
                }
                let count = items.len();
                for value in items {
                    self.symbols.push_pending(Pending { key: None, value });
                }
                self.symbols.new_compact_list(count)
            }
            other => Err(RuntimeError::type_error("container", other.class().name())),
        }
    }

    fn evaluate_detached(&mut self, handle: Handle) -> InterpResult<Handle> {
        let value = self.evaluate(handle)?;
        self.detach(value)
    }

    /// A free temporary holding `value`: itself when already free, else a copy
    fn detach(&mut self, value: Handle) -> InterpResult<Handle> {
        if self.symbols.is_free_temp(value) {
            Ok(value)
        } else {
            self.symbols.copy(value)
        }
    }

    /// Zaps `value` if nothing else can reach it
    fn discard(&mut self, value: Handle) {
        if self.symbols.is_free_temp(value) {
            if let Err(e) = self.symbols.zap(value) {
                log::warn!("could not discard {value}: {e}");
            }
        }
    }

    /// Follows transfer (by-reference) slots to the variable they stand for
    fn resolve_target(&self, mut target: Handle) -> InterpResult<Handle> {
        while let Payload::Transfer(Some(next)) = self.symbols.payload(target)? {
            target = *next;
        }
        Ok(target)
    }

    /// Scalar number behind an evaluated handle
    fn scalar_of(&self, value: Handle) -> InterpResult<Number> {
        match self.symbols.payload(value)? {
            Payload::Scalar(n) | Payload::ComplexScalar(n) => Ok(*n),
            other => Err(RuntimeError::type_error("scalar", other.class().name())),
        }
    }

    fn index_value(&mut self, expr: Handle) -> InterpResult<i64> {
        let value = self.evaluate(expr)?;
        Ok(self.scalar_of(value)?.to_i64())
    }

    fn subscript(&mut self, expr: Handle) -> InterpResult<Subscript> {
        let value = self.evaluate(expr)?;
        match self.symbols.payload(value)? {
            Payload::Range { start, end } => {
                let (start, end) = (*start, *end);
                Ok(Subscript::Span(self.index_value(start)?, self.index_value(end)?))
            }
            _ => Ok(Subscript::Index(self.scalar_of(value)?.to_i64())),
        }
    }

    fn extract(&mut self, source: Handle, subscripts: &[Handle]) -> InterpResult<Handle> {
        let source = self.resolve_target(source)?;
        let mut subs = Vec::with_capacity(subscripts.len());
        for &s in subscripts {
            subs.push(self.subscript(s)?);
        }

        let members: Option<Vec<Handle>> = match self.symbols.payload(source)? {
            Payload::List(entries) => Some(entries.iter().map(|e| e.value).collect()),
            Payload::CompactList(items) => Some(items.clone()),
            Payload::Struct(fields) => Some(fields.iter().map(|f| f.value).collect()),
            _ => None,
        };
        if let Some(members) = members {
            return match subs.as_slice() {
                [Subscript::Index(i)] => Ok(members[checked_index(*i, members.len())?]),
                _ => Err(RuntimeError::type_error("single list index", "subscript list")),
            };
        }

        let (dims, len) = match self.symbols.payload(source)? {
            Payload::Array(a) | Payload::ComplexArray(a) => (a.dims.clone(), a.len()),
            Payload::Scalar(_) | Payload::ComplexScalar(_) | Payload::String(_) => {
                return match subs.as_slice() {
                    [Subscript::Index(i)] => {
                        checked_index(*i, 1)?;
                        Ok(source)
                    }
                    _ => Err(RuntimeError::type_error("array", "scalar")),
                };
            }
            Payload::Undefined => return Err(self.undefined(source)),
            other => return Err(RuntimeError::type_error("array or list", other.class().name())),
        };

        let (indices, single) = match subs.as_slice() {
            [Subscript::Span(a, b)] => {
                let indices = (*a..=*b)
                    .map(|i| checked_index(i, len))
                    .collect::<InterpResult<Vec<_>>>()?;
                (indices, false)
            }
            [Subscript::Index(i)] => (vec![checked_index(*i, len)?], true),
            many => {
                if many.len() != dims.len() {
                    return Err(RuntimeError::type_error(
                        &format!("{} subscripts", dims.len()),
                        &format!("{} subscripts", many.len()),
                    ));
                }
                let mut flat = 0;
                let mut stride = 1;
                for (sub, &dim) in many.iter().zip(&dims) {
                    let Subscript::Index(i) = *sub else {
                        return Err(RuntimeError::type_error("scalar subscript", "range"));
                    };
                    flat += checked_index(i, dim)? * stride;
                    stride *= dim;
                }
                (vec![flat], true)
            }
        };
        self.gather(source, &indices, single)
    }

    /// Copies the selected elements of an array into a new temporary
    fn gather(&mut self, array: Handle, indices: &[usize], single: bool) -> InterpResult<Handle> {
        let (Payload::Array(value) | Payload::ComplexArray(value)) = self.symbols.payload(array)? else {
            return Err(RuntimeError::type_error("array", self.symbols.class_of(array).name()));
        };
        match &value.elements {
            Elements::Numeric(buffer) => {
                let ty = buffer.element_type();
                let picked: Vec<Number> = indices
                    .iter()
                    .map(|&i| buffer.get(i).unwrap_or(Number::zero(ty)))
                    .collect();
                if single {
                    self.symbols.new_scalar(picked[0])
                } else {
                    self.symbols.new_array_from(ArrayValue {
                        dims: vec![picked.len()],
                        elements: Elements::Numeric(Buffer::from_numbers(ty, &picked)),
                    })
                }
            }
            Elements::Text(items) => {
                let picked: Vec<String> = indices.iter().map(|&i| items[i].clone()).collect();
                if single {
                    self.symbols.new_string(picked[0].clone())
                } else {
                    self.symbols.new_text_array(vec![picked.len()], picked)
                }
            }
        }
    }

    fn element(&mut self, array: Handle, index: usize) -> InterpResult<Handle> {
        let len = match self.symbols.payload(array)? {
            Payload::Array(a) | Payload::ComplexArray(a) => a.len(),
            other => return Err(RuntimeError::type_error("array", other.class().name())),
        };
        let index = checked_index(index as i64, len)?;
        self.gather(array, &[index], true)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    pub fn call(&mut self, callee: Callee, args: &[Handle]) -> InterpResult<Handle> {
        match callee {
            Callee::Builtin(index) => {
                let mut values = Vec::with_capacity(args.len());
                for &arg in args {
                    values.push(self.argument(arg)?);
                }
                builtins::call(self, index, &values)
            }
            Callee::User(routine) => self.call_user(routine, args),
        }
    }

    /// Built-in argument: named variables are passed as themselves so a
    /// built-in can inspect or delete them, anything else is evaluated
    fn argument(&mut self, arg: Handle) -> InterpResult<Handle> {
        if self.symbols.range_of(arg) == Some(RangeKind::NamedVariable) {
            return self.resolve_target(arg);
        }
        self.evaluate(arg)
    }

    /// Calls a user routine. Arguments naming variables bind by reference,
    /// other arguments by value. The routine's parameter and local slots are
    /// saved around the call so recursive activations do not clobber them.
    pub fn call_user(&mut self, routine: Handle, args: &[Handle]) -> InterpResult<Handle> {
        let Routine { kind, name, params, locals, body } = self.symbols.routine(routine)?.clone();
        let Some(body) = body else {
            return Err(RuntimeError::undefined_function(&name));
        };

        let positional = args
            .iter()
            .filter(|&&a| self.symbols.class_of(a) != Class::Keyword)
            .count();
        if positional > params.len() {
            return Err(RuntimeError::arity_mismatch(&name, params.len(), positional));
        }

        let slots: Vec<Handle> = params.iter().chain(&locals).copied().collect();
        let mut bindings = Vec::with_capacity(args.len());
        let mut position = 0;
        for &arg in args {
            let (param, value) = match self.symbols.payload(arg)? {
                Payload::Keyword { name: key, value } => {
                    let (key, value) = (key.clone(), *value);
                    let param = params
                        .iter()
                        .copied()
                        .find(|&p| self.symbols.name_of(p) == Some(key.as_str()))
                        .ok_or_else(|| RuntimeError::undefined_variable(&format!("{name}:{key}")))?;
                    (param, value)
                }
                _ => {
                    position += 1;
                    (params[position - 1], arg)
                }
            };
            bindings.push((param, self.bind_argument(value, &slots)?));
        }

        log::trace!("calling {} {name} with {} arguments", kind.class(), bindings.len());
        let saved: Vec<Payload> = slots.iter().map(|&slot| self.take_payload(slot)).collect();
        let outcome = self.run_routine(&name, &body, bindings);
        for (&slot, payload) in slots.iter().zip(saved) {
            if let Err(e) = self.symbols.undefine(slot) {
                log::warn!("releasing {slot} after {name}: {e}");
            }
            self.restore_payload(slot, payload);
        }

        let returned = outcome?;
        let zero = self.symbols.constants().zero;
        match (kind, returned) {
            (RoutineKind::Function, Some(value)) => {
                self.symbols.mark(value);
                Ok(value)
            }
            (_, returned) => {
                if let Some(value) = returned {
                    self.discard(value);
                }
                Ok(zero)
            }
        }
    }

    fn bind_argument(&mut self, arg: Handle, callee_slots: &[Handle]) -> InterpResult<Handle> {
        if self.symbols.range_of(arg) == Some(RangeKind::NamedVariable) {
            let target = self.resolve_target(arg)?;
            // The callee's own slots are about to be saved away
            if !callee_slots.contains(&target) {
                return self.symbols.new_transfer(Some(target));
            }
        }
        self.evaluate_detached(arg)
    }

    fn run_routine(
        &mut self,
        name: &str,
        body: &[Handle],
        bindings: Vec<(Handle, Handle)>,
    ) -> InterpResult<Option<Handle>> {
        for (param, value) in bindings {
            self.symbols.replace(param, value)?;
        }
        for &statement in body {
            match self.execute(statement) {
                Ok(()) => {}
                Err(RuntimeError { kind: ErrorKind::Return(value), .. }) => return Ok(value),
                Err(e) if e.is_control_flow() => {
                    return Err(RuntimeError::syntax(&format!("{} in {name}", e.message)));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn take_payload(&mut self, slot: Handle) -> Payload {
        match self.symbols.get_mut(slot) {
            Some(record) => std::mem::replace(&mut record.payload, Payload::Undefined),
            None => Payload::Undefined,
        }
    }

    fn restore_payload(&mut self, slot: Handle, payload: Payload) {
        if let Some(record) = self.symbols.get_mut(slot) {
            record.payload = payload;
        }
    }
}

fn checked_index(index: i64, len: usize) -> InterpResult<usize> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(RuntimeError::index_out_of_bounds(index, len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Vec<String> {
        let mut interp = Interpreter::capturing(&Config::default());
        interp.run_source(source).unwrap();
        interp.take_output()
    }

    /// Live temporaries that nothing owns
    fn free_temps(symbols: &SymbolTable) -> usize {
        [RangeKind::TempVariable, RangeKind::TempExecutable]
            .into_iter()
            .flat_map(|range| symbols.arena().live(range).collect::<Vec<_>>())
            .filter(|&h| symbols.is_free_temp(h))
            .count()
    }

    fn run_err(source: &str) -> RuntimeError {
        let mut interp = Interpreter::capturing(&Config::default());
        match interp.run_source(source).unwrap_err() {
            CompileError::Runtime(e) => e,
            other => panic!("expected a runtime error, got {other}"),
        }
    }

    #[test]
    fn test_assignment_and_print() {
        assert_eq!(run("x = 2 + 3\nprint, x * 2"), vec!["10"]);
    }

    #[test]
    fn test_if_else() {
        let out = run("x = 5\nif x gt 3 then print, 'big' else print, 'small'");
        assert_eq!(out, vec!["big"]);
        let out = run("x = 1\nif x gt 3 then print, 'big'\nelse print, 'small'");
        assert_eq!(out, vec!["small"]);
    }

    #[test]
    fn test_for_loop_with_break() {
        let source = "for i = 1, 10 do begin\n  if i eq 4 then break\n  print, i\nend";
        assert_eq!(run(source), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_while_and_repeat() {
        let source = "n = 0\nwhile n lt 3 do n = n + 1\nprint, n\nrepeat n = n - 1 until n le 0\nprint, n";
        assert_eq!(run(source), vec!["3", "0"]);
    }

    #[test]
    fn test_function_returns_value() {
        let source = "func sq(v)\n  return, v * v\nendfunc\nprint, sq(7)";
        assert_eq!(run(source), vec!["49"]);
    }

    #[test]
    fn test_recursive_function() {
        let source = "func fact(n)\n  if n le 1 then return, 1\n  return, n * fact(n - 1)\nendfunc\nprint, fact(10)";
        assert_eq!(run(source), vec!["3628800"]);
    }

    #[test]
    fn test_subroutine_writes_through_reference() {
        let source = "subr bump, v\n  v = v + 1\nendsubr\na = 41\nbump, a\nprint, a";
        assert_eq!(run(source), vec!["42"]);
    }

    #[test]
    fn test_keyword_argument_binds_by_name() {
        let source = "func pick(a, b)\n  return, b\nendfunc\nprint, pick(1, b = 'kw')";
        assert_eq!(run(source), vec!["kw"]);
    }

    #[test]
    fn test_forward_reference_resolved_later() {
        let source = "func first(x)\n  return, second(x) + 1\nendfunc\nfunc second(x)\n  return, x * 10\nendfunc\nprint, first(2)";
        assert_eq!(run(source), vec!["21"]);
    }

    #[test]
    fn test_undefined_function_call_fails() {
        let err = run_err("y = nowhere(1)");
        assert_eq!(err.kind, ErrorKind::UndefinedFunction);
    }

    #[test]
    fn test_subscripts() {
        let source = "a = [10, 20, 30, 40]\nprint, a(2)\nprint, a(1:2)\nl = {x: 'p', 'q'}\nprint, l(1)";
        assert_eq!(run(source), vec!["30", "[20, 30]", "q"]);
    }

    #[test]
    fn test_subscript_out_of_range() {
        let err = run_err("a = [1, 2]\nb = a(5)");
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_list_children_are_evaluated_and_copied() {
        let source = "x = 1\nl = {v: x + 1, w: x}\nx = 5\nprint, l";
        assert_eq!(run(source), vec!["{V: 2, W: 1}"]);
    }

    #[test]
    fn test_run_block() {
        let source = "block greet\n  print, 'hi'\nendblock\nrun, greet\nrun greet";
        assert_eq!(run(source), vec!["hi", "hi"]);
    }

    #[test]
    fn test_statement_temporaries_are_rolled_back() {
        let mut interp = Interpreter::capturing(&Config::default());
        interp.run_source("x = (1 + 2) * [3, 4]\ny = {a: x, b: 'z'}").unwrap();
        let symbols = interp.symbols();
        assert_eq!(free_temps(symbols), 0);
        assert_eq!(symbols.marks().len(), 0);
    }

    #[test]
    fn test_embedded_temporaries_survive_rollback() {
        let mut interp = Interpreter::capturing(&Config::default());
        interp.run_source("y = {a: 1, b: 'z'}").unwrap();
        let symbols = interp.symbols();
        let y = symbols.find_variable("Y").unwrap();
        let Payload::List(entries) = symbols.payload(y).unwrap() else {
            panic!("expected a list");
        };
        for entry in entries {
            assert_eq!(symbols.context_of(entry.value), Some(Context::Owner(y)));
            assert_ne!(symbols.class_of(entry.value), Class::Unused);
        }
        let owned = symbols.arena().live(RangeKind::TempVariable).count();
        assert_eq!(owned, entries.len());
        assert_eq!(symbols.display(y), "{A: 1, B: z}");
    }

    #[test]
    fn test_failed_statement_leaves_no_temporaries() {
        let mut interp = Interpreter::capturing(&Config::default());
        assert!(interp.run_source("x = [1, 2] + 'a' * 3").is_err());
        let symbols = interp.symbols();
        assert_eq!(symbols.arena().live(RangeKind::TempVariable).count(), 0);
        assert_eq!(symbols.arena().live(RangeKind::TempExecutable).count(), 0);
    }

    #[test]
    fn test_top_level_return_is_ignored() {
        assert_eq!(run("return, 3\nprint, 'after'"), vec!["after"]);
    }
}
