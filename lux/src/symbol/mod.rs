//! Symbol table: the handle arena, records, ownership and name resolution.
//!
//! Every value the language manipulates lives in one arena slot identified by
//! a [`Handle`]. Lifetimes follow the record's [`Context`] rather than a
//! collector: containers own embedded children, named values live until they
//! are deleted, and anonymous temporaries are reclaimed by rollback.

mod arena;
mod buffer;
mod class;
mod construct;
mod describe;
mod handle;
mod marks;
mod names;
mod ownership;
mod record;
mod routine;
mod value;

pub use arena::Arena;
pub use buffer::{Buffer, Reuse};
pub use class::{Class, ElementType};
pub use describe::{RangeStats, SymbolInfo, SymbolStats};
pub use handle::{Context, Handle, RangeKind};
pub use marks::{MarkKind, MarkStack};
pub use names::{NameTable, NameTables, Namespace, is_global_name, normalize};
pub use record::{
    ArrayValue, AssocFile, BinOp, Callee, Elements, ListEntry, Member, Payload, Record, Routine,
    RoutineKind, Statement, StructField,
};
pub use value::{Complex, Number};

use crate::config::{ArenaConfig, Config, FormatConfig};
use crate::interp::error::{InterpResult, RuntimeError};
use marks::CompileFrame;

/// Stack growth parameters for deep cascades
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Well-known handles in the constant range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constants {
    pub zero: Handle,
    pub one: Handle,
    pub minus_one: Handle,
    pub pi: Handle,
    pub e: Handle,
    /// Imaginary unit
    pub i: Handle,
}

/// Pending-build stack entry pushed by the parser
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub key: Option<String>,
    pub value: Handle,
}

/// Complete interpreter symbol state
#[derive(Debug, Clone)]
pub struct SymbolTable {
    arena: Arena,
    names: NameTables,
    marks: MarkStack,
    pending: Vec<Pending>,
    /// Extra owner swept by `undefine` during a routine teardown
    zap_guard: Option<Handle>,
    /// Context that new variables are installed in
    scope: Context,
    compile_depth: u32,
    frames: Vec<CompileFrame>,
    line: u32,
    exec: u32,
    constants: Constants,
    formats: FormatConfig,
}

impl SymbolTable {
    /// Builds the table and installs the built-in constants. A constant
    /// range smaller than [`ArenaConfig::MIN_CONSTANTS`] is widened.
    pub fn new(config: &Config) -> Self {
        let mut arena_config = config.arena.clone();
        if arena_config.constants < ArenaConfig::MIN_CONSTANTS {
            log::warn!(
                "arena.constants = {} is too small, using {}",
                arena_config.constants,
                ArenaConfig::MIN_CONSTANTS
            );
            arena_config.constants = ArenaConfig::MIN_CONSTANTS;
        }
        let mut table = SymbolTable {
            arena: Arena::new(&arena_config),
            names: NameTables::default(),
            marks: MarkStack::new(config.marks.capacity),
            pending: Vec::new(),
            zap_guard: None,
            scope: Context::TopLevel,
            compile_depth: 0,
            frames: Vec::new(),
            line: 0,
            exec: 0,
            constants: Constants {
                zero: Handle::new(0),
                one: Handle::new(0),
                minus_one: Handle::new(0),
                pi: Handle::new(0),
                e: Handle::new(0),
                i: Handle::new(0),
            },
            formats: config.format.clone(),
        };
        match table.install_constants() {
            Ok(constants) => table.constants = constants,
            Err(e) => log::error!("cannot install constants: {e}"),
        }
        table
    }

    fn install_constants(&mut self) -> InterpResult<Constants> {
        Ok(Constants {
            zero: self.install_constant(None, Number::Int32(0))?,
            one: self.install_constant(None, Number::Int32(1))?,
            minus_one: self.install_constant(None, Number::Int32(-1))?,
            pi: self.install_constant(Some("#PI"), Number::Double(std::f64::consts::PI))?,
            e: self.install_constant(Some("#E"), Number::Double(std::f64::consts::E))?,
            i: self.install_constant(Some("#I"), Number::CFloat(Complex::new(0.0, 1.0)))?,
        })
    }

    fn install_constant(&mut self, name: Option<&str>, value: Number) -> InterpResult<Handle> {
        let handle = self.arena.allocate(RangeKind::Constant)?;
        if let Some(record) = self.arena.get_mut(handle) {
            record.payload = Payload::scalar(value);
        }
        if let Some(name) = name {
            self.names.table_mut(Namespace::Variable).insert(name, handle);
        }
        Ok(handle)
    }

    pub fn constants(&self) -> Constants {
        self.constants
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn formats(&self) -> &FormatConfig {
        &self.formats
    }

    /// Replaces the numeric-to-string patterns at runtime
    pub fn set_formats(&mut self, formats: FormatConfig) {
        self.formats = formats;
    }

    pub fn get(&self, handle: Handle) -> Option<&Record> {
        self.arena.get(handle).filter(|r| r.class() != Class::Unused)
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut Record> {
        self.arena.get_mut(handle).filter(|r| r.class() != Class::Unused)
    }

    /// Live record or `InvalidHandle`
    pub fn record(&self, handle: Handle) -> InterpResult<&Record> {
        self.get(handle).ok_or_else(|| RuntimeError::invalid_handle(handle))
    }

    pub fn payload(&self, handle: Handle) -> InterpResult<&Payload> {
        self.record(handle).map(|r| &r.payload)
    }

    /// Class of `handle`; Unused for out-of-range handles
    pub fn class_of(&self, handle: Handle) -> Class {
        self.arena.get(handle).map_or(Class::Unused, Record::class)
    }

    pub fn context_of(&self, handle: Handle) -> Option<Context> {
        self.get(handle).map(|r| r.context)
    }

    pub fn range_of(&self, handle: Handle) -> Option<RangeKind> {
        self.arena.range_of(handle)
    }

    pub fn is_constant(&self, handle: Handle) -> bool {
        self.range_of(handle) == Some(RangeKind::Constant)
    }

    /// Named handles live in the named sub-ranges
    pub fn is_named(&self, handle: Handle) -> bool {
        self.range_of(handle).is_some_and(RangeKind::is_named)
    }

    /// A live temporary not embedded in any container
    pub fn is_free_temp(&self, handle: Handle) -> bool {
        self.range_of(handle).is_some_and(RangeKind::is_temporary)
            && self.get(handle).is_some_and(|r| !r.context.is_owned())
    }

    /// Context that fresh temporaries receive
    fn temp_context(&self) -> Context {
        if self.compile_depth > 0 {
            Context::Compile(self.compile_depth)
        } else {
            Context::TopLevel
        }
    }

    /// Claims a slot in `kind`, stamps it, and marks it if temporary
    pub(crate) fn allocate(&mut self, kind: RangeKind) -> InterpResult<Handle> {
        let handle = self.arena.allocate(kind)?;
        let context = if kind.is_temporary() {
            self.temp_context()
        } else {
            Context::TopLevel
        };
        let (line, exec) = (self.line, self.exec);
        if let Some(record) = self.arena.get_mut(handle) {
            record.context = context;
            record.line = line;
            record.exec = exec;
        }
        if kind.is_temporary() {
            self.marks.mark(handle);
        }
        Ok(handle)
    }

    /// Source line stamped on new records
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Advances the execution counter stamped on new records
    pub fn tick(&mut self) -> u32 {
        self.exec = self.exec.wrapping_add(1);
        self.exec
    }

    /// Scope new variables are installed in
    pub fn scope(&self) -> Context {
        self.scope
    }

    pub fn zap_guard(&self) -> Option<Handle> {
        self.zap_guard
    }
}
