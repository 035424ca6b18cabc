//! Symbol records and their class-specific payloads.
//!
//! The payload is a closed sum type: the variant *is* the class, so there is
//! no way to read a member that does not belong to the record's class.
//! Handles stored in a payload come in two flavours: children (candidates for
//! ownership, embedded on construction and swept on deletion) and plain
//! references (pointers that never own their target).

use super::buffer::Buffer;
use super::class::{Class, ElementType};
use super::handle::{Context, Handle};
use super::value::Number;

/// One arena slot
#[derive(Debug, Clone)]
pub struct Record {
    pub payload: Payload,
    pub context: Context,
    /// Source line current when the record was allocated
    pub line: u32,
    /// Execution counter current when the record was allocated
    pub exec: u32,
}

impl Record {
    pub(crate) fn unused() -> Self {
        Record {
            payload: Payload::Unused,
            context: Context::TopLevel,
            line: 0,
            exec: 0,
        }
    }

    pub fn class(&self) -> Class {
        self.payload.class()
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.payload.element_type()
    }
}

/// Elements of an array payload
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    Numeric(Buffer),
    Text(Vec<String>),
}

impl Elements {
    pub fn len(&self) -> usize {
        match self {
            Elements::Numeric(b) => b.len(),
            Elements::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Elements::Numeric(b) => b.element_type(),
            Elements::Text(_) => ElementType::String,
        }
    }
}

/// Array payload: dimension list plus elements
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub dims: Vec<usize>,
    pub elements: Elements,
}

impl ArrayValue {
    pub fn element_type(&self) -> ElementType {
        self.elements.element_type()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Member of a keyed list
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: Option<String>,
    pub value: Handle,
}

/// Named structure field
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub value: Handle,
}

/// Selector for a list pointer
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Key(String),
    Index(usize),
}

/// Target of a call: a user routine handle or a built-in index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    User(Handle),
    Builtin(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Subroutine,
    Function,
    Block,
}

impl RoutineKind {
    pub fn class(self) -> Class {
        match self {
            RoutineKind::Subroutine => Class::Subroutine,
            RoutineKind::Function => Class::Function,
            RoutineKind::Block => Class::BlockRoutine,
        }
    }
}

/// User-defined routine. A body of `None` marks a declaration whose
/// definition has not been compiled yet (forward reference).
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub kind: RoutineKind,
    pub name: String,
    pub params: Vec<Handle>,
    pub locals: Vec<Handle>,
    pub body: Option<Vec<Handle>>,
}

/// Binary operators of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::Lt => "lt",
            BinOp::Le => "le",
            BinOp::Gt => "gt",
            BinOp::Ge => "ge",
        }
    }

    pub fn is_comparison(self) -> bool {
        !matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }
}

/// Executable statement node
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Replace { target: Handle, value: Handle },
    Call { callee: Callee, args: Vec<Handle> },
    Block(Vec<Handle>),
    If { cond: Handle, then: Handle, otherwise: Option<Handle> },
    For { var: Handle, start: Handle, end: Handle, body: Handle },
    While { cond: Handle, body: Handle },
    Repeat { body: Handle, cond: Handle },
    Return(Option<Handle>),
    Break,
    Continue,
    /// Execute a block routine
    Run(Handle),
    /// Compile and execute another source file
    Include(String),
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Replace { .. } => "replace",
            Statement::Call { .. } => "call",
            Statement::Block(_) => "block",
            Statement::If { .. } => "if",
            Statement::For { .. } => "for",
            Statement::While { .. } => "while",
            Statement::Repeat { .. } => "repeat",
            Statement::Return(_) => "return",
            Statement::Break => "break",
            Statement::Continue => "continue",
            Statement::Run(_) => "run",
            Statement::Include(_) => "include",
        }
    }
}

/// Associated-file (memory-mapped array) descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct AssocFile {
    pub lun: u32,
    pub element_type: ElementType,
    pub dims: Vec<usize>,
    pub offset: u64,
}

/// Class-specific payload of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Unused,
    Undefined,
    Scalar(Number),
    ComplexScalar(Number),
    String(String),
    Array(ArrayValue),
    ComplexArray(ArrayValue),
    Range { start: Handle, end: Handle },
    List(Vec<ListEntry>),
    CompactList(Vec<Handle>),
    Struct(Vec<StructField>),
    ListPointer { list: Handle, member: Member },
    Keyword { name: String, value: Handle },
    Transfer(Option<Handle>),
    FunctionPointer(Callee),
    ScalarPointer { array: Handle, index: usize },
    SubscriptPointer(Vec<Handle>),
    AssociatedFile(AssocFile),
    Routine(Routine),
    Executable(Statement),
    BinaryOp { op: BinOp, lhs: Handle, rhs: Handle },
    FunctionCall { callee: Callee, args: Vec<Handle> },
    Extract { source: Handle, subscripts: Vec<Handle> },
}

impl Payload {
    /// Scalar payload of the right class for `value`
    pub fn scalar(value: Number) -> Payload {
        if value.is_complex() {
            Payload::ComplexScalar(value)
        } else {
            Payload::Scalar(value)
        }
    }

    /// Array payload of the right class for `value`
    pub fn array(value: ArrayValue) -> Payload {
        if value.element_type().is_complex() {
            Payload::ComplexArray(value)
        } else {
            Payload::Array(value)
        }
    }

    pub fn class(&self) -> Class {
        match self {
            Payload::Unused => Class::Unused,
            Payload::Undefined => Class::Undefined,
            Payload::Scalar(_) => Class::Scalar,
            Payload::ComplexScalar(_) => Class::ComplexScalar,
            Payload::String(_) => Class::String,
            Payload::Array(_) => Class::Array,
            Payload::ComplexArray(_) => Class::ComplexArray,
            Payload::Range { .. } => Class::Range,
            Payload::List(_) => Class::List,
            Payload::CompactList(_) => Class::CompactList,
            Payload::Struct(_) => Class::Struct,
            Payload::ListPointer { .. } => Class::ListPointer,
            Payload::Keyword { .. } => Class::Keyword,
            Payload::Transfer(_) => Class::Transfer,
            Payload::FunctionPointer(_) => Class::FunctionPointer,
            Payload::ScalarPointer { .. } => Class::ScalarPointer,
            Payload::SubscriptPointer(_) => Class::SubscriptPointer,
            Payload::AssociatedFile(_) => Class::AssociatedFile,
            Payload::Routine(r) => r.kind.class(),
            Payload::Executable(_) => Class::ExecutableNode,
            Payload::BinaryOp { .. } => Class::BinaryOp,
            Payload::FunctionCall { .. } => Class::FunctionCall,
            Payload::Extract { .. } => Class::Extract,
        }
    }

    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Payload::Scalar(n) | Payload::ComplexScalar(n) => Some(n.element_type()),
            Payload::String(_) => Some(ElementType::String),
            Payload::Array(a) | Payload::ComplexArray(a) => Some(a.element_type()),
            Payload::AssociatedFile(f) => Some(f.element_type),
            _ => None,
        }
    }

    /// Handles this payload may own, in storage order
    pub fn children(&self) -> Vec<Handle> {
        match self {
            Payload::Range { start, end } => vec![*start, *end],
            Payload::List(entries) => entries.iter().map(|e| e.value).collect(),
            Payload::CompactList(items) | Payload::SubscriptPointer(items) => items.clone(),
            Payload::Struct(fields) => fields.iter().map(|f| f.value).collect(),
            Payload::Keyword { value, .. } => vec![*value],
            Payload::Routine(r) => {
                let mut out = r.params.clone();
                out.extend_from_slice(&r.locals);
                if let Some(body) = &r.body {
                    out.extend_from_slice(body);
                }
                out
            }
            Payload::Executable(stmt) => statement_children(stmt),
            Payload::BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Payload::FunctionCall { args, .. } => args.clone(),
            Payload::Extract { source, subscripts } => {
                let mut out = vec![*source];
                out.extend_from_slice(subscripts);
                out
            }
            _ => Vec::new(),
        }
    }

    /// Mutable access to the same slots [`Payload::children`] reports
    pub fn children_mut(&mut self) -> Vec<&mut Handle> {
        match self {
            Payload::Range { start, end } => vec![start, end],
            Payload::List(entries) => entries.iter_mut().map(|e| &mut e.value).collect(),
            Payload::CompactList(items) | Payload::SubscriptPointer(items) => {
                items.iter_mut().collect()
            }
            Payload::Struct(fields) => fields.iter_mut().map(|f| &mut f.value).collect(),
            Payload::Keyword { value, .. } => vec![value],
            Payload::Routine(r) => {
                let mut out: Vec<&mut Handle> = r.params.iter_mut().collect();
                out.extend(r.locals.iter_mut());
                if let Some(body) = &mut r.body {
                    out.extend(body.iter_mut());
                }
                out
            }
            Payload::Executable(stmt) => statement_children_mut(stmt),
            Payload::BinaryOp { lhs, rhs, .. } => vec![lhs, rhs],
            Payload::FunctionCall { args, .. } => args.iter_mut().collect(),
            Payload::Extract { source, subscripts } => {
                let mut out = vec![source];
                out.extend(subscripts.iter_mut());
                out
            }
            _ => Vec::new(),
        }
    }

    /// Non-owning pointers held by this payload
    pub fn references(&self) -> Vec<Handle> {
        match self {
            Payload::ListPointer { list, .. } => vec![*list],
            Payload::Transfer(Some(target)) => vec![*target],
            Payload::FunctionPointer(Callee::User(h)) => vec![*h],
            Payload::ScalarPointer { array, .. } => vec![*array],
            Payload::FunctionCall { callee: Callee::User(h), .. } => vec![*h],
            Payload::Executable(Statement::Call { callee: Callee::User(h), .. }) => vec![*h],
            Payload::Executable(Statement::Run(h)) => vec![*h],
            _ => Vec::new(),
        }
    }
}

fn statement_children(stmt: &Statement) -> Vec<Handle> {
    match stmt {
        Statement::Replace { target, value } => vec![*target, *value],
        Statement::Call { args, .. } => args.clone(),
        Statement::Block(items) => items.clone(),
        Statement::If { cond, then, otherwise } => {
            let mut out = vec![*cond, *then];
            out.extend(otherwise.iter().copied());
            out
        }
        Statement::For { var, start, end, body } => vec![*var, *start, *end, *body],
        Statement::While { cond, body } => vec![*cond, *body],
        Statement::Repeat { body, cond } => vec![*body, *cond],
        Statement::Return(value) => value.iter().copied().collect(),
        Statement::Break
        | Statement::Continue
        | Statement::Run(_)
        | Statement::Include(_) => Vec::new(),
    }
}

fn statement_children_mut(stmt: &mut Statement) -> Vec<&mut Handle> {
    match stmt {
        Statement::Replace { target, value } => vec![target, value],
        Statement::Call { args, .. } => args.iter_mut().collect(),
        Statement::Block(items) => items.iter_mut().collect(),
        Statement::If { cond, then, otherwise } => {
            let mut out = vec![cond, then];
            out.extend(otherwise.iter_mut());
            out
        }
        Statement::For { var, start, end, body } => vec![var, start, end, body],
        Statement::While { cond, body } => vec![cond, body],
        Statement::Repeat { body, cond } => vec![body, cond],
        Statement::Return(value) => value.iter_mut().collect(),
        Statement::Break
        | Statement::Continue
        | Statement::Run(_)
        | Statement::Include(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(i: u32) -> Handle {
        Handle::new(i)
    }

    #[test]
    fn test_class_follows_variant() {
        assert_eq!(Payload::scalar(Number::Int32(1)).class(), Class::Scalar);
        assert_eq!(
            Payload::scalar(Number::CFloat(crate::symbol::value::Complex::new(0.0, 1.0))).class(),
            Class::ComplexScalar
        );
        let routine = Routine {
            kind: RoutineKind::Block,
            name: "B".into(),
            params: vec![],
            locals: vec![],
            body: None,
        };
        assert_eq!(Payload::Routine(routine).class(), Class::BlockRoutine);
    }

    #[test]
    fn test_children_of_containers() {
        let list = Payload::List(vec![
            ListEntry { key: Some("A".into()), value: h(10) },
            ListEntry { key: None, value: h(11) },
        ]);
        assert_eq!(list.children(), vec![h(10), h(11)]);

        let stmt = Payload::Executable(Statement::If { cond: h(1), then: h(2), otherwise: None });
        assert_eq!(stmt.children(), vec![h(1), h(2)]);
    }

    #[test]
    fn test_pointers_are_references_not_children() {
        let t = Payload::Transfer(Some(h(5)));
        assert!(t.children().is_empty());
        assert_eq!(t.references(), vec![h(5)]);

        let call = Payload::FunctionCall { callee: Callee::User(h(3)), args: vec![h(4)] };
        assert_eq!(call.children(), vec![h(4)]);
        assert_eq!(call.references(), vec![h(3)]);
    }

    #[test]
    fn test_children_mut_rewrites_slots() {
        let mut p = Payload::BinaryOp { op: BinOp::Add, lhs: h(1), rhs: h(2) };
        for slot in p.children_mut() {
            *slot = Handle::new(slot.index() + 100);
        }
        assert_eq!(p.children(), vec![h(101), h(102)]);
    }
}
