//! Printable descriptions and statistics

use super::class::Class;
use super::handle::{Context, Handle, RangeKind};
use super::record::{Callee, Elements, Member, Payload, Statement};
use super::{STACK_GROW_SIZE, STACK_RED_ZONE, SymbolTable};
use crate::convert::format_number;
use serde::Serialize;
use std::collections::BTreeMap;

/// Longest array rendered element by element
const MAX_SHOWN: usize = 16;

#[derive(Debug, Clone, Serialize)]
pub struct RangeStats {
    pub range: RangeKind,
    pub capacity: usize,
    pub live: usize,
    pub cursor: Handle,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolStats {
    pub ranges: Vec<RangeStats>,
    pub classes: BTreeMap<Class, usize>,
    pub marks: usize,
    pub marks_dropped: usize,
    pub pending: usize,
}

/// One live record, flattened for dumps
#[derive(Debug, Clone, Serialize)]
pub struct SymbolInfo {
    pub handle: Handle,
    pub name: Option<String>,
    pub class: Class,
    pub element_type: Option<super::class::ElementType>,
    pub context: Context,
    pub range: Option<RangeKind>,
    pub line: u32,
    pub exec: u32,
    pub value: String,
}

impl SymbolTable {
    /// Value text as `print` shows it
    pub fn display(&self, handle: Handle) -> String {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.display_inner(handle))
    }

    fn display_inner(&self, handle: Handle) -> String {
        let Some(record) = self.get(handle) else {
            return format!("<unused {handle}>");
        };
        let formats = self.formats();
        match &record.payload {
            Payload::Unused => String::new(),
            Payload::Undefined => "<undefined>".to_string(),
            Payload::Scalar(n) | Payload::ComplexScalar(n) => format_number(*n, formats),
            Payload::String(s) => s.clone(),
            Payload::Array(a) | Payload::ComplexArray(a) => {
                let items: Vec<String> = match &a.elements {
                    Elements::Numeric(b) => b.iter().take(MAX_SHOWN).map(|n| format_number(n, formats)).collect(),
                    Elements::Text(t) => t.iter().take(MAX_SHOWN).cloned().collect(),
                };
                let more = if a.len() > MAX_SHOWN { " ..." } else { "" };
                format!("[{}{more}]", items.join(", "))
            }
            Payload::Range { start, end } => {
                format!("({}:{})", self.display_inner(*start), self.display_inner(*end))
            }
            Payload::List(entries) => {
                let items: Vec<String> = entries
                    .iter()
                    .map(|e| match &e.key {
                        Some(k) => format!("{k}: {}", self.display_inner(e.value)),
                        None => self.display_inner(e.value),
                    })
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Payload::CompactList(items) => {
                let items: Vec<String> = items.iter().map(|h| self.display_inner(*h)).collect();
                format!("{{{}}}", items.join(", "))
            }
            Payload::Struct(fields) => {
                let items: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, self.display_inner(f.value)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Payload::ListPointer { list, member } => match member {
                Member::Key(k) => format!("{list}.{k}"),
                Member::Index(i) => format!("{list}.({i})"),
            },
            Payload::Keyword { name, value } => format!("/{name}={}", self.display_inner(*value)),
            Payload::Transfer(Some(target)) => self.display_inner(*target),
            Payload::Transfer(None) => "<undefined>".to_string(),
            Payload::FunctionPointer(callee) => format!("&{}", self.callee_name(*callee)),
            Payload::ScalarPointer { array, index } => format!("{array}({index})"),
            Payload::SubscriptPointer(items) => format!("<{} subscripts>", items.len()),
            Payload::AssociatedFile(file) => {
                format!("<{} file {} {:?} at {}>", file.element_type, file.lun, file.dims, file.offset)
            }
            Payload::Routine(r) => {
                let state = if r.body.is_some() { "" } else { " (declared)" };
                format!("{} {}/{}{state}", r.kind.class(), r.name, r.params.len())
            }
            Payload::Executable(stmt) => match stmt {
                Statement::Call { callee, args } => {
                    format!("call {}/{}", self.callee_name(*callee), args.len())
                }
                Statement::Include(path) => format!("@{path}"),
                other => other.kind_name().to_string(),
            },
            Payload::BinaryOp { op, lhs, rhs } => {
                format!("({} {} {})", self.display_inner(*lhs), op.symbol(), self.display_inner(*rhs))
            }
            Payload::FunctionCall { callee, args } => {
                let args: Vec<String> = args.iter().map(|h| self.display_inner(*h)).collect();
                format!("{}({})", self.callee_name(*callee), args.join(", "))
            }
            Payload::Extract { source, subscripts } => {
                let subs: Vec<String> = subscripts.iter().map(|h| self.display_inner(*h)).collect();
                let name = self.name_of(*source).map_or_else(|| source.to_string(), str::to_string);
                format!("{name}({})", subs.join(", "))
            }
        }
    }

    fn callee_name(&self, callee: Callee) -> String {
        match callee {
            Callee::User(h) => self.name_of(h).map_or_else(|| h.to_string(), str::to_string),
            Callee::Builtin(i) => crate::interp::builtins::name(i).to_string(),
        }
    }

    /// One-line description: handle, name, class, type, context and value
    pub fn describe(&self, handle: Handle) -> String {
        let Some(record) = self.get(handle) else {
            return format!("{handle} UNUSED");
        };
        let name = self.name_of(handle).unwrap_or("-");
        let ty = record.element_type().map_or("-", |t| t.name());
        format!(
            "{handle} {name} {} {ty} ctx={} {}",
            record.class(),
            record.context,
            self.display(handle)
        )
    }

    pub fn info(&self, handle: Handle) -> Option<SymbolInfo> {
        let record = self.get(handle)?;
        Some(SymbolInfo {
            handle,
            name: self.name_of(handle).map(str::to_string),
            class: record.class(),
            element_type: record.element_type(),
            context: record.context,
            range: self.range_of(handle),
            line: record.line,
            exec: record.exec,
            value: self.display(handle),
        })
    }

    /// Every live symbol outside the constant range
    pub fn dump(&self) -> Vec<SymbolInfo> {
        self.arena
            .iter_live()
            .filter(|(h, _)| !self.is_constant(*h))
            .filter_map(|(h, _)| self.info(h))
            .collect()
    }

    pub fn stats(&self) -> SymbolStats {
        let ranges = RangeKind::ALL
            .into_iter()
            .map(|range| {
                let bounds = self.arena.bounds(range);
                RangeStats {
                    range,
                    capacity: bounds.len(),
                    live: self.arena.live(range).count(),
                    cursor: self.arena.cursor(range),
                }
            })
            .collect();
        let mut classes = BTreeMap::new();
        for (_, record) in self.arena.iter_live() {
            *classes.entry(record.class()).or_insert(0) += 1;
        }
        SymbolStats {
            ranges,
            classes,
            marks: self.marks.len(),
            marks_dropped: self.marks.dropped(),
            pending: self.pending.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::symbol::{Number, Pending};

    #[test]
    fn test_display_nested_list() {
        let mut st = SymbolTable::new(&Config::default());
        let a = st.new_scalar(Number::Int32(1)).unwrap();
        let b = st.new_string("two".into()).unwrap();
        st.push_pending(Pending { key: Some("A".into()), value: a });
        st.push_pending(Pending { key: None, value: b });
        let list = st.new_list(2).unwrap();
        insta::assert_snapshot!(st.display(list), @"{A: 1, two}");
    }

    #[test]
    fn test_describe_named_scalar() {
        let mut st = SymbolTable::new(&Config::default());
        let x = st.install_variable("X").unwrap();
        let v = st.new_scalar(Number::Double(2.5)).unwrap();
        st.replace(x, v).unwrap();
        let text = st.describe(x);
        assert!(text.ends_with("X SCALAR double ctx=0 2.5"), "{text}");
    }

    #[test]
    fn test_stats_count_live_symbols() {
        let mut st = SymbolTable::new(&Config::default());
        st.new_scalar(Number::Int32(1)).unwrap();
        let stats = st.stats();
        let temps = stats
            .ranges
            .iter()
            .find(|r| r.range == RangeKind::TempVariable)
            .unwrap();
        assert_eq!(temps.live, 1);
        // six constants plus the temporary
        assert_eq!(stats.classes.get(&Class::Scalar), Some(&6));
        assert_eq!(stats.classes.get(&Class::ComplexScalar), Some(&1));
    }

    #[test]
    fn test_dump_skips_constants_and_serializes() {
        let mut st = SymbolTable::new(&Config::default());
        st.install_variable("Y").unwrap();
        let dump = st.dump();
        assert_eq!(dump.len(), 1);
        let json = serde_json::to_string(&dump[0]).unwrap();
        assert!(json.contains("\"name\":\"Y\""), "{json}");
        assert!(json.contains("\"context\":\"0\""), "{json}");
    }
}
