//! Symbol handles, owner contexts and arena sub-ranges.
//!
//! Handles are 32-bit indices into the symbol arena. Every record carries a
//! [`Context`] naming its owner, and every handle falls inside exactly one
//! [`RangeKind`], which fixes its lifetime policy.

use serde::Serialize;
use std::fmt;

/// A handle ("symbol number") identifying one arena slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Creates a handle from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Top-level value: named at global scope, or a free runtime temporary
    TopLevel,
    /// Embedded in (owned by) the given container or routine
    Owner(Handle),
    /// Parse-scoped temporary, bounded by the given compile depth
    Compile(u32),
}

impl Context {
    /// The owning container, if any
    pub fn owner(self) -> Option<Handle> {
        match self {
            Context::Owner(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_owned(self) -> bool {
        matches!(self, Context::Owner(_))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::TopLevel => write!(f, "0"),
            Context::Owner(h) => write!(f, "{}", h.index()),
            Context::Compile(depth) => write!(f, "-{depth}"),
        }
    }
}

impl Serialize for Context {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Disjoint sub-ranges of the handle space, in arena order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RangeKind {
    /// Built-in constants; never reused, never freed
    Constant,
    /// Named persistent variables
    NamedVariable,
    /// Named persistent executables (routines)
    NamedExecutable,
    /// Anonymous short-lived values
    TempVariable,
    /// Anonymous short-lived syntax nodes
    TempExecutable,
}

impl RangeKind {
    /// All ranges, in the order they are laid out in the arena
    pub const ALL: [RangeKind; 5] = [
        RangeKind::Constant,
        RangeKind::NamedVariable,
        RangeKind::NamedExecutable,
        RangeKind::TempVariable,
        RangeKind::TempExecutable,
    ];

    pub fn is_temporary(self) -> bool {
        matches!(self, RangeKind::TempVariable | RangeKind::TempExecutable)
    }

    pub fn is_named(self) -> bool {
        matches!(self, RangeKind::NamedVariable | RangeKind::NamedExecutable)
    }

    /// Position of this range in [`RangeKind::ALL`]
    pub(crate) fn position(self) -> usize {
        match self {
            RangeKind::Constant => 0,
            RangeKind::NamedVariable => 1,
            RangeKind::NamedExecutable => 2,
            RangeKind::TempVariable => 3,
            RangeKind::TempExecutable => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RangeKind::Constant => "constant",
            RangeKind::NamedVariable => "named variable",
            RangeKind::NamedExecutable => "named executable",
            RangeKind::TempVariable => "temporary variable",
            RangeKind::TempExecutable => "temporary executable",
        }
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle::new(42).to_string(), "#42");
        assert_eq!(format!("{:?}", Handle::new(7)), "Handle(7)");
    }

    #[test]
    fn test_handle_size() {
        assert_eq!(std::mem::size_of::<Handle>(), 4);
    }

    #[test]
    fn test_context_display_matches_numeric_convention() {
        assert_eq!(Context::TopLevel.to_string(), "0");
        assert_eq!(Context::Owner(Handle::new(12)).to_string(), "12");
        assert_eq!(Context::Compile(2).to_string(), "-2");
    }

    #[test]
    fn test_context_owner() {
        assert_eq!(Context::Owner(Handle::new(3)).owner(), Some(Handle::new(3)));
        assert_eq!(Context::TopLevel.owner(), None);
        assert!(!Context::Compile(1).is_owned());
    }

    #[test]
    fn test_range_positions_follow_layout_order() {
        for (i, kind) in RangeKind::ALL.iter().enumerate() {
            assert_eq!(kind.position(), i);
        }
        assert!(RangeKind::TempExecutable.is_temporary());
        assert!(RangeKind::NamedVariable.is_named());
        assert!(!RangeKind::Constant.is_named());
    }
}
