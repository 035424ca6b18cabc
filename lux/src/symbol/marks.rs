//! Checkpoint/rollback mark stack.
//!
//! Temporaries are marked as they are allocated. A checkpoint pushes a
//! sentinel; rolling back pops every mark above the newest sentinel and zaps
//! the handles that are still free temporaries. Compile sentinels bracket a
//! nested compile so statement rollbacks inside it stay inside it.

use super::SymbolTable;
use super::handle::{Context, Handle};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkKind {
    Statement,
    Compile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Sentinel(MarkKind),
    Temp(Handle),
}

#[derive(Debug, Clone)]
pub struct MarkStack {
    entries: Vec<Mark>,
    capacity: usize,
    dropped: usize,
}

impl MarkStack {
    pub fn new(capacity: usize) -> Self {
        MarkStack {
            entries: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Sentinels are always pushed, even past capacity
    pub fn push_sentinel(&mut self, kind: MarkKind) {
        self.entries.push(Mark::Sentinel(kind));
    }

    /// Records a temporary. Returns false when the stack is full and the mark
    /// was dropped.
    pub fn mark(&mut self, handle: Handle) -> bool {
        if self.entries.len() >= self.capacity {
            self.dropped += 1;
            log::warn!("mark stack full ({} entries); {handle} will not be reclaimed", self.capacity);
            return false;
        }
        self.entries.push(Mark::Temp(handle));
        true
    }

    /// Removes `handle` from the current window. Returns whether it was there.
    pub fn unmark(&mut self, handle: Handle) -> bool {
        let floor = self.window_floor();
        let before = self.entries.len();
        let mut i = floor;
        while i < self.entries.len() {
            if self.entries[i] == Mark::Temp(handle) {
                self.entries.remove(i);
            } else {
                i += 1;
            }
        }
        self.entries.len() != before
    }

    /// Pops the newest window, sentinel included. Handles come back newest
    /// first.
    pub fn pop_window(&mut self) -> Option<(MarkKind, Vec<Handle>)> {
        let mut handles = Vec::new();
        while let Some(entry) = self.entries.pop() {
            match entry {
                Mark::Temp(h) => handles.push(h),
                Mark::Sentinel(kind) => return Some((kind, handles)),
            }
        }
        if handles.is_empty() { None } else { Some((MarkKind::Statement, handles)) }
    }

    /// Kind of the newest sentinel
    pub fn top_sentinel(&self) -> Option<MarkKind> {
        self.entries.iter().rev().find_map(|m| match m {
            Mark::Sentinel(kind) => Some(*kind),
            Mark::Temp(_) => None,
        })
    }

    /// Temporaries in the current window, oldest first
    pub fn window(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries[self.window_floor()..].iter().filter_map(|m| match m {
            Mark::Temp(h) => Some(*h),
            Mark::Sentinel(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Marks refused because the stack was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn window_floor(&self) -> usize {
        self.entries
            .iter()
            .rposition(|m| matches!(m, Mark::Sentinel(_)))
            .map_or(0, |i| i + 1)
    }
}

/// State saved across a nested compile
#[derive(Debug, Clone, Copy)]
pub(crate) struct CompileFrame {
    scope: Context,
    zap_guard: Option<Handle>,
    line: u32,
}

impl SymbolTable {
    pub fn checkpoint(&mut self, kind: MarkKind) {
        self.marks.push_sentinel(kind);
    }

    pub fn mark(&mut self, handle: Handle) -> bool {
        self.marks.mark(handle)
    }

    pub fn unmark(&mut self, handle: Handle) -> bool {
        self.marks.unmark(handle)
    }

    /// Zaps the free temporaries of the newest window and pops its sentinel.
    /// Returns how many handles were reclaimed.
    pub fn rollback(&mut self) -> usize {
        match self.marks.pop_window() {
            Some((_, handles)) => self.reclaim(handles),
            None => 0,
        }
    }

    /// Rolls back window by window until a sentinel of `kind` has been
    /// popped. A statement rollback never crosses a compile sentinel.
    pub fn rollback_to(&mut self, kind: MarkKind) -> usize {
        let mut reclaimed = 0;
        loop {
            let top = self.marks.top_sentinel();
            if kind == MarkKind::Statement && top == Some(MarkKind::Compile) {
                return reclaimed;
            }
            match self.marks.pop_window() {
                Some((popped, handles)) => {
                    reclaimed += self.reclaim(handles);
                    if popped == kind {
                        return reclaimed;
                    }
                }
                None => return reclaimed,
            }
        }
    }

    fn reclaim(&mut self, handles: Vec<Handle>) -> usize {
        let mut reclaimed = 0;
        for h in handles {
            if self.is_free_temp(h) {
                match self.zap(h) {
                    Ok(()) => reclaimed += 1,
                    Err(e) => log::warn!("rollback: {e}"),
                }
            }
        }
        if reclaimed > 0 {
            log::trace!("rollback reclaimed {reclaimed} temporaries");
        }
        reclaimed
    }

    /// Opens a nested compile: saves scope, zap guard and line, and pushes a
    /// compile sentinel
    pub fn enter_compile(&mut self) {
        self.frames.push(CompileFrame {
            scope: self.scope,
            zap_guard: self.zap_guard,
            line: self.line,
        });
        self.compile_depth += 1;
        self.scope = Context::TopLevel;
        self.marks.push_sentinel(MarkKind::Compile);
        log::debug!("enter compile depth {}", self.compile_depth);
    }

    /// Closes the innermost nested compile and restores the saved state
    pub fn leave_compile(&mut self) {
        self.rollback_to(MarkKind::Compile);
        if let Some(frame) = self.frames.pop() {
            self.scope = frame.scope;
            self.zap_guard = frame.zap_guard;
            self.line = frame.line;
        }
        self.compile_depth = self.compile_depth.saturating_sub(1);
        log::debug!("leave compile, depth now {}", self.compile_depth);
    }

    pub fn compile_depth(&self) -> u32 {
        self.compile_depth
    }

    pub fn marks(&self) -> &MarkStack {
        &self.marks
    }
}
