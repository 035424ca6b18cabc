//! Fixed-capacity handle arena and its sub-range allocators

use super::class::Class;
use super::handle::{Handle, RangeKind};
use super::record::Record;
use crate::config::ArenaConfig;
use crate::interp::error::{InterpResult, RuntimeError};
use std::ops::Range;

/// One contiguous sub-range with its search cursor
#[derive(Debug, Clone)]
struct SubArena {
    start: u32,
    end: u32,
    cursor: u32,
}

impl SubArena {
    fn contains(&self, index: u32) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Uniform records indexed by handle, partitioned into [`RangeKind`]s
#[derive(Debug, Clone)]
pub struct Arena {
    records: Vec<Record>,
    ranges: [SubArena; 5],
}

impl Arena {
    pub fn new(config: &ArenaConfig) -> Self {
        let sizes = [
            config.constants,
            config.named_variables,
            config.named_executables,
            config.temp_variables,
            config.temp_executables,
        ];
        let mut start = 0u32;
        let ranges = sizes.map(|size| {
            let size = u32::try_from(size).unwrap_or(u32::MAX / 8);
            let sub = SubArena {
                start,
                end: start + size,
                cursor: start,
            };
            start += size;
            sub
        });
        Arena {
            records: vec![Record::unused(); start as usize],
            ranges,
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        handle.slot() < self.records.len()
    }

    pub fn range_of(&self, handle: Handle) -> Option<RangeKind> {
        RangeKind::ALL
            .into_iter()
            .find(|kind| self.ranges[kind.position()].contains(handle.index()))
    }

    pub fn bounds(&self, kind: RangeKind) -> Range<u32> {
        let sub = &self.ranges[kind.position()];
        sub.start..sub.end
    }

    pub fn cursor(&self, kind: RangeKind) -> Handle {
        Handle::new(self.ranges[kind.position()].cursor)
    }

    pub fn get(&self, handle: Handle) -> Option<&Record> {
        self.records.get(handle.slot())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Record> {
        self.records.get_mut(handle.slot())
    }

    /// Claims an Unused slot in `kind`, scanning from the cursor and wrapping
    /// once. The slot comes back Undefined; the caller stamps it.
    pub fn allocate(&mut self, kind: RangeKind) -> InterpResult<Handle> {
        let sub = &self.ranges[kind.position()];
        let found = (sub.cursor..sub.end)
            .chain(sub.start..sub.cursor)
            .find(|&i| self.records[i as usize].class() == Class::Unused);

        let Some(index) = found else {
            log::error!("symbol arena: {kind} range exhausted");
            return Err(RuntimeError::allocation_exhausted(kind));
        };

        self.ranges[kind.position()].cursor = index + 1;
        self.records[index as usize].payload = super::record::Payload::Undefined;
        Ok(Handle::new(index))
    }

    /// Returns a slot to Unused and pulls the cursor back when the slot sat
    /// directly beneath it
    pub fn release(&mut self, handle: Handle) {
        let Some(kind) = self.range_of(handle) else {
            return;
        };
        self.records[handle.slot()] = Record::unused();

        let records = &self.records;
        let sub = &mut self.ranges[kind.position()];
        if handle.index() + 1 == sub.cursor {
            while sub.cursor > sub.start
                && records[(sub.cursor - 1) as usize].class() == Class::Unused
            {
                sub.cursor -= 1;
            }
        }
    }

    /// Handles in `kind` that are not Unused
    pub fn live(&self, kind: RangeKind) -> impl Iterator<Item = Handle> + '_ {
        self.bounds(kind)
            .filter(|&i| self.records[i as usize].class() != Class::Unused)
            .map(Handle::new)
    }

    /// Every record that is not Unused, with its handle
    pub fn iter_live(&self) -> impl Iterator<Item = (Handle, &Record)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.class() != Class::Unused)
            .map(|(i, r)| (Handle::new(i as u32), r))
    }
}
