use std::any::type_name;
use std::collections::TryReserveError;
use std::iter;

use crate::{Slot, Vacancy};

/// Skip value written into the interior of a fresh block. Interior values are never read, so
/// this is only a placeholder that keeps every vacant slot nonzero.
const UNTOUCHED_INTERIOR_SKIP: usize = 1;

/// A fixed-capacity array of slots, the unit of growth of a `Hive`.
///
/// Slots `[0, high_water_mark)` have been constructed into at least once and are covered by the
/// skipfield: each maximal run of vacant slots in that range stores the run length in its first
/// and last slot. Slots `[high_water_mark, capacity)` form the untouched region, which is also
/// shaped like a run (first and last slot store its length) so that it can be consumed from the
/// front with the same logic.
///
/// The slot array is allocated once and never resized or moved, which is what keeps element
/// addresses stable while the block chain around it grows.
#[derive(Debug)]
pub(crate) struct Block<T> {
    slots: Box<[Slot<T>]>,

    /// Number of slots currently holding a live value.
    active_count: usize,

    /// Number of slots that have ever held a value. Never shrinks.
    high_water_mark: usize,
}

/// How a freshly vacated slot joined the erased runs around it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Coalesce {
    /// Neither neighbour was vacant; the slot forms a run of its own.
    Isolated,

    /// The slot became the new last slot of the run on its left.
    ExtendsLeft,

    /// The slot became the new first slot of the run on its right.
    ExtendsRight,

    /// The slot joined the runs on both sides into one.
    Bridges,
}

impl<T> Block<T> {
    /// Allocates a block of `capacity` untouched slots.
    ///
    /// Allocation failure is reported to the caller instead of aborting, so that the hive can
    /// leave itself unchanged when it cannot grow.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub(crate) fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
        assert!(
            capacity > 0,
            "hive block of {} must have non-zero capacity",
            type_name::<T>()
        );

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.extend(iter::repeat_with(|| Slot::vacant(UNTOUCHED_INTERIOR_SKIP)).take(capacity));

        let mut block = Self {
            slots: slots.into_boxed_slice(),
            active_count: 0,
            high_water_mark: 0,
        };

        // The whole block starts out as a single run.
        let last = capacity
            .checked_sub(1)
            .expect("guarded by non-zero capacity assertion above");
        block.set_skip(0, capacity);
        block.set_skip(last, capacity);

        Ok(block)
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    #[cfg(test)]
    pub(crate) fn active_count(&self) -> usize {
        self.active_count
    }

    #[must_use]
    pub(crate) fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    #[must_use]
    pub(crate) fn is_full(&self) -> bool {
        self.active_count == self.capacity()
    }

    /// The slots that have ever been constructed into. Iteration never looks past these.
    #[must_use]
    pub(crate) fn touched_slots(&self) -> &[Slot<T>] {
        self.slots
            .get(..self.high_water_mark)
            .expect("high water mark never exceeds capacity")
    }

    #[must_use]
    pub(crate) fn touched_slots_mut(&mut self) -> &mut [Slot<T>] {
        self.slots
            .get_mut(..self.high_water_mark)
            .expect("high water mark never exceeds capacity")
    }

    fn slot(&self, index: usize) -> &Slot<T> {
        self.slots.get(index).unwrap_or_else(|| {
            panic!(
                "slot {index} out of bounds in hive block of {} with capacity {}",
                type_name::<T>(),
                self.capacity()
            )
        })
    }

    fn slot_mut(&mut self, index: usize) -> &mut Slot<T> {
        let capacity = self.capacity();

        self.slots.get_mut(index).unwrap_or_else(|| {
            panic!(
                "slot {index} out of bounds in hive block of {} with capacity {capacity}",
                type_name::<T>()
            )
        })
    }

    /// Skipfield value at `index`. Zero for a live slot.
    #[must_use]
    pub(crate) fn skip(&self, index: usize) -> usize {
        self.slot(index).skip()
    }

    #[must_use]
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Slot::value)
    }

    #[must_use]
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Slot::value_mut)
    }

    #[must_use]
    pub(crate) fn is_occupied(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Slot::is_occupied)
    }

    /// # Panics
    ///
    /// Panics if the slot holds a value.
    #[must_use]
    #[cfg(test)]
    pub(crate) fn vacancy(&self, index: usize) -> &Vacancy {
        self.slot(index).vacancy().unwrap_or_else(|| {
            panic!(
                "slot {index} was expected to be vacant in hive block of {}",
                type_name::<T>()
            )
        })
    }

    /// # Panics
    ///
    /// Panics if the slot holds a value.
    #[must_use]
    pub(crate) fn vacancy_mut(&mut self, index: usize) -> &mut Vacancy {
        self.slot_mut(index).vacancy_mut().unwrap_or_else(|| {
            panic!(
                "slot {index} was expected to be vacant in hive block of {}",
                type_name::<T>()
            )
        })
    }

    fn set_skip(&mut self, index: usize, skip: usize) {
        self.vacancy_mut(index).skip = skip;
    }

    /// Stores `value` in the first slot of a run (touched or untouched) and shrinks that run
    /// from the front.
    ///
    /// Only the two boundary slots of the remaining run are rewritten, regardless of its length.
    /// Free list links of the slot are discarded; the caller must have moved them elsewhere.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a value.
    pub(crate) fn occupy(&mut self, index: usize, value: T) {
        let run_length = self.slot_mut(index).fill(value).skip;

        debug_assert!(run_length > 0, "vacant slot {index} had a zero skip value");

        if run_length > 1 {
            let remaining = run_length
                .checked_sub(1)
                .expect("guarded by run length check above");
            let new_first = index
                .checked_add(1)
                .expect("a run longer than one slot continues past this index");
            let last = index
                .checked_add(remaining)
                .expect("the run ends inside the block");

            self.set_skip(new_first, remaining);
            self.set_skip(last, remaining);
        }

        self.active_count = self
            .active_count
            .checked_add(1)
            .expect("cannot have more active slots than capacity");
    }

    /// Stores `value` in the first untouched slot, extending the touched region by one.
    ///
    /// # Panics
    ///
    /// Panics if the untouched region is empty.
    pub(crate) fn occupy_untouched(&mut self, value: T) -> usize {
        let index = self.high_water_mark;

        assert!(
            index < self.capacity(),
            "no untouched slots left in hive block of {}",
            type_name::<T>()
        );

        self.occupy(index, value);

        self.high_water_mark = index
            .checked_add(1)
            .expect("guarded by capacity check above");

        index
    }

    /// Moves the value out of the slot at `index` and merges the slot into the erased runs on
    /// either side of it.
    ///
    /// The new run length is written into the new first and last slot of the merged run. The
    /// returned [`Coalesce`] tells the caller how the free list must be adjusted.
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold a value.
    pub(crate) fn vacate(&mut self, index: usize) -> (T, Coalesce) {
        assert!(
            index < self.high_water_mark && self.is_occupied(index),
            "slot {index} is not a live element in hive block of {}",
            type_name::<T>()
        );

        let left_gap = index.checked_sub(1).map_or(0, |left| self.skip(left));

        let right = index
            .checked_add(1)
            .expect("guarded by high water mark check above");
        let right_gap = if right < self.high_water_mark {
            self.skip(right)
        } else {
            0
        };

        let run_length = left_gap
            .checked_add(right_gap)
            .and_then(|gaps| gaps.checked_add(1))
            .expect("a run cannot be longer than its block");

        let value = self.slot_mut(index).take(run_length);

        let first = index
            .checked_sub(left_gap)
            .expect("the left run lies inside the block");
        let last = index
            .checked_add(right_gap)
            .expect("the right run lies inside the block");

        self.set_skip(first, run_length);
        self.set_skip(last, run_length);

        self.active_count = self
            .active_count
            .checked_sub(1)
            .expect("guarded by occupied check above");

        let coalesce = match (left_gap > 0, right_gap > 0) {
            (false, false) => Coalesce::Isolated,
            (true, false) => Coalesce::ExtendsLeft,
            (false, true) => Coalesce::ExtendsRight,
            (true, true) => Coalesce::Bridges,
        };

        (value, coalesce)
    }

    /// Index of the first live slot at or after `index`, jumping over erased runs.
    ///
    /// `index` must be either a live slot, the first slot of an erased run or at least the high
    /// water mark. Those are the only positions reachable by walking the skipfield from zero.
    #[must_use]
    pub(crate) fn seek(&self, mut index: usize) -> Option<usize> {
        while index < self.high_water_mark {
            match self.skip(index) {
                0 => return Some(index),
                skip => {
                    index = index
                        .checked_add(skip)
                        .expect("skip values never point past the block");
                }
            }
        }

        None
    }

    /// Verifies the skipfield against the slot contents and returns the first slot of every
    /// erased run, in order.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(any(debug_assertions, test))]
    pub(crate) fn integrity_check(&self) -> Vec<usize> {
        let mut run_starts = Vec::new();
        let mut observed_active_count: usize = 0;
        let mut index = 0;

        assert!(
            self.high_water_mark <= self.capacity(),
            "high water mark {} exceeds capacity {} in hive block of {}",
            self.high_water_mark,
            self.capacity(),
            type_name::<T>()
        );

        while index < self.high_water_mark {
            if self.is_occupied(index) {
                observed_active_count = observed_active_count
                    .checked_add(1)
                    .expect("bounded by capacity");
                index = index.checked_add(1).expect("bounded by capacity");
                continue;
            }

            let run_length = self.skip(index);
            assert!(
                run_length > 0,
                "vacant slot {index} has zero skip in hive block of {}",
                type_name::<T>()
            );

            let end = index
                .checked_add(run_length)
                .expect("bounded by capacity");
            assert!(
                end <= self.high_water_mark,
                "run at {index} of length {run_length} extends past the high water mark {}",
                self.high_water_mark
            );

            let last = end.checked_sub(1).expect("run length is non-zero");
            assert_eq!(
                self.skip(last),
                run_length,
                "run at {index} has mismatched boundary value at {last}"
            );

            for interior in index..end {
                assert!(
                    !self.is_occupied(interior),
                    "run at {index} of length {run_length} contains live slot {interior}"
                );
            }

            assert!(
                end == self.high_water_mark || self.is_occupied(end),
                "run at {index} of length {run_length} is not maximal"
            );

            run_starts.push(index);
            index = end;
        }

        assert_eq!(
            self.active_count, observed_active_count,
            "active count does not match the observed live slots in hive block of {}",
            type_name::<T>()
        );

        if self.high_water_mark < self.capacity() {
            let untouched = self
                .capacity()
                .checked_sub(self.high_water_mark)
                .expect("guarded by comparison above");
            let last = self.capacity().checked_sub(1).expect("capacity is non-zero");

            assert_eq!(self.skip(self.high_water_mark), untouched);
            assert_eq!(self.skip(last), untouched);

            for untouched_index in self.high_water_mark..self.capacity() {
                assert!(
                    !self.is_occupied(untouched_index),
                    "untouched slot {untouched_index} holds a value"
                );
            }
        }

        run_starts
    }
}
