use std::iter::FusedIterator;
use std::{mem, slice};

use crate::{Block, Cursor, Hive, Slot};

/// Iterator over shared references to the elements of a [`Hive`].
///
/// Created by [`Hive::iter()`]. Visits elements in block order and, within a block, in slot
/// order. Erased runs are stepped over in a single jump each.
#[derive(Debug)]
pub struct Iter<'h, T> {
    blocks: slice::Iter<'h, Block<T>>,

    /// Unvisited touched slots of the current block. Always starts at a live slot, the first
    /// slot of an erased run or is empty.
    slots: &'h [Slot<T>],

    remaining: usize,
}

impl<'h, T> Iter<'h, T> {
    pub(crate) fn new(blocks: &'h [Block<T>], len: usize) -> Self {
        Self {
            blocks: blocks.iter(),
            slots: &[],
            remaining: len,
        }
    }
}

impl<'h, T> Iterator for Iter<'h, T> {
    type Item = &'h T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let slots = self.slots;

            let Some(first) = slots.first() else {
                self.slots = self.blocks.next()?.touched_slots();
                continue;
            };

            match first {
                Slot::Occupied(value) => {
                    self.slots = slots.get(1..).unwrap_or_default();
                    self.remaining = self
                        .remaining
                        .checked_sub(1)
                        .expect("guarded by loop condition");

                    return Some(value);
                }
                Slot::Vacant(vacancy) => {
                    self.slots = slots.get(vacancy.skip..).unwrap_or_default();
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator over exclusive references to the elements of a [`Hive`].
///
/// Created by [`Hive::iter_mut()`]. Visits elements in the same order as [`Iter`].
#[derive(Debug)]
pub struct IterMut<'h, T> {
    blocks: slice::IterMut<'h, Block<T>>,
    slots: &'h mut [Slot<T>],
    remaining: usize,
}

impl<'h, T> IterMut<'h, T> {
    pub(crate) fn new(blocks: &'h mut [Block<T>], len: usize) -> Self {
        Self {
            blocks: blocks.iter_mut(),
            slots: &mut [],
            remaining: len,
        }
    }
}

impl<'h, T> Iterator for IterMut<'h, T> {
    type Item = &'h mut T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let slots = mem::take(&mut self.slots);

            let Some((first, rest)) = slots.split_first_mut() else {
                self.slots = self.blocks.next()?.touched_slots_mut();
                continue;
            };

            match first {
                Slot::Occupied(value) => {
                    self.slots = rest;
                    self.remaining = self
                        .remaining
                        .checked_sub(1)
                        .expect("guarded by loop condition");

                    return Some(value);
                }
                Slot::Vacant(vacancy) => {
                    // `rest` already excludes the first slot of the run.
                    let rest_of_run = vacancy
                        .skip
                        .checked_sub(1)
                        .expect("vacant slots always have a non-zero skip value");

                    self.slots = rest.get_mut(rest_of_run..).unwrap_or_default();
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Iterator over the cursors of all elements of a [`Hive`].
///
/// Created by [`Hive::cursors()`]. Yields cursors in the same order as [`Iter`] yields elements.
/// The hive is borrowed for the lifetime of the iterator; collect the cursors first if you
/// intend to modify the hive through them.
#[derive(Debug)]
pub struct Cursors<'h, T> {
    hive: &'h Hive<T>,
    next: Cursor,
    remaining: usize,
}

impl<'h, T> Cursors<'h, T> {
    pub(crate) fn new(hive: &'h Hive<T>) -> Self {
        Self {
            hive,
            next: hive.begin(),
            remaining: hive.len(),
        }
    }
}

impl<T> Iterator for Cursors<'_, T> {
    type Item = Cursor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_end() {
            return None;
        }

        let current = self.next;
        self.next = self.hive.advance(current);
        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more cursors than the hive has elements");

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Cursors<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Cursors<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        clippy::arithmetic_side_effects,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Iter<'static, u32>: Send, Sync, Debug, ExactSizeIterator, FusedIterator);
    assert_impl_all!(IterMut<'static, u32>: Send, Sync, Debug, ExactSizeIterator, FusedIterator);
    assert_impl_all!(Cursors<'static, u32>: Send, Sync, Debug, ExactSizeIterator, FusedIterator);

    /// Hive with blocks of 2, 4 and 8 slots where every third element is erased, plus a fully
    /// erased middle block.
    fn hive_with_gaps() -> (Hive<u32>, Vec<u32>) {
        let mut hive = Hive::builder().initial_block_capacity(2).build();
        let cursors: Vec<Cursor> = (0..14).map(|value| hive.emplace(value)).collect();

        let mut expected = Vec::new();

        for (value, cursor) in (0..14).zip(cursors) {
            let in_middle_block = (2..6).contains(&value);

            if in_middle_block || value % 3 == 0 {
                hive.erase(cursor);
            } else {
                expected.push(value);
            }
        }

        (hive, expected)
    }

    #[test]
    fn empty_hive_yields_nothing() {
        let mut hive = Hive::<u32>::new();

        assert_eq!(hive.iter().next(), None);
        assert_eq!(hive.iter_mut().next(), None);
        assert_eq!(hive.cursors().next(), None);
    }

    #[test]
    fn iter_skips_erased_slots_and_blocks() {
        let (hive, expected) = hive_with_gaps();

        assert_eq!(hive.iter().copied().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn iter_mut_visits_same_elements() {
        let (mut hive, expected) = hive_with_gaps();

        for value in &mut hive {
            *value += 100;
        }

        let expected: Vec<u32> = expected.into_iter().map(|value| value + 100).collect();
        assert_eq!((&hive).into_iter().copied().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn cursors_point_at_iterated_elements() {
        let (hive, expected) = hive_with_gaps();

        let via_cursors: Vec<u32> = hive
            .cursors()
            .map(|cursor| *hive.get(cursor).unwrap())
            .collect();

        assert_eq!(via_cursors, expected);
    }

    #[test]
    fn exact_size_counts_down() {
        let (mut hive, expected) = hive_with_gaps();

        let mut iter = hive.iter();
        assert_eq!(iter.len(), expected.len());
        iter.next();
        assert_eq!(iter.len(), expected.len() - 1);

        let mut cursors = hive.cursors();
        cursors.next();
        cursors.next();
        assert_eq!(cursors.size_hint(), (expected.len() - 2, Some(expected.len() - 2)));

        let iter_mut = hive.iter_mut();
        assert_eq!(iter_mut.len(), expected.len());
    }

    #[test]
    fn fused_after_exhaustion() {
        let (mut hive, _) = hive_with_gaps();

        let mut iter = hive.iter();
        _ = iter.by_ref().count();
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);

        let mut cursors = hive.cursors();
        _ = cursors.by_ref().count();
        assert_eq!(cursors.next(), None);

        let mut iter_mut = hive.iter_mut();
        _ = iter_mut.by_ref().count();
        assert!(iter_mut.next().is_none());
    }

    #[test]
    fn trailing_erased_run_is_not_scanned_past_last_element() {
        let mut hive = Hive::builder().initial_block_capacity(8).build();
        let cursors: Vec<Cursor> = (0..8).map(|value| hive.emplace(value)).collect();

        for &cursor in &cursors[1..] {
            hive.erase(cursor);
        }

        assert_eq!(hive.iter().copied().collect::<Vec<_>>(), [0]);
        assert_eq!(hive.iter_mut().map(|value| *value).collect::<Vec<_>>(), [0]);
    }
}
