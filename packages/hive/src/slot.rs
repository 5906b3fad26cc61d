use std::mem;

/// Location of a slot anywhere in the hive: the index of its block in the block chain plus the
/// index of the slot inside that block.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct SlotAddress {
    pub(crate) block: usize,
    pub(crate) index: usize,
}

impl SlotAddress {
    #[must_use]
    pub(crate) fn new(block: usize, index: usize) -> Self {
        Self { block, index }
    }

    /// The address of the slot immediately after this one in the same block.
    ///
    /// The caller is responsible for ensuring that such a slot exists.
    #[must_use]
    pub(crate) fn successor(self) -> Self {
        Self {
            block: self.block,
            index: self
                .index
                .checked_add(1)
                .expect("slot index cannot overflow because blocks are far smaller than usize::MAX"),
        }
    }
}

/// One cell of a block.
///
/// A slot either holds a live value or is vacant. Vacant slots carry the skipfield entry and,
/// if the slot is the first slot of an erased run, the links of that run in the free list.
#[derive(Debug)]
pub(crate) enum Slot<T> {
    Occupied(T),

    Vacant(Vacancy),
}

/// Bookkeeping stored in a vacant slot.
///
/// `skip` is only meaningful on the two boundary slots of a run, where it equals the run length.
/// The free list links are only meaningful on the first slot of a touched run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Vacancy {
    pub(crate) skip: usize,
    pub(crate) previous_free: Option<SlotAddress>,
    pub(crate) next_free: Option<SlotAddress>,
}

impl Vacancy {
    #[must_use]
    pub(crate) fn with_skip(skip: usize) -> Self {
        Self {
            skip,
            previous_free: None,
            next_free: None,
        }
    }
}

impl<T> Slot<T> {
    #[must_use]
    pub(crate) fn vacant(skip: usize) -> Self {
        Self::Vacant(Vacancy::with_skip(skip))
    }

    /// Skipfield value of the slot. Zero means the slot holds a live value.
    #[must_use]
    pub(crate) fn skip(&self) -> usize {
        match self {
            Self::Occupied(_) => 0,
            Self::Vacant(vacancy) => vacancy.skip,
        }
    }

    #[must_use]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Self::Occupied(_))
    }

    #[must_use]
    pub(crate) fn value(&self) -> Option<&T> {
        match self {
            Self::Occupied(value) => Some(value),
            Self::Vacant(_) => None,
        }
    }

    #[must_use]
    pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Occupied(value) => Some(value),
            Self::Vacant(_) => None,
        }
    }

    #[must_use]
    #[cfg(test)]
    pub(crate) fn vacancy(&self) -> Option<&Vacancy> {
        match self {
            Self::Occupied(_) => None,
            Self::Vacant(vacancy) => Some(vacancy),
        }
    }

    #[must_use]
    pub(crate) fn vacancy_mut(&mut self) -> Option<&mut Vacancy> {
        match self {
            Self::Occupied(_) => None,
            Self::Vacant(vacancy) => Some(vacancy),
        }
    }

    /// Replaces the slot contents with `value`, returning the vacancy that was there before.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds a value.
    pub(crate) fn fill(&mut self, value: T) -> Vacancy {
        match mem::replace(self, Self::Occupied(value)) {
            Self::Vacant(vacancy) => vacancy,
            Self::Occupied(_) => panic!("attempted to fill a slot that already holds a value"),
        }
    }

    /// Moves the value out of the slot, leaving behind a vacancy with the given skip value.
    ///
    /// # Panics
    ///
    /// Panics if the slot is vacant.
    #[must_use]
    pub(crate) fn take(&mut self, skip: usize) -> T {
        match mem::replace(self, Self::vacant(skip)) {
            Self::Occupied(value) => value,
            Self::Vacant(_) => panic!("attempted to take a value out of a vacant slot"),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn occupied_slot_has_zero_skip() {
        let slot = Slot::Occupied(42_u32);

        assert_eq!(slot.skip(), 0);
        assert!(slot.is_occupied());
        assert_eq!(slot.value(), Some(&42));
        assert!(slot.vacancy().is_none());
    }

    #[test]
    fn vacant_slot_reports_skip() {
        let slot = Slot::<u32>::vacant(7);

        assert_eq!(slot.skip(), 7);
        assert!(!slot.is_occupied());
        assert!(slot.value().is_none());
        assert_eq!(slot.vacancy(), Some(&Vacancy::with_skip(7)));
    }

    #[test]
    fn fill_then_take_round_trips_value() {
        let mut slot = Slot::vacant(3);

        let previous = slot.fill("hello".to_string());
        assert_eq!(previous.skip, 3);
        assert_eq!(slot.skip(), 0);

        let value = slot.take(1);
        assert_eq!(value, "hello");
        assert_eq!(slot.skip(), 1);
    }

    #[test]
    #[should_panic]
    fn fill_occupied_panics() {
        let mut slot = Slot::Occupied(1_u8);
        _ = slot.fill(2);
    }

    #[test]
    #[should_panic]
    fn take_vacant_panics() {
        let mut slot = Slot::<u8>::vacant(1);
        _ = slot.take(1);
    }

    #[test]
    fn successor_is_next_index_in_same_block() {
        let address = SlotAddress::new(3, 9);

        assert_eq!(address.successor(), SlotAddress::new(3, 10));
    }
}
