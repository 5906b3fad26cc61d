use crate::{Block, SlotAddress, Vacancy};

/// The erased runs of a hive that are waiting to be reused.
///
/// This is an intrusive doubly linked list: the links live in the [`Vacancy`] of the first slot
/// of every erased run, so the list itself is only a head pointer. Each run appears exactly once,
/// always via its first slot. That way an insertion taking the head entry always lands on the
/// front of a run, which is the only place a run can shrink from without touching its interior.
///
/// The list does not own any slots and holds no references; the blocks are passed in by the
/// caller for every operation.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    head: Option<SlotAddress>,

    /// Number of runs in the list.
    len: usize,
}

impl FreeList {
    #[must_use]
    pub(crate) fn head(&self) -> Option<SlotAddress> {
        self.head
    }

    #[must_use]
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Adds a new run, identified by its first slot, to the front of the list.
    pub(crate) fn push_front<T>(&mut self, blocks: &mut [Block<T>], address: SlotAddress) {
        let previous_head = self.head;

        let vacancy = vacancy_mut(blocks, address);
        vacancy.previous_free = None;
        vacancy.next_free = previous_head;

        if let Some(previous_head) = previous_head {
            vacancy_mut(blocks, previous_head).previous_free = Some(address);
        }

        self.head = Some(address);

        self.len = self
            .len
            .checked_add(1)
            .expect("cannot have more runs than slots in virtual memory");
    }

    /// Moves the list entry of a run from `old` to `new`, keeping its position in the list.
    ///
    /// Used when the first slot of a run changes: the run grew by one slot on the left, or its
    /// first slot was just filled and the run now starts one slot later.
    pub(crate) fn replace<T>(
        &mut self,
        blocks: &mut [Block<T>],
        old: SlotAddress,
        new: SlotAddress,
    ) {
        let links = detach(blocks, old);

        let vacancy = vacancy_mut(blocks, new);
        vacancy.previous_free = links.previous_free;
        vacancy.next_free = links.next_free;

        match links.previous_free {
            Some(previous) => vacancy_mut(blocks, previous).next_free = Some(new),
            None => self.head = Some(new),
        }

        if let Some(next) = links.next_free {
            vacancy_mut(blocks, next).previous_free = Some(new);
        }
    }

    /// Removes the run that starts at `address` from the list.
    pub(crate) fn unlink<T>(&mut self, blocks: &mut [Block<T>], address: SlotAddress) {
        let links = detach(blocks, address);

        match links.previous_free {
            Some(previous) => vacancy_mut(blocks, previous).next_free = links.next_free,
            None => {
                debug_assert_eq!(
                    self.head,
                    Some(address),
                    "unlinked entry without predecessor was not the head"
                );
                self.head = links.next_free;
            }
        }

        if let Some(next) = links.next_free {
            vacancy_mut(blocks, next).previous_free = links.previous_free;
        }

        self.len = self
            .len
            .checked_sub(1)
            .expect("unlinked an entry from an empty free list");
    }

    /// Walks the list from the head, verifying the back links on the way, and returns the
    /// addresses in list order.
    #[cfg(test)]
    pub(crate) fn integrity_check<T>(&self, blocks: &[Block<T>]) -> Vec<SlotAddress> {
        let mut addresses = Vec::with_capacity(self.len);
        let mut previous = None;
        let mut current = self.head;

        while let Some(address) = current {
            assert!(
                addresses.len() < self.len,
                "free list is longer than its recorded length {}",
                self.len
            );

            let vacancy = vacancy(blocks, address);

            assert_eq!(
                vacancy.previous_free, previous,
                "free list entry {address:?} has an inconsistent back link"
            );

            addresses.push(address);
            previous = Some(address);
            current = vacancy.next_free;
        }

        assert_eq!(
            addresses.len(),
            self.len,
            "free list is shorter than its recorded length"
        );

        addresses
    }
}

/// Clears the links stored at `address`, returning what they were.
fn detach<T>(blocks: &mut [Block<T>], address: SlotAddress) -> Vacancy {
    let vacancy = vacancy_mut(blocks, address);
    let links = *vacancy;

    vacancy.previous_free = None;
    vacancy.next_free = None;

    links
}

#[cfg(test)]
fn vacancy<T>(blocks: &[Block<T>], address: SlotAddress) -> &Vacancy {
    blocks
        .get(address.block)
        .expect("free list entries always point into an existing block")
        .vacancy(address.index)
}

fn vacancy_mut<T>(blocks: &mut [Block<T>], address: SlotAddress) -> &mut Vacancy {
    blocks
        .get_mut(address.block)
        .expect("free list entries always point into an existing block")
        .vacancy_mut(address.index)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use super::*;

    /// One block of eight live slots, with every odd slot then erased so there are four
    /// isolated runs available to put into a free list.
    fn blocks() -> Vec<Block<u32>> {
        let mut block = Block::try_new(8).unwrap();

        for value in 0..8 {
            _ = block.occupy_untouched(value);
        }

        for index in [1, 3, 5, 7] {
            _ = block.vacate(index);
        }

        vec![block]
    }

    fn at(index: usize) -> SlotAddress {
        SlotAddress::new(0, index)
    }

    #[test]
    fn empty_by_default() {
        let list = FreeList::default();

        assert_eq!(list.head(), None);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn push_front_is_lifo() {
        let mut blocks = blocks();
        let mut list = FreeList::default();

        list.push_front(&mut blocks, at(1));
        list.push_front(&mut blocks, at(3));
        list.push_front(&mut blocks, at(5));

        assert_eq!(list.head(), Some(at(5)));
        assert_eq!(list.integrity_check(&blocks), vec![at(5), at(3), at(1)]);
    }

    #[test]
    fn unlink_head_middle_and_tail() {
        let mut blocks = blocks();
        let mut list = FreeList::default();

        for index in [1, 3, 5, 7] {
            list.push_front(&mut blocks, at(index));
        }

        list.unlink(&mut blocks, at(5));
        assert_eq!(list.integrity_check(&blocks), vec![at(7), at(3), at(1)]);

        list.unlink(&mut blocks, at(7));
        assert_eq!(list.integrity_check(&blocks), vec![at(3), at(1)]);

        list.unlink(&mut blocks, at(1));
        assert_eq!(list.integrity_check(&blocks), vec![at(3)]);

        list.unlink(&mut blocks, at(3));
        assert_eq!(list.head(), None);
        assert!(list.integrity_check(&blocks).is_empty());
    }

    #[test]
    fn replace_keeps_position() {
        let mut blocks = blocks();
        let mut list = FreeList::default();

        for index in [1, 3, 5] {
            list.push_front(&mut blocks, at(index));
        }

        list.replace(&mut blocks, at(3), at(7));
        assert_eq!(list.integrity_check(&blocks), vec![at(5), at(7), at(1)]);

        list.replace(&mut blocks, at(5), at(3));
        assert_eq!(list.head(), Some(at(3)));
        assert_eq!(list.integrity_check(&blocks), vec![at(3), at(7), at(1)]);

        // The old entry no longer carries any links.
        let old = blocks[0].vacancy(5);
        assert_eq!(old.previous_free, None);
        assert_eq!(old.next_free, None);
    }

    #[test]
    #[should_panic]
    fn unlink_from_empty_list_panics() {
        let mut blocks = blocks();
        let mut list = FreeList::default();

        list.unlink(&mut blocks, at(1));
    }
}
